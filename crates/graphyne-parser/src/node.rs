use crate::SourceSpan;
use std::fmt;
use std::hash;
use triomphe::Arc;

/// A reference-counted AST node bundled with the byte span it was parsed
/// from, if any.
///
/// The reference count makes subtree sharing free: a fragment spread into
/// several documents, or an edited document and its original, point at the
/// same allocations. Because of that sharing, mutation goes through
/// [`make_mut`][Self::make_mut], which unshares first.
///
/// The span never participates in comparisons or hashing — equivalent
/// documents parsed from differently laid out text (or none at all) are
/// equal.
pub struct Node<T> {
    location: Option<SourceSpan>,
    contents: Arc<T>,
}

impl<T> Node<T> {
    /// Wrap a value with no span, for nodes assembled in code rather than
    /// read out of a document.
    pub fn new(contents: T) -> Self {
        Self {
            location: None,
            contents: Arc::new(contents),
        }
    }

    /// Wrap a value along with the span of the text it came from.
    pub fn at(contents: T, location: SourceSpan) -> Self {
        Self {
            location: Some(location),
            contents: Arc::new(contents),
        }
    }

    /// The span of the text this node was parsed from, if it was parsed
    /// at all.
    pub fn location(&self) -> Option<SourceSpan> {
        self.location
    }

    /// Whether the node belongs to the type-system document every schema
    /// receives implicitly: built-in scalars, built-in directives, and the
    /// introspection types.
    pub fn is_built_in(&self) -> bool {
        self.location.map(|location| location.file_id()) == Some(crate::FileId::BUILT_IN)
    }

    /// Put a different value under this node's span.
    ///
    /// Derived nodes (say, a schema type built from a parsed definition)
    /// use this so diagnostics keep pointing at the text they came from.
    pub fn rewrap<U>(&self, contents: U) -> Node<U> {
        Node {
            location: self.location,
            contents: Arc::new(contents),
        }
    }

    /// Mutable access with copy-on-write semantics: when the value is
    /// shared with other nodes, it is cloned first, so those nodes keep
    /// what they had.
    pub fn make_mut(&mut self) -> &mut T
    where
        T: Clone,
    {
        Arc::make_mut(&mut self.contents)
    }
}

impl<T> std::ops::Deref for Node<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.contents
    }
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Self {
            location: self.location,
            contents: self.contents.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.contents.fmt(f)?;
        if let Some(location) = self.location {
            write!(f, " @{location:?}")?;
        }
        Ok(())
    }
}

impl<T: Eq> Eq for Node<T> {}

impl<T: PartialEq> PartialEq for Node<T> {
    fn eq(&self, other: &Self) -> bool {
        // Shared allocations are equal without looking inside;
        // spans are never compared
        Arc::ptr_eq(&self.contents, &other.contents) || *self.contents == *other.contents
    }
}

impl<T: hash::Hash> hash::Hash for Node<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.contents.hash(state)
    }
}

impl<T> AsRef<T> for Node<T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T> From<T> for Node<T> {
    fn from(contents: T) -> Self {
        Self::new(contents)
    }
}
