use crate::SourceSpan;
use std::borrow::Borrow;
use std::fmt;
use std::hash;
use std::sync::Arc;

/// Create a [`Name`] from a string literal or identifier,
/// checked for validity at compile time.
///
/// # Examples
///
/// ```
/// use graphyne_parser::name;
///
/// assert_eq!(name!("Query").as_str(), "Query");
/// assert_eq!(name!(Query).as_str(), "Query");
/// ```
#[macro_export]
macro_rules! name {
    ($value: ident) => {
        $crate::name!(stringify!($value))
    };
    ($value: expr) => {{
        const _: () = { assert!($crate::Name::valid_syntax($value)) };
        $crate::Name::new_unchecked($value)
    }};
}

/// A GraphQL identifier: `[_A-Za-z][_0-9A-Za-z]*`
///
/// Reference-counted so cloning is cheap, and carrying an optional source
/// span which is ignored by equality and hashing.
#[derive(Clone)]
pub struct Name {
    value: Arc<str>,
    location: Option<SourceSpan>,
}

#[derive(Clone, Eq, PartialEq, thiserror::Error)]
#[error("`{name}` is not a valid GraphQL name")]
pub struct InvalidNameError {
    pub name: String,
}

impl Name {
    /// Check and wrap an identifier found at the given span of a document.
    pub fn parsed(value: &str, location: SourceSpan) -> Result<Self, InvalidNameError> {
        Self::check_valid_syntax(value)?;
        Ok(Self {
            value: Arc::from(value),
            location: Some(location),
        })
    }

    /// Check and wrap an identifier that has no backing source text.
    pub fn new(value: &str) -> Result<Self, InvalidNameError> {
        Self::check_valid_syntax(value)?;
        Ok(Self::new_unchecked(value))
    }

    /// Wrap an identifier without checking its syntax.
    ///
    /// An invalid name can make a document serialize to unparseable text,
    /// nothing worse.
    pub fn new_unchecked(value: &str) -> Self {
        Self {
            value: Arc::from(value),
            location: None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn location(&self) -> Option<SourceSpan> {
        self.location
    }

    /// Returns whether the given string is a valid GraphQL name,
    /// usable in a `const` context.
    pub const fn valid_syntax(value: &str) -> bool {
        let bytes = value.as_bytes();
        if bytes.is_empty() {
            return false;
        }
        if !Self::char_is_name_start(bytes[0]) {
            return false;
        }
        let mut i = 1;
        while i < bytes.len() {
            if !Self::char_is_name_continue(bytes[i]) {
                return false;
            }
            i += 1;
        }
        true
    }

    const fn char_is_name_start(byte: u8) -> bool {
        byte.is_ascii_alphabetic() || byte == b'_'
    }

    const fn char_is_name_continue(byte: u8) -> bool {
        byte.is_ascii_alphanumeric() || byte == b'_'
    }

    fn check_valid_syntax(value: &str) -> Result<(), InvalidNameError> {
        if Self::valid_syntax(value) {
            Ok(())
        } else {
            Err(InvalidNameError {
                name: value.to_owned(),
            })
        }
    }
}

impl std::ops::Deref for Name {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.value
    }
}

impl Eq for Name {}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value // location not included
    }
}

impl hash::Hash for Name {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        // Must match `str` hashing so `Borrow<str>` map lookups work
        self.value.hash(state)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<Name> for str {
    fn eq(&self, other: &Name) -> bool {
        self == other.as_str()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Debug for InvalidNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl TryFrom<&str> for Name {
    type Error = InvalidNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&String> for Name {
    type Error = InvalidNameError;

    fn try_from(value: &String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_syntax() {
        assert!(Name::valid_syntax("_"));
        assert!(Name::valid_syntax("__typename"));
        assert!(Name::valid_syntax("Query"));
        assert!(Name::valid_syntax("a1"));
        assert!(!Name::valid_syntax(""));
        assert!(!Name::valid_syntax("1a"));
        assert!(!Name::valid_syntax("a-b"));
        assert!(!Name::valid_syntax("è_é"));
    }

    #[test]
    fn equality_ignores_location() {
        let span = SourceSpan::new(crate::FileId::new(), 0, 3);
        let parsed = Name::parsed("foo", span).unwrap();
        let synthetic = Name::new("foo").unwrap();
        assert_eq!(parsed, synthetic);
        assert_eq!(parsed, "foo");
    }
}
