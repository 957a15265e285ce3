//! Source file bookkeeping: file identifiers, byte spans, and line/column
//! translation for diagnostics.

use std::fmt;
use std::num::NonZeroU64;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic;
use std::sync::atomic::AtomicU64;
use std::sync::OnceLock;

/// A small token standing in for one parsed file, so spans and error
/// reports can say which input they belong to without holding the text.
///
/// Ids come from a process-wide counter: a schema stitched together from
/// several files, and any number of documents parsed against it, all get
/// distinct ids with no coordination.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FileId {
    id: NonZeroU64,
}

// Ids 1 and 2 are reserved below; the counter hands out the rest
static NEXT: AtomicU64 = AtomicU64::new(INITIAL);
static INITIAL: u64 = 3;

impl FileId {
    /// The id of the type-system document every schema receives implicitly
    /// (built-in scalars, built-in directives, introspection types).
    pub const BUILT_IN: Self = Self::const_new(1);

    /// Stands in when a diagnostic has nothing to point at.
    pub const NONE: Self = Self::const_new(2);

    #[allow(clippy::new_without_default)] // returning a different value every time
    pub fn new() -> Self {
        let id = NEXT.fetch_add(1, atomic::Ordering::AcqRel);
        Self {
            id: NonZeroU64::new(id).expect("file ID counter overflowed"),
        }
    }

    const fn const_new(id: u64) -> Self {
        if let Some(id) = NonZeroU64::new(id) {
            Self { id }
        } else {
            panic!()
        }
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}

/// A 1-based cursor position, the way editors and the response format's
/// `locations` entries express it.
///
/// Columns step once per character ([`str::chars`]), not per byte, so a
/// multi-byte character still advances the column by one.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

impl fmt::Debug for LineColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for LineColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open byte range inside one parsed file, tagged with the file's id.
///
/// Spans are what AST nodes and tokens carry; line/column pairs are derived
/// from them on demand through [`SourceFile::get_line_column`].
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct SourceSpan {
    pub(crate) file_id: FileId,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl SourceSpan {
    pub fn new(file_id: FileId, start: usize, end: usize) -> Self {
        Self {
            file_id,
            start,
            end,
        }
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    /// First byte of the range.
    pub fn offset(&self) -> usize {
        self.start
    }

    /// One past the last byte of the range.
    pub fn end_offset(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Debug for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{} @{:?}", self.start, self.end, self.file_id)
    }
}

/// The text of one parsed input, kept around so spans can be turned into
/// line/column positions and diagnostic excerpts after parsing.
pub struct SourceFile {
    path: PathBuf,
    source_text: String,
    line_starts: OnceLock<Vec<usize>>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, source_text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source_text: source_text.into(),
            line_starts: OnceLock::new(),
        }
    }

    /// The label error reports use for this input. Usually a real path,
    /// but any string the caller passed at parse time works.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Byte offset of the start of each line, accounting for the three
    /// line terminators GraphQL recognises: LF, CR, and CRLF.
    fn line_starts(&self) -> &[usize] {
        self.line_starts.get_or_init(|| {
            let bytes = self.source_text.as_bytes();
            let mut starts = vec![0];
            let mut i = 0;
            while i < bytes.len() {
                match bytes[i] {
                    b'\n' => starts.push(i + 1),
                    b'\r' => {
                        if bytes.get(i + 1) == Some(&b'\n') {
                            i += 1;
                        }
                        starts.push(i + 1);
                    }
                    _ => {}
                }
                i += 1;
            }
            starts
        })
    }

    /// Translate a byte offset into this file to the [`LineColumn`]
    /// position sitting at it, or `None` when the offset runs past
    /// the end of the text.
    pub fn get_line_column(&self, offset: usize) -> Option<LineColumn> {
        if offset > self.source_text.len() {
            return None;
        }
        let starts = self.line_starts();
        let line = starts.partition_point(|&start| start <= offset) - 1;
        let column = self.source_text[starts[line]..offset].chars().count() + 1;
        Some(LineColumn {
            line: line + 1,
            column,
        })
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            path,
            source_text,
            line_starts: _, // a cache, noisy to print
        } = self;
        f.debug_struct("SourceFile")
            .field("path", path)
            .field("source_text", source_text)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_column_translation() {
        let source = SourceFile::new("test.graphql", "{\n  a\r\n  b\r}\n");
        let at = |offset: usize| {
            let lc = source.get_line_column(offset).unwrap();
            (lc.line, lc.column)
        };
        assert_eq!(at(0), (1, 1));
        assert_eq!(at(1), (1, 2));
        assert_eq!(at(2), (2, 1));
        assert_eq!(at(4), (2, 3));
        assert_eq!(at(7), (3, 1));
        assert_eq!(at(9), (3, 3));
        assert_eq!(at(11), (4, 1));
        assert_eq!(source.get_line_column(14), None);
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let source = SourceFile::new("test.graphql", "# é\n{ a }");
        let lc = source.get_line_column(5).unwrap();
        assert_eq!((lc.line, lc.column), (2, 1));
    }
}
