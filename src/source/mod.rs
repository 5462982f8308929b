//! Source model
//!
//! Immutable value types shared by every later stage:
//! - [`SourceFile`]: an origin plus the text it holds
//! - [`SourceLocation`]: a 1-based line/column inside a file
//! - [`SourceRange`]: a half-open `[start, end)` pair of locations
//!
//! Locations carry the identifier of the file they belong to so that
//! diagnostics drained from a pool can be rendered without the file at hand.
//! Columns count Unicode scalar values, one per scanned character.

use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const DUMMY_IDENTIFIER: &str = "<dummy>";
const INVALID_IDENTIFIER: &str = "<invalid>";

static NEXT_MEMORY_ID: AtomicU64 = AtomicU64::new(1);

/// Where the text of a [`SourceFile`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    Path(PathBuf),
    /// In-memory text with a process-unique synthetic id
    Memory(u64),
}

/// A source file: origin plus immutable text.
#[derive(Debug, Clone)]
pub struct SourceFile {
    origin: SourceOrigin,
    identifier: Arc<str>,
    content: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Create a file backed by `path` whose text is already loaded.
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let path = path.into();
        let identifier: Arc<str> = Arc::from(path.display().to_string());
        Self::build(SourceOrigin::Path(path), identifier, content.into())
    }

    /// Create a file from text that does not live on disk.
    pub fn in_memory(content: impl Into<String>) -> Self {
        let id = NEXT_MEMORY_ID.fetch_add(1, Ordering::Relaxed);
        let identifier: Arc<str> = Arc::from(format!("<memory:{id}>"));
        Self::build(SourceOrigin::Memory(id), identifier, content.into())
    }

    /// Read a file from disk.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Ok(Self::new(path, content))
    }

    fn build(origin: SourceOrigin, identifier: Arc<str>, content: String) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            content
                .char_indices()
                .filter(|(_, ch)| *ch == '\n')
                .map(|(offset, _)| offset + 1),
        );
        Self {
            origin,
            identifier,
            content,
            line_starts,
        }
    }

    pub fn origin(&self) -> &SourceOrigin {
        &self.origin
    }

    /// Path for disk-backed files, `None` for in-memory ones.
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            SourceOrigin::Path(path) => Some(path),
            SourceOrigin::Memory(_) => None,
        }
    }

    /// The identifier stamped into every location of this file.
    pub fn identifier(&self) -> &Arc<str> {
        &self.identifier
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn location(&self, line: usize, column: usize) -> SourceLocation {
        SourceLocation::new(self.identifier.clone(), line, column)
    }

    /// Byte offset of `location`, or `None` if it does not point into this
    /// file. The position just past the last character is addressable.
    pub fn offset_of(&self, location: &SourceLocation) -> Option<usize> {
        if !location.is_valid() || *location.identifier != *self.identifier {
            return None;
        }
        let line_start = *self.line_starts.get(location.line - 1)?;
        let line_end = self
            .line_starts
            .get(location.line)
            .copied()
            .unwrap_or(self.content.len());
        let line_text = &self.content[line_start..line_end];

        let wanted = location.column - 1;
        let mut chars = line_text.char_indices();
        for _ in 0..wanted {
            chars.next()?;
        }
        Some(line_start + chars.next().map_or(line_text.len(), |(i, _)| i))
    }

    /// The text covered by `range`.
    pub fn text_in(&self, range: &SourceRange) -> Option<&str> {
        let start = self.offset_of(&range.start)?;
        let end = self.offset_of(&range.end)?;
        self.content.get(start..end)
    }
}

/// A 1-based line/column position in a named file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    pub identifier: Arc<str>,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(identifier: Arc<str>, line: usize, column: usize) -> Self {
        Self {
            identifier,
            line,
            column,
        }
    }

    /// Placeholder for synthesized nodes that have no real position.
    pub fn dummy() -> Self {
        Self::new(Arc::from(DUMMY_IDENTIFIER), 0, 0)
    }

    /// Marker for a position that could not be determined.
    pub fn invalid() -> Self {
        Self::new(Arc::from(INVALID_IDENTIFIER), 0, 0)
    }

    pub fn is_dummy(&self) -> bool {
        &*self.identifier == DUMMY_IDENTIFIER && self.line == 0 && self.column == 0
    }

    pub fn is_invalid(&self) -> bool {
        &*self.identifier == INVALID_IDENTIFIER && self.line == 0 && self.column == 0
    }

    pub fn is_valid(&self) -> bool {
        !self.is_dummy() && !self.is_invalid() && self.line > 0 && self.column > 0
    }

    /// True when both locations are in the same file and `self` comes first.
    pub fn precedes(&self, other: &SourceLocation) -> bool {
        self.identifier == other.identifier
            && (self.line, self.column) < (other.line, other.column)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.identifier, self.line, self.column)
    }
}

/// A half-open `[start, end)` source range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceRange {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceRange {
    /// Build a range; an `end` that precedes `start` is clamped to `start`.
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        if end.precedes(&start) {
            let end = start.clone();
            return Self { start, end };
        }
        Self { start, end }
    }

    pub fn empty() -> Self {
        Self {
            start: SourceLocation::dummy(),
            end: SourceLocation::dummy(),
        }
    }

    pub fn invalid() -> Self {
        Self {
            start: SourceLocation::invalid(),
            end: SourceLocation::invalid(),
        }
    }

    /// From the start of `first` to the end of `last`.
    pub fn spanning(first: &SourceRange, last: &SourceRange) -> Self {
        Self::new(first.start.clone(), last.end.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_dummy() && self.end.is_dummy()
    }

    pub fn is_valid(&self) -> bool {
        self.start.is_valid() && self.end.is_valid()
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}:{}",
            self.start, self.end.line, self.end.column
        )
    }
}

/// Anything that occupies a range of source text.
pub trait Locatable {
    fn source_range(&self) -> SourceRange;

    fn source_location(&self) -> SourceLocation {
        self.source_range().start
    }
}

impl Locatable for SourceLocation {
    fn source_range(&self) -> SourceRange {
        SourceRange::new(self.clone(), self.clone())
    }

    fn source_location(&self) -> SourceLocation {
        self.clone()
    }
}

impl Locatable for SourceRange {
    fn source_range(&self) -> SourceRange {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_are_not_valid() {
        assert!(SourceLocation::dummy().is_dummy());
        assert!(!SourceLocation::dummy().is_valid());
        assert!(SourceLocation::invalid().is_invalid());
        assert!(!SourceLocation::invalid().is_valid());
        assert!(SourceRange::empty().is_empty());
        assert!(!SourceRange::invalid().is_valid());
    }

    #[test]
    fn test_location_validity() {
        let file = SourceFile::in_memory("let a = 1");
        assert!(file.location(1, 1).is_valid());
        assert!(!file.location(0, 1).is_valid());
        assert!(!file.location(1, 0).is_valid());
    }

    #[test]
    fn test_range_end_never_precedes_start() {
        let file = SourceFile::in_memory("abc\ndef");
        let range = SourceRange::new(file.location(2, 3), file.location(1, 1));
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn test_in_memory_files_get_distinct_identifiers() {
        let a = SourceFile::in_memory("");
        let b = SourceFile::in_memory("");
        assert_ne!(a.identifier(), b.identifier());
        assert!(a.path().is_none());
    }

    #[test]
    fn test_text_in_range() {
        let file = SourceFile::in_memory("let π = 3\nvar x");
        let range = SourceRange::new(file.location(1, 5), file.location(1, 6));
        assert_eq!(file.text_in(&range), Some("π"));

        let tail = SourceRange::new(file.location(2, 1), file.location(2, 6));
        assert_eq!(file.text_in(&tail), Some("var x"));

        let across = SourceRange::new(file.location(1, 9), file.location(2, 4));
        assert_eq!(file.text_in(&across), Some("3\nvar"));
    }

    #[test]
    fn test_offset_rejects_foreign_locations() {
        let file = SourceFile::in_memory("x");
        let other = SourceFile::in_memory("x");
        assert_eq!(file.offset_of(&other.location(1, 1)), None);
        assert_eq!(file.offset_of(&file.location(3, 1)), None);
    }
}
