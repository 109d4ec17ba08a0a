//! Source location tracking for error reporting.
//!
//! Provides [`Span`] to track where nodes and diagnostics occur in source files.

use std::fmt;

use crate::FileId;

/// A span of source code, represented by its file and starting position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Span {
    /// File the span belongs to.
    pub file: FileId,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes (for additional context).
    pub len: u32,
}

impl Span {
    /// Create a new span from a file, line, column, and length.
    #[inline]
    pub fn new(file: FileId, line: u32, col: u32, len: u32) -> Self {
        Self {
            file,
            line,
            col,
            len,
        }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(file: FileId, line: u32, col: u32) -> Self {
        Self {
            file,
            line,
            col,
            len: 0,
        }
    }

    /// Whether this span is empty (zero length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The length of this span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Merge two spans into one that starts at the first span and extends to cover both.
    ///
    /// Spans on different lines keep the first position and add the lengths.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        if self.line == other.line {
            let start_col = self.col.min(other.col);
            let end_col = (other.col + other.len).max(self.col + self.len);
            Span {
                file: self.file,
                line: self.line,
                col: start_col,
                len: end_col - start_col,
            }
        } else {
            Span {
                file: self.file,
                line: self.line,
                col: self.col,
                len: self.len + other.len,
            }
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}:{}", self.file, self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let span = Span::new(FileId(0), 1, 5, 10);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());

        let empty = Span::point(FileId(0), 1, 5);
        assert!(empty.is_empty());
    }

    #[test]
    fn span_display() {
        let span = Span::new(FileId(2), 3, 15, 5);
        assert_eq!(format!("{}", span), "3:15");
        assert_eq!(format!("{:?}", span), "FileId(2)@3:15");
    }

    #[test]
    fn span_merge_same_line() {
        let span1 = Span::new(FileId(0), 1, 5, 3);
        let span2 = Span::new(FileId(0), 1, 10, 3);
        let merged = span1.merge(span2);

        assert_eq!(merged.line, 1);
        assert_eq!(merged.col, 5);
        assert_eq!(merged.len, 8);
    }

    #[test]
    fn span_merge_different_lines() {
        let span1 = Span::new(FileId(0), 1, 5, 3);
        let span2 = Span::new(FileId(0), 2, 1, 4);
        let merged = span1.merge(span2);

        assert_eq!(merged.line, 1);
        assert_eq!(merged.col, 5);
        assert_eq!(merged.len, 7);
    }

    #[test]
    fn spans_order_by_file_then_position() {
        let a = Span::new(FileId(0), 9, 1, 0);
        let b = Span::new(FileId(1), 1, 1, 0);
        let c = Span::new(FileId(1), 1, 4, 0);
        assert!(a < b);
        assert!(b < c);
    }
}
