//! Source location model.
//!
//! `Span` stores byte offsets *and* (row, col) positions. Byte offsets are
//! the ground truth for slicing and edit planning; rows/cols exist to talk
//! to detectors and humans. Rows and cols are 0-based; detector findings use
//! 1-based lines, and the conversion happens in exactly one place
//! (`engine::region`).

use serde::{Deserialize, Serialize};

/// Absolute byte and (row, col) span inside one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start byte (0-based).
    pub start_byte: usize,
    /// Exclusive end byte (0-based).
    pub end_byte: usize,
    /// 0-based start row.
    pub start_row: usize,
    /// 0-based start column.
    pub start_col: usize,
    /// 0-based end row.
    pub end_row: usize,
    /// 0-based end column (exclusive).
    pub end_col: usize,
}

impl Span {
    /// 1-based line of the span start, as reported to users and detectors.
    pub fn start_line(&self) -> usize {
        self.start_row + 1
    }

    /// 1-based line of the span end.
    pub fn end_line(&self) -> usize {
        self.end_row + 1
    }

    /// Bytes spanned.
    pub fn byte_len(&self) -> usize {
        if self.end_byte >= self.start_byte {
            self.end_byte - self.start_byte
        } else {
            0
        }
    }

    /// Whether the (row, col) point lies within `[start, end)` of this span.
    pub fn contains_point(&self, row: usize, col: usize) -> bool {
        let p = (row, col);
        p >= (self.start_row, self.start_col) && p < (self.end_row, self.end_col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span {
            start_byte: 10,
            end_byte: 30,
            start_row: 2,
            start_col: 4,
            end_row: 2,
            end_col: 24,
        }
    }

    #[test]
    fn line_conversion_is_one_based() {
        assert_eq!(span().start_line(), 3);
        assert_eq!(span().end_line(), 3);
        assert_eq!(span().byte_len(), 20);
    }

    #[test]
    fn point_containment_is_half_open() {
        let s = span();
        assert!(s.contains_point(2, 4));
        assert!(s.contains_point(2, 23));
        assert!(!s.contains_point(2, 24));
        assert!(!s.contains_point(2, 3));
        assert!(!s.contains_point(1, 10));
    }
}
