//! Row bookmarks.
//!
//! Rowset layers above the tree walk their results through a small cursor
//! contract: step forward, read the current row, report the position. Any
//! tree cursor satisfies it, with the stored value as the row.

use crate::error::TreeError;
use crate::tree::Cursor;

/// A position in a sequence of rows.
///
/// Bookmarks are immutable; advancing returns a new bookmark, or `None`
/// when the rows are exhausted.
pub trait RowBookmark: Sized {
    type Row;

    /// The bookmark at the next row.
    fn advance(&self) -> Option<Self>;

    /// The row at this bookmark.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::Corrupt` if the bookmark does not rest on a row.
    fn row(&self) -> Result<&Self::Row, TreeError>;

    /// Absolute position of the row, counting from 0.
    fn position(&self) -> u64;
}

impl<K, V> RowBookmark for Cursor<K, V> {
    type Row = V;

    fn advance(&self) -> Option<Self> {
        self.next()
    }

    fn row(&self) -> Result<&V, TreeError> {
        self.value()
    }

    fn position(&self) -> u64 {
        Self::position(self)
    }
}
