//! Inlay model: inline visual elements with zero text width.
//!
//! An inlay (e.g. a parameter-name hint) occupies cells on screen but no
//! characters in the document. It sits between the characters at `offset - 1`
//! and `offset`, shifting visual columns of everything after it on the row.
//! Carets step over inlay runs entirely during horizontal movement.

use crate::markers::translate_offset;

/// A single inline element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inlay {
    /// Character offset the element is anchored at.
    pub offset: usize,
    /// Width of the element in cells.
    pub width_in_columns: usize,
    /// Whether the element belongs with the text before it (affects which
    /// side of the element a caret at `offset` renders on).
    pub related_to_preceding_text: bool,
}

/// Registry of inline elements, sorted by offset.
#[derive(Debug, Default)]
pub struct InlayModel {
    inlays: Vec<Inlay>,
}

impl InlayModel {
    /// Create an empty inlay model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element (multiple elements may share an offset).
    pub fn add_inlay(&mut self, inlay: Inlay) {
        let idx = self
            .inlays
            .partition_point(|existing| existing.offset <= inlay.offset);
        self.inlays.insert(idx, inlay);
    }

    /// Remove all elements at `offset`. Returns how many were removed.
    pub fn remove_at(&mut self, offset: usize) -> usize {
        let before = self.inlays.len();
        self.inlays.retain(|i| i.offset != offset);
        before - self.inlays.len()
    }

    /// All elements in offset order.
    pub fn inlays(&self) -> &[Inlay] {
        &self.inlays
    }

    /// Whether any element is anchored at `offset`.
    pub fn has_inline_element_at(&self, offset: usize) -> bool {
        self.inlays
            .binary_search_by_key(&offset, |i| i.offset)
            .is_ok()
    }

    /// Elements anchored exactly at `offset`.
    pub fn inlays_at(&self, offset: usize) -> &[Inlay] {
        let lo = self.inlays.partition_point(|i| i.offset < offset);
        let hi = self.inlays.partition_point(|i| i.offset <= offset);
        &self.inlays[lo..hi]
    }

    /// Number of elements anchored in `[start, end)`.
    pub fn count_in_range(&self, start: usize, end: usize) -> usize {
        let lo = self.inlays.partition_point(|i| i.offset < start);
        let hi = self.inlays.partition_point(|i| i.offset < end);
        hi - lo
    }

    /// Total width in cells of elements anchored in `[start, end)`.
    pub fn width_in_range(&self, start: usize, end: usize) -> usize {
        let lo = self.inlays.partition_point(|i| i.offset < start);
        let hi = self.inlays.partition_point(|i| i.offset < end);
        self.inlays[lo..hi]
            .iter()
            .map(|i| i.width_in_columns)
            .sum()
    }

    /// Total width in cells of elements anchored exactly at `offset`.
    pub fn width_at(&self, offset: usize) -> usize {
        self.inlays_at(offset)
            .iter()
            .map(|i| i.width_in_columns)
            .sum()
    }

    /// Total width in cells of elements at `offset` that belong with the
    /// preceding text. These render between that text and a caret at
    /// `offset`, so the caret's visual column shifts past them.
    pub fn width_before_caret_at(&self, offset: usize) -> usize {
        self.inlays_at(offset)
            .iter()
            .filter(|i| i.related_to_preceding_text)
            .map(|i| i.width_in_columns)
            .sum()
    }

    /// Translate anchors for a document edit; anchors strictly inside a
    /// deleted range are dropped.
    pub fn on_document_change(&mut self, offset: usize, old_len: usize, new_len: usize) {
        let delete_end = offset + old_len;
        self.inlays
            .retain(|i| i.offset <= offset || i.offset >= delete_end);
        for inlay in &mut self.inlays {
            inlay.offset = translate_offset(inlay.offset, offset, old_len, new_len);
        }
        self.inlays.sort_by_key(|i| i.offset);
    }
}
