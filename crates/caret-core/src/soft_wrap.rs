//! Soft wrap model: synthetic visual line breaks.
//!
//! A soft wrap at offset `o` breaks the visual line *before* the character at
//! `o`, without a line break existing in the text. The continuation row may
//! start with an indent of virtual cells. Wrap positions are decided by the
//! rendering layer (it owns widths and fonts) and registered here; this model
//! is the provider the coordinate mapper and caret consult.

use crate::markers::translate_offset;

/// A single registered soft wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftWrap {
    /// Character offset the continuation row starts at.
    pub offset: usize,
    /// Virtual indent cells at the start of the continuation row.
    pub indent_columns: usize,
}

/// Registry of soft wraps, sorted by offset.
#[derive(Debug, Default)]
pub struct SoftWrapModel {
    wraps: Vec<SoftWrap>,
}

impl SoftWrapModel {
    /// Create an empty soft wrap model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all wraps (sorted and deduplicated by offset).
    pub fn set_wraps(&mut self, mut wraps: Vec<SoftWrap>) {
        wraps.sort_by_key(|w| w.offset);
        wraps.dedup_by_key(|w| w.offset);
        self.wraps = wraps;
    }

    /// Register a single wrap.
    pub fn add_wrap(&mut self, wrap: SoftWrap) {
        match self.wraps.binary_search_by_key(&wrap.offset, |w| w.offset) {
            Ok(idx) => self.wraps[idx] = wrap,
            Err(idx) => self.wraps.insert(idx, wrap),
        }
    }

    /// Remove all wraps.
    pub fn clear(&mut self) {
        self.wraps.clear();
    }

    /// All wraps in offset order.
    pub fn wraps(&self) -> &[SoftWrap] {
        &self.wraps
    }

    /// The wrap whose continuation row starts exactly at `offset`.
    pub fn soft_wrap_at(&self, offset: usize) -> Option<&SoftWrap> {
        self.wraps
            .binary_search_by_key(&offset, |w| w.offset)
            .ok()
            .map(|idx| &self.wraps[idx])
    }

    /// Number of wraps with `offset <= limit`.
    pub fn count_at_or_before(&self, limit: usize) -> usize {
        match self.wraps.binary_search_by_key(&limit, |w| w.offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// Number of wraps with `offset < limit`.
    pub fn count_before(&self, limit: usize) -> usize {
        match self.wraps.binary_search_by_key(&limit, |w| w.offset) {
            Ok(idx) | Err(idx) => idx,
        }
    }

    /// Wraps with offsets in `[start, end)`.
    pub fn wraps_in_range(&self, start: usize, end: usize) -> &[SoftWrap] {
        let lo = self.count_before(start);
        let hi = self.count_before(end);
        &self.wraps[lo..hi]
    }

    /// The last wrap with `offset <= limit`, if any.
    pub fn last_wrap_at_or_before(&self, limit: usize) -> Option<&SoftWrap> {
        let count = self.count_at_or_before(limit);
        if count == 0 { None } else { Some(&self.wraps[count - 1]) }
    }

    /// Translate wrap offsets for a document edit; wraps inside a deleted
    /// range are dropped (the render layer re-registers after reflow).
    pub fn on_document_change(&mut self, offset: usize, old_len: usize, new_len: usize) {
        let delete_end = offset + old_len;
        self.wraps
            .retain(|w| w.offset <= offset || w.offset >= delete_end);
        for wrap in &mut self.wraps {
            wrap.offset = translate_offset(wrap.offset, offset, old_len, new_len);
        }
        self.wraps.sort_by_key(|w| w.offset);
        self.wraps.dedup_by_key(|w| w.offset);
    }
}
