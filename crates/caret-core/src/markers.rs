//! Self-adjusting position and selection markers.
//!
//! A marker is a zero-width point or a half-open `[start, end)` range anchored
//! into document text. The owning document translates every marker as part of
//! applying a mutation, before any caret-level code observes the new state:
//!
//! - an insertion at or before a point marker shifts it right;
//! - a deletion spanning a marker collapses it to the deletion start;
//! - range markers shrink, shift, or clip exactly like style intervals do.
//!
//! Markers are addressed by stable [`MarkerId`] handles rather than
//! references, so holders (carets) survive arbitrary edits without borrowing
//! the document.

/// Stable handle to a marker in a [`MarkerTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(usize);

#[derive(Debug, Clone)]
struct Marker {
    start: usize,
    end: usize,
}

/// Store of self-adjusting markers, translated in one pass per document edit.
#[derive(Debug, Default)]
pub struct MarkerTree {
    slots: Vec<Option<Marker>>,
    free: Vec<usize>,
}

impl MarkerTree {
    /// Create an empty marker tree.
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, marker: Marker) -> MarkerId {
        if let Some(slot) = self.free.pop() {
            self.slots[slot] = Some(marker);
            MarkerId(slot)
        } else {
            self.slots.push(Some(marker));
            MarkerId(self.slots.len() - 1)
        }
    }

    /// Create a zero-width point marker at `offset`.
    pub fn create_point(&mut self, offset: usize) -> MarkerId {
        self.alloc(Marker {
            start: offset,
            end: offset,
        })
    }

    /// Create a range marker over `[start, end)`. Swapped bounds are
    /// normalized.
    pub fn create_range(&mut self, start: usize, end: usize) -> MarkerId {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        self.alloc(Marker { start, end })
    }

    /// Release a marker. Releasing twice is a no-op.
    pub fn release(&mut self, id: MarkerId) {
        if let Some(slot) = self.slots.get_mut(id.0)
            && slot.is_some()
        {
            *slot = None;
            self.free.push(id.0);
        }
    }

    /// Resolved offset of a point marker (its start, for ranges).
    pub fn point(&self, id: MarkerId) -> Option<usize> {
        self.slots.get(id.0)?.as_ref().map(|m| m.start)
    }

    /// Resolved `[start, end)` of a range marker.
    pub fn range(&self, id: MarkerId) -> Option<(usize, usize)> {
        self.slots.get(id.0)?.as_ref().map(|m| (m.start, m.end))
    }

    /// Reposition a point marker.
    pub fn set_point(&mut self, id: MarkerId, offset: usize) {
        if let Some(Some(marker)) = self.slots.get_mut(id.0) {
            marker.start = offset;
            marker.end = offset;
        }
    }

    /// Reposition a range marker. Swapped bounds are normalized.
    pub fn set_range(&mut self, id: MarkerId, start: usize, end: usize) {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        if let Some(Some(marker)) = self.slots.get_mut(id.0) {
            marker.start = start;
            marker.end = end;
        }
    }

    /// Number of live markers.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Whether no markers are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Translate all markers for an insertion of `len` characters at `offset`.
    ///
    /// A point marker exactly at `offset` shifts right: newly typed text lands
    /// before the caret.
    pub fn on_insert(&mut self, offset: usize, len: usize) {
        if len == 0 {
            return;
        }
        for marker in self.slots.iter_mut().flatten() {
            if marker.start >= offset {
                marker.start += len;
            }
            if marker.end >= offset {
                marker.end += len;
            }
        }
    }

    /// Translate all markers for a deletion of `[start, end)`.
    pub fn on_delete(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let len = end - start;
        for marker in self.slots.iter_mut().flatten() {
            marker.start = translate_offset(marker.start, start, len, 0);
            marker.end = translate_offset(marker.end, start, len, 0);
        }
    }

    /// Clamp every marker into `[0, text_len]`; used after whole-text
    /// replacement, where per-edit translation does not apply.
    pub fn clamp_to(&mut self, text_len: usize) {
        for marker in self.slots.iter_mut().flatten() {
            marker.start = marker.start.min(text_len);
            marker.end = marker.end.min(text_len);
        }
    }
}

/// Translate an offset anchor for an edit that replaced
/// `[offset, offset + old_len)` with `new_len` characters. Anchors at or
/// before the edit stay put, anchors past it shift by the length delta, and
/// anchors inside the replaced span clip to the nearest surviving boundary.
///
/// All provider stores (folds, wraps, inlays, highlighters, guarded blocks)
/// translate through this one function so their anchors agree after an edit.
pub(crate) fn translate_offset(pos: usize, offset: usize, old_len: usize, new_len: usize) -> usize {
    if pos <= offset {
        pos
    } else if pos >= offset + old_len {
        pos - old_len + new_len
    } else {
        offset + new_len.min(pos - offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_offset_for_replacements() {
        // Before, after, and inside a replacement of 2 chars with 4.
        assert_eq!(translate_offset(3, 5, 2, 4), 3);
        assert_eq!(translate_offset(5, 5, 2, 4), 5);
        assert_eq!(translate_offset(9, 5, 2, 4), 11);
        assert_eq!(translate_offset(6, 5, 2, 4), 6);
        // Inside a plain deletion: clips to the deletion start.
        assert_eq!(translate_offset(6, 5, 2, 0), 5);
    }

    #[test]
    fn test_point_marker_shifts_on_insert_before() {
        let mut tree = MarkerTree::new();
        let id = tree.create_point(5);

        tree.on_insert(2, 3);
        assert_eq!(tree.point(id), Some(8));

        // Insertion exactly at the marker also shifts it right.
        tree.on_insert(8, 2);
        assert_eq!(tree.point(id), Some(10));

        // Insertion after it leaves it alone.
        tree.on_insert(11, 4);
        assert_eq!(tree.point(id), Some(10));
    }

    #[test]
    fn test_point_marker_collapses_when_spanned_by_delete() {
        let mut tree = MarkerTree::new();
        let id = tree.create_point(5);

        tree.on_delete(3, 8);
        assert_eq!(tree.point(id), Some(3));
    }

    #[test]
    fn test_point_marker_shifts_left_on_delete_before() {
        let mut tree = MarkerTree::new();
        let id = tree.create_point(10);

        tree.on_delete(2, 6);
        assert_eq!(tree.point(id), Some(6));
    }

    #[test]
    fn test_range_marker_translation() {
        let mut tree = MarkerTree::new();
        let id = tree.create_range(10, 20);

        // Delete before: both ends shift.
        tree.on_delete(0, 5);
        assert_eq!(tree.range(id), Some((5, 15)));

        // Delete overlapping the tail: end clips to deletion start.
        tree.on_delete(12, 18);
        assert_eq!(tree.range(id), Some((5, 12)));

        // Delete covering the whole range: collapses to a point.
        tree.on_delete(4, 13);
        assert_eq!(tree.range(id), Some((4, 4)));
    }

    #[test]
    fn test_range_marker_grows_on_interior_insert() {
        let mut tree = MarkerTree::new();
        let id = tree.create_range(10, 20);

        tree.on_insert(15, 5);
        assert_eq!(tree.range(id), Some((10, 25)));
    }

    #[test]
    fn test_release_is_idempotent_and_slots_are_reused() {
        let mut tree = MarkerTree::new();
        let a = tree.create_point(1);
        tree.release(a);
        tree.release(a);
        assert!(tree.is_empty());

        let b = tree.create_point(2);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.point(b), Some(2));
    }

    #[test]
    fn test_swapped_range_is_normalized() {
        let mut tree = MarkerTree::new();
        let id = tree.create_range(9, 3);
        assert_eq!(tree.range(id), Some((3, 9)));
    }

    #[test]
    fn test_clamp_to_shrinks_out_of_range_markers() {
        let mut tree = MarkerTree::new();
        let id = tree.create_range(5, 30);
        tree.clamp_to(10);
        assert_eq!(tree.range(id), Some((5, 10)));
    }
}
