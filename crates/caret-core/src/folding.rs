//! Code folding model: offset-based collapsible regions.
//!
//! A collapsed region hides its interior text behind a placeholder. The caret
//! model snaps to region boundaries (or expands regions), and the style
//! iteration engine short-circuits a segment whenever a collapsed region
//! starts at the current offset. Regions are kept sorted by start offset and
//! deduplicated, the same discipline the folding manager this is based on
//! applies to its line ranges.

use crate::attributes::TextAttributes;
use crate::markers::translate_offset;

/// A collapsible span of text rendered as a placeholder when collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldRegion {
    /// Start offset (inclusive) in characters.
    pub start: usize,
    /// End offset (exclusive) in characters.
    pub end: usize,
    /// Whether the region is currently collapsed.
    pub collapsed: bool,
    /// Placeholder text shown when collapsed (e.g. `"..."`).
    pub placeholder: String,
    /// Style of the placeholder text.
    pub placeholder_attributes: TextAttributes,
}

impl FoldRegion {
    /// Create an expanded region over `[start, end)` with the default
    /// placeholder.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            collapsed: false,
            placeholder: String::from("..."),
            placeholder_attributes: TextAttributes::empty(),
        }
    }

    /// Create a region with a custom placeholder string.
    pub fn with_placeholder(start: usize, end: usize, placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            ..Self::new(start, end)
        }
    }

    /// Whether `offset` lies in `[start, end)`.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Whether `offset` lies strictly inside the region (not at a boundary).
    pub fn contains_strictly(&self, offset: usize) -> bool {
        self.start < offset && offset < self.end
    }
}

/// Folding model: the fold-region interval provider.
#[derive(Debug, Default)]
pub struct FoldingModel {
    /// Regions sorted by (start, end).
    regions: Vec<FoldRegion>,
}

impl FoldingModel {
    /// Create an empty folding model.
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(&mut self) {
        self.regions.sort_by_key(|r| (r.start, r.end));
        self.regions
            .dedup_by(|a, b| a.start == b.start && a.end == b.end);
        self.regions.retain(|r| r.end > r.start);
    }

    /// Add a region, keeping the list sorted and deduplicated.
    pub fn add_region(&mut self, region: FoldRegion) {
        self.regions.push(region);
        self.normalize();
    }

    /// Remove the region with exactly the given bounds.
    pub fn remove_region(&mut self, start: usize, end: usize) -> bool {
        let before = self.regions.len();
        self.regions.retain(|r| !(r.start == start && r.end == end));
        before != self.regions.len()
    }

    /// All regions, sorted by start offset.
    pub fn regions(&self) -> &[FoldRegion] {
        &self.regions
    }

    /// The collapsed region containing `offset` (boundary-inclusive at the
    /// start, exclusive at the end). When regions nest, the outermost
    /// collapsed one wins; it is the one actually rendered.
    pub fn collapsed_region_at(&self, offset: usize) -> Option<&FoldRegion> {
        self.regions
            .iter()
            .filter(|r| r.collapsed && r.contains(offset))
            .min_by_key(|r| r.start)
    }

    /// The collapsed region whose interior strictly contains `offset`.
    pub fn collapsed_region_around(&self, offset: usize) -> Option<&FoldRegion> {
        self.regions
            .iter()
            .filter(|r| r.collapsed && r.contains_strictly(offset))
            .min_by_key(|r| r.start)
    }

    /// The collapsed region starting exactly at `offset`, preferring the
    /// widest (the one that gets rendered).
    pub fn collapsed_region_starting_at(&self, offset: usize) -> Option<&FoldRegion> {
        self.regions
            .iter()
            .filter(|r| r.collapsed && r.start == offset)
            .max_by_key(|r| r.end)
    }

    /// The collapsed region ending exactly at `offset`, preferring the
    /// widest.
    pub fn collapsed_region_ending_at(&self, offset: usize) -> Option<&FoldRegion> {
        self.regions
            .iter()
            .filter(|r| r.collapsed && r.end == offset)
            .max_by_key(|r| r.end - r.start)
    }

    /// Top-level collapsed regions in start order: collapsed regions not
    /// contained in another collapsed region.
    pub fn top_level_collapsed_regions(&self) -> Vec<&FoldRegion> {
        let mut result: Vec<&FoldRegion> = Vec::new();
        for region in self.regions.iter().filter(|r| r.collapsed) {
            match result.last() {
                Some(last) if region.start < last.end => {
                    // Nested inside the previous top-level region.
                }
                _ => result.push(region),
            }
        }
        result
    }

    /// Offset of the next collapsed-region boundary (start or end) strictly
    /// after `offset`, if any.
    pub fn next_collapsed_boundary_after(&self, offset: usize) -> Option<usize> {
        self.regions
            .iter()
            .filter(|r| r.collapsed)
            .flat_map(|r| [r.start, r.end])
            .filter(|&b| b > offset)
            .min()
    }

    /// Offset of the previous collapsed-region boundary strictly before
    /// `offset`, if any.
    pub fn prev_collapsed_boundary_before(&self, offset: usize) -> Option<usize> {
        self.regions
            .iter()
            .filter(|r| r.collapsed)
            .flat_map(|r| [r.start, r.end])
            .filter(|&b| b < offset)
            .max()
    }

    /// Collapse the region with exactly the given bounds.
    pub fn collapse(&mut self, start: usize, end: usize) -> bool {
        if let Some(region) = self
            .regions
            .iter_mut()
            .find(|r| r.start == start && r.end == end)
        {
            region.collapsed = true;
            true
        } else {
            false
        }
    }

    /// Expand the region with exactly the given bounds.
    pub fn expand(&mut self, start: usize, end: usize) -> bool {
        if let Some(region) = self
            .regions
            .iter_mut()
            .find(|r| r.start == start && r.end == end)
        {
            region.collapsed = false;
            true
        } else {
            false
        }
    }

    /// Expand every collapsed region whose interior strictly contains
    /// `offset`. Returns how many regions were expanded.
    pub fn expand_containing(&mut self, offset: usize) -> usize {
        let mut expanded = 0;
        for region in &mut self.regions {
            if region.collapsed && region.contains_strictly(offset) {
                region.collapsed = false;
                expanded += 1;
            }
        }
        expanded
    }

    /// Expand all regions.
    pub fn expand_all(&mut self) {
        for region in &mut self.regions {
            region.collapsed = false;
        }
    }

    /// Translate region offsets for a document edit; regions fully inside a
    /// deleted range are dropped.
    pub fn on_document_change(&mut self, offset: usize, old_len: usize, new_len: usize) {
        let delete_end = offset + old_len;
        self.regions.retain(|r| !(r.start >= offset && r.end <= delete_end && old_len > 0));
        for region in &mut self.regions {
            region.start = translate_offset(region.start, offset, old_len, new_len);
            region.end = translate_offset(region.end, offset, old_len, new_len);
        }
        self.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collapsed(start: usize, end: usize) -> FoldRegion {
        FoldRegion {
            collapsed: true,
            ..FoldRegion::new(start, end)
        }
    }

    #[test]
    fn test_collapsed_region_queries() {
        let mut model = FoldingModel::new();
        model.add_region(collapsed(2, 6));
        model.add_region(FoldRegion::new(10, 14));

        assert!(model.collapsed_region_at(2).is_some());
        assert!(model.collapsed_region_at(5).is_some());
        assert!(model.collapsed_region_at(6).is_none());
        assert!(model.collapsed_region_at(11).is_none()); // expanded

        assert!(model.collapsed_region_around(2).is_none()); // boundary
        assert!(model.collapsed_region_around(4).is_some());
    }

    #[test]
    fn test_top_level_skips_nested_regions() {
        let mut model = FoldingModel::new();
        model.add_region(collapsed(0, 10));
        model.add_region(collapsed(2, 5));
        model.add_region(collapsed(12, 15));

        let tops: Vec<(usize, usize)> = model
            .top_level_collapsed_regions()
            .iter()
            .map(|r| (r.start, r.end))
            .collect();
        assert_eq!(tops, vec![(0, 10), (12, 15)]);
    }

    #[test]
    fn test_expand_containing_only_hits_strict_interiors() {
        let mut model = FoldingModel::new();
        model.add_region(collapsed(2, 6));
        model.add_region(collapsed(20, 30));

        assert_eq!(model.expand_containing(2), 0);
        assert_eq!(model.expand_containing(4), 1);
        assert!(model.collapsed_region_at(4).is_none());
        assert!(model.collapsed_region_at(25).is_some());
    }

    #[test]
    fn test_boundary_queries() {
        let mut model = FoldingModel::new();
        model.add_region(collapsed(5, 9));
        model.add_region(collapsed(12, 20));

        assert_eq!(model.next_collapsed_boundary_after(0), Some(5));
        assert_eq!(model.next_collapsed_boundary_after(5), Some(9));
        assert_eq!(model.next_collapsed_boundary_after(20), None);
        assert_eq!(model.prev_collapsed_boundary_before(12), Some(9));
    }

    #[test]
    fn test_document_change_translation() {
        let mut model = FoldingModel::new();
        model.add_region(collapsed(10, 20));

        // Insertion before shifts both ends.
        model.on_document_change(0, 0, 5);
        assert_eq!((model.regions()[0].start, model.regions()[0].end), (15, 25));

        // Deletion covering the region drops it.
        model.on_document_change(14, 12, 0);
        assert!(model.regions().is_empty());
    }

    #[test]
    fn test_duplicate_regions_are_deduplicated() {
        let mut model = FoldingModel::new();
        model.add_region(FoldRegion::new(1, 4));
        model.add_region(FoldRegion::new(1, 4));
        assert_eq!(model.regions().len(), 1);
    }
}
