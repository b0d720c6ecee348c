//! Style iteration engine: merges all highlight sources into style runs.
//!
//! # Overview
//!
//! [`IterationState`] sweeps an offset range and produces maximal contiguous
//! segments whose merged visual attributes are identical. At each step the
//! next segment boundary is the nearest boundary over all sources, evaluated
//! in a fixed order: the syntax token stream, the selection, the interval
//! highlighters (admitted lazily as their start offsets are reached), fold
//! regions, the caret row, and guarded blocks. A collapsed fold starting at
//! the current offset short-circuits everything else: the segment is exactly
//! the fold's extent and is styled from the placeholder, still layered under
//! selection, caret row and guarded blocks.
//!
//! Attribute facets resolve by priority: selection, then fold or guarded
//! block, then caret row, then the syntax token, then highlighters by
//! descending layer. Effects accumulate across all layers. A
//! highlighter carrying the erase sentinel removes the syntax token's
//! contribution for the segments it covers.
//!
//! # Example
//!
//! ```
//! use caret_core::{EditorView, IterationFlags, IterationState, StyleScheme};
//!
//! let view = EditorView::new("abc def");
//! let mut state = IterationState::new(
//!     &view,
//!     0..7,
//!     IterationFlags::default(),
//!     None,
//!     StyleScheme::default(),
//! );
//! while !state.at_end() {
//!     let _run = (state.start_offset(), state.end_offset(), state.merged_attributes());
//!     state.advance();
//! }
//! ```

use crate::attributes::{
    AttributesBuilder, HighlightAttributes, HighlighterTargetArea, RangeHighlighter,
    TextAttributes,
};
use crate::document::DocumentBuffer;
use crate::folding::{FoldRegion, FoldingModel};
use crate::markup::{TokenList, affected_range};
use crate::view::EditorView;
use std::ops::Range;

/// Behavior switches of one iteration pass.
#[derive(Debug, Clone, Copy)]
pub struct IterationFlags {
    /// Iterate from the range end down to its start.
    pub reverse: bool,
    /// Consider only highlighters targeting whole lines.
    pub only_full_line_highlighters: bool,
    /// Consider only highlighters affecting the font or the foreground.
    pub only_font_or_foreground: bool,
    /// Whether collapsed folds short-circuit segments.
    pub use_fold_regions: bool,
}

impl Default for IterationFlags {
    fn default() -> Self {
        Self {
            reverse: false,
            only_full_line_highlighters: false,
            only_font_or_foreground: false,
            use_fold_regions: true,
        }
    }
}

/// Scheme attributes for the non-interval sources.
#[derive(Debug, Clone, Default)]
pub struct StyleScheme {
    /// Fallback attributes for facets no source sets.
    pub defaults: TextAttributes,
    /// Selection layer attributes.
    pub selection: TextAttributes,
    /// Caret-row layer attributes.
    pub caret_row: TextAttributes,
    /// Guarded (read-only) block attributes.
    pub guarded_block: TextAttributes,
}

/// Selection and caret-row state captured for one iteration pass.
#[derive(Debug, Clone, Default)]
pub struct CaretData {
    /// The caret row as an offset range.
    pub caret_row: Range<usize>,
    /// Selection ranges, sorted and non-overlapping.
    pub selections: Vec<Range<usize>>,
    /// Suppress the caret-row layer (a pinned line covers the row).
    pub suppress_caret_row: bool,
}

impl EditorView {
    /// Capture the current selections and caret row for an iteration pass.
    pub fn caret_data(&self) -> CaretData {
        let mut selections: Vec<Range<usize>> = self
            .caret_ids()
            .into_iter()
            .filter_map(|id| self.selection(id))
            .map(|sel| sel.start..sel.end)
            .collect();
        selections.sort_by_key(|r| r.start);
        // Merged carets keep selections disjoint, but normalize anyway.
        let mut merged: Vec<Range<usize>> = Vec::with_capacity(selections.len());
        for range in selections {
            match merged.last_mut() {
                Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
                _ => merged.push(range),
            }
        }
        CaretData {
            caret_row: self.caret_row_range(),
            selections: merged,
            suppress_caret_row: self.settings().sticky_line_shown,
        }
    }
}

/// One highlighter with its affected range resolved.
struct Entry<'a> {
    highlighter: &'a RangeHighlighter,
    start: usize,
    end: usize,
}

/// Pull-based iterator over merged style runs.
pub struct IterationState<'a> {
    document: &'a DocumentBuffer,
    folding: &'a FoldingModel,
    guarded: &'a [Range<usize>],
    syntax: &'a TokenList,
    entries: Vec<Entry<'a>>,
    /// Admission order for the sweep direction (indices into `entries`).
    order: Vec<usize>,
    next_admit: usize,
    active: Vec<usize>,
    caret_data: Option<CaretData>,
    scheme: StyleScheme,
    flags: IterationFlags,
    forced_breaks: Vec<usize>,
    range: Range<usize>,
    seg_start: usize,
    seg_end: usize,
    attributes: TextAttributes,
    done: bool,
}

impl<'a> IterationState<'a> {
    /// Construct the state over `range` and position it on the first segment.
    pub fn new(
        view: &'a EditorView,
        range: Range<usize>,
        flags: IterationFlags,
        caret_data: Option<CaretData>,
        scheme: StyleScheme,
    ) -> Self {
        let len = view.document().text_len();
        if range.end > len {
            log::error!(
                "style iteration range [{}, {}) outside [0, {len}]; clamping",
                range.start,
                range.end
            );
        }
        let start = range.start.min(len);
        let end = range.end.min(len).max(start);
        let range = start..end;

        let mut entries: Vec<Entry<'a>> = view
            .document_markup()
            .overlapping(range.start, range.end)
            .into_iter()
            .chain(view.view_markup().overlapping(range.start, range.end))
            .filter(|h| !h.after_end_of_line)
            .filter(|h| {
                !flags.only_full_line_highlighters
                    || h.target_area == HighlighterTargetArea::LinesInRange
            })
            .filter(|h| {
                !flags.only_font_or_foreground
                    || h.attributes
                        .styled()
                        .is_none_or(|a| a.affects_font_or_foreground())
            })
            .map(|h| {
                let document = view.document();
                let (start, end) = affected_range(
                    h,
                    |offset| document.line_start_offset(document.line_of_offset(offset)),
                    |offset| document.line_end_offset(document.line_of_offset(offset)),
                );
                Entry {
                    highlighter: h,
                    start,
                    end,
                }
            })
            .filter(|e| e.end > e.start)
            .collect();
        entries.sort_by_key(|e| e.start);

        let mut order: Vec<usize> = (0..entries.len()).collect();
        if flags.reverse {
            order.sort_by(|&a, &b| entries[b].end.cmp(&entries[a].end));
        }

        let initial = if flags.reverse { range.end } else { range.start };
        let mut state = Self {
            document: view.document(),
            folding: view.folding(),
            guarded: view.guarded_blocks(),
            syntax: view.syntax(),
            entries,
            order,
            next_admit: 0,
            active: Vec::new(),
            caret_data,
            scheme,
            flags,
            forced_breaks: Vec::new(),
            range,
            seg_start: initial,
            seg_end: initial,
            attributes: TextAttributes::empty(),
            done: false,
        };
        state.advance();
        state
    }

    /// Register an offset where segments must break and exact-range
    /// highlighters touching it are excluded (soft wrap boundaries).
    pub fn add_forced_break(&mut self, offset: usize) {
        let pos = self.forced_breaks.partition_point(|&b| b < offset);
        if self.forced_breaks.get(pos) != Some(&offset) {
            self.forced_breaks.insert(pos, offset);
        }
    }

    /// Whether the whole range has been produced.
    pub fn at_end(&self) -> bool {
        self.done
    }

    /// Start offset of the current segment.
    pub fn start_offset(&self) -> usize {
        self.seg_start
    }

    /// End offset (exclusive) of the current segment.
    pub fn end_offset(&self) -> usize {
        self.seg_end
    }

    /// Resolved attributes of the current segment.
    pub fn merged_attributes(&self) -> &TextAttributes {
        &self.attributes
    }

    /// Move to the next segment.
    pub fn advance(&mut self) {
        if self.done {
            return;
        }
        if self.flags.reverse {
            self.seg_end = self.seg_start;
            if self.seg_end <= self.range.start {
                self.done = true;
                return;
            }
            self.compute_backward();
        } else {
            self.seg_start = self.seg_end;
            if self.seg_start >= self.range.end {
                self.done = true;
                return;
            }
            self.compute_forward();
        }
    }

    /// Rewind to an already-visited offset and re-advance from there. Only
    /// supported for forward iteration without caret data.
    pub fn retreat(&mut self, offset: usize) {
        if self.flags.reverse || self.caret_data.is_some() {
            log::error!("retreat requires forward iteration without caret data; ignoring");
            return;
        }
        if offset < self.range.start || offset > self.seg_start {
            log::error!(
                "retreat to {offset} outside the visited range [{}, {}]; ignoring",
                self.range.start,
                self.seg_start
            );
            return;
        }
        self.next_admit = 0;
        self.active.clear();
        self.done = false;
        self.seg_start = offset;
        self.seg_end = offset;
        self.advance();
    }

    // ---------------------------------------------------------------- sweep

    fn compute_forward(&mut self) {
        let pos = self.seg_start;

        if self.flags.use_fold_regions {
            if let Some(region) = self.folding.collapsed_region_starting_at(pos) {
                let end = region.end.min(self.range.end);
                if end > pos {
                    self.seg_end = end;
                    self.attributes = self.merge(pos, end, Some(region));
                    return;
                }
            }
        }

        // Admit highlighters whose start has been reached; evict passed ones.
        while self.next_admit < self.order.len()
            && self.entries[self.order[self.next_admit]].start <= pos
        {
            self.active.push(self.order[self.next_admit]);
            self.next_admit += 1;
        }
        let entries = &self.entries;
        self.active.retain(|&i| entries[i].end > pos);

        let mut boundary = self.range.end;
        let mut consider = |candidate: usize| {
            if candidate > pos {
                boundary = boundary.min(candidate);
            }
        };

        // Boundary-source order: syntax, selection, highlighters, folds,
        // caret row, guarded blocks.
        if let Some(token) = self.syntax.get(self.syntax.index_at(pos)) {
            consider(if token.start > pos {
                token.start
            } else {
                token.end
            });
        }
        if let Some(data) = &self.caret_data {
            for sel in &data.selections {
                if sel.start > pos {
                    consider(sel.start);
                    break;
                }
                if sel.end > pos {
                    consider(sel.end);
                    break;
                }
            }
        }
        if self.next_admit < self.order.len() {
            consider(self.entries[self.order[self.next_admit]].start);
        }
        for &i in &self.active {
            consider(self.entries[i].end);
        }
        if self.flags.use_fold_regions {
            if let Some(b) = self.folding.next_collapsed_boundary_after(pos) {
                consider(b);
            }
        }
        if let Some(data) = &self.caret_data {
            if !data.suppress_caret_row {
                if data.caret_row.start > pos {
                    consider(data.caret_row.start);
                } else if data.caret_row.end > pos {
                    consider(data.caret_row.end);
                }
            }
        }
        for block in self.guarded {
            if block.start > pos {
                consider(block.start);
                break;
            }
            if block.end > pos {
                consider(block.end);
                break;
            }
        }
        if let Some(&b) = self.forced_breaks.iter().find(|&&b| b > pos) {
            consider(b);
        }

        // Segment boundaries never split a grapheme cluster.
        let mut end = self
            .document
            .snap_to_grapheme_boundary(boundary, true)
            .min(self.range.end);
        if end <= pos {
            end = self.range.end;
        }
        self.seg_end = end;
        self.attributes = self.merge(pos, end, None);
    }

    fn compute_backward(&mut self) {
        let pos = self.seg_end;

        if self.flags.use_fold_regions {
            if let Some(region) = self.folding.collapsed_region_ending_at(pos) {
                let start = region.start.max(self.range.start);
                if start < pos {
                    self.seg_start = start;
                    self.attributes = self.merge(start, pos, Some(region));
                    return;
                }
            }
        }

        while self.next_admit < self.order.len()
            && self.entries[self.order[self.next_admit]].end >= pos
        {
            self.active.push(self.order[self.next_admit]);
            self.next_admit += 1;
        }
        let entries = &self.entries;
        self.active.retain(|&i| entries[i].start < pos);

        let mut boundary = self.range.start;
        let mut consider = |candidate: usize| {
            if candidate < pos {
                boundary = boundary.max(candidate);
            }
        };

        let tokens = self.syntax.tokens();
        let i = tokens.partition_point(|t| t.start < pos);
        if i > 0 {
            let token = &tokens[i - 1];
            consider(if token.end < pos { token.end } else { token.start });
        }
        if let Some(data) = &self.caret_data {
            for sel in data.selections.iter().rev() {
                if sel.end < pos {
                    consider(sel.end);
                    break;
                }
                if sel.start < pos {
                    consider(sel.start);
                    break;
                }
            }
        }
        if self.next_admit < self.order.len() {
            consider(self.entries[self.order[self.next_admit]].end);
        }
        for &i in &self.active {
            consider(self.entries[i].start);
        }
        if self.flags.use_fold_regions {
            if let Some(b) = self.folding.prev_collapsed_boundary_before(pos) {
                consider(b);
            }
        }
        if let Some(data) = &self.caret_data {
            if !data.suppress_caret_row {
                if data.caret_row.end < pos {
                    consider(data.caret_row.end);
                } else if data.caret_row.start < pos {
                    consider(data.caret_row.start);
                }
            }
        }
        for block in self.guarded.iter().rev() {
            if block.end < pos {
                consider(block.end);
                break;
            }
            if block.start < pos {
                consider(block.start);
                break;
            }
        }
        if let Some(&b) = self.forced_breaks.iter().rev().find(|&&b| b < pos) {
            consider(b);
        }

        let mut start = self
            .document
            .snap_to_grapheme_boundary(boundary, false)
            .max(self.range.start);
        if start >= pos {
            start = self.range.start;
        }
        self.seg_start = start;
        self.attributes = self.merge(start, pos, None);
    }

    // ---------------------------------------------------------------- merge

    fn excluded_by_forced_break(&self, entry: &Entry<'a>, start: usize, end: usize) -> bool {
        if entry.highlighter.target_area != HighlighterTargetArea::ExactRange {
            return false;
        }
        [start, end].iter().any(|b| {
            self.forced_breaks.binary_search(b).is_ok()
                && (entry.highlighter.start == *b || entry.highlighter.end == *b)
        })
    }

    fn merge(&self, start: usize, end: usize, fold: Option<&FoldRegion>) -> TextAttributes {
        let mut builder = AttributesBuilder::new(self.scheme.defaults.clone());
        let covers = |r: &Range<usize>| r.start <= start && end <= r.end;

        if let Some(data) = &self.caret_data {
            if data.selections.iter().any(&covers) {
                builder.push(&self.scheme.selection);
            }
        }
        if let Some(region) = fold {
            builder.push(&region.placeholder_attributes);
        } else if self.guarded.iter().any(&covers) {
            builder.push(&self.scheme.guarded_block);
        }
        if let Some(data) = &self.caret_data {
            if !data.suppress_caret_row && covers(&data.caret_row) {
                builder.push(&self.scheme.caret_row);
            }
        }

        if fold.is_none() {
            let mut applicable: Vec<&Entry<'a>> = self
                .entries
                .iter()
                .filter(|e| e.start <= start && e.end >= end)
                .filter(|e| !self.excluded_by_forced_break(e, start, end))
                .collect();
            let erased = applicable
                .iter()
                .any(|e| e.highlighter.attributes == HighlightAttributes::Erase);

            if !erased {
                if let Some(token) = self.syntax.get(self.syntax.index_at(start)) {
                    if token.start <= start && token.end >= end {
                        builder.push(&token.attributes);
                    }
                }
            }

            // Highest layer first; ties broken by foreground presence, then
            // background presence, then severity, then the most specific
            // (shortest) affected range.
            applicable.sort_by(|a, b| {
                let ha = a.highlighter;
                let hb = b.highlighter;
                let fg = |h: &RangeHighlighter| {
                    h.attributes.styled().is_some_and(|s| s.foreground.is_some())
                };
                let bg = |h: &RangeHighlighter| {
                    h.attributes.styled().is_some_and(|s| s.background.is_some())
                };
                hb.layer
                    .cmp(&ha.layer)
                    .then_with(|| fg(hb).cmp(&fg(ha)))
                    .then_with(|| bg(hb).cmp(&bg(ha)))
                    .then_with(|| hb.severity.cmp(&ha.severity))
                    .then_with(|| ha.affected_len().cmp(&hb.affected_len()))
            });
            for entry in applicable {
                if let HighlightAttributes::Styled(attrs) = &entry.highlighter.attributes {
                    builder.push(attrs);
                }
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Color, EffectKind, TextEffect};
    use crate::folding::FoldRegion;
    use crate::markup::SyntaxToken;
    use pretty_assertions::assert_eq;

    const RED: Color = Color::new(0xFF0000);
    const GREEN: Color = Color::new(0x00FF00);
    const BLUE: Color = Color::new(0x0000FF);
    const GRAY: Color = Color::new(0x808080);

    fn collect(state: &mut IterationState<'_>) -> Vec<(usize, usize, TextAttributes)> {
        let mut runs = Vec::new();
        while !state.at_end() {
            runs.push((
                state.start_offset(),
                state.end_offset(),
                state.merged_attributes().clone(),
            ));
            state.advance();
        }
        runs
    }

    fn highlighter(layer: i32, start: usize, end: usize, attrs: TextAttributes) -> RangeHighlighter {
        RangeHighlighter::new(layer, start, end, HighlightAttributes::Styled(attrs))
    }

    #[test]
    fn test_segments_are_contiguous_and_cover_the_range() {
        let mut view = EditorView::new("abcdefghij");
        view.view_markup_mut()
            .add_highlighter(highlighter(1, 2, 5, TextAttributes::background_only(GREEN)));
        view.view_markup_mut()
            .add_highlighter(highlighter(2, 4, 8, TextAttributes::foreground_only(RED)));

        let mut state = IterationState::new(
            &view,
            0..10,
            IterationFlags::default(),
            None,
            StyleScheme::default(),
        );
        let runs = collect(&mut state);

        assert_eq!(runs.first().map(|r| r.0), Some(0));
        assert_eq!(runs.last().map(|r| r.1), Some(10));
        for pair in runs.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
        let bounds: Vec<(usize, usize)> = runs.iter().map(|r| (r.0, r.1)).collect();
        assert_eq!(bounds, vec![(0, 2), (2, 4), (4, 5), (5, 8), (8, 10)]);
    }

    #[test]
    fn test_selection_foreground_layers_over_highlighter_background() {
        let mut view = EditorView::new("abcdef");
        let caret = view.primary_caret();
        view.set_selection(caret, 1, 5).unwrap();
        view.view_markup_mut()
            .add_highlighter(highlighter(1, 1, 5, TextAttributes::background_only(GREEN)));

        let scheme = StyleScheme {
            selection: TextAttributes::foreground_only(RED),
            ..StyleScheme::default()
        };
        let caret_data = view.caret_data();
        let state = IterationState::new(
            &view,
            1..5,
            IterationFlags::default(),
            Some(caret_data),
            scheme,
        );

        assert!(!state.at_end());
        let merged = state.merged_attributes();
        assert_eq!(merged.foreground, Some(RED));
        assert_eq!(merged.background, Some(GREEN));
    }

    #[test]
    fn test_collapsed_fold_short_circuits_the_segment() {
        let mut view = EditorView::new("abcdefghij");
        view.folding_mut().add_region(FoldRegion {
            collapsed: true,
            placeholder_attributes: TextAttributes::foreground_only(GRAY),
            ..FoldRegion::new(2, 7)
        });
        view.syntax_mut().set_tokens(vec![SyntaxToken {
            start: 0,
            end: 10,
            attributes: TextAttributes::foreground_only(BLUE),
        }]);

        let mut state = IterationState::new(
            &view,
            0..10,
            IterationFlags::default(),
            None,
            StyleScheme::default(),
        );
        let runs = collect(&mut state);
        let bounds: Vec<(usize, usize)> = runs.iter().map(|r| (r.0, r.1)).collect();
        assert_eq!(bounds, vec![(0, 2), (2, 7), (7, 10)]);
        // The fold segment is styled by the placeholder alone.
        assert_eq!(runs[1].2.foreground, Some(GRAY));
        assert_eq!(runs[0].2.foreground, Some(BLUE));
    }

    #[test]
    fn test_fold_disabled_by_flag() {
        let mut view = EditorView::new("abcdefghij");
        view.folding_mut().add_region(FoldRegion {
            collapsed: true,
            ..FoldRegion::new(2, 7)
        });

        let flags = IterationFlags {
            use_fold_regions: false,
            ..IterationFlags::default()
        };
        let mut state =
            IterationState::new(&view, 0..10, flags, None, StyleScheme::default());
        let runs = collect(&mut state);
        assert_eq!(runs.len(), 1);
        assert_eq!((runs[0].0, runs[0].1), (0, 10));
    }

    #[test]
    fn test_erase_sentinel_removes_syntax_contribution() {
        let mut view = EditorView::new("abcdef");
        view.syntax_mut().set_tokens(vec![SyntaxToken {
            start: 0,
            end: 6,
            attributes: TextAttributes::foreground_only(BLUE),
        }]);
        view.view_markup_mut().add_highlighter(RangeHighlighter::new(
            1,
            2,
            4,
            HighlightAttributes::Erase,
        ));

        let mut state = IterationState::new(
            &view,
            0..6,
            IterationFlags::default(),
            None,
            StyleScheme::default(),
        );
        let runs = collect(&mut state);
        assert_eq!(runs[0].2.foreground, Some(BLUE));
        assert_eq!(runs[1].2.foreground, None);
        assert_eq!(runs[2].2.foreground, Some(BLUE));
    }

    #[test]
    fn test_layer_priority_and_severity_tie_break() {
        let mut view = EditorView::new("abcdef");
        let mut low = highlighter(1, 0, 6, TextAttributes::foreground_only(GREEN));
        low.severity = 5;
        let mut high = highlighter(1, 0, 6, TextAttributes::foreground_only(RED));
        high.severity = 9;
        view.view_markup_mut().add_highlighter(low);
        view.view_markup_mut().add_highlighter(high);

        let mut state = IterationState::new(
            &view,
            0..6,
            IterationFlags::default(),
            None,
            StyleScheme::default(),
        );
        assert_eq!(state.merged_attributes().foreground, Some(RED));
        let _ = collect(&mut state);
    }

    #[test]
    fn test_effects_accumulate_across_sources() {
        let mut view = EditorView::new("abcdef");
        let wave = TextEffect {
            kind: EffectKind::Wave,
            color: RED,
        };
        let underline = TextEffect {
            kind: EffectKind::Underline,
            color: BLUE,
        };
        view.view_markup_mut().add_highlighter(highlighter(
            1,
            0,
            6,
            TextAttributes {
                effects: vec![wave],
                ..TextAttributes::default()
            },
        ));
        view.syntax_mut().set_tokens(vec![SyntaxToken {
            start: 0,
            end: 6,
            attributes: TextAttributes {
                effects: vec![underline],
                ..TextAttributes::default()
            },
        }]);

        let state = IterationState::new(
            &view,
            0..6,
            IterationFlags::default(),
            None,
            StyleScheme::default(),
        );
        assert_eq!(state.merged_attributes().effects, vec![underline, wave]);
    }

    #[test]
    fn test_sticky_line_suppresses_caret_row() {
        let mut view = EditorView::new("abc\ndef");
        let scheme = StyleScheme {
            caret_row: TextAttributes::background_only(GRAY),
            ..StyleScheme::default()
        };

        let data = view.caret_data();
        let state = IterationState::new(
            &view,
            0..3,
            IterationFlags::default(),
            Some(data),
            scheme.clone(),
        );
        assert_eq!(state.merged_attributes().background, Some(GRAY));

        view.settings_mut().sticky_line_shown = true;
        let data = view.caret_data();
        let state =
            IterationState::new(&view, 0..3, IterationFlags::default(), Some(data), scheme);
        assert_eq!(state.merged_attributes().background, None);
    }

    #[test]
    fn test_guarded_block_layers_between_selection_and_caret_row() {
        let mut view = EditorView::new("abcdef");
        view.add_guarded_block(0, 6);
        let scheme = StyleScheme {
            guarded_block: TextAttributes::background_only(GRAY),
            ..StyleScheme::default()
        };
        let state =
            IterationState::new(&view, 0..6, IterationFlags::default(), None, scheme);
        assert_eq!(state.merged_attributes().background, Some(GRAY));
    }

    #[test]
    fn test_backward_iteration_mirrors_forward() {
        let mut view = EditorView::new("abcdefghij");
        view.view_markup_mut()
            .add_highlighter(highlighter(1, 2, 5, TextAttributes::background_only(GREEN)));
        view.view_markup_mut()
            .add_highlighter(highlighter(2, 4, 8, TextAttributes::foreground_only(RED)));

        let mut forward = IterationState::new(
            &view,
            0..10,
            IterationFlags::default(),
            None,
            StyleScheme::default(),
        );
        let mut forward_runs = collect(&mut forward);

        let flags = IterationFlags {
            reverse: true,
            ..IterationFlags::default()
        };
        let mut backward =
            IterationState::new(&view, 0..10, flags, None, StyleScheme::default());
        let mut backward_runs = collect(&mut backward);

        forward_runs.reverse();
        backward_runs.sort_by_key(|r| std::cmp::Reverse(r.0));
        assert_eq!(forward_runs, backward_runs);
    }

    #[test]
    fn test_retreat_rewinds_the_sweep() {
        let mut view = EditorView::new("abcdefghij");
        view.view_markup_mut()
            .add_highlighter(highlighter(1, 2, 5, TextAttributes::background_only(GREEN)));

        let mut state = IterationState::new(
            &view,
            0..10,
            IterationFlags::default(),
            None,
            StyleScheme::default(),
        );
        while !state.at_end() {
            state.advance();
        }
        state.retreat(2);
        assert!(!state.at_end());
        assert_eq!(state.start_offset(), 2);
        assert_eq!(state.end_offset(), 5);
        assert_eq!(state.merged_attributes().background, Some(GREEN));
    }

    #[test]
    fn test_forced_break_excludes_touching_exact_highlighters() {
        let mut view = EditorView::new("abcdefghij");
        view.view_markup_mut()
            .add_highlighter(highlighter(1, 2, 5, TextAttributes::background_only(GREEN)));

        let mut state = IterationState::new(
            &view,
            0..10,
            IterationFlags::default(),
            None,
            StyleScheme::default(),
        );
        state.add_forced_break(5);
        state.retreat(2);
        // The highlighter ends exactly at the break, so it no longer paints
        // the segment touching it.
        assert_eq!((state.start_offset(), state.end_offset()), (2, 5));
        assert_eq!(state.merged_attributes().background, None);
    }
}
