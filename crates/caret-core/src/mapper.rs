//! Coordinate mapper: offset <-> logical position <-> visual position.
//!
//! # Overview
//!
//! Logical positions are a pure function of the document's line structure.
//! Visual positions additionally account for collapsed fold regions (interior
//! positions all map onto the placeholder, and line breaks hidden by a fold
//! merge visual rows), soft wraps (synthetic row breaks that do not advance
//! the logical line), inlays (cells with no backing character) and tab stops.
//!
//! The mapper is a short-lived borrow over the view's models; it is the only
//! place conversions between the coordinate spaces happen.
//!
//! # Example
//!
//! ```
//! use caret_core::{DocumentBuffer, FoldingModel, InlayModel, SoftWrapModel};
//! use caret_core::{CoordinateMapper, LogicalPosition, ViewSettings};
//!
//! let document = DocumentBuffer::from_text("abc\ndef");
//! let folding = FoldingModel::new();
//! let soft_wraps = SoftWrapModel::new();
//! let inlays = InlayModel::new();
//! let settings = ViewSettings::default();
//! let mapper = CoordinateMapper::new(&document, &folding, &soft_wraps, &inlays, &settings);
//!
//! let logical = mapper.offset_to_logical(5);
//! assert_eq!((logical.line, logical.column), (1, 1));
//! assert_eq!(mapper.logical_to_offset(LogicalPosition::new(1, 1)), 5);
//! ```

use crate::document::DocumentBuffer;
use crate::folding::FoldingModel;
use crate::inlay::InlayModel;
use crate::position::{LogicalPosition, VisualPosition};
use crate::soft_wrap::{SoftWrap, SoftWrapModel};
use crate::view::ViewSettings;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Converter between the three coordinate spaces of one view.
pub struct CoordinateMapper<'a> {
    document: &'a DocumentBuffer,
    folding: &'a FoldingModel,
    soft_wraps: &'a SoftWrapModel,
    inlays: &'a InlayModel,
    tab_size: usize,
    virtual_space: bool,
}

impl<'a> CoordinateMapper<'a> {
    /// Borrow the view's models for a batch of conversions.
    pub fn new(
        document: &'a DocumentBuffer,
        folding: &'a FoldingModel,
        soft_wraps: &'a SoftWrapModel,
        inlays: &'a InlayModel,
        settings: &ViewSettings,
    ) -> Self {
        Self {
            document,
            folding,
            soft_wraps,
            inlays,
            tab_size: settings.tab_size.max(1),
            virtual_space: settings.virtual_space,
        }
    }

    /// Whether virtual space is enabled for this view.
    pub fn virtual_space(&self) -> bool {
        self.virtual_space
    }

    // ---------------------------------------------------------------- logical

    /// Logical position of a character offset. Out-of-range offsets clamp to
    /// the end of the text.
    pub fn offset_to_logical(&self, offset: usize) -> LogicalPosition {
        let offset = offset.min(self.document.text_len());
        let line = self.document.line_of_offset(offset);
        let column = offset - self.document.line_start_offset(line);
        LogicalPosition::new(line, column)
    }

    /// Offset of a logical position. The line clamps to the document's line
    /// count and the column to the line's length; columns in virtual space
    /// have no offset of their own and clamp to the line end as well.
    pub fn logical_to_offset(&self, pos: LogicalPosition) -> usize {
        let line = pos.line.min(self.document.line_count().saturating_sub(1));
        let column = pos.column.min(self.document.line_length(line));
        self.document.line_start_offset(line) + column
    }

    // ----------------------------------------------------------------- visual

    /// Visual row index of a character offset. `leans_forward` decides which
    /// side of a soft wrap an offset exactly at the wrap belongs to.
    pub fn visual_line_of_offset(&self, offset: usize, leans_forward: bool) -> usize {
        let offset = offset.min(self.document.text_len());
        // Interior-of-fold offsets render at the placeholder.
        let offset = match self.folding.collapsed_region_around(offset) {
            Some(region) => region.start,
            None => offset,
        };

        let logical_breaks = self.document.line_of_offset(offset);
        let hidden = self.hidden_line_breaks_before(offset);
        let wraps = self
            .soft_wraps
            .wraps()
            .iter()
            .filter(|w| w.offset <= offset)
            .filter(|w| self.wrap_is_visible(w))
            .filter(|w| w.offset < offset || leans_forward)
            .count();
        logical_breaks - hidden + wraps
    }

    /// Total number of visual rows in the view.
    pub fn visual_line_count(&self) -> usize {
        let len = self.document.text_len();
        let logical_breaks = self.document.line_count().saturating_sub(1);
        let hidden = self.hidden_line_breaks_before(len);
        let wraps = self
            .soft_wraps
            .wraps()
            .iter()
            .filter(|w| self.wrap_is_visible(w))
            .count();
        logical_breaks - hidden + wraps + 1
    }

    /// Visual position of a logical position.
    pub fn logical_to_visual(&self, pos: LogicalPosition) -> VisualPosition {
        let line = pos.line.min(self.document.line_count().saturating_sub(1));
        let line_len = self.document.line_length(line);
        let clamped_column = pos.column.min(line_len);
        let offset = self.document.line_start_offset(line) + clamped_column;
        let virtual_columns = if self.virtual_space && pos.column > line_len {
            pos.column - line_len
        } else {
            0
        };

        // Interior-of-fold positions all render at the placeholder.
        if let Some(region) = self.folding.collapsed_region_around(offset) {
            let start = region.start;
            return VisualPosition::new(
                self.visual_line_of_offset(start, false),
                self.visual_column_of_offset(start, false),
            );
        }

        let visual_line = self.visual_line_of_offset(offset, pos.leans_forward);
        let column = self.visual_column_of_offset(offset, pos.leans_forward) + virtual_columns;
        VisualPosition::new_leaning(visual_line, column, pos.leans_forward)
    }

    /// Visual position of a character offset.
    pub fn offset_to_visual(&self, offset: usize, leans_forward: bool) -> VisualPosition {
        let mut logical = self.offset_to_logical(offset);
        logical.leans_forward = leans_forward;
        self.logical_to_visual(logical)
    }

    /// Logical position of a visual position. The row clamps to the last
    /// visual row; columns past the row's content clamp to the row end unless
    /// virtual space is enabled.
    pub fn visual_to_logical(&self, pos: VisualPosition) -> LogicalPosition {
        let row = pos.line.min(self.visual_line_count().saturating_sub(1));
        let (row_start, indent) = self.row_anchor(row);
        let target = pos.column;

        if target <= indent {
            // The wrap indent belongs to no character; it maps to the row
            // start, as does the exact first column.
            return self.logical_at(row_start, false);
        }

        let mut column = indent;
        let mut p = row_start;
        loop {
            if column >= target {
                return self.logical_at(p, false);
            }

            if let Some(region) = self.folding.collapsed_region_starting_at(p) {
                let width = UnicodeWidthStr::width(region.placeholder.as_str()).max(1);
                if column + width > target {
                    // Inside the placeholder: the caret goes to the fold
                    // start, never into the interior.
                    return self.logical_at(region.start, true);
                }
                column += width;
                p = region.end;
                continue;
            }

            let line = self.document.line_of_offset(p);
            let line_end = self.document.line_end_offset(line);
            let row_ends_here = p >= line_end
                || (p > row_start
                    && self.soft_wraps.soft_wrap_at(p).is_some()
                    && self.folding.collapsed_region_around(p).is_none());
            if row_ends_here {
                let line_start = self.document.line_start_offset(line);
                let past_end = target - column;
                return if self.virtual_space && p >= line_end {
                    LogicalPosition::new(line, p - line_start + past_end)
                } else {
                    // Clamped to the row end; the position prefers the
                    // preceding character.
                    LogicalPosition::new_leaning(line, p - line_start, past_end > 0)
                };
            }

            let inlay_width = self.inlays.width_at(p);
            if inlay_width > 0 && column + inlay_width > target {
                // Inside an inline element: the caret goes to its anchor.
                return self.logical_at(p, false);
            }
            column += inlay_width;

            let width = self.char_width_at(p, column);
            if column + width > target {
                // Inside a multi-cell character (tab or wide glyph): snap to
                // the nearer boundary.
                return if (target - column) * 2 >= width {
                    self.logical_at(p + 1, false)
                } else {
                    self.logical_at(p, true)
                };
            }
            column += width;
            p += 1;
        }
    }

    /// Offset of a visual position (through the logical space).
    pub fn visual_to_offset(&self, pos: VisualPosition) -> usize {
        self.logical_to_offset(self.visual_to_logical(pos))
    }

    /// Whether a visual position falls inside the virtual indent cells of a
    /// soft-wrapped continuation row.
    pub fn is_inside_soft_wrap(&self, pos: VisualPosition) -> bool {
        if pos.line >= self.visual_line_count() {
            return false;
        }
        let (row_start, indent) = self.row_anchor(pos.line);
        indent > 0 && pos.column < indent && self.soft_wraps.soft_wrap_at(row_start).is_some()
    }

    /// The last visual column that has content on the given row (the column
    /// just past the row's last cell).
    pub fn last_visual_column(&self, row: usize) -> usize {
        let row = row.min(self.visual_line_count().saturating_sub(1));
        let (row_start, indent) = self.row_anchor(row);
        let row_end = match self.next_row_start(row_start) {
            // The break offset itself starts the next row.
            Some((next_start, _)) => {
                let line = self.document.line_of_offset(next_start);
                if self.document.line_start_offset(line) == next_start {
                    // Broke at a line end; content stops at that line end.
                    self.document
                        .line_end_offset(line.saturating_sub(1))
                } else {
                    next_start
                }
            }
            None => self.document.text_len(),
        };
        indent + self.row_width(row_start, row_end)
    }

    // -------------------------------------------------------------- internals

    fn logical_at(&self, offset: usize, leans_forward: bool) -> LogicalPosition {
        let mut pos = self.offset_to_logical(offset);
        pos.leans_forward = leans_forward;
        pos
    }

    fn wrap_is_visible(&self, wrap: &SoftWrap) -> bool {
        self.folding.collapsed_region_around(wrap.offset).is_none()
    }

    /// Line breaks hidden inside collapsed folds before `offset`.
    fn hidden_line_breaks_before(&self, offset: usize) -> usize {
        self.folding
            .top_level_collapsed_regions()
            .iter()
            .filter(|r| r.start < offset)
            .map(|r| {
                let end = r.end.min(offset);
                self.document.line_of_offset(end) - self.document.line_of_offset(r.start)
            })
            .sum()
    }

    fn char_width_at(&self, offset: usize, column: usize) -> usize {
        match self.document.char_at(offset) {
            Some('\t') => self.tab_size - column % self.tab_size,
            Some(c) => UnicodeWidthChar::width(c).unwrap_or(0),
            None => 0,
        }
    }

    /// Width in cells of the row content in `[start, end)`, skipping collapsed
    /// folds (counted as their placeholder) and adding inlay widths.
    fn row_width(&self, start: usize, end: usize) -> usize {
        let mut column = 0usize;
        let mut p = start;
        while p < end {
            if let Some(region) = self.folding.collapsed_region_starting_at(p) {
                if region.end <= end {
                    column += UnicodeWidthStr::width(region.placeholder.as_str()).max(1);
                    p = region.end;
                    continue;
                }
                break;
            }
            column += self.inlays.width_at(p);
            column += self.char_width_at(p, column);
            p += 1;
        }
        column
    }

    /// Visual column of `offset` within its row. Inline elements at `offset`
    /// that belong with the preceding text render before the position, so
    /// their cells count into the column.
    fn visual_column_of_offset(&self, offset: usize, leans_forward: bool) -> usize {
        let (row_start, indent) = self.row_start_for_offset(offset, leans_forward);
        indent + self.row_width(row_start, offset) + self.inlays.width_before_caret_at(offset)
    }

    /// Start offset and wrap indent of the visual row containing `offset`.
    fn row_start_for_offset(&self, offset: usize, leans_forward: bool) -> (usize, usize) {
        // Start from the logical line start, then extend back across folds
        // that hide the preceding line break(s).
        let mut anchor = self
            .document
            .line_start_offset(self.document.line_of_offset(offset));
        while anchor > 0 {
            match self.folding.collapsed_region_at(anchor - 1) {
                Some(region) => {
                    anchor = self
                        .document
                        .line_start_offset(self.document.line_of_offset(region.start));
                }
                None => break,
            }
        }

        // The last visible wrap in (anchor, offset] starts the row instead.
        let row_wrap = self
            .soft_wraps
            .wraps_in_range(anchor + 1, offset + 1)
            .iter()
            .filter(|w| self.wrap_is_visible(w))
            .filter(|w| w.offset < offset || leans_forward)
            .next_back();
        match row_wrap {
            Some(wrap) => (wrap.offset, wrap.indent_columns),
            None => (anchor, 0),
        }
    }

    /// Start offset and indent of the row after the one starting at
    /// `row_start`, or `None` on the last row.
    fn next_row_start(&self, row_start: usize) -> Option<(usize, usize)> {
        let mut scan = row_start;
        loop {
            let line = self.document.line_of_offset(scan);
            let line_end = self.document.line_end_offset(line);
            let newline = if line + 1 < self.document.line_count() {
                Some(line_end)
            } else {
                None
            };
            let wrap = self
                .soft_wraps
                .wraps()
                .iter()
                .filter(|w| w.offset > scan)
                .find(|w| self.wrap_is_visible(w));

            match (wrap, newline) {
                (Some(w), Some(nl)) if w.offset <= nl => {
                    return Some((w.offset, w.indent_columns));
                }
                (Some(w), None) => return Some((w.offset, w.indent_columns)),
                (_, Some(nl)) => {
                    if let Some(region) = self.folding.collapsed_region_at(nl) {
                        // The line break is hidden; the row continues after
                        // the fold.
                        scan = region.end;
                        continue;
                    }
                    return Some((self.document.line_start_offset(line + 1), 0));
                }
                (None, None) => return None,
            }
        }
    }

    /// Start offset and indent of the given visual row.
    fn row_anchor(&self, row: usize) -> (usize, usize) {
        let mut anchor = (0usize, 0usize);
        for _ in 0..row {
            match self.next_row_start(anchor.0) {
                Some(next) => anchor = next,
                None => break,
            }
        }
        anchor
    }
}
