//! Caret model: insertion points, selections, and multi-caret coordination.
//!
//! # Overview
//!
//! Each caret owns a point marker for its position and an optional range
//! marker for its selection; both live in the document's marker store and are
//! translated by the document itself on every edit, so carets survive
//! mutations without observing stale offsets. Logical and visual positions
//! are cached per caret and recomputed lazily when the document's version
//! stamp moves.
//!
//! All mutating operations are methods on [`EditorView`] addressed by
//! [`CaretId`]. A move runs as a small transaction: resolve the target
//! through the coordinate mapper, commit markers and caches, then deliver
//! position-changed events to subscribers. Re-entrant moves are rejected and
//! logged. Overlapping carets are merged after every operation, or once when
//! the outermost [`EditorView::with_caret_merging`] batch ends.

use crate::document::DocumentBuffer;
use crate::markers::MarkerId;
use crate::position::{LogicalPosition, VisualPosition};
use crate::view::{EditorView, ViewError};
use std::cell::Cell;

/// Handle of one caret within its view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaretId(pub(crate) u64);

/// A caret's selection, resolved to offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    /// Start offset (inclusive); always `start <= end`.
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
    /// Virtual columns past line end at the start boundary (column selection
    /// mode only).
    pub virtual_start: usize,
    /// Virtual columns past line end at the end boundary.
    pub virtual_end: usize,
    /// Whether the lead end (the one that moves under shift-extension) is the
    /// range start rather than the end.
    pub lead_at_start: bool,
}

impl SelectionRange {
    /// Offset of the lead end.
    pub fn lead(&self) -> usize {
        if self.lead_at_start { self.start } else { self.end }
    }

    /// Offset of the anchored (non-moving) end.
    pub fn anchor(&self) -> usize {
        if self.lead_at_start { self.end } else { self.start }
    }
}

/// Caret position change notification, delivered after the move commits.
#[derive(Debug, Clone)]
pub struct CaretEvent {
    /// The caret that moved.
    pub caret: CaretId,
    /// Position before the move.
    pub old_position: LogicalPosition,
    /// Position after the move.
    pub new_position: LogicalPosition,
}

/// Caret event callback type.
pub type CaretListener = Box<dyn FnMut(&CaretEvent)>;

#[derive(Debug, Clone, Copy)]
struct CachedPositions {
    version: u64,
    logical: LogicalPosition,
    visual: VisualPosition,
}

#[derive(Debug)]
struct Caret {
    id: CaretId,
    position_marker: MarkerId,
    selection_marker: Option<MarkerId>,
    virtual_start: usize,
    virtual_end: usize,
    lead_at_start: bool,
    /// Which side of an ambiguous boundary (soft wrap, fold edge) the caret
    /// renders on.
    leans_forward: bool,
    /// Virtual-space columns past the line end, when enabled.
    column_adjustment: usize,
    /// Remembered column for vertical movement over ragged lines.
    desired_column: Cell<Option<usize>>,
    cache: Cell<Option<CachedPositions>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveState {
    Idle,
    Moving,
}

/// The caret collection of one view.
pub(crate) struct CaretModel {
    carets: Vec<Caret>,
    primary: CaretId,
    next_id: u64,
    merge_depth: u32,
    move_state: MoveState,
}

impl CaretModel {
    /// Create the model with the always-present primary caret at offset 0.
    pub(crate) fn with_primary(document: &mut DocumentBuffer) -> Self {
        let marker = document.markers_mut().create_point(0);
        let id = CaretId(0);
        Self {
            carets: vec![Caret::new(id, marker)],
            primary: id,
            next_id: 1,
            merge_depth: 0,
            move_state: MoveState::Idle,
        }
    }

    pub(crate) fn release_all(&mut self, document: &mut DocumentBuffer) {
        for caret in self.carets.drain(..) {
            document.markers_mut().release(caret.position_marker);
            if let Some(marker) = caret.selection_marker {
                document.markers_mut().release(marker);
            }
        }
    }

    pub(crate) fn primary_offset(&self, document: &DocumentBuffer) -> usize {
        self.index_of(self.primary)
            .and_then(|idx| document.markers().point(self.carets[idx].position_marker))
            .unwrap_or(0)
    }

    fn index_of(&self, id: CaretId) -> Option<usize> {
        self.carets.iter().position(|c| c.id == id)
    }
}

impl Caret {
    fn new(id: CaretId, position_marker: MarkerId) -> Self {
        Self {
            id,
            position_marker,
            selection_marker: None,
            virtual_start: 0,
            virtual_end: 0,
            lead_at_start: false,
            leans_forward: false,
            column_adjustment: 0,
            desired_column: Cell::new(None),
            cache: Cell::new(None),
        }
    }
}

/// Outcome of the read phase of a move, committed in one step.
struct ResolvedMove {
    offset: usize,
    leans_forward: bool,
    column_adjustment: usize,
    logical: LogicalPosition,
    visual: VisualPosition,
}

impl EditorView {
    // --------------------------------------------------------------- queries

    /// Handle of the primary caret.
    pub fn primary_caret(&self) -> CaretId {
        self.carets.primary
    }

    /// Handles of all live carets, in creation/merge order.
    pub fn caret_ids(&self) -> Vec<CaretId> {
        self.carets.carets.iter().map(|c| c.id).collect()
    }

    /// Number of live carets.
    pub fn caret_count(&self) -> usize {
        self.carets.carets.len()
    }

    /// The caret's offset. Unknown carets degrade to offset 0 with a logged
    /// error instead of failing.
    pub fn caret_offset(&self, id: CaretId) -> usize {
        match self.carets.index_of(id) {
            Some(idx) => self
                .document
                .markers()
                .point(self.carets.carets[idx].position_marker)
                .unwrap_or(0),
            None => {
                log::error!("caret_offset: {id:?} is not a live caret of this view");
                0
            }
        }
    }

    /// The caret's logical position, including virtual-space columns.
    pub fn caret_logical_position(&self, id: CaretId) -> LogicalPosition {
        match self.carets.index_of(id) {
            Some(idx) => self.caret_positions(idx).0,
            None => {
                log::error!("caret_logical_position: {id:?} is not a live caret of this view");
                LogicalPosition::new(0, 0)
            }
        }
    }

    /// The caret's visual position, including virtual-space columns.
    pub fn caret_visual_position(&self, id: CaretId) -> VisualPosition {
        match self.carets.index_of(id) {
            Some(idx) => self.caret_positions(idx).1,
            None => {
                log::error!("caret_visual_position: {id:?} is not a live caret of this view");
                VisualPosition::new(0, 0)
            }
        }
    }

    /// The caret's selection, if any.
    pub fn selection(&self, id: CaretId) -> Option<SelectionRange> {
        let idx = self.carets.index_of(id)?;
        let caret = &self.carets.carets[idx];
        let marker = caret.selection_marker?;
        let (start, end) = self.document.markers().range(marker)?;
        if start == end && caret.virtual_start == caret.virtual_end {
            return None;
        }
        Some(SelectionRange {
            start,
            end,
            virtual_start: caret.virtual_start,
            virtual_end: caret.virtual_end,
            lead_at_start: caret.lead_at_start,
        })
    }

    /// Subscribe to caret position changes.
    pub fn subscribe_carets(&mut self, listener: CaretListener) {
        self.caret_listeners.push(listener);
    }

    fn caret_positions(&self, idx: usize) -> (LogicalPosition, VisualPosition) {
        let caret = &self.carets.carets[idx];
        if let Some(cached) = caret.cache.get() {
            if cached.version == self.document.version() {
                return (cached.logical, cached.visual);
            }
        }
        let offset = self
            .document
            .markers()
            .point(caret.position_marker)
            .unwrap_or(0);
        let mapper = self.mapper();
        let mut logical = mapper.offset_to_logical(offset);
        logical.leans_forward = caret.leans_forward;
        let mut visual = mapper.logical_to_visual(logical);
        logical.column += caret.column_adjustment;
        visual.column += caret.column_adjustment;
        caret.cache.set(Some(CachedPositions {
            version: self.document.version(),
            logical,
            visual,
        }));
        (logical, visual)
    }

    // ----------------------------------------------------------------- moves

    /// Move the caret to `offset`.
    ///
    /// The offset clamps into the text, snaps to a grapheme boundary, and
    /// snaps out of collapsed fold interiors in the direction of travel. With
    /// `locate_before_soft_wrap`, a caret landing exactly on a soft wrap stays
    /// at the end of the wrapped row instead of the continuation row.
    pub fn move_caret_to_offset(
        &mut self,
        id: CaretId,
        offset: usize,
        locate_before_soft_wrap: bool,
    ) -> Result<(), ViewError> {
        self.ensure_live()?;
        let idx = self.live_caret(id)?;
        let old_offset = self.caret_offset(id);
        let resolved = self.resolve_offset(old_offset, offset, locate_before_soft_wrap, 0);
        self.carets.carets[idx].desired_column.set(None);
        self.commit_move(idx, resolved, false)
    }

    /// Move the caret to a logical position. The line clamps to the document,
    /// the column to the line end unless virtual space is enabled. Collapsed
    /// folds containing the destination are expanded.
    pub fn move_caret_to_logical(
        &mut self,
        id: CaretId,
        pos: LogicalPosition,
    ) -> Result<(), ViewError> {
        self.ensure_live()?;
        let idx = self.live_caret(id)?;

        if pos.line >= self.document.line_count() {
            log::error!(
                "move_caret_to_logical: line {} outside the document ({} lines); clamping",
                pos.line,
                self.document.line_count()
            );
        }
        let line = pos.line.min(self.document.line_count().saturating_sub(1));
        let line_len = self.document.line_length(line);
        let adjustment = if self.settings.virtual_space && pos.column > line_len {
            pos.column - line_len
        } else {
            0
        };
        let offset = self.document.line_start_offset(line) + pos.column.min(line_len);

        // Entering a fold by explicit position expands it.
        self.folding.expand_containing(offset);

        let old_offset = self.caret_offset(id);
        let resolved = self.resolve_offset(old_offset, offset, false, adjustment);
        self.carets.carets[idx].desired_column.set(None);
        self.commit_move(idx, resolved, false)
    }

    /// Move the caret to a visual position. The row clamps to the last visual
    /// row; the column clamps to the row content unless virtual space is
    /// enabled or the position falls inside a soft wrap's indent.
    pub fn move_caret_to_visual(
        &mut self,
        id: CaretId,
        pos: VisualPosition,
    ) -> Result<(), ViewError> {
        self.ensure_live()?;
        let idx = self.live_caret(id)?;

        let logical = {
            let mapper = self.mapper();
            if pos.line >= mapper.visual_line_count() {
                log::error!(
                    "move_caret_to_visual: row {} outside the view ({} rows); clamping",
                    pos.line,
                    mapper.visual_line_count()
                );
            }
            mapper.visual_to_logical(pos)
        };

        let line_len = self.document.line_length(logical.line);
        let adjustment = logical.column.saturating_sub(line_len);
        let offset =
            self.document.line_start_offset(logical.line) + logical.column.min(line_len);

        let old_offset = self.caret_offset(id);
        let mut resolved = self.resolve_offset(old_offset, offset, false, adjustment);
        resolved.leans_forward = logical.leans_forward;
        self.carets.carets[idx].desired_column.set(None);
        self.commit_move(idx, resolved, false)
    }

    /// Move the caret by visual columns and rows.
    ///
    /// Single-column horizontal moves step in offset space, so they cross
    /// inlay runs and tab spans whole and wrap across row boundaries (unless
    /// virtual space keeps the caret on its line). Vertical moves remember
    /// the starting column and restore it across ragged-width rows. With
    /// `with_selection`, the move extends a selection anchored at the current
    /// anchor point; moving above the first row selects to the document
    /// start.
    pub fn move_caret_relatively(
        &mut self,
        id: CaretId,
        column_shift: isize,
        line_shift: isize,
        with_selection: bool,
    ) -> Result<(), ViewError> {
        self.ensure_live()?;
        let idx = self.live_caret(id)?;

        let old_offset = self.caret_offset(id);
        let caret = &self.carets.carets[idx];
        let old_adjustment = caret.column_adjustment;
        let anchor = match self.selection(id) {
            Some(sel) if with_selection => (sel.anchor(), if sel.lead_at_start { sel.virtual_end } else { sel.virtual_start }),
            _ => (old_offset, old_adjustment),
        };

        let resolved = if line_shift == 0 {
            self.resolve_horizontal(idx, old_offset, column_shift)
        } else {
            self.resolve_vertical(idx, column_shift, line_shift, with_selection)
        };

        // The caret must survive until the selection update, so merging is
        // deferred across both steps.
        let new_offset = resolved.offset;
        let new_adjustment = resolved.column_adjustment;
        self.carets.merge_depth += 1;
        let result = self.commit_move(idx, resolved, false).and_then(|()| {
            if with_selection {
                self.set_selection_with_virtual(id, anchor.0, anchor.1, new_offset, new_adjustment)
            } else {
                self.clear_selection(id)
            }
        });
        self.carets.merge_depth -= 1;
        if self.carets.merge_depth == 0 {
            self.merge_carets();
        }
        result
    }

    fn resolve_horizontal(
        &self,
        idx: usize,
        old_offset: usize,
        column_shift: isize,
    ) -> ResolvedMove {
        self.carets.carets[idx].desired_column.set(None);
        let mut offset = old_offset;
        let mut adjustment = self.carets.carets[idx].column_adjustment;
        let line = self.document.line_of_offset(offset);
        let line_end = self.document.line_end_offset(line);

        let mut remaining = column_shift;
        while remaining > 0 {
            if self.settings.virtual_space && offset >= line_end && adjustment > 0 {
                adjustment += 1;
            } else if self.settings.virtual_space && offset >= line_end {
                adjustment = 1;
            } else {
                offset = step_forward(&self.document, offset);
            }
            remaining -= 1;
        }
        while remaining < 0 {
            if adjustment > 0 {
                adjustment -= 1;
            } else {
                offset = step_backward(&self.document, offset);
            }
            remaining += 1;
        }

        // A step landing inside a collapsed fold skips over the whole region.
        if let Some(region) = self.folding.collapsed_region_around(offset) {
            offset = if column_shift > 0 {
                region.end
            } else {
                region.start
            };
        }

        let mut resolved = self.resolve_offset(old_offset, offset, false, adjustment);
        // Moving right onto a soft wrap lands on the continuation row.
        if self.soft_wraps.soft_wrap_at(resolved.offset).is_some() {
            resolved.leans_forward = column_shift > 0;
            resolved.visual = self
                .mapper()
                .offset_to_visual(resolved.offset, resolved.leans_forward);
        }
        resolved
    }

    fn resolve_vertical(
        &self,
        idx: usize,
        column_shift: isize,
        line_shift: isize,
        with_selection: bool,
    ) -> ResolvedMove {
        let (_, visual) = self.caret_positions(idx);
        let caret = &self.carets.carets[idx];
        let start_column = caret.desired_column.get().unwrap_or(visual.column);
        let target_column = start_column.saturating_add_signed(column_shift);
        caret.desired_column.set(Some(start_column));

        let target_line = visual.line as isize + line_shift;
        if target_line < 0 {
            if with_selection {
                // Selecting above the first row selects to the document start.
                let old_offset = self.caret_offset(caret.id);
                return self.resolve_offset(old_offset, 0, false, 0);
            }
            return self.resolve_visual(idx, VisualPosition::new(0, target_column));
        }

        let row = {
            let mapper = self.mapper();
            (target_line as usize).min(mapper.visual_line_count().saturating_sub(1))
        };
        self.resolve_visual(idx, VisualPosition::new(row, target_column))
    }

    fn resolve_visual(&self, idx: usize, pos: VisualPosition) -> ResolvedMove {
        let logical = self.mapper().visual_to_logical(pos);
        let line_len = self.document.line_length(logical.line);
        let adjustment = logical.column.saturating_sub(line_len);
        let offset =
            self.document.line_start_offset(logical.line) + logical.column.min(line_len);
        let old_offset = self
            .document
            .markers()
            .point(self.carets.carets[idx].position_marker)
            .unwrap_or(0);
        self.resolve_offset(old_offset, offset, false, adjustment)
    }

    /// Read phase: clamp, boundary-snap and map the requested offset.
    fn resolve_offset(
        &self,
        old_offset: usize,
        requested: usize,
        locate_before_soft_wrap: bool,
        column_adjustment: usize,
    ) -> ResolvedMove {
        let len = self.document.text_len();
        if requested > len {
            log::error!("caret move: offset {requested} outside [0, {len}]; clamping");
        }
        let mut offset = requested.min(len);
        offset = self
            .document
            .snap_to_grapheme_boundary(offset, offset > old_offset);

        // Collapsed fold interiors snap to the boundary in the direction of
        // travel.
        if let Some(region) = self.folding.collapsed_region_around(offset) {
            offset = if old_offset <= region.start {
                region.start
            } else {
                region.end
            };
        }

        let at_wrap = self.soft_wraps.soft_wrap_at(offset).is_some();
        let leans_forward = at_wrap && !locate_before_soft_wrap;

        let mapper = self.mapper();
        let mut logical = mapper.offset_to_logical(offset);
        logical.leans_forward = leans_forward;

        // The resolved position must map back to the same offset.
        let round_trip = mapper.logical_to_offset(logical);
        if round_trip != offset {
            let window_start = offset.saturating_sub(20);
            let window = self.document.slice(window_start..offset + 20);
            log::error!(
                "caret position inconsistency: offset {offset} -> {logical} -> {round_trip}; \
                 text near offset: {window:?}; keeping the recomputed position"
            );
        }

        let mut visual = mapper.logical_to_visual(logical);
        logical.column += column_adjustment;
        visual.column += column_adjustment;

        ResolvedMove {
            offset,
            leans_forward,
            column_adjustment,
            logical,
            visual,
        }
    }

    /// Write phase: commit the resolved move, then deliver events and merge.
    fn commit_move(
        &mut self,
        idx: usize,
        resolved: ResolvedMove,
        suppress_merge: bool,
    ) -> Result<(), ViewError> {
        if self.carets.move_state == MoveState::Moving {
            log::error!("re-entrant caret move rejected");
            return Ok(());
        }
        self.carets.move_state = MoveState::Moving;

        let (old_logical, _) = self.caret_positions(idx);
        let caret = &mut self.carets.carets[idx];
        let id = caret.id;
        self.document
            .markers_mut()
            .set_point(caret.position_marker, resolved.offset);
        caret.leans_forward = resolved.leans_forward;
        caret.column_adjustment = resolved.column_adjustment;
        caret.cache.set(Some(CachedPositions {
            version: self.document.version(),
            logical: resolved.logical,
            visual: resolved.visual,
        }));

        self.carets.move_state = MoveState::Idle;

        if old_logical != resolved.logical {
            let event = CaretEvent {
                caret: id,
                old_position: old_logical,
                new_position: resolved.logical,
            };
            self.deliver_caret_event(&event);
        }

        if !suppress_merge && self.carets.merge_depth == 0 {
            self.merge_carets();
        }
        Ok(())
    }

    fn deliver_caret_event(&mut self, event: &CaretEvent) {
        let mut listeners = std::mem::take(&mut self.caret_listeners);
        for listener in &mut listeners {
            listener(event);
        }
        listeners.append(&mut self.caret_listeners);
        self.caret_listeners = listeners;
    }

    // ------------------------------------------------------------- selection

    /// Select `[start, end)` with `end` as the lead end. The stored range is
    /// normalized to `start <= end`; a boundary inside a collapsed fold
    /// expands outward to cover the whole region.
    pub fn set_selection(&mut self, id: CaretId, start: usize, end: usize) -> Result<(), ViewError> {
        self.set_selection_with_virtual(id, start, 0, end, 0)
    }

    /// Select between `(anchor, anchor_virtual)` and `(lead, lead_virtual)`,
    /// where the virtual components count columns past the line end. Virtual
    /// columns are kept only in column selection mode with both boundaries on
    /// one logical line; otherwise they reset to zero.
    pub fn set_selection_with_virtual(
        &mut self,
        id: CaretId,
        anchor: usize,
        anchor_virtual: usize,
        lead: usize,
        lead_virtual: usize,
    ) -> Result<(), ViewError> {
        self.ensure_live()?;
        let idx = self.live_caret(id)?;

        let len = self.document.text_len();
        if anchor > len || lead > len {
            log::error!("set_selection: range [{anchor}, {lead}) outside [0, {len}]; clamping");
        }
        let anchor = anchor.min(len);
        let lead = lead.min(len);

        // Normalize so start <= end, remembering which end leads.
        let (mut start, start_virtual, mut end, end_virtual, lead_at_start) =
            if (lead, lead_virtual) < (anchor, anchor_virtual) {
                (lead, lead_virtual, anchor, anchor_virtual, true)
            } else {
                (anchor, anchor_virtual, lead, lead_virtual, false)
            };

        // A boundary strictly inside a collapsed fold extends outward.
        if let Some(region) = self.folding.collapsed_region_around(start) {
            start = region.start;
        }
        if let Some(region) = self.folding.collapsed_region_around(end) {
            end = region.end;
        }

        let use_virtual = self.settings.column_selection_mode
            && self.document.line_of_offset(start) == self.document.line_of_offset(end);
        let (start_virtual, end_virtual) = if use_virtual {
            (start_virtual, end_virtual)
        } else {
            (0, 0)
        };

        let caret = &mut self.carets.carets[idx];
        match caret.selection_marker {
            Some(marker) => self.document.markers_mut().set_range(marker, start, end),
            None => {
                caret.selection_marker = Some(self.document.markers_mut().create_range(start, end));
            }
        }
        caret.virtual_start = start_virtual;
        caret.virtual_end = end_virtual;
        caret.lead_at_start = lead_at_start;

        if self.carets.merge_depth == 0 {
            self.merge_carets();
        }
        Ok(())
    }

    /// Remove the caret's selection, if any.
    pub fn clear_selection(&mut self, id: CaretId) -> Result<(), ViewError> {
        self.ensure_live()?;
        let idx = self.live_caret(id)?;
        let caret = &mut self.carets.carets[idx];
        if let Some(marker) = caret.selection_marker.take() {
            self.document.markers_mut().release(marker);
        }
        caret.virtual_start = 0;
        caret.virtual_end = 0;
        caret.lead_at_start = false;
        Ok(())
    }

    // ------------------------------------------------------------ collection

    /// Add a secondary caret at the given logical position. Returns `None`
    /// when a caret already sits at the resolved offset.
    pub fn add_caret_at(&mut self, pos: LogicalPosition) -> Result<Option<CaretId>, ViewError> {
        self.ensure_live()?;
        let offset = self.mapper().logical_to_offset(pos);
        if self.caret_ids().iter().any(|&id| self.caret_offset(id) == offset) {
            return Ok(None);
        }

        let marker = self.document.markers_mut().create_point(offset);
        let id = CaretId(self.carets.next_id);
        self.carets.next_id += 1;
        self.carets.carets.push(Caret::new(id, marker));
        Ok(Some(id))
    }

    /// Clone the caret one visual row above or below, replicating the
    /// selection shape shifted by one line. Returns `None` when the target
    /// row is outside the document or the clone would coincide with an
    /// existing caret.
    pub fn clone_caret(&mut self, id: CaretId, above: bool) -> Result<Option<CaretId>, ViewError> {
        self.ensure_live()?;
        let idx = self.live_caret(id)?;
        let (_, visual) = self.caret_positions(idx);

        let target_row = if above {
            match visual.line.checked_sub(1) {
                Some(row) => row,
                None => return Ok(None),
            }
        } else {
            visual.line + 1
        };
        {
            let mapper = self.mapper();
            if target_row >= mapper.visual_line_count() {
                return Ok(None);
            }
        }

        let target = self
            .mapper()
            .visual_to_offset(VisualPosition::new(target_row, visual.column));
        if self.caret_ids().iter().any(|&c| self.caret_offset(c) == target) {
            return Ok(None);
        }

        // Replicate the selection shifted by one logical line, columns
        // preserved and clamped at the target lines' lengths.
        let shifted_selection = self.selection(id).map(|sel| {
            let mapper = self.mapper();
            let shift = |offset: usize| {
                let pos = mapper.offset_to_logical(offset);
                let line = if above {
                    pos.line.saturating_sub(1)
                } else {
                    (pos.line + 1).min(self.document.line_count() - 1)
                };
                mapper.logical_to_offset(LogicalPosition::new(line, pos.column))
            };
            (shift(sel.anchor()), shift(sel.lead()))
        });

        let marker = self.document.markers_mut().create_point(target);
        let new_id = CaretId(self.carets.next_id);
        self.carets.next_id += 1;
        let mut clone = Caret::new(new_id, marker);
        clone.desired_column.set(Some(visual.column));
        self.carets.carets.push(clone);

        if let Some((anchor, lead)) = shifted_selection {
            self.set_selection(new_id, anchor, lead)?;
        }
        Ok(Some(new_id))
    }

    /// Remove a secondary caret, releasing its markers. The last remaining
    /// caret cannot be removed; disposing the primary promotes the next
    /// caret. Unknown carets are ignored (disposal is idempotent).
    pub fn dispose_caret(&mut self, id: CaretId) -> Result<(), ViewError> {
        self.ensure_live()?;
        let Some(idx) = self.carets.index_of(id) else {
            return Ok(());
        };
        if self.carets.carets.len() == 1 {
            log::error!("dispose_caret: refusing to remove the only caret");
            return Ok(());
        }

        let caret = self.carets.carets.remove(idx);
        self.document.markers_mut().release(caret.position_marker);
        if let Some(marker) = caret.selection_marker {
            self.document.markers_mut().release(marker);
        }
        if self.carets.primary == id {
            self.carets.primary = self.carets.carets[0].id;
        }
        Ok(())
    }

    /// Run `action` as one caret-merging transaction: overlapping carets are
    /// reconciled once when the outermost batch completes, not after each
    /// individual move.
    pub fn with_caret_merging<R>(&mut self, action: impl FnOnce(&mut Self) -> R) -> R {
        self.carets.merge_depth += 1;
        let result = action(self);
        self.carets.merge_depth -= 1;
        if self.carets.merge_depth == 0 {
            self.merge_carets();
        }
        result
    }

    /// Merge carets that coincide or whose selections overlap, keeping the
    /// earlier caret and the union of the selections.
    fn merge_carets(&mut self) {
        if self.carets.carets.len() < 2 {
            return;
        }

        let mut order: Vec<usize> = (0..self.carets.carets.len()).collect();
        order.sort_by_key(|&idx| {
            self.document
                .markers()
                .point(self.carets.carets[idx].position_marker)
                .unwrap_or(0)
        });

        let mut removed: Vec<CaretId> = Vec::new();
        let mut kept_idx = order[0];
        for &idx in &order[1..] {
            let kept_offset = self.marker_point(kept_idx);
            let offset = self.marker_point(idx);
            let kept_sel = self.selection_of_index(kept_idx);
            let sel = self.selection_of_index(idx);

            let coincide = offset == kept_offset;
            let overlap = match (&kept_sel, &sel) {
                (Some(a), Some(b)) => a.start < b.end && b.start < a.end,
                _ => false,
            };
            if coincide || overlap {
                // Union the selections onto the kept caret.
                if let (Some(a), Some(b)) = (&kept_sel, &sel) {
                    let start = a.start.min(b.start);
                    let end = a.end.max(b.end);
                    if let Some(marker) = self.carets.carets[kept_idx].selection_marker {
                        self.document.markers_mut().set_range(marker, start, end);
                    }
                } else if let (None, Some(b)) = (&kept_sel, &sel) {
                    let marker = self.document.markers_mut().create_range(b.start, b.end);
                    self.carets.carets[kept_idx].selection_marker = Some(marker);
                    self.carets.carets[kept_idx].lead_at_start = b.lead_at_start;
                }
                removed.push(self.carets.carets[idx].id);
            } else {
                kept_idx = idx;
            }
        }

        for id in removed {
            let Some(idx) = self.carets.index_of(id) else {
                continue;
            };
            let caret = self.carets.carets.remove(idx);
            self.document.markers_mut().release(caret.position_marker);
            if let Some(marker) = caret.selection_marker {
                self.document.markers_mut().release(marker);
            }
            if self.carets.primary == id {
                self.carets.primary = self.carets.carets[0].id;
            }
        }
    }

    fn marker_point(&self, idx: usize) -> usize {
        self.document
            .markers()
            .point(self.carets.carets[idx].position_marker)
            .unwrap_or(0)
    }

    fn selection_of_index(&self, idx: usize) -> Option<SelectionRange> {
        let id = self.carets.carets[idx].id;
        self.selection(id)
    }

    fn live_caret(&self, id: CaretId) -> Result<usize, ViewError> {
        self.carets.index_of(id).ok_or(ViewError::UnknownCaret(id))
    }
}

/// One caret step left, crossing line breaks whole (CRLF counts as one) and
/// never splitting a grapheme cluster.
fn step_backward(document: &DocumentBuffer, offset: usize) -> usize {
    if offset == 0 {
        return 0;
    }
    let mut target = offset - 1;
    if document.char_at(target) == Some('\n')
        && target > 0
        && document.char_at(target - 1) == Some('\r')
    {
        target -= 1;
    }
    document.snap_to_grapheme_boundary(target, false)
}

/// One caret step right.
fn step_forward(document: &DocumentBuffer, offset: usize) -> usize {
    let len = document.text_len();
    if offset >= len {
        return len;
    }
    let mut target = offset + 1;
    if document.char_at(offset) == Some('\r') && document.char_at(target) == Some('\n') {
        target += 1;
    }
    document.snap_to_grapheme_boundary(target, true)
}
