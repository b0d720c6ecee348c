//! Editor view: the aggregate owning the document and all interval providers.
//!
//! # Overview
//!
//! [`EditorView`] ties together the document buffer, the folding, soft-wrap,
//! inlay and markup models, the syntax token stream, guarded blocks, the view
//! settings and the caret model. Edits go through the view so every provider
//! gets its offsets translated in the same transaction before listeners run.
//!
//! Caret operations live in the caret module; coordinate conversions are
//! obtained per batch via [`EditorView::mapper`].

use crate::caret::{CaretListener, CaretModel};
use crate::document::{DocumentBuffer, DocumentEvent};
use crate::folding::FoldingModel;
use crate::inlay::InlayModel;
use crate::mapper::CoordinateMapper;
use crate::markers::translate_offset;
use crate::markup::{MarkupModel, TokenList};
use crate::soft_wrap::SoftWrapModel;
use std::ops::Range;
use thiserror::Error;

pub use crate::caret::CaretId;

/// Behavior switches of one view.
#[derive(Debug, Clone)]
pub struct ViewSettings {
    /// Tab stop width in cells.
    pub tab_size: usize,
    /// Whether the caret may occupy columns past a line's content.
    pub virtual_space: bool,
    /// Whether selections are column (block) selections.
    pub column_selection_mode: bool,
    /// Whether a pinned line is currently rendered over the caret row; this
    /// suppresses the caret-row background during style iteration.
    pub sticky_line_shown: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            tab_size: 4,
            virtual_space: false,
            column_selection_mode: false,
            sticky_line_shown: false,
        }
    }
}

/// Fatal view errors. Everything else is logged and recovered locally.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    /// The view was disposed; no further operations are meaningful.
    #[error("editor view has been disposed")]
    Disposed,
    /// The caret handle does not refer to a live caret of this view.
    #[error("unknown caret {0:?}")]
    UnknownCaret(CaretId),
}

/// The editor view aggregate.
pub struct EditorView {
    pub(crate) document: DocumentBuffer,
    pub(crate) folding: FoldingModel,
    pub(crate) soft_wraps: SoftWrapModel,
    pub(crate) inlays: InlayModel,
    pub(crate) document_markup: MarkupModel,
    pub(crate) view_markup: MarkupModel,
    pub(crate) syntax: TokenList,
    pub(crate) guarded_blocks: Vec<Range<usize>>,
    pub(crate) settings: ViewSettings,
    pub(crate) carets: CaretModel,
    pub(crate) caret_listeners: Vec<CaretListener>,
    pub(crate) disposed: bool,
}

impl EditorView {
    /// Create a view over the given text with default settings and a single
    /// primary caret at offset 0.
    pub fn new(text: &str) -> Self {
        let mut document = DocumentBuffer::from_text(text);
        let carets = CaretModel::with_primary(&mut document);
        Self {
            document,
            folding: FoldingModel::new(),
            soft_wraps: SoftWrapModel::new(),
            inlays: InlayModel::new(),
            document_markup: MarkupModel::new(),
            view_markup: MarkupModel::new(),
            syntax: TokenList::new(),
            guarded_blocks: Vec::new(),
            settings: ViewSettings::default(),
            carets,
            caret_listeners: Vec::new(),
            disposed: false,
        }
    }

    pub(crate) fn ensure_live(&self) -> Result<(), ViewError> {
        if self.disposed {
            Err(ViewError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Whether the view has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Dispose the view. All caret markers are released; subsequent caret
    /// operations fail with [`ViewError::Disposed`]. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.carets.release_all(&mut self.document);
        self.caret_listeners.clear();
        self.disposed = true;
    }

    // ---------------------------------------------------------------- access

    /// The document buffer.
    pub fn document(&self) -> &DocumentBuffer {
        &self.document
    }

    /// The folding model.
    pub fn folding(&self) -> &FoldingModel {
        &self.folding
    }

    /// Mutable folding model, for fold registration and collapse/expand.
    pub fn folding_mut(&mut self) -> &mut FoldingModel {
        &mut self.folding
    }

    /// The soft wrap model.
    pub fn soft_wraps(&self) -> &SoftWrapModel {
        &self.soft_wraps
    }

    /// Mutable soft wrap model, for the render layer to register wraps.
    pub fn soft_wraps_mut(&mut self) -> &mut SoftWrapModel {
        &mut self.soft_wraps
    }

    /// The inlay model.
    pub fn inlays(&self) -> &InlayModel {
        &self.inlays
    }

    /// Mutable inlay model.
    pub fn inlays_mut(&mut self) -> &mut InlayModel {
        &mut self.inlays
    }

    /// Document-scoped markup (shared highlight semantics, e.g. diagnostics).
    pub fn document_markup(&self) -> &MarkupModel {
        &self.document_markup
    }

    /// Mutable document-scoped markup.
    pub fn document_markup_mut(&mut self) -> &mut MarkupModel {
        &mut self.document_markup
    }

    /// View-scoped markup (e.g. search results, bracket matches).
    pub fn view_markup(&self) -> &MarkupModel {
        &self.view_markup
    }

    /// Mutable view-scoped markup.
    pub fn view_markup_mut(&mut self) -> &mut MarkupModel {
        &mut self.view_markup
    }

    /// The syntax token stream.
    pub fn syntax(&self) -> &TokenList {
        &self.syntax
    }

    /// Mutable syntax token stream, for the lexer to publish tokens.
    pub fn syntax_mut(&mut self) -> &mut TokenList {
        &mut self.syntax
    }

    /// View settings.
    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    /// Mutable view settings.
    pub fn settings_mut(&mut self) -> &mut ViewSettings {
        &mut self.settings
    }

    /// A coordinate mapper over the current model state.
    pub fn mapper(&self) -> CoordinateMapper<'_> {
        CoordinateMapper::new(
            &self.document,
            &self.folding,
            &self.soft_wraps,
            &self.inlays,
            &self.settings,
        )
    }

    // --------------------------------------------------------------- guarded

    /// Register a read-only block over `[start, end)`.
    pub fn add_guarded_block(&mut self, start: usize, end: usize) {
        if end <= start {
            log::error!("add_guarded_block: empty range [{start}, {end}) ignored");
            return;
        }
        let pos = self.guarded_blocks.partition_point(|b| b.start <= start);
        self.guarded_blocks.insert(pos, start..end);
    }

    /// Registered read-only blocks, sorted by start.
    pub fn guarded_blocks(&self) -> &[Range<usize>] {
        &self.guarded_blocks
    }

    /// Whether `offset` falls inside a read-only block.
    pub fn is_offset_guarded(&self, offset: usize) -> bool {
        self.guarded_blocks
            .iter()
            .any(|b| b.start <= offset && offset < b.end)
    }

    /// The caret row of the primary caret as an offset range covering the
    /// whole logical line, including its line break.
    pub fn caret_row_range(&self) -> Range<usize> {
        let offset = self.carets.primary_offset(&self.document);
        let line = self.document.line_of_offset(offset);
        let start = self.document.line_start_offset(line);
        let end = if line + 1 < self.document.line_count() {
            self.document.line_start_offset(line + 1)
        } else {
            self.document.text_len()
        };
        start..end
    }

    // ----------------------------------------------------------------- edits

    /// Insert `text` at `offset` and translate every provider.
    pub fn insert(&mut self, offset: usize, text: &str) {
        let len = text.chars().count();
        if len == 0 {
            return;
        }
        let offset = offset.min(self.document.text_len());
        self.document.insert(offset, text);
        self.after_edit(offset, 0, len);
    }

    /// Delete `range` and translate every provider.
    pub fn delete(&mut self, range: Range<usize>) {
        let len = self.document.text_len();
        let start = range.start.min(len);
        let end = range.end.min(len).max(start);
        if start == end {
            return;
        }
        self.document.delete(start..end);
        self.after_edit(start, end - start, 0);
    }

    /// Replace `range` with `text` as a single change.
    pub fn replace(&mut self, range: Range<usize>, text: &str) {
        let len = self.document.text_len();
        let start = range.start.min(len);
        let end = range.end.min(len).max(start);
        let new_len = text.chars().count();
        if start == end && new_len == 0 {
            return;
        }
        self.document.replace(start..end, text);
        self.after_edit(start, end - start, new_len);
    }

    /// Translate guarded blocks and provider models after an edit. Caret
    /// markers are translated by the document itself; caret caches invalidate
    /// through the version stamp.
    fn after_edit(&mut self, offset: usize, old_len: usize, new_len: usize) {
        self.folding.on_document_change(offset, old_len, new_len);
        self.soft_wraps.on_document_change(offset, old_len, new_len);
        self.inlays.on_document_change(offset, old_len, new_len);
        self.document_markup
            .on_document_change(offset, old_len, new_len);
        self.view_markup.on_document_change(offset, old_len, new_len);
        // Tokens are stale until the lexer republishes them.
        self.syntax.clear();

        for block in &mut self.guarded_blocks {
            block.start = translate_offset(block.start, offset, old_len, new_len);
            block.end = translate_offset(block.end, offset, old_len, new_len).max(block.start);
        }
        self.guarded_blocks.retain(|b| b.end > b.start);
    }

    /// Subscribe to the view's document events.
    pub fn subscribe_document(&mut self, listener: Box<dyn FnMut(&DocumentEvent)>) {
        self.document.subscribe(listener);
    }
}
