#![warn(missing_docs)]
//! Caret Core - Headless Editor Caret and Style Iteration Kernel
//!
//! # Overview
//!
//! `caret-core` is the caret/selection and text-attribute engine of a
//! headless editor view. It owns no rendering: the upper layer supplies fold
//! regions, soft wraps, inlays, markup and syntax tokens, and consumes caret
//! positions and merged style runs. Unicode wide characters, grapheme
//! clusters and CRLF line breaks are handled throughout.
//!
//! # Core Features
//!
//! - **Coordinate Mapping**: offset <-> logical <-> visual position, honoring
//!   collapsed folds, soft wraps, inlays and tab stops
//! - **Carets**: self-adjusting markers that survive document edits, cached
//!   positions invalidated by a version stamp, virtual-space columns
//! - **Multi-Caret**: cloning, merge transactions, overlap reconciliation
//! - **Style Iteration**: a sweep over syntax tokens, selection, interval
//!   highlighters, folds, the caret row and guarded blocks, producing
//!   contiguous runs of merged attributes
//! - **Fast Markup Queries**: sorted intervals with prefix-maximum pruning,
//!   O(log n + k) overlap lookups
//!
//! # Quick Start
//!
//! ```rust
//! use caret_core::{EditorView, LogicalPosition};
//!
//! let mut view = EditorView::new("fn main() {\n    body();\n}\n");
//! let caret = view.primary_caret();
//!
//! view.move_caret_to_logical(caret, LogicalPosition::new(1, 4)).unwrap();
//! assert_eq!(view.caret_offset(caret), 16);
//!
//! view.move_caret_relatively(caret, 4, 0, true).unwrap();
//! let selection = view.selection(caret).unwrap();
//! assert_eq!((selection.start, selection.end), (16, 20));
//! ```
//!
//! # Module Description
//!
//! - [`document`] - rope-backed document facade with change events
//! - [`markers`] - self-adjusting offset markers
//! - [`position`] - logical and visual position value types
//! - [`mapper`] - conversions between the coordinate spaces
//! - [`folding`], [`soft_wrap`], [`inlay`] - interval providers
//! - [`attributes`], [`markup`] - text attributes and highlighter stores
//! - [`view`] - the editor view aggregate
//! - [`caret`] - caret and selection operations
//! - [`iteration`] - the style iteration engine

pub mod attributes;
pub mod caret;
pub mod document;
pub mod folding;
pub mod inlay;
pub mod iteration;
pub mod mapper;
pub mod markers;
pub mod markup;
pub mod position;
pub mod soft_wrap;
pub mod view;

pub use attributes::{
    AttributesBuilder, Color, EffectKind, FontStyle, HighlightAttributes, HighlighterTargetArea,
    RangeHighlighter, TextAttributes, TextEffect,
};
pub use caret::{CaretEvent, CaretId, CaretListener, SelectionRange};
pub use document::{DocumentBuffer, DocumentEvent, DocumentListener};
pub use folding::{FoldRegion, FoldingModel};
pub use inlay::{Inlay, InlayModel};
pub use iteration::{CaretData, IterationFlags, IterationState, StyleScheme};
pub use mapper::CoordinateMapper;
pub use markers::{MarkerId, MarkerTree};
pub use markup::{MarkupModel, SyntaxToken, TokenList};
pub use position::{LogicalPosition, VisualPosition};
pub use soft_wrap::{SoftWrap, SoftWrapModel};
pub use view::{EditorView, ViewError, ViewSettings};
