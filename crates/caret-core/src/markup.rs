//! Highlighter sources: range highlighters and the syntax token stream.
//!
//! Two [`MarkupModel`] instances feed the style iteration engine: one scoped
//! to the document (shared across views) and one scoped to the view. Both
//! answer overlap queries over `[start, end)`. The store is a sorted vector
//! with a prefix-maximum-end array, giving O(log n + k) overlap queries
//! without degrading to a linear scan when highlighters pile up.
//!
//! The syntax highlighter contributes a third source: a flat, ordered stream
//! of lexer tokens ([`TokenList`]), consumed by index during iteration.

use crate::attributes::{HighlighterTargetArea, RangeHighlighter, TextAttributes};
use crate::markers::translate_offset;

/// Store of range highlighters for one scope (document or view).
#[derive(Debug, Default)]
pub struct MarkupModel {
    /// Highlighters sorted by start offset.
    highlighters: Vec<RangeHighlighter>,
    /// `prefix_max_end[i] = max(highlighters[0..=i].end)`, for query pruning.
    prefix_max_end: Vec<usize>,
}

impl MarkupModel {
    /// Create an empty markup model.
    pub fn new() -> Self {
        Self::default()
    }

    fn rebuild_prefix_max_end(&mut self) {
        self.prefix_max_end.clear();
        let mut max_end = 0usize;
        for highlighter in &self.highlighters {
            max_end = max_end.max(highlighter.end);
            self.prefix_max_end.push(max_end);
        }
    }

    /// Add a highlighter, keeping the store sorted by start offset.
    pub fn add_highlighter(&mut self, highlighter: RangeHighlighter) {
        let pos = self
            .highlighters
            .partition_point(|h| h.start <= highlighter.start);
        self.highlighters.insert(pos, highlighter);
        self.rebuild_prefix_max_end();
    }

    /// Remove highlighters matching exactly the given range and layer.
    pub fn remove_highlighters(&mut self, start: usize, end: usize, layer: i32) -> usize {
        let before = self.highlighters.len();
        self.highlighters
            .retain(|h| !(h.start == start && h.end == end && h.layer == layer));
        let removed = before - self.highlighters.len();
        if removed > 0 {
            self.rebuild_prefix_max_end();
        }
        removed
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.highlighters.clear();
        self.prefix_max_end.clear();
    }

    /// Number of stored highlighters (including invalid ones).
    pub fn len(&self) -> usize {
        self.highlighters.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.highlighters.is_empty()
    }

    /// All highlighters in start order.
    pub fn highlighters(&self) -> &[RangeHighlighter] {
        &self.highlighters
    }

    /// Valid highlighters overlapping `[start, end)`, in start order.
    pub fn overlapping(&self, start: usize, end: usize) -> Vec<&RangeHighlighter> {
        if self.highlighters.is_empty() || start >= end {
            return Vec::new();
        }

        // Everything that may overlap starts before `end`.
        let scan_end = self.highlighters.partition_point(|h| h.start < end);
        if scan_end == 0 {
            return Vec::new();
        }

        // Walk back only while the prefix maximum says an earlier highlighter
        // could still cross `start`.
        let mut scan_start = self
            .highlighters
            .partition_point(|h| h.start < start)
            .min(scan_end);
        while scan_start > 0 && self.prefix_max_end[scan_start - 1] > start {
            scan_start -= 1;
        }

        self.highlighters[scan_start..scan_end]
            .iter()
            .filter(|h| h.valid && h.start < end && h.end > start)
            .collect()
    }

    /// Translate highlighter offsets for a document edit; highlighters fully
    /// inside a deleted range are invalidated.
    pub fn on_document_change(&mut self, offset: usize, old_len: usize, new_len: usize) {
        let delete_end = offset + old_len;
        for h in &mut self.highlighters {
            if old_len > 0 && h.start >= offset && h.end <= delete_end {
                h.valid = false;
                h.end = h.start;
                continue;
            }
            h.start = translate_offset(h.start, offset, old_len, new_len);
            h.end = translate_offset(h.end, offset, old_len, new_len);
        }
        self.highlighters.sort_by_key(|h| h.start);
        self.rebuild_prefix_max_end();
    }
}

/// A single syntax token with its highlighter-resolved attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxToken {
    /// Start offset (inclusive) in characters.
    pub start: usize,
    /// End offset (exclusive) in characters.
    pub end: usize,
    /// Attributes for the token.
    pub attributes: TextAttributes,
}

/// An ordered, non-overlapping token stream from the syntax highlighter.
#[derive(Debug, Default)]
pub struct TokenList {
    tokens: Vec<SyntaxToken>,
}

impl TokenList {
    /// Create an empty token list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the token stream (sorted by start offset).
    pub fn set_tokens(&mut self, mut tokens: Vec<SyntaxToken>) {
        tokens.sort_by_key(|t| t.start);
        tokens.retain(|t| t.end > t.start);
        self.tokens = tokens;
    }

    /// All tokens in start order.
    pub fn tokens(&self) -> &[SyntaxToken] {
        &self.tokens
    }

    /// Whether the stream is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index of the token containing `offset`, or of the first token after it.
    pub fn index_at(&self, offset: usize) -> usize {
        self.tokens.partition_point(|t| t.end <= offset)
    }

    /// Token by index.
    pub fn get(&self, index: usize) -> Option<&SyntaxToken> {
        self.tokens.get(index)
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Drop the token stream (e.g. after a document change, pending re-lex).
    pub fn clear(&mut self) {
        self.tokens.clear();
    }
}

/// Extend a highlighter's affected range to whole lines when its target area
/// is [`HighlighterTargetArea::LinesInRange`].
pub(crate) fn affected_range(
    highlighter: &RangeHighlighter,
    line_start_of: impl Fn(usize) -> usize,
    line_end_of: impl Fn(usize) -> usize,
) -> (usize, usize) {
    match highlighter.target_area {
        HighlighterTargetArea::ExactRange => (highlighter.start, highlighter.end),
        HighlighterTargetArea::LinesInRange => (
            line_start_of(highlighter.start),
            line_end_of(highlighter.end.saturating_sub(1).max(highlighter.start)),
        ),
    }
}
