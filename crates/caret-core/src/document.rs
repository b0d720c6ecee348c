//! Rope-backed document facade.
//!
//! # Overview
//!
//! [`DocumentBuffer`] is the narrow document interface the caret model and the
//! style iteration engine consume: line/offset conversions, text queries,
//! mutation with change notifications, and a monotonically increasing version
//! counter used for cache invalidation.
//!
//! The buffer owns the [`MarkerTree`]. Every mutation translates the markers
//! *first*, then bumps the version and notifies listeners. By the time any
//! caret-level code observes the new state, no marker points at stale text.
//!
//! All offsets are character offsets (Unicode scalar values), as in the line
//! index this design is based on. Grapheme-cluster boundary snapping is
//! provided for callers that must not land inside a multi-unit character.

use crate::markers::MarkerTree;
use ropey::Rope;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// A single document mutation, delivered to subscribers after markers have
/// been translated and the version bumped.
#[derive(Debug, Clone)]
pub struct DocumentEvent {
    /// Character offset of the change.
    pub offset: usize,
    /// Length of the removed text in characters.
    pub old_length: usize,
    /// Length of the inserted text in characters.
    pub new_length: usize,
    /// Inserted fragment.
    pub new_fragment: String,
    /// Whether the whole text was replaced in one operation.
    pub whole_text_replaced: bool,
}

/// Change listener callback type.
pub type DocumentListener = Box<dyn FnMut(&DocumentEvent)>;

/// Mutable text with line structure, change events, and self-adjusting
/// markers.
pub struct DocumentBuffer {
    rope: Rope,
    version: u64,
    markers: MarkerTree,
    listeners: Vec<DocumentListener>,
}

impl DocumentBuffer {
    /// Create a buffer over the given text.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            version: 0,
            markers: MarkerTree::new(),
            listeners: Vec::new(),
        }
    }

    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::from_text("")
    }

    /// Monotonically increasing modification counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Total text length in characters.
    pub fn text_len(&self) -> usize {
        self.rope.len_chars()
    }

    /// Number of logical lines. An empty buffer has one empty line.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Character offset of the first character of `line`. Out-of-range lines
    /// clamp to the end of the text.
    pub fn line_start_offset(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        self.rope.line_to_char(line)
    }

    /// Character offset just past the last character of `line`, excluding the
    /// line break.
    pub fn line_end_offset(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        if line + 1 < self.rope.len_lines() {
            // Step back over the line break.
            let next_start = self.rope.line_to_char(line + 1);
            let mut end = next_start - 1;
            if end > self.rope.line_to_char(line) && self.rope.char(end - 1) == '\r' {
                end -= 1;
            }
            end
        } else {
            self.rope.len_chars()
        }
    }

    /// Length of `line` in characters, excluding the line break.
    pub fn line_length(&self, line: usize) -> usize {
        self.line_end_offset(line)
            .saturating_sub(self.line_start_offset(line))
    }

    /// Logical line containing `offset`.
    pub fn line_of_offset(&self, offset: usize) -> usize {
        let offset = offset.min(self.rope.len_chars());
        self.rope.char_to_line(offset)
    }

    /// Character at `offset`, if in range.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        if offset < self.rope.len_chars() {
            Some(self.rope.char(offset))
        } else {
            None
        }
    }

    /// Text of `line`, excluding the line break.
    pub fn line_text(&self, line: usize) -> String {
        self.slice(self.line_start_offset(line)..self.line_end_offset(line))
    }

    /// Copy of the text in `range` (character offsets, clamped).
    pub fn slice(&self, range: Range<usize>) -> String {
        let len = self.rope.len_chars();
        let start = range.start.min(len);
        let end = range.end.min(len).max(start);
        self.rope.slice(start..end).to_string()
    }

    /// Complete text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Subscribe to mutation events. Listeners run synchronously, after
    /// markers are translated and the version is bumped.
    pub fn subscribe(&mut self, listener: DocumentListener) {
        self.listeners.push(listener);
    }

    /// Read access to the marker store.
    pub fn markers(&self) -> &MarkerTree {
        &self.markers
    }

    /// Mutable access to the marker store, for marker creation/repositioning.
    /// Translation on edits is handled by the buffer itself.
    pub fn markers_mut(&mut self) -> &mut MarkerTree {
        &mut self.markers
    }

    fn clamp_offset(&self, offset: usize, what: &str) -> usize {
        let len = self.rope.len_chars();
        if offset > len {
            log::error!(
                "{what}: offset {offset} outside [0, {len}]; proceeding with the clamped value"
            );
            len
        } else {
            offset
        }
    }

    /// Insert `text` at `offset`. Out-of-range offsets are logged and clamped.
    pub fn insert(&mut self, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let offset = self.clamp_offset(offset, "insert");
        let len = text.chars().count();

        self.rope.insert(offset, text);
        self.markers.on_insert(offset, len);
        self.version += 1;
        self.notify(DocumentEvent {
            offset,
            old_length: 0,
            new_length: len,
            new_fragment: text.to_string(),
            whole_text_replaced: false,
        });
    }

    /// Delete the characters in `range`. Out-of-range bounds are logged and
    /// clamped.
    pub fn delete(&mut self, range: Range<usize>) {
        let start = self.clamp_offset(range.start, "delete");
        let end = self.clamp_offset(range.end, "delete").max(start);
        if start == end {
            return;
        }

        self.rope.remove(start..end);
        self.markers.on_delete(start, end);
        self.version += 1;
        self.notify(DocumentEvent {
            offset: start,
            old_length: end - start,
            new_length: 0,
            new_fragment: String::new(),
            whole_text_replaced: false,
        });
    }

    /// Replace the characters in `range` with `text`, as a single change.
    pub fn replace(&mut self, range: Range<usize>, text: &str) {
        let start = self.clamp_offset(range.start, "replace");
        let end = self.clamp_offset(range.end, "replace").max(start);
        let new_len = text.chars().count();
        if start == end && new_len == 0 {
            return;
        }

        self.rope.remove(start..end);
        self.rope.insert(start, text);
        self.markers.on_delete(start, end);
        self.markers.on_insert(start, new_len);
        self.version += 1;
        self.notify(DocumentEvent {
            offset: start,
            old_length: end - start,
            new_length: new_len,
            new_fragment: text.to_string(),
            whole_text_replaced: false,
        });
    }

    /// Replace the whole text. Markers are clamped into the new text rather
    /// than translated edit-by-edit.
    pub fn set_text(&mut self, text: &str) {
        let old_len = self.rope.len_chars();
        self.rope = Rope::from_str(text);
        let new_len = self.rope.len_chars();

        self.markers.clamp_to(new_len);
        self.version += 1;
        self.notify(DocumentEvent {
            offset: 0,
            old_length: old_len,
            new_length: new_len,
            new_fragment: text.to_string(),
            whole_text_replaced: true,
        });
    }

    fn notify(&mut self, event: DocumentEvent) {
        // Listeners only see the event payload, so taking the list avoids
        // aliasing the buffer while they run.
        let mut listeners = std::mem::take(&mut self.listeners);
        for listener in &mut listeners {
            listener(&event);
        }
        // New subscriptions made by listeners are kept.
        listeners.append(&mut self.listeners);
        self.listeners = listeners;
    }

    /// Snap `offset` to the nearest grapheme-cluster boundary, moving forward
    /// or backward as requested. Already-valid boundaries are returned as-is.
    pub fn snap_to_grapheme_boundary(&self, offset: usize, forward: bool) -> usize {
        let offset = offset.min(self.rope.len_chars());
        let line = self.line_of_offset(offset);
        let line_start = self.line_start_offset(line);
        let line_end = self.line_end_offset(line);
        if offset >= line_end {
            // Line breaks are always boundaries.
            return offset;
        }

        let column = offset - line_start;
        let text = self.line_text(line);

        let mut chars_seen = 0usize;
        for grapheme in text.graphemes(true) {
            if chars_seen == column {
                return offset;
            }
            let next = chars_seen + grapheme.chars().count();
            if next > column {
                return if forward {
                    line_start + next
                } else {
                    line_start + chars_seen
                };
            }
            chars_seen = next;
        }
        offset
    }
}

impl Default for DocumentBuffer {
    fn default() -> Self {
        Self::new()
    }
}
