//! Text attributes, effects, and the priority merge builder.
//!
//! Highlight sources (syntax tokens, range highlighters, selection, caret row,
//! fold placeholders, guarded blocks) each contribute a [`TextAttributes`]
//! value. The [`AttributesBuilder`] composes them in priority order: the
//! foreground, background, and font-style facets take the first value set by
//! any layer, while effects accumulate from every layer that defines them.

/// An RGB color. The renderer owns the actual color space; this crate only
/// moves the value around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Create a color from a packed `0xRRGGBB` value.
    pub const fn new(rgb: u32) -> Self {
        Self(rgb)
    }
}

/// Font style facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    /// Regular weight and posture.
    #[default]
    Plain,
    /// Bold weight.
    Bold,
    /// Italic posture.
    Italic,
    /// Bold and italic.
    BoldItalic,
}

/// The shape of a text effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Straight underline.
    Underline,
    /// Heavier underline.
    BoldUnderline,
    /// Waved underline (typically diagnostics).
    Wave,
    /// Line through the text.
    Strikeout,
    /// Rectangle around the affected range.
    Boxed,
}

/// A single effect descriptor: shape plus color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEffect {
    /// Effect shape.
    pub kind: EffectKind,
    /// Effect color.
    pub color: Color,
}

/// A set of visual attribute facets. `None` means "unset, defer to lower
/// layers", not "default".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextAttributes {
    /// Text color.
    pub foreground: Option<Color>,
    /// Fill color behind the text.
    pub background: Option<Color>,
    /// Font style.
    pub font_style: Option<FontStyle>,
    /// Effects contributed by this layer.
    pub effects: Vec<TextEffect>,
}

impl TextAttributes {
    /// Attributes with every facet unset.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether no facet is set.
    pub fn is_empty(&self) -> bool {
        self.foreground.is_none()
            && self.background.is_none()
            && self.font_style.is_none()
            && self.effects.is_empty()
    }

    /// Whether this value affects the foreground color or the font.
    pub fn affects_font_or_foreground(&self) -> bool {
        self.foreground.is_some() || self.font_style.is_some()
    }

    /// Attributes with only a foreground color set.
    pub fn foreground_only(color: Color) -> Self {
        Self {
            foreground: Some(color),
            ..Self::default()
        }
    }

    /// Attributes with only a background color set.
    pub fn background_only(color: Color) -> Self {
        Self {
            background: Some(color),
            ..Self::default()
        }
    }
}

/// Resolved attributes of a range highlighter.
///
/// The `Erase` variant is the sentinel that removes the syntax token's
/// contribution for the covered segment instead of layering on top of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightAttributes {
    /// Ordinary attributes, layered by priority.
    Styled(TextAttributes),
    /// Suppress the syntax token's attributes for the covered range.
    Erase,
}

impl HighlightAttributes {
    /// The styled attributes, if this is not the erase sentinel.
    pub fn styled(&self) -> Option<&TextAttributes> {
        match self {
            HighlightAttributes::Styled(attrs) => Some(attrs),
            HighlightAttributes::Erase => None,
        }
    }
}

/// How a range highlighter's affected range relates to its offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlighterTargetArea {
    /// The highlighter affects exactly `[start, end)`.
    ExactRange,
    /// The highlighter affects every whole line its range touches.
    LinesInRange,
}

/// A range highlighter: one interval contributed by a markup source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeHighlighter {
    /// Layer number; higher layers take precedence in the merge.
    pub layer: i32,
    /// Start offset (inclusive) in characters.
    pub start: usize,
    /// End offset (exclusive) in characters.
    pub end: usize,
    /// Whether the highlighter covers its exact range or whole lines.
    pub target_area: HighlighterTargetArea,
    /// Resolved attributes (or the erase sentinel).
    pub attributes: HighlightAttributes,
    /// Whether this highlighter renders after the end of its line
    /// (e.g. trailing diagnostics) rather than over text.
    pub after_end_of_line: bool,
    /// Invalid highlighters are skipped by all queries.
    pub valid: bool,
    /// Severity rank used as a tie-break between same-layer highlighters;
    /// higher ranks win.
    pub severity: i32,
}

impl RangeHighlighter {
    /// Create a valid exact-range highlighter with default severity.
    pub fn new(layer: i32, start: usize, end: usize, attributes: HighlightAttributes) -> Self {
        Self {
            layer,
            start,
            end,
            target_area: HighlighterTargetArea::ExactRange,
            attributes,
            after_end_of_line: false,
            valid: true,
            severity: 0,
        }
    }

    /// Length of the exact affected range, used as the final tie-break
    /// (most specific wins).
    pub fn affected_len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

/// Composes attribute layers in priority order.
///
/// Push layers from highest priority to lowest; [`build`](Self::build) falls
/// back to the scheme defaults for facets no layer set.
#[derive(Debug, Clone)]
pub struct AttributesBuilder {
    defaults: TextAttributes,
    merged: TextAttributes,
}

impl AttributesBuilder {
    /// Create a builder with the given scheme defaults.
    pub fn new(defaults: TextAttributes) -> Self {
        Self {
            defaults,
            merged: TextAttributes::empty(),
        }
    }

    /// Layer `attrs` under everything pushed so far: facets already set are
    /// kept, unset facets are filled, effects accumulate.
    pub fn push(&mut self, attrs: &TextAttributes) {
        if self.merged.foreground.is_none() {
            self.merged.foreground = attrs.foreground;
        }
        if self.merged.background.is_none() {
            self.merged.background = attrs.background;
        }
        if self.merged.font_style.is_none() {
            self.merged.font_style = attrs.font_style;
        }
        for effect in &attrs.effects {
            // Effects accumulate; a later layer never overwrites an earlier
            // one, and duplicate shapes keep the higher-priority color.
            if !self.merged.effects.iter().any(|e| e.kind == effect.kind) {
                self.merged.effects.push(*effect);
            }
        }
    }

    /// Resolve unset facets against the scheme defaults and return the result.
    pub fn build(mut self) -> TextAttributes {
        if self.merged.foreground.is_none() {
            self.merged.foreground = self.defaults.foreground;
        }
        if self.merged.background.is_none() {
            self.merged.background = self.defaults.background;
        }
        if self.merged.font_style.is_none() {
            self.merged.font_style = self.defaults.font_style;
        }
        for effect in &self.defaults.effects {
            if !self.merged.effects.iter().any(|e| e.kind == effect.kind) {
                self.merged.effects.push(*effect);
            }
        }
        self.merged
    }
}
