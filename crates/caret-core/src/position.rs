//! Position value types for the two editor coordinate spaces.
//!
//! A [`LogicalPosition`] addresses the *unfolded, unwrapped* document: line and
//! column are derived purely from the text's line structure. A
//! [`VisualPosition`] addresses the *rendered* coordinate space, after fold
//! collapsing, soft wrapping, and inlay insertion have been applied.
//!
//! Both types carry a lean flag that disambiguates a (line, column) pair that
//! corresponds to two distinct offsets, e.g. the boundary of a collapsed fold
//! region or a soft wrap, where "just before" and "just after" share the same
//! column.

use std::cmp::Ordering;
use std::fmt;

/// Position in the unfolded, unwrapped document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogicalPosition {
    /// Zero-based logical line index.
    pub line: usize,
    /// Zero-based column in characters within the logical line.
    pub column: usize,
    /// Whether the position is associated with the succeeding character
    /// rather than the preceding one, at ambiguous boundaries.
    pub leans_forward: bool,
}

impl LogicalPosition {
    /// Create a logical position leaning backward (the common case).
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            leans_forward: false,
        }
    }

    /// Create a logical position with an explicit lean.
    pub fn new_leaning(line: usize, column: usize, leans_forward: bool) -> Self {
        Self {
            line,
            column,
            leans_forward,
        }
    }

    /// Copy of this position with the lean flag replaced.
    pub fn with_lean(self, leans_forward: bool) -> Self {
        Self {
            leans_forward,
            ..self
        }
    }
}

impl Ord for LogicalPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lean does not participate in ordering; it only disambiguates
        // rendering-side mappings of equal positions.
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for LogicalPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LogicalPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.line, self.column)?;
        if self.leans_forward {
            write!(f, ">")?;
        }
        Ok(())
    }
}

/// Position in the rendered (post-fold, post-wrap) coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisualPosition {
    /// Zero-based visual line (row) index.
    pub line: usize,
    /// Zero-based visual column in cells.
    pub column: usize,
    /// Whether the position is associated with the succeeding cell rather
    /// than the preceding one, at ambiguous boundaries.
    pub leans_right: bool,
}

impl VisualPosition {
    /// Create a visual position leaning left (the common case).
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            leans_right: false,
        }
    }

    /// Create a visual position with an explicit lean.
    pub fn new_leaning(line: usize, column: usize, leans_right: bool) -> Self {
        Self {
            line,
            column,
            leans_right,
        }
    }

    /// Copy of this position with the lean flag replaced.
    pub fn with_lean(self, leans_right: bool) -> Self {
        Self { leans_right, ..self }
    }
}

impl Ord for VisualPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for VisualPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VisualPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.line, self.column)?;
        if self.leans_right {
            write!(f, ">")?;
        }
        Ok(())
    }
}
