//! Splices updated module paths into the original text.

use tracing::{debug, warn};

use crate::locate::ModulePathLiteral;

/// A literal whose interior should become `updated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub literal: ModulePathLiteral,
    pub updated: String,
}

/// Applies `replacements` to `source` in one pass. Only the text strictly
/// between each literal's quotes changes; the quotes themselves and everything
/// outside the literals are kept byte for byte.
pub fn splice(source: &str, mut replacements: Vec<Replacement>) -> String {
    // Latest first, so earlier offsets stay valid while we edit.
    replacements.sort_by(|l, r| r.literal.span.start.cmp(&l.literal.span.start));

    let mut text = source.to_string();
    let mut floor = text.len();
    for replacement in replacements {
        let span = &replacement.literal.span;
        if span.end > floor || span.end < span.start + 2 {
            warn!(span = ?span, "skipping out-of-range or overlapping replacement");
            continue;
        }
        let interior = span.start + 1..span.end - 1;
        if !text.is_char_boundary(interior.start) || !text.is_char_boundary(interior.end) {
            warn!(span = ?span, "skipping replacement that splits a character");
            continue;
        }

        debug!(from = %&text[interior.clone()], to = %replacement.updated, "splicing module path");
        text.replace_range(interior, &replacement.updated);
        floor = span.start;
    }
    text
}
