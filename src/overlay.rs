//! Highlight overlay rendering.
//!
//! Splits a document's text into plain and highlighted [`Segment`]s without
//! altering the text: concatenating every segment's slice reproduces the
//! input exactly.
//!
//! Highlight positions are character offsets (the service counts code
//! points), so they are translated to byte offsets before slicing.
//!
//! # Overlaps
//!
//! Highlights are walked in start order behind a cursor. A highlight that
//! starts before the cursor has its start clamped to the cursor, so text
//! already emitted is never emitted twice. One that ends at or before the
//! cursor collapses to an empty highlighted segment at the cursor. Spans
//! reaching past the end of the text are cut at the end, and negative
//! positions count as 0.

use crate::models::Highlight;

/// One contiguous run of the rendered text.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    Plain {
        text: &'a str,
    },
    Highlighted {
        text: &'a str,
        highlight: &'a Highlight,
        /// Index of `highlight` in the caller's slice.
        index: usize,
    },
}

impl<'a> Segment<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Segment::Plain { text } | Segment::Highlighted { text, .. } => text,
        }
    }

    pub fn highlight(&self) -> Option<&'a Highlight> {
        match self {
            Segment::Highlighted { highlight, .. } => Some(highlight),
            Segment::Plain { .. } => None,
        }
    }
}

/// Split `text` into segments for `highlights`.
///
/// With `enabled == false` or no highlights, the whole text is a single
/// plain segment.
pub fn segment<'a>(text: &'a str, highlights: &'a [Highlight], enabled: bool) -> Vec<Segment<'a>> {
    if !enabled || highlights.is_empty() {
        return vec![Segment::Plain { text }];
    }

    // Stable: equal starts keep their input order.
    let mut order: Vec<usize> = (0..highlights.len()).collect();
    order.sort_by_key(|&i| highlights[i].start_position);

    let offsets = CharOffsets::new(text);
    let len = offsets.char_len();
    let mut segments = Vec::with_capacity(order.len() * 2 + 1);
    let mut cursor = 0usize;

    for index in order {
        let highlight = &highlights[index];
        let start = char_pos(highlight.start_position, len).max(cursor);
        let end = char_pos(highlight.end_position, len).max(start);

        if start > cursor {
            segments.push(Segment::Plain {
                text: offsets.slice(text, cursor, start),
            });
        }
        segments.push(Segment::Highlighted {
            text: offsets.slice(text, start, end),
            highlight,
            index,
        });
        cursor = end;
    }

    if cursor < len {
        segments.push(Segment::Plain {
            text: offsets.slice(text, cursor, len),
        });
    }

    segments
}

/// A wire position as a char index within `0..=len`.
fn char_pos(position: i64, len: usize) -> usize {
    usize::try_from(position).unwrap_or(0).min(len)
}

/// Char-index to byte-index table for one string.
struct CharOffsets {
    bytes: Vec<usize>,
}

impl CharOffsets {
    fn new(text: &str) -> Self {
        let mut bytes: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        bytes.push(text.len());
        Self { bytes }
    }

    fn char_len(&self) -> usize {
        self.bytes.len() - 1
    }

    fn slice<'a>(&self, text: &'a str, start: usize, end: usize) -> &'a str {
        &text[self.bytes[start]..self.bytes[end]]
    }
}

/// Display tier for an importance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportanceTier {
    High,
    Medium,
    Low,
}

impl ImportanceTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ImportanceTier::High
        } else if score >= 0.6 {
            ImportanceTier::Medium
        } else {
            ImportanceTier::Low
        }
    }

    /// Background colour as RGB: yellow, blue, purple.
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            ImportanceTier::High => (0xfe, 0xf3, 0xc7),
            ImportanceTier::Medium => (0xdb, 0xea, 0xfe),
            ImportanceTier::Low => (0xf3, 0xe8, 0xff),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImportanceTier::High => "high",
            ImportanceTier::Medium => "medium",
            ImportanceTier::Low => "low",
        }
    }
}

/// Icon shown next to a highlight category.
pub fn category_icon(category: &str) -> &'static str {
    match category.to_ascii_lowercase().as_str() {
        "financial information" => "💰",
        "personal information" => "👤",
        "legal information" => "⚖️",
        "technical information" => "🔧",
        "contact information" => "📞",
        "dates and deadlines" => "📅",
        "important numbers" => "🔢",
        "key decisions" => "✅",
        "action items" => "📋",
        _ => "📄",
    }
}
