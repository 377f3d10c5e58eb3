//! Document viewer.
//!
//! Renders one document for the terminal. Text-like documents go through
//! the [overlay renderer](crate::overlay); PDFs are fetched from
//! `/uploads/{filename}` and shown one page at a time. Below the body the
//! viewer prints the hovered highlight's explanation panel and, when an
//! analysis exists, a summary with a row of highlight chips.

use std::fmt::Write;

use anyhow::{anyhow, Result};
use crossterm::style::{Color, Stylize};
use tracing::warn;

use crate::config::ViewerConfig;
use crate::list::format_file_size;
use crate::models::{Document, DocumentAnalysis, DocumentKind, Highlight};
use crate::overlay::{category_icon, segment, ImportanceTier, Segment};

/// Presentation settings resolved from [`ViewerConfig`].
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub color: bool,
    pub summary_preview: usize,
    pub snippet_chars: usize,
}

impl Style {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            color: config.color.enabled(),
            summary_preview: config.summary_preview,
            snippet_chars: config.snippet_chars,
        }
    }

    pub fn plain() -> Self {
        Self::from_config(&ViewerConfig {
            color: crate::config::ColorMode::Never,
            ..ViewerConfig::default()
        })
    }
}

pub const PAGE_TEXT_UNAVAILABLE: &str = "(page text unavailable)";

fn page_text<E: std::fmt::Display>(number: u32, extracted: Result<String, E>) -> String {
    extracted.unwrap_or_else(|e| {
        warn!(page = number, error = %e, "PDF text extraction failed");
        PAGE_TEXT_UNAVAILABLE.to_string()
    })
}

/// Page text of a PDF, one entry per page.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfPages {
    pub pages: Vec<String>,
}

impl PdfPages {
    /// Parse a PDF and extract the text of every page.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = lopdf::Document::load_mem(bytes).map_err(|e| anyhow!("Failed to parse PDF: {}", e))?;
        let mut pages = Vec::new();
        for number in doc.get_pages().keys() {
            pages.push(page_text(*number, doc.extract_text(&[*number])));
        }
        Ok(Self { pages })
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Per-document viewer state: highlight toggle, hover pointer and page.
#[derive(Debug, Clone)]
pub struct Viewer {
    show_highlights: bool,
    hovered: Option<usize>,
    page: usize,
    num_pages: Option<usize>,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewer {
    pub fn new() -> Self {
        Self {
            show_highlights: true,
            hovered: None,
            page: 1,
            num_pages: None,
        }
    }

    pub fn show_highlights(&self) -> bool {
        self.show_highlights
    }

    pub fn set_show_highlights(&mut self, show: bool) {
        self.show_highlights = show;
    }

    pub fn toggle_highlights(&mut self) -> bool {
        self.show_highlights = !self.show_highlights;
        self.show_highlights
    }

    /// Point at highlight `index` of the current analysis.
    pub fn hover(&mut self, index: usize) {
        self.hovered = Some(index);
    }

    pub fn unhover(&mut self) {
        self.hovered = None;
    }

    pub fn hovered<'a>(&self, analysis: Option<&'a DocumentAnalysis>) -> Option<&'a Highlight> {
        analysis.and_then(|a| a.highlights.get(self.hovered?))
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn num_pages(&self) -> Option<usize> {
        self.num_pages
    }

    /// Record the page count once a PDF has loaded; the page is clamped into range.
    pub fn set_num_pages(&mut self, n: usize) {
        self.num_pages = Some(n);
        self.page = self.page.clamp(1, n.max(1));
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = match self.num_pages {
            Some(n) => page.clamp(1, n.max(1)),
            None => page.max(1),
        };
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.page + 1);
    }

    pub fn prev_page(&mut self) {
        self.go_to_page(self.page.saturating_sub(1));
    }

    /// Reset per-document state when another document is selected.
    pub fn reset(&mut self) {
        self.hovered = None;
        self.page = 1;
        self.num_pages = None;
    }

    /// Render the full viewer.
    ///
    /// `pdf` is the loaded page text for PDF documents; `None` renders a
    /// loading placeholder.
    pub fn render(
        &self,
        doc: &Document,
        analysis: Option<&DocumentAnalysis>,
        pdf: Option<&PdfPages>,
        is_analyzing: bool,
        style: &Style,
    ) -> String {
        let mut out = String::new();
        out.push_str(&self.render_header(doc, analysis));
        let _ = writeln!(out);

        if is_analyzing {
            let _ = writeln!(out, "Analyzing document...");
        } else {
            match doc.kind() {
                DocumentKind::Pdf { .. } => out.push_str(&self.render_pdf(pdf)),
                DocumentKind::Text { content: Some(text) } => {
                    let highlights = analysis.map(|a| a.highlights.as_slice()).unwrap_or(&[]);
                    out.push_str(&render_overlay(text, highlights, self.show_highlights, style));
                    let _ = writeln!(out);
                }
                DocumentKind::Text { content: None } => {
                    let _ = writeln!(out, "No content available");
                }
            }
        }

        if let Some(highlight) = self.hovered(analysis) {
            let _ = writeln!(out);
            out.push_str(&render_explanation(highlight));
        }

        if let Some(analysis) = analysis {
            let _ = writeln!(out);
            out.push_str(&render_summary(analysis, style));
        }

        out
    }

    fn render_header(&self, doc: &Document, analysis: Option<&DocumentAnalysis>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", doc.original_filename);
        let _ = write!(
            out,
            "{} • {}",
            format_file_size(doc.file_size),
            doc.file_type.as_str().to_uppercase()
        );
        if analysis.is_some() {
            let toggle = if self.show_highlights {
                "Hide Highlights"
            } else {
                "Show Highlights"
            };
            let _ = write!(out, "   [{}]", toggle);
        }
        let _ = writeln!(out);
        out
    }

    fn render_pdf(&self, pdf: Option<&PdfPages>) -> String {
        let mut out = String::new();
        let pdf = match pdf {
            Some(p) => p,
            None => {
                let _ = writeln!(out, "Loading PDF...");
                return out;
            }
        };
        if pdf.is_empty() {
            let _ = writeln!(out, "No pages");
            return out;
        }
        let page = self.page.clamp(1, pdf.len());
        let _ = writeln!(out, "{}", pdf.pages[page - 1].trim_end());
        let _ = writeln!(out);
        let _ = writeln!(out, "Page {} of {}", page, pdf.len());
        out
    }
}

/// Render text with highlighted spans.
///
/// Each highlighted span is followed by its 1-based number, the handle
/// used to hover it. Colour marks the importance tier; without colour the
/// span is wrapped in `«»`.
pub fn render_overlay(text: &str, highlights: &[Highlight], enabled: bool, style: &Style) -> String {
    let mut out = String::new();
    for seg in segment(text, highlights, enabled) {
        match seg {
            Segment::Plain { text } => out.push_str(text),
            Segment::Highlighted {
                text,
                highlight,
                index,
            } => {
                let tag = format!("[{}]", index + 1);
                if style.color {
                    let (r, g, b) = ImportanceTier::from_score(highlight.importance_score).rgb();
                    let _ = write!(
                        out,
                        "{}{}",
                        text.on(Color::Rgb { r, g, b }).with(Color::Black),
                        tag.dark_grey()
                    );
                } else {
                    let _ = write!(out, "«{}»{}", text, tag);
                }
            }
        }
    }
    out
}

/// The hover panel for one highlight.
pub fn render_explanation(highlight: &Highlight) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        category_icon(&highlight.category),
        capitalize_words(&highlight.category)
    );
    let _ = writeln!(out, "   {}", highlight.explanation);
    let _ = writeln!(
        out,
        "   Importance: {}% ({})",
        (highlight.importance_score * 100.0).round() as i64,
        ImportanceTier::from_score(highlight.importance_score).label()
    );
    out
}

/// Summary text plus the first few highlights as chips.
pub fn render_summary(analysis: &DocumentAnalysis, style: &Style) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Analysis Summary");
    let _ = writeln!(out, "{}", analysis.summary);
    if !analysis.highlights.is_empty() {
        let _ = writeln!(out);
    }
    for (i, highlight) in analysis
        .highlights
        .iter()
        .take(style.summary_preview)
        .enumerate()
    {
        let snippet: String = highlight.text.chars().take(style.snippet_chars).collect();
        let _ = writeln!(
            out,
            "  [{}] {} {}...",
            i + 1,
            category_icon(&highlight.category),
            snippet
        );
    }
    out
}

/// Summary, key insights and every highlight with its explanation.
pub fn render_analysis_report(analysis: &DocumentAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- Summary ---");
    let _ = writeln!(out, "{}", analysis.summary);
    let _ = writeln!(out);

    let _ = writeln!(out, "--- Key Insights ({}) ---", analysis.key_insights.len());
    for insight in &analysis.key_insights {
        let _ = writeln!(out, "- {}", insight);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "--- Highlights ({}) ---", analysis.highlights.len());
    for (i, highlight) in analysis.highlights.iter().enumerate() {
        let _ = writeln!(
            out,
            "[{}] {}..{} \"{}\"",
            i + 1,
            highlight.start_position,
            highlight.end_position,
            highlight.text
        );
        out.push_str(&render_explanation(highlight));
    }
    out
}

fn capitalize_words(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
