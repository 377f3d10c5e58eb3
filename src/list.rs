//! Document list view.
//!
//! Renders the cached document collection as text: a counts header, then
//! one row per document with its size, type, upload date and analysis
//! status. Analysed documents get a second line with highlight and
//! insight counts.

use std::fmt::Write;

use chrono::{DateTime, NaiveDateTime};

use crate::models::{Document, FileType};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `10 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let fixed = format!("{:.2}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// `Mar 1, 2024, 10:15 AM`. Unparseable timestamps are returned as-is.
pub fn format_date(timestamp: &str) -> String {
    const FORMAT: &str = "%b %-d, %Y, %I:%M %p";
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return dt.format(FORMAT).to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format(FORMAT).to_string();
    }
    timestamp.to_string()
}

pub fn file_icon(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Docx => "📝",
        _ => "📄",
    }
}

/// `3 documents • 1 analyzed`; the analysed part is dropped when zero.
pub fn header_line(documents: &[Document]) -> String {
    let analyzed = documents.iter().filter(|d| d.is_analyzed()).count();
    if analyzed > 0 {
        format!("{} documents • {} analyzed", documents.len(), analyzed)
    } else {
        format!("{} documents", documents.len())
    }
}

pub fn render_row(doc: &Document, selected: bool) -> String {
    let mut out = String::new();
    let marker = if selected { "▶" } else { " " };
    let status = if doc.is_analyzed() {
        "Analyzed"
    } else {
        "Analyze"
    };
    let _ = writeln!(
        out,
        "{} {} [{}] {}",
        marker,
        file_icon(doc.file_type),
        doc.id,
        doc.original_filename
    );
    let _ = writeln!(
        out,
        "      {} • {} • {}   ({})",
        format_file_size(doc.file_size),
        doc.file_type.as_str().to_uppercase(),
        format_date(&doc.created_at),
        status
    );
    if let Some(ref results) = doc.analysis_results {
        let _ = writeln!(
            out,
            "      {} highlights found • {} key insights",
            results.highlights.len(),
            results.key_insights.len()
        );
    }
    out
}

/// Render the whole list view.
pub fn render_list(documents: &[Document], selected: Option<i64>) -> String {
    if documents.is_empty() {
        return "No documents yet\nUpload your first document to get started\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Your Documents ({})", header_line(documents));
    let _ = writeln!(out);
    for doc in documents {
        out.push_str(&render_row(doc, selected == Some(doc.id)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResults, Highlight};

    fn doc(id: i64, analyzed: bool) -> Document {
        Document {
            id,
            filename: format!("{}.txt", id),
            original_filename: format!("notes-{}.txt", id),
            file_path: String::new(),
            file_size: 2048,
            file_type: FileType::Txt,
            content: Some("body".to_string()),
            analysis_results: analyzed.then(|| AnalysisResults {
                highlights: vec![Highlight {
                    text: "body".to_string(),
                    importance_score: 0.9,
                    category: "action items".to_string(),
                    explanation: "why".to_string(),
                    start_position: 0,
                    end_position: 4,
                }],
                summary: "s".to_string(),
                key_insights: vec!["a".to_string(), "b".to_string()],
            }),
            created_at: "2024-03-01T10:15:00".to_string(),
            updated_at: None,
        }
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-01T10:15:00"), "Mar 1, 2024, 10:15 AM");
        assert_eq!(
            format_date("2024-12-25T18:05:09.123456+00:00"),
            "Dec 25, 2024, 06:05 PM"
        );
        assert_eq!(format_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_header_line() {
        assert_eq!(header_line(&[doc(1, false), doc(2, false)]), "2 documents");
        assert_eq!(
            header_line(&[doc(1, true), doc(2, false)]),
            "2 documents • 1 analyzed"
        );
    }

    #[test]
    fn test_empty_list() {
        assert!(render_list(&[], None).starts_with("No documents yet"));
    }

    #[test]
    fn test_rows_show_counts_and_selection() {
        let out = render_list(&[doc(1, true), doc(2, false)], Some(2));
        assert!(out.contains("1 highlights found • 2 key insights"));
        assert!(out.contains("▶ 📄 [2] notes-2.txt"));
        assert!(out.contains("  📄 [1] notes-1.txt"));
        assert!(out.contains("2 KB • TXT • Mar 1, 2024, 10:15 AM   (Analyze)"));
    }
}
