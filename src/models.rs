//! Core data models exchanged with the document analysis service.
//!
//! These types mirror the JSON bodies of the `/api/v1` endpoints. The
//! backend owns every record; the client only ever holds a cached copy
//! for the lifetime of a session.

use serde::{Deserialize, Serialize};

/// Document type derived from the uploaded file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Txt,
    #[serde(other)]
    Other,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Txt => "txt",
            FileType::Other => "other",
        }
    }
}

/// A document record as returned by `GET /api/v1/documents/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    /// Server-side storage name, used for `/uploads/{filename}`.
    pub filename: String,
    /// Name the user uploaded the file under.
    pub original_filename: String,
    #[serde(default)]
    pub file_path: String,
    pub file_size: u64,
    pub file_type: FileType,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub analysis_results: Option<AnalysisResults>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// How a document's body is presented.
///
/// PDFs are rendered from the stored file; every other type is rendered
/// from the text the server extracted at upload time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DocumentKind<'a> {
    Pdf { filename: &'a str },
    Text { content: Option<&'a str> },
}

impl Document {
    pub fn kind(&self) -> DocumentKind<'_> {
        match self.file_type {
            FileType::Pdf => DocumentKind::Pdf {
                filename: &self.filename,
            },
            _ => DocumentKind::Text {
                content: self.content.as_deref(),
            },
        }
    }

    pub fn is_analyzed(&self) -> bool {
        self.analysis_results.is_some()
    }
}

/// A scored, categorised span of a document's extracted text.
///
/// Positions are character offsets into `Document::content`, half-open:
/// `[start_position, end_position)`. The service reports `-1` for a span it
/// could not locate, so they are signed; the overlay clamps them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub text: String,
    pub importance_score: f64,
    pub category: String,
    pub explanation: String,
    pub start_position: i64,
    pub end_position: i64,
}

/// Analysis attached to a stored document (`analysis_results` field).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResults {
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
}

/// Response body of `POST /api/v1/analyze/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    /// Absent when the stored `analysis_results` blob is returned as-is
    /// by `GET /api/v1/analyze/{id}`.
    #[serde(default)]
    pub document_id: Option<i64>,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
}

impl DocumentAnalysis {
    pub fn into_results(self) -> AnalysisResults {
        AnalysisResults {
            highlights: self.highlights,
            summary: self.summary,
            key_insights: self.key_insights,
        }
    }

    pub fn from_results(document_id: i64, results: &AnalysisResults) -> Self {
        Self {
            document_id: Some(document_id),
            highlights: results.highlights.clone(),
            summary: results.summary.clone(),
            key_insights: results.key_insights.clone(),
        }
    }
}
