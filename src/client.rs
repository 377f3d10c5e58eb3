//! HTTP client for the document analysis service.
//!
//! Defines the [`DocumentApi`] trait, the seam the [`Shell`](crate::shell::Shell)
//! talks through, and [`HttpClient`], its reqwest implementation.
//!
//! # Endpoints
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | `POST` | `/api/v1/upload` | [`upload`](DocumentApi::upload) (multipart field `file`) |
//! | `GET` | `/api/v1/documents` | [`list`](DocumentApi::list) |
//! | `GET` | `/api/v1/documents/{id}` | [`get`](DocumentApi::get) |
//! | `DELETE` | `/api/v1/documents/{id}` | [`delete`](DocumentApi::delete) |
//! | `POST` | `/api/v1/analyze/{id}` | [`analyze`](DocumentApi::analyze) |
//! | `GET` | `/api/v1/analyze/{id}` | [`get_analysis`](DocumentApi::get_analysis) |
//! | `GET` | `/uploads/{filename}` | [`fetch_upload`](DocumentApi::fetch_upload) |
//!
//! Every call is a single request: no retry, caching or rate limiting.
//! Upload and analysis calls return an [`Outcome`]; the rest return
//! `Result<_, ClientError>` for the caller to handle.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{ClientError, Outcome};
use crate::models::{Document, DocumentAnalysis};
use crate::upload::UploadFile;

pub const UPLOAD_FAILED: &str = "Upload failed";
pub const ANALYSIS_FAILED: &str = "Analysis failed";
pub const GET_ANALYSIS_FAILED: &str = "Failed to get analysis results";

/// Operations the client performs against the service.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Upload a validated file. The server assigns the document id.
    async fn upload(&self, file: &UploadFile) -> Outcome<Document>;

    /// All documents, newest first.
    async fn list(&self) -> Result<Vec<Document>, ClientError>;

    async fn get(&self, id: i64) -> Result<Document, ClientError>;

    async fn delete(&self, id: i64) -> Result<(), ClientError>;

    /// Run analysis, replacing any earlier results on the server.
    async fn analyze(&self, id: i64) -> Outcome<DocumentAnalysis>;

    /// Fetch the stored analysis without re-running it.
    async fn get_analysis(&self, id: i64) -> Outcome<DocumentAnalysis>;

    /// Raw bytes of a stored file, used to render PDFs.
    async fn fetch_upload(&self, filename: &str) -> Result<Vec<u8>, ClientError>;
}

/// [`DocumentApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Public URL of a stored file.
    pub fn upload_url(&self, filename: &str) -> String {
        format!("{}/uploads/{}", self.base_url, filename)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn try_upload(&self, file: &UploadFile) -> Result<Document, ClientError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(file.mime)?;
        let form = Form::new().part("file", part);

        let url = self.url("/upload");
        debug!(%url, file = %file.name, size = file.bytes.len(), "POST upload");
        let resp = self.client.post(&url).multipart(form).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn try_analyze(&self, id: i64) -> Result<DocumentAnalysis, ClientError> {
        let url = self.url(&format!("/analyze/{}", id));
        debug!(%url, "POST analyze");
        let resp = self.client.post(&url).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn try_get_analysis(&self, id: i64) -> Result<DocumentAnalysis, ClientError> {
        let url = self.url(&format!("/analyze/{}", id));
        debug!(%url, "GET analysis");
        let resp = self.client.get(&url).send().await?;
        let mut analysis: DocumentAnalysis = check(resp).await?.json().await?;
        analysis.document_id.get_or_insert(id);
        Ok(analysis)
    }
}

#[async_trait]
impl DocumentApi for HttpClient {
    async fn upload(&self, file: &UploadFile) -> Outcome<Document> {
        Outcome::from_result(self.try_upload(file).await, UPLOAD_FAILED)
    }

    async fn list(&self) -> Result<Vec<Document>, ClientError> {
        let url = self.url("/documents");
        debug!(%url, "GET documents");
        let resp = self.client.get(&url).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn get(&self, id: i64) -> Result<Document, ClientError> {
        let url = self.url(&format!("/documents/{}", id));
        debug!(%url, "GET document");
        let resp = self.client.get(&url).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn delete(&self, id: i64) -> Result<(), ClientError> {
        let url = self.url(&format!("/documents/{}", id));
        debug!(%url, "DELETE document");
        let resp = self.client.delete(&url).send().await?;
        check(resp).await?;
        Ok(())
    }

    async fn analyze(&self, id: i64) -> Outcome<DocumentAnalysis> {
        Outcome::from_result(self.try_analyze(id).await, ANALYSIS_FAILED)
    }

    async fn get_analysis(&self, id: i64) -> Outcome<DocumentAnalysis> {
        Outcome::from_result(self.try_get_analysis(id).await, GET_ANALYSIS_FAILED)
    }

    async fn fetch_upload(&self, filename: &str) -> Result<Vec<u8>, ClientError> {
        let url = self.upload_url(filename);
        debug!(%url, "GET stored file");
        let resp = self.client.get(&url).send().await?;
        Ok(check(resp).await?.bytes().await?.to_vec())
    }
}

/// Turn a non-2xx response into [`ClientError::Server`].
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let (message, has_detail) = match extract_detail(&body) {
        Some(detail) => (detail, true),
        None => (body, false),
    };
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
        has_detail,
    })
}

/// Pull the `detail` string out of an error body, if there is one.
fn extract_detail(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json.get("detail")?.as_str().map(str::to_string)
}
