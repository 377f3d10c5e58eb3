//! Application shell: the single owner of session state.
//!
//! The [`Shell`] holds the cached document collection, the selection, the
//! analysis currently on display and one busy flag per action kind. Views
//! read a [`ShellState`] snapshot; every mutation happens here, in response
//! to a completed API call.
//!
//! # State machine
//!
//! ```text
//!            load/upload              select
//!   Empty ──────────────▶ Listing ─────────────▶ Selected
//!     ▲                     ▲  ▲                   │
//!     │  last doc deleted   │  └───────────────────┘
//!     └─────────────────────┘   selected doc deleted
//! ```
//!
//! Uploading, analysing and loading are busy flags layered over these
//! states. A second request of the same kind while one is in flight is
//! refused with [`ShellError::Busy`]. A failed request leaves the state
//! exactly as it was and queues an error [`Notification`].

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::client::DocumentApi;
use crate::error::Outcome;
use crate::models::{Document, DocumentAnalysis};
use crate::upload::{self, UploadFile};

/// Action kinds that carry a busy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Upload,
    Analyze,
    Load,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::Upload => "upload",
            Action::Analyze => "analysis",
            Action::Load => "load",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusyFlags {
    pub uploading: bool,
    pub analyzing: bool,
    pub loading: bool,
}

impl BusyFlags {
    fn flag(&mut self, action: Action) -> &mut bool {
        match action {
            Action::Upload => &mut self.uploading,
            Action::Analyze => &mut self.analyzing,
            Action::Load => &mut self.loading,
        }
    }

    pub fn is_set(&self, action: Action) -> bool {
        match action {
            Action::Upload => self.uploading,
            Action::Analyze => self.analyzing,
            Action::Load => self.loading,
        }
    }
}

/// Which top-level view applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Empty,
    Listing,
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

/// A one-shot message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ShellError {
    #[error("{0} already in progress")]
    Busy(Action),

    /// Rejected locally by the upload control.
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Failed(String),

    #[error("document {0} not found")]
    NotFound(i64),
}

/// Everything the views render from.
#[derive(Debug, Clone, Default)]
pub struct ShellState {
    pub documents: Vec<Document>,
    pub selected: Option<i64>,
    pub analysis: Option<DocumentAnalysis>,
    pub busy: BusyFlags,
}

impl ShellState {
    pub fn view(&self) -> View {
        if self.selected.is_some() {
            View::Selected
        } else if self.documents.is_empty() {
            View::Empty
        } else {
            View::Listing
        }
    }

    pub fn selected_document(&self) -> Option<&Document> {
        let id = self.selected?;
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn analyzed_count(&self) -> usize {
        self.documents.iter().filter(|d| d.is_analyzed()).count()
    }

    fn select(&mut self, doc: &Document) {
        self.selected = Some(doc.id);
        self.analysis = doc
            .analysis_results
            .as_ref()
            .map(|r| DocumentAnalysis::from_results(doc.id, r));
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.analysis = None;
    }
}

pub const LOAD_FAILED: &str = "Failed to load documents";
pub const DELETE_FAILED: &str = "Failed to delete document";
pub const OPEN_FAILED: &str = "Failed to load document";

/// State container and action sequencer.
pub struct Shell<A: DocumentApi> {
    api: A,
    max_upload_bytes: u64,
    state: Mutex<ShellState>,
    notifications: Mutex<Vec<Notification>>,
}

/// Clears a busy flag when the request finishes, however it finishes.
struct BusyGuard<'a> {
    state: &'a Mutex<ShellState>,
    action: Action,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state.busy.flag(self.action) = false;
    }
}

impl<A: DocumentApi> Shell<A> {
    pub fn new(api: A, max_upload_bytes: u64) -> Self {
        Self {
            api,
            max_upload_bytes,
            state: Mutex::new(ShellState::default()),
            notifications: Mutex::new(Vec::new()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// A copy of the current state for rendering.
    pub fn snapshot(&self) -> ShellState {
        self.lock().clone()
    }

    pub fn view(&self) -> View {
        self.lock().view()
    }

    pub fn is_busy(&self, action: Action) -> bool {
        self.lock().busy.is_set(action)
    }

    /// Drain queued notifications, oldest first.
    pub fn take_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn lock(&self) -> MutexGuard<'_, ShellState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, level: Level, message: impl Into<String>) {
        let message = message.into();
        match level {
            Level::Success => info!("{}", message),
            Level::Error => warn!("{}", message),
        }
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notification { level, message });
    }

    fn fail<T>(&self, message: String) -> Result<T, ShellError> {
        self.notify(Level::Error, message.clone());
        Err(ShellError::Failed(message))
    }

    fn begin(&self, action: Action) -> Result<BusyGuard<'_>, ShellError> {
        let mut state = self.lock();
        let flag = state.busy.flag(action);
        if *flag {
            return Err(ShellError::Busy(action));
        }
        *flag = true;
        Ok(BusyGuard {
            state: &self.state,
            action,
        })
    }

    /// Replace the collection with the server's list.
    ///
    /// A selection whose document disappeared is cleared.
    pub async fn load_documents(&self) -> Result<usize, ShellError> {
        let _busy = self.begin(Action::Load)?;
        match self.api.list().await {
            Ok(docs) => {
                let mut state = self.lock();
                if let Some(id) = state.selected {
                    if !docs.iter().any(|d| d.id == id) {
                        state.clear_selection();
                    }
                }
                state.documents = docs;
                info!(count = state.documents.len(), "documents loaded");
                Ok(state.documents.len())
            }
            Err(e) => {
                warn!(error = %e, "list failed");
                self.fail(LOAD_FAILED.to_string())
            }
        }
    }

    /// Select a cached document. Its stored analysis, if any, goes on display.
    pub fn select(&self, id: i64) -> Result<Document, ShellError> {
        let mut state = self.lock();
        let doc = state
            .documents
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or(ShellError::NotFound(id))?;
        state.select(&doc);
        Ok(doc)
    }

    pub fn deselect(&self) {
        self.lock().clear_selection();
    }

    /// Fetch one document from the server, cache it and select it.
    pub async fn open(&self, id: i64) -> Result<Document, ShellError> {
        match self.api.get(id).await {
            Ok(doc) => {
                let mut state = self.lock();
                match state.documents.iter().position(|d| d.id == id) {
                    Some(i) => state.documents[i] = doc.clone(),
                    None => state.documents.insert(0, doc.clone()),
                }
                state.select(&doc);
                Ok(doc)
            }
            Err(e) => {
                warn!(error = %e, id, "get failed");
                if e.status() == Some(404) {
                    self.notify(Level::Error, format!("Document {} not found", id));
                    return Err(ShellError::NotFound(id));
                }
                self.fail(e.user_message(OPEN_FAILED))
            }
        }
    }

    /// Validate a file on disk and upload it.
    ///
    /// Validation failures are reported without touching the network or
    /// the busy flag.
    pub async fn upload_path(&self, path: &Path) -> Result<Document, ShellError> {
        let file = match upload::prepare(path, self.max_upload_bytes) {
            Ok(f) => f,
            Err(e) => {
                let message = e.to_string();
                self.notify(Level::Error, message.clone());
                return Err(ShellError::Rejected(message));
            }
        };
        self.upload(&file).await
    }

    /// Upload an already validated file. On success the new document is
    /// placed first in the collection and selected.
    pub async fn upload(&self, file: &UploadFile) -> Result<Document, ShellError> {
        if let Err(e) = upload::validate(file.mime, file.bytes.len() as u64, self.max_upload_bytes) {
            let message = e.to_string();
            self.notify(Level::Error, message.clone());
            return Err(ShellError::Rejected(message));
        }

        let _busy = self.begin(Action::Upload)?;
        match self.api.upload(file).await {
            Outcome::Success(doc) => {
                {
                    let mut state = self.lock();
                    state.documents.retain(|d| d.id != doc.id);
                    state.documents.insert(0, doc.clone());
                    state.select(&doc);
                }
                self.notify(Level::Success, "Document uploaded successfully!");
                Ok(doc)
            }
            Outcome::Failure(message) => self.fail(message),
        }
    }

    /// Analyse a document. The result replaces any earlier analysis on the
    /// cached document, and on the display if that document is selected.
    pub async fn analyze(&self, id: i64) -> Result<DocumentAnalysis, ShellError> {
        let _busy = self.begin(Action::Analyze)?;
        match self.api.analyze(id).await {
            Outcome::Success(mut analysis) => {
                analysis.document_id.get_or_insert(id);
                {
                    let mut state = self.lock();
                    if let Some(doc) = state.documents.iter_mut().find(|d| d.id == id) {
                        doc.analysis_results = Some(analysis.clone().into_results());
                    }
                    if state.selected == Some(id) {
                        state.analysis = Some(analysis.clone());
                    }
                }
                self.notify(Level::Success, "Analysis completed!");
                Ok(analysis)
            }
            Outcome::Failure(message) => self.fail(message),
        }
    }

    /// Fetch the stored analysis of a document without re-running it.
    ///
    /// Read-only: the collection is left untouched.
    pub async fn fetch_analysis(&self, id: i64) -> Result<DocumentAnalysis, ShellError> {
        match self.api.get_analysis(id).await {
            Outcome::Success(analysis) => Ok(analysis),
            Outcome::Failure(message) => self.fail(message),
        }
    }

    /// Delete a document. If it was selected, the selection and the
    /// displayed analysis are cleared.
    pub async fn delete(&self, id: i64) -> Result<(), ShellError> {
        match self.api.delete(id).await {
            Ok(()) => {
                {
                    let mut state = self.lock();
                    state.documents.retain(|d| d.id != id);
                    if state.selected == Some(id) {
                        state.clear_selection();
                    }
                }
                self.notify(Level::Success, "Document deleted successfully");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, id, "delete failed");
                self.fail(e.user_message(DELETE_FAILED))
            }
        }
    }
}
