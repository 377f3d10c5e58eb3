//! State-machine tests for the shell, driven through an in-memory API.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use doclens::client::DocumentApi;
use doclens::config::DEFAULT_MAX_UPLOAD_BYTES;
use doclens::error::{ClientError, Outcome};
use doclens::models::{Document, DocumentAnalysis, FileType, Highlight};
use doclens::shell::{Action, Level, Shell, ShellError, View};
use doclens::upload::{size_rejected, UploadFile, MIME_TXT, TYPE_REJECTED};

#[derive(Default)]
struct FakeApi {
    docs: Mutex<Vec<Document>>,
    next_id: AtomicI64,
    network_calls: AtomicUsize,
    analyze_round: AtomicUsize,
    fail_upload: AtomicBool,
    fail_analyze: AtomicBool,
    fail_delete: AtomicBool,
    fail_list: AtomicBool,
    /// When set, `analyze` waits for a permit before answering.
    analyze_gate: Option<Arc<Notify>>,
}

fn document(id: i64, name: &str) -> Document {
    Document {
        id,
        filename: format!("{}-{}", id, name),
        original_filename: name.to_string(),
        file_path: format!("uploads/{}-{}", id, name),
        file_size: 11,
        file_type: FileType::Txt,
        content: Some("hello world".to_string()),
        analysis_results: None,
        created_at: "2024-05-01T09:00:00".to_string(),
        updated_at: None,
    }
}

fn server_error(detail: &str) -> ClientError {
    ClientError::Server {
        status: 500,
        message: detail.to_string(),
        has_detail: true,
    }
}

impl FakeApi {
    fn with_docs(docs: Vec<Document>) -> Self {
        let next = docs.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        Self {
            docs: Mutex::new(docs),
            next_id: AtomicI64::new(next),
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.network_calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentApi for FakeApi {
    async fn upload(&self, file: &UploadFile) -> Outcome<Document> {
        self.hit();
        if self.fail_upload.load(Ordering::SeqCst) {
            return Outcome::Failure("Error extracting text: broken".to_string());
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let doc = document(id, &file.name);
        self.docs.lock().unwrap().insert(0, doc.clone());
        Outcome::Success(doc)
    }

    async fn list(&self) -> Result<Vec<Document>, ClientError> {
        self.hit();
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(server_error("database down"));
        }
        Ok(self.docs.lock().unwrap().clone())
    }

    async fn get(&self, id: i64) -> Result<Document, ClientError> {
        self.hit();
        self.docs
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or(ClientError::Server {
                status: 404,
                message: "Document not found".to_string(),
                has_detail: true,
            })
    }

    async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.hit();
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(server_error("locked"));
        }
        self.docs.lock().unwrap().retain(|d| d.id != id);
        Ok(())
    }

    async fn analyze(&self, id: i64) -> Outcome<DocumentAnalysis> {
        self.hit();
        if let Some(gate) = &self.analyze_gate {
            gate.notified().await;
        }
        if self.fail_analyze.load(Ordering::SeqCst) {
            return Outcome::Failure("Analysis failed: model timeout".to_string());
        }
        let round = self.analyze_round.fetch_add(1, Ordering::SeqCst);
        let highlights = (0..=round)
            .map(|i| Highlight {
                text: "hello".to_string(),
                importance_score: 0.7,
                category: format!("round {}", round),
                explanation: format!("highlight {}", i),
                start_position: 0,
                end_position: 5,
            })
            .collect();
        Outcome::Success(DocumentAnalysis {
            document_id: Some(id),
            highlights,
            summary: format!("summary {}", round),
            key_insights: vec![],
        })
    }

    async fn get_analysis(&self, id: i64) -> Outcome<DocumentAnalysis> {
        self.hit();
        let docs = self.docs.lock().unwrap();
        match docs.iter().find(|d| d.id == id).and_then(|d| d.analysis_results.clone()) {
            Some(r) => Outcome::Success(DocumentAnalysis::from_results(id, &r)),
            None => Outcome::Failure("No analysis results found for this document".to_string()),
        }
    }

    async fn fetch_upload(&self, _filename: &str) -> Result<Vec<u8>, ClientError> {
        self.hit();
        Ok(Vec::new())
    }
}

fn shell_with(docs: Vec<Document>) -> Shell<FakeApi> {
    Shell::new(FakeApi::with_docs(docs), DEFAULT_MAX_UPLOAD_BYTES)
}

#[tokio::test]
async fn test_load_moves_from_empty_to_listing() {
    let shell = shell_with(vec![document(1, "a.txt"), document(2, "b.txt")]);
    assert_eq!(shell.view(), View::Empty);

    assert_eq!(shell.load_documents().await, Ok(2));
    assert_eq!(shell.view(), View::Listing);
    assert!(!shell.is_busy(Action::Load));
}

#[tokio::test]
async fn test_load_failure_keeps_previous_state() {
    let shell = shell_with(vec![document(1, "a.txt")]);
    shell.load_documents().await.unwrap();
    shell.api().fail_list.store(true, Ordering::SeqCst);

    let err = shell.load_documents().await.unwrap_err();
    assert_eq!(err, ShellError::Failed("Failed to load documents".to_string()));
    assert_eq!(shell.snapshot().documents.len(), 1);

    let notes = shell.take_notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, Level::Error);
    assert!(shell.take_notifications().is_empty());
}

#[tokio::test]
async fn test_upload_inserts_at_head_and_selects() {
    let shell = shell_with(vec![document(1, "old.txt")]);
    shell.load_documents().await.unwrap();

    let file = UploadFile {
        name: "new.txt".to_string(),
        mime: MIME_TXT,
        bytes: b"hello world".to_vec(),
    };
    let doc = shell.upload(&file).await.unwrap();

    let state = shell.snapshot();
    assert_eq!(state.documents[0].id, doc.id);
    assert_eq!(state.documents.len(), 2);
    assert_eq!(state.selected, Some(doc.id));
    assert_eq!(state.view(), View::Selected);
    assert!(state.analysis.is_none());
    assert_eq!(
        shell.take_notifications()[0].message,
        "Document uploaded successfully!"
    );
}

#[tokio::test]
async fn test_upload_failure_shows_server_message() {
    let shell = shell_with(vec![]);
    shell.api().fail_upload.store(true, Ordering::SeqCst);
    let file = UploadFile {
        name: "x.txt".to_string(),
        mime: MIME_TXT,
        bytes: vec![b'x'],
    };

    let err = shell.upload(&file).await.unwrap_err();
    assert_eq!(err, ShellError::Failed("Error extracting text: broken".to_string()));
    assert_eq!(shell.view(), View::Empty);
    assert!(!shell.is_busy(Action::Upload));
}

#[tokio::test]
async fn test_upload_rejects_png_and_15_mib_without_network() {
    let dir = tempfile::TempDir::new().unwrap();
    let png = dir.path().join("photo.png");
    std::fs::write(&png, b"\x89PNG").unwrap();
    let big = dir.path().join("huge.pdf");
    std::fs::File::create(&big)
        .unwrap()
        .set_len(15 * 1024 * 1024)
        .unwrap();

    let shell = shell_with(vec![]);
    assert_eq!(
        shell.upload_path(&png).await.unwrap_err(),
        ShellError::Rejected(TYPE_REJECTED.to_string())
    );
    assert_eq!(
        shell.upload_path(&big).await.unwrap_err(),
        ShellError::Rejected(size_rejected(DEFAULT_MAX_UPLOAD_BYTES))
    );

    let oversized = UploadFile {
        name: "huge.txt".to_string(),
        mime: MIME_TXT,
        bytes: vec![0; DEFAULT_MAX_UPLOAD_BYTES as usize + 1],
    };
    assert!(matches!(
        shell.upload(&oversized).await,
        Err(ShellError::Rejected(_))
    ));

    assert_eq!(shell.api().calls(), 0);
    assert_eq!(shell.take_notifications().len(), 3);
}

#[tokio::test]
async fn test_upload_rejection_names_configured_limit() {
    let shell = Shell::new(FakeApi::with_docs(vec![]), 2 * 1024 * 1024);
    let file = UploadFile {
        name: "notes.txt".to_string(),
        mime: MIME_TXT,
        bytes: vec![b'x'; 3 * 1024 * 1024],
    };
    assert_eq!(
        shell.upload(&file).await.unwrap_err(),
        ShellError::Rejected("File size must be less than 2MB".to_string())
    );
    assert_eq!(shell.api().calls(), 0);
}

#[tokio::test]
async fn test_select_shows_stored_analysis() {
    let shell = shell_with(vec![document(1, "a.txt"), document(2, "b.txt")]);
    shell.load_documents().await.unwrap();
    shell.analyze(2).await.unwrap();

    shell.select(1).unwrap();
    assert!(shell.snapshot().analysis.is_none());

    shell.select(2).unwrap();
    let state = shell.snapshot();
    assert_eq!(state.analysis.as_ref().unwrap().summary, "summary 0");
    assert_eq!(state.analyzed_count(), 1);

    assert_eq!(shell.select(99).unwrap_err(), ShellError::NotFound(99));
}

#[tokio::test]
async fn test_analyze_unselected_leaves_display_alone() {
    let shell = shell_with(vec![document(1, "a.txt"), document(2, "b.txt")]);
    shell.load_documents().await.unwrap();
    shell.select(1).unwrap();

    shell.analyze(2).await.unwrap();
    let state = shell.snapshot();
    assert_eq!(state.selected, Some(1));
    assert!(state.analysis.is_none());
    assert!(state.documents.iter().find(|d| d.id == 2).unwrap().is_analyzed());
}

#[tokio::test]
async fn test_reanalyze_replaces_results() {
    let shell = shell_with(vec![document(1, "a.txt")]);
    shell.load_documents().await.unwrap();
    shell.select(1).unwrap();

    shell.analyze(1).await.unwrap();
    shell.analyze(1).await.unwrap();

    let state = shell.snapshot();
    let shown = state.analysis.as_ref().unwrap();
    assert_eq!(shown.summary, "summary 1");
    assert_eq!(shown.highlights.len(), 2);
    assert!(shown.highlights.iter().all(|h| h.category == "round 1"));

    let stored = state.documents[0].analysis_results.as_ref().unwrap();
    assert_eq!(stored.highlights.len(), 2);
    assert!(stored.highlights.iter().all(|h| h.category == "round 1"));
}

#[tokio::test]
async fn test_analyze_failure_keeps_previous_analysis() {
    let shell = shell_with(vec![document(1, "a.txt")]);
    shell.load_documents().await.unwrap();
    shell.select(1).unwrap();
    shell.analyze(1).await.unwrap();
    shell.take_notifications();

    shell.api().fail_analyze.store(true, Ordering::SeqCst);
    assert!(shell.analyze(1).await.is_err());

    let state = shell.snapshot();
    assert_eq!(state.analysis.as_ref().unwrap().summary, "summary 0");
    assert!(!state.busy.analyzing);
    let notes = shell.take_notifications();
    assert_eq!(notes[0].message, "Analysis failed: model timeout");
}

#[tokio::test]
async fn test_delete_selected_clears_selection_and_analysis() {
    let shell = shell_with(vec![document(1, "a.txt"), document(2, "b.txt")]);
    shell.load_documents().await.unwrap();
    shell.select(1).unwrap();
    shell.analyze(1).await.unwrap();

    shell.delete(1).await.unwrap();
    let state = shell.snapshot();
    assert_eq!(state.selected, None);
    assert!(state.analysis.is_none());
    assert_eq!(state.view(), View::Listing);

    shell.delete(2).await.unwrap();
    assert_eq!(shell.view(), View::Empty);
}

#[tokio::test]
async fn test_delete_other_keeps_selection() {
    let shell = shell_with(vec![document(1, "a.txt"), document(2, "b.txt")]);
    shell.load_documents().await.unwrap();
    shell.select(1).unwrap();
    shell.analyze(1).await.unwrap();

    shell.delete(2).await.unwrap();
    let state = shell.snapshot();
    assert_eq!(state.selected, Some(1));
    assert!(state.analysis.is_some());
    assert_eq!(state.documents.len(), 1);
}

#[tokio::test]
async fn test_delete_failure_changes_nothing() {
    let shell = shell_with(vec![document(1, "a.txt")]);
    shell.load_documents().await.unwrap();
    shell.select(1).unwrap();
    shell.api().fail_delete.store(true, Ordering::SeqCst);

    assert!(shell.delete(1).await.is_err());
    let state = shell.snapshot();
    assert_eq!(state.selected, Some(1));
    assert_eq!(state.documents.len(), 1);
}

#[tokio::test]
async fn test_open_not_found() {
    let shell = shell_with(vec![]);
    assert_eq!(shell.open(5).await.unwrap_err(), ShellError::NotFound(5));
    assert_eq!(shell.take_notifications()[0].message, "Document 5 not found");
}

#[tokio::test]
async fn test_fetch_analysis_does_not_mutate() {
    let shell = shell_with(vec![document(1, "a.txt")]);
    shell.load_documents().await.unwrap();

    assert!(shell.fetch_analysis(1).await.is_err());
    assert!(!shell.snapshot().documents[0].is_analyzed());
}

#[tokio::test]
async fn test_second_analysis_refused_while_busy() {
    let gate = Arc::new(Notify::new());
    let api = FakeApi {
        analyze_gate: Some(Arc::clone(&gate)),
        ..FakeApi::with_docs(vec![document(1, "a.txt")])
    };
    let shell = Arc::new(Shell::new(api, DEFAULT_MAX_UPLOAD_BYTES));
    shell.load_documents().await.unwrap();

    let first = {
        let shell = Arc::clone(&shell);
        tokio::spawn(async move { shell.analyze(1).await })
    };
    while !shell.is_busy(Action::Analyze) {
        tokio::task::yield_now().await;
    }

    assert_eq!(
        shell.analyze(1).await.unwrap_err(),
        ShellError::Busy(Action::Analyze)
    );

    gate.notify_one();
    assert!(first.await.unwrap().is_ok());
    assert!(!shell.is_busy(Action::Analyze));
    assert_eq!(shell.api().calls(), 2);
}
