//! One-shot CLI commands.
//!
//! Each `run_*` function builds a [`Shell`] over an [`HttpClient`], performs
//! one action, prints the resulting notifications and view, and exits
//! non-zero when the action failed.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::warn;

use crate::client::{DocumentApi, HttpClient};
use crate::config::Config;
use crate::list::render_list;
use crate::models::{Document, DocumentKind};
use crate::shell::{Level, Notification, Shell, ShellError};
use crate::viewer::{render_analysis_report, PdfPages, Style, Viewer};

/// Options for rendering a single document.
#[derive(Debug, Clone, Default)]
pub struct ShowOptions {
    pub no_highlights: bool,
    pub page: Option<usize>,
    /// 1-based highlight number to show the explanation panel for.
    pub explain: Option<usize>,
}

pub fn connect(config: &Config) -> Result<Shell<HttpClient>> {
    let client = HttpClient::new(&config.api).context("Failed to build HTTP client")?;
    Ok(Shell::new(client, config.upload.max_bytes))
}

/// Print notifications; returns true if any was an error.
pub fn print_notifications(notifications: &[Notification]) -> bool {
    let mut had_error = false;
    for n in notifications {
        match n.level {
            Level::Success => println!("✓ {}", n.message),
            Level::Error => {
                had_error = true;
                eprintln!("Error: {}", n.message);
            }
        }
    }
    had_error
}

/// Flush notifications and unwrap a shell result, exiting on failure.
fn finish<A: DocumentApi, T>(shell: &Shell<A>, result: Result<T, ShellError>) -> T {
    let had_error = print_notifications(&shell.take_notifications());
    match result {
        Ok(v) => v,
        Err(e) => {
            if !had_error {
                eprintln!("Error: {}", e);
            }
            std::process::exit(1);
        }
    }
}

/// Fetch and parse a PDF document's stored file.
pub async fn load_pdf<A: DocumentApi>(api: &A, doc: &Document) -> Result<Option<PdfPages>> {
    match doc.kind() {
        DocumentKind::Pdf { filename } => {
            let bytes = api
                .fetch_upload(filename)
                .await
                .with_context(|| format!("Failed to fetch {}", filename))?;
            Ok(Some(PdfPages::from_bytes(&bytes)?))
        }
        DocumentKind::Text { .. } => Ok(None),
    }
}

/// Render the selected document. A PDF that cannot be fetched or parsed
/// is reported inline and the rest of the view still renders.
pub async fn render_selected<A: DocumentApi>(
    shell: &Shell<A>,
    viewer: &mut Viewer,
    style: &Style,
) -> String {
    let state = shell.snapshot();
    let doc = match state.selected_document() {
        Some(d) => d,
        None => return render_list(&state.documents, None),
    };
    let mut out = String::new();
    let pdf = match load_pdf(shell.api(), doc).await {
        Ok(pdf) => pdf,
        Err(e) => {
            warn!(id = doc.id, error = %e, "PDF preview unavailable");
            out.push_str(&format!("Error: {:#}\n", e));
            None
        }
    };
    if let Some(ref pages) = pdf {
        viewer.set_num_pages(pages.len());
    }
    out.push_str(&viewer.render(
        doc,
        state.analysis.as_ref(),
        pdf.as_ref(),
        state.busy.analyzing,
        style,
    ));
    out
}

pub async fn run_list(config: &Config) -> Result<()> {
    let shell = connect(config)?;
    let result = shell.load_documents().await;
    finish(&shell, result);

    let state = shell.snapshot();
    print!("{}", render_list(&state.documents, state.selected));
    Ok(())
}

pub async fn run_show(config: &Config, id: i64, opts: &ShowOptions) -> Result<()> {
    let shell = connect(config)?;
    let result = shell.open(id).await;
    finish(&shell, result);

    let mut viewer = Viewer::new();
    viewer.set_show_highlights(!opts.no_highlights);
    if let Some(page) = opts.page {
        viewer.go_to_page(page);
    }
    if let Some(index) = opts.explain.and_then(|k| k.checked_sub(1)) {
        viewer.hover(index);
    }
    let style = Style::from_config(&config.viewer);
    print!("{}", render_selected(&shell, &mut viewer, &style).await);
    Ok(())
}

pub async fn run_upload(config: &Config, path: &Path) -> Result<()> {
    let shell = connect(config)?;
    let result = shell.upload_path(path).await;
    let doc = finish(&shell, result);
    println!("id: {}", doc.id);

    let style = Style::from_config(&config.viewer);
    print!("{}", render_selected(&shell, &mut Viewer::new(), &style).await);
    Ok(())
}

pub async fn run_analyze(config: &Config, id: i64) -> Result<()> {
    let shell = connect(config)?;
    let result = shell.open(id).await;
    finish(&shell, result);
    let result = shell.analyze(id).await;
    finish(&shell, result);

    let style = Style::from_config(&config.viewer);
    print!("{}", render_selected(&shell, &mut Viewer::new(), &style).await);
    Ok(())
}

pub async fn run_analysis(config: &Config, id: i64) -> Result<()> {
    let shell = connect(config)?;
    let result = shell.fetch_analysis(id).await;
    let analysis = finish(&shell, result);
    print!("{}", render_analysis_report(&analysis));
    Ok(())
}

pub async fn run_delete(config: &Config, id: i64, yes: bool) -> Result<()> {
    let shell = connect(config)?;
    let result = shell.open(id).await;
    let doc = finish(&shell, result);

    if !yes && !confirm(&format!(
        "Are you sure you want to delete \"{}\"?",
        doc.original_filename
    ))? {
        println!("Cancelled.");
        return Ok(());
    }

    let result = shell.delete(id).await;
    finish(&shell, result);
    Ok(())
}

/// Ask a yes/no question on stdin. Anything but `y`/`yes` is a no.
pub fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
