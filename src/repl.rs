//! Interactive session (`doclens shell`).
//!
//! Reads one command per line and drives a single long-lived [`Shell`].
//! Analysis runs in the background so the session stays responsive; while
//! it runs the viewer shows a placeholder and a second `analyze` is
//! refused by the shell's busy flag.

use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::DocumentApi;
use crate::commands::{load_pdf, print_notifications};
use crate::list::{header_line, render_list};
use crate::shell::{Action, Shell, View};
use crate::viewer::{PdfPages, Style, Viewer};

const HELP: &str = "\
Commands:
  list               reload and show documents
  select <id>        show a document
  upload <path>      upload a PDF, DOCX or TXT file
  analyze [id]       analyse a document (default: selected)
  delete <id>        delete a document
  toggle             show/hide highlights
  hover <n>          explain highlight n
  unhover            close the explanation
  next | prev        change PDF page
  view               redraw the current view
  back               return to the list
  help               this text
  quit               leave";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Select(i64),
    Upload(PathBuf),
    Analyze(Option<i64>),
    Delete(i64),
    Toggle,
    Hover(usize),
    Unhover,
    Next,
    Prev,
    View,
    Back,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let id = |s: &str| -> Result<i64, String> {
        s.parse::<i64>()
            .map_err(|_| format!("expected a document id, got '{}'", s))
    };

    let cmd = match word {
        "list" | "ls" => Command::List,
        "select" | "open" => Command::Select(id(rest)?),
        "upload" if !rest.is_empty() => Command::Upload(PathBuf::from(rest)),
        "upload" => return Err("usage: upload <path>".to_string()),
        "analyze" if rest.is_empty() => Command::Analyze(None),
        "analyze" => Command::Analyze(Some(id(rest)?)),
        "delete" | "rm" => Command::Delete(id(rest)?),
        "toggle" => Command::Toggle,
        "hover" => Command::Hover(
            rest.parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("expected a highlight number, got '{}'", rest))?,
        ),
        "unhover" => Command::Unhover,
        "next" => Command::Next,
        "prev" => Command::Prev,
        "view" => Command::View,
        "back" => Command::Back,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };
    Ok(Some(cmd))
}

/// Session state that belongs to the terminal, not the shell.
struct Session<A: DocumentApi + 'static> {
    shell: Arc<Shell<A>>,
    viewer: Viewer,
    style: Style,
    /// Parsed pages of the selected PDF, keyed by document id.
    pdf: Option<(i64, PdfPages)>,
    /// Document awaiting a yes/no answer on the next line.
    pending_delete: Option<i64>,
}

impl<A: DocumentApi + 'static> Session<A> {
    async fn render(&mut self) -> String {
        let state = self.shell.snapshot();
        let mut out = String::new();
        match state.view() {
            View::Empty | View::Listing => {
                out.push_str(&render_list(&state.documents, state.selected));
            }
            View::Selected => {
                let doc = match state.selected_document() {
                    Some(d) => d.clone(),
                    None => return render_list(&state.documents, None),
                };
                if self.pdf.as_ref().map(|(id, _)| *id) != Some(doc.id) {
                    self.pdf = None;
                    match load_pdf(self.shell.api(), &doc).await {
                        Ok(Some(pages)) => {
                            self.viewer.set_num_pages(pages.len());
                            self.pdf = Some((doc.id, pages));
                        }
                        Ok(None) => {}
                        Err(e) => out.push_str(&format!("Error: {:#}\n", e)),
                    }
                }
                out.push_str(&self.viewer.render(
                    &doc,
                    state.analysis.as_ref(),
                    self.pdf.as_ref().map(|(_, p)| p),
                    state.busy.analyzing,
                    &self.style,
                ));
            }
        }
        out
    }

    async fn answer_delete(&mut self, id: i64, answer: &str) {
        if !matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            println!("Cancelled.");
            return;
        }
        if self.shell.delete(id).await.is_ok() {
            print_notifications(&self.shell.take_notifications());
            print!("{}", self.render().await);
        }
    }

    fn on_select(&mut self) {
        self.viewer.reset();
        self.pdf = None;
    }

    /// Handle one command. Returns false to end the session.
    async fn handle(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::List => {
                if self.shell.load_documents().await.is_ok() {
                    let state = self.shell.snapshot();
                    print!("{}", render_list(&state.documents, state.selected));
                }
            }
            Command::Select(id) => match self.shell.select(id) {
                Ok(_) => {
                    self.on_select();
                    print!("{}", self.render().await);
                }
                Err(e) => eprintln!("Error: {}", e),
            },
            Command::Upload(path) => {
                if self.shell.upload_path(&path).await.is_ok() {
                    self.on_select();
                    print!("{}", self.render().await);
                }
            }
            Command::Analyze(id) => {
                let id = match id.or(self.shell.snapshot().selected) {
                    Some(id) => id,
                    None => {
                        eprintln!("Error: no document selected");
                        return true;
                    }
                };
                if self.shell.is_busy(Action::Analyze) {
                    eprintln!("Error: analysis already in progress");
                    return true;
                }
                let shell = Arc::clone(&self.shell);
                tokio::spawn(async move {
                    let _ = shell.analyze(id).await;
                });
                println!("Analyzing document {}...", id);
            }
            Command::Delete(id) => {
                let name = self
                    .shell
                    .snapshot()
                    .documents
                    .iter()
                    .find(|d| d.id == id)
                    .map(|d| d.original_filename.clone())
                    .unwrap_or_else(|| format!("document {}", id));
                print!("Are you sure you want to delete \"{}\"? [y/N] ", name);
                self.pending_delete = Some(id);
            }
            Command::Toggle => {
                self.viewer.toggle_highlights();
                print!("{}", self.render().await);
            }
            Command::Hover(n) => {
                self.viewer.hover(n - 1);
                print!("{}", self.render().await);
            }
            Command::Unhover => {
                self.viewer.unhover();
                print!("{}", self.render().await);
            }
            Command::Next => {
                self.viewer.next_page();
                print!("{}", self.render().await);
            }
            Command::Prev => {
                self.viewer.prev_page();
                print!("{}", self.render().await);
            }
            Command::View => print!("{}", self.render().await),
            Command::Back => {
                self.shell.deselect();
                self.on_select();
                print!("{}", self.render().await);
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return false,
        }
        true
    }
}

/// Run the interactive session until `quit` or end of input.
pub async fn run_repl<A: DocumentApi + 'static>(shell: Shell<A>, style: Style) -> Result<()> {
    let mut session = Session {
        shell: Arc::new(shell),
        viewer: Viewer::new(),
        style,
        pdf: None,
        pending_delete: None,
    };

    let _ = session.shell.load_documents().await;
    print_notifications(&session.shell.take_notifications());
    let state = session.shell.snapshot();
    println!("doclens — {}", header_line(&state.documents));
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_notifications(&session.shell.take_notifications());
        if session.pending_delete.is_none() {
            print!("> ");
        }
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await? {
            Some(l) => l,
            None => break,
        };
        if let Some(id) = session.pending_delete.take() {
            session.answer_delete(id, &line).await;
            continue;
        }
        match parse_command(&line) {
            Ok(Some(cmd)) => {
                if !session.handle(cmd).await {
                    break;
                }
            }
            Ok(None) => {}
            Err(msg) => eprintln!("Error: {}", msg),
        }
    }

    print_notifications(&session.shell.take_notifications());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("  ").unwrap(), None);
        assert_eq!(parse_command("list").unwrap(), Some(Command::List));
        assert_eq!(parse_command("select 4").unwrap(), Some(Command::Select(4)));
        assert_eq!(parse_command("analyze").unwrap(), Some(Command::Analyze(None)));
        assert_eq!(parse_command("analyze 9").unwrap(), Some(Command::Analyze(Some(9))));
        assert_eq!(
            parse_command("upload ./my notes.txt").unwrap(),
            Some(Command::Upload(PathBuf::from("./my notes.txt")))
        );
        assert_eq!(parse_command("hover 2").unwrap(), Some(Command::Hover(2)));
        assert_eq!(parse_command("q").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("select x").is_err());
        assert!(parse_command("hover 0").is_err());
        assert!(parse_command("upload").is_err());
        assert!(parse_command("frobnicate").is_err());
    }
}
