//! # doclens CLI
//!
//! The `doclens` binary uploads documents to the analysis service, lists
//! and renders them, runs analysis and shows the highlighted result.
//!
//! ## Usage
//!
//! ```bash
//! doclens --config ./config/doclens.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `doclens list` | List documents with analysis status |
//! | `doclens show <id>` | Render a document with its highlights |
//! | `doclens upload <path>` | Validate and upload a PDF, DOCX or TXT file |
//! | `doclens analyze <id>` | Analyse a document and render the result |
//! | `doclens analysis <id>` | Print a document's stored analysis |
//! | `doclens delete <id>` | Delete a document |
//! | `doclens shell` | Interactive session |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use doclens::commands::{self, ShowOptions};
use doclens::{config, logging, repl, viewer};

const DEFAULT_CONFIG: &str = "./config/doclens.toml";

/// Upload, analyse and read documents with AI highlights.
#[derive(Parser)]
#[command(
    name = "doclens",
    about = "doclens — upload, analyse and read documents with AI highlights",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/doclens.toml`; built-in defaults apply when
    /// that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API base URL. Overrides the config file and `DOCLENS_API_URL`.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log requests to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List documents.
    List,

    /// Render a document.
    ///
    /// Text documents are shown with highlights overlaid; PDFs are shown
    /// one page at a time.
    Show {
        /// Document id.
        id: i64,

        /// Render the text without highlights.
        #[arg(long)]
        no_highlights: bool,

        /// PDF page to show (1-based).
        #[arg(long)]
        page: Option<usize>,

        /// Show the explanation for highlight number N.
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        explain: Option<u64>,
    },

    /// Upload a PDF, DOCX or TXT file (max 10 MiB).
    Upload {
        /// Path to the file.
        path: PathBuf,
    },

    /// Analyse a document and show the highlighted result.
    ///
    /// Replaces any earlier analysis of the same document.
    Analyze {
        /// Document id.
        id: i64,
    },

    /// Print a document's stored analysis.
    Analysis {
        /// Document id.
        id: i64,
    },

    /// Delete a document.
    Delete {
        /// Document id.
        id: i64,

        /// Do not ask for confirmation.
        #[arg(long, short)]
        yes: bool,
    },

    /// Start an interactive session.
    Shell,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = match cli.config {
        Some(ref path) => config::load_config(path, true)?,
        None => config::load_config(&PathBuf::from(DEFAULT_CONFIG), false)?,
    };
    let cfg = match cli.api_url {
        Some(ref url) => cfg.with_base_url(url)?,
        None => cfg,
    };
    tracing::debug!(base_url = %cfg.api.base_url, "configuration loaded");

    match cli.command {
        Commands::List => {
            commands::run_list(&cfg).await?;
        }
        Commands::Show {
            id,
            no_highlights,
            page,
            explain,
        } => {
            let opts = ShowOptions {
                no_highlights,
                page,
                explain: explain.map(|k| k as usize),
            };
            commands::run_show(&cfg, id, &opts).await?;
        }
        Commands::Upload { path } => {
            commands::run_upload(&cfg, &path).await?;
        }
        Commands::Analyze { id } => {
            commands::run_analyze(&cfg, id).await?;
        }
        Commands::Analysis { id } => {
            commands::run_analysis(&cfg, id).await?;
        }
        Commands::Delete { id, yes } => {
            commands::run_delete(&cfg, id, yes).await?;
        }
        Commands::Shell => {
            let shell = commands::connect(&cfg)?;
            let style = viewer::Style::from_config(&cfg.viewer);
            repl::run_repl(shell, style).await?;
        }
    }

    Ok(())
}
