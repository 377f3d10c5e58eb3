//! # doclens
//!
//! A terminal client for an AI document analysis service.
//!
//! Users upload PDF, DOCX or TXT files, ask the service to analyse them, and
//! read the results as highlights overlaid on the document text, together
//! with a summary and key insights. Parsing, inference and storage all live
//! in the service; this crate is the client side.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌────────────┐
//! │  Upload  │──▶│    Shell     │──▶│ HttpClient │──▶ /api/v1
//! │ control  │   │ state + busy │   │ (reqwest)  │
//! └──────────┘   └──────┬───────┘   └────────────┘
//!                       │ snapshot
//!             ┌─────────┴─────────┐
//!             ▼                   ▼
//!        ┌─────────┐        ┌──────────┐
//!        │  List   │        │  Viewer  │──▶ overlay
//!        └─────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! doclens upload ./contract.pdf
//! doclens list
//! doclens analyze 3
//! doclens show 3 --explain 1
//! doclens shell
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and `DOCLENS_API_URL` override |
//! | [`models`] | Document, highlight and analysis types |
//! | [`error`] | Client error taxonomy and [`Outcome`](error::Outcome) |
//! | [`client`] | [`DocumentApi`](client::DocumentApi) trait and HTTP client |
//! | [`upload`] | File type and size gating before upload |
//! | [`overlay`] | Splitting text into plain and highlighted segments |
//! | [`list`] | Document list view |
//! | [`viewer`] | Document viewer, hover panel, analysis summary |
//! | [`shell`] | Session state container and action sequencing |
//! | [`commands`] | One-shot CLI commands |
//! | [`repl`] | Interactive session |
//! | [`logging`] | Tracing setup |

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod list;
pub mod logging;
pub mod models;
pub mod overlay;
pub mod repl;
pub mod shell;
pub mod upload;
pub mod viewer;
