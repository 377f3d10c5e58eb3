use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "DOCLENS_API_URL";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Largest file the upload control will send (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout; `0` waits for the server indefinitely.
    #[serde(default)]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: 0,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn enabled(&self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => atty::is(atty::Stream::Stdout),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewerConfig {
    #[serde(default)]
    pub color: ColorMode,
    /// Number of highlight chips shown under the analysis summary.
    #[serde(default = "default_summary_preview")]
    pub summary_preview: usize,
    /// Characters of highlight text shown on each chip.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            color: ColorMode::Auto,
            summary_preview: default_summary_preview(),
            snippet_chars: default_snippet_chars(),
        }
    }
}

fn default_summary_preview() -> usize {
    6
}
fn default_snippet_chars() -> usize {
    30
}

/// Load configuration from `path`, then apply the `DOCLENS_API_URL` override.
///
/// When `required` is false a missing file yields the defaults; a file that
/// exists but fails to parse is always an error.
pub fn load_config(path: &Path, required: bool) -> Result<Config> {
    let mut config = if path.exists() || required {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        Config::default()
    };

    if let Ok(url) = std::env::var(API_URL_ENV) {
        if !url.trim().is_empty() {
            config.api.base_url = url;
        }
    }

    config.validate()?;
    Ok(config)
}

impl Config {
    /// Replace the API base URL (CLI `--api-url`) and re-validate.
    pub fn with_base_url(mut self, url: &str) -> Result<Self> {
        self.api.base_url = url.to_string();
        self.validate()?;
        Ok(self)
    }

    fn validate(&mut self) -> Result<()> {
        let trimmed = self.api.base_url.trim().trim_end_matches('/').to_string();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            anyhow::bail!(
                "api.base_url must start with http:// or https:// (got '{}')",
                self.api.base_url
            );
        }
        self.api.base_url = trimmed;

        if self.upload.max_bytes == 0 {
            anyhow::bail!("upload.max_bytes must be > 0");
        }

        Ok(())
    }
}
