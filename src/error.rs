//! Error taxonomy for client operations.
//!
//! | Variant | Raised when |
//! |---------|-------------|
//! | [`ClientError::Validation`] | a file is rejected locally, before any request |
//! | [`ClientError::Transport`] | the request could not be sent or the body could not be read |
//! | [`ClientError::Server`] | the service answered with a non-2xx status |
//!
//! Upload and analysis calls fold these into an [`Outcome`] so callers can
//! show an inline message without matching on error kinds.

/// Errors surfaced by the API client and upload control.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Server {
        status: u16,
        /// The response's `detail` field when present, else the raw body.
        message: String,
        /// True when `message` came from a `detail` field.
        has_detail: bool,
    },
}

impl ClientError {
    /// The message to show the user for a failed action.
    ///
    /// Validation messages and server `detail` messages are shown verbatim;
    /// anything else collapses to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Server {
                message,
                has_detail: true,
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            ClientError::Validation(_) => None,
        }
    }
}

/// Success-or-message result for actions whose failures are shown inline.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(String),
}

impl<T> Outcome<T> {
    /// Fold a client result, using `fallback` when the error carries no
    /// user-facing message.
    pub fn from_result(result: Result<T, ClientError>, fallback: &str) -> Self {
        match result {
            Ok(v) => Outcome::Success(v),
            Err(e) => {
                tracing::warn!(error = %e, "{}", fallback);
                Outcome::Failure(e.user_message(fallback))
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn into_result(self) -> anyhow::Result<T> {
        match self {
            Outcome::Success(v) => Ok(v),
            Outcome::Failure(msg) => Err(anyhow::anyhow!(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_shown_verbatim() {
        let err = ClientError::Server {
            status: 400,
            message: "File type not supported".to_string(),
            has_detail: true,
        };
        assert_eq!(err.user_message("Upload failed"), "File type not supported");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_raw_body_falls_back() {
        let err = ClientError::Server {
            status: 502,
            message: "<html>bad gateway</html>".to_string(),
            has_detail: false,
        };
        assert_eq!(err.user_message("Analysis failed"), "Analysis failed");
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: Outcome<u8> = Outcome::from_result(Ok(3), "x");
        assert_eq!(ok, Outcome::Success(3));

        let failed: Outcome<u8> =
            Outcome::from_result(Err(ClientError::Validation("too big".into())), "x");
        assert_eq!(failed, Outcome::Failure("too big".to_string()));
        assert!(failed.into_result().is_err());
    }
}
