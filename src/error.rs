//! Error types for compositing and gallery persistence.

use std::time::Duration;

/// Longest provider error message kept in an error value.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while uploading, generating or persisting.
#[derive(Debug, thiserror::Error)]
pub enum ModelShotError {
    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Rate limit or quota exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Server-suggested delay, if any.
        retry_after: Option<Duration>,
    },

    /// Generation did not finish before the caller's deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// The response did not carry image data where it was expected.
    #[error("no image in response: {0}")]
    NoImage(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// A prerequisite image has not been uploaded yet.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// A local file could not be read or encoded.
    #[error("could not read image '{name}': {reason}")]
    Upload {
        /// File name as given by the user.
        name: String,
        /// What went wrong.
        reason: String,
    },

    /// Reading or writing the gallery slot failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// The four failure classes a user-facing layer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A prerequisite image is missing.
    Input,
    /// A local file could not be read or encoded.
    UploadDecode,
    /// The generation call failed or returned no usable image.
    Generation,
    /// Loading or saving the gallery failed.
    Persistence,
}

impl ModelShotError {
    /// Classifies this error for display and handling.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingInput(_) => FailureKind::Input,
            Self::Upload { .. } => FailureKind::UploadDecode,
            Self::Persistence(_) => FailureKind::Persistence,
            Self::Auth(_)
            | Self::Api { .. }
            | Self::RateLimited { .. }
            | Self::Timeout(_)
            | Self::ContentBlocked(_)
            | Self::NoImage(_)
            | Self::InvalidRequest(_)
            | Self::Network(_)
            | Self::Decode(_) => FailureKind::Generation,
        }
    }

    /// Returns the single message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self.kind() {
            FailureKind::Input => self.to_string(),
            FailureKind::UploadDecode => format!("{self}. Please try another file."),
            FailureKind::Generation => format!(
                "Could not create a new image ({self}). The model may have content \
                 restrictions; please try again or use a different image."
            ),
            FailureKind::Persistence => {
                format!("The gallery could not be saved ({self}); changes last until exit.")
            }
        }
    }

    /// Returns the suggested retry delay, if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, ModelShotError>;

/// Reads a `Retry-After` header given in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Strips API keys from a provider message and caps its length.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let redacted: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            let trimmed = word.trim_matches(|c: char| !c.is_ascii_alphanumeric());
            if trimmed.starts_with("AIza") && trimmed.len() >= 30 {
                word.replace(trimmed, "[REDACTED]")
            } else {
                word.to_string()
            }
        })
        .collect();
    let mut message = redacted.join(" ");
    if message.len() > MAX_ERROR_MESSAGE_LEN {
        let mut cut = MAX_ERROR_MESSAGE_LEN;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
        message.push_str("...");
    }
    message
}
