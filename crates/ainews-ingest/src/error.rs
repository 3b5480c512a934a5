use ainews_core::StoreError;
use thiserror::Error;

/// Errors raised by vendor clients, normalization and the job runner.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The vendor answered but reported a failure (bad status, error envelope).
    #[error("{vendor} API error: {message}")]
    Api {
        vendor: &'static str,
        message: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A candidate lacks a field required to build its canonical record.
    #[error("candidate is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Caller-supplied parameters or configuration are unusable. Aborts the job.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    pub(crate) fn api(vendor: &'static str, message: impl Into<String>) -> Self {
        IngestError::Api {
            vendor,
            message: message.into(),
        }
    }
}
