//! Typed errors for the SDK layer (spec.md §7, SPEC_FULL.md §4.K), one enum
//! per failure domain rather than a single catch-all, grounded on
//! `opentelemetry-sdk/src/error.rs`'s `OTelSdkError`.
use thiserror::Error;

/// Project/credential resolution failures (spec.md §7 "Configuration error").
/// Surfaced once via a log line; the tracer that hit this demotes to
/// no-op export and keeps working locally.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JUDGMENT_API_KEY is not set and no api_key was provided")]
    MissingApiKey,
    #[error("JUDGMENT_ORG_ID is not set and no org_id was provided")]
    MissingOrgId,
    #[error("invalid JUDGMENT_API_URL: {0}")]
    InvalidApiUrl(String),
}

/// Export/transport failures (spec.md §7 "Transport error"). Reported to the
/// batch processor, which drops the batch; never propagated to user code.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("http transport error: {0}")]
    Transport(#[from] judgeval_http::HttpError),
    #[error("export rejected with status {0}")]
    RejectedStatus(u16),
    #[error("failed to encode export payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
}

pub type ExportResult = Result<(), ExportError>;
