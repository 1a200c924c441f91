use thiserror::Error;

/// Errors that can occur when talking to the Glide tables API
#[derive(Debug, Error)]
pub enum GlideError {
    /// Configuration error (missing env vars, unknown column names, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Update or delete row without a `$rowID`
    #[error("Row {index} must have a $rowID")]
    MissingRowId { index: usize },

    /// Non-success HTTP status from the function API
    ///
    /// `status_text` is the standard reason phrase for `status`, not the
    /// phrase the server sent.
    #[error("HTTP error: {status} {status_text}")]
    Http { status: u16, status_text: String },

    /// Non-success HTTP status from the stash API, with the response text
    #[error("Failed to {context}. Response was '{body}' (status {status})")]
    Api {
        status: u16,
        context: String,
        body: String,
    },

    /// Network or protocol error from the HTTP client
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body was not the JSON we expected
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Well-formed JSON with an unexpected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Pagination exceeded the configured page cap
    #[error("Pagination stopped after {0} pages without a final page")]
    PageLimit(usize),

    /// Invalid table schema for the stash API
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}

/// Type alias for Results using GlideError
pub type Result<T> = std::result::Result<T, GlideError>;
