use thiserror::Error;

#[derive(Debug, Error)]
pub enum GqlError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GraphQL error: {0}")]
    Remote(String),

    #[error("unexpected response shape at {path}: {reason}")]
    Shape { path: String, reason: &'static str },
}

impl GqlError {
    /// True when the request never produced a usable response.
    pub fn is_transport(&self) -> bool {
        matches!(self, GqlError::Http(_) | GqlError::Status { .. })
    }
}
