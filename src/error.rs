use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid request JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image decode failed: {0}")]
    Image(String),

    #[error("PDF error: {0}")]
    Pdf(String),
}
