#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("invalid report json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
