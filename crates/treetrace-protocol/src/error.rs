use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("record_end without matching record_start at message {0}")]
    StrayEnd(usize),

    #[error("stream ended with {0} unclosed bracket(s)")]
    Unterminated(usize),
}
