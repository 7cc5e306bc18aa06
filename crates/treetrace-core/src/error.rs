use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Hierarchy violation: {0}")]
    Hierarchy(String),

    #[error("Node not found: {0}")]
    NotFound(String),

    #[error("Attribute '{0}' is already in use by another element")]
    AttrInUse(String),

    #[error("Invalid token: {0:?}")]
    InvalidToken(String),

    #[error("Backing element has been dropped")]
    Detached,
}
