pub mod auth;
pub mod backup;
pub mod trash;

/// A panel operation failed and the user has already been told why
#[derive(Debug, thiserror::Error)]
#[error("operation failed")]
pub struct AlreadyReported;
