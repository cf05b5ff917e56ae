use thiserror::Error;

/// Unified result type for the interactive CLI crate.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors surfaced by the controller and its collaborators.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("event queue closed")]
    QueueClosed,
    #[error("inquirer error: {0}")]
    Inquirer(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
