//! Error type for the command line front end.

use std::path::PathBuf;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Project(#[from] sl_project::ProjectError),

    #[error(transparent)]
    Node(#[from] sl_node::NodeError),

    #[error("Refusing to overwrite existing file: {path}")]
    Exists { path: PathBuf },

    #[error("Parameter update rejected: {0}")]
    Rejected(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
