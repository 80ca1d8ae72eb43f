// Common error types for rkjm

use std::path::PathBuf;

/// Crate-wide error type
#[derive(Debug, thiserror::Error)]
pub enum RkjmError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, RkjmError>;

/// Error formatted for the terminal, with the process exit code to use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserError {
    pub message: String,
    pub exit_code: i32,
}

impl UserError {
    /// Map a library error onto a user-facing message and exit code
    pub fn from_rkjm_error(err: &RkjmError) -> Self {
        let exit_code = match err {
            RkjmError::IoError(_) | RkjmError::FileNotFound(_) => 1,
            RkjmError::ConfigError(_) => 2,
            RkjmError::ValidationError(_) => 3,
            RkjmError::ExecutionError(_) => 4,
        };

        Self {
            message: err.to_string(),
            exit_code,
        }
    }

    /// Print the error to stderr
    pub fn print(&self) {
        eprintln!("Error: {}", self.message);
    }
}
