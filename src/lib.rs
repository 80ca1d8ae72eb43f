// rkjm - robotkernel jitter measurement module
// Core library functionality

pub mod cli;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use models::*;
pub use services::*;
