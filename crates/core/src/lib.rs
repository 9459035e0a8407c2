//! naix core library
//!
//! Foundational utilities shared by the naix crates:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, HostFormatting};
pub use error::{AppError, AppResult};
