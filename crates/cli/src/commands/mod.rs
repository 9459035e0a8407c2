//! Command handlers for the naix CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod assemble;
pub mod blocks;
pub mod check;
pub mod policy;
pub mod template;

// Re-export command types for convenience
pub use assemble::AssembleCommand;
pub use blocks::BlocksCommand;
pub use check::CheckCommand;
pub use policy::PolicyCommand;
pub use template::TemplateCommand;
