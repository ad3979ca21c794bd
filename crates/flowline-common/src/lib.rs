//! Flowline Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the Flowline workspace.
//!
//! # Overview
//!
//! - **Error Handling**: the `FlowlineError` taxonomy and `Result` alias
//! - **Logging**: tracing subscriber setup shared by every handler
//! - **Types**: the payload contracts exchanged with the workflow engine

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{FlowlineError, Result};
