//! # backboard-core
//!
//! Core library for backboard - a client for the Backboard team-knowledge assistant.
//!
//! This library provides:
//! - Domain types for chat messages, sources, and file context
//! - Source attribution (Telegram, git, Google Drive, unknown)
//! - The HTTP gateway to the Backboard backend
//! - Tool directives and safe workspace file writes
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use backboard_core::{BackboardClient, Config};
//!
//! # async fn run() -> backboard_core::Result<()> {
//! let config = Config::load()?;
//! let client = BackboardClient::from_config(&config)?;
//!
//! let reply = client.query("Why did we move sessions to Redis?", None).await;
//! for source in reply.sources.unwrap_or_default() {
//!     println!("{}: {}", source.source_type, source.source_label);
//! }
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use classify::{classify, SourceClassifier};
pub use config::Config;
pub use error::{Error, Result};
pub use gateway::BackboardClient;
pub use types::*;

// Public modules
pub mod classify;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod tools;
pub mod types;
pub mod workspace;
