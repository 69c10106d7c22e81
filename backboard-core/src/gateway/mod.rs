//! Backboard backend gateway
//!
//! Forwards prompts to the backend and turns its replies into
//! [`ChatMessage`](crate::types::ChatMessage)s. Reply shapes are decoded at
//! this boundary; callers only ever see normalized messages with classified
//! sources.
//!
//! ## Usage
//!
//! Point the client at a backend in `~/.config/backboard/config.toml`:
//!
//! ```toml
//! [backend]
//! api_url = "http://localhost:8000"
//! client_id = "default_user"
//! timeout_secs = 30
//! ```

mod client;
mod prompt;
mod reply;

pub use client::BackboardClient;
pub use prompt::build_prompt;
pub use reply::EMPTY_REPLY_FALLBACK;
