//! HTTP request handlers for API endpoints.

pub mod docs;
pub mod health;
pub mod task;

pub use docs::handle_docs;
pub use health::handle_health;
pub use task::{handle_summary, handle_text2sql};
