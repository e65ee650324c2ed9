//! HTTP request handlers.

pub mod events;
pub mod health;
pub mod magic_link;

pub use events::{LimitedBody, ingest_event};
pub use health::health_check;
pub use magic_link::{login_status, magic_link_callback, send_magic_link};
