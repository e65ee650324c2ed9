//! In-memory store implementations.
//!
//! Process-local and lost on restart. Suitable for development and for a
//! single-instance deployment.

pub mod session_memory;
pub mod user_memory;

pub use session_memory::InMemorySessionStore;
pub use user_memory::InMemoryUserRepository;
