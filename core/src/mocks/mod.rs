//! Mock collaborators for testing.
//!
//! In-memory implementations of the intake collaborator traits that record
//! how they were called.

pub mod authenticator;
pub mod ingestion;

pub use authenticator::MockApiKeyAuthenticator;
pub use ingestion::MockIngestionService;
