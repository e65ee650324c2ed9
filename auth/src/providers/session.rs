//! Session store trait.

use crate::error::Result;
use crate::state::SessionId;

/// Session store.
///
/// A session is a bag of string values keyed by name. The web layer maps a
/// cookie to a [`SessionId`]; the strategy reads and writes keys such as
/// [`SESSION_MAGIC_LINK_KEY`](crate::constants::SESSION_MAGIC_LINK_KEY).
pub trait SessionStore: Send + Sync + 'static {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns error if the backing store fails.
    fn get(
        &self,
        session_id: SessionId,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns error if the backing store fails.
    fn set(
        &self,
        session_id: SessionId,
        key: &str,
        value: String,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Remove a value, returning it if present.
    ///
    /// # Errors
    ///
    /// Returns error if the backing store fails.
    fn remove(
        &self,
        session_id: SessionId,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    /// Drop the whole session.
    ///
    /// # Errors
    ///
    /// Returns error if the backing store fails.
    fn destroy(
        &self,
        session_id: SessionId,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
