//! Storage port: Trait for the local key-value store.
//!
//! Values are opaque strings (JSON documents in practice). The backend is
//! best-effort from the caller's point of view: failures are reported but the
//! calculator keeps working without persistence.

/// Trait for local key-value storage.
///
/// All data is stored locally and never transmitted.
pub trait Storage: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the value stored under `key`.
    ///
    /// # Returns
    /// `None` if nothing is stored.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Remove the value stored under `key`. Missing keys are not an error.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn remove_item(&self, key: &str) -> Result<(), Self::Error>;
}
