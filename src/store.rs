use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::StoreError,
    types::{Password, Username},
};

/// Key-value storage for credentials, keyed by username.
///
/// Implementations are shared by every in-flight request and must be safe for
/// concurrent use without outside locking.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Retrieve the password stored for `username`, or `StoreError::NotFound`.
    async fn get(&self, username: &Username) -> Result<Password, StoreError>;

    /// Store `password` for `username` unless the username already exists.
    /// An existing entry is left untouched and the call still succeeds.
    async fn set_if_absent(&self, username: &Username, password: &Password)
        -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    storage: RwLock<HashMap<Username, Password>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, username: &Username) -> Result<Password, StoreError> {
        self.storage
            .read()
            .await
            .get(username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn set_if_absent(
        &self,
        username: &Username,
        password: &Password,
    ) -> Result<(), StoreError> {
        self.storage
            .write()
            .await
            .entry(username.clone())
            .or_insert_with(|| password.clone());

        Ok(())
    }
}
