//! Redis-backed credential storage.
//!
//! Each username is a plain Redis key holding the password as its value.
//! Lookups use `GET` and registration uses `SETNX`, so per-key atomicity is
//! provided by Redis itself.
//!
//! The connection manager is created on first use and then cloned for each
//! request. If creating it fails, that request fails and the next one tries
//! again. Once created, it reconnects on its own after the connection drops;
//! the command that saw the drop fails and later commands use the new
//! connection.

use async_trait::async_trait;
use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    AsyncCommands, Client, FromRedisValue, RedisError, Value,
};
use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};

use crate::{
    error::StoreError,
    store::CredentialStore,
    types::{Password, Username},
};

pub struct RedisCredentialStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
}

impl RedisCredentialStore {
    /// Create a store for the given `redis://` URL without connecting yet.
    ///
    /// Only the URL is validated here.
    pub fn new(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url).map_err(backend)?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let connection = self
            .connection
            .get_or_try_init(|| async {
                debug!(target: "auth.redis", "Opening Redis connection");
                // keep reconnect attempts short so an outage fails requests promptly
                let config = ConnectionManagerConfig::new().set_number_of_retries(1);
                self.client.get_connection_manager_with_config(config).await
            })
            .await
            .map_err(|e| {
                // the URL may carry credentials, so it is never logged
                warn!(target: "auth.redis", error = %e, "Failed to connect to Redis");
                backend(e)
            })?;

        Ok(connection.clone())
    }
}

#[async_trait]
impl CredentialStore for RedisCredentialStore {
    #[instrument(skip_all, fields(username = %username.0))]
    async fn get(&self, username: &Username) -> Result<Password, StoreError> {
        let mut conn = self.connection().await?;

        let reply: Value = conn.get(&username.0).await.map_err(|e| {
            warn!(target: "auth.redis", error = %e, "Failed to get credential");
            backend(e)
        })?;

        password_from_reply(&reply)
    }

    #[instrument(skip_all, fields(username = %username.0))]
    async fn set_if_absent(
        &self,
        username: &Username,
        password: &Password,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;

        let reply: Value = conn
            .set_nx(&username.0, &password.0)
            .await
            .map_err(|e| {
                warn!(target: "auth.redis", error = %e, "Failed to store credential");
                backend(e)
            })?;

        set_if_absent_from_reply(&reply)
    }
}

/// `GET` reply: nil means the username was never registered.
fn password_from_reply(reply: &Value) -> Result<Password, StoreError> {
    let value = Option::<String>::from_redis_value(reply).map_err(backend)?;

    value.map(Password).ok_or(StoreError::NotFound)
}

/// `SETNX` reply: 1 when the key was written, 0 when it already existed.
/// Both count as success.
fn set_if_absent_from_reply(reply: &Value) -> Result<(), StoreError> {
    let created = bool::from_redis_value(reply).map_err(backend)?;

    if !created {
        debug!(target: "auth.redis", "Username already registered, leaving it unchanged");
    }

    Ok(())
}

fn backend(err: RedisError) -> StoreError {
    StoreError::Backend {
        source: Box::new(err),
    }
}
