//! Account-scoped persistence for bag items.

use std::future::Future;

use thiserror::Error;
use valiero_core::{BagItem, UserId};

use crate::db::RepositoryError;

/// Failure talking to the remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The database rejected or failed the operation.
    #[error("remote store error: {0}")]
    Repository(RepositoryError),

    /// The store could not be reached.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
}

impl From<RepositoryError> for RemoteError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Database(
                ref inner @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)),
            ) => Self::Unavailable(inner.to_string()),
            other => Self::Repository(other),
        }
    }
}

/// Per-account item storage.
///
/// Rows are addressed by `(account, natural key)`. Writes are last-write-wins;
/// callers that need ordering serialize them (see [`super::RemoteWriter`]).
pub trait RemoteStore<T: BagItem>: Send + Sync + 'static {
    /// Every row stored for the account.
    fn fetch_all(
        &self,
        account: UserId,
    ) -> impl Future<Output = Result<Vec<T>, RemoteError>> + Send;

    /// Insert the row, or overwrite the existing row with the same key.
    fn upsert(
        &self,
        account: UserId,
        item: T,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Delete exactly the row with this key.
    fn delete(
        &self,
        account: UserId,
        key: T::Key,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Delete every row for the account.
    fn delete_all(&self, account: UserId) -> impl Future<Output = Result<(), RemoteError>> + Send;
}
