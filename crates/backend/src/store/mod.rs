//! Record store abstractions for identities and messages.
//!
//! Handlers and the auth workflow only see these traits. `PgStore` backs them
//! with Postgres through diesel-async, `MemoryStore` keeps everything in
//! process for tests and local experiments.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Identity, Message};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{establish_connection_pool, DbPool, PgStore};

/// Outcome of a store call that did not succeed.
///
/// `NotFound` and `Duplicate` are expected outcomes callers branch on;
/// everything else is a backend failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("record violates a uniqueness constraint")]
    Duplicate,

    #[error("store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence of identities. Emails are stored lower-cased and are unique.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Identity>>;

    /// Fails with `Duplicate` when the email is already taken.
    async fn create(&self, identity: Identity) -> StoreResult<Identity>;

    /// Replaces the stored record with the same id.
    async fn update(&self, identity: Identity) -> StoreResult<Identity>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    /// All identities, newest first.
    async fn list(&self) -> StoreResult<Vec<Identity>>;
}

/// Persistence of chat messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn find_message(&self, id: Uuid) -> StoreResult<Option<Message>>;

    /// Messages of one owner, newest first.
    async fn list_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Message>>;

    async fn create_message(&self, message: Message) -> StoreResult<Message>;

    async fn update_message(&self, message: Message) -> StoreResult<Message>;

    async fn delete_message(&self, id: Uuid) -> StoreResult<()>;
}
