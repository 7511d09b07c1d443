use anyhow::Context;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::{
    pooled_connection::{
        deadpool::{Object, Pool},
        AsyncDieselConnectionManager,
    },
    AsyncPgConnection, RunQueryDsl,
};
use uuid::Uuid;

use super::{IdentityStore, MessageStore, StoreError, StoreResult};
use crate::models::{Identity, IdentityRow, Message, MessageRow};
use crate::schema::{messages, users};

pub type DbPool = Pool<AsyncPgConnection>;

pub fn establish_connection_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool = Pool::builder(config)
        .max_size(10)
        .build()
        .context("Failed to create database pool")?;

    Ok(pool)
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => StoreError::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                StoreError::Duplicate
            }
            other => StoreError::Backend(other.into()),
        }
    }
}

/// Postgres-backed store for every record type.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> StoreResult<Object<AsyncPgConnection>> {
        self.pool
            .get()
            .await
            .context("Database connection unavailable")
            .map_err(StoreError::Backend)
    }
}

fn into_identity(row: IdentityRow) -> StoreResult<Identity> {
    Identity::try_from(row).map_err(StoreError::Backend)
}

fn into_message(row: MessageRow) -> StoreResult<Message> {
    Message::try_from(row).map_err(StoreError::Backend)
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let mut conn = self.conn().await?;

        let row = users::table
            .filter(users::email.eq(email))
            .select(IdentityRow::as_select())
            .first(&mut *conn)
            .await
            .optional()?;

        row.map(into_identity).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Identity>> {
        let mut conn = self.conn().await?;

        let row = users::table
            .find(id)
            .select(IdentityRow::as_select())
            .first(&mut *conn)
            .await
            .optional()?;

        row.map(into_identity).transpose()
    }

    async fn create(&self, identity: Identity) -> StoreResult<Identity> {
        let mut conn = self.conn().await?;

        let row = diesel::insert_into(users::table)
            .values(IdentityRow::from(&identity))
            .returning(IdentityRow::as_returning())
            .get_result(&mut *conn)
            .await?;

        into_identity(row)
    }

    async fn update(&self, identity: Identity) -> StoreResult<Identity> {
        let mut conn = self.conn().await?;

        let row = diesel::update(users::table.find(identity.id))
            .set(IdentityRow::from(&identity))
            .returning(IdentityRow::as_returning())
            .get_result(&mut *conn)
            .await?;

        into_identity(row)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut conn = self.conn().await?;

        let deleted = diesel::delete(users::table.find(id))
            .execute(&mut *conn)
            .await?;

        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<Identity>> {
        let mut conn = self.conn().await?;

        let rows = users::table
            .order_by(users::created_at.desc())
            .select(IdentityRow::as_select())
            .load(&mut *conn)
            .await?;

        rows.into_iter().map(into_identity).collect()
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn find_message(&self, id: Uuid) -> StoreResult<Option<Message>> {
        let mut conn = self.conn().await?;

        let row = messages::table
            .find(id)
            .select(MessageRow::as_select())
            .first(&mut *conn)
            .await
            .optional()?;

        row.map(into_message).transpose()
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Message>> {
        let mut conn = self.conn().await?;

        let rows = messages::table
            .filter(messages::owner_id.eq(owner_id))
            .order_by(messages::date.desc())
            .select(MessageRow::as_select())
            .load(&mut *conn)
            .await?;

        rows.into_iter().map(into_message).collect()
    }

    async fn create_message(&self, message: Message) -> StoreResult<Message> {
        let mut conn = self.conn().await?;

        let row = diesel::insert_into(messages::table)
            .values(MessageRow::from(&message))
            .returning(MessageRow::as_returning())
            .get_result(&mut *conn)
            .await?;

        into_message(row)
    }

    async fn update_message(&self, message: Message) -> StoreResult<Message> {
        let mut conn = self.conn().await?;

        let row = diesel::update(messages::table.find(message.id))
            .set(MessageRow::from(&message))
            .returning(MessageRow::as_returning())
            .get_result(&mut *conn)
            .await?;

        into_message(row)
    }

    async fn delete_message(&self, id: Uuid) -> StoreResult<()> {
        let mut conn = self.conn().await?;

        let deleted = diesel::delete(messages::table.find(id))
            .execute(&mut *conn)
            .await?;

        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
