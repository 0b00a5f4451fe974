/// PostgreSQL-backed store
///
/// Thin adapter from the store traits onto the model queries in
/// [`crate::models`]; its only job besides delegation is turning
/// `sqlx::Error` into [`StoreError`].

use async_trait::async_trait;
use sqlx::PgPool;

use super::{ContactStore, Store, StoreError, StoreResult, UserStore};
use crate::db::pool::health_check;
use crate::models::contact::{Contact, ContactFilter, ContactPatch, CreateContact};
use crate::models::user::{CreateUser, Subscription, User};

/// Store over a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_verification_token(&self, token: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_verification_token(&self.pool, token).await?)
    }

    async fn set_user_token(&self, id: i64, token: Option<&str>) -> StoreResult<bool> {
        Ok(User::set_token(&self.pool, id, token).await?)
    }

    async fn set_user_avatar(&self, id: i64, avatar_url: &str) -> StoreResult<bool> {
        Ok(User::set_avatar_url(&self.pool, id, avatar_url).await?)
    }

    async fn set_user_subscription(
        &self,
        id: i64,
        subscription: Subscription,
    ) -> StoreResult<Option<User>> {
        Ok(User::set_subscription(&self.pool, id, subscription).await?)
    }

    async fn verify_user_email(&self, token: &str) -> StoreResult<Option<User>> {
        Ok(User::verify_email(&self.pool, token).await?)
    }
}

#[async_trait]
impl ContactStore for PgStore {
    async fn list_contacts(&self, filter: ContactFilter) -> StoreResult<Vec<Contact>> {
        Ok(Contact::list(&self.pool, filter).await?)
    }

    async fn find_contact(&self, owner: i64, id: i64) -> StoreResult<Option<Contact>> {
        Ok(Contact::find(&self.pool, owner, id).await?)
    }

    async fn create_contact(&self, data: CreateContact) -> StoreResult<Contact> {
        Ok(Contact::create(&self.pool, data).await?)
    }

    async fn update_contact(&self, owner: i64, id: i64, patch: ContactPatch) -> StoreResult<u64> {
        Ok(Contact::update(&self.pool, owner, id, patch).await?)
    }

    async fn delete_contact(&self, owner: i64, id: i64) -> StoreResult<u64> {
        Ok(Contact::delete(&self.pool, owner, id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await.map_err(StoreError::from)
    }
}
