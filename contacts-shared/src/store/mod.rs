/// Persistence seam for users and contacts
///
/// Services talk to storage only through the [`UserStore`] and
/// [`ContactStore`] traits. Two implementations are provided:
///
/// - [`postgres::PgStore`]: the production store over a `sqlx` pool
/// - [`memory::MemoryStore`]: a process-local store with the same
///   constraints, used by tests and local experiments
///
/// Both report constraint failures as [`StoreError::UniqueViolation`] or
/// [`StoreError::Validation`] so callers can classify them without knowing
/// which backend produced them.
///
/// # Example
///
/// ```
/// use contacts_shared::store::{memory::MemoryStore, ContactStore, UserStore};
/// use contacts_shared::models::user::CreateUser;
///
/// # async fn example() -> Result<(), contacts_shared::store::StoreError> {
/// let store = MemoryStore::new();
/// let user = store
///     .create_user(CreateUser {
///         email: "user@example.com".to_string(),
///         password_hash: "$2b$10$...".to_string(),
///         avatar_url: "/avatars/avatar_default_abstract.png".to_string(),
///         verification_token: "token".to_string(),
///     })
///     .await?;
/// assert!(store.find_user(user.id).await?.is_some());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::contact::{Contact, ContactFilter, ContactPatch, CreateContact};
use crate::models::user::{CreateUser, Subscription, User};

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("{field} already in use")]
    UniqueViolation {
        /// Column that holds the duplicate value
        field: String,
    },

    /// A column check, length, nullability or reference constraint rejected the write
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23505") => {
                    let field = db_err
                        .constraint()
                        .map(constraint_field)
                        .unwrap_or_else(|| "value".to_string());
                    return StoreError::UniqueViolation { field };
                }
                // check, not-null, foreign key, value too long
                Some("23514") | Some("23502") | Some("23503") | Some("22001") => {
                    return StoreError::Validation(db_err.message().to_string());
                }
                _ => {}
            }
        }

        StoreError::Database(err)
    }
}

/// Extracts the column name from a PostgreSQL unique constraint name
///
/// `users_email_key` becomes `email`, `users_verification_token_key`
/// becomes `verification_token`.
pub fn constraint_field(constraint: &str) -> String {
    let trimmed = constraint.strip_suffix("_key").unwrap_or(constraint);
    match trimmed.split_once('_') {
        Some((_table, column)) if !column.is_empty() => column.to_string(),
        _ => trimmed.to_string(),
    }
}

/// User persistence operations
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new, unverified user
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    /// Looks a user up by id
    async fn find_user(&self, id: i64) -> StoreResult<Option<User>>;

    /// Looks a user up by exact email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Looks a user up by unconsumed verification token
    async fn find_user_by_verification_token(&self, token: &str) -> StoreResult<Option<User>>;

    /// Stores (`Some`) or clears (`None`) the session token
    async fn set_user_token(&self, id: i64, token: Option<&str>) -> StoreResult<bool>;

    /// Replaces the avatar URL
    async fn set_user_avatar(&self, id: i64, avatar_url: &str) -> StoreResult<bool>;

    /// Changes the subscription tier
    async fn set_user_subscription(
        &self,
        id: i64,
        subscription: Subscription,
    ) -> StoreResult<Option<User>>;

    /// Atomically marks the holder of `token` verified and clears the token
    async fn verify_user_email(&self, token: &str) -> StoreResult<Option<User>>;
}

/// Contact persistence operations, always scoped by owner
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Lists contacts matching the filter in ascending id order
    async fn list_contacts(&self, filter: ContactFilter) -> StoreResult<Vec<Contact>>;

    /// Finds an owner's contact
    async fn find_contact(&self, owner: i64, id: i64) -> StoreResult<Option<Contact>>;

    /// Inserts a contact
    async fn create_contact(&self, data: CreateContact) -> StoreResult<Contact>;

    /// Applies a partial update; returns affected rows
    async fn update_contact(&self, owner: i64, id: i64, patch: ContactPatch) -> StoreResult<u64>;

    /// Deletes an owner's contact; returns affected rows
    async fn delete_contact(&self, owner: i64, id: i64) -> StoreResult<u64>;
}

/// Complete store used by the application
#[async_trait]
pub trait Store: UserStore + ContactStore {
    /// Cheap connectivity check for health reporting
    async fn ping(&self) -> StoreResult<()>;
}
