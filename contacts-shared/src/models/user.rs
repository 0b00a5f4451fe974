/// User model and database operations
///
/// This module provides the User model and the queries the auth flows need:
/// registration, lookup, session token issue/clear, avatar and subscription
/// updates, and single-use email verification.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     email VARCHAR(254) NOT NULL UNIQUE,
///     password VARCHAR(254) NOT NULL,
///     subscription VARCHAR(16) NOT NULL DEFAULT 'starter',
///     token TEXT,
///     avatar_url TEXT NOT NULL,
///     verify BOOLEAN NOT NULL DEFAULT FALSE,
///     verification_token TEXT UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use contacts_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         email: "user@example.com".to_string(),
///         password_hash: "$2b$10$...".to_string(),
///         avatar_url: "/avatars/avatar_default_abstract.png".to_string(),
///         verification_token: "0b6f...".to_string(),
///     },
/// )
/// .await?;
///
/// let found = User::find_by_email(&pool, "user@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;

/// Subscription tier of a user account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subscription {
    #[default]
    Starter,
    Pro,
    Business,
}

impl Subscription {
    /// All accepted values, in display order
    pub const VALUES: [&'static str; 3] = ["starter", "pro", "business"];

    /// Gets subscription as the stored string
    pub fn as_str(&self) -> &'static str {
        match self {
            Subscription::Starter => "starter",
            Subscription::Pro => "pro",
            Subscription::Business => "business",
        }
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subscription {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starter" => Ok(Subscription::Starter),
            "pro" => Ok(Subscription::Pro),
            "business" => Ok(Subscription::Business),
            other => Err(format!("unknown subscription '{}'", other)),
        }
    }
}

/// User model representing an account
///
/// `password` holds a bcrypt hash, never the plaintext. `token` is the most
/// recently issued session token and is `None` while logged out.
/// `verification_token` is `Some` exactly while `verify` is false.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Surrogate key
    pub id: i64,

    /// Unique email address
    pub email: String,

    /// bcrypt password hash
    pub password: String,

    /// Subscription tier as stored (`starter`, `pro`, `business`)
    pub subscription: String,

    /// Current session token, if logged in
    pub token: Option<String>,

    /// Relative path (`/avatars/...`) or remote URL of the profile image
    pub avatar_url: String,

    /// Whether the email address has been confirmed
    pub verify: bool,

    /// Single-use email confirmation token
    pub verification_token: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Parses the stored subscription, falling back to the default tier
    pub fn subscription(&self) -> Subscription {
        self.subscription.parse().unwrap_or_default()
    }
}

/// Input for creating a new user
///
/// New users always start unverified with the default subscription.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// bcrypt password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Resolved avatar URL
    pub avatar_url: String,

    /// Email verification token to embed in the confirmation link
    pub verification_token: String,
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email already exists (unique constraint violation)
    /// - A column check fails (e.g. email shorter than 6 characters)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password, avatar_url, verification_token)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password, subscription, token, avatar_url,
                      verify, verification_token, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.avatar_url)
        .bind(data.verification_token)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use contacts_shared::models::user::User;
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// if let Some(user) = User::find_by_id(&pool, 42).await? {
    ///     println!("Found user: {}", user.email);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password, subscription, token, avatar_url,
                   verify, verification_token, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (exact match)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password, subscription, token, avatar_url,
                   verify, verification_token, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user holding the given (unconsumed) verification token
    pub async fn find_by_verification_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password, subscription, token, avatar_url,
                   verify, verification_token, created_at, updated_at
            FROM users
            WHERE verification_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Stores or clears the session token
    ///
    /// Pass `None` on logout.
    ///
    /// # Returns
    ///
    /// True if the user was found and updated, false otherwise
    pub async fn set_token(
        pool: &PgPool,
        id: i64,
        token: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET token = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the avatar URL
    pub async fn set_avatar_url(
        pool: &PgPool,
        id: i64,
        avatar_url: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET avatar_url = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(avatar_url)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Changes the subscription tier
    ///
    /// # Returns
    ///
    /// The updated user if found, None if user doesn't exist
    pub async fn set_subscription(
        pool: &PgPool,
        id: i64,
        subscription: Subscription,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET subscription = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password, subscription, token, avatar_url,
                      verify, verification_token, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(subscription.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Consumes a verification token
    ///
    /// Sets `verify = TRUE` and clears the token in a single statement, so a
    /// token can be consumed at most once.
    ///
    /// # Returns
    ///
    /// The verified user, or None if no user holds this token
    pub async fn verify_email(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET verify = TRUE, verification_token = NULL, updated_at = NOW()
            WHERE verification_token = $1
            RETURNING id, email, password, subscription, token, avatar_url,
                      verify, verification_token, created_at, updated_at
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_round_trip_strings() {
        for value in Subscription::VALUES {
            let parsed: Subscription = value.parse().unwrap();
            assert_eq!(parsed.as_str(), value);
        }
        assert!("gold".parse::<Subscription>().is_err());
    }

    #[test]
    fn test_subscription_default_is_starter() {
        assert_eq!(Subscription::default(), Subscription::Starter);
    }

    #[test]
    fn test_unknown_stored_subscription_falls_back() {
        let user = User {
            id: 1,
            email: "test@example.com".to_string(),
            password: "hash".to_string(),
            subscription: "legacy".to_string(),
            token: None,
            avatar_url: "/avatars/a.png".to_string(),
            verify: false,
            verification_token: Some("t".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(user.subscription(), Subscription::Starter);
    }
}
