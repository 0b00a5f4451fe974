/// Bearer-token authentication guard
///
/// [`authenticate`] turns the raw `Authorization` header into an
/// [`AuthContext`] or an [`AuthError`] explaining which check failed. The
/// checks run in a fixed order:
///
/// 1. the header is present
/// 2. its scheme (text before the first space) is exactly `Bearer`
/// 3. the token's signature and expiry verify
/// 4. the subject id resolves to a stored user
/// 5. the user's stored session token equals the presented token
///
/// The guard is framework-agnostic; the API crate wraps it in an axum
/// layer that inserts the context into request extensions.
///
/// # Example
///
/// ```
/// use contacts_shared::auth::middleware::{authenticate, AuthError};
/// use contacts_shared::store::memory::MemoryStore;
///
/// # async fn example() {
/// let store = MemoryStore::new();
/// let result = authenticate(None, &store, "secret-key-at-least-32-bytes-long!").await;
/// assert!(matches!(result, Err(AuthError::MissingCredentials)));
/// # }
/// ```

use serde::Serialize;

use super::jwt::{validate_token, JwtError};
use crate::models::user::Subscription;
use crate::store::{StoreError, UserStore};

/// Authenticated caller attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    /// Authenticated user id; used as `owner` for contact operations
    pub user_id: i64,

    pub email: String,

    pub subscription: Subscription,

    pub avatar_url: String,

    /// The bearer token presented with this request
    #[serde(skip)]
    pub token: String,
}

/// Why a request could not be authenticated
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header
    #[error("Authorization token is missing. Please include a valid token in your request headers.")]
    MissingCredentials,

    /// Scheme other than `Bearer`
    #[error("Unsupported token type. Ensure the token type is 'Bearer' and that the 'Bearer' identifier precedes the token.")]
    UnsupportedScheme,

    /// Signature, format or expiry check failed
    #[error("Error while validating JWT token: {0}")]
    InvalidToken(#[from] JwtError),

    /// Token subject does not exist
    #[error("User with ID {0} specified in the JWT token was not found in the database.")]
    UnknownUser(i64),

    /// The user has logged out since the token was issued
    #[error("User with ID {0} is logged out. Please log in again.")]
    LoggedOut(i64),

    /// A newer login replaced this token
    #[error("The provided token is no longer valid for user with ID {0}. Please log in again.")]
    StaleToken(i64),

    /// User lookup failed
    #[error("Failed to load user: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// True for failures caused by the caller's credentials rather than the backend
    pub fn is_unauthorized(&self) -> bool {
        !matches!(self, AuthError::Store(_))
    }
}

/// Splits an `Authorization` header value into scheme and token
///
/// The scheme is everything before the first space; a header with no
/// space has an empty token.
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header.split_once(' ').unwrap_or((header, ""));

    if scheme != "Bearer" {
        return Err(AuthError::UnsupportedScheme);
    }

    Ok(token)
}

/// Authenticates a request from its `Authorization` header value
///
/// # Errors
///
/// See [`AuthError`]; every variant except `Store` is a credential failure.
pub async fn authenticate<U>(
    authorization: Option<&str>,
    users: &U,
    secret: &str,
) -> Result<AuthContext, AuthError>
where
    U: UserStore + ?Sized,
{
    let header = authorization.ok_or(AuthError::MissingCredentials)?;
    let token = bearer_token(header)?;

    let claims = validate_token(token, secret)?;

    let user = users
        .find_user(claims.sub)
        .await?
        .ok_or(AuthError::UnknownUser(claims.sub))?;

    match user.token.as_deref() {
        None => return Err(AuthError::LoggedOut(user.id)),
        Some(stored) if stored != token => return Err(AuthError::StaleToken(user.id)),
        Some(_) => {}
    }

    let subscription = user.subscription();
    Ok(AuthContext {
        user_id: user.id,
        email: user.email,
        subscription,
        avatar_url: user.avatar_url,
        token: token.to_string(),
    })
}
