/// JWT session token issuance and verification
///
/// Tokens are HS256-signed and carry the user id as subject plus issue and
/// expiry timestamps. Verification checks signature and expiry with no
/// leeway; an expired token's error reports when it expired.
///
/// # Example
///
/// ```
/// use contacts_shared::auth::jwt::{create_token, validate_token, Claims};
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new(42, Duration::hours(23));
/// let token = create_token(&claims, "your-secret-key-at-least-32-bytes")?;
///
/// let validated = validate_token(&token, "your-secret-key-at-least-32-bytes")?;
/// assert_eq!(validated.sub, 42);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Default session lifetime
pub const DEFAULT_EXPIRATION_HOURS: i64 = 23;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token signature was fine but it is past its expiry
    #[error("{}", expired_message(.expired_at))]
    Expired {
        /// When the token expired, if the payload could be read
        expired_at: Option<DateTime<Utc>>,
    },

    /// Malformed token, bad signature or missing claims
    #[error("{0}")]
    ValidationError(String),
}

fn expired_message(expired_at: &Option<DateTime<Utc>>) -> String {
    match expired_at {
        Some(at) => format!("jwt expired, expired at: {}", at.to_rfc3339()),
        None => "jwt expired".to_string(),
    }
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user id
    pub sub: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims for `user_id` valid for `expires_in` from now
    pub fn new(user_id: i64, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Signs claims into a token string
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature and expiry and returns the claims
///
/// # Errors
///
/// - `JwtError::Expired` when the token is past `exp`
/// - `JwtError::ValidationError` for every other failure
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
            // Signature already checked; read the payload once more for its expiry
            validation.validate_exp = false;
            let expired_at = decode::<Claims>(token, &key, &validation)
                .ok()
                .and_then(|data| data.claims.expires_at());
            Err(JwtError::Expired { expired_at })
        }
        Err(e) => Err(JwtError::ValidationError(e.to_string())),
    }
}
