/// Domain services
///
/// Services hold the business rules and talk to storage, mail and the
/// avatar helpers through `AppState`. They return [`ServiceError`], which
/// the dispatch stage classifies into an HTTP error.

pub mod auth;
pub mod contacts;

use contacts_shared::auth::jwt::JwtError;
use contacts_shared::auth::password::PasswordError;
use contacts_shared::avatar::AvatarError;
use contacts_shared::mail::MailError;
use contacts_shared::store::StoreError;

use crate::error::ApiError;

/// Service result type alias
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of a service call
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Storage rejected or failed the operation
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Already classified failure
    #[error(transparent)]
    Http(#[from] ApiError),

    /// Anything else
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Other(anyhow::Error::new(err).context("Password operation failed"))
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        ServiceError::Other(anyhow::Error::new(err).context("Failed to issue session token"))
    }
}

impl From<MailError> for ServiceError {
    fn from(err: MailError) -> Self {
        ServiceError::Other(anyhow::Error::new(err))
    }
}

impl From<AvatarError> for ServiceError {
    fn from(err: AvatarError) -> Self {
        match err {
            AvatarError::TooLarge | AvatarError::UnsupportedExtension => {
                ServiceError::Http(ApiError::bad_request().with_message(format!("'avatar' {}", err)))
            }
            other => ServiceError::Other(anyhow::Error::new(other)),
        }
    }
}
