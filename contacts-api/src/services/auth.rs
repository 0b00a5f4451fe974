/// Account services: registration, sessions, profile and email verification

use chrono::Duration;
use contacts_shared::auth::jwt::{create_token, Claims};
use contacts_shared::auth::middleware::AuthContext;
use contacts_shared::auth::password::{hash_password_blocking, verify_password_blocking};
use contacts_shared::auth::verification::{generate_verification_token, verification_link};
use contacts_shared::avatar::resolve_avatar_url;
use contacts_shared::mail::verification_email;
use contacts_shared::models::user::{CreateUser, Subscription, User};
use contacts_shared::validation::schemas::{LoginUser, RegisterUser};

use super::ServiceResult;
use crate::app::AppState;
use crate::error::ApiError;

/// Successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// An uploaded avatar image
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

fn wrong_credentials() -> ApiError {
    ApiError::unauthorized()
        .with_message("Email or password is wrong")
        .with_details("The provided credentials do not match any existing user records")
}

/// Creates an unverified account and mails its verification link
///
/// A failed verification mail does not fail registration; the user can
/// ask for it again through [`resend_verification`].
pub async fn register(state: &AppState, data: RegisterUser) -> ServiceResult<User> {
    let avatar_url = resolve_avatar_url(
        state.prober.as_ref(),
        &data.email,
        state.config.avatar.fallback_url.as_deref(),
    )
    .await;

    let password_hash = hash_password_blocking(data.password).await?;
    let verification_token = generate_verification_token();

    let user = state
        .store
        .create_user(CreateUser {
            email: data.email,
            password_hash,
            avatar_url,
            verification_token: verification_token.clone(),
        })
        .await?;

    tracing::info!(user_id = user.id, "User registered");

    let link = verification_link(&state.config.api.base_url, &verification_token);
    if let Err(e) = state.mailer.send(verification_email(&user.email, &link)).await {
        tracing::warn!(user_id = user.id, error = %e, "Failed to send verification email");
    }

    Ok(user)
}

/// Checks credentials and issues a session token
///
/// Unknown email and wrong password fail identically. Unverified accounts
/// are rejected before the password is compared.
pub async fn login(state: &AppState, data: LoginUser) -> ServiceResult<Session> {
    let user = state
        .store
        .find_user_by_email(&data.email)
        .await?
        .ok_or_else(wrong_credentials)?;

    if !user.verify {
        return Err(ApiError::unauthorized()
            .with_message("Email not verified")
            .with_details("Please confirm your email address using the link sent to it")
            .into());
    }

    if !verify_password_blocking(data.password, user.password.clone()).await? {
        return Err(wrong_credentials().into());
    }

    let claims = Claims::new(user.id, Duration::seconds(state.config.jwt.expires_in_secs));
    let token = create_token(&claims, &state.config.jwt.secret)?;

    state.store.set_user_token(user.id, Some(&token)).await?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Session { token, user })
}

/// Clears the stored session token
pub async fn logout(state: &AppState, user_id: i64) -> ServiceResult<()> {
    state.store.set_user_token(user_id, None).await?;

    tracing::info!(user_id, "User logged out");

    Ok(())
}

/// The caller's profile, as loaded by the auth guard
pub fn current(auth: &AuthContext) -> AuthContext {
    auth.clone()
}

/// Stores an uploaded avatar and replaces the user's current one
///
/// # Returns
///
/// The new avatar URL
pub async fn update_avatar(
    state: &AppState,
    auth: &AuthContext,
    upload: AvatarUpload,
) -> ServiceResult<String> {
    let avatar_url = state
        .avatars
        .store_upload(auth.user_id, &upload.file_name, &upload.bytes)
        .await?;

    match state.store.set_user_avatar(auth.user_id, &avatar_url).await {
        Ok(true) => {}
        Ok(false) => {
            state.avatars.remove_previous(&avatar_url).await;
            return Err(ApiError::not_found()
                .with_message("User not found")
                .with_details(format!("User with id '{}' not found", auth.user_id))
                .into());
        }
        Err(e) => {
            state.avatars.remove_previous(&avatar_url).await;
            return Err(e.into());
        }
    }

    tracing::info!(user_id = auth.user_id, avatar_url = %avatar_url, "Avatar updated");

    state.avatars.remove_previous(&auth.avatar_url).await;

    Ok(avatar_url)
}

/// Consumes a verification token
///
/// # Errors
///
/// 404 when no user holds the token, including one already consumed
pub async fn verify_email(state: &AppState, token: &str) -> ServiceResult<User> {
    let user = state.store.verify_user_email(token).await?.ok_or_else(|| {
        ApiError::not_found()
            .with_message("User not found")
            .with_details("The verification token is invalid or has already been used")
    })?;

    tracing::info!(user_id = user.id, "Email verified");

    Ok(user)
}

/// Sends the verification link again
///
/// # Errors
///
/// 404 for an unknown email, 400 when already verified, 500 when the mail
/// cannot be sent
pub async fn resend_verification(state: &AppState, email: &str) -> ServiceResult<()> {
    let user = state
        .store
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| ApiError::not_found().with_message("User not found"))?;

    let token = match (&user.verification_token, user.verify) {
        (_, true) => {
            return Err(ApiError::bad_request()
                .with_message("Verification has already been passed")
                .into())
        }
        (Some(token), false) => token,
        (None, false) => {
            return Err(anyhow::anyhow!("unverified user {} has no verification token", user.id).into())
        }
    };

    let link = verification_link(&state.config.api.base_url, token);
    state.mailer.send(verification_email(&user.email, &link)).await?;

    tracing::info!(user_id = user.id, "Verification email resent");

    Ok(())
}

/// Changes the caller's subscription tier
pub async fn update_subscription(
    state: &AppState,
    user_id: i64,
    subscription: Subscription,
) -> ServiceResult<Option<User>> {
    let user = state.store.set_user_subscription(user_id, subscription).await?;

    tracing::info!(user_id, subscription = %subscription, "Subscription updated");

    Ok(user)
}
