/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a new, unverified user
/// - `POST /api/auth/login` - Login and get a session token
/// - `POST /api/auth/logout` - Revoke the session token
/// - `GET /api/auth/current` - Current user's profile
/// - `PATCH /api/auth/avatars` - Upload a new avatar (multipart `avatar`)
/// - `PATCH /api/auth/subscription` - Change subscription tier
/// - `GET /api/auth/verify/:verificationToken` - Confirm email address
/// - `POST /api/auth/verify` - Resend the verification email

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    pipeline::{dispatch, require_found, ValidatedBody},
    services::auth::{self, AvatarUpload},
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use contacts_shared::{
    auth::middleware::AuthContext,
    models::user::{Subscription, User},
    validation::schemas::{LoginUser, RegisterUser, ResendVerification, UpdateSubscription},
};
use serde::{Deserialize, Serialize};

/// Public part of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub email: String,
    pub subscription: Subscription,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            subscription: user.subscription(),
        }
    }
}

/// Account profile with avatar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub subscription: Subscription,
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            subscription: user.subscription(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

impl From<AuthContext> for UserProfile {
    fn from(auth: AuthContext) -> Self {
        Self {
            email: auth.email,
            subscription: auth.subscription,
            avatar_url: auth.avatar_url,
        }
    }
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: UserSummary,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,
    pub user: UserProfile,
}

/// Avatar update response
#[derive(Debug, Serialize, Deserialize)]
pub struct AvatarResponse {
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
}

/// Plain confirmation message
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Register endpoint
///
/// Creates an unverified account and sends a verification email.
///
/// # Errors
///
/// - 400: Body fails the schema (every broken rule is listed)
/// - 409: Email already in use
pub async fn register(
    State(state): State<AppState>,
    ValidatedBody(body): ValidatedBody<RegisterUser>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let user = dispatch(auth::register(&state, body)).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserSummary::from(&user),
        }),
    ))
}

/// Login endpoint
///
/// # Errors
///
/// - 400: Body fails the schema
/// - 401: Wrong credentials, or email not verified
pub async fn login(
    State(state): State<AppState>,
    ValidatedBody(body): ValidatedBody<LoginUser>,
) -> ApiResult<Json<LoginResponse>> {
    let session = dispatch(auth::login(&state, body)).await?;

    Ok(Json(LoginResponse {
        token: session.token,
        user: UserProfile::from(&session.user),
    }))
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    dispatch(auth::logout(&state, auth.user_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Current user endpoint
pub async fn current(Extension(auth): Extension<AuthContext>) -> Json<UserProfile> {
    Json(UserProfile::from(auth::current(&auth)))
}

/// Avatar upload endpoint
///
/// Expects a multipart form with an `avatar` file field.
///
/// # Errors
///
/// - 400: Missing field, unsupported extension or file too large
pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<AvatarResponse>> {
    let mut multipart = multipart.map_err(|rejection| {
        ApiError::bad_request()
            .with_message("Expected a multipart form with an 'avatar' file")
            .with_details(rejection.body_text())
    })?;

    let malformed = |e: axum::extract::multipart::MultipartError| {
        ApiError::bad_request()
            .with_message("Malformed multipart body")
            .with_details(e.body_text())
    };

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some("avatar") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request().with_message("'avatar' must be a file"))?;
        let bytes = field.bytes().await.map_err(malformed)?;

        upload = Some(AvatarUpload {
            file_name,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload =
        upload.ok_or_else(|| ApiError::bad_request().with_message("'avatar' file is required"))?;

    let avatar_url = dispatch(auth::update_avatar(&state, &auth, upload)).await?;

    Ok(Json(AvatarResponse { avatar_url }))
}

/// Subscription update endpoint
pub async fn update_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedBody(body): ValidatedBody<UpdateSubscription>,
) -> ApiResult<Json<UserSummary>> {
    let tier = body
        .tier()
        .map_err(|e| ApiError::bad_request().with_details(e))?;
    let user = dispatch(auth::update_subscription(&state, auth.user_id, tier)).await?;
    let user = require_found("User", auth.user_id, user)?;

    Ok(Json(UserSummary::from(&user)))
}

/// Email verification endpoint
///
/// # Errors
///
/// - 404: Unknown or already used token
pub async fn verify_email(
    State(state): State<AppState>,
    Path(verification_token): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    dispatch(auth::verify_email(&state, &verification_token)).await?;

    Ok(Json(MessageResponse {
        message: "Verification successful".to_string(),
    }))
}

/// Resend verification endpoint
///
/// # Errors
///
/// - 400: Already verified
/// - 404: Unknown email
pub async fn resend_verification(
    State(state): State<AppState>,
    ValidatedBody(body): ValidatedBody<ResendVerification>,
) -> ApiResult<Json<MessageResponse>> {
    dispatch(auth::resend_verification(&state, &body.email)).await?;

    Ok(Json(MessageResponse {
        message: "Verification email sent".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_uses_avatar_url_key() {
        let profile = UserProfile {
            email: "user@example.com".to_string(),
            subscription: Subscription::Pro,
            avatar_url: "/avatars/a.png".to_string(),
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["avatarURL"], "/avatars/a.png");
        assert_eq!(json["subscription"], "pro");
        assert!(json.get("password").is_none());
    }
}
