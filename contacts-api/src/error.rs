/// Error handling for the API server
///
/// [`ApiError`] is the tagged HTTP error every stage of the request
/// pipeline fails with. It carries a short `message` that is always sent and
/// optional diagnostic `details` that are only sent when debug output is
/// enabled.
///
/// Rendering happens in two steps: `IntoResponse` writes `{message}` and
/// stashes the full [`ErrorResponse`] in the response extensions, then the
/// global [`render_errors`] layer swaps in `{message, details}` when
/// `DEBUG` is on. Internal errors are logged with their details either way.
///
/// # Example
///
/// ```
/// use contacts_api::error::{ApiError, ApiResult};
///
/// fn find(id: i64) -> ApiResult<()> {
///     Err(ApiError::not_found().with_details(format!("Contact with id '{}' not found", id)))
/// }
/// ```

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use contacts_shared::auth::middleware::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Message and optional diagnostics of an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub message: String,

    /// Diagnostics, only rendered in debug mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }
}

/// Unified API error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Bad request (400) - malformed input or a no-op mutation
    BadRequest(ErrorResponse),

    /// Unauthorized (401) - missing, invalid or revoked credentials
    Unauthorized(ErrorResponse),

    /// Not found (404)
    NotFound(ErrorResponse),

    /// Conflict (409) - unique constraint violation
    Conflict(ErrorResponse),

    /// Internal server error (500)
    InternalError(ErrorResponse),
}

impl ApiError {
    pub fn bad_request() -> Self {
        ApiError::BadRequest(ErrorResponse::new("Bad Request"))
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized(ErrorResponse::new("Unauthorized"))
    }

    pub fn not_found() -> Self {
        ApiError::NotFound(ErrorResponse::new("Not Found"))
    }

    pub fn conflict() -> Self {
        ApiError::Conflict(ErrorResponse::new("Conflict"))
    }

    pub fn internal() -> Self {
        ApiError::InternalError(ErrorResponse::new("Internal Server Error"))
    }

    /// Replaces the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.body_mut().message = message.into();
        self
    }

    /// Attaches diagnostic details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.body_mut().details = Some(details.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        &self.body().message
    }

    pub fn details(&self) -> Option<&str> {
        self.body().details.as_deref()
    }

    fn body(&self) -> &ErrorResponse {
        match self {
            ApiError::BadRequest(body)
            | ApiError::Unauthorized(body)
            | ApiError::NotFound(body)
            | ApiError::Conflict(body)
            | ApiError::InternalError(body) => body,
        }
    }

    fn body_mut(&mut self) -> &mut ErrorResponse {
        match self {
            ApiError::BadRequest(body)
            | ApiError::Unauthorized(body)
            | ApiError::NotFound(body)
            | ApiError::Conflict(body)
            | ApiError::InternalError(body) => body,
        }
    }

    fn into_body(self) -> ErrorResponse {
        match self {
            ApiError::BadRequest(body)
            | ApiError::Unauthorized(body)
            | ApiError::NotFound(body)
            | ApiError::Conflict(body)
            | ApiError::InternalError(body) => body,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status().as_u16(), self.message())?;
        if let Some(details) = self.details() {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(details = ?self.details(), "Internal error: {}", self.message());
        }

        let body = self.into_body();
        let mut response = (status, Json(ErrorResponse::new(body.message.clone()))).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Global error formatter
///
/// Re-renders error bodies with their `details` when `debug` is on. Mount
/// it as the outermost layer with `from_fn_with_state(debug, render_errors)`.
pub async fn render_errors(State(debug): State<bool>, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let Some(body) = response.extensions_mut().remove::<ErrorResponse>() else {
        return response;
    };

    if debug && body.details.is_some() {
        return (response.status(), Json(body)).into_response();
    }

    response
}

/// Convert guard failures to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_unauthorized() {
            ApiError::unauthorized()
                .with_message("Not authorized")
                .with_details(err.to_string())
        } else {
            ApiError::internal().with_details(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::bad_request().with_message("Invalid input");
        assert_eq!(err.to_string(), "400: Invalid input");

        let err = ApiError::not_found().with_details("Contact with id '3' not found");
        assert_eq!(err.to_string(), "404: Not Found (Contact with id '3' not found)");
    }

    #[test]
    fn test_default_messages() {
        assert_eq!(ApiError::bad_request().message(), "Bad Request");
        assert_eq!(ApiError::unauthorized().message(), "Unauthorized");
        assert_eq!(ApiError::conflict().status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::internal().message(), "Internal Server Error");
    }

    #[test]
    fn test_response_hides_details_but_keeps_them_for_the_formatter() {
        let response = ApiError::not_found().with_details("secret").into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let stashed = response.extensions().get::<ErrorResponse>().unwrap();
        assert_eq!(stashed.details.as_deref(), Some("secret"));
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        let err = ApiError::from(AuthError::MissingCredentials);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "Not authorized");
        assert!(err.details().unwrap().contains("missing"));
    }
}
