/// Request pipeline stages shared by all routes
///
/// A request runs through these stages in order, each one able to
/// short-circuit with an [`ApiError`]:
///
/// 1. the auth layer (see `app.rs`) attaches an `AuthContext`
/// 2. [`ValidatedBody`], [`IdParam`] and [`PageQuery`] extract typed input
/// 3. [`dispatch`] runs a service and classifies its failure
/// 4. [`require_found`] turns a missing result into a 404
/// 5. the controller shapes the response body

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use contacts_shared::store::StoreError;
use contacts_shared::validation::{parse, Schema};
use serde::Deserialize;
use std::fmt::Display;
use std::future::Future;

use crate::error::{ApiError, ApiResult};
use crate::services::ServiceError;

/// Default page size for listings
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest accepted page size
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Runs a service call and maps its failure into an [`ApiError`]
pub async fn dispatch<T, F>(operation: F) -> ApiResult<T>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    operation.await.map_err(ApiError::from)
}

/// Failure classification, checked in order:
///
/// 1. unique violations become 409 `<Field> in use`
/// 2. store validation failures become 400
/// 3. already classified errors pass through
/// 4. everything else is a 500 carrying the underlying message
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(StoreError::UniqueViolation { field }) => ApiError::conflict()
                .with_message(format!("{} in use", capitalize(&field)))
                .with_details(format!("A record with this {} already exists", field)),
            ServiceError::Store(StoreError::Validation(message)) => {
                ApiError::bad_request().with_details(message)
            }
            ServiceError::Http(err) => err,
            ServiceError::Store(err @ StoreError::Database(_)) => {
                ApiError::internal().with_details(err.to_string())
            }
            ServiceError::Other(err) => ApiError::internal().with_details(format!("{:#}", err)),
        }
    }
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Fails with 404 when a service found nothing
pub fn require_found<T>(entity: &str, id: impl Display, value: Option<T>) -> ApiResult<T> {
    value.ok_or_else(|| {
        ApiError::not_found()
            .with_message("Not found")
            .with_details(format!("{} with id '{}' not found", entity, id))
    })
}

/// JSON body checked against its [`Schema`]
///
/// An empty body is treated as `{}` so partial updates report the missing
/// fields rather than a parse error.
#[derive(Debug, Clone)]
pub struct ValidatedBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedBody<T>
where
    T: Schema + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            ApiError::bad_request()
                .with_message("Failed to read request body")
                .with_details(rejection.body_text())
        })?;

        let value = if bytes.iter().all(u8::is_ascii_whitespace) {
            serde_json::Value::Object(Default::default())
        } else {
            serde_json::from_slice(&bytes).map_err(|e| {
                ApiError::bad_request()
                    .with_message("Body must be valid JSON")
                    .with_details(e.to_string())
            })?
        };

        let body = parse::<T>(value)
            .map_err(|e| ApiError::bad_request().with_message(e.to_string()))?;

        Ok(ValidatedBody(body))
    }
}

/// Integer `:id` path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdParam(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for IdParam
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request().with_details(rejection.body_text()))?;

        raw.parse::<i64>().map(IdParam).map_err(|_| {
            ApiError::bad_request()
                .with_message(format!("'id' must be an integer, got '{}'", raw))
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawPageQuery {
    page: Option<String>,
    limit: Option<String>,
    favorite: Option<String>,
}

/// `?page=&limit=&favorite=` of contact listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// 1-based page number
    pub page: u32,

    /// Page size, at most [`MAX_PAGE_LIMIT`]
    pub limit: u32,

    /// Restrict to favorites (`true`) or non-favorites (`false`)
    pub favorite: Option<bool>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            favorite: None,
        }
    }
}

impl PageQuery {
    /// Rows to skip before this page
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    fn from_raw(raw: RawPageQuery) -> ApiResult<Self> {
        let page = positive("page", raw.page.as_deref())?.unwrap_or(1);
        let limit = positive("limit", raw.limit.as_deref())?
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(MAX_PAGE_LIMIT);

        let favorite = match raw.favorite.as_deref() {
            None => None,
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(other) => {
                return Err(ApiError::bad_request()
                    .with_message(format!("'favorite' must be true or false, got '{}'", other)))
            }
        };

        Ok(Self { page, limit, favorite })
    }
}

fn positive(name: &str, value: Option<&str>) -> ApiResult<Option<u32>> {
    match value {
        None => Ok(None),
        Some(raw) => match raw.parse::<u32>() {
            Ok(n) if n >= 1 => Ok(Some(n)),
            _ => Err(ApiError::bad_request()
                .with_message(format!("'{}' must be a positive integer, got '{}'", name, raw))),
        },
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PageQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<RawPageQuery>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::bad_request()
                    .with_message("Invalid query string")
                    .with_details(rejection.body_text())
            })?;

        PageQuery::from_raw(raw)
    }
}
