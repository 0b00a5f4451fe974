/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use contacts_api::{app::AppState, config::Config};
/// use contacts_shared::avatar::HttpProber;
/// use contacts_shared::db::pool::{connect, PoolSettings};
/// use contacts_shared::mail::mailer_from_config;
/// use contacts_shared::store::postgres::PgStore;
/// use std::{sync::Arc, time::Duration};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = connect(&PoolSettings { url: config.database.url.clone(), ..Default::default() }).await?;
/// let state = AppState::new(
///     Arc::new(PgStore::new(pool)),
///     mailer_from_config(&config.mail)?,
///     Arc::new(HttpProber::new(Duration::from_secs(5))?),
///     config,
/// );
/// let app = contacts_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use crate::error::{render_errors, ApiError};
use axum::{
    extract::{OriginalUri, Request, State},
    handler::HandlerWithoutStateExt,
    http::{header, HeaderMap, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
    Router,
};
use contacts_shared::auth::middleware::authenticate;
use contacts_shared::avatar::{AvatarProber, AvatarStorage};
use contacts_shared::mail::Mailer;
use contacts_shared::store::Store;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Users and contacts storage
    pub store: Arc<dyn Store>,

    /// Outbound mail
    pub mailer: Arc<dyn Mailer>,

    /// Avatar URL liveness checks
    pub prober: Arc<dyn AvatarProber>,

    /// Uploaded avatar files
    pub avatars: AvatarStorage,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        prober: Arc<dyn AvatarProber>,
        config: Config,
    ) -> Self {
        let avatars = AvatarStorage::new(&config.avatar.public_dir, &config.avatar.temp_dir);

        Self {
            store,
            mailer,
            prober,
            avatars,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                         # Health check (public)
/// ├── /avatars/*                      # Stored avatar images (static)
/// └── /api/
///     ├── /auth/
///     │   ├── POST  /register
///     │   ├── POST  /login
///     │   ├── GET   /verify/:verificationToken
///     │   ├── POST  /verify           # resend verification mail
///     │   ├── POST  /logout           # authenticated
///     │   ├── GET   /current          # authenticated
///     │   ├── PATCH /avatars          # authenticated, multipart
///     │   └── PATCH /subscription     # authenticated
///     └── /contacts/                  # all authenticated
///         ├── GET    /                # ?page=&limit=&favorite=
///         ├── POST   /
///         ├── GET    /:id
///         ├── PUT    /:id
///         ├── DELETE /:id
///         └── PATCH  /:id/favorite
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Error formatting (details only in debug mode)
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_public_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/verify", post(routes::auth::resend_verification))
        .route("/verify/:verification_token", get(routes::auth::verify_email));

    let auth_private_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route("/current", get(routes::auth::current))
        .route("/avatars", patch(routes::auth::update_avatar))
        .route("/subscription", patch(routes::auth::update_subscription))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    let contact_routes = Router::new()
        .route(
            "/",
            get(routes::contacts::list_contacts).post(routes::contacts::create_contact),
        )
        .route(
            "/:id",
            get(routes::contacts::get_contact)
                .put(routes::contacts::update_contact)
                .delete(routes::contacts::delete_contact),
        )
        .route("/:id/favorite", patch(routes::contacts::update_favorite))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    let api_routes = Router::new()
        .nest("/auth", auth_public_routes.merge(auth_private_routes))
        .nest("/contacts", contact_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    let debug = state.config.api.debug;

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .nest_service(
            "/avatars",
            ServeDir::new(state.avatars.avatars_dir())
                .not_found_service(route_not_found.into_service()),
        )
        .fallback(route_not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(middleware::from_fn_with_state(debug, render_errors))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Runs the bearer-token guard and injects the resulting `AuthContext`
/// into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default().to_string());

    let auth_context = authenticate(header.as_deref(), state.store.as_ref(), state.jwt_secret()).await?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// Fallback for unmatched routes
async fn route_not_found(OriginalUri(uri): OriginalUri, headers: HeaderMap) -> ApiError {
    let url = match headers.get(header::HOST).and_then(|host| host.to_str().ok()) {
        Some(host) if uri.host().is_none() => format!("http://{}{}", host, uri),
        _ => uri.to_string(),
    };

    ApiError::not_found().with_details(format!("Route '{}' not found", url))
}
