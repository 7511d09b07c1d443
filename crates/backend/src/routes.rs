use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::auth;
use crate::handlers::{health_check, messages, users};
use crate::AppState;

/// Build the full application router.
///
/// `/api` carries the auth endpoints, the caller's profile and messages;
/// `/admin` is limited to identities with the admin role.
pub fn build_router(state: AppState, client_origin: Option<&str>) -> Router {
    let require_auth = middleware::from_fn_with_state(state.clone(), auth::require_auth);

    let public = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh));

    let protected = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/users/me", get(users::me))
        .route(
            "/messages",
            get(messages::list_messages).post(messages::create_message),
        )
        .route(
            "/messages/:id",
            get(messages::get_message)
                .put(messages::update_message)
                .delete(messages::delete_message),
        )
        .route_layer(require_auth.clone());

    // The role gate reads what require_auth attached, so require_auth goes on last
    let admin = Router::new()
        .route("/users", get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route_layer(middleware::from_fn(auth::require_admin))
        .route_layer(require_auth);

    Router::new()
        .nest("/api", public.merge(protected))
        .nest("/admin", admin)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(build_cors_layer(client_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build CORS layer from the configured client origins.
///
/// If origins are configured, only those are allowed, with credentials so
/// the session cookies travel. Otherwise falls back to permissive CORS
/// (for development only).
fn build_cors_layer(client_origin: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = client_origin
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!(
            "CLIENT_ORIGIN not set, using permissive CORS (not recommended for production)"
        );
        return CorsLayer::permissive();
    }

    tracing::info!("CORS configured for origins: {:?}", origins);
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
