use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::services::{AuthService, ImageService};
use crate::state::SharedState;

pub mod auth;
mod dashboard;
mod error;
mod export;
mod flash;
mod images;
mod observability;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn image_service(&self) -> &Arc<dyn ImageService> {
        &self.shared.image_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let server = state.config().read().await.server.clone();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_inactivity_minutes,
        )));

    let app_routes = Router::new()
        .route("/", get(auth::login_page).post(auth::login))
        .route("/sign_up", get(auth::sign_up_page).post(auth::sign_up))
        .route("/logout", get(auth::logout))
        .merge(create_protected_router(state.clone()))
        .layer(DefaultBodyLimit::max(server.max_upload_mb * 1024 * 1024))
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if server.cors_allowed_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    app_routes
        .nest_service("/.well-known", ServeDir::new(&server.well_known_dir))
        .layer(middleware::from_fn(observability::response_headers))
        .layer(middleware::from_fn(observability::request_metrics))
        .layer(TraceLayer::new_for_http().make_span_with(observability::request_span))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin_routes = Router::new()
        .route(
            "/add_images",
            get(images::upload_form).post(images::add_images),
        )
        .route(
            "/download_images",
            get(export::export_form).post(export::download_images),
        )
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(auth::require_admin));

    Router::new()
        .route("/dashboard", get(dashboard::dashboard))
        .route("/images/{id}", get(images::image_png))
        .route("/get_anno", get(images::get_anno))
        .route("/save_annotation", post(images::save_annotation))
        .route("/submit", post(images::submit))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
