//! Request spans, workflow metrics and response headers.

use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Span, info, info_span};
use uuid::Uuid;

use crate::api::AppState;

/// GET /metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Root span for one request. `user_id`, `image_id` and `label` start empty
/// and are recorded by the auth middleware and the image handlers.
pub fn request_span(request: &Request) -> Span {
    info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %request.method(),
        route = route_of(request),
        user_id = tracing::field::Empty,
        image_id = tracing::field::Empty,
        label = tracing::field::Empty,
    )
}

/// Request counters and latency, plus an outcome tally per workflow action.
pub async fn request_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let route = route_of(&req).to_string();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed = start.elapsed();

    let labels = [
        ("method", method.to_string()),
        ("route", route.clone()),
        ("status", status.as_u16().to_string()),
    ];
    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_request_duration_seconds", &labels).record(elapsed.as_secs_f64());

    let action = action_for(&method, &route);
    if let Some(action) = action {
        metrics::counter!(
            "annodesk_actions_total",
            "action" => action,
            "outcome" => outcome_for(status)
        )
        .increment(1);
    }

    info!(
        status = status.as_u16(),
        duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        action = action.unwrap_or("-"),
        "Request finished"
    );

    response
}

/// Every response is private to the session that asked for it.
pub async fn response_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers
        .entry(header::CACHE_CONTROL)
        .or_insert(HeaderValue::from_static("no-store"));

    response
}

/// Route template of a matched request; unmatched paths share one label.
fn route_of(request: &Request) -> &str {
    request
        .extensions()
        .get::<MatchedPath>()
        .map_or("unmatched", MatchedPath::as_str)
}

/// The annotation workflow step a route performs, if any.
fn action_for(method: &Method, route: &str) -> Option<&'static str> {
    let action = match (method.as_str(), route) {
        ("POST", "/") => "login",
        ("POST", "/sign_up") => "sign_up",
        ("POST", "/add_images") => "upload",
        ("GET", "/get_anno") => "describe",
        ("GET", "/images/{id}") => "fetch_image",
        ("POST", "/save_annotation") => "annotate",
        ("POST", "/submit") => "label",
        ("POST", "/download_images") => "export",
        _ => return None,
    };
    Some(action)
}

fn outcome_for(status: StatusCode) -> &'static str {
    match status {
        s if s.is_success() => "ok",
        s if s.is_redirection() => "redirect",
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "denied",
        StatusCode::NOT_FOUND => "not_found",
        s if s.is_client_error() => "rejected",
        _ => "error",
    }
}
