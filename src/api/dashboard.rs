use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::validate_page;
use super::{ApiError, ApiResponse, AppState, DashboardView, UserDto, flash};
use crate::domain::Actor;

#[derive(Deserialize)]
pub struct DashboardQuery {
    pub page: Option<u64>,
}

/// GET /dashboard
/// The current user's queue, newest first.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    session: Session,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<DashboardView>>, ApiError> {
    let page = validate_page(query.page)?;
    let queue = state.image_service().dashboard(&actor, page).await?;
    let flashes = flash::take(&session).await?;

    Ok(Json(ApiResponse::success(DashboardView {
        user: UserDto::from(&actor),
        flashes,
        queue,
    })))
}
