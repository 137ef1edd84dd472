use axum::{
    Extension, Form, Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::images::OptionForm;
use super::{ApiError, ApiResponse, AppState, ExportView, UserDto, flash};
use crate::constants::export::ARCHIVE_NAME;
use crate::domain::Actor;

const NO_RESULTS: &str = "Category results not found";

/// GET /download_images
pub async fn export_form(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    session: Session,
) -> Result<Json<ApiResponse<ExportView>>, ApiError> {
    let flashes = flash::take(&session).await?;
    export_view(&state, &actor, flashes).await
}

/// POST /download_images
/// Streams `images.zip` with every image labelled `option`, or re-renders the
/// form with a notice when nothing matches.
pub async fn download_images(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    session: Session,
    Form(form): Form<OptionForm>,
) -> Result<Response, ApiError> {
    tracing::Span::current().record("label", form.option.as_str());
    let Some(archive) = state.image_service().export(&form.option).await? else {
        let mut flashes = flash::take(&session).await?;
        flashes.push(NO_RESULTS.to_string());
        return Ok(export_view(&state, &actor, flashes).await?.into_response());
    };

    tracing::info!(entries = archive.entries, "Serving export archive");

    let disposition = format!("attachment; filename=\"{ARCHIVE_NAME}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive.bytes,
    )
        .into_response())
}

async fn export_view(
    state: &AppState,
    actor: &Actor,
    flashes: Vec<String>,
) -> Result<Json<ApiResponse<ExportView>>, ApiError> {
    let categories = state.image_service().categories().await?;
    Ok(Json(ApiResponse::success(ExportView {
        user: UserDto::from(actor),
        categories,
        flashes,
    })))
}
