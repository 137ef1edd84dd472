use axum::{
    Extension, Form, Json,
    extract::{Multipart, Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::Span;

use super::validation::{parse_image_id, split_label_option};
use super::{ApiError, ApiResponse, AppState, UploadFormView, UserDto};
use crate::domain::{Actor, ImageId};
use crate::services::{UploadFile, UploadRequest, UploadSummary, WebAnnotation};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct AnnoQuery {
    pub img_id: String,
}

/// Payload posted by the browser annotation widget.
#[derive(Deserialize)]
pub struct SaveAnnotationRequest {
    pub data: AnnotationData,
    pub n: ImageId,
}

#[derive(Deserialize)]
pub struct AnnotationData {
    pub body: Vec<AnnotationBodyItem>,
    pub target: AnnotationTargetData,
}

#[derive(Deserialize)]
pub struct AnnotationBodyItem {
    pub value: String,
}

/// The widget also sends `source`, the image it drew on. Burn-in always uses
/// the stored payload, so it is not read.
#[derive(Deserialize)]
pub struct AnnotationTargetData {
    pub selector: SelectorData,
}

#[derive(Deserialize)]
pub struct SelectorData {
    pub value: String,
}

#[derive(Deserialize)]
pub struct OptionForm {
    pub option: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /images/{id}
pub async fn image_png(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_image_id(&id)?;
    Span::current().record("image_id", id.value());
    let png = state.image_service().image_png(&actor, id).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// GET /add_images
pub async fn upload_form(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<UploadFormView>>, ApiError> {
    let annotators = state.image_service().annotator_names().await?;
    Ok(Json(ApiResponse::success(UploadFormView {
        user: UserDto::from(&actor),
        annotators,
    })))
}

/// POST /add_images
/// Multipart form: repeated `image` file fields, `assigned_to`, `category`.
pub async fn add_images(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadSummary>>, ApiError> {
    let mut files = Vec::new();
    let mut assigned_to = String::new();
    let mut category = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid upload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Invalid upload: {e}")))?;

                // Browsers send an empty part when no file was picked
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }
                files.push(UploadFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            "assigned_to" => {
                assigned_to = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("Invalid upload: {e}")))?;
            }
            "category" => {
                category = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("Invalid upload: {e}")))?;
            }
            _ => {}
        }
    }

    let summary = state
        .image_service()
        .upload_batch(
            &actor,
            UploadRequest {
                files,
                assigned_to,
                category,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(summary)))
}

/// GET /get_anno?img_id=
pub async fn get_anno(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnnoQuery>,
) -> Result<Json<Vec<WebAnnotation>>, ApiError> {
    let id = parse_image_id(&query.img_id)
        .map_err(|_| ApiError::NotFound("Image not found".to_string()))?;
    Span::current().record("image_id", id.value());
    let descriptor = state.image_service().annotation_descriptor(id).await?;
    Ok(Json(descriptor))
}

/// POST /save_annotation
pub async fn save_annotation(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<SaveAnnotationRequest>,
) -> Result<&'static str, ApiError> {
    Span::current().record("image_id", payload.n.value());
    let label = payload
        .data
        .body
        .first()
        .map(|item| item.value.as_str())
        .ok_or_else(|| ApiError::validation("Annotation body is empty"))?;

    state
        .image_service()
        .record_annotation(&actor, payload.n, &payload.data.target.selector.value, label)
        .await?;

    Ok("ok")
}

/// POST /submit
/// Form field `option` carries `<label>,<image id>`.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Form(form): Form<OptionForm>,
) -> Result<&'static str, ApiError> {
    let (label, id) = split_label_option(&form.option)?;
    Span::current()
        .record("image_id", id.value())
        .record("label", label);
    state.image_service().submit_label(&actor, id, label).await?;
    Ok("success")
}
