//! Domain service for image batches: upload, the annotator queue, annotation
//! and result labels, and export.

use serde::Serialize;
use thiserror::Error;

use crate::constants::annotation::{
    ANNO_CONTEXT, DEFAULT_SELECTOR, LABEL_PROMPT, MEDIA_FRAGMENTS_SPEC,
};
use crate::domain::{Actor, ImageId, Rect};
use crate::services::annotation::SelectorError;
use crate::services::distributor::DistributeError;
use crate::services::export::ExportError;

/// Domain errors for image operations.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image not found: {0}")]
    NotFound(ImageId),

    #[error("Not allowed to modify image {0}")]
    Forbidden(ImageId),

    #[error("Administrator access required")]
    AdminRequired,

    #[error("{0}")]
    Validation(String),

    #[error("Image processing failed: {0}")]
    Processing(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ImageError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ImageError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<SelectorError> for ImageError {
    fn from(err: SelectorError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<DistributeError> for ImageError {
    fn from(err: DistributeError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ExportError> for ImageError {
    fn from(err: ExportError) -> Self {
        Self::Processing(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ImageError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Worker task failed: {err}"))
    }
}

/// One file from the upload form.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub files: Vec<UploadFile>,
    /// Raw comma-separated annotator list.
    pub assigned_to: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub uploaded: usize,
    pub image_ids: Vec<i32>,
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageSummary {
    pub id: i32,
    pub filename: String,
    pub category: String,
    pub result: Option<String>,
    pub width: i32,
    pub height: i32,
    pub rect: Option<Rect>,
    pub url: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardPage {
    pub images: Vec<ImageSummary>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

/// W3C Web Annotation as consumed by the browser annotation widget.
#[derive(Debug, Clone, Serialize)]
pub struct WebAnnotation {
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub id: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub body: Vec<AnnotationBody>,
    pub target: AnnotationTarget,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotationBody {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<&'static str>,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotationTarget {
    pub selector: Vec<FragmentSelector>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FragmentSelector {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "conformsTo")]
    pub conforms_to: &'static str,
    pub value: String,
}

impl WebAnnotation {
    /// Descriptor for one image: a free-text prompt, one tag per category
    /// token, and the stored rectangle (or the default placement).
    #[must_use]
    pub fn for_image(categories: &[&str], rect: Option<Rect>) -> Self {
        let mut body = vec![AnnotationBody {
            kind: "TextualBody",
            purpose: None,
            value: LABEL_PROMPT.to_string(),
        }];
        body.extend(categories.iter().map(|tag| AnnotationBody {
            kind: "TextualBody",
            purpose: Some("tagging"),
            value: (*tag).to_string(),
        }));

        Self {
            context: ANNO_CONTEXT,
            id: "#annotation",
            kind: "Annotation",
            body,
            target: AnnotationTarget {
                selector: vec![FragmentSelector {
                    kind: "FragmentSelector",
                    conforms_to: MEDIA_FRAGMENTS_SPEC,
                    value: rect.map_or_else(|| DEFAULT_SELECTOR.to_string(), |r| r.to_selector()),
                }],
            },
        }
    }
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportArchive {
    pub bytes: Vec<u8>,
    pub entries: usize,
}

/// Domain service trait for image batch operations.
#[async_trait::async_trait]
pub trait ImageService: Send + Sync {
    /// Normalizes every file, splits the batch across the roster and stores
    /// it in one transaction.
    ///
    /// # Errors
    ///
    /// - [`ImageError::AdminRequired`] if `actor` is not an administrator
    /// - [`ImageError::Validation`] for an empty roster, unknown annotators or
    ///   an undecodable file; nothing is stored in that case
    async fn upload_batch(
        &self,
        actor: &Actor,
        request: UploadRequest,
    ) -> Result<UploadSummary, ImageError>;

    /// The actor's own queue, newest first. `page` is 1-based.
    async fn dashboard(&self, actor: &Actor, page: u64) -> Result<DashboardPage, ImageError>;

    /// Current PNG payload. Only the assignee and administrators may read it.
    async fn image_png(&self, actor: &Actor, id: ImageId) -> Result<Vec<u8>, ImageError>;

    async fn annotation_descriptor(&self, id: ImageId) -> Result<Vec<WebAnnotation>, ImageError>;

    /// Burns `label` and the box described by `selector` into the stored
    /// pixels and records the rectangle. Replaces any earlier rectangle.
    ///
    /// # Errors
    ///
    /// - [`ImageError::Validation`] for a malformed selector
    /// - [`ImageError::NotFound`] for an unknown id
    /// - [`ImageError::Forbidden`] if the actor is neither assignee nor admin
    async fn record_annotation(
        &self,
        actor: &Actor,
        id: ImageId,
        selector: &str,
        label: &str,
    ) -> Result<Rect, ImageError>;

    /// Overwrites the result label unconditionally.
    async fn submit_label(&self, actor: &Actor, id: ImageId, label: &str)
    -> Result<(), ImageError>;

    /// Archive of every image whose result equals `label` exactly; `None`
    /// when nothing matches.
    async fn export(&self, label: &str) -> Result<Option<ExportArchive>, ImageError>;

    /// Sorted, deduplicated category tokens across all images.
    async fn categories(&self) -> Result<Vec<String>, ImageError>;

    /// Display names the upload form can assign to.
    async fn annotator_names(&self) -> Result<Vec<String>, ImageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_uses_default_selector_without_stored_rect() {
        let anno = WebAnnotation::for_image(&["cat", "dog"], None);
        let json = serde_json::to_value(&anno).unwrap();

        assert_eq!(json["@context"], "http://www.w3.org/ns/anno.jsonld");
        assert_eq!(json["id"], "#annotation");
        assert_eq!(json["type"], "Annotation");
        assert_eq!(json["body"][0]["value"], "Type here the correct option");
        assert!(json["body"][0].get("purpose").is_none());
        assert_eq!(json["body"][1]["purpose"], "tagging");
        assert_eq!(json["body"][2]["value"], "dog");
        assert_eq!(
            json["target"]["selector"][0]["conformsTo"],
            "http://www.w3.org/TR/media-frags/"
        );
        assert_eq!(
            json["target"]["selector"][0]["value"],
            "xywh=pixel:273,171,123,94"
        );
    }

    #[test]
    fn descriptor_reflects_stored_rect() {
        let anno = WebAnnotation::for_image(&[], Some(Rect::new(10.0, 10.0, 50.0, 20.0)));
        assert_eq!(anno.body.len(), 1);
        assert_eq!(anno.target.selector[0].value, "xywh=pixel:10,10,50,20");
    }
}
