//! `SeaORM` implementation of the `ImageService` trait.
//!
//! Decoding, resizing, burn-in and archive building all run on the blocking
//! pool so request handlers never stall the runtime.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task;
use tracing::{info, warn};

use crate::constants::limits::DASHBOARD_PAGE_SIZE;
use crate::db::{NewImage, Store};
use crate::domain::{Actor, ImageId, Rect};
use crate::services::annotation::{BurnInStyle, burn_in, parse_selector};
use crate::services::canvas;
use crate::services::categories::{aggregate_categories, split_categories};
use crate::services::distributor::{DistributeError, distribute, parse_roster};
use crate::services::export::{ExportItem, build_archive};
use crate::services::image_service::{
    Assignment, DashboardPage, ExportArchive, ImageError, ImageService, ImageSummary,
    UploadRequest, UploadSummary, WebAnnotation,
};
use crate::services::label::LabelPainter;

pub struct SeaOrmImageService {
    store: Store,
    painter: Arc<dyn LabelPainter>,
    style: BurnInStyle,
}

impl SeaOrmImageService {
    #[must_use]
    pub fn new(store: Store, painter: Arc<dyn LabelPainter>, style: BurnInStyle) -> Self {
        Self {
            store,
            painter,
            style,
        }
    }

    fn ensure_may_edit(actor: &Actor, id: ImageId, assignee: &str) -> Result<(), ImageError> {
        if actor.may_edit(assignee) {
            Ok(())
        } else {
            warn!(user = %actor.name, image_id = %id, "Rejected write to another annotator's image");
            Err(ImageError::Forbidden(id))
        }
    }
}

#[async_trait]
impl ImageService for SeaOrmImageService {
    async fn upload_batch(
        &self,
        actor: &Actor,
        request: UploadRequest,
    ) -> Result<UploadSummary, ImageError> {
        if !actor.is_admin() {
            return Err(ImageError::AdminRequired);
        }

        let roster = parse_roster(&request.assigned_to);
        if roster.is_empty() {
            return Err(DistributeError::EmptyRoster.into());
        }

        let known = self.store.existing_user_names(&roster).await?;
        let unknown: BTreeSet<&str> = roster
            .iter()
            .filter(|name| !known.contains(name))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(ImageError::Validation(format!(
                "Unknown annotators: {}",
                unknown.into_iter().collect::<Vec<_>>().join(", ")
            )));
        }

        let assignments = distribute(request.files, &roster)?;
        let summary: Vec<Assignment> = assignments
            .iter()
            .map(|(name, files)| Assignment {
                name: name.clone(),
                count: files.len(),
            })
            .collect();

        let category = request.category.trim().to_string();
        let batch = task::spawn_blocking(move || -> Result<Vec<NewImage>, ImageError> {
            let mut batch = Vec::new();
            for (name, files) in assignments {
                for file in files {
                    let normalized = canvas::normalize(&file.bytes).map_err(|e| {
                        ImageError::Validation(format!(
                            "Could not read image '{}': {e}",
                            file.filename
                        ))
                    })?;

                    batch.push(NewImage {
                        filename: file.filename,
                        data: normalized.png,
                        category: category.clone(),
                        assigned_to: name.clone(),
                        width: i32::try_from(normalized.original_width).unwrap_or(i32::MAX),
                        height: i32::try_from(normalized.original_height).unwrap_or(i32::MAX),
                    });
                }
            }
            Ok(batch)
        })
        .await??;

        let image_ids = self.store.insert_images(batch).await?;

        metrics::counter!("images_uploaded_total").increment(image_ids.len() as u64);
        info!(
            uploaded = image_ids.len(),
            annotators = summary.len(),
            by = %actor.name,
            "Stored upload batch"
        );

        Ok(UploadSummary {
            uploaded: image_ids.len(),
            image_ids,
            assignments: summary,
        })
    }

    async fn dashboard(&self, actor: &Actor, page: u64) -> Result<DashboardPage, ImageError> {
        let page = page.max(1);
        let listing = self
            .store
            .list_images_for_assignee(&actor.name, page, DASHBOARD_PAGE_SIZE)
            .await?;

        let images = listing
            .items
            .into_iter()
            .map(|meta| ImageSummary {
                rect: meta.rect(),
                url: format!("/images/{}", meta.id),
                id: meta.id,
                filename: meta.filename,
                category: meta.category,
                result: meta.result,
                width: meta.width,
                height: meta.height,
                created_at: meta.created_at,
            })
            .collect();

        Ok(DashboardPage {
            images,
            page,
            per_page: DASHBOARD_PAGE_SIZE,
            total_items: listing.total_items,
            total_pages: listing.total_pages,
        })
    }

    async fn image_png(&self, actor: &Actor, id: ImageId) -> Result<Vec<u8>, ImageError> {
        let image = self
            .store
            .get_image(id.value())
            .await?
            .ok_or(ImageError::NotFound(id))?;

        Self::ensure_may_edit(actor, id, &image.assigned_to)?;
        Ok(image.data)
    }

    async fn annotation_descriptor(&self, id: ImageId) -> Result<Vec<WebAnnotation>, ImageError> {
        let meta = self
            .store
            .get_image_meta(id.value())
            .await?
            .ok_or(ImageError::NotFound(id))?;

        let tags = split_categories(&meta.category);
        Ok(vec![WebAnnotation::for_image(&tags, meta.rect())])
    }

    async fn record_annotation(
        &self,
        actor: &Actor,
        id: ImageId,
        selector: &str,
        label: &str,
    ) -> Result<Rect, ImageError> {
        let rect = parse_selector(selector)?;

        let image = self
            .store
            .get_image(id.value())
            .await?
            .ok_or(ImageError::NotFound(id))?;
        Self::ensure_may_edit(actor, id, &image.assigned_to)?;

        let painter = Arc::clone(&self.painter);
        let style = self.style;
        let label = label.to_string();
        let png = task::spawn_blocking(move || {
            burn_in(&image.data, rect, &label, painter.as_ref(), &style)
        })
        .await?
        .map_err(|e| ImageError::Processing(e.to_string()))?;

        if !self
            .store
            .update_image_annotation(id.value(), png, rect)
            .await?
        {
            return Err(ImageError::NotFound(id));
        }

        metrics::counter!("annotations_recorded_total").increment(1);
        info!(image_id = %id, by = %actor.name, selector = %rect.to_selector(), "Annotation recorded");
        Ok(rect)
    }

    async fn submit_label(
        &self,
        actor: &Actor,
        id: ImageId,
        label: &str,
    ) -> Result<(), ImageError> {
        let meta = self
            .store
            .get_image_meta(id.value())
            .await?
            .ok_or(ImageError::NotFound(id))?;
        Self::ensure_may_edit(actor, id, &meta.assigned_to)?;

        if !self.store.set_image_result(id.value(), label).await? {
            return Err(ImageError::NotFound(id));
        }

        metrics::counter!("labels_submitted_total").increment(1);
        info!(image_id = %id, by = %actor.name, label, "Result label stored");
        Ok(())
    }

    async fn export(&self, label: &str) -> Result<Option<ExportArchive>, ImageError> {
        let matches = self.store.find_images_by_result(label).await?;
        if matches.is_empty() {
            info!(label, "Export matched no images");
            return Ok(None);
        }

        let items: Vec<ExportItem> = matches
            .into_iter()
            .map(|image| ExportItem {
                id: image.id,
                filename: image.filename,
                data: image.data,
                width: image.width,
                height: image.height,
            })
            .collect();
        let entries = items.len();

        let bytes = task::spawn_blocking(move || build_archive(&items)).await??;

        metrics::counter!("exports_total").increment(1);
        info!(label, entries, size = bytes.len(), "Export archive built");
        Ok(Some(ExportArchive { bytes, entries }))
    }

    async fn categories(&self) -> Result<Vec<String>, ImageError> {
        let fields = self.store.list_category_fields().await?;
        Ok(aggregate_categories(fields))
    }

    async fn annotator_names(&self) -> Result<Vec<String>, ImageError> {
        Ok(self.store.list_annotator_names().await?)
    }
}
