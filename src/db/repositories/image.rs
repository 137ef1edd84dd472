use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::domain::Rect;
use crate::entities::{images, prelude::*};

/// Image row without the pixel payload.
#[derive(Debug, Clone, FromQueryResult)]
pub struct ImageMeta {
    pub id: i32,
    pub filename: String,
    pub category: String,
    pub assigned_to: String,
    pub result: Option<String>,
    pub width: i32,
    pub height: i32,
    pub rect_x: Option<f64>,
    pub rect_y: Option<f64>,
    pub rect_w: Option<f64>,
    pub rect_h: Option<f64>,
    pub created_at: String,
}

impl ImageMeta {
    #[must_use]
    pub fn rect(&self) -> Option<Rect> {
        stored_rect(self.rect_x, self.rect_y, self.rect_w, self.rect_h)
    }
}

#[must_use]
pub fn stored_rect(
    x: Option<f64>,
    y: Option<f64>,
    w: Option<f64>,
    h: Option<f64>,
) -> Option<Rect> {
    Some(Rect::new(x?, y?, w?, h?))
}

/// A normalized upload ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub filename: String,
    pub data: Vec<u8>,
    pub category: String,
    pub assigned_to: String,
    pub width: i32,
    pub height: i32,
}

/// One page of an annotator's queue.
#[derive(Debug, Clone)]
pub struct ImagePage {
    pub items: Vec<ImageMeta>,
    pub total_items: u64,
    pub total_pages: u64,
}

pub struct ImageRepository {
    conn: DatabaseConnection,
}

impl ImageRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts a whole upload batch atomically; returns the new ids in order.
    pub async fn insert_batch(&self, batch: Vec<NewImage>) -> Result<Vec<i32>> {
        let txn = self.conn.begin().await?;
        let now = chrono::Utc::now().to_rfc3339();
        let mut ids = Vec::with_capacity(batch.len());

        for image in batch {
            let active = images::ActiveModel {
                filename: Set(image.filename),
                data: Set(image.data),
                category: Set(image.category),
                assigned_to: Set(image.assigned_to),
                result: Set(None),
                width: Set(image.width),
                height: Set(image.height),
                rect_x: Set(None),
                rect_y: Set(None),
                rect_w: Set(None),
                rect_h: Set(None),
                created_at: Set(now.clone()),
                ..Default::default()
            };

            let inserted = Images::insert(active)
                .exec(&txn)
                .await
                .context("Failed to insert image")?;
            ids.push(inserted.last_insert_id);
        }

        txn.commit().await.context("Failed to commit upload batch")?;
        Ok(ids)
    }

    pub async fn get(&self, id: i32) -> Result<Option<images::Model>> {
        let image = Images::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query image")?;

        Ok(image)
    }

    pub async fn get_meta(&self, id: i32) -> Result<Option<ImageMeta>> {
        let meta = Self::meta_select()
            .filter(images::Column::Id.eq(id))
            .into_model::<ImageMeta>()
            .one(&self.conn)
            .await
            .context("Failed to query image metadata")?;

        Ok(meta)
    }

    /// Images assigned to `assignee`, newest first. `page` is 1-based.
    pub async fn list_for_assignee(
        &self,
        assignee: &str,
        page: u64,
        page_size: u64,
    ) -> Result<ImagePage> {
        let paginator = Self::meta_select()
            .filter(images::Column::AssignedTo.eq(assignee))
            .order_by_desc(images::Column::Id)
            .into_model::<ImageMeta>()
            .paginate(&self.conn, page_size);

        let totals = paginator.num_items_and_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(ImagePage {
            items,
            total_items: totals.number_of_items,
            total_pages: totals.number_of_pages,
        })
    }

    /// Replaces the pixels and the stored rectangle. Returns false when the
    /// image does not exist.
    pub async fn update_annotation(&self, id: i32, data: Vec<u8>, rect: Rect) -> Result<bool> {
        let Some(image) = Images::find_by_id(id).one(&self.conn).await? else {
            return Ok(false);
        };

        let mut active: images::ActiveModel = image.into();
        active.data = Set(data);
        active.rect_x = Set(Some(rect.x));
        active.rect_y = Set(Some(rect.y));
        active.rect_w = Set(Some(rect.w));
        active.rect_h = Set(Some(rect.h));
        active
            .update(&self.conn)
            .await
            .context("Failed to store annotation")?;

        Ok(true)
    }

    /// Overwrites the result label. Returns false when the image does not exist.
    pub async fn set_result(&self, id: i32, label: &str) -> Result<bool> {
        let result = Images::update_many()
            .col_expr(
                images::Column::Result,
                sea_orm::sea_query::Expr::value(label.to_string()),
            )
            .filter(images::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to store result label")?;

        Ok(result.rows_affected > 0)
    }

    /// Every image whose result label equals `label` exactly.
    pub async fn find_by_result(&self, label: &str) -> Result<Vec<images::Model>> {
        let images = Images::find()
            .filter(images::Column::Result.eq(label))
            .order_by_asc(images::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query images by result")?;

        Ok(images)
    }

    /// Raw category strings of every stored image.
    pub async fn list_category_fields(&self) -> Result<Vec<String>> {
        let categories = Images::find()
            .select_only()
            .column(images::Column::Category)
            .into_tuple::<String>()
            .all(&self.conn)
            .await
            .context("Failed to list categories")?;

        Ok(categories)
    }

    fn meta_select() -> sea_orm::Select<Images> {
        Images::find().select_only().columns([
            images::Column::Id,
            images::Column::Filename,
            images::Column::Category,
            images::Column::AssignedTo,
            images::Column::Result,
            images::Column::Width,
            images::Column::Height,
            images::Column::RectX,
            images::Column::RectY,
            images::Column::RectW,
            images::Column::RectH,
            images::Column::CreatedAt,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_rect_requires_all_four_values() {
        assert_eq!(
            stored_rect(Some(1.0), Some(2.0), Some(3.0), Some(4.0)),
            Some(Rect::new(1.0, 2.0, 3.0, 4.0))
        );
        assert_eq!(stored_rect(Some(1.0), None, Some(3.0), Some(4.0)), None);
    }
}
