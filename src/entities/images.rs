use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub filename: String,

    /// PNG payload. Rewritten in place every time the image is annotated.
    #[sea_orm(column_type = "Blob")]
    pub data: Vec<u8>,

    /// Comma-separated category tokens shared by the upload batch.
    pub category: String,

    pub assigned_to: String,

    pub result: Option<String>,

    /// Dimensions of the upload before canvas normalization.
    pub width: i32,
    pub height: i32,

    pub rect_x: Option<f64>,
    pub rect_y: Option<f64>,
    pub rect_w: Option<f64>,
    pub rect_h: Option<f64>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
