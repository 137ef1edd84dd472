use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::Rect;
use crate::entities::images;

pub mod migrator;
pub mod repositories;

pub use repositories::image::{ImageMeta, ImagePage, NewImage};
pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn image_repo(&self) -> repositories::image::ImageRepository {
        repositories::image::ImageRepository::new(self.conn.clone())
    }

    // Users

    pub async fn create_user(
        &self,
        new_user: NewUser<'_>,
        security: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo().create(new_user, security).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn list_annotator_names(&self) -> Result<Vec<String>> {
        self.user_repo().list_annotator_names().await
    }

    pub async fn existing_user_names(&self, names: &[String]) -> Result<Vec<String>> {
        self.user_repo().existing_names(names).await
    }

    // Images

    pub async fn insert_images(&self, batch: Vec<NewImage>) -> Result<Vec<i32>> {
        self.image_repo().insert_batch(batch).await
    }

    pub async fn get_image(&self, id: i32) -> Result<Option<images::Model>> {
        self.image_repo().get(id).await
    }

    pub async fn get_image_meta(&self, id: i32) -> Result<Option<ImageMeta>> {
        self.image_repo().get_meta(id).await
    }

    pub async fn list_images_for_assignee(
        &self,
        assignee: &str,
        page: u64,
        page_size: u64,
    ) -> Result<ImagePage> {
        self.image_repo()
            .list_for_assignee(assignee, page, page_size)
            .await
    }

    pub async fn update_image_annotation(&self, id: i32, data: Vec<u8>, rect: Rect) -> Result<bool> {
        self.image_repo().update_annotation(id, data, rect).await
    }

    pub async fn set_image_result(&self, id: i32, label: &str) -> Result<bool> {
        self.image_repo().set_result(id, label).await
    }

    pub async fn find_images_by_result(&self, label: &str) -> Result<Vec<images::Model>> {
        self.image_repo().find_by_result(label).await
    }

    pub async fn list_category_fields(&self) -> Result<Vec<String>> {
        self.image_repo().list_category_fields().await
    }
}
