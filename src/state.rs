use anyhow::Context;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::annotation::BurnInStyle;
use crate::services::{
    AuthService, FontLabelPainter, ImageService, LabelPainter, SeaOrmAuthService,
    SeaOrmImageService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub auth_service: Arc<dyn AuthService>,

    pub image_service: Arc<dyn ImageService>,
}

impl SharedState {
    /// Opens the database and loads the caption font. Fails when the font
    /// file is missing so a misconfigured server never starts.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let font_path = config.annotation.font_path.clone();
        let font_size = config.annotation.font_size;

        let painter = tokio::task::spawn_blocking(move || {
            FontLabelPainter::from_file(&font_path, font_size)
        })
        .await
        .context("Font loading task panicked")??;

        tracing::info!(family = painter.family(), "Caption font loaded");
        Self::with_label_painter(config, Arc::new(painter)).await
    }

    /// Builds the state around an already constructed painter.
    pub async fn with_label_painter(
        config: Config,
        painter: Arc<dyn LabelPainter>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let image_service = Arc::new(SeaOrmImageService::new(
            store,
            painter,
            BurnInStyle::from(&config.annotation),
        )) as Arc<dyn ImageService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            auth_service,
            image_service,
        })
    }
}
