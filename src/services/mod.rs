pub mod annotation;
pub mod canvas;
pub mod categories;
pub mod distributor;
pub mod export;
pub mod label;

pub mod auth_service;
pub use auth_service::{AuthError, AuthService, SignUp};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod image_service;
pub use image_service::{
    DashboardPage, ExportArchive, ImageError, ImageService, UploadFile, UploadRequest,
    UploadSummary, WebAnnotation,
};

pub mod image_service_impl;
pub use image_service_impl::SeaOrmImageService;

pub use label::{FontLabelPainter, LabelPainter};
