use serde::Serialize;

use crate::domain::{Actor, Role};
use crate::services::DashboardPage;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct UserDto {
    pub id: i32,
    pub name: String,
    pub role: Role,
    pub is_admin: bool,
}

impl From<&Actor> for UserDto {
    fn from(actor: &Actor) -> Self {
        Self {
            id: actor.id,
            name: actor.name.clone(),
            role: actor.role,
            is_admin: actor.is_admin(),
        }
    }
}

/// Login and sign-up pages.
#[derive(Debug, Serialize)]
pub struct AuthPageView {
    pub authenticated: bool,
    pub user: Option<UserDto>,
    pub flashes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub user: UserDto,
    pub flashes: Vec<String>,
    #[serde(flatten)]
    pub queue: DashboardPage,
}

#[derive(Debug, Serialize)]
pub struct UploadFormView {
    pub user: UserDto,
    pub annotators: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportView {
    pub user: UserDto,
    pub categories: Vec<String>,
    pub flashes: Vec<String>,
}
