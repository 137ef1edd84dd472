use axum::{
    Form, Json,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, AuthPageView, UserDto, flash};
use crate::constants::session::USER_ID_KEY;
use crate::domain::Actor;
use crate::services::{AuthError, SignUp};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the session into an [`Actor`] and stores it in the request
/// extensions. Requests without a valid session get 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let actor = current_actor(&state, &session)
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    tracing::Span::current().record("user_id", actor.id);
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

/// Must run inside [`auth_middleware`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = request
        .extensions()
        .get::<Actor>()
        .is_some_and(Actor::is_admin);

    if !is_admin {
        return Err(ApiError::admin_required());
    }
    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<AuthPageView>>, ApiError> {
    auth_page(&state, &session).await
}

/// POST /
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, ApiError> {
    match state
        .auth_service()
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            start_session(&session, user.id).await?;
            tracing::info!(user_id = user.id, "User logged in");
            Ok(Redirect::to("/dashboard"))
        }
        Err(err @ (AuthError::UnknownEmail | AuthError::WrongPassword)) => {
            flash::push(&session, err.to_string()).await?;
            Ok(Redirect::to("/"))
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /sign_up
pub async fn sign_up_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<AuthPageView>>, ApiError> {
    auth_page(&state, &session).await
}

/// POST /sign_up
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<SignUpForm>,
) -> Result<Redirect, ApiError> {
    let request = SignUp {
        email: form.email,
        password: form.password,
        name: form.name,
    };

    match state.auth_service().sign_up(request).await {
        Ok(user) => {
            start_session(&session, user.id).await?;
            Ok(Redirect::to("/dashboard"))
        }
        Err(AuthError::Validation(msg)) => {
            flash::push(&session, msg).await?;
            Ok(Redirect::to("/sign_up"))
        }
        Err(err @ AuthError::EmailTaken) => {
            flash::push(&session, err.to_string()).await?;
            Ok(Redirect::to("/sign_up"))
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /logout
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    Redirect::to("/")
}

// ============================================================================
// Helpers
// ============================================================================

async fn auth_page(
    state: &AppState,
    session: &Session,
) -> Result<Json<ApiResponse<AuthPageView>>, ApiError> {
    let actor = current_actor(state, session).await?;
    let flashes = flash::take(session).await?;

    Ok(Json(ApiResponse::success(AuthPageView {
        authenticated: actor.is_some(),
        user: actor.as_ref().map(UserDto::from),
        flashes,
    })))
}

async fn start_session(session: &Session, user_id: i32) -> Result<(), ApiError> {
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(USER_ID_KEY, user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

async fn current_actor(state: &AppState, session: &Session) -> Result<Option<Actor>, ApiError> {
    let user_id = session
        .get::<i32>(USER_ID_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    match user_id {
        Some(id) => Ok(state.auth_service().get_actor(id).await?),
        None => Ok(None),
    }
}
