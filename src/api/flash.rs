//! One-shot messages carried in the session until the next page view.

use tower_sessions::Session;

use super::ApiError;
use crate::constants::session::FLASH_KEY;

pub async fn push(session: &Session, message: impl Into<String>) -> Result<(), ApiError> {
    let mut pending = peek(session).await?;
    pending.push(message.into());
    session
        .insert(FLASH_KEY, pending)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))
}

/// Returns and clears every pending message.
pub async fn take(session: &Session) -> Result<Vec<String>, ApiError> {
    let pending = session
        .remove::<Vec<String>>(FLASH_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;
    Ok(pending.unwrap_or_default())
}

async fn peek(session: &Session) -> Result<Vec<String>, ApiError> {
    let pending = session
        .get::<Vec<String>>(FLASH_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;
    Ok(pending.unwrap_or_default())
}
