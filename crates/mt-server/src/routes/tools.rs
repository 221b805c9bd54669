use axum::extract::State;
use axum::Json;

use crate::context::AppContext;
use crate::error::AppError;

/// Availability and version of each external tool.
pub async fn tools(State(ctx): State<AppContext>) -> Result<Json<Vec<mt_av::ToolInfo>>, AppError> {
    let tools = ctx.tools.clone();
    let infos = tokio::task::spawn_blocking(move || tools.check_all())
        .await
        .map_err(|e| mt_core::Error::Internal(format!("tool check failed: {e}")))?;
    Ok(Json(infos))
}
