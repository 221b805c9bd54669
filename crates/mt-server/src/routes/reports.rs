//! Report download.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use mt_core::{content_type_for, JobId};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// `GET /api/reports/{job_id}/{filename}`: serve a job artifact as an
/// attachment.
///
/// A malformed job id is a 400. Anything that does not resolve to a file
/// inside that job's directory is a 404.
pub async fn download(
    State(ctx): State<AppContext>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Path((job_id, filename)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let with_id = |e: mt_core::Error| AppError::new(e).with_request_id(request_id.clone());

    let job_id: JobId = job_id.parse().map_err(with_id)?;
    let path = ctx
        .workspace
        .resolve_artifact(&job_id, &filename)
        .await
        .map_err(with_id)?;
    let body = tokio::fs::read(&path)
        .await
        .map_err(|e| with_id(mt_core::Error::from(e)))?;

    tracing::debug!(job_id = %job_id, filename, bytes = body.len(), "serving report");

    let disposition = format!("attachment; filename=\"{filename}\"");
    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
