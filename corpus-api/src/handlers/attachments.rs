//! Attachment upload
//!
//! Multipart `POST /attachments`. Upload permission is "can edit
//! something": any identity allowed to mutate at least one content type
//! may store files.

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Multipart, State},
    response::Json,
    Extension,
};
use corpus_core::{Error, RequestContext};
use serde_json::Value;
use tracing::debug;

pub async fn upload(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    if !context.identity.can_edit_some(&state.registry) {
        return Err(ApiError(Error::forbidden()));
    }

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError(Error::invalid()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.bin").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|_| ApiError(Error::invalid()))?;
        debug!(%filename, size = bytes.len(), "received upload");
        let descriptor = state.attachments.save(&filename, bytes.to_vec()).await?;
        return Ok(Json(Value::Object(descriptor)));
    }

    Err(ApiError(Error::invalid()))
}
