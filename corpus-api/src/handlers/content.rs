//! Collection handlers
//!
//! One set of handlers serves every registered content type; the type's
//! kind decides whether the piece or page flavor of an operation runs.

use super::{boolean_param, field_selection, launder_id, list_params, object_body};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use corpus_core::{ContentKind, Error, RequestContext};
use serde_json::{json, Value};
use std::collections::HashMap;

fn kind_of(state: &AppState, collection: &str) -> ApiResult<ContentKind> {
    state
        .registry
        .get(collection)
        .map(|ty| ty.kind)
        .ok_or_else(|| ApiError(Error::NotFound))
}

/// GET /{collection}: paged piece listing, or the page tree.
pub async fn list(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(collection): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    match kind_of(&state, &collection)? {
        ContentKind::Page => {
            let all = boolean_param(&query, "all");
            let flat = boolean_param(&query, "flat");
            let tree = state.content.page_home(&context.identity, all, flat).await?;
            Ok(Json(tree))
        }
        ContentKind::Piece => {
            let params = list_params(&query);
            let selection = field_selection(&query);
            let result = state
                .content
                .list(&context.identity, &collection, &params, &selection)
                .await?;
            let value = serde_json::to_value(result)
                .map_err(|e| ApiError(Error::internal(format!("serialize listing: {e}"))))?;
            Ok(Json(value))
        }
    }
}

/// GET /{collection}/{id}
pub async fn get_one(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path((collection, id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let id = launder_id(&id)?;
    let selection = field_selection(&query);
    let doc = match kind_of(&state, &collection)? {
        ContentKind::Page => {
            state
                .content
                .page_get(&context.identity, &id, &selection)
                .await?
        }
        ContentKind::Piece => {
            state
                .content
                .get(&context.identity, &collection, &id, &selection)
                .await?
        }
    };
    Ok(Json(Value::Object(doc)))
}

/// POST /{collection}
pub async fn create(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let body = object_body(body)?;
    let doc = state
        .content
        .insert(&context.identity, &collection, &body)
        .await?;
    Ok(Json(Value::Object(doc)))
}

/// PUT /{collection}/{id}: full replace, last write wins.
pub async fn replace(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let id = launder_id(&id)?;
    let body = object_body(body)?;
    let doc = state
        .content
        .replace(&context.identity, &collection, &id, &body)
        .await?;
    Ok(Json(Value::Object(doc)))
}

/// PATCH /{collection}/{id}: partial update with operator support,
/// serialized per document id.
pub async fn patch(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let id = launder_id(&id)?;
    let body = object_body(body)?;
    let doc = state
        .content
        .patch(&context.identity, &collection, &id, &body)
        .await?;
    Ok(Json(Value::Object(doc)))
}

/// DELETE /{collection}/{id}: soft delete.
pub async fn delete(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let id = launder_id(&id)?;
    state
        .content
        .trash(&context.identity, &collection, &id)
        .await?;
    Ok(Json(json!({})))
}

/// POST /{collection}/{id}/move, pages only.
pub async fn move_page(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    if kind_of(&state, &collection)? != ContentKind::Page {
        return Err(ApiError(Error::NotFound));
    }
    let id = launder_id(&id)?;
    let body = object_body(body)?;
    let target_id = body
        .get("targetId")
        .and_then(Value::as_str)
        .ok_or_else(Error::invalid)?;
    let target_id = launder_id(target_id)?;
    let position = body
        .get("position")
        .and_then(Value::as_str)
        .ok_or_else(Error::invalid)?
        .parse()?;
    state
        .content
        .page_move(&context.identity, &id, &target_id, position)
        .await?;
    Ok(Json(json!({})))
}
