//! Login and logout
//!
//! Login verifies credentials against the user directory and issues a
//! bearer token. The plaintext appears exactly once, in this response.
//! Logout revokes the presented token (and tears down any cookie
//! session), after which the token is invalid everywhere.

use crate::{
    error::{ApiError, ApiResult},
    gateway,
    state::AppState,
};
use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderMap, HeaderValue},
    response::Json,
    Extension,
};
use corpus_core::{Error, Identity, RequestContext};
use corpus_store::sessions::SESSION_COOKIE;
use serde_json::{json, Value};
use tracing::info;

/// Cookie carrying the CSRF token for session-authenticated clients;
/// readable by the client so it can echo the value in `X-CSRF-Token`.
pub const CSRF_COOKIE: &str = "corpus-csrf";

/// POST /login `{username, password}` -> `{bearer}`
///
/// Also establishes a cookie session for browser clients; API clients
/// can ignore the cookies and present the bearer token instead.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(HeaderMap, Json<Value>)> {
    let username = body
        .get("username")
        .and_then(Value::as_str)
        .ok_or_else(Error::invalid)?;
    let password = body
        .get("password")
        .and_then(Value::as_str)
        .ok_or_else(Error::invalid)?;
    if username.is_empty() || password.is_empty() {
        return Err(ApiError(Error::invalid()));
    }

    let user = state
        .users
        .verify_login(username, password)
        .await
        .ok_or_else(|| ApiError(Error::Unauthorized("invalid credentials".to_string())))?;

    let bearer = state.tokens.issue(&user.id).await?;
    let (sid, csrf_token) = state.sessions.create(&user.id).await;

    let mut headers = HeaderMap::new();
    for cookie in [
        format!("{SESSION_COOKIE}={sid}; Path=/; HttpOnly"),
        format!("{CSRF_COOKIE}={csrf_token}; Path=/"),
    ] {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(header::SET_COOKIE, value);
        }
    }

    info!(username, "login succeeded");
    Ok((headers, Json(json!({ "bearer": bearer }))))
}

/// POST /logout (authenticated only). Destroys the credential that
/// authenticated this request.
pub async fn logout(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let Identity::User { id: user_id, .. } = &context.identity else {
        return Err(ApiError(Error::forbidden()));
    };

    let query = gateway::parse_query(raw_query.as_deref());
    if let Some(token) = gateway::extract_bearer(&headers, &query) {
        state.tokens.revoke(user_id, &token).await?;
    }
    if let Some(sid) = gateway::session_cookie(&headers) {
        state.sessions.destroy(&sid).await;
    }
    info!(%user_id, "logout");
    Ok(Json(json!({})))
}
