//! Auth gateway
//!
//! Runs once per request on the API router, before routing. Resolves the
//! request to an identity via, in order: bearer token, API key, session
//! cookie. Produces the `RequestContext` extension every handler reads.
//!
//! A presented-but-invalid credential always fails the request: a
//! revoked or expired token must never silently degrade to anonymous
//! access the caller did not ask for.

use crate::{error::ApiError, state::AppState};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use corpus_core::{Error, Identity, KeyScope, RequestContext};
use corpus_store::sessions::{CSRF_HEADER, SESSION_COOKIE};
use tracing::{debug, warn};

pub async fn resolve(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Nesting strips the API prefix before this layer runs; accept both
    // shapes so the gateway also works when mounted un-nested.
    let path = request.uri().path().to_string();
    let prefix = state.config.prefix();
    let relative = path.strip_prefix(prefix.as_str()).unwrap_or(&path);

    // The login endpoint cannot require a token, and configured
    // exceptions skip CSRF. Credential resolution is skipped on these
    // paths; an existing cookie session still identifies the caller.
    let excepted = relative == "/login"
        || state
            .config
            .csrf_exceptions
            .iter()
            .any(|exception| relative.starts_with(exception.as_str()));
    if excepted {
        let context = resolve_session(&state, request.headers(), request.method(), true).await?;
        request.extensions_mut().insert(context);
        return Ok(next.run(request).await);
    }

    let query = parse_query(request.uri().query());

    if let Some(token) = extract_bearer(request.headers(), &query) {
        let identity = resolve_bearer(&state, &token).await?;
        request.extensions_mut().insert(RequestContext {
            identity,
            csrf_exempt: true,
        });
        return Ok(next.run(request).await);
    }

    if let Some(key) = extract_api_key(request.headers(), &query) {
        let identity = resolve_api_key(&state, &key)?;
        request.extensions_mut().insert(RequestContext {
            identity,
            csrf_exempt: true,
        });
        return Ok(next.run(request).await);
    }

    let context = resolve_session(&state, request.headers(), request.method(), false).await?;
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

async fn resolve_bearer(state: &AppState, token: &str) -> Result<Identity, ApiError> {
    let user_id = state
        .tokens
        .lookup(token)
        .await?
        .ok_or_else(|| ApiError(Error::bearer_invalid()))?;
    let user = state.users.get(&user_id).await.ok_or_else(|| {
        warn!(%user_id, "bearer token resolved to a missing user");
        ApiError(Error::bearer_invalid())
    })?;
    debug!(%user_id, "authenticated via bearer token");
    Ok(Identity::User {
        id: user.id,
        username: user.username,
        permissions: user.permissions,
    })
}

fn resolve_api_key(state: &AppState, key: &str) -> Result<Identity, ApiError> {
    if state.config.api_keys.iter().any(|k| k == key) {
        debug!("authenticated via global api key");
        return Ok(Identity::System {
            scope: KeyScope::Global,
        });
    }
    if let Some(ty) = state.registry.type_for_key(key) {
        debug!(ty = %ty.name, "authenticated via module api key");
        return Ok(Identity::System {
            scope: KeyScope::Module(ty.name.clone()),
        });
    }
    Err(ApiError(Error::Forbidden("invalid api key".to_string())))
}

/// Session fallback: standard CSRF validation applies here (unless the
/// path is excepted), because this is the only path a cookie-bearing
/// cross-site request can take.
async fn resolve_session(
    state: &AppState,
    headers: &HeaderMap,
    method: &Method,
    csrf_exempt: bool,
) -> Result<RequestContext, ApiError> {
    let anonymous = RequestContext {
        identity: Identity::Anonymous,
        csrf_exempt,
    };
    let Some(sid) = session_cookie(headers) else {
        return Ok(anonymous);
    };
    let Some(session) = state.sessions.get(&sid).await else {
        return Ok(anonymous);
    };

    let safe = matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS);
    if !csrf_exempt && !safe {
        let presented = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok());
        if presented != Some(session.csrf_token.as_str()) {
            return Err(ApiError(Error::Forbidden("csrf".to_string())));
        }
    }

    let Some(user) = state.users.get(&session.user_id).await else {
        return Ok(anonymous);
    };
    debug!(user_id = %user.id, "authenticated via session");
    Ok(RequestContext {
        identity: Identity::User {
            id: user.id,
            username: user.username,
            permissions: user.permissions,
        },
        csrf_exempt,
    })
}

/// The session id from the `corpus-session` cookie, if present.
pub(crate) fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("cookie")?.to_str().ok()?;
    let prefix = format!("{SESSION_COOKIE}=");
    raw.split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .map(str::to_string)
}

/// `Authorization: Bearer <token>` (scheme case-insensitive) or the
/// `bearer` query parameter.
pub(crate) fn extract_bearer(headers: &HeaderMap, query: &[(String, String)]) -> Option<String> {
    if let Some((scheme, value)) = authorization(headers) {
        if scheme.eq_ignore_ascii_case("bearer") {
            return Some(value);
        }
    }
    query_param(query, "bearer")
}

/// `Authorization: ApiKey <key>` / `Api-Key <key>` (scheme
/// case-insensitive), else the `apikey` / `apiKey` query parameters. The
/// header wins when both channels are supplied.
fn extract_api_key(headers: &HeaderMap, query: &[(String, String)]) -> Option<String> {
    if let Some((scheme, value)) = authorization(headers) {
        if scheme.eq_ignore_ascii_case("apikey") || scheme.eq_ignore_ascii_case("api-key") {
            return Some(value);
        }
    }
    query_param(query, "apikey").or_else(|| query_param(query, "apiKey"))
}

fn authorization(headers: &HeaderMap) -> Option<(String, String)> {
    let raw = headers.get("authorization")?.to_str().ok()?;
    let (scheme, value) = raw.trim().split_once(' ')?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some((scheme.to_string(), value.to_string()))
}

fn query_param(query: &[(String, String)], name: &str) -> Option<String> {
    query
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
}

pub fn parse_query(raw: Option<&str>) -> Vec<(String, String)> {
    raw.unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}
