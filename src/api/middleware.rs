use std::{collections::HashSet, sync::Arc};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::ApiError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Admin bearer tokens, from `ADMIN_API_KEYS`.
#[derive(Debug, Clone)]
pub struct AuthState {
    admin_keys: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// In development, no keys disables admin auth for local iteration.
    /// Outside development, no keys fails startup.
    pub fn new(keys: &[String], is_development: bool) -> anyhow::Result<Self> {
        let keys: HashSet<String> = keys.iter().filter(|k| !k.is_empty()).cloned().collect();
        if keys.is_empty() {
            if is_development {
                tracing::warn!("ADMIN_API_KEYS not set; admin auth disabled in development environment");
                return Ok(Self { admin_keys: Arc::new(HashSet::new()), enabled: false });
            }
            anyhow::bail!("ADMIN_API_KEYS is required outside development; provide comma-separated bearer tokens");
        }
        Ok(Self { admin_keys: Arc::new(keys), enabled: true })
    }

    pub fn allows(&self, token: Option<&str>) -> bool {
        !self.enabled || token.is_some_and(|t| self.admin_keys.contains(t))
    }
}

/// Extracts or generates a request ID, stores it as an extension and echoes it
/// in the `x-request-id` response header.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// A signed-in shopper. The bearer token comes from the identity provider and is
/// passed through as-is.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_bearer_token(parts.headers.get(AUTHORIZATION))
            .map(|token| Session { token: token.to_string() })
            .ok_or_else(|| ApiError::new("unauthorized", "missing or invalid bearer token"))
    }
}

/// Guard for admin-only handlers.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthState::from_ref(state);
        if auth.allows(extract_bearer_token(parts.headers.get(AUTHORIZATION))) {
            Ok(AdminSession)
        } else {
            Err(ApiError::new("unauthorized", "admin access requires a valid bearer token"))
        }
    }
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
        assert_eq!(extract_bearer_token(Some(&HeaderValue::from_static("Bearer   "))), None);
    }

    #[test]
    fn auth_state_disables_when_no_keys_in_dev() {
        let state = AuthState::new(&[], true).unwrap();
        assert!(!state.enabled);
        assert!(state.allows(None));
    }

    #[test]
    fn auth_state_requires_keys_outside_dev() {
        assert!(AuthState::new(&[], false).is_err());
        let state = AuthState::new(&["secret".to_string()], false).unwrap();
        assert!(state.allows(Some("secret")));
        assert!(!state.allows(Some("guess")));
        assert!(!state.allows(None));
    }
}
