use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::admin::session::Role;
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// Extension placed on requests that passed admin authentication.
#[derive(Debug, Clone, Copy)]
pub struct AdminContext {
    pub role: Role,
}

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let role = session_token(request.headers(), &state.config.auth.cookie_name)
        .and_then(|token| state.sessions.verify(&token));

    match role {
        Some(role) => {
            request.extensions_mut().insert(AdminContext { role });
            next.run(request).await
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "Admin request rejected");
            ApiError::Unauthorized.into_response()
        }
    }
}

/// Bearer header first, then the session cookie.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value for a freshly issued token.
pub fn session_cookie(name: &str, token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!("{name}={token}; HttpOnly; Path=/; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; SameSite=None; Secure");
    } else {
        cookie.push_str("; SameSite=Lax");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie.
pub fn cleared_cookie(name: &str, secure: bool) -> String {
    session_cookie(name, "", 0, secure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("session=xyz"));
        assert_eq!(session_token(&headers, "session").as_deref(), Some("abc"));
    }

    #[test]
    fn test_cookie_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=xyz; other=1"));
        assert_eq!(session_token(&headers, "session").as_deref(), Some("xyz"));
        assert_eq!(session_token(&headers, "sid"), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert_eq!(session_token(&headers, "session").as_deref(), Some("xyz"));
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("session", "t", 3600, true);
        assert_eq!(cookie, "session=t; HttpOnly; Path=/; Max-Age=3600; SameSite=None; Secure");
        assert!(cleared_cookie("session", false).contains("Max-Age=0"));
    }
}
