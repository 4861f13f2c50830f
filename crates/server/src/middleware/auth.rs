//! Authentication extractors.
//!
//! The caller's access token is taken from, in order:
//! 1. `Authorization: Bearer <token>`
//! 2. the `sb-access-token` cookie
//! 3. the `sb-<project>-auth-token` session cookie (raw JSON, or
//!    `base64-` prefixed JSON, possibly split into `.0`, `.1`, ... chunks)
//!
//! Resolving the token never touches the database; only [`RequireAdmin`]
//! looks up the role on the profile.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use muhan_core::UserId;
use serde::Deserialize;

use crate::db;
use crate::error::{AppError, set_sentry_user};
use crate::services::supabase::AuthUser;
use crate::state::AppState;

const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
const BASE64_PREFIX: &str = "base64-";

/// Session cookie payload. Older clients store a positional array.
#[derive(Deserialize)]
#[serde(untagged)]
enum SessionCookie {
    Object { access_token: String },
    Array(Vec<serde_json::Value>),
}

impl SessionCookie {
    fn into_access_token(self) -> Option<String> {
        match self {
            Self::Object { access_token } => Some(access_token),
            Self::Array(items) => items.into_iter().next().and_then(|v| match v {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            }),
        }
    }
}

fn cookies(headers: &HeaderMap) -> impl Iterator<Item = (&str, &str)> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((name.trim(), value.trim()))
        })
}

fn is_session_cookie(name: &str, project_ref: Option<&str>) -> bool {
    match project_ref {
        Some(r) => name == format!("sb-{r}-auth-token"),
        None => name.starts_with("sb-") && name.ends_with("-auth-token"),
    }
}

/// Reassemble the session cookie value, joining numbered chunks in order.
fn session_cookie_value(headers: &HeaderMap, project_ref: Option<&str>) -> Option<String> {
    let mut whole = None;
    let mut chunks: Vec<(u32, &str)> = Vec::new();

    for (name, value) in cookies(headers) {
        if is_session_cookie(name, project_ref) {
            whole = Some(value.to_owned());
        } else if let Some((base, index)) = name.rsplit_once('.')
            && is_session_cookie(base, project_ref)
            && let Ok(index) = index.parse::<u32>()
        {
            chunks.push((index, value));
        }
    }

    if whole.is_some() {
        return whole;
    }
    if chunks.is_empty() {
        return None;
    }
    chunks.sort_by_key(|(i, _)| *i);
    Some(chunks.into_iter().map(|(_, v)| v).collect())
}

fn decode_session_cookie(value: &str) -> Option<String> {
    let json = if let Some(encoded) = value.strip_prefix(BASE64_PREFIX) {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .or_else(|_| STANDARD.decode(encoded))
            .ok()?;
        String::from_utf8(bytes).ok()?
    } else {
        urlencoding::decode(value).ok()?.into_owned()
    };
    serde_json::from_str::<SessionCookie>(&json)
        .ok()
        .and_then(SessionCookie::into_access_token)
        .filter(|t| !t.is_empty())
}

/// Find the caller's access token in the request headers.
#[must_use]
pub fn access_token_from_headers(headers: &HeaderMap, project_ref: Option<&str>) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_owned());
    }

    if let Some((_, token)) =
        cookies(headers).find(|(name, value)| *name == ACCESS_TOKEN_COOKIE && !value.is_empty())
    {
        return Some(token.to_owned());
    }

    session_cookie_value(headers, project_ref).and_then(|v| decode_session_cookie(&v))
}

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<Option<AuthUser>, AppError> {
    let Some(token) = access_token_from_headers(&parts.headers, state.supabase().project_ref())
    else {
        return Ok(None);
    };
    let user = state.supabase().user_for_token(&token).await?;
    if let Some(user) = &user {
        set_sentry_user(&user.id);
    }
    Ok(user)
}

/// Extractor that requires a signed-in user (401 otherwise).
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> String {
///     user.id.to_string()
/// }
/// ```
pub struct RequireUser(pub AuthUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state)
            .await?
            .map(Self)
            .ok_or(AppError::Unauthorized)
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// An invalid or expired token is treated as anonymous, and so is a token
/// the auth service could not be asked about.
pub struct OptionalUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_user(parts, state).await {
            Ok(user) => Ok(Self(user)),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "could not resolve access token, continuing anonymously"
                );
                Ok(Self(None))
            }
        }
    }
}

/// Extractor that requires the `admin` role (401 without a session, 403 for
/// other users).
pub struct RequireAdmin(pub UserId);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
        let role = db::profiles::role(state.pool(), user.id).await?;
        if !role.is_admin() {
            tracing::warn!(user_id = %user.id, "admin route denied");
            return Err(AppError::Forbidden("관리자 권한이 필요합니다.".to_string()));
        }
        Ok(Self(user.id))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap_or(HeaderValue::from_static("")));
        }
        map
    }

    #[test]
    fn test_bearer_header_wins() {
        let h = headers(&[
            ("authorization", "Bearer header-token"),
            ("cookie", "sb-access-token=cookie-token"),
        ]);
        assert_eq!(access_token_from_headers(&h, None).as_deref(), Some("header-token"));
    }

    #[test]
    fn test_access_token_cookie() {
        let h = headers(&[("cookie", "theme=dark; sb-access-token=cookie-token")]);
        assert_eq!(access_token_from_headers(&h, None).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn test_raw_json_session_cookie() {
        let h = headers(&[(
            "cookie",
            "sb-abcd-auth-token=%7B%22access_token%22%3A%22jwt-1%22%2C%22refresh_token%22%3A%22r%22%7D",
        )]);
        assert_eq!(access_token_from_headers(&h, Some("abcd")).as_deref(), Some("jwt-1"));
    }

    #[test]
    fn test_session_cookie_with_bad_escape_is_ignored() {
        let h = headers(&[("cookie", "sb-abcd-auth-token=%FF%7B%22access_token%22%7D")]);
        assert_eq!(access_token_from_headers(&h, Some("abcd")), None);
    }

    #[test]
    fn test_base64_session_cookie() {
        let encoded = STANDARD.encode(r#"{"access_token":"jwt-2","token_type":"bearer"}"#);
        let cookie = format!("sb-abcd-auth-token=base64-{encoded}");
        let h = headers(&[("cookie", cookie.as_str())]);
        assert_eq!(access_token_from_headers(&h, Some("abcd")).as_deref(), Some("jwt-2"));
    }

    #[test]
    fn test_chunked_session_cookie() {
        let json = r#"["jwt-3","refresh",null,null,null]"#;
        let (a, b) = json.split_at(10);
        let cookie = format!("sb-abcd-auth-token.1={b}; sb-abcd-auth-token.0={a}");
        let h = headers(&[("cookie", cookie.as_str())]);
        assert_eq!(access_token_from_headers(&h, Some("abcd")).as_deref(), Some("jwt-3"));
    }

    #[test]
    fn test_other_project_cookie_ignored() {
        let h = headers(&[("cookie", r#"sb-other-auth-token={"access_token":"x"}"#)]);
        assert_eq!(access_token_from_headers(&h, Some("abcd")), None);
    }

    #[test]
    fn test_no_credentials() {
        assert_eq!(access_token_from_headers(&HeaderMap::new(), None), None);
        let h = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert_eq!(access_token_from_headers(&h, None), None);
    }
}
