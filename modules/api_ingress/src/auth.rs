//! Bearer-token verification. Issuance lives elsewhere; this layer only checks
//! the HS256 signature and expiry and turns the `id` claim into a `SecurityCtx`.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, Validation};
use modkit::{forbidden, unauthorized, SecurityCtx};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AuthConfig;

/// Claims the issuer puts into every access token.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    /// User id.
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Token is missing")]
    Missing,
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let problem = match self {
            AuthError::Missing | AuthError::Expired => unauthorized(self.to_string()),
            AuthError::Invalid => forbidden(self.to_string()),
        };
        problem.into_response()
    }
}

/// Shared state of the authentication middleware.
#[derive(Clone)]
pub struct Authenticator {
    key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    cookie_name: Arc<str>,
}

impl Authenticator {
    pub fn new(cfg: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = 0;
        Self {
            key: Arc::new(DecodingKey::from_secret(cfg.jwt_secret.as_bytes())),
            validation: Arc::new(validation),
            cookie_name: Arc::from(cfg.cookie_name.as_str()),
        }
    }

    pub fn verify(&self, token: &str) -> Result<AccessClaims, AuthError> {
        jsonwebtoken::decode::<AccessClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid,
            })
    }

    /// Authorization header first (`Bearer <t>`, bare `<t>`, optionally quoted),
    /// then the token cookie (raw or JSON `{"accessToken"|"token": ...}`).
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        if let Some(raw) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        {
            let raw = raw.strip_prefix("Bearer ").unwrap_or(raw);
            let cleaned = strip_quotes(raw.trim());
            if !cleaned.is_empty() {
                return Some(cleaned.to_string());
            }
        }

        let cookie = cookie_value(headers, &self.cookie_name)?;
        token_from_cookie(cookie)
    }
}

fn strip_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CookieTokens {
    access_token: Option<String>,
    token: Option<String>,
}

fn token_from_cookie(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str::<CookieTokens>(raw) {
        Ok(parsed) => parsed.access_token.or(parsed.token).filter(|t| !t.is_empty()),
        Err(_) => Some(strip_quotes(raw).to_string()).filter(|t| !t.is_empty()),
    }
}

/// Middleware: rejects the request or forwards it with a `SecurityCtx` extension.
pub async fn authenticate(
    State(auth): State<Authenticator>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = auth.token_from_headers(req.headers()) else {
        tracing::debug!(path = %req.uri().path(), "request without token");
        return AuthError::Missing.into_response();
    };

    match auth.verify(&token) {
        Ok(claims) => {
            tracing::Span::current().record("user_id", tracing::field::display(claims.id));
            req.extensions_mut().insert(SecurityCtx::new(claims.id));
            next.run(req).await
        }
        Err(e) => {
            tracing::info!(path = %req.uri().path(), error = %e, "token rejected");
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn auth() -> Authenticator {
        Authenticator::new(&AuthConfig {
            jwt_secret: "unit-secret".to_string(),
            cookie_name: "tokens".to_string(),
        })
    }

    fn headers(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(name, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn authorization_header_variants() {
        let a = auth();
        for raw in ["Bearer abc.def.ghi", "abc.def.ghi", "Bearer \"abc.def.ghi\"", "\"abc.def.ghi\""] {
            let h = headers(header::AUTHORIZATION, raw);
            assert_eq!(a.token_from_headers(&h).as_deref(), Some("abc.def.ghi"), "{raw}");
        }
    }

    #[test]
    fn cookie_variants() {
        let a = auth();
        let h = headers(header::COOKIE, "theme=dark; tokens=abc.def.ghi");
        assert_eq!(a.token_from_headers(&h).as_deref(), Some("abc.def.ghi"));

        let h = headers(header::COOKIE, r#"tokens={"accessToken":"from.json.cookie"}"#);
        assert_eq!(a.token_from_headers(&h).as_deref(), Some("from.json.cookie"));

        let h = headers(header::COOKIE, r#"tokens={"token":"legacy.json.cookie"}"#);
        assert_eq!(a.token_from_headers(&h).as_deref(), Some("legacy.json.cookie"));

        let h = headers(header::COOKIE, "other=1");
        assert_eq!(a.token_from_headers(&h), None);
    }

    #[test]
    fn header_wins_over_cookie() {
        let a = auth();
        let mut h = headers(header::AUTHORIZATION, "Bearer from.header.tok");
        h.insert(header::COOKIE, HeaderValue::from_static("tokens=from.cookie.tok"));
        assert_eq!(a.token_from_headers(&h).as_deref(), Some("from.header.tok"));
    }

    #[test]
    fn garbage_token_is_invalid() {
        assert_eq!(auth().verify("not-a-jwt").unwrap_err(), AuthError::Invalid);
    }
}
