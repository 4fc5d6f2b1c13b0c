//! Session tokens at the HTTP edge
//!
//! A token arrives either as a bearer header (API clients) or in the `auth`
//! cookie set at login (the back office pages).

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{
    TypedHeader,
    extract::cookie::{Cookie, CookieJar, SameSite},
    headers::{Authorization, authorization::Bearer},
};
use tracing::debug;
use wayfare::AdminAccount;
use wayfare_backend::Session;

use crate::{AppState, error::ApiError};

/// Session cookie name
pub const AUTH_COOKIE: &str = "auth";

/// Token from the `Authorization: Bearer` header only
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthorized("Missing bearer token".to_string()))?;
        Ok(Self(bearer.token().to_string()))
    }
}

/// Token from the bearer header, falling back to the `auth` cookie
async fn session_token<S: Send + Sync>(parts: &mut Parts, state: &S) -> Option<String> {
    if let Ok(BearerToken(token)) = BearerToken::from_request_parts(parts, state).await {
        return Some(token);
    }
    let jar = CookieJar::from_request_parts(parts, state).await.ok()?;
    jar.get(AUTH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// The authenticated administrator making the request
pub struct AdminCaller(pub AdminAccount);

impl FromRequestParts<AppState> for AdminCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts, state)
            .await
            .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;
        let admin = state.backend.admins.authorize(&token).await?;
        debug!("Authorized {} ({})", admin.email, admin.role.as_str());
        Ok(Self(admin))
    }
}

/// Cookie carrying a fresh session
pub fn session_cookie(session: &Session) -> Cookie<'static> {
    let max_age = session.expires_at - time::OffsetDateTime::now_utc();
    Cookie::build((AUTH_COOKIE, session.token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

/// Cookie that clears the session
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, "")).path("/").build()
}

fn is_admin_page(path: &str) -> bool {
    path == "/admin" || path.starts_with("/admin/")
}

/// Redirects for the back office pages, based only on the `auth` cookie
///
/// Visitors without a session are sent from `/admin*` to the login page;
/// visitors with one are sent from `/login` to the dashboard. API routes
/// check their tokens themselves.
pub async fn route_guard(jar: CookieJar, request: Request, next: Next) -> Response {
    let signed_in = jar
        .get(AUTH_COOKIE)
        .is_some_and(|cookie| !cookie.value().is_empty());
    let path = request.uri().path();

    if is_admin_page(path) && !signed_in {
        let target = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or(path);
        debug!("No session for {}, redirecting to login", target);
        return Redirect::to(&format!("/login?next={}", urlencoding::encode(target)))
            .into_response();
    }
    if path == "/login" && signed_in {
        return Redirect::to("/admin").into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_page_matching() {
        assert!(is_admin_page("/admin"));
        assert!(is_admin_page("/admin/services"));
        assert!(!is_admin_page("/administrator"));
        assert!(!is_admin_page("/api/admin/services"));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let session = Session {
            uid: "u1".to_string(),
            email: "a@example.com".to_string(),
            token: "tok".to_string(),
            expires_at: time::OffsetDateTime::now_utc() + time::Duration::hours(1),
        };
        let cookie = session_cookie(&session);
        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
