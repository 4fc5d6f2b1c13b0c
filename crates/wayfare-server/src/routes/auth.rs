//! Sign-in, sign-out and admin account removal

use crate::{
    AppState,
    auth::{BearerToken, removal_cookie, session_cookie},
    error::{ApiError, Result},
    models::{ApiResponse, DeleteAdminRequest, LoginRequest},
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    response::IntoResponse,
    routing::post,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};
use wayfare_backend::Session;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/delete-admin-user", post(delete_admin_user))
}

/// Check credentials and set the `auth` cookie
///
/// Only accounts with an admin record can sign in to the back office.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let session: Session = state
        .backend
        .admins
        .sign_in(&request.email, &request.password)
        .await
        .map_err(|e| {
            warn!("Failed sign-in for {}: {}", request.email, e);
            e
        })?;
    state.backend.admins.authorize(&session.token).await?;

    info!("{} signed in", session.email);
    let jar = jar.add(session_cookie(&session));
    Ok((jar, Json(ApiResponse::new(session))))
}

async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(removal_cookie()),
        Json(ApiResponse::with_message((), "Signed out".to_string())),
    )
}

/// Remove another admin's identity and record
///
/// Bearer token only. 401 without a valid token, 403 for non-superadmins,
/// 400 for a missing uid or the caller's own uid, 500 for anything else.
async fn delete_admin_user(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let caller = state
        .backend
        .admins
        .authorize_superadmin(&token)
        .await
        .map_err(|e| ApiError::from(e).opaque())?;

    let request: DeleteAdminRequest = if body.is_empty() {
        DeleteAdminRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|_| ApiError::bad_request("Body must be JSON with a uid"))?
    };

    state
        .backend
        .admins
        .remove(&caller, &request.uid)
        .await
        .map_err(|e| ApiError::from(e).opaque())?;

    Ok(Json(ApiResponse::with_message(
        serde_json::json!({ "uid": request.uid.trim() }),
        "Admin removed".to_string(),
    )))
}
