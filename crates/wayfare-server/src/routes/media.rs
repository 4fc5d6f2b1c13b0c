//! Media library routes

use crate::{
    AppState,
    auth::AdminCaller,
    error::{ApiError, Result},
    models::{ApiResponse, DeleteMediaRequest, UploadRequest},
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::info;
use wayfare_backend::{MediaAsset, MediaLibrary, MediaStatus, Upload};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_media))
        .route("/upload", post(upload_media))
        .route("/delete", post(delete_media))
        .route("/status", get(media_status))
}

fn library(state: &AppState) -> Result<&MediaLibrary> {
    state.backend.media.as_ref().ok_or(ApiError::MediaDisabled)
}

async fn list_media(
    State(state): State<AppState>,
    AdminCaller(_): AdminCaller,
) -> Result<Json<ApiResponse<Vec<MediaAsset>>>> {
    let assets = library(&state)?.list().await?;
    Ok(Json(ApiResponse::new(assets)))
}

async fn upload_media(
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
    Json(request): Json<UploadRequest>,
) -> Result<impl IntoResponse> {
    let library = library(&state)?;

    // Accept data URLs as well as bare base64
    let payload = match request.data.split_once(";base64,") {
        Some((_, data)) => data,
        None => request.data.as_str(),
    };
    let data = STANDARD
        .decode(payload.trim())
        .map_err(|_| ApiError::bad_request("File data must be base64 encoded"))?;

    let asset = library
        .upload(Upload {
            filename: request.filename,
            content_type: request.content_type,
            data,
        })
        .await?;

    info!("{} uploaded {}", admin.email, asset.public_id);
    Ok((StatusCode::CREATED, Json(ApiResponse::new(asset))))
}

async fn delete_media(
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
    Json(request): Json<DeleteMediaRequest>,
) -> Result<Json<ApiResponse<()>>> {
    library(&state)?.delete(&request.public_id).await?;

    info!("{} deleted {}", admin.email, request.public_id);
    Ok(Json(ApiResponse::with_message(
        (),
        format!("Deleted {}", request.public_id),
    )))
}

/// Whether the library is configured; never fails when it is not
async fn media_status(State(state): State<AppState>) -> Result<Json<ApiResponse<MediaStatus>>> {
    let status = match &state.backend.media {
        Some(library) => library.status().await?,
        None => MediaStatus {
            enabled: false,
            assets: 0,
        },
    };
    Ok(Json(ApiResponse::new(status)))
}
