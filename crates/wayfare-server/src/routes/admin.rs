//! Back office routes
//!
//! Every handler takes an [`AdminCaller`], so each route needs a verified
//! token belonging to an admin record. Forms are validated before any write.

use crate::{
    AppState,
    auth::AdminCaller,
    error::{ApiError, Result},
    models::{ApiResponse, FlagRequest},
    routes::{events, parse_category},
    worker::WriteJob,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, info};
use wayfare::{
    AdminAccount, AdminForm, Category, EmailTemplate, EmailTemplateKind, Inquiry, Reservation,
    Review, ReviewForm, Service, ServiceForm, SettingsOverride, SettingsSnapshot, StagedEdit,
    StagedList, Validate, new_id,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/events", get(events::admin_events_ws))
        // Services
        .route(
            "/services/{category}",
            get(list_services).post(create_service).put(replace_services),
        )
        .route("/services/{category}/stage", post(stage_services))
        .route(
            "/services/{category}/{id}",
            get(get_service).put(update_service).delete(delete_service),
        )
        .route("/services/{category}/{id}/active", patch(set_active))
        .route("/services/{category}/{id}/best-offer", patch(set_best_offer))
        // Categories
        .route("/categories", get(list_categories).put(replace_categories))
        .route("/categories/stage", post(stage_categories))
        // Reviews
        .route("/reviews", get(list_reviews).post(create_review))
        .route("/reviews/{id}", put(update_review).delete(delete_review))
        // Settings and templates
        .route("/settings", get(get_settings).put(save_settings))
        .route(
            "/email-template",
            get(get_admin_template).put(save_admin_template),
        )
        .route(
            "/client-email-template",
            get(get_client_template).put(save_client_template),
        )
        // Submissions
        .route("/inquiries", get(list_inquiries))
        .route("/reservations", get(list_reservations))
        // Admin accounts
        .route("/admins", get(list_admins).post(add_admin))
        .route("/admins/{uid}/promote", post(promote_admin))
        .route("/admins/{uid}", delete(remove_admin))
}

async fn me(AdminCaller(admin): AdminCaller) -> Json<ApiResponse<AdminAccount>> {
    Json(ApiResponse::new(admin))
}

// Services

async fn list_services(
    State(state): State<AppState>,
    AdminCaller(_): AdminCaller,
    Path(category): Path<String>,
) -> Result<Json<ApiResponse<Vec<Service>>>> {
    let category = parse_category(&category)?;
    let services = state.backend.datastore.services(category).await?;
    Ok(Json(ApiResponse::new(services)))
}

async fn create_service(
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
    Path(category): Path<String>,
    Json(form): Json<ServiceForm>,
) -> Result<impl IntoResponse> {
    let category = parse_category(&category)?;
    if form.category != category {
        return Err(ApiError::bad_request("Service category does not match the path"));
    }
    form.validate()?;

    let service = form.into_service(new_id());
    state.backend.datastore.save_service(&service).await?;

    info!("{} created service {} ({})", admin.email, service.name, service.id);
    Ok((StatusCode::CREATED, Json(ApiResponse::new(service))))
}

/// "Save all": overwrite the whole category
async fn replace_services(
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
    Path(category): Path<String>,
    Json(services): Json<Vec<Service>>,
) -> Result<Json<ApiResponse<Vec<Service>>>> {
    let category = parse_category(&category)?;
    state
        .backend
        .datastore
        .replace_services(category, services.clone())
        .await?;

    info!("{} saved {} {} services", admin.email, services.len(), category);
    Ok(Json(ApiResponse::new(services)))
}

/// Apply local edits (duplicate, remove, upsert) to the saved list and
/// commit the result in one write
async fn stage_services(
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
    Path(category): Path<String>,
    Json(edits): Json<Vec<StagedEdit<Service>>>,
) -> Result<Json<ApiResponse<Vec<Service>>>> {
    let category = parse_category(&category)?;
    let datastore = &state.backend.datastore;

    let mut staged = StagedList::new(datastore.services(category).await?);
    let edit_count = edits.len();
    for edit in edits {
        staged.apply(edit)?;
    }
    if !staged.is_dirty() {
        return Ok(Json(ApiResponse::new(staged.items().to_vec())));
    }
    let services = staged.commit()?;
    datastore.replace_services(category, services.clone()).await?;

    info!("{} committed {} edits to {}", admin.email, edit_count, category);
    Ok(Json(ApiResponse::new(services)))
}

async fn get_service(
    State(state): State<AppState>,
    AdminCaller(_): AdminCaller,
    Path((category, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Service>>> {
    let category = parse_category(&category)?;
    let service = state.backend.datastore.service(category, &id).await?;
    Ok(Json(ApiResponse::new(service)))
}

async fn update_service(
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
    Path((category, id)): Path<(String, String)>,
    Json(form): Json<ServiceForm>,
) -> Result<Json<ApiResponse<Service>>> {
    let category = parse_category(&category)?;
    if form.category != category {
        return Err(ApiError::bad_request("Service category does not match the path"));
    }
    form.validate()?;

    let datastore = &state.backend.datastore;
    datastore.service(category, &id).await?;
    let service = form.into_service(id);
    datastore.save_service(&service).await?;

    info!("{} updated service {}", admin.email, service.id);
    Ok(Json(ApiResponse::new(service)))
}

/// Hard delete
async fn delete_service(
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
    Path((category, id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let category = parse_category(&category)?;
    state.backend.datastore.delete_service(category, &id).await?;

    info!("{} deleted service {}", admin.email, id);
    Ok(StatusCode::NO_CONTENT)
}

/// Queue a flag write and answer with the service as it will look
async fn enqueue_flag(
    state: &AppState,
    category: &str,
    id: String,
    job: impl FnOnce(wayfare::ServiceCategory, String) -> WriteJob,
) -> Result<(StatusCode, Json<ApiResponse<Service>>)> {
    let category = parse_category(category)?;
    let service = state.backend.datastore.service(category, &id).await?;

    let job = job(category, id);
    let projected = job.project(service);
    state
        .job_sender
        .send(job)
        .map_err(|_| ApiError::internal("Write queue is closed"))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::with_message(
            projected,
            "Change queued".to_string(),
        )),
    ))
}

async fn set_active(
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
    Path((category, id)): Path<(String, String)>,
    Json(flag): Json<FlagRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Service>>)> {
    debug!("{} sets active={} on {}", admin.email, flag.value, id);
    enqueue_flag(&state, &category, id, |category, id| WriteJob::SetActive {
        category,
        id,
        value: flag.value,
    })
    .await
}

async fn set_best_offer(
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
    Path((category, id)): Path<(String, String)>,
    Json(flag): Json<FlagRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Service>>)> {
    debug!("{} sets best_offer={} on {}", admin.email, flag.value, id);
    enqueue_flag(&state, &category, id, |category, id| WriteJob::SetBestOffer {
        category,
        id,
        value: flag.value,
    })
    .await
}

// Categories

/// Every category, enabled or not
async fn list_categories(
    State(state): State<AppState>,
    AdminCaller(_): AdminCaller,
) -> Json<ApiResponse<Vec<Category>>> {
    let settings = state.backend.datastore.settings().await.settings;
    Json(ApiResponse::new(settings.categories))
}

async fn replace_categories(
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
    Json(categories): Json<Vec<Category>>,
) -> Result<Json<ApiResponse<Vec<Category>>>> {
    state
        .backend
        .datastore
        .save_categories(categories.clone())
        .await?;

    info!("{} saved {} categories", admin.email, categories.len());
    Ok(Json(ApiResponse::new(categories)))
}

async fn stage_categories(
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
    Json(edits): Json<Vec<StagedEdit<Category>>>,
) -> Result<Json<ApiResponse<Vec<Category>>>> {
    let datastore = &state.backend.datastore;
    let mut staged = StagedList::new(datastore.settings().await.settings.categories);
    for edit in edits {
        staged.apply(edit)?;
    }
    if !staged.is_dirty() {
        return Ok(Json(ApiResponse::new(staged.items().to_vec())));
    }
    let categories = staged.commit()?;
    datastore.save_categories(categories.clone()).await?;

    info!("{} committed category edits", admin.email);
    Ok(Json(ApiResponse::new(categories)))
}

// Reviews

async fn list_reviews(
    State(state): State<AppState>,
    AdminCaller(_): AdminCaller,
) -> Result<Json<ApiResponse<Vec<Review>>>> {
    let reviews = state.backend.datastore.reviews(None).await?;
    Ok(Json(ApiResponse::new(reviews)))
}

async fn create_review(
    State(state): State<AppState>,
    AdminCaller(_): AdminCaller,
    Json(form): Json<ReviewForm>,
) -> Result<impl IntoResponse> {
    form.validate()?;
    let datastore = &state.backend.datastore;
    datastore.find_service(&form.service_id).await?;

    let review = form.into_review(new_id(), OffsetDateTime::now_utc());
    datastore.save_review(&review).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(review))))
}

async fn update_review(
    State(state): State<AppState>,
    AdminCaller(_): AdminCaller,
    Path(id): Path<String>,
    Json(form): Json<ReviewForm>,
) -> Result<Json<ApiResponse<Review>>> {
    form.validate()?;
    let datastore = &state.backend.datastore;
    let existing = datastore
        .reviews(None)
        .await?
        .into_iter()
        .find(|review| review.id == id)
        .ok_or_else(|| ApiError::not_found(&format!("Review {}", id)))?;

    let review = form.into_review(existing.id, existing.created_at);
    datastore.save_review(&review).await?;
    Ok(Json(ApiResponse::new(review)))
}

async fn delete_review(
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.backend.datastore.delete_review(&id).await?;
    info!("{} deleted review {}", admin.email, id);
    Ok(StatusCode::NO_CONTENT)
}

// Settings and templates

async fn get_settings(
    State(state): State<AppState>,
    AdminCaller(_): AdminCaller,
) -> Json<ApiResponse<SettingsSnapshot>> {
    Json(ApiResponse::new(state.backend.datastore.settings().await))
}

/// Overwrite the settings document
async fn save_settings(
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
    Json(overrides): Json<SettingsOverride>,
) -> Result<Json<ApiResponse<SettingsSnapshot>>> {
    state.backend.datastore.save_settings(&overrides).await?;
    info!("{} saved settings", admin.email);
    Ok(Json(ApiResponse::new(SettingsSnapshot::resolved(Some(
        &overrides,
    )))))
}

#[derive(Debug, Deserialize)]
struct TemplateBody {
    subject: String,
    html: String,
}

async fn load_template(state: &AppState, kind: EmailTemplateKind) -> Result<EmailTemplate> {
    Ok(state.backend.datastore.email_template(kind).await?)
}

async fn store_template(
    state: &AppState,
    admin: &AdminAccount,
    kind: EmailTemplateKind,
    body: TemplateBody,
) -> Result<EmailTemplate> {
    let template = state
        .backend
        .datastore
        .save_email_template(EmailTemplate {
            kind,
            subject: body.subject,
            html: body.html,
            updated_at: None,
        })
        .await?;
    info!("{} saved the {} template", admin.email, kind);
    Ok(template)
}

async fn get_admin_template(
    State(state): State<AppState>,
    AdminCaller(_): AdminCaller,
) -> Result<Json<ApiResponse<EmailTemplate>>> {
    let template = load_template(&state, EmailTemplateKind::AdminNotification).await?;
    Ok(Json(ApiResponse::new(template)))
}

async fn save_admin_template(
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
    Json(body): Json<TemplateBody>,
) -> Result<Json<ApiResponse<EmailTemplate>>> {
    let template =
        store_template(&state, &admin, EmailTemplateKind::AdminNotification, body).await?;
    Ok(Json(ApiResponse::new(template)))
}

async fn get_client_template(
    State(state): State<AppState>,
    AdminCaller(_): AdminCaller,
) -> Result<Json<ApiResponse<EmailTemplate>>> {
    let template = load_template(&state, EmailTemplateKind::ClientConfirmation).await?;
    Ok(Json(ApiResponse::new(template)))
}

async fn save_client_template(
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
    Json(body): Json<TemplateBody>,
) -> Result<Json<ApiResponse<EmailTemplate>>> {
    let template =
        store_template(&state, &admin, EmailTemplateKind::ClientConfirmation, body).await?;
    Ok(Json(ApiResponse::new(template)))
}

// Submissions

async fn list_inquiries(
    State(state): State<AppState>,
    AdminCaller(_): AdminCaller,
) -> Result<Json<ApiResponse<Vec<Inquiry>>>> {
    let inquiries = state.backend.datastore.inquiries().await?;
    Ok(Json(ApiResponse::new(inquiries)))
}

async fn list_reservations(
    State(state): State<AppState>,
    AdminCaller(_): AdminCaller,
) -> Result<Json<ApiResponse<Vec<Reservation>>>> {
    let reservations = state.backend.datastore.reservations().await?;
    Ok(Json(ApiResponse::new(reservations)))
}

// Admin accounts

async fn list_admins(
    State(state): State<AppState>,
    AdminCaller(_): AdminCaller,
) -> Result<Json<ApiResponse<Vec<AdminAccount>>>> {
    let admins = state.backend.admins.list().await?;
    Ok(Json(ApiResponse::new(admins)))
}

async fn add_admin(
    State(state): State<AppState>,
    AdminCaller(caller): AdminCaller,
    Json(form): Json<AdminForm>,
) -> Result<impl IntoResponse> {
    let admin = state.backend.admins.add(&caller, form).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(admin))))
}

async fn promote_admin(
    State(state): State<AppState>,
    AdminCaller(caller): AdminCaller,
    Path(uid): Path<String>,
) -> Result<Json<ApiResponse<AdminAccount>>> {
    let admin = state.backend.admins.promote(&caller, &uid).await?;
    Ok(Json(ApiResponse::new(admin)))
}

async fn remove_admin(
    State(state): State<AppState>,
    AdminCaller(caller): AdminCaller,
    Path(uid): Path<String>,
) -> Result<StatusCode> {
    state.backend.admins.remove(&caller, &uid).await?;
    Ok(StatusCode::NO_CONTENT)
}
