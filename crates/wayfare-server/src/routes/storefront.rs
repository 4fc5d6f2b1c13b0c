//! Public storefront routes: settings, catalog, reviews, transport quotes

use crate::{
    AppState,
    error::{ApiError, Result},
    models::{ApiResponse, CatalogQuery, FeatureFlags, QuoteQuery, ReviewQuery},
    routes::parse_category,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use tracing::debug;
use wayfare::{
    CatalogView, Category, EmailTemplate, EmailTemplateKind, Review, RouteQuote, Service,
    SettingsSnapshot, best_offers, catalog::filter_catalog, pricing,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/features", get(get_features))
        .route("/email-template", get(get_admin_template))
        .route("/client-email-template", get(get_client_template))
        .route("/categories", get(list_categories))
        .route("/catalog/{category}", get(get_catalog))
        .route("/best-offers", get(list_best_offers))
        .route("/services/{category}/{id}", get(get_service))
        .route("/reviews", get(list_reviews))
        .route("/transport/quote", get(get_quote))
        .route("/transport/places", get(list_places))
}

/// Effective settings; a failed read serves the defaults
async fn get_settings(State(state): State<AppState>) -> Json<ApiResponse<SettingsSnapshot>> {
    Json(ApiResponse::new(state.backend.datastore.settings().await))
}

async fn get_features(State(state): State<AppState>) -> Json<ApiResponse<FeatureFlags>> {
    let config = &state.config;
    Json(ApiResponse::new(FeatureFlags {
        media_library: state.backend.media.is_some(),
        email: config.mail.enabled(),
        payments: config.payments.enabled(),
        payment_publishable_key: config.payments.publishable_key.clone(),
    }))
}

async fn get_admin_template(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<EmailTemplate>>> {
    let template = state
        .backend
        .datastore
        .email_template(EmailTemplateKind::AdminNotification)
        .await?;
    Ok(Json(ApiResponse::new(template)))
}

async fn get_client_template(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<EmailTemplate>>> {
    let template = state
        .backend
        .datastore
        .email_template(EmailTemplateKind::ClientConfirmation)
        .await?;
    Ok(Json(ApiResponse::new(template)))
}

/// Enabled categories, in display order
async fn list_categories(State(state): State<AppState>) -> Json<ApiResponse<Vec<Category>>> {
    let settings = state.backend.datastore.settings().await.settings;
    let categories = settings.enabled_categories().cloned().collect();
    Json(ApiResponse::new(categories))
}

async fn get_catalog(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<ApiResponse<CatalogView>>> {
    let category = parse_category(&category)?;
    debug!("Catalog for {} with {:?}", category, query);

    let settings = state.backend.datastore.settings().await.settings;
    let records = state.backend.datastore.services(category).await?;
    let view = filter_catalog(&settings, category, &records, &query.into());

    Ok(Json(match view.empty_state {
        Some(empty) => ApiResponse::with_message(view, empty.message().to_string()),
        None => ApiResponse::new(view),
    }))
}

async fn list_best_offers(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Service>>>> {
    let settings = state.backend.datastore.settings().await.settings;
    let services = state.backend.datastore.all_services().await?;
    Ok(Json(ApiResponse::new(best_offers(&settings, &services))))
}

/// One service as shown on its detail page; inactive services are hidden
async fn get_service(
    State(state): State<AppState>,
    Path((category, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Service>>> {
    let category = parse_category(&category)?;
    let service = state.backend.datastore.service(category, &id).await?;
    if !service.active {
        return Err(ApiError::not_found(&format!("Service {}", id)));
    }
    Ok(Json(ApiResponse::new(service)))
}

async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewQuery>,
) -> Result<Json<ApiResponse<Vec<Review>>>> {
    let reviews = state
        .backend
        .datastore
        .reviews(query.service_id.as_deref())
        .await?;
    Ok(Json(ApiResponse::new(reviews)))
}

async fn get_quote(Query(query): Query<QuoteQuery>) -> Result<Json<ApiResponse<RouteQuote>>> {
    pricing::quote(&query.origin, &query.destination, query.passengers)
        .map(|quote| Json(ApiResponse::new(quote)))
        .ok_or_else(|| {
            ApiError::not_found(&format!("Route {} - {}", query.origin, query.destination))
        })
}

async fn list_places() -> Json<ApiResponse<Vec<&'static str>>> {
    Json(ApiResponse::new(pricing::places()))
}
