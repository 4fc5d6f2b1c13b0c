//! Common API types and request payloads

use serde::{Deserialize, Serialize};
use wayfare::{CatalogFilter, CatalogSort, PriceRange, SeatRange};

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: String) -> Self {
        Self {
            data,
            message: Some(message),
        }
    }
}

/// Filter selections on a category page
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub price: PriceRange,
    #[serde(default)]
    pub seats: SeatRange,
    pub city: Option<String>,
    #[serde(default)]
    pub sort: CatalogSort,
}

impl From<CatalogQuery> for CatalogFilter {
    fn from(query: CatalogQuery) -> Self {
        CatalogFilter {
            price: query.price,
            seats: query.seats,
            city: query.city,
            sort: query.sort,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub origin: String,
    pub destination: String,
    pub passengers: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewQuery {
    pub service_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Media upload; the file travels base64 encoded
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub filename: Option<String>,
    pub content_type: String,
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMediaRequest {
    pub public_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteAdminRequest {
    #[serde(default)]
    pub uid: String,
}

/// New value of a boolean service flag
#[derive(Debug, Deserialize)]
pub struct FlagRequest {
    pub value: bool,
}

/// Optional integrations the storefront can switch on
#[derive(Debug, Clone, Serialize)]
pub struct FeatureFlags {
    pub media_library: bool,
    pub email: bool,
    pub payments: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_publishable_key: Option<String>,
}
