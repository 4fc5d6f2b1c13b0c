//! HTTP route handlers

pub mod admin;
pub mod auth;
pub mod booking;
pub mod events;
pub mod media;
pub mod pages;
pub mod storefront;

use std::str::FromStr;
use wayfare::ServiceCategory;

use crate::error::{ApiError, Result};

/// Parse a category path segment
pub(crate) fn parse_category(value: &str) -> Result<ServiceCategory> {
    ServiceCategory::from_str(value).map_err(ApiError::from)
}
