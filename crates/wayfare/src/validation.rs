//! Form validation for storefront and back-office payloads
//!
//! Every payload is checked in full before anything is written, and all
//! problems are reported at once as [`ValidationErrors`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::entities::{AdminRole, Category, MediaItem, PriceUnit, Review, Service, ServiceCategory};
use crate::error::{Result, ValidationErrors};
use crate::settings::{BackgroundImages, SettingsOverride};
use crate::template::EmailTemplate;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid url regex"));

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9 ()\-.]{6,20}$").expect("valid phone regex"));

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

pub fn is_valid_url(value: &str) -> bool {
    URL_RE.is_match(value.trim())
}

pub fn is_valid_slug(value: &str) -> bool {
    SLUG_RE.is_match(value)
}

pub fn is_valid_phone(value: &str) -> bool {
    let value = value.trim();
    PHONE_RE.is_match(value) && value.chars().filter(char::is_ascii_digit).count() >= 6
}

/// Something that can check itself before being written
pub trait Validate {
    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        self.collect_errors(&mut errors);
        errors.into_result()
    }

    fn collect_errors(&self, errors: &mut ValidationErrors);
}

fn require(errors: &mut ValidationErrors, field: &str, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.push(field, format!("{} is required", label));
    }
}

fn optional_url(errors: &mut ValidationErrors, field: &str, value: &str) {
    if !value.trim().is_empty() && !is_valid_url(value) {
        errors.push(field, "Must be a valid http(s) URL");
    }
}

/// Service create/edit form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceForm {
    pub category: ServiceCategory,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub price_unit: Option<PriceUnit>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub details: crate::entities::Details,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub best_offer: bool,
}

impl Validate for ServiceForm {
    fn collect_errors(&self, errors: &mut ValidationErrors) {
        require(errors, "name", &self.name, "Name");
        if !self.price.is_finite() || self.price < 0.0 {
            errors.push("price", "Price must be a non-negative number");
        }
        require(errors, "image", &self.image, "Main image");
        optional_url(errors, "image", &self.image);
        for (i, item) in self.media.iter().enumerate() {
            if !is_valid_url(&item.url) {
                errors.push(format!("media[{}].url", i), "Must be a valid http(s) URL");
            }
        }
        for (key, _) in self.details.iter() {
            if key.trim().is_empty() {
                errors.push("details", "Detail names cannot be blank");
                break;
            }
        }
        if self.category == ServiceCategory::Hotels {
            require(errors, "location", &self.location, "City");
        }
    }
}

impl ServiceForm {
    /// Build the stored record, keeping `id` when editing
    pub fn into_service(self, id: String) -> Service {
        Service {
            id,
            price_unit: self
                .price_unit
                .unwrap_or_else(|| self.category.default_price_unit()),
            category: self.category,
            name: self.name.trim().to_string(),
            description: self.description,
            price: self.price,
            location: self.location.trim().to_string(),
            details: self.details,
            image: self.image.trim().to_string(),
            media: self.media,
            active: self.active.unwrap_or(true),
            best_offer: self.best_offer,
        }
    }
}

impl Validate for Service {
    fn collect_errors(&self, errors: &mut ValidationErrors) {
        require(errors, "id", &self.id, "Id");
        ServiceForm::from(self.clone()).collect_errors(errors);
    }
}

impl From<Service> for ServiceForm {
    fn from(service: Service) -> Self {
        Self {
            category: service.category,
            name: service.name,
            description: service.description,
            price: service.price,
            price_unit: Some(service.price_unit),
            location: service.location,
            details: service.details,
            image: service.image,
            media: service.media,
            active: Some(service.active),
            best_offer: service.best_offer,
        }
    }
}

impl Validate for Category {
    fn collect_errors(&self, errors: &mut ValidationErrors) {
        if !is_valid_slug(&self.id) {
            errors.push("id", "Id must be a lowercase slug (letters, digits, dashes)");
        }
        require(errors, "name", &self.name, "Name");
        if !self.path.starts_with('/') {
            errors.push("path", "Path must start with '/'");
        }
        optional_url(errors, "slideshow_image", &self.slideshow_image);
    }
}

/// Validate a whole category list before it replaces the stored one
pub fn validate_categories(categories: &[Category]) -> Result<()> {
    let mut errors = ValidationErrors::new();
    let mut seen: Vec<&str> = Vec::new();
    for (i, category) in categories.iter().enumerate() {
        let mut own = ValidationErrors::new();
        category.collect_errors(&mut own);
        for e in own.errors {
            errors.push(format!("categories[{}].{}", i, e.field), e.message);
        }
        if seen.contains(&category.id.as_str()) {
            errors.push(format!("categories[{}].id", i), "Duplicate category id");
        }
        seen.push(&category.id);
    }
    if !categories.is_empty() && !categories.iter().any(|c| c.enabled) {
        errors.push("categories", "At least one category must stay enabled");
    }
    errors.into_result()
}

/// Review create/edit form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewForm {
    pub author: String,
    pub rating: i64,
    pub comment: String,
    pub service_id: String,
}

impl Validate for ReviewForm {
    fn collect_errors(&self, errors: &mut ValidationErrors) {
        require(errors, "author", &self.author, "Name");
        require(errors, "comment", &self.comment, "Comment");
        require(errors, "service_id", &self.service_id, "Service");
        if !(1..=5).contains(&self.rating) {
            errors.push("rating", "Rating must be between 1 and 5");
        }
    }
}

impl ReviewForm {
    pub fn into_review(self, id: String, created_at: time::OffsetDateTime) -> Review {
        Review {
            id,
            author: self.author.trim().to_string(),
            rating: self.rating.clamp(1, 5) as u8,
            comment: self.comment.trim().to_string(),
            service_id: self.service_id,
            created_at,
        }
    }
}

/// New back-office account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminForm {
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: AdminRole,
}

fn default_role() -> AdminRole {
    AdminRole::Admin
}

pub const MIN_PASSWORD_LEN: usize = 8;

impl Validate for AdminForm {
    fn collect_errors(&self, errors: &mut ValidationErrors) {
        if !is_valid_email(&self.email) {
            errors.push("email", "Email is invalid");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            );
        }
    }
}

impl Validate for SettingsOverride {
    fn collect_errors(&self, errors: &mut ValidationErrors) {
        for (field, value) in [
            ("contact_email", &self.contact_email),
            ("admin_email", &self.admin_email),
        ] {
            if let Some(value) = value {
                if !is_valid_email(value) {
                    errors.push(field, "Email is invalid");
                }
            }
        }
        if let Some(number) = &self.whatsapp_number {
            if !is_valid_phone(number) {
                errors.push("whatsapp_number", "WhatsApp number is invalid");
            }
        }
        if let Some(images) = &self.background_images {
            images.collect_errors(errors);
        }
        if let Some(categories) = &self.categories {
            if let Err(crate::WayfareError::Validation(own)) = validate_categories(categories) {
                errors.errors.extend(own.errors);
            }
        }
    }
}

impl Validate for BackgroundImages {
    fn collect_errors(&self, errors: &mut ValidationErrors) {
        for (field, value) in [
            ("background_images.hero", &self.hero),
            ("background_images.cars", &self.cars),
            ("background_images.hotels", &self.hotels),
            ("background_images.transport", &self.transport),
            ("background_images.trips", &self.trips),
        ] {
            optional_url(errors, field, value);
        }
    }
}

impl Validate for EmailTemplate {
    fn collect_errors(&self, errors: &mut ValidationErrors) {
        require(errors, "subject", &self.subject, "Subject");
        require(errors, "html", &self.html, "Template body");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_form() -> ServiceForm {
        ServiceForm {
            category: ServiceCategory::Cars,
            name: "Dacia Logan".to_string(),
            description: String::new(),
            price: 35.0,
            price_unit: None,
            location: "Marrakech".to_string(),
            details: crate::details! { "Seats" => "5" },
            image: "https://cdn.example.com/logan.jpg".to_string(),
            media: vec![],
            active: None,
            best_offer: false,
        }
    }

    #[test]
    fn test_email_rules() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email(" ana@example.co.uk "));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("ana example@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_url_and_slug_rules() {
        assert!(is_valid_url("https://cdn.example.com/a.jpg"));
        assert!(!is_valid_url("ftp://cdn.example.com/a.jpg"));
        assert!(!is_valid_url("cdn.example.com"));
        assert!(is_valid_slug("city-tours"));
        assert!(!is_valid_slug("City Tours"));
        assert!(!is_valid_slug("-tours"));
    }

    #[test]
    fn test_phone_rules() {
        assert!(is_valid_phone("+212 600-000000"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("call me"));
    }

    #[test]
    fn test_valid_service_form() {
        let form = service_form();
        assert!(form.validate().is_ok());
        let service = form.into_service("s1".to_string());
        assert_eq!(service.price_unit, PriceUnit::PerDay);
        assert!(service.active);
    }

    #[test]
    fn test_service_form_reports_every_problem() {
        let form = ServiceForm {
            name: " ".to_string(),
            price: -1.0,
            image: "not a url".to_string(),
            media: vec![MediaItem {
                url: "nope".to_string(),
                kind: Default::default(),
                caption: None,
            }],
            ..service_form()
        };
        let err = form.validate().unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "price", "image", "media[0].url"]);
    }

    #[test]
    fn test_hotel_requires_city() {
        let form = ServiceForm {
            category: ServiceCategory::Hotels,
            location: String::new(),
            ..service_form()
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_review_rating_range() {
        let mut review = ReviewForm {
            author: "Ana".to_string(),
            rating: 5,
            comment: "Great".to_string(),
            service_id: "s1".to_string(),
        };
        assert!(review.validate().is_ok());
        review.rating = 0;
        assert!(review.validate().is_err());
        review.rating = 6;
        assert!(review.validate().is_err());
    }

    #[test]
    fn test_category_list_rules() {
        let cars = Category::new("cars", "Cars");
        assert!(validate_categories(&[cars.clone()]).is_ok());

        let err = validate_categories(&[cars.clone(), cars.clone()]).unwrap_err();
        assert!(err.to_string().contains("Duplicate category id"));

        let off = Category {
            enabled: false,
            ..cars
        };
        assert!(validate_categories(&[off]).is_err());
        assert!(validate_categories(&[]).is_ok());
    }

    #[test]
    fn test_settings_override_rules() {
        let overrides = SettingsOverride {
            admin_email: Some("bookings".to_string()),
            whatsapp_number: Some("+212600000000".to_string()),
            ..Default::default()
        };
        let err = overrides.validate().unwrap_err();
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].field, "admin_email");
    }

    #[test]
    fn test_admin_form_rules() {
        let form = AdminForm {
            email: "ops@example.com".to_string(),
            password: "short".to_string(),
            role: AdminRole::Admin,
        };
        assert!(form.validate().unwrap_err().to_string().contains("password"));
    }
}
