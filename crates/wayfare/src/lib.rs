//! Wayfare is the domain library behind a travel-services storefront:
//! catalog filtering, site settings, booking rules, transfer pricing and the
//! notification email templates.

#[macro_use]
mod macros;

pub mod booking;
pub mod catalog;
pub mod entities;
pub mod error;
pub mod pricing;
pub mod settings;
pub mod staging;
pub mod template;
pub mod validation;

// Re-export core types
pub use booking::{
    ANONYMOUS_USER, ContactChannel, Inquiry, InquiryRequest, PaymentStatus, Reservation,
    ReservationRequest, new_reservation, reservation_total,
};
pub use catalog::{
    CatalogFilter, CatalogSort, CatalogView, EmptyState, PriceRange, SeatRange, best_offers,
    filter_catalog,
};
pub use entities::{
    AdminAccount, AdminRole, Category, Details, MediaItem, MediaKind, PriceUnit, Review, Service,
    ServiceCategory, new_id,
};
pub use error::{BookingError, FieldError, Result, StagingError, ValidationErrors, WayfareError};
pub use pricing::RouteQuote;
pub use settings::{BackgroundImages, Settings, SettingsOverride, SettingsSnapshot, resolve};
pub use staging::{Staged, StagedEdit, StagedList};
pub use template::{
    EmailTemplate, EmailTemplateKind, RenderedEmail, TemplateData, escape_html, render,
};
pub use validation::{AdminForm, ReviewForm, ServiceForm, Validate, validate_categories};

/// Get the library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
