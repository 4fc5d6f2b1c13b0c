//! Core data structures for the storefront catalog and back office

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{ValidationErrors, WayfareError};

/// Generate a fresh document identifier
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// The closed set of service categories the storefront knows how to sell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Cars,
    Hotels,
    Transport,
    Trips,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 4] = [
        ServiceCategory::Cars,
        ServiceCategory::Hotels,
        ServiceCategory::Transport,
        ServiceCategory::Trips,
    ];

    /// Slug used for category ids, URLs and collection names
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Cars => "cars",
            ServiceCategory::Hotels => "hotels",
            ServiceCategory::Transport => "transport",
            ServiceCategory::Trips => "trips",
        }
    }

    /// Categories whose reservations are priced from a date range
    pub fn is_date_priced(&self) -> bool {
        matches!(self, ServiceCategory::Cars | ServiceCategory::Hotels)
    }

    /// Unit a new service of this category is priced in by default
    pub fn default_price_unit(&self) -> PriceUnit {
        match self {
            ServiceCategory::Cars => PriceUnit::PerDay,
            ServiceCategory::Hotels => PriceUnit::PerNight,
            ServiceCategory::Transport | ServiceCategory::Trips => PriceUnit::PerTrip,
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceCategory {
    type Err = WayfareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cars" => Ok(ServiceCategory::Cars),
            "hotels" => Ok(ServiceCategory::Hotels),
            "transport" => Ok(ServiceCategory::Transport),
            "trips" => Ok(ServiceCategory::Trips),
            other => Err(ValidationErrors::single(
                "category",
                format!("Unknown category '{}'", other),
            )
            .into()),
        }
    }
}

/// How a service price is quoted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUnit {
    PerDay,
    PerNight,
    PerTrip,
}

/// Free-form key/value details of a service
///
/// Admins can add any key; the well-known ones below are what the storefront
/// reads back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Details(BTreeMap<String, String>);

impl Details {
    pub const SEATS: &'static str = "Seats";
    pub const TRANSMISSION: &'static str = "Transmission";
    pub const FUEL: &'static str = "Fuel";
    pub const STARS: &'static str = "Stars";
    pub const DURATION: &'static str = "Duration";
    pub const CAPACITY: &'static str = "Capacity";

    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Seat count, read like `parseInt`: leading digits after optional
    /// whitespace and sign. `"7 seats"` is 7, `"seven"` is `None`.
    pub fn seats(&self) -> Option<i64> {
        self.get(Self::SEATS).and_then(parse_leading_int)
    }

    /// Keys outside the well-known set
    pub fn extras(&self) -> impl Iterator<Item = (&str, &str)> {
        const KNOWN: [&str; 6] = [
            Details::SEATS,
            Details::TRANSMISSION,
            Details::FUEL,
            Details::STARS,
            Details::DURATION,
            Details::CAPACITY,
        ];
        self.iter().filter(|(k, _)| !KNOWN.contains(k))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Details {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Parse the leading integer of a string the way a browser `parseInt` does
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| n * sign)
}

/// Additional image or video attached to a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    #[serde(default)]
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

fn default_true() -> bool {
    true
}

/// A bookable listing: a car, a hotel, a transfer or a curated trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub category: ServiceCategory,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub price_unit: PriceUnit,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub details: Details,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub best_offer: bool,
}

impl Service {
    /// Create an active service with a generated id
    pub fn new(category: ServiceCategory, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: new_id(),
            category,
            name: name.into(),
            description: String::new(),
            price,
            price_unit: category.default_price_unit(),
            location: String::new(),
            details: Details::new(),
            image: String::new(),
            media: Vec::new(),
            active: true,
            best_offer: false,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_best_offer(mut self, best_offer: bool) -> Self {
        self.best_offer = best_offer;
        self
    }

    /// Copy under a new id, marked as a copy
    pub fn duplicate(&self) -> Self {
        Self {
            id: new_id(),
            name: format!("{} (copy)", self.name),
            ..self.clone()
        }
    }
}

/// A storefront section, e.g. "Car rental"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Slug, also the key services are filed under
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub path: String,
    #[serde(default)]
    pub slideshow_image: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            path: format!("/{}", id),
            id,
            name: name.into(),
            icon: String::new(),
            slideshow_image: String::new(),
            enabled: true,
        }
    }

    /// Copy under a fresh slug derived from this one
    pub fn duplicate(&self, taken: &[&str]) -> Self {
        let mut n = 2;
        let mut id = format!("{}-copy", self.id);
        while taken.contains(&id.as_str()) {
            id = format!("{}-copy-{}", self.id, n);
            n += 1;
        }
        Self {
            path: format!("/{}", id),
            id,
            name: format!("{} (copy)", self.name),
            ..self.clone()
        }
    }
}

/// A customer review shown next to a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub author: String,
    pub rating: u8,
    pub comment: String,
    pub service_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Back-office permission level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    Admin,
    Superadmin,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::Admin => "admin",
            AdminRole::Superadmin => "superadmin",
        }
    }
}

impl FromStr for AdminRole {
    type Err = WayfareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(AdminRole::Admin),
            "superadmin" => Ok(AdminRole::Superadmin),
            other => Err(ValidationErrors::single("role", format!("Unknown role '{}'", other)).into()),
        }
    }
}

/// An identity allowed into the back office
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccount {
    /// Identity provider uid
    pub id: String,
    pub email: String,
    pub role: AdminRole,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl AdminAccount {
    pub fn is_superadmin(&self) -> bool {
        self.role == AdminRole::Superadmin
    }
}
