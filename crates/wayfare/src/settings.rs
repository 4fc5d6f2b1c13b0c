//! Site settings: bundled defaults merged with the admin override document

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::entities::{Category, ServiceCategory};

/// Background images for the hero and each category landing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundImages {
    pub hero: String,
    pub cars: String,
    pub hotels: String,
    pub transport: String,
    pub trips: String,
}

/// The effective site configuration every page reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Public contact address shown on the site
    pub contact_email: String,
    /// Where new-inquiry notifications go
    pub admin_email: String,
    pub whatsapp_number: String,
    pub background_images: BackgroundImages,
    pub categories: Vec<Category>,
}

/// The admin-saved settings document; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_images: Option<BackgroundImages>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
}

static DEFAULT_SETTINGS: Lazy<Settings> = Lazy::new(|| Settings {
    contact_email: "contact@wayfare.travel".to_string(),
    admin_email: "bookings@wayfare.travel".to_string(),
    whatsapp_number: "+212600000000".to_string(),
    background_images: BackgroundImages {
        hero: "https://images.wayfare.travel/backgrounds/hero.jpg".to_string(),
        cars: "https://images.wayfare.travel/backgrounds/cars.jpg".to_string(),
        hotels: "https://images.wayfare.travel/backgrounds/hotels.jpg".to_string(),
        transport: "https://images.wayfare.travel/backgrounds/transport.jpg".to_string(),
        trips: "https://images.wayfare.travel/backgrounds/trips.jpg".to_string(),
    },
    categories: default_categories(),
});

fn default_categories() -> Vec<Category> {
    ServiceCategory::ALL
        .iter()
        .map(|category| {
            let (name, icon) = match category {
                ServiceCategory::Cars => ("Car Rental", "car"),
                ServiceCategory::Hotels => ("Hotels", "bed"),
                ServiceCategory::Transport => ("Transport", "bus"),
                ServiceCategory::Trips => ("Trips", "map"),
            };
            Category {
                icon: icon.to_string(),
                slideshow_image: format!(
                    "https://images.wayfare.travel/slides/{}.jpg",
                    category.as_str()
                ),
                ..Category::new(category.as_str(), name)
            }
        })
        .collect()
}

impl Settings {
    /// The bundled defaults
    pub fn defaults() -> &'static Settings {
        &DEFAULT_SETTINGS
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn enabled_categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter(|c| c.enabled)
    }
}

/// Merge `overrides` on top of `defaults`
///
/// Every present field replaces the default. The category list is the
/// exception: it is taken only when present and non-empty, so a settings
/// document saved without categories cannot hide the whole storefront.
pub fn resolve(defaults: &Settings, overrides: Option<&SettingsOverride>) -> Settings {
    let Some(overrides) = overrides else {
        return defaults.clone();
    };

    Settings {
        contact_email: overrides
            .contact_email
            .clone()
            .unwrap_or_else(|| defaults.contact_email.clone()),
        admin_email: overrides
            .admin_email
            .clone()
            .unwrap_or_else(|| defaults.admin_email.clone()),
        whatsapp_number: overrides
            .whatsapp_number
            .clone()
            .unwrap_or_else(|| defaults.whatsapp_number.clone()),
        background_images: overrides
            .background_images
            .clone()
            .unwrap_or_else(|| defaults.background_images.clone()),
        categories: match &overrides.categories {
            Some(categories) if !categories.is_empty() => categories.clone(),
            _ => defaults.categories.clone(),
        },
    }
}

/// Settings as seen by a consumer, with the loading flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsSnapshot {
    pub settings: Settings,
    pub loading: bool,
}

impl SettingsSnapshot {
    /// Defaults while the override is still being fetched
    pub fn pending() -> Self {
        Self {
            settings: Settings::defaults().clone(),
            loading: true,
        }
    }

    /// Effective settings once the fetch finished; `None` covers both a
    /// missing document and a failed read
    pub fn resolved(overrides: Option<&SettingsOverride>) -> Self {
        Self {
            settings: resolve(Settings::defaults(), overrides),
            loading: false,
        }
    }
}

impl From<&Settings> for SettingsOverride {
    fn from(settings: &Settings) -> Self {
        Self {
            contact_email: Some(settings.contact_email.clone()),
            admin_email: Some(settings.admin_email.clone()),
            whatsapp_number: Some(settings.whatsapp_number.clone()),
            background_images: Some(settings.background_images.clone()),
            categories: Some(settings.categories.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults_with(ids: &[&str]) -> Settings {
        Settings {
            categories: ids.iter().map(|id| Category::new(*id, *id)).collect(),
            ..Settings::defaults().clone()
        }
    }

    fn ids(settings: &Settings) -> Vec<&str> {
        settings.categories.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_empty_category_override_keeps_defaults() {
        let defaults = defaults_with(&["a", "b", "c"]);
        let overrides = SettingsOverride {
            categories: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(ids(&resolve(&defaults, Some(&overrides))), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_category_override_replaces_defaults() {
        let defaults = defaults_with(&["a", "b", "c"]);
        let overrides = SettingsOverride {
            categories: Some(vec![Category::new("x", "X")]),
            ..Default::default()
        };
        assert_eq!(ids(&resolve(&defaults, Some(&overrides))), vec!["x"]);
    }

    #[test]
    fn test_scalar_fields_merge_shallowly() {
        let defaults = Settings::defaults();
        let overrides = SettingsOverride {
            whatsapp_number: Some("+33100000000".to_string()),
            ..Default::default()
        };
        let effective = resolve(defaults, Some(&overrides));
        assert_eq!(effective.whatsapp_number, "+33100000000");
        assert_eq!(effective.contact_email, defaults.contact_email);
        assert_eq!(effective.categories, defaults.categories);
    }

    #[test]
    fn test_missing_override_is_defaults() {
        assert_eq!(&resolve(Settings::defaults(), None), Settings::defaults());
    }

    #[test]
    fn test_resolve_is_pure() {
        let overrides = SettingsOverride {
            contact_email: Some("hello@example.com".to_string()),
            categories: Some(vec![Category::new("x", "X")]),
            ..Default::default()
        };
        let first = resolve(Settings::defaults(), Some(&overrides));
        let second = resolve(Settings::defaults(), Some(&overrides));
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn test_snapshot_loading_flag() {
        assert!(SettingsSnapshot::pending().loading);
        let snapshot = SettingsSnapshot::resolved(None);
        assert!(!snapshot.loading);
        assert_eq!(snapshot.settings.categories.len(), 4);
    }

    #[test]
    fn test_override_json_without_categories() {
        let overrides: SettingsOverride =
            serde_json::from_str(r#"{"contact_email":"a@b.co"}"#).unwrap();
        let effective = resolve(Settings::defaults(), Some(&overrides));
        assert_eq!(effective.contact_email, "a@b.co");
        assert_eq!(effective.categories.len(), 4);
    }
}
