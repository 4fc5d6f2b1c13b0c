//! Storefront catalog filtering
//!
//! Takes every service record of one category plus the visitor's filter
//! selections and produces what the category page shows: the matching active
//! services, or the reason nothing is shown.

use serde::{Deserialize, Serialize};

use crate::entities::{Service, ServiceCategory};
use crate::settings::Settings;

/// Price buckets offered on the car rental page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceRange {
    #[default]
    #[serde(rename = "any")]
    Any,
    #[serde(rename = "under_50")]
    Under50,
    #[serde(rename = "50_to_100")]
    From50To100,
    #[serde(rename = "over_100")]
    Over100,
}

impl PriceRange {
    pub fn matches(&self, price: f64) -> bool {
        match self {
            PriceRange::Any => true,
            PriceRange::Under50 => price < 50.0,
            PriceRange::From50To100 => (50.0..=100.0).contains(&price),
            PriceRange::Over100 => price > 100.0,
        }
    }
}

/// Seat buckets offered on the car rental page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatRange {
    #[default]
    #[serde(rename = "any")]
    Any,
    #[serde(rename = "2_to_4")]
    TwoToFour,
    #[serde(rename = "5_plus")]
    FivePlus,
}

impl SeatRange {
    /// `seats` is `None` when the detail is missing or not an integer; such
    /// records never match a restricted bucket.
    pub fn matches(&self, seats: Option<i64>) -> bool {
        match (self, seats) {
            (SeatRange::Any, _) => true,
            (_, None) => false,
            (SeatRange::TwoToFour, Some(n)) => (2..=4).contains(&n),
            (SeatRange::FivePlus, Some(n)) => n >= 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSort {
    /// Keep datastore order
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
}

/// The visitor's filter selections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    #[serde(default)]
    pub price: PriceRange,
    #[serde(default)]
    pub seats: SeatRange,
    /// Exact location match; `None` or blank means any city
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub sort: CatalogSort,
}

impl CatalogFilter {
    /// Whether an active service passes every selection that applies to its
    /// category
    pub fn matches(&self, service: &Service) -> bool {
        match service.category {
            ServiceCategory::Cars => {
                self.price.matches(service.price) && self.seats.matches(service.details.seats())
            }
            ServiceCategory::Hotels => match self.city.as_deref().map(str::trim) {
                None | Some("") => true,
                Some(city) => service.location == city,
            },
            ServiceCategory::Transport | ServiceCategory::Trips => true,
        }
    }
}

/// Why a category page shows no services, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    /// Category is missing from settings or switched off
    CategoryDisabled,
    /// No records at all
    NoServices,
    /// Records exist but every one is inactive
    ServicesBusy,
    /// Active records exist but none pass the filters
    NoMatch,
}

impl EmptyState {
    pub fn message(&self) -> &'static str {
        match self {
            EmptyState::CategoryDisabled => "This category is currently unavailable.",
            EmptyState::NoServices => "No services are available in this category yet.",
            EmptyState::ServicesBusy => {
                "All services in this category are currently busy. Please check back soon."
            }
            EmptyState::NoMatch => "No services match your filters.",
        }
    }
}

/// What a category page displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogView {
    pub category: ServiceCategory,
    pub services: Vec<Service>,
    pub empty_state: Option<EmptyState>,
    /// Distinct locations of active services, for the city selector
    pub cities: Vec<String>,
    pub active_count: usize,
}

/// Filter `records` of `category` for display
pub fn filter_catalog(
    settings: &Settings,
    category: ServiceCategory,
    records: &[Service],
    filter: &CatalogFilter,
) -> CatalogView {
    let category_enabled = settings
        .category(category.as_str())
        .map(|c| c.enabled)
        .unwrap_or(false);

    let active: Vec<&Service> = records
        .iter()
        .filter(|s| s.category == category && s.active)
        .collect();

    let mut cities: Vec<String> = active
        .iter()
        .map(|s| s.location.trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    cities.sort();
    cities.dedup();

    let mut services: Vec<Service> = if category_enabled {
        active
            .iter()
            .filter(|s| filter.matches(s))
            .map(|s| (*s).clone())
            .collect()
    } else {
        Vec::new()
    };

    match filter.sort {
        CatalogSort::Default => {}
        CatalogSort::PriceAsc => services.sort_by(|a, b| a.price.total_cmp(&b.price)),
        CatalogSort::PriceDesc => services.sort_by(|a, b| b.price.total_cmp(&a.price)),
    }

    let empty_state = if !category_enabled {
        Some(EmptyState::CategoryDisabled)
    } else if records.is_empty() {
        Some(EmptyState::NoServices)
    } else if active.is_empty() {
        Some(EmptyState::ServicesBusy)
    } else if services.is_empty() {
        Some(EmptyState::NoMatch)
    } else {
        None
    };

    CatalogView {
        category,
        services,
        empty_state,
        cities,
        active_count: active.len(),
    }
}

/// Services for the featured carousel: active, flagged as best offer, and in
/// an enabled category
pub fn best_offers<'a>(
    settings: &Settings,
    services: impl IntoIterator<Item = &'a Service>,
) -> Vec<Service> {
    services
        .into_iter()
        .filter(|s| s.active && s.best_offer)
        .filter(|s| {
            settings
                .category(s.category.as_str())
                .map(|c| c.enabled)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details;
    use crate::entities::Category;

    fn car(price: f64, seats: &str) -> Service {
        Service::new(ServiceCategory::Cars, format!("car-{}", price), price)
            .with_details(details! { "Seats" => seats })
    }

    fn settings() -> Settings {
        Settings::defaults().clone()
    }

    fn prices(view: &CatalogView) -> Vec<f64> {
        view.services.iter().map(|s| s.price).collect()
    }

    #[test]
    fn test_price_buckets() {
        let records = vec![car(30.0, "4"), car(75.0, "4"), car(150.0, "4")];
        let cases = [
            (PriceRange::Under50, vec![30.0]),
            (PriceRange::From50To100, vec![75.0]),
            (PriceRange::Over100, vec![150.0]),
            (PriceRange::Any, vec![30.0, 75.0, 150.0]),
        ];
        for (price, expected) in cases {
            let filter = CatalogFilter {
                price,
                ..Default::default()
            };
            let view = filter_catalog(&settings(), ServiceCategory::Cars, &records, &filter);
            assert_eq!(prices(&view), expected, "bucket {:?}", price);
        }
    }

    #[test]
    fn test_price_bucket_bounds_inclusive() {
        assert!(PriceRange::From50To100.matches(50.0));
        assert!(PriceRange::From50To100.matches(100.0));
        assert!(!PriceRange::Under50.matches(50.0));
        assert!(!PriceRange::Over100.matches(100.0));
    }

    #[test]
    fn test_seat_buckets() {
        let filter = CatalogFilter {
            seats: SeatRange::FivePlus,
            ..Default::default()
        };
        let four = vec![car(40.0, "4")];
        let seven = vec![car(40.0, "7")];
        let view = filter_catalog(&settings(), ServiceCategory::Cars, &four, &filter);
        assert!(view.services.is_empty());
        assert_eq!(view.empty_state, Some(EmptyState::NoMatch));
        let view = filter_catalog(&settings(), ServiceCategory::Cars, &seven, &filter);
        assert_eq!(view.services.len(), 1);
    }

    #[test]
    fn test_unparsable_seats_excluded_from_restricted_buckets() {
        let records = vec![car(40.0, "many")];
        for seats in [SeatRange::TwoToFour, SeatRange::FivePlus] {
            let filter = CatalogFilter {
                seats,
                ..Default::default()
            };
            let view = filter_catalog(&settings(), ServiceCategory::Cars, &records, &filter);
            assert!(view.services.is_empty());
        }
        let view = filter_catalog(
            &settings(),
            ServiceCategory::Cars,
            &records,
            &CatalogFilter::default(),
        );
        assert_eq!(view.services.len(), 1);
    }

    #[test]
    fn test_city_filter_only_applies_to_hotels() {
        let hotels = vec![
            Service::new(ServiceCategory::Hotels, "Riad", 90.0).with_location("Marrakech"),
            Service::new(ServiceCategory::Hotels, "Dar", 70.0).with_location("Fes"),
        ];
        let filter = CatalogFilter {
            city: Some("Fes".to_string()),
            ..Default::default()
        };
        let view = filter_catalog(&settings(), ServiceCategory::Hotels, &hotels, &filter);
        assert_eq!(view.services.len(), 1);
        assert_eq!(view.services[0].name, "Dar");
        assert_eq!(view.cities, vec!["Fes".to_string(), "Marrakech".to_string()]);

        let trips = vec![Service::new(ServiceCategory::Trips, "Desert", 200.0).with_location("Merzouga")];
        let view = filter_catalog(&settings(), ServiceCategory::Trips, &trips, &filter);
        assert_eq!(view.services.len(), 1);
    }

    #[test]
    fn test_car_filters_ignored_for_other_categories() {
        let trips = vec![Service::new(ServiceCategory::Trips, "Desert", 200.0)];
        let filter = CatalogFilter {
            price: PriceRange::Under50,
            seats: SeatRange::TwoToFour,
            ..Default::default()
        };
        let view = filter_catalog(&settings(), ServiceCategory::Trips, &trips, &filter);
        assert_eq!(view.services.len(), 1);
    }

    #[test]
    fn test_inactive_services_hidden() {
        let records = vec![car(30.0, "4").with_active(false), car(60.0, "4")];
        let view = filter_catalog(
            &settings(),
            ServiceCategory::Cars,
            &records,
            &CatalogFilter::default(),
        );
        assert_eq!(prices(&view), vec![60.0]);
        assert_eq!(view.active_count, 1);
    }

    #[test]
    fn test_empty_state_priority() {
        let mut disabled = settings();
        for category in disabled.categories.iter_mut() {
            if category.id == "cars" {
                category.enabled = false;
            }
        }
        let no_match = CatalogFilter {
            price: PriceRange::Over100,
            ..Default::default()
        };
        let busy = vec![car(30.0, "4").with_active(false)];
        let active = vec![car(30.0, "4")];

        // disabled wins over every record state
        for records in [&vec![], &busy, &active] {
            let view = filter_catalog(&disabled, ServiceCategory::Cars, records, &no_match);
            assert_eq!(view.empty_state, Some(EmptyState::CategoryDisabled));
            assert!(view.services.is_empty());
        }

        let view = filter_catalog(&settings(), ServiceCategory::Cars, &[], &no_match);
        assert_eq!(view.empty_state, Some(EmptyState::NoServices));

        let view = filter_catalog(&settings(), ServiceCategory::Cars, &busy, &no_match);
        assert_eq!(view.empty_state, Some(EmptyState::ServicesBusy));

        let view = filter_catalog(&settings(), ServiceCategory::Cars, &active, &no_match);
        assert_eq!(view.empty_state, Some(EmptyState::NoMatch));

        let view = filter_catalog(
            &settings(),
            ServiceCategory::Cars,
            &active,
            &CatalogFilter::default(),
        );
        assert_eq!(view.empty_state, None);
    }

    #[test]
    fn test_category_missing_from_settings_is_disabled() {
        let mut only_hotels = settings();
        only_hotels.categories = vec![Category::new("hotels", "Hotels")];
        let view = filter_catalog(
            &only_hotels,
            ServiceCategory::Cars,
            &[car(30.0, "4")],
            &CatalogFilter::default(),
        );
        assert_eq!(view.empty_state, Some(EmptyState::CategoryDisabled));
    }

    #[test]
    fn test_sorting() {
        let records = vec![car(75.0, "4"), car(30.0, "4"), car(150.0, "4")];
        let mut filter = CatalogFilter {
            sort: CatalogSort::PriceAsc,
            ..Default::default()
        };
        let view = filter_catalog(&settings(), ServiceCategory::Cars, &records, &filter);
        assert_eq!(prices(&view), vec![30.0, 75.0, 150.0]);
        filter.sort = CatalogSort::PriceDesc;
        let view = filter_catalog(&settings(), ServiceCategory::Cars, &records, &filter);
        assert_eq!(prices(&view), vec![150.0, 75.0, 30.0]);
    }

    #[test]
    fn test_filter_from_query_json() {
        let filter: CatalogFilter =
            serde_json::from_str(r#"{"price":"50_to_100","seats":"5_plus"}"#).unwrap();
        assert_eq!(filter.price, PriceRange::From50To100);
        assert_eq!(filter.seats, SeatRange::FivePlus);
        assert_eq!(filter.sort, CatalogSort::Default);
    }

    #[test]
    fn test_best_offers() {
        let services = vec![
            car(30.0, "4").with_best_offer(true),
            car(40.0, "4").with_best_offer(true).with_active(false),
            car(50.0, "4"),
        ];
        let offers = best_offers(&settings(), &services);
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].price, 30.0);
    }
}
