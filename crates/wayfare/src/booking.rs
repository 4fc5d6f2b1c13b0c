//! Reservations and inquiries
//!
//! A reservation is a paying booking that goes through checkout; an inquiry is
//! a contact request that only triggers notifications. This module holds the
//! pure part of both flows: request validation, totals, and the placeholder
//! values for the notification emails.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::entities::{Service, ServiceCategory, new_id};
use crate::error::{BookingError, Result, ValidationErrors};
use crate::pricing;
use crate::settings::Settings;
use crate::template::{TemplateData, bullet_list, escape_html};
use crate::validation::{Validate, is_valid_email, is_valid_phone};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Marker stored in place of a user id for guest checkouts
pub const ANONYMOUS_USER: &str = "anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

/// A paying booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub service_id: String,
    pub service_name: String,
    pub category: ServiceCategory,
    /// Unit price at the time of booking
    pub price: f64,
    pub total: f64,
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub pickup_at: Option<OffsetDateTime>,
    pub payment_status: PaymentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub user_id: String,
}

impl Reservation {
    /// Mark the reservation paid. This is the only change a reservation ever
    /// goes through.
    pub fn complete_payment(&mut self, now: OffsetDateTime) -> Result<()> {
        if self.payment_status == PaymentStatus::Completed {
            return Err(BookingError::AlreadyPaid(self.id.clone()).into());
        }
        self.payment_status = PaymentStatus::Completed;
        self.completed_at = Some(now);
        Ok(())
    }

    pub fn checkout_path(&self) -> String {
        format!("/checkout/{}", self.id)
    }
}

/// Checkout request from a service page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub service_id: String,
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub pickup_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub passengers: Option<u32>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Price a reservation of `service`
///
/// Cars are billed per day and hotels per night over the requested range, and
/// both need a strictly positive total. Transfers use the route table when the
/// route is known, everything else is billed at the listed price.
pub fn reservation_total(service: &Service, request: &ReservationRequest) -> Result<f64> {
    if !service.active {
        return Err(BookingError::Unavailable(service.name.clone()).into());
    }

    if service.category.is_date_priced() {
        let (Some(start), Some(end)) = (request.start_date, request.end_date) else {
            return Err(BookingError::MissingDates {
                category: service.category.to_string(),
            }
            .into());
        };
        let units = (end - start).whole_days();
        let total = units as f64 * service.price;
        if total <= 0.0 {
            return Err(BookingError::NonPositiveTotal { total }.into());
        }
        return Ok(total);
    }

    let routed = match (service.category, &request.origin, &request.destination) {
        (ServiceCategory::Transport, Some(origin), Some(destination)) => {
            pricing::quote(origin, destination, request.passengers).map(|q| q.price)
        }
        _ => None,
    };
    Ok(routed.unwrap_or(service.price))
}

/// Build a pending reservation for a priced request
pub fn new_reservation(
    service: &Service,
    request: &ReservationRequest,
    now: OffsetDateTime,
) -> Result<Reservation> {
    let total = reservation_total(service, request)?;
    Ok(Reservation {
        id: new_id(),
        service_id: service.id.clone(),
        service_name: service.name.clone(),
        category: service.category,
        price: service.price,
        total,
        start_date: request.start_date,
        end_date: request.end_date,
        pickup_at: request.pickup_at,
        payment_status: PaymentStatus::Pending,
        created_at: now,
        completed_at: None,
        user_id: request
            .user_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS_USER.to_string()),
    })
}

/// How the customer wants to be contacted back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactChannel {
    #[default]
    Email,
    Whatsapp,
}

impl ContactChannel {
    pub fn label(&self) -> &'static str {
        match self {
            ContactChannel::Email => "Email",
            ContactChannel::Whatsapp => "WhatsApp",
        }
    }
}

/// Inquiry form as submitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InquiryRequest {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub category: Option<ServiceCategory>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub channel: ContactChannel,
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub passengers: Option<u32>,
    #[serde(default)]
    pub price_estimate: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Validate for InquiryRequest {
    fn collect_errors(&self, errors: &mut ValidationErrors) {
        if self.name.trim().is_empty() {
            errors.push("name", "Name is required");
        }
        if self.service_id.trim().is_empty() {
            errors.push("service_id", "Service is required");
        }

        let email = present(&self.email);
        let phone = present(&self.phone);
        if let Some(email) = email {
            if !is_valid_email(email) {
                errors.push("email", "Email is invalid");
            }
        }
        if let Some(phone) = phone {
            if !is_valid_phone(phone) {
                errors.push("phone", "Phone number is invalid");
            }
        }
        match self.channel {
            ContactChannel::Email if email.is_none() => {
                errors.push("email", "Email is required to be contacted by email");
            }
            ContactChannel::Whatsapp if phone.is_none() => {
                errors.push("phone", "Phone number is required to be contacted on WhatsApp");
            }
            _ => {}
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                errors.push("end_date", "End date must not be before start date");
            }
        }
        if let Some(estimate) = self.price_estimate {
            if !estimate.is_finite() || estimate < 0.0 {
                errors.push("price_estimate", "Price estimate must be a non-negative number");
            }
        }
    }
}

/// A stored contact request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: String,
    pub service_id: String,
    pub service_name: String,
    pub category: ServiceCategory,
    pub customer_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub channel: ContactChannel,
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub passengers: Option<u32>,
    pub price_estimate: Option<f64>,
    pub message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Inquiry {
    /// Turn a validated request about `service` into a record
    ///
    /// A transfer inquiry without an estimate gets one from the route table.
    pub fn from_request(request: InquiryRequest, service: &Service, now: OffsetDateTime) -> Self {
        let clean = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let origin = clean(request.origin);
        let destination = clean(request.destination);

        let price_estimate = request.price_estimate.or_else(|| {
            if service.category != ServiceCategory::Transport {
                return None;
            }
            pricing::quote(origin.as_deref()?, destination.as_deref()?, request.passengers)
                .map(|q| q.price)
        });

        Self {
            id: new_id(),
            service_id: service.id.clone(),
            service_name: service.name.clone(),
            category: service.category,
            customer_name: request.name.trim().to_string(),
            email: clean(request.email),
            phone: clean(request.phone),
            channel: request.channel,
            start_date: request.start_date,
            end_date: request.end_date,
            origin,
            destination,
            passengers: request.passengers,
            price_estimate,
            message: clean(request.message),
            created_at: now,
        }
    }

    fn dates_label(&self) -> Option<String> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start != end => Some(format!("{} to {}", start, end)),
            (Some(date), _) | (None, Some(date)) => Some(date.to_string()),
            (None, None) => None,
        }
    }

    /// `<ul>` of whichever optional fields the customer filled in
    pub fn details_html(&self) -> String {
        bullet_list([
            ("Phone", self.phone.clone()),
            ("Dates", self.dates_label()),
            ("Origin", self.origin.clone()),
            ("Destination", self.destination.clone()),
            ("Passengers", self.passengers.map(|p| p.to_string())),
            ("Price estimate", self.price_estimate.map(|p| format!("{:.2}", p))),
            ("Message", self.message.clone()),
        ])
    }

    /// Placeholder values for both notification emails, HTML-escaped
    pub fn template_data(&self, settings: &Settings) -> TemplateData {
        let mut data = TemplateData::new();
        data.insert("inquiry_id", escape_html(&self.id))
            .insert("customer_name", escape_html(&self.customer_name))
            .insert("service_name", escape_html(&self.service_name))
            .insert("service_id", escape_html(&self.service_id))
            .insert("category", self.category.as_str())
            .insert("channel", self.channel.label())
            .insert("details", self.details_html())
            .insert("contact_email", escape_html(&settings.contact_email))
            .insert("whatsapp_number", escape_html(&settings.whatsapp_number))
            .insert_opt("customer_email", self.email.as_deref().map(escape_html))
            .insert_opt("customer_phone", self.phone.as_deref().map(escape_html))
            .insert_opt("message", self.message.as_deref().map(escape_html))
            .insert_opt(
                "submitted_at",
                self.created_at
                    .format(&time::format_description::well_known::Rfc3339)
                    .ok(),
            );
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::render;
    use time::macros::{date, datetime};

    fn now() -> OffsetDateTime {
        datetime!(2026-10-01 09:30 UTC)
    }

    fn request(start: Option<Date>, end: Option<Date>) -> ReservationRequest {
        ReservationRequest {
            service_id: "s1".to_string(),
            start_date: start,
            end_date: end,
            ..Default::default()
        }
    }

    #[test]
    fn test_car_total_is_days_times_price() {
        let car = Service::new(ServiceCategory::Cars, "Clio", 30.0);
        let total = reservation_total(
            &car,
            &request(Some(date!(2026 - 10 - 01)), Some(date!(2026 - 10 - 04))),
        )
        .unwrap();
        assert_eq!(total, 90.0);
    }

    #[test]
    fn test_date_priced_categories_need_dates() {
        let hotel = Service::new(ServiceCategory::Hotels, "Riad", 80.0);
        let err = reservation_total(&hotel, &request(Some(date!(2026 - 10 - 01)), None)).unwrap_err();
        assert!(matches!(
            err,
            crate::WayfareError::Booking(BookingError::MissingDates { .. })
        ));

        let trip = Service::new(ServiceCategory::Trips, "Atlas", 150.0);
        assert!(!trip.category.is_date_priced());
        assert_eq!(reservation_total(&trip, &request(None, None)).unwrap(), 150.0);
    }

    #[test]
    fn test_total_must_be_positive() {
        let hotel = Service::new(ServiceCategory::Hotels, "Riad", 80.0);
        let same_day = request(Some(date!(2026 - 10 - 01)), Some(date!(2026 - 10 - 01)));
        assert!(reservation_total(&hotel, &same_day).is_err());

        let reversed = request(Some(date!(2026 - 10 - 05)), Some(date!(2026 - 10 - 01)));
        assert!(reservation_total(&hotel, &reversed).is_err());

        let free = Service::new(ServiceCategory::Cars, "Free", 0.0);
        let range = request(Some(date!(2026 - 10 - 01)), Some(date!(2026 - 10 - 03)));
        assert!(reservation_total(&free, &range).is_err());
    }

    #[test]
    fn test_transport_uses_route_table() {
        let transfer = Service::new(ServiceCategory::Transport, "Private transfer", 50.0);
        let routed = ReservationRequest {
            origin: Some("Marrakech".to_string()),
            destination: Some("Essaouira".to_string()),
            ..request(None, None)
        };
        assert_eq!(reservation_total(&transfer, &routed).unwrap(), 80.0);
        assert_eq!(reservation_total(&transfer, &request(None, None)).unwrap(), 50.0);
    }

    #[test]
    fn test_inactive_service_cannot_be_booked() {
        let trip = Service::new(ServiceCategory::Trips, "Desert", 200.0).with_active(false);
        assert!(reservation_total(&trip, &request(None, None)).is_err());
    }

    #[test]
    fn test_new_reservation_is_pending_and_anonymous() {
        let trip = Service::new(ServiceCategory::Trips, "Desert", 200.0);
        let reservation = new_reservation(&trip, &request(None, None), now()).unwrap();
        assert_eq!(reservation.payment_status, PaymentStatus::Pending);
        assert_eq!(reservation.user_id, ANONYMOUS_USER);
        assert_eq!(reservation.total, 200.0);
        assert_eq!(reservation.checkout_path(), format!("/checkout/{}", reservation.id));
    }

    #[test]
    fn test_payment_completes_once() {
        let trip = Service::new(ServiceCategory::Trips, "Desert", 200.0);
        let mut reservation = new_reservation(&trip, &request(None, None), now()).unwrap();
        reservation.complete_payment(now()).unwrap();
        assert_eq!(reservation.payment_status, PaymentStatus::Completed);
        assert_eq!(reservation.completed_at, Some(now()));
        assert!(reservation.complete_payment(now()).is_err());
    }

    #[test]
    fn test_reservation_dates_serialize_as_iso() {
        let car = Service::new(ServiceCategory::Cars, "Clio", 30.0);
        let reservation = new_reservation(
            &car,
            &request(Some(date!(2026 - 10 - 01)), Some(date!(2026 - 10 - 02))),
            now(),
        )
        .unwrap();
        let json = serde_json::to_value(&reservation).unwrap();
        assert_eq!(json["start_date"], "2026-10-01");
        assert_eq!(json["payment_status"], "pending");
        let back: Reservation = serde_json::from_value(json).unwrap();
        assert_eq!(back, reservation);
    }

    fn inquiry_request() -> InquiryRequest {
        InquiryRequest {
            service_id: "s1".to_string(),
            name: "Ana".to_string(),
            email: Some("ana@example.com".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_inquiry_contact_rules() {
        assert!(inquiry_request().validate().is_ok());

        let no_name = InquiryRequest {
            name: "  ".to_string(),
            ..inquiry_request()
        };
        assert!(no_name.validate().is_err());

        let whatsapp_without_phone = InquiryRequest {
            channel: ContactChannel::Whatsapp,
            email: None,
            ..inquiry_request()
        };
        let err = whatsapp_without_phone.validate().unwrap_err();
        assert_eq!(err.field_errors()[0].field, "phone");

        let whatsapp = InquiryRequest {
            channel: ContactChannel::Whatsapp,
            email: None,
            phone: Some("+212 600 000 000".to_string()),
            ..inquiry_request()
        };
        assert!(whatsapp.validate().is_ok());

        let bad_email = InquiryRequest {
            email: Some("ana@".to_string()),
            ..inquiry_request()
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_transfer_inquiry_gets_route_estimate() {
        let transfer = Service::new(ServiceCategory::Transport, "Transfer", 50.0);
        let request = InquiryRequest {
            origin: Some(" Marrakech ".to_string()),
            destination: Some("Agadir".to_string()),
            passengers: Some(6),
            ..inquiry_request()
        };
        let inquiry = Inquiry::from_request(request, &transfer, now());
        assert_eq!(inquiry.origin.as_deref(), Some("Marrakech"));
        assert_eq!(inquiry.price_estimate, Some(165.0));
    }

    #[test]
    fn test_template_data_is_escaped() {
        let trip = Service::new(ServiceCategory::Trips, "Desert & Dunes", 200.0);
        let request = InquiryRequest {
            name: "<Ana>".to_string(),
            message: Some("Call me <soon>".to_string()),
            ..inquiry_request()
        };
        let inquiry = Inquiry::from_request(request, &trip, now());
        let data = inquiry.template_data(Settings::defaults());
        assert_eq!(data.get("customer_name"), Some("&lt;Ana&gt;"));
        assert_eq!(data.get("service_name"), Some("Desert &amp; Dunes"));
        assert_eq!(data.get("customer_phone"), None);
        assert_eq!(
            render("{{details}}", &data),
            "<ul><li><strong>Message:</strong> Call me &lt;soon&gt;</li></ul>"
        );
    }

    #[test]
    fn test_details_list_order() {
        let hotel = Service::new(ServiceCategory::Hotels, "Riad", 80.0);
        let request = InquiryRequest {
            phone: Some("+212600000000".to_string()),
            start_date: Some(date!(2026 - 10 - 01)),
            end_date: Some(date!(2026 - 10 - 03)),
            price_estimate: Some(160.0),
            ..inquiry_request()
        };
        let html = Inquiry::from_request(request, &hotel, now()).details_html();
        let phone = html.find("Phone").unwrap();
        let dates = html.find("2026-10-01 to 2026-10-03").unwrap();
        let estimate = html.find("160.00").unwrap();
        assert!(phone < dates && dates < estimate);
    }
}
