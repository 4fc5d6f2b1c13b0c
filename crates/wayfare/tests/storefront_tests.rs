use time::macros::{date, datetime};
use wayfare::{
    CatalogFilter, Category, EmailTemplateKind, EmptyState, Inquiry, InquiryRequest, PriceRange,
    ReservationRequest, SeatRange, Service, ServiceCategory, Settings, SettingsOverride,
    StagedList, Validate, details, new_reservation, render, resolve, template_data,
};

fn fleet() -> Vec<Service> {
    vec![
        Service::new(ServiceCategory::Cars, "Clio", 30.0)
            .with_details(details! { "Seats" => "5", "Transmission" => "Manual" }),
        Service::new(ServiceCategory::Cars, "Duster", 55.0)
            .with_details(details! { "Seats" => "5 seats" }),
        Service::new(ServiceCategory::Cars, "Picanto", 25.0)
            .with_details(details! { "Seats" => "four" }),
        Service::new(ServiceCategory::Cars, "Vito", 120.0)
            .with_details(details! { "Seats" => "8" })
            .with_active(false),
    ]
}

#[test]
fn test_catalog_uses_overridden_categories() {
    let overrides = SettingsOverride {
        categories: Some(vec![Category::new("cars", "Cars")]),
        ..Default::default()
    };
    let settings = resolve(Settings::defaults(), Some(&overrides));

    let cars = wayfare::filter_catalog(
        &settings,
        ServiceCategory::Cars,
        &fleet(),
        &CatalogFilter::default(),
    );
    assert_eq!(cars.services.len(), 3);
    assert_eq!(cars.active_count, 3);

    let hotels = wayfare::filter_catalog(&settings, ServiceCategory::Hotels, &[], &CatalogFilter::default());
    assert_eq!(hotels.empty_state, Some(EmptyState::CategoryDisabled));
}

#[test]
fn test_car_filters_combine() {
    let filter = CatalogFilter {
        price: PriceRange::From50To100,
        seats: SeatRange::FivePlus,
        ..Default::default()
    };
    let view = wayfare::filter_catalog(Settings::defaults(), ServiceCategory::Cars, &fleet(), &filter);
    let names: Vec<&str> = view.services.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Duster"]);

    let small = CatalogFilter {
        seats: SeatRange::TwoToFour,
        ..Default::default()
    };
    let view = wayfare::filter_catalog(Settings::defaults(), ServiceCategory::Cars, &fleet(), &small);
    assert_eq!(view.empty_state, Some(EmptyState::NoMatch));
}

#[test]
fn test_inquiry_emails_render_from_defaults() {
    let hotel = Service::new(ServiceCategory::Hotels, "Riad Dar", 90.0).with_location("Marrakech");
    let request = InquiryRequest {
        service_id: hotel.id.clone(),
        name: "Sam O'Neil".to_string(),
        email: Some("sam@example.com".to_string()),
        start_date: Some(date!(2026 - 11 - 02)),
        end_date: Some(date!(2026 - 11 - 05)),
        ..Default::default()
    };
    request.validate().unwrap();

    let inquiry = Inquiry::from_request(request, &hotel, datetime!(2026-10-17 12:00 UTC));
    let data = inquiry.template_data(Settings::defaults());

    let admin = EmailTemplateKind::AdminNotification
        .default_template()
        .render(&data);
    assert_eq!(admin.subject, "New inquiry: Riad Dar");
    assert!(admin.html.contains("Sam O&#39;Neil"));
    assert!(admin.html.contains("2026-11-02 to 2026-11-05"));
    assert!(!admin.html.contains("{{"));

    let client = EmailTemplateKind::ClientConfirmation
        .default_template()
        .render(&data);
    assert!(client.html.contains(&Settings::defaults().contact_email));
}

#[test]
fn test_reservation_for_hotel_nights() {
    let hotel = Service::new(ServiceCategory::Hotels, "Riad Dar", 90.0);
    let request = ReservationRequest {
        service_id: hotel.id.clone(),
        start_date: Some(date!(2026 - 11 - 02)),
        end_date: Some(date!(2026 - 11 - 05)),
        user_id: Some("   ".to_string()),
        ..Default::default()
    };
    let reservation = new_reservation(&hotel, &request, datetime!(2026-10-17 12:00 UTC)).unwrap();
    assert_eq!(reservation.total, 270.0);
    assert_eq!(reservation.user_id, "anonymous");
}

#[test]
fn test_staged_categories_commit_valid_list() {
    let mut staged = StagedList::new(Settings::defaults().categories.clone());
    staged.duplicate("trips").unwrap();
    staged.remove("transport").unwrap();

    let categories = staged.commit().unwrap();
    wayfare::validate_categories(&categories).unwrap();
    assert!(categories.iter().any(|c| c.id == "trips-copy" && c.path == "/trips-copy"));
}

#[test]
fn test_placeholder_values_are_not_rescanned() {
    let data = template_data! { "a" => "{{b}}", "b" => "x" };
    assert_eq!(render("{{a}}-{{b}}", &data), "{{b}}-x");
}
