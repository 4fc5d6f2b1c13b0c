//! Macros for ergonomic template data and details construction

/// Build a [`TemplateData`](crate::TemplateData) from `key => value` pairs
///
/// # Examples
///
/// ```rust
/// use wayfare::{template_data, render};
///
/// let data = template_data! {
///     "name" => "Ana",
///     "service_name" => String::from("Desert Trip"),
/// };
/// assert_eq!(render("{{name}} / {{service_name}}", &data), "Ana / Desert Trip");
/// ```
#[macro_export]
macro_rules! template_data {
    {} => {
        $crate::TemplateData::new()
    };

    { $($key:expr => $value:expr),+ $(,)? } => {
        {
            let mut data = $crate::TemplateData::new();
            $(
                data.insert($key, $value);
            )+
            data
        }
    };
}

/// Build a service [`Details`](crate::Details) map from `key => value` pairs
///
/// # Examples
///
/// ```rust
/// use wayfare::details;
///
/// let details = details! { "Seats" => "5", "Fuel" => "Diesel" };
/// assert_eq!(details.seats(), Some(5));
/// ```
#[macro_export]
macro_rules! details {
    {} => {
        $crate::Details::new()
    };

    { $($key:expr => $value:expr),+ $(,)? } => {
        {
            let mut details = $crate::Details::new();
            $(
                details.insert($key, $value);
            )+
            details
        }
    };
}
