//! Minimal back office pages behind the route guard

use crate::AppState;
use axum::{Router, extract::OriginalUri, response::Html, routing::get};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_page))
        .route("/admin/{*rest}", get(admin_page))
        .route("/login", get(login_page))
}

async fn admin_page(OriginalUri(uri): OriginalUri) -> Html<String> {
    Html(format!(
        "<!doctype html><html><head><title>Wayfare admin</title></head>\
         <body><h1>Wayfare admin</h1><p>{}</p></body></html>",
        wayfare::escape_html(uri.path())
    ))
}

async fn login_page() -> Html<&'static str> {
    Html(
        "<!doctype html><html><head><title>Sign in</title></head>\
         <body><h1>Sign in</h1>\
         <p>POST your email and password to <code>/api/auth/login</code>.</p>\
         </body></html>",
    )
}
