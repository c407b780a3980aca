//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use crate::middleware::RequireAuth;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub email: String,
}

/// Display the home page for the signed-in user.
pub async fn home(auth: RequireAuth) -> impl IntoResponse {
    HomeTemplate {
        email: auth.user.email_or_empty().to_string(),
    }
}
