//! HTTP route handlers for the web app.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health             - Health check
//!
//! # Auth (public)
//! GET  /sign-in            - Sign-in form
//! POST /sign-in            - Sign-in action (rate limited)
//! GET  /sign-up            - Sign-up form
//! POST /sign-up            - Sign-up action (rate limited)
//!
//! # App (requires auth)
//! GET  /                   - Home page
//! POST /sign-out           - Sign-out action
//! GET  /pricing            - Plans and prices
//! POST /pricing/checkout   - Start hosted checkout
//! ```

pub mod auth;
pub mod home;
pub mod pricing;

use axum::{
    Router,
    http::{StatusCode, Uri},
    middleware::from_fn,
    response::IntoResponse,
    routing::{get, post},
};

use crate::middleware::auth::ErrorPanelTemplate;
use crate::middleware::{
    create_session_layer, credentials_rate_limiter, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Create the public auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let limiter = credentials_rate_limiter();

    Router::new()
        .route(
            "/sign-in",
            get(auth::sign_in_page).merge(post(auth::sign_in).layer(limiter.clone())),
        )
        .route(
            "/sign-up",
            get(auth::sign_up_page).merge(post(auth::sign_up).layer(limiter)),
        )
}

/// Create the protected app routes router.
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/sign-out", post(auth::sign_out))
        .route(pricing::PRICING_PATH, get(pricing::index))
        .route("/pricing/checkout", post(pricing::checkout))
}

/// Create all routes for the web app.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(app_routes())
        .fallback(not_found)
}

/// Build the application with sessions and per-request middleware.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    routes()
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Unknown paths.
async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        ErrorPanelTemplate {
            title: "404 Not Found".to_string(),
            message: format!("No route matches URL \"{}\"", uri.path()),
        },
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, Response, header};
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::billing::BillingClient;
    use crate::config::{AppConfig, DEFAULT_API_URL, IdentityConfig};
    use crate::identity::testing::FakeIdentity;
    use crate::identity::{ConfigurationError, Identity, MISSING_CONFIGURATION_MESSAGE};

    fn config(api_url: &str) -> AppConfig {
        AppConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 5285,
            base_url: "http://localhost:5285".to_string(),
            identity: IdentityConfig::default(),
            api_url: api_url.to_string(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    fn app_with(identity: Identity, api_url: &str) -> Router {
        let state = AppState::from_parts(config(api_url), identity, BillingClient::new(api_url));
        app(state)
    }

    fn app_for(fake: FakeIdentity) -> Router {
        app_with(Identity::with_service(Arc::new(fake)), DEFAULT_API_URL)
    }

    fn get_req(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn location(response: &Response<Body>) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    fn session_cookie(response: &Response<Body>) -> String {
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn sign_in(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(post_form(
                "/sign-in",
                "email=ada%40example.com&password=hunter22",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        session_cookie(&response)
    }

    #[tokio::test]
    async fn test_health() {
        let response = app_for(FakeIdentity::default())
            .oneshot(get_req("/health", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_anonymous_home_redirects_to_sign_in() {
        let response = app_for(FakeIdentity::default())
            .oneshot(get_req("/", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/sign-in");
    }

    #[tokio::test]
    async fn test_unconfigured_identity_shows_error_panel() {
        let app = app_with(
            Identity::unavailable(ConfigurationError::new(MISSING_CONFIGURATION_MESSAGE)),
            DEFAULT_API_URL,
        );

        let response = app.oneshot(get_req("/pricing", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = body_text(response).await;
        assert!(html.contains("Configuration Error"));
        assert!(html.contains("Set SUPABASE_URL and SUPABASE_ANON_KEY"));
    }

    #[tokio::test]
    async fn test_unconfigured_identity_on_sign_in_form() {
        let app = app_with(
            Identity::from_config(&IdentityConfig::default()),
            DEFAULT_API_URL,
        );

        let response = app
            .oneshot(post_form(
                "/sign-in",
                "email=ada%40example.com&password=hunter22",
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Supabase is not configured"));
    }

    #[tokio::test]
    async fn test_sign_in_then_home() {
        let app = app_for(FakeIdentity::with_account("ada@example.com", "hunter22"));
        let cookie = sign_in(&app).await;

        let response = app.oneshot(get_req("/", Some(&cookie))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Welcome, ada@example.com"));
    }

    #[tokio::test]
    async fn test_failed_sign_in_keeps_email_and_drops_password() {
        let app = app_for(FakeIdentity::with_account("ada@example.com", "hunter22"));

        let response = app
            .oneshot(post_form(
                "/sign-in",
                "email=ada%40example.com&password=wrong-guess",
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Invalid login credentials"));
        assert!(html.contains("value=\"ada@example.com\""));
        assert!(!html.contains("wrong-guess"));
        assert!(html.contains("Sign In"));
    }

    #[tokio::test]
    async fn test_short_sign_up_password_never_reaches_identity() {
        let fake = Arc::new(FakeIdentity::default());
        let app = app_with(
            Identity::with_service(Arc::clone(&fake) as Arc<dyn crate::identity::IdentityService>),
            DEFAULT_API_URL,
        );

        let response = app
            .oneshot(post_form("/sign-up", "email=new%40example.com&password=abc", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Please lengthen this text to 6 characters"));
        assert_eq!(fake.account_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_forms_rerender_enabled() {
        let app = app_for(FakeIdentity::with_account("ada@example.com", "hunter22"));

        let response = app
            .clone()
            .oneshot(post_form("/sign-in", "email=ada%40example.com&password=nope", None))
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("<button type=\"submit\">Sign In</button>"));
        assert!(!html.contains("disabled"));

        let response = app
            .oneshot(post_form("/sign-up", "email=new%40example.com&password=abc", None))
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("<button type=\"submit\">Sign Up</button>"));
        assert!(!html.contains("disabled"));
    }

    #[tokio::test]
    async fn test_sign_up_redirects_home() {
        let app = app_for(FakeIdentity::default());

        let response = app
            .clone()
            .oneshot(post_form("/sign-up", "email=new%40example.com&password=abcdef", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        let cookie = session_cookie(&response);
        let response = app.oneshot(get_req("/", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_shows_service_message() {
        let app = app_for(FakeIdentity::with_account("ada@example.com", "hunter22"));

        let response = app
            .oneshot(post_form("/sign-up", "email=ada%40example.com&password=abcdef", None))
            .await
            .unwrap();

        assert!(body_text(response).await.contains("User already registered"));
    }

    #[tokio::test]
    async fn test_sign_out_ends_session() {
        let app = app_for(FakeIdentity::with_account("ada@example.com", "hunter22"));
        let cookie = sign_in(&app).await;

        let response = app
            .clone()
            .oneshot(post_form("/sign-out", "", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/sign-in");

        let response = app.oneshot(get_req("/", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_failed_sign_out_shows_error_panel() {
        let app = app_for(
            FakeIdentity::with_account("ada@example.com", "hunter22").failing_sign_out(),
        );
        let cookie = sign_in(&app).await;

        let response = app
            .oneshot(post_form("/sign-out", "", Some(&cookie)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("Service unavailable"));
    }

    #[tokio::test]
    async fn test_pricing_and_checkout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/stripe/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "prod_base", "name": "Base", "description": null, "defaultPriceId": "price_base" }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/stripe/prices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "price_base", "productId": "prod_base", "unitAmount": 900, "currency": "usd", "interval": "month", "trialPeriodDays": 14 }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/stripe/checkout/sessions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "url": "https://checkout.stripe.com/c/pay/cs_test" })),
            )
            .mount(&server)
            .await;

        let app = app_with(
            Identity::with_service(Arc::new(FakeIdentity::with_account(
                "ada@example.com",
                "hunter22",
            ))),
            &server.uri(),
        );
        let cookie = sign_in(&app).await;

        let response = app
            .clone()
            .oneshot(get_req("/pricing", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("with 14 day free trial"));
        assert!(html.contains("$9"));
        assert!(html.contains("Subscribe"));
        assert!(html.contains("Unavailable"));

        let response = app
            .clone()
            .oneshot(post_form("/pricing/checkout", "price_id=price_base", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "https://checkout.stripe.com/c/pay/cs_test");

        let response = app
            .oneshot(post_form("/pricing/checkout", "price_id=", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(location(&response), "/pricing");
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let response = app_for(FakeIdentity::default())
            .oneshot(get_req("/nope", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = body_text(response).await;
        assert!(html.contains("404 Not Found"));
        assert!(html.contains("No route matches URL"));
        assert!(html.contains("/nope"));
    }
}
