//! HTTP route handlers for the billing API.
//!
//! All routes live under `/api` and answer JSON. CORS is open to any origin:
//! callers authenticate with bearer tokens, never cookies.

mod stripe;
mod webhooks;

use std::time::Duration;

use axum::{
    Json, Router,
    http::{Method, header},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::AuthenticatedUser;
use crate::state::AppState;

/// Build the API router (without state).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/session", get(session))
        .route("/api/stripe/products", get(stripe::list_products))
        .route("/api/stripe/prices", get(stripe::list_prices))
        .route(
            "/api/stripe/checkout/sessions",
            post(stripe::create_checkout_session),
        )
        .route("/api/webhooks/stripe", post(webhooks::stripe))
}

/// CORS policy applied to every response, errors included.
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(86400))
}

/// Build the full application with CORS and state.
pub fn app(state: AppState) -> Router {
    routes().layer(cors_layer()).with_state(state)
}

/// `GET /api/health`
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `GET /api/session`: echo the verified caller.
async fn session(user: AuthenticatedUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "userId": user.user_id }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use wiremock::matchers::{header as header_matcher, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::tests::test_config;
    use crate::stripe::webhook::tests::signature_header;

    async fn setup() -> (MockServer, Router) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header_matcher("authorization", "Bearer good-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "user-1"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let router = app(AppState::new(test_config(&server.uri())));
        (server, router)
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn checkout_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/stripe/checkout/sessions")
            .header("authorization", "Bearer good-token")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn webhook_request(payload: &str, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/webhooks/stripe");
        if let Some(signature) = signature {
            builder = builder.header("stripe-signature", signature);
        }
        builder.body(Body::from(payload.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (_server, router) = setup().await;
        let (status, body) = send(router, get_request("/api/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_session_requires_bearer_token() {
        let (_server, router) = setup().await;
        let (status, body) = send(router, get_request("/api/session", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Missing or invalid Authorization header");
    }

    #[tokio::test]
    async fn test_session_rejects_expired_token() {
        let (_server, router) = setup().await;
        let (status, body) = send(router, get_request("/api/session", Some("stale"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn test_session_echoes_user_id() {
        let (_server, router) = setup().await;
        let (status, body) =
            send(router, get_request("/api/session", Some("good-token"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"userId": "user-1"}));
    }

    #[tokio::test]
    async fn test_products_are_projected() {
        let (server, router) = setup().await;
        Mock::given(method("GET"))
            .and(path("/v1/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "id": "prod_1",
                    "name": "Base",
                    "description": "Starter plan",
                    "default_price": {"id": "price_1", "unit_amount": 800}
                }]
            })))
            .mount(&server)
            .await;

        let (status, body) = send(router, get_request("/api/stripe/products", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!([{
                "id": "prod_1",
                "name": "Base",
                "description": "Starter plan",
                "defaultPriceId": "price_1"
            }])
        );
    }

    #[tokio::test]
    async fn test_prices_are_projected_with_defaults() {
        let (server, router) = setup().await;
        Mock::given(method("GET"))
            .and(path("/v1/prices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"id": "price_1", "product": "prod_1"}]
            })))
            .mount(&server)
            .await;

        let (status, body) = send(router, get_request("/api/stripe/prices", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!([{
                "id": "price_1",
                "productId": "prod_1",
                "unitAmount": 0,
                "currency": "usd",
                "interval": null,
                "trialPeriodDays": null
            }])
        );
    }

    #[tokio::test]
    async fn test_stripe_failure_is_bad_gateway() {
        let (server, router) = setup().await;
        Mock::given(method("GET"))
            .and(path("/v1/products"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (status, body) = send(router, get_request("/api/stripe/products", None)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "External service error");
    }

    #[tokio::test]
    async fn test_checkout_returns_hosted_url() {
        let (server, router) = setup().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cs_1",
                "url": "https://checkout.stripe.com/c/pay/cs_1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = send(router, checkout_request(r#"{"priceId":"price_1"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["url"], "https://checkout.stripe.com/c/pay/cs_1");
    }

    #[tokio::test]
    async fn test_checkout_rejects_invalid_body() {
        let (_server, router) = setup().await;
        let (status, body) = send(router, checkout_request(r#"{"price":"price_1"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn test_checkout_requires_authentication() {
        let (_server, router) = setup().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/stripe/checkout/sessions")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"priceId":"price_1"}"#))
            .unwrap();
        let (status, _) = send(router, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_webhook_accepts_signed_event() {
        let (_server, router) = setup().await;
        let payload = r#"{"type":"customer.subscription.updated","data":{"object":{"id":"sub_1"}}}"#;
        let signature = signature_header("whsec_test", chrono::Utc::now().timestamp(), payload);

        let (status, body) = send(router, webhook_request(payload, Some(signature))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"received": true}));
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_signature() {
        let (_server, router) = setup().await;
        let payload = r#"{"type":"customer.subscription.deleted","data":{"object":{}}}"#;
        let signature = signature_header("whsec_wrong", chrono::Utc::now().timestamp(), payload);

        let (status, body) = send(router, webhook_request(payload, Some(signature))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid signature");
    }

    #[tokio::test]
    async fn test_webhook_without_signature_header() {
        let (_server, router) = setup().await;
        let (status, body) = send(router, webhook_request("{}", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing timestamp");
    }

    #[tokio::test]
    async fn test_webhook_rejects_unparseable_event() {
        let (_server, router) = setup().await;
        let payload = "not json";
        let signature = signature_header("whsec_test", chrono::Utc::now().timestamp(), payload);

        let (status, body) = send(router, webhook_request(payload, Some(signature))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid event payload");
    }

    #[tokio::test]
    async fn test_cors_headers_on_errors() {
        let (_server, router) = setup().await;
        let request = Request::builder()
            .uri("/api/session")
            .header("origin", "http://localhost:5285")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let (_server, router) = setup().await;
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/stripe/checkout/sessions")
            .header("origin", "http://localhost:5285")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "authorization,content-type")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert!(response.status().is_success());
        assert_eq!(response.headers()["access-control-max-age"], "86400");
    }
}
