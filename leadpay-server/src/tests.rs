//! Router tests against in-memory store and gateway.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode, header};
use leadpay_core::config::{RateLimitConfig, ServerConfig, SharedConfig};
use leadpay_core::entities::{PaymentStatus, UserPaymentStatus};
use leadpay_core::testing::{MemoryGateway, MemoryStore, SIGNING_SECRET, checkout_config, signing_config};
use leadpay_sdk::signature::sign_callback;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

use crate::server::build_router;
use crate::state::AppState;

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    gateway: Arc<MemoryGateway>,
}

fn app() -> TestApp {
    app_with_rate_limit(RateLimitConfig::default())
}

fn app_with_rate_limit(rate_limit: RateLimitConfig) -> TestApp {
    let store = Arc::new(MemoryStore::default());
    let gateway = Arc::new(MemoryGateway::default());
    let state = AppState::new(
        store.clone(),
        gateway.clone(),
        SharedConfig::new(checkout_config(), signing_config()),
    );
    let server = ServerConfig {
        listen: SocketAddr::from(([127, 0, 0, 1], 0)),
        allowed_origins: vec!["http://localhost:5173".to_owned()],
        rate_limit,
    };
    let router = build_router(state, &server).unwrap();
    TestApp {
        router,
        store,
        gateway,
    }
}

impl TestApp {
    /// Send a request as if it arrived from a local peer.
    async fn send(&self, mut req: Request<Body>) -> axum::response::Response {
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Submit a valid lead and return the order id from the checkout link.
    async fn submit(&self, email: &str, mobile: &str) -> String {
        let res = self.send(submit_json(lead(email, mobile))).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        let location = Url::parse(location(&res)).unwrap();
        let pairs: HashMap<String, String> = location.query_pairs().into_owned().collect();
        pairs["order_id"].clone()
    }
}

fn lead(email: &str, mobile: &str) -> Value {
    json!({
        "name": "Asha Rao",
        "mobile": mobile,
        "email": email,
        "city": "Pune",
        "experience": "Beginner",
    })
}

fn submit_json(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/users/submit")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn location(res: &axum::response::Response) -> &str {
    res.headers()[header::LOCATION].to_str().unwrap()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn verify_uri(order_id: &str, payment_id: &str, signature: &str) -> String {
    format!(
        "/api/payment/verify?razorpay_order_id={order_id}&razorpay_payment_id={payment_id}&razorpay_signature={signature}"
    )
}

async fn payment_status(app: &TestApp, order_id: &str) -> (PaymentStatus, UserPaymentStatus) {
    let order = app.gateway.order(order_id).unwrap();
    let user = app.store.user(order.user_id().unwrap()).await.unwrap();
    let payment = app.store.payment(user.payment_id.unwrap()).await.unwrap();
    (payment.status, user.payment_status)
}

#[tokio::test]
async fn test_submit_redirects_to_checkout() {
    let app = app();
    let res = app.send(submit_json(lead("a@x.com", "9999999999"))).await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let location = Url::parse(location(&res)).unwrap();
    assert_eq!(location.host_str(), Some("api.razorpay.com"));
    let pairs: HashMap<String, String> = location.query_pairs().into_owned().collect();
    assert_eq!(pairs["prefill[email]"], "a@x.com");
    assert_eq!(
        pairs["callback_url"],
        "http://localhost:5000/api/payment/verify"
    );
    assert_eq!(app.store.user_count().await, 1);
}

#[tokio::test]
async fn test_submit_accepts_urlencoded_form() {
    let app = app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/users/submit")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(
            "name=Asha&mobile=9999999999&email=a%40x.com&city=Pune&experience=None",
        ))
        .unwrap();

    let res = app.send(req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.store.payment_count().await, 1);
}

#[tokio::test]
async fn test_submit_reports_every_invalid_field() {
    let app = app();
    let res = app
        .send(submit_json(json!({
            "name": "A",
            "mobile": "12345",
            "email": "nope",
            "city": "Pune",
            "experience": "Expert",
        })))
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Validation failed");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["name", "mobile", "email", "experience"]);
    assert_eq!(app.store.user_count().await, 0);
}

#[tokio::test]
async fn test_submit_rejects_malformed_json() {
    let app = app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/users/submit")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{"))
        .unwrap();

    let res = app.send(req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["success"], false);
}

#[tokio::test]
async fn test_duplicate_submission_is_rejected() {
    let app = app();
    app.submit("a@x.com", "9999999999").await;

    let res = app.send(submit_json(lead("a@x.com", "8888888888"))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(
        body["message"],
        "User with this email or mobile number already exists"
    );
    assert_eq!(app.store.user_count().await, 1);
    assert_eq!(app.gateway.order_count(), 1);
}

#[tokio::test]
async fn test_gateway_outage_is_bad_gateway() {
    let app = app();
    app.gateway.set_unavailable(true);

    let res = app.send(submit_json(lead("a@x.com", "9999999999"))).await;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(res).await["success"], false);
    assert_eq!(app.store.user_count().await, 0);
}

#[tokio::test]
async fn test_get_user_with_payment() {
    let app = app();
    let order_id = app.submit("a@x.com", "9999999999").await;
    let user_id = app.gateway.order(&order_id).unwrap().user_id().unwrap();

    let res = app.send(get(&format!("/api/users/{user_id}"))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "a@x.com");
    assert_eq!(body["data"]["experience"], "Beginner");
    assert_eq!(body["data"]["payment_status"], "pending");
    assert_eq!(body["data"]["payment"]["order_id"], order_id);
    assert_eq!(body["data"]["payment"]["status"], "created");
}

#[tokio::test]
async fn test_get_user_not_found() {
    let app = app();
    for uri in [
        format!("/api/users/{}", Uuid::now_v7()),
        "/api/users/not-a-uuid".to_owned(),
    ] {
        let res = app.send(get(&uri)).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(res).await["message"], "User not found");
    }
}

#[tokio::test]
async fn test_verify_get_with_valid_signature() {
    let app = app();
    let order_id = app.submit("a@x.com", "9999999999").await;
    let signature = sign_callback(&order_id, "pay_1", SIGNING_SECRET);

    let res = app.send(get(&verify_uri(&order_id, "pay_1", &signature))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&res),
        "http://localhost:5173/success?payment_id=pay_1"
    );
    assert_eq!(
        payment_status(&app, &order_id).await,
        (PaymentStatus::Paid, UserPaymentStatus::Completed)
    );

    // Replaying the same callback changes nothing.
    let res = app.send(get(&verify_uri(&order_id, "pay_1", &signature))).await;
    assert_eq!(
        location(&res),
        "http://localhost:5173/success?payment_id=pay_1"
    );
    assert_eq!(
        payment_status(&app, &order_id).await,
        (PaymentStatus::Paid, UserPaymentStatus::Completed)
    );
}

#[tokio::test]
async fn test_verify_post_with_forged_signature() {
    let app = app();
    let order_id = app.submit("a@x.com", "9999999999").await;
    let forged = sign_callback(&order_id, "pay_1", b"guess");

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/payment/verify")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "razorpay_order_id={order_id}&razorpay_payment_id=pay_1&razorpay_signature={forged}"
        )))
        .unwrap();

    let res = app.send(req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "http://localhost:5173/?error=signature_failed");
    assert_eq!(
        payment_status(&app, &order_id).await,
        (PaymentStatus::Failed, UserPaymentStatus::Failed)
    );
}

#[tokio::test]
async fn test_concurrent_callbacks_settle_on_one_outcome() {
    let app = app();
    let order_id = app.submit("a@x.com", "9999999999").await;
    let signature = sign_callback(&order_id, "pay_1", SIGNING_SECRET);
    let forged = "0".repeat(64);

    let (genuine, spoofed) = tokio::join!(
        app.send(get(&verify_uri(&order_id, "pay_1", &signature))),
        app.send(get(&verify_uri(&order_id, "pay_1", &forged))),
    );

    assert_eq!(
        location(&spoofed),
        "http://localhost:5173/?error=signature_failed"
    );
    match payment_status(&app, &order_id).await {
        (PaymentStatus::Paid, UserPaymentStatus::Completed) => assert_eq!(
            location(&genuine),
            "http://localhost:5173/success?payment_id=pay_1"
        ),
        (PaymentStatus::Failed, UserPaymentStatus::Failed) => assert_eq!(
            location(&genuine),
            "http://localhost:5173/?error=payment_closed"
        ),
        other => panic!("records disagree: {other:?}"),
    }
    assert_eq!(app.store.payment_count().await, 1);
}

#[tokio::test]
async fn test_verify_without_params_redirects() {
    let app = app();
    let res = app.send(get("/api/payment/verify")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "http://localhost:5173/?error=missing_params");
}

#[tokio::test]
async fn test_verify_failure_redirects_with_server_error() {
    let app = app();
    let order_id = app.submit("a@x.com", "9999999999").await;
    let signature = sign_callback(&order_id, "pay_1", SIGNING_SECRET);
    app.gateway.set_unavailable(true);

    let res = app.send(get(&verify_uri(&order_id, "pay_1", &signature))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "http://localhost:5173/?error=server_error");
}

#[tokio::test]
async fn test_failed_callback() {
    let app = app();
    let order_id = app.submit("a@x.com", "9999999999").await;

    let res = app
        .send(get(&format!("/api/payment/failed?orderId={order_id}")))
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "http://localhost:5173/?reason=user_cancelled");
    assert_eq!(
        payment_status(&app, &order_id).await,
        (PaymentStatus::Cancelled, UserPaymentStatus::Failed)
    );

    let res = app.send(get("/api/payment/failed?orderId=order_unknown")).await;
    assert_eq!(location(&res), "http://localhost:5173/?reason=user_cancelled");

    let res = app.send(get("/api/payment/failed")).await;
    assert_eq!(location(&res), "http://localhost:5173/?error=missing_order_id");
}

#[tokio::test]
async fn test_health_and_fallback() {
    let app = app();
    for uri in ["/health", "/api/health"] {
        let res = app.send(get(uri)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["x-content-type-options"], "nosniff");
        assert_eq!(res.headers()["x-frame-options"], "SAMEORIGIN");
        let body = json_body(res).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    let res = app.send(get("/api/nope")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await["message"], "API route not found");
}

#[tokio::test]
async fn test_wrong_method_uses_json_envelope() {
    let app = app();
    let res = app.send(get("/api/users/submit")).await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = json_body(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Method not allowed");
}

#[tokio::test]
async fn test_rate_limit_applies_per_ip_except_payment() {
    let app = app_with_rate_limit(RateLimitConfig {
        max_requests: 2,
        window: Duration::from_secs(3600),
    });

    for _ in 0..2 {
        assert_eq!(app.send(get("/api/health")).await.status(), StatusCode::OK);
    }
    let res = app.send(get("/api/users/not-a-uuid")).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
    let body = json_body(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Too many requests from this IP, please try again later."
    );

    // Gateway callbacks are never limited.
    for _ in 0..3 {
        let res = app.send(get("/api/payment/verify")).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
    }

    // A different client behind the proxy has its own budget.
    let req = Request::builder()
        .uri("/api/health")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(req).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_policies() {
    let app = app();
    let preflight = |uri: &str, origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let res = app
        .send(preflight("/api/payment/verify", "https://checkout.razorpay.com"))
        .await;
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let res = app
        .send(preflight("/api/users/submit", "http://localhost:5173"))
        .await;
    assert_eq!(
        res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );

    let res = app
        .send(preflight("/api/users/submit", "https://evil.example"))
        .await;
    assert!(
        res.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}
