use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::router::auth_routes;
use shared_config::AppConfig;
use shared_models::user::UserType;
use shared_utils::password;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

fn test_app(config: AppConfig) -> Router {
    auth_routes(Arc::new(config))
}

fn config_for(mock_server: &MockServer) -> AppConfig {
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();
    config
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn register_body(email: &str, mobile: &str) -> Value {
    json!({
        "full_name": "Test Patient",
        "email": email,
        "mobile": mobile,
        "password": "long-enough-password",
        "user_type": "patient",
        "available_timeslots": null,
        "profile_image": null
    })
}

#[tokio::test]
async fn registers_a_new_user() {
    let mock_server = MockServer::start().await;
    let app = test_app(config_for(&mock_server));

    // Neither email nor mobile is taken yet.
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::user_row(
                Uuid::new_v4(),
                "Test Patient",
                "patient@example.com",
                UserType::Patient,
                None,
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/register")
        .header("content-type", "application/json")
        .body(Body::from(register_body("patient@example.com", "01700000000").to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], json!(true));
    assert_eq!(json["user"]["email"], json!("patient@example.com"));
    // The hash must never appear in a response.
    assert!(json["user"].get("hashed_password").is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let mock_server = MockServer::start().await;
    let app = test_app(config_for(&mock_server));

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.patient@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_row(
                Uuid::new_v4(),
                "Existing",
                "patient@example.com",
                UserType::Patient,
                None,
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/register")
        .header("content-type", "application/json")
        .body(Body::from(register_body("patient@example.com", "01700000001").to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], json!("Email already registered"));
}

#[tokio::test]
async fn duplicate_mobile_is_rejected() {
    let mock_server = MockServer::start().await;
    let app = test_app(config_for(&mock_server));

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.new@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("mobile", "eq.01700000000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_row(
                Uuid::new_v4(),
                "Existing",
                "other@example.com",
                UserType::Patient,
                None,
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/register")
        .header("content-type", "application/json")
        .body(Body::from(register_body("new@example.com", "01700000000").to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], json!("Mobile number already registered"));
}

#[tokio::test]
async fn malformed_registration_is_rejected() {
    let mock_server = MockServer::start().await;
    let app = test_app(config_for(&mock_server));

    let request = Request::builder()
        .method("POST")
        .uri("/register")
        .header("content-type", "application/json")
        .body(Body::from(register_body("not-an-email", "01700000000").to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_returns_a_bearer_token() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let app = test_app(config.clone());

    let mut row = MockSupabaseResponses::user_row(
        Uuid::new_v4(),
        "Test Patient",
        "patient@example.com",
        UserType::Patient,
        None,
    );
    row["hashed_password"] = json!(password::hash_password("long-enough-password").unwrap());

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.patient@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": "patient@example.com", "password": "long-enough-password" }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["token_type"], json!("bearer"));

    // The issued token passes our own validation.
    let token = json["access_token"].as_str().unwrap();
    assert!(shared_utils::jwt::validate_token(token, &config.jwt_secret).is_ok());
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let mock_server = MockServer::start().await;
    let app = test_app(config_for(&mock_server));

    let mut row = MockSupabaseResponses::user_row(
        Uuid::new_v4(),
        "Test Patient",
        "patient@example.com",
        UserType::Patient,
        None,
    );
    row["hashed_password"] = json!(password::hash_password("the-real-password").unwrap());

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": "patient@example.com", "password": "a-guess" }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_email_is_unauthorized() {
    let mock_server = MockServer::start().await;
    let app = test_app(config_for(&mock_server));

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": "nobody@example.com", "password": "whatever-long" }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn validate_accepts_our_tokens_and_rejects_garbage() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);

    let user = TestUser::doctor("doctor@example.com");
    let token = user.token(&config.jwt_secret);

    let request = Request::builder()
        .method("POST")
        .uri("/validate")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = test_app(config.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["valid"], json!(true));
    assert_eq!(json["role"], json!("doctor"));

    let request = Request::builder()
        .method("POST")
        .uri("/validate")
        .header("authorization", "Bearer not.a.token")
        .body(Body::empty())
        .unwrap();

    let response = test_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
