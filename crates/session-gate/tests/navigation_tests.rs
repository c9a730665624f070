//! Navigation integration tests.
//!
//! Drives a real gate (`TestGateServer`) against a `wiremock` identity
//! backend and checks the redirect table end to end.

use gate_test_utils::TestGateServer;
use std::collections::HashMap;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COOKIE: &str = "__Host-access_token";

fn config_entries() -> serde_json::Value {
    serde_json::json!([
        {"key": "appName", "type": "string", "value": "Pocket ID"},
        {"key": "allowOwnAccountEdit", "type": "boolean", "value": "true"},
        {"key": "sessionDuration", "type": "number", "value": "60"}
    ])
}

/// Backend that knows one user token and serves the public configuration.
async fn backend(token: &str, is_admin: bool) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("cookie", format!("{COOKIE}={token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "5f1c7f0e",
            "username": "anna",
            "email": "anna@example.com",
            "firstName": "Anna",
            "isAdmin": is_admin
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "You are not signed in"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/application-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(config_entries()))
        .mount(&server)
        .await;

    server
}

async fn spawn(backend: &MockServer) -> Result<TestGateServer, anyhow::Error> {
    // No release is published on the backend mock; the settings area falls
    // back to the running version
    let feed_url = format!("{}/releases/latest", backend.uri());
    TestGateServer::spawn(&backend.uri(), &feed_url).await
}

fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_anonymous_protected_page_redirects_to_login() -> Result<(), anyhow::Error> {
    let backend = backend("tok", false).await;
    let server = spawn(&backend).await?;

    for page in ["/", "/settings/account", "/settings/admin/users", "/loginx"] {
        let response = server.client().get(server.url_for(page)).send().await?;

        assert_eq!(response.status(), 303, "page {page}");
        assert_eq!(location(&response), Some("/login"), "page {page}");
    }

    Ok(())
}

#[tokio::test]
async fn test_signed_in_login_page_redirects_to_settings() -> Result<(), anyhow::Error> {
    let backend = backend("tok", false).await;
    let server = spawn(&backend).await?;

    let response = server
        .client()
        .get(server.url_for("/login"))
        .header("cookie", format!("{COOKIE}=tok"))
        .send()
        .await?;

    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), Some("/settings"));

    Ok(())
}

#[tokio::test]
async fn test_anonymous_login_page_is_served() -> Result<(), anyhow::Error> {
    let backend = backend("tok", false).await;
    let server = spawn(&backend).await?;

    let response = server.client().get(server.url_for("/login")).send().await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert!(body["user"].is_null());
    assert_eq!(body["appConfig"]["appName"], "Pocket ID");
    assert_eq!(body["appConfig"]["allowOwnAccountEdit"], true);
    assert_eq!(body["appConfig"]["sessionDuration"], 60.0);

    Ok(())
}

#[tokio::test]
async fn test_authorize_is_public() -> Result<(), anyhow::Error> {
    let backend = backend("tok", false).await;
    let server = spawn(&backend).await?;

    let anonymous = server
        .client()
        .get(server.url_for("/authorize?client_id=abc&redirect_uri=https%3A%2F%2Fapp"))
        .send()
        .await?;
    assert_eq!(anonymous.status(), 200);

    let signed_in = server
        .client()
        .get(server.url_for("/authorize"))
        .header("cookie", format!("{COOKIE}=tok"))
        .send()
        .await?;
    assert_eq!(signed_in.status(), 200);
    let body: serde_json::Value = signed_in.json().await?;
    assert_eq!(body["user"]["username"], "anna");

    Ok(())
}

#[tokio::test]
async fn test_admin_area_requires_admin() -> Result<(), anyhow::Error> {
    let user_backend = backend("tok", false).await;
    let server = spawn(&user_backend).await?;

    let response = server
        .client()
        .get(server.url_for("/settings/admin"))
        .header("cookie", format!("{COOKIE}=tok"))
        .send()
        .await?;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), Some("/settings"));

    let admin_backend = backend("tok", true).await;
    let server = spawn(&admin_backend).await?;

    let response = server
        .client()
        .get(server.url_for("/settings/admin/oidc-clients"))
        .header("cookie", format!("{COOKIE}=tok"))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    Ok(())
}

#[tokio::test]
async fn test_bearer_header_is_accepted() -> Result<(), anyhow::Error> {
    let backend = backend("tok", false).await;
    let server = spawn(&backend).await?;

    let response = server
        .client()
        .get(server.url_for("/settings"))
        .bearer_auth("tok")
        .send()
        .await?;

    assert_eq!(response.status(), 200);

    Ok(())
}

#[tokio::test]
async fn test_config_outage_does_not_sign_user_out() -> Result<(), anyhow::Error> {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "5f1c7f0e",
            "username": "anna"
        })))
        .mount(&backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/application-configuration"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&backend)
        .await;
    let server = spawn(&backend).await?;

    let response = server
        .client()
        .get(server.url_for("/"))
        .header("cookie", format!("{COOKIE}=tok"))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["user"]["username"], "anna");
    assert!(body["appConfig"].is_null());

    Ok(())
}

#[tokio::test]
async fn test_unreachable_backend_degrades_to_anonymous() -> Result<(), anyhow::Error> {
    // Nothing listens on the backend address once the mock server is dropped
    let backend_uri = {
        let backend = MockServer::start().await;
        backend.uri()
    };
    let feed = MockServer::start().await;
    let server = TestGateServer::spawn(&backend_uri, &feed.uri()).await?;

    let protected = server
        .client()
        .get(server.url_for("/settings"))
        .header("cookie", format!("{COOKIE}=tok"))
        .send()
        .await?;
    assert_eq!(protected.status(), 303);
    assert_eq!(location(&protected), Some("/login"));

    let login = server.client().get(server.url_for("/login")).send().await?;
    assert_eq!(login.status(), 200);

    Ok(())
}

#[tokio::test]
async fn test_show_all_config_uses_full_endpoint() -> Result<(), anyhow::Error> {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/application-configuration/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"key": "smtpHost", "type": "string", "value": "mail.internal"}
        ])))
        .expect(1)
        .mount(&backend)
        .await;
    let feed = MockServer::start().await;

    let vars = HashMap::from([
        ("API_BASE_URL".to_string(), backend.uri()),
        ("RELEASE_FEED_URL".to_string(), feed.uri()),
        ("APP_CONFIG_SHOW_ALL".to_string(), "true".to_string()),
    ]);
    let server = TestGateServer::spawn_with(vars, None).await?;

    let response = server.client().get(server.url_for("/login")).send().await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["appConfig"]["smtpHost"], "mail.internal");

    Ok(())
}
