mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use common::TestApp;

#[tokio::test]
async fn login_returns_token() -> Result<()> {
    let app = TestApp::spawn().await?;
    let res = app
        .request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "jojo", "password": "abcd" })),
        )
        .await?;

    assert_eq!(res.status, StatusCode::OK);
    let token = res.body["token"].as_str().unwrap_or_default();
    assert_eq!(token.split('.').count(), 3, "expected a JWT, got {}", res.body);
    Ok(())
}

#[tokio::test]
async fn login_username_is_case_insensitive() -> Result<()> {
    let app = TestApp::spawn().await?;
    let res = app
        .request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "JoJo", "password": "abcd" })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn login_accepts_query_parameters() -> Result<()> {
    let app = TestApp::spawn().await?;
    let res = app
        .request(Method::POST, "/api/login?username=techit&password=abcd", None, None)
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn login_accepts_form_body() -> Result<()> {
    let app = TestApp::spawn().await?;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=jjim&password=abcd"))?;
    let response = app.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let app = TestApp::spawn().await?;
    let res = app
        .request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "jojo", "password": "wrong" })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Login failed");

    let res = app
        .request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "nobody", "password": "abcd" })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn missing_credentials_is_bad_request() -> Result<()> {
    let app = TestApp::spawn().await?;
    let res = app
        .request(Method::POST, "/api/login", None, Some(json!({ "username": "jojo" })))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Missing username/password");
    Ok(())
}

#[tokio::test]
async fn protected_routes_need_a_token() -> Result<()> {
    let app = TestApp::spawn().await?;
    let res = app.request(Method::GET, "/api/tickets/submitted", None, None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.get("/api/tickets/submitted", "not-a-token").await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unknown_api_path_is_bare_not_found() -> Result<()> {
    let app = TestApp::spawn().await?;
    let res = app.request(Method::GET, "/api/nothing/here", None, None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(res.body.is_null());
    Ok(())
}

#[tokio::test]
async fn non_api_paths_serve_app_shell() -> Result<()> {
    let public = tempfile::tempdir()?;
    std::fs::write(public.path().join("index.html"), "<html>shell</html>")?;
    let app = TestApp::with_static_dir(public.path()).await?;

    let (status, body) = app.get_text("/tickets/5").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<html>shell</html>");

    let (status, body) = app.get_text("/api/unknown").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
    Ok(())
}

#[tokio::test]
async fn disabled_account_cannot_log_in() -> Result<()> {
    let app = TestApp::spawn().await?;
    let admin = app.login("techit").await?;

    let res = app.patch("/api/users/6", &admin, json!({ "enabled": false })).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["enabled"], false);

    let res = app
        .request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "jojo", "password": "abcd" })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Login failed");
    Ok(())
}

#[tokio::test]
async fn query_credentials_skip_body_parsing() -> Result<()> {
    let app = TestApp::spawn().await?;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/login?username=jojo&password=abcd")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let response = app.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    // Without query credentials the same body is still rejected
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let response = app.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
