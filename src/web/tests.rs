//! End-to-end tests for the web layer

use super::*;
use crate::config::SessionConfig;
use crate::db::{create_test_pool, migrations};
use crate::templates::TemplateEngine;
use axum::http::{header, StatusCode};
use axum_test::{TestResponse, TestServer};

async fn setup_server() -> TestServer {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let templates = TemplateEngine::new(None).expect("Failed to load templates");
    let session_config = SessionConfig {
        secure_cookie: false,
        ..SessionConfig::default()
    };
    let state = AppState::new(pool, &session_config, templates);
    let app = build_router(state, Duration::from_secs(10));

    TestServer::builder()
        .save_cookies()
        .build(app)
        .expect("Failed to start test server")
}

fn location(response: &TestResponse) -> String {
    response
        .header(header::LOCATION)
        .to_str()
        .unwrap()
        .to_string()
}

async fn signup(server: &TestServer, name: &str, email: &str, password: &str) -> TestResponse {
    server
        .post("/user/signup")
        .form(&[("name", name), ("email", email), ("password", password)])
        .await
}

async fn login(server: &TestServer, email: &str, password: &str) -> TestResponse {
    server
        .post("/user/login")
        .form(&[("email", email), ("password", password)])
        .await
}

async fn signup_and_login(server: &TestServer, name: &str, email: &str) {
    signup(server, name, email, "pa55word").await;
    let response = login(server, email, "pa55word").await;
    response.assert_status(StatusCode::SEE_OTHER);
}

async fn logout(server: &TestServer) {
    server
        .post("/user/logout")
        .await
        .assert_status(StatusCode::SEE_OTHER);
}

async fn create_snippet(server: &TestServer, title: &str) -> i64 {
    let response = server
        .post("/snippet/create")
        .form(&[("title", title), ("content", "Some content"), ("tag", "misc")])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);

    location(&response)
        .trim_start_matches("/snippet/view/")
        .parse()
        .unwrap()
}

// ============================================================================
// Plumbing
// ============================================================================

#[tokio::test]
async fn test_ping_and_secure_headers() {
    let server = setup_server().await;
    let response = server.get("/ping").await;

    response.assert_status_ok();
    response.assert_text("OK");
    assert_eq!(response.header(header::X_FRAME_OPTIONS), "deny");
    assert_eq!(response.header(header::X_CONTENT_TYPE_OPTIONS), "nosniff");
    assert_eq!(response.header(header::X_XSS_PROTECTION), "0");
    assert_eq!(
        response.header(header::REFERRER_POLICY),
        "origin-when-cross-origin"
    );
    assert!(response
        .header(header::CONTENT_SECURITY_POLICY)
        .to_str()
        .unwrap()
        .starts_with("default-src 'self'"));
}

#[tokio::test]
async fn test_unknown_path_and_wrong_method() {
    let server = setup_server().await;

    server.get("/nope").await.assert_status_not_found();
    server
        .post("/")
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_static_assets() {
    let server = setup_server().await;

    let response = server.get("/static/css/main.css").await;
    response.assert_status_ok();
    assert_eq!(response.header(header::CONTENT_TYPE), "text/css");

    server
        .get("/static/css/missing.css")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_anonymous_visit_sets_no_cookie() {
    let server = setup_server().await;
    let response = server.get("/").await;

    response.assert_status_ok();
    assert!(response.text().contains("There's nothing to see here"));
    assert!(response.maybe_header(header::SET_COOKIE).is_none());
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_protected_routes_redirect_to_login() {
    let server = setup_server().await;

    for path in ["/snippet/create", "/account/view"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/user/login");
        assert_eq!(response.header(header::CACHE_CONTROL), "no-store");
    }

    let response = server
        .post("/snippet/create")
        .form(&[("title", "t"), ("content", "c"), ("tag", "x")])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/user/login");
}

#[tokio::test]
async fn test_signup_then_flash_shows_once() {
    let server = setup_server().await;

    let response = signup(&server, "Alice", "alice@example.com", "pa55word").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/user/login");

    let page = server.get("/user/login").await;
    page.assert_status_ok();
    assert!(page.text().contains("Your signup was successful. Please log in."));

    let again = server.get("/user/login").await;
    assert!(!again.text().contains("Your signup was successful"));
}

#[tokio::test]
async fn test_signup_validation_and_duplicate_email() {
    let server = setup_server().await;

    let response = signup(&server, "", "not-an-email", "short").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.text();
    assert!(body.contains("This field cannot be blank"));
    assert!(body.contains("This field must be a valid email address"));
    assert!(body.contains("This field must be at least 8 characters long"));
    assert!(body.contains("not-an-email"));

    signup(&server, "Alice", "alice@example.com", "pa55word")
        .await
        .assert_status(StatusCode::SEE_OTHER);
    let duplicate = signup(&server, "Alice Again", "alice@example.com", "pa55word").await;
    duplicate.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(duplicate.text().contains("Email address is already in use"));
}

#[tokio::test]
async fn test_non_form_bodies_are_bad_requests() {
    let server = setup_server().await;

    server
        .post("/user/signup")
        .json(&serde_json::json!({
            "name": "Alice",
            "email": "alice@example.com",
            "password": "pa55word"
        }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/user/login")
        .text("email=alice@example.com")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    signup_and_login(&server, "Alice", "alice@example.com").await;
    let id = create_snippet(&server, "An old silent pond").await;

    server
        .post("/snippet/create")
        .text("title=t&content=c&tag=x")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post(&format!("/snippet/comment/{}", id))
        .json(&serde_json::json!({ "content": "lovely" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_failures_are_uniform() {
    let server = setup_server().await;
    signup(&server, "Alice", "alice@example.com", "pa55word").await;

    let wrong_password = login(&server, "alice@example.com", "wrongpass").await;
    let unknown_email = login(&server, "bob@example.com", "pa55word").await;

    for response in [wrong_password, unknown_email] {
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.text().contains("Email or password is incorrect"));
    }

    server
        .get("/snippet/create")
        .await
        .assert_status(StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_rotates_session_token() {
    let server = setup_server().await;
    let before = signup(&server, "Alice", "alice@example.com", "pa55word").await;
    let old_token = before.cookie("session").value().to_string();

    let response = login(&server, "alice@example.com", "pa55word").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/snippet/create");
    assert_ne!(response.cookie("session").value(), old_token);

    let page = server.get("/snippet/create").await;
    page.assert_status_ok();
    assert_eq!(page.header(header::CACHE_CONTROL), "no-store");
    assert!(page.text().contains("Alice"));
}

#[tokio::test]
async fn test_logout() {
    let server = setup_server().await;
    signup_and_login(&server, "Alice", "alice@example.com").await;

    let response = server.post("/user/logout").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let home = server.get("/").await;
    assert!(home.text().contains("logged out successfully"));
    assert!(home.text().contains("/user/login"));

    server
        .get("/account/view")
        .await
        .assert_status(StatusCode::SEE_OTHER);
}

// ============================================================================
// Snippets and commentaries
// ============================================================================

#[tokio::test]
async fn test_create_and_view_snippet() {
    let server = setup_server().await;
    signup_and_login(&server, "Alice", "alice@example.com").await;

    let invalid = server
        .post("/snippet/create")
        .form(&[("title", ""), ("content", "body"), ("tag", "x")])
        .await;
    invalid.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(invalid.text().contains("This field cannot be blank"));

    let id = create_snippet(&server, "An old silent pond").await;

    let page = server.get(&format!("/snippet/view/{}", id)).await;
    page.assert_status_ok();
    let body = page.text();
    assert!(body.contains("An old silent pond"));
    assert!(body.contains("Snippet successfully created!"));
    assert!(body.contains("Alice"));

    let home = server.get("/").await;
    assert!(home.text().contains(&format!("/snippet/view/{}", id)));
}

#[tokio::test]
async fn test_view_bad_and_missing_ids() {
    let server = setup_server().await;

    server
        .get("/snippet/view/not-a-number")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/snippet/view/0")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/snippet/view/999")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_commentaries() {
    let server = setup_server().await;
    signup_and_login(&server, "Alice", "alice@example.com").await;
    let id = create_snippet(&server, "Commented").await;

    let blank = server
        .post(&format!("/snippet/comment/{}", id))
        .form(&[("content", "  ")])
        .await;
    blank.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body = blank.text();
    assert!(body.contains("This field cannot be blank"));
    assert!(body.contains("Commented"));

    let response = server
        .post(&format!("/snippet/comment/{}", id))
        .form(&[("content", "What a lovely pond")])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/snippet/view/{}", id));

    let page = server.get(&format!("/snippet/view/{}", id)).await;
    let body = page.text();
    assert!(body.contains("Comment added successfully!"));
    assert!(body.contains("What a lovely pond"));

    server
        .post("/snippet/comment/999")
        .form(&[("content", "lost")])
        .await
        .assert_status_not_found();
    server
        .post("/snippet/comment/abc")
        .form(&[("content", "lost")])
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Favourites and accounts
// ============================================================================

#[tokio::test]
async fn test_favourite_add_twice_and_remove() {
    let server = setup_server().await;
    signup_and_login(&server, "Alice", "alice@example.com").await;
    let id = create_snippet(&server, "Favourite me").await;

    let response = server.post(&format!("/favourites/add/{}", id)).await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/account/view");

    let account = server.get("/account/view").await;
    account.assert_status_ok();
    let body = account.text();
    assert!(body.contains("Snippet added to favourites!"));
    assert!(body.contains(&format!("/favourites/remove/{}", id)));

    server.post(&format!("/favourites/add/{}", id)).await;
    let account = server.get("/account/view").await;
    assert!(account.text().contains("Snippet is already in favourites!"));

    let view = server.get(&format!("/snippet/view/{}", id)).await;
    assert!(view.text().contains("Favourited: 1"));

    let response = server.post(&format!("/favourites/remove/{}", id)).await;
    response.assert_status(StatusCode::SEE_OTHER);
    let account = server.get("/account/view").await;
    let body = account.text();
    assert!(body.contains("Snippet removed from favourites!"));
    assert!(body.contains("No favourites yet."));

    let view = server.get(&format!("/snippet/view/{}", id)).await;
    assert!(view.text().contains("Favourited: 0"));
}

#[tokio::test]
async fn test_favourite_bad_and_missing_ids() {
    let server = setup_server().await;
    signup_and_login(&server, "Alice", "alice@example.com").await;

    server
        .post("/favourites/add/999")
        .await
        .assert_status_not_found();
    server
        .post("/favourites/remove/999")
        .await
        .assert_status_not_found();
    server
        .post("/favourites/add/x1")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_other_account_pages() {
    let server = setup_server().await;
    signup_and_login(&server, "Alice", "alice@example.com").await;
    create_snippet(&server, "Alice's first").await;
    logout(&server).await;

    signup_and_login(&server, "Bob", "bob@example.com").await;

    // Alice signed up first
    let page = server.get("/account/view/1").await;
    page.assert_status_ok();
    let body = page.text();
    assert!(body.contains("Alice"));
    assert!(body.contains("Alice&#x27;s first"));
    assert!(!body.contains("alice@example.com"));

    let own = server.get("/account/view/2").await;
    own.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&own), "/account/view");

    let missing = server.get("/account/view/99").await;
    missing.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&missing), "/user/login");

    server
        .get("/account/view/bob")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
