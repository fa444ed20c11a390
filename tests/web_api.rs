//! Web API Tests
//!
//! Integration tests for the JSON API, run against fixture feeds served
//! over real HTTP.

mod common;

use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use common::{create_app_state, create_ingestor, rss, sign_token, token_for, FeedServer};
use folo_lite::web::middleware::SESSION_COOKIE;
use folo_lite::web::router::create_router;

const JAN_1: &str = "Mon, 01 Jan 2024 10:00:00 GMT";
const JAN_2: &str = "Tue, 02 Jan 2024 10:00:00 GMT";
const JAN_3: &str = "Wed, 03 Jan 2024 10:00:00 GMT";

/// Create a test server with an in-memory database.
async fn create_test_server() -> TestServer {
    let app_state = create_app_state(create_ingestor().await);
    let router = create_router(app_state, &[]);
    TestServer::new(router).expect("Failed to create test server")
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Add a feed for `user` and return the response body.
async fn add_feed(server: &TestServer, user: &str, url: &str) -> Value {
    let response = server
        .post("/api/feeds")
        .add_header(AUTHORIZATION, bearer(&token_for(user)))
        .json(&json!({ "url": url }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

async fn get_dashboard(server: &TestServer, user: &str, query: &str) -> Value {
    let response = server
        .get(&format!("/api/dashboard{query}"))
        .add_header(AUTHORIZATION, bearer(&token_for(user)))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

/// Publish a feed with three articles, newest last.
async fn news_server() -> FeedServer {
    let feeds = FeedServer::start().await;
    feeds.publish(
        "news",
        rss(
            Some("Example News"),
            &[("a1", "First", JAN_1), ("a2", "Second", JAN_2), ("a3", "Third", JAN_3)],
        ),
    );
    feeds
}

// ============================================================================
// Health and Authentication
// ============================================================================

#[tokio::test]
async fn test_health() {
    let server = create_test_server().await;

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn test_me_requires_token() {
    let server = create_test_server().await;

    let response = server.get("/api/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_me_with_bearer_token() {
    let server = create_test_server().await;

    let response = server
        .get("/api/me")
        .add_header(AUTHORIZATION, bearer(&token_for("user-1")))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["user_id"], "user-1");
    assert_eq!(body["data"]["email"], "user-1@example.com");
}

#[tokio::test]
async fn test_me_with_session_cookie() {
    let server = create_test_server().await;

    let response = server
        .get("/api/me")
        .add_header(COOKIE, format!("{}={}", SESSION_COOKIE, token_for("user-2")))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["user_id"], "user-2");
}

#[tokio::test]
async fn test_token_with_wrong_secret_rejected() {
    let server = create_test_server().await;

    let response = server
        .get("/api/me")
        .add_header(AUTHORIZATION, bearer(&sign_token("user-1", "other-secret", 3600)))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let server = create_test_server().await;

    let token = sign_token("user-1", common::TEST_JWT_SECRET, -3600);
    let response = server
        .get("/api/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_session_sets_cookie() {
    let server = create_test_server().await;
    let token = token_for("user-1");

    let response = server
        .post("/api/auth/session")
        .json(&json!({ "access_token": token }))
        .await;
    response.assert_status_ok();

    let cookie = response.header(SET_COOKIE);
    let cookie = cookie.to_str().unwrap();
    assert!(cookie.starts_with(&format!("{}={}", SESSION_COOKIE, token)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=604800"));

    let body: Value = response.json();
    assert_eq!(body["data"]["user_id"], "user-1");
}

#[tokio::test]
async fn test_create_session_rejects_invalid_token() {
    let server = create_test_server().await;

    let response = server
        .post("/api/auth/session")
        .json(&json!({ "access_token": "not-a-jwt" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_session_rejects_empty_token() {
    let server = create_test_server().await;

    let response = server
        .post("/api/auth/session")
        .json(&json!({ "access_token": "  " }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

fn assert_session_cleared(response: &axum_test::TestResponse) {
    response.assert_status(StatusCode::NO_CONTENT);

    let cookie = response.header(SET_COOKIE);
    let cookie = cookie.to_str().unwrap();
    assert!(cookie.starts_with(&format!("{}=;", SESSION_COOKIE)));
    assert!(cookie.contains("Max-Age=0"));
    assert!(cookie.contains("Path=/"));
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let server = create_test_server().await;

    let response = server
        .post("/api/auth/logout")
        .add_header(COOKIE, format!("{}={}", SESSION_COOKIE, token_for("user-1")))
        .await;
    assert_session_cleared(&response);
}

#[tokio::test]
async fn test_logout_without_cookie_still_clears() {
    let server = create_test_server().await;

    let response = server.post("/api/auth/logout").await;
    assert_session_cleared(&response);
}

// ============================================================================
// Feeds
// ============================================================================

#[tokio::test]
async fn test_add_feed() {
    let feeds = news_server().await;
    let server = create_test_server().await;

    let body = add_feed(&server, "user-1", &feeds.url("news")).await;
    assert_eq!(body["data"]["feed"]["title"], "Example News");
    assert_eq!(body["data"]["feed"]["url"], feeds.url("news"));
    assert_eq!(body["data"]["new_articles"], 3);
    assert_eq!(body["data"]["newly_subscribed"], true);
}

#[tokio::test]
async fn test_add_feed_twice_keeps_single_subscription() {
    let feeds = news_server().await;
    let server = create_test_server().await;

    add_feed(&server, "user-1", &feeds.url("news")).await;
    let body = add_feed(&server, "user-1", &feeds.url("news")).await;
    assert_eq!(body["data"]["new_articles"], 0);
    assert_eq!(body["data"]["newly_subscribed"], false);

    let dashboard = get_dashboard(&server, "user-1", "").await;
    assert_eq!(dashboard["data"]["feeds"].as_array().unwrap().len(), 1);
    assert_eq!(dashboard["data"]["articles"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_add_feed_requires_auth() {
    let server = create_test_server().await;

    let response = server
        .post("/api/feeds")
        .json(&json!({ "url": "https://example.com/feed.xml" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_feed_invalid_url() {
    let server = create_test_server().await;

    let response = server
        .post("/api/feeds")
        .add_header(AUTHORIZATION, bearer(&token_for("user-1")))
        .json(&json!({ "url": "not a url" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["url"].is_array());
}

#[tokio::test]
async fn test_add_feed_malformed_json() {
    let server = create_test_server().await;

    let response = server
        .post("/api/feeds")
        .add_header(AUTHORIZATION, bearer(&token_for("user-1")))
        .json(&json!({ "link": "https://example.com/feed.xml" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_unreadable_feed() {
    let feeds = FeedServer::start().await;
    feeds.publish("page", "<html><body>Just a web page</body></html>");
    let server = create_test_server().await;

    let response = server
        .post("/api/feeds")
        .add_header(AUTHORIZATION, bearer(&token_for("user-1")))
        .json(&json!({ "url": feeds.url("page") }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("could not parse feed"));

    let dashboard = get_dashboard(&server, "user-1", "").await;
    assert!(dashboard["data"]["feeds"].as_array().unwrap().is_empty());
}

// ============================================================================
// Dashboard and Article State
// ============================================================================

#[tokio::test]
async fn test_dashboard_empty_for_new_user() {
    let server = create_test_server().await;

    let body = get_dashboard(&server, "nobody", "").await;
    assert!(body["data"]["feeds"].as_array().unwrap().is_empty());
    assert!(body["data"]["articles"].as_array().unwrap().is_empty());
    assert!(body["data"]["current_feed_id"].is_null());
}

#[tokio::test]
async fn test_dashboard_orders_newest_first_with_default_flags() {
    let feeds = news_server().await;
    let server = create_test_server().await;
    add_feed(&server, "user-1", &feeds.url("news")).await;

    let body = get_dashboard(&server, "user-1", "").await;
    let articles = body["data"]["articles"].as_array().unwrap();
    let titles: Vec<&str> = articles.iter().map(|a| a["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Third", "Second", "First"]);

    for article in articles {
        assert_eq!(article["is_read"], false);
        assert_eq!(article["is_saved"], false);
        assert_eq!(article["feed_title"], "Example News");
    }
}

#[tokio::test]
async fn test_dashboard_limit() {
    let feeds = news_server().await;
    let server = create_test_server().await;
    add_feed(&server, "user-1", &feeds.url("news")).await;

    let body = get_dashboard(&server, "user-1", "?limit=2").await;
    assert_eq!(body["data"]["articles"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_dashboard_feed_filter() {
    let feeds = news_server().await;
    feeds.publish("blog", rss(Some("Blog"), &[("b1", "Post", JAN_2)]));
    let server = create_test_server().await;
    add_feed(&server, "user-1", &feeds.url("news")).await;
    let blog = add_feed(&server, "user-1", &feeds.url("blog")).await;
    let blog_id = blog["data"]["feed"]["id"].as_i64().unwrap();

    let body = get_dashboard(&server, "user-1", &format!("?feed_id={blog_id}")).await;
    assert_eq!(body["data"]["current_feed_id"], blog_id);
    assert_eq!(body["data"]["feeds"].as_array().unwrap().len(), 2);

    let articles = body["data"]["articles"].as_array().unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0]["title"], "Post");
}

#[tokio::test]
async fn test_dashboard_unsubscribed_feed_not_found() {
    let feeds = news_server().await;
    let server = create_test_server().await;
    let added = add_feed(&server, "user-1", &feeds.url("news")).await;
    let feed_id = added["data"]["feed"]["id"].as_i64().unwrap();

    let response = server
        .get(&format!("/api/dashboard?feed_id={feed_id}"))
        .add_header(AUTHORIZATION, bearer(&token_for("user-2")))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mark_read_and_save() {
    let feeds = news_server().await;
    let server = create_test_server().await;
    add_feed(&server, "user-1", &feeds.url("news")).await;

    let body = get_dashboard(&server, "user-1", "").await;
    let newest = body["data"]["articles"][0]["id"].as_i64().unwrap();
    let oldest = body["data"]["articles"][2]["id"].as_i64().unwrap();
    let token = token_for("user-1");

    server
        .post(&format!("/api/articles/{newest}/read"))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .put(&format!("/api/articles/{oldest}/save"))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let unread = get_dashboard(&server, "user-1", "?unread=true").await;
    let unread = unread["data"]["articles"].as_array().unwrap();
    assert_eq!(unread.len(), 2);
    assert!(unread.iter().all(|a| a["id"].as_i64() != Some(newest)));

    let saved = get_dashboard(&server, "user-1", "?saved=true").await;
    let saved = saved["data"]["articles"].as_array().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0]["id"].as_i64(), Some(oldest));
    assert_eq!(saved[0]["is_saved"], true);
    assert_eq!(saved[0]["is_read"], false);

    server
        .delete(&format!("/api/articles/{oldest}/save"))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let saved = get_dashboard(&server, "user-1", "?saved=true").await;
    assert!(saved["data"]["articles"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_read_state_is_per_user() {
    let feeds = news_server().await;
    let server = create_test_server().await;
    add_feed(&server, "user-1", &feeds.url("news")).await;
    add_feed(&server, "user-2", &feeds.url("news")).await;

    let body = get_dashboard(&server, "user-1", "").await;
    let article = body["data"]["articles"][0]["id"].as_i64().unwrap();

    server
        .post(&format!("/api/articles/{article}/read"))
        .add_header(AUTHORIZATION, bearer(&token_for("user-1")))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let other = get_dashboard(&server, "user-2", "").await;
    assert_eq!(other["data"]["articles"][0]["id"].as_i64(), Some(article));
    assert_eq!(other["data"]["articles"][0]["is_read"], false);
}

#[tokio::test]
async fn test_article_of_unsubscribed_feed_not_found() {
    let feeds = news_server().await;
    let server = create_test_server().await;
    add_feed(&server, "user-1", &feeds.url("news")).await;

    let body = get_dashboard(&server, "user-1", "").await;
    let article = body["data"]["articles"][0]["id"].as_i64().unwrap();
    let outsider = bearer(&token_for("user-2"));

    server
        .post(&format!("/api/articles/{article}/read"))
        .add_header(AUTHORIZATION, outsider.clone())
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .put(&format!("/api/articles/{article}/save"))
        .add_header(AUTHORIZATION, outsider)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_article_not_found() {
    let server = create_test_server().await;

    let response = server
        .post("/api/articles/9999/read")
        .add_header(AUTHORIZATION, bearer(&token_for("user-1")))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}
