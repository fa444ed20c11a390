//! Shared helpers for integration tests.
//!
//! Provides a local HTTP server that serves fixture feeds, an ingestor
//! backed by an in-memory database, and token helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use tokio::net::TcpListener;

use folo_lite::config::FetchConfig;
use folo_lite::web::handlers::AppState;
use folo_lite::web::middleware::JwtState;
use folo_lite::{Database, FeedFetcher, FeedIngestor, RetryPolicy};

/// Secret shared by the test API and the tokens it is given.
pub const TEST_JWT_SECRET: &str = "test-secret-key-for-testing-only";

#[derive(Clone)]
struct Document {
    body: String,
    delay: Duration,
}

type Documents = Arc<RwLock<HashMap<String, Document>>>;

/// Serves `/feeds/{name}` from an in-memory map; unknown names are 404.
/// `/redirect/{name}` answers with a redirect to `/feeds/{name}`.
pub struct FeedServer {
    addr: SocketAddr,
    documents: Documents,
}

impl FeedServer {
    /// Bind to an ephemeral port and start serving.
    pub async fn start() -> Self {
        let documents: Documents = Arc::new(RwLock::new(HashMap::new()));

        let router = Router::new()
            .route("/feeds/:name", get(serve_feed))
            .route(
                "/redirect/:name",
                get(|Path(name): Path<String>| async move {
                    Redirect::temporary(&format!("/feeds/{name}"))
                }),
            )
            .with_state(documents.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, documents }
    }

    /// Publish (or replace) a document.
    pub fn publish(&self, name: &str, body: impl Into<String>) {
        self.publish_delayed(name, body, Duration::ZERO);
    }

    /// Publish a document that is served only after `delay`.
    pub fn publish_delayed(&self, name: &str, body: impl Into<String>, delay: Duration) {
        self.documents.write().unwrap().insert(
            name.to_string(),
            Document {
                body: body.into(),
                delay,
            },
        );
    }

    /// Absolute URL of a document.
    pub fn url(&self, name: &str) -> String {
        format!("http://{}/feeds/{}", self.addr, name)
    }

    /// URL that redirects to a document.
    pub fn redirect_url(&self, name: &str) -> String {
        format!("http://{}/redirect/{}", self.addr, name)
    }
}

async fn serve_feed(State(documents): State<Documents>, Path(name): Path<String>) -> Response {
    let document = documents.read().unwrap().get(&name).cloned();
    match document {
        Some(document) => {
            if !document.delay.is_zero() {
                tokio::time::sleep(document.delay).await;
            }
            ([(CONTENT_TYPE, "application/rss+xml")], document.body).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Build an RSS 2.0 document; items are `(guid, title, pub_date)`.
pub fn rss(title: Option<&str>, items: &[(&str, &str, &str)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel>"#,
    );
    if let Some(title) = title {
        xml.push_str(&format!("<title>{title}</title>"));
    }
    xml.push_str("<link>https://example.com/</link>");
    for (guid, item_title, pub_date) in items {
        xml.push_str(&format!(
            "<item><guid>{guid}</guid><title>{item_title}</title>\
             <link>https://example.com/{guid}</link>\
             <description>Body of {item_title}</description>\
             <pubDate>{pub_date}</pubDate></item>"
        ));
    }
    xml.push_str("</channel></rss>");
    xml
}

/// Fetch settings that allow the loopback fixture server.
pub fn fetch_config() -> FetchConfig {
    FetchConfig {
        allow_private_hosts: true,
        ..FetchConfig::default()
    }
}

/// An ingestor over a fresh in-memory database.
pub async fn create_ingestor() -> FeedIngestor {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let fetcher = FeedFetcher::new(&fetch_config()).expect("Failed to create fetcher");
    FeedIngestor::new(Arc::new(db), fetcher, RetryPolicy::none())
}

/// Application state for API tests.
pub fn create_app_state(ingestor: FeedIngestor) -> Arc<AppState> {
    let jwt = Arc::new(JwtState::new(TEST_JWT_SECRET, None));
    Arc::new(AppState::new(ingestor, jwt))
}

/// Sign an access token for `user_id` the way the auth service does.
pub fn token_for(user_id: &str) -> String {
    sign_token(user_id, TEST_JWT_SECRET, 3600)
}

/// Sign a token with an explicit secret and lifetime (negative for expired).
pub fn sign_token(user_id: &str, secret: &str, ttl_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + ttl_secs;
    let claims = json!({
        "sub": user_id,
        "exp": exp,
        "email": format!("{user_id}@example.com"),
        "role": "authenticated",
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
