//! Test utilities for integration tests
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use axum::{Router, body::Body};
use chrono::{Duration, Utc};

use autoreply::api::AppState;
use autoreply::api::app;
use autoreply::core::AppConfig;
use autoreply::core::db::{async_db, initialize_db};
use autoreply::google::oauth::{FileTokenStore, StoredToken, TokenStore};

/// Creates a test application router with a scratch database and no
/// stored Gmail token.
pub async fn test_app() -> Router {
    let (app, _dir) = test_app_with_gmail(None).await;
    app
}

/// Creates a test application router pointed at a mock Gmail server.
/// A fresh unexpired token is written so no refresh round trip
/// happens. Returns the scratch directory so callers can poke at the
/// token file.
pub async fn test_app_with_gmail(gmail_base_url: Option<&str>) -> (Router, PathBuf) {
    // Create a unique directory for the test with a randomly
    // generated name using a timestamp to avoid collisions and
    // vulnerabilities
    let temp_dir = env::temp_dir();
    let ts = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
        .to_string();
    let dir = temp_dir.join(ts);
    fs::create_dir_all(&dir).expect("Failed to create base directory");

    let db_path = dir.join("autoreply.db");
    let db = async_db(db_path.to_str().unwrap())
        .await
        .expect("Failed to connect to async db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to migrate db");
        Ok(())
    })
    .await
    .unwrap();

    let token_path = dir.join("token.json");
    if gmail_base_url.is_some() {
        let token_store = FileTokenStore::new(&token_path);
        token_store
            .save(&StoredToken {
                access_token: String::from("test_access_token"),
                refresh_token: String::from("test_refresh_token"),
                expiry: Utc::now() + Duration::hours(1),
            })
            .expect("Failed to write token file");
    }

    let app_config = AppConfig {
        gmail_user: String::from("me@example.com"),
        gmail_api_client_id: String::from("test_client_id"),
        gmail_api_client_secret: String::from("test_client_secret"),
        gmail_api_base_url: gmail_base_url
            .unwrap_or("https://gmail.googleapis.com")
            .to_string(),
        db_path: db_path.display().to_string(),
        token_path: token_path.display().to_string(),
    };
    let app_state = AppState::new(db, app_config);
    (app(Arc::new(RwLock::new(app_state))), dir)
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("Response body was not UTF-8")
}
