//! Router for the fetch-emails trigger

use std::sync::{Arc, RwLock};

use axum::{Router, extract::State, response::Json};
use chrono::{DateTime, Utc};

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::core::AppConfig;
use crate::google::gmail::GmailClient;
use crate::google::oauth::{FileTokenStore, TokenStore, refresh_access_token};
use crate::workflow::fetch_and_respond;

type SharedState = Arc<RwLock<AppState>>;

/// Load the stored token, refreshing and re-persisting it first when
/// it's about to lapse.
async fn access_token(config: &AppConfig) -> Result<String, anyhow::Error> {
    let token_store = FileTokenStore::new(&config.token_path);
    let token = token_store
        .load()?
        .ok_or_else(|| anyhow::anyhow!("No stored Gmail token. Run the auth command first."))?;

    if !token.is_expired() {
        return Ok(token.access_token);
    }

    let refreshed = refresh_access_token(
        &config.gmail_api_client_id,
        &config.gmail_api_client_secret,
        &token.refresh_token,
    )
    .await?;
    token_store.save(&refreshed)?;
    Ok(refreshed.access_token)
}

async fn fetch_emails_handler(
    State(state): State<SharedState>,
) -> Result<Json<public::FetchEmailsResponse>, ApiError> {
    let (db, config, started_at): (tokio_rusqlite::Connection, AppConfig, DateTime<Utc>) = {
        let shared_state = state.read().expect("Unable to read shared state");
        (
            shared_state.db.clone(),
            shared_state.config.clone(),
            shared_state.started_at,
        )
    };

    let access_token = access_token(&config).await?;
    let client = GmailClient::with_base_url(&access_token, &config.gmail_api_base_url);

    let outcome = fetch_and_respond(&client, &db, &config.gmail_user, started_at).await?;

    Ok(Json(public::FetchEmailsResponse {
        message: format!(
            "Emails fetched and saved successfully. Fetched: {}, Auto-responded: {}",
            outcome.fetched, outcome.responded
        ),
    }))
}

/// Create the fetch router
pub fn router() -> Router<SharedState> {
    Router::new().route("/fetch-emails", axum::routing::get(fetch_emails_handler))
}
