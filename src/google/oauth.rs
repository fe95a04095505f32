//! OAuth token exchange and refresh for the Gmail API plus on disk
//! token persistence.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

// Refresh slightly before the real deadline to absorb clock skew and
// request latency.
const EXPIRY_SKEW_SECONDS: i64 = 60;

/// A long lived credential for the Gmail API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: String,
    pub expiry: DateTime<Utc>,
}

impl StoredToken {
    pub fn is_expired(&self) -> bool {
        self.expiry <= Utc::now() + Duration::seconds(EXPIRY_SKEW_SECONDS)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
}

async fn request_token(token_url: &str, params: &[(&str, &str)]) -> Result<TokenResponse> {
    let client = Client::new();
    let res = client.post(token_url).form(params).send().await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!("Token request failed: {} ({})", status, text);
    }
    let token: TokenResponse = serde_json::from_str(&text)?;
    Ok(token)
}

/// Exchange an OAuth consent code for an access/refresh token pair.
pub async fn exchange_code_for_token(
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<StoredToken> {
    let response = request_token(
        TOKEN_URL,
        &[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ],
    )
    .await?;

    let refresh_token = response
        .refresh_token
        .context("No refresh token in response")?;
    Ok(StoredToken {
        access_token: response.access_token,
        refresh_token,
        expiry: Utc::now() + Duration::seconds(response.expires_in),
    })
}

/// Trade a refresh token for a fresh access token. Google doesn't
/// rotate the refresh token on this call so the old one is carried
/// over.
pub async fn refresh_access_token(
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<StoredToken> {
    let response = request_token(
        TOKEN_URL,
        &[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ],
    )
    .await?;

    Ok(StoredToken {
        access_token: response.access_token,
        refresh_token: response
            .refresh_token
            .unwrap_or_else(|| refresh_token.to_string()),
        expiry: Utc::now() + Duration::seconds(response.expires_in),
    })
}

/// Where tokens live between runs. Injected so tests don't need real
/// files.
pub trait TokenStore {
    fn load(&self) -> Result<Option<StoredToken>>;
    fn save(&self, token: &StoredToken) -> Result<()>;
}

/// JSON file on disk, the default store.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredToken>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token file {}", self.path.display()))?;
        let token = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed token file {}", self.path.display()))?;
        Ok(Some(token))
    }

    fn save(&self, token: &StoredToken) -> Result<()> {
        let contents = serde_json::to_string_pretty(token)?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write token file {}", self.path.display()))?;
        Ok(())
    }
}
