//! Gmail API client for listing new mail, fetching full messages and
//! sending replies.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Message and payload structures from the Gmail API documentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRef {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Option<Vec<MessageRef>>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
    pub payload: MessagePayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(rename = "mimeType")]
    pub mimetype: String,
    pub headers: Option<Vec<MessageHeader>>,
    pub body: Option<MessagePartBody>,
    pub parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePart {
    #[serde(rename = "mimeType")]
    pub mimetype: String,
    pub body: Option<MessagePartBody>,
    pub parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePartBody {
    // Base64 encoded
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

fn decode_base64(data: &str) -> String {
    URL_SAFE
        .decode(data)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| {
            tracing::warn!("Base64 decode failed for: {}", data);
            String::new()
        })
}

/// Extract the plain text body from a Gmail message payload.
///
/// The payload is a MIME tree: a node either carries its own
/// `body.data` or a list of child `parts`. Children are visited in
/// order, `text/plain` leaves are decoded and appended and
/// `multipart/alternative` containers are recursed into. Everything
/// else (HTML alternatives, attachments) is ignored. Returns an empty
/// string when no decodable plain text part exists.
pub fn extract_body(payload: &MessagePayload) -> String {
    node_text(payload.body.as_ref(), payload.parts.as_deref())
}

fn node_text(body: Option<&MessagePartBody>, parts: Option<&[MessagePart]>) -> String {
    let Some(parts) = parts else {
        return match body.and_then(|b| b.data.as_deref()) {
            Some(data) => decode_base64(data),
            None => String::new(),
        };
    };

    let mut text = String::new();
    for part in parts {
        match part.mimetype.as_str() {
            "text/plain" => {
                if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref()) {
                    text.push_str(&decode_base64(data));
                }
            }
            "multipart/alternative" => {
                text.push_str(&node_text(part.body.as_ref(), part.parts.as_deref()));
            }
            _ => {}
        }
    }
    text
}

/// Find a header value by exact name. The first occurrence wins.
pub fn header_value<'a>(payload: &'a MessagePayload, name: &str) -> Option<&'a str> {
    payload
        .headers
        .as_ref()?
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.as_str())
}

/// Mail provider operations needed by the fetch workflow. Implemented
/// for real by [`GmailClient`] and stubbed out in tests.
#[async_trait]
pub trait Mailbox {
    /// List messages received on or after the given date. Day
    /// granularity only, that's as precise as the Gmail query syntax
    /// gets. First result page only.
    async fn list_since(&self, after: NaiveDate) -> Result<Vec<MessageRef>, anyhow::Error>;

    /// Fetch the full message, headers and MIME payload included.
    async fn get_message(&self, id: &str) -> Result<Message, anyhow::Error>;

    /// Submit a base64url encoded RFC 2822 message for delivery.
    async fn send_raw(&self, raw: &str) -> Result<(), anyhow::Error>;
}

pub struct GmailClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(access_token: &str) -> Self {
        Self::with_base_url(access_token, "https://gmail.googleapis.com")
    }

    /// Point the client at a different API host, used by tests to
    /// target a mock server.
    pub fn with_base_url(access_token: &str, base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }
}

#[async_trait]
impl Mailbox for GmailClient {
    async fn list_since(&self, after: NaiveDate) -> Result<Vec<MessageRef>, anyhow::Error> {
        let url = format!(
            "{}/gmail/v1/users/me/messages?q=after:{}",
            self.base_url,
            after.format("%Y/%m/%d")
        );
        let res = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Message list failed: {} ({})", status, text);
        }
        let msgs: ListMessagesResponse = serde_json::from_str(&text)?;
        Ok(msgs.messages.unwrap_or_default())
    }

    async fn get_message(&self, id: &str) -> Result<Message, anyhow::Error> {
        let url = format!(
            "{}/gmail/v1/users/me/messages/{}?format=full",
            self.base_url, id
        );
        let res = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Message fetch failed: {} ({})", status, text);
        }
        let message: Message = serde_json::from_str(&text)?;
        Ok(message)
    }

    async fn send_raw(&self, raw: &str) -> Result<(), anyhow::Error> {
        let url = format!("{}/gmail/v1/users/me/messages/send", self.base_url);
        let res = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            anyhow::bail!("Message send failed: {} ({})", status, text);
        }
        Ok(())
    }
}
