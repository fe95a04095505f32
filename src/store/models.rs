use serde::{Deserialize, Serialize};

/// A fetched email as persisted to the `emails` table. Written once
/// per newly observed message, never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRecord {
    pub message_id: String,
    pub subject: String,
    pub sender: String,
    pub body: String,
    pub received_time: String,
}

/// Flag row in `processed_emails` recording that an auto-response was
/// sent for a message id. Its existence is the only dedupe signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedMarker {
    pub message_id: String,
}
