//! Public types for the fetch API
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct FetchEmailsResponse {
    pub message: String,
}
