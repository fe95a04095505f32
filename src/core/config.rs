use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub gmail_user: String,
    pub gmail_api_client_id: String,
    pub gmail_api_client_secret: String,
    pub gmail_api_base_url: String,
    pub db_path: String,
    pub token_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let gmail_user = env::var("GMAIL_USER").expect("Missing env var GMAIL_USER");
        let gmail_api_client_id =
            env::var("GMAIL_CLIENT_ID").expect("Missing env var GMAIL_CLIENT_ID");
        let gmail_api_client_secret =
            env::var("GMAIL_CLIENT_SECRET").expect("Missing env var GMAIL_CLIENT_SECRET");
        let gmail_api_base_url = env::var("GMAIL_API_BASE_URL")
            .unwrap_or_else(|_| "https://gmail.googleapis.com".to_string());
        let db_path =
            env::var("AUTOREPLY_DB_PATH").unwrap_or_else(|_| "./autoreply.db".to_string());
        let token_path =
            env::var("AUTOREPLY_TOKEN_PATH").unwrap_or_else(|_| "./token.json".to_string());

        Self {
            gmail_user,
            gmail_api_client_id,
            gmail_api_client_secret,
            gmail_api_base_url,
            db_path,
            token_path,
        }
    }
}
