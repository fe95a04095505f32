use anyhow::Result;
use std::io::{self, Write};

use crate::core::AppConfig;
use crate::google::oauth::{FileTokenStore, TokenStore, exchange_code_for_token};

const SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

pub async fn run() -> Result<()> {
    let config = AppConfig::default();
    let redirect_uri = std::env::var("GMAIL_REDIRECT_URI")
        .unwrap_or_else(|_| "urn:ietf:wg:oauth:2.0:oob".to_string());

    let auth_url = format!(
        "https://accounts.google.com/o/oauth2/v2/auth?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        urlencoding::encode(&config.gmail_api_client_id),
        urlencoding::encode(&redirect_uri),
        urlencoding::encode(SCOPE)
    );
    println!(
        "\nPlease open the following URL in your browser and authorize access:\n\n{}\n",
        auth_url
    );
    print!("Paste the authorization code shown by Google here: ");
    io::stdout().flush().unwrap();
    let mut code = String::new();
    io::stdin()
        .read_line(&mut code)
        .expect("Failed to read code");
    let code = code.trim();

    let token = exchange_code_for_token(
        &config.gmail_api_client_id,
        &config.gmail_api_client_secret,
        code,
        &redirect_uri,
    )
    .await?;

    let token_store = FileTokenStore::new(&config.token_path);
    token_store.save(&token)?;
    println!("Token for {} saved to {}.", config.gmail_user, config.token_path);

    Ok(())
}
