use anyhow::Result;
use autoreply::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
