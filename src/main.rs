use anyhow::Result;
use assistant::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
