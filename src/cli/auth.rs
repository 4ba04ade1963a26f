use crate::core::AppConfig;
use crate::core::db::{async_db, save_refresh_token};
use crate::google::oauth::{consent_url, exchange_code_for_token};
use anyhow::{Result, anyhow};
use std::io::{self, Write};

const SERVICE: &str = "google";

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_owned())
}

pub async fn run(config: &AppConfig) -> Result<()> {
    if config.google_client_id.is_empty() || config.google_client_secret.is_empty() {
        return Err(anyhow!(
            "Set ASSISTANT_GOOGLE_CLIENT_ID and ASSISTANT_GOOGLE_CLIENT_SECRET in your environment"
        ));
    }

    let account = prompt("Enter the email address you are authenticating: ")?;
    let redirect_uri = std::env::var("ASSISTANT_GOOGLE_REDIRECT_URI")
        .unwrap_or_else(|_| "urn:ietf:wg:oauth:2.0:oob".to_string());

    println!(
        "\nPlease open the following URL in your browser and authorize access:\n\n{}\n",
        consent_url(&config.google_client_id, &redirect_uri)
    );
    let code = prompt("Paste the authorization code shown by Google here: ")?;

    let token = exchange_code_for_token(
        &config.google_token_url,
        &config.google_client_id,
        &config.google_client_secret,
        &code,
        &redirect_uri,
    )
    .await?;

    // Only the refresh token is kept, access tokens are minted per request
    let refresh_token = token
        .refresh_token
        .ok_or(anyhow!("No refresh token in response"))?;
    let db = async_db(&config.db_path).await?;
    save_refresh_token(&db, &account, SERVICE, &refresh_token).await?;
    println!("Refresh token for {} saved to DB.", account);

    Ok(())
}
