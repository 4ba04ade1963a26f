use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod auth;
pub mod chat;
pub mod init;
pub mod serve;

use crate::core::AppConfig;

#[derive(Subcommand)]
enum Command {
    /// Create the local credential store
    Init {
        #[arg(long, action, default_value = "false")]
        db: bool,
    },
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "2222")]
        port: String,
    },
    /// Talk to the assistant from the terminal
    Chat {
        /// Connected account whose calendar and tasks are used
        #[arg(long)]
        account: Option<String>,
    },
    /// Connect a Google account and store its refresh token
    Auth {},
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();
    let config = AppConfig::default();

    // Handle each sub command
    match args.command {
        Some(Command::Init { db }) => {
            init::run(db, &config.db_path).await?;
        }
        Some(Command::Serve { host, port }) => {
            serve::run(host, port, config).await;
        }
        Some(Command::Chat { account }) => {
            chat::run(config, account).await?;
        }
        Some(Command::Auth {}) => {
            auth::run(&config).await?;
        }
        None => {}
    }

    Ok(())
}
