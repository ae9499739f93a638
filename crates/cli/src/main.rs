//! Stashbox CLI - database migrations and account tools.
//!
//! # Usage
//!
//! ```bash
//! # Run directory database migrations
//! stashbox-cli migrate
//!
//! # Provision an account and send the OTP email
//! stashbox-cli account create -e ada@example.com -n "Ada Lovelace"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run `PostgreSQL` directory migrations
//! - `account create` - Provision an account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stashbox-cli")]
#[command(author, version, about = "Stashbox CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run directory database migrations
    Migrate,
    /// Manage accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Provision an account and send the OTP email
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Full name
        #[arg(short = 'n', long)]
        full_name: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Account { action } => match action {
            AccountAction::Create { email, full_name } => {
                let account_id = commands::account::create(&email, &full_name).await?;
                #[allow(clippy::print_stdout)]
                {
                    println!("{account_id}");
                }
            }
        },
    }
    Ok(())
}
