use anyhow::Result;
use clap::Parser;
use gmail_cleaner::auth;
use gmail_cleaner::cli::{self, Cli, Commands};
use gmail_cleaner::client::GmailStore;
use gmail_cleaner::config::Config;
use gmail_cleaner::error::CleanerError;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Engine errors carry their own user-safe wording
        match e.downcast_ref::<CleanerError>() {
            Some(cleaner_err) => eprintln!("Error: {}", cleaner_err.user_message()),
            None => eprintln!("Error: {}", e),
        }
        eprintln!("\nFor help, run: gmail-cleaner --help");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Install default crypto provider for rustls
    // This is necessary because multiple dependencies use different crypto providers
    // On non-Windows platforms, use aws-lc-rs (better performance, FIPS support)
    // On Windows, use ring (better compatibility, no NASM/CMake required)
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_cleaner=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_cleaner=info,warn,error"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Config::load_or_default(&cli.config).await?;

    match cli.command {
        Commands::Auth { force } => {
            tracing::info!("Authorizing with the Gmail API...");

            if let Some(parent) = config.auth.token_cache_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            if force && config.auth.token_cache_path.exists() {
                tokio::fs::remove_file(&config.auth.token_cache_path).await?;
                tracing::info!("Removed existing token cache");
            }

            // Building the hub triggers the OAuth flow when no token is cached
            let _hub = auth::initialize_gmail_hub(
                &config.auth.credentials_path,
                &config.auth.token_cache_path,
                auth::REQUIRED_SCOPES,
            )
            .await?;

            auth::secure_token_file(&config.auth.token_cache_path).await?;
            println!("Authorization complete. Token cached for future runs.");
        }
        Commands::Preview { filter } => {
            // Preview never mutates, so it runs under the readonly scope
            let hub = auth::initialize_gmail_hub(
                &config.auth.credentials_path,
                &config.auth.token_cache_path,
                auth::READONLY_SCOPES,
            )
            .await?;
            let store = GmailStore::read_only(hub);
            cli::run_preview(&store, &config.limits, &filter).await?;
        }
        Commands::Delete { filter, yes } => {
            if !yes {
                eprintln!("Deleted emails may be unrecoverable. Preview first, then re-run with --yes.");
                process::exit(2);
            }
            let hub = auth::initialize_gmail_hub(
                &config.auth.credentials_path,
                &config.auth.token_cache_path,
                auth::REQUIRED_SCOPES,
            )
            .await?;
            let store = GmailStore::new(hub);
            cli::run_delete(&store, &config.limits, &filter).await?;
        }
    }

    Ok(())
}
