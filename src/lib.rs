//! Gmail Cleaner
//!
//! A bulk mailbox-cleanup engine: preview which messages a user filter matches,
//! then irreversibly remove exactly those messages, across mailboxes larger
//! than one API call or execution window.
//!
//! # Overview
//!
//! - **Filter model**: raw form input normalized into a canonical [`filter::Filter`]
//! - **Query compiler**: one [`query::CompiledQuery`] drives both preview and
//!   deletion, pairing a store-native search string with a local predicate so
//!   the two can never disagree
//! - **Scan engine**: capped preview sampling plus an exact-or-estimated total
//! - **Delete executor**: paginated, ceiling-bounded removal with trash/starred
//!   semantics and continue-on-error accounting
//! - **Outcome reporter**: user-facing summaries of both
//!
//! The mail store is an injected [`client::MailStore`] capability; production
//! uses the Gmail API ([`client::GmailStore`]), tests use an in-memory fixture.
//!
//! # Example Usage
//!
//! ```no_run
//! use gmail_cleaner::{auth, client::GmailStore, config::Config, filter::Filter};
//! use gmail_cleaner::scan::PreviewEngine;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("gmail-cleaner.toml".as_ref()).await?;
//!     let hub = auth::initialize_gmail_hub(
//!         &config.auth.credentials_path,
//!         &config.auth.token_cache_path,
//!         auth::READONLY_SCOPES,
//!     )
//!     .await?;
//!     let store = GmailStore::read_only(hub);
//!
//!     let filter = Filter::normalize("inbox", "promo, newsletter", true, false);
//!     let result = PreviewEngine::new(&store, &config.limits).preview(&filter).await?;
//!     println!("{} matches", result.total.value());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod delete;
pub mod error;
pub mod filter;
pub mod models;
pub mod query;
pub mod report;
pub mod scan;

// Re-export commonly used types for convenience
pub use error::{CleanerError, Result};

pub use filter::{Filter, Scope};
pub use models::{DeleteOutcome, MatchTotal, MessageHandle, MessagePage, MessageSummary, ScanResult, ThreadRef};
pub use query::CompiledQuery;

pub use client::{GmailStore, MailStore};
pub use delete::DeleteExecutor;
pub use scan::PreviewEngine;

pub use cli::{Cli, Commands};
pub use config::{Config, Limits};
