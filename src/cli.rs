//! Command-line interface and command runners

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::client::MailStore;
use crate::config::Limits;
use crate::delete::DeleteExecutor;
use crate::error::Result;
use crate::filter::Filter;
use crate::report;
use crate::scan::PreviewEngine;

/// Bulk Gmail cleanup: preview first, then delete exactly what you previewed
#[derive(Debug, Parser)]
#[command(name = "gmail-cleaner", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = "gmail-cleaner.toml")]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Authorize against the Gmail API and cache the token
    Auth {
        /// Discard any cached token and re-authorize
        #[arg(long)]
        force: bool,
    },
    /// Show which messages the filter would delete, without deleting anything
    Preview {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Irreversibly remove every message the filter matches
    Delete {
        #[command(flatten)]
        filter: FilterArgs,

        /// Confirm that you really want to delete (required)
        #[arg(long)]
        yes: bool,
    },
}

/// Raw filter inputs, normalized before use
///
/// Defaults mirror the add-on form: current thread, any subject, no starred
/// protection, trash untouched.
#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Where to clean: thread, inbox, or all
    #[arg(long, default_value = "thread")]
    pub scope: String,

    /// Delete emails whose subject contains any of these (comma-separated)
    #[arg(long, default_value = "")]
    pub subject: String,

    /// Keep starred emails safe
    #[arg(long)]
    pub keep_starred: bool,

    /// Include Trash (and permanently delete what is already there)
    #[arg(long)]
    pub include_trash: bool,

    /// Thread id for the current-thread scope
    #[arg(long)]
    pub thread: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Filter {
        Filter::normalize(&self.scope, &self.subject, self.keep_starred, self.include_trash)
    }
}

/// Run a preview and print the report
pub async fn run_preview(
    store: &dyn MailStore,
    limits: &Limits,
    args: &FilterArgs,
) -> Result<()> {
    let filter = args.to_filter();
    println!("{}", report::describe_filter(&filter));

    let mut engine = PreviewEngine::new(store, limits);
    if let Some(thread_id) = args.thread.as_deref() {
        engine = engine.with_thread_context(thread_id);
    }

    let result = engine.preview(&filter).await?;
    println!("{}", report::scan_summary(&result));
    for line in report::preview_lines(&result) {
        println!("  {}", line);
    }
    Ok(())
}

/// Run a delete and print the outcome
pub async fn run_delete(
    store: &dyn MailStore,
    limits: &Limits,
    args: &FilterArgs,
) -> Result<()> {
    let filter = args.to_filter();
    println!("{}", report::describe_filter(&filter));

    let mut executor = DeleteExecutor::new(store, limits);
    if let Some(thread_id) = args.thread.as_deref() {
        executor = executor.with_thread_context(thread_id);
    }

    let outcome = executor.execute(&filter).await?;
    println!("{}", report::delete_summary(&outcome));
    Ok(())
}
