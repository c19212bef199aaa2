//! Bounded bulk-delete executor
//!
//! Runs the same compiled query and predicate as the preview, removing each
//! accepted message. Removal is soft (move to trash) unless the filter opted
//! into trash AND the message already sits there, in which case it is deleted
//! permanently. Per-message failures are counted and skipped; a failed listing
//! call aborts the whole run with no partial outcome.

use tracing::{debug, error, info, warn};

use crate::client::MailStore;
use crate::config::Limits;
use crate::error::{CleanerError, Result};
use crate::filter::{Filter, Scope};
use crate::models::DeleteOutcome;
use crate::query::CompiledQuery;

/// Delete engine producing [`DeleteOutcome`]s
pub struct DeleteExecutor<'a> {
    store: &'a dyn MailStore,
    limits: &'a Limits,
    thread_context: Option<String>,
}

impl<'a> DeleteExecutor<'a> {
    pub fn new(store: &'a dyn MailStore, limits: &'a Limits) -> Self {
        Self {
            store,
            limits,
            thread_context: None,
        }
    }

    /// Attach the currently open thread, enabling thread-scoped deletion
    pub fn with_thread_context(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_context = Some(thread_id.into());
        self
    }

    /// Remove every message the filter matches, within the operation ceiling
    pub async fn execute(&self, filter: &Filter) -> Result<DeleteOutcome> {
        match filter.scope {
            Scope::Thread => self.execute_thread(filter).await,
            Scope::Inbox | Scope::AllMail => self.execute_mailbox(filter).await,
        }
    }

    /// Thread mode: one bounded conversation, no pagination
    async fn execute_thread(&self, filter: &Filter) -> Result<DeleteOutcome> {
        let thread_id = self.thread_context.as_deref().ok_or(CleanerError::InvalidScope)?;

        let compiled = CompiledQuery::compile(filter);
        let messages = self.store.thread_messages(thread_id).await.map_err(|e| {
            error!("Failed to load thread {}: {}", thread_id, e);
            CleanerError::StoreListing(e.to_string())
        })?;

        let mut outcome = DeleteOutcome::new(filter.scope);
        for msg in &messages {
            if !compiled.matches(msg) {
                continue;
            }
            outcome.total_candidates += 1;

            let hard = is_hard_delete(filter, msg.in_trash);
            match self.remove(&msg.id, hard).await {
                Ok(()) => outcome.deleted += 1,
                Err(e) => {
                    warn!("Failed to remove message {}: {}", msg.id, e);
                    outcome.errors += 1;
                }
            }
        }

        info!(
            "Thread {} cleanup: {}/{} deleted, {} errors",
            thread_id, outcome.deleted, outcome.total_candidates, outcome.errors
        );
        Ok(outcome)
    }

    /// Mailbox mode: paginate the compiled query up to the operation ceiling
    ///
    /// Page loop states: list a page, process its messages, then either advance
    /// to the next page, finish (no cursor), or stop at the ceiling. A listing
    /// failure aborts with no outcome.
    async fn execute_mailbox(&self, filter: &Filter) -> Result<DeleteOutcome> {
        if !self.store.supports_bulk() {
            return Err(CleanerError::BulkUnsupported);
        }

        let compiled = CompiledQuery::compile(filter);
        info!(
            "Bulk delete with query: {} (ceiling {})",
            compiled.expression(),
            self.limits.delete_operation_limit
        );

        let mut outcome = DeleteOutcome::new(filter.scope);
        let mut processed = 0u64;
        let mut page_token: Option<String> = None;

        'pages: loop {
            let page = self
                .store
                .list_message_page(
                    compiled.expression(),
                    page_token.as_deref(),
                    self.limits.delete_page_size,
                    filter.include_trash,
                )
                .await
                .map_err(|e| {
                    error!("Listing failed mid-delete, aborting batch: {}", e);
                    CleanerError::StoreListing(e.to_string())
                })?;

            debug!("Processing page of {} messages", page.messages.len());

            for handle in &page.messages {
                // Belt and suspenders: the query already excludes these, but a
                // message rejected here must never count as a candidate.
                if !compiled.accepts_labels(handle) {
                    continue;
                }

                outcome.total_candidates += 1;
                let hard = is_hard_delete(filter, handle.in_trash());
                match self.remove(&handle.id, hard).await {
                    Ok(()) => outcome.deleted += 1,
                    Err(e) => {
                        warn!("Failed to remove message {}: {}", handle.id, e);
                        outcome.errors += 1;
                    }
                }

                processed += 1;
                if processed >= self.limits.delete_operation_limit {
                    outcome.truncated = true;
                    break 'pages;
                }
            }

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        // A non-exhausted cursor means more matches were left behind.
        if page_token.is_some() {
            outcome.truncated = true;
        }

        info!(
            "Bulk cleanup: {}/{} deleted, {} errors, truncated={}",
            outcome.deleted, outcome.total_candidates, outcome.errors, outcome.truncated
        );
        Ok(outcome)
    }

    async fn remove(&self, id: &str, hard: bool) -> Result<()> {
        if hard {
            debug!("Permanently deleting {}", id);
            self.store.hard_delete_message(id).await
        } else {
            debug!("Moving {} to trash", id);
            self.store.trash_message(id).await
        }
    }
}

/// Decide removal mode for one candidate message
///
/// Permanent deletion applies only when the filter includes trash and the
/// message already resides there; everything else is a recoverable move.
pub fn is_hard_delete(filter: &Filter, in_trash: bool) -> bool {
    filter.include_trash && in_trash
}
