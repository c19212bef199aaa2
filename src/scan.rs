//! Non-destructive preview: capped sampling plus an exact-or-estimated count
//!
//! The preview never mutates the store. It shares its [`CompiledQuery`] logic
//! with the delete executor, so the sample shown to the user is drawn from
//! exactly the population a subsequent delete would target.

use tracing::{debug, info, warn};

use crate::client::MailStore;
use crate::config::Limits;
use crate::error::{CleanerError, Result};
use crate::filter::{Filter, Scope};
use crate::models::{MatchTotal, MessageSummary, ScanResult};
use crate::query::CompiledQuery;

/// Scan engine producing [`ScanResult`]s
pub struct PreviewEngine<'a> {
    store: &'a dyn MailStore,
    limits: &'a Limits,
    thread_context: Option<String>,
}

impl<'a> PreviewEngine<'a> {
    pub fn new(store: &'a dyn MailStore, limits: &'a Limits) -> Self {
        Self {
            store,
            limits,
            thread_context: None,
        }
    }

    /// Attach the currently open thread, enabling thread-scoped previews
    pub fn with_thread_context(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_context = Some(thread_id.into());
        self
    }

    /// Preview which messages the filter would delete, without touching any
    pub async fn preview(&self, filter: &Filter) -> Result<ScanResult> {
        match filter.scope {
            Scope::Thread => self.preview_thread(filter).await,
            Scope::Inbox | Scope::AllMail => self.preview_mailbox(filter).await,
        }
    }

    /// Thread mode: full traversal of one bounded conversation, exact total
    async fn preview_thread(&self, filter: &Filter) -> Result<ScanResult> {
        let thread_id = self.thread_context.as_deref().ok_or(CleanerError::InvalidScope)?;

        let compiled = CompiledQuery::compile(filter);
        let messages = self.store.thread_messages(thread_id).await.map_err(listing_error)?;

        let mut preview = Vec::new();
        let mut total = 0u64;
        for msg in messages {
            if compiled.matches(&msg) {
                total += 1;
                if preview.len() < self.limits.preview_limit {
                    preview.push(msg);
                }
            }
        }

        debug!("Thread {} preview: {} of {} matched", thread_id, preview.len(), total);
        Ok(ScanResult {
            preview,
            total: MatchTotal::Exact(total),
            count_truncated: false,
        })
    }

    /// Mailbox mode: sample enough conversation groups to fill the preview,
    /// then resolve the total separately
    async fn preview_mailbox(&self, filter: &Filter) -> Result<ScanResult> {
        let compiled = CompiledQuery::compile(filter);
        info!("Previewing mailbox with query: {}", compiled.expression());

        let sample = self.sample_mailbox(&compiled).await?;
        let (total, count_truncated) = self
            .resolve_total(&compiled, filter.include_trash, &sample)
            .await;

        Ok(ScanResult {
            preview: sample.items,
            total,
            count_truncated,
        })
    }

    /// Walk thread-search pages until the preview is full or the group cap hits
    async fn sample_mailbox(&self, compiled: &CompiledQuery) -> Result<Sample> {
        let mut items: Vec<MessageSummary> = Vec::new();
        let mut observed = 0u64;
        let mut groups_seen = 0usize;
        let mut capped = false;
        let mut offset = 0usize;

        'search: while groups_seen < self.limits.preview_thread_limit {
            let batch_size = self
                .limits
                .search_page_size
                .min(self.limits.preview_thread_limit - groups_seen);
            let threads = self
                .store
                .search_threads(compiled.expression(), offset, batch_size)
                .await
                .map_err(listing_error)?;

            if threads.is_empty() {
                break;
            }
            offset += threads.len();

            for thread in &threads {
                groups_seen += 1;
                let messages = self
                    .store
                    .thread_messages(&thread.id)
                    .await
                    .map_err(listing_error)?;

                for msg in messages {
                    if compiled.matches(&msg) {
                        observed += 1;
                        if items.len() < self.limits.preview_limit {
                            items.push(msg);
                        }
                    }
                }

                if items.len() >= self.limits.preview_limit {
                    // Enough to show; stop fetching further groups.
                    capped = true;
                    break 'search;
                }
                if groups_seen >= self.limits.preview_thread_limit {
                    capped = true;
                    break 'search;
                }
            }
        }

        debug!(
            "Sampled {} groups, {} preview items, {} matches observed",
            groups_seen,
            items.len(),
            observed
        );
        Ok(Sample {
            items,
            observed,
            capped,
        })
    }

    /// Resolve the total match count: exact enumeration, else store estimate,
    /// else the sample-observed count
    async fn resolve_total(
        &self,
        compiled: &CompiledQuery,
        include_trash: bool,
        sample: &Sample,
    ) -> (MatchTotal, bool) {
        match self.count_matches(compiled, include_trash).await {
            Ok((count, truncated)) => (MatchTotal::Exact(count), truncated),
            Err(e) => {
                warn!("Exact count failed ({}), trying store estimate", e);
                match self
                    .store
                    .estimate_matches(compiled.expression(), include_trash)
                    .await
                {
                    Ok(Some(estimate)) => (MatchTotal::Estimated(estimate), false),
                    Ok(None) => {
                        debug!("No estimate available, using sample-observed count");
                        (MatchTotal::Estimated(sample.observed), sample.capped)
                    }
                    Err(e) => {
                        warn!("Estimate failed ({}), using sample-observed count", e);
                        (MatchTotal::Estimated(sample.observed), sample.capped)
                    }
                }
            }
        }
    }

    /// Exact enumeration over the paginated listing, capped at the hard limit
    async fn count_matches(
        &self,
        compiled: &CompiledQuery,
        include_trash: bool,
    ) -> Result<(u64, bool)> {
        let mut count = 0u64;
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .store
                .list_message_page(
                    compiled.expression(),
                    page_token.as_deref(),
                    self.limits.delete_page_size,
                    include_trash,
                )
                .await?;

            for (idx, handle) in page.messages.iter().enumerate() {
                if !compiled.accepts_labels(handle) {
                    continue;
                }
                count += 1;
                if count >= self.limits.count_hard_limit {
                    // Only truncated if matches actually remain beyond the cap.
                    let more = page.messages[idx + 1..]
                        .iter()
                        .any(|h| compiled.accepts_labels(h))
                        || page.next_page_token.is_some();
                    return Ok((count, more));
                }
            }

            page_token = page.next_page_token;
            if page_token.is_none() {
                return Ok((count, false));
            }
        }
    }
}

/// What a mailbox sample observed
struct Sample {
    items: Vec<MessageSummary>,
    observed: u64,
    capped: bool,
}

/// Listing failures are logged and converted; the raw error never reaches the UI
fn listing_error(e: CleanerError) -> CleanerError {
    match e {
        CleanerError::StoreListing(_) => e,
        other => {
            warn!("Store listing call failed: {}", other);
            CleanerError::StoreListing(other.to_string())
        }
    }
}
