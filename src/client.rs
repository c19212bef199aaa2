//! Mail-store capability trait and the production Gmail implementation
//!
//! The engines only ever see [`MailStore`]; tests inject an in-memory fixture,
//! production injects [`GmailStore`]. Whether a store can do bulk mailbox work
//! is decided once at construction, not probed per call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use google_gmail1::api::{Message, MessagePart};
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::GmailHub;
use crate::error::{CleanerError, Result};
use crate::models::{MessagePage, MessageSummary, ThreadRef, EXCERPT_CHARS};

/// Capability interface consumed by the scan and delete engines
#[async_trait]
pub trait MailStore: Send + Sync {
    /// Search conversation groups matching a query, in the store's natural order
    async fn search_threads(&self, query: &str, offset: usize, limit: usize)
        -> Result<Vec<ThreadRef>>;

    /// All messages of one thread, oldest first
    async fn thread_messages(&self, thread_id: &str) -> Result<Vec<MessageSummary>>;

    /// One page of message handles for a query
    async fn list_message_page(
        &self,
        query: &str,
        page_token: Option<&str>,
        page_size: u32,
        include_trash: bool,
    ) -> Result<MessagePage>;

    /// Store-side match estimate, if the store offers one
    async fn estimate_matches(&self, query: &str, include_trash: bool) -> Result<Option<u64>>;

    /// Move a message to trash (recoverable)
    async fn trash_message(&self, id: &str) -> Result<()>;

    /// Permanently delete a message (unrecoverable)
    async fn hard_delete_message(&self, id: &str) -> Result<()>;

    /// Whether bulk mailbox operations are available; fixed at construction
    fn supports_bulk(&self) -> bool;
}

/// Production Gmail-backed store
///
/// Wraps the Gmail hub with bounded exponential-backoff retries on transient
/// failures. A read-only store runs with the readonly OAuth scope and refuses
/// every mutation up front.
pub struct GmailStore {
    hub: GmailHub,
    writable: bool,
    oauth_scope: &'static str,
}

/// Full-access scope; permanent deletion refuses anything narrower
const FULL_SCOPE: &str = "https://mail.google.com/";

impl GmailStore {
    /// Create a store with full (bulk-capable) access
    pub fn new(hub: GmailHub) -> Self {
        Self {
            hub,
            writable: true,
            oauth_scope: FULL_SCOPE,
        }
    }

    /// Create a preview-only store; mutations and bulk deletion are refused
    pub fn read_only(hub: GmailHub) -> Self {
        Self {
            hub,
            writable: false,
            oauth_scope: crate::auth::READONLY_SCOPES[0],
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        if !self.writable {
            return Err(CleanerError::Forbidden("mail store is read-only".to_string()));
        }
        Ok(())
    }

    /// Check if an error is retryable
    fn should_retry(error: &CleanerError) -> bool {
        error.is_transient()
    }

    /// Execute an async operation with exponential backoff retry
    async fn with_retry<T, F, Fut>(
        operation_name: &str,
        max_retries: u32,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut delay = Duration::from_secs(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if Self::should_retry(&e) && attempts <= max_retries => {
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        operation_name,
                        attempts,
                        max_retries + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, Duration::from_secs(30));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetch the label set of a single message (minimal format)
    async fn message_labels(&self, id: &str) -> Result<Vec<String>> {
        let (_, msg) = self
            .hub
            .users()
            .messages_get("me", id)
            .format("minimal")
            .add_scope(self.oauth_scope)
            .doit()
            .await?;

        Ok(msg.label_ids.unwrap_or_default())
    }
}

#[async_trait]
impl MailStore for GmailStore {
    async fn search_threads(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ThreadRef>> {
        // The threads endpoint only pages by token, so an offset is honored by
        // walking pages and discarding the first `offset` results.
        let wanted = offset + limit;
        let mut seen: Vec<ThreadRef> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let query = query.to_string();
            let token = page_token.clone();
            let (_, response) = Self::with_retry("threads_list", 3, || {
                let query = query.clone();
                let token = token.clone();
                async move {
                    let mut call = self
                        .hub
                        .users()
                        .threads_list("me")
                        .q(&query)
                        .max_results(wanted.min(100) as u32);
                    if let Some(t) = token.as_ref() {
                        call = call.page_token(t);
                    }
                    call.add_scope(self.oauth_scope)
                        .doit()
                        .await
                        .map_err(CleanerError::from)
                }
            })
            .await?;

            for thread in response.threads.unwrap_or_default() {
                if let Some(id) = thread.id {
                    seen.push(ThreadRef { id });
                }
            }

            page_token = response.next_page_token;
            if seen.len() >= wanted || page_token.is_none() {
                break;
            }
        }

        Ok(seen.into_iter().skip(offset).take(limit).collect())
    }

    async fn thread_messages(&self, thread_id: &str) -> Result<Vec<MessageSummary>> {
        let thread_id = thread_id.to_string();
        let (_, thread) = Self::with_retry("threads_get", 3, || {
            let thread_id = thread_id.clone();
            async move {
                self.hub
                    .users()
                    .threads_get("me", &thread_id)
                    .format("full")
                    .add_scope(self.oauth_scope)
                    .doit()
                    .await
                    .map_err(CleanerError::from)
            }
        })
        .await?;

        let messages = thread.messages.unwrap_or_default();
        let mut summaries = Vec::with_capacity(messages.len());
        for msg in messages {
            summaries.push(parse_message_summary(msg)?);
        }
        debug!("Fetched {} messages from thread {}", summaries.len(), thread_id);
        Ok(summaries)
    }

    async fn list_message_page(
        &self,
        query: &str,
        page_token: Option<&str>,
        page_size: u32,
        include_trash: bool,
    ) -> Result<MessagePage> {
        let query = query.to_string();
        let token = page_token.map(|t| t.to_string());

        let (_, response) = Self::with_retry("messages_list", 3, || {
            let query = query.clone();
            let token = token.clone();
            async move {
                let mut call = self
                    .hub
                    .users()
                    .messages_list("me")
                    .q(&query)
                    .max_results(page_size)
                    .include_spam_trash(include_trash);
                if let Some(t) = token.as_ref() {
                    call = call.page_token(t);
                }
                call.add_scope(self.oauth_scope)
                    .doit()
                    .await
                    .map_err(CleanerError::from)
            }
        })
        .await?;

        // The list endpoint returns bare ids; labels need a per-message fetch.
        let mut page = MessagePage {
            messages: Vec::new(),
            next_page_token: response.next_page_token,
        };

        for msg_ref in response.messages.unwrap_or_default() {
            let Some(id) = msg_ref.id else { continue };
            let labels = self.message_labels(&id).await?;
            page.messages.push(crate::models::MessageHandle { id, labels });
        }

        Ok(page)
    }

    async fn estimate_matches(&self, query: &str, include_trash: bool) -> Result<Option<u64>> {
        let query = query.to_string();
        let (_, response) = Self::with_retry("messages_list_estimate", 3, || {
            let query = query.clone();
            async move {
                self.hub
                    .users()
                    .messages_list("me")
                    .q(&query)
                    .max_results(1)
                    .include_spam_trash(include_trash)
                    .add_scope(self.oauth_scope)
                    .doit()
                    .await
                    .map_err(CleanerError::from)
            }
        })
        .await?;

        Ok(response.result_size_estimate.map(|n| n as u64))
    }

    async fn trash_message(&self, id: &str) -> Result<()> {
        self.ensure_writable()?;
        let id = id.to_string();
        Self::with_retry("messages_trash", 3, || {
            let id = id.clone();
            async move {
                self.hub
                    .users()
                    .messages_trash("me", &id)
                    .add_scope(self.oauth_scope)
                    .doit()
                    .await
                    .map_err(CleanerError::from)?;
                Ok(())
            }
        })
        .await
    }

    async fn hard_delete_message(&self, id: &str) -> Result<()> {
        self.ensure_writable()?;
        let id = id.to_string();
        Self::with_retry("messages_delete", 3, || {
            let id = id.clone();
            async move {
                self.hub
                    .users()
                    .messages_delete("me", &id)
                    .add_scope(self.oauth_scope)
                    .doit()
                    .await
                    .map_err(CleanerError::from)?;
                Ok(())
            }
        })
        .await
    }

    fn supports_bulk(&self) -> bool {
        self.writable
    }
}

/// Parse a Gmail API message into our read-only summary shape
fn parse_message_summary(msg: Message) -> Result<MessageSummary> {
    let id = msg
        .id
        .clone()
        .ok_or_else(|| CleanerError::InvalidMessageFormat("Missing message ID".to_string()))?;

    let thread_id = msg
        .thread_id
        .clone()
        .ok_or_else(|| CleanerError::InvalidMessageFormat("Missing thread ID".to_string()))?;

    let mut subject = String::new();
    let mut from = String::new();
    let mut date_header = String::new();

    if let Some(headers) = msg.payload.as_ref().and_then(|p| p.headers.as_ref()) {
        for header in headers {
            if let (Some(name), Some(value)) = (&header.name, &header.value) {
                match name.to_lowercase().as_str() {
                    "subject" => subject = value.clone(),
                    "from" => from = value.clone(),
                    "date" => date_header = value.clone(),
                    _ => {}
                }
            }
        }
    }

    let labels = msg.label_ids.clone().unwrap_or_default();
    let starred = labels.iter().any(|l| l == "STARRED");
    let in_inbox = labels.iter().any(|l| l == "INBOX");
    let in_trash = labels.iter().any(|l| l == "TRASH");

    // Prefer the precise internal date; the Date header is best-effort input.
    let date = msg
        .internal_date
        .and_then(DateTime::from_timestamp_millis)
        .or_else(|| parse_date_header(&date_header))
        .unwrap_or_else(Utc::now);

    let excerpt = extract_excerpt(&msg);

    Ok(MessageSummary {
        id,
        thread_id,
        subject,
        from,
        date,
        excerpt,
        starred,
        in_inbox,
        in_trash,
    })
}

fn parse_date_header(date_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(date_str) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

/// Short plain-text excerpt: first text/plain part, else snippet
fn extract_excerpt(msg: &Message) -> String {
    let body_text = msg
        .payload
        .as_ref()
        .and_then(find_plain_text)
        .or_else(|| msg.snippet.clone())
        .unwrap_or_default();

    truncate_chars(body_text.split_whitespace().collect::<Vec<_>>().join(" "), EXCERPT_CHARS)
}

/// Depth-first search for the first decodable text/plain part
fn find_plain_text(part: &MessagePart) -> Option<String> {
    if part.mime_type.as_deref() == Some("text/plain") {
        if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_ref()) {
            return Some(String::from_utf8_lossy(data).into_owned());
        }
    }

    part.parts
        .as_ref()?
        .iter()
        .find_map(find_plain_text)
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}
