//! Common test utilities: an in-memory mail store with a virtual mailbox
//!
//! `FixtureStore` implements `MailStore` over a deterministic set of fixture
//! messages and actually evaluates the compiled query grammar, so tests can
//! verify that the store-query clauses and the local predicate agree. It also
//! supports failure injection (listing, estimate, per-message delete) and
//! records every mutation.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Mutex;

use gmail_cleaner::client::MailStore;
use gmail_cleaner::error::{CleanerError, Result};
use gmail_cleaner::models::{MessageHandle, MessagePage, MessageSummary, ThreadRef};

/// One virtual message; labels follow Gmail conventions (INBOX, STARRED, TRASH)
#[derive(Debug, Clone)]
pub struct FixtureMessage {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub from: String,
    pub labels: Vec<String>,
    pub body: String,
}

impl FixtureMessage {
    pub fn new(id: &str, thread_id: &str, subject: &str) -> Self {
        Self {
            id: id.to_string(),
            thread_id: thread_id.to_string(),
            subject: subject.to_string(),
            from: "sender@example.com".to_string(),
            labels: vec!["INBOX".to_string()],
            body: format!("body of {}", id),
        }
    }

    pub fn starred(mut self) -> Self {
        self.labels.push("STARRED".to_string());
        self
    }

    pub fn trashed(mut self) -> Self {
        self.labels.retain(|l| l != "INBOX");
        self.labels.push("TRASH".to_string());
        self
    }

    pub fn archived(mut self) -> Self {
        self.labels.retain(|l| l != "INBOX");
        self
    }

    fn is_trashed(&self) -> bool {
        self.labels.iter().any(|l| l == "TRASH")
    }

    fn to_summary(&self, index: usize) -> MessageSummary {
        // Deterministic reverse-chronological dates: earlier index = newer
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        MessageSummary {
            id: self.id.clone(),
            thread_id: self.thread_id.clone(),
            subject: self.subject.clone(),
            from: self.from.clone(),
            date: base - Duration::minutes(index as i64),
            excerpt: self.body.clone(),
            starred: self.labels.iter().any(|l| l == "STARRED"),
            in_inbox: self.labels.iter().any(|l| l == "INBOX"),
            in_trash: self.is_trashed(),
        }
    }

    fn to_handle(&self) -> MessageHandle {
        MessageHandle {
            id: self.id.clone(),
            labels: self.labels.clone(),
        }
    }
}

/// How the fixture answers `estimate_matches`
#[derive(Debug, Clone)]
pub enum EstimateMode {
    /// Compute the true count over the virtual mailbox
    Exact,
    /// Return a fixed value (or None for "no estimate available")
    Fixed(Option<u64>),
    /// Fail the call
    Fail,
}

pub struct FixtureStore {
    messages: Mutex<Vec<FixtureMessage>>,
    pub bulk_capable: bool,
    fail_listing: Mutex<bool>,
    estimate_mode: Mutex<EstimateMode>,
    fail_delete_ids: Mutex<HashSet<String>>,
    trashed_ids: Mutex<Vec<String>>,
    hard_deleted_ids: Mutex<Vec<String>>,
}

impl FixtureStore {
    pub fn new(messages: Vec<FixtureMessage>) -> Self {
        Self {
            messages: Mutex::new(messages),
            bulk_capable: true,
            fail_listing: Mutex::new(false),
            estimate_mode: Mutex::new(EstimateMode::Exact),
            fail_delete_ids: Mutex::new(HashSet::new()),
            trashed_ids: Mutex::new(Vec::new()),
            hard_deleted_ids: Mutex::new(Vec::new()),
        }
    }

    pub fn without_bulk(mut self) -> Self {
        self.bulk_capable = false;
        self
    }

    pub fn set_fail_listing(&self, fail: bool) {
        *self.fail_listing.lock().unwrap() = fail;
    }

    pub fn set_estimate_mode(&self, mode: EstimateMode) {
        *self.estimate_mode.lock().unwrap() = mode;
    }

    pub fn fail_delete_of(&self, id: &str) {
        self.fail_delete_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn trashed_ids(&self) -> Vec<String> {
        self.trashed_ids.lock().unwrap().clone()
    }

    pub fn hard_deleted_ids(&self) -> Vec<String> {
        self.hard_deleted_ids.lock().unwrap().clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.trashed_ids().len() + self.hard_deleted_ids().len()
    }

    /// Evaluate the compiled query grammar against one message
    ///
    /// Understands exactly the clauses the compiler emits: `in:inbox`,
    /// `(in:inbox OR in:trash)`, `in:anywhere`, `-in:trash`, `-is:starred`,
    /// and `subject:("a" OR "b")`.
    pub fn query_matches(query: &str, msg: &FixtureMessage) -> bool {
        let in_inbox = msg.labels.iter().any(|l| l == "INBOX");
        let starred = msg.labels.iter().any(|l| l == "STARRED");
        let trashed = msg.is_trashed();

        if query.contains("(in:inbox OR in:trash)") {
            if !in_inbox && !trashed {
                return false;
            }
        } else if query.contains("in:inbox") && !in_inbox {
            return false;
        }

        if query.contains("-in:trash") && trashed {
            return false;
        }
        if query.contains("-is:starred") && starred {
            return false;
        }

        if let Some(tokens) = extract_subject_tokens(query) {
            let subject = msg.subject.to_lowercase();
            if !tokens.iter().any(|t| subject.contains(t.as_str())) {
                return false;
            }
        }

        true
    }

    fn matching_messages(&self, query: &str, include_trash: bool) -> Vec<FixtureMessage> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| include_trash || !m.is_trashed())
            .filter(|m| Self::query_matches(query, m))
            .cloned()
            .collect()
    }
}

/// Pull the quoted tokens out of a `subject:("a" OR "b")` clause
fn extract_subject_tokens(query: &str) -> Option<Vec<String>> {
    let start = query.find("subject:(")? + "subject:(".len();
    let rest = &query[start..];
    let end = rest.rfind(')')?;
    let group = &rest[..end];

    let tokens = group
        .split(" OR ")
        .map(|t| t.trim().trim_matches('"').replace("\\\"", "\"").replace("\\\\", "\\"))
        .filter(|t| !t.is_empty())
        .collect();
    Some(tokens)
}

#[async_trait]
impl MailStore for FixtureStore {
    async fn search_threads(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ThreadRef>> {
        // Thread-level search: a thread matches when any message matches
        let mut thread_ids: Vec<String> = Vec::new();
        for msg in self.messages.lock().unwrap().iter() {
            if Self::query_matches(query, msg) && !thread_ids.contains(&msg.thread_id) {
                thread_ids.push(msg.thread_id.clone());
            }
        }

        Ok(thread_ids
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|id| ThreadRef { id })
            .collect())
    }

    async fn thread_messages(&self, thread_id: &str) -> Result<Vec<MessageSummary>> {
        let messages = self.messages.lock().unwrap();
        let summaries: Vec<MessageSummary> = messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.thread_id == thread_id)
            .map(|(i, m)| m.to_summary(i))
            .collect();

        if summaries.is_empty() {
            return Err(CleanerError::MessageNotFound(format!(
                "thread {} not found",
                thread_id
            )));
        }
        Ok(summaries)
    }

    async fn list_message_page(
        &self,
        query: &str,
        page_token: Option<&str>,
        page_size: u32,
        include_trash: bool,
    ) -> Result<MessagePage> {
        if *self.fail_listing.lock().unwrap() {
            return Err(CleanerError::ServerError {
                status: 503,
                message: "injected listing failure".to_string(),
            });
        }

        let matching = self.matching_messages(query, include_trash);
        let start: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + page_size as usize).min(matching.len());

        let next_page_token = if end < matching.len() {
            Some(end.to_string())
        } else {
            None
        };

        Ok(MessagePage {
            messages: matching[start..end].iter().map(|m| m.to_handle()).collect(),
            next_page_token,
        })
    }

    async fn estimate_matches(&self, query: &str, include_trash: bool) -> Result<Option<u64>> {
        match self.estimate_mode.lock().unwrap().clone() {
            EstimateMode::Exact => {
                Ok(Some(self.matching_messages(query, include_trash).len() as u64))
            }
            EstimateMode::Fixed(value) => Ok(value),
            EstimateMode::Fail => Err(CleanerError::ServerError {
                status: 503,
                message: "injected estimate failure".to_string(),
            }),
        }
    }

    async fn trash_message(&self, id: &str) -> Result<()> {
        if self.fail_delete_ids.lock().unwrap().contains(id) {
            return Err(CleanerError::ApiError(format!("injected failure for {}", id)));
        }

        let mut messages = self.messages.lock().unwrap();
        let msg = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| CleanerError::MessageNotFound(id.to_string()))?;
        msg.labels.retain(|l| l != "INBOX");
        if !msg.is_trashed() {
            msg.labels.push("TRASH".to_string());
        }
        self.trashed_ids.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn hard_delete_message(&self, id: &str) -> Result<()> {
        if self.fail_delete_ids.lock().unwrap().contains(id) {
            return Err(CleanerError::ApiError(format!("injected failure for {}", id)));
        }

        let mut messages = self.messages.lock().unwrap();
        let before = messages.len();
        messages.retain(|m| m.id != id);
        if messages.len() == before {
            return Err(CleanerError::MessageNotFound(id.to_string()));
        }
        self.hard_deleted_ids.lock().unwrap().push(id.to_string());
        Ok(())
    }

    fn supports_bulk(&self) -> bool {
        self.bulk_capable
    }
}

/// The three-message inbox from the preview acceptance scenario
pub fn scenario_inbox() -> Vec<FixtureMessage> {
    vec![
        FixtureMessage::new("m1", "t1", "Promo weekend").starred(),
        FixtureMessage::new("m2", "t2", "Promo weekend"),
        FixtureMessage::new("m3", "t3", "Other business"),
    ]
}

/// N single-message inbox threads, all with a "promo" subject
pub fn promo_inbox(n: usize) -> Vec<FixtureMessage> {
    (0..n)
        .map(|i| {
            FixtureMessage::new(
                &format!("m{}", i),
                &format!("t{}", i),
                &format!("Promo offer {}", i),
            )
        })
        .collect()
}
