use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::Scope;

/// Maximum excerpt length kept from a message body
pub const EXCERPT_CHARS: usize = 180;

/// Read-only snapshot of one message, enough to preview and to match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub from: String,
    pub date: DateTime<Utc>,
    /// Short plain-text body excerpt for preview display
    pub excerpt: String,
    pub starred: bool,
    pub in_inbox: bool,
    pub in_trash: bool,
}

/// Minimal listing shape returned by paginated mailbox listing
#[derive(Debug, Clone)]
pub struct MessageHandle {
    pub id: String,
    pub labels: Vec<String>,
}

impl MessageHandle {
    pub fn is_starred(&self) -> bool {
        self.labels.iter().any(|l| l == "STARRED")
    }

    pub fn in_inbox(&self) -> bool {
        self.labels.iter().any(|l| l == "INBOX")
    }

    pub fn in_trash(&self) -> bool {
        self.labels.iter().any(|l| l == "TRASH")
    }
}

/// One page of a paginated mailbox listing
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    pub messages: Vec<MessageHandle>,
    pub next_page_token: Option<String>,
}

/// Reference to a conversation group returned by thread search
#[derive(Debug, Clone)]
pub struct ThreadRef {
    pub id: String,
}

/// Total match count, explicit about its provenance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchTotal {
    /// Counted by exhaustive (possibly capped) enumeration
    Exact(u64),
    /// Store-side estimate or capped sample count; treat as approximate
    Estimated(u64),
}

impl MatchTotal {
    pub fn value(&self) -> u64 {
        match self {
            MatchTotal::Exact(n) | MatchTotal::Estimated(n) => *n,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, MatchTotal::Exact(_))
    }
}

/// Result of a non-destructive preview scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Up to `preview_limit` matches in the store's natural order
    pub preview: Vec<MessageSummary>,
    pub total: MatchTotal,
    /// True when the count enumeration stopped at its hard cap
    pub count_truncated: bool,
}

/// Structured outcome of a delete run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub scope: Scope,
    /// Messages that matched the predicate and were attempted
    pub total_candidates: u64,
    pub deleted: u64,
    pub errors: u64,
    /// True when the run stopped before exhausting all matches
    pub truncated: bool,
}

impl DeleteOutcome {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            total_candidates: 0,
            deleted: 0,
            errors: 0,
            truncated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_label_flags() {
        let handle = MessageHandle {
            id: "m1".to_string(),
            labels: vec!["INBOX".to_string(), "STARRED".to_string()],
        };
        assert!(handle.is_starred());
        assert!(handle.in_inbox());
        assert!(!handle.in_trash());

        let trashed = MessageHandle {
            id: "m2".to_string(),
            labels: vec!["TRASH".to_string()],
        };
        assert!(trashed.in_trash());
        assert!(!trashed.in_inbox());
        assert!(!trashed.is_starred());
    }

    #[test]
    fn test_match_total() {
        assert_eq!(MatchTotal::Exact(3).value(), 3);
        assert_eq!(MatchTotal::Estimated(40).value(), 40);
        assert!(MatchTotal::Exact(0).is_exact());
        assert!(!MatchTotal::Estimated(0).is_exact());
    }

    #[test]
    fn test_scan_result_serialization() {
        let result = ScanResult {
            preview: vec![MessageSummary {
                id: "m1".to_string(),
                thread_id: "t1".to_string(),
                subject: "Promo blast".to_string(),
                from: "noreply@shop.example".to_string(),
                date: Utc::now(),
                excerpt: "Huge savings...".to_string(),
                starred: false,
                in_inbox: true,
                in_trash: false,
            }],
            total: MatchTotal::Exact(1),
            count_truncated: false,
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: ScanResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.preview.len(), 1);
        assert_eq!(back.total, MatchTotal::Exact(1));
    }
}
