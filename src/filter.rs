//! User filter model: scope, subject tokens, star/trash flags
//!
//! Raw form input is normalized exactly once, up front. Whatever the UI sends,
//! `Filter::normalize` always yields a valid filter; unknown scopes fall back
//! to the current thread, which is the narrowest (safest) target.

use serde::{Deserialize, Serialize};

/// Where the cleanup operates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Only the currently open conversation thread
    Thread,
    /// The inbox (optionally plus trash)
    Inbox,
    /// The whole account
    AllMail,
}

impl Scope {
    /// Parse a raw scope string; anything unrecognized defaults to `Thread`
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "inbox" => Scope::Inbox,
            "all" | "allmail" | "all-mail" | "all_mail" => Scope::AllMail,
            _ => Scope::Thread,
        }
    }

    /// Short lowercase name, matching the add-on form values
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Thread => "thread",
            Scope::Inbox => "inbox",
            Scope::AllMail => "all",
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Thread
    }
}

/// Canonical cleanup filter, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub scope: Scope,
    /// Lowercased subject substrings, in input order (OR semantics, display order preserved)
    pub subject_tokens: Vec<String>,
    /// Starred messages are never candidates when set
    pub protect_starred: bool,
    /// Reach into trash and allow permanent deletion of trashed matches
    pub include_trash: bool,
}

impl Filter {
    /// Normalize raw form input into a canonical filter
    ///
    /// Never fails: unknown scope becomes `Thread`, subject text tokenizes to
    /// possibly-empty lowercase substrings.
    pub fn normalize(
        raw_scope: &str,
        raw_subject_text: &str,
        protect_starred: bool,
        include_trash: bool,
    ) -> Self {
        Self {
            scope: Scope::parse(raw_scope),
            subject_tokens: tokenize_subjects(raw_subject_text),
            protect_starred,
            include_trash,
        }
    }
}

/// Split free-text subject input into match tokens
///
/// Splits on commas and newlines, trims, lowercases, drops empties. Order is
/// preserved and duplicates are kept; matching is order-independent OR.
pub fn tokenize_subjects(raw: &str) -> Vec<String> {
    raw.split(|c| c == ',' || c == '\n')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
