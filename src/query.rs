//! Compiles a [`Filter`] into a Gmail search expression plus a local predicate
//!
//! Preview and delete both run from the same [`CompiledQuery`], so what the
//! user saw in the preview is exactly what the executor targets. The store
//! query and the local predicate encode the same star/trash/subject logic;
//! the predicate re-filters anything the store returns, and thread traversal
//! (which the store cannot query-filter) relies on the predicate alone.

use crate::filter::{Filter, Scope};
use crate::models::{MessageHandle, MessageSummary};

/// A store-native search expression paired with the filter that produced it
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    expression: String,
    filter: Filter,
}

impl CompiledQuery {
    /// Compile the search expression for a filter
    ///
    /// Clause layout mirrors the Gmail operators:
    /// - scope: `in:inbox` / `(in:inbox OR in:trash)` / `in:anywhere`
    /// - trash: `-in:trash` unless trash is included
    /// - star: `-is:starred` when starred mail is protected
    /// - subject: `subject:("a" OR "b")`, tokens escaped
    ///
    /// An empty clause set compiles to the `in:anywhere` catch-all, never an
    /// empty string. Thread scope emits no location clause at all; the thread
    /// is supplied externally and traversed with the predicate.
    pub fn compile(filter: &Filter) -> Self {
        let mut parts: Vec<String> = Vec::new();

        match filter.scope {
            Scope::Thread => {}
            Scope::Inbox => {
                if filter.include_trash {
                    parts.push("(in:inbox OR in:trash)".to_string());
                } else {
                    parts.push("in:inbox".to_string());
                }
            }
            Scope::AllMail => {
                if filter.include_trash {
                    // Without this, Gmail search skips trash and spam entirely,
                    // so trash-only messages would be unreachable.
                    parts.push("in:anywhere".to_string());
                }
            }
        }

        if !filter.include_trash {
            parts.push("-in:trash".to_string());
        }

        if filter.protect_starred {
            parts.push("-is:starred".to_string());
        }

        if !filter.subject_tokens.is_empty() {
            let terms = filter
                .subject_tokens
                .iter()
                .map(|t| format!("\"{}\"", escape_token(t)))
                .collect::<Vec<_>>()
                .join(" OR ");
            parts.push(format!("subject:({})", terms));
        }

        let expression = if parts.is_empty() {
            "in:anywhere".to_string()
        } else {
            parts.join(" ")
        };

        Self {
            expression,
            filter: filter.clone(),
        }
    }

    /// The store-native search string
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Full local predicate over a fetched message
    ///
    /// Mirrors every clause of the expression: scope location, trash, star and
    /// subject. Thread traversal walks whole conversation groups, so without
    /// the location clause an archived sibling of an inbox match would slip
    /// through here while the store query excludes it.
    pub fn matches(&self, msg: &MessageSummary) -> bool {
        if !self.location_matches(msg.in_inbox, msg.in_trash) {
            return false;
        }
        if self.filter.protect_starred && msg.starred {
            return false;
        }
        self.subject_matches(&msg.subject)
    }

    /// Label-only predicate for listing shapes that carry no subject
    ///
    /// Covers the location, star and trash clauses; the subject clause is
    /// enforced by the store query the listing was produced from.
    pub fn accepts_labels(&self, handle: &MessageHandle) -> bool {
        if !self.location_matches(handle.in_inbox(), handle.in_trash()) {
            return false;
        }
        if self.filter.protect_starred && handle.is_starred() {
            return false;
        }
        true
    }

    /// Mirror of the scope and trash clauses
    fn location_matches(&self, in_inbox: bool, in_trash: bool) -> bool {
        if in_trash && !self.filter.include_trash {
            return false;
        }
        match self.filter.scope {
            Scope::Inbox => in_inbox || (self.filter.include_trash && in_trash),
            Scope::Thread | Scope::AllMail => true,
        }
    }

    /// Order-independent OR over the subject tokens; empty tokens match all
    fn subject_matches(&self, subject: &str) -> bool {
        if self.filter.subject_tokens.is_empty() {
            return true;
        }
        let subject_lower = subject.to_lowercase();
        self.filter
            .subject_tokens
            .iter()
            .any(|t| subject_lower.contains(t.as_str()))
    }
}

/// Escape a subject token for embedding inside a quoted query term
fn escape_token(token: &str) -> String {
    token.replace('\\', "\\\\").replace('"', "\\\"")
}
