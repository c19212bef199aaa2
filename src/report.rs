//! User-facing summaries of scan and delete results
//!
//! Pure formatting, no decisions: counts, truncation caveats, partial-failure
//! caveats. The wording distinguishes "nothing matched" from "matched but
//! nothing could be deleted".

use crate::filter::Filter;
use crate::models::{DeleteOutcome, MatchTotal, MessageSummary, ScanResult};

/// One-line restatement of the active filter, add-on style
pub fn describe_filter(filter: &Filter) -> String {
    let subject = if filter.subject_tokens.is_empty() {
        "any".to_string()
    } else {
        filter.subject_tokens.join(", ")
    };

    format!(
        "Scope: {} | Subject: {} | Starred safe: {} | Include trash: {}",
        filter.scope.as_str(),
        subject,
        yes_no(filter.protect_starred),
        yes_no(filter.include_trash),
    )
}

/// Headline summary of a preview scan
pub fn scan_summary(result: &ScanResult) -> String {
    let mut summary = match result.total {
        MatchTotal::Exact(0) => return "No matching emails found.".to_string(),
        MatchTotal::Exact(n) if result.count_truncated => {
            format!("Found at least {} matching emails (stopped counting at the limit).", n)
        }
        MatchTotal::Exact(1) => "Found 1 matching email.".to_string(),
        MatchTotal::Exact(n) => format!("Found {} matching emails.", n),
        MatchTotal::Estimated(n) if result.count_truncated => {
            format!("Found roughly {} matching emails (estimated, possibly more).", n)
        }
        MatchTotal::Estimated(n) => format!("Found about {} matching emails (estimated).", n),
    };

    let shown = result.preview.len() as u64;
    if shown > 0 && shown < result.total.value() {
        summary.push_str(&format!(" Showing the first {}.", shown));
    }

    summary
}

/// One display line per preview item, in store order
pub fn preview_lines(result: &ScanResult) -> Vec<String> {
    result.preview.iter().map(preview_line).collect()
}

fn preview_line(msg: &MessageSummary) -> String {
    let subject = if msg.subject.is_empty() {
        "(no subject)"
    } else {
        &msg.subject
    };
    let mut line = format!("{}  {}  {}", msg.date.format("%Y-%m-%d"), msg.from, subject);
    if !msg.excerpt.is_empty() {
        line.push_str(&format!(" - {}", msg.excerpt));
    }
    line
}

/// Headline summary of a delete run
pub fn delete_summary(outcome: &DeleteOutcome) -> String {
    if outcome.total_candidates == 0 {
        return "No matching emails found. Nothing was deleted.".to_string();
    }

    let mut summary = if outcome.deleted == 0 && outcome.errors > 0 {
        format!(
            "Matched {} emails but none could be deleted ({} errors).",
            outcome.total_candidates, outcome.errors
        )
    } else if outcome.errors > 0 {
        format!(
            "Deleted {} of {} matching emails ({} failed).",
            outcome.deleted, outcome.total_candidates, outcome.errors
        )
    } else {
        format!(
            "Deleted {} of {} matching emails.",
            outcome.deleted, outcome.total_candidates
        )
    };

    if outcome.truncated {
        summary.push_str(" Stopped at the safety limit; run again to continue.");
    }

    summary
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
