//! Conversation compaction
//!
//! Keeps the most recent message pairs verbatim and folds everything older
//! into a single summary line, so the context stays bounded however long a
//! thread grows. Pure: the caller loads inputs and persists the returned
//! [`SummaryChange`].

use crate::db::StoredSummary;

/// Pairs kept verbatim when no limit is configured
pub const DEFAULT_RETENTION_LIMIT: usize = 5;

/// A goal as it appears in the context
#[derive(Debug, Clone, Copy)]
pub struct GoalLine<'a> {
    pub description: Option<&'a str>,
    pub completed_sessions: u32,
    pub target_sessions: u32,
}

/// One student message and the tutor's reply
#[derive(Debug, Clone, Copy)]
pub struct Exchange<'a> {
    pub message: &'a str,
    pub response: &'a str,
}

/// What the caller must do with the stored summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryChange {
    /// Stored summary (or its absence) is still correct
    Unchanged,
    /// Replace the stored summary
    Store(StoredSummary),
    /// Delete the stored summary
    Clear,
}

/// Output of [`compact`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactedContext {
    pub text: String,
    pub summary: SummaryChange,
}

/// Build the context block for a thread
///
/// `window` is the full thread history, oldest first. A limit of 0 folds
/// every pair into the summary.
#[must_use]
pub fn compact(
    goals: &[GoalLine<'_>],
    window: &[Exchange<'_>],
    existing: Option<&StoredSummary>,
    retention_limit: usize,
) -> CompactedContext {
    let goals_text = render_goals(goals);

    let (summary, change, recent) = if window.len() <= retention_limit {
        let change = if existing.is_some() {
            SummaryChange::Clear
        } else {
            SummaryChange::Unchanged
        };
        (None, change, window)
    } else {
        let (older, recent) = window.split_at(window.len() - retention_limit);
        match existing {
            Some(stored) if stored.covered == older.len() && !stored.text.is_empty() => {
                (Some(stored.text.clone()), SummaryChange::Unchanged, recent)
            }
            _ => {
                let generated = StoredSummary::new(summarize(older), older.len());
                (
                    Some(generated.text.clone()),
                    SummaryChange::Store(generated),
                    recent,
                )
            }
        }
    };

    let mut history = Vec::with_capacity(recent.len() + 1);
    if let Some(summary) = summary.as_deref().filter(|s| !s.is_empty()) {
        history.push(format!("Summary: {summary}"));
    }
    history.extend(
        recent
            .iter()
            .map(|e| format!("Student: {}\nTutor: {}", e.message, e.response)),
    );

    let history_text = if history.is_empty() {
        "No recent history".to_string()
    } else {
        history.join("\n")
    };

    CompactedContext {
        text: format!("User goals: {goals_text}\nRecent history:\n{history_text}"),
        summary: change,
    }
}

/// Deterministic placeholder summary of older exchanges
#[must_use]
pub fn summarize(older: &[Exchange<'_>]) -> String {
    older
        .iter()
        .map(|e| format!("Student: {} Tutor: {}", e.message, e.response))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn render_goals(goals: &[GoalLine<'_>]) -> String {
    if goals.is_empty() {
        return "No active goals".to_string();
    }

    goals
        .iter()
        .map(|g| {
            format!(
                "{} ({}/{} sessions)",
                g.description.filter(|d| !d.is_empty()).unwrap_or("Goal"),
                g.completed_sessions,
                g.target_sessions
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}
