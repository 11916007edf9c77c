//! Context builder: loads a thread, compacts it and stores the summary

use crate::db::{GoalRepo, SummaryRepo, ThreadRepo};
use crate::Result;

use super::compaction::{self, Exchange, GoalLine, SummaryChange, DEFAULT_RETENTION_LIMIT};

/// Configuration for context building
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Message pairs kept verbatim before older ones are summarized
    pub retention_limit: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            retention_limit: DEFAULT_RETENTION_LIMIT,
        }
    }
}

/// Builds LLM context from a user's goals and thread history
#[derive(Clone)]
pub struct ContextBuilder {
    config: ContextConfig,
    goals: GoalRepo,
    threads: ThreadRepo,
    summaries: SummaryRepo,
}

impl ContextBuilder {
    /// Create a new context builder
    #[must_use]
    pub const fn new(
        config: ContextConfig,
        goals: GoalRepo,
        threads: ThreadRepo,
        summaries: SummaryRepo,
    ) -> Self {
        Self {
            config,
            goals,
            threads,
            summaries,
        }
    }

    /// Build the context block for a thread and persist any summary change
    ///
    /// # Errors
    ///
    /// Returns error if database operations fail
    pub fn build(&self, user_id: i64, thread_id: i64) -> Result<String> {
        let goals = self.goals.list_for_user(user_id)?;
        let messages = self.threads.messages(user_id, thread_id)?;
        let stored = self.summaries.get(user_id, thread_id)?;

        let goal_lines: Vec<GoalLine<'_>> = goals
            .iter()
            .map(|g| GoalLine {
                description: g.description.as_deref(),
                completed_sessions: g.completed_sessions,
                target_sessions: g.target_sessions,
            })
            .collect();
        let window: Vec<Exchange<'_>> = messages
            .iter()
            .map(|m| Exchange {
                message: &m.message,
                response: &m.response,
            })
            .collect();

        let compacted = compaction::compact(
            &goal_lines,
            &window,
            stored.as_ref().map(|r| &r.summary),
            self.config.retention_limit,
        );

        match compacted.summary {
            SummaryChange::Unchanged => {}
            SummaryChange::Store(summary) => {
                tracing::debug!(
                    user_id,
                    thread_id,
                    covered = summary.covered,
                    "storing thread summary"
                );
                self.summaries.upsert(user_id, thread_id, &summary)?;
            }
            SummaryChange::Clear => {
                tracing::debug!(user_id, thread_id, "clearing thread summary");
                self.summaries.delete(user_id, thread_id)?;
            }
        }

        Ok(compacted.text)
    }

    /// Older-message prefix length a summary written now stands for
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn summary_prefix_len(&self, user_id: i64, thread_id: i64) -> Result<usize> {
        let total = self.threads.thread_message_count(user_id, thread_id)?;
        Ok(total.saturating_sub(self.config.retention_limit))
    }

    /// Prepend context to the student's message
    #[must_use]
    pub fn format_prompt(context: &str, message: &str) -> String {
        format!("{context}\n\n{message}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_memory, NewGoal, Role, StoredSummary, UserRepo};

    struct Fixture {
        builder: ContextBuilder,
        threads: ThreadRepo,
        summaries: SummaryRepo,
        goals: GoalRepo,
        user_id: i64,
        thread_id: i64,
    }

    fn setup(retention_limit: usize) -> Fixture {
        let pool = init_memory().unwrap();
        let user = UserRepo::new(pool.clone())
            .create("context", "hash", Role::Student)
            .unwrap();
        let threads = ThreadRepo::new(pool.clone());
        let summaries = SummaryRepo::new(pool.clone());
        let goals = GoalRepo::new(pool);
        let thread_id = threads.list_for_user(user.id).unwrap()[0].id;

        Fixture {
            builder: ContextBuilder::new(
                ContextConfig { retention_limit },
                goals.clone(),
                threads.clone(),
                summaries.clone(),
            ),
            threads,
            summaries,
            goals,
            user_id: user.id,
            thread_id,
        }
    }

    fn add_messages(fx: &Fixture, range: std::ops::RangeInclusive<usize>) {
        for i in range {
            fx.threads
                .add_message(fx.user_id, fx.thread_id, &format!("m{i}"), &format!("r{i}"))
                .unwrap();
        }
    }

    #[test]
    fn test_empty_thread() {
        let fx = setup(5);
        let text = fx.builder.build(fx.user_id, fx.thread_id).unwrap();
        assert_eq!(
            text,
            "User goals: No active goals\nRecent history:\nNo recent history"
        );
    }

    #[test]
    fn test_goals_included() {
        let fx = setup(5);
        fx.goals
            .create(&NewGoal {
                user_id: fx.user_id,
                topic_id: 1,
                description: Some("Times tables".to_string()),
                target_sessions: 3,
                due_date: None,
            })
            .unwrap();

        let text = fx.builder.build(fx.user_id, fx.thread_id).unwrap();
        assert!(text.starts_with("User goals: Times tables (0/3 sessions)\n"));
    }

    #[test]
    fn test_summary_persisted_then_cleared() {
        let fx = setup(2);
        add_messages(&fx, 1..=4);

        let text = fx.builder.build(fx.user_id, fx.thread_id).unwrap();
        assert!(text.contains("Summary: Student: m1 Tutor: r1 | Student: m2 Tutor: r2"));

        let stored = fx.summaries.get(fx.user_id, fx.thread_id).unwrap().unwrap();
        assert_eq!(stored.summary.covered, 2);

        // Building again with a wider window no longer needs the summary
        let wide = ContextBuilder::new(
            ContextConfig { retention_limit: 10 },
            fx.goals.clone(),
            fx.threads.clone(),
            fx.summaries.clone(),
        );
        let text = wide.build(fx.user_id, fx.thread_id).unwrap();
        assert!(!text.contains("Summary:"));
        assert!(fx.summaries.get(fx.user_id, fx.thread_id).unwrap().is_none());
    }

    #[test]
    fn test_summary_regenerated_as_thread_grows() {
        let fx = setup(2);
        add_messages(&fx, 1..=3);
        fx.builder.build(fx.user_id, fx.thread_id).unwrap();

        add_messages(&fx, 4..=4);
        fx.builder.build(fx.user_id, fx.thread_id).unwrap();

        let stored = fx.summaries.get(fx.user_id, fx.thread_id).unwrap().unwrap();
        assert_eq!(
            stored.summary,
            StoredSummary::new("Student: m1 Tutor: r1 | Student: m2 Tutor: r2", 2)
        );
    }

    #[test]
    fn test_written_summary_replaced_once_prefix_grows() {
        let fx = setup(5);
        add_messages(&fx, 1..=7);

        let covered = fx.builder.summary_prefix_len(fx.user_id, fx.thread_id).unwrap();
        assert_eq!(covered, 2);
        fx.summaries
            .upsert(
                fx.user_id,
                fx.thread_id,
                &StoredSummary::new("Working on long division", covered),
            )
            .unwrap();

        let text = fx.builder.build(fx.user_id, fx.thread_id).unwrap();
        assert!(text.contains("Summary: Working on long division\n"));

        add_messages(&fx, 8..=8);
        let text = fx.builder.build(fx.user_id, fx.thread_id).unwrap();
        assert!(text.contains("Student: m3 Tutor: r3"));
        assert!(!text.contains("long division"));

        let stored = fx.summaries.get(fx.user_id, fx.thread_id).unwrap().unwrap();
        assert_eq!(stored.summary.covered, 3);
    }

    #[test]
    fn test_summary_prefix_len_short_thread() {
        let fx = setup(5);
        add_messages(&fx, 1..=3);
        assert_eq!(fx.builder.summary_prefix_len(fx.user_id, fx.thread_id).unwrap(), 0);
    }

    #[test]
    fn test_format_prompt() {
        assert_eq!(
            ContextBuilder::format_prompt("ctx", "What is 2+2?"),
            "ctx\n\nWhat is 2+2?"
        );
    }
}
