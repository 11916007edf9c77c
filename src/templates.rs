//! Goal templates: ready-made goal sets for common subjects

use crate::db::{Goal, GoalRepo, NewGoal, TopicRepo};
use crate::{Error, Result};

/// One goal in a template, keyed by the seeded topic name
#[derive(Debug, Clone, Copy)]
pub struct TemplateGoal {
    pub topic: &'static str,
    pub description: &'static str,
    pub target_sessions: u32,
}

const MATH: &[TemplateGoal] = &[
    TemplateGoal {
        topic: "Algebra I",
        description: "Practice solving linear equations",
        target_sessions: 5,
    },
    TemplateGoal {
        topic: "Geometry",
        description: "Review triangle properties and proofs",
        target_sessions: 3,
    },
];

const SCIENCE: &[TemplateGoal] = &[
    TemplateGoal {
        topic: "Biology",
        description: "Learn cell structure and function",
        target_sessions: 4,
    },
    TemplateGoal {
        topic: "Chemistry",
        description: "Balance chemical equations",
        target_sessions: 4,
    },
];

const LANGUAGE: &[TemplateGoal] = &[
    TemplateGoal {
        topic: "Grammar & Writing",
        description: "Write and revise a five-paragraph essay",
        target_sessions: 3,
    },
    TemplateGoal {
        topic: "Reading & Literature",
        description: "Analyze themes in a short story",
        target_sessions: 3,
    },
];

const PROGRAMMING: &[TemplateGoal] = &[
    TemplateGoal {
        topic: "Python Programming",
        description: "Write programs using loops and functions",
        target_sessions: 5,
    },
    TemplateGoal {
        topic: "Java Programming",
        description: "Model a problem with classes and objects",
        target_sessions: 4,
    },
];

const HISTORY: &[TemplateGoal] = &[
    TemplateGoal {
        topic: "U.S. History",
        description: "Outline the causes of the American Revolution",
        target_sessions: 3,
    },
    TemplateGoal {
        topic: "World History",
        description: "Compare ancient civilizations",
        target_sessions: 3,
    },
];

/// Template subjects in display order
pub const TEMPLATE_SUBJECTS: [&str; 5] = ["math", "science", "language", "programming", "history"];

/// Goals for a template subject (case-insensitive)
#[must_use]
pub fn template(subject: &str) -> Option<&'static [TemplateGoal]> {
    match subject.to_lowercase().as_str() {
        "math" => Some(MATH),
        "science" => Some(SCIENCE),
        "language" => Some(LANGUAGE),
        "programming" => Some(PROGRAMMING),
        "history" => Some(HISTORY),
        _ => None,
    }
}

/// Create a template's goals for a user
///
/// # Errors
///
/// Returns `Error::NotFound` for an unknown template, user or topic, or a
/// database error
pub fn apply_template(
    subject: &str,
    user_id: i64,
    topics: &TopicRepo,
    goals: &GoalRepo,
) -> Result<Vec<Goal>> {
    let entries =
        template(subject).ok_or_else(|| Error::NotFound("Template not found".to_string()))?;

    let mut created = Vec::with_capacity(entries.len());
    for entry in entries {
        let topic = topics
            .find_by_name(entry.topic)?
            .ok_or_else(|| Error::NotFound(format!("Topic not found: {}", entry.topic)))?;

        created.push(goals.create(&NewGoal {
            user_id,
            topic_id: topic.id,
            description: Some(entry.description.to_string()),
            target_sessions: entry.target_sessions,
            due_date: None,
        })?);
    }

    tracing::info!(user_id, subject, goals = created.len(), "applied goal template");
    Ok(created)
}
