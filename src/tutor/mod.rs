//! Tutor replies from a language model with a canned fallback
//!
//! The model is asked to guide the student step by step. When it is
//! unreachable or returns garbage, a heuristic reply keeps the chat usable.

mod ollama;

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;

pub use ollama::OllamaModel;

/// Instructions prepended to every prompt
pub const SYSTEM_PROMPT: &str = "You are a helpful AI tutoring assistant. Your role is to guide \
students through learning topics by asking questions and helping them reason step by step \
rather than giving direct answers. When answering, first identify the subject (e.g., Algebra, \
Biology, Programming) and adapt your guidance accordingly. Provide hints and suggest key \
concepts from the relevant topic. Encourage the student to recall prior knowledge. After \
providing guidance, ask the student if the explanation was helpful and request feedback or a \
brief summary in their own words. This will help improve future lessons.";

const QUESTION_FALLBACK: &str = "That's a great question! Let's break it down together. What \
do you think is the first step to solving it?";

const STATEMENT_FALLBACK: &str = "I see. Let's explore that. Can you explain how you arrived \
at this point? I'll guide you through the next steps.";

/// A text-completion backend
#[async_trait]
pub trait TutorModel: Send + Sync {
    /// Model name for logging
    fn name(&self) -> &str;

    /// Complete a prompt
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Produces tutor replies
#[derive(Clone)]
pub struct Tutor {
    model: Option<Arc<dyn TutorModel>>,
}

impl Tutor {
    /// Tutor backed by a model
    #[must_use]
    pub fn new(model: Arc<dyn TutorModel>) -> Self {
        Self { model: Some(model) }
    }

    /// Tutor that always answers with the heuristic fallback
    #[must_use]
    pub const fn offline() -> Self {
        Self { model: None }
    }

    /// Reply to a student message (context already prepended)
    pub async fn respond(&self, message: &str) -> String {
        let Some(model) = &self.model else {
            return fallback_reply(message);
        };

        let prompt = build_prompt(message);
        match model.complete(&prompt).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => {
                tracing::warn!(model = model.name(), "model returned an empty reply, using fallback");
                fallback_reply(message)
            }
            Err(e) => {
                tracing::warn!(model = model.name(), error = %e, "model call failed, using fallback");
                fallback_reply(message)
            }
        }
    }
}

/// Full prompt sent to the model
#[must_use]
pub fn build_prompt(message: &str) -> String {
    format!("{SYSTEM_PROMPT}\n\nStudent: {message}\nTutor:")
}

/// Canned reply: questions get encouragement, statements get a probe
#[must_use]
pub fn fallback_reply(message: &str) -> String {
    if message.trim_end().ends_with('?') {
        QUESTION_FALLBACK.to_string()
    } else {
        STATEMENT_FALLBACK.to_string()
    }
}
