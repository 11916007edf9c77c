//! Context building for tutor conversations
//!
//! Combines:
//! - Study goals with session progress
//! - A summary of older exchanges
//! - The most recent exchanges verbatim

mod builder;
mod compaction;

pub use builder::{ContextBuilder, ContextConfig};
pub use compaction::{
    compact, summarize, CompactedContext, Exchange, GoalLine, SummaryChange,
    DEFAULT_RETENTION_LIMIT,
};
