//! Ranking engine.
//!
//! Builds the shared prompt, fans it out across the panel, and turns each
//! backend's free-text reply into a rank verdict.

pub mod aggregator;
pub mod parser;
pub mod prompt;
pub mod resolver;

pub use aggregator::{Aggregator, AggregatorConfig};
pub use prompt::{DEFAULT_PROMPT_TEMPLATE, DEFAULT_TOP_K};
pub use resolver::MatchPolicy;
