//! # PagePilot Planner
//!
//! Turns a goal and a page snapshot into an ordered list of browser actions.
//!
//! Stages run strictly in order for each request:
//!
//! 1. [`RelevanceRanker`] narrows the page elements to a goal-relevant subset.
//! 2. [`PromptBuilder`] renders the instruction prompt.
//! 3. [`ProviderChain`] calls the primary provider, then the fallback, each
//!    through the shared [`CallGate`].
//! 4. [`parse_plan`] validates the model output into [`PlannedStep`]s.
//!
//! [`Planner`] composes the stages.
//!
//! [`PlannedStep`]: pagepilot_protocols::PlannedStep

pub mod gate;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod ranker;
pub mod rate_limit;
pub mod rules;

pub use gate::{is_retryable, CallGate, RetryConfig};
pub use orchestrator::{PlanRequest, Planner, PlannerOptions, ProviderChain, ProviderStats};
pub use parser::{extract_json_object, parse_plan};
pub use prompt::{PromptBuilder, DEFAULT_PROMPT_ELEMENT_LIMIT};
pub use ranker::{RankedElement, RankedElements, RankerConfig, RankingMode, RelevanceRanker};
pub use rate_limit::{RateLimitConfig, RateLimitStatus, RateLimiter};
pub use rules::{HeuristicRule, HeuristicRules};
