//! Planning pipeline errors.
//!
//! Ranking failures never appear here: the ranker absorbs them and degrades
//! to unranked buckets. Everything the caller can observe is a
//! [`PlanningError`].

use thiserror::Error;

use super::ProviderError;

/// Failure of the generation stage, after retries and failover.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Rate limit exceeded for provider '{provider}' after {attempts} attempts")]
    RateLimitExceeded { provider: String, attempts: u32 },

    #[error("Generation failed for provider '{provider}': {source}")]
    GenerationFailed {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("No generation provider is configured")]
    NoProviders,
}

impl GenerationError {
    /// Provider that produced this failure, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::RateLimitExceeded { provider, .. } | Self::GenerationFailed { provider, .. } => {
                Some(provider)
            }
            Self::NoProviders => None,
        }
    }
}

/// Failure to turn raw model text into a validated plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Planner returned non-JSON output: {0}")]
    MalformedOutput(String),

    #[error("Planner output missing non-empty 'steps' list")]
    MissingSteps,

    #[error("Invalid step at index {index}: {cause}")]
    InvalidStep { index: usize, cause: String },
}

/// Umbrella error returned to callers of the planner.
#[derive(Debug, Clone, Error)]
pub enum PlanningError {
    #[error("Planning failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Planning failed: {0}")]
    Parse(#[from] ParseError),
}

/// Flat identification of a planning failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanningErrorKind {
    RateLimitExceeded,
    GenerationFailed,
    NoProviders,
    MalformedOutput,
    MissingSteps,
    InvalidStep,
}

impl PlanningError {
    pub fn kind(&self) -> PlanningErrorKind {
        match self {
            Self::Generation(GenerationError::RateLimitExceeded { .. }) => {
                PlanningErrorKind::RateLimitExceeded
            }
            Self::Generation(GenerationError::GenerationFailed { .. }) => {
                PlanningErrorKind::GenerationFailed
            }
            Self::Generation(GenerationError::NoProviders) => PlanningErrorKind::NoProviders,
            Self::Parse(ParseError::MalformedOutput(_)) => PlanningErrorKind::MalformedOutput,
            Self::Parse(ParseError::MissingSteps) => PlanningErrorKind::MissingSteps,
            Self::Parse(ParseError::InvalidStep { .. }) => PlanningErrorKind::InvalidStep,
        }
    }
}
