//! # PagePilot Protocols
//!
//! Shared types and collaborator traits for the PagePilot action planner.
//! Contains only interface definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`GenerationProvider`] - Trait for text generation backends
//! - [`EmbeddingProvider`] - Trait for text embedding backends

pub mod embedding;
pub mod error;
pub mod page;
pub mod plan;
pub mod provider;

pub use embedding::{Embedding, EmbeddingProvider};
pub use error::{
    EmbeddingError, GenerationError, ParseError, PlanningError, PlanningErrorKind, ProviderError,
};
pub use page::{ElementCategory, PageElement, PageSnapshot};
pub use plan::{PlannedStep, StepAction, TargetHints};
pub use provider::{GenerationContext, GenerationProvider};
