//! Anthropic generation provider for PagePilot.

mod api;
mod provider;

pub use provider::{AnthropicProvider, DEFAULT_MODEL, DEFAULT_TIMEOUT};
