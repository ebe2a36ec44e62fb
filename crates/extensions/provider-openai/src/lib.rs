//! OpenAI-compatible generation provider for PagePilot.
//!
//! Also serves OpenAI-compatible gateways through a custom URL and ID.

mod api;
mod provider;

pub use provider::{OpenAIProvider, DEFAULT_API_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT};
