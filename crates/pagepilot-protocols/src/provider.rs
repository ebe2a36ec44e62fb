//! Generation provider protocol.
//!
//! A provider turns a prompt into raw text. Request and response shapes of
//! the concrete API stay inside the implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Context hints passed alongside the prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationContext {
    pub goal: String,
    pub url: String,
    pub page_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Core trait for text generation backends.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Returns the provider ID.
    fn id(&self) -> &str;

    /// Returns the model this provider generates with.
    fn model(&self) -> &str;

    /// Generate raw text for a prompt.
    async fn generate(
        &self,
        prompt: &str,
        context: &GenerationContext,
    ) -> Result<String, ProviderError>;
}
