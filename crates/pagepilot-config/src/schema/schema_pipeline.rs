//! Pipeline stage configuration types.

use serde::{Deserialize, Serialize};

use super::is_real_credential;

/// Provider selection and prompt limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Name of the primary provider in `[providers]`.
    #[serde(default = "default_primary")]
    pub primary: String,

    /// Name of the fallback provider in `[providers]`.
    #[serde(default = "default_fallback")]
    pub fallback: Option<String>,

    /// When false the primary is skipped and only the fallback is tried.
    #[serde(default = "default_true")]
    pub use_primary: bool,

    /// Snapshot elements considered before ranking.
    #[serde(default = "default_max_input_elements")]
    pub max_input_elements: usize,

    /// Elements embedded in the prompt.
    #[serde(default = "default_prompt_element_limit")]
    pub prompt_element_limit: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            fallback: default_fallback(),
            use_primary: default_true(),
            max_input_elements: default_max_input_elements(),
            prompt_element_limit: default_prompt_element_limit(),
        }
    }
}

fn default_primary() -> String {
    "backboard".to_string()
}

fn default_fallback() -> Option<String> {
    Some("openai".to_string())
}

fn default_true() -> bool {
    true
}

fn default_max_input_elements() -> usize {
    110
}

fn default_prompt_element_limit() -> usize {
    20
}

/// Relevance ranking parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    #[serde(default = "default_per_category_cap")]
    pub per_category_cap: usize,

    /// Backfill target when too few elements pass the threshold.
    #[serde(default = "default_min_per_category")]
    pub min_per_category: usize,

    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            similarity_threshold: default_similarity_threshold(),
            per_category_cap: default_per_category_cap(),
            min_per_category: default_min_per_category(),
            max_text_chars: default_max_text_chars(),
        }
    }
}

fn default_similarity_threshold() -> f32 {
    0.3
}

fn default_per_category_cap() -> usize {
    20
}

fn default_min_per_category() -> usize {
    10
}

fn default_max_text_chars() -> usize {
    500
}

/// Known embedding provider kinds.
pub const EMBEDDING_PROVIDERS: &[&str] = &["voyage", "openai", "hash"];

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "voyage", "openai" or "hash".
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,

    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            api_key: None,
            base_url: None,
            model: None,
            dimension: None,
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_configured(&self) -> bool {
        self.provider == "hash" || self.api_key.as_deref().is_some_and(is_real_credential)
    }
}

fn default_embedding_provider() -> String {
    "voyage".to_string()
}

fn default_cache_capacity() -> usize {
    10_000
}

/// Retry and rate-limit budget for generation calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    #[serde(default = "default_true")]
    pub jitter: bool,

    #[serde(default = "default_requests_per_window")]
    pub requests_per_window: u32,

    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,

    /// Deadline for one provider attempt; 0 disables it.
    #[serde(default = "default_attempt_timeout_seconds")]
    pub attempt_timeout_seconds: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: default_true(),
            requests_per_window: default_requests_per_window(),
            window_seconds: default_window_seconds(),
            attempt_timeout_seconds: default_attempt_timeout_seconds(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_requests_per_window() -> u32 {
    15
}

fn default_window_seconds() -> u64 {
    60
}

fn default_attempt_timeout_seconds() -> u64 {
    90
}
