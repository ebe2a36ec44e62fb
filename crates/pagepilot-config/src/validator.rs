//! Configuration validation.

use crate::schema::{Config, EMBEDDING_PROVIDERS, PROVIDER_KINDS};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_planner(config, &mut result);
        Self::validate_ranking(config, &mut result);
        Self::validate_embedding(config, &mut result);
        Self::validate_gate(config, &mut result);
        Self::validate_providers(config, &mut result);

        result
    }

    fn validate_planner(config: &Config, result: &mut ValidationResult) {
        let planner = &config.planner;

        if !config.providers.contains_key(&planner.primary) {
            let message = format!("Primary provider '{}' is not defined", planner.primary);
            if planner.use_primary {
                result.add_error(ValidationError::new("planner.primary", message));
            } else {
                result.add_warning(ValidationWarning::new("planner.primary", message));
            }
        }

        match &planner.fallback {
            Some(fallback) if !config.providers.contains_key(fallback) => {
                result.add_error(ValidationError::new(
                    "planner.fallback",
                    format!("Fallback provider '{}' is not defined", fallback),
                ));
            }
            Some(fallback) if *fallback == planner.primary && planner.use_primary => {
                result.add_warning(ValidationWarning::new(
                    "planner.fallback",
                    "Fallback is the same provider as primary",
                ));
            }
            None => {
                result.add_warning(ValidationWarning::new(
                    "planner.fallback",
                    "No fallback provider, a primary failure ends planning",
                ));
            }
            _ => {}
        }

        if planner.max_input_elements == 0 {
            result.add_error(ValidationError::new(
                "planner.max_input_elements",
                "max_input_elements must be greater than 0",
            ));
        }

        if planner.prompt_element_limit == 0 {
            result.add_error(ValidationError::new(
                "planner.prompt_element_limit",
                "prompt_element_limit must be greater than 0",
            ));
        }
    }

    fn validate_ranking(config: &Config, result: &mut ValidationResult) {
        let ranking = &config.ranking;

        if !ranking.enabled {
            result.add_warning(ValidationWarning::new(
                "ranking.enabled",
                "Ranking is disabled, elements are sent in page order",
            ));
        }

        if !ranking.similarity_threshold.is_finite() {
            result.add_error(ValidationError::new(
                "ranking.similarity_threshold",
                "similarity_threshold must be a finite number",
            ));
        }

        if ranking.per_category_cap == 0 {
            result.add_error(ValidationError::new(
                "ranking.per_category_cap",
                "per_category_cap must be greater than 0",
            ));
        }

        if ranking.min_per_category > ranking.per_category_cap {
            result.add_error(ValidationError::new(
                "ranking.min_per_category",
                format!(
                    "min_per_category ({}) exceeds per_category_cap ({})",
                    ranking.min_per_category, ranking.per_category_cap
                ),
            ));
        }

        if ranking.max_text_chars == 0 {
            result.add_error(ValidationError::new(
                "ranking.max_text_chars",
                "max_text_chars must be greater than 0",
            ));
        }
    }

    fn validate_embedding(config: &Config, result: &mut ValidationResult) {
        let embedding = &config.embedding;

        if !EMBEDDING_PROVIDERS.contains(&embedding.provider.as_str()) {
            result.add_error(ValidationError::new(
                "embedding.provider",
                format!(
                    "Unknown embedding provider '{}', valid values: {:?}",
                    embedding.provider, EMBEDDING_PROVIDERS
                ),
            ));
        } else if config.ranking.enabled && !embedding.is_configured() {
            result.add_warning(ValidationWarning::new(
                "embedding.api_key",
                "Embedding API key is not set, ranking will use the hash embedding",
            ));
        }

        if embedding.dimension == Some(0) {
            result.add_error(ValidationError::new(
                "embedding.dimension",
                "dimension must be greater than 0",
            ));
        }

        if let Some(url) = embedding.base_url.as_deref().filter(|u| !u.is_empty()) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                result.add_error(ValidationError::new(
                    "embedding.base_url",
                    "base_url must start with http:// or https://",
                ));
            }
        }
    }

    fn validate_gate(config: &Config, result: &mut ValidationResult) {
        let gate = &config.gate;

        if gate.requests_per_window == 0 {
            result.add_error(ValidationError::new(
                "gate.requests_per_window",
                "requests_per_window must be greater than 0",
            ));
        }

        if gate.window_seconds == 0 {
            result.add_error(ValidationError::new(
                "gate.window_seconds",
                "window_seconds must be greater than 0",
            ));
        }

        if gate.backoff_multiplier.is_nan() || gate.backoff_multiplier < 1.0 {
            result.add_error(ValidationError::new(
                "gate.backoff_multiplier",
                "backoff_multiplier must be at least 1.0",
            ));
        }

        if gate.base_delay_ms > gate.max_delay_ms {
            result.add_warning(ValidationWarning::new(
                "gate.base_delay_ms",
                "base_delay_ms exceeds max_delay_ms, every retry waits max_delay_ms",
            ));
        }

        if gate.attempt_timeout_seconds == 0 {
            result.add_warning(ValidationWarning::new(
                "gate.attempt_timeout_seconds",
                "No attempt deadline, a stalled provider blocks the fallback until its HTTP timeout",
            ));
        }

        if gate.max_retries > 10 {
            result.add_warning(ValidationWarning::new(
                "gate.max_retries",
                "max_retries is very high (>10), planning may stall for minutes",
            ));
        }
    }

    fn validate_providers(config: &Config, result: &mut ValidationResult) {
        for (name, provider) in &config.providers {
            if !PROVIDER_KINDS.contains(&provider.kind.as_str()) {
                result.add_error(ValidationError::new(
                    format!("providers.{}.kind", name),
                    format!(
                        "Unknown provider kind '{}', valid values: {:?}",
                        provider.kind, PROVIDER_KINDS
                    ),
                ));
            }

            if !provider.is_configured() {
                result.add_warning(ValidationWarning::new(
                    format!("providers.{}.api_key", name),
                    "API key is not set, provider will be skipped",
                ));
            }

            if let Some(url) = provider.base_url.as_deref().filter(|u| !u.is_empty()) {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    result.add_error(ValidationError::new(
                        format!("providers.{}.base_url", name),
                        "base_url must start with http:// or https://",
                    ));
                }
            }

            if provider.timeout_seconds == Some(0) {
                result.add_error(ValidationError::new(
                    format!("providers.{}.timeout_seconds", name),
                    "timeout_seconds must be greater than 0",
                ));
            }

            if let Some(temperature) = provider.temperature {
                if !(0.0..=2.0).contains(&temperature) {
                    result.add_error(ValidationError::new(
                        format!("providers.{}.temperature", name),
                        "temperature must be between 0.0 and 2.0",
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
