//! Builds the planning pipeline from configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::{info, warn};

use pagepilot_config::{is_real_credential, Config, EmbeddingConfig, GateConfig, ProviderConfig};
use pagepilot_embedding::{
    BatchEmbedder, EmbeddingCache, HashEmbedding, HttpEmbedding, HttpEmbeddingConfig,
};
use pagepilot_planner::{
    CallGate, Planner, PlannerOptions, ProviderChain, RankerConfig, RateLimitConfig, RateLimiter,
    RelevanceRanker, RetryConfig,
};
use pagepilot_protocols::{EmbeddingProvider, GenerationProvider};
use pagepilot_provider_anthropic::AnthropicProvider;
use pagepilot_provider_openai::OpenAIProvider;

pub(crate) fn build_planner(config: &Config) -> Result<Planner> {
    let embedder = Arc::new(build_embedder(&config.embedding)?);
    let ranker = RelevanceRanker::new(embedder, ranker_config(config));

    let providers = build_provider_chain(config);
    if providers.is_empty() {
        warn!("No generation provider is configured, planning will fail");
    }

    let options = PlannerOptions {
        max_input_elements: config.planner.max_input_elements,
        prompt_element_limit: config.planner.prompt_element_limit,
    };

    Ok(Planner::new(
        ranker,
        providers,
        Arc::new(build_gate(&config.gate)),
        options,
    ))
}

fn ranker_config(config: &Config) -> RankerConfig {
    let ranking = &config.ranking;
    RankerConfig {
        enabled: ranking.enabled,
        similarity_threshold: ranking.similarity_threshold,
        per_category_cap: ranking.per_category_cap,
        min_per_category: ranking.min_per_category,
        max_text_chars: ranking.max_text_chars,
    }
}

pub(crate) fn build_embedder(config: &EmbeddingConfig) -> Result<BatchEmbedder> {
    let provider = build_embedding_provider(config)?;
    info!(
        "Embedding with {} ({} dims, cache capacity {})",
        config.provider,
        provider.dimension(),
        config.cache_capacity
    );
    Ok(BatchEmbedder::new(
        provider,
        Arc::new(EmbeddingCache::new(config.cache_capacity)),
    ))
}

fn build_embedding_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let hash = || -> Arc<dyn EmbeddingProvider> {
        Arc::new(config.dimension.map(HashEmbedding::new).unwrap_or_default())
    };

    if config.provider == "hash" {
        return Ok(hash());
    }
    if config.provider != "voyage" && config.provider != "openai" {
        bail!("Unknown embedding provider '{}'", config.provider);
    }

    let Some(api_key) = config.api_key.as_deref().filter(|k| is_real_credential(k)) else {
        warn!(
            "No {} embedding key configured, using hash embedding",
            config.provider
        );
        return Ok(hash());
    };

    let mut http = if config.provider == "voyage" {
        HttpEmbeddingConfig::voyage(api_key)
    } else {
        HttpEmbeddingConfig::openai(api_key)
    };
    if let Some(model) = &config.model {
        http = http.with_model(model.clone());
    }
    if let Some(base_url) = config.base_url.as_deref().filter(|u| !u.is_empty()) {
        http = http.with_base_url(base_url);
    }
    if let Some(dimension) = config.dimension {
        http = http.with_dimension(dimension);
    }

    Ok(Arc::new(HttpEmbedding::new(http)))
}

/// Primary then fallback, skipping anything without a usable key.
pub(crate) fn build_provider_chain(config: &Config) -> ProviderChain {
    let planner = &config.planner;

    let primary = if planner.use_primary {
        lookup_provider(config, &planner.primary)
    } else {
        info!("Primary provider '{}' disabled", planner.primary);
        None
    };

    let fallback = planner
        .fallback
        .as_deref()
        .filter(|name| !(planner.use_primary && *name == planner.primary))
        .and_then(|name| lookup_provider(config, name));

    ProviderChain::new(primary, fallback)
}

fn lookup_provider(config: &Config, name: &str) -> Option<Arc<dyn GenerationProvider>> {
    let Some(provider_config) = config.providers.get(name) else {
        warn!("Provider '{}' is not defined in [providers]", name);
        return None;
    };
    build_provider(name, provider_config)
}

pub(crate) fn build_provider(
    name: &str,
    config: &ProviderConfig,
) -> Option<Arc<dyn GenerationProvider>> {
    let Some(api_key) = config.api_key.clone().filter(|k| is_real_credential(k)) else {
        info!("Skipping provider '{}': no API key configured", name);
        return None;
    };
    let base_url = config.base_url.clone().filter(|u| !u.is_empty());

    let provider: Arc<dyn GenerationProvider> = match config.kind.as_str() {
        "openai" => {
            let mut provider = match base_url {
                Some(url) => OpenAIProvider::with_url(api_key, url),
                None => OpenAIProvider::new(api_key),
            }
            .with_id(name);
            if let Some(model) = &config.model {
                provider = provider.with_model(model.clone());
            }
            if let Some(temperature) = config.temperature {
                provider = provider.with_temperature(temperature);
            }
            if let Some(max_tokens) = config.max_tokens {
                provider = provider.with_max_tokens(max_tokens);
            }
            if let Some(seconds) = config.timeout_seconds {
                provider = provider.with_timeout(Duration::from_secs(seconds));
            }
            Arc::new(provider)
        }
        "anthropic" => {
            let mut provider = AnthropicProvider::new(api_key).with_id(name);
            if let Some(url) = base_url {
                provider = provider.with_url(url);
            }
            if let Some(model) = &config.model {
                provider = provider.with_model(model.clone());
            }
            if let Some(temperature) = config.temperature {
                provider = provider.with_temperature(temperature);
            }
            if let Some(max_tokens) = config.max_tokens {
                provider = provider.with_max_tokens(max_tokens);
            }
            if let Some(seconds) = config.timeout_seconds {
                provider = provider.with_timeout(Duration::from_secs(seconds));
            }
            Arc::new(provider)
        }
        other => {
            warn!("Unknown provider type: '{}', skipping '{}'", other, name);
            return None;
        }
    };

    info!(
        "Registered {} provider '{}' ({})",
        config.kind,
        name,
        provider.model()
    );
    Some(provider)
}

pub(crate) fn build_gate(config: &GateConfig) -> CallGate {
    let limiter = RateLimiter::new(RateLimitConfig {
        max_requests: config.requests_per_window,
        window: Duration::from_secs(config.window_seconds),
    });
    let retry = RetryConfig {
        max_retries: config.max_retries,
        base_delay: Duration::from_millis(config.base_delay_ms),
        max_delay: Duration::from_millis(config.max_delay_ms),
        backoff_multiplier: config.backoff_multiplier,
        jitter: config.jitter,
        attempt_timeout: (config.attempt_timeout_seconds > 0)
            .then(|| Duration::from_secs(config.attempt_timeout_seconds)),
    };
    CallGate::new(Arc::new(limiter), retry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepilot_config::ConfigLoader;

    fn config(toml: &str) -> Config {
        ConfigLoader::load_str(toml).unwrap()
    }

    #[test]
    fn test_chain_skips_placeholder_primary() {
        let config = config(
            r#"
[planner]
primary = "backboard"
fallback = "openai"

[providers.backboard]
api_key = "your_backboard_api_key_here"

[providers.openai]
api_key = "sk-test"
"#,
        );
        assert_eq!(build_provider_chain(&config).provider_ids(), vec!["openai"]);
    }

    #[test]
    fn test_chain_order_and_ids() {
        let config = config(
            r#"
[planner]
primary = "claude"
fallback = "openai"

[providers.claude]
kind = "anthropic"
api_key = "sk-ant"
model = "claude-3-5-sonnet-latest"

[providers.openai]
api_key = "sk-test"
"#,
        );
        assert_eq!(
            build_provider_chain(&config).provider_ids(),
            vec!["claude", "openai"]
        );
    }

    #[test]
    fn test_chain_use_primary_flag() {
        let config = config(
            r#"
[planner]
primary = "backboard"
fallback = "openai"
use_primary = false

[providers.backboard]
api_key = "bb-key"

[providers.openai]
api_key = "sk-test"
"#,
        );
        assert_eq!(build_provider_chain(&config).provider_ids(), vec!["openai"]);
    }

    #[test]
    fn test_chain_same_primary_and_fallback() {
        let config = config(
            r#"
[planner]
primary = "openai"
fallback = "openai"

[providers.openai]
api_key = "sk-test"
"#,
        );
        assert_eq!(build_provider_chain(&config).provider_ids(), vec!["openai"]);
    }

    #[test]
    fn test_unknown_kind_skipped() {
        let provider = ProviderConfig {
            kind: "gemini".to_string(),
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        assert!(build_provider("gemini", &provider).is_none());
    }

    #[test]
    fn test_embedding_falls_back_to_hash_without_key() {
        let embedding = EmbeddingConfig {
            dimension: Some(64),
            ..Default::default()
        };
        let embedder = build_embedder(&embedding).unwrap();
        assert_eq!(embedder.dimension(), 64);
    }

    #[test]
    fn test_voyage_embedding_dimension() {
        let embedding = EmbeddingConfig {
            api_key: Some("pa-test".to_string()),
            ..Default::default()
        };
        assert_eq!(build_embedder(&embedding).unwrap().dimension(), 1024);
    }

    #[test]
    fn test_unknown_embedding_provider() {
        let embedding = EmbeddingConfig {
            provider: "bert".to_string(),
            ..Default::default()
        };
        assert!(build_embedder(&embedding).is_err());
    }

    #[test]
    fn test_gate_from_config() {
        let gate = build_gate(&GateConfig::default());
        assert_eq!(gate.retry_config().max_retries, 3);
        assert_eq!(gate.retry_config().base_delay, Duration::from_millis(500));
        assert_eq!(gate.limiter().status().limit, 15);
        assert_eq!(
            gate.retry_config().attempt_timeout,
            Some(Duration::from_secs(90))
        );
    }

    #[test]
    fn test_gate_deadline_disabled() {
        let config = GateConfig {
            attempt_timeout_seconds: 0,
            ..Default::default()
        };
        assert!(build_gate(&config).retry_config().attempt_timeout.is_none());
    }
}
