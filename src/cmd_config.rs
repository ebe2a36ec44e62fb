//! Configuration check command.

use anyhow::{bail, Result};

use pagepilot_config::{Config, ConfigValidator};

pub(crate) fn run_check_config(config: &Config) -> Result<()> {
    let result = ConfigValidator::validate(config);

    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    if !result.is_valid() {
        bail!("Configuration has {} error(s)", result.errors.len());
    }

    let chain = crate::setup::build_provider_chain(config);
    println!(
        "Configuration OK, providers in order: [{}]",
        chain.provider_ids().join(", ")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepilot_config::ConfigLoader;
    use std::path::Path;

    #[test]
    fn test_shipped_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
        let config = ConfigLoader::load(&path).unwrap();

        assert_eq!(config.planner.primary, "backboard");
        assert_eq!(config.providers.len(), 3);
        assert!(ConfigValidator::validate(&config).is_valid());
    }

    #[test]
    fn test_check_config_rejects_missing_providers() {
        assert!(run_check_config(&Config::default()).is_err());
    }
}
