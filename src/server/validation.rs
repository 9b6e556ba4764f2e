//! Production configuration validation

use super::config::AppConfig;
use tracing::warn;

/// Warn about settings that are risky in production. Never fails startup.
pub fn validate_production_config(config: &AppConfig, environment: &str) {
    if !environment.eq_ignore_ascii_case("production") {
        return;
    }

    for warning in production_warnings(config) {
        warn!("CONFIG WARNING: {}", warning);
    }
}

fn production_warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.server.host == "0.0.0.0" {
        warnings.push(
            "Server is binding to all interfaces (0.0.0.0) in production. \
             Consider binding to 127.0.0.1 behind a reverse proxy."
                .to_string(),
        );
    }

    if !config.has_agents() {
        warnings.push(
            "No agents are configured ([builtin] echo = false and no [[peers]]). \
             Every task request will fail with 404."
                .to_string(),
        );
    }

    if config.registry.health_check_interval_secs < config.registry.probe_timeout_secs {
        warnings.push(format!(
            "Health check interval ({}s) is shorter than the probe timeout ({}s); \
             a slow agent will delay every cycle.",
            config.registry.health_check_interval_secs, config.registry.probe_timeout_secs
        ));
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_warn_only_about_bind_address() {
        let warnings = production_warnings(&AppConfig::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("0.0.0.0"));
    }

    #[test]
    fn test_no_agents_and_short_interval() {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".into();
        config.builtin.echo = false;
        config.registry.health_check_interval_secs = 5;
        config.registry.probe_timeout_secs = 10;

        let warnings = production_warnings(&config);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("No agents")));
        assert!(warnings.iter().any(|w| w.contains("probe timeout")));
    }
}
