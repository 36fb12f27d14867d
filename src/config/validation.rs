use std::collections::HashSet;

use super::{ConfigError, ShimConfig};

const VALID_LOG_LEVELS: [&str; 6] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL", "DISABLED"];
const VALID_REASONING_EFFORTS: [&str; 3] = ["low", "medium", "high"];

/// Validate the full shim config, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any configuration invariant is violated.
pub fn validate_config(config: &ShimConfig) -> Result<(), ConfigError> {
    validate_server_config(config)?;
    validate_dashscope_config(config)?;
    validate_apps(config)?;
    validate_features(config)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_server_config(config: &ShimConfig) -> Result<(), ConfigError> {
    let server = &config.server;
    if server.timeout == 0 {
        return Err(validation_err("server.timeout must be greater than 0"));
    }
    if server.http_pool_max_idle_per_host == 0 {
        return Err(validation_err(
            "server.http_pool_max_idle_per_host must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_dashscope_config(config: &ShimConfig) -> Result<(), ConfigError> {
    let dashscope = &config.dashscope;
    validate_http_url("dashscope.base_url", Some(dashscope.base_url.as_str()))?;
    validate_http_url("dashscope.proxy", dashscope.proxy.as_deref())?;
    if dashscope.reasoning_delta_max == 0 {
        return Err(validation_err(
            "dashscope.reasoning_delta_max must be greater than 0",
        ));
    }
    if let Some(api_key) = dashscope.api_key.as_deref() {
        if api_key.trim().is_empty() {
            return Err(validation_err("dashscope.api_key cannot be empty when set"));
        }
    }
    Ok(())
}

fn validate_http_url(field_name: &str, value: Option<&str>) -> Result<(), ConfigError> {
    let Some(value) = value.map(str::trim) else {
        return Ok(());
    };
    if value.is_empty() {
        return Err(validation_err(format!("{field_name} cannot be empty when set")));
    }
    let parsed = url::Url::parse(value)
        .map_err(|err| validation_err(format!("{field_name} is not a valid URL: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(validation_err(format!(
            "{field_name} must use http:// or https://"
        )));
    }
    Ok(())
}

fn validate_apps(config: &ShimConfig) -> Result<(), ConfigError> {
    if config.apps.is_empty() {
        return Err(validation_err("apps cannot be empty"));
    }

    let mut seen = HashSet::with_capacity(config.apps.len());
    for app in &config.apps {
        if app.model.trim().is_empty() {
            return Err(validation_err("apps: model name cannot be empty"));
        }
        if app.app_id.trim().is_empty() {
            return Err(validation_err(format!(
                "App '{}': app_id cannot be empty",
                app.model
            )));
        }
        if !seen.insert(app.model.as_str()) {
            return Err(validation_err(format!(
                "Duplicate model '{}' in apps",
                app.model
            )));
        }
    }
    Ok(())
}

fn validate_features(config: &ShimConfig) -> Result<(), ConfigError> {
    let features = &config.features;
    if !VALID_LOG_LEVELS.contains(&features.log_level.to_uppercase().as_str()) {
        return Err(validation_err(format!(
            "log_level must be one of {VALID_LOG_LEVELS:?}"
        )));
    }
    if let Some(effort) = features.default_reasoning_effort.as_deref() {
        if !VALID_REASONING_EFFORTS.contains(&effort.to_ascii_lowercase().as_str()) {
            return Err(validation_err(format!(
                "default_reasoning_effort must be one of {VALID_REASONING_EFFORTS:?}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;

    fn make_valid_config() -> ShimConfig {
        ShimConfig::with_apps(vec![AppConfig {
            model: "qwen-app".to_string(),
            app_id: "app-123".to_string(),
            enable_thinking: Some(true),
            has_thoughts: None,
            description: Some("demo".to_string()),
        }])
    }

    #[test]
    fn test_valid_config() {
        let config = make_valid_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_apps() {
        let mut config = make_valid_config();
        config.apps.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_blank_app_id() {
        let mut config = make_valid_config();
        config.apps[0].app_id = "  ".to_string();
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("app_id"));
    }

    #[test]
    fn test_duplicate_model() {
        let mut config = make_valid_config();
        config.apps.push(AppConfig::new("qwen-app", "app-456"));
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("Duplicate model 'qwen-app'"));
    }

    #[test]
    fn test_base_url_must_be_http() {
        let mut config = make_valid_config();
        config.dashscope.base_url = "ftp://example.com".to_string();
        assert!(validate_config(&config).is_err());
        config.dashscope.base_url = "not a url".to_string();
        assert!(validate_config(&config).is_err());
        config.dashscope.base_url = "http://127.0.0.1:8080/api/v1".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_proxy_url_validated_when_set() {
        let mut config = make_valid_config();
        config.dashscope.proxy = Some("socks5://127.0.0.1:1080".to_string());
        assert!(validate_config(&config).is_err());
        config.dashscope.proxy = Some("http://127.0.0.1:3128".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = make_valid_config();
        config.dashscope.reasoning_delta_max = 0;
        assert!(validate_config(&config).is_err());

        let mut config = make_valid_config();
        config.server.timeout = 0;
        assert!(validate_config(&config).is_err());

        let mut config = make_valid_config();
        config.server.http_pool_max_idle_per_host = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_log_level_case_insensitive() {
        let mut config = make_valid_config();
        config.features.log_level = "warning".to_string();
        assert!(validate_config(&config).is_ok());
        config.features.log_level = "TRACE".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_default_reasoning_effort() {
        let mut config = make_valid_config();
        config.features.default_reasoning_effort = Some("HIGH".to_string());
        assert!(validate_config(&config).is_ok());
        config.features.default_reasoning_effort = None;
        assert!(validate_config(&config).is_ok());
        config.features.default_reasoning_effort = Some("extreme".to_string());
        assert!(validate_config(&config).is_err());
    }
}
