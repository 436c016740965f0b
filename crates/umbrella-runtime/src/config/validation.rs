//! Configuration validation utilities.

use url::Url;

use super::error::{ConfigError, ConfigResult};
use super::schema::{
    AuthConfig, ForwardConfig, LoggingConfig, RegistryConfig, ServerConfig, UmbrellaConfig,
};

/// Validates the entire configuration.
pub fn validate_config(config: &UmbrellaConfig) -> ConfigResult<()> {
    validate_server_config(&config.server)?;
    validate_forward_config(&config.forward)?;
    validate_registry_config(&config.registry)?;
    validate_auth_config(&config.auth)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_server_config(server: &ServerConfig) -> ConfigResult<()> {
    if server.host.is_empty() {
        return Err(ConfigError::missing_field("server.host"));
    }
    validate_port(server.port)?;
    validate_path(&server.path)?;
    Ok(())
}

fn validate_forward_config(forward: &ForwardConfig) -> ConfigResult<()> {
    let root = forward
        .request_url_root
        .as_deref()
        .filter(|root| !root.is_empty())
        .ok_or_else(|| ConfigError::missing_field("forward.request_url_root"))?;
    validate_url(root)?;

    if forward.timeout_ms == 0 {
        return Err(ConfigError::validation("Forward timeout must be greater than 0"));
    }
    Ok(())
}

fn validate_registry_config(registry: &RegistryConfig) -> ConfigResult<()> {
    if let Some(url) = registry.url.as_deref().filter(|url| !url.is_empty()) {
        validate_url(url)?;
    }
    if registry.fetch_timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Registry fetch timeout must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_auth_config(auth: &AuthConfig) -> ConfigResult<()> {
    if !auth.enabled {
        return Ok(());
    }
    if auth.signing_secret.as_deref().is_none_or(str::is_empty) {
        return Err(ConfigError::missing_field("auth.signing_secret"));
    }
    if auth.max_skew_secs == 0 {
        return Err(ConfigError::validation(
            "Maximum timestamp skew must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    for module in logging.filters.keys() {
        if module.is_empty() || module.contains(['=', ',', ' ']) {
            return Err(ConfigError::validation(format!(
                "Invalid log filter module: {module:?}"
            )));
        }
    }
    Ok(())
}

/// Validates an http(s) URL.
fn validate_url(url: &str) -> ConfigResult<()> {
    let valid_schemes = ["http", "https"];

    let parsed = Url::parse(url).map_err(|e| ConfigError::invalid_url(url, e.to_string()))?;
    if !valid_schemes.contains(&parsed.scheme()) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL scheme must be one of: {valid_schemes:?}"),
        ));
    }
    if parsed.cannot_be_a_base() {
        return Err(ConfigError::invalid_url(url, "URL cannot have a path"));
    }

    Ok(())
}

/// Validates a port number.
fn validate_port(port: u16) -> ConfigResult<()> {
    if port == 0 {
        return Err(ConfigError::InvalidPort(port));
    }
    Ok(())
}

/// Validates a path.
fn validate_path(path: &str) -> ConfigResult<()> {
    if !path.starts_with('/') {
        return Err(ConfigError::validation("Path must start with '/'"));
    }
    Ok(())
}
