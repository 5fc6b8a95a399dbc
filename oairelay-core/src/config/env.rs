//! `${NAME}` environment variable interpolation

use super::error::ConfigError;
use super::schema::ClientSettings;
use super::secrets::SecretString;
use regex::{Captures, Regex};
use std::env;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Names of all `${NAME}` references in `text`, in order of appearance
pub fn referenced_vars(text: &str) -> Vec<String> {
    ENV_VAR_PATTERN
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Replace every `${NAME}` in `content` with the variable's value
///
/// Fails on the first variable that is not set.
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    if let Some(var) = referenced_vars(content)
        .into_iter()
        .find(|var| env::var(var).is_err())
    {
        return Err(ConfigError::EnvVarNotFound { var });
    }

    let result = ENV_VAR_PATTERN.replace_all(content, |cap: &Captures<'_>| {
        env::var(&cap[1]).unwrap_or_default()
    });
    Ok(result.into_owned())
}

/// Interpolate the fields that commonly carry references after parsing
///
/// Values produced by the text pass never contain references, so this only
/// matters for settings built in code.
pub fn interpolate_settings_env_vars(settings: &mut ClientSettings) -> Result<(), ConfigError> {
    let api_key = settings.api_key.expose_secret();
    if ENV_VAR_PATTERN.is_match(api_key) {
        settings.api_key = SecretString::new(interpolate_env_vars(api_key)?);
    }

    if ENV_VAR_PATTERN.is_match(&settings.domain) {
        settings.domain = interpolate_env_vars(&settings.domain)?;
    }

    Ok(())
}
