//! Configuration loader with environment variable expansion

use super::{Config, ConfigError};
use lazy_static::lazy_static;
use std::path::Path;

lazy_static! {
    // ${VAR} or ${VAR:-default}
    static ref ENV_VAR: regex_lite::Regex =
        regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
            .expect("valid env var pattern");
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Expand `${VAR}` and `${VAR:-default}`.
    ///
    /// Unset variables without a default keep their placeholder.
    fn expand_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex_lite::Captures<'_>| {
                match std::env::var(&caps[1]) {
                    Ok(value) => value,
                    Err(_) => match caps.get(2) {
                        Some(default) => default.as_str().to_string(),
                        None => caps[0].to_string(),
                    },
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_expand_env_vars() {
        std::env::set_var("UPLOADR_TEST_VAR", "test_value");
        let expanded = ConfigLoader::expand_env_vars("key: ${UPLOADR_TEST_VAR}");
        assert_eq!(expanded, "key: test_value");
        std::env::remove_var("UPLOADR_TEST_VAR");
    }

    #[test]
    #[serial_test::serial]
    fn test_expand_env_vars_default_and_missing() {
        std::env::remove_var("UPLOADR_MISSING");
        assert_eq!(
            ConfigLoader::expand_env_vars("url: ${UPLOADR_MISSING:-http://localhost:8000}"),
            "url: http://localhost:8000"
        );
        assert_eq!(
            ConfigLoader::expand_env_vars("url: ${UPLOADR_MISSING}"),
            "url: ${UPLOADR_MISSING}"
        );
    }
}
