//! Configuration Integration Tests
//!
//! YAML files on disk, defaults for missing sections, environment variable
//! expansion and validation failures.

#[cfg(test)]
mod tests {
    use dataset_uploadr::config::{Config, ConfigError, ConfigLoader};
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
api:
  base_url: "https://datasets.example.com/api/v1"
  timeout_seconds: 30

upload:
  accepted_mime_types: ["image/png"]
  max_file_bytes: 1048576
  max_file_count: 4

metrics:
  enabled: true

logging:
  level: "debug"
  format: "pretty"
"#,
        );

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.api.base_url, "https://datasets.example.com/api/v1");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.upload.accepted_mime_types, vec!["image/png"]);
        assert_eq!(config.upload.max_file_bytes, 1_048_576);
        assert_eq!(config.upload.max_file_count, 4);
        assert!(config.metrics.enabled);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = ConfigLoader::from_yaml("upload:\n  max_file_count: 2\n").unwrap();

        assert_eq!(config.upload.max_file_count, 2);
        assert_eq!(config.upload.max_file_bytes, 50 * 1024 * 1024);
        assert_eq!(config.api, Config::default().api);
        assert_eq!(config.logging, Config::default().logging);
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = ConfigLoader::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_env_var_expansion() {
        std::env::set_var("UPLOADR_API_URL", "http://backend:8000/api/v1");
        std::env::remove_var("UPLOADR_MAX_FILES");

        let config = ConfigLoader::from_yaml(
            r#"
api:
  base_url: "${UPLOADR_API_URL}"
upload:
  max_file_count: ${UPLOADR_MAX_FILES:-7}
"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://backend:8000/api/v1");
        assert_eq!(config.upload.max_file_count, 7);

        std::env::remove_var("UPLOADR_API_URL");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = ConfigLoader::from_yaml("api:\n  base_url: \"localhost:8000\"\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_empty_mime_list_rejected() {
        let result = ConfigLoader::from_yaml("upload:\n  accepted_mime_types: []\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let result = ConfigLoader::from_yaml("api: [unclosed");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = Config::load("/nonexistent/dataset-uploadr.yaml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
