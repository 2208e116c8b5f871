// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for configuration resolution and persistence.

#[cfg(test)]
mod tests {
    use crate::config::{normalize_resolver_url, AppConfig};
    use crate::constants::CLOUDFLARE_API_BASE_URL;
    use crate::errors::ConfigError;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn complete_resolver() -> AppConfig {
        let mut config = AppConfig::default();
        config.unbound.api_key = "key".into();
        config.unbound.api_secret = "secret".into();
        config.unbound.base_url = "https://opnsense.lan".into();
        config
    }

    // ============================================================================
    // Environment resolution
    // ============================================================================

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = complete_resolver();
        config.apply_env(env_from(&[
            ("UNBOUND_SYNC_API_KEY", "env-key"),
            ("UNBOUND_SYNC_INSECURE", "true"),
        ]));
        assert_eq!(config.unbound.api_key, "env-key");
        assert_eq!(config.unbound.api_secret, "secret");
        assert!(config.unbound.insecure);
    }

    #[test]
    fn test_blank_env_value_does_not_clear_file_value() {
        let mut config = complete_resolver();
        config.apply_env(env_from(&[("UNBOUND_SYNC_API_KEY", "  ")]));
        assert_eq!(config.unbound.api_key, "key");
    }

    #[test]
    fn test_adguard_env_enables_engine() {
        let mut config = complete_resolver();
        config.apply_env(env_from(&[
            ("ADGUARD_ENABLED", "1"),
            ("ADGUARD_BASE_URL", "adguard.lan:3000"),
        ]));
        let adguard = config.adguard().unwrap().unwrap();
        assert_eq!(adguard.base_url, "http://adguard.lan:3000");
    }

    #[test]
    fn test_adguard_credentials_fall_back_to_resolver() {
        let mut config = complete_resolver();
        config.adguard.enabled = true;
        config.adguard.base_url = "http://adguard.lan".into();
        let adguard = config.adguard().unwrap().unwrap();
        assert_eq!(adguard.username, "key");
        assert_eq!(adguard.password, "secret");
    }

    #[test]
    fn test_adguard_disabled_returns_none() {
        let config = complete_resolver();
        assert!(config.adguard().unwrap().is_none());
    }

    #[test]
    fn test_adguard_enabled_without_url_is_error() {
        let mut config = complete_resolver();
        config.adguard.enabled = true;
        let err = config.adguard().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                field: "base_url",
                ..
            }
        ));
    }

    // ============================================================================
    // Resolver validation
    // ============================================================================

    #[test]
    fn test_unbound_missing_secret_is_error() {
        let mut config = complete_resolver();
        config.unbound.api_secret.clear();
        let err = config.unbound().unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingField {
                section: "unbound",
                field: "api_secret",
                env: "UNBOUND_SYNC_API_SECRET",
            }
        );
    }

    #[test]
    fn test_unbound_http_url_upgraded_to_https() {
        let mut config = complete_resolver();
        config.unbound.base_url = "http://opnsense.lan/".into();
        assert_eq!(config.unbound().unwrap().base_url, "https://opnsense.lan");
    }

    #[test]
    fn test_normalize_resolver_url_adds_scheme() {
        assert_eq!(
            normalize_resolver_url("192.168.1.1").unwrap(),
            "https://192.168.1.1"
        );
        assert_eq!(
            normalize_resolver_url("https://fw.lan:8443").unwrap(),
            "https://fw.lan:8443"
        );
    }

    #[test]
    fn test_normalize_resolver_url_rejects_garbage() {
        assert!(matches!(
            normalize_resolver_url("https://exa mple.com"),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    // ============================================================================
    // Cloudflare validation
    // ============================================================================

    #[test]
    fn test_cloudflare_defaults_base_url() {
        let mut config = AppConfig::default();
        config.cloudflare.api_token = "token".into();
        config.cloudflare.account_id = "acct".into();
        let cf = config.cloudflare().unwrap();
        assert_eq!(cf.base_url, CLOUDFLARE_API_BASE_URL);
    }

    #[test]
    fn test_cloudflare_requires_token() {
        let config = AppConfig::default();
        assert!(matches!(
            config.cloudflare(),
            Err(ConfigError::MissingField {
                field: "api_token",
                ..
            })
        ));
    }

    // ============================================================================
    // File persistence
    // ============================================================================

    #[test]
    fn test_save_and_load_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = complete_resolver();
        config.adguard.enabled = true;
        config.adguard.base_url = "http://adguard.lan".into();

        config.save(&path).unwrap();
        let loaded = AppConfig::from_file(&path).unwrap().unwrap();
        assert_eq!(loaded, config);

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["api_key"], "key", "resolver settings live at the top level");
        assert_eq!(value["adguard"]["enabled"], true);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        complete_resolver().save(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "api_key: k\napi_secret: s\nbase_url: fw.lan\nadguard:\n  enabled: true\n  base_url: http://ag.lan\n",
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap().unwrap();
        assert_eq!(config.unbound.api_key, "k");
        assert!(config.adguard.enabled);
        assert_eq!(config.unbound().unwrap().base_url, "https://fw.lan");
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert!(AppConfig::from_file(&path).unwrap().is_none());
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse JSON config"));
    }
}
