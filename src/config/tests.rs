// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Unit tests for configuration module

#[cfg(test)]
mod test {
    use super::super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_router_settings_defaults() {
        let settings = RouterSettings::new("192.168.88.1");
        assert_eq!(settings.port, 8728);
        assert_eq!(settings.username, "admin");
        assert_eq!(settings.password, "");
        assert_eq!(settings.timeout, Duration::from_millis(10_000));
        assert_eq!(settings.keepalive_interval, Duration::from_secs(30));
        assert_eq!(settings.max_reconnect_attempts, 5);
        assert_eq!(settings.address(), "192.168.88.1:8728");
    }

    #[test]
    fn test_missing_host_is_config_error() {
        let result = Config::from_lookup(lookup_from(&[]));
        match result {
            Err(AppError::Config(msg)) => assert!(msg.contains("ROUTEROS_HOST")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_host_is_config_error() {
        let result = Config::from_lookup(lookup_from(&[("ROUTEROS_HOST", "  ")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_full_environment() {
        let config = Config::from_lookup(lookup_from(&[
            ("SERVER_ADDR", "127.0.0.1:8080"),
            ("ROUTEROS_HOST", "10.0.0.1"),
            ("ROUTEROS_PORT", "8729"),
            ("ROUTEROS_USERNAME", "monitor"),
            ("ROUTEROS_PASSWORD", "secret"),
            ("ROUTEROS_TIMEOUT_MS", "2500"),
            ("ROUTEROS_KEEPALIVE_SEC", "15"),
            ("ROUTEROS_MAX_RECONNECT_ATTEMPTS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.server_addr, "127.0.0.1:8080");
        assert_eq!(config.router.host, "10.0.0.1");
        assert_eq!(config.router.port, 8729);
        assert_eq!(config.router.username, "monitor");
        assert_eq!(config.router.password, "secret");
        assert_eq!(config.router.timeout, Duration::from_millis(2500));
        assert_eq!(config.router.keepalive_interval, Duration::from_secs(15));
        assert_eq!(config.router.max_reconnect_attempts, 3);
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&[("ROUTEROS_HOST", "10.0.0.1")])).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:3000");
        assert_eq!(config.router.port, 8728);
        assert_eq!(config.router.username, "admin");
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let result = Config::from_lookup(lookup_from(&[
            ("ROUTEROS_HOST", "10.0.0.1"),
            ("ROUTEROS_PORT", "not-a-port"),
        ]));
        match result {
            Err(AppError::Config(msg)) => assert!(msg.contains("ROUTEROS_PORT")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_keepalive_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("ROUTEROS_HOST", "10.0.0.1"),
            ("ROUTEROS_KEEPALIVE_SEC", "0"),
        ]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_empty_username() {
        let mut settings = RouterSettings::new("10.0.0.1");
        settings.username = String::new();
        assert!(settings.validate().is_err());
    }
}
