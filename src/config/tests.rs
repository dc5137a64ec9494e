use super::*;

#[test]
fn vault_config_debug_never_prints_secret_values() {
    let mut entries = indexmap::IndexMap::new();
    entries.insert("API_KEY".to_string(), "sk-super-secret".to_string());
    let config = VaultConfig { entries };
    let debug = format!("{config:?}");
    assert!(!debug.contains("sk-super-secret"));
    assert!(debug.contains("1 placeholder"));
}

#[test]
fn firewall_config_debug_does_not_leak_vault_entries() {
    let mut entries = indexmap::IndexMap::new();
    entries.insert("TOKEN".to_string(), "leaked-if-printed".to_string());
    let config = FirewallConfig {
        vault: VaultConfig { entries },
        ..Default::default()
    };
    let debug = format!("{config:?}");
    assert!(!debug.contains("leaked-if-printed"));
}

#[test]
fn sanitization_config_default_enables_default_patterns() {
    let config = SanitizationConfig::default();
    assert!(config.enabled);
    assert!(config.use_default_patterns);
    assert_eq!(config.replacement, "[REDACTED]");
}

#[test]
fn circuit_breaker_config_default_is_disabled_warn() {
    let config = CircuitBreakerConfig::default();
    assert!(!config.enabled);
    assert_eq!(config.action, BreakerAction::Warn);
}

#[test]
fn firewall_config_deserializes_from_camel_case_json() {
    let json = serde_json::json!({
        "vault": {"entries": {"API_KEY": "value"}},
        "sanitization": {"enabled": true, "useDefaultPatterns": false, "extraPatterns": [], "replacement": "[X]"},
        "rules": {"defaults": null, "tools": {}, "circuitBreaker": null},
        "systemPromptHint": false,
        "logBlocked": true,
        "opaqueVaultNames": true
    });
    let config: FirewallConfig = serde_json::from_value(json).expect("deserializes");
    assert!(!config.system_prompt_hint);
    assert!(config.opaque_vault_names);
    assert_eq!(config.sanitization.replacement, "[X]");
}
