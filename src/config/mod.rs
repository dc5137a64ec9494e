use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Generates a `Debug` impl that redacts secret fields, matching the
/// teacher's `config/schema/mod.rs` macro exactly.
macro_rules! redact_debug {
    (@field $builder:ident, $self:ident, redact($field:ident)) => {
        $builder.field(
            stringify!($field),
            &if $self.$field.is_empty() {
                "[empty]"
            } else {
                "[REDACTED]"
            },
        );
    };
    (@field $builder:ident, $self:ident, $field:ident) => {
        $builder.field(stringify!($field), &$self.$field);
    };
    (@fields $builder:ident, $self:ident,) => {};
    (@fields $builder:ident, $self:ident, redact($field:ident), $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, redact($field));
        redact_debug!(@fields $builder, $self, $($rest)*);
    };
    (@fields $builder:ident, $self:ident, $field:ident, $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, $field);
        redact_debug!(@fields $builder, $self, $($rest)*);
    };
    ($struct_name:ident, $($fields:tt)*) => {
        impl std::fmt::Debug for $struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut builder = f.debug_struct(stringify!($struct_name));
                redact_debug!(@fields builder, self, $($fields)*);
                builder.finish()
            }
        }
    };
}

fn default_true() -> bool {
    true
}

fn default_replacement() -> String {
    "[REDACTED]".to_string()
}

/// Placeholder table, fixed at session construction. `Debug` never prints
/// secret values, only the placeholder count.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct VaultConfig {
    #[serde(default)]
    pub entries: indexmap::IndexMap<String, String>,
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("entries", &format!("[{} placeholder(s)]", self.entries.len()))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true", rename = "useDefaultPatterns")]
    pub use_default_patterns: bool,
    #[serde(default, rename = "extraPatterns")]
    pub extra_patterns: Vec<String>,
    #[serde(default = "default_replacement")]
    pub replacement: String,
}

impl Default for SanitizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_default_patterns: true,
            extra_patterns: Vec::new(),
            replacement: default_replacement(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParamRuleConfig {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolRuleSetConfig {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
    #[serde(default, rename = "paramRules")]
    pub param_rules: HashMap<String, ParamRuleConfig>,
    #[serde(default, rename = "blockMessage")]
    pub block_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakerAction {
    Suspend,
    Warn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_blocked", rename = "maxBlocked")]
    pub max_blocked: u32,
    #[serde(default = "default_window_ms", rename = "windowMs")]
    pub window_ms: u64,
    #[serde(default = "default_breaker_action")]
    pub action: BreakerAction,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_blocked: default_max_blocked(),
            window_ms: default_window_ms(),
            action: default_breaker_action(),
        }
    }
}

fn default_max_blocked() -> u32 {
    5
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_breaker_action() -> BreakerAction {
    BreakerAction::Warn
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RulesConfig {
    #[serde(default)]
    pub defaults: Option<ToolRuleSetConfig>,
    #[serde(default)]
    pub tools: HashMap<String, ToolRuleSetConfig>,
    #[serde(default, rename = "circuitBreaker")]
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

/// Top-level Firewall configuration. Parsing an on-disk file format
/// (TOML/YAML) is out of scope for this crate; a host loader deserializes
/// into this type from whatever format it uses.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct FirewallConfig {
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub sanitization: SanitizationConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default = "default_true", rename = "systemPromptHint")]
    pub system_prompt_hint: bool,
    #[serde(default = "default_true", rename = "logBlocked")]
    pub log_blocked: bool,
    #[serde(default, rename = "opaqueVaultNames")]
    pub opaque_vault_names: bool,
}

redact_debug!(
    FirewallConfig,
    vault,
    sanitization,
    rules,
    system_prompt_hint,
    log_blocked,
    opaque_vault_names,
);

#[cfg(test)]
mod tests;
