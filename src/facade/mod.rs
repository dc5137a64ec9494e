use crate::config::FirewallConfig;
use crate::errors::FirewallError;
use crate::gatekeeper::{CheckOutcome, Gatekeeper};
use crate::sanitizer::Sanitizer;
use crate::value::Value;
use crate::vault::{self, Vault};
use tracing::warn;

/// Result of `before_tool_call`: either the call is blocked, or it is
/// allowed with its parameters rewritten (placeholders expanded to secrets).
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCallDecision {
    Blocked { reason: String },
    Allowed { params: Value },
}

/// The four entry points the host pipeline drives, grounded on the
/// teacher's `ToolMiddleware` (before/after-execution shape) and
/// `MessageBus::publish_outbound` (scan-then-redact shape). `before_tool_call`
/// is `async fn` to fit an async host hook bus but performs no `.await` of
/// its own — synchronous in substance (see design notes).
pub struct Firewall {
    gatekeeper: Gatekeeper,
    vault: Vault,
    sanitizer: Sanitizer,
    log_blocked: bool,
    system_prompt_hint: bool,
    opaque_vault_names: bool,
}

impl Firewall {
    /// Fails only on a malformed vault config: every placeholder name must
    /// have the `[A-Z_][A-Z0-9_]*` shape a `{{NAME}}` token can match, or
    /// `inject`/the prompt hint could never resolve it. `Gatekeeper` and
    /// `Sanitizer` construction are themselves infallible (bad rule/pattern
    /// entries are dropped with a warning, not rejected).
    pub fn new(config: &FirewallConfig) -> Result<Self, FirewallError> {
        for name in config.vault.entries.keys() {
            if !vault::is_valid_placeholder_name(name) {
                return Err(FirewallError::Config(format!(
                    "invalid vault placeholder name '{name}': must match [A-Z_][A-Z0-9_]*"
                )));
            }
        }
        let vault = Vault::new(
            config
                .vault
                .entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Ok(Self {
            gatekeeper: Gatekeeper::new(&config.rules),
            vault,
            sanitizer: Sanitizer::new(&config.sanitization),
            log_blocked: config.log_blocked,
            system_prompt_hint: config.system_prompt_hint,
            opaque_vault_names: config.opaque_vault_names,
        })
    }

    /// Step 1: Gatekeeper.check. On block, return the block record. On
    /// allow, inject vault placeholders into the (unmodified) params.
    pub async fn before_tool_call(&self, tool_name: &str, params: &Value) -> ToolCallDecision {
        match self.gatekeeper.check(tool_name, params) {
            CheckOutcome::Blocked { reason } => {
                if self.log_blocked {
                    warn!("firewall blocked tool call '{tool_name}': {reason}");
                }
                ToolCallDecision::Blocked { reason }
            }
            CheckOutcome::Allowed => ToolCallDecision::Allowed {
                params: self.vault.inject_value(params),
            },
        }
    }

    /// Deep-walk with vault scrub then sanitize; returns `None` if the
    /// canonical serialization is unchanged (host keeps the original).
    pub fn on_tool_result_persist(&self, message: &Value) -> Option<Value> {
        let rewritten = self.sanitizer.scrub_and_sanitize_value(message, &self.vault);
        if rewritten.to_canonical_string() == message.to_canonical_string() {
            None
        } else {
            Some(rewritten)
        }
    }

    /// String content: scrub+sanitize and compare as strings. Structured
    /// content: deep-walk form and compare canonical serializations.
    pub fn on_message_sending(&self, content: &Value) -> Option<Value> {
        match content {
            Value::String(s) => {
                let rewritten = self.sanitizer.scrub_and_sanitize(s, &self.vault);
                if rewritten == *s {
                    None
                } else {
                    Some(Value::String(rewritten))
                }
            }
            other => self.on_tool_result_persist(other),
        }
    }

    /// Banner + placeholder syntax instructions + the list of available
    /// placeholders (real names, or opaque `{{SECRET_N}}` aliases), in
    /// vault insertion order. Never emits a secret value.
    pub fn build_agent_prompt_hint(&self) -> Option<String> {
        if !self.system_prompt_hint || self.vault.is_empty() {
            return None;
        }
        let names = self.vault.list_names();
        let listed: Vec<String> = if self.opaque_vault_names {
            (1..=names.len()).map(|i| format!("{{{{SECRET_{i}}}}}")).collect()
        } else {
            names.iter().map(|n| format!("{{{{{n}}}}}")).collect()
        };
        Some(format!(
            "This session has secret placeholders available. Use the exact \
             token `{{{{NAME}}}}` in tool parameters to reference a secret; it \
             will be substituted before the tool runs. Available placeholders: \
             {}. Tool calls are filtered by a security policy; some tools or \
             arguments may be blocked.",
            listed.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests;
