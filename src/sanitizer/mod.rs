use crate::value::{self, Value};
use crate::vault::Vault;
use regex::Regex;
use tracing::warn;

struct CompiledPattern {
    #[allow(dead_code)]
    name: &'static str,
    regex: Regex,
}

/// Default generic-shape patterns, applied in order. Provider prefixes are
/// grounded on the teacher's `LeakDetector` pattern list; the remaining
/// generic shapes (env assignments, JSON fields, CLI flags, Bearer tokens,
/// PEM blocks, JWTs, database URIs, generic id:token pairs) are this
/// component's own addition, matching what a secrets-scanning sanitizer must
/// cover beyond literal known-provider prefixes.
const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    ("env_assignment", r#"(?i)\b[A-Z_][A-Z0-9_]*(?:KEY|TOKEN|SECRET|PASSWORD)\s*=\s*\S+"#),
    (
        "json_secret_field",
        r#"(?i)"(?:api[_-]?key|token|secret|password)"\s*:\s*"[^"]+""#,
    ),
    ("cli_flag_secret", r#"(?i)--(?:api[_-]?key|token|secret|password)[= ]\S+"#),
    ("bearer_token", r"(?i)\bBearer\s+[A-Za-z0-9\-_.]+"),
    (
        "pem_block",
        r"-----BEGIN [A-Z ]+PRIVATE KEY-----[\s\S]+?-----END [A-Z ]+PRIVATE KEY-----",
    ),
    ("anthropic_api_key", r"sk-ant-api[0-9a-zA-Z\-_]{16,200}"),
    (
        "openai_api_key",
        r"sk-(?:proj|org|svcacct)-[a-zA-Z0-9\-_]{16,200}|sk-(?:[b-zB-Z0-9]|a[^n]|an[^t])[a-zA-Z0-9]{13,197}",
    ),
    ("slack_bot_token", r"xoxb-[0-9]+-[0-9]+-[a-zA-Z0-9]+"),
    ("slack_app_token", r"xapp-[0-9]+-[A-Z0-9]+-[0-9]+-[A-Fa-f0-9]+"),
    ("github_pat", r"ghp_[a-zA-Z0-9]{36}"),
    ("github_fine_grained_pat", r"github_pat_[a-zA-Z0-9]{22}_[a-zA-Z0-9]{59}"),
    ("aws_access_key", r"AKIA[0-9A-Z]{16}"),
    ("groq_api_key", r"gsk_[a-zA-Z0-9]{20,200}"),
    ("google_api_key", r"AIza[0-9A-Za-z\-_]{35}"),
    ("perplexity_api_key", r"pplx-[a-zA-Z0-9]{20,200}"),
    ("npm_token", r"npm_[a-zA-Z0-9]{36}"),
    ("stripe_live_secret_key", r"sk_live_[a-zA-Z0-9]{20,200}"),
    ("stripe_live_publishable_key", r"pk_live_[a-zA-Z0-9]{20,200}"),
    ("stripe_live_restricted_key", r"rk_live_[a-zA-Z0-9]{20,200}"),
    ("sendgrid_api_key", r"SG\.[a-zA-Z0-9_\-]{16,200}\.[a-zA-Z0-9_\-]{16,200}"),
    ("jwt", r"eyJ[A-Za-z0-9_\-]+\.[A-Za-z0-9_\-]+\.[A-Za-z0-9_\-]+"),
    (
        "database_uri",
        r"(?i)\b(?:postgres|postgresql|mysql|mongodb(?:\+srv)?|redis)://[^\s\"']+",
    ),
    ("generic_id_token_pair", r#"(?i)\bid\s*:\s*\S+\s*,?\s*token\s*:\s*\S+"#),
];

/// Regex-based generic secret redaction. Constructed from a config that
/// enables/disables default patterns and supplies extra ones; invalid
/// patterns are dropped with a warning, never fail construction (spec
/// invariant shared with the teacher's pattern-construction idiom).
pub struct Sanitizer {
    enabled: bool,
    patterns: Vec<CompiledPattern>,
    replacement: String,
}

impl Sanitizer {
    pub fn new(config: &crate::config::SanitizationConfig) -> Self {
        let mut patterns = Vec::new();
        if config.enabled && config.use_default_patterns {
            for (name, pattern) in DEFAULT_PATTERNS {
                match Regex::new(pattern) {
                    Ok(regex) => patterns.push(CompiledPattern { name, regex }),
                    Err(e) => warn!("failed to compile default sanitizer pattern '{name}': {e}"),
                }
            }
        }
        if config.enabled {
            for pattern in &config.extra_patterns {
                match Regex::new(pattern) {
                    Ok(regex) => patterns.push(CompiledPattern {
                        name: "extra",
                        regex,
                    }),
                    Err(e) => warn!("failed to compile extra sanitizer pattern '{pattern}': {e}"),
                }
            }
        }
        Self {
            enabled: config.enabled,
            patterns,
            replacement: config.replacement.clone(),
        }
    }

    /// Apply each compiled pattern in list order, replacing matches with the
    /// configured replacement token. A token introduced by an earlier pattern
    /// may be matched by a later one; this layering is by design.
    pub fn sanitize(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        let mut result = text.to_string();
        for pattern in &self.patterns {
            result = pattern.regex.replace_all(&result, self.replacement.as_str()).into_owned();
        }
        result
    }

    /// Vault scrub first, then sanitize — scrubbing preserves named-placeholder
    /// identity, which a generic sanitizer pass would otherwise destroy.
    pub fn scrub_and_sanitize(&self, text: &str, vault: &Vault) -> String {
        self.sanitize(&vault.scrub(text))
    }

    pub fn sanitize_value(&self, value: &Value) -> Value {
        value::walk(value, &mut |s| self.sanitize(s))
    }

    pub fn scrub_and_sanitize_value(&self, value: &Value, vault: &Vault) -> Value {
        value::walk(value, &mut |s| self.scrub_and_sanitize(s, vault))
    }
}

#[cfg(test)]
mod tests;
