use crate::value::Value;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;

mod defaults;

pub use crate::config::{BreakerAction, CircuitBreakerConfig, ParamRuleConfig, RulesConfig, ToolRuleSetConfig};

/// Tool-name alias table (§6): informal synonyms resolve to a canonical name.
const ALIASES: &[(&str, &str)] = &[
    ("bash", "exec"),
    ("shell", "exec"),
    ("run", "exec"),
    ("execute", "exec"),
    ("cmd", "exec"),
    ("command", "exec"),
    ("apply-patch", "apply_patch"),
];

/// Tool group table (§6), scanned in declared order during resolution.
const GROUPS: &[(&str, &[&str])] = &[
    ("group:fs", &["read", "write", "edit", "apply_patch"]),
    ("group:runtime", &["exec", "process"]),
    ("group:web", &["web_search", "web_fetch"]),
    ("group:memory", &["memory_search", "memory_get"]),
    (
        "group:sessions",
        &[
            "sessions_list",
            "sessions_history",
            "sessions_send",
            "sessions_spawn",
            "subagents",
            "session_status",
        ],
    ),
    ("group:ui", &["browser", "canvas"]),
    ("group:automation", &["cron", "gateway"]),
    ("group:messaging", &["message"]),
];

fn canonicalize_tool_name(name: &str) -> String {
    let normalized = name.trim().to_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(normalized)
}

/// a_b -> aB for each lowercase letter following `_`.
fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' {
            if let Some(next) = chars.next() {
                out.push(next.to_ascii_uppercase());
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Inserts `_` before each uppercase letter and lowercases it.
fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for c in s.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

struct CompiledParamRule {
    allow: Vec<Regex>,
    deny: Vec<Regex>,
}

impl CompiledParamRule {
    fn compile(config: &ParamRuleConfig, context: &str) -> Self {
        Self {
            allow: compile_patterns(&config.allow, context),
            deny: compile_patterns(&config.deny, context),
        }
    }

    /// Returns `Some(reason-suffix)` if this rule blocks value `v`.
    fn evaluate(&self, v: &str) -> Option<&'static str> {
        if self.deny.iter().any(|re| re.is_match(v)) {
            return Some("denied by parameter rule");
        }
        if !self.allow.is_empty() && !self.allow.iter().any(|re| re.is_match(v)) {
            return Some("not in parameter allow list");
        }
        None
    }
}

fn compile_patterns(patterns: &[String], context: &str) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("failed to compile {context} pattern '{p}': {e}");
                None
            }
        })
        .collect()
}

/// A compiled tool rule set: call-level allow/deny plus per-parameter rules.
/// Param rule keys are kept in the rule-author's casing; lookups at
/// evaluation time try that key, its camelCase form, and its snake_case form.
struct CompiledRuleSet {
    allow: Vec<Regex>,
    deny: Vec<Regex>,
    param_rules: HashMap<String, CompiledParamRule>,
    block_message: Option<String>,
}

impl CompiledRuleSet {
    fn compile(config: &ToolRuleSetConfig, rule_key: &str) -> Self {
        let param_rules = config
            .param_rules
            .iter()
            .map(|(name, rule)| (name.clone(), CompiledParamRule::compile(rule, rule_key)))
            .collect();
        Self {
            allow: compile_patterns(&config.allow, rule_key),
            deny: compile_patterns(&config.deny, rule_key),
            param_rules,
            block_message: config.block_message.clone(),
        }
    }

    fn block_reason(&self, tool_name: &str, detail: &str) -> String {
        self.block_message
            .clone()
            .unwrap_or_else(|| format!("tool '{tool_name}' call blocked: {detail}"))
    }
}

/// Outcome of a Gatekeeper check: data, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Allowed,
    Blocked { reason: String },
}

impl CheckOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Sliding-window block counter. Implicit two-state machine (normal,
/// tripped); the transition is the size comparison after pruning timestamps
/// older than `now - window`. No explicit reset.
struct Breaker {
    config: CircuitBreakerConfig,
    timestamps: Mutex<Vec<Instant>>,
}

impl Breaker {
    fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            timestamps: Mutex::new(Vec::new()),
        }
    }

    /// Prunes stale entries, then returns `Some(reason)` if tripped with
    /// `action = suspend`. Does not record a new timestamp on its own.
    fn check(&self) -> Option<String> {
        if !self.config.enabled {
            return None;
        }
        let window = Duration::from_millis(self.config.window_ms);
        let now = Instant::now();
        let mut timestamps = self.timestamps.lock().expect("breaker mutex poisoned");
        timestamps.retain(|t| now.duration_since(*t) < window);
        if timestamps.len() as u32 >= self.config.max_blocked {
            if self.config.action == BreakerAction::Suspend {
                return Some(format!(
                    "circuit breaker tripped: {} blocks within {}ms",
                    timestamps.len(),
                    self.config.window_ms
                ));
            }
            warn!(
                "circuit breaker threshold reached ({} blocks within {}ms); action=warn, continuing",
                timestamps.len(),
                self.config.window_ms
            );
        }
        None
    }

    fn record_block(&self) {
        if !self.config.enabled {
            return;
        }
        self.timestamps.lock().expect("breaker mutex poisoned").push(Instant::now());
    }
}

/// Resolves applicable rule sets per tool call and evaluates deny/allow at
/// the call and parameter level. Compiles every pattern once at construction;
/// immutable thereafter except the breaker's timestamp log.
pub struct Gatekeeper {
    rule_sets: HashMap<String, CompiledRuleSet>,
    default_rule_set: Option<CompiledRuleSet>,
    breaker: Breaker,
}

impl Gatekeeper {
    pub fn new(config: &RulesConfig) -> Self {
        let merged = defaults::merge_with_defaults(config);

        let default_rule_set = merged.defaults.as_ref().map(|d| CompiledRuleSet::compile(d, "defaults"));
        let rule_sets = merged
            .tools
            .iter()
            .map(|(key, rule)| (key.clone(), CompiledRuleSet::compile(rule, key)))
            .collect();

        Self {
            rule_sets,
            default_rule_set,
            breaker: Breaker::new(config.circuit_breaker.clone().unwrap_or_default()),
        }
    }

    fn resolve<'a>(&'a self, normalized_name: &str) -> Option<&'a CompiledRuleSet> {
        if let Some(rs) = self.rule_sets.get(normalized_name) {
            return Some(rs);
        }
        for (group_key, members) in GROUPS {
            if members.contains(&normalized_name)
                && let Some(rs) = self.rule_sets.get(*group_key)
            {
                return Some(rs);
            }
        }
        self.default_rule_set.as_ref()
    }

    /// Evaluate one tool call. `params` must be a `Value::Map` (or anything
    /// whose canonical string the rule author's patterns are written
    /// against); non-map params are evaluated only against call-level rules.
    pub fn check(&self, tool_name: &str, params: &Value) -> CheckOutcome {
        if let Some(reason) = self.breaker.check() {
            return CheckOutcome::Blocked { reason };
        }

        let normalized = canonicalize_tool_name(tool_name);
        let Some(rule_set) = self.resolve(&normalized) else {
            return CheckOutcome::Allowed;
        };

        let params_string = params.to_canonical_string();

        if rule_set.deny.iter().any(|re| re.is_match(&params_string)) {
            let reason = rule_set.block_reason(&normalized, "denied by call-level rule");
            self.breaker.record_block();
            return CheckOutcome::Blocked { reason };
        }
        if !rule_set.allow.is_empty() && !rule_set.allow.iter().any(|re| re.is_match(&params_string)) {
            let reason = rule_set.block_reason(&normalized, "not in call-level allow list");
            self.breaker.record_block();
            return CheckOutcome::Blocked { reason };
        }

        let Value::Map(map) = params else {
            return CheckOutcome::Allowed;
        };

        for (param_name, param_rule) in &rule_set.param_rules {
            let camel = to_camel_case(param_name);
            let snake = to_snake_case(param_name);
            let value = map
                .get(param_name)
                .or_else(|| map.get(&camel))
                .or_else(|| map.get(&snake))
                .filter(|v| !v.is_null());
            let Some(value) = value else { continue };
            let as_string = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_canonical_string());

            if let Some(detail) = param_rule.evaluate(&as_string) {
                let reason = rule_set.block_reason(&normalized, &format!("parameter '{param_name}' {detail}"));
                self.breaker.record_block();
                return CheckOutcome::Blocked { reason };
            }
        }

        CheckOutcome::Allowed
    }
}

#[cfg(test)]
mod tests;
