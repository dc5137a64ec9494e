use super::*;
use crate::config::RulesConfig;
use indexmap::IndexMap;

fn params(pairs: &[(&str, &str)]) -> Value {
    let mut map = IndexMap::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), Value::String((*v).to_string()));
    }
    Value::Map(map)
}

fn gatekeeper() -> Gatekeeper {
    Gatekeeper::new(&RulesConfig::default())
}

#[test]
fn exec_rm_rf_root_is_blocked() {
    let gk = gatekeeper();
    let outcome = gk.check("exec", &params(&[("command", "rm -rf /")]));
    assert!(!outcome.is_allowed());
}

#[test]
fn bash_alias_normalizes_to_exec_and_blocks() {
    let gk = gatekeeper();
    let outcome = gk.check("bash", &params(&[("command", "rm -rf /")]));
    assert!(!outcome.is_allowed());
}

#[test]
fn exec_echo_hello_is_allowed() {
    let gk = gatekeeper();
    let outcome = gk.check("exec", &params(&[("command", "echo hello")]));
    assert_eq!(outcome, CheckOutcome::Allowed);
}

#[test]
fn read_etc_shadow_blocked_via_camel_case_lookup() {
    let gk = gatekeeper();
    let outcome = gk.check("read", &params(&[("filePath", "/etc/shadow")]));
    assert!(!outcome.is_allowed());
}

#[test]
fn web_fetch_metadata_endpoint_blocked() {
    let gk = gatekeeper();
    let outcome = gk.check(
        "web_fetch",
        &params(&[("url", "http://169.254.169.254/latest/meta-data/")]),
    );
    assert!(!outcome.is_allowed());
}

#[test]
fn web_fetch_public_url_allowed() {
    let gk = gatekeeper();
    let outcome = gk.check("web_fetch", &params(&[("url", "https://example.com/page")]));
    assert_eq!(outcome, CheckOutcome::Allowed);
}

#[test]
fn sessions_send_denied_by_default() {
    let gk = gatekeeper();
    let outcome = gk.check("sessions_send", &params(&[("to", "someone")]));
    assert!(!outcome.is_allowed());
}

#[test]
fn unknown_tool_falls_back_to_default_deny() {
    let gk = gatekeeper();
    let outcome = gk.check("totally_unknown_tool", &params(&[]));
    assert!(!outcome.is_allowed());
}

#[test]
fn group_membership_resolves_web_search_under_group_web() {
    let mut config = RulesConfig::default();
    let mut group_web = crate::config::ToolRuleSetConfig::default();
    group_web.deny.push(".*".to_string());
    config.tools.insert("group:web".to_string(), group_web);
    let gk = Gatekeeper::new(&config);
    let outcome = gk.check("web_search", &params(&[("q", "rust")]));
    assert!(!outcome.is_allowed());
}

#[test]
fn circuit_breaker_suspends_after_threshold() {
    let mut config = RulesConfig::default();
    config.circuit_breaker = Some(crate::config::CircuitBreakerConfig {
        enabled: true,
        max_blocked: 2,
        window_ms: 60_000,
        action: crate::config::BreakerAction::Suspend,
    });
    let gk = Gatekeeper::new(&config);
    let blocked_call = params(&[("command", "rm -rf /")]);
    assert!(!gk.check("exec", &blocked_call).is_allowed());
    assert!(!gk.check("exec", &blocked_call).is_allowed());
    let third = gk.check("exec", &params(&[("command", "echo hello")]));
    match third {
        CheckOutcome::Blocked { reason } => assert!(reason.contains("circuit breaker")),
        CheckOutcome::Allowed => panic!("expected breaker to suspend the third call"),
    }
}

#[test]
fn camel_case_conversion() {
    assert_eq!(to_camel_case("file_path"), "filePath");
    assert_eq!(to_camel_case("a_b_c"), "aBC");
}

#[test]
fn snake_case_conversion() {
    assert_eq!(to_snake_case("filePath"), "file_path");
    assert_eq!(to_snake_case("aBC"), "a_b_c");
}

#[test]
fn tool_alias_canonicalizes_case_and_whitespace() {
    assert_eq!(canonicalize_tool_name("  Bash  "), "exec");
    assert_eq!(canonicalize_tool_name("SHELL"), "exec");
}

#[test]
fn gatekeeper_monotonic_under_merge_user_cannot_shrink_deny() {
    let mut config = RulesConfig::default();
    let mut user_exec = crate::config::ToolRuleSetConfig::default();
    user_exec.allow.push(r"\{command:rm -rf /\}".to_string());
    config.tools.insert("exec".to_string(), user_exec);
    let gk = Gatekeeper::new(&config);
    let outcome = gk.check("exec", &params(&[("command", "rm -rf /")]));
    assert!(!outcome.is_allowed(), "shipped deny must survive user merge");
}
