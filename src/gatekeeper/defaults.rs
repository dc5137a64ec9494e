use crate::config::{ParamRuleConfig, RulesConfig, ToolRuleSetConfig};

/// Safe command prefixes allowed at the call level for `exec`, grounded on
/// the teacher's `ExecToolConfig::default_allowed_commands` list.
const SAFE_EXEC_COMMANDS: &[&str] = &[
    "ls", "find", "tree", "pwd", "basename", "dirname", "realpath", "stat", "file", "cat", "head",
    "tail", "less", "wc", "md5sum", "sha256sum", "grep", "awk", "sed", "sort", "uniq", "cut",
    "tr", "diff", "comm", "paste", "rg", "ag", "fd", "jq", "yq", "git", "cargo", "rustc", "npm",
    "npx", "node", "python3", "pip3", "make", "go", "date", "cal", "whoami", "hostname", "uname",
    "uptime", "df", "du", "free", "ps", "env", "printenv", "which", "type", "echo", "printf",
    "test", "true", "false", "yes", "seq", "xargs", "tee", "touch", "mkdir", "cp", "mv", "ln",
];

/// Dangerous shell constructs denied on `exec`'s `command` parameter,
/// grounded on the teacher's `compile_security_patterns()`
/// (`utils/regex/mod.rs`).
const EXEC_COMMAND_DENY: &[&str] = &[
    r"\brm\s+-[rf]{1,2}\b",
    r"\brm\s+--(?:recursive|force)\b",
    r"\bdel\s+/[fq]\b",
    r"\brmdir\s+/s\b",
    r"\b(format|mkfs|diskpart)\b",
    r"\bdd\s+if=",
    r">\s*/dev/sd",
    r"\b(shutdown|reboot|poweroff)\b",
    r":\(\)\s*\{.{0,100}\};\s*:",
    r"\beval\b",
    r"\bbase64\b.*\|\s*(sh|bash|zsh)\b",
    r"\b(curl|wget)\b.*\|\s*(sh|bash|zsh|python)\b",
    r"\b(curl|wget)\b.*(-d\s*@|--data(-binary|-raw|-urlencode)?\s*@|-F\s|--form\s|--post-file)",
    r"\bpython[23]?(?:\.[0-9]+)?\s+-c\b",
    r"\b(perl|ruby)\b\s+-[EeXx]",
    r"\bchmod\b.*\bo?[0-7]*7[0-7]{0,2}\b",
    r"\bchown\b",
    r"\b(useradd|userdel|usermod|passwd|adduser|deluser)\b",
    r"\$\(",
    r"`[^`]+`",
    r"\$\{[^}]+\}",
    r"<\s*/|<\s*~",
    r"\$[A-Za-z_][A-Za-z0-9_]*",
    r"\b(nc|ncat|netcat)\b.*-[elp]",
    r"\bxxd\b.*-r.*\|\s*(sh|bash|zsh)\b",
    r"\bprintf\b.*\\x.*\|\s*(sh|bash|zsh)\b",
    r"\bnode\b\s+-e\b",
    r"\bphp\b\s+-r\b",
    r"rm\s+-rf\s+/(?!tmp)",
    r"cat\s+\S*\.env\b",
];

/// URL shapes denied on `web_fetch`'s `url` parameter: loopback, RFC1918,
/// link-local/metadata, decimal/hex/octal-encoded loopback, and non-http(s)
/// schemes the fetcher must never follow. Grounded on the teacher's
/// `utils/url_security::validate_url`/`check_ip_allowed`, re-expressed as
/// regexes since the Gatekeeper evaluates string patterns rather than
/// performing DNS-aware semantic IP checks.
const WEB_FETCH_URL_DENY: &[&str] = &[
    r"(?i)^file://",
    r"(?i)^gopher://",
    r"(?i)^dict://",
    r"(?i)://(127\.\d{1,3}\.\d{1,3}\.\d{1,3}|localhost)([:/]|$)",
    r"(?i)://10\.\d{1,3}\.\d{1,3}\.\d{1,3}([:/]|$)",
    r"(?i)://172\.(1[6-9]|2\d|3[01])\.\d{1,3}\.\d{1,3}([:/]|$)",
    r"(?i)://192\.168\.\d{1,3}\.\d{1,3}([:/]|$)",
    r"(?i)://169\.254\.\d{1,3}\.\d{1,3}([:/]|$)",
    r"(?i)://0\.0\.0\.0([:/]|$)",
    r"(?i)://\[?::1\]?([:/]|$)",
    r"(?i)://\[?fe80:",
    r"(?i)://\[?fc00:",
    r"(?i)://0x7f\.",
    r"(?i)://017[0-7]\.",
    r"(?i)://2130706433\b",
];

fn rule(allow: &[&str], deny: &[&str], block_message: Option<&str>) -> ToolRuleSetConfig {
    ToolRuleSetConfig {
        allow: allow.iter().map(|s| s.to_string()).collect(),
        deny: deny.iter().map(|s| s.to_string()).collect(),
        param_rules: Default::default(),
        block_message: block_message.map(String::from),
    }
}

fn param(allow: &[&str], deny: &[&str]) -> ParamRuleConfig {
    ParamRuleConfig {
        allow: allow.iter().map(|s| s.to_string()).collect(),
        deny: deny.iter().map(|s| s.to_string()).collect(),
    }
}

/// The shipped default rule sets (§6). Unlisted tools fall back to
/// `RulesConfig::defaults`, which denies every call — the open question in
/// §6's "exec: deny .*" line is resolved here as describing that unlisted-tool
/// fallback, not a literal always-block clause on `exec` itself (the latter
/// reading is unsatisfiable: deny is checked before allow, so no call-level
/// allow could ever let a command through, contradicting the spec's own
/// worked example of `exec echo hello` being allowed). See DESIGN.md.
pub fn shipped() -> RulesConfig {
    let mut tools = std::collections::HashMap::new();

    // Matched against the `command` value itself (not the serialized call),
    // so a safe command is recognized regardless of where it falls among
    // the call's other parameters.
    let exec_command_allow: Vec<String> = SAFE_EXEC_COMMANDS
        .iter()
        .map(|cmd| format!(r"^{}\b", regex::escape(cmd)))
        .collect();
    let mut exec = rule(&[], &[], Some("exec: command not permitted"));
    exec.param_rules.insert(
        "command".to_string(),
        ParamRuleConfig {
            allow: exec_command_allow,
            deny: EXEC_COMMAND_DENY.iter().map(|s| s.to_string()).collect(),
        },
    );
    tools.insert("exec".to_string(), exec);

    let mut read = rule(&[], &[], Some("read: path not permitted"));
    let path_deny = &[
        r"\.ssh/", r"\.env\b", r"/etc/shadow", r"/etc/passwd", r"\.aws/", r"/proc/",
    ];
    read.param_rules.insert(
        "file_path".to_string(),
        param(&["^\\./", "^/workspace/"], path_deny),
    );
    tools.insert("read".to_string(), read);

    let mut write = rule(&[], &[], Some("write: path not permitted"));
    let write_deny: Vec<&str> = path_deny
        .iter()
        .copied()
        .chain(["/etc/", "/usr/", "/proc/", "/sys/"])
        .collect();
    write.param_rules.insert(
        "file_path".to_string(),
        param(&["^\\./", "^/workspace/"], &write_deny),
    );
    tools.insert("write".to_string(), write);

    let mut web_fetch = rule(&[], &[], Some("web_fetch: URL not permitted"));
    web_fetch.param_rules.insert("url".to_string(), param(&[], WEB_FETCH_URL_DENY));
    tools.insert("web_fetch".to_string(), web_fetch);

    tools.insert(
        "sessions_send".to_string(),
        rule(&[], &[".*"], Some("sessions_send: locked by default")),
    );
    tools.insert(
        "sessions_spawn".to_string(),
        rule(&[], &[".*"], Some("sessions_spawn: locked by default")),
    );

    RulesConfig {
        defaults: Some(rule(&[], &[".*"], Some("no rule set for this tool; denied by default"))),
        tools,
        circuit_breaker: None,
    }
}

/// Combine shipped defaults with user-supplied overrides: deny lists
/// concatenate (shipped first), allow lists replace if the user supplied
/// any, param rules deep-merge under the same discipline. User
/// `blockMessage` replaces the shipped one.
pub fn merge_with_defaults(user: &RulesConfig) -> RulesConfig {
    let shipped = shipped();
    let mut tools = shipped.tools.clone();
    for (key, user_rule) in &user.tools {
        let merged = match tools.get(key) {
            Some(shipped_rule) => merge_rule_set(shipped_rule, user_rule),
            None => user_rule.clone(),
        };
        tools.insert(key.clone(), merged);
    }

    let defaults = match (&shipped.defaults, &user.defaults) {
        (Some(s), Some(u)) => Some(merge_rule_set(s, u)),
        (Some(s), None) => Some(s.clone()),
        (None, Some(u)) => Some(u.clone()),
        (None, None) => None,
    };

    RulesConfig {
        defaults,
        tools,
        circuit_breaker: user.circuit_breaker.clone().or(shipped.circuit_breaker),
    }
}

fn merge_rule_set(default: &ToolRuleSetConfig, user: &ToolRuleSetConfig) -> ToolRuleSetConfig {
    let mut deny = default.deny.clone();
    deny.extend(user.deny.iter().cloned());
    let allow = if user.allow.is_empty() { default.allow.clone() } else { user.allow.clone() };

    let mut param_rules = default.param_rules.clone();
    for (name, user_rule) in &user.param_rules {
        let merged = match default.param_rules.get(name) {
            Some(default_rule) => merge_param_rule(default_rule, user_rule),
            None => user_rule.clone(),
        };
        param_rules.insert(name.clone(), merged);
    }

    ToolRuleSetConfig {
        allow,
        deny,
        param_rules,
        block_message: user.block_message.clone().or_else(|| default.block_message.clone()),
    }
}

fn merge_param_rule(default: &ParamRuleConfig, user: &ParamRuleConfig) -> ParamRuleConfig {
    let mut deny = default.deny.clone();
    deny.extend(user.deny.iter().cloned());
    let allow = if user.allow.is_empty() { default.allow.clone() } else { user.allow.clone() };
    ParamRuleConfig { allow, deny }
}
