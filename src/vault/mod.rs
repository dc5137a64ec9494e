use crate::value::{self, Value};
use base64::Engine;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Matches `{{NAME}}` where `NAME` is an uppercase identifier.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Z_][A-Z0-9_]*)\}\}").expect("placeholder regex"));

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").expect("name regex"));

/// Whether `name` has the shape a `{{NAME}}` token can actually match.
/// A registered name outside this shape can never be expanded by `inject`
/// or surfaced correctly by `build_agent_prompt_hint`.
pub(crate) fn is_valid_placeholder_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// Minimum secret length before an encoding-aware matcher is built for it.
/// Short values produce too many false positives in base64/hex form.
const ENCODING_MIN_LEN: usize = 8;

struct EncodingMatcher {
    regex: Regex,
    placeholder: String,
}

/// Bidirectional placeholder↔secret substitution.
///
/// Forward (`inject`) expands `{{NAME}}` to the stored secret. Reverse
/// (`scrub`) finds secret values — literal, base64, or hex-encoded — and
/// replaces them with `{{NAME}}`. The placeholder set is fixed at
/// construction (spec invariant: names are unique, empty values are
/// ignored for reverse matching).
pub struct Vault {
    names: Vec<String>,
    name_to_value: HashMap<String, String>,
    literal_matcher: Option<Regex>,
    value_to_placeholder: HashMap<String, String>,
    encoding_matchers: Vec<EncodingMatcher>,
}

impl Vault {
    /// Build a Vault from an ordered list of `(name, value)` pairs.
    /// Order is preserved for `list_names()` (used by the prompt-hint builder).
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let entries: Vec<(String, String)> = entries.into_iter().collect();
        let names: Vec<String> = entries.iter().map(|(n, _)| n.clone()).collect();
        // Forward lookup keeps every registered name, including empty-valued
        // and duplicate-value entries — only reverse matching collapses those.
        let name_to_value: HashMap<String, String> =
            entries.iter().map(|(n, v)| (n.clone(), v.clone())).collect();

        // Longest-match-first: a value that is a substring of another must
        // not be masked by the shorter one matching first.
        let mut non_empty: Vec<(&String, &String)> =
            entries.iter().map(|(n, v)| (n, v)).filter(|(_, v)| !v.is_empty()).collect();
        non_empty.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

        let mut value_to_placeholder = HashMap::new();
        for (name, v) in &non_empty {
            // Earlier-inserted placeholder wins on duplicate values (stable
            // construction order, not sorted order).
            value_to_placeholder
                .entry((*v).clone())
                .or_insert_with(|| format!("{{{{{name}}}}}"));
        }

        let literal_matcher = if non_empty.is_empty() {
            None
        } else {
            let alternation = non_empty
                .iter()
                .map(|(_, v)| regex::escape(v))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&alternation).ok()
        };

        let mut encoding_matchers = Vec::new();
        for (name, v) in &non_empty {
            if v.len() < ENCODING_MIN_LEN {
                continue;
            }
            let placeholder = format!("{{{{{name}}}}}");
            let b64_standard = base64::engine::general_purpose::STANDARD.encode(v.as_bytes());
            let b64_url_safe =
                base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(v.as_bytes());
            let hex_str = hex::encode(v.as_bytes());
            for encoded in [b64_standard, b64_url_safe] {
                if let Ok(regex) = Regex::new(&regex::escape(&encoded)) {
                    encoding_matchers.push(EncodingMatcher {
                        regex,
                        placeholder: placeholder.clone(),
                    });
                }
            }
            // Lowercase and uppercase hex, matched case-insensitively.
            if let Ok(regex) = Regex::new(&format!("(?i){}", regex::escape(&hex_str))) {
                encoding_matchers.push(EncodingMatcher {
                    regex,
                    placeholder,
                });
            }
        }

        Self {
            names,
            name_to_value,
            literal_matcher,
            value_to_placeholder,
            encoding_matchers,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Placeholder names in construction order (not values).
    pub fn list_names(&self) -> &[String] {
        &self.names
    }

    /// Forward substitution: `{{NAME}}` → secret value for known names.
    /// Unknown placeholder-shaped tokens pass through unchanged. No re-scan
    /// of injected output (disjoint matches only).
    pub fn inject(&self, text: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(text, |caps: &regex::Captures| {
                let name = &caps[1];
                self.name_to_value.get(name).cloned().unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Reverse substitution: secret value (literal, base64, or hex) → `{{NAME}}`.
    /// Identity on an empty vault.
    pub fn scrub(&self, text: &str) -> String {
        let mut result = match &self.literal_matcher {
            Some(re) => re
                .replace_all(text, |caps: &regex::Captures| {
                    self.value_to_placeholder
                        .get(&caps[0])
                        .cloned()
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned(),
            None => text.to_string(),
        };
        for m in &self.encoding_matchers {
            result = m.regex.replace_all(&result, m.placeholder.as_str()).into_owned();
        }
        result
    }

    /// Deep-object form of `inject`, via the Object Walker.
    pub fn inject_value(&self, value: &Value) -> Value {
        value::walk(value, &mut |s| self.inject(s))
    }

    /// Deep-object form of `scrub`, via the Object Walker.
    pub fn scrub_value(&self, value: &Value) -> Value {
        value::walk(value, &mut |s| self.scrub(s))
    }
}

#[cfg(test)]
mod tests;
