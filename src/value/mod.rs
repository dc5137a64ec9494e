use indexmap::IndexMap;
use std::collections::HashSet;

/// The structured-data universe the Firewall walks and rewrites: booleans,
/// numbers, strings, null, ordered arrays, and string-keyed maps that
/// preserve insertion order.
///
/// Tool parameters and tool results generally arrive as `serde_json::Value`;
/// `From`/`TryFrom` conversions below bridge at that boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Stable serialization used both for Gatekeeper rule evaluation (the
    /// "params string") and for the Facade's changed/unchanged comparisons.
    /// Non-string leaves render via their natural textual form; map keys
    /// render in insertion order so the result is deterministic per value.
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            Self::Null => out.push_str("null"),
            Self::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Self::Number(n) => out.push_str(&n.to_string()),
            Self::String(s) => out.push_str(s),
            Self::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_canonical(out);
                }
                out.push(']');
            }
            Self::Map(map) => {
                out.push('{');
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(k);
                    out.push(':');
                    v.write_canonical(out);
                }
                out.push('}');
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Value::Number(n),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

/// Cycle-safe deep traversal. Replaces every string leaf of `value` with
/// `f(leaf)`, preserving array order/length and map key identity/order.
///
/// `f` is assumed total — if it panics, that propagates unchanged, matching
/// the walker's "non-goal" around failure handling.
pub fn walk(value: &Value, f: &mut impl FnMut(&str) -> String) -> Value {
    let mut visited = HashSet::new();
    walk_inner(value, f, &mut visited)
}

fn walk_inner(
    value: &Value,
    f: &mut impl FnMut(&str) -> String,
    visited: &mut HashSet<usize>,
) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bool(b) => Value::Bool(*b),
        Value::Number(n) => Value::Number(n.clone()),
        Value::String(s) => Value::String(f(s)),
        Value::Array(items) => {
            let id = items as *const Vec<Value> as usize;
            if !items.is_empty() && !visited.insert(id) {
                return value.clone();
            }
            let out = Value::Array(items.iter().map(|v| walk_inner(v, f, visited)).collect());
            if !items.is_empty() {
                visited.remove(&id);
            }
            out
        }
        Value::Map(map) => {
            let id = map as *const IndexMap<String, Value> as usize;
            if !map.is_empty() && !visited.insert(id) {
                return value.clone();
            }
            let out = Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), walk_inner(v, f, visited)))
                    .collect(),
            );
            if !map.is_empty() {
                visited.remove(&id);
            }
            out
        }
    }
}
