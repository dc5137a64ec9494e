use super::*;
use indexmap::IndexMap;

fn vault() -> Vault {
    Vault::new(vec![
        ("API_KEY".to_string(), "sk-ant-abc123xyz".to_string()),
        ("DB_PASS".to_string(), "hunter2hunter2".to_string()),
    ])
}

#[test]
fn inject_expands_known_placeholder() {
    let v = vault();
    assert_eq!(v.inject("key is {{API_KEY}}"), "key is sk-ant-abc123xyz");
}

#[test]
fn inject_leaves_unknown_placeholder_untouched() {
    let v = vault();
    assert_eq!(v.inject("value is {{NOT_REGISTERED}}"), "value is {{NOT_REGISTERED}}");
}

#[test]
fn inject_expands_every_name_even_with_duplicate_values() {
    // Reverse (scrub) matching collapses duplicate values to one winning
    // placeholder, but every registered name must still expand forward.
    let v = Vault::new(vec![
        ("A".to_string(), "shared-secret".to_string()),
        ("B".to_string(), "shared-secret".to_string()),
    ]);
    assert_eq!(v.inject("{{A}}"), "shared-secret");
    assert_eq!(v.inject("{{B}}"), "shared-secret");
}

#[test]
fn inject_expands_registered_empty_value() {
    // Empty values are exempt only from reverse (scrub) matching, not forward.
    let v = Vault::new(vec![("EMPTY".to_string(), String::new())]);
    assert_eq!(v.inject("value is {{EMPTY}}."), "value is .");
}

#[test]
fn is_valid_placeholder_name_accepts_uppercase_identifiers_only() {
    assert!(is_valid_placeholder_name("API_KEY"));
    assert!(is_valid_placeholder_name("_PRIVATE"));
    assert!(!is_valid_placeholder_name("api_key"));
    assert!(!is_valid_placeholder_name("API-KEY"));
    assert!(!is_valid_placeholder_name(""));
}

#[test]
fn scrub_replaces_literal_secret() {
    let v = vault();
    assert_eq!(v.scrub("key is sk-ant-abc123xyz"), "key is {{API_KEY}}");
}

#[test]
fn scrub_is_identity_on_empty_vault() {
    let v = Vault::new(Vec::<(String, String)>::new());
    assert!(v.is_empty());
    assert_eq!(v.scrub("nothing secret here"), "nothing secret here");
}

#[test]
fn scrub_prefers_longest_match() {
    let v = Vault::new(vec![
        ("SHORT".to_string(), "password123".to_string()),
        ("LONG".to_string(), "password123456extra".to_string()),
    ]);
    let out = v.scrub("leaked: password123456extra");
    assert_eq!(out, "leaked: {{LONG}}");
}

#[test]
fn scrub_detects_base64_encoded_secret() {
    let v = vault();
    let encoded = base64::engine::general_purpose::STANDARD.encode("hunter2hunter2");
    let text = format!("blob={encoded}");
    assert_eq!(v.scrub(&text), "blob={{DB_PASS}}");
}

#[test]
fn scrub_detects_url_safe_base64_secret() {
    let v = vault();
    let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode("hunter2hunter2");
    let text = format!("blob={encoded}");
    assert_eq!(v.scrub(&text), "blob={{DB_PASS}}");
}

#[test]
fn scrub_detects_hex_encoded_secret_case_insensitively() {
    let v = vault();
    let encoded_upper = hex::encode("hunter2hunter2").to_uppercase();
    let text = format!("blob={encoded_upper}");
    assert_eq!(v.scrub(&text), "blob={{DB_PASS}}");
}

#[test]
fn short_secret_has_no_encoding_matcher() {
    let v = Vault::new(vec![("SHORT".to_string(), "ab1".to_string())]);
    let encoded = base64::engine::general_purpose::STANDARD.encode("ab1");
    // Short secrets (< 8 bytes) only get literal matching, not encoding matching.
    assert_eq!(v.scrub(&encoded), encoded);
    assert_eq!(v.scrub("token ab1 here"), "token {{SHORT}} here");
}

#[test]
fn list_names_preserves_construction_order() {
    let v = vault();
    assert_eq!(v.list_names(), &["API_KEY".to_string(), "DB_PASS".to_string()]);
}

#[test]
fn inject_value_walks_nested_structure() {
    let v = vault();
    let mut map = IndexMap::new();
    map.insert("auth".to_string(), Value::String("{{API_KEY}}".to_string()));
    let input = Value::Map(map);
    let out = v.inject_value(&input);
    let Value::Map(out_map) = out else { panic!() };
    assert_eq!(out_map["auth"], Value::String("sk-ant-abc123xyz".to_string()));
}

#[test]
fn scrub_value_walks_nested_structure() {
    let v = vault();
    let input = Value::Array(vec![Value::String("sk-ant-abc123xyz".to_string())]);
    let out = v.scrub_value(&input);
    let Value::Array(items) = out else { panic!() };
    assert_eq!(items[0], Value::String("{{API_KEY}}".to_string()));
}

#[test]
fn empty_values_are_ignored_for_reverse_matching() {
    let v = Vault::new(vec![("EMPTY".to_string(), String::new())]);
    assert_eq!(v.scrub("anything"), "anything");
}

mod prop {
    use super::*;
    use proptest::prelude::*;

    fn secret_value() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9]{8,40}"
    }

    proptest! {
        /// inject(scrub(text)) restores the original secret wherever scrub
        /// found it — the reverse-mapping law from spec.md §8.
        #[test]
        fn scrub_then_inject_round_trips_a_lone_secret(secret in secret_value()) {
            let v = Vault::new(vec![("SECRET".to_string(), secret.clone())]);
            let text = format!("prefix {secret} suffix");
            let scrubbed = v.scrub(&text);
            prop_assert_eq!(v.inject(&scrubbed), text);
        }

        /// scrub is idempotent: a second pass over already-scrubbed text is a no-op.
        #[test]
        fn scrub_is_idempotent(secret in secret_value(), noise in "[a-zA-Z ]{0,20}") {
            let v = Vault::new(vec![("SECRET".to_string(), secret.clone())]);
            let text = format!("{noise}{secret}{noise}");
            let once = v.scrub(&text);
            let twice = v.scrub(&once);
            prop_assert_eq!(once, twice);
        }

        /// inject is a no-op on text that contains no `{{NAME}}` token at all.
        #[test]
        fn inject_is_noop_without_placeholder_syntax(text in "[a-zA-Z0-9 .,!?]{0,60}") {
            let v = Vault::new(vec![("API_KEY".to_string(), "sk-whatever-secret".to_string())]);
            prop_assert_eq!(v.inject(&text), text);
        }

        /// Longest-match discipline holds for any pair of distinct secrets
        /// where one is a substring of the other.
        #[test]
        fn longest_match_wins_when_one_secret_contains_another(
            short in "[a-zA-Z0-9]{8,12}",
            extra in "[a-zA-Z0-9]{1,10}",
        ) {
            let long = format!("{short}{extra}");
            let v = Vault::new(vec![
                ("SHORT".to_string(), short.clone()),
                ("LONG".to_string(), long.clone()),
            ]);
            let scrubbed = v.scrub(&long);
            prop_assert_eq!(scrubbed, "{{LONG}}".to_string());
        }
    }
}
