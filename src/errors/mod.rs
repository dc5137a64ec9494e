use thiserror::Error;

/// Typed error hierarchy for the Firewall.
///
/// Only construction-time failures are modeled here — blocked calls and
/// breaker suspensions are expected, non-fatal outcomes returned as data
/// (`gatekeeper::CheckOutcome`), never thrown. Rule and sanitizer patterns
/// never fail construction (a bad pattern is dropped with a `tracing::warn!`
/// instead, matching the teacher's own pattern-construction idiom) — the
/// only thing that can actually go wrong at construction is a malformed
/// vault config, which `Firewall::new` rejects via `Config`.
#[derive(Debug, Error)]
pub enum FirewallError {
    #[error("configuration error: {0}")]
    Config(String),
}
