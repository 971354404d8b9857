//! Node-type policy engine.
//!
//! Gatekeeps which building-block types may appear in generated workflows:
//! built-in types always pass, third-party types pass only when enabled and
//! (if a whitelist is configured) whitelist-prefixed. Blocked types get
//! suggested built-in replacements from a static mapping.

use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::models::PolicyConfig;

/// A type rejected by the policy, with suggested replacements.
#[derive(Debug, Clone)]
pub struct BlockedType {
    pub type_identifier: String,
    pub alternatives: Vec<String>,
}

/// Outcome of evaluating a set of node types against the policy.
#[derive(Debug, Clone, Default)]
pub struct PolicyDecision {
    pub blocked: Vec<BlockedType>,
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        self.blocked.is_empty()
    }
}

/// Static mapping of known third-party types to built-in replacements.
///
/// Unknown types map to an empty slice, never an error.
fn builtin_alternatives(type_identifier: &str) -> &'static [&'static str] {
    match type_identifier {
        "community.customNode" | "community.code" => &["core.httpRequest", "core.set"],
        "community.slackExtended" => &["core.slack"],
        "community.discord" | "community.telegram" => &["core.httpRequest"],
        "community.airtableSync" | "community.sheetsSync" => &["core.httpRequest", "core.set"],
        "community.webhookRelay" => &["core.webhook"],
        "community.mailer" => &["core.emailSend"],
        _ => &[],
    }
}

/// Process-wide policy decision engine.
///
/// Reads are hot (every layer-0 check); the config is held as an `Arc`
/// snapshot so readers only clone a pointer under a read lock. `reload`
/// is the single serialized write path.
pub struct PolicyEngine {
    config: RwLock<Arc<PolicyConfig>>,
}

impl PolicyEngine {
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
        }
    }

    fn snapshot(&self) -> Arc<PolicyConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a node type may appear in generated output.
    ///
    /// Pure in `(type_identifier, config)`: repeated calls with unchanged
    /// config yield identical results.
    pub fn is_allowed(&self, type_identifier: &str) -> bool {
        let config = self.snapshot();

        if config
            .builtin_prefixes
            .iter()
            .any(|p| type_identifier.starts_with(p.as_str()))
        {
            return true;
        }

        if !config.allow_third_party_types {
            return false;
        }

        config.whitelist_prefixes.is_empty()
            || config
                .whitelist_prefixes
                .iter()
                .any(|p| type_identifier.starts_with(p.as_str()))
    }

    /// Suggested built-in replacements for a blocked type. Empty when no
    /// mapping exists.
    pub fn alternatives_for(&self, type_identifier: &str) -> Vec<String> {
        builtin_alternatives(type_identifier)
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    /// Evaluate a set of node types; returns every blocked type (first
    /// occurrence order, deduplicated) with its alternatives.
    pub fn evaluate<'a>(&self, types: impl IntoIterator<Item = &'a str>) -> PolicyDecision {
        let mut decision = PolicyDecision::default();
        for type_identifier in types {
            if self.is_allowed(type_identifier) {
                continue;
            }
            if decision
                .blocked
                .iter()
                .any(|b| b.type_identifier == type_identifier)
            {
                continue;
            }
            decision.blocked.push(BlockedType {
                type_identifier: type_identifier.to_string(),
                alternatives: self.alternatives_for(type_identifier),
            });
        }
        decision
    }

    /// Replace the active policy. Serialized with other reloads; in-flight
    /// readers keep their snapshot.
    pub fn reload(&self, config: PolicyConfig) {
        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(config);
        tracing::info!("policy configuration reloaded");
    }

    /// The active config snapshot (for status/diagnostics).
    pub fn current(&self) -> Arc<PolicyConfig> {
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(allow_third_party: bool, whitelist: &[&str]) -> PolicyEngine {
        PolicyEngine::new(PolicyConfig {
            allow_third_party_types: allow_third_party,
            whitelist_prefixes: whitelist.iter().map(|s| (*s).to_string()).collect(),
            builtin_prefixes: vec!["core.".to_string()],
        })
    }

    #[test]
    fn test_builtin_always_allowed() {
        let default_engine = engine(false, &[]);
        assert!(default_engine.is_allowed("core.webhook"));
        assert!(default_engine.is_allowed("core.slack"));

        // Whitelist contents never affect built-in types.
        let whitelisted_engine = engine(true, &["community.trusted"]);
        assert!(whitelisted_engine.is_allowed("core.webhook"));
    }

    #[test]
    fn test_third_party_blocked_by_default() {
        let engine = engine(false, &[]);
        assert!(!engine.is_allowed("community.customNode"));
    }

    #[test]
    fn test_third_party_allowed_without_whitelist() {
        let engine = engine(true, &[]);
        assert!(engine.is_allowed("community.customNode"));
    }

    #[test]
    fn test_whitelist_restricts_third_party() {
        let engine = engine(true, &["community.trusted"]);
        assert!(engine.is_allowed("community.trustedNode"));
        assert!(!engine.is_allowed("community.customNode"));
    }

    #[test]
    fn test_alternatives_for_known_type() {
        let engine = engine(false, &[]);
        assert_eq!(
            engine.alternatives_for("community.slackExtended"),
            vec!["core.slack"]
        );
    }

    #[test]
    fn test_alternatives_for_unknown_type_is_empty() {
        let engine = engine(false, &[]);
        assert!(engine.alternatives_for("community.nobodyKnows").is_empty());
    }

    #[test]
    fn test_evaluate_dedupes_blocked_types() {
        let engine = engine(false, &[]);
        let decision = engine.evaluate([
            "core.webhook",
            "community.customNode",
            "community.customNode",
            "community.discord",
        ]);
        assert!(!decision.is_allowed());
        assert_eq!(decision.blocked.len(), 2);
        assert_eq!(decision.blocked[0].type_identifier, "community.customNode");
        assert!(!decision.blocked[0].alternatives.is_empty());
    }

    #[test]
    fn test_reload_takes_effect() {
        let engine = engine(false, &[]);
        assert!(!engine.is_allowed("community.customNode"));

        engine.reload(PolicyConfig {
            allow_third_party_types: true,
            whitelist_prefixes: vec![],
            builtin_prefixes: vec!["core.".to_string()],
        });
        assert!(engine.is_allowed("community.customNode"));
    }

    #[test]
    fn test_repeated_calls_are_stable() {
        let engine = engine(true, &["community.trusted"]);
        let first = engine.is_allowed("community.trustedNode");
        for _ in 0..100 {
            assert_eq!(engine.is_allowed("community.trustedNode"), first);
        }
    }
}
