//! Property-based tests for the policy engine.

use proptest::prelude::*;

use flowsmith::domain::models::PolicyConfig;
use flowsmith::services::policy::PolicyEngine;

fn arbitrary_config() -> impl Strategy<Value = PolicyConfig> {
    (
        any::<bool>(),
        prop::collection::vec("[a-z]{1,8}\\.", 0..3),
    )
        .prop_map(|(allow_third_party_types, whitelist_prefixes)| PolicyConfig {
            allow_third_party_types,
            whitelist_prefixes,
            builtin_prefixes: vec!["core.".to_string()],
        })
}

proptest! {
    /// Built-in types pass regardless of third-party flag or whitelist.
    #[test]
    fn builtin_types_always_allowed(
        config in arbitrary_config(),
        suffix in "[a-zA-Z]{1,16}",
    ) {
        let engine = PolicyEngine::new(config);
        let type_identifier = format!("core.{}", suffix);
        prop_assert!(engine.is_allowed(&type_identifier));
    }

    /// `is_allowed` is pure: repeated calls with unchanged config agree.
    #[test]
    fn is_allowed_is_idempotent(
        config in arbitrary_config(),
        type_identifier in "[a-z]{1,8}\\.[a-zA-Z]{1,16}",
    ) {
        let engine = PolicyEngine::new(config);
        let first = engine.is_allowed(&type_identifier);
        for _ in 0..10 {
            prop_assert_eq!(engine.is_allowed(&type_identifier), first);
        }
    }

    /// `evaluate` agrees with `is_allowed` on every input type.
    #[test]
    fn evaluate_matches_is_allowed(
        config in arbitrary_config(),
        types in prop::collection::vec("[a-z]{1,8}\\.[a-zA-Z]{1,12}", 1..8),
    ) {
        let engine = PolicyEngine::new(config);
        let decision = engine.evaluate(types.iter().map(String::as_str));
        for t in &types {
            let blocked = decision.blocked.iter().any(|b| &b.type_identifier == t);
            prop_assert_eq!(blocked, !engine.is_allowed(t));
        }
    }

    /// Alternatives lookup never fails, even for unknown types.
    #[test]
    fn alternatives_never_error(type_identifier in ".{0,32}") {
        let engine = PolicyEngine::new(PolicyConfig::default());
        let _ = engine.alternatives_for(&type_identifier);
    }
}
