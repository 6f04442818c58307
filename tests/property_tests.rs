//! Property-based tests for rust_logger_hierarchy using proptest

use proptest::prelude::*;
use rust_logger_hierarchy::core::{CustomFilter, FilterChain};
use rust_logger_hierarchy::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

fn any_level() -> impl Strategy<Value = Level> {
    prop_oneof![
        Just(Level::ALL),
        Just(Level::TRACE),
        Just(Level::DEBUG),
        Just(Level::INFO),
        Just(Level::WARN),
        Just(Level::ERROR),
        Just(Level::FATAL),
        Just(Level::OFF),
    ]
}

/// Dotted names over a tiny alphabet, so prefixes collide often
fn logger_name() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 1..5)
        .prop_map(|segments| segments.join("."))
}

fn logger_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(logger_name(), 1..12)
        .prop_map(|names| names.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

/// Closest strict ancestor among `created`, if any
fn expected_parent<'a>(name: &str, created: &'a BTreeSet<String>) -> Option<&'a String> {
    let mut end = name.len();
    while let Some(dot) = name[..end].rfind('.') {
        if let Some(found) = created.get(&name[..dot]) {
            return Some(found);
        }
        end = dot;
    }
    None
}

fn any_decision() -> impl Strategy<Value = FilterDecision> {
    prop_oneof![
        Just(FilterDecision::Deny),
        Just(FilterDecision::Neutral),
        Just(FilterDecision::Accept),
    ]
}

// ============================================================================
// Level Tests
// ============================================================================

proptest! {
    /// Names parse back to the same level regardless of case
    #[test]
    fn test_level_name_roundtrip(level in any_level(), lower in any::<bool>()) {
        let name = if lower {
            level.name().to_lowercase()
        } else {
            level.name().to_string()
        };
        let parsed: Level = name.parse().unwrap();
        prop_assert_eq!(parsed, level);
    }

    /// Ordering follows rank
    #[test]
    fn test_level_ordering_follows_rank(a in any_level(), b in any_level()) {
        prop_assert_eq!(a.cmp(&b), a.rank().cmp(&b.rank()));
        prop_assert_eq!(a.is_as_severe_as(&b), a.rank() >= b.rank());
    }

    /// Unknown names fall back to the supplied default
    #[test]
    fn test_unknown_level_name_uses_default(name in "[x-z]{1,8}", default in any_level()) {
        prop_assert_eq!(Level::to_level(&name, default.clone()), default);
    }
}

// ============================================================================
// Hierarchy Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Whatever the creation order, each logger's parent is its closest
    /// existing ancestor, or the root
    #[test]
    fn test_parent_is_closest_existing_ancestor(names in logger_names()) {
        let hierarchy = Hierarchy::new();
        for name in &names {
            hierarchy.get_logger(name);
        }

        let created: BTreeSet<String> = names.iter().cloned().collect();
        let root = hierarchy.root_logger();
        for name in &names {
            let logger = hierarchy.exists(name).unwrap();
            let parent = logger.parent().unwrap();
            match expected_parent(name, &created) {
                Some(expected) => prop_assert_eq!(parent.name(), expected.as_str()),
                None => prop_assert!(Arc::ptr_eq(&parent, &root)),
            }
        }
    }

    /// The effective level is the level of the closest ancestor that has one
    #[test]
    fn test_effective_level_inherits(
        names in logger_names(),
        levels in prop::collection::vec(prop::option::of(any_level()), 12),
        root_level in any_level(),
    ) {
        let hierarchy = Hierarchy::new();
        hierarchy.root_logger().set_level(Some(root_level.clone()));
        for (name, level) in names.iter().zip(levels.iter()) {
            hierarchy.get_logger(name).set_level(level.clone());
        }

        for name in &names {
            let logger = hierarchy.exists(name).unwrap();
            let mut expected = None;
            let mut current = Some(Arc::clone(&logger));
            while let Some(node) = current {
                if let Some(level) = node.level() {
                    expected = Some(level);
                    break;
                }
                current = node.parent();
            }
            prop_assert_eq!(logger.effective_level(), expected.unwrap_or(root_level.clone()));
        }
    }

    /// A disabled call never reaches an appender
    #[test]
    fn test_enabled_matches_threshold_and_level(
        logger_level in any_level(),
        threshold in any_level(),
        call in any_level().prop_filter("callable", |l| *l != Level::ALL && *l != Level::OFF),
    ) {
        let hierarchy = Hierarchy::new();
        hierarchy.set_threshold(threshold.clone());
        let (appender, handle) = MemoryAppender::memory("memory", 10);
        let logger = hierarchy.get_logger("prop");
        logger.set_level(Some(logger_level.clone()));
        logger.add_appender(appender.activated().unwrap());

        logger.log(call.clone(), "message");

        let expected = call.is_as_severe_as(&logger_level) && call.is_as_severe_as(&threshold);
        prop_assert_eq!(logger.is_enabled_for(&call), expected);
        prop_assert_eq!(handle.len(), usize::from(expected));
    }
}

// ============================================================================
// Filter Chain Tests
// ============================================================================

proptest! {
    /// The first non-neutral answer wins; all-neutral accepts
    #[test]
    fn test_filter_chain_first_opinion_wins(
        decisions in prop::collection::vec(any_decision(), 0..6)
    ) {
        let mut chain = FilterChain::new();
        for decision in &decisions {
            let decision = *decision;
            chain.add(Arc::new(CustomFilter::new(move |_| decision)));
        }

        let event = LoggingEvent::new("prop", Level::INFO, "filtered");
        let expected = decisions
            .iter()
            .copied()
            .find(|d| *d != FilterDecision::Neutral)
            .unwrap_or(FilterDecision::Accept);
        prop_assert_eq!(chain.decide(&event), expected);
    }
}
