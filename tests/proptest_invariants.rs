mod support;

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use criteria_engine::{Engine, GraphBuilder, InMemorySource, RuleGraph, RuleId};
use proptest::prelude::*;
use strategies::{arb_record, arb_rows, GenRows};
use support::Journal;

fn engine(rows: &GenRows, journal: &Journal) -> Engine {
    Engine::builder(Arc::new(InMemorySource::new(
        rows.criteria.clone(),
        rows.actions.clone(),
    )))
    .logic_units(support::logic())
    .actions(journal.registry())
    .build()
    .unwrap()
}

fn build(rows: &GenRows) -> RuleGraph {
    let logic = support::logic();
    let actions = Journal::default().registry();
    GraphBuilder::new(&logic, &actions)
        .build(&rows.criteria, &rows.actions)
        .0
}

// ---------------------------------------------------------------------------
// Invariant 1: Graph shape
//
// Every surviving rule has criteria and actions, every criterion is referenced,
// and no two criteria share a structural key.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn graph_is_closed(rows in arb_rows()) {
        let graph = build(&rows);
        for rule in graph.rules() {
            prop_assert!(!rule.criteria().is_empty());
            prop_assert!(rule.action_count() > 0);
            for id in rule.criteria() {
                prop_assert!(graph.criterion(*id).is_some(), "dangling criterion in {}", rule);
            }
        }
        for (i, _) in graph.criteria().iter().enumerate() {
            let referenced = graph
                .rules()
                .any(|rule| rule.criteria().iter().any(|id| id.index() == i));
            prop_assert!(referenced, "criterion #{} is not referenced", i);
        }
    }

    #[test]
    fn criteria_are_deduplicated(rows in arb_rows()) {
        let graph = build(&rows);
        let keys: HashSet<_> = graph.criteria().iter().map(|c| c.key()).collect();
        prop_assert_eq!(keys.len(), graph.criteria().len());
    }

    #[test]
    fn surviving_rules_match_rows(rows in arb_rows()) {
        let graph = build(&rows);
        let ids: BTreeSet<RuleId> = graph.rules().map(|r| r.id()).collect();
        prop_assert_eq!(ids, rows.expected_rules());
    }
}

// ---------------------------------------------------------------------------
// Invariant 2: Pass outcome
//
// A rule is applicable exactly when all its criteria hold, skipped exactly when
// one is unevaluated before any false one, and repeated passes agree.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn pass_matches_conjunction(rows in arb_rows(), record in arb_record()) {
        let engine = engine(&rows, &Journal::default());
        let report = engine.run(record.as_any());

        let (applicable, skipped) = engine.with_graph(|graph| {
            let mut applicable = Vec::new();
            let mut skipped = Vec::new();
            for rule in graph.rules() {
                let mut outcome = Some(true);
                for criterion in graph.criteria_of(rule) {
                    match criterion.result() {
                        Ok(true) => {}
                        Ok(false) => {
                            outcome = Some(false);
                            break;
                        }
                        Err(_) => {
                            outcome = None;
                            break;
                        }
                    }
                }
                match outcome {
                    Some(true) => applicable.push(rule.id()),
                    Some(false) => {}
                    None => skipped.push(rule.id()),
                }
            }
            (applicable, skipped)
        });

        prop_assert_eq!(report.applicable(), applicable.as_slice());
        prop_assert_eq!(report.skipped(), skipped.as_slice());
    }

    #[test]
    fn passes_are_deterministic(rows in arb_rows(), record in arb_record()) {
        let engine = engine(&rows, &Journal::default());
        let first = engine.run(record.as_any());
        for _ in 0..3 {
            let again = engine.run(record.as_any());
            prop_assert_eq!(first.applicable(), again.applicable());
            prop_assert_eq!(first.skipped(), again.skipped());
            prop_assert_eq!(first.evaluated(), again.evaluated());
        }
    }

    #[test]
    fn each_applicable_rule_runs_its_actions(rows in arb_rows(), record in arb_record()) {
        let journal = Journal::default();
        let engine = engine(&rows, &journal);
        let report = engine.run(record.as_any());
        let expected: usize = engine.with_graph(|graph| {
            report
                .applicable()
                .iter()
                .filter_map(|id| graph.rule(*id))
                .map(|rule| rule.action_count())
                .sum()
        });
        prop_assert!(report.action_failures().is_empty());
        prop_assert_eq!(journal.entries().len(), expected);
    }
}
