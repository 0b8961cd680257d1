//! Property-based tests for hierarchy invariants

use proptest::prelude::*;
use roleaudit_hierarchy::{FindingType, HierarchyInputs, HierarchyOptimizer, Severity};
use std::collections::{BTreeSet, HashSet};

const ROLES: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

fn edge_strategy() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..ROLES.len(), 0..ROLES.len()), 0..14)
}

fn inputs_from(edges: &[(usize, usize)], assigned: &[usize]) -> HierarchyInputs {
    let mut inputs = edges
        .iter()
        .fold(HierarchyInputs::new(), |inputs, (p, c)| inputs.with_edge(ROLES[*p], ROLES[*c]))
        .with_empty_assignments();
    for (i, role) in assigned.iter().enumerate() {
        inputs = inputs.with_assignment(format!("user{}", i), ROLES[*role]);
    }
    inputs
}

fn cycle_set(inputs: &HierarchyInputs) -> BTreeSet<Vec<String>> {
    HierarchyOptimizer::default()
        .analyze(inputs)
        .findings
        .into_iter()
        .filter(|f| f.finding_type.is_cycle())
        .map(|f| f.affected_roles)
        .collect()
}

proptest! {
    #[test]
    fn test_cycle_detection_is_order_independent(
        edges in edge_strategy(),
        seed in any::<u64>()
    ) {
        let mut shuffled = edges.clone();
        // Deterministic rotation + reversal stands in for a permutation
        if !shuffled.is_empty() {
            let shift = (seed as usize) % shuffled.len();
            shuffled.rotate_left(shift);
            if seed % 2 == 0 {
                shuffled.reverse();
            }
        }

        prop_assert_eq!(
            cycle_set(&inputs_from(&edges, &[])),
            cycle_set(&inputs_from(&shuffled, &[]))
        );
    }

    #[test]
    fn test_findings_are_sorted(
        edges in edge_strategy(),
        assigned in prop::collection::vec(0..ROLES.len(), 0..3)
    ) {
        let result = HierarchyOptimizer::default().analyze(&inputs_from(&edges, &assigned));

        for pair in result.findings.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(a.severity.rank() <= b.severity.rank());
            if a.severity == b.severity {
                prop_assert!(a.complexity_impact >= b.complexity_impact);
            }
        }
        prop_assert_eq!(result.total_findings, result.findings.len());
        prop_assert!(result.complexity_score >= 0.0);
    }

    #[test]
    fn test_orphaned_branches_are_maximal(
        edges in edge_strategy(),
        assigned in prop::collection::vec(0..ROLES.len(), 0..3)
    ) {
        let result = HierarchyOptimizer::default().analyze(&inputs_from(&edges, &assigned));
        let branches: Vec<HashSet<&String>> = result
            .findings_of(FindingType::OrphanedBranch)
            .into_iter()
            .map(|f| f.affected_roles.iter().collect())
            .collect();

        for (i, a) in branches.iter().enumerate() {
            for (j, b) in branches.iter().enumerate() {
                if i != j {
                    prop_assert!(!a.is_subset(b), "branch {:?} is inside {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_every_edge_endpoint_is_counted(edges in edge_strategy()) {
        let result = HierarchyOptimizer::default().analyze(&inputs_from(&edges, &[]));
        let endpoints: HashSet<usize> = edges.iter().flat_map(|(p, c)| [*p, *c]).collect();

        prop_assert!(result.total_roles_analyzed >= endpoints.len());
    }

    #[test]
    fn test_cycles_suppress_deep_nesting(edges in edge_strategy()) {
        let result = HierarchyOptimizer::default().analyze(&inputs_from(&edges, &[]));
        let has_cycle = result.findings.iter().any(|f| f.finding_type.is_cycle());

        if has_cycle {
            prop_assert!(result.findings_of(FindingType::DeepNesting).is_empty());
        }
    }

    #[test]
    fn test_self_loop_yields_one_critical(role in 0..ROLES.len()) {
        let inputs = HierarchyInputs::new()
            .with_edge(ROLES[role], ROLES[role])
            .with_edge(ROLES[role], ROLES[role]);
        let result = HierarchyOptimizer::default().analyze(&inputs);
        let loops = result.findings_of(FindingType::CircularDependencySelf);

        prop_assert_eq!(loops.len(), 1);
        prop_assert_eq!(loops[0].severity, Severity::Critical);
        prop_assert_eq!(loops[0].complexity_impact, 50.0);
    }
}
