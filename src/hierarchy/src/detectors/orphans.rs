//! Orphaned role and branch detection

use crate::graph::RoleGraph;
use crate::inputs::LiveRoleSet;
use crate::types::{Finding, FindingType, Severity};
use std::collections::HashSet;

/// Impact of a single unused standalone role
pub const ORPHANED_ROLE_IMPACT: f64 = 1.0;

/// Impact per role in an unused branch
pub const ORPHANED_BRANCH_IMPACT_PER_ROLE: f64 = 1.0;

/// Standalone roles (no edges at all) without a live assignment
pub fn detect_orphaned_roles(graph: &RoleGraph, live: &LiveRoleSet) -> Vec<Finding> {
    graph
        .roles()
        .filter(|role| graph.is_isolated(role) && !live.contains(role))
        .map(|role| {
            Finding::new(
                FindingType::OrphanedRole,
                Severity::Low,
                vec![role.to_string()],
                ORPHANED_ROLE_IMPACT,
            )
            .with_description(format!(
                "{:?} role '{}' has no inheritance relationships and no assigned users",
                graph.node(role).map(|node| node.role_type).unwrap_or_default(),
                role
            ))
            .with_recommendation(format!("Review '{}' for retirement", role))
        })
        .collect()
}

/// Unused branches, reduced to the maximal ones
///
/// Every role with children roots a candidate branch made of itself and all
/// of its descendants. A candidate without any live assignment is kept
/// unless its roles are already covered by a larger kept branch.
pub fn detect_orphaned_branches(graph: &RoleGraph, live: &LiveRoleSet) -> Vec<Finding> {
    let mut candidates: Vec<(Vec<String>, HashSet<String>)> = graph
        .roles()
        .filter(|role| graph.out_degree(role) > 0)
        .map(|role| graph.descendant_closure(role))
        .filter(|branch| branch.iter().all(|role| !live.contains(role)))
        .map(|branch| {
            let members = branch.iter().cloned().collect();
            (branch, members)
        })
        .collect();

    candidates.sort_by(|(a, a_set), (b, b_set)| {
        b_set.len().cmp(&a_set.len()).then_with(|| a.cmp(b))
    });

    let mut kept: Vec<(Vec<String>, HashSet<String>)> = Vec::new();
    for (branch, members) in candidates {
        if kept.iter().any(|(_, larger)| members.is_subset(larger)) {
            continue;
        }
        kept.push((branch, members));
    }

    kept.into_iter()
        .map(|(branch, _)| branch_finding(branch))
        .collect()
}

fn branch_finding(branch: Vec<String>) -> Finding {
    let root = branch.first().cloned().unwrap_or_default();
    let size = branch.len();

    Finding::new(
        FindingType::OrphanedBranch,
        Severity::Low,
        branch,
        size as f64 * ORPHANED_BRANCH_IMPACT_PER_ROLE,
    )
    .with_description(format!(
        "Branch rooted at '{}' ({} roles) has no assigned users",
        root, size
    ))
    .with_recommendation(format!(
        "Consider removing the unused branch under '{}' or consolidating it into active roles",
        root
    ))
}

/// Orphaned roles followed by maximal orphaned branches
pub fn detect(graph: &RoleGraph, live: &LiveRoleSet) -> Vec<Finding> {
    let mut findings = detect_orphaned_roles(graph, live);
    findings.extend(detect_orphaned_branches(graph, live));
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RoleGraphBuilder;
    use crate::inputs::UserRoleAssignmentRow;
    use crate::types::RoleType;

    fn live(roles: &[&str]) -> LiveRoleSet {
        let rows: Vec<UserRoleAssignmentRow> = roles
            .iter()
            .enumerate()
            .map(|(i, role)| UserRoleAssignmentRow::new(format!("user{}", i), *role))
            .collect();
        LiveRoleSet::build(&rows)
    }

    #[test]
    fn test_isolated_unused_role() {
        let graph = RoleGraphBuilder::new()
            .role("Z", RoleType::Custom)
            .role("Used", RoleType::Standard)
            .build();
        let findings = detect_orphaned_roles(&graph, &live(&["Used"]));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].affected_roles, vec!["Z"]);
        assert_eq!(findings[0].severity, Severity::Low);
        assert!(findings[0].description.starts_with("Custom role 'Z'"));
    }

    #[test]
    fn test_only_maximal_branch_is_reported() {
        // A -> B -> C, nobody assigned
        let graph = RoleGraphBuilder::new().edge("A", "B").edge("B", "C").build();
        let findings = detect_orphaned_branches(&graph, &live(&[]));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].affected_roles, vec!["A", "B", "C"]);
        assert_eq!(findings[0].complexity_impact, 3.0);
    }

    #[test]
    fn test_live_descendant_protects_branch() {
        // A -> B -> C with C assigned; D -> E unused
        let graph = RoleGraphBuilder::new()
            .edge("A", "B")
            .edge("B", "C")
            .edge("D", "E")
            .build();
        let findings = detect_orphaned_branches(&graph, &live(&["C"]));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].affected_roles, vec!["D", "E"]);
    }

    #[test]
    fn test_sibling_branches_overlap_but_differ() {
        // A -> C, B -> C: neither closure contains the other
        let graph = RoleGraphBuilder::new().edge("A", "C").edge("B", "C").build();
        let findings = detect_orphaned_branches(&graph, &live(&[]));

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].affected_roles, vec!["A", "C"]);
        assert_eq!(findings[1].affected_roles, vec!["B", "C"]);
    }

    #[test]
    fn test_cycle_members_share_one_branch() {
        let graph = RoleGraphBuilder::new().edge("A", "B").edge("B", "A").build();
        let findings = detect_orphaned_branches(&graph, &live(&[]));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].affected_roles, vec!["A", "B"]);
    }
}
