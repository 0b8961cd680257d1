//! Circular inheritance detection

use crate::error::Result;
use crate::graph::{RoleGraph, StepBudget};
use crate::types::{Finding, FindingType, Severity};

/// Complexity contribution of every cycle finding
pub const CYCLE_IMPACT: f64 = 50.0;

/// One CRITICAL finding per role that inherits from itself
pub fn detect_self_loops(graph: &RoleGraph) -> Vec<Finding> {
    graph
        .self_loops()
        .map(|role| {
            Finding::new(
                FindingType::CircularDependencySelf,
                Severity::Critical,
                vec![role.to_string()],
                CYCLE_IMPACT,
            )
            .with_description(format!("Role '{}' inherits from itself", role))
            .with_recommendation(format!(
                "Remove the self-referencing inheritance entry on '{}'",
                role
            ))
        })
        .collect()
}

/// One CRITICAL finding per elementary cycle of two or more roles
///
/// # Errors
///
/// Returns `EnumerationBudgetExceeded` when the graph has too many
/// cycles to list within `budget`.
pub fn detect_cycles(graph: &RoleGraph, budget: &mut StepBudget) -> Result<Vec<Finding>> {
    let cycles = graph.elementary_cycles(budget)?;

    Ok(cycles.into_iter().map(cycle_finding).collect())
}

fn cycle_finding(cycle: Vec<String>) -> Finding {
    let mut loop_path = cycle.clone();
    if let Some(first) = cycle.first() {
        loop_path.push(first.clone());
    }

    Finding::new(
        FindingType::CircularDependencyCycle,
        Severity::Critical,
        cycle,
        CYCLE_IMPACT,
    )
    .with_description(format!(
        "Circular inheritance detected: {}",
        loop_path.join(" -> ")
    ))
    .with_recommendation(
        "Break the cycle by removing one inheritance edge; roles in a cycle grant each other \
         every permission they hold",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RoleGraphBuilder;

    #[test]
    fn test_self_loop_finding() {
        let graph = RoleGraphBuilder::new().edge("A", "A").edge("A", "B").build();
        let findings = detect_self_loops(&graph);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].affected_roles, vec!["A"]);
        assert_eq!(findings[0].complexity_impact, 50.0);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_cycle_description_closes_loop() {
        let graph = RoleGraphBuilder::new()
            .edge("role_a", "role_b")
            .edge("role_b", "role_c")
            .edge("role_c", "role_a")
            .build();
        let findings = detect_cycles(&graph, &mut StepBudget::new("cycles", 1_000)).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].affected_roles, vec!["role_a", "role_b", "role_c"]);
        assert!(findings[0]
            .description
            .contains("role_a -> role_b -> role_c -> role_a"));
    }
}
