//! Inheritance depth analysis
//!
//! On a cycle-free graph the depth of a root is the largest BFS distance to
//! any role it reaches, and the hierarchy depth is the maximum over roots.
//! When that exceeds the configured limit, every root-to-leaf chain longer
//! than the limit is reported, keeping only maximal chains.
//!
//! With cycles present there are no reliable roots, so depth falls back to
//! the largest BFS distance from any role and no chains are reported.

use crate::error::Result;
use crate::graph::{RoleGraph, StepBudget};
use crate::types::{DepthMode, Finding, FindingType, Severity};
use std::collections::HashSet;
use tracing::debug;

/// Impact per role in an over-long chain
pub const DEEP_CHAIN_IMPACT_PER_ROLE: f64 = 5.0;

/// Depth measurement and any deep-nesting findings
#[derive(Debug, Clone)]
pub struct DepthReport {
    pub max_depth: usize,
    pub mode: DepthMode,
    pub findings: Vec<Finding>,
}

/// Maximum root-based BFS depth of a cycle-free graph
pub fn exact_max_depth(graph: &RoleGraph) -> usize {
    graph
        .roots()
        .map(|root| graph.eccentricity(root))
        .max()
        .unwrap_or(0)
}

/// Maximum BFS distance reachable from any role
///
/// Used when cycles make root-based depth meaningless.
pub fn approximate_max_depth(graph: &RoleGraph) -> usize {
    graph
        .roles()
        .map(|role| graph.eccentricity(role))
        .max()
        .unwrap_or(0)
}

/// Maximal root-to-leaf chains with more than `max_nesting_depth` edges
///
/// A chain whose roles are all contained in a longer reported chain is
/// dropped.
///
/// # Errors
///
/// Returns `EnumerationBudgetExceeded` if path enumeration exhausts `budget`.
pub fn find_deep_chains(
    graph: &RoleGraph,
    max_nesting_depth: usize,
    budget: &mut StepBudget,
) -> Result<Vec<Vec<String>>> {
    let mut chains = Vec::new();

    for root in graph.roots() {
        for path in graph.paths_to_leaves(root, budget)? {
            if path.len().saturating_sub(1) > max_nesting_depth {
                chains.push(path);
            }
        }
    }

    // Longest first; name order keeps equal lengths deterministic
    chains.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut kept: Vec<(Vec<String>, HashSet<String>)> = Vec::new();
    for chain in chains {
        let members: HashSet<String> = chain.iter().cloned().collect();
        if kept.iter().any(|(_, longer)| members.is_subset(longer)) {
            continue;
        }
        kept.push((chain, members));
    }

    debug!("Found {} maximal deep chains", kept.len());
    Ok(kept.into_iter().map(|(chain, _)| chain).collect())
}

/// HIGH finding for one over-long chain
pub fn deep_nesting_finding(chain: Vec<String>, max_nesting_depth: usize) -> Finding {
    let edges = chain.len().saturating_sub(1);
    let impact = chain.len() as f64 * DEEP_CHAIN_IMPACT_PER_ROLE;
    let description = format!(
        "Inheritance chain of depth {} exceeds the limit of {}: {}",
        edges,
        max_nesting_depth,
        chain.join(" -> ")
    );

    Finding::new(FindingType::DeepNesting, Severity::High, chain, impact)
        .with_description(description)
        .with_recommendation(format!(
            "Flatten the chain to at most {} levels by assigning intermediate permissions \
             directly or merging pass-through roles",
            max_nesting_depth
        ))
}

/// Depth on a cycle-free graph, with deep-nesting findings
pub fn analyze_exact(
    graph: &RoleGraph,
    max_nesting_depth: usize,
    budget: &mut StepBudget,
) -> Result<DepthReport> {
    let max_depth = exact_max_depth(graph);
    let mut findings = Vec::new();

    if max_depth > max_nesting_depth {
        findings = find_deep_chains(graph, max_nesting_depth, budget)?
            .into_iter()
            .map(|chain| deep_nesting_finding(chain, max_nesting_depth))
            .collect();
    }

    Ok(DepthReport {
        max_depth,
        mode: DepthMode::Exact,
        findings,
    })
}

/// Depth on a cyclic graph; never produces findings
pub fn analyze_approximate(graph: &RoleGraph) -> DepthReport {
    DepthReport {
        max_depth: approximate_max_depth(graph),
        mode: DepthMode::Approximate,
        findings: Vec::new(),
    }
}
