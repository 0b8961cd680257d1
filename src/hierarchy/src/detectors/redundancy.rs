//! Redundant inheritance detection
//!
//! An edge `parent -> child` is redundant when the child directly declares
//! every (item, access level) pair the parent grants, so the inheritance
//! contributes nothing. Only direct permissions are compared; grandparents
//! are not considered.

use crate::graph::RoleGraph;
use crate::inputs::PermissionIndex;
use crate::types::{Finding, FindingType, Severity};

/// Impact per duplicated permission
pub const REDUNDANT_IMPACT_PER_PERMISSION: f64 = 1.0;

/// One MEDIUM finding per redundant edge
///
/// Self-loops are skipped (they are cycle findings), as are edges where
/// either role declares no permissions.
pub fn detect(graph: &RoleGraph, permissions: &PermissionIndex) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (parent, child) in graph.edges() {
        if parent == child {
            continue;
        }

        let (Some(parent_grants), Some(child_grants)) =
            (permissions.grants(parent), permissions.grants(child))
        else {
            continue;
        };

        if parent_grants.is_empty() || child_grants.is_empty() {
            continue;
        }

        let overlap = parent_grants.intersection(child_grants).count();
        if overlap != parent_grants.len() {
            continue;
        }

        findings.push(
            Finding::new(
                FindingType::RedundantInheritance,
                Severity::Medium,
                vec![parent.to_string(), child.to_string()],
                overlap as f64 * REDUNDANT_IMPACT_PER_PERMISSION,
            )
            .with_description(format!(
                "Role '{}' re-declares all {} permissions it inherits from '{}'",
                child, overlap, parent
            ))
            .with_recommendation(format!(
                "Remove the duplicated permissions from '{}' or drop its inheritance from '{}'",
                child, parent
            )),
        );
    }

    findings
}
