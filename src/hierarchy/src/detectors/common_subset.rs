//! Common permission subset detection
//!
//! Looks at every combination of exactly `min_common_roles` roles that
//! declare permissions and reports the ones whose shared item set has at
//! least `min_common_permissions` entries. Such groups usually indicate a
//! missing base role.
//!
//! The search is exhaustive over C(n, k) combinations. Combinations are
//! grown one role at a time in name order, and a partial combination whose
//! shared set is already too small is not extended: adding roles can only
//! shrink an intersection, so the result is the same as checking every
//! combination.

use crate::error::Result;
use crate::graph::StepBudget;
use crate::inputs::PermissionIndex;
use crate::types::{Finding, FindingType, Severity};
use std::collections::BTreeSet;
use tracing::debug;

/// Impact per shared item
pub const SHARED_ITEM_IMPACT: f64 = 0.5;

/// Number of shared items quoted in a finding description
const DESCRIPTION_SAMPLE: usize = 5;

/// A qualifying combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonSubset {
    pub roles: Vec<String>,
    pub shared_items: BTreeSet<String>,
}

struct SubsetSearch<'a> {
    roles: Vec<(&'a str, &'a BTreeSet<String>)>,
    size: usize,
    min_shared: usize,
    budget: StepBudget,
    hits: Vec<CommonSubset>,
}

impl<'a> SubsetSearch<'a> {
    fn extend(&mut self, start: usize, chosen: &mut Vec<&'a str>, shared: &BTreeSet<&'a str>) -> Result<()> {
        if chosen.len() == self.size {
            self.hits.push(CommonSubset {
                roles: chosen.iter().map(|r| r.to_string()).collect(),
                shared_items: shared.iter().map(|i| i.to_string()).collect(),
            });
            return Ok(());
        }

        let remaining = self.size - chosen.len();
        let last_start = self.roles.len() - remaining;

        for index in start..=last_start {
            self.budget.tick()?;

            let (role, items) = self.roles[index];
            let narrowed: BTreeSet<&'a str> = if chosen.is_empty() {
                items.iter().map(String::as_str).collect()
            } else {
                shared
                    .iter()
                    .copied()
                    .filter(|item| items.contains(*item))
                    .collect()
            };

            if narrowed.len() < self.min_shared {
                continue;
            }

            chosen.push(role);
            self.extend(index + 1, chosen, &narrowed)?;
            chosen.pop();
        }

        Ok(())
    }
}

/// Every combination of `size` roles sharing at least `min_shared` items
///
/// # Errors
///
/// Returns `EnumerationBudgetExceeded` if the search visits more than
/// `max_evaluations` partial combinations.
pub fn find_common_subsets(
    permissions: &PermissionIndex,
    size: usize,
    min_shared: usize,
    max_evaluations: usize,
) -> Result<Vec<CommonSubset>> {
    let roles: Vec<_> = permissions.roles_with_items().collect();
    if size == 0 || roles.len() < size {
        return Ok(Vec::new());
    }

    let mut search = SubsetSearch {
        roles,
        size,
        min_shared,
        budget: StepBudget::new("common subset search", max_evaluations),
        hits: Vec::new(),
    };

    search.extend(0, &mut Vec::with_capacity(size), &BTreeSet::new())?;

    debug!(
        "Common subset search: {} hits, {} evaluations",
        search.hits.len(),
        search.budget.used()
    );
    Ok(search.hits)
}

/// One MEDIUM finding per qualifying combination
pub fn detect(
    permissions: &PermissionIndex,
    size: usize,
    min_shared: usize,
    max_evaluations: usize,
) -> Result<Vec<Finding>> {
    let subsets = find_common_subsets(permissions, size, min_shared, max_evaluations)?;

    Ok(subsets.into_iter().map(subset_finding).collect())
}

fn subset_finding(subset: CommonSubset) -> Finding {
    let shared = subset.shared_items.len();
    let sample: Vec<&str> = subset
        .shared_items
        .iter()
        .take(DESCRIPTION_SAMPLE)
        .map(String::as_str)
        .collect();
    let more = if shared > DESCRIPTION_SAMPLE { ", ..." } else { "" };

    let description = format!(
        "Roles {} share {} permission items ({}{})",
        subset.roles.join(", "),
        shared,
        sample.join(", "),
        more
    );

    Finding::new(
        FindingType::CommonPermissionSubset,
        Severity::Medium,
        subset.roles,
        shared as f64 * SHARED_ITEM_IMPACT,
    )
    .with_description(description)
    .with_recommendation(format!(
        "Extract the {} shared permissions into a base role and let these roles inherit from it",
        shared
    ))
}
