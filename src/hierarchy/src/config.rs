//! Analysis configuration

use crate::error::{HierarchyError, Result};
use serde::{Deserialize, Serialize};

/// Default maximum inheritance depth before a chain is flagged
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 3;

/// Default number of roles per common-permission combination
pub const DEFAULT_MIN_COMMON_ROLES: usize = 3;

/// Default minimum size of a shared permission set
pub const DEFAULT_MIN_COMMON_PERMISSIONS: usize = 5;

/// Default step budget for cycle and path enumeration
pub const DEFAULT_MAX_TRAVERSAL_STEPS: usize = 1_000_000;

/// Default budget for the common-subset combination search
pub const DEFAULT_MAX_SUBSET_EVALUATIONS: usize = 10_000_000;

/// Role hierarchy optimizer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Chains longer than this many edges are reported as deep nesting
    pub max_nesting_depth: usize,

    /// Exact number of roles in each common-subset combination
    pub min_common_roles: usize,

    /// Minimum shared items for a combination to be reported
    pub min_common_permissions: usize,

    /// Step budget shared by cycle enumeration and simple-path enumeration
    pub max_traversal_steps: usize,

    /// Search-tree node budget for the common-subset detector
    pub max_subset_evaluations: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            min_common_roles: DEFAULT_MIN_COMMON_ROLES,
            min_common_permissions: DEFAULT_MIN_COMMON_PERMISSIONS,
            max_traversal_steps: DEFAULT_MAX_TRAVERSAL_STEPS,
            max_subset_evaluations: DEFAULT_MAX_SUBSET_EVALUATIONS,
        }
    }
}

impl HierarchyConfig {
    /// Load configuration from `ROLE_HIERARCHY_*` environment variables
    ///
    /// Unset or unparseable variables keep their default value.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_nesting_depth: env_or("ROLE_HIERARCHY_MAX_NESTING_DEPTH", defaults.max_nesting_depth),
            min_common_roles: env_or("ROLE_HIERARCHY_MIN_COMMON_ROLES", defaults.min_common_roles),
            min_common_permissions: env_or(
                "ROLE_HIERARCHY_MIN_COMMON_PERMISSIONS",
                defaults.min_common_permissions,
            ),
            max_traversal_steps: env_or(
                "ROLE_HIERARCHY_MAX_TRAVERSAL_STEPS",
                defaults.max_traversal_steps,
            ),
            max_subset_evaluations: env_or(
                "ROLE_HIERARCHY_MAX_SUBSET_EVALUATIONS",
                defaults.max_subset_evaluations,
            ),
        }
    }

    /// Set the maximum nesting depth
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Set the combination size for the common-subset detector
    pub fn with_min_common_roles(mut self, roles: usize) -> Self {
        self.min_common_roles = roles;
        self
    }

    /// Set the minimum shared permission count
    pub fn with_min_common_permissions(mut self, permissions: usize) -> Self {
        self.min_common_permissions = permissions;
        self
    }

    /// Set the traversal step budget
    pub fn with_max_traversal_steps(mut self, steps: usize) -> Self {
        self.max_traversal_steps = steps;
        self
    }

    /// Set the common-subset evaluation budget
    pub fn with_max_subset_evaluations(mut self, evaluations: usize) -> Self {
        self.max_subset_evaluations = evaluations;
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `min_common_roles` is below 2
    /// - `min_common_permissions` is zero
    /// - either enumeration budget is zero
    pub fn validate(&self) -> Result<()> {
        if self.min_common_roles < 2 {
            return Err(HierarchyError::InvalidConfig(format!(
                "min_common_roles must be at least 2, got {}",
                self.min_common_roles
            )));
        }

        if self.min_common_permissions == 0 {
            return Err(HierarchyError::InvalidConfig(
                "min_common_permissions must be at least 1".to_string(),
            ));
        }

        if self.max_traversal_steps == 0 {
            return Err(HierarchyError::InvalidConfig(
                "max_traversal_steps must be positive".to_string(),
            ));
        }

        if self.max_subset_evaluations == 0 {
            return Err(HierarchyError::InvalidConfig(
                "max_subset_evaluations must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_or(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
