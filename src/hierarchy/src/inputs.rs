//! Tabular inputs and the lookup indexes derived from them
//!
//! Row structs keep the column names of the upstream extracts so they can be
//! deserialized straight from the ingestion layer's JSON.

use crate::error::Result;
use crate::types::RoleType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// One `parent_role -> child_role` inheritance row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritanceRow {
    pub parent_role: String,
    pub child_role: String,
}

impl InheritanceRow {
    pub fn new(parent_role: impl Into<String>, child_role: impl Into<String>) -> Self {
        Self {
            parent_role: parent_role.into(),
            child_role: child_role.into(),
        }
    }
}

/// One role definition row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinitionRow {
    #[serde(default)]
    pub role_id: String,
    pub role_name: String,
    #[serde(default)]
    pub role_type: RoleType,
}

impl RoleDefinitionRow {
    pub fn new(role_name: impl Into<String>, role_type: RoleType) -> Self {
        let role_name = role_name.into();
        Self {
            role_id: role_name.clone(),
            role_name,
            role_type,
        }
    }
}

/// One permission row of the security configuration extract
///
/// Every column except the role is optional; a column missing from the whole
/// table disables the detectors that depend on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfigRow {
    #[serde(rename = "securityrole")]
    pub security_role: String,

    #[serde(rename = "AOTName", default)]
    pub aot_name: Option<String>,

    #[serde(rename = "AccessLevel", default)]
    pub access_level: Option<String>,

    #[serde(rename = "LicenseType", default)]
    pub license_type: Option<String>,

    #[serde(rename = "Priority", default)]
    pub priority: Option<i64>,
}

impl SecurityConfigRow {
    /// Create a fully populated permission row
    pub fn new(
        security_role: impl Into<String>,
        aot_name: impl Into<String>,
        access_level: impl Into<String>,
    ) -> Self {
        Self {
            security_role: security_role.into(),
            aot_name: Some(aot_name.into()),
            access_level: Some(access_level.into()),
            license_type: None,
            priority: None,
        }
    }

    /// Set the license tier
    pub fn with_license_type(mut self, license_type: impl Into<String>) -> Self {
        self.license_type = Some(license_type.into());
        self
    }
}

/// One user-to-role assignment row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleAssignmentRow {
    pub user_id: String,
    pub role_name: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl UserRoleAssignmentRow {
    /// Create an active assignment
    pub fn new(user_id: impl Into<String>, role_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role_name: role_name.into(),
            status: Some("Active".to_string()),
        }
    }

    /// Override the status column
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Absent, blank, or `Active` (any case) counts as live usage
    pub fn is_live(&self) -> bool {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(status) => status.eq_ignore_ascii_case("active"),
        }
    }
}

/// The four tables one analysis consumes
///
/// `None` for the optional tables means the extract was not provided at all,
/// which is different from an empty table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyInputs {
    pub role_hierarchy: Vec<InheritanceRow>,
    pub role_definitions: Vec<RoleDefinitionRow>,
    pub security_config: Option<Vec<SecurityConfigRow>>,
    pub user_role_assignments: Option<Vec<UserRoleAssignmentRow>>,
}

impl HierarchyInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserialize all tables from one JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add an inheritance edge
    pub fn with_edge(mut self, parent: impl Into<String>, child: impl Into<String>) -> Self {
        self.role_hierarchy.push(InheritanceRow::new(parent, child));
        self
    }

    /// Add a role definition
    pub fn with_role(mut self, name: impl Into<String>, role_type: RoleType) -> Self {
        self.role_definitions.push(RoleDefinitionRow::new(name, role_type));
        self
    }

    /// Add a permission row (creates the table if absent)
    pub fn with_permission(
        mut self,
        role: impl Into<String>,
        item: impl Into<String>,
        access_level: impl Into<String>,
    ) -> Self {
        self.security_config
            .get_or_insert_with(Vec::new)
            .push(SecurityConfigRow::new(role, item, access_level));
        self
    }

    /// Add an active user assignment (creates the table if absent)
    pub fn with_assignment(mut self, user: impl Into<String>, role: impl Into<String>) -> Self {
        self.user_role_assignments
            .get_or_insert_with(Vec::new)
            .push(UserRoleAssignmentRow::new(user, role));
        self
    }

    /// Mark the assignment table as present even if it has no rows
    pub fn with_empty_assignments(mut self) -> Self {
        self.user_role_assignments.get_or_insert_with(Vec::new);
        self
    }
}

/// A directly declared permission: (item identifier, access level)
pub type Permission = (String, String);

/// Per-role direct permission sets built from the security configuration
#[derive(Debug, Clone, Default)]
pub struct PermissionIndex {
    /// role -> {(item, access level)}
    grants: BTreeMap<String, BTreeSet<Permission>>,

    /// role -> {item}
    items: BTreeMap<String, BTreeSet<String>>,

    /// Whether any row carried an `AOTName`
    has_item_column: bool,

    /// Whether any row carried an `AccessLevel`
    has_access_column: bool,
}

impl PermissionIndex {
    /// Build the index from permission rows
    pub fn build(rows: &[SecurityConfigRow]) -> Self {
        let mut index = Self::default();
        let mut skipped = 0usize;

        for row in rows {
            let role = row.security_role.trim();
            let item = row.aot_name.as_deref().map(str::trim);
            let access = row.access_level.as_deref().map(str::trim);

            index.has_item_column |= item.is_some();
            index.has_access_column |= access.is_some();

            let item = match item {
                Some(item) if !item.is_empty() && !role.is_empty() => item,
                _ => {
                    skipped += 1;
                    continue;
                }
            };

            index
                .items
                .entry(role.to_string())
                .or_default()
                .insert(item.to_string());

            if let Some(access) = access {
                index
                    .grants
                    .entry(role.to_string())
                    .or_default()
                    .insert((item.to_string(), access.to_string()));
            }
        }

        if skipped > 0 {
            debug!("Ignored {} permission rows without role or item", skipped);
        }

        index
    }

    /// True when permission items are available (common-subset detector)
    pub fn supports_items(&self) -> bool {
        self.has_item_column
    }

    /// True when (item, access level) pairs are available (redundancy detector)
    pub fn supports_grants(&self) -> bool {
        self.has_item_column && self.has_access_column
    }

    /// Direct (item, access level) pairs of a role
    pub fn grants(&self, role: &str) -> Option<&BTreeSet<Permission>> {
        self.grants.get(role)
    }

    /// Direct item identifiers of a role
    pub fn items(&self, role: &str) -> Option<&BTreeSet<String>> {
        self.items.get(role)
    }

    /// Roles that declare at least one item, in name order
    pub fn roles_with_items(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.items
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(role, items)| (role.as_str(), items))
    }
}

/// Names of roles with at least one live user assignment
#[derive(Debug, Clone, Default)]
pub struct LiveRoleSet {
    roles: HashSet<String>,
}

impl LiveRoleSet {
    /// Collect live roles from assignment rows
    pub fn build(rows: &[UserRoleAssignmentRow]) -> Self {
        let roles = rows
            .iter()
            .filter(|row| row.is_live())
            .map(|row| row.role_name.trim())
            .filter(|role| !role.is_empty())
            .map(str::to_string)
            .collect();

        Self { roles }
    }

    pub fn contains(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_index() {
        let rows = vec![
            SecurityConfigRow::new("Mgr", "CustTable", "Write"),
            SecurityConfigRow::new("Mgr", "CustTable", "Read"),
            SecurityConfigRow::new(" Mgr ", " VendTable ", "Read"),
            SecurityConfigRow::new("", "Orphan", "Read"),
        ];
        let index = PermissionIndex::build(&rows);

        assert!(index.supports_items());
        assert!(index.supports_grants());
        assert_eq!(index.grants("Mgr").unwrap().len(), 3);
        assert_eq!(index.items("Mgr").unwrap().len(), 2);
        assert!(index.items("").is_none());
    }

    #[test]
    fn test_missing_access_column() {
        let rows = vec![SecurityConfigRow {
            security_role: "Clerk".to_string(),
            aot_name: Some("LedgerJournal".to_string()),
            access_level: None,
            license_type: None,
            priority: None,
        }];
        let index = PermissionIndex::build(&rows);

        assert!(index.supports_items());
        assert!(!index.supports_grants());
        assert!(index.grants("Clerk").is_none());
    }

    #[test]
    fn test_column_names() {
        let json = r#"{"securityrole": "Clerk", "AOTName": "CustTable", "AccessLevel": "Read",
                       "LicenseType": "Operations", "Priority": 3}"#;
        let row: SecurityConfigRow = serde_json::from_str(json).unwrap();

        assert_eq!(row.security_role, "Clerk");
        assert_eq!(row.license_type.as_deref(), Some("Operations"));
        assert_eq!(row.priority, Some(3));
    }

    #[test]
    fn test_live_assignments() {
        let rows = vec![
            UserRoleAssignmentRow::new("u1", "Clerk"),
            UserRoleAssignmentRow::new("u2", "Mgr").with_status("Disabled"),
            UserRoleAssignmentRow::new("u3", "Auditor").with_status("ACTIVE"),
            UserRoleAssignmentRow {
                user_id: "u4".to_string(),
                role_name: "Viewer".to_string(),
                status: None,
            },
        ];
        let live = LiveRoleSet::build(&rows);

        assert!(live.contains("Clerk"));
        assert!(!live.contains("Mgr"));
        assert!(live.contains("Auditor"));
        assert!(live.contains("Viewer"));
        assert_eq!(live.len(), 3);
    }

    #[test]
    fn test_inputs_from_json() {
        let json = r#"{
            "role_hierarchy": [{"parent_role": "A", "child_role": "B"}],
            "role_definitions": [{"role_id": "1", "role_name": "C", "role_type": "Standard"}]
        }"#;
        let inputs = HierarchyInputs::from_json(json).unwrap();

        assert_eq!(inputs.role_hierarchy.len(), 1);
        assert_eq!(inputs.role_definitions[0].role_type, RoleType::Standard);
        assert!(inputs.security_config.is_none());
        assert!(inputs.user_role_assignments.is_none());
    }
}
