//! Core hierarchy analysis types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Identifier stamped on every result for correlation with sibling analyses
pub const ALGORITHM_ID: &str = "6.4";

/// Role kind as declared in the role definitions table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoleType {
    /// Tenant-defined role
    #[default]
    Custom,
    /// Vendor-shipped role
    Standard,
}

/// Node of the inheritance graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleNode {
    /// Role name (unique key)
    pub name: String,

    /// Declared role type; roles only seen on edges default to `Custom`
    pub role_type: RoleType,
}

impl RoleNode {
    /// Create a new role node
    pub fn new(name: impl Into<String>, role_type: RoleType) -> Self {
        Self {
            name: name.into(),
            role_type,
        }
    }
}

/// Finding severity
///
/// Ordered from most to least severe, so `Ord` matches the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Sort rank (CRITICAL=0 .. LOW=3)
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        };
        f.write_str(label)
    }
}

/// Kind of structural problem a finding reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    CircularDependencySelf,
    CircularDependencyCycle,
    DeepNesting,
    RedundantInheritance,
    CommonPermissionSubset,
    OrphanedRole,
    OrphanedBranch,
}

impl FindingType {
    /// Wire name of the finding type
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CircularDependencySelf => "circular_dependency_self",
            Self::CircularDependencyCycle => "circular_dependency_cycle",
            Self::DeepNesting => "deep_nesting",
            Self::RedundantInheritance => "redundant_inheritance",
            Self::CommonPermissionSubset => "common_permission_subset",
            Self::OrphanedRole => "orphaned_role",
            Self::OrphanedBranch => "orphaned_branch",
        }
    }

    /// True for both self-loop and multi-node cycle findings
    pub fn is_cycle(self) -> bool {
        matches!(self, Self::CircularDependencySelf | Self::CircularDependencyCycle)
    }
}

impl fmt::Display for FindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single optimization or security finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// What kind of problem this is
    pub finding_type: FindingType,

    /// How urgent it is
    pub severity: Severity,

    /// Human-readable description
    pub description: String,

    /// Suggested remediation
    pub recommendation: String,

    /// Roles involved, in a meaningful order (cycle order, chain order, ...)
    pub affected_roles: Vec<String>,

    /// Contribution to the aggregate complexity (non-negative)
    pub complexity_impact: f64,
}

impl Finding {
    /// Create a new finding
    pub fn new(
        finding_type: FindingType,
        severity: Severity,
        affected_roles: Vec<String>,
        complexity_impact: f64,
    ) -> Self {
        Self {
            finding_type,
            severity,
            description: String::new(),
            recommendation: String::new(),
            affected_roles,
            complexity_impact: complexity_impact.max(0.0),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the recommendation
    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }
}

/// How `max_depth` was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthMode {
    /// Root-based BFS on a cycle-free graph; deep chains were searched
    #[default]
    Exact,
    /// Per-node BFS on a cyclic graph; no deep-nesting findings
    Approximate,
}

/// Complete output of one hierarchy analysis
///
/// Everything except `analysis_id` and `generated_at` is a pure function of
/// the inputs and configuration. Those two fields stamp the individual run
/// and differ between otherwise identical calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyAnalysisResult {
    /// Always [`ALGORITHM_ID`]
    pub algorithm_id: String,

    /// Unique identifier of this analysis run (fresh per call)
    pub analysis_id: Uuid,

    /// When the result was produced (wall clock, fresh per call)
    pub generated_at: DateTime<Utc>,

    /// Findings sorted by severity, then by impact (descending)
    pub findings: Vec<Finding>,

    /// Aggregate complexity score (always >= 0)
    pub complexity_score: f64,

    /// Number of role nodes in the graph
    pub total_roles_analyzed: usize,

    /// Maximum inheritance depth in edges
    pub max_depth: usize,

    /// Number of distinct inheritance edges
    pub total_inheritance_relationships: usize,

    /// Equal to `findings.len()`
    pub total_findings: usize,

    /// Whether depth came from the exact or the approximate algorithm
    #[serde(default)]
    pub depth_mode: DepthMode,

    /// Detectors not run because their input columns were missing
    #[serde(default)]
    pub skipped_detectors: Vec<String>,

    /// Detectors that failed or ran out of budget
    #[serde(default)]
    pub incomplete_detectors: Vec<String>,
}

impl HierarchyAnalysisResult {
    /// Zero-count result for an empty hierarchy
    pub fn empty() -> Self {
        Self {
            algorithm_id: ALGORITHM_ID.to_string(),
            analysis_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            findings: Vec::new(),
            complexity_score: 0.0,
            total_roles_analyzed: 0,
            max_depth: 0,
            total_inheritance_relationships: 0,
            total_findings: 0,
            depth_mode: DepthMode::Exact,
            skipped_detectors: Vec::new(),
            incomplete_detectors: Vec::new(),
        }
    }

    /// True when at least one detector could not finish
    pub fn is_partial(&self) -> bool {
        !self.incomplete_detectors.is_empty()
    }

    /// All findings of one type, in report order
    pub fn findings_of(&self, finding_type: FindingType) -> Vec<&Finding> {
        self.findings
            .iter()
            .filter(|f| f.finding_type == finding_type)
            .collect()
    }

    /// Finding count per severity
    pub fn severity_counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for finding in &self.findings {
            *counts.entry(finding.severity).or_insert(0) += 1;
        }
        counts
    }

    /// Serialize to compact JSON
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Critical < Severity::High);
        assert!(Severity::High < Severity::Medium);
        assert!(Severity::Medium < Severity::Low);
        assert_eq!(Severity::Low.rank(), 3);
    }

    #[test]
    fn test_wire_names() {
        let finding = Finding::new(
            FindingType::CircularDependencySelf,
            Severity::Critical,
            vec!["A".to_string()],
            50.0,
        );
        let json = serde_json::to_value(&finding).unwrap();

        assert_eq!(json["finding_type"], "circular_dependency_self");
        assert_eq!(json["severity"], "CRITICAL");
        assert_eq!(FindingType::OrphanedBranch.to_string(), "orphaned_branch");
    }

    #[test]
    fn test_negative_impact_is_clamped() {
        let finding = Finding::new(FindingType::OrphanedRole, Severity::Low, vec![], -3.0);
        assert_eq!(finding.complexity_impact, 0.0);
    }

    #[test]
    fn test_severity_counts() {
        let mut result = HierarchyAnalysisResult::empty();
        result.findings = vec![
            Finding::new(FindingType::CircularDependencySelf, Severity::Critical, vec![], 50.0),
            Finding::new(FindingType::OrphanedRole, Severity::Low, vec![], 1.0),
            Finding::new(FindingType::OrphanedBranch, Severity::Low, vec![], 2.0),
        ];
        let counts = result.severity_counts();

        assert_eq!(counts[&Severity::Critical], 1);
        assert_eq!(counts[&Severity::Low], 2);
        assert!(!counts.contains_key(&Severity::High));
    }

    #[test]
    fn test_empty_result() {
        let result = HierarchyAnalysisResult::empty();
        assert_eq!(result.algorithm_id, "6.4");
        assert_eq!(result.total_findings, 0);
        assert!(!result.is_partial());
        assert!(result.severity_counts().is_empty());
    }
}
