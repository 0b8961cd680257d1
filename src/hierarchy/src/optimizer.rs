//! Role hierarchy optimizer
//!
//! Orchestrates the graph builder and all detectors for one analysis run
//! and assembles the final, sorted [`HierarchyAnalysisResult`].
//!
//! # Architecture
//!
//! ```text
//! Init → GraphBuilt → CyclesChecked → DepthExact | DepthApprox
//!      → RedundancyChecked → SubsetsChecked → OrphansChecked → Scored → Done
//! ```
//!
//! Every stage appends to one findings list. A detector that fails (for
//! example by exhausting its enumeration budget) is recorded as incomplete
//! and the run continues; a detector whose input columns are missing is
//! recorded as skipped. Nothing in a run is fatal.

use crate::config::HierarchyConfig;
use crate::detectors::{common_subset, cycles, depth, orphans, redundancy};
use crate::error::Result;
use crate::graph::{RoleGraph, RoleGraphBuilder, StepBudget};
use crate::inputs::{HierarchyInputs, LiveRoleSet, PermissionIndex};
use crate::scoring::complexity_score;
use crate::types::{DepthMode, Finding, FindingType, HierarchyAnalysisResult};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Detector names used in `skipped_detectors` / `incomplete_detectors`
pub const CYCLE_DETECTOR: &str = "cycle_detection";
pub const DEPTH_DETECTOR: &str = "depth_analysis";
pub const REDUNDANCY_DETECTOR: &str = "redundant_inheritance";
pub const COMMON_SUBSET_DETECTOR: &str = "common_permission_subset";
pub const ORPHAN_DETECTOR: &str = "orphan_detection";

/// Stages of one analysis run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AnalysisStage {
    Init,
    GraphBuilt,
    CyclesChecked,
    DepthExact,
    DepthApprox,
    RedundancyChecked,
    SubsetsChecked,
    OrphansChecked,
    Scored,
    Done,
}

/// Mutable state of a single run; dropped when the result is returned
struct AnalysisRun {
    stage: AnalysisStage,
    findings: Vec<Finding>,
    skipped: Vec<String>,
    incomplete: Vec<String>,
}

impl AnalysisRun {
    fn new() -> Self {
        Self {
            stage: AnalysisStage::Init,
            findings: Vec::new(),
            skipped: Vec::new(),
            incomplete: Vec::new(),
        }
    }

    fn advance(&mut self, next: AnalysisStage) {
        debug_assert!(next > self.stage, "stage {:?} revisited after {:?}", next, self.stage);
        debug!("Hierarchy analysis: {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }

    /// Merge a detector's output, or record it as incomplete on error
    fn absorb(&mut self, detector: &str, outcome: Result<Vec<Finding>>) {
        match outcome {
            Ok(findings) => {
                debug!("{} produced {} findings", detector, findings.len());
                self.findings.extend(findings);
            }
            Err(e) => {
                warn!("{} did not complete: {}", detector, e);
                self.incomplete.push(detector.to_string());
            }
        }
    }

    fn skip(&mut self, detector: &str, reason: &str) {
        warn!("Skipping {}: {}", detector, reason);
        self.skipped.push(detector.to_string());
    }
}

/// Stateless analyzer for role inheritance hierarchies
///
/// Each call to [`HierarchyOptimizer::analyze`] builds its own graph from the
/// inputs and discards it afterwards; the optimizer itself only holds
/// configuration, so one instance can be shared freely.
///
/// # Example
///
/// ```rust
/// use roleaudit_hierarchy::{HierarchyInputs, HierarchyOptimizer};
///
/// let inputs = HierarchyInputs::new().with_edge("A", "A");
/// let result = HierarchyOptimizer::default().analyze(&inputs);
///
/// assert_eq!(result.total_findings, 1);
/// assert_eq!(result.findings[0].complexity_impact, 50.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HierarchyOptimizer {
    config: HierarchyConfig,
}

impl HierarchyOptimizer {
    /// Create an optimizer with a validated configuration
    pub fn new(config: HierarchyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    /// Run every detector over the inputs
    ///
    /// Never fails: missing tables skip the dependent detectors and
    /// detector errors mark the result as partial.
    pub fn analyze(&self, inputs: &HierarchyInputs) -> HierarchyAnalysisResult {
        info!(
            "Starting role hierarchy analysis: {} inheritance rows, {} role definitions",
            inputs.role_hierarchy.len(),
            inputs.role_definitions.len()
        );

        let mut run = AnalysisRun::new();

        let graph = RoleGraphBuilder::new()
            .add_inheritance(&inputs.role_hierarchy)
            .add_definitions(&inputs.role_definitions)
            .build();

        if graph.is_empty() {
            info!("No roles to analyze");
            return HierarchyAnalysisResult::empty();
        }
        run.advance(AnalysisStage::GraphBuilt);

        self.check_cycles(&graph, &mut run);
        run.advance(AnalysisStage::CyclesChecked);

        let (max_depth, depth_mode) = self.check_depth(&graph, &mut run);

        let permissions = inputs
            .security_config
            .as_deref()
            .map(PermissionIndex::build);

        match &permissions {
            Some(index) if index.supports_grants() => {
                run.absorb(REDUNDANCY_DETECTOR, Ok(redundancy::detect(&graph, index)));
            }
            Some(_) => run.skip(REDUNDANCY_DETECTOR, "AOTName or AccessLevel column missing"),
            None => run.skip(REDUNDANCY_DETECTOR, "no security configuration provided"),
        }
        run.advance(AnalysisStage::RedundancyChecked);

        match &permissions {
            Some(index) if index.supports_items() => {
                let outcome = common_subset::detect(
                    index,
                    self.config.min_common_roles,
                    self.config.min_common_permissions,
                    self.config.max_subset_evaluations,
                );
                run.absorb(COMMON_SUBSET_DETECTOR, outcome);
            }
            Some(_) => run.skip(COMMON_SUBSET_DETECTOR, "AOTName column missing"),
            None => run.skip(COMMON_SUBSET_DETECTOR, "no security configuration provided"),
        }
        run.advance(AnalysisStage::SubsetsChecked);

        match inputs.user_role_assignments.as_deref() {
            Some(rows) => {
                let live = LiveRoleSet::build(rows);
                debug!("{} roles have live assignments", live.len());
                run.absorb(ORPHAN_DETECTOR, Ok(orphans::detect(&graph, &live)));
            }
            None => run.skip(ORPHAN_DETECTOR, "no user role assignments provided"),
        }
        run.advance(AnalysisStage::OrphansChecked);

        let findings = finalize_findings(std::mem::take(&mut run.findings));
        let total_roles = graph.node_count();
        let total_relationships = graph.edge_count();
        let score = complexity_score(total_roles, total_relationships, max_depth, findings.len());
        run.advance(AnalysisStage::Scored);

        let result = HierarchyAnalysisResult {
            total_findings: findings.len(),
            findings,
            complexity_score: score,
            total_roles_analyzed: total_roles,
            max_depth,
            total_inheritance_relationships: total_relationships,
            depth_mode,
            skipped_detectors: std::mem::take(&mut run.skipped),
            incomplete_detectors: std::mem::take(&mut run.incomplete),
            ..HierarchyAnalysisResult::empty()
        };
        run.advance(AnalysisStage::Done);

        info!(
            "Role hierarchy analysis complete: {} roles, {} relationships, depth {}, {} findings, score {:.1}",
            result.total_roles_analyzed,
            result.total_inheritance_relationships,
            result.max_depth,
            result.total_findings,
            result.complexity_score
        );
        debug!("Findings by severity: {:?}", result.severity_counts());

        result
    }

    fn check_cycles(&self, graph: &RoleGraph, run: &mut AnalysisRun) {
        run.findings.extend(cycles::detect_self_loops(graph));

        let mut budget = StepBudget::new("cycle enumeration", self.config.max_traversal_steps);
        run.absorb(CYCLE_DETECTOR, cycles::detect_cycles(graph, &mut budget));
    }

    /// Exact depth on a cycle-free graph, approximate otherwise
    ///
    /// Cyclicity is decided by a topological sort rather than by the cycle
    /// findings, so a cycle enumeration that ran out of budget still gates
    /// the approximate mode.
    fn check_depth(&self, graph: &RoleGraph, run: &mut AnalysisRun) -> (usize, DepthMode) {
        if graph.is_cyclic() {
            let report = depth::analyze_approximate(graph);
            run.advance(AnalysisStage::DepthApprox);
            return (report.max_depth, report.mode);
        }

        let mut budget = StepBudget::new("deep chain enumeration", self.config.max_traversal_steps);
        let max_depth = match depth::analyze_exact(graph, self.config.max_nesting_depth, &mut budget) {
            Ok(report) => {
                let max_depth = report.max_depth;
                run.absorb(DEPTH_DETECTOR, Ok(report.findings));
                max_depth
            }
            Err(e) => {
                run.absorb(DEPTH_DETECTOR, Err(e));
                depth::exact_max_depth(graph)
            }
        };
        run.advance(AnalysisStage::DepthExact);

        (max_depth, DepthMode::Exact)
    }
}

/// Drop duplicate `(finding_type, affected_roles)` entries, then order by
/// severity and, within a severity, by impact (highest first)
pub fn finalize_findings(findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen: HashSet<(FindingType, Vec<String>)> = HashSet::new();
    let mut unique: Vec<Finding> = findings
        .into_iter()
        .filter(|f| seen.insert((f.finding_type, f.affected_roles.clone())))
        .collect();

    unique.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then_with(|| b.complexity_impact.total_cmp(&a.complexity_impact))
    });

    unique
}

/// Analyze with an ad-hoc configuration
pub fn analyze_hierarchy(
    inputs: &HierarchyInputs,
    config: HierarchyConfig,
) -> Result<HierarchyAnalysisResult> {
    Ok(HierarchyOptimizer::new(config)?.analyze(inputs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn finding(severity: Severity, impact: f64, role: &str) -> Finding {
        Finding::new(FindingType::OrphanedRole, severity, vec![role.to_string()], impact)
    }

    #[test]
    fn test_finalize_sorts_and_dedups() {
        let findings = vec![
            finding(Severity::Low, 1.0, "a"),
            finding(Severity::Critical, 50.0, "b"),
            finding(Severity::Medium, 2.0, "c"),
            finding(Severity::Medium, 9.0, "d"),
            finding(Severity::Low, 1.0, "a"),
        ];
        let sorted = finalize_findings(findings);

        let roles: Vec<&str> = sorted.iter().map(|f| f.affected_roles[0].as_str()).collect();
        assert_eq!(roles, vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = HierarchyConfig::default().with_min_common_roles(0);
        assert!(HierarchyOptimizer::new(config).is_err());
    }

    #[test]
    fn test_empty_inputs() {
        let result = HierarchyOptimizer::default().analyze(&HierarchyInputs::new());

        assert_eq!(result.total_roles_analyzed, 0);
        assert_eq!(result.complexity_score, 0.0);
        assert!(result.findings.is_empty());
        assert!(result.skipped_detectors.is_empty());
    }

    #[test]
    fn test_stage_order() {
        assert!(AnalysisStage::Init < AnalysisStage::GraphBuilt);
        assert!(AnalysisStage::CyclesChecked < AnalysisStage::DepthExact);
        assert!(AnalysisStage::DepthApprox < AnalysisStage::RedundancyChecked);
        assert!(AnalysisStage::Scored < AnalysisStage::Done);
    }
}
