//! # Role Hierarchy Optimizer
//!
//! Structural analysis of security-role inheritance for cost and security
//! optimization audits.
//!
//! ## Features
//!
//! - **Graph Builder**: role inheritance rows and role definitions become a
//!   directed adjacency-map graph, isolated roles included
//! - **Cycle Detection**: self-loops and every elementary multi-role cycle
//! - **Depth Analysis**: BFS-based inheritance depth with maximal over-long
//!   chain reporting, or an approximation when cycles exist
//! - **Redundant Inheritance**: children re-declaring all parent grants
//! - **Common Permission Subsets**: role groups that should share a base role
//! - **Orphaned Branches**: unused roles and maximal unused subtrees
//! - **Complexity Score**: one scalar combining size, depth and findings
//!
//! Each analysis is a pure function of its inputs and configuration: the
//! graph is rebuilt per call and nothing is cached between calls.
//!
//! ## Example
//!
//! ```rust
//! use roleaudit_hierarchy::{FindingType, HierarchyConfig, HierarchyInputs, HierarchyOptimizer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let inputs = HierarchyInputs::new()
//!     .with_edge("A", "B")
//!     .with_edge("B", "C")
//!     .with_edge("C", "D")
//!     .with_edge("D", "E");
//!
//! let optimizer = HierarchyOptimizer::new(HierarchyConfig::default())?;
//! let result = optimizer.analyze(&inputs);
//!
//! let deep = result.findings_of(FindingType::DeepNesting);
//! assert_eq!(deep.len(), 1);
//! assert_eq!(deep[0].complexity_impact, 25.0);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod detectors;
pub mod error;
pub mod graph;
pub mod inputs;
pub mod optimizer;
pub mod scoring;
pub mod types;

pub use config::HierarchyConfig;
pub use error::{HierarchyError, Result};
pub use graph::{RoleGraph, RoleGraphBuilder};
pub use inputs::{
    HierarchyInputs, InheritanceRow, RoleDefinitionRow, SecurityConfigRow, UserRoleAssignmentRow,
};
pub use optimizer::{analyze_hierarchy, AnalysisStage, HierarchyOptimizer};
pub use types::{
    DepthMode, Finding, FindingType, HierarchyAnalysisResult, RoleNode, RoleType, Severity,
    ALGORITHM_ID,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
