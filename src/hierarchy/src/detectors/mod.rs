//! Structural detectors for the role inheritance graph
//!
//! Each submodule inspects one aspect of the hierarchy and produces
//! [`Finding`](crate::types::Finding)s:
//!
//! - **cycles**: self-loops and multi-role inheritance cycles
//! - **depth**: maximum inheritance depth and over-long chains
//! - **redundancy**: child roles re-declaring all of a parent's grants
//! - **common_subset**: role groups sharing a large permission set
//! - **orphans**: roles and branches nobody is assigned to
//!
//! Detectors are independent of each other; the orchestrator in
//! [`optimizer`](crate::optimizer) decides what runs and merges the output.

pub mod common_subset;
pub mod cycles;
pub mod depth;
pub mod orphans;
pub mod redundancy;
