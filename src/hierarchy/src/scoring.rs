//! Aggregate hierarchy complexity score

/// Weight per role
pub const ROLE_WEIGHT: f64 = 1.0;

/// Weight per inheritance edge
pub const RELATIONSHIP_WEIGHT: f64 = 2.0;

/// Weight applied to the squared maximum depth
pub const DEPTH_WEIGHT: f64 = 3.0;

/// Weight per finding
pub const FINDING_WEIGHT: f64 = 5.0;

/// Combine the headline counts into one non-negative score
///
/// `roles * 1 + relationships * 2 + depth^2 * 3 + findings * 5`
pub fn complexity_score(
    total_roles: usize,
    total_relationships: usize,
    max_depth: usize,
    total_findings: usize,
) -> f64 {
    let depth = max_depth as f64;

    total_roles as f64 * ROLE_WEIGHT
        + total_relationships as f64 * RELATIONSHIP_WEIGHT
        + depth * depth * DEPTH_WEIGHT
        + total_findings as f64 * FINDING_WEIGHT
}
