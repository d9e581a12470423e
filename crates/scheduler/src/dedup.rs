//! Ancestor deduplication
//!
//! The root of a configured entry is always snapshotted recursively. Each
//! remaining descendant is scheduled on its own unless another descendant is
//! both its structural ancestor and independently configured: that
//! ancestor's own recursive run already stamps it.

use rznap_core::{Dataset, RetentionPolicy};

/// True if some other descendant is a configured ancestor of `descendant`.
///
/// `descendants` must not contain the root. Any configured entry counts,
/// whether or not its `snap` flag is set.
pub fn has_configured_ancestor(
    descendant: &Dataset,
    descendants: &[Dataset],
    policies: &[RetentionPolicy],
) -> bool {
    descendants.iter().any(|candidate| {
        candidate != descendant
            && candidate.is_ancestor_of(descendant)
            && is_configured(candidate, policies)
    })
}

/// Descendants to schedule individually, in discovery order
pub fn select_targets<'a>(
    descendants: &'a [Dataset],
    policies: &[RetentionPolicy],
) -> Vec<&'a Dataset> {
    descendants
        .iter()
        .filter(|d| !has_configured_ancestor(d, descendants, policies))
        .collect()
}

fn is_configured(dataset: &Dataset, policies: &[RetentionPolicy]) -> bool {
    let identity = dataset.canonical_identity();
    policies.iter().any(|p| p.name == identity)
}
