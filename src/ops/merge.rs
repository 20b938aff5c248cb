//! Merging a regenerated manifest into the one already on disk.

use crate::core::header::union_clauses;
use crate::core::instructions::{MergeDirective, MergeInstructions};
use crate::core::manifest::Manifest;

/// Merge `fresh` into `existing` under `instructions`.
///
/// Headers no rule matches take the fresh value; headers only present on
/// disk survive only when a rule matches them. The result follows the fresh
/// manifest's order, then matched on-disk-only headers in their order.
pub fn merge_manifests(
    instructions: &MergeInstructions,
    existing: &Manifest,
    fresh: &Manifest,
) -> Manifest {
    let mut merged = Manifest::new();

    for (name, fresh_value) in fresh.iter() {
        let value = match (instructions.decision(name), existing.get(name)) {
            (None, _) | (Some(_), None) => fresh_value.to_string(),
            (Some(MergeDirective::Keep), Some(old)) => old.to_string(),
            (Some(MergeDirective::Replace), Some(_)) => fresh_value.to_string(),
            (Some(MergeDirective::Union), Some(old)) => union_clauses(old, fresh_value),
        };
        merged.insert(name, value);
    }

    for (name, old) in existing.iter() {
        if fresh.contains(name) || instructions.decision(name).is_none() {
            continue;
        }
        merged.insert(name, old);
    }

    merged
}
