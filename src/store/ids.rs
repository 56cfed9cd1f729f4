//! ID assignment
//!
//! New ids are one greater than the numeric maximum id in the
//! collection, or 0 for an empty collection. The scan does not reorder
//! the collection.

use std::collections::BTreeSet;

use crate::entity::Entity;
use crate::error::{Result, StoreError};

/// Id to assign to the next created entity
///
/// Entities without a valid id are skipped. Ids freed by deletes below
/// the current maximum are not reused. Fails with `IdsExhausted` once
/// `u64::MAX` is taken.
pub fn next_id(entities: &[Entity]) -> Result<u64> {
    match entities.iter().filter_map(Entity::id).max() {
        None => Ok(0),
        Some(max) => max.checked_add(1).ok_or(StoreError::IdsExhausted),
    }
}

/// Position of the entity with the given id
pub fn position_of(entities: &[Entity], id: u64) -> Option<usize> {
    entities.iter().position(|e| e.id() == Some(id))
}

/// Ids carried by more than one entity, ascending
pub fn duplicate_ids(entities: &[Entity]) -> Vec<u64> {
    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for id in entities.iter().filter_map(Entity::id) {
        if !seen.insert(id) {
            duplicates.insert(id);
        }
    }
    duplicates.into_iter().collect()
}
