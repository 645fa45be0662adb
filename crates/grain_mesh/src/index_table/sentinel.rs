//! Flat sentinel-initialised lookup from canonical lattice key to dense index.

use crate::error::{MeshError, MeshResult};

/// Slot value meaning "no dense index assigned yet".
pub const UNASSIGNED: u32 = u32::MAX;

/// Result of looking up a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Assigned {
  pub index: u32,
  /// The index was created by this lookup.
  pub fresh: bool,
}

/// Key space sized to every possible site, with first-sight-wins assignment.
///
/// Indices are handed out in the order keys are first seen, so the scan
/// order alone decides numbering.
#[derive(Clone, Debug)]
pub struct SentinelIndex {
  slots: Vec<u32>,
  next: u32,
}

impl SentinelIndex {
  /// Allocate `len` slots, failing before any state is built if the key space
  /// cannot be addressed or allocated.
  pub fn try_new(len: usize, entity: &'static str) -> MeshResult<Self> {
    if len >= UNASSIGNED as usize {
      return Err(MeshError::Allocation { entity, count: len });
    }
    let mut slots = Vec::new();
    slots
      .try_reserve_exact(len)
      .map_err(|_| MeshError::Allocation { entity, count: len })?;
    slots.resize(len, UNASSIGNED);
    Ok(Self { slots, next: 0 })
  }

  /// Return the index stored for `key`, assigning the next one on first sight.
  #[inline]
  pub fn assign(&mut self, key: usize) -> Assigned {
    let slot = &mut self.slots[key];
    if *slot == UNASSIGNED {
      *slot = self.next;
      self.next += 1;
      Assigned {
        index: *slot,
        fresh: true,
      }
    } else {
      Assigned {
        index: *slot,
        fresh: false,
      }
    }
  }

  #[inline]
  pub fn get(&self, key: usize) -> Option<u32> {
    match self.slots.get(key) {
      Some(&UNASSIGNED) | None => None,
      Some(&index) => Some(index),
    }
  }

  /// Number of keys assigned so far.
  #[inline]
  pub fn len(&self) -> usize {
    self.next as usize
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.next == 0
  }

  /// Size of the key space.
  #[inline]
  pub fn key_space(&self) -> usize {
    self.slots.len()
  }

  /// Assigned `(key, index)` pairs in key order.
  pub fn iter_assigned(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
    self
      .slots
      .iter()
      .enumerate()
      .filter(|&(_, &slot)| slot != UNASSIGNED)
      .map(|(key, &slot)| (key, slot))
  }
}
