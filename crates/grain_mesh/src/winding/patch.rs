//! Transient triangle wrapper used while resolving windings.

use crate::error::WindingError;
use crate::mesh::Triangle;

/// Outcome of comparing two windings across a shared edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindingCheck {
  /// The shared edge is traversed in opposite directions.
  Consistent,
  /// Same direction; the other patch was flipped.
  Flipped,
  /// Same direction; flipping was disabled.
  Mismatch,
}

/// Three node indices plus the grain spins on either side.
///
/// The stored order winds outward from `n_spin[0]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Patch {
  pub node_id: [u32; 3],
  pub n_spin: [i32; 2],
}

impl Patch {
  pub fn new(node_id: [u32; 3], n_spin: [i32; 2]) -> Self {
    Self { node_id, n_spin }
  }

  pub fn from_triangle(t: &Triangle) -> Self {
    Self::new(t.nodes, t.labels)
  }

  #[inline]
  pub fn has_spin(&self, label: i32) -> bool {
    self.n_spin[0] == label || self.n_spin[1] == label
  }

  /// Vertices ordered outward from `label`: stored order for the first spin,
  /// reversed for the second, `None` for any other label.
  pub fn get_winding_indices(&self, label: i32) -> Option<[u32; 3]> {
    let [a, b, c] = self.node_id;
    if label == self.n_spin[0] {
      Some([a, b, c])
    } else if label == self.n_spin[1] {
      Some([c, b, a])
    } else {
      None
    }
  }

  /// Closed cycle of [`Self::get_winding_indices`], first vertex repeated.
  pub fn winding_cycle(&self, label: i32) -> Option<[u32; 4]> {
    self
      .get_winding_indices(label)
      .map(|[a, b, c]| [a, b, c, a])
  }

  /// Reverse traversal by swapping the first and third vertex.
  #[inline]
  pub fn flip_winding(&mut self) {
    self.node_id.swap(0, 2);
  }

  /// Compare windings of `self` and `other` relative to `label` along their
  /// shared edge, flipping `other` on disagreement when `do_flip` is set.
  pub fn verify_winding(
    &self,
    other: &mut Patch,
    label: i32,
    do_flip: bool,
  ) -> Result<WindingCheck, WindingError> {
    let mine = self.winding_cycle(label).ok_or(WindingError::ForeignLabel {
      label,
      nodes: self.node_id,
    })?;
    let theirs = other.winding_cycle(label).ok_or(WindingError::ForeignLabel {
      label,
      nodes: other.node_id,
    })?;

    for m in mine.windows(2) {
      for t in theirs.windows(2) {
        if m[0] == t[1] && m[1] == t[0] {
          return Ok(WindingCheck::Consistent);
        }
        if m[0] == t[0] && m[1] == t[1] {
          if do_flip {
            other.flip_winding();
            return Ok(WindingCheck::Flipped);
          }
          return Ok(WindingCheck::Mismatch);
        }
      }
    }

    Err(WindingError::NoSharedEdge {
      first: self.node_id,
      second: other.node_id,
    })
  }
}

#[cfg(test)]
#[path = "patch_test.rs"]
mod patch_test;
