//! Error and warning types for the meshing core.
//!
//! Failures fall into three groups: malformed input, resource exhaustion and
//! broken internal invariants. Degenerate geometry is never an error; it is
//! counted in [`Warnings`] and the offending entity is killed.

use thiserror::Error;

use crate::pipeline::Stage;

/// Result type for meshing operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors that abort a meshing run.
#[derive(Debug, Error)]
pub enum MeshError {
  /// Label buffer does not match the declared grid dimensions.
  #[error("voxel grid {nx}x{ny}x{nz} expects {expected} labels, got {actual}")]
  GridShape {
    nx: usize,
    ny: usize,
    nz: usize,
    expected: usize,
    actual: usize,
  },

  /// Resolution component is not a finite number.
  #[error("invalid voxel resolution {0:?}")]
  InvalidResolution([f64; 3]),

  /// Entity tables for the grid cannot be allocated.
  #[error("cannot allocate {count} {entity} slots")]
  Allocation { entity: &'static str, count: usize },

  /// Winding resolution found triangles that share no edge.
  #[error(transparent)]
  Winding(#[from] WindingError),

  /// A live triangle references a killed node during compaction.
  #[error("triangle {triangle} references killed node {node}")]
  DanglingNode { triangle: u32, node: u32 },

  /// Run was cancelled before `stage` started.
  #[error("meshing cancelled before stage {stage:?}")]
  Cancelled { stage: Stage },

  /// Background worker stopped without delivering a result.
  #[error("meshing worker exited without a result")]
  WorkerLost,
}

impl MeshError {
  /// Negative status code reported to callers that expect integer codes.
  pub fn code(&self) -> i32 {
    match self {
      MeshError::Allocation { .. } => -1,
      MeshError::GridShape { .. } | MeshError::InvalidResolution(_) => -300,
      MeshError::Winding(_) => -500,
      MeshError::DanglingNode { .. } => -600,
      MeshError::WorkerLost => -800,
      MeshError::Cancelled { .. } => -900,
    }
  }

  /// Whether the error signals a defect in mesh construction itself.
  pub fn is_internal(&self) -> bool {
    matches!(self, MeshError::Winding(_) | MeshError::DanglingNode { .. })
  }
}

/// Internal-consistency failures raised while comparing triangle windings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindingError {
  /// Two triangles presumed adjacent have no vertex pair in common.
  #[error("triangles {first:?} and {second:?} share no edge")]
  NoSharedEdge { first: [u32; 3], second: [u32; 3] },

  /// Label is on neither side of a triangle being oriented.
  #[error("label {label} is not adjacent to triangle {nodes:?}")]
  ForeignLabel { label: i32, nodes: [u32; 3] },
}

/// Counters for degenerate geometry and data-quality problems.
///
/// None of these abort a run; they are logged once at the end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Warnings {
  /// Triangles killed for a repeated vertex or area below tolerance.
  pub degenerate_triangles: usize,
  /// Triangles killed because an earlier triangle has the same vertex set.
  pub duplicate_triangles: usize,
  /// Triangles killed during compaction because a vertex node was killed.
  pub dangling_triangles: usize,
  /// Live zero-area triangles skipped while integrating grain volumes.
  pub zero_area_volume_terms: usize,
  /// Edges shared by more than two triangles of the same label.
  pub non_manifold_edges: usize,
  /// Already oriented triangles that disagreed with a neighbour.
  pub winding_conflicts: usize,
  /// ANG data rows with fewer than eight readable values.
  pub short_ang_rows: usize,
  /// ANG data rows declared by the header but absent from the file.
  pub missing_ang_rows: usize,
  /// ANG data rows discarded because the header declares no columns.
  pub dropped_ang_rows: usize,
}

impl Warnings {
  pub fn total(&self) -> usize {
    self.degenerate_triangles
      + self.duplicate_triangles
      + self.dangling_triangles
      + self.zero_area_volume_terms
      + self.non_manifold_edges
      + self.winding_conflicts
      + self.short_ang_rows
      + self.missing_ang_rows
      + self.dropped_ang_rows
  }

  /// Add every counter of `other` into `self`.
  pub fn merge(&mut self, other: &Warnings) {
    self.degenerate_triangles += other.degenerate_triangles;
    self.duplicate_triangles += other.duplicate_triangles;
    self.dangling_triangles += other.dangling_triangles;
    self.zero_area_volume_terms += other.zero_area_volume_terms;
    self.non_manifold_edges += other.non_manifold_edges;
    self.winding_conflicts += other.winding_conflicts;
    self.short_ang_rows += other.short_ang_rows;
    self.missing_ang_rows += other.missing_ang_rows;
    self.dropped_ang_rows += other.dropped_ang_rows;
  }

  pub fn is_clean(&self) -> bool {
    self.total() == 0
  }

  /// Emit one log line per non-zero counter.
  pub fn log(&self) {
    let counters = [
      ("degenerate triangles", self.degenerate_triangles),
      ("duplicate triangles", self.duplicate_triangles),
      ("dangling triangles", self.dangling_triangles),
      ("zero-area volume terms", self.zero_area_volume_terms),
      ("non-manifold edges", self.non_manifold_edges),
      ("winding conflicts", self.winding_conflicts),
      ("short ANG rows", self.short_ang_rows),
      ("missing ANG rows", self.missing_ang_rows),
      ("dropped ANG rows", self.dropped_ang_rows),
    ];
    for (name, count) in counters {
      if count > 0 {
        tracing::warn!(count, "{name}");
      }
    }
  }
}
