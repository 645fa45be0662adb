//! Core data types: the labelled voxel grid and run configuration.

use std::collections::BTreeMap;

use glam::DVec3;

use crate::constants::{LatticeDims, BACKGROUND_LABEL};
use crate::error::{MeshError, MeshResult};

/// Dense grid of grain labels with physical spacing.
///
/// Labels are stored X fastest (see [`LatticeDims::voxel_index`]). Label `0`
/// is background; every other value identifies a grain.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid {
  dims: LatticeDims,
  resolution: DVec3,
  origin: DVec3,
  labels: Vec<i32>,
}

impl VoxelGrid {
  /// Wrap a label buffer, checking it matches the dimensions.
  pub fn new(dims: LatticeDims, resolution: DVec3, labels: Vec<i32>) -> MeshResult<Self> {
    let expected = dims.voxel_count().ok_or(MeshError::Allocation {
      entity: "voxel",
      count: usize::MAX,
    })?;
    if labels.len() != expected {
      return Err(MeshError::GridShape {
        nx: dims.nx,
        ny: dims.ny,
        nz: dims.nz,
        expected,
        actual: labels.len(),
      });
    }
    if !resolution.is_finite() {
      return Err(MeshError::InvalidResolution(resolution.to_array()));
    }
    Ok(Self {
      dims,
      resolution,
      origin: DVec3::ZERO,
      labels,
    })
  }

  /// Grid of unit voxels, mostly for tests and benchmarks.
  pub fn from_labels(nx: usize, ny: usize, nz: usize, labels: Vec<i32>) -> MeshResult<Self> {
    Self::new(LatticeDims::new(nx, ny, nz), DVec3::ONE, labels)
  }

  /// Grid filled with a single label.
  pub fn filled(dims: LatticeDims, resolution: DVec3, label: i32) -> MeshResult<Self> {
    let count = dims.voxel_count().ok_or(MeshError::Allocation {
      entity: "voxel",
      count: usize::MAX,
    })?;
    Self::new(dims, resolution, vec![label; count])
  }

  pub fn with_origin(mut self, origin: DVec3) -> Self {
    self.origin = origin;
    self
  }

  #[inline]
  pub fn dims(&self) -> LatticeDims {
    self.dims
  }

  #[inline]
  pub fn resolution(&self) -> DVec3 {
    self.resolution
  }

  #[inline]
  pub fn origin(&self) -> DVec3 {
    self.origin
  }

  #[inline]
  pub fn labels(&self) -> &[i32] {
    &self.labels
  }

  #[inline]
  pub fn label(&self, i: usize, j: usize, k: usize) -> i32 {
    self.labels[self.dims.voxel_index(i, j, k)]
  }

  pub fn set_label(&mut self, i: usize, j: usize, k: usize, label: i32) {
    let idx = self.dims.voxel_index(i, j, k);
    self.labels[idx] = label;
  }

  /// Physical volume of one voxel.
  #[inline]
  pub fn voxel_volume(&self) -> f64 {
    self.resolution.x * self.resolution.y * self.resolution.z
  }

  /// Physical position of a corner-lattice site.
  #[inline]
  pub fn corner_position(&self, c: [u32; 3]) -> DVec3 {
    self.origin + DVec3::new(c[0] as f64, c[1] as f64, c[2] as f64) * self.resolution
  }

  /// Voxel count per label, ordered by label.
  pub fn label_counts(&self) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for &label in &self.labels {
      *counts.entry(label).or_insert(0) += 1;
    }
    counts
  }

  /// Distinct labels present in the grid, ascending.
  pub fn distinct_labels(&self) -> Vec<i32> {
    self.label_counts().into_keys().collect()
  }

  /// Relabel every grain smaller than `min_voxels` as background.
  ///
  /// Returns the labels that were removed.
  pub fn filter_small_grains(&mut self, min_voxels: usize) -> Vec<i32> {
    if min_voxels == 0 {
      return Vec::new();
    }
    let removed: Vec<i32> = self
      .label_counts()
      .into_iter()
      .filter(|&(label, count)| label != BACKGROUND_LABEL && count < min_voxels)
      .map(|(label, _)| label)
      .collect();
    if !removed.is_empty() {
      for label in &mut self.labels {
        if removed.binary_search(label).is_ok() {
          *label = BACKGROUND_LABEL;
        }
      }
    }
    removed
  }
}

/// What to do with a live triangle that references a killed node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DanglingPolicy {
  /// Kill the triangle too and count it as a warning.
  #[default]
  CascadeKill,
  /// Abort compaction with [`MeshError::DanglingNode`].
  Fail,
}

/// Winding resolution settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindingConfig {
  /// Apply flips, or only count disagreements.
  pub do_flip: bool,
  /// Turn each unvisited seed so its largest-x triangle faces `+x`.
  pub orient_seeds: bool,
}

impl Default for WindingConfig {
  fn default() -> Self {
    Self {
      do_flip: true,
      orient_seeds: false,
    }
  }
}

/// Configuration for a meshing run, consumed once at pipeline start.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshConfig {
  /// Emit faces between outermost voxels and [`crate::EXTERIOR_LABEL`].
  /// Grains touching the grid edge only get a closed surface with this on.
  pub exterior_faces: bool,
  /// Grains below this voxel count are merged into background (0 = off).
  pub min_grain_size: usize,
  /// Triangles with area at or below this value are killed.
  pub min_triangle_area: f64,
  pub winding: WindingConfig,
  pub dangling_policy: DanglingPolicy,
  /// Also build the tetrahedral volume mesh.
  pub volume_mesh: bool,
  /// Treat label 0 as a grain in aggregates and element generation.
  pub include_background: bool,
}

impl Default for MeshConfig {
  fn default() -> Self {
    Self {
      exterior_faces: true,
      min_grain_size: 0,
      min_triangle_area: 1e-12,
      winding: WindingConfig::default(),
      dangling_policy: DanglingPolicy::default(),
      volume_mesh: false,
      include_background: true,
    }
  }
}

impl MeshConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_exterior_faces(mut self, enabled: bool) -> Self {
    self.exterior_faces = enabled;
    self
  }

  pub fn with_min_grain_size(mut self, voxels: usize) -> Self {
    self.min_grain_size = voxels;
    self
  }

  pub fn with_min_triangle_area(mut self, area: f64) -> Self {
    self.min_triangle_area = area;
    self
  }

  pub fn with_winding(mut self, winding: WindingConfig) -> Self {
    self.winding = winding;
    self
  }

  pub fn with_dangling_policy(mut self, policy: DanglingPolicy) -> Self {
    self.dangling_policy = policy;
    self
  }

  pub fn with_volume_mesh(mut self, enabled: bool) -> Self {
    self.volume_mesh = enabled;
    self
  }

  pub fn with_include_background(mut self, enabled: bool) -> Self {
    self.include_background = enabled;
    self
  }

  /// Whether `label` gets a grain record.
  #[inline]
  pub fn is_grain_label(&self, label: i32) -> bool {
    label != crate::constants::EXTERIOR_LABEL
      && (self.include_background || label != BACKGROUND_LABEL)
  }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
  pub min: DVec3,
  pub max: DVec3,
}

impl Bounds {
  /// Create bounds with inverted extents (ready for encapsulation).
  pub fn empty() -> Self {
    Self {
      min: DVec3::INFINITY,
      max: DVec3::NEG_INFINITY,
    }
  }

  pub fn new(min: DVec3, max: DVec3) -> Self {
    Self { min, max }
  }

  /// Grow to include a point.
  #[inline]
  pub fn extend(&mut self, p: DVec3) {
    self.min = self.min.min(p);
    self.max = self.max.max(p);
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.min.cmpgt(self.max).any()
  }

  pub fn size(&self) -> DVec3 {
    if self.is_empty() {
      DVec3::ZERO
    } else {
      self.max - self.min
    }
  }

  pub fn center(&self) -> DVec3 {
    (self.min + self.max) * 0.5
  }
}

impl Default for Bounds {
  fn default() -> Self {
    Self::empty()
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
