//! Serial-section stacking of EBSD slices into a labelled voxel grid.

use glam::DVec3;

use super::ang::{AngData, AngError};
use crate::constants::LatticeDims;
use crate::error::Warnings;
use crate::types::VoxelGrid;

/// Label a point by its phase column.
pub fn phase_labels(_slice: usize, point: usize, data: &AngData) -> i32 {
  data.phase[point]
}

/// Ordered slices of equal shape, bottom slice first.
#[derive(Clone, Debug)]
pub struct SliceStack {
  slices: Vec<AngData>,
  z_resolution: f64,
}

impl SliceStack {
  pub fn new(z_resolution: f64) -> Self {
    Self {
      slices: Vec::new(),
      z_resolution,
    }
  }

  /// Append a slice, rejecting one whose column/row counts differ from the
  /// first slice.
  pub fn push(&mut self, data: AngData) -> Result<(), AngError> {
    let actual = (data.ncols(), data.nrows());
    if let Some(first) = self.slices.first() {
      let expected = (first.ncols(), first.nrows());
      if actual != expected {
        return Err(AngError::SliceShape {
          slice: self.slices.len(),
          expected,
          actual,
        });
      }
    }
    self.slices.push(data);
    Ok(())
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.slices.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.slices.is_empty()
  }

  pub fn slices(&self) -> &[AngData] {
    &self.slices
  }

  /// Summed data-quality counters over all slices.
  pub fn warnings(&self) -> Warnings {
    let mut total = Warnings::default();
    for slice in &self.slices {
      total.merge(&slice.warnings());
    }
    total
  }

  /// Voxel spacing from the first slice's step sizes. Missing or
  /// non-positive steps fall back to 1.
  pub fn resolution(&self) -> DVec3 {
    let step = |v: Option<f32>| match v {
      Some(s) if s > 0.0 => s as f64,
      _ => 1.0,
    };
    let header = self.slices.first().map(|s| &s.header);
    DVec3::new(
      step(header.and_then(|h| h.x_step)),
      step(header.and_then(|h| h.y_step)),
      if self.z_resolution > 0.0 { self.z_resolution } else { 1.0 },
    )
  }

  /// Build the grid, labelling each point with `label(slice, point, data)`.
  ///
  /// Columns map to x, rows to y and slices to z.
  pub fn to_grid<F>(&self, label: F) -> Result<VoxelGrid, AngError>
  where
    F: Fn(usize, usize, &AngData) -> i32,
  {
    let first = self.slices.first().ok_or(AngError::EmptyStack)?;
    let dims = LatticeDims::new(first.ncols(), first.nrows(), self.slices.len());
    let count = dims.voxel_count().ok_or(AngError::Allocation(usize::MAX))?;
    let mut labels = Vec::new();
    labels
      .try_reserve_exact(count)
      .map_err(|_| AngError::Allocation(count))?;
    for (z, slice) in self.slices.iter().enumerate() {
      labels.extend((0..slice.len()).map(|p| label(z, p, slice)));
    }
    let grid = VoxelGrid::new(dims, self.resolution(), labels)?;
    tracing::info!(
      nx = dims.nx,
      ny = dims.ny,
      nz = dims.nz,
      "stacked EBSD slices"
    );
    Ok(grid)
  }

  /// Build the grid labelled by phase.
  pub fn to_phase_grid(&self) -> Result<VoxelGrid, AngError> {
    self.to_grid(phase_labels)
  }
}
