//! Per-grain aggregates computed from the live triangles.

use glam::DVec3;
use rayon::prelude::*;

use super::SurfaceMesh;
use crate::types::Bounds;
use crate::winding::Patch;

/// Aggregate record for one grain label.
#[derive(Clone, Debug, PartialEq)]
pub struct Grain {
  pub label: i32,
  /// Area-weighted centroid of the grain's boundary triangles.
  pub centroid: DVec3,
  pub bounds: Bounds,
  /// Enclosed volume from the oriented boundary triangles.
  pub volume: f64,
  pub surface_area: f64,
  pub max_edge_length: f64,
  /// Distance to the nearest other grain centroid (infinite when alone).
  pub min_neighbor_distance: f64,
  /// Some boundary node lies on the outer surface of the grid.
  pub on_boundary: bool,
  pub triangle_count: usize,
}

impl Grain {
  pub fn new(label: i32) -> Self {
    Self {
      label,
      centroid: DVec3::ZERO,
      bounds: Bounds::empty(),
      volume: 0.0,
      surface_area: 0.0,
      max_edge_length: 0.0,
      min_neighbor_distance: f64::INFINITY,
      on_boundary: false,
      triangle_count: 0,
    }
  }
}

/// Position of `label` in a label-sorted grain table.
#[inline]
pub(crate) fn grain_slot(grains: &[Grain], label: i32) -> Option<usize> {
  grains.binary_search_by_key(&label, |g| g.label).ok()
}

impl SurfaceMesh {
  /// Build one grain record per label accepted by `is_grain`, sorted by label.
  ///
  /// Centroids are weighted by triangle area; bounds and the boundary flag
  /// come from the triangles' nodes. Requires triangle attributes.
  pub fn locate_graincenters(&self, is_grain: impl Fn(i32) -> bool) -> Vec<Grain> {
    let mut labels: Vec<i32> = self
      .triangles
      .iter()
      .filter(|t| !t.killed)
      .flat_map(|t| t.labels)
      .filter(|&l| is_grain(l))
      .collect();
    labels.sort_unstable();
    labels.dedup();

    let mut grains: Vec<Grain> = labels.into_iter().map(Grain::new).collect();
    let mut weighted = vec![DVec3::ZERO; grains.len()];

    for t in self.triangles.iter().filter(|t| !t.killed) {
      for label in t.labels {
        let Some(slot) = grain_slot(&grains, label) else {
          continue;
        };
        let g = &mut grains[slot];
        weighted[slot] += t.centroid * t.area;
        g.surface_area += t.area;
        g.triangle_count += 1;
        for n in t.nodes {
          let node = &self.nodes[n as usize];
          g.bounds.extend(node.position);
          g.on_boundary |= node.on_boundary;
        }
      }
    }

    for (g, sum) in grains.iter_mut().zip(weighted) {
      g.centroid = if g.surface_area > 0.0 {
        sum / g.surface_area
      } else {
        g.bounds.center()
      };
    }
    grains
  }

  /// Integrate enclosed volume per grain.
  ///
  /// Each triangle is oriented outward from the grain and contributes the
  /// signed volume of the tetrahedron it forms with the grain centroid. Also
  /// fills maximum edge lengths and nearest-neighbour distances.
  pub fn find_volumes(&mut self, grains: &mut [Grain]) {
    let mut zero_area = 0;
    for t in self.triangles.iter().filter(|t| !t.killed) {
      let patch = Patch::from_triangle(t);
      for label in t.labels {
        let Some(slot) = grain_slot(grains, label) else {
          continue;
        };
        if t.area <= 0.0 {
          zero_area += 1;
          continue;
        }
        let Some(ids) = patch.get_winding_indices(label) else {
          continue;
        };
        let g = &mut grains[slot];
        let [a, b, c] = ids.map(|n| self.nodes[n as usize].position - g.centroid);
        g.volume += a.dot(b.cross(c)) / 6.0;
        g.max_edge_length = g.max_edge_length.max(t.max_edge_length());
      }
    }
    if zero_area > 0 {
      tracing::warn!(zero_area, "zero-area triangles skipped in volume integration");
    }
    self.warnings.zero_area_volume_terms += zero_area;
    find_neighbor_distances(grains);
  }
}

/// Fill `min_neighbor_distance` from pairwise centroid distances.
pub fn find_neighbor_distances(grains: &mut [Grain]) {
  let centroids: Vec<DVec3> = grains.iter().map(|g| g.centroid).collect();
  grains.par_iter_mut().enumerate().for_each(|(i, g)| {
    g.min_neighbor_distance = centroids
      .iter()
      .enumerate()
      .filter(|&(j, _)| j != i)
      .map(|(_, c)| c.distance(g.centroid))
      .fold(f64::INFINITY, f64::min);
  });
}

#[cfg(test)]
#[path = "grains_test.rs"]
mod grains_test;
