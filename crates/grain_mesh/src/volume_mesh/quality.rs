//! Tetrahedron measures: volume, edge lengths, dihedral angles, histograms.

use glam::DVec3;

/// Vertex pairs of the six tetrahedron edges, in output order.
pub const TET_EDGES: [[usize; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

/// Number of one-degree dihedral angle bins.
pub const DIHEDRAL_BINS: usize = 180;

/// Number of volume-ratio bins.
pub const VOLUME_BINS: usize = 25;

/// Signed volume, positive when `p1 - p0`, `p2 - p0`, `p3 - p0` are right-handed.
#[inline]
pub fn signed_volume(p: &[DVec3; 4]) -> f64 {
  (p[1] - p[0]).dot((p[2] - p[0]).cross(p[3] - p[0])) / 6.0
}

/// Lengths of the six edges in [`TET_EDGES`] order.
pub fn edge_lengths(p: &[DVec3; 4]) -> [f64; 6] {
  TET_EDGES.map(|[a, b]| p[a].distance(p[b]))
}

/// Outward normal of the face opposite vertex `k`.
fn outward_normal(p: &[DVec3; 4], k: usize) -> DVec3 {
  let face: Vec<usize> = (0..4).filter(|&i| i != k).collect();
  let (a, b, c) = (p[face[0]], p[face[1]], p[face[2]]);
  let n = (b - a).cross(c - a);
  if n.dot(a - p[k]) < 0.0 { -n } else { n }
}

/// Interior dihedral angle in degrees at each edge in [`TET_EDGES`] order.
///
/// The angle at edge `(i, j)` lies between the two faces that contain it,
/// i.e. the faces opposite the remaining vertices.
pub fn dihedral_angles(p: &[DVec3; 4]) -> [f64; 6] {
  let normals = [0, 1, 2, 3].map(|k| outward_normal(p, k));
  TET_EDGES.map(|[i, j]| {
    let mut others = (0..4).filter(|&v| v != i && v != j);
    let (k, l) = match (others.next(), others.next()) {
      (Some(k), Some(l)) => (k, l),
      _ => return 0.0,
    };
    let (nk, nl) = (normals[k], normals[l]);
    let denom = nk.length() * nl.length();
    if denom == 0.0 {
      return 0.0;
    }
    let cos = (nk.dot(nl) / denom).clamp(-1.0, 1.0);
    180.0 - cos.acos().to_degrees()
  })
}

/// Volume-ratio bin: below 1/10, then `[1/10, 1/9) .. [1/2, 1)`, then one bin
/// per unit ratio from 1 up, the last bin open ended.
pub fn volume_bin(ratio: f64) -> usize {
  if ratio < 1.0 {
    return (1..=9usize)
      .rev()
      .find(|&b| ratio >= 1.0 / (11 - b) as f64)
      .unwrap_or(0);
  }
  (9 + ratio.floor() as usize).min(VOLUME_BINS - 1)
}

/// Histograms of dihedral angles and relative volumes, split into elements
/// touching a grain boundary (`surface`) and interior ones (`bulk`).
#[derive(Clone, Debug, PartialEq)]
pub struct DihedralHistogram {
  pub surface: [u64; DIHEDRAL_BINS],
  pub bulk: [u64; DIHEDRAL_BINS],
  pub volume_surface: [u64; VOLUME_BINS],
  pub volume_bulk: [u64; VOLUME_BINS],
  pub mean_volume: f64,
}

impl Default for DihedralHistogram {
  fn default() -> Self {
    Self {
      surface: [0; DIHEDRAL_BINS],
      bulk: [0; DIHEDRAL_BINS],
      volume_surface: [0; VOLUME_BINS],
      volume_bulk: [0; VOLUME_BINS],
      mean_volume: 0.0,
    }
  }
}

impl DihedralHistogram {
  /// Bin index of an angle in degrees.
  #[inline]
  pub fn angle_bin(angle: f64) -> usize {
    (angle.max(0.0) as usize).min(DIHEDRAL_BINS - 1)
  }

  pub fn add_angles(&mut self, angles: &[f64; 6], surface: bool) {
    let bins = if surface { &mut self.surface } else { &mut self.bulk };
    for &a in angles {
      bins[Self::angle_bin(a)] += 1;
    }
  }

  pub fn add_volume_ratio(&mut self, ratio: f64, surface: bool) {
    let bins = if surface {
      &mut self.volume_surface
    } else {
      &mut self.volume_bulk
    };
    bins[volume_bin(ratio)] += 1;
  }

  /// Total angles recorded.
  pub fn angle_count(&self) -> u64 {
    self.surface.iter().chain(&self.bulk).sum()
  }
}

#[cfg(test)]
#[path = "quality_test.rs"]
mod quality_test;
