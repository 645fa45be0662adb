//! Tetrahedral volume mesh built by splitting every voxel into six elements.
//!
//! Each voxel is cut around its main diagonal (corner 0 to corner 7 in
//! [`CORNER_OFFSETS`] order). All voxels use the same diagonal direction, so
//! the split faces of neighbouring voxels coincide and the mesh is conforming.

pub mod quality;

pub use quality::{DihedralHistogram, DIHEDRAL_BINS, TET_EDGES, VOLUME_BINS};

use std::collections::BTreeMap;

use glam::DVec3;
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::constants::CORNER_OFFSETS;
use crate::error::{MeshError, MeshResult};
use crate::index_table::SentinelIndex;
use crate::types::{MeshConfig, VoxelGrid};

/// Corner indices of the six tetrahedra of one voxel, one per axis ordering
/// of the path from corner 0 to corner 7.
pub const VOXEL_TETS: [[usize; 4]; 6] = [
  [0, 1, 3, 7],
  [0, 1, 5, 7],
  [0, 2, 3, 7],
  [0, 2, 6, 7],
  [0, 4, 5, 7],
  [0, 4, 6, 7],
];

/// Lattice corner used by at least one element.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeNode {
  pub lattice: [u32; 3],
  pub position: DVec3,
  /// Distinct labels among the voxels sharing this corner, capped at 4, plus
  /// 10 on the outer surface.
  pub node_type: u32,
}

impl VolumeNode {
  /// Corner lies on a grain boundary or the outer surface.
  #[inline]
  pub fn is_surface(&self) -> bool {
    self.node_type != 1
  }
}

/// Tetrahedral element owned by one grain.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
  pub nodes: [u32; 4],
  pub grain: i32,
  /// Lengths in [`TET_EDGES`] order.
  pub edge_lengths: [f64; 6],
  /// Interior dihedral angles in degrees, [`TET_EDGES`] order.
  pub dihedral_angles: [f64; 6],
  pub volume: f64,
  /// Some node lies on a grain boundary or the outer surface.
  pub surface: bool,
  pub killed: bool,
}

impl Element {
  fn new(nodes: [u32; 4], grain: i32) -> Self {
    Self {
      nodes,
      grain,
      edge_lengths: [0.0; 6],
      dihedral_angles: [0.0; 6],
      volume: 0.0,
      surface: false,
      killed: false,
    }
  }

  /// Smallest dihedral angle.
  pub fn worst_angle(&self) -> f64 {
    self.dihedral_angles.iter().copied().fold(f64::INFINITY, f64::min)
  }
}

/// Elements, their nodes and aggregate quality measures.
#[derive(Clone, Debug, Default)]
pub struct VolumeMesh {
  pub nodes: Vec<VolumeNode>,
  pub elements: Vec<Element>,
  pub histogram: DihedralHistogram,
  /// Summed element volume per grain.
  pub grain_volumes: BTreeMap<i32, f64>,
}

impl VolumeMesh {
  pub fn total_volume(&self) -> f64 {
    self.grain_volumes.values().sum()
  }

  pub fn live_elements(&self) -> impl Iterator<Item = &Element> {
    self.elements.iter().filter(|e| !e.killed)
  }
}

/// Split every grain voxel of `grid` into six tetrahedra and measure them.
#[tracing::instrument(skip_all, name = "volume_mesh::generate")]
pub fn generate(grid: &VoxelGrid, config: &MeshConfig) -> MeshResult<VolumeMesh> {
  let dims = grid.dims();
  let node_slots = dims.node_count().ok_or(MeshError::Allocation {
    entity: "volume node",
    count: usize::MAX,
  })?;
  let mut lookup = SentinelIndex::try_new(node_slots, "volume node")?;
  let mut mesh = VolumeMesh::default();
  let [nx, ny, nz] = dims.voxels();

  for k in 0..nz {
    for j in 0..ny {
      for i in 0..nx {
        let label = grid.label(i, j, k);
        if !config.is_grain_label(label) {
          continue;
        }
        let base = [i as u32, j as u32, k as u32];
        let corners = CORNER_OFFSETS.map(|o| {
          let c = [base[0] + o[0], base[1] + o[1], base[2] + o[2]];
          let slot = lookup.assign(dims.node_key(c[0] as usize, c[1] as usize, c[2] as usize));
          if slot.fresh {
            mesh.nodes.push(VolumeNode {
              lattice: c,
              position: grid.corner_position(c),
              node_type: corner_type(grid, c),
            });
          }
          slot.index
        });
        for tet in VOXEL_TETS {
          mesh
            .elements
            .push(Element::new(tet.map(|t| corners[t]), label));
        }
      }
    }
  }

  measure_elements(&mut mesh);
  tracing::debug!(
    nodes = mesh.nodes.len(),
    elements = mesh.elements.len(),
    "volume mesh complete"
  );
  Ok(mesh)
}

/// Orient, measure and histogram every live element.
pub fn measure_elements(mesh: &mut VolumeMesh) {
  let nodes = &mesh.nodes;
  mesh.elements.par_iter_mut().filter(|e| !e.killed).for_each(|e| {
    let mut p = e.nodes.map(|n| nodes[n as usize].position);
    if quality::signed_volume(&p) < 0.0 {
      e.nodes.swap(1, 2);
      p.swap(1, 2);
    }
    e.volume = quality::signed_volume(&p).abs();
    e.edge_lengths = quality::edge_lengths(&p);
    e.dihedral_angles = quality::dihedral_angles(&p);
    e.surface = e.nodes.iter().any(|&n| nodes[n as usize].is_surface());
  });

  let mut histogram = DihedralHistogram::default();
  let mut grain_volumes = BTreeMap::new();
  let mut total = 0.0;
  let mut count = 0usize;
  for e in mesh.elements.iter().filter(|e| !e.killed) {
    histogram.add_angles(&e.dihedral_angles, e.surface);
    *grain_volumes.entry(e.grain).or_insert(0.0) += e.volume;
    total += e.volume;
    count += 1;
  }
  if count > 0 {
    histogram.mean_volume = total / count as f64;
    for e in mesh.elements.iter().filter(|e| !e.killed) {
      histogram.add_volume_ratio(e.volume / histogram.mean_volume, e.surface);
    }
  }
  mesh.histogram = histogram;
  mesh.grain_volumes = grain_volumes;
}

/// Node type of corner `c` from the labels of the up to eight voxels around it.
fn corner_type(grid: &VoxelGrid, c: [u32; 3]) -> u32 {
  let dims = grid.dims();
  let mut labels: SmallVec<[i32; 8]> = SmallVec::new();
  for o in CORNER_OFFSETS {
    // Voxel whose corner `7 - o` is `c`.
    let v = [
      c[0] as i64 - 1 + o[0] as i64,
      c[1] as i64 - 1 + o[1] as i64,
      c[2] as i64 - 1 + o[2] as i64,
    ];
    let inside = v[0] >= 0
      && v[1] >= 0
      && v[2] >= 0
      && (v[0] as usize) < dims.nx
      && (v[1] as usize) < dims.ny
      && (v[2] as usize) < dims.nz;
    if inside {
      let label = grid.label(v[0] as usize, v[1] as usize, v[2] as usize);
      if !labels.contains(&label) {
        labels.push(label);
      }
    }
  }
  let owners = labels.len().min(4) as u32;
  if dims.is_boundary_corner(c) { owners + 10 } else { owners }
}
