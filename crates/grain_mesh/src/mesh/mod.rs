//! Mesh entity tables: nodes, edges and triangles addressed by dense index.
//!
//! Entities are appended by the index-table scan and never removed in place.
//! Cleanup passes only set `killed`; [`SurfaceMesh::create_finalnodesandtriangles`]
//! drops killed entities and renumbers the survivors.

mod compaction;
mod grains;

pub use compaction::FinalMesh;
pub use grains::Grain;

use std::collections::HashMap;

use glam::DVec3;
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::constants::{Axis, LatticeDims, EXTERIOR_LABEL};
use crate::error::Warnings;

/// Corner-lattice site that lies on at least one boundary face.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
  /// Corner-lattice coordinate.
  pub lattice: [u32; 3],
  /// Physical position.
  pub position: DVec3,
  /// Site lies on the outer surface of the grid.
  pub on_boundary: bool,
  pub killed: bool,
  /// Index after compaction.
  pub final_index: Option<u32>,
  /// Distinct grain labels of the faces touching this node.
  pub owners: SmallVec<[i32; 4]>,
}

impl Node {
  pub fn new(lattice: [u32; 3], position: DVec3, on_boundary: bool) -> Self {
    Self {
      lattice,
      position,
      on_boundary,
      killed: false,
      final_index: None,
      owners: SmallVec::new(),
    }
  }

  /// Record a grain touching this node. The exterior label is not a grain.
  pub fn add_owner(&mut self, label: i32) {
    if label != EXTERIOR_LABEL && !self.owners.contains(&label) {
      self.owners.push(label);
    }
  }

  /// Owner count capped at 4, plus 10 for sites on the outer surface.
  pub fn node_type(&self) -> u32 {
    let owners = self.owners.len().min(4) as u32;
    if self.on_boundary { owners + 10 } else { owners }
  }
}

/// Lattice edge between two nodes of a boundary face.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
  pub nodes: [u32; 2],
  pub axis: Axis,
  pub killed: bool,
  pub final_index: Option<u32>,
}

impl Edge {
  pub fn new(nodes: [u32; 2], axis: Axis) -> Self {
    Self {
      nodes,
      axis,
      killed: false,
      final_index: None,
    }
  }
}

/// Triangle on a grain boundary.
///
/// The stored winding gives a normal pointing out of `labels[0]` into
/// `labels[1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Triangle {
  pub nodes: [u32; 3],
  pub labels: [i32; 2],
  /// Dense index of the quad face this triangle came from.
  pub face: u32,
  pub normal: DVec3,
  pub area: f64,
  pub centroid: DVec3,
  /// Lengths of edges `(0,1)`, `(1,2)` and `(2,0)`.
  pub edge_lengths: [f64; 3],
  pub killed: bool,
  pub final_index: Option<u32>,
}

impl Triangle {
  pub fn new(nodes: [u32; 3], labels: [i32; 2], face: u32) -> Self {
    Self {
      nodes,
      labels,
      face,
      normal: DVec3::ZERO,
      area: 0.0,
      centroid: DVec3::ZERO,
      edge_lengths: [0.0; 3],
      killed: false,
      final_index: None,
    }
  }

  #[inline]
  pub fn has_label(&self, label: i32) -> bool {
    self.labels[0] == label || self.labels[1] == label
  }

  /// Label on the other side from `label`, if `label` is on this triangle.
  pub fn other_label(&self, label: i32) -> Option<i32> {
    if self.labels[0] == label {
      Some(self.labels[1])
    } else if self.labels[1] == label {
      Some(self.labels[0])
    } else {
      None
    }
  }

  /// Whether any vertex index repeats.
  #[inline]
  pub fn has_repeated_vertex(&self) -> bool {
    let [a, b, c] = self.nodes;
    a == b || b == c || a == c
  }

  pub fn max_edge_length(&self) -> f64 {
    self.edge_lengths.iter().copied().fold(0.0, f64::max)
  }

  /// Recompute normal, area, centroid and edge lengths from node positions.
  pub fn update_geometry(&mut self, nodes: &[Node]) {
    let [p0, p1, p2] = self.nodes.map(|n| nodes[n as usize].position);
    let cross = (p1 - p0).cross(p2 - p0);
    self.area = 0.5 * cross.length();
    self.normal = cross.normalize_or_zero();
    self.centroid = (p0 + p1 + p2) / 3.0;
    self.edge_lengths = [p0.distance(p1), p1.distance(p2), p2.distance(p0)];
  }
}

/// Area of the triangle spanned by three positions.
#[inline]
pub fn triangle_area(p0: DVec3, p1: DVec3, p2: DVec3) -> f64 {
  0.5 * (p1 - p0).cross(p2 - p0).length()
}

/// Entity tables of one surface meshing run.
#[derive(Clone, Debug, Default)]
pub struct SurfaceMesh {
  pub dims: LatticeDims,
  pub nodes: Vec<Node>,
  pub edges: Vec<Edge>,
  pub triangles: Vec<Triangle>,
  pub warnings: Warnings,
}

impl SurfaceMesh {
  pub fn new(dims: LatticeDims) -> Self {
    Self {
      dims,
      ..Default::default()
    }
  }

  pub fn is_empty(&self) -> bool {
    self.triangles.is_empty()
  }

  pub fn live_node_count(&self) -> usize {
    self.nodes.iter().filter(|n| !n.killed).count()
  }

  pub fn live_triangle_count(&self) -> usize {
    self.triangles.iter().filter(|t| !t.killed).count()
  }

  /// Positions of a triangle's vertices in stored winding order.
  #[inline]
  pub fn triangle_positions(&self, triangle: &Triangle) -> [DVec3; 3] {
    triangle.nodes.map(|n| self.nodes[n as usize].position)
  }

  /// Recompute normal, area, centroid and edge lengths of every triangle.
  pub fn compute_triangle_attributes(&mut self) {
    let nodes = &self.nodes;
    self
      .triangles
      .par_iter_mut()
      .for_each(|t| t.update_geometry(nodes));
  }

  /// Kill triangles with a repeated vertex or an area at or below `min_area`.
  ///
  /// Returns the number of triangles killed by this call.
  pub fn clean_triangles(&mut self, min_area: f64) -> usize {
    let nodes = &self.nodes;
    let mut killed = 0;
    for t in self.triangles.iter_mut().filter(|t| !t.killed) {
      let [p0, p1, p2] = t.nodes.map(|n| nodes[n as usize].position);
      if t.has_repeated_vertex() || triangle_area(p0, p1, p2) <= min_area {
        t.killed = true;
        killed += 1;
      }
    }
    self.warnings.degenerate_triangles += killed;
    killed
  }

  /// Kill every triangle whose vertex set repeats an earlier live triangle.
  ///
  /// The first occurrence in index order survives.
  pub fn delete_triangles(&mut self) -> usize {
    let mut seen: HashMap<[u32; 3], u32> = HashMap::with_capacity(self.triangles.len());
    let mut killed = 0;
    for (idx, t) in self.triangles.iter_mut().enumerate() {
      if t.killed {
        continue;
      }
      let mut key = t.nodes;
      key.sort_unstable();
      if seen.insert(key, idx as u32).is_some() {
        t.killed = true;
        killed += 1;
      }
    }
    self.warnings.duplicate_triangles += killed;
    killed
  }

  /// Mark a node killed. Triangles using it are dealt with at compaction.
  pub fn kill_node(&mut self, index: u32) {
    if let Some(node) = self.nodes.get_mut(index as usize) {
      node.killed = true;
    }
  }

  /// Kill nodes that no live triangle references.
  pub fn kill_unreferenced_nodes(&mut self) -> usize {
    let mut used = vec![false; self.nodes.len()];
    for t in self.triangles.iter().filter(|t| !t.killed) {
      for n in t.nodes {
        used[n as usize] = true;
      }
    }
    let mut killed = 0;
    for (node, used) in self.nodes.iter_mut().zip(used) {
      if !used && !node.killed {
        node.killed = true;
        killed += 1;
      }
    }
    killed
  }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
