//! Final renumbering of surviving mesh entities.

use super::{Edge, Node, SurfaceMesh, Triangle};
use crate::error::{MeshError, MeshResult};
use crate::types::DanglingPolicy;

/// Compacted mesh: only live entities, contiguously numbered.
///
/// Vertex references in `edges` and `triangles` use final node numbers.
#[derive(Clone, Debug, Default)]
pub struct FinalMesh {
  pub nodes: Vec<Node>,
  pub edges: Vec<Edge>,
  pub triangles: Vec<Triangle>,
  /// Original index of each final node.
  pub node_source: Vec<u32>,
  /// Original index of each final triangle.
  pub triangle_source: Vec<u32>,
}

impl FinalMesh {
  pub fn is_empty(&self) -> bool {
    self.triangles.is_empty()
  }

  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  pub fn triangle_count(&self) -> usize {
    self.triangles.len()
  }
}

impl SurfaceMesh {
  /// Drop killed entities and assign contiguous final numbers.
  ///
  /// Live triangles that reference a killed node are handled per `policy`
  /// before numbering. Final numbers preserve creation order among survivors.
  pub fn create_finalnodesandtriangles(&mut self, policy: DanglingPolicy) -> MeshResult<FinalMesh> {
    // =========================================================================
    // Pass 1: Dangling references
    // =========================================================================
    let mut dangling = 0;
    for (idx, t) in self.triangles.iter_mut().enumerate() {
      if t.killed {
        continue;
      }
      let Some(&node) = t.nodes.iter().find(|&&n| self.nodes[n as usize].killed) else {
        continue;
      };
      match policy {
        DanglingPolicy::CascadeKill => {
          t.killed = true;
          dangling += 1;
        }
        DanglingPolicy::Fail => {
          return Err(MeshError::DanglingNode {
            triangle: idx as u32,
            node,
          });
        }
      }
    }
    if dangling > 0 {
      tracing::warn!(dangling, "killed triangles referencing killed nodes");
    }
    self.warnings.dangling_triangles += dangling;

    for e in self.edges.iter_mut() {
      if e.nodes.iter().any(|&n| self.nodes[n as usize].killed) {
        e.killed = true;
      }
    }

    // =========================================================================
    // Pass 2: Numbering
    // =========================================================================
    let mut out = FinalMesh::default();

    for (idx, node) in self.nodes.iter_mut().enumerate() {
      node.final_index = None;
      if node.killed {
        continue;
      }
      node.final_index = Some(out.nodes.len() as u32);
      out.nodes.push(node.clone());
      out.node_source.push(idx as u32);
    }

    let remap = |n: u32, nodes: &[Node]| -> u32 {
      // Pass 1 guarantees every referenced node of a live entity survived.
      nodes[n as usize].final_index.unwrap_or(u32::MAX)
    };

    for e in self.edges.iter_mut() {
      e.final_index = None;
      if e.killed {
        continue;
      }
      e.final_index = Some(out.edges.len() as u32);
      let mut edge = e.clone();
      edge.nodes = e.nodes.map(|n| remap(n, &self.nodes));
      out.edges.push(edge);
    }

    for (idx, t) in self.triangles.iter_mut().enumerate() {
      t.final_index = None;
      if t.killed {
        continue;
      }
      t.final_index = Some(out.triangles.len() as u32);
      let mut tri = t.clone();
      tri.nodes = t.nodes.map(|n| remap(n, &self.nodes));
      out.triangles.push(tri);
      out.triangle_source.push(idx as u32);
    }

    tracing::debug!(
      nodes = out.nodes.len(),
      edges = out.edges.len(),
      triangles = out.triangles.len(),
      "compacted mesh"
    );
    Ok(out)
  }
}
