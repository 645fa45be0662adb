use glam::DVec3;

use super::*;
use crate::error::MeshError;
use crate::types::DanglingPolicy;

/// Unit square in the z=0 plane split into two triangles, plus a spare node.
fn square_mesh() -> SurfaceMesh {
  let mut mesh = SurfaceMesh::new(LatticeDims::new(1, 1, 1));
  let corners = [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0], [1, 1, 1]];
  for c in corners {
    let p = DVec3::new(c[0] as f64, c[1] as f64, c[2] as f64);
    mesh.nodes.push(Node::new(c, p, true));
  }
  mesh.edges.push(Edge::new([0, 1], Axis::X));
  mesh.edges.push(Edge::new([1, 2], Axis::Y));
  mesh.triangles.push(Triangle::new([0, 1, 2], [1, 2], 0));
  mesh.triangles.push(Triangle::new([0, 2, 3], [1, 2], 0));
  mesh
}

#[test]
fn test_triangle_attributes() {
  let mut mesh = square_mesh();
  mesh.compute_triangle_attributes();
  let t = &mesh.triangles[0];
  assert!((t.area - 0.5).abs() < 1e-12);
  assert_eq!(t.normal, DVec3::Z);
  assert!((t.centroid - DVec3::new(2.0 / 3.0, 1.0 / 3.0, 0.0)).length() < 1e-12);
  assert!((t.edge_lengths[0] - 1.0).abs() < 1e-12);
  assert!((t.edge_lengths[2] - 2f64.sqrt()).abs() < 1e-12);
  assert!((t.max_edge_length() - 2f64.sqrt()).abs() < 1e-12);
}

#[test]
fn test_other_label() {
  let t = Triangle::new([0, 1, 2], [4, 9], 0);
  assert_eq!(t.other_label(4), Some(9));
  assert_eq!(t.other_label(9), Some(4));
  assert_eq!(t.other_label(5), None);
}

#[test]
fn test_clean_kills_degenerate() {
  let mut mesh = square_mesh();
  // Collinear: (0,0,0), (1,0,0) and a node moved onto the x axis.
  mesh.nodes[3].position = DVec3::new(2.0, 0.0, 0.0);
  mesh.triangles.push(Triangle::new([0, 1, 3], [1, 2], 1));
  mesh.triangles.push(Triangle::new([0, 0, 2], [1, 2], 1));

  assert_eq!(mesh.clean_triangles(1e-12), 2);
  assert!(mesh.triangles[2].killed);
  assert!(mesh.triangles[3].killed);
  assert_eq!(mesh.warnings.degenerate_triangles, 2);
  assert_eq!(mesh.live_triangle_count(), 2);
}

#[test]
fn test_delete_duplicate_vertex_sets() {
  let mut mesh = square_mesh();
  mesh.triangles.push(Triangle::new([2, 1, 0], [1, 2], 1));
  assert_eq!(mesh.delete_triangles(), 1);
  assert!(!mesh.triangles[0].killed);
  assert!(mesh.triangles[2].killed);
  assert_eq!(mesh.warnings.duplicate_triangles, 1);
}

#[test]
fn test_kill_unreferenced_nodes() {
  let mut mesh = square_mesh();
  assert_eq!(mesh.kill_unreferenced_nodes(), 1);
  assert!(mesh.nodes[4].killed);
  assert_eq!(mesh.live_node_count(), 4);
}

#[test]
fn test_compaction_cascades_killed_nodes() {
  let mut mesh = square_mesh();
  mesh.kill_node(3);
  let out = mesh.create_finalnodesandtriangles(DanglingPolicy::CascadeKill).unwrap();

  assert_eq!(mesh.warnings.dangling_triangles, 1);
  assert!(mesh.triangles[1].killed);
  assert_eq!(out.triangle_count(), 1);
  assert_eq!(out.node_count(), 4);
  assert_eq!(out.node_source, vec![0, 1, 2, 4]);
  assert_eq!(mesh.nodes[4].final_index, Some(3));
  assert_eq!(mesh.nodes[3].final_index, None);
}

#[test]
fn test_compaction_fail_policy() {
  let mut mesh = square_mesh();
  mesh.kill_node(2);
  let err = mesh.create_finalnodesandtriangles(DanglingPolicy::Fail).unwrap_err();
  assert!(matches!(err, MeshError::DanglingNode { triangle: 0, node: 2 }));
  assert!(err.is_internal());
}

#[test]
fn test_compaction_rewrites_references() {
  let mut mesh = square_mesh();
  mesh.kill_node(0);
  mesh.nodes.push(Node::new([0, 0, 1], DVec3::Z, true));
  mesh.triangles.push(Triangle::new([5, 2, 3], [1, 2], 1));
  mesh.triangles.push(Triangle::new([4, 2, 1], [1, 2], 1));

  let out = mesh.create_finalnodesandtriangles(DanglingPolicy::CascadeKill).unwrap();

  // Nodes 1..=5 survive and are renumbered 0..=4.
  assert_eq!(out.node_source, vec![1, 2, 3, 4, 5]);
  assert_eq!(out.triangle_source, vec![2, 3]);
  assert_eq!(out.triangles[0].nodes, [4, 1, 2]);
  assert_eq!(out.triangles[1].nodes, [3, 1, 0]);
  // Edge 0 used the killed node.
  assert_eq!(out.edges.len(), 1);
  assert_eq!(out.edges[0].nodes, [0, 1]);
  assert_eq!(mesh.edges[0].final_index, None);
}

#[test]
fn test_compaction_is_order_preserving() {
  let mut mesh = square_mesh();
  mesh.triangles.push(Triangle::new([1, 4, 2], [2, 3], 1));
  mesh.triangles.push(Triangle::new([2, 4, 3], [2, 3], 1));
  mesh.triangles[1].killed = true;
  let _ = mesh.create_finalnodesandtriangles(DanglingPolicy::CascadeKill).unwrap();

  let finals: Vec<u32> = mesh.triangles.iter().filter_map(|t| t.final_index).collect();
  assert_eq!(finals, vec![0, 1, 2]);
  assert!(finals.windows(2).all(|w| w[0] < w[1]));
}
