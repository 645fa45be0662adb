use super::*;
use crate::index_table::scan;
use crate::types::{MeshConfig, VoxelGrid};

fn mesh_for(grid: &VoxelGrid, exterior: bool) -> SurfaceMesh {
  let mut mesh = scan(grid, &MeshConfig::default().with_exterior_faces(exterior)).unwrap();
  mesh.compute_triangle_attributes();
  mesh
}

/// 4×4×4 block of grain 1 with a 2×2×2 grain 2 inclusion at its centre.
fn inclusion_grid() -> VoxelGrid {
  let mut grid = VoxelGrid::from_labels(4, 4, 4, vec![1; 64]).unwrap();
  for k in 1..3 {
    for j in 1..3 {
      for i in 1..3 {
        grid.set_label(i, j, k, 2);
      }
    }
  }
  grid
}

#[test]
fn test_generated_mesh_needs_no_flips() {
  let labels: Vec<i32> = (0..48).map(|i| ((i * 5 + i / 7) % 4) as i32).collect();
  let grid = VoxelGrid::from_labels(4, 4, 3, labels).unwrap();
  let mut mesh = mesh_for(&grid, true);
  let before = mesh.triangles.clone();

  let report = resolve_windings(&mut mesh, &WindingConfig::default()).unwrap();

  assert_eq!(report.flipped, 0);
  assert_eq!(report.conflicts, 0);
  assert!(report.checked_pairs > 0);
  assert_eq!(mesh.triangles, before);
  assert_eq!(count_inconsistent_edges(&mesh), 0);
}

#[test]
fn test_scrambled_windings_are_repaired() {
  let mut mesh = mesh_for(&inclusion_grid(), true);
  for idx in [0usize, 5, 7, 40, 41, 90, 101] {
    mesh.triangles[idx].nodes.swap(0, 2);
  }
  assert!(count_inconsistent_edges(&mesh) > 0);

  let report = resolve_windings(&mut mesh, &WindingConfig::default()).unwrap();

  assert!(report.flipped > 0);
  assert_eq!(report.conflicts, 0);
  assert_eq!(report.non_manifold_edges, 0);
  assert_eq!(count_inconsistent_edges(&mesh), 0);
}

#[test]
fn test_detect_only_leaves_mesh_untouched() {
  let mut mesh = mesh_for(&inclusion_grid(), false);
  mesh.triangles[3].nodes.swap(0, 2);
  let before = mesh.triangles.clone();
  let config = WindingConfig {
    do_flip: false,
    orient_seeds: false,
  };

  let report = resolve_windings(&mut mesh, &config).unwrap();

  assert_eq!(report.flipped, 0);
  assert!(report.mismatches > 0);
  assert_eq!(mesh.triangles, before);
}

#[test]
fn test_oriented_seeds_restore_outward_normals() {
  let grid = VoxelGrid::from_labels(4, 2, 2, vec![1, 1, 2, 2, 1, 1, 2, 2, 1, 1, 2, 2, 1, 1, 2, 2])
    .unwrap();
  let mut mesh = mesh_for(&grid, true);
  let original = mesh.triangles.clone();
  for t in mesh.triangles.iter_mut() {
    t.nodes.swap(0, 2);
  }
  let config = WindingConfig {
    do_flip: true,
    orient_seeds: true,
  };

  let report = resolve_windings(&mut mesh, &config).unwrap();

  assert_eq!(report.flipped, original.len());
  assert_eq!(mesh.triangles, original);
}

#[test]
fn test_flipped_triangles_get_new_normals() {
  let grid = VoxelGrid::from_labels(2, 1, 1, vec![1, 2]).unwrap();
  let mut mesh = mesh_for(&grid, true);
  // Flip the second half of the shared quad only.
  let idx = mesh
    .triangles
    .iter()
    .position(|t| t.labels == [1, 2])
    .unwrap()
    + 1;
  mesh.triangles[idx].nodes.swap(0, 2);
  mesh.compute_triangle_attributes();
  assert_eq!(mesh.triangles[idx].normal, -glam::DVec3::X);

  resolve_windings(&mut mesh, &WindingConfig::default()).unwrap();
  assert_eq!(count_inconsistent_edges(&mesh), 0);
  let shared: Vec<_> = mesh.triangles.iter().filter(|t| t.labels == [1, 2]).collect();
  assert_eq!(shared[0].normal, shared[1].normal);
}

#[test]
fn test_checkerboard_edges_are_non_manifold() {
  // Diagonal voxels of the same grain meet along the central z edges.
  let grid = VoxelGrid::from_labels(2, 2, 1, vec![1, 2, 2, 1]).unwrap();
  let mut mesh = mesh_for(&grid, false);
  let report = resolve_windings(&mut mesh, &WindingConfig::default()).unwrap();
  assert!(report.non_manifold_edges > 0);
  assert_eq!(mesh.warnings.non_manifold_edges, report.non_manifold_edges);
}

#[test]
fn test_killed_triangles_are_skipped() {
  let mut mesh = mesh_for(&inclusion_grid(), false);
  mesh.triangles[0].killed = true;
  mesh.triangles[0].nodes.swap(0, 2);
  let report = resolve_windings(&mut mesh, &WindingConfig::default()).unwrap();
  assert_eq!(report.flipped, 0);
}
