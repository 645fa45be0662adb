use glam::DVec3;

use super::*;
use crate::constants::LatticeDims;
use crate::index_table::scan;
use crate::io::parse_vtk_labels;
use crate::types::MeshConfig;
use crate::volume_mesh;

fn sample_grid() -> VoxelGrid {
  let labels = (0..24).map(|i| i % 5 - 1).collect();
  VoxelGrid::new(LatticeDims::new(4, 3, 2), DVec3::new(0.5, 0.25, 2.0), labels).unwrap()
}

fn corner_mesh() -> FinalMesh {
  let mut labels = vec![1; 27];
  labels[0] = 2;
  let grid = VoxelGrid::from_labels(3, 3, 3, labels).unwrap();
  let mut mesh = scan(&grid, &MeshConfig::default().with_exterior_faces(false)).unwrap();
  mesh.compute_triangle_attributes();
  mesh
    .create_finalnodesandtriangles(Default::default())
    .unwrap()
}

#[test]
fn test_voxeldata_ascii_layout() {
  let mut buf = Vec::new();
  write_voxeldata(&sample_grid(), &mut buf, VtkEncoding::Ascii).unwrap();
  let text = String::from_utf8(buf).unwrap();
  let lines: Vec<_> = text.lines().collect();

  assert_eq!(lines[0], "# vtk DataFile Version 2.0");
  assert_eq!(lines[2], "ASCII");
  assert_eq!(lines[3], "DATASET STRUCTURED_POINTS");
  assert_eq!(lines[4], "DIMENSIONS 4 3 2");
  assert_eq!(lines[6], "SPACING 0.5 0.25 2");
  assert_eq!(lines[7], "POINT_DATA 24");
  assert_eq!(lines[8], "");
  assert_eq!(lines[9], "SCALARS GrainID int 1");
  assert_eq!(lines[10], "LOOKUP_TABLE default");
  assert_eq!(lines[11].split_whitespace().count(), 20);
  assert_eq!(lines[12].split_whitespace().count(), 4);
}

#[test]
fn test_voxeldata_reads_back() {
  let grid = sample_grid();
  for encoding in [VtkEncoding::Ascii, VtkEncoding::Binary] {
    let mut buf = Vec::new();
    write_voxeldata(&grid, &mut buf, encoding).unwrap();
    let back = parse_vtk_labels(&buf, "GrainID").unwrap();
    assert_eq!(back, grid, "{encoding:?}");
  }
}

#[test]
fn test_voxeldata_binary_is_big_endian() {
  let grid = VoxelGrid::from_labels(1, 1, 1, vec![258]).unwrap();
  let mut buf = Vec::new();
  write_voxeldata(&grid, &mut buf, VtkEncoding::Binary).unwrap();
  assert!(buf.ends_with(&[0, 0, 1, 2, b'\n']));
}

#[test]
fn test_rectilinear_grid_reads_back() {
  let grid = sample_grid().with_origin(DVec3::new(1.0, 0.0, -2.0));
  for encoding in [VtkEncoding::Ascii, VtkEncoding::Binary] {
    let mut buf = Vec::new();
    write_rectilinear_grid(&grid, &mut buf, encoding).unwrap();
    let back = parse_vtk_labels(&buf, "GrainID").unwrap();
    assert_eq!(back.dims(), grid.dims());
    assert_eq!(back.labels(), grid.labels());
    assert_eq!(back.origin(), grid.origin());
    assert!((back.resolution() - grid.resolution()).length() < 1e-6);
  }
}

#[test]
fn test_surface_vtk_conformal() {
  let mesh = corner_mesh();
  let mut buf = Vec::new();
  write_surface_vtk(&mesh, &mut buf, VtkEncoding::Ascii, true).unwrap();
  let text = String::from_utf8(buf).unwrap();

  assert!(text.contains("Data set from DREAM.3D Surface Meshing Module\n"));
  assert!(text.contains("DATASET POLYDATA\n"));
  assert!(text.contains("POINTS 7 float\n"));
  assert!(text.contains("POLYGONS 6 24\n3 0 1 2\n3 0 2 3\n"));
  assert!(text.contains("CELL_DATA 6\n"));
  assert!(text.contains("POINT_DATA 7\nSCALARS Node_Type int 1\n"));
}

#[test]
fn test_surface_vtk_two_sided() {
  let mesh = corner_mesh();
  let mut buf = Vec::new();
  write_surface_vtk(&mesh, &mut buf, VtkEncoding::Ascii, false).unwrap();
  let text = String::from_utf8(buf).unwrap();

  assert!(text.contains("POLYGONS 12 48\n3 0 1 2\n3 2 1 0\n"));
  assert!(text.contains("CELL_DATA 12\nSCALARS GrainID int 1\nLOOKUP_TABLE default\n2\n1\n2\n1\n"));
}

#[test]
fn test_surface_vtk_binary_sizes() {
  let mesh = corner_mesh();
  let mut ascii = Vec::new();
  write_surface_vtk(&mesh, &mut ascii, VtkEncoding::Ascii, true).unwrap();
  let mut binary = Vec::new();
  write_surface_vtk(&mesh, &mut binary, VtkEncoding::Binary, true).unwrap();
  let marker = b"POLYGONS 6 24\n";
  let at = binary
    .windows(marker.len())
    .position(|w| w == marker)
    .unwrap();
  let first = &binary[at + marker.len()..at + marker.len() + 16];
  assert_eq!(first, [0, 0, 0, 3, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 2]);
}

#[test]
fn test_meshdata_layout() {
  let grid = VoxelGrid::from_labels(1, 1, 1, vec![3]).unwrap();
  let mesh = volume_mesh::generate(&grid, &MeshConfig::default()).unwrap();
  let mut buf = Vec::new();
  write_meshdata(&mesh, &mut buf).unwrap();
  let text = String::from_utf8(buf).unwrap();
  let lines: Vec<_> = text.lines().collect();

  assert_eq!(lines[3], "DATASET UNSTRUCTURED_GRID");
  assert_eq!(lines[5], "POINTS 8 float");
  assert!(text.contains("CELLS 14 46\n1 0\n"));
  assert!(text.contains("CELL_TYPES 14\n1\n"));
  assert_eq!(lines.iter().filter(|l| **l == "10").count(), 6);
  assert!(text.contains("CELL_DATA 14\nSCALARS GrainID int 1\nLOOKUP_TABLE default\n11\n"));
  assert!(text.contains("SCALARS DihedralAngle float\nLOOKUP_TABLE default\n0\n"));
  let tail: Vec<_> = lines.iter().rev().take(6).collect();
  assert!(tail.iter().all(|l| l.parse::<f32>().unwrap() > 0.0));
}
