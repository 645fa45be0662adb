use super::*;

fn corner_tet() -> [DVec3; 4] {
  [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z]
}

#[test]
fn test_corner_tet_volume() {
  assert!((signed_volume(&corner_tet()) - 1.0 / 6.0).abs() < 1e-12);
  let mut swapped = corner_tet();
  swapped.swap(1, 2);
  assert!((signed_volume(&swapped) + 1.0 / 6.0).abs() < 1e-12);
}

#[test]
fn test_corner_tet_edges() {
  let lengths = edge_lengths(&corner_tet());
  let s = 2f64.sqrt();
  let expected = [1.0, 1.0, 1.0, s, s, s];
  for (l, e) in lengths.iter().zip(expected) {
    assert!((l - e).abs() < 1e-12);
  }
}

#[test]
fn test_corner_tet_dihedrals() {
  let angles = dihedral_angles(&corner_tet());
  let oblique = (1.0 / 3f64.sqrt()).acos().to_degrees();
  // Edges at the origin meet at right angles; the others at ~54.74°.
  let expected = [90.0, 90.0, 90.0, oblique, oblique, oblique];
  for (a, e) in angles.iter().zip(expected) {
    assert!((a - e).abs() < 1e-9, "{a} vs {e}");
  }
}

#[test]
fn test_regular_tet_dihedrals() {
  let p = [
    DVec3::new(1.0, 1.0, 1.0),
    DVec3::new(1.0, -1.0, -1.0),
    DVec3::new(-1.0, 1.0, -1.0),
    DVec3::new(-1.0, -1.0, 1.0),
  ];
  let expected = (1.0f64 / 3.0).acos().to_degrees();
  for a in dihedral_angles(&p) {
    assert!((a - expected).abs() < 1e-9);
  }
}

#[test]
fn test_dihedrals_ignore_vertex_order() {
  let mut p = corner_tet();
  p.swap(1, 2);
  let angles = dihedral_angles(&p);
  assert!((angles[2] - 90.0).abs() < 1e-9);
}

#[test]
fn test_volume_bins() {
  assert_eq!(volume_bin(0.05), 0);
  assert_eq!(volume_bin(0.1), 1);
  assert_eq!(volume_bin(0.105), 1);
  assert_eq!(volume_bin(0.12), 2);
  assert_eq!(volume_bin(0.3), 7);
  assert_eq!(volume_bin(0.5), 9);
  assert_eq!(volume_bin(0.99), 9);
  assert_eq!(volume_bin(1.0), 10);
  assert_eq!(volume_bin(2.5), 11);
  assert_eq!(volume_bin(15.0), 24);
  assert_eq!(volume_bin(1e9), 24);
}

#[test]
fn test_histogram_bins() {
  let mut h = DihedralHistogram::default();
  h.add_angles(&[90.0, 90.0, 90.0, 54.7, 54.7, 180.0], true);
  h.add_angles(&[45.5; 6], false);
  assert_eq!(h.surface[90], 3);
  assert_eq!(h.surface[54], 2);
  assert_eq!(h.surface[179], 1);
  assert_eq!(h.bulk[45], 6);
  assert_eq!(h.angle_count(), 12);
  h.add_volume_ratio(1.0, false);
  assert_eq!(h.volume_bulk[10], 1);
}
