use std::io::Write;

use super::*;

const HEADER: &str = "\
# TEM_PIXperUM          1.000000
# x-star                240.000000
# y-star                241.500000
# z-star                242.000000
# WorkingDistance       20.000000
#
# Phase 1
# MaterialName  \tNickel
# Formula     \tNi
# Info \t\t
# Symmetry              43
# LatticeConstants      3.560 3.560 3.560  90.000  90.000  90.000
# NumberFamilies        2
# hklFamilies   \t 1  1  1 1 0.000000
# hklFamilies   \t 2  0  0 1 0.000000
#
# GRID: SqrGrid
# XSTEP: 0.500000
# YSTEP: 0.250000
# NCOLS_ODD: 10
# NCOLS_EVEN: 10
# NROWS: 5
#
# OPERATOR: \tlab
#
# SAMPLEID: \tS-01
#
# SCANID: \t
#
";

fn row(i: usize) -> String {
  let f = i as f32;
  format!(
    "{:.5} {:.5} {:.5} {:.5} {:.5} {:.1} {:.3} {} 0 1.5\n",
    f * 0.01,
    f * 0.02,
    f * 0.03,
    (i % 10) as f32 * 0.5,
    (i / 10) as f32 * 0.25,
    100.0 + f,
    0.5,
    i % 3
  )
}

fn file_with_rows(header: &str, rows: usize) -> String {
  let mut text = header.to_string();
  for i in 0..rows {
    text.push_str(&row(i));
  }
  text
}

#[test]
fn test_fifty_rows_fill_arrays() {
  let data = AngReader::parse(file_with_rows(HEADER, 50).as_bytes()).unwrap();

  assert_eq!(data.len(), 50);
  for column in [
    &data.phi1,
    &data.phi,
    &data.phi2,
    &data.x,
    &data.y,
    &data.image_quality,
    &data.confidence_index,
  ] {
    assert_eq!(column.len(), 50);
  }
  assert_eq!(data.phase.len(), 50);

  assert!((data.phi1[7] - 0.07).abs() < 1e-6);
  assert!((data.phi[7] - 0.14).abs() < 1e-6);
  assert!((data.phi2[7] - 0.21).abs() < 1e-6);
  assert_eq!(data.x[13], 1.5);
  assert_eq!(data.y[13], 0.25);
  assert_eq!(data.image_quality[49], 149.0);
  assert_eq!(data.confidence_index[0], 0.5);
  assert_eq!(data.phase[4], 1);
  assert_eq!(data.phase[5], 2);
  assert_eq!(data.fit[0], 1.5);
  assert_eq!(data.field_count, 10);
  assert_eq!(data.short_rows, 0);
  assert_eq!(data.missing_rows, 0);
  assert!(data.warnings().is_clean());
}

#[test]
fn test_header_fields() {
  let data = AngReader::parse(file_with_rows(HEADER, 50).as_bytes()).unwrap();
  let h = &data.header;

  assert_eq!(h.tem_pix_per_um, Some(1.0));
  assert_eq!(h.y_star, Some(241.5));
  assert_eq!(h.working_distance, Some(20.0));
  assert_eq!(h.grid.as_deref(), Some("SqrGrid"));
  assert_eq!(h.x_step, Some(0.5));
  assert_eq!(h.y_step, Some(0.25));
  assert_eq!(h.ncols(), 10);
  assert_eq!(h.rows().unwrap(), 5);
  assert_eq!(h.operator.as_deref(), Some("lab"));
  assert_eq!(h.sample_id.as_deref(), Some("S-01"));
  assert_eq!(h.scan_id.as_deref(), Some(""));
  assert!(h.original.starts_with("# TEM_PIXperUM"));

  assert_eq!(h.phases.len(), 1);
  let phase = &h.phases[0];
  assert_eq!(phase.index, 1);
  assert_eq!(phase.material_name, "Nickel");
  assert_eq!(phase.formula, "Ni");
  assert_eq!(phase.symmetry, Some(43));
  assert_eq!(phase.lattice_constants, vec![3.56, 3.56, 3.56, 90.0, 90.0, 90.0]);
  assert_eq!(phase.number_families, Some(2));
  assert_eq!(phase.hkl_families.len(), 2);
}

#[test]
fn test_keys_are_case_insensitive() {
  let text = "# grid: SqrGrid\n# ncols_odd: 2\n# nrows: 1\n1 2 3 4 5 6 7 1\n2 3 4 5 6 7 8 2\n";
  let data = AngReader::parse(text.as_bytes()).unwrap();
  assert_eq!(data.len(), 2);
  assert_eq!(data.phase, vec![1, 2]);
}

#[test]
fn test_odd_columns_used_when_even_missing() {
  let header = HEADER.replace("# NCOLS_EVEN: 10\n", "# NCOLS_EVEN: 0\n");
  let data = AngReader::parse(file_with_rows(&header, 50).as_bytes()).unwrap();
  assert_eq!(data.ncols(), 10);
  assert_eq!(data.len(), 50);
}

#[test]
fn test_short_rows_are_counted() {
  let mut text = file_with_rows(HEADER, 3);
  text.push_str("0.1 0.2 0.3 1.0\n");
  text.push_str("0.1 0.2 0.3 1.0 2.0 3.0 4.0 bad\n");
  text.push_str(&file_with_rows("", 45));
  let data = AngReader::parse(text.as_bytes()).unwrap();

  assert_eq!(data.short_rows, 2);
  assert_eq!(data.phi1[3], 0.1);
  assert_eq!(data.x[3], 1.0);
  assert_eq!(data.y[3], 0.0);
  assert_eq!(data.phase[3], 0);
  assert_eq!(data.confidence_index[4], 4.0);
  assert_eq!(data.phase[4], 0);
  assert_eq!(data.missing_rows, 0);
  assert_eq!(data.warnings().short_ang_rows, 2);
}

#[test]
fn test_missing_rows_are_counted() {
  let data = AngReader::parse(file_with_rows(HEADER, 42).as_bytes()).unwrap();
  assert_eq!(data.len(), 50);
  assert_eq!(data.missing_rows, 8);
  assert_eq!(data.phase[45], 0);
  assert_eq!(data.warnings().missing_ang_rows, 8);
}

#[test]
fn test_eight_column_rows() {
  let text = "# GRID: SqrGrid\n# NCOLS_EVEN: 1\n# NROWS: 1\n1 2 3 4 5 6 7 3\n";
  let data = AngReader::parse(text.as_bytes()).unwrap();
  assert_eq!(data.field_count, 8);
  assert_eq!(data.short_rows, 0);
  assert_eq!(data.phase[0], 3);
  assert_eq!(data.sem_signal[0], 0.0);
}

#[test]
fn test_extra_rows_ignored() {
  let data = AngReader::parse(file_with_rows(HEADER, 60).as_bytes()).unwrap();
  assert_eq!(data.len(), 50);
  assert_eq!(data.image_quality[49], 149.0);
}

#[test]
fn test_blank_lines_skipped() {
  let text = "# GRID: SqrGrid\n# NCOLS_EVEN: 2\n# NROWS: 1\n\n1 2 3 4 5 6 7 1\n\n2 3 4 5 6 7 8 2\n";
  let data = AngReader::parse(text.as_bytes()).unwrap();
  assert_eq!(data.phase, vec![1, 2]);
  assert_eq!(data.short_rows, 0);
}

#[test]
fn test_missing_rows_key() {
  let header = HEADER.replace("# NROWS: 5\n", "");
  let err = AngReader::parse(file_with_rows(&header, 50).as_bytes()).unwrap_err();
  assert!(matches!(err, AngError::NoRows(0)));
  assert_eq!(err.code(), -200);
}

#[test]
fn test_zero_rows() {
  let header = HEADER.replace("# NROWS: 5\n", "# NROWS: 0\n");
  let err = AngReader::parse(header.as_bytes()).unwrap_err();
  assert_eq!(err.code(), -200);
}

#[test]
fn test_hex_grid_rejected() {
  let header = HEADER.replace("SqrGrid", "HexGrid");
  let err = AngReader::parse(file_with_rows(&header, 50).as_bytes()).unwrap_err();
  assert!(matches!(err, AngError::HexGrid));
  assert_eq!(err.code(), -400);
}

#[test]
fn test_unknown_grid_rejected() {
  let header = HEADER.replace("SqrGrid", "TriGrid");
  let err = AngReader::parse(file_with_rows(&header, 50).as_bytes()).unwrap_err();
  assert!(matches!(err, AngError::UnknownGrid(ref g) if g == "TriGrid"));
  assert_eq!(err.code(), -300);
}

#[test]
fn test_missing_grid_rejected() {
  let header = HEADER.replace("# GRID: SqrGrid\n", "");
  let err = AngReader::parse(file_with_rows(&header, 50).as_bytes()).unwrap_err();
  assert!(matches!(err, AngError::UnknownGrid(ref g) if g.is_empty()));
  assert_eq!(err.code(), -300);

  let err = AngReader::parse("# NCOLS_EVEN: 1\n# NROWS: 1\n0 0 0 0 0 0 0 1\n".as_bytes()).unwrap_err();
  assert_eq!(err.code(), -300);
}

#[test]
fn test_rows_without_columns_are_counted() {
  let text = "# GRID: SqrGrid\n# NROWS: 2\n1 2 3 4 5 6 7 1\n\n2 3 4 5 6 7 8 2\n";
  let data = AngReader::parse(text.as_bytes()).unwrap();

  assert!(data.is_empty());
  assert_eq!(data.dropped_rows, 2);
  assert_eq!(data.warnings().dropped_ang_rows, 2);
  assert!(!data.warnings().is_clean());
}

#[test]
fn test_unknown_keys_kept() {
  let text = "# GRID: SqrGrid\n# Vendor  TSL\n# NCOLS_EVEN: 1\n# NROWS: 1\n1 2 3 4 5 6 7 1\n";
  let data = AngReader::parse(text.as_bytes()).unwrap();
  assert_eq!(data.header.extra, vec![("Vendor".to_string(), "TSL".to_string())]);
}

#[test]
fn test_read_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("slice.ang");
  let mut file = std::fs::File::create(&path).unwrap();
  file
    .write_all(file_with_rows(HEADER, 50).as_bytes())
    .unwrap();
  drop(file);

  let data = AngReader::read_file(&path).unwrap();
  assert_eq!(data.len(), 50);
  let header = AngReader::read_header_file(&path).unwrap();
  assert_eq!(header, data.header);
}

#[test]
fn test_unopenable_file() {
  let dir = tempfile::tempdir().unwrap();
  let err = AngReader::read_file(dir.path().join("missing.ang")).unwrap_err();
  assert!(matches!(err, AngError::Open { .. }));
  assert_eq!(err.code(), -100);
}
