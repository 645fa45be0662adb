//! Legacy VTK writers for voxel grids, surface meshes and tetrahedral meshes.

use std::io::Write;

use super::error::IoResult;
use super::VTK_VERSION_LINE;
use crate::mesh::FinalMesh;
use crate::types::VoxelGrid;
use crate::volume_mesh::VolumeMesh;

/// Comment line of voxel and element files.
const VOXEL_COMMENT: &str = "data set from FFT2dx_GB";
/// Comment line of surface mesh files.
const SURFACE_COMMENT: &str = "Data set from DREAM.3D Surface Meshing Module";
/// ASCII scalar values per line in voxel files.
const VALUES_PER_LINE: usize = 20;

/// Encoding of the data blocks of a VTK file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VtkEncoding {
  #[default]
  Ascii,
  Binary,
}

impl VtkEncoding {
  pub fn from_binary(binary: bool) -> Self {
    if binary {
      VtkEncoding::Binary
    } else {
      VtkEncoding::Ascii
    }
  }

  fn keyword(self) -> &'static str {
    match self {
      VtkEncoding::Ascii => "ASCII",
      VtkEncoding::Binary => "BINARY",
    }
  }
}

fn header(out: &mut impl Write, comment: &str, encoding: VtkEncoding, dataset: &str) -> IoResult<()> {
  writeln!(out, "{VTK_VERSION_LINE}")?;
  writeln!(out, "{comment}")?;
  writeln!(out, "{}", encoding.keyword())?;
  writeln!(out, "DATASET {dataset}")?;
  Ok(())
}

/// Data block: big-endian 4-byte words, or ASCII with `per_line` values per
/// line.
fn block<T: std::fmt::Display>(
  out: &mut impl Write,
  encoding: VtkEncoding,
  values: impl Iterator<Item = T>,
  per_line: usize,
  to_be: fn(T) -> [u8; 4],
) -> IoResult<()> {
  match encoding {
    VtkEncoding::Binary => {
      for v in values {
        out.write_all(&to_be(v))?;
      }
      writeln!(out)?;
    }
    VtkEncoding::Ascii => {
      let mut count = 0;
      for v in values {
        if count > 0 {
          out.write_all(if count % per_line == 0 { b"\n" } else { b" " })?;
        }
        write!(out, "{v}")?;
        count += 1;
      }
      if count > 0 {
        writeln!(out)?;
      }
    }
  }
  Ok(())
}

fn int_block(
  out: &mut impl Write,
  encoding: VtkEncoding,
  values: impl Iterator<Item = i32>,
  per_line: usize,
) -> IoResult<()> {
  block(out, encoding, values, per_line, i32::to_be_bytes)
}

fn float_block(
  out: &mut impl Write,
  encoding: VtkEncoding,
  values: impl Iterator<Item = f32>,
  per_line: usize,
) -> IoResult<()> {
  block(out, encoding, values, per_line, f32::to_be_bytes)
}

/// `STRUCTURED_POINTS` file of voxel labels; `DIMENSIONS` count voxels.
pub fn write_voxeldata(grid: &VoxelGrid, out: &mut impl Write, encoding: VtkEncoding) -> IoResult<()> {
  let [nx, ny, nz] = grid.dims().voxels();
  let origin = grid.origin();
  let res = grid.resolution();
  header(out, VOXEL_COMMENT, encoding, "STRUCTURED_POINTS")?;
  writeln!(out, "DIMENSIONS {nx} {ny} {nz}")?;
  writeln!(out, "ORIGIN {} {} {}", origin.x, origin.y, origin.z)?;
  writeln!(out, "SPACING {} {} {}", res.x, res.y, res.z)?;
  writeln!(out, "POINT_DATA {}", grid.labels().len())?;
  writeln!(out)?;
  writeln!(out, "SCALARS GrainID int 1")?;
  writeln!(out, "LOOKUP_TABLE default")?;
  int_block(out, encoding, grid.labels().iter().copied(), VALUES_PER_LINE)
}

/// `RECTILINEAR_GRID` file with cell boundaries and per-cell labels.
pub fn write_rectilinear_grid(
  grid: &VoxelGrid,
  out: &mut impl Write,
  encoding: VtkEncoding,
) -> IoResult<()> {
  let [cx, cy, cz] = grid.dims().corners();
  let origin = grid.origin().to_array();
  let res = grid.resolution().to_array();
  header(out, VOXEL_COMMENT, encoding, "RECTILINEAR_GRID")?;
  writeln!(out, "DIMENSIONS {cx} {cy} {cz}")?;
  for (axis, (name, count)) in [("X", cx), ("Y", cy), ("Z", cz)].into_iter().enumerate() {
    writeln!(out, "{name}_COORDINATES {count} float")?;
    let coords = (0..count).map(|i| (origin[axis] + i as f64 * res[axis]) as f32);
    float_block(out, encoding, coords, VALUES_PER_LINE)?;
  }
  writeln!(out, "CELL_DATA {}", grid.labels().len())?;
  writeln!(out, "SCALARS GrainID int 1")?;
  writeln!(out, "LOOKUP_TABLE default")?;
  int_block(out, encoding, grid.labels().iter().copied(), VALUES_PER_LINE)
}

/// `POLYDATA` surface mesh.
///
/// A conformal file holds each triangle once with its first label as cell
/// data. Otherwise every triangle is written twice, once per side, the second
/// copy reversed and carrying the second label.
pub fn write_surface_vtk(
  mesh: &FinalMesh,
  out: &mut impl Write,
  encoding: VtkEncoding,
  conformal: bool,
) -> IoResult<()> {
  let copies = if conformal { 1 } else { 2 };
  let cells = mesh.triangles.len() * copies;

  header(out, SURFACE_COMMENT, encoding, "POLYDATA")?;
  writeln!(out, "POINTS {} float", mesh.nodes.len())?;
  let coords = mesh
    .nodes
    .iter()
    .flat_map(|n| n.position.to_array())
    .map(|c| c as f32);
  float_block(out, encoding, coords, 3)?;

  writeln!(out, "POLYGONS {cells} {}", cells * 4)?;
  let polygons = mesh.triangles.iter().flat_map(|t| {
    let [a, b, c] = t.nodes.map(|n| n as i32);
    let front = [3, a, b, c];
    let back = [3, c, b, a];
    front.into_iter().chain(back).take(4 * copies)
  });
  int_block(out, encoding, polygons, 4)?;

  writeln!(out)?;
  writeln!(out, "CELL_DATA {cells}")?;
  writeln!(out, "SCALARS GrainID int 1")?;
  writeln!(out, "LOOKUP_TABLE default")?;
  let labels = mesh
    .triangles
    .iter()
    .flat_map(|t| t.labels.into_iter().take(copies));
  int_block(out, encoding, labels, 1)?;

  writeln!(out)?;
  writeln!(out, "POINT_DATA {}", mesh.nodes.len())?;
  writeln!(out, "SCALARS Node_Type int 1")?;
  writeln!(out, "LOOKUP_TABLE default")?;
  int_block(out, encoding, mesh.nodes.iter().map(|n| n.node_type() as i32), 1)
}

/// `UNSTRUCTURED_GRID` of the tetrahedral mesh.
///
/// Every node is also written as a vertex cell so node types can be shown
/// next to element labels. `DihedralAngle` holds the worst angle per element.
pub fn write_meshdata(mesh: &VolumeMesh, out: &mut impl Write) -> IoResult<()> {
  let nodes = mesh.nodes.len();
  let elements: Vec<_> = mesh.live_elements().collect();
  let cells = elements.len() + nodes;

  header(out, VOXEL_COMMENT, VtkEncoding::Ascii, "UNSTRUCTURED_GRID")?;
  writeln!(out)?;
  writeln!(out, "POINTS {nodes} float")?;
  for n in &mesh.nodes {
    let p = n.position.as_vec3();
    writeln!(out, "{} {} {}", p.x, p.y, p.z)?;
  }

  writeln!(out)?;
  writeln!(out, "CELLS {cells} {}", elements.len() * 5 + nodes * 2)?;
  for j in 0..nodes {
    writeln!(out, "1 {j}")?;
  }
  for e in &elements {
    let [a, b, c, d] = e.nodes;
    writeln!(out, "4 {a} {b} {c} {d}")?;
  }

  writeln!(out)?;
  writeln!(out, "CELL_TYPES {cells}")?;
  for _ in 0..nodes {
    writeln!(out, "1")?;
  }
  for _ in &elements {
    writeln!(out, "10")?;
  }

  writeln!(out)?;
  writeln!(out, "CELL_DATA {cells}")?;
  writeln!(out, "SCALARS GrainID int 1")?;
  writeln!(out, "LOOKUP_TABLE default")?;
  for n in &mesh.nodes {
    writeln!(out, "{}", n.node_type)?;
  }
  for e in &elements {
    writeln!(out, "{}", e.grain)?;
  }

  writeln!(out)?;
  writeln!(out, "SCALARS DihedralAngle float")?;
  writeln!(out, "LOOKUP_TABLE default")?;
  for _ in 0..nodes {
    writeln!(out, "0")?;
  }
  for e in &elements {
    writeln!(out, "{}", e.worst_angle() as f32)?;
  }
  Ok(())
}

#[cfg(test)]
#[path = "vtk_writer_test.rs"]
mod vtk_writer_test;
