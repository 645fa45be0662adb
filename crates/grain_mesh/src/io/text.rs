//! Whitespace-delimited text tables.

use std::io::Write;

use super::error::IoResult;
use crate::mesh::{FinalMesh, Grain};
use crate::volume_mesh::{DihedralHistogram, DIHEDRAL_BINS, VOLUME_BINS};

/// `3`, the node count, then `x y z` per node.
pub fn write_nodes(mesh: &FinalMesh, out: &mut impl Write) -> IoResult<()> {
  writeln!(out, "3")?;
  writeln!(out, "{}", mesh.nodes.len())?;
  for n in &mesh.nodes {
    let p = n.position.as_vec3();
    writeln!(out, "{} {} {}", p.x, p.y, p.z)?;
  }
  Ok(())
}

/// Triangle count, then `index n0 n1 n2 label0 label1` per triangle.
pub fn write_triangles(mesh: &FinalMesh, out: &mut impl Write) -> IoResult<()> {
  writeln!(out, "{}", mesh.triangles.len())?;
  for (i, t) in mesh.triangles.iter().enumerate() {
    let [a, b, c] = t.nodes;
    let [l0, l1] = t.labels;
    writeln!(out, "{i} {a} {b} {c} {l0} {l1}")?;
  }
  Ok(())
}

/// One line per degree bin: `bin surface bulk`, with the volume-ratio bins
/// appended to the first lines.
pub fn write_dihedralangles(histogram: &DihedralHistogram, out: &mut impl Write) -> IoResult<()> {
  for i in 0..DIHEDRAL_BINS {
    write!(out, "{i} {}  {}", histogram.surface[i], histogram.bulk[i])?;
    if i < VOLUME_BINS {
      write!(
        out,
        "  {} {}",
        histogram.volume_surface[i], histogram.volume_bulk[i]
      )?;
    }
    writeln!(out)?;
  }
  Ok(())
}

/// Grain count, then one row per grain.
pub fn write_grains(grains: &[Grain], out: &mut impl Write) -> IoResult<()> {
  writeln!(out, "{}", grains.len())?;
  writeln!(
    out,
    "# label cx cy cz volume area min_x min_y min_z max_x max_y max_z on_boundary"
  )?;
  for g in grains {
    let c = g.centroid;
    let (lo, hi) = (g.bounds.min, g.bounds.max);
    writeln!(
      out,
      "{} {} {} {} {} {} {} {} {} {} {} {} {}",
      g.label,
      c.x,
      c.y,
      c.z,
      g.volume,
      g.surface_area,
      lo.x,
      lo.y,
      lo.z,
      hi.x,
      hi.y,
      hi.z,
      u8::from(g.on_boundary)
    )?;
  }
  Ok(())
}
