//! File emission and the VTK voxel reader.
//!
//! Every writer takes an `impl Write`; the `*_file` helpers wrap a buffered
//! file. Binary VTK blocks are big-endian on every host.

mod error;
mod text;
mod vtk_reader;
mod vtk_writer;

pub use error::{IoError, IoResult};
pub use text::{write_dihedralangles, write_grains, write_nodes, write_triangles};
pub use vtk_reader::{parse_vtk_labels, read_vtk_labels, ScalarType};
pub use vtk_writer::{
  write_meshdata, write_rectilinear_grid, write_surface_vtk, write_voxeldata, VtkEncoding,
};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Legacy VTK version line.
pub const VTK_VERSION_LINE: &str = "# vtk DataFile Version 2.0";

/// Create `path` and hand a buffered writer to `write`, flushing afterwards.
pub fn write_file<F>(path: impl AsRef<Path>, write: F) -> IoResult<()>
where
  F: FnOnce(&mut BufWriter<File>) -> IoResult<()>,
{
  let path = path.as_ref();
  let mut out = BufWriter::new(File::create(path)?);
  write(&mut out)?;
  out.flush()?;
  tracing::debug!(path = %path.display(), "wrote file");
  Ok(())
}
