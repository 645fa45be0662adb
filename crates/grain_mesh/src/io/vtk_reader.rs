//! Legacy VTK reader for labelled voxel grids.
//!
//! Accepts `STRUCTURED_POINTS` files whose `DIMENSIONS` count voxels, and
//! `RECTILINEAR_GRID` files whose `DIMENSIONS` count cell boundaries. The
//! whole file is loaded before parsing; scalar blocks are located by name and
//! every other block is skipped.

use std::path::Path;

use glam::DVec3;

use super::error::{IoError, IoResult};
use crate::constants::LatticeDims;
use crate::types::VoxelGrid;

/// Element type of a VTK data block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarType {
  Char,
  UnsignedChar,
  Short,
  UnsignedShort,
  Int,
  UnsignedInt,
  Long,
  UnsignedLong,
  Float,
  Double,
}

impl ScalarType {
  pub fn parse(name: &str) -> IoResult<Self> {
    Ok(match name {
      "char" => ScalarType::Char,
      "unsigned_char" => ScalarType::UnsignedChar,
      "short" => ScalarType::Short,
      "unsigned_short" => ScalarType::UnsignedShort,
      "int" => ScalarType::Int,
      "unsigned_int" => ScalarType::UnsignedInt,
      "long" => ScalarType::Long,
      "unsigned_long" => ScalarType::UnsignedLong,
      "float" => ScalarType::Float,
      "double" => ScalarType::Double,
      other => return Err(IoError::UnsupportedScalarType(other.to_string())),
    })
  }

  /// Size of one binary value in bytes.
  pub const fn size(self) -> usize {
    match self {
      ScalarType::Char | ScalarType::UnsignedChar => 1,
      ScalarType::Short | ScalarType::UnsignedShort => 2,
      ScalarType::Int | ScalarType::UnsignedInt | ScalarType::Float => 4,
      ScalarType::Long | ScalarType::UnsignedLong | ScalarType::Double => 8,
    }
  }

  /// Decode one big-endian value. `bytes` must be [`Self::size`] long.
  fn decode_be(self, bytes: &[u8]) -> f64 {
    let mut b = [0u8; 8];
    b[..bytes.len()].copy_from_slice(bytes);
    match self {
      ScalarType::Char => i8::from_be_bytes([b[0]]) as f64,
      ScalarType::UnsignedChar => b[0] as f64,
      ScalarType::Short => i16::from_be_bytes([b[0], b[1]]) as f64,
      ScalarType::UnsignedShort => u16::from_be_bytes([b[0], b[1]]) as f64,
      ScalarType::Int => i32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
      ScalarType::UnsignedInt => u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
      ScalarType::Float => f32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
      ScalarType::Long => i64::from_be_bytes(b) as f64,
      ScalarType::UnsignedLong => u64::from_be_bytes(b) as f64,
      ScalarType::Double => f64::from_be_bytes(b),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Dataset {
  StructuredPoints,
  RectilinearGrid,
}

/// Byte cursor over an in-memory VTK file.
struct Cursor<'a> {
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> Cursor<'a> {
  fn new(bytes: &'a [u8]) -> Self {
    Self { bytes, pos: 0 }
  }

  fn eof(&self) -> IoError {
    IoError::UnexpectedEof {
      position: self.pos as u64,
    }
  }

  /// Next raw line without its terminator, `None` at end of file.
  fn line(&mut self) -> IoResult<Option<&'a str>> {
    if self.pos >= self.bytes.len() {
      return Ok(None);
    }
    let rest = &self.bytes[self.pos..];
    let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
    self.pos += (end + 1).min(rest.len());
    let raw = std::str::from_utf8(&rest[..end])
      .map_err(|_| IoError::invalid_content("header line is not UTF-8"))?;
    Ok(Some(raw.trim_end_matches('\r')))
  }

  /// Next line with visible content.
  fn content_line(&mut self) -> IoResult<Option<&'a str>> {
    while let Some(line) = self.line()? {
      if !line.trim().is_empty() {
        return Ok(Some(line.trim()));
      }
    }
    Ok(None)
  }

  /// Next whitespace separated ASCII token.
  fn token(&mut self) -> IoResult<&'a str> {
    while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
      self.pos += 1;
    }
    let start = self.pos;
    while self.pos < self.bytes.len() && !self.bytes[self.pos].is_ascii_whitespace() {
      self.pos += 1;
    }
    if start == self.pos {
      return Err(self.eof());
    }
    std::str::from_utf8(&self.bytes[start..self.pos])
      .map_err(|_| IoError::invalid_content("data token is not UTF-8"))
  }

  fn take(&mut self, n: usize) -> IoResult<&'a [u8]> {
    let end = self.pos.checked_add(n).ok_or_else(|| self.eof())?;
    if end > self.bytes.len() {
      return Err(self.eof());
    }
    let slice = &self.bytes[self.pos..end];
    self.pos = end;
    Ok(slice)
  }

  fn values(&mut self, binary: bool, ty: ScalarType, count: usize) -> IoResult<Vec<f64>> {
    let mut out = Vec::new();
    out
      .try_reserve_exact(count)
      .map_err(|_| IoError::invalid_content(format!("cannot allocate {count} values")))?;
    if binary {
      let size = ty.size();
      let len = count.checked_mul(size).ok_or_else(|| self.eof())?;
      let bytes = self.take(len)?;
      out.extend(bytes.chunks_exact(size).map(|c| ty.decode_be(c)));
    } else {
      for _ in 0..count {
        out.push(self.token()?.parse::<f64>()?);
      }
    }
    Ok(out)
  }
}

fn parse_triple<T: std::str::FromStr>(fields: &[&str], keyword: &str) -> IoResult<[T; 3]> {
  let parse = |i: usize| -> IoResult<T> {
    fields
      .get(i)
      .and_then(|f| f.parse().ok())
      .ok_or_else(|| IoError::invalid_content(format!("{keyword} needs three values")))
  };
  Ok([parse(1)?, parse(2)?, parse(3)?])
}

/// Read the scalar block `scalar_name` of a VTK file as voxel labels.
pub fn read_vtk_labels(path: impl AsRef<Path>, scalar_name: &str) -> IoResult<VoxelGrid> {
  let path = path.as_ref();
  let bytes = std::fs::read(path).map_err(|e| {
    if e.kind() == std::io::ErrorKind::NotFound {
      IoError::FileNotFound {
        path: path.to_path_buf(),
      }
    } else {
      IoError::Io(e)
    }
  })?;
  let grid = parse_vtk_labels(&bytes, scalar_name)?;
  tracing::info!(
    path = %path.display(),
    dims = ?grid.dims().voxels(),
    "read voxel grid"
  );
  Ok(grid)
}

/// Parse an in-memory VTK file.
pub fn parse_vtk_labels(bytes: &[u8], scalar_name: &str) -> IoResult<VoxelGrid> {
  let mut cur = Cursor::new(bytes);

  // Header: version, comment, encoding, dataset.
  let version = cur.line()?.ok_or_else(|| cur.eof())?;
  if !version.starts_with("# vtk") {
    return Err(IoError::invalid_content("missing '# vtk' version line"));
  }
  cur.line()?.ok_or_else(|| cur.eof())?;
  let encoding = cur.line()?.ok_or_else(|| cur.eof())?.trim();
  let binary = if encoding.starts_with("BINARY") {
    true
  } else if encoding.starts_with("ASCII") {
    false
  } else {
    return Err(IoError::UnknownEncoding(encoding.to_string()));
  };
  let dataset_line = cur.content_line()?.ok_or_else(|| cur.eof())?;
  let dataset = match dataset_line.split_whitespace().nth(1) {
    Some("STRUCTURED_POINTS") => Dataset::StructuredPoints,
    Some("RECTILINEAR_GRID") => Dataset::RectilinearGrid,
    _ => return Err(IoError::UnsupportedDataset(dataset_line.to_string())),
  };

  let mut dims: Option<[usize; 3]> = None;
  let mut origin = DVec3::ZERO;
  let mut spacing = DVec3::ONE;
  let mut coords: [Vec<f64>; 3] = Default::default();

  while let Some(line) = cur.content_line()? {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields[0].to_ascii_uppercase().as_str() {
      "DIMENSIONS" => dims = Some(parse_triple(&fields, "DIMENSIONS")?),
      "ORIGIN" => origin = DVec3::from_array(parse_triple(&fields, "ORIGIN")?),
      "SPACING" | "ASPECT_RATIO" => spacing = DVec3::from_array(parse_triple(&fields, "SPACING")?),
      kw @ ("X_COORDINATES" | "Y_COORDINATES" | "Z_COORDINATES") => {
        let axis = (kw.as_bytes()[0] - b'X') as usize;
        let count: usize = fields
          .get(1)
          .ok_or_else(|| IoError::invalid_content(format!("{kw} without a count")))?
          .parse()?;
        let ty = ScalarType::parse(fields.get(2).copied().unwrap_or("float"))?;
        coords[axis] = cur.values(binary, ty, count)?;
      }
      "POINT_DATA" | "CELL_DATA" => {}
      "SCALARS" => {
        let name = fields
          .get(1)
          .ok_or_else(|| IoError::invalid_content("SCALARS without a name"))?;
        let ty = ScalarType::parse(fields.get(2).copied().unwrap_or("float"))?;
        let components: usize = match fields.get(3) {
          Some(c) => c.parse()?,
          None => 1,
        };
        let mark = cur.pos;
        match cur.content_line()? {
          Some(l) if l.starts_with("LOOKUP_TABLE") => {}
          _ => cur.pos = mark,
        }

        let shape = voxel_dims(dataset, dims)?;
        let voxels = shape
          .voxel_count()
          .ok_or_else(|| IoError::invalid_content("grid dimensions overflow"))?;
        let count = voxels
          .checked_mul(components.max(1))
          .ok_or_else(|| IoError::invalid_content("scalar block size overflows"))?;
        let values = cur.values(binary, ty, count)?;
        if *name != scalar_name {
          tracing::debug!(name, "skipping scalar block");
          continue;
        }

        let labels = values
          .chunks_exact(components.max(1))
          .map(|c| c[0] as i32)
          .collect();
        let (origin, spacing) = match dataset {
          Dataset::StructuredPoints => (origin, spacing),
          Dataset::RectilinearGrid => rectilinear_frame(&coords),
        };
        return Ok(VoxelGrid::new(shape, spacing, labels)?.with_origin(origin));
      }
      other => {
        return Err(IoError::invalid_content(format!(
          "unexpected VTK keyword {other}"
        )))
      }
    }
  }

  Err(IoError::ScalarNotFound {
    name: scalar_name.to_string(),
  })
}

fn voxel_dims(dataset: Dataset, dims: Option<[usize; 3]>) -> IoResult<LatticeDims> {
  let [x, y, z] = dims.ok_or_else(|| IoError::invalid_content("SCALARS before DIMENSIONS"))?;
  match dataset {
    Dataset::StructuredPoints => Ok(LatticeDims::new(x, y, z)),
    Dataset::RectilinearGrid => {
      if x == 0 || y == 0 || z == 0 {
        return Err(IoError::invalid_content("rectilinear DIMENSIONS must be positive"));
      }
      Ok(LatticeDims::new(x - 1, y - 1, z - 1))
    }
  }
}

/// Origin and uniform spacing from the first two boundaries on each axis.
fn rectilinear_frame(coords: &[Vec<f64>; 3]) -> (DVec3, DVec3) {
  let mut origin = [0.0; 3];
  let mut spacing = [1.0; 3];
  for (axis, c) in coords.iter().enumerate() {
    if let Some(&first) = c.first() {
      origin[axis] = first;
    }
    if c.len() >= 2 {
      spacing[axis] = c[1] - c[0];
    }
  }
  (DVec3::from_array(origin), DVec3::from_array(spacing))
}

#[cfg(test)]
#[path = "vtk_reader_test.rs"]
mod vtk_reader_test;
