//! TSL/EDAX `.ang` reader.
//!
//! A file is a run of `#`-prefixed header lines followed by one whitespace
//! separated row per scan point:
//!
//! ```text
//! phi1 phi phi2 x y image_quality confidence_index phase [sem_signal fit]
//! ```
//!
//! Rows are stored in file order; the point index is the row counter, not a
//! value derived from the `x`/`y` columns.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::{MeshError, Warnings};

/// Values every data row must carry.
pub const REQUIRED_FIELDS: usize = 8;
/// Values a full row carries, including SEM signal and fit.
pub const MAX_FIELDS: usize = 10;

/// Errors raised while reading `.ang` files or stacking slices.
#[derive(Debug, Error)]
pub enum AngError {
  #[error("cannot open ANG file {path}: {source}")]
  Open {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("I/O error while reading ANG data: {0}")]
  Io(#[from] std::io::Error),

  /// `NROWS` missing or below one.
  #[error("ANG header declares {0} rows")]
  NoRows(i64),

  /// `GRID` is not `SqrGrid`/`HexGrid`; empty when the key is absent.
  #[error("unknown ANG grid type {0:?}")]
  UnknownGrid(String),

  #[error("hexagonal ANG grids are not supported")]
  HexGrid,

  #[error("cannot allocate {0} ANG points")]
  Allocation(usize),

  /// Slice shape differs from the first slice of a stack.
  #[error("slice {slice} is {actual:?} (cols, rows), stack expects {expected:?}")]
  SliceShape {
    slice: usize,
    expected: (usize, usize),
    actual: (usize, usize),
  },

  #[error("slice stack is empty")]
  EmptyStack,

  #[error(transparent)]
  Grid(#[from] MeshError),
}

impl AngError {
  /// Negative status code matching the reader's historical return values.
  pub fn code(&self) -> i32 {
    match self {
      AngError::Open { .. } | AngError::Io(_) => -100,
      AngError::NoRows(_) | AngError::EmptyStack => -200,
      AngError::UnknownGrid(_) | AngError::SliceShape { .. } => -300,
      AngError::HexGrid => -400,
      AngError::Allocation(_) => -1,
      AngError::Grid(e) => e.code(),
    }
  }
}

/// Sampling lattice declared by the `GRID` key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridKind {
  Square,
  Hexagonal,
}

/// One `# Phase` block of the header.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AngPhase {
  pub index: i32,
  pub material_name: String,
  pub formula: String,
  pub info: String,
  pub symmetry: Option<i32>,
  /// `a b c alpha beta gamma`.
  pub lattice_constants: Vec<f32>,
  pub number_families: Option<i32>,
  pub hkl_families: Vec<Vec<f32>>,
  pub categories: Vec<i32>,
}

/// Parsed header of an `.ang` file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AngHeader {
  pub tem_pix_per_um: Option<f32>,
  pub x_star: Option<f32>,
  pub y_star: Option<f32>,
  pub z_star: Option<f32>,
  pub working_distance: Option<f32>,
  pub grid: Option<String>,
  pub x_step: Option<f32>,
  pub y_step: Option<f32>,
  pub ncols_odd: Option<i64>,
  pub ncols_even: Option<i64>,
  pub nrows: Option<i64>,
  pub operator: Option<String>,
  pub sample_id: Option<String>,
  pub scan_id: Option<String>,
  pub phases: Vec<AngPhase>,
  /// Keys with no dedicated field, in file order.
  pub extra: Vec<(String, String)>,
  /// Header lines exactly as read, newline separated.
  pub original: String,
}

impl AngHeader {
  /// Points per row: `NCOLS_EVEN` when positive, else `NCOLS_ODD`, else 0.
  pub fn ncols(&self) -> usize {
    match (self.ncols_even, self.ncols_odd) {
      (Some(even), _) if even > 0 => even as usize,
      (_, Some(odd)) if odd > 0 => odd as usize,
      _ => 0,
    }
  }

  /// Declared row count, rejecting values below one.
  pub fn rows(&self) -> Result<usize, AngError> {
    match self.nrows {
      Some(n) if n >= 1 => Ok(n as usize),
      other => Err(AngError::NoRows(other.unwrap_or(0))),
    }
  }

  /// Grid kind. A header without `GRID` is rejected.
  pub fn grid_kind(&self) -> Result<GridKind, AngError> {
    let Some(grid) = self.grid.as_deref() else {
      return Err(AngError::UnknownGrid(String::new()));
    };
    if grid.starts_with("SqrGrid") {
      Ok(GridKind::Square)
    } else if grid.starts_with("HexGrid") {
      Ok(GridKind::Hexagonal)
    } else {
      Err(AngError::UnknownGrid(grid.to_string()))
    }
  }

  /// Apply one `#` line. Returns `false` once the line is not a header line.
  fn parse_line(&mut self, line: &str) -> bool {
    let Some(body) = line.strip_prefix('#') else {
      return false;
    };
    self.original.push_str(line);
    self.original.push('\n');

    let body = body.trim_start_matches(' ');
    let word_len = body
      .find(|c: char| !(c.is_ascii_alphabetic() || c == '-' || c == '_'))
      .unwrap_or(body.len());
    let (word, rest) = body.split_at(word_len);
    if word.is_empty() {
      return true;
    }
    let value = rest.trim_start_matches(|c: char| c == ':' || c.is_whitespace()).trim_end();
    self.apply(&word.to_ascii_uppercase(), word, value);
    true
  }

  fn apply(&mut self, key: &str, word: &str, value: &str) {
    match key {
      "PHASE" => self.phases.push(AngPhase {
        index: parse_first(value).unwrap_or(0),
        ..AngPhase::default()
      }),
      "MATERIALNAME" | "FORMULA" | "INFO" | "SYMMETRY" | "LATTICECONSTANTS"
      | "NUMBERFAMILIES" | "HKLFAMILIES" | "CATEGORIES"
        if !self.phases.is_empty() =>
      {
        if let Some(phase) = self.phases.last_mut() {
          phase.apply(key, value);
        }
      }
      "TEM_PIXPERUM" => self.tem_pix_per_um = parse_first(value),
      "X-STAR" => self.x_star = parse_first(value),
      "Y-STAR" => self.y_star = parse_first(value),
      "Z-STAR" => self.z_star = parse_first(value),
      "WORKINGDISTANCE" => self.working_distance = parse_first(value),
      "GRID" => self.grid = Some(value.to_string()),
      "XSTEP" => self.x_step = parse_first(value),
      "YSTEP" => self.y_step = parse_first(value),
      "NCOLS_ODD" => self.ncols_odd = parse_first(value),
      "NCOLS_EVEN" => self.ncols_even = parse_first(value),
      "NROWS" => self.nrows = parse_first(value),
      "OPERATOR" => self.operator = Some(value.to_string()),
      "SAMPLEID" => self.sample_id = Some(value.to_string()),
      "SCANID" => self.scan_id = Some(value.to_string()),
      _ => {
        tracing::debug!(key = word, "unrecognised ANG header key");
        self.extra.push((word.to_string(), value.to_string()));
      }
    }
  }
}

impl AngPhase {
  fn apply(&mut self, key: &str, value: &str) {
    match key {
      "MATERIALNAME" => self.material_name = value.to_string(),
      "FORMULA" => self.formula = value.to_string(),
      "INFO" => self.info = value.to_string(),
      "SYMMETRY" => self.symmetry = parse_first(value),
      "LATTICECONSTANTS" => self.lattice_constants = parse_all(value),
      "NUMBERFAMILIES" => self.number_families = parse_first(value),
      "HKLFAMILIES" => self.hkl_families.push(parse_all(value)),
      "CATEGORIES" => self.categories = parse_all(value),
      _ => {}
    }
  }
}

fn parse_first<T: std::str::FromStr>(value: &str) -> Option<T> {
  value.split_whitespace().next()?.parse().ok()
}

fn parse_all<T: std::str::FromStr>(value: &str) -> Vec<T> {
  value
    .split_whitespace()
    .map_while(|v| v.parse().ok())
    .collect()
}

/// Column arrays of one scan, indexed by point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AngData {
  pub header: AngHeader,
  pub phi1: Vec<f32>,
  pub phi: Vec<f32>,
  pub phi2: Vec<f32>,
  pub x: Vec<f32>,
  pub y: Vec<f32>,
  pub image_quality: Vec<f32>,
  pub confidence_index: Vec<f32>,
  pub phase: Vec<i32>,
  pub sem_signal: Vec<f32>,
  pub fit: Vec<f32>,
  /// Largest number of values seen on a data row.
  pub field_count: usize,
  /// Rows with fewer than [`REQUIRED_FIELDS`] readable values.
  pub short_rows: usize,
  /// Points declared by the header but missing from the file.
  pub missing_rows: usize,
  /// Data rows that had no point to go to because the header declares no
  /// columns.
  pub dropped_rows: usize,
}

impl AngData {
  fn zeroed(header: AngHeader, len: usize) -> Result<Self, AngError> {
    Ok(Self {
      header,
      phi1: zeroed(len)?,
      phi: zeroed(len)?,
      phi2: zeroed(len)?,
      x: zeroed(len)?,
      y: zeroed(len)?,
      image_quality: zeroed(len)?,
      confidence_index: zeroed(len)?,
      phase: zeroed(len)?,
      sem_signal: zeroed(len)?,
      fit: zeroed(len)?,
      field_count: 0,
      short_rows: 0,
      missing_rows: 0,
      dropped_rows: 0,
    })
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.phase.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.phase.is_empty()
  }

  pub fn ncols(&self) -> usize {
    self.header.ncols()
  }

  pub fn nrows(&self) -> usize {
    self.header.nrows.map_or(0, |n| n.max(0) as usize)
  }

  /// Data-quality counters of this scan.
  pub fn warnings(&self) -> Warnings {
    Warnings {
      short_ang_rows: self.short_rows,
      missing_ang_rows: self.missing_rows,
      dropped_ang_rows: self.dropped_rows,
      ..Warnings::default()
    }
  }

  /// Store a data row at `index`. Reading stops at the first value that does
  /// not parse; returns the number of values stored.
  fn store_row(&mut self, index: usize, line: &str) -> usize {
    let mut values = [0.0f32; MAX_FIELDS];
    let mut count = 0;
    for token in line.split_whitespace().take(MAX_FIELDS) {
      match token.parse::<f32>() {
        Ok(v) => {
          values[count] = v;
          count += 1;
        }
        Err(_) => break,
      }
    }
    let [p1, p, p2, x, y, iq, ci, ph, sem, fit] = values;
    self.phi1[index] = p1;
    self.phi[index] = p;
    self.phi2[index] = p2;
    self.x[index] = x;
    self.y[index] = y;
    self.image_quality[index] = iq;
    self.confidence_index[index] = ci;
    self.phase[index] = ph as i32;
    self.sem_signal[index] = sem;
    self.fit[index] = fit;
    count
  }
}

/// Non-blank lines left in `reader`, counting `pending` first.
fn count_data_rows(reader: &mut impl BufRead, pending: Option<String>) -> Result<usize, AngError> {
  let mut count = usize::from(pending.is_some_and(|row| !row.trim().is_empty()));
  let mut line = String::new();
  loop {
    line.clear();
    if reader.read_line(&mut line)? == 0 {
      return Ok(count);
    }
    if !line.trim().is_empty() {
      count += 1;
    }
  }
}

fn zeroed<T: Clone + Default>(len: usize) -> Result<Vec<T>, AngError> {
  let mut v = Vec::new();
  v.try_reserve_exact(len)
    .map_err(|_| AngError::Allocation(len))?;
  v.resize(len, T::default());
  Ok(v)
}

/// Reader entry points for `.ang` files.
#[derive(Clone, Copy, Debug, Default)]
pub struct AngReader;

impl AngReader {
  /// Read a whole `.ang` file.
  pub fn read_file(path: impl AsRef<Path>) -> Result<AngData, AngError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| AngError::Open {
      path: path.to_path_buf(),
      source,
    })?;
    let data = Self::parse(BufReader::new(file))?;
    tracing::debug!(
      path = %path.display(),
      points = data.len(),
      short_rows = data.short_rows,
      missing_rows = data.missing_rows,
      "read ANG slice"
    );
    Ok(data)
  }

  /// Read only the header of an `.ang` file.
  pub fn read_header_file(path: impl AsRef<Path>) -> Result<AngHeader, AngError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| AngError::Open {
      path: path.to_path_buf(),
      source,
    })?;
    Ok(Self::parse_header(&mut BufReader::new(file))?.0)
  }

  /// Parse header and data rows from any buffered source.
  pub fn parse(mut reader: impl BufRead) -> Result<AngData, AngError> {
    let (header, first_row) = Self::parse_header(&mut reader)?;
    let rows = header.rows()?;
    if header.grid_kind()? == GridKind::Hexagonal {
      return Err(AngError::HexGrid);
    }
    let cols = header.ncols();
    let total = rows.checked_mul(cols).ok_or(AngError::Allocation(usize::MAX))?;
    let mut data = AngData::zeroed(header, total)?;

    let mut counter = 0;
    let mut pending = first_row;
    let mut line = String::new();
    while counter < total {
      let row = match pending.take() {
        Some(row) => row,
        None => {
          line.clear();
          if reader.read_line(&mut line)? == 0 {
            break;
          }
          std::mem::take(&mut line)
        }
      };
      if row.trim().is_empty() {
        continue;
      }
      let fields = data.store_row(counter, &row);
      data.field_count = data.field_count.max(fields);
      if fields < REQUIRED_FIELDS {
        data.short_rows += 1;
      }
      counter += 1;
    }

    if cols == 0 {
      data.dropped_rows = count_data_rows(&mut reader, pending)?;
      if data.dropped_rows > 0 {
        tracing::warn!(
          rows = data.dropped_rows,
          "ANG header declares no columns, data rows dropped"
        );
      }
    }

    data.missing_rows = total - counter;
    if data.missing_rows > 0 {
      tracing::warn!(
        read = counter,
        expected = total,
        "premature end of ANG data"
      );
    }
    Ok(data)
  }

  /// Consume header lines. Also returns the first data line, which ends the
  /// header and has already been read.
  fn parse_header(reader: &mut impl BufRead) -> Result<(AngHeader, Option<String>), AngError> {
    let mut header = AngHeader::default();
    let mut line = String::new();
    loop {
      line.clear();
      if reader.read_line(&mut line)? == 0 {
        return Ok((header, None));
      }
      let trimmed = line.trim_end_matches(['\r', '\n']);
      if !header.parse_line(trimmed) {
        return Ok((header, Some(trimmed.to_string())));
      }
    }
  }
}

#[cfg(test)]
#[path = "ang_test.rs"]
mod ang_test;
