//! Error types for VTK and text file I/O.

use std::path::PathBuf;

use thiserror::Error;

use crate::error::MeshError;

/// Result type for file I/O.
pub type IoResult<T> = Result<T, IoError>;

/// Errors raised while reading or writing mesh and voxel files.
#[derive(Debug, Error)]
pub enum IoError {
  #[error("file not found: {path}")]
  FileNotFound { path: PathBuf },

  /// Malformed header or data section.
  #[error("invalid file content: {message}")]
  InvalidContent { message: String },

  /// Line 3 is neither `ASCII` nor `BINARY`.
  #[error("unknown VTK encoding {0:?}, expected ASCII or BINARY")]
  UnknownEncoding(String),

  #[error("unsupported VTK dataset {0:?}")]
  UnsupportedDataset(String),

  #[error("unsupported VTK scalar type {0:?}")]
  UnsupportedScalarType(String),

  #[error("no SCALARS section named {name:?}")]
  ScalarNotFound { name: String },

  #[error("unexpected end of file at byte {position}")]
  UnexpectedEof { position: u64 },

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("float parsing error: {0}")]
  ParseFloat(#[from] std::num::ParseFloatError),

  #[error("integer parsing error: {0}")]
  ParseInt(#[from] std::num::ParseIntError),

  #[error(transparent)]
  Grid(#[from] MeshError),
}

impl IoError {
  #[must_use]
  pub fn invalid_content(message: impl Into<String>) -> Self {
    Self::InvalidContent {
      message: message.into(),
    }
  }

  /// Negative status code for callers that expect integer codes.
  pub fn code(&self) -> i32 {
    match self {
      IoError::FileNotFound { .. } | IoError::Io(_) => -100,
      IoError::InvalidContent { .. }
      | IoError::UnknownEncoding(_)
      | IoError::UnsupportedDataset(_)
      | IoError::UnsupportedScalarType(_)
      | IoError::UnexpectedEof { .. }
      | IoError::ParseFloat(_)
      | IoError::ParseInt(_) => -200,
      IoError::ScalarNotFound { .. } => -300,
      IoError::Grid(e) => e.code(),
    }
  }
}
