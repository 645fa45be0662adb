//! EBSD scan ingestion: TSL `.ang` slices and their stacking into a voxel grid.

mod ang;
mod stack;

pub use ang::{AngData, AngError, AngHeader, AngPhase, AngReader, GridKind};
pub use stack::{phase_labels, SliceStack};
