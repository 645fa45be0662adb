//! grain_mesh - Surface and volume meshing of labelled voxel microstructures
//!
//! Turns a 3-D grid of grain labels (from a VTK file or a stack of EBSD
//! `.ang` slices) into a conforming triangle surface between grains, per-grain
//! aggregates, and optionally a tetrahedral volume mesh with quality
//! histograms.
//!
//! # Features
//!
//! - **Index tables**: every lattice corner, edge and face touched by a grain
//!   boundary gets a dense index on first sight, in deterministic scan order
//! - **Winding resolution**: breadth-first patch walk that makes each grain's
//!   triangles consistently oriented
//! - **Grain aggregates**: centroids, bounds, areas and enclosed volumes
//! - **Volume mesh**: six-tetrahedron voxel split with dihedral-angle and
//!   volume-ratio histograms
//! - **I/O**: VTK legacy reader and writers, plain-text tables, TSL `.ang`
//!   ingestion
//!
//! # Example
//!
//! ```ignore
//! use grain_mesh::{MeshConfig, MeshGenerator, VoxelGrid};
//!
//! let grid = VoxelGrid::from_labels(2, 1, 1, vec![1, 2])?;
//! let output = MeshGenerator::new(MeshConfig::default()).run(&grid)?;
//!
//! println!("{} nodes, {} triangles",
//!     output.surface.node_count(), output.surface.triangle_count());
//! ```

pub mod constants;
pub mod error;
pub mod types;

pub use constants::{Axis, LatticeDims, BACKGROUND_LABEL, CORNER_OFFSETS, EXTERIOR_LABEL};
pub use error::{MeshError, MeshResult, WindingError, Warnings};
pub use types::{Bounds, DanglingPolicy, MeshConfig, VoxelGrid, WindingConfig};

// Boundary entity discovery
pub mod index_table;
pub use index_table::SentinelIndex;

// Node, edge, triangle and grain records
pub mod mesh;
pub use mesh::{FinalMesh, Grain, SurfaceMesh};

pub mod winding;
pub use winding::{resolve_windings, Patch, WindingCheck, WindingReport};

// Tetrahedral element path
pub mod volume_mesh;
pub use volume_mesh::{DihedralHistogram, Element, VolumeMesh};

// Input and output
pub mod ebsd;
pub mod io;

pub mod pipeline;
pub use pipeline::{Control, MeshGenerator, MeshOutput, Progress, RunStats, Stage, StageObserver};

// Background worker adapter
pub mod threading;
pub use threading::MeshWorker;
