//! Meshing Pipeline
//!
//! Runs every stage of a meshing run in order on the calling thread.
//!
//! ```text
//! ┌──────────────┐   ┌──────┐   ┌────────────┐   ┌─────────┐   ┌─────────┐
//! │ FilterGrains ├──►│ Scan ├──►│ Attributes ├──►│ Cleanup ├──►│ Winding │
//! └──────────────┘   └──────┘   └────────────┘   └─────────┘   └────┬────┘
//!                                                                   │
//!        ┌────────────┐   ┌────────────┐   ┌────────┐               │
//!        │ VolumeMesh │◄──┤ Compaction │◄──┤ Grains │◄──────────────┘
//!        └────────────┘   └────────────┘   └────────┘
//! ```
//!
//! An observer is asked before every stage whether to continue; this is the
//! only cancellation point; a stage that has started always completes.

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};

use web_time::Instant;

use crate::error::{MeshError, MeshResult, Warnings};
use crate::index_table;
use crate::mesh::{FinalMesh, Grain, SurfaceMesh};
use crate::types::{MeshConfig, VoxelGrid};
use crate::volume_mesh::{self, VolumeMesh};
use crate::winding::{self, WindingReport};

/// Coarse stages of a meshing run, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
  FilterGrains,
  Scan,
  Attributes,
  Cleanup,
  Winding,
  Grains,
  Compaction,
  VolumeMesh,
}

impl Stage {
  pub const ALL: [Stage; 8] = [
    Stage::FilterGrains,
    Stage::Scan,
    Stage::Attributes,
    Stage::Cleanup,
    Stage::Winding,
    Stage::Grains,
    Stage::Compaction,
    Stage::VolumeMesh,
  ];

  pub const fn name(self) -> &'static str {
    match self {
      Stage::FilterGrains => "filter grains",
      Stage::Scan => "scan voxel grid",
      Stage::Attributes => "triangle attributes",
      Stage::Cleanup => "clean triangles",
      Stage::Winding => "resolve windings",
      Stage::Grains => "grain aggregates",
      Stage::Compaction => "compaction",
      Stage::VolumeMesh => "volume mesh",
    }
  }

  /// Share of the run completed when this stage starts.
  pub fn percent(self) -> u8 {
    let idx = Stage::ALL.iter().position(|&s| s == self).unwrap_or(0);
    (idx * 100 / Stage::ALL.len()) as u8
  }
}

/// Snapshot handed to the observer before a stage starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
  pub stage: Stage,
  pub percent: u8,
  pub message: String,
}

impl Progress {
  fn starting(stage: Stage) -> Self {
    Self {
      stage,
      percent: stage.percent(),
      message: stage.name().to_string(),
    }
  }
}

/// Observer verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
  Continue,
  Cancel,
}

/// Receives progress between stages and may cancel the run.
pub trait StageObserver {
  fn on_stage(&mut self, progress: &Progress) -> Control;
}

/// Observer that never cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {
  fn on_stage(&mut self, _progress: &Progress) -> Control {
    Control::Continue
  }
}

/// A raised flag cancels the run at the next stage boundary.
impl StageObserver for AtomicBool {
  fn on_stage(&mut self, _progress: &Progress) -> Control {
    if self.load(Ordering::Relaxed) {
      Control::Cancel
    } else {
      Control::Continue
    }
  }
}

impl<F> StageObserver for F
where
  F: FnMut(&Progress) -> Control,
{
  fn on_stage(&mut self, progress: &Progress) -> Control {
    self(progress)
  }
}

/// Wall time per executed stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
  pub stages: Vec<(Stage, u64)>,
  pub total_us: u64,
}

impl RunStats {
  /// Time spent in `stage`, if it ran.
  pub fn stage_us(&self, stage: Stage) -> Option<u64> {
    self.stages.iter().find(|(s, _)| *s == stage).map(|&(_, us)| us)
  }
}

/// Everything a meshing run produces.
#[derive(Clone, Debug)]
pub struct MeshOutput {
  pub surface: FinalMesh,
  /// Grain records sorted by label.
  pub grains: Vec<Grain>,
  pub volume: Option<VolumeMesh>,
  /// Labels merged into background by the size filter.
  pub removed_grains: Vec<i32>,
  pub warnings: Warnings,
  pub winding: WindingReport,
  pub stats: RunStats,
}

/// Synchronous meshing run over one voxel grid.
#[derive(Clone, Debug, Default)]
pub struct MeshGenerator {
  config: MeshConfig,
}

impl MeshGenerator {
  pub fn new(config: MeshConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &MeshConfig {
    &self.config
  }

  pub fn run(&self, grid: &VoxelGrid) -> MeshResult<MeshOutput> {
    self.run_with(grid, &mut NoopObserver)
  }

  /// Run all stages, consulting `observer` before each one.
  #[tracing::instrument(skip_all, name = "pipeline::run")]
  pub fn run_with(
    &self,
    grid: &VoxelGrid,
    observer: &mut impl StageObserver,
  ) -> MeshResult<MeshOutput> {
    let config = &self.config;
    let run_start = Instant::now();
    let mut stats = RunStats::default();

    let mut begin = |stage: Stage| -> MeshResult<Instant> {
      let progress = Progress::starting(stage);
      if observer.on_stage(&progress) == Control::Cancel {
        tracing::info!(stage = stage.name(), "meshing cancelled");
        return Err(MeshError::Cancelled { stage });
      }
      tracing::info!(stage = stage.name(), percent = progress.percent, "stage start");
      Ok(Instant::now())
    };
    let finish = |stage: Stage, start: Instant, stats: &mut RunStats| {
      stats
        .stages
        .push((stage, start.elapsed().as_micros() as u64));
    };

    // =========================================================================
    // Stage 1: Small grain filter
    // =========================================================================
    let start = begin(Stage::FilterGrains)?;
    let mut grid = Cow::Borrowed(grid);
    let mut removed_grains = Vec::new();
    if config.min_grain_size > 0 {
      removed_grains = grid.to_mut().filter_small_grains(config.min_grain_size);
      tracing::debug!(removed = removed_grains.len(), "filtered small grains");
    }
    finish(Stage::FilterGrains, start, &mut stats);

    // =========================================================================
    // Stage 2: Index tables and raw entities
    // =========================================================================
    let start = begin(Stage::Scan)?;
    let mut mesh: SurfaceMesh = index_table::scan(&grid, config)?;
    finish(Stage::Scan, start, &mut stats);

    // =========================================================================
    // Stage 3: Triangle attributes
    // =========================================================================
    let start = begin(Stage::Attributes)?;
    mesh.compute_triangle_attributes();
    finish(Stage::Attributes, start, &mut stats);

    // =========================================================================
    // Stage 4: Degenerate and duplicate triangles
    // =========================================================================
    let start = begin(Stage::Cleanup)?;
    let degenerate = mesh.clean_triangles(config.min_triangle_area);
    let duplicate = mesh.delete_triangles();
    let orphaned = mesh.kill_unreferenced_nodes();
    tracing::debug!(degenerate, duplicate, orphaned, "cleanup");
    finish(Stage::Cleanup, start, &mut stats);

    // =========================================================================
    // Stage 5: Winding
    // =========================================================================
    let start = begin(Stage::Winding)?;
    let winding = winding::resolve_windings(&mut mesh, &config.winding)?;
    finish(Stage::Winding, start, &mut stats);

    // =========================================================================
    // Stage 6: Grain aggregates
    // =========================================================================
    let start = begin(Stage::Grains)?;
    let mut grains = mesh.locate_graincenters(|label| config.is_grain_label(label));
    mesh.find_volumes(&mut grains);
    finish(Stage::Grains, start, &mut stats);

    // =========================================================================
    // Stage 7: Compaction
    // =========================================================================
    let start = begin(Stage::Compaction)?;
    let surface = mesh.create_finalnodesandtriangles(config.dangling_policy)?;
    finish(Stage::Compaction, start, &mut stats);

    // =========================================================================
    // Stage 8: Tetrahedral elements
    // =========================================================================
    let volume = if config.volume_mesh {
      let start = begin(Stage::VolumeMesh)?;
      let volume = volume_mesh::generate(&grid, config)?;
      finish(Stage::VolumeMesh, start, &mut stats);
      Some(volume)
    } else {
      None
    };

    stats.total_us = run_start.elapsed().as_micros() as u64;
    let warnings = mesh.warnings;
    warnings.log();
    tracing::info!(
      nodes = surface.node_count(),
      triangles = surface.triangle_count(),
      grains = grains.len(),
      total_us = stats.total_us,
      "meshing complete"
    );

    Ok(MeshOutput {
      surface,
      grains,
      volume,
      removed_grains,
      warnings,
      winding,
      stats,
    })
  }
}
