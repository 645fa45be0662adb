//! Background meshing worker.
//!
//! Runs [`MeshGenerator::run_with`] on rayon's pool and hands progress and the
//! final result back over channels, so a caller on another thread (a UI loop,
//! a job server) can poll without blocking.
//!
//! ```ignore
//! let mut worker = MeshWorker::spawn(grid, MeshConfig::default());
//! loop {
//!     if let Some(p) = worker.progress() {
//!         println!("{}% {}", p.percent, p.message);
//!     }
//!     if let Some(result) = worker.try_result() {
//!         break result;
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::error::{MeshError, MeshResult};
use crate::pipeline::{Control, MeshGenerator, MeshOutput, Progress, StageObserver};
use crate::types::{MeshConfig, VoxelGrid};

/// Forwards progress to the owning [`MeshWorker`] and honours its cancel flag.
struct ChannelObserver {
  cancel: Arc<AtomicBool>,
  progress: Sender<Progress>,
}

impl StageObserver for ChannelObserver {
  fn on_stage(&mut self, progress: &Progress) -> Control {
    // Receiver gone means nobody is listening; keep meshing.
    let _ = self.progress.send(progress.clone());
    if self.cancel.load(Ordering::Relaxed) {
      Control::Cancel
    } else {
      Control::Continue
    }
  }
}

/// Handle to one meshing run executing on the rayon pool.
pub struct MeshWorker {
  cancel: Arc<AtomicBool>,
  progress_rx: Receiver<Progress>,
  result_rx: Receiver<MeshResult<MeshOutput>>,
  latest: Option<Progress>,
  finished: bool,
}

impl MeshWorker {
  /// Queue a meshing run (non-blocking).
  pub fn spawn(grid: VoxelGrid, config: MeshConfig) -> Self {
    let cancel = Arc::new(AtomicBool::new(false));
    let (progress_tx, progress_rx) = crossbeam_channel::unbounded();
    let (result_tx, result_rx) = crossbeam_channel::bounded(1);

    let mut observer = ChannelObserver {
      cancel: Arc::clone(&cancel),
      progress: progress_tx,
    };
    rayon::spawn(move || {
      let result = MeshGenerator::new(config).run_with(&grid, &mut observer);
      let _ = result_tx.send(result);
    });

    Self {
      cancel,
      progress_rx,
      result_rx,
      latest: None,
      finished: false,
    }
  }

  /// Request cancellation; takes effect at the next stage boundary.
  pub fn cancel(&self) {
    self.cancel.store(true, Ordering::Relaxed);
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancel.load(Ordering::Relaxed)
  }

  /// Most recent progress snapshot received so far (non-blocking).
  pub fn progress(&mut self) -> Option<&Progress> {
    if let Some(last) = self.progress_rx.try_iter().last() {
      self.latest = Some(last);
    }
    self.latest.as_ref()
  }

  /// Take the result if the run has finished (non-blocking).
  ///
  /// Returns `None` while running and after the result was already taken.
  pub fn try_result(&mut self) -> Option<MeshResult<MeshOutput>> {
    if self.finished {
      return None;
    }
    match self.result_rx.try_recv() {
      Ok(result) => {
        self.finished = true;
        Some(result)
      }
      Err(TryRecvError::Empty) => None,
      Err(TryRecvError::Disconnected) => {
        self.finished = true;
        Some(Err(MeshError::WorkerLost))
      }
    }
  }

  /// Block until the run finishes.
  pub fn wait(self) -> MeshResult<MeshOutput> {
    if self.finished {
      return Err(MeshError::WorkerLost);
    }
    self.result_rx.recv().unwrap_or(Err(MeshError::WorkerLost))
  }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::pipeline::Stage;

  fn two_grain_grid() -> VoxelGrid {
    VoxelGrid::from_labels(2, 1, 1, vec![1, 2]).unwrap()
  }

  #[test]
  fn test_wait_returns_output() {
    let worker = MeshWorker::spawn(two_grain_grid(), MeshConfig::default());
    let output = worker.wait().unwrap();
    // One shared face plus ten exterior faces.
    assert_eq!(output.surface.triangle_count(), 22);
  }

  #[test]
  fn test_poll_until_done() {
    let mut worker = MeshWorker::spawn(two_grain_grid(), MeshConfig::default());

    let mut result = None;
    for _ in 0..5000 {
      if let Some(r) = worker.try_result() {
        result = Some(r);
        break;
      }
      std::thread::sleep(Duration::from_millis(1));
    }

    assert!(result.unwrap().is_ok());
    assert!(worker.try_result().is_none());
    // Every stage report was queued before the result was sent.
    assert_eq!(worker.progress().map(|p| p.stage), Some(Stage::Compaction));
  }

  #[test]
  fn test_cancel_before_start() {
    // The flag races the first stage check; either outcome is valid.
    let worker = MeshWorker::spawn(two_grain_grid(), MeshConfig::default());
    worker.cancel();
    assert!(worker.is_cancelled());
    match worker.wait() {
      Ok(output) => assert_eq!(output.surface.triangle_count(), 22),
      Err(err) => assert!(matches!(err, MeshError::Cancelled { .. })),
    }
  }

  #[test]
  fn test_cancelled_observer_stops_run() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut observer = ChannelObserver {
      cancel: Arc::new(AtomicBool::new(true)),
      progress: tx,
    };
    let err = MeshGenerator::default()
      .run_with(&two_grain_grid(), &mut observer)
      .unwrap_err();

    assert!(matches!(err, MeshError::Cancelled { stage: Stage::FilterGrains }));
    assert_eq!(rx.try_iter().count(), 1);
  }
}
