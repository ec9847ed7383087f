use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::warn;

use crate::error::{BeadError, Result};
use crate::volume::Volume;

use super::{detect, DetectionConfig, DetectionOutcome};

/// Detection running on a background thread.
///
/// A UI polls the job each frame; a batch caller just waits on it.
pub struct DetectionJob {
    rx: mpsc::Receiver<Result<DetectionOutcome>>,
    handle: Option<JoinHandle<()>>,
    result: Option<Result<DetectionOutcome>>,
}

/// Start detection on its own thread. The volume is shared read-only.
pub fn spawn_detection(volume: Arc<Volume>, config: DetectionConfig) -> DetectionJob {
    let (tx, rx) = mpsc::channel();
    let handle = std::thread::spawn(move || {
        let outcome = detect(&volume, &config);
        let _ = tx.send(outcome);
    });
    DetectionJob {
        rx,
        handle: Some(handle),
        result: None,
    }
}

impl DetectionJob {
    /// Check for completion without blocking. Returns true once a result
    /// (or a worker failure) is available.
    pub fn poll(&mut self) -> bool {
        if self.result.is_some() {
            return true;
        }
        match self.rx.try_recv() {
            Ok(outcome) => {
                self.result = Some(outcome);
                self.join();
                true
            }
            Err(mpsc::TryRecvError::Empty) => false,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.result = Some(Err(worker_lost()));
                self.join();
                true
            }
        }
    }

    /// Block until detection finishes and take its result.
    pub fn wait(mut self) -> Result<DetectionOutcome> {
        let outcome = match self.result.take() {
            Some(outcome) => outcome,
            None => self.rx.recv().unwrap_or_else(|_| Err(worker_lost())),
        };
        self.join();
        outcome
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Detection worker panicked");
            }
        }
    }
}

fn worker_lost() -> BeadError {
    BeadError::WorkerPool("detection worker exited without a result".into())
}
