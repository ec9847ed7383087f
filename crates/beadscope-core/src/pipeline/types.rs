use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::background::SbrMeasurement;
use crate::detection::DetectionMethod;
use crate::fit::FitResult;
use crate::resolution::TheoreticalResolution;
use crate::roi::{Rejection, Roi};
use crate::volume::CandidatePoint;

/// Analysis stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisStage {
    Thresholding,
    Detection,
    RoiExtraction,
    Cropping,
    BackgroundEstimation,
    ProfileFitting,
}

impl std::fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Thresholding => write!(f, "Computing threshold"),
            Self::Detection => write!(f, "Detecting beads"),
            Self::RoiExtraction => write!(f, "Extracting ROIs"),
            Self::Cropping => write!(f, "Cropping beads"),
            Self::BackgroundEstimation => write!(f, "Estimating background"),
            Self::ProfileFitting => write!(f, "Fitting profiles"),
        }
    }
}

/// Thread-safe progress reporting for an analysis run.
///
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. `total_items` is the number of work items
    /// (e.g. beads to fit), if known.
    fn begin_stage(&self, _stage: AnalysisStage, _total_items: Option<usize>) {}

    /// `items_done` work items of the current stage have completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_analysis` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// How far the run got.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum AnalysisStatus {
    /// At least one bead survived ROI rejection and was measured.
    Completed { beads: usize },
    /// No candidate cleared the threshold.
    NoCandidatesFound,
    /// Candidates were found but every one was rejected.
    AllCandidatesRejected { candidates: usize },
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed { beads } => write!(f, "{beads} bead(s) measured"),
            Self::NoCandidatesFound => write!(f, "no beads found"),
            Self::AllCandidatesRejected { candidates } => {
                write!(f, "all {candidates} candidate(s) rejected")
            }
        }
    }
}

/// Everything measured for one retained bead.
#[derive(Clone, Debug)]
pub struct BeadRecord {
    /// Index into the detector's candidate list.
    pub original_index: usize,
    pub candidate: CandidatePoint,
    pub roi: Roi,
    pub cropped: Array3<f32>,
    pub sbr: SbrMeasurement,
    pub fit: FitResult,
}

impl BeadRecord {
    /// FWHM along Z, Y, X; `None` where the fit failed.
    pub fn fwhm(&self) -> [Option<f64>; 3] {
        self.fit.fwhm()
    }

    /// Coefficient of determination along Z, Y, X.
    pub fn determination(&self) -> [Option<f64>; 3] {
        self.fit.r_squared()
    }

    /// Per-parameter uncertainties along Z, Y, X.
    pub fn uncertainty(&self) -> [Option<[f64; 4]>; 3] {
        self.fit
            .axes
            .each_ref()
            .map(|a| a.as_ref().ok().map(|f| f.uncertainty))
    }
}

/// Output of one analysis run.
#[derive(Clone, Debug)]
pub struct AnalysisReport {
    pub status: AnalysisStatus,
    pub method: DetectionMethod,
    pub threshold: f32,
    pub candidates: Vec<CandidatePoint>,
    /// Binary mask from detectors that produce one.
    pub mask: Option<Array3<bool>>,
    pub rejected: Vec<Rejection>,
    /// Candidate index pairs whose ROIs overlap.
    pub overlaps: Vec<(usize, usize)>,
    pub beads: Vec<BeadRecord>,
    pub mean_sbr: Option<f64>,
    pub theoretical: Option<TheoreticalResolution>,
}

impl AnalysisReport {
    pub fn bead_count(&self) -> usize {
        self.beads.len()
    }

    pub fn retained_indices(&self) -> Vec<usize> {
        self.beads.iter().map(|b| b.original_index).collect()
    }

    /// Mean FWHM per axis over the beads whose fit succeeded on that axis.
    pub fn mean_fwhm(&self) -> [Option<f64>; 3] {
        std::array::from_fn(|axis| {
            let values: Vec<f64> = self
                .beads
                .iter()
                .filter_map(|b| b.fwhm()[axis])
                .collect();
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        })
    }
}
