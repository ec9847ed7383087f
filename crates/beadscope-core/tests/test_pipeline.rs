mod common;

use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;

use beadscope_core::detection::DetectionMethod;
use beadscope_core::error::BeadError;
use beadscope_core::pipeline::{
    run_analysis, run_analysis_reported, AnalysisStage, AnalysisStatus, ProgressReporter,
};
use beadscope_core::resolution::AcquisitionParams;
use beadscope_core::roi::RejectionReason;
use beadscope_core::volume::{Axis, CandidatePoint};

use common::{bead_volume, near, single_bead_config, single_bead_volume, SyntheticBead};

#[test]
fn test_single_bead_end_to_end() {
    let volume = single_bead_volume();
    let report = run_analysis(&volume, &single_bead_config()).unwrap();

    assert_eq!(report.status, AnalysisStatus::Completed { beads: 1 });
    assert_eq!(report.method, DetectionMethod::PeakLocalMax);
    assert_relative_eq!(report.threshold, 30.0, epsilon = 1e-3);
    assert_eq!(report.candidates.len(), 1);
    assert!(near(
        &report.candidates[0],
        &CandidatePoint::new(10.0, 25.0, 25.0),
        1.0
    ));
    assert!(report.rejected.is_empty());
    assert_eq!(report.retained_indices(), vec![0]);

    let bead = &report.beads[0];
    assert_eq!(bead.roi.y, 19..32);
    assert_eq!(bead.roi.x, 19..32);
    assert_eq!(bead.cropped.dim(), (20, 13, 13));
    assert!(bead.sbr.sbr.is_finite() && bead.sbr.sbr > 1.0, "{:?}", bead.sbr);
    assert_eq!(report.mean_sbr, Some(bead.sbr.sbr));

    let fwhm = bead.fwhm();
    for axis in Axis::ALL {
        let w = fwhm[axis.index()].unwrap();
        assert_relative_eq!(w, 2.354_820_045 * 2.0, max_relative = 0.05);
    }
    assert!(bead.determination().iter().all(|r| r.unwrap() > 0.95));
    assert!(report.theoretical.is_none());
}

#[test]
fn test_no_candidates_is_a_status_not_an_error() {
    // Peaks must be strictly above the threshold; at the maximum none are.
    let volume = single_bead_volume();
    let config = single_bead_config().with_rel_threshold(1.0);
    let report = run_analysis(&volume, &config).unwrap();
    assert_eq!(report.status, AnalysisStatus::NoCandidatesFound);
    assert!(report.candidates.is_empty());
    assert!(report.beads.is_empty());
    assert_eq!(report.mean_sbr, None);
}

#[test]
fn test_all_candidates_rejected_status() {
    let volume = bead_volume(
        (20, 50, 50),
        &[SyntheticBead::new(1.0, 25.0, 25.0, 100.0, 2.0)],
        0.0,
    );
    let report = run_analysis(&volume, &single_bead_config()).unwrap();
    assert_eq!(
        report.status,
        AnalysisStatus::AllCandidatesRejected { candidates: 1 }
    );
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].reason, RejectionReason::NearZFace);
    assert!(report.beads.is_empty());
}

#[test]
fn test_rejection_preserves_original_indices() {
    let volume = bead_volume(
        (20, 60, 60),
        &[
            SyntheticBead::new(1.0, 15.0, 15.0, 100.0, 2.0),
            SyntheticBead::new(10.0, 45.0, 45.0, 90.0, 2.0),
        ],
        0.0,
    );
    let report = run_analysis(&volume, &single_bead_config()).unwrap();
    assert_eq!(report.candidates.len(), 2);
    assert_eq!(report.status, AnalysisStatus::Completed { beads: 1 });
    assert_eq!(report.rejected[0].index, 0);
    assert_eq!(report.retained_indices(), vec![1]);
    assert_eq!(report.beads[0].candidate, report.candidates[1]);
}

#[test]
fn test_invalid_config_fails_before_running() {
    let volume = single_bead_volume();
    let config = single_bead_config().with_bead_size(-1.0);
    assert!(matches!(
        run_analysis(&volume, &config),
        Err(BeadError::InvalidConfig(_))
    ));
}

#[test]
fn test_theoretical_resolution_is_reported() {
    let volume = single_bead_volume();
    let config = single_bead_config().with_acquisition(AcquisitionParams::default());
    let report = run_analysis(&volume, &config).unwrap();
    let theory = report.theoretical.unwrap();
    assert_relative_eq!(theory.lateral_um, 0.2295, epsilon = 1e-9);
}

#[test]
fn test_each_method_runs_end_to_end() {
    let volume = single_bead_volume();
    for method in DetectionMethod::ALL {
        let config = single_bead_config().with_method(method);
        let report = run_analysis(&volume, &config).unwrap();
        assert_eq!(report.method, method);
        assert_eq!(
            report.status,
            AnalysisStatus::Completed { beads: 1 },
            "{method}"
        );
        assert_eq!(report.mask.is_some(), method == DetectionMethod::Centroid);
    }
}

#[derive(Default)]
struct RecordingReporter {
    stages: Mutex<Vec<(AnalysisStage, Option<usize>)>>,
    finished: Mutex<usize>,
    max_advance: Mutex<usize>,
}

impl ProgressReporter for RecordingReporter {
    fn begin_stage(&self, stage: AnalysisStage, total_items: Option<usize>) {
        self.stages.lock().unwrap().push((stage, total_items));
    }

    fn advance(&self, items_done: usize) {
        let mut max = self.max_advance.lock().unwrap();
        *max = (*max).max(items_done);
    }

    fn finish_stage(&self) {
        *self.finished.lock().unwrap() += 1;
    }
}

#[test]
fn test_reporter_sees_every_stage() {
    let volume = single_bead_volume();
    let reporter = Arc::new(RecordingReporter::default());
    run_analysis_reported(&volume, &single_bead_config(), reporter.clone()).unwrap();

    let stages = reporter.stages.lock().unwrap();
    let names: Vec<AnalysisStage> = stages.iter().map(|(s, _)| *s).collect();
    assert_eq!(
        names,
        vec![
            AnalysisStage::Thresholding,
            AnalysisStage::Detection,
            AnalysisStage::RoiExtraction,
            AnalysisStage::Cropping,
            AnalysisStage::BackgroundEstimation,
            AnalysisStage::ProfileFitting,
        ]
    );
    assert_eq!(stages[5].1, Some(1));
    assert_eq!(*reporter.finished.lock().unwrap(), 6);
    assert_eq!(*reporter.max_advance.lock().unwrap(), 1);
}

#[test]
fn test_reporter_stops_after_detection_when_empty() {
    let volume = single_bead_volume();
    let reporter = Arc::new(RecordingReporter::default());
    let config = single_bead_config().with_rel_threshold(1.0);
    run_analysis_reported(&volume, &config, reporter.clone()).unwrap();
    assert_eq!(reporter.stages.lock().unwrap().len(), 2);
}
