use std::sync::Arc;

use tracing::info;

use crate::background::estimate_sbr;
use crate::detection::detect_with_threshold;
use crate::error::Result;
use crate::fit::fit_profiles;
use crate::roi::{crop_beads, extract_rois};
use crate::threshold::compute_threshold;
use crate::volume::Volume;

use super::config::AnalysisConfig;
use super::types::{
    AnalysisReport, AnalysisStage, AnalysisStatus, BeadRecord, NoOpReporter, ProgressReporter,
};

/// Run detection, ROI extraction, SBR estimation and profile fitting with a
/// thread-safe progress reporter.
///
/// Configuration errors and degenerate volumes are returned as errors before
/// any stage runs. Finding no beads, or rejecting all of them, is reported
/// through [`AnalysisStatus`].
pub fn run_analysis_reported(
    volume: &Volume,
    config: &AnalysisConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<AnalysisReport> {
    config.validate()?;
    info!(
        depth = volume.depth(),
        height = volume.height(),
        width = volume.width(),
        method = %config.detection.method,
        "Starting bead analysis"
    );
    let theoretical = config
        .acquisition
        .as_ref()
        .map(|a| a.theoretical_resolution())
        .transpose()?;

    reporter.begin_stage(AnalysisStage::Thresholding, None);
    let threshold = compute_threshold(&volume.data, &config.detection.threshold_mode())?;
    reporter.finish_stage();

    reporter.begin_stage(AnalysisStage::Detection, None);
    let outcome = detect_with_threshold(volume, &config.detection, threshold);
    reporter.finish_stage();

    let mut report = AnalysisReport {
        status: AnalysisStatus::NoCandidatesFound,
        method: outcome.method,
        threshold,
        candidates: outcome.candidates,
        mask: outcome.mask,
        rejected: Vec::new(),
        overlaps: Vec::new(),
        beads: Vec::new(),
        mean_sbr: None,
        theoretical,
    };
    if report.candidates.is_empty() {
        info!("No bead candidates above threshold");
        return Ok(report);
    }

    reporter.begin_stage(AnalysisStage::RoiExtraction, Some(report.candidates.len()));
    let extraction = extract_rois(
        volume,
        &report.candidates,
        &config.roi,
        &config.pixel_spacing,
    )?;
    reporter.finish_stage();
    report.rejected = extraction.rejected.clone();
    report.overlaps = extraction.overlaps.clone();
    if extraction.is_empty() {
        report.status = AnalysisStatus::AllCandidatesRejected {
            candidates: report.candidates.len(),
        };
        info!(candidates = report.candidates.len(), "Every candidate was rejected");
        return Ok(report);
    }

    reporter.begin_stage(AnalysisStage::Cropping, Some(extraction.rois.len()));
    let beads = crop_beads(volume, &report.candidates, &extraction);
    reporter.finish_stage();

    reporter.begin_stage(AnalysisStage::BackgroundEstimation, Some(beads.len()));
    let sbr = estimate_sbr(
        &beads,
        config.roi.bead_radius(),
        &config.background,
        &config.pixel_spacing,
    )?;
    reporter.finish_stage();

    reporter.begin_stage(AnalysisStage::ProfileFitting, Some(beads.len()));
    let fits = fit_profiles(&beads, &config.pixel_spacing, &config.fit, |done| {
        reporter.advance(done)
    })?;
    reporter.finish_stage();

    report.beads = beads
        .into_iter()
        .zip(sbr.per_bead)
        .zip(fits)
        .map(|((bead, sbr), fit)| BeadRecord {
            original_index: bead.source_index(),
            candidate: report.candidates[bead.source_index()],
            roi: bead.roi,
            cropped: bead.data,
            sbr,
            fit,
        })
        .collect();
    report.mean_sbr = sbr.mean_sbr;
    report.status = AnalysisStatus::Completed {
        beads: report.beads.len(),
    };

    info!(
        beads = report.beads.len(),
        rejected = report.rejected.len(),
        mean_sbr = report.mean_sbr.unwrap_or(f64::NAN),
        "Bead analysis complete"
    );
    Ok(report)
}

/// Run the full analysis without progress reporting.
pub fn run_analysis(volume: &Volume, config: &AnalysisConfig) -> Result<AnalysisReport> {
    run_analysis_reported(volume, config, Arc::new(NoOpReporter))
}
