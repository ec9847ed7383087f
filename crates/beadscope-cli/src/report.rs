//! Serializable analysis report written by `beadscope analyze --report`.

use std::ops::Range;

use beadscope_core::fit::AxisResult;
use beadscope_core::pipeline::{AnalysisReport, BeadRecord};
use beadscope_core::resolution::TheoreticalResolution;
use beadscope_core::volume::Axis;
use serde::Serialize;

#[derive(Serialize)]
pub struct ReportFile {
    pub input: String,
    pub status: String,
    pub method: String,
    pub threshold: f32,
    pub candidates: usize,
    pub mean_sbr: Option<f64>,
    pub theoretical: Option<TheoreticalResolution>,
    pub rejected: Vec<RejectedEntry>,
    pub overlaps: Vec<[usize; 2]>,
    pub beads: Vec<BeadEntry>,
}

#[derive(Serialize)]
pub struct RejectedEntry {
    pub index: usize,
    pub position: [f64; 3],
    pub reason: String,
}

#[derive(Serialize)]
pub struct BeadEntry {
    pub index: usize,
    /// Candidate position in voxels, (z, y, x).
    pub position: [f64; 3],
    pub roi_z: [usize; 2],
    pub roi_y: [usize; 2],
    pub roi_x: [usize; 2],
    pub signal: f64,
    pub background: f64,
    pub sbr: f64,
    pub sbr_quality: String,
    pub z: AxisEntry,
    pub y: AxisEntry,
    pub x: AxisEntry,
}

#[derive(Serialize)]
pub struct AxisEntry {
    pub fwhm: Option<f64>,
    pub fwhm_uncertainty: Option<f64>,
    pub center: Option<f64>,
    pub amplitude: Option<f64>,
    pub background: Option<f64>,
    pub r_squared: Option<f64>,
    pub failure: Option<String>,
}

impl AxisEntry {
    fn from_result(result: &AxisResult) -> Self {
        match result {
            Ok(fit) => Self {
                fwhm: Some(fit.fwhm),
                fwhm_uncertainty: Some(fit.fwhm_uncertainty),
                center: Some(fit.params.center),
                amplitude: Some(fit.params.amplitude),
                background: Some(fit.params.background),
                r_squared: Some(fit.r_squared),
                failure: None,
            },
            Err(failure) => Self {
                fwhm: None,
                fwhm_uncertainty: None,
                center: None,
                amplitude: None,
                background: None,
                r_squared: None,
                failure: Some(failure.to_string()),
            },
        }
    }
}

fn span(range: &Range<usize>) -> [usize; 2] {
    [range.start, range.end]
}

impl BeadEntry {
    fn from_record(bead: &BeadRecord) -> Self {
        let c = bead.candidate;
        Self {
            index: bead.original_index,
            position: [c.z, c.y, c.x],
            roi_z: span(&bead.roi.z),
            roi_y: span(&bead.roi.y),
            roi_x: span(&bead.roi.x),
            signal: bead.sbr.signal,
            background: bead.sbr.background,
            sbr: bead.sbr.sbr,
            sbr_quality: bead.sbr.quality.to_string(),
            z: AxisEntry::from_result(bead.fit.axis(Axis::Z)),
            y: AxisEntry::from_result(bead.fit.axis(Axis::Y)),
            x: AxisEntry::from_result(bead.fit.axis(Axis::X)),
        }
    }
}

impl ReportFile {
    pub fn new(input: &str, report: &AnalysisReport) -> Self {
        Self {
            input: input.to_string(),
            status: report.status.to_string(),
            method: report.method.to_string(),
            threshold: report.threshold,
            candidates: report.candidates.len(),
            mean_sbr: report.mean_sbr,
            theoretical: report.theoretical,
            rejected: report
                .rejected
                .iter()
                .map(|r| RejectedEntry {
                    index: r.index,
                    position: [r.candidate.z, r.candidate.y, r.candidate.x],
                    reason: r.reason.to_string(),
                })
                .collect(),
            overlaps: report.overlaps.iter().map(|&(a, b)| [a, b]).collect(),
            beads: report.beads.iter().map(BeadEntry::from_record).collect(),
        }
    }
}
