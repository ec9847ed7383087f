use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use beadscope_core::detection::DetectionMethod;
use beadscope_core::io::{load_stack, save_stack};
use beadscope_core::pipeline::config::AnalysisConfig;
use beadscope_core::pipeline::{run_analysis_reported, AnalysisReport};
use beadscope_core::threshold::AutoThreshold;
use beadscope_core::volume::PixelSpacing;
use clap::{Args, ValueEnum};

use crate::progress::BarProgressReporter;
use crate::report::ReportFile;
use crate::summary::{print_analysis_summary, print_report};

#[derive(Clone, ValueEnum)]
pub enum MethodArg {
    PeakLocalMax,
    BlobLog,
    BlobDog,
    Centroid,
}

impl From<&MethodArg> for DetectionMethod {
    fn from(arg: &MethodArg) -> Self {
        match arg {
            MethodArg::PeakLocalMax => DetectionMethod::PeakLocalMax,
            MethodArg::BlobLog => DetectionMethod::BlobLog,
            MethodArg::BlobDog => DetectionMethod::BlobDog,
            MethodArg::Centroid => DetectionMethod::Centroid,
        }
    }
}

#[derive(Clone, ValueEnum)]
pub enum AutoThresholdArg {
    Otsu,
    Isodata,
    Li,
    Minimum,
    Triangle,
}

impl From<&AutoThresholdArg> for AutoThreshold {
    fn from(arg: &AutoThresholdArg) -> Self {
        match arg {
            AutoThresholdArg::Otsu => AutoThreshold::Otsu,
            AutoThresholdArg::Isodata => AutoThreshold::Isodata,
            AutoThresholdArg::Li => AutoThreshold::Li,
            AutoThresholdArg::Minimum => AutoThreshold::Minimum,
            AutoThresholdArg::Triangle => AutoThreshold::Triangle,
        }
    }
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Directory of Z slices (TIFF or PNG)
    pub dir: PathBuf,

    /// Analysis config file (TOML); flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Detection method
    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,

    /// Relative threshold, fraction of the volume maximum (0-1)
    #[arg(long, conflicts_with = "auto_threshold")]
    pub threshold: Option<f64>,

    /// Automatic threshold method
    #[arg(long, value_enum)]
    pub auto_threshold: Option<AutoThresholdArg>,

    /// Minimum distance between local maxima, in voxels
    #[arg(long)]
    pub min_distance: Option<usize>,

    /// Largest blob scale, in voxels
    #[arg(long)]
    pub sigma: Option<f64>,

    /// Nominal bead diameter (physical units)
    #[arg(long)]
    pub bead_size: Option<f64>,

    /// Crop half-extent as a multiple of the bead radius
    #[arg(long)]
    pub crop_factor: Option<f64>,

    /// Reject beads closer than this to the top or bottom slice
    #[arg(long)]
    pub rejection_margin: Option<f64>,

    /// Gap between bead edge and background shell
    #[arg(long)]
    pub annulus_inner: Option<f64>,

    /// Background shell thickness
    #[arg(long)]
    pub annulus_thickness: Option<f64>,

    /// Voxel size as "z,y,x"
    #[arg(long)]
    pub spacing: Option<String>,

    /// Worker threads for profile fitting (0 = one per core)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Write the full report as TOML
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Save every bead crop as a slice series in this directory
    #[arg(long)]
    pub export_crops: Option<PathBuf>,
}

pub fn run(args: &AnalyzeArgs) -> Result<()> {
    let config = build_config(args)?;
    print_analysis_summary(&config, &args.dir);

    let volume = load_stack(&args.dir)
        .with_context(|| format!("Failed to load Z-stack from {}", args.dir.display()))?;

    let reporter = Arc::new(BarProgressReporter::new());
    let report = run_analysis_reported(&volume, &config, reporter.clone())?;
    reporter.finish();

    print_report(&report, &config);

    if let Some(ref path) = args.report {
        let file = ReportFile::new(&args.dir.display().to_string(), &report);
        let toml_str = toml::to_string_pretty(&file)?;
        std::fs::write(path, toml_str)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("Report saved to {}", path.display());
    }

    if let Some(ref dir) = args.export_crops {
        let count = export_crops(&report, dir)?;
        println!("{count} crop(s) saved to {}", dir.display());
    }

    Ok(())
}

fn build_config(args: &AnalyzeArgs) -> Result<AnalysisConfig> {
    let mut config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid analysis config")?
    } else {
        AnalysisConfig::default()
    };

    if let Some(ref method) = args.method {
        config = config.with_method(method.into());
    }
    if let Some(fraction) = args.threshold {
        config = config.with_rel_threshold(fraction);
    }
    if let Some(ref method) = args.auto_threshold {
        config = config.with_auto_threshold(method.into());
    }
    if let Some(d) = args.min_distance {
        config = config.with_min_distance(d);
    }
    if let Some(sigma) = args.sigma {
        config = config.with_sigma(sigma);
    }
    if let Some(size) = args.bead_size {
        config = config.with_bead_size(size);
    }
    if let Some(factor) = args.crop_factor {
        config = config.with_crop_factor(factor);
    }
    if let Some(margin) = args.rejection_margin {
        config = config.with_rejection_margin(margin);
    }
    if args.annulus_inner.is_some() || args.annulus_thickness.is_some() {
        let inner = args.annulus_inner.unwrap_or(config.background.annulus_inner);
        let thickness = args
            .annulus_thickness
            .unwrap_or(config.background.annulus_thickness);
        config = config.with_annulus(inner, thickness);
    }
    if let Some(ref spacing) = args.spacing {
        config = config.with_pixel_spacing(parse_spacing(spacing)?);
    }
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }

    config.validate().context("Invalid analysis config")?;
    Ok(config)
}

fn parse_spacing(s: &str) -> Result<PixelSpacing> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Invalid spacing '{s}'"))?;
    match values.as_slice() {
        [z, y, x] => Ok(PixelSpacing::new(*z, *y, *x)),
        [v] => Ok(PixelSpacing::isotropic(*v)),
        _ => bail!("Spacing must be \"z,y,x\" or a single value, got '{s}'"),
    }
}

fn export_crops(report: &AnalysisReport, dir: &std::path::Path) -> Result<usize> {
    for bead in &report.beads {
        let stem = format!("bead_{:03}", bead.original_index);
        save_stack(&bead.cropped, dir, &stem)
            .with_context(|| format!("Failed to export {stem} to {}", dir.display()))?;
    }
    Ok(report.beads.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spacing() {
        assert_eq!(
            parse_spacing("0.3, 0.1,0.1").unwrap(),
            PixelSpacing::new(0.3, 0.1, 0.1)
        );
        assert_eq!(parse_spacing("2").unwrap(), PixelSpacing::isotropic(2.0));
        assert!(parse_spacing("1,2").is_err());
        assert!(parse_spacing("a,b,c").is_err());
    }
}
