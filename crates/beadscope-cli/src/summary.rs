use std::path::Path;

use beadscope_core::pipeline::config::AnalysisConfig;
use beadscope_core::pipeline::{AnalysisReport, AnalysisStatus};
use beadscope_core::threshold::ThresholdMode;
use beadscope_core::volume::Axis;
use console::Style;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    warn: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            warn: Style::new().yellow(),
        }
    }
}

fn format_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "-".to_string(),
    }
}

pub fn print_analysis_summary(config: &AnalysisConfig, input: &Path) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Bead Analysis"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(13)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(input.display())
    );
    let sp = &config.pixel_spacing;
    println!(
        "  {:<14}{}",
        s.label.apply_to("Spacing"),
        s.value.apply_to(format!("{} x {} x {} (z, y, x)", sp.z, sp.y, sp.x))
    );
    println!();

    println!("  {}", s.header.apply_to("Detection"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Method"),
        s.method.apply_to(config.detection.method)
    );
    let threshold = match config.detection.threshold_mode() {
        ThresholdMode::Relative(frac) => format!("{:.0}% of max", frac * 100.0),
        ThresholdMode::Auto(method) => format!("auto ({method})"),
    };
    println!(
        "    {:<12}{}",
        s.label.apply_to("Threshold"),
        s.value.apply_to(threshold)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Min Dist"),
        s.value.apply_to(format!("{} vx", config.detection.min_distance))
    );
    println!();

    println!("  {}", s.header.apply_to("ROI"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Bead Size"),
        s.value.apply_to(config.roi.bead_size)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Crop"),
        s.value.apply_to(format!("{}x radius", config.roi.crop_factor))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Z Margin"),
        s.value.apply_to(config.roi.rejection_margin)
    );
    println!();

    println!("  {}", s.header.apply_to("Background"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Annulus"),
        s.value.apply_to(format!(
            "+{} / {} thick",
            config.background.annulus_inner, config.background.annulus_thickness
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Statistic"),
        s.value.apply_to(format!("{:?}", config.background.statistic))
    );
    println!();

    if let Some(ref acq) = config.acquisition {
        println!("  {}", s.header.apply_to("Acquisition"));
        println!(
            "    {:<12}{}",
            s.label.apply_to("Microscope"),
            s.method.apply_to(acq.microscope)
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("Emission"),
            s.value.apply_to(format!("{} nm", acq.emission_wavelength_nm))
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("NA / n"),
            s.value
                .apply_to(format!("{} / {}", acq.numerical_aperture, acq.refractive_index))
        );
    } else {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Acquisition"),
            s.disabled.apply_to("not set")
        );
    }
    println!();
}

pub fn print_report(report: &AnalysisReport, config: &AnalysisConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Results"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(7)));
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Threshold"),
        s.value.apply_to(report.threshold)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Candidates"),
        s.value.apply_to(report.candidates.len())
    );

    let status = match report.status {
        AnalysisStatus::Completed { .. } => s.method.apply_to(report.status.to_string()),
        _ => s.warn.apply_to(report.status.to_string()),
    };
    println!("  {:<14}{}", s.label.apply_to("Status"), status);
    if !report.rejected.is_empty() {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Rejected"),
            s.warn.apply_to(report.rejected.len())
        );
    }
    if !report.overlaps.is_empty() {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Overlapping"),
            s.warn.apply_to(format!("{} pair(s)", report.overlaps.len()))
        );
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Mean SBR"),
        s.value.apply_to(format_opt(report.mean_sbr, 2))
    );
    println!();

    if report.beads.is_empty() {
        return;
    }

    println!("  {}", s.header.apply_to("Beads"));
    println!(
        "    {}",
        s.label.apply_to(format!(
            "{:>5}  {:>8}  {:>8}  {:>8}  {:>8}",
            "#", "SBR", "FWHM z", "FWHM y", "FWHM x"
        ))
    );
    for bead in &report.beads {
        let fwhm = bead.fwhm();
        println!(
            "    {:>5}  {:>8.2}  {:>8}  {:>8}  {:>8}",
            bead.original_index,
            bead.sbr.sbr,
            format_opt(fwhm[Axis::Z.index()], 3),
            format_opt(fwhm[Axis::Y.index()], 3),
            format_opt(fwhm[Axis::X.index()], 3),
        );
    }
    println!();

    let mean = report.mean_fwhm();
    println!("  {}", s.header.apply_to("Mean FWHM"));
    for axis in Axis::ALL {
        println!(
            "    {:<12}{}",
            s.label.apply_to(axis),
            s.value.apply_to(format_opt(mean[axis.index()], 3))
        );
    }
    if let Some(theory) = report.theoretical {
        let sp = &config.pixel_spacing;
        println!(
            "    {:<12}{}",
            s.label.apply_to("Theory"),
            s.value.apply_to(format!(
                "{:.3} um lateral, {:.3} um axial",
                theory.lateral_um, theory.axial_um
            ))
        );
        if sp.y == 1.0 && sp.x == 1.0 {
            println!(
                "    {}",
                s.disabled
                    .apply_to("unit spacing: measured FWHM is in voxels, not micrometres")
            );
        }
    }
    println!();
}
