use std::path::PathBuf;

use anyhow::{Context, Result};
use beadscope_core::io::{list_slices, load_stack};
use clap::Args;

#[derive(Args)]
pub struct InfoArgs {
    /// Directory of Z slices (TIFF or PNG)
    pub dir: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let slices = list_slices(&args.dir)
        .with_context(|| format!("Failed to list {}", args.dir.display()))?;
    let volume = load_stack(&args.dir)
        .with_context(|| format!("Failed to load Z-stack from {}", args.dir.display()))?;

    println!("Directory:   {}", args.dir.display());
    println!("Slices:      {}", slices.len());
    println!(
        "Dimensions:  {}x{}x{} (z, y, x)",
        volume.depth(),
        volume.height(),
        volume.width()
    );
    if let Some((min, max)) = volume.intensity_range() {
        println!("Intensity:   {min} .. {max}");
    }
    if let (Some(first), Some(last)) = (slices.first(), slices.last()) {
        println!("First slice: {}", first.display());
        println!("Last slice:  {}", last.display());
    }

    let total_mb = (volume.data.len() * std::mem::size_of::<f32>()) as f64 / (1024.0 * 1024.0);
    println!("In memory:   {:.1} MB", total_mb);

    Ok(())
}
