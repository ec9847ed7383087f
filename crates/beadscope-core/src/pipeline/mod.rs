pub mod config;
mod orchestrator;
mod types;

pub use config::AnalysisConfig;
pub use orchestrator::{run_analysis, run_analysis_reported};
pub use types::{AnalysisReport, AnalysisStage, AnalysisStatus, BeadRecord, ProgressReporter};
