use thiserror::Error;

#[derive(Error, Debug)]
pub enum BeadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The volume has no usable contrast for the requested operation, or its
    /// histogram lacks the shape an automatic method needs (e.g. the minimum
    /// method on a histogram that is not bimodal). Callers may retry with a
    /// relative threshold.
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Invalid volume dimensions: {depth}x{height}x{width}")]
    InvalidDimensions {
        depth: usize,
        height: usize,
        width: usize,
    },

    #[error("No image slices found in {}", .0.display())]
    NoSlices(std::path::PathBuf),

    #[error("No cropped volumes to measure")]
    EmptyBatch,

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

pub type Result<T> = std::result::Result<T, BeadError>;
