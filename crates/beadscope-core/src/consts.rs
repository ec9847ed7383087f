/// Minimum voxel count (z*y*x) to use lane-level Rayon parallelism in filters.
pub const PARALLEL_VOXEL_THRESHOLD: usize = 262_144;

/// Number of histogram bins used by the automatic threshold methods.
pub const THRESHOLD_HISTOGRAM_BINS: usize = 256;

/// Maximum smoothing passes for the minimum-method histogram before giving up.
pub const MINIMUM_METHOD_MAX_ITERATIONS: usize = 10_000;

/// Maximum iterations of the isodata and Li fixed-point searches.
pub const THRESHOLD_MAX_ITERATIONS: usize = 1_000;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f64 = 1e-12;

/// Background intensity used in place of a zero or negative annulus
/// background, so the SBR stays finite. Beads measured this way are flagged.
pub const SBR_BACKGROUND_FLOOR: f64 = 1e-6;

/// `2 * sqrt(2 * ln 2)`: converts a Gaussian sigma to its FWHM.
pub const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949;

/// Gaussian kernels are truncated at this many sigmas.
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;

// Detection defaults.

/// Default minimum separation between local maxima, in voxels.
pub const DEFAULT_MIN_DISTANCE: usize = 10;

/// Default largest scale searched by the blob detectors, in voxels.
pub const DEFAULT_BLOB_SIGMA: f64 = 3.0;

/// Default smallest scale searched by the blob detectors, in voxels.
pub const DEFAULT_BLOB_MIN_SIGMA: f64 = 1.0;

/// Default number of Laplacian-of-Gaussian scales.
pub const DEFAULT_LOG_NUM_SCALES: usize = 10;

/// Ratio between successive Difference-of-Gaussians scales.
pub const DEFAULT_DOG_SIGMA_RATIO: f64 = 1.6;

/// Default relative threshold (fraction of the volume maximum).
pub const DEFAULT_REL_THRESHOLD: f64 = 0.06;

/// Default minimum connected-component volume for the centroid detector.
pub const DEFAULT_MIN_COMPONENT_VOXELS: usize = 1;

// ROI defaults, physical units unless noted.

/// Default nominal bead diameter.
pub const DEFAULT_BEAD_SIZE: f64 = 10.0;

/// Default multiplier applied to the bead radius to size the crop.
pub const DEFAULT_CROP_FACTOR: f64 = 5.0;

/// Default distance from the Z faces inside which beads are rejected.
pub const DEFAULT_REJECTION_MARGIN: f64 = 10.0;

/// Default gap between the bead edge and the background annulus.
pub const DEFAULT_ANNULUS_INNER: f64 = 10.0;

/// Default background annulus thickness.
pub const DEFAULT_ANNULUS_THICKNESS: f64 = 10.0;

// Fitting defaults.

/// Default iteration cap for the Levenberg-Marquardt optimizer.
pub const DEFAULT_FIT_MAX_ITERATIONS: usize = 200;

/// Minimum normalized contrast (max - background) a profile needs to be fitted.
pub const MIN_PROFILE_CONTRAST: f64 = 1e-6;

/// Number of free parameters of the Gaussian profile model.
pub const GAUSSIAN_PARAM_COUNT: usize = 4;
