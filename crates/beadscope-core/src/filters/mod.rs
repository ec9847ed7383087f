pub mod gaussian_blur;
pub mod laplace;
pub mod max_filter;

pub use gaussian_blur::{gaussian_blur_anisotropic, gaussian_blur_volume};
pub use laplace::{laplacian, normalized_log};
pub use max_filter::{maximum_filter, maximum_filter_anisotropic};
