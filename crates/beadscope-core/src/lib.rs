pub mod background;
pub mod consts;
pub mod detection;
pub mod error;
pub mod filters;
pub mod fit;
pub mod io;
pub mod pipeline;
pub mod resolution;
pub mod roi;
pub mod threshold;
pub mod volume;
