use serde::{Deserialize, Serialize};

use crate::error::BeadError;

/// Histogram-based automatic threshold algorithm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoThreshold {
    /// Maximizes the between-class variance.
    #[default]
    Otsu,
    /// Ridler-Calvard iterative intermeans.
    Isodata,
    /// Minimum cross-entropy (Li & Tam).
    Li,
    /// Valley between the two peaks of a smoothed histogram.
    Minimum,
    /// Zack's triangle method, for a single dominant background peak.
    Triangle,
}

impl AutoThreshold {
    pub const ALL: [AutoThreshold; 5] = [
        AutoThreshold::Otsu,
        AutoThreshold::Isodata,
        AutoThreshold::Li,
        AutoThreshold::Minimum,
        AutoThreshold::Triangle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AutoThreshold::Otsu => "otsu",
            AutoThreshold::Isodata => "isodata",
            AutoThreshold::Li => "li",
            AutoThreshold::Minimum => "minimum",
            AutoThreshold::Triangle => "triangle",
        }
    }
}

impl std::fmt::Display for AutoThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for AutoThreshold {
    type Err = BeadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        AutoThreshold::ALL
            .into_iter()
            .find(|m| m.name() == needle)
            .ok_or_else(|| BeadError::InvalidConfig(format!("unknown threshold method '{s}'")))
    }
}

/// How the binarization threshold is derived from a volume.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ThresholdMode {
    /// Fraction in [0, 1] of the volume maximum.
    Relative(f64),
    /// Automatic histogram method.
    Auto(AutoThreshold),
}

impl Default for ThresholdMode {
    fn default() -> Self {
        Self::Relative(crate::consts::DEFAULT_REL_THRESHOLD)
    }
}

impl std::fmt::Display for ThresholdMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Relative(frac) => write!(f, "Relative ({frac})"),
            Self::Auto(method) => write!(f, "Auto ({method})"),
        }
    }
}
