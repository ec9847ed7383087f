use ndarray::Array3;

use crate::error::{BeadError, Result};

/// Equal-width intensity histogram spanning [min, max] of the samples.
#[derive(Clone, Debug)]
pub struct Histogram {
    pub counts: Vec<u64>,
    pub min: f64,
    pub bin_width: f64,
}

impl Histogram {
    /// Build a histogram with `bins` bins over the finite samples of `data`.
    ///
    /// Fails with `DegenerateInput` when there are no finite samples or all
    /// samples share one value: no automatic method is defined on a flat
    /// histogram.
    pub fn from_samples(data: &Array3<f32>, bins: usize) -> Result<Self> {
        let bins = bins.max(2);
        let (min, max) = data
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v as f64), hi.max(v as f64))
            });

        if !min.is_finite() || !max.is_finite() {
            return Err(BeadError::DegenerateInput(
                "volume has no finite samples".into(),
            ));
        }
        if max - min <= 0.0 {
            return Err(BeadError::DegenerateInput(format!(
                "volume is constant-valued ({min})"
            )));
        }

        let bin_width = (max - min) / bins as f64;
        let mut counts = vec![0u64; bins];
        for &v in data.iter().filter(|v| v.is_finite()) {
            let bin = (((v as f64 - min) / bin_width) as usize).min(bins - 1);
            counts[bin] += 1;
        }

        Ok(Self {
            counts,
            min,
            bin_width,
        })
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Intensity at the center of bin `i`.
    pub fn bin_center(&self, i: usize) -> f64 {
        self.min + (i as f64 + 0.5) * self.bin_width
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Count-weighted mean of bin centers over `range`, or `None` if the
    /// range holds no samples.
    pub fn mean_over(&self, range: std::ops::Range<usize>) -> Option<f64> {
        let mut weight = 0.0f64;
        let mut sum = 0.0f64;
        for i in range {
            let c = self.counts[i] as f64;
            weight += c;
            sum += c * self.bin_center(i);
        }
        if weight > 0.0 {
            Some(sum / weight)
        } else {
            None
        }
    }
}
