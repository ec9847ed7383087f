use crate::consts::{MINIMUM_METHOD_MAX_ITERATIONS, THRESHOLD_MAX_ITERATIONS};
use crate::error::{BeadError, Result};

use super::config::AutoThreshold;
use super::histogram::Histogram;

/// Run the selected automatic method on a prepared histogram.
pub fn apply(method: AutoThreshold, hist: &Histogram) -> Result<f64> {
    match method {
        AutoThreshold::Otsu => Ok(otsu(hist)),
        AutoThreshold::Isodata => Ok(isodata(hist)),
        AutoThreshold::Li => Ok(li(hist)),
        AutoThreshold::Minimum => minimum(hist),
        AutoThreshold::Triangle => triangle(hist),
    }
}

/// Otsu's thresholding: find the bin that maximizes between-class variance.
pub fn otsu(hist: &Histogram) -> f64 {
    let total = hist.total() as f64;
    let mut sum_all = 0.0f64;
    for (i, &count) in hist.counts.iter().enumerate() {
        sum_all += i as f64 * count as f64;
    }

    let mut weight_bg = 0.0f64;
    let mut sum_bg = 0.0f64;
    let mut best_variance = 0.0f64;
    let mut best_bin = 0usize;

    for (i, &count) in hist.counts.iter().enumerate() {
        weight_bg += count as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0.0 {
            break;
        }
        sum_bg += i as f64 * count as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;
        let between_variance = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);

        if between_variance > best_variance {
            best_variance = between_variance;
            best_bin = i;
        }
    }

    hist.bin_center(best_bin)
}

/// Number of bins whose center is at or below `t`, kept inside `1..len`
/// so both classes are non-empty (the first and last bins always hold the
/// extreme samples).
fn split_index(hist: &Histogram, t: f64) -> usize {
    let below = (0..hist.len())
        .take_while(|&i| hist.bin_center(i) <= t)
        .count();
    below.clamp(1, hist.len() - 1)
}

fn class_means(hist: &Histogram, split: usize) -> (f64, f64) {
    let low = hist.mean_over(0..split).unwrap_or(hist.bin_center(0));
    let high = hist
        .mean_over(split..hist.len())
        .unwrap_or(hist.bin_center(hist.len() - 1));
    (low, high)
}

/// Ridler-Calvard isodata: iterate `t = (mean_low + mean_high) / 2` until the
/// class partition stops changing.
pub fn isodata(hist: &Histogram) -> f64 {
    let n = hist.len();
    let mut t = hist.mean_over(0..n).unwrap_or(hist.bin_center(n / 2));
    let mut split = split_index(hist, t);

    for _ in 0..THRESHOLD_MAX_ITERATIONS {
        let (low, high) = class_means(hist, split);
        t = 0.5 * (low + high);
        let next_split = split_index(hist, t);
        if next_split == split {
            break;
        }
        split = next_split;
    }
    t
}

/// Li's minimum cross-entropy threshold.
///
/// Intensities are shifted so the histogram starts at zero; all bin centers
/// are then strictly positive and the logarithms are defined.
pub fn li(hist: &Histogram) -> f64 {
    let n = hist.len();
    let tolerance = hist.bin_width * 0.5;
    let shift = hist.min;

    let mut t_next = hist.mean_over(0..n).unwrap_or(hist.bin_center(n / 2)) - shift;
    let mut t_curr = -2.0 * tolerance;

    for _ in 0..THRESHOLD_MAX_ITERATIONS {
        if (t_next - t_curr).abs() <= tolerance {
            break;
        }
        t_curr = t_next;
        let split = split_index(hist, t_curr + shift);
        let (back, fore) = class_means(hist, split);
        let mean_back = back - shift;
        let mean_fore = fore - shift;
        if mean_back <= 0.0 || mean_fore <= mean_back {
            break;
        }
        t_next = (mean_back - mean_fore) / (mean_back.ln() - mean_fore.ln());
    }

    t_next + shift
}

/// Indices of local maxima, walking the histogram left to right and
/// recording each point where it turns from rising to falling.
fn local_maxima(hist: &[f64]) -> Vec<usize> {
    let mut maxima = Vec::new();
    let mut rising = true;
    for i in 0..hist.len().saturating_sub(1) {
        if rising {
            if hist[i + 1] < hist[i] {
                rising = false;
                maxima.push(i);
            }
        } else if hist[i + 1] > hist[i] {
            rising = true;
        }
    }
    maxima
}

/// Mean filter of width 3 with reflected edges.
fn smooth3(hist: &[f64]) -> Vec<f64> {
    let n = hist.len();
    (0..n)
        .map(|i| {
            let prev = hist[i.saturating_sub(1)];
            let next = hist[(i + 1).min(n - 1)];
            (prev + hist[i] + next) / 3.0
        })
        .collect()
}

/// Minimum method: smooth the histogram until exactly two maxima remain and
/// return the valley between them.
pub fn minimum(hist: &Histogram) -> Result<f64> {
    let mut smoothed: Vec<f64> = hist.counts.iter().map(|&c| c as f64).collect();
    let mut maxima = Vec::new();

    for _ in 0..MINIMUM_METHOD_MAX_ITERATIONS {
        smoothed = smooth3(&smoothed);
        maxima = local_maxima(&smoothed);
        if maxima.len() < 3 {
            break;
        }
    }

    if maxima.len() != 2 {
        return Err(BeadError::DegenerateInput(format!(
            "minimum threshold needs a bimodal histogram, found {} peak(s); \
             use a relative threshold instead",
            maxima.len()
        )));
    }

    let (first, second) = (maxima[0], maxima[1]);
    let valley = (first..=second)
        .min_by(|&a, &b| smoothed[a].total_cmp(&smoothed[b]))
        .unwrap_or(first);
    Ok(hist.bin_center(valley))
}

/// Triangle method: the bin farthest from the line joining the histogram
/// peak to the far end of the populated range.
pub fn triangle(hist: &Histogram) -> Result<f64> {
    let n = hist.len();
    let counts: Vec<f64> = hist.counts.iter().map(|&c| c as f64).collect();

    let (peak, &peak_height) = counts
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .ok_or_else(|| BeadError::DegenerateInput("empty histogram".into()))?;
    let low = counts.iter().position(|&c| c > 0.0).unwrap_or(0);
    let high = counts.iter().rposition(|&c| c > 0.0).unwrap_or(n - 1);
    if low == high {
        return Err(BeadError::DegenerateInput(
            "triangle threshold needs more than one populated bin".into(),
        ));
    }

    // Work on the longer side of the peak; mirror the histogram if that is
    // the right-hand side.
    let flip = peak - low < high - peak;
    let (counts, low, peak) = if flip {
        let mirrored: Vec<f64> = counts.iter().rev().copied().collect();
        (mirrored, n - high - 1, n - peak - 1)
    } else {
        (counts, low, peak)
    };

    let width = (peak - low) as f64;
    if width <= 0.0 {
        return Err(BeadError::DegenerateInput(
            "triangle threshold found no slope beside the peak".into(),
        ));
    }
    let norm = (peak_height * peak_height + width * width).sqrt();
    let (height_n, width_n) = (peak_height / norm, width / norm);

    let level = (0..peak - low)
        .max_by(|&a, &b| {
            let da = height_n * a as f64 - width_n * counts[a + low];
            let db = height_n * b as f64 - width_n * counts[b + low];
            da.total_cmp(&db)
        })
        .map(|i| i + low)
        .unwrap_or(low);

    let level = if flip { n - level - 1 } else { level };
    Ok(hist.bin_center(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist_from_counts(counts: Vec<u64>) -> Histogram {
        Histogram {
            counts,
            min: 0.0,
            bin_width: 1.0,
        }
    }

    #[test]
    fn test_local_maxima_two_peaks() {
        let h = [0.0, 3.0, 1.0, 0.0, 2.0, 5.0, 1.0];
        assert_eq!(local_maxima(&h), vec![1, 5]);
    }

    #[test]
    fn test_smooth3_preserves_flat() {
        let h = vec![2.0; 6];
        assert!(smooth3(&h).iter().all(|&v| (v - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_otsu_bimodal_counts() {
        let mut counts = vec![0u64; 16];
        counts[2] = 50;
        counts[3] = 40;
        counts[12] = 30;
        counts[13] = 45;
        let t = otsu(&hist_from_counts(counts));
        assert!(t > 3.0 && t < 12.0, "otsu threshold {t} should split the modes");
    }

    #[test]
    fn test_minimum_unimodal_fails() {
        let mut counts = vec![0u64; 32];
        counts[10] = 100;
        match minimum(&hist_from_counts(counts)) {
            Err(BeadError::DegenerateInput(msg)) => assert!(msg.contains("relative threshold")),
            other => panic!("expected DegenerateInput, got {other:?}"),
        }
    }

    #[test]
    fn test_triangle_picks_tail_side() {
        // Tall peak at the low end, long tail to the right.
        let mut counts = vec![0u64; 20];
        counts[1] = 1000;
        for (i, c) in counts.iter_mut().enumerate().skip(2) {
            *c = (20 - i) as u64;
        }
        let t = triangle(&hist_from_counts(counts)).unwrap();
        assert!(t > 1.5, "triangle threshold {t} should sit right of the peak");
    }
}
