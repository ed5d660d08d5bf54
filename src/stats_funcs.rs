// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use ndarray::{Array, Array2, ArrayView, ArrayView2, ArrayView3, Axis, Dimension};
use log::warn;

use crate::error::{Result, RoiError};

/// Returns the `q`-th quantile of `values`, interpolating linearly between
/// the two nearest ranks. `q` is clamped to [0, 1]. Returns None if `values`
/// is empty.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let q = q.clamp(0.0, 1.0);
    let position = q * (sorted.len() - 1) as f64;
    let lo = position.floor() as usize;
    let hi = position.ceil() as usize;
    let fraction = position - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * fraction)
}

// Rejects quantiles outside [0, 1] (and NaN).
pub(crate) fn check_quantile(q: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&q) {
        Ok(q)
    } else {
        Err(RoiError::InvalidQuantile(q))
    }
}

/// Linearly rescales `array` so that `lower_cutoff` maps to 0 and
/// `upper_cutoff` maps to 255, clamping everything outside that range. A
/// missing cutoff defaults to the array's minimum (lower) or maximum (upper).
///
/// The cutoffs are usually quantiles of a reference projection, see
/// [contrast_cutoffs()]; this function does no quantile finding of its own.
/// Scaled values are truncated toward zero. If the effective range is empty
/// (upper <= lower) the result is all zeros.
pub fn normalize_array<D: Dimension>(array: ArrayView<f64, D>,
                                     lower_cutoff: Option<f64>,
                                     upper_cutoff: Option<f64>) -> Array<u8, D> {
    let lower = lower_cutoff.unwrap_or_else(
        || array.iter().copied().fold(f64::INFINITY, f64::min));
    let upper = upper_cutoff.unwrap_or_else(
        || array.iter().copied().fold(f64::NEG_INFINITY, f64::max));
    if !(upper > lower) {
        warn!("Degenerate normalization range [{}, {}]; returning zeros",
              lower, upper);
        return Array::zeros(array.raw_dim());
    }
    let scale = 255.0 / (upper - lower);
    array.mapv(|v| ((v - lower) * scale).clamp(0.0, 255.0) as u8)
}

/// Per-pixel maximum over the time axis of a (time, row, col) movie.
pub fn max_projection(movie: ArrayView3<f64>) -> Array2<f64> {
    movie.fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &v| acc.max(v))
}

/// Per-pixel mean over the time axis of a (time, row, col) movie. A movie
/// with no frames projects to zeros.
pub fn mean_projection(movie: ArrayView3<f64>) -> Array2<f64> {
    let (_frames, height, width) = movie.dim();
    movie.mean_axis(Axis(0)).unwrap_or_else(|| Array2::zeros((height, width)))
}

/// Returns the (`lower_q`, `upper_q`) quantiles of `projection`, suitable as
/// the cutoffs of [normalize_array()].
pub fn contrast_cutoffs(projection: ArrayView2<f64>, lower_q: f64, upper_q: f64)
                        -> Result<(f64, f64)> {
    let lower_q = check_quantile(lower_q)?;
    let upper_q = check_quantile(upper_q)?;
    let values: Vec<f64> = projection.iter().copied().collect();
    match (quantile(&values, lower_q), quantile(&values, upper_q)) {
        (Some(lower), Some(upper)) => Ok((lower, upper)),
        _ => Err(RoiError::EmptyContent),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array3};
    use super::*;

    #[test]
    fn test_quantile() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(4.0));
        assert_abs_diff_eq!(quantile(&values, 0.5).unwrap(), 2.5, epsilon = 1e-12);
        // Position 0.1 * 3 = 0.3 between ranks 0 and 1.
        assert_abs_diff_eq!(quantile(&values, 0.1).unwrap(), 1.3, epsilon = 1e-12);
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[7.0], 0.3), Some(7.0));
    }

    #[test]
    fn test_check_quantile() {
        assert_eq!(check_quantile(0.2), Ok(0.2));
        assert_eq!(check_quantile(1.5), Err(RoiError::InvalidQuantile(1.5)));
        assert!(check_quantile(f64::NAN).is_err());
    }

    #[test]
    fn test_normalize_array() {
        let arr = array![[0.0, 5.0], [10.0, 20.0]];
        let norm = normalize_array(arr.view(), Some(0.0), Some(10.0));
        // 5 * 25.5 = 127.5 truncates; 20 clamps to 255.
        assert_eq!(norm, array![[0_u8, 127], [255, 255]]);

        let norm = normalize_array(arr.view(), Some(5.0), Some(10.0));
        assert_eq!(norm, array![[0_u8, 0], [255, 255]]);
    }

    #[test]
    fn test_normalize_array_default_cutoffs() {
        let arr = array![2.0, 4.0, 6.0];
        let norm = normalize_array(arr.view(), None, None);
        assert_eq!(norm, array![0_u8, 127, 255]);
    }

    #[test]
    fn test_normalize_array_degenerate_range() {
        let arr = array![[3.0, 3.0], [3.0, 3.0]];
        let norm = normalize_array(arr.view(), None, None);
        assert_eq!(norm, Array2::<u8>::zeros((2, 2)));
    }

    #[test]
    fn test_projections() {
        let mut movie = Array3::<f64>::zeros((3, 2, 2));
        movie[[0, 0, 0]] = 1.0;
        movie[[1, 0, 0]] = 5.0;
        movie[[2, 1, 1]] = 3.0;
        assert_eq!(max_projection(movie.view()),
                   array![[5.0, 0.0], [0.0, 3.0]]);
        assert_eq!(mean_projection(movie.view()),
                   array![[2.0, 0.0], [0.0, 1.0]]);
        let empty = Array3::<f64>::zeros((0, 2, 3));
        assert_eq!(mean_projection(empty.view()), Array2::<f64>::zeros((2, 3)));
    }

    #[test]
    fn test_contrast_cutoffs() {
        let projection = array![[0.0, 1.0], [2.0, 3.0]];
        let (lower, upper) = contrast_cutoffs(projection.view(), 0.0, 1.0).unwrap();
        assert_eq!((lower, upper), (0.0, 3.0));
        assert_eq!(contrast_cutoffs(projection.view(), -0.1, 1.0),
                   Err(RoiError::InvalidQuantile(-0.1)));
        let empty = Array2::<f64>::zeros((0, 0));
        assert_eq!(contrast_cutoffs(empty.view(), 0.1, 0.9),
                   Err(RoiError::EmptyContent));
    }

}  // mod tests.
