// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use ndarray::{Array2, ArrayView2};
use log::debug;

use crate::error::{Result, RoiError};
use crate::stats_funcs::{check_quantile, quantile};

/// How a weighted mask is turned into a binary one. A cell is foreground iff
/// its weight is strictly greater than the cutoff.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Threshold {
    /// The cutoff is the given value.
    Absolute(f64),

    /// The cutoff is this quantile (in [0, 1]) of the mask's nonzero weights.
    /// Zeros are excluded from the distribution.
    Quantile(f64),
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Quantile(0.1)
    }
}

impl Threshold {
    /// Resolves the pair of optional settings accepted by callers that take
    /// both: a quantile, when given, overrides the absolute threshold. With
    /// neither, the default quantile applies.
    pub fn from_options(absolute_threshold: Option<f64>, quantile: Option<f64>)
                        -> Threshold {
        match (absolute_threshold, quantile) {
            (_, Some(q)) => Threshold::Quantile(q),
            (Some(t), None) => Threshold::Absolute(t),
            (None, None) => Threshold::default(),
        }
    }

    /// Computes the cutoff value for a mask whose weights are `values`.
    /// Zero entries in `values` are ignored.
    ///
    /// # Errors
    /// [RoiError::EmptyMask] for a quantile threshold when there are no
    /// nonzero values; [RoiError::InvalidQuantile] for a quantile outside
    /// [0, 1].
    pub fn cutoff<I>(&self, values: I) -> Result<f64>
    where I: IntoIterator<Item = f64>
    {
        match *self {
            Threshold::Absolute(t) => Ok(t),
            Threshold::Quantile(q) => {
                let q = check_quantile(q)?;
                let nonzero: Vec<f64> =
                    values.into_iter().filter(|v| *v != 0.0).collect();
                quantile(&nonzero, q).ok_or(RoiError::EmptyMask)
            },
        }
    }
}

/// Binarizes dense `weights`: 1 where the weight exceeds the cutoff given by
/// `threshold`, 0 elsewhere.
///
/// # Errors
/// See [Threshold::cutoff()]. An absolute threshold never fails, even on an
/// all-zero mask.
pub fn binary_mask(weights: ArrayView2<f64>, threshold: Threshold)
                   -> Result<Array2<u8>> {
    let cutoff = threshold.cutoff(weights.iter().copied())?;
    debug!("Binarizing {:?} mask with {:?} cutoff {}",
           weights.dim(), threshold, cutoff);
    Ok(weights.mapv(|w| (w > cutoff) as u8))
}

/// Number of foreground cells of a binary mask.
pub fn foreground_count(binary: ArrayView2<u8>) -> usize {
    binary.iter().filter(|v| **v != 0).count()
}

// mod tests.
