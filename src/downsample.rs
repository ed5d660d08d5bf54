// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::time::Instant;

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn, Slice};
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{Result, RoiError};

/// How each time bin is reduced to a single output frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DownsampleStrategy {
    /// One frame of the bin, chosen by a seeded generator.
    Random,
    /// Largest value of the bin. Only defined when each frame is a scalar,
    /// i.e. for 1-dimensional input such as a trace.
    Maximum,
    /// Mean over the bin.
    #[default]
    Average,
    /// First frame of the bin.
    First,
    /// Last frame of the bin.
    Last,
}

impl fmt::Display for DownsampleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DownsampleStrategy::Random => "random",
            DownsampleStrategy::Maximum => "maximum",
            DownsampleStrategy::Average => "average",
            DownsampleStrategy::First => "first",
            DownsampleStrategy::Last => "last",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for DownsampleStrategy {
    type Err = RoiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "random" => Ok(DownsampleStrategy::Random),
            "maximum" => Ok(DownsampleStrategy::Maximum),
            "average" => Ok(DownsampleStrategy::Average),
            "first" => Ok(DownsampleStrategy::First),
            "last" => Ok(DownsampleStrategy::Last),
            _ => Err(RoiError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Splits `0..n` into `n_bins` contiguous ranges whose lengths differ by at
/// most one, the longer ones first. If `n_bins` exceeds `n` the trailing
/// ranges are empty. Zero bins yields no ranges.
pub fn split_bins(n: usize, n_bins: usize) -> Vec<Range<usize>> {
    if n_bins == 0 {
        return Vec::new();
    }
    let base = n / n_bins;
    let extra = n % n_bins;
    let mut bins = Vec::with_capacity(n_bins);
    let mut start = 0;
    for i in 0..n_bins {
        let len = if i < extra { base + 1 } else { base };
        bins.push(start..start + len);
        start += len;
    }
    bins
}

// Number of output frames for `n` input frames: halves round to even. Never
// 0 for non-empty input.
fn output_len(n: usize, input_rate: u32, output_rate: u32) -> usize {
    if n == 0 {
        return 0;
    }
    let scaled = n as f64 * output_rate as f64 / input_rate as f64;
    (scaled.round_ties_even() as usize).max(1)
}

/// Reduces the leading (time) axis of `array` from `input_rate` to
/// `output_rate` samples per unit time.
///
/// The time axis is split into `round(n * output_rate / input_rate)` bins
/// (halves to even, so 2.5 bins become 2 and 3.5 become 4)
/// with [split_bins()], and each bin is reduced per `strategy`. The remaining
/// axes are kept as is.
///
/// # Arguments
///   `array` - Time-major data: a trace (1-d) or a movie (time, row, col).
///
///   `input_rate`, `output_rate` - Sample rates; `output_rate` must not
///   exceed `input_rate` and neither may be 0.
///
///   `strategy` - Per-bin reduction.
///
///   `random_seed` - Seeds the generator used by
///   [DownsampleStrategy::Random]. The generator is created anew on every
///   call, so equal arguments always give identical output.
///
/// # Errors
/// [RoiError::Rate] for upsampling or a zero rate;
/// [RoiError::MissingTimeAxis] for a 0-dimensional array;
/// [RoiError::Strategy] for [DownsampleStrategy::Maximum] on anything but
/// 1-dimensional input.
pub fn downsample_array(array: ArrayViewD<f64>,
                        input_rate: u32,
                        output_rate: u32,
                        strategy: DownsampleStrategy,
                        random_seed: u64) -> Result<ArrayD<f64>> {
    if input_rate == 0 || output_rate == 0 || output_rate > input_rate {
        return Err(RoiError::Rate{input_rate, output_rate});
    }
    if array.ndim() == 0 {
        return Err(RoiError::MissingTimeAxis);
    }
    if strategy == DownsampleStrategy::Maximum && array.ndim() != 1 {
        return Err(RoiError::Strategy{strategy: strategy.to_string(),
                                      ndim: array.ndim()});
    }
    let downsample_start = Instant::now();
    let n = array.len_of(Axis(0));
    let n_out = output_len(n, input_rate, output_rate);
    let mut out_shape = array.shape().to_vec();
    out_shape[0] = n_out;
    let mut out = ArrayD::<f64>::zeros(IxDyn(&out_shape));

    let mut rng = ChaCha8Rng::seed_from_u64(random_seed);
    for (i, bin) in split_bins(n, n_out).into_iter().enumerate() {
        let len = bin.len();
        let chunk = array.slice_axis(Axis(0), Slice::from(bin));
        let frame = match strategy {
            DownsampleStrategy::Random => {
                let pick = rng.random_range(0..len);
                chunk.index_axis(Axis(0), pick).to_owned()
            },
            DownsampleStrategy::Maximum => {
                chunk.fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &v| acc.max(v))
            },
            DownsampleStrategy::Average => chunk.sum_axis(Axis(0)) / len as f64,
            DownsampleStrategy::First => chunk.index_axis(Axis(0), 0).to_owned(),
            DownsampleStrategy::Last => chunk.index_axis(Axis(0), len - 1).to_owned(),
        };
        out.index_axis_mut(Axis(0), i).assign(&frame);
    }
    debug!("Binned {} frames into {} with {} strategy", n, n_out, strategy);
    info!("Downsampled {:?} from {} to {} in {:?}",
          array.shape(), input_rate, output_rate, downsample_start.elapsed());
    Ok(out)
}

// mod tests.
