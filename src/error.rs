// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use thiserror::Error;

/// Failures raised by the mask, window and resampling functions. All of them
/// are deterministic logic errors; retrying with the same inputs fails the
/// same way.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoiError {
    /// A quantile cutoff was requested but the mask has no nonzero values.
    #[error("cannot compute a quantile cutoff: mask has no nonzero values")]
    EmptyMask,

    /// Cropping an array whose elements are all zero.
    #[error("cannot crop an empty array, or an array where all elements are zero")]
    EmptyContent,

    /// The padding target is smaller than the content and overflow is not
    /// allowed.
    #[error("content shape {content:?} does not fit in target shape {target:?}")]
    ShapeOverflow { content: (usize, usize), target: (usize, usize) },

    /// Upsampling (or a zero rate) was requested.
    #[error("output rate {output_rate} must be in 1..={input_rate}")]
    Rate { input_rate: u32, output_rate: u32 },

    /// The strategy is not defined for frames of this dimensionality.
    #[error("strategy '{strategy}' is not defined for {ndim}-dimensional arrays")]
    Strategy { strategy: String, ndim: usize },

    #[error("unknown downsampling strategy '{0}'")]
    UnknownStrategy(String),

    #[error("sparse arrays differ in length: {rows} rows, {cols} cols, {values} values")]
    LengthMismatch { rows: usize, cols: usize, values: usize },

    #[error("entry ({row}, {col}) lies outside shape {shape:?}")]
    OutOfBounds { row: usize, col: usize, shape: (usize, usize) },

    #[error("entry ({row}, {col}) appears more than once")]
    DuplicateEntry { row: usize, col: usize },

    #[error("quantile {0} is outside [0, 1]")]
    InvalidQuantile(f64),

    #[error("dilation size {0} exceeds the largest supported stroke (511)")]
    DilationSize(usize),

    /// Resampling needs at least one (time) axis.
    #[error("array has no leading time axis")]
    MissingTimeAxis,
}

pub type Result<T> = std::result::Result<T, RoiError>;
