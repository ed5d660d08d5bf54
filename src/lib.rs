// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! ROI geometry and array resampling for segmentation labeling.
//!
//! Sparse weighted ROI masks from a cell segmentation are turned into the
//! dense images shown to labelers: cropped and padded mask images, outline
//! images with a controllable stroke, the matching window of the source
//! movie, and time-downsampled traces and movies.
//!
//! The central invariant is that [array_funcs::content_extents()] and
//! [array_funcs::sized_array()] agree pixel for pixel, so a movie or
//! projection windowed with the extents of an ROI lines up with that ROI's
//! mask image. [roi::Roi::outline()] cuts its outline with the same window.

pub mod array_funcs;
pub mod downsample;
pub mod error;
pub mod image_funcs;
pub mod mask_funcs;
pub mod outline;
pub mod roi;
pub mod stats_funcs;

pub use crate::error::{Result, RoiError};
pub use crate::downsample::{downsample_array, DownsampleStrategy};
pub use crate::mask_funcs::Threshold;
pub use crate::outline::OutlineOptions;
pub use crate::roi::{Roi, WeightedMask};
