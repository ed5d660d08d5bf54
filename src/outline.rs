// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Outline images for ROIs.
//!
//! The outline is built in four steps:
//!
//! 1. The weighted mask is binarized (see [crate::mask_funcs]).
//! 2. The borders of every 8-connected foreground region are traced, holes
//!    included, and drawn one pixel wide.
//! 3. The drawn borders are dilated with a square structuring element whose
//!    side is the stroke width.
//! 4. Optionally only the part of the dilated border lying inside the binary
//!    mask is kept. This "inner" outline is the usual display style: the
//!    stroke sits just inside the cell boundary instead of straddling it.
//!
//! The functions here then crop and/or pad the outline to its own content,
//! like [sized_array()] does for any array. That box can be smaller than the
//! weighted mask's when the threshold drops low weight edge pixels; for an
//! outline that overlays the mask image pixel for pixel, use
//! [crate::roi::Roi::outline()], which windows the full-frame outline with
//! the mask's own extents.
//!
//! Coordinates are (row, col) throughout. imageproc reports contour points as
//! (x, y); they are converted in [trace_contours()].

use std::time::Instant;

use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::morphology::{grayscale_dilate, Mask};
use ndarray::{Array2, ArrayView2};
use log::debug;

use crate::array_funcs::sized_array;
use crate::error::{Result, RoiError};
use crate::image_funcs::{binary_to_gray_image, gray_image_to_binary};
use crate::mask_funcs::{binary_mask, foreground_count, Threshold};

/// Largest stroke width supported by the dilation structuring element.
pub const MAX_DILATION_SIZE: usize = 511;

/// Settings for [outline_from_weights()].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OutlineOptions {
    /// Binarization of the weighted mask.
    pub threshold: Threshold,

    /// Stroke width in pixels. Values of 0 or 1 leave the traced border one
    /// pixel wide.
    pub dilation_size: usize,

    /// Keep only the part of the stroke inside the binary mask.
    pub inner_only: bool,

    /// Target shape for center padding the cropped outline. None crops only.
    pub shape: Option<(usize, usize)>,

    /// Return the full frame, ignoring `shape`.
    pub full: bool,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        OutlineOptions{threshold: Threshold::default(),
                       dilation_size: 1,
                       inner_only: true,
                       shape: None,
                       full: false}
    }
}

/// Traces the borders of all 8-connected foreground regions of `binary`
/// (nonzero cells). Outer borders and hole borders are both returned, one
/// point list per border, with points as (row, col). An all-zero mask has no
/// borders.
pub fn trace_contours(binary: ArrayView2<u8>) -> Vec<Vec<(usize, usize)>> {
    if foreground_count(binary.view()) == 0 {
        return Vec::new();
    }
    // The tracer only starts a border at a foreground pixel whose left
    // neighbor is background, so regions touching column 0 would be missed.
    // Trace inside a one pixel zero frame instead.
    let (height, width) = binary.dim();
    let framed = GrayImage::from_fn(width as u32 + 2, height as u32 + 2, |x, y| {
        let (x, y) = (x as usize, y as usize);
        if x >= 1 && y >= 1 && x <= width && y <= height
            && binary[[y - 1, x - 1]] != 0 {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    find_contours::<i32>(&framed).into_iter()
        .map(|contour| contour.points.iter()
             .map(|p| (p.y as usize - 1, p.x as usize - 1))
             .collect())
        .collect()
}

/// Draws `contours` as 1s into a zero array of `shape`.
pub fn render_contours(contours: &[Vec<(usize, usize)>], shape: (usize, usize))
                       -> Array2<u8> {
    let mut rendered = Array2::<u8>::zeros(shape);
    for &(row, col) in contours.iter().flatten() {
        rendered[[row, col]] = 1;
    }
    rendered
}

/// Dilates `binary` with a `size` x `size` square. The square's anchor is at
/// (size/2, size/2), so for even sizes the extra row/column of growth goes
/// toward the bottom/right.
///
/// # Errors
/// [RoiError::DilationSize] if `size` exceeds [MAX_DILATION_SIZE].
pub fn dilate_square(binary: ArrayView2<u8>, size: usize) -> Result<Array2<u8>> {
    if size <= 1 {
        return Ok(binary.to_owned());
    }
    if size > MAX_DILATION_SIZE {
        return Err(RoiError::DilationSize(size));
    }
    let element = GrayImage::from_pixel(size as u32, size as u32, Luma([255]));
    let anchor = (size / 2) as u8;
    let mask = Mask::from_image(&element, anchor, anchor);
    let dilated = grayscale_dilate(&binary_to_gray_image(binary), &mask);
    Ok(gray_image_to_binary(&dilated))
}

// What an empty outline looks like for a given sizing request.
fn empty_outline(frame: (usize, usize), shape: Option<(usize, usize)>,
                 full: bool) -> Array2<u8> {
    match (full, shape) {
        (true, _) => Array2::zeros(frame),
        (false, Some(shape)) => Array2::zeros(shape),
        (false, None) => Array2::zeros((0, 0)),
    }
}

/// Builds the outline of an already binarized mask.
///
/// # Arguments
///   `binary` - Full-frame 0/1 mask.
///
///   `dilation_size` - Stroke width; see [dilate_square()].
///
///   `inner_only` - Discard stroke pixels outside `binary`.
///
///   `shape`, `full` - Sizing of the result, with the semantics of
///   [sized_array()]. An empty outline is not an error: it comes back as
///   zeros of the requested geometry (the frame when `full`, `shape` when
///   given, 0x0 otherwise).
///
/// # Returns
/// 0/1 array.
pub fn outline_from_mask(binary: ArrayView2<u8>, dilation_size: usize,
                         inner_only: bool, shape: Option<(usize, usize)>,
                         full: bool) -> Result<Array2<u8>> {
    let outline_start = Instant::now();
    let contours = trace_contours(binary.view());
    let mut outline = render_contours(&contours, binary.dim());
    outline = dilate_square(outline.view(), dilation_size)?;
    if inner_only {
        outline.zip_mut_with(&binary, |o, &b| if b == 0 { *o = 0; });
    }
    debug!("Outline from {} contours, stroke {}, built in {:?}",
           contours.len(), dilation_size, outline_start.elapsed());
    if foreground_count(outline.view()) == 0 {
        return Ok(empty_outline(binary.dim(), shape, full));
    }
    sized_array(outline.view(), shape, full)
}

/// Builds the outline of a weighted mask: binarizes `weights` per
/// `options.threshold`, then proceeds as [outline_from_mask()].
///
/// # Errors
/// Binarization errors (e.g. [RoiError::EmptyMask] for a quantile threshold
/// on an all-zero mask) and [RoiError::DilationSize].
pub fn outline_from_weights(weights: ArrayView2<f64>, options: &OutlineOptions)
                            -> Result<Array2<u8>> {
    let binary = binary_mask(weights, options.threshold)?;
    outline_from_mask(binary.view(), options.dilation_size, options.inner_only,
                      options.shape, options.full)
}

/// Pixels of the one pixel wide border of `binary`, as (row, col) in row
/// major order.
pub fn edge_coordinates(binary: ArrayView2<u8>) -> Vec<(usize, usize)> {
    let rendered = render_contours(&trace_contours(binary), binary.dim());
    rendered.indexed_iter()
        .filter(|(_, v)| **v != 0)
        .map(|(pos, _)| pos)
        .collect()
}

// mod tests.
