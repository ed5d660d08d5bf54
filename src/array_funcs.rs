// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Cropping, padding and window alignment of 2D arrays.
//!
//! An ROI's mask image is made by cropping the full-frame mask to its content
//! and center-padding the crop to a fixed shape. A movie (or a projection of
//! it) has no "content" of its own, so it cannot be cropped the same way.
//! Instead [content_extents()] reports the window of the full frame and the
//! padding that reproduce the mask's crop+pad exactly; applying that window to
//! any array of the same frame shape yields the matching sub-image.

use std::cmp;

use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3};
use num_traits::Zero;
use log::{debug, warn};

use crate::error::{Result, RoiError};

/// Half-open bounding box: rows `top..bottom`, columns `left..right`.
///
/// `Extent::default()`, i.e. (0, 0, 0, 0), is the sentinel returned for an
/// array without content; it is not a valid unit-size box.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Extent {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl Extent {
    pub fn new(top: usize, bottom: usize, left: usize, right: usize) -> Extent {
        Extent{top, bottom, left, right}
    }

    pub fn height(&self) -> usize {
        self.bottom.saturating_sub(self.top)
    }

    pub fn width(&self) -> usize {
        self.right.saturating_sub(self.left)
    }

    /// (height, width).
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0 || self.width() == 0
    }
}

/// Border cells to add around an array: `rows` is (top, bottom) and `cols`
/// is (left, right).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PadSpec {
    pub rows: (usize, usize),
    pub cols: (usize, usize),
}

impl PadSpec {
    pub fn new(rows: (usize, usize), cols: (usize, usize)) -> PadSpec {
        PadSpec{rows, cols}
    }

    /// Padding that centers `content` (height, width) within `target`. When a
    /// dimension's padding is odd, the extra cell goes to the bottom/right.
    /// `content` must not exceed `target`.
    pub fn centered(content: (usize, usize), target: (usize, usize)) -> PadSpec {
        PadSpec{rows: split_pad(target.0 - content.0),
                cols: split_pad(target.1 - content.1)}
    }

    pub fn is_zero(&self) -> bool {
        *self == PadSpec::default()
    }
}

// Splits `total` into (before, after) with the odd unit after.
fn split_pad(total: usize) -> (usize, usize) {
    let before = total / 2;
    (before, total - before)
}

/// Returns the minimal bounding box of the nonzero entries of `arr`, or the
/// (0, 0, 0, 0) sentinel if there are none.
pub fn content_boundary<A: Zero>(arr: ArrayView2<A>) -> Extent {
    let mut top = usize::MAX;
    let mut bottom = 0;
    let mut left = usize::MAX;
    let mut right = 0;
    let mut found = false;
    for ((row, col), value) in arr.indexed_iter() {
        if value.is_zero() {
            continue;
        }
        found = true;
        top = cmp::min(top, row);
        bottom = cmp::max(bottom, row + 1);
        left = cmp::min(left, col);
        right = cmp::max(right, col + 1);
    }
    if !found {
        warn!("No content found. Either array is empty or all elements equal zero.");
        return Extent::default();
    }
    Extent{top, bottom, left, right}
}

/// Crops `arr` to the bounding box of its nonzero entries.
///
/// # Errors
/// [RoiError::EmptyContent] if `arr` has no nonzero entries. Unlike
/// [content_boundary()], emptiness is a caller error here.
pub fn crop<A: Clone + Zero>(arr: ArrayView2<A>) -> Result<Array2<A>> {
    let bounds = content_boundary(arr.view());
    if bounds.is_empty() {
        return Err(RoiError::EmptyContent);
    }
    Ok(arr.slice(s![bounds.top..bounds.bottom, bounds.left..bounds.right])
       .to_owned())
}

/// Surrounds `arr` with `fill` so that it sits in the center of an array of
/// `shape`. If the padding cannot be split evenly, the extra cell goes after
/// (bottom for rows, right for columns).
///
/// An array with no elements yields `shape` filled with `fill`.
///
/// # Errors
/// If `arr` exceeds `shape` in either dimension, the unchanged `arr` is
/// returned when `allow_overflow` is true; otherwise this fails with
/// [RoiError::ShapeOverflow]. The array is never truncated.
pub fn center_pad<A: Clone>(arr: ArrayView2<A>, shape: (usize, usize),
                            fill: A, allow_overflow: bool) -> Result<Array2<A>> {
    if arr.is_empty() {
        return Ok(Array2::from_elem(shape, fill));
    }
    let content = arr.dim();
    if content.0 > shape.0 || content.1 > shape.1 {
        if !allow_overflow {
            return Err(RoiError::ShapeOverflow{content, target: shape});
        }
        warn!("Specified shape {:?} after padding is too small for {:?}. \
               Returning input array without padding.", shape, content);
        return Ok(arr.to_owned());
    }
    Ok(pad_array(arr, &PadSpec::centered(content, shape), fill))
}

/// Adds the border described by `pads` around `arr`, filled with `fill`.
pub fn pad_array<A: Clone>(arr: ArrayView2<A>, pads: &PadSpec, fill: A)
                           -> Array2<A> {
    let (height, width) = arr.dim();
    let (top, bottom) = pads.rows;
    let (left, right) = pads.cols;
    let mut padded = Array2::from_elem(
        (top + height + bottom, left + width + right), fill);
    padded.slice_mut(s![top..top + height, left..left + width]).assign(&arr);
    padded
}

/// Produces the array an ROI image is made from:
/// * `full`: `arr` unchanged (`shape` is ignored).
/// * `shape` is None: `arr` cropped to its content.
/// * `shape` is Some: the crop, center padded with zeros to `shape`. A crop
///   larger than `shape` is returned unpadded.
pub fn sized_array<A: Clone + Zero>(arr: ArrayView2<A>,
                                    shape: Option<(usize, usize)>,
                                    full: bool) -> Result<Array2<A>> {
    if full {
        return Ok(arr.to_owned());
    }
    let cropped = crop(arr)?;
    match shape {
        None => Ok(cropped),
        Some(shape) => center_pad(cropped.view(), shape, A::zero(),
                                  /*allow_overflow=*/true),
    }
}

// For one axis: grows the content range start..end to `size` cells using the
// center_pad split, then clamps it to 0..frame_len. Returns the clamped index
// range and the padding that stands in for the cut-off cells.
fn window_axis(start: usize, end: usize, size: usize, frame_len: usize)
               -> ((usize, usize), (usize, usize)) {
    let (before, after) = split_pad(size - (end - start));
    let lo = start.saturating_sub(before);
    let hi = cmp::min(end + after, frame_len);
    let pad_before = before - (start - lo);
    let pad_after = end + after - hi;
    ((lo, hi), (pad_before, pad_after))
}

/// Computes the window of `arr`'s frame, and the padding to apply after
/// slicing it, such that
///
/// `apply_window(arr, extent, pads) == sized_array(arr, Some(shape), false)`
///
/// for any `arr` with content. Because only the window location depends on
/// `arr`, the same `(Extent, PadSpec)` can be applied to any other array with
/// the same frame shape (a movie frame, a projection) to cut out the region
/// matching the ROI image.
///
/// The window is `shape` centered on the content's bounding box, with the
/// odd cell of any split going to the bottom/right. Where the window would
/// leave the frame it is clamped to the frame edge and the cut-off part is
/// returned as padding on that side; negative indices are never produced.
///
/// Special cases, mirroring [sized_array()]:
/// * Content larger than `shape` in either dimension: the bounding box with
///   no padding.
/// * No content: the empty sentinel extent with padding covering all of
///   `shape`, so the windowed result is all zeros.
pub fn content_extents<A: Zero>(arr: ArrayView2<A>, shape: (usize, usize))
                                -> (Extent, PadSpec) {
    let (frame_height, frame_width) = arr.dim();
    let bounds = content_boundary(arr);
    if bounds.is_empty() {
        return (Extent::default(), PadSpec::centered((0, 0), shape));
    }
    if bounds.height() > shape.0 || bounds.width() > shape.1 {
        debug!("Content {:?} exceeds window shape {:?}; using bounding box",
               bounds.shape(), shape);
        return (bounds, PadSpec::default());
    }
    let ((top, bottom), rows) =
        window_axis(bounds.top, bounds.bottom, shape.0, frame_height);
    let ((left, right), cols) =
        window_axis(bounds.left, bounds.right, shape.1, frame_width);
    (Extent{top, bottom, left, right}, PadSpec{rows, cols})
}

/// Slices `extent` out of `arr` and zero pads the result by `pads`.
pub fn apply_window<A: Clone + Zero>(arr: ArrayView2<A>, extent: &Extent,
                                     pads: &PadSpec) -> Array2<A> {
    let window = arr.slice(
        s![extent.top..extent.bottom, extent.left..extent.right]);
    pad_array(window, pads, A::zero())
}

/// [apply_window()] for every frame of a (time, row, col) movie. The time
/// axis is neither sliced nor padded.
pub fn window_movie<A: Clone + Zero>(movie: ArrayView3<A>, extent: &Extent,
                                     pads: &PadSpec) -> Array3<A> {
    let (frames, _, _) = movie.dim();
    let (height, width) = extent.shape();
    let (top, bottom) = pads.rows;
    let (left, right) = pads.cols;
    let mut windowed = Array3::zeros(
        (frames, top + height + bottom, left + width + right));
    windowed.slice_mut(s![.., top..top + height, left..left + width])
        .assign(&movie.slice(
            s![.., extent.top..extent.bottom, extent.left..extent.right]));
    windowed
}

#[cfg(test)]
mod tests {
    use ndarray::{array, Array2, Array3};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use super::*;

    #[test]
    fn test_content_boundary() {
        let mut arr = Array2::<f64>::zeros((4, 4));
        arr[[0, 0]] = 3.0;
        arr[[1, 1]] = 2.0;
        arr[[0, 2]] = 1.0;
        assert_eq!(content_boundary(arr.view()), Extent::new(0, 2, 0, 3));

        // Single pixel at the origin is a unit box, not the sentinel.
        let mut arr = Array2::<u8>::zeros((3, 3));
        arr[[0, 0]] = 1;
        let bounds = content_boundary(arr.view());
        assert_eq!(bounds, Extent::new(0, 1, 0, 1));
        assert!(!bounds.is_empty());
    }

    #[test]
    fn test_content_boundary_empty() {
        let arr = Array2::<f64>::zeros((3, 8));
        let bounds = content_boundary(arr.view());
        assert_eq!(bounds, Extent::new(0, 0, 0, 0));
        assert!(bounds.is_empty());
        let arr = Array2::<f64>::zeros((0, 0));
        assert!(content_boundary(arr.view()).is_empty());
    }

    #[test]
    fn test_crop() {
        let mut arr = Array2::<i32>::zeros((4, 4));
        arr[[0, 0]] = 3;
        arr[[1, 1]] = 2;
        arr[[0, 2]] = 1;
        assert_eq!(crop(arr.view()).unwrap(), array![[3, 0, 1], [0, 2, 0]]);

        let ones = Array2::<f64>::ones((5, 5));
        assert_eq!(crop(ones.view()).unwrap(), ones);

        let corners = array![[1, 0, 0, 0, 0],
                             [0, 0, 0, 0, 0],
                             [0, 0, 0, 0, 0],
                             [0, 0, 0, 0, 1]];
        assert_eq!(crop(corners.view()).unwrap(), corners);

        let single = array![[0, 0, 0, 0, 0],
                            [0, 0, 0, 0, 0],
                            [0, 0, 0, 0, 0],
                            [0, 0, 0, 0, 1]];
        assert_eq!(crop(single.view()).unwrap(), array![[1]]);
    }

    #[test]
    fn test_crop_empty() {
        let zeros = Array2::<f64>::zeros((3, 8));
        assert_eq!(crop(zeros.view()), Err(RoiError::EmptyContent));
        let nothing = Array2::<f64>::zeros((0, 0));
        assert_eq!(crop(nothing.view()), Err(RoiError::EmptyContent));
    }

    #[test]
    fn test_center_pad() {
        // Can perfectly center.
        let padded = center_pad(array![[1]].view(), (3, 3), 99, false).unwrap();
        assert_eq!(padded, array![[99, 99, 99],
                                  [99,  1, 99],
                                  [99, 99, 99]]);
        // Uneven: extra row at the bottom, extra column at the right.
        let padded = center_pad(array![[1], [2]].view(), (3, 4), 0, false).unwrap();
        assert_eq!(padded, array![[0, 1, 0, 0],
                                  [0, 2, 0, 0],
                                  [0, 0, 0, 0]]);
        // Nothing to pad.
        let padded = center_pad(Array2::<i32>::zeros((0, 0)).view(), (4, 4),
                                1, false).unwrap();
        assert_eq!(padded, Array2::<i32>::ones((4, 4)));
    }

    #[test]
    fn test_center_pad_tie_break() {
        // A 2x2 block padded to 3x2 gets its extra row below.
        let block = array![[5, 6], [7, 8]];
        let padded = center_pad(block.view(), (3, 2), 0, false).unwrap();
        assert_eq!(padded, array![[5, 6], [7, 8], [0, 0]]);
        assert_eq!(PadSpec::centered((2, 2), (3, 2)),
                   PadSpec::new((0, 1), (0, 0)));
        assert_eq!(PadSpec::centered((1, 2), (4, 7)),
                   PadSpec::new((1, 2), (2, 3)));
    }

    #[test]
    fn test_center_pad_overflow() {
        let arr = Array2::<u8>::ones((3, 5));
        // Too wide, allowed: returned as is.
        let padded = center_pad(arr.view(), (4, 4), 0, true).unwrap();
        assert_eq!(padded, arr);
        // Too wide, not allowed.
        assert_eq!(center_pad(arr.view(), (4, 4), 0, false),
                   Err(RoiError::ShapeOverflow{content: (3, 5), target: (4, 4)}));
    }

    #[test]
    fn test_pad_array() {
        let padded = pad_array(array![[1, 2]].view(),
                               &PadSpec::new((1, 0), (0, 2)), 9);
        assert_eq!(padded, array![[9, 9, 9, 9],
                                  [1, 2, 9, 9]]);
        let unchanged = pad_array(array![[1, 2]].view(), &PadSpec::default(), 9);
        assert_eq!(unchanged, array![[1, 2]]);
    }

    #[test]
    fn test_sized_array() {
        let mut arr = Array2::<f64>::zeros((6, 6));
        arr[[2, 3]] = 1.5;
        arr[[3, 3]] = 0.5;
        assert_eq!(sized_array(arr.view(), Some((3, 3)), true).unwrap(), arr);
        assert_eq!(sized_array(arr.view(), None, false).unwrap(),
                   array![[1.5], [0.5]]);
        assert_eq!(sized_array(arr.view(), Some((3, 3)), false).unwrap(),
                   array![[0.0, 1.5, 0.0],
                          [0.0, 0.5, 0.0],
                          [0.0, 0.0, 0.0]]);
        let zeros = Array2::<f64>::zeros((6, 6));
        assert_eq!(sized_array(zeros.view(), Some((3, 3)), false),
                   Err(RoiError::EmptyContent));
    }

    #[test]
    fn test_content_extents_interior() {
        let mut arr = Array2::<u8>::zeros((10, 10));
        arr[[4, 4]] = 1;
        arr[[5, 6]] = 1;
        // Content 2x3 grows to 4x6 by (1, 1) rows and (1, 2) cols, all of
        // them in-frame pixels, so nothing is left to pad.
        let (extent, pads) = content_extents(arr.view(), (4, 6));
        assert_eq!(extent, Extent::new(3, 7, 3, 9));
        assert!(pads.is_zero());
    }

    #[test]
    fn test_content_extents_clamped_top_left() {
        let mut arr = Array2::<u8>::zeros((4, 4));
        arr[[0, 0]] = 1;
        let (extent, pads) = content_extents(arr.view(), (5, 5));
        assert_eq!(extent, Extent::new(0, 3, 0, 3));
        assert_eq!(pads, PadSpec::new((2, 0), (2, 0)));
    }

    #[test]
    fn test_content_extents_clamped_bottom_right() {
        let mut arr = Array2::<u8>::zeros((4, 4));
        arr[[3, 3]] = 1;
        let (extent, pads) = content_extents(arr.view(), (4, 4));
        assert_eq!(extent, Extent::new(2, 4, 2, 4));
        assert_eq!(pads, PadSpec::new((0, 2), (0, 2)));
        let windowed = apply_window(arr.view(), &extent, &pads);
        assert_eq!(windowed[[1, 1]], 1);
        assert_eq!(windowed.sum(), 1);
    }

    #[test]
    fn test_content_extents_overflow() {
        let mut arr = Array2::<u8>::zeros((8, 8));
        arr[[1, 1]] = 1;
        arr[[2, 6]] = 1;
        let (extent, pads) = content_extents(arr.view(), (4, 4));
        assert_eq!(extent, Extent::new(1, 3, 1, 7));
        assert!(pads.is_zero());
    }

    #[test]
    fn test_content_extents_empty() {
        let arr = Array2::<f64>::zeros((6, 6));
        let (extent, pads) = content_extents(arr.view(), (3, 4));
        assert!(extent.is_empty());
        assert_eq!(pads, PadSpec::new((1, 2), (2, 2)));
        assert_eq!(apply_window(arr.view(), &extent, &pads),
                   Array2::<f64>::zeros((3, 4)));
    }

    // Random sparse content anywhere in the frame, including the edges, and
    // window shapes both larger and smaller than the content.
    fn random_array(rng: &mut ChaCha8Rng) -> Array2<f64> {
        let height = rng.random_range(1..12);
        let width = rng.random_range(1..12);
        let mut arr = Array2::<f64>::zeros((height, width));
        for _ in 0..rng.random_range(1..6) {
            let row = rng.random_range(0..height);
            let col = rng.random_range(0..width);
            arr[[row, col]] = rng.random_range(1..10) as f64;
        }
        arr
    }

    #[test]
    fn test_content_extents_round_trip() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for _ in 0..500 {
            let arr = random_array(&mut rng);
            let shape = (rng.random_range(1..15), rng.random_range(1..15));
            let (extent, pads) = content_extents(arr.view(), shape);
            assert!(extent.bottom <= arr.dim().0 && extent.right <= arr.dim().1);
            let expected = sized_array(arr.view(), Some(shape), false).unwrap();
            assert_eq!(apply_window(arr.view(), &extent, &pads), expected,
                       "arr {:?} shape {:?}", arr, shape);
        }
    }

    #[test]
    fn test_content_extents_secondary_array() {
        // The window cut from another array of the same frame shape lines up
        // with the mask image pixel for pixel.
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..200 {
            let mask = random_array(&mut rng);
            let frame = Array2::from_shape_fn(
                mask.dim(), |_| rng.random_range(1..100) as f64);
            let shape = (rng.random_range(1..15), rng.random_range(1..15));
            let (extent, pads) = content_extents(mask.view(), shape);
            let masked = &mask * &frame;
            assert_eq!(apply_window(masked.view(), &extent, &pads),
                       apply_window(mask.view(), &extent, &pads) *
                       apply_window(frame.view(), &extent, &pads));
        }
    }

    #[test]
    fn test_window_movie() {
        let mut mask = Array2::<f64>::zeros((5, 5));
        mask[[0, 1]] = 1.0;
        let movie = Array3::from_shape_fn((3, 5, 5),
                                          |(t, r, c)| (t * 100 + r * 10 + c) as f64);
        let (extent, pads) = content_extents(mask.view(), (3, 3));
        let windowed = window_movie(movie.view(), &extent, &pads);
        assert_eq!(windowed.dim(), (3, 3, 3));
        for t in 0..3 {
            let frame = movie.index_axis(ndarray::Axis(0), t);
            assert_eq!(windowed.index_axis(ndarray::Axis(0), t),
                       apply_window(frame, &extent, &pads));
        }
        // Row 0 of the frame lands in the middle row; the top row is padding.
        assert_eq!(windowed[[2, 1, 1]], 201.0);
        assert_eq!(windowed[[2, 0, 1]], 0.0);
    }

}  // mod tests.
