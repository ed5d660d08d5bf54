// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::collections::HashSet;
use std::sync::OnceLock;

use ndarray::Array2;
use log::debug;

use crate::array_funcs::{apply_window, content_boundary, content_extents, sized_array,
                         Extent, PadSpec};
use crate::error::{Result, RoiError};
use crate::mask_funcs::{binary_mask, Threshold};
use crate::outline::{edge_coordinates, outline_from_weights, OutlineOptions};

/// Sparse weighted pixel mask: one (row, col, value) entry per nonzero cell
/// of a `shape` frame. Immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedMask {
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
    shape: (usize, usize),
}

impl WeightedMask {
    /// Builds a mask from parallel coordinate/value lists.
    ///
    /// # Errors
    /// [RoiError::LengthMismatch] if the lists differ in length;
    /// [RoiError::OutOfBounds] for a coordinate outside `shape`;
    /// [RoiError::DuplicateEntry] if a (row, col) pair repeats.
    pub fn new(rows: Vec<usize>, cols: Vec<usize>, values: Vec<f64>,
               shape: (usize, usize)) -> Result<WeightedMask> {
        if rows.len() != cols.len() || rows.len() != values.len() {
            return Err(RoiError::LengthMismatch{
                rows: rows.len(), cols: cols.len(), values: values.len()});
        }
        let mut seen = HashSet::with_capacity(rows.len());
        for (&row, &col) in rows.iter().zip(cols.iter()) {
            if row >= shape.0 || col >= shape.1 {
                return Err(RoiError::OutOfBounds{row, col, shape});
            }
            if !seen.insert((row, col)) {
                return Err(RoiError::DuplicateEntry{row, col});
            }
        }
        Ok(WeightedMask{rows, cols, values, shape})
    }

    pub fn rows(&self) -> &[usize] { &self.rows }
    pub fn cols(&self) -> &[usize] { &self.cols }
    pub fn values(&self) -> &[f64] { &self.values }
    pub fn shape(&self) -> (usize, usize) { self.shape }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize { self.values.len() }

    /// Full-frame dense rendering; cells without an entry are 0.
    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::<f64>::zeros(self.shape);
        for ((&row, &col), &value) in
            self.rows.iter().zip(self.cols.iter()).zip(self.values.iter())
        {
            dense[[row, col]] = value;
        }
        dense
    }

    /// Full-frame binary mask. The cutoff is computed from the stored values,
    /// without densifying first.
    pub fn binary_mask(&self, threshold: Threshold) -> Result<Array2<u8>> {
        let cutoff = threshold.cutoff(self.values.iter().copied())?;
        let mut binary = Array2::<u8>::zeros(self.shape);
        for ((&row, &col), &value) in
            self.rows.iter().zip(self.cols.iter()).zip(self.values.iter())
        {
            if value > cutoff {
                binary[[row, col]] = 1;
            }
        }
        Ok(binary)
    }
}

/// An identified ROI. The dense view of the mask is computed on first use and
/// kept for the ROI's lifetime.
#[derive(Debug)]
pub struct Roi {
    id: u64,
    mask: WeightedMask,
    dense: OnceLock<Array2<f64>>,
}

impl Roi {
    pub fn new(id: u64, mask: WeightedMask) -> Roi {
        Roi{id, mask, dense: OnceLock::new()}
    }

    pub fn id(&self) -> u64 { self.id }
    pub fn mask(&self) -> &WeightedMask { &self.mask }

    /// Full-frame dense weights.
    pub fn dense(&self) -> &Array2<f64> {
        self.dense.get_or_init(|| {
            debug!("Densifying ROI {} ({} entries, frame {:?})",
                   self.id, self.mask.nnz(), self.mask.shape());
            self.mask.to_dense()
        })
    }

    pub fn binary_mask(&self, threshold: Threshold) -> Result<Array2<u8>> {
        self.mask.binary_mask(threshold)
    }

    /// Weighted mask image; see [sized_array()] for `shape` and `full`.
    pub fn sized_mask(&self, shape: Option<(usize, usize)>, full: bool)
                      -> Result<Array2<f64>> {
        sized_array(self.dense().view(), shape, full)
    }

    /// Outline image registered with [Roi::sized_mask()] for the same `shape`
    /// and `full`: pixel (r, c) of the outline and of the mask image come from
    /// the same frame pixel.
    ///
    /// The window is taken from the weighted mask's content, not from the
    /// outline's own bounding box, which shrinks when the threshold drops low
    /// weight pixels at the edge. Stroke pixels falling outside the window
    /// (possible only without `inner_only`) are cut off.
    pub fn outline(&self, options: &OutlineOptions) -> Result<Array2<u8>> {
        let full_frame = outline_from_weights(
            self.dense().view(),
            &OutlineOptions{shape: None, full: true, ..*options})?;
        if options.full {
            return Ok(full_frame);
        }
        let (extent, pads) = match options.shape {
            Some(shape) => self.content_extents(shape),
            None => (content_boundary(self.dense().view()), PadSpec::default()),
        };
        Ok(apply_window(full_frame.view(), &extent, &pads))
    }

    /// Window and padding that cut the region of [Roi::sized_mask()] out of
    /// any array sharing the ROI's frame.
    pub fn content_extents(&self, shape: (usize, usize)) -> (Extent, PadSpec) {
        content_extents(self.dense().view(), shape)
    }

    /// Full-frame (row, col) coordinates of the binarized mask's border.
    pub fn edge_coordinates(&self, threshold: Threshold)
                            -> Result<Vec<(usize, usize)>> {
        let binary = binary_mask(self.dense().view(), threshold)?;
        Ok(edge_coordinates(binary.view()))
    }
}

// mod tests.
