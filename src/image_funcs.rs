// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use image::{GrayImage, Luma};
use ndarray::{Array2, ArrayView2};

// Arrays are indexed (row, col); GrayImage is addressed (x, y) with
// x = col and y = row.

/// Renders a 0/1 (or any zero/nonzero) array as a 0/255 GrayImage.
pub fn binary_to_gray_image(binary: ArrayView2<u8>) -> GrayImage {
    let (height, width) = binary.dim();
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        if binary[[y as usize, x as usize]] != 0 {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Inverse of [binary_to_gray_image()]: nonzero pixels become 1.
pub fn gray_image_to_binary(image: &GrayImage) -> Array2<u8> {
    let (width, height) = image.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(row, col)| {
        (image.get_pixel(col as u32, row as u32).0[0] != 0) as u8
    })
}

/// Copies an 8-bit array into a GrayImage unchanged, e.g. for writing the
/// output of `normalize_array` as a PNG.
pub fn to_gray_image(arr: ArrayView2<u8>) -> GrayImage {
    let (height, width) = arr.dim();
    GrayImage::from_fn(width as u32, height as u32,
                       |x, y| Luma([arr[[y as usize, x as usize]]]))
}

// mod tests.
