// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use env_logger;
use ndarray::{Array1, Array2, Array3, Ix3};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use roi_geometry::array_funcs::{window_movie, Extent, PadSpec};
use roi_geometry::image_funcs::to_gray_image;
use roi_geometry::stats_funcs::{contrast_cutoffs, max_projection, mean_projection,
                                normalize_array};
use roi_geometry::{downsample_array, DownsampleStrategy, OutlineOptions, Roi,
                   Threshold, WeightedMask};

/// Writes the labeling artifacts (mask image, outline image, downsampled
/// trace and, given a movie, max/average projections of the ROI's window)
/// for ROI file(s).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about=None)]
struct Args {
    /// Path of the ROI JSON file or directory of files to process.
    #[arg(short, long)]
    input: String,

    /// Directory where output files are written.
    #[arg(short, long)]
    output: String,

    /// Movie JSON file: an array of frames, each an array of rows. Its frame
    /// shape must match the ROIs' frame shape.
    #[arg(short, long)]
    movie: Option<String>,

    /// Quantile of a projection mapped to black.
    #[arg(long, default_value_t = 0.0)]
    contrast_lower: f64,

    /// Quantile of a projection mapped to white.
    #[arg(long, default_value_t = 1.0)]
    contrast_upper: f64,

    /// Height of the cropped mask and outline images.
    #[arg(long, default_value_t = 128)]
    cropped_height: usize,

    /// Width of the cropped mask and outline images.
    #[arg(long, default_value_t = 128)]
    cropped_width: usize,

    /// Write full-frame images instead of cropped ones.
    #[arg(long, default_value_t = false)]
    full: std::primitive::bool,

    /// Absolute weight cutoff for the outline. Ignored if --quantile is given.
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Quantile of the nonzero weights used as the outline cutoff. Defaults
    /// to 0.1 when --threshold is not given either.
    #[arg(short, long)]
    quantile: Option<f64>,

    /// Outline stroke width in pixels.
    #[arg(short, long, default_value_t = 1)]
    dilation_size: usize,

    /// Keep only the part of the outline stroke inside the mask.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    inner_only: std::primitive::bool,

    /// Sample rate of the input traces and movie.
    #[arg(long, default_value_t = 31)]
    input_rate: u32,

    /// Sample rate of the written traces and of the movie the projections
    /// are taken from.
    #[arg(long, default_value_t = 4)]
    output_rate: u32,

    /// Downsampling strategy: random, maximum, average, first or last.
    #[arg(short, long, default_value_t = DownsampleStrategy::Average)]
    strategy: DownsampleStrategy,

    /// Seed for the random downsampling strategy.
    #[arg(long, default_value_t = 0)]
    random_seed: u64,
}

/// ROI as stored on disk: a sparse mask plus an optional trace.
#[derive(Deserialize, Debug)]
struct RoiRecord {
    id: u64,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
    shape: (usize, usize),
    #[serde(default)]
    trace: Option<Vec<f64>>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TraceRecord {
    point_start: u32,
    point_interval: f64,
    data_length: usize,
    trace: Vec<f64>,
}

// Downsampled movie plus the contrast cutoffs of its full-frame projections,
// shared by every ROI so that their projection images are comparable.
struct MovieProducts {
    movie: Array3<f64>,
    max_cutoffs: (f64, f64),
    avg_cutoffs: (f64, f64),
}

// Stacks (time, row, col) nested frames, which must all be the same size.
fn frames_to_movie(frames: Vec<Vec<Vec<f64>>>) -> Result<Array3<f64>, Box<dyn Error>> {
    let height = frames.first().map_or(0, |frame| frame.len());
    let width = frames.first().and_then(|frame| frame.first()).map_or(0, |row| row.len());
    let mut data = Vec::with_capacity(frames.len() * height * width);
    for (t, frame) in frames.iter().enumerate() {
        if frame.len() != height || frame.iter().any(|row| row.len() != width) {
            return Err(format!("Movie frame {} is not {}x{}", t, height, width).into());
        }
        data.extend(frame.iter().flatten().copied());
    }
    Ok(Array3::from_shape_vec((frames.len(), height, width), data)?)
}

fn load_movie(path: &Path) -> Result<Array3<f64>, Box<dyn Error>> {
    frames_to_movie(serde_json::from_str(&fs::read_to_string(path)?)?)
}

// Max and average projections of the part of `movie` under the ROI's mask
// image, registered with `Roi::sized_mask(Some(shape), full)`.
fn roi_projections(roi: &Roi, movie: &Array3<f64>, shape: (usize, usize),
                   full: bool) -> (Array2<f64>, Array2<f64>) {
    let (_, height, width) = movie.dim();
    let (extent, pads) = if full {
        (Extent::new(0, height, 0, width), PadSpec::default())
    } else {
        roi.content_extents(shape)
    };
    let sub_movie = window_movie(movie.view(), &extent, &pads);
    (max_projection(sub_movie.view()), mean_projection(sub_movie.view()))
}

fn prepare_movie(path: &Path, args: &Args) -> Result<MovieProducts, Box<dyn Error>> {
    let movie_start = Instant::now();
    let raw = load_movie(path)?;
    info!("Loaded movie {:?} from {:?}", raw.dim(), path);
    let movie = downsample_array(raw.into_dyn().view(),
                                 args.input_rate, args.output_rate,
                                 args.strategy, args.random_seed)?
        .into_dimensionality::<Ix3>()?;
    let max_cutoffs = contrast_cutoffs(max_projection(movie.view()).view(),
                                       args.contrast_lower, args.contrast_upper)?;
    let avg_cutoffs = contrast_cutoffs(mean_projection(movie.view()).view(),
                                       args.contrast_lower, args.contrast_upper)?;
    info!("Movie prepared in {:?}; max cutoffs {:?}, average cutoffs {:?}",
          movie_start.elapsed(), max_cutoffs, avg_cutoffs);
    Ok(MovieProducts{movie, max_cutoffs, avg_cutoffs})
}

fn save_projection(projection: &Array2<f64>, cutoffs: (f64, f64), path: &Path)
                   -> Result<(), Box<dyn Error>> {
    let image = normalize_array(projection.view(), Some(cutoffs.0), Some(cutoffs.1));
    to_gray_image(image.view()).save(path)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let input_metadata = fs::metadata(&args.input).map_err(|e| {
        format!("Input file/dir '{}' does not exist? {:?}", args.input, e)
    })?;
    let output_metadata = fs::metadata(&args.output).map_err(|e| {
        format!("Output dir '{}' does not exist? {:?}", args.output, e)
    })?;
    if !output_metadata.is_dir() {
        return Err(format!("Output '{}' must be a directory", args.output).into());
    }
    let movie = match &args.movie {
        Some(movie_path) => Some(prepare_movie(Path::new(movie_path), &args)?),
        None => None,
    };
    if input_metadata.is_dir() {
        // Enumerate and process all of the files in the directory.
        for entry in fs::read_dir(&args.input)? {
            let path = entry?.path();
            if path.is_file() {
                run_file(&path, &args, movie.as_ref());
            }
        }
    } else {
        run_file(Path::new(&args.input), &args, movie.as_ref());
    }
    Ok(())
}

fn run_file(path: &Path, args: &Args, movie: Option<&MovieProducts>) {
    if let Err(e) = process_file(path, args, movie) {
        warn!("Skipping {:?} due to: {}", path, e);
    }
}

fn process_file(path: &Path, args: &Args, movie: Option<&MovieProducts>)
                -> Result<(), Box<dyn Error>> {
    info!("Processing {:?}", path);
    let process_start = Instant::now();
    let record: RoiRecord = serde_json::from_str(&fs::read_to_string(path)?)?;
    let mask = WeightedMask::new(record.rows, record.cols, record.values,
                                 record.shape)?;
    let roi = Roi::new(record.id, mask);
    if let Some(products) = movie {
        let (_, height, width) = products.movie.dim();
        if (height, width) != roi.mask().shape() {
            return Err(format!("ROI frame {:?} does not match movie frame {:?}",
                               roi.mask().shape(), (height, width)).into());
        }
    }
    let cropped_shape = (args.cropped_height, args.cropped_width);
    let shape = Some(cropped_shape);
    let output_dir = PathBuf::from(&args.output);

    let sized = roi.sized_mask(shape, args.full)?;
    let mask_image = normalize_array(sized.view(), Some(0.0), None);
    to_gray_image(mask_image.view())
        .save(output_dir.join(format!("mask_{}.png", roi.id())))?;

    let options = OutlineOptions{
        threshold: Threshold::from_options(args.threshold, args.quantile),
        dilation_size: args.dilation_size,
        inner_only: args.inner_only,
        shape,
        full: args.full,
    };
    let outline = roi.outline(&options)?;
    to_gray_image(outline.mapv(|v| v * 255).view())
        .save(output_dir.join(format!("outline_{}.png", roi.id())))?;

    if let Some(products) = movie {
        let (max, avg) = roi_projections(&roi, &products.movie, cropped_shape,
                                         args.full);
        save_projection(&max, products.max_cutoffs,
                        &output_dir.join(format!("max_{}.png", roi.id())))?;
        save_projection(&avg, products.avg_cutoffs,
                        &output_dir.join(format!("avg_{}.png", roi.id())))?;
    }

    if let Some(trace) = record.trace {
        let downsampled = downsample_array(
            Array1::from(trace).into_dyn().view(),
            args.input_rate, args.output_rate, args.strategy, args.random_seed)?;
        let trace: Vec<f64> = downsampled.iter().copied().collect();
        let trace_record = TraceRecord{
            point_start: 0,
            point_interval: 1.0 / args.output_rate as f64,
            data_length: trace.len(),
            trace,
        };
        fs::write(output_dir.join(format!("trace_{}.json", roi.id())),
                  serde_json::to_string(&trace_record)?)?;
    }
    info!("ROI {} ({} entries) done in {:?}",
          roi.id(), roi.mask().nnz(), process_start.elapsed());
    Ok(())
}

// mod tests.
