//! Raster image preparation
//!
//! Turns a decoded image into the fixed `cols x rows` grid of 8-bit samples
//! the compiler reads:
//! 1. Convert to grayscale
//! 2. Stretch contrast, optionally clipping the extreme tails of the histogram
//! 3. Resize (bicubic) to the dot grid of the engraving

use crate::error::{RasterError, RasterResult};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageReader, Luma};
use std::path::Path;
use tracing::debug;

/// Read-only grid of grayscale samples, origin top-left
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: GrayImage,
}

impl RasterImage {
    pub fn new(pixels: GrayImage) -> Self {
        Self { pixels }
    }

    /// Build from rows of samples; all rows must share one length.
    pub fn from_rows(rows: &[&[u8]]) -> RasterResult<Self> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        if rows.iter().any(|r| r.len() as u32 != width) {
            return Err(RasterError::config("raster rows differ in length"));
        }
        let data: Vec<u8> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        GrayImage::from_raw(width, height, data)
            .map(Self::new)
            .ok_or_else(|| RasterError::config("raster buffer does not match its size"))
    }

    pub fn cols(&self) -> u32 {
        self.pixels.width()
    }

    pub fn rows(&self) -> u32 {
        self.pixels.height()
    }

    pub fn sample(&self, col: u32, row: u32) -> u8 {
        self.pixels.get_pixel(col, row).0[0]
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.pixels
    }

    /// Write the prepared grid as PNG
    pub fn save_preview<P: AsRef<Path>>(&self, path: P) -> RasterResult<()> {
        self.pixels.save(path.as_ref())?;
        Ok(())
    }
}

/// Decode an image file
pub fn load_image<P: AsRef<Path>>(path: P) -> RasterResult<DynamicImage> {
    let img = ImageReader::open(path.as_ref())?
        .with_guessed_format()?
        .decode()?;
    Ok(img)
}

/// Grayscale, auto-contrast and resize to exactly `cols x rows`.
/// `cutoff_percent` of the darkest and of the lightest pixels are clipped.
pub fn prepare(img: &DynamicImage, cols: u32, rows: u32, cutoff_percent: f64) -> RasterImage {
    let mut gray = img.to_luma8();
    autocontrast(&mut gray, cutoff_percent);
    debug!(
        from_width = gray.width(),
        from_height = gray.height(),
        cols,
        rows,
        "resizing raster"
    );
    let resized = image::imageops::resize(&gray, cols, rows, FilterType::CatmullRom);
    RasterImage::new(resized)
}

/// Stretch the histogram so the remaining darkest level maps to 0 and the
/// lightest to 255. Leaves flat images untouched.
pub fn autocontrast(img: &mut GrayImage, cutoff_percent: f64) {
    let mut histogram = [0u64; 256];
    for pixel in img.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return;
    }
    let cut = (total as f64 * cutoff_percent.clamp(0.0, 50.0) / 100.0) as u64;

    let Some(lo) = clipped_bound(histogram.iter().enumerate(), cut) else {
        return;
    };
    let Some(hi) = clipped_bound(histogram.iter().enumerate().rev(), cut) else {
        return;
    };
    if hi <= lo {
        return;
    }

    let scale = 255.0 / (hi - lo) as f64;
    let offset = -(lo as f64) * scale;
    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        *entry = (i as f64 * scale + offset).round().clamp(0.0, 255.0) as u8;
    }

    for pixel in img.pixels_mut() {
        *pixel = Luma([lut[pixel.0[0] as usize]]);
    }
}

/// First level (in iteration order) still populated after removing `cut`
/// pixels from that end of the histogram.
fn clipped_bound<'a>(levels: impl Iterator<Item = (usize, &'a u64)>, cut: u64) -> Option<usize> {
    let mut remaining = cut;
    for (level, &count) in levels {
        if count > remaining {
            return Some(level);
        }
        remaining -= count;
    }
    None
}
