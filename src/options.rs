//! Raster job configuration.

use crate::error::{RasterError, RasterResult};
use crate::power::PowerQuantizer;
use crate::transform::{MachineFrame, Placement};
use crate::units::MM_PER_INCH;
use tracing::warn;

/// Maximum ASCII characters per protocol line
pub const DEFAULT_MAX_LINE_CHARS: u32 = 480;

/// Options for compiling a raster into G-code
#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Dots per millimetre
    pub resolution_dpmm: f64,
    /// Engraved width, mm
    pub width_mm: f64,
    /// Engraved height, mm
    pub height_mm: f64,
    /// Engraving feed, mm/min
    pub feed_rate: f64,
    /// Power fraction for white
    pub power_min: f64,
    /// Power fraction for black
    pub power_max: f64,
    /// Grayscale bits kept, 1-8
    pub bit_depth: u8,
    /// Shift applied before rotation, mm
    pub translate_x: f64,
    pub translate_y: f64,
    /// Rotation about the shifted origin
    pub rotation_degrees: f64,
    /// Upper bound for bytes streamed per move
    pub max_bytes_per_segment: u32,
    /// Upper bound for characters per pad line
    pub max_line_chars: u32,
    /// W travel per transmitted byte, mm
    pub w_step_per_byte: f64,
    /// Offset added to every emitted W value
    pub w_bias: f64,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            resolution_dpmm: 100.0 / MM_PER_INCH,
            width_mm: 0.0,
            height_mm: 0.0,
            feed_rate: 1800.0,
            power_min: 0.0,
            power_max: 0.5,
            bit_depth: 8,
            translate_x: 0.0,
            translate_y: 0.0,
            rotation_degrees: 0.0,
            max_bytes_per_segment: DEFAULT_MAX_LINE_CHARS / 2,
            max_line_chars: DEFAULT_MAX_LINE_CHARS,
            w_step_per_byte: 0.01,
            w_bias: -0.005,
        }
    }
}

fn positive(value: f64, name: &str) -> RasterResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RasterError::config(format!("{} must be positive, got {}", name, value)))
    }
}

impl RasterOptions {
    /// Dots across
    pub fn columns(&self) -> u32 {
        (self.width_mm * self.resolution_dpmm).round() as u32
    }

    /// Dots down
    pub fn rows(&self) -> u32 {
        (self.height_mm * self.resolution_dpmm).round() as u32
    }

    /// Distance between dots and between rows, mm
    pub fn step_over(&self) -> f64 {
        1.0 / self.resolution_dpmm
    }

    /// Pad bytes per protocol line
    pub fn bytes_per_line(&self) -> u32 {
        self.max_line_chars / 2
    }

    /// Ideal burn time ignoring acceleration
    pub fn estimated_minutes(&self) -> f64 {
        (self.width_mm / self.feed_rate) * self.rows() as f64
    }

    pub fn quantizer(&self) -> PowerQuantizer {
        PowerQuantizer::new(self.power_min, self.power_max, self.bit_depth)
    }

    pub fn frame(&self) -> MachineFrame {
        MachineFrame {
            placement: Placement::new(self.translate_x, self.translate_y, self.rotation_degrees),
            step_over: self.step_over(),
            height_mm: self.height_mm,
        }
    }

    /// Fill in the engraved size from the source image. With neither
    /// dimension given the image keeps its natural size at the configured
    /// resolution; with one given the other follows the aspect ratio.
    pub fn resolve_size(
        &mut self,
        image_width: u32,
        image_height: u32,
        width_mm: Option<f64>,
        height_mm: Option<f64>,
    ) -> RasterResult<()> {
        if image_width == 0 || image_height == 0 {
            return Err(RasterError::config("source image is empty"));
        }
        positive(self.resolution_dpmm, "resolution")?;

        let aspect = image_height as f64 / image_width as f64;
        let (width, height) = match (width_mm, height_mm) {
            (None, None) => (
                image_width as f64 / self.resolution_dpmm,
                image_height as f64 / self.resolution_dpmm,
            ),
            (Some(w), None) => (w, w * aspect),
            (None, Some(h)) => (h / aspect, h),
            (Some(w), Some(h)) => {
                let requested = h / w;
                if (requested - aspect).abs() > 1e-3 * aspect {
                    warn!(
                        image_aspect = aspect,
                        requested_aspect = requested,
                        "width and height distort the image aspect ratio"
                    );
                }
                (w, h)
            }
        };
        self.width_mm = width;
        self.height_mm = height;
        Ok(())
    }

    /// Check every precondition of compilation.
    pub fn validate(&self) -> RasterResult<()> {
        positive(self.resolution_dpmm, "resolution")?;
        positive(self.width_mm, "width")?;
        positive(self.height_mm, "height")?;
        positive(self.feed_rate, "feed rate")?;

        let powers = [
            ("minimum power", self.power_min),
            ("maximum power", self.power_max),
        ];
        for (name, value) in powers {
            if !(0.0..=1.0).contains(&value) {
                return Err(RasterError::config(format!("{} {} outside 0..1", name, value)));
            }
        }
        if self.power_min > self.power_max {
            return Err(RasterError::config(format!(
                "minimum power {} exceeds maximum power {}",
                self.power_min, self.power_max
            )));
        }
        if !(1..=8).contains(&self.bit_depth) {
            return Err(RasterError::config(format!("bit depth {} outside 1..=8", self.bit_depth)));
        }
        if self.max_line_chars < 2 {
            return Err(RasterError::config(format!(
                "max line chars {} cannot hold one byte",
                self.max_line_chars
            )));
        }
        if self.max_bytes_per_segment < 2 {
            return Err(RasterError::config(format!(
                "max bytes per segment {} must be at least 2",
                self.max_bytes_per_segment
            )));
        }
        if !self.w_step_per_byte.is_finite() || !self.w_bias.is_finite() {
            return Err(RasterError::config("W axis settings must be finite"));
        }
        if self.columns() == 0 || self.rows() == 0 {
            return Err(RasterError::config(format!(
                "{:.3}mm x {:.3}mm at {:.3} dots/mm is an empty raster",
                self.width_mm, self.height_mm, self.resolution_dpmm
            )));
        }
        Ok(())
    }
}
