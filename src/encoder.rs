//! Segment encoding
//!
//! A segment's samples become power bytes, streamed to the firmware pixel
//! buffer as lowercase hex inside `M100.1({pad:"..."})` lines. The move that
//! burns them carries a W coordinate: the firmware advances its read pointer
//! one byte per W step, so W must travel exactly one step per byte sent.

use crate::power::PowerQuantizer;
use crate::raster::RasterImage;
use crate::scan::{RowPlan, Segment};
use crate::transform::MachineFrame;

/// W axis position, mirrored on the host.
///
/// W starts at zero (the header zeroes it on the machine) and swings back and
/// forth around zero: it moves up while at or below zero and down while
/// above, so it never needs resetting however long the job runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WAxis {
    value: f64,
    step_per_byte: f64,
}

impl WAxis {
    pub fn new(step_per_byte: f64) -> Self {
        Self {
            value: 0.0,
            step_per_byte,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Move W by `bytes` steps and return the new position, snapped to
    /// hundredths.
    pub fn advance(&mut self, bytes: u32) -> f64 {
        let delta = bytes as f64 * self.step_per_byte;
        if self.value <= 0.0 {
            self.value += delta;
        } else {
            self.value -= delta;
        }
        self.value = (self.value * 100.0).round() / 100.0;
        self.value
    }
}

/// Everything emitted for one segment
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSegment {
    /// Hex payloads, one per pad line
    pub chunks: Vec<String>,
    /// Machine position of the last sample
    pub endpoint: (f64, f64),
    /// W register after this segment
    pub w: f64,
    /// Bytes in the segment
    pub bytes: u32,
}

/// Encodes segments of one raster.
#[derive(Debug, Clone, Copy)]
pub struct SegmentEncoder {
    quantizer: PowerQuantizer,
    frame: MachineFrame,
    bytes_per_line: usize,
    w_bias: f64,
}

impl SegmentEncoder {
    pub fn new(
        quantizer: PowerQuantizer,
        frame: MachineFrame,
        bytes_per_line: u32,
        w_bias: f64,
    ) -> Self {
        Self {
            quantizer,
            frame,
            bytes_per_line: bytes_per_line.max(1) as usize,
            w_bias,
        }
    }

    /// Power bytes for `segment` in scan order
    pub fn power_bytes(&self, image: &RasterImage, row: &RowPlan, segment: &Segment) -> Vec<u8> {
        let cols = image.cols();
        (segment.start..segment.start + segment.len)
            .map(|i| {
                let col = row.direction.column(i, cols);
                self.quantizer.power_byte(image.sample(col, row.row))
            })
            .collect()
    }

    /// Split bytes into hex strings of at most `bytes_per_line` bytes.
    pub fn hex_chunks(&self, bytes: &[u8]) -> Vec<String> {
        bytes
            .chunks(self.bytes_per_line)
            .map(|chunk| chunk.iter().map(|b| format!("{:02x}", b)).collect())
            .collect()
    }

    /// Encode one segment, advancing `w` by its byte count.
    pub fn encode(
        &self,
        image: &RasterImage,
        row: &RowPlan,
        segment: &Segment,
        w: &mut WAxis,
    ) -> EncodedSegment {
        let bytes = self.power_bytes(image, row, segment);
        let chunks = self.hex_chunks(&bytes);
        let last_col = row.direction.column(segment.last(), image.cols());
        EncodedSegment {
            chunks,
            endpoint: self.frame.point(last_col, row.row),
            w: w.advance(segment.len),
            bytes: segment.len,
        }
    }

    /// `M100.1({pad:"<hex>"})`
    pub fn pad_line(chunk: &str) -> String {
        format!("M100.1({{pad:\"{}\"}})", chunk)
    }

    /// `G1X<x>Y<y>W<w>` closing a segment
    pub fn move_line(&self, encoded: &EncodedSegment) -> String {
        let (x, y) = encoded.endpoint;
        format!("G1X{:.3}Y{:.3}W{:.3}", x, y, encoded.w + self.w_bias)
    }
}
