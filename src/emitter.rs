//! G-code program emission
//!
//! Drives the scan plan through the encoder and appends lines to the output
//! in strict order: header, then per row a start move followed by pad/move
//! pairs for each segment, then footer.

use crate::encoder::{SegmentEncoder, WAxis};
use crate::error::{RasterError, RasterResult};
use crate::options::RasterOptions;
use crate::power::PowerQuantizer;
use crate::raster::RasterImage;
use crate::scan::{self, RowPlan};
use crate::transform::MachineFrame;
use std::io::Write;
use tracing::{debug, info};

/// Device initialization
pub const HEADER: &[&str] = &[
    "T1",
    "G21",
    "G90",
    "G0W-0.015",
    "T32",
    "M6",
    "S0",
    "M4",
    "G0Z6.350",
    "G0X0.000Y0.000",
];

/// Laser off, disable, park
pub const FOOTER: &[&str] = &["S0", "M5", "G0Z6.350", "G0X0.000Y0.000"];

/// Where the emitter is in the program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterState {
    Header,
    RowStart { row: usize },
    SegmentData { row: usize, segment: usize },
    SegmentMove { row: usize, segment: usize },
    Footer,
    Done,
}

/// Line counts of a finished program
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramStats {
    pub lines: usize,
    pub rows: usize,
    pub segments: usize,
    pub pad_lines: usize,
    pub bytes: u64,
}

/// Compiles one raster into G-code written to `out`.
pub struct ProgramEmitter<'a, W: Write> {
    image: &'a RasterImage,
    options: &'a RasterOptions,
    out: W,
    plan: Vec<RowPlan>,
    quantizer: PowerQuantizer,
    frame: MachineFrame,
    encoder: SegmentEncoder,
    w_axis: WAxis,
    pending_move: Option<String>,
    state: EmitterState,
    stats: ProgramStats,
}

impl<'a, W: Write> ProgramEmitter<'a, W> {
    /// Validates the options against the image before anything is written.
    pub fn new(image: &'a RasterImage, options: &'a RasterOptions, out: W) -> RasterResult<Self> {
        options.validate()?;
        if image.cols() != options.columns() || image.rows() != options.rows() {
            return Err(RasterError::config(format!(
                "raster is {}x{} but the options call for {}x{}",
                image.cols(),
                image.rows(),
                options.columns(),
                options.rows()
            )));
        }

        let quantizer = options.quantizer();
        let frame = options.frame();
        Ok(Self {
            image,
            options,
            out,
            plan: scan::plan(image.rows(), image.cols(), options.max_bytes_per_segment),
            quantizer,
            frame,
            encoder: SegmentEncoder::new(
                quantizer,
                frame,
                options.bytes_per_line(),
                options.w_bias,
            ),
            w_axis: WAxis::new(options.w_step_per_byte),
            pending_move: None,
            state: EmitterState::Header,
            stats: ProgramStats::default(),
        })
    }

    pub fn state(&self) -> EmitterState {
        self.state
    }

    pub fn stats(&self) -> ProgramStats {
        self.stats
    }

    fn line(&mut self, line: &str) -> RasterResult<()> {
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.stats.lines += 1;
        Ok(())
    }

    fn after_segment(&self, row: usize, segment: usize) -> EmitterState {
        if segment + 1 < self.plan[row].segments.len() {
            EmitterState::SegmentData {
                row,
                segment: segment + 1,
            }
        } else if row + 1 < self.plan.len() {
            EmitterState::RowStart { row: row + 1 }
        } else {
            EmitterState::Footer
        }
    }

    /// Emit the lines for the current state and move to the next one.
    pub fn step(&mut self) -> RasterResult<EmitterState> {
        let next = match self.state {
            EmitterState::Header => {
                for line in HEADER {
                    self.line(line)?;
                }
                EmitterState::RowStart { row: 0 }
            }
            EmitterState::RowStart { row } => {
                let plan = &self.plan[row];
                let first_col = plan.direction.column(0, self.image.cols());
                let (x, y) = self.frame.point(first_col, plan.row);
                debug!(row, direction = ?plan.direction, "row start");

                if row == 0 {
                    let (ox, oy) = self.frame.origin();
                    let power = self.quantizer.power(self.image.sample(0, 0)) * 100.0;
                    self.line(&format!("G0X{:.3}Y{:.3}", ox, oy))?;
                    self.line("G0Z0")?;
                    self.line(&format!("G1F{:.3}", self.options.feed_rate))?;
                    self.line(&format!("S{:.3}", power))?;
                }
                self.line(&format!("G1X{:.3}Y{:.3}", x, y))?;
                self.stats.rows += 1;
                EmitterState::SegmentData { row, segment: 0 }
            }
            EmitterState::SegmentData { row, segment } => {
                let plan = &self.plan[row];
                let encoded =
                    self.encoder
                        .encode(self.image, plan, &plan.segments[segment], &mut self.w_axis);
                for chunk in &encoded.chunks {
                    self.line(&SegmentEncoder::pad_line(chunk))?;
                }
                self.stats.pad_lines += encoded.chunks.len();
                self.stats.bytes += u64::from(encoded.bytes);
                self.pending_move = Some(self.encoder.move_line(&encoded));
                EmitterState::SegmentMove { row, segment }
            }
            EmitterState::SegmentMove { row, segment } => {
                if let Some(line) = self.pending_move.take() {
                    self.line(&line)?;
                }
                self.stats.segments += 1;
                self.after_segment(row, segment)
            }
            EmitterState::Footer => {
                for line in FOOTER {
                    self.line(line)?;
                }
                self.out.flush()?;
                EmitterState::Done
            }
            EmitterState::Done => EmitterState::Done,
        };
        self.state = next;
        Ok(next)
    }

    /// Emit the whole program.
    pub fn run(mut self) -> RasterResult<ProgramStats> {
        while self.step()? != EmitterState::Done {}
        info!(
            lines = self.stats.lines,
            rows = self.stats.rows,
            segments = self.stats.segments,
            bytes = self.stats.bytes,
            "raster program written"
        );
        Ok(self.stats)
    }
}

/// Compile `image` into `out`.
pub fn compile<W: Write>(
    image: &RasterImage,
    options: &RasterOptions,
    out: W,
) -> RasterResult<ProgramStats> {
    ProgramEmitter::new(image, options, out)?.run()
}

/// Compile `image` into an in-memory program.
pub fn compile_to_string(image: &RasterImage, options: &RasterOptions) -> RasterResult<String> {
    let mut buf = Vec::new();
    compile(image, options, &mut buf)?;
    String::from_utf8(buf).map_err(|e| RasterError::Io(std::io::Error::other(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(cols: u32, rows: u32) -> RasterOptions {
        RasterOptions {
            resolution_dpmm: 1.0,
            width_mm: cols as f64,
            height_mm: rows as f64,
            power_min: 0.0,
            power_max: 0.5,
            max_bytes_per_segment: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_state_sequence() {
        let image = RasterImage::from_rows(&[&[0, 85, 170, 255], &[255, 170, 85, 0]]).unwrap();
        let opts = options(4, 2);
        let mut emitter = ProgramEmitter::new(&image, &opts, Vec::new()).unwrap();

        let mut states = vec![emitter.state()];
        while emitter.state() != EmitterState::Done {
            states.push(emitter.step().unwrap());
        }

        use EmitterState::*;
        assert_eq!(
            states,
            vec![
                Header,
                RowStart { row: 0 },
                SegmentData { row: 0, segment: 0 },
                SegmentMove { row: 0, segment: 0 },
                SegmentData { row: 0, segment: 1 },
                SegmentMove { row: 0, segment: 1 },
                RowStart { row: 1 },
                SegmentData { row: 1, segment: 0 },
                SegmentMove { row: 1, segment: 0 },
                SegmentData { row: 1, segment: 1 },
                SegmentMove { row: 1, segment: 1 },
                Footer,
                Done,
            ]
        );
        // Done is terminal
        assert_eq!(emitter.step().unwrap(), Done);

        let stats = emitter.stats();
        assert_eq!((stats.rows, stats.segments, stats.pad_lines), (2, 4, 4));
        assert_eq!(stats.bytes, 8);
        assert_eq!(stats.lines, HEADER.len() + 4 + 2 + 4 + 4 + FOOTER.len());
    }

    #[test]
    fn test_first_row_prelude() {
        let image = RasterImage::from_rows(&[&[0, 255]]).unwrap();
        let opts = options(2, 1);
        let program = compile_to_string(&image, &opts).unwrap();
        let lines: Vec<&str> = program.lines().collect();
        let body = &lines[HEADER.len()..];
        assert_eq!(body[0], "G0X0.000Y1.000");
        assert_eq!(body[1], "G0Z0");
        assert_eq!(body[2], "G1F1800.000");
        assert_eq!(body[3], "S50.000");
        assert_eq!(body[4], "G1X0.000Y1.000");
        assert_eq!(body[5], "M100.1({pad:\"8000\"})");
        assert_eq!(body[6], "G1X1.000Y1.000W0.015");
    }

    #[test]
    fn test_mismatched_raster_rejected() {
        let image = RasterImage::from_rows(&[&[0, 255, 0]]).unwrap();
        let opts = options(2, 1);
        let mut out = Vec::new();
        let err = compile(&image, &opts, &mut out).unwrap_err();
        assert!(matches!(err, RasterError::Configuration(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_stats() {
        let image = RasterImage::from_rows(&[&[10; 10], &[20; 10], &[30; 10]]).unwrap();
        let opts = options(10, 3);
        let stats = compile(&image, &opts, std::io::sink()).unwrap();
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.segments, 9);
        assert_eq!(stats.pad_lines, 9);
        assert_eq!(stats.bytes, 30);
        // header + prelude(4) + rows + pads + moves + footer
        assert_eq!(stats.lines, HEADER.len() + 4 + 3 + 9 + 9 + FOOTER.len());
    }
}
