//! # laser-raster
//!
//! A Rust library for turning grayscale images into raster engraving G-code
//! for controllers that stream pixel power through `M100.1` pad commands.
//!
//! ## Pipeline
//!
//! - **Raster**: decode, auto-contrast and resize to the dot grid
//! - **Scan plan**: serpentine rows split into bounded segments
//! - **Encoder**: power bytes as hex pad lines, W axis kept in step
//! - **Emitter**: header, per-row moves, pad/move pairs, footer
//!
//! ## Example
//!
//! ```rust,ignore
//! use laser_raster::{RasterOptions, compile, load_image, prepare};
//!
//! let img = load_image("photo.png").unwrap();
//! let mut options = RasterOptions::default();
//! options.resolve_size(img.width(), img.height(), Some(50.0), None).unwrap();
//! let raster = prepare(&img, options.columns(), options.rows(), 0.0);
//! let out = std::fs::File::create("photo.gcode").unwrap();
//! compile(&raster, &options, std::io::BufWriter::new(out)).unwrap();
//! ```

pub mod emitter;
pub mod encoder;
pub mod error;
pub mod options;
pub mod power;
pub mod raster;
pub mod scan;
pub mod transform;
pub mod units;

// Re-export commonly used items
pub use emitter::{EmitterState, ProgramEmitter, ProgramStats, compile, compile_to_string};
pub use encoder::{EncodedSegment, SegmentEncoder, WAxis};
pub use error::{RasterError, RasterResult};
pub use options::RasterOptions;
pub use power::PowerQuantizer;
pub use raster::{RasterImage, load_image, prepare};
pub use scan::{RowPlan, ScanDirection, Segment};
pub use transform::{MachineFrame, Placement, XForm};
