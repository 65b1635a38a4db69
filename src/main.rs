use anyhow::{Context, Result};
use clap::Parser;
use laser_raster::units::{
    MM_PER_INCH, parse_feed_mm_per_min, parse_length_mm, parse_resolution_dpmm,
    percent_to_fraction,
};
use laser_raster::{RasterOptions, compile, load_image, prepare};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Convert an image to raster engraving G-code
#[derive(Parser, Debug)]
#[command(name = "laser-raster", version, about)]
struct Cli {
    /// Image to convert
    image: PathBuf,

    /// Output file, defaults to '<image>.gcode'
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Dots per inch, or per mm with a 'dpmm' suffix e.g. '10.23dpmm'
    #[arg(short, long, default_value = "100")]
    dpi: String,

    /// Printed width in mm, or inches with an 'in' suffix. Height follows
    /// the image aspect ratio unless also given.
    #[arg(short, long)]
    width: Option<String>,

    /// Printed height in mm, or inches with an 'in' suffix
    #[arg(short = 't', long)]
    height: Option<String>,

    /// Feed rate in mm/min, or in/min with an 'in' suffix
    #[arg(short, long, default_value = "1800")]
    feed: String,

    /// Minimum laser power, percent
    #[arg(short = 'n', long, default_value_t = 0.0)]
    power_min: f64,

    /// Maximum laser power, percent
    #[arg(short = 'x', long, default_value_t = 50.0)]
    power_max: f64,

    /// Grayscale bits, 1-8. Fewer bits run faster with coarser shading.
    #[arg(short, long, default_value_t = 8)]
    bits: u8,

    /// Percent of darkest and lightest pixels clipped when normalizing contrast
    #[arg(short, long, default_value_t = 0.0)]
    cutoff: f64,

    /// Translate X before rotating, mm
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    trax: f64,

    /// Translate Y before rotating, mm
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    tray: f64,

    /// Rotate about the translated origin, degrees
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    rot: f64,

    /// Maximum characters per pad line
    #[arg(long, default_value_t = 480)]
    max_line_chars: u32,

    /// Maximum bytes streamed per move
    #[arg(long, default_value_t = 240)]
    max_bytes_per_segment: u32,

    /// Write the prepared grayscale image next to the output and exit
    #[arg(long)]
    preview: bool,
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn output_path(image: &Path, output: Option<PathBuf>) -> PathBuf {
    let mut path = output.unwrap_or_else(|| {
        let mut name = image.as_os_str().to_owned();
        name.push(".gcode");
        PathBuf::from(name)
    });
    if path.extension().is_none() {
        path.set_extension("gcode");
    }
    path
}

fn build_options(cli: &Cli, image_width: u32, image_height: u32) -> Result<RasterOptions> {
    let mut options = RasterOptions {
        resolution_dpmm: parse_resolution_dpmm(&cli.dpi)?,
        feed_rate: parse_feed_mm_per_min(&cli.feed)?,
        power_min: percent_to_fraction(cli.power_min, "minimum power")?,
        power_max: percent_to_fraction(cli.power_max, "maximum power")?,
        bit_depth: cli.bits,
        translate_x: cli.trax,
        translate_y: cli.tray,
        rotation_degrees: cli.rot,
        max_bytes_per_segment: cli.max_bytes_per_segment,
        max_line_chars: cli.max_line_chars,
        ..Default::default()
    };
    let width = cli.width.as_deref().map(parse_length_mm).transpose()?;
    let height = cli.height.as_deref().map(parse_length_mm).transpose()?;
    options.resolve_size(image_width, image_height, width, height)?;
    options.validate()?;
    Ok(options)
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let output = output_path(&cli.image, cli.output.clone());
    let img = load_image(&cli.image)
        .with_context(|| format!("Error reading image '{}'", cli.image.display()))?;
    let options = build_options(&cli, img.width(), img.height())?;

    info!(
        image = %cli.image.display(),
        output = %output.display(),
        source_width_px = img.width(),
        source_height_px = img.height(),
        "job"
    );
    info!(
        width_mm = %format!("{:.3}", options.width_mm),
        height_mm = %format!("{:.3}", options.height_mm),
        width_in = %format!("{:.3}", options.width_mm / MM_PER_INCH),
        height_in = %format!("{:.3}", options.height_mm / MM_PER_INCH),
        dpmm = %format!("{:.3}", options.resolution_dpmm),
        dpi = %format!("{:.1}", options.resolution_dpmm * MM_PER_INCH),
        step_over_mm = %format!("{:.3}", options.step_over()),
        dots = %format!("{}x{}", options.columns(), options.rows()),
        "output size"
    );
    info!(
        feed_mm_min = %format!("{:.1}", options.feed_rate),
        power_max_pct = %format!("{:.1}", options.power_max * 100.0),
        power_min_pct = %format!("{:.1}", options.power_min * 100.0),
        gray_levels = options.quantizer().levels(),
        bits = options.bit_depth,
        estimated_minutes = %format!("{:.2}", options.estimated_minutes()),
        "settings"
    );

    let raster = prepare(&img, options.columns(), options.rows(), cli.cutoff);

    if cli.preview {
        let preview = output.with_extension("preview.png");
        raster
            .save_preview(&preview)
            .with_context(|| format!("Error writing preview '{}'", preview.display()))?;
        info!(preview = %preview.display(), "preview written");
        return Ok(());
    }

    let file = File::create(&output)
        .with_context(|| format!("Error creating output file '{}'", output.display()))?;
    compile(&raster, &options, BufWriter::new(file))
        .with_context(|| format!("Error writing output file '{}'", output.display()))?;

    Ok(())
}
