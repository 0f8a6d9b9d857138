//! Voronoi paint session CLI
//!
//! Replays a sequence of editing events against a paint session and writes
//! the result, standing in for the interactive window.
//!
//! ## YAML session script
//!
//! ```yaml
//! width: 320
//! height: 240
//! seed: 7
//! workers: 4
//! partitioning: interleaved
//! mode: parallel
//! show_sites: true
//! steps:
//!   - click: [10, 20]
//!   - randomize: 12
//!   - randomize: ~     # 5 to 14 sites
//!   - toggle
//!   - mode: sequential
//!   - clear
//! ```
//!
//! Run with: `voronoi-paint --script session.yaml -o out.png`
//!
//! ## Inline events
//!
//!   voronoi-paint -o out.gif -e click=10,20 -e click=200,120 -e toggle -e randomize=30
//!
//! ## Graceful interruption
//!
//! Ctrl+C cancels the pass in flight and stops the replay; the last
//! completed frame is still written out.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use serde::Deserialize;

use paint_core::{
    Button, Edit, Extent, Mode, PaintError, Partitioning, RasterConfig, Rasterizer, Rgb, Session,
    SessionConfig, SiteRegistry, Surface, DEFAULT_WORKERS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Png,
    Gif,
}

/// One editing event
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Step {
    /// Left click at [x, y]
    Click([i32; 2]),
    /// Random sites; `~` picks the count like the randomize button
    Randomize(Option<usize>),
    Clear,
    Toggle,
    Mode(String),
}

/// YAML session script format
#[derive(Debug, Deserialize)]
struct SessionScript {
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    workers: Option<usize>,
    #[serde(default)]
    partitioning: Option<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    show_sites: Option<bool>,
    #[serde(default)]
    steps: Vec<Step>,
}

fn load_script(path: &PathBuf) -> anyhow::Result<SessionScript> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script file: {:?}", path))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse script file: {:?}", path))
}

/// Parse an event string like "click=10,20", "randomize=8" or "toggle"
fn parse_event(spec: &str) -> anyhow::Result<Step> {
    let spec = spec.trim();
    let (key, val) = match spec.split_once('=') {
        Some((k, v)) => (k.trim(), Some(v.trim())),
        None => (spec, None),
    };

    match (key, val) {
        ("click", Some(val)) => {
            let (x, y) = val
                .split_once(',')
                .ok_or_else(|| anyhow::anyhow!("click needs x,y, got '{}'", val))?;
            let x = x.trim().parse().context("invalid click x")?;
            let y = y.trim().parse().context("invalid click y")?;
            Ok(Step::Click([x, y]))
        }
        ("randomize", None) => Ok(Step::Randomize(None)),
        ("randomize", Some(val)) => Ok(Step::Randomize(Some(
            val.parse().context("invalid randomize count")?,
        ))),
        ("clear", None) => Ok(Step::Clear),
        ("toggle", None) => Ok(Step::Toggle),
        ("mode", Some(val)) => Ok(Step::Mode(val.to_string())),
        _ => anyhow::bail!(
            "invalid event '{}' (expected click=x,y | randomize[=n] | clear | toggle | mode=<mode>)",
            spec
        ),
    }
}

#[derive(Parser, Debug)]
#[command(name = "voronoi-paint")]
#[command(about = "Replay Voronoi paint sessions", long_about = None)]
#[command(arg_required_else_help = true)]
struct Args {
    /// Output file path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (defaults to the output file extension)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// YAML session script
    #[arg(long)]
    script: Option<PathBuf>,

    /// Event: click=<x>,<y> | randomize[=<n>] | clear | toggle | mode=<sequential|parallel>
    #[arg(short = 'e', long = "event")]
    event: Vec<String>,

    /// Surface width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Surface height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Random seed for colors and random layouts
    #[arg(long)]
    seed: Option<u64>,

    /// Worker count for parallel passes
    #[arg(long)]
    workers: Option<usize>,

    /// Column partitioning: stripes | interleaved
    #[arg(long)]
    partitioning: Option<String>,

    /// Starting mode: sequential | parallel
    #[arg(long)]
    mode: Option<String>,

    /// Draw site markers
    #[arg(long)]
    show_sites: bool,

    /// Run benchmark comparing sequential and parallel passes
    #[arg(long)]
    benchmark: bool,

    /// Number of passes per mode in benchmark mode
    #[arg(long, default_value = "10")]
    bench_passes: usize,

    /// Number of sites to use in benchmark mode
    #[arg(long, default_value = "100")]
    bench_sites: usize,
}

const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;

/// Resolve session settings. CLI args take precedence over script values.
fn session_config(args: &Args, script: Option<&SessionScript>) -> anyhow::Result<SessionConfig> {
    let width = args.width.or(script.and_then(|s| s.width)).unwrap_or(DEFAULT_WIDTH);
    let height = args.height.or(script.and_then(|s| s.height)).unwrap_or(DEFAULT_HEIGHT);

    let mut config = SessionConfig::new(width, height);
    config.seed = args.seed.or(script.and_then(|s| s.seed)).unwrap_or(0);
    config.raster = RasterConfig {
        workers: args.workers.or(script.and_then(|s| s.workers)).unwrap_or(DEFAULT_WORKERS),
        partitioning: args
            .partitioning
            .as_deref()
            .or(script.and_then(|s| s.partitioning.as_deref()))
            .map(|s| s.parse::<Partitioning>())
            .transpose()
            .map_err(|e| anyhow::anyhow!(e))?
            .unwrap_or_default(),
    };
    config.mode = args
        .mode
        .as_deref()
        .or(script.and_then(|s| s.mode.as_deref()))
        .map(|s| s.parse::<Mode>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?
        .unwrap_or_default();
    config.show_markers = args.show_sites || script.and_then(|s| s.show_sites).unwrap_or(false);
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let script = args.script.as_ref().map(load_script).transpose()?;
    let config = session_config(&args, script.as_ref())?;
    println!(
        "Surface: {}x{}, {} workers ({:?})",
        config.extent.width, config.extent.height, config.raster.workers, config.raster.partitioning,
    );

    if args.benchmark {
        return run_benchmark(&config, &args);
    }

    let output = args
        .output
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Output path required (use -o/--output)"))?;
    let format = match args.format {
        Some(format) => format,
        None => format_from_extension(output)?,
    };

    let mut steps = script.map(|s| s.steps).unwrap_or_default();
    for spec in &args.event {
        steps.push(parse_event(spec)?);
    }
    if steps.is_empty() {
        anyhow::bail!("No events to replay (use --script or -e)");
    }

    let mut session = Session::new(config)?;

    // Ctrl+C cancels the pass in flight and stops the replay
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        let cancel = session.cancel_handle();
        ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::SeqCst);
            cancel.cancel();
        })
        .context("failed to set Ctrl-C handler")?;
    }

    let progress = ProgressBar::new(steps.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let mut encoder = match format {
        OutputFormat::Gif => Some(GifWriter::create(output, session.extent())?),
        OutputFormat::Png => None,
    };

    // (mode, ms) for every pass that ran
    let mut timings: Vec<(Mode, f64)> = Vec::with_capacity(steps.len());
    let mut steps_applied = 0usize;
    let replay_start = Instant::now();

    for step in &steps {
        if interrupted.load(Ordering::Relaxed) {
            break;
        }

        apply_step(&mut session, step)?;

        match session.repaint() {
            Ok(Some(stats)) => {
                if let Some(elapsed) = stats.elapsed {
                    timings.push((stats.mode, elapsed.as_secs_f64() * 1000.0));
                }
            }
            Ok(None) => {}
            Err(PaintError::Cancelled) => break,
            Err(e) => return Err(e.into()),
        }

        if let Some(encoder) = encoder.as_mut() {
            encoder.write_frame(session.surface())?;
        }
        steps_applied += 1;
        progress.inc(1);
    }

    if interrupted.load(Ordering::Relaxed) {
        progress.abandon_with_message("Interrupted");
        eprintln!(
            "Interrupted after {} of {} events, writing partial output...",
            steps_applied,
            steps.len()
        );
    } else {
        progress.finish_with_message("Replay complete");
    }

    match encoder {
        Some(_) => println!("Output saved to: {:?} ({} frames)", output, steps_applied),
        None => {
            session.surface().save(output)?;
            println!("Output saved to: {:?}", output);
        }
    }
    println!(
        "{} sites, replay took {:.1}s",
        session.registry().len(),
        replay_start.elapsed().as_secs_f64()
    );

    print_timings(&timings);
    Ok(())
}

fn apply_step(session: &mut Session, step: &Step) -> anyhow::Result<()> {
    match step {
        Step::Click([x, y]) => match session.click(*x, *y, Button::Left)? {
            Some(Edit::Inserted { index }) => info!("click ({}, {}): added site {}", x, y, index),
            Some(Edit::Removed { index, .. }) => {
                info!("click ({}, {}): removed site {}", x, y, index)
            }
            None => {}
        },
        Step::Randomize(Some(count)) => {
            session.randomize_with(*count)?;
            info!("placed {} random sites", count);
        }
        Step::Randomize(None) => {
            session.randomize()?;
        }
        Step::Clear => {
            session.clear();
            info!("cleared sites");
        }
        Step::Toggle => {
            let mode = session.toggle_mode();
            info!("switched to {:?}", mode);
        }
        Step::Mode(name) => {
            let mode: Mode = name.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            session.set_mode(mode);
            info!("switched to {:?}", mode);
        }
    }
    Ok(())
}

fn format_from_extension(path: &Path) -> anyhow::Result<OutputFormat> {
    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()) {
        Some(ext) if ext == "gif" => Ok(OutputFormat::Gif),
        Some(ext) if ext == "png" => Ok(OutputFormat::Png),
        _ => anyhow::bail!("cannot infer format from {:?} (use -f png|gif)", path),
    }
}

/// Print pass timing summary grouped by mode
fn print_timings(timings: &[(Mode, f64)]) {
    if timings.is_empty() {
        return;
    }
    println!("\nPass timing:");
    println!("{:>12} {:>8} {:>8} {:>8}", "mode", "passes", "avg_ms", "max_ms");
    for mode in [Mode::Sequential, Mode::Parallel] {
        let times: Vec<f64> = timings
            .iter()
            .filter(|(m, _)| *m == mode)
            .map(|&(_, ms)| ms)
            .collect();
        if times.is_empty() {
            continue;
        }
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let max = times.iter().cloned().fold(0.0f64, f64::max);
        println!("{:>12} {:>8} {:>8.2} {:>8.2}", format!("{:?}", mode), times.len(), avg, max);
    }
}

/// Benchmark sequential vs parallel passes
fn run_benchmark(config: &SessionConfig, args: &Args) -> anyhow::Result<()> {
    let num_passes = args.bench_passes.max(1);
    let num_sites = args.bench_sites;

    println!("\n=== Voronoi Paint Benchmark ===");
    println!("Sites: {}", num_sites);
    println!("Passes: {}", num_passes);
    println!();

    // Same sites for both modes
    let mut registry = SiteRegistry::new(config.seed);
    registry.randomize(num_sites, config.extent)?;

    let mut rasterizer = Rasterizer::new(config.raster)?;
    let (width, height) = (config.extent.width, config.extent.height);

    let mut sequential = Surface::new(width, height);
    let seq_time = benchmark_mode(&mut rasterizer, &mut sequential, &registry, Mode::Sequential, num_passes)?;
    report("Sequential", seq_time, num_passes);

    let mut parallel = Surface::new(width, height);
    let par_time = benchmark_mode(&mut rasterizer, &mut parallel, &registry, Mode::Parallel, num_passes)?;
    report("Parallel", par_time, num_passes);

    if sequential != parallel {
        anyhow::bail!("sequential and parallel output differ");
    }

    println!();
    println!("=== Summary ===");
    let speedup = seq_time.as_secs_f64() / par_time.as_secs_f64();
    if speedup > 1.0 {
        println!("Parallel is {:.2}x faster than sequential", speedup);
    } else {
        println!("Sequential is {:.2}x faster than parallel", 1.0 / speedup);
    }
    Ok(())
}

fn report(label: &str, total: Duration, passes: usize) {
    println!(
        "  {}: {:?} total, {:.2} ms/pass",
        label,
        total,
        total.as_secs_f64() * 1000.0 / passes as f64
    );
}

/// Time a single mode
fn benchmark_mode(
    rasterizer: &mut Rasterizer,
    surface: &mut Surface,
    registry: &SiteRegistry,
    mode: Mode,
    passes: usize,
) -> anyhow::Result<Duration> {
    // Warmup pass (spins up the worker pool)
    rasterizer.rasterize(surface, registry, mode)?;

    let start = Instant::now();
    for _ in 0..passes {
        rasterizer.rasterize(surface, registry, mode)?;
    }
    Ok(start.elapsed())
}

/// Streaming GIF writer, one frame per repaint
struct GifWriter {
    encoder: gif::Encoder<std::fs::File>,
    width: u16,
    height: u16,
}

/// Delay between frames in hundredths of a second
const FRAME_DELAY: u16 = 50;

impl GifWriter {
    fn create(output: &Path, extent: Extent) -> anyhow::Result<Self> {
        use gif::{Encoder, Repeat};
        let width = u16::try_from(extent.width).context("GIF width exceeds 65535")?;
        let height = u16::try_from(extent.height).context("GIF height exceeds 65535")?;
        let file = std::fs::File::create(output)
            .with_context(|| format!("failed to create {:?}", output))?;
        let mut encoder = Encoder::new(file, width, height, &[])?;
        encoder.set_repeat(Repeat::Infinite)?;
        Ok(Self { encoder, width, height })
    }

    fn write_frame(&mut self, surface: &Surface) -> anyhow::Result<()> {
        let rgb_data = surface.to_rgb_bytes();
        let (pixels, palette) = quantize(&rgb_data);
        let flat_palette: Vec<u8> = palette.iter().flat_map(|c| c.iter().copied()).collect();

        let mut frame =
            gif::Frame::from_palette_pixels(self.width, self.height, pixels, flat_palette, None);
        frame.delay = FRAME_DELAY;
        self.encoder.write_frame(&frame)?;
        Ok(())
    }
}

/// Map RGB pixels to a 256-entry palette.
///
/// Site colors are exact until the palette fills; later colors fall back to
/// the nearest palette entry.
fn quantize(rgb_data: &[u8]) -> (Vec<u8>, Vec<Rgb>) {
    let mut pixels: Vec<u8> = Vec::with_capacity(rgb_data.len() / 3);
    let mut palette: Vec<Rgb> = Vec::new();

    for chunk in rgb_data.chunks_exact(3) {
        let rgb = [chunk[0], chunk[1], chunk[2]];
        let idx = palette.iter().position(|&c| c == rgb).unwrap_or_else(|| {
            if palette.len() < 256 {
                palette.push(rgb);
                palette.len() - 1
            } else {
                palette
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, c)| {
                        let dr = c[0] as i32 - rgb[0] as i32;
                        let dg = c[1] as i32 - rgb[1] as i32;
                        let db = c[2] as i32 - rgb[2] as i32;
                        dr * dr + dg * dg + db * db
                    })
                    .map(|(i, _)| i)
                    .unwrap_or(0)
            }
        });
        pixels.push(idx as u8);
    }

    if palette.is_empty() {
        palette.push([0, 0, 0]);
    }
    while palette.len() < 256 {
        palette.push([0, 0, 0]);
    }
    (pixels, palette)
}
