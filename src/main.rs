use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use landmass::stats::{histogram, GridStats};
use landmass::{
    AcceptanceBand, GenerationController, GenerationResult, NoiseKind, RandomSeeds, SquashPolicy,
    TerrainParams, TerrainPreset,
};

#[derive(Parser, Debug)]
#[command(name = "landmass")]
#[command(about = "Generate fractal-noise elevation and moisture grids with a land/sea split")]
struct Args {
    /// Width of the grid in cells
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Height of the grid in cells
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Master seed for the seed stream (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Preset: relief, flat-sea
    #[arg(short, long, default_value = "relief")]
    preset: String,

    /// Load parameters from a JSON file instead of a preset
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Elevation octaves
    #[arg(long)]
    octaves: Option<u32>,

    /// Moisture octaves (enables moisture if the preset has none)
    #[arg(long)]
    moisture_octaves: Option<u32>,

    /// Skip the moisture field
    #[arg(long)]
    no_moisture: bool,

    /// Base frequency of the first octave
    #[arg(long)]
    frequency: Option<f64>,

    /// Amplitude falloff per octave, in (0, 1]
    #[arg(long)]
    falloff: Option<f64>,

    /// Noise primitive: simplex, perlin, open-simplex
    #[arg(long)]
    noise: Option<String>,

    /// Squash function: linear, logistic, normalized
    #[arg(long)]
    squash: Option<String>,

    /// Sea level threshold
    #[arg(long)]
    sea_level: Option<f64>,

    /// Flatten every sea cell to exactly the sea level
    #[arg(long, conflicts_with = "no_clamp")]
    clamp: bool,

    /// Keep undersea relief
    #[arg(long)]
    no_clamp: bool,

    /// Minimum accepted land fraction (exclusive), requires --band-max
    #[arg(long, requires = "band_max")]
    band_min: Option<f64>,

    /// Maximum accepted land fraction (exclusive), requires --band-min
    #[arg(long, requires = "band_min")]
    band_max: Option<f64>,

    /// Accept the first map whatever its land fraction
    #[arg(long, conflicts_with_all = ["band_min", "band_max"])]
    single_shot: bool,

    /// Attempt cap when a band is set
    #[arg(long, conflicts_with = "unbounded")]
    max_attempts: Option<u32>,

    /// Retry without an attempt cap (combine with --deadline-ms)
    #[arg(long)]
    unbounded: bool,

    /// Wall-clock budget for the whole run in milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Keep the last rejected map if the retry budget runs out
    #[arg(long)]
    accept_last: bool,

    /// Number of elevation histogram bins to print (0 to skip)
    #[arg(long, default_value = "10")]
    histogram_bins: usize,

    /// Write the result (grids and statistics) as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let params = match build_params(&args) {
        Ok(params) => params,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    let seeds = args.seed.map(RandomSeeds::from_master).unwrap_or_default();
    println!("Master seed: {}", seeds.master());
    println!("Map size: {}x{}", params.width, params.height);

    let mut controller = GenerationController::from_params(&params, seeds);
    println!("Squash: {}, sea level: {}", controller.generator().squash(), params.sea_level);
    let result = match controller.run(&params) {
        Ok(result) => result,
        Err(e) => {
            let message = e.to_string();
            match e.into_last_result() {
                Some(last) if args.accept_last => {
                    eprintln!("{}; keeping the last map", message);
                    last
                }
                _ => {
                    eprintln!("Generation failed: {}", message);
                    process::exit(1);
                }
            }
        }
    };

    report(&result, args.histogram_bins);

    if let Some(ref path) = args.output {
        match write_result(&result, path) {
            Ok(()) => println!("Wrote result to: {}", path.display()),
            Err(e) => {
                eprintln!("Failed to write {}: {}", path.display(), e);
                process::exit(1);
            }
        }
    }
}

/// Preset or config file first, then command-line overrides.
fn build_params(args: &Args) -> Result<TerrainParams, String> {
    let mut params = match &args.config {
        Some(path) => TerrainParams::from_json_file(path).map_err(|e| e.to_string())?,
        None => {
            let preset = TerrainPreset::from_name(&args.preset)
                .ok_or_else(|| format!("Unknown preset '{}'", args.preset))?;
            TerrainParams::from_preset(preset)
        }
    };

    if let Some(width) = args.width {
        params.width = width;
    }
    if let Some(height) = args.height {
        params.height = height;
    }
    if let Some(octaves) = args.octaves {
        params.elevation.octaves = octaves;
    }
    if let Some(frequency) = args.frequency {
        params.elevation.base_frequency = frequency;
    }
    if let Some(falloff) = args.falloff {
        params.elevation.amplitude_falloff = falloff;
    }
    if let Some(ref name) = args.noise {
        let kind = NoiseKind::from_name(name).ok_or_else(|| format!("Unknown noise '{}'", name))?;
        params.elevation.kind = kind;
        if let Some(moisture) = params.moisture.as_mut() {
            moisture.kind = kind;
        }
    }

    if args.no_moisture {
        params.moisture = None;
    } else if let Some(octaves) = args.moisture_octaves {
        let mut moisture = params.moisture.take().unwrap_or_else(|| params.elevation.clone());
        moisture.octaves = octaves;
        params.moisture = Some(moisture);
    }

    if let Some(ref name) = args.squash {
        params.squash = SquashPolicy::from_name(name).ok_or_else(|| format!("Unknown squash '{}'", name))?;
    }
    if let Some(sea_level) = args.sea_level {
        params.sea_level = sea_level;
    }
    if args.clamp {
        params.clamp_below_sea_level = true;
    }
    if args.no_clamp {
        params.clamp_below_sea_level = false;
    }

    if args.single_shot {
        params.retry.band = None;
    }
    if let (Some(min), Some(max)) = (args.band_min, args.band_max) {
        params.retry.band = Some(AcceptanceBand::new(min, max).map_err(|e| e.to_string())?);
    }
    if let Some(max_attempts) = args.max_attempts {
        params.retry.max_attempts = Some(max_attempts);
    }
    if args.unbounded {
        params.retry.max_attempts = None;
    }
    if args.deadline_ms.is_some() {
        params.retry.deadline_ms = args.deadline_ms;
    }

    params.validate().map_err(|e| format!("Invalid parameters: {}", e))?;
    Ok(params)
}

fn report(result: &GenerationResult, histogram_bins: usize) {
    println!("Seeds: {}", result.seed_used);
    println!("Attempts: {}", result.attempts);
    println!(
        "Land mass: {:.2}% ({} land, {} sea cells)",
        result.land_fraction * 100.0,
        result.land_cell_count(),
        result.sea_cell_count
    );

    if let Some(stats) = GridStats::of(&result.elevation) {
        println!(
            "Elevation: {:.3} to {:.3} (mean {:.3}, std dev {:.3})",
            stats.min, stats.max, stats.mean, stats.std_dev
        );
    }
    if let Some(stats) = result.moisture.as_ref().and_then(GridStats::of) {
        println!(
            "Moisture: {:.3} to {:.3} (mean {:.3}, std dev {:.3})",
            stats.min, stats.max, stats.mean, stats.std_dev
        );
    }

    if histogram_bins > 0 {
        println!("Elevation histogram:");
        let hist = histogram(&result.elevation, histogram_bins, 0.0, 1.0);
        let total = hist.total() as f64;
        for (i, count) in hist.counts.iter().enumerate() {
            let (start, end) = hist.bin_range(i);
            println!(
                "  [{:.2}, {:.2}) {:>8} ({:>5.1}%)",
                start,
                end,
                count,
                100.0 * *count as f64 / total
            );
        }
        if hist.out_of_range() > 0 {
            println!(
                "  outside [0, 1]: {} below, {} above ({:.1}%)",
                hist.below,
                hist.above,
                100.0 * hist.out_of_range() as f64 / total
            );
        }
    }
}

fn write_result(result: &GenerationResult, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, result)?;
    Ok(())
}
