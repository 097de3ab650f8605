//! Survey tool: how often does each squash policy land inside the flat-sea band?
//! Generates many single-shot maps per policy and prints the land fraction spread.

use std::time::Instant;

use landmass::{
    AcceptanceBand, GenerationController, RandomSeeds, RetryPolicy, SquashPolicy, TerrainGenerator,
    TerrainParams, TerrainPreset,
};

const SIZE: usize = 128;
const SAMPLES: usize = 200;
const SEED: u64 = 1337;

fn main() {
    let band = AcceptanceBand {
        min_fraction: 0.75,
        max_fraction: 0.9,
    };

    println!("=== Land fraction survey ===");
    println!("Map size: {}x{}, {} samples per policy", SIZE, SIZE, SAMPLES);
    println!(
        "Band: ({:.0}%, {:.0}%)",
        band.min_fraction * 100.0,
        band.max_fraction * 100.0
    );
    println!();

    for preset in TerrainPreset::all() {
        for &squash in SquashPolicy::all() {
            let params = TerrainParams {
                width: SIZE,
                height: SIZE,
                moisture: None,
                squash,
                ..TerrainParams::from_preset(*preset)
            };

            let generator = TerrainGenerator::new(squash);
            let mut controller = GenerationController::new(generator, RandomSeeds::from_master(SEED));
            let single_shot = TerrainParams {
                retry: RetryPolicy::single_shot(),
                ..params.clone()
            };

            let start = Instant::now();
            let mut fractions = Vec::with_capacity(SAMPLES);
            for _ in 0..SAMPLES {
                match controller.run(&single_shot) {
                    Ok(result) => fractions.push(result.land_fraction),
                    Err(e) => {
                        eprintln!("{} / {}: {}", preset, squash, e);
                        break;
                    }
                }
            }
            let elapsed = start.elapsed();

            if fractions.is_empty() {
                continue;
            }
            fractions.sort_by(f64::total_cmp);
            let hits = fractions.iter().filter(|&&f| band.contains(f)).count();
            let mean = fractions.iter().sum::<f64>() / fractions.len() as f64;

            println!("{} / {} (sea level {}):", preset, squash, params.sea_level);
            println!(
                "  land: min {:.1}%  median {:.1}%  mean {:.1}%  max {:.1}%",
                fractions[0] * 100.0,
                fractions[fractions.len() / 2] * 100.0,
                mean * 100.0,
                fractions[fractions.len() - 1] * 100.0
            );
            println!(
                "  in band: {}/{} ({:.1}%), {:?} per map",
                hits,
                fractions.len(),
                100.0 * hits as f64 / fractions.len() as f64,
                elapsed / fractions.len() as u32
            );
        }
    }
}
