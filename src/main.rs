#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use rayon::prelude::*;
use std::io::Write;
use std::process::ExitCode;
use std::time::Instant;
use swar_life::{
    Evolve, KernelVariant, PackedLife, PackedLifeConfig, ReferenceLife, World, copy_world,
    populate_uniform, render,
};
use tracing_subscriber::EnvFilter;

const WORLD_SIZE: usize = 1024;
const ITERATIONS: u64 = 2000;
const LIVE_DENSITY: f64 = 0.3;
/// Assumed clock speed, cycles per nanosecond.
const PROC_SPEED: f64 = 3.6;

const TEST_SIZE: usize = 128;
const TEST_COUNT: usize = 5;
const TEST_SEED: u64 = 0x5EED_1234_ABCD_EF01;

struct MainArgs {
    config: PackedLifeConfig,
    size: usize,
    iters: u64,
    density: f64,
    seed: u64,
    trials: usize,
    ghz: f64,
    pgo_train: bool,
}

fn parse_args() -> MainArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = MainArgs {
        config: PackedLifeConfig::default(),
        size: WORLD_SIZE,
        iters: ITERATIONS,
        density: LIVE_DENSITY,
        seed: TEST_SEED,
        trials: TEST_COUNT,
        ghz: PROC_SPEED,
        pgo_train: false,
    };
    let next_arg = |i: usize, flag: &str| -> &str {
        args.get(i)
            .map(String::as_str)
            .unwrap_or_else(|| panic!("{flag} requires a value"))
    };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--kernel" => {
                i += 1;
                let variant: KernelVariant = next_arg(i, "--kernel")
                    .parse()
                    .unwrap_or_else(|err| panic!("{err}"));
                parsed.config = parsed.config.kernel(variant);
            }
            "--size" => {
                i += 1;
                parsed.size = next_arg(i, "--size")
                    .parse()
                    .expect("--size requires a positive integer");
            }
            "--iters" => {
                i += 1;
                parsed.iters = next_arg(i, "--iters")
                    .parse()
                    .expect("--iters requires a positive integer");
            }
            "--density" => {
                i += 1;
                parsed.density = next_arg(i, "--density")
                    .parse()
                    .expect("--density requires a number in 0..=1");
            }
            "--seed" => {
                i += 1;
                parsed.seed = next_arg(i, "--seed")
                    .parse()
                    .expect("--seed requires an integer (0 = random)");
            }
            "--trials" => {
                i += 1;
                parsed.trials = next_arg(i, "--trials")
                    .parse()
                    .expect("--trials requires a positive integer");
            }
            "--ghz" => {
                i += 1;
                parsed.ghz = next_arg(i, "--ghz")
                    .parse()
                    .expect("--ghz requires a number");
            }
            "--pgo-train" => {
                parsed.pgo_train = true;
            }
            other => panic!(
                "unknown argument: {other}\nusage: swar-life [--kernel table|bitwise] [--size N] [--iters N] [--density P] [--seed N] [--trials N] [--ghz F] [--pgo-train]"
            ),
        }
        i += 1;
    }
    parsed
}

/// Outcome of one reference-vs-packed trial that disagreed.
struct Mismatch {
    seed: u64,
    initial: String,
    expected: String,
    actual: String,
}

fn check_trial(config: PackedLifeConfig, density: f64, seed: u64) -> Result<(), Mismatch> {
    let mut reference = ReferenceLife::with_size(TEST_SIZE, TEST_SIZE);
    populate_uniform(&mut reference, density, seed).unwrap_or_else(|err| panic!("{err}"));
    let initial = reference.to_string();

    let mut packed = PackedLife::with_config(config);
    copy_world(&mut packed, &reference).unwrap_or_else(|err| panic!("{err}"));

    reference.advance();
    packed.advance();
    if reference == packed {
        return Ok(());
    }
    Err(Mismatch {
        seed,
        initial,
        expected: reference.to_string(),
        actual: render(&packed).to_string(),
    })
}

fn run_self_test(args: &MainArgs) -> bool {
    print!("Testing... ");
    let _ = std::io::stdout().flush();
    // Seed 0 keeps every trial non-deterministic; otherwise each trial gets its own seed.
    let seeds: Vec<u64> = (0..args.trials as u64)
        .map(|i| if args.seed == 0 { 0 } else { args.seed.wrapping_add(i) })
        .collect();
    let failures: Vec<Mismatch> = seeds
        .par_iter()
        .filter_map(|&seed| check_trial(args.config, args.density, seed).err())
        .collect();

    if failures.is_empty() {
        println!("Done!");
        return true;
    }
    println!("FAILED");
    for failure in &failures {
        tracing::error!(seed = failure.seed, "world mismatch");
        eprintln!("Initial:\n{}", failure.initial);
        eprintln!("Expected:\n{}", failure.expected);
        eprintln!("Actual:\n{}", failure.actual);
    }
    false
}

fn seeded_world(args: &MainArgs) -> PackedLife {
    let mut world = PackedLife::with_size_and_config(args.size, args.size, args.config)
        .unwrap_or_else(|err| panic!("{err}"));
    populate_uniform(&mut world, args.density, args.seed).unwrap_or_else(|err| panic!("{err}"));
    world
}

fn run_benchmark(args: &MainArgs) {
    print!("Running... ");
    let _ = std::io::stdout().flush();
    let mut world = seeded_world(args);
    let start = Instant::now();
    world.advance_n(args.iters);
    let elapsed = start.elapsed();
    println!("Done!");

    let total_ns = elapsed.as_nanos() as f64;
    let ms_per_iter = total_ns / 1_000_000.0 / args.iters as f64;
    let cells = (world.width() * world.height()) as f64;
    let cycles_per_cell = total_ns * args.ghz / args.iters as f64 / cells;
    println!(
        "Kernel: {}, population after {} iterations: {}",
        world.kernel(),
        args.iters,
        world.population()
    );
    println!("Time: {ms_per_iter:.6} milliseconds per iteration.");
    println!("Equivalently: {cycles_per_cell:.4} clock cycles per cell.");
}

fn run_pgo_train(args: &MainArgs) {
    let mut world = seeded_world(args);
    world.advance_n(args.iters);
    std::hint::black_box(world.population());
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    if args.pgo_train {
        run_pgo_train(&args);
        return ExitCode::SUCCESS;
    }
    if !run_self_test(&args) {
        return ExitCode::FAILURE;
    }
    run_benchmark(&args);
    ExitCode::SUCCESS
}
