//! Throughput of many independent grids advanced concurrently.
//!
//! Each grid is owned by exactly one rayon task; grids share nothing but the
//! read-only live table.

use rayon::prelude::*;
use std::env;
use std::time::Instant;
use swar_life::{Evolve, PackedLife, populate_uniform};

struct BatchConfig {
    grids: usize,
    size: usize,
    iters: u64,
    density: f64,
    threads: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            grids: 64,
            size: 256,
            iters: 200,
            density: 0.3,
            threads: None,
        }
    }
}

fn parse_args() -> BatchConfig {
    let mut cfg = BatchConfig::default();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .unwrap_or_else(|| panic!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--grids" => cfg.grids = value("--grids").parse().expect("--grids expects usize"),
            "--size" => cfg.size = value("--size").parse().expect("--size expects usize"),
            "--iters" => cfg.iters = value("--iters").parse().expect("--iters expects u64"),
            "--density" => cfg.density = value("--density").parse().expect("--density expects f64"),
            "--threads" => {
                cfg.threads = Some(value("--threads").parse().expect("--threads expects usize"))
            }
            other => panic!("unknown arg: {other}"),
        }
    }
    cfg
}

fn build_grids(cfg: &BatchConfig) -> Vec<PackedLife> {
    (0..cfg.grids)
        .into_par_iter()
        .map(|i| {
            let mut grid =
                PackedLife::with_size(cfg.size, cfg.size).unwrap_or_else(|err| panic!("{err}"));
            populate_uniform(&mut grid, cfg.density, 0xBA7C_0000 + i as u64 + 1)
                .unwrap_or_else(|err| panic!("{err}"));
            grid
        })
        .collect()
}

fn run(cfg: &BatchConfig) {
    let mut grids = build_grids(cfg);

    let start = Instant::now();
    grids.par_iter_mut().for_each(|grid| grid.advance_n(cfg.iters));
    let elapsed = start.elapsed();

    let population: u64 = grids.iter_mut().map(|grid| grid.population()).sum();
    let total_ms = elapsed.as_secs_f64() * 1000.0;
    let cell_updates = (cfg.grids * cfg.size * cfg.size) as f64 * cfg.iters as f64;
    println!(
        "grids={} size={} iters={} threads={} total_ms={:.3} cells/s={:.3e} population={}",
        cfg.grids,
        cfg.size,
        cfg.iters,
        rayon::current_num_threads(),
        total_ms,
        cell_updates / elapsed.as_secs_f64(),
        population
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cfg = parse_args();
    match cfg.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads.max(1))
                .build()
                .unwrap_or_else(|err| panic!("failed to build rayon thread pool: {err}"));
            pool.install(|| run(&cfg));
        }
        None => run(&cfg),
    }
}
