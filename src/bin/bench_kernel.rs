use std::env;
use std::time::Instant;
use swar_life::{Evolve, KernelVariant, PackedLife, PackedLifeConfig, populate_uniform};

#[derive(Clone, Debug)]
struct BenchConfig {
    size: usize,
    density: f64,
    warmup: u64,
    iters: u64,
    seed: u64,
    json: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            size: 2048,
            density: 0.42,
            warmup: 3,
            iters: 30,
            seed: 0xA5A5_5EED_7788_1122,
            json: false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct RunResult {
    total_ms: f64,
    avg_ms: f64,
    population: u64,
}

fn parse_seed(v: &str) -> u64 {
    match v.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).expect("--seed hex parse failed"),
        None => v.parse().expect("--seed expects u64"),
    }
}

fn parse_args() -> BenchConfig {
    let mut cfg = BenchConfig::default();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .unwrap_or_else(|| panic!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--size" => cfg.size = value("--size").parse().expect("--size expects usize"),
            "--density" => cfg.density = value("--density").parse().expect("--density expects f64"),
            "--warmup" => cfg.warmup = value("--warmup").parse().expect("--warmup expects u64"),
            "--iters" => cfg.iters = value("--iters").parse().expect("--iters expects u64"),
            "--seed" => cfg.seed = parse_seed(&value("--seed")),
            "--json" => cfg.json = true,
            other => panic!("unknown arg: {other}"),
        }
    }
    cfg
}

fn run_variant(cfg: &BenchConfig, variant: KernelVariant) -> RunResult {
    let config = PackedLifeConfig::default().kernel(variant);
    let mut engine = PackedLife::with_size_and_config(cfg.size, cfg.size, config)
        .unwrap_or_else(|err| panic!("{err}"));
    populate_uniform(&mut engine, cfg.density, cfg.seed).unwrap_or_else(|err| panic!("{err}"));

    if cfg.warmup > 0 {
        engine.advance_n(cfg.warmup);
    }

    let start = Instant::now();
    engine.advance_n(cfg.iters);
    let elapsed = start.elapsed();
    let total_ms = elapsed.as_secs_f64() * 1000.0;
    let avg_ms = total_ms / cfg.iters as f64;
    let population = engine.population();

    RunResult {
        total_ms,
        avg_ms,
        population,
    }
}

fn main() {
    let cfg = parse_args();
    let table = run_variant(&cfg, KernelVariant::Table);
    let bitwise = run_variant(&cfg, KernelVariant::Bitwise);
    let agree = table.population == bitwise.population;

    if cfg.json {
        println!(
            "{{\"size\":{},\"density\":{},\"warmup\":{},\"iters\":{},\"seed\":{},\"table\":{{\"total_ms\":{:.6},\"avg_ms\":{:.6},\"population\":{}}},\"bitwise\":{{\"total_ms\":{:.6},\"avg_ms\":{:.6},\"population\":{}}},\"agree\":{},\"speedup\":{:.6}}}",
            cfg.size,
            cfg.density,
            cfg.warmup,
            cfg.iters,
            cfg.seed,
            table.total_ms,
            table.avg_ms,
            table.population,
            bitwise.total_ms,
            bitwise.avg_ms,
            bitwise.population,
            agree,
            table.avg_ms / bitwise.avg_ms,
        );
    } else {
        println!(
            "table: total_ms={:.6}, avg_ms={:.6}, population={}",
            table.total_ms, table.avg_ms, table.population
        );
        println!(
            "bitwise: total_ms={:.6}, avg_ms={:.6}, population={}, speedup={:.3}x",
            bitwise.total_ms,
            bitwise.avg_ms,
            bitwise.population,
            table.avg_ms / bitwise.avg_ms,
        );
        if !agree {
            println!("WARNING: variants disagree on final population");
        }
    }
}
