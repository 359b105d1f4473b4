use std::time::Instant;
use swar_life::packed::LANES;
use swar_life::{Evolve, PackedLife, populate_uniform};

fn bench_packed(size: usize, density: f64, iterations: u64) -> (f64, u64) {
    let mut packed = PackedLife::with_size(size, size).unwrap_or_else(|err| panic!("{err}"));
    populate_uniform(&mut packed, density, 0x5EED_1234_ABCD_EF01)
        .unwrap_or_else(|err| panic!("{err}"));

    let start = Instant::now();
    packed.advance_n(iterations);
    let duration = start.elapsed();

    let total_ms = duration.as_secs_f64() * 1000.0;
    let pop = packed.population();
    (total_ms, pop)
}

fn main() {
    let scales: &[(usize, u64)] = &[
        (128, 4000), // fits in L1
        (512, 1000),
        (1024, 500), // self-test benchmark size
        (2048, 200),
        (4096, 50),
        (8192, 10),
    ];

    println!(
        "{:<12} {:>10} {:>8} {:>12} {:>10} {:>12}",
        "Grid", "Elements", "Iters", "Total(ms)", "Avg(ms)", "ns/cell"
    );
    println!("{}", "-".repeat(70));

    for &(size, iters) in scales {
        let (total_ms, _pop) = bench_packed(size, 0.3, iters);
        let avg_ms = total_ms / iters as f64;
        let elements = size / LANES * size;
        let ns_per_cell = avg_ms * 1_000_000.0 / (size * size) as f64;
        println!(
            "{:<12} {:>10} {:>8} {:>12.1} {:>10.4} {:>12.4}",
            format!("{}x{}", size, size),
            elements,
            iters,
            total_ms,
            avg_ms,
            ns_per_cell
        );
    }
}
