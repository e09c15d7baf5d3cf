use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use gcode_interp::interpret_line;
use gcode_interp::machine::SimMachine;

/// Generate a program of alternating setup and motion blocks
fn generate_program(lines: usize) -> Vec<String> {
    let mut program = Vec::with_capacity(lines);
    for i in 0..lines {
        match i % 4 {
            0 => program.push(format!(
                "G1 X{:.3} Y{:.3} F1500",
                (i % 4000) as f64 * 0.1,
                (i % 2000) as f64 * 0.2
            )),
            1 => program.push(format!("(layer {})", i / 4)),
            2 => program.push(format!("S{} M3", 4000 + (i % 50))),
            3 => program.push(format!("G0 Z{:.2}", (i as f64) * 0.001)),
            _ => unreachable!(),
        }
    }
    program
}

/// Benchmark the full pipeline on single blocks of different shapes
fn bench_single_blocks(c: &mut Criterion) {
    let test_lines = vec![
        ("simple_move", "G1 X10 Y20 F500"),
        ("modal_continue", "X10.5"),
        ("arc", "G2 X10 Y0 I5 J0"),
        ("settings_heavy", "G17 G21 G90 G94 F1200 S8000 M3"),
        ("comment_only", "(MSG starting roughing pass)"),
        ("offsets", "G92 X0 Y0 Z0"),
    ];

    let mut group = c.benchmark_group("single_blocks");

    for (name, line) in test_lines {
        group.bench_with_input(BenchmarkId::new("interpret", name), &line, |b, line| {
            let mut machine = SimMachine::default();
            b.iter(|| black_box(interpret_line(black_box(line), &mut machine)))
        });
    }

    group.finish();
}

/// Benchmark sustained program throughput
fn bench_program_throughput(c: &mut Criterion) {
    let sizes = vec![100, 1_000, 10_000];

    let mut group = c.benchmark_group("program_throughput");

    for &size in &sizes {
        let program = generate_program(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("run", size), &program, |b, program| {
            b.iter(|| {
                let mut machine = SimMachine::default();
                for line in program {
                    let _ = black_box(interpret_line(black_box(line), &mut machine));
                }
                black_box(machine.state().line_count)
            })
        });
    }

    group.finish();
}

/// Benchmark normalization alone, the hot path every block goes through
fn bench_normalization(c: &mut Criterion) {
    use gcode_interp::interp::normalize::normalize_block;

    let test_lines = vec![
        ("plain", "G1 X10 Y20 F500"),
        ("lowercase_spaced", "  g1   x10.123   y-20.456   f1500  "),
        ("commented", "G1 X10 (move to the corner of the pocket)"),
    ];

    let mut group = c.benchmark_group("normalization");

    for (name, line) in test_lines {
        group.bench_with_input(BenchmarkId::new("normalize", name), &line, |b, line| {
            let mut machine = SimMachine::default();
            b.iter(|| {
                let mut block = line.to_string();
                normalize_block(&mut block, &mut machine);
                black_box(block)
            })
        });
    }

    group.finish();
}

criterion_group!(
    interpreter_benches,
    bench_single_blocks,
    bench_program_throughput,
    bench_normalization
);

criterion_main!(interpreter_benches);
