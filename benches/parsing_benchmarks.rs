use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gcode5d::{ArcConfig, ArcResolution, Parser, ParserConfig, tokenize};
use std::fs;
use std::hint::black_box;

/// Generate G-code content of different patterns for benchmarking
fn generate_gcode_content(lines: usize, pattern: &str) -> String {
    let mut content = String::from("G21\nG90\nM82\nG92 E0\n");

    match pattern {
        "movement_heavy" => {
            for i in 0..lines {
                content.push_str(&format!(
                    "G1 X{:.3} Y{:.3} Z{:.3} E{:.3} F1500\n",
                    (i as f32) * 0.1,
                    (i as f32) * 0.2,
                    (i as f32) * 0.05,
                    (i as f32) * 0.02
                ));
            }
        }
        "arc_heavy" => {
            for i in 0..lines {
                let dir = if i % 2 == 0 { 2 } else { 3 };
                let x = if i % 2 == 0 { 20.0 } else { 0.0 };
                content.push_str(&format!(
                    "G{} X{:.3} Y0 I{:.3} J0 E{:.3}\n",
                    dir,
                    x,
                    if i % 2 == 0 { 10.0 } else { -10.0 },
                    (i as f32) * 0.05
                ));
            }
        }
        "comment_heavy" => {
            for i in 0..lines {
                content.push_str(&format!(
                    "G1 X{:.1} Y{:.1} ; Move to position {}, layer {}, segment {}\n",
                    (i as f32) * 0.1,
                    (i as f32) * 0.1,
                    i,
                    i / 100,
                    i % 100
                ));
            }
        }
        "mixed" => {
            for i in 0..lines {
                match i % 4 {
                    0 => content.push_str(&format!(
                        "G1 X{:.3} Y{:.3} F1500\n",
                        (i as f32) * 0.1,
                        (i as f32) * 0.2
                    )),
                    1 => content.push_str(&format!("; Layer {}\n", i / 4)),
                    2 => content.push_str(&format!("M104 S{}\n", 200 + (i % 50))),
                    3 => content.push_str(&format!("G0 Z{:.2}\n", (i as f32) * 0.1)),
                    _ => unreachable!(),
                }
            }
        }
        _ => {
            for i in 0..lines {
                content.push_str(&format!("G1 X{} Y{}\n", i, i));
            }
        }
    }

    content
}

/// Benchmark tokenizing single lines with different patterns
fn bench_single_line_tokenizing(c: &mut Criterion) {
    let test_lines = vec![
        ("simple_move", "G1 X10 Y20"),
        ("complex_move", "G1 X123.456 Y789.012 Z0.3 E2.85714 F1500"),
        ("arc", "G2 X50 Y50 I11.93 J0 E4.6"),
        ("with_comment", "G1 X10 Y20 ; Move to next position"),
        (
            "comment_only",
            "; This is a comment line with some detailed information",
        ),
        ("temperature", "M104 S210 T0"),
        ("home_command", "G28 X Y Z"),
        ("line_number_checksum", "N123 G1 X10 Y20*57"),
    ];

    let mut group = c.benchmark_group("single_line_tokenizing");

    for (name, line) in test_lines {
        group.bench_with_input(BenchmarkId::new("tokenize", name), &line, |b, line| {
            b.iter(|| black_box(tokenize(black_box(line))))
        });
    }

    group.finish();
}

/// Benchmark parsing documents of different sizes
fn bench_document_parsing(c: &mut Criterion) {
    let file_sizes = vec![100, 1_000, 10_000, 100_000];
    let patterns = vec!["movement_heavy", "arc_heavy", "comment_heavy", "mixed"];
    let parser = Parser::default();

    let mut group = c.benchmark_group("document_parsing");

    for &size in &file_sizes {
        for pattern in &patterns {
            let content = generate_gcode_content(size, pattern);
            let lines: Vec<&str> = content.lines().collect();

            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("{}_{}", pattern, size), size),
                &lines,
                |b, lines| b.iter(|| black_box(parser.parse(lines.iter()))),
            );
        }
    }

    group.finish();
}

/// Benchmark arc expansion at different resolutions
fn bench_arc_resolution(c: &mut Criterion) {
    let content = generate_gcode_content(1_000, "arc_heavy");
    let lines: Vec<&str> = content.lines().collect();

    let mut group = c.benchmark_group("arc_resolution");

    for segment_length in [0.1, 0.5, 1.0, 5.0] {
        let parser = Parser::new(ParserConfig {
            arcs: ArcConfig {
                resolution: ArcResolution::SegmentLength(segment_length),
                max_segments: 4_096,
            },
            ..ParserConfig::default()
        });
        group.bench_with_input(
            BenchmarkId::new("segment_length", segment_length),
            &lines,
            |b, lines| b.iter(|| black_box(parser.parse(lines.iter()))),
        );
    }

    group.finish();
}

/// Benchmark splitting and merging a parsed document
fn bench_split_merge(c: &mut Criterion) {
    let content = generate_gcode_content(10_000, "movement_heavy");
    let document = Parser::default()
        .parse_str(&content)
        .expect("generated content parses");

    let mut group = c.benchmark_group("split_merge");
    for index in [1, document.len() / 2, document.len() - 1] {
        group.bench_with_input(BenchmarkId::new("split_at", index), &index, |b, &index| {
            b.iter(|| black_box(document.split_at(index)))
        });
    }

    let (head, tail) = document.split_at(document.len() / 2).expect("split");
    group.bench_function("merge_halves", |b| b.iter(|| black_box(head.merge(&tail))));
    group.finish();
}

/// Benchmark parsing the fixture files
fn bench_real_files(c: &mut Criterion) {
    let fixture_files = vec!["tests/fixtures/small_part.gcode"];
    let parser = Parser::default();

    let mut group = c.benchmark_group("real_files");

    for file_path in fixture_files {
        if let Ok(content) = fs::read_to_string(file_path) {
            let file_name = file_path.split('/').next_back().unwrap_or("unknown");
            group.throughput(Throughput::Bytes(content.len() as u64));
            group.bench_with_input(
                BenchmarkId::new("real_file", file_name),
                &content,
                |b, content| b.iter(|| black_box(parser.parse_str(content))),
            );
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_line_tokenizing,
    bench_document_parsing,
    bench_arc_resolution,
    bench_split_merge,
    bench_real_files
);
criterion_main!(benches);
