use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gcode5d::{Document, Parser, ParserConfig, parse_files};
use std::hint::black_box;
use std::io::Cursor;

fn generate_gcode_content(size_mb: usize) -> String {
    let target_bytes = size_mb * 1024 * 1024;
    let mut content = String::with_capacity(target_bytes + 1000);

    // Generate realistic G-code patterns
    let patterns = [
        "G28 ; home all axes\n",
        "M104 S210 ; set hotend temperature\n",
        "M190 S60 ; wait for bed temperature\n",
        "G92 E0\n",
        "G1 X10.0 Y10.0 Z0.3 F1500 ; move to position\n",
        "G1 X20.0 Y20.0 E0.1 F3000 ; extrude\n",
        "G1 X30.0 Y30.0 E0.2 ; continue extrusion\n",
        "G2 X40.0 Y20.0 I5.0 J-5.0 E0.4\n",
        "; layer change\n",
        "G0 Z0.6 ; lift Z\n",
        "(temperature check)\n",
        "M105 ; report temperatures\n",
        "M117 Layer done\n",
    ];

    let mut pattern_index = 0;
    while content.len() < target_bytes {
        content.push_str(patterns[pattern_index % patterns.len()]);
        pattern_index += 1;
    }

    content
}

fn bench_parse_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_reader");
    group.sample_size(10);

    for size_mb in [1, 5, 10].iter() {
        let content = generate_gcode_content(*size_mb);
        let parser = Parser::default();
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("size_mb", size_mb),
            &content,
            |b, content| {
                b.iter(|| {
                    let document = parser
                        .parse_reader(Cursor::new(content.as_bytes()))
                        .map(|document| document.len());
                    black_box(document)
                })
            },
        );
    }
    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let content = generate_gcode_content(5);
    let document: Document = Parser::default()
        .parse_str(&content)
        .expect("generated content parses");

    let mut group = c.benchmark_group("serialize");
    group.sample_size(10);
    group.throughput(Throughput::Elements(document.len() as u64));
    group.bench_function("document_5mb", |b| {
        b.iter(|| black_box(document.serialize().len()))
    });
    group.bench_function("layers_5mb", |b| {
        b.iter(|| black_box(document.layers().len()))
    });
    group.finish();
}

fn bench_parallel_files(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let paths: Vec<_> = (0..8)
        .map(|i| {
            let path = dir.path().join(format!("part_{i}.gcode"));
            std::fs::write(&path, generate_gcode_content(1)).expect("write fixture");
            path
        })
        .collect();

    let mut group = c.benchmark_group("parse_files");
    group.sample_size(10);
    group.bench_function("eight_1mb_files", |b| {
        b.iter(|| {
            let results = parse_files(&paths, &ParserConfig::default());
            black_box(results.iter().filter(|r| r.is_ok()).count())
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_parse_reader,
    bench_serialize,
    bench_parallel_files
);
criterion_main!(benches);
