use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dashboard_template::inspect::TemplateReader;
use dashboard_template::{TemplateBuilder, TemplateConfig, XlsxWriter};
use std::io::Cursor;
use tempfile::tempdir;

fn benchmark_build(c: &mut Criterion) {
    c.bench_function("build_workbook", |b| {
        b.iter(|| {
            let workbook = TemplateBuilder::new(TemplateConfig::default())
                .unwrap()
                .build()
                .unwrap();
            black_box(workbook);
        });
    });
}

fn benchmark_serialise(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialise");
    let workbook = TemplateBuilder::new(TemplateConfig::default())
        .unwrap()
        .build()
        .unwrap();

    for level in [0u32, 6, 9].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(level), level, |b, &level| {
            b.iter(|| {
                let bytes = XlsxWriter::new()
                    .with_compression(level)
                    .write(&workbook, Cursor::new(Vec::new()))
                    .unwrap();
                black_box(bytes);
            });
        });
    }

    group.finish();
}

fn benchmark_save_and_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("file");
    group.sample_size(20);
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench.xlsx");

    group.bench_function("save", |b| {
        b.iter(|| {
            TemplateBuilder::new(TemplateConfig::default())
                .unwrap()
                .save(&path)
                .unwrap();
        });
    });

    group.bench_function("read_back", |b| {
        b.iter(|| {
            let reader = TemplateReader::open(&path).unwrap();
            black_box(reader.sheet_names());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_build,
    benchmark_serialise,
    benchmark_save_and_check
);
criterion_main!(benches);
