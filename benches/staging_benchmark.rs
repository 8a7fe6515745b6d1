//! Staging benchmarks

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dataset_uploadr::upload::{validate, FileCandidate, Session, UploadPolicy};

fn candidates(count: usize) -> Vec<FileCandidate> {
    (0..count)
        .map(|i| {
            let mime_type = if i % 4 == 0 { "image/gif" } else { "image/jpeg" };
            FileCandidate::new(format!("{}.jpg", i), mime_type, Bytes::from(vec![0u8; 1024]))
        })
        .collect()
}

fn benchmark_validate(c: &mut Criterion) {
    let policy = UploadPolicy::default();
    let file = FileCandidate::new("chest.jpeg", "image/jpeg", Bytes::from(vec![0u8; 4096]));

    c.bench_function("validate", |b| {
        b.iter(|| black_box(validate(black_box(&file), &policy)));
    });
}

fn benchmark_stage(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage");

    for count in [1usize, 10, 100].iter() {
        let policy = UploadPolicy {
            max_file_count: *count,
            ..UploadPolicy::default()
        };
        let batch = candidates(*count);

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let (session, outcome) = Session::new().stage(batch.clone(), &policy);
                black_box((session.len(), outcome.staged_count()))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_validate, benchmark_stage);
criterion_main!(benches);
