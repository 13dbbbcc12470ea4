use criterion::{black_box, criterion_group, criterion_main, Criterion};

use studypath_core::model::LectureSegment;
use studypath_core::pathway::Pathway;

fn segments(len: u32) -> Vec<LectureSegment> {
    (1..=len)
        .map(|i| LectureSegment {
            id: None,
            lecture_id: Some(1),
            sequence_number: i,
            title: format!("Segment {i}"),
            description: String::new(),
        })
        .collect()
}

fn bench_from_segments(c: &mut Criterion) {
    let mut group = c.benchmark_group("from_segments");

    for len in [10u32, 100, 1000] {
        let rows = segments(len);
        group.bench_function(format!("segments_{len}"), |b| {
            b.iter(|| Pathway::from_segments(black_box(&rows)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_from_segments);
criterion_main!(benches);
