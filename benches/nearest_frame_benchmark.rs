//! Nearest-frame lookup benchmarks.
//!
//! A 300 000-frame timeline is roughly two and a half hours of NTSC capture, the
//! upper end of what a single tape report describes.
//!
//! # Benchmarks
//!
//! - `nearest_frame_in_range`: queries between recorded frames
//! - `nearest_frame_clamped`: queries outside the recorded range
//! - `parse_report`: streaming parse of a synthetic report
//!
//! # Running
//!
//! ```bash
//! cargo bench --bench nearest_frame_benchmark
//! ```

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use dvtimeline_core::{DvRescueXmlParser, FrameRecord, ReportParser, TimelineIndex};

const FRAMES: u64 = 300_000;

/// Frames with gaps where the capture dropped or skipped material.
fn build_index() -> TimelineIndex {
    let records = (0..FRAMES)
        .filter(|n| n % 97 != 0)
        .map(|n| FrameRecord::new(n, n as i64, (n % 7) as f32, (n % 5) as f32))
        .collect();
    TimelineIndex::build(records).unwrap()
}

fn synthetic_report(frames: u64) -> String {
    let mut xml = String::from("<dvrescue><media ref=\"bench.dv\"><frames>");
    for n in 0..frames {
        if n % 10 == 0 {
            xml.push_str(&format!(
                "<frame n=\"{n}\"><sta t=\"10\" n=\"{}\" n_even=\"1\"/></frame>",
                n % 4 + 1
            ));
        } else {
            xml.push_str(&format!("<frame n=\"{n}\"/>"));
        }
    }
    xml.push_str("</frames></media></dvrescue>");
    xml
}

fn bench_nearest_in_range(c: &mut Criterion) {
    let index = build_index();
    let mut query: i64 = 0;

    c.bench_function("nearest_frame_in_range", |b| {
        b.iter(|| {
            query = (query + 7_919) % FRAMES as i64;
            black_box(index.nearest_frame(black_box(query)).frame_number)
        });
    });
}

fn bench_nearest_clamped(c: &mut Criterion) {
    let index = build_index();

    c.bench_function("nearest_frame_clamped", |b| {
        b.iter(|| {
            black_box(index.nearest_frame(black_box(-1)));
            black_box(index.nearest_frame(black_box(i64::MAX)).frame_number)
        });
    });
}

fn bench_parse(c: &mut Criterion) {
    let report = synthetic_report(20_000);
    let parser = DvRescueXmlParser::default();

    c.bench_function("parse_report", |b| {
        b.iter(|| {
            let records = parser.parse(&mut report.as_bytes()).unwrap();
            black_box(records.len())
        });
    });
}

criterion_group!(
    benches,
    bench_nearest_in_range,
    bench_nearest_clamped,
    bench_parse
);
criterion_main!(benches);
