use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use warehouse_utils::filename::{camel_to_snake_case, clean_filename, create_unique_filename, filename_to_folder_name};
use warehouse_utils::files::repeated_names;

const FILENAMES: &[&str] = &[
    "StreamingHistory12.json",
    "CacheRealmReport_hourly_2023-01-01.csv",
    "account_activity_v1_000123.json",
    "Très Épicé Café 😀.json",
    "_chat.txt",
    "ViewingActivity.csv",
    "message_1.json",
    "filters_0000.json",
];

const PATHS: &[&str] = &[
    "github/repo_a/filters_0000.json",
    "github/repo_b/filters_0000.json",
    "facebook/messages/inbox/alice_1/message_1.json",
    "facebook/messages/inbox/bob_2/message_1.json",
    "spotify/StreamingHistory0.json",
    "netflix/ViewingActivity.csv",
];

fn bench_folder_name(c: &mut Criterion) {
    let mut group = c.benchmark_group("folder_name");

    group.bench_function("camel_to_snake_case", |b| {
        b.iter(|| {
            for name in FILENAMES {
                black_box(camel_to_snake_case(black_box(name)));
            }
        });
    });

    group.bench_function("clean_filename", |b| {
        b.iter(|| {
            for name in FILENAMES {
                black_box(clean_filename(black_box(name)));
            }
        });
    });

    group.bench_function("filename_to_folder_name", |b| {
        b.iter(|| {
            for name in FILENAMES {
                let _ = black_box(filename_to_folder_name(black_box(name)));
            }
        });
    });

    group.finish();
}

fn bench_unique(c: &mut Criterion) {
    let mut group = c.benchmark_group("unique");

    group.bench_function("repeated_names", |b| {
        b.iter(|| black_box(repeated_names(black_box(PATHS))));
    });

    group.bench_function("create_unique_filename", |b| {
        b.iter(|| {
            for path in PATHS {
                let _ = black_box(create_unique_filename(black_box(path)));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_folder_name, bench_unique);
criterion_main!(benches);
