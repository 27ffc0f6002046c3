//! Criterion benchmarks for the IPv4 address validator.
//!
//! The validator runs on every keystroke in the address field, so it must
//! stay well under a microsecond even for pathological input.
//!
//! Run with:
//! ```bash
//! cargo bench --package dpn-core --bench address_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dpn_core::is_valid_ipv4;

fn bench_is_valid_ipv4(c: &mut Criterion) {
    let long_zeros = format!("{}1.2.3.4", "0".repeat(256));
    let cases = [
        ("valid", "192.168.1.1"),
        ("out_of_range", "256.1.1.1"),
        ("too_many_groups", "1.2.3.4.5"),
        ("garbage", "not-an-address-at-all"),
        ("long_zero_prefix", long_zeros.as_str()),
    ];

    let mut group = c.benchmark_group("is_valid_ipv4");
    for (name, input) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), input, |b, input| {
            b.iter(|| is_valid_ipv4(black_box(input)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_is_valid_ipv4);
criterion_main!(benches);
