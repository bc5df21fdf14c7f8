//! 积分商城核心路径性能基准测试
//!
//! 针对 CSV 容错解析与积分定价的细粒度性能测试。

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use points_mall::csv::{parse, strip_header};
use points_mall::service::settlement_service::compute_points_per_item;
use rust_decimal::Decimal;
use std::hint::black_box;

/// 生成纯文本 CSV（邮箱,积分,原因）
fn create_plain_csv(rows: usize) -> Vec<u8> {
    let mut buf = String::from("email,delta_points,reason\n");
    for i in 0..rows {
        buf.push_str(&format!(
            "user{}@example.com,{},签到奖励\n",
            i,
            (i % 500) + 1
        ));
    }
    buf.into_bytes()
}

/// 生成带引号字段的 CSV（内嵌逗号与转义引号）
fn create_quoted_csv(rows: usize) -> Vec<u8> {
    let mut buf = String::from("email,delta_points,reason\n");
    for i in 0..rows {
        buf.push_str(&format!(
            "user{}@example.com,{},\"活动奖励, \"\"周年庆\"\" 专场\"\n",
            i,
            (i % 500) + 1
        ));
    }
    buf.into_bytes()
}

/// CSV 容错解析基准
fn bench_csv_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv_parse");

    let plain = create_plain_csv(100);
    group.bench_function("plain_100_rows", |b| b.iter(|| parse(black_box(&plain))));

    let quoted = create_quoted_csv(100);
    group.bench_function("quoted_100_rows", |b| b.iter(|| parse(black_box(&quoted))));

    group.bench_function("parse_and_strip_header", |b| {
        b.iter(|| strip_header(parse(black_box(&plain))))
    });

    group.finish();
}

/// 不同行数下的解析吞吐
fn bench_csv_parse_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv_parse_scaling");

    for size in [100, 1_000, 5_000].iter() {
        let data = create_plain_csv(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| parse(black_box(&data)))
        });
    }

    group.finish();
}

/// 积分定价基准
fn bench_points_pricing(c: &mut Criterion) {
    let mut group = c.benchmark_group("points_pricing");

    let rate = Decimal::from(100);
    let base = Decimal::new(5999, 2);
    let adjustment = Decimal::new(-250, 2);

    group.bench_function("base_only", |b| {
        b.iter(|| {
            compute_points_per_item(black_box(base), black_box(Decimal::ZERO), black_box(rate))
        })
    });

    group.bench_function("with_adjustment", |b| {
        b.iter(|| {
            compute_points_per_item(black_box(base), black_box(adjustment), black_box(rate))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_csv_parse,
    bench_csv_parse_scaling,
    bench_points_pricing,
);

criterion_main!(benches);
