//! Aggregation throughput benchmarks.
//!
//! Run with: `cargo bench --package candela-bench`

use candela_bench::{MarketConfig, synthetic_ticks};
use candela_lib::prelude::*;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn aggregator_benchmark(c: &mut Criterion) {
    let config = MarketConfig::default();
    let ticks = synthetic_ticks(&config);

    let mut group = c.benchmark_group("aggregator");
    group.throughput(Throughput::Elements(ticks.len() as u64));

    for resolution in [Resolution::Minute1, Resolution::Minute10] {
        group.bench_with_input(
            BenchmarkId::from_parameter(resolution),
            &ticks,
            |b, ticks| {
                b.iter(|| {
                    let mut aggregator = CandleAggregator::new(resolution);
                    let mut closed = 0usize;
                    for tick in ticks {
                        if let Ok(step) = aggregator.process(tick.clone()) {
                            closed += usize::from(step.closed.is_some());
                        }
                    }
                    closed += aggregator.drain().len();
                    black_box(closed)
                });
            },
        );
    }

    group.finish();
}

fn csv_sink_benchmark(c: &mut Criterion) {
    let config = MarketConfig {
        ticks: 20_000,
        ..Default::default()
    };
    let mut aggregator = CandleAggregator::new(Resolution::Minute1);
    let mut candles: Vec<Candle> = synthetic_ticks(&config)
        .into_iter()
        .filter_map(|tick| aggregator.process(tick).ok()?.closed)
        .collect();
    candles.extend(aggregator.drain());

    let mut group = c.benchmark_group("sink");
    group.throughput(Throughput::Elements(candles.len() as u64));
    group.bench_function("csv", |b| {
        b.iter(|| {
            let mut sink = CsvSink::new(std::io::sink());
            for candle in &candles {
                black_box(sink.write(candle)).ok();
            }
        });
    });
    group.finish();
}

fn pipeline_benchmark(c: &mut Criterion) {
    let config = MarketConfig {
        ticks: 20_000,
        ..Default::default()
    };
    let ticks = synthetic_ticks(&config);
    let Ok(runtime) = tokio::runtime::Runtime::new() else {
        eprintln!("Failed to create tokio runtime, skipping pipeline benchmark");
        return;
    };

    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(ticks.len() as u64));
    group.sample_size(20);

    for capacity in [1usize, 64] {
        group.bench_with_input(
            BenchmarkId::new("1m,2m,10m", capacity),
            &ticks,
            |b, ticks| {
                b.to_async(&runtime).iter(|| async move {
                    let resolutions = ResolutionSet::default();
                    let mut pipeline = Pipeline::with_config(PipelineConfig {
                        resolutions: resolutions.clone(),
                        channel_capacity: capacity,
                    });
                    for resolution in &resolutions {
                        pipeline = match pipeline.with_sink(resolution, MemorySink::new()) {
                            Ok(pipeline) => pipeline,
                            Err(e) => panic!("invalid pipeline: {e}"),
                        };
                    }

                    let (tx, rx) = pipeline.source_channel();
                    let Ok(running) = pipeline.start(rx) else {
                        return 0;
                    };
                    for tick in ticks {
                        if tx.send(tick.clone()).await.is_err() {
                            break;
                        }
                    }
                    drop(tx);
                    running.join().await.map_or(0, |s| s.total_candles())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    aggregator_benchmark,
    csv_sink_benchmark,
    pipeline_benchmark
);
criterion_main!(benches);
