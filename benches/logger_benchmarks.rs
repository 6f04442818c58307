//! Criterion benchmarks for rust_logger_hierarchy

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_logger_hierarchy::appenders::NullSink;
use rust_logger_hierarchy::prelude::*;
use std::sync::Arc;

fn null_appender(name: &str) -> Arc<dyn Appender> {
    AppenderSkeleton::new(name, NullSink)
        .with_layout(TextLayout::new())
        .activated()
        .unwrap()
}

// ============================================================================
// Disabled Call Benchmarks
// ============================================================================

fn bench_disabled_calls(c: &mut Criterion) {
    let mut group = c.benchmark_group("disabled_calls");
    group.throughput(Throughput::Elements(1));

    let hierarchy = Hierarchy::new();
    hierarchy.root_logger().set_level(Some(Level::WARN));
    let deep = hierarchy.get_logger("com.example.service.handler.detail");

    group.bench_function("below_effective_level", |b| {
        b.iter(|| {
            deep.debug(black_box("Debug message"));
        });
    });

    group.bench_function("macro_below_level", |b| {
        b.iter(|| {
            rust_logger_hierarchy::debug!(deep, "Value: {}", black_box(42));
        });
    });

    hierarchy.set_threshold(Level::OFF);
    group.bench_function("repository_threshold_off", |b| {
        b.iter(|| {
            deep.error(black_box("Error message"));
        });
    });

    group.finish();
}

// ============================================================================
// Enabled Call Benchmarks
// ============================================================================

fn bench_enabled_calls(c: &mut Criterion) {
    let mut group = c.benchmark_group("enabled_calls");
    group.throughput(Throughput::Elements(1));

    let hierarchy = Hierarchy::new();
    hierarchy.root_logger().add_appender(null_appender("null"));
    let logger = hierarchy.get_logger("com.example.service");

    group.bench_function("info_null_appender", |b| {
        b.iter(|| {
            logger.info(black_box("Info message"));
        });
    });

    let (memory, _handle) = MemoryAppender::memory("memory", 1024);
    logger.add_appender(memory.activated().unwrap());
    group.bench_function("info_memory_and_null", |b| {
        b.iter(|| {
            logger.info(black_box("Info message"));
        });
    });

    group.bench_function("with_context_fields", |b| {
        b.iter(|| {
            logger
                .at(Level::INFO)
                .field("user_id", 42)
                .field("action", "login")
                .log(black_box("User action"));
        });
    });

    group.finish();
}

// ============================================================================
// Hierarchy Lookup Benchmarks
// ============================================================================

fn bench_hierarchy_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchy_lookup");

    for depth in [1usize, 4, 8] {
        let hierarchy = Hierarchy::new();
        let name: String = (0..depth)
            .map(|i| format!("seg{}", i))
            .collect::<Vec<_>>()
            .join(".");
        hierarchy.get_logger(&name);

        group.bench_with_input(BenchmarkId::new("existing", depth), &name, |b, name| {
            b.iter(|| black_box(hierarchy.get_logger(black_box(name))));
        });
    }

    let hierarchy = Hierarchy::new();
    for i in 0..1000 {
        hierarchy.get_logger(&format!("app.module{}.component", i));
    }
    group.bench_function("effective_level_deep", |b| {
        let logger = hierarchy.get_logger("app.module500.component");
        b.iter(|| black_box(logger.effective_level()));
    });

    group.finish();
}

// ============================================================================
// Async Dispatch Benchmarks
// ============================================================================

fn bench_async_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("async_dispatch");
    group.throughput(Throughput::Elements(1));

    for policy in [OverflowPolicy::Block, OverflowPolicy::DropIncoming] {
        let hierarchy = Hierarchy::new();
        let appender = AsyncAppender::builder("async")
            .buffer_size(10_000)
            .overflow(policy.clone())
            .build();
        appender.add_appender(null_appender("null"));
        let appender = appender.activated().unwrap();
        hierarchy.root_logger().add_appender(appender.clone());
        let logger = hierarchy.get_logger("bench");

        group.bench_function(BenchmarkId::new("info", policy.to_string()), |b| {
            b.iter(|| {
                logger.info(black_box("Async message"));
            });
        });

        hierarchy.shutdown();
    }

    group.finish();
}

fn bench_concurrent_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_logging");

    let hierarchy = Arc::new(Hierarchy::new());
    let appender = AsyncAppender::builder("async").buffer_size(10_000).build();
    appender.add_appender(null_appender("null"));
    let appender = appender.activated().unwrap();
    hierarchy.root_logger().add_appender(appender);

    group.bench_function("multi_thread_4", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let hierarchy = Arc::clone(&hierarchy);
                    std::thread::spawn(move || {
                        let logger = hierarchy.get_logger(&format!("worker{}", t));
                        for _ in 0..100 {
                            logger.info(black_box("Concurrent message"));
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
    hierarchy.shutdown();
}

// ============================================================================
// Layout Benchmarks
// ============================================================================

fn bench_layouts(c: &mut Criterion) {
    let mut group = c.benchmark_group("layouts");

    let fields = LogContext::new()
        .with_field("request_id", "abc-123")
        .with_field("latency_ms", 42);
    let event = LoggingEvent::new("com.example.http", Level::INFO, "Request served")
        .with_fields(fields);

    let text = TextLayout::new().with_mdc(true);
    group.bench_function("text", |b| {
        b.iter(|| black_box(text.format(black_box(&event))));
    });

    let json = JsonLayout::new();
    group.bench_function("json", |b| {
        b.iter(|| black_box(json.format(black_box(&event))));
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_disabled_calls,
    bench_enabled_calls,
    bench_hierarchy_lookup,
    bench_async_dispatch,
    bench_concurrent_logging,
    bench_layouts
);

criterion_main!(benches);
