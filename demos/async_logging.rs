//! Async logging example
//!
//! Demonstrates an async appender in front of console and file outputs,
//! configured from JSON, with several producer threads.
//!
//! Run with: cargo run --example async_logging

use rust_logger_hierarchy::prelude::*;
use std::sync::Arc;
use std::thread;

const CONFIG: &str = r#"{
    "threshold": "debug",
    "root": { "level": "info", "appenders": ["async"] },
    "loggers": {
        "worker": { "level": "debug" }
    },
    "appenders": {
        "async": {
            "kind": "async",
            "buffer_size": 1000,
            "overflow": "block_then_sync",
            "overflow_timeout_ms": 50,
            "appenders": ["console", "file"]
        },
        "console": { "kind": "console", "threshold": "info" },
        "file": {
            "kind": "file",
            "path": "async_test.log",
            "append": false,
            "layout": { "kind": "json" }
        }
    }
}"#;

fn main() -> Result<()> {
    println!("=== Rust Logger Hierarchy - Async Logging Example ===\n");

    let hierarchy = Arc::new(Hierarchy::new());
    let report = Configurator::new(&hierarchy).configure_json(CONFIG);
    for error in report.errors() {
        eprintln!("configuration problem: {}", error);
    }

    println!("1. High-performance async logging:");
    let app = hierarchy.get_logger("app");
    for i in 0..100 {
        app.info(format!("Message #{}", i));
    }
    println!("   Logged 100 messages asynchronously");

    println!("\n2. Multi-threaded logging:");
    let handles: Vec<_> = (0..5)
        .map(|thread_id| {
            let hierarchy = Arc::clone(&hierarchy);
            thread::spawn(move || {
                let logger = hierarchy.get_logger(&format!("worker.{}", thread_id));
                for i in 0..20 {
                    logger.debug(format!("Thread {} - Message {}", thread_id, i));
                }
            })
        })
        .collect();
    for handle in handles {
        let _ = handle.join();
    }
    println!("   5 threads logged 20 messages each");

    if let Some(appender) = hierarchy.root_logger().get_appender("async") {
        appender.flush()?;
    }

    // Drains whatever is still queued, then closes the outputs
    hierarchy.shutdown();

    println!("\n=== Example completed successfully! ===");
    println!("Check 'async_test.log' for file output");

    Ok(())
}
