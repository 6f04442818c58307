//! Basic hierarchy usage example
//!
//! Demonstrates named loggers, level inheritance, additivity and context
//! stacks with a console appender.
//!
//! Run with: cargo run --example basic_usage

use rust_logger_hierarchy::prelude::*;
use rust_logger_hierarchy::{info, warn};

fn main() -> Result<()> {
    println!("=== Rust Logger Hierarchy - Basic Usage Example ===\n");

    let hierarchy = Hierarchy::new();
    let console = ConsoleAppender::stdout("console")
        .with_layout(TextLayout::new().with_mdc(true))
        .activated()?;
    hierarchy.root_logger().add_appender(console);

    // Loggers inherit the root level (DEBUG) until they set their own
    println!("1. Level inheritance:");
    let db = hierarchy.get_logger("com.example.db");
    let pool = hierarchy.get_logger("com.example.db.pool");
    pool.debug("Pool created (inherits DEBUG from root)");

    db.set_level(Some(Level::WARN));
    pool.debug("Pool resized (hidden, com.example.db is at WARN)");
    pool.warn("Pool exhausted (visible)");

    println!("\n2. Additivity:");
    let audit = hierarchy.get_logger("com.example.audit");
    let (memory, audit_trail) = MemoryAppender::memory("audit-trail", 100);
    audit.add_appender(memory.activated()?);
    audit.set_additivity(false);
    audit.info("Only recorded in the audit trail, not on the console");
    println!("   Audit trail holds {} event(s)", audit_trail.len());

    println!("\n3. Diagnostic contexts:");
    let web = hierarchy.get_logger("com.example.web");
    {
        let _request = Mdc::scoped("request_id", "req-42");
        let _stage = Ndc::scoped("checkout");
        info!(web, "Processing order {}", 1001);
        warn!(web, "Payment took {} ms", 850);
    }
    web.info("Outside the request scope");

    println!("\n4. Repository threshold:");
    hierarchy.set_threshold(Level::ERROR);
    web.warn("Hidden by the repository threshold");
    web.error("Still visible");

    hierarchy.shutdown();
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
