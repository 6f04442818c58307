//! Configuration tests
//!
//! Apply JSON configurations to a fresh hierarchy and check the resulting
//! levels, appender wiring and output.

use rust_logger_hierarchy::prelude::*;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn snapshot(hierarchy: &Hierarchy) -> Vec<(String, Option<String>, bool, Vec<String>)> {
    let mut loggers: Vec<_> = hierarchy
        .current_loggers()
        .iter()
        .map(|logger| {
            (
                logger.name().to_string(),
                logger.level().map(|l| l.name().to_string()),
                logger.additivity(),
                logger
                    .all_appenders()
                    .iter()
                    .map(|a| a.name().to_string())
                    .collect(),
            )
        })
        .collect();
    loggers.sort();
    let root = hierarchy.root_logger();
    loggers.push((
        root.name().to_string(),
        root.level().map(|l| l.name().to_string()),
        root.additivity(),
        root.all_appenders()
            .iter()
            .map(|a| a.name().to_string())
            .collect(),
    ));
    loggers
}

fn file_config(dir: &TempDir) -> String {
    let path = dir.path().join("app.log");
    format!(
        r#"{{
            "reset": true,
            "threshold": "debug",
            "root": {{ "level": "info", "appenders": ["file"] }},
            "loggers": {{
                "com.example.db": {{ "level": "warn" }},
                "com.example.audit": {{ "level": "debug", "additivity": false, "appenders": ["file"] }}
            }},
            "appenders": {{
                "file": {{
                    "kind": "file",
                    "path": {path},
                    "layout": {{ "kind": "simple" }}
                }}
            }}
        }}"#,
        path = serde_json::to_string(&path).unwrap()
    )
}

#[test]
fn test_file_configuration_end_to_end() {
    let dir = TempDir::new().unwrap();
    let hierarchy = Hierarchy::new();

    let report = Configurator::new(&hierarchy).configure_json(&file_config(&dir));
    assert!(report.is_ok(), "{:?}", report);

    hierarchy.get_logger("com.example.db.pool").info("pool is below warn");
    hierarchy.get_logger("com.example.db.pool").warn("pool exhausted");
    hierarchy.get_logger("com.example.audit.login").debug("login audited");
    hierarchy.get_logger("com.example.web").info("request served");
    hierarchy.shutdown();

    let contents = fs::read_to_string(dir.path().join("app.log")).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            "WARN - pool exhausted",
            "DEBUG - login audited",
            "INFO - request served",
        ]
    );
}

#[test]
fn test_reset_then_reapply_gives_the_same_wiring() {
    let dir = TempDir::new().unwrap();
    let hierarchy = Hierarchy::new();
    let config = file_config(&dir);

    assert!(Configurator::new(&hierarchy).configure_json(&config).is_ok());
    hierarchy.get_logger("com.example.web").info("first pass");
    let first = snapshot(&hierarchy);

    // The config itself asks for a reset, which closes the first file appender
    assert!(Configurator::new(&hierarchy).configure_json(&config).is_ok());
    let second = snapshot(&hierarchy);
    hierarchy.get_logger("com.example.web").info("second pass");
    hierarchy.shutdown();

    assert_eq!(first, second);
    let contents = fs::read_to_string(dir.path().join("app.log")).unwrap();
    assert_eq!(contents, "INFO - first pass\nINFO - second pass\n");
}

#[test]
fn test_registered_memory_appender_receives_configured_traffic() {
    let hierarchy = Hierarchy::new();
    let handle = MemoryHandle::new(100);
    let appender = AppenderSkeleton::new("audit", MemorySink::with_handle(handle.clone()));

    let mut configurator = Configurator::new(&hierarchy);
    configurator.register_appender(Arc::new(appender));
    let report = configurator.configure_json(
        r#"{
            "loggers": {
                "audit": { "level": "info", "additivity": false, "appenders": ["audit"] }
            }
        }"#,
    );
    assert!(report.is_ok(), "{:?}", report);

    let logger = hierarchy.get_logger("audit.payments");
    logger.debug("not enabled");
    logger.info("charged");
    assert_eq!(handle.messages(), vec!["charged"]);
}

#[test]
fn test_async_configuration_wraps_children() {
    let hierarchy = Hierarchy::new();
    let handle = MemoryHandle::new(100);
    let mut configurator = Configurator::new(&hierarchy);
    configurator.register_appender(Arc::new(AppenderSkeleton::new(
        "sink",
        MemorySink::with_handle(handle.clone()),
    )));

    let report = configurator.configure_json(
        r#"{
            "root": { "level": "debug", "appenders": ["async"] },
            "appenders": {
                "async": {
                    "kind": "async",
                    "buffer_size": 4,
                    "overflow": "block",
                    "appenders": ["sink"]
                }
            }
        }"#,
    );
    assert!(report.is_ok(), "{:?}", report);

    let logger = hierarchy.get_logger("worker");
    for i in 0..20 {
        logger.debug(format!("job {}", i));
    }
    let async_appender = hierarchy.root_logger().get_appender("async").unwrap();
    async_appender.flush().unwrap();

    let expected: Vec<String> = (0..20).map(|i| format!("job {}", i)).collect();
    assert_eq!(handle.messages(), expected);

    hierarchy.shutdown();
    assert!(async_appender.core().is_closed());
}

#[test]
fn test_bad_async_policy_is_reported() {
    let hierarchy = Hierarchy::new();
    let report = Configurator::new(&hierarchy).configure_json(
        r#"{
            "root": { "appenders": ["async"] },
            "appenders": { "async": { "kind": "async", "overflow": "shrug" } }
        }"#,
    );
    assert_eq!(report.errors().len(), 1);
    assert!(hierarchy.root_logger().all_appenders().is_empty());
    assert_eq!(hierarchy.error_list().len(), 1);
}

#[test]
fn test_config_round_trips_through_json() {
    let config = HierarchyConfig::from_json(
        r#"{
            "threshold": "warn",
            "root": { "level": "error", "appenders": ["console"] },
            "appenders": {
                "console": { "kind": "console", "target": "stderr", "threshold": "warn" }
            }
        }"#,
    )
    .unwrap();

    let json = config.to_json().unwrap();
    let reparsed = HierarchyConfig::from_json(&json).unwrap();
    assert_eq!(reparsed.threshold.as_deref(), Some("warn"));
    assert_eq!(reparsed.appenders["console"].target.as_deref(), Some("stderr"));
    assert_eq!(
        reparsed.root.as_ref().unwrap().appenders,
        vec!["console".to_string()]
    );
}
