//! Contract-based lazy singletons.
//!
//! Demonstrates:
//! - Registering trait implementations as `Arc<dyn Trait>` constructors
//! - Business code resolving contracts, not concrete types
//! - Swapping an implementation by re-registering it
//!
//! Run with: `cargo run --example lazy_contracts`

use lazy_singleton_registry::define_registry;
use std::sync::Arc;

define_registry!(services);

trait Logger: Send + Sync {
    fn log(&self, message: &str);
    fn name(&self) -> &str;
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        println!("[CONSOLE] {}", message);
    }

    fn name(&self) -> &str {
        "ConsoleLogger"
    }
}

struct FileLogger {
    path: String,
}

impl Logger for FileLogger {
    fn log(&self, message: &str) {
        println!("[FILE:{}] {}", self.path, message);
    }

    fn name(&self) -> &str {
        "FileLogger"
    }
}

/// Depends only on the `Logger` contract.
fn export_table(rows: usize) {
    let logger: Arc<dyn Logger> = services::registry().resolve_cloned().unwrap();
    logger.log(&format!("Exporting {} rows", rows));
}

fn main() {
    println!("=== lazy-singleton-registry: Contracts ===\n");

    println!("1. Registering ConsoleLogger (not built yet)...");
    services::register(|| {
        println!("   (building ConsoleLogger)");
        Arc::new(ConsoleLogger) as Arc<dyn Logger>
    });

    println!("\n2. Exporting twice; the logger is built once...\n");
    export_table(10);
    export_table(20);

    println!("\n3. Swapping to FileLogger...");
    services::register(|| {
        println!("   (building FileLogger)");
        Arc::new(FileLogger {
            path: "/var/log/tables.log".to_string(),
        }) as Arc<dyn Logger>
    });

    println!();
    export_table(30);

    let logger: Arc<dyn Logger> = services::registry().resolve_cloned().unwrap();
    println!("\n   Current Logger: {}", logger.name());

    println!("\n=== Example Complete ===");
}
