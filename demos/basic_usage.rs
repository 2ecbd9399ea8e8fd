//! Basic usage example for lazy-singleton-registry.
//!
//! Demonstrates:
//! - Registering constructors (nothing is built yet)
//! - Resolving with `resolve()` (first call builds, later calls share)
//! - Checking state with `contains()` and `is_resolved()`
//! - Handling a missing service
//!
//! Run with: `RUST_LOG=debug cargo run --example basic_usage`

use lazy_singleton_registry::define_registry;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// Create an isolated, process-wide registry for this example
define_registry!(app);

#[derive(Debug, Clone, PartialEq)]
struct AppConfig {
    name: String,
    version: u32,
    debug_mode: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== lazy-singleton-registry: Basic Usage ===\n");

    // -------------------------------------------------------------------------
    // 1. Register constructors
    // -------------------------------------------------------------------------
    println!("1. Registering constructors...");

    app::register(|| {
        println!("   (building AppConfig)");
        AppConfig {
            name: "MyApp".to_string(),
            version: 1,
            debug_mode: true,
        }
    });
    app::register(|| "Hello, lazy-singleton-registry!".to_string());

    println!("   Registered: AppConfig, String");

    // -------------------------------------------------------------------------
    // 2. Inspect state before anything is resolved
    // -------------------------------------------------------------------------
    println!("\n2. Checking state...");

    println!("   contains::<AppConfig>()    = {}", app::contains::<AppConfig>().unwrap());
    println!("   is_resolved::<AppConfig>() = {}", app::is_resolved::<AppConfig>().unwrap());
    println!("   contains::<Vec<u8>>()      = {}", app::contains::<Vec<u8>>().unwrap());

    // -------------------------------------------------------------------------
    // 3. Resolve: the first call builds, the second reuses
    // -------------------------------------------------------------------------
    println!("\n3. Resolving AppConfig twice...");

    let first: Arc<AppConfig> = app::resolve().unwrap();
    let second: Arc<AppConfig> = app::resolve().unwrap();

    println!(
        "   AppConfig: {} v{} (debug: {})",
        first.name, first.version, first.debug_mode
    );
    println!("   same instance: {}", Arc::ptr_eq(&first, &second));
    println!("   is_resolved::<AppConfig>() = {}", app::is_resolved::<AppConfig>().unwrap());

    // -------------------------------------------------------------------------
    // 4. Owned copies with resolve_cloned()
    // -------------------------------------------------------------------------
    println!("\n4. Resolving an owned copy...");

    let message: String = app::registry().resolve_cloned().unwrap();
    println!("   String (owned): {}", message);

    // -------------------------------------------------------------------------
    // 5. Handle missing services gracefully
    // -------------------------------------------------------------------------
    println!("\n5. Handling missing services...");

    match app::resolve::<Vec<u8>>() {
        Ok(value) => println!("   Found Vec<u8>: {:?}", value),
        Err(e) => println!("   Error (expected): {}", e),
    }

    println!("\n=== Example Complete ===");
}
