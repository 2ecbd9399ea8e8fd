//! Service provider example.
//!
//! A `DataTableServiceProvider` binds `DataTableService` as a lazy singleton
//! during the register phase and leaves its boot hook empty. The application
//! runs every provider's register, then every provider's boot.
//!
//! Run with: `RUST_LOG=lazy_singleton_registry=debug cargo run --example data_table_provider`

use lazy_singleton_registry::{Application, RegistryError, ServiceProvider, SingletonRegistry};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Placeholder for the table service an application would plug in here.
struct DataTableService {
    default_page_size: usize,
}

struct DataTableServiceProvider;

impl ServiceProvider for DataTableServiceProvider {
    fn register(&self, registry: &SingletonRegistry) {
        registry.register(|| {
            println!("   (building DataTableService)");
            DataTableService {
                default_page_size: 25,
            }
        });
    }
}

/// A consumer wired through the registry.
struct UsersTable {
    tables: Arc<DataTableService>,
}

struct UsersTableProvider;

impl ServiceProvider for UsersTableProvider {
    fn register(&self, registry: &SingletonRegistry) {
        registry.register_with(|registry| {
            Ok::<_, RegistryError>(UsersTable {
                tables: registry.resolve()?,
            })
        });
    }
}

fn main() -> Result<(), RegistryError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== lazy-singleton-registry: Service Providers ===\n");

    let mut app = Application::new();
    app.add_provider(UsersTableProvider)?;
    app.add_provider(DataTableServiceProvider)?;

    println!("1. Booting {} providers...", app.providers().len());
    app.boot_all()?;
    println!(
        "   booted, DataTableService built: {}",
        app.registry().is_resolved::<DataTableService>()?
    );

    println!("\n2. Resolving UsersTable (pulls in DataTableService)...");
    let users: Arc<UsersTable> = app.registry().resolve()?;
    println!("   page size: {}", users.tables.default_page_size);

    println!("\n3. Resolving DataTableService directly...");
    let tables: Arc<DataTableService> = app.registry().resolve()?;
    println!("   same instance: {}", Arc::ptr_eq(&tables, &users.tables));

    println!("\n=== Example Complete ===");
    Ok(())
}
