//! Integration tests for lazy, at-most-once construction.
//!
//! Every test builds its own `SingletonRegistry`, so they can run in parallel.

use lazy_singleton_registry::{RegistryError, SingletonRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[derive(Debug)]
struct DataTableService {
    built: usize,
}

fn register_counting(registry: &SingletonRegistry) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    registry.register(move || DataTableService {
        built: counter.fetch_add(1, Ordering::SeqCst) + 1,
    });
    calls
}

#[test]
fn test_unregistered_identifier_fails() {
    let registry = SingletonRegistry::new();

    let err = registry.resolve::<DataTableService>().unwrap_err();
    assert!(matches!(err, RegistryError::Unregistered { .. }));
    assert!(err.to_string().contains("DataTableService"));
}

#[test]
fn test_first_resolve_invokes_constructor_once() {
    let registry = SingletonRegistry::new();
    let calls = register_counting(&registry);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let service: Arc<DataTableService> = registry.resolve().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.built, 1);
}

#[test]
fn test_three_resolves_share_one_instance() {
    let registry = SingletonRegistry::new();
    let calls = register_counting(&registry);

    let a: Arc<DataTableService> = registry.resolve().unwrap();
    let b: Arc<DataTableService> = registry.resolve().unwrap();
    let c: Arc<DataTableService> = registry.resolve().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &c));
}

#[test]
fn test_reregister_uses_new_constructor() {
    let registry = SingletonRegistry::new();
    let old_calls = register_counting(&registry);
    let _: Arc<DataTableService> = registry.resolve().unwrap();

    let new_calls = register_counting(&registry);
    let service: Arc<DataTableService> = registry.resolve().unwrap();

    assert_eq!(old_calls.load(Ordering::SeqCst), 1);
    assert_eq!(new_calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.built, 1);
}

#[test]
fn test_reregister_before_first_resolve() {
    let registry = SingletonRegistry::new();
    let old_calls = register_counting(&registry);
    let new_calls = register_counting(&registry);

    let _: Arc<DataTableService> = registry.resolve().unwrap();

    assert_eq!(old_calls.load(Ordering::SeqCst), 0);
    assert_eq!(new_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_boot_has_no_observable_effect() {
    fn run(boots_before: usize, boots_after: usize) -> (usize, bool, usize) {
        let registry = SingletonRegistry::new();
        let calls = register_counting(&registry);

        for _ in 0..boots_before {
            registry.boot();
        }
        let resolved_before = registry.is_resolved::<DataTableService>().unwrap();
        let service: Arc<DataTableService> = registry.resolve().unwrap();
        for _ in 0..boots_after {
            registry.boot();
        }

        assert!(!resolved_before);
        (
            service.built,
            registry.is_resolved::<DataTableService>().unwrap(),
            calls.load(Ordering::SeqCst),
        )
    }

    assert_eq!(run(0, 0), run(2, 0));
    assert_eq!(run(0, 0), run(2, 3));
}

#[test]
fn test_concurrent_first_resolution_constructs_once() {
    let registry = Arc::new(SingletonRegistry::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    registry.register(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(25));
        DataTableService { built: 1 }
    });

    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                registry.resolve::<DataTableService>().unwrap()
            })
        })
        .collect();

    let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(instances.iter().all(|i| Arc::ptr_eq(i, &instances[0])));
}

#[test]
fn test_failure_propagates_and_is_retried() {
    #[derive(Debug)]
    struct BackendDown;

    impl std::fmt::Display for BackendDown {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "backend down")
        }
    }

    impl std::error::Error for BackendDown {}

    let registry = SingletonRegistry::new();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    registry.register_with(move |_| {
        match counter.fetch_add(1, Ordering::SeqCst) {
            0 | 1 => Err(BackendDown),
            n => Ok(DataTableService { built: n + 1 }),
        }
    });

    for _ in 0..2 {
        let err = registry.resolve::<DataTableService>().unwrap_err();
        let RegistryError::Construction { source, .. } = err else {
            panic!("expected a construction error");
        };
        assert!(source.downcast_ref::<BackendDown>().is_some());
        assert!(!registry.is_resolved::<DataTableService>().unwrap());
    }

    let service: Arc<DataTableService> = registry.resolve().unwrap();
    let again: Arc<DataTableService> = registry.resolve().unwrap();

    assert_eq!(service.built, 3);
    assert!(Arc::ptr_eq(&service, &again));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[test]
fn test_panicking_constructor_leaves_service_unresolved() {
    let registry = Arc::new(SingletonRegistry::new());
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    registry.register(move || {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("first construction blows up");
        }
        DataTableService { built: 2 }
    });

    let worker = registry.clone();
    let outcome = thread::spawn(move || worker.resolve::<DataTableService>()).join();
    assert!(outcome.is_err());

    assert!(!registry.is_resolved::<DataTableService>().unwrap());
    let service: Arc<DataTableService> = registry.resolve().unwrap();
    assert_eq!(service.built, 2);
}

#[test]
fn test_dependency_chain_is_built_on_demand() {
    struct Connection {
        dsn: String,
    }

    struct QueryBuilder {
        connection: Arc<Connection>,
    }

    struct DataTable {
        builder: Arc<QueryBuilder>,
    }

    let registry = SingletonRegistry::new();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = connections.clone();

    // Registration order does not matter because nothing is built yet
    registry.register_with(|r| {
        Ok::<_, RegistryError>(DataTable {
            builder: r.resolve()?,
        })
    });
    registry.register_with(|r| {
        Ok::<_, RegistryError>(QueryBuilder {
            connection: r.resolve()?,
        })
    });
    registry.register(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Connection {
            dsn: "mysql://localhost/app".to_string(),
        }
    });

    let table: Arc<DataTable> = registry.resolve().unwrap();
    let builder: Arc<QueryBuilder> = registry.resolve().unwrap();

    assert!(Arc::ptr_eq(&table.builder, &builder));
    assert_eq!(table.builder.connection.dsn, "mysql://localhost/app");
    assert_eq!(connections.load(Ordering::SeqCst), 1);
}
