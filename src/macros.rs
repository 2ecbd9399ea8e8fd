//! Macros for creating process-wide singleton registries.

/// Creates a process-wide singleton registry with a single macro invocation.
///
/// The macro generates a module containing:
/// - A hidden static [`SingletonRegistry`](crate::SingletonRegistry), created on first use
/// - Free functions delegating to it
/// - `registry()` for anything the free functions do not cover
///
/// # Examples
///
/// ```rust
/// use lazy_singleton_registry::define_registry;
/// use std::sync::Arc;
///
/// define_registry!(global);
///
/// global::register(|| 42i32);
/// global::register(|| "Hello".to_string());
///
/// let num: Arc<i32> = global::resolve().unwrap();
/// let msg: Arc<String> = global::resolve().unwrap();
///
/// assert_eq!(*num, 42);
/// assert_eq!(&**msg, "Hello");
/// ```
///
/// # Multiple Registries
///
/// Every invocation is isolated from the others:
///
/// ```rust
/// use lazy_singleton_registry::define_registry;
///
/// define_registry!(database);
/// define_registry!(cache);
///
/// database::register(|| "db_connection".to_string());
///
/// assert!(database::contains::<String>().unwrap());
/// assert!(!cache::contains::<String>().unwrap());
/// ```
#[macro_export]
macro_rules! define_registry {
    ($name:ident) => {
        pub mod $name {
            use std::sync::{Arc, LazyLock};

            static REGISTRY: LazyLock<$crate::SingletonRegistry> =
                LazyLock::new($crate::SingletonRegistry::new);

            /// The underlying registry.
            pub fn registry() -> &'static $crate::SingletonRegistry {
                &REGISTRY
            }

            /// Register a lazily constructed singleton.
            pub fn register<T, F>(constructor: F)
            where
                T: Send + Sync + 'static,
                F: Fn() -> T + Send + Sync + 'static,
            {
                REGISTRY.register(constructor)
            }

            /// Register a singleton whose constructor may resolve other services or fail.
            pub fn register_with<T, E, F>(constructor: F)
            where
                T: Send + Sync + 'static,
                E: Into<$crate::BoxError>,
                F: Fn(&$crate::SingletonRegistry) -> Result<T, E> + Send + Sync + 'static,
            {
                REGISTRY.register_with(constructor)
            }

            /// Register an already constructed instance.
            pub fn register_instance<T: Send + Sync + 'static>(value: T) {
                REGISTRY.register_instance(value)
            }

            /// Resolve a singleton, constructing it on first use.
            pub fn resolve<T: Send + Sync + 'static>() -> Result<Arc<T>, $crate::RegistryError> {
                REGISTRY.resolve()
            }

            /// Check if a type is registered.
            pub fn contains<T: Send + Sync + 'static>() -> Result<bool, $crate::RegistryError> {
                REGISTRY.contains::<T>()
            }

            /// Check if a type has a cached instance.
            pub fn is_resolved<T: Send + Sync + 'static>() -> Result<bool, $crate::RegistryError> {
                REGISTRY.is_resolved::<T>()
            }

            /// Set a tracing callback for registry operations.
            pub fn set_trace_callback(
                callback: impl Fn(&$crate::RegistryEvent) + Send + Sync + 'static,
            ) {
                REGISTRY.set_trace_callback(callback)
            }

            /// Clear the tracing callback.
            pub fn clear_trace_callback() {
                REGISTRY.clear_trace_callback()
            }
        }
    };
}
