//! A thread-safe singleton registry with deferred construction.
//!
//! Each service is registered with a constructor. Nothing is built at
//! registration time: the first `resolve` runs the constructor, caches the
//! instance, and every later `resolve` hands out the same `Arc`.
//!
//! # Examples
//!
//! ```
//! use lazy_singleton_registry::SingletonRegistry;
//! use std::sync::Arc;
//!
//! struct DataTableService {
//!     page_size: usize,
//! }
//!
//! let registry = SingletonRegistry::new();
//! registry.register(|| DataTableService { page_size: 25 });
//!
//! let first: Arc<DataTableService> = registry.resolve().unwrap();
//! let second: Arc<DataTableService> = registry.resolve().unwrap();
//!
//! assert_eq!(first.page_size, 25);
//! assert!(Arc::ptr_eq(&first, &second));
//! ```

use std::{
    any::{Any, TypeId},
    cell::RefCell,
    collections::HashMap,
    convert::Infallible,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, RwLock,
    },
};

use once_cell::sync::OnceCell;
use tracing::{debug, trace, warn};

use crate::{BoxError, RegistryError, RegistryEvent};

type Instance = Arc<dyn Any + Send + Sync>;

type Constructor = dyn Fn(&SingletonRegistry) -> Result<Instance, BoxError> + Send + Sync;

/// Type alias for the user-supplied tracing callback.
///
/// The callback receives a reference to a `RegistryEvent` every time the registry is
/// interacted with. It must be thread-safe because the registry itself is shared.
pub type TraceCallback = dyn Fn(&RegistryEvent) + Send + Sync + 'static;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

// -------------------------------------------------------------------------------------------------
// Service identity
// -------------------------------------------------------------------------------------------------

/// Identifier a service is registered and resolved under.
///
/// Typed keys are what `register`/`resolve` use. Named keys bind a service under
/// an explicit string, the way a container binds by interface or class name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKey {
    Type { id: TypeId, name: &'static str },
    Named(&'static str),
}

impl ServiceKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        ServiceKey::Type {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn named(name: &'static str) -> Self {
        ServiceKey::Named(name)
    }

    /// Human-readable name used in events, errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            ServiceKey::Type { name, .. } => *name,
            ServiceKey::Named(name) => *name,
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -------------------------------------------------------------------------------------------------
// Registrations
// -------------------------------------------------------------------------------------------------

struct Registration {
    key: ServiceKey,
    type_id: TypeId,
    type_name: &'static str,
    constructor: Box<Constructor>,
    instance: OnceCell<Instance>,
}

impl Registration {
    fn lazy<T, E, F>(key: ServiceKey, constructor: F) -> Self
    where
        T: Send + Sync + 'static,
        E: Into<BoxError>,
        F: Fn(&SingletonRegistry) -> Result<T, E> + Send + Sync + 'static,
    {
        let constructor: Box<Constructor> = Box::new(move |registry: &SingletonRegistry| {
            constructor(registry)
                .map(|value| Arc::new(value) as Instance)
                .map_err(Into::into)
        });

        Self {
            key,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            constructor,
            instance: OnceCell::new(),
        }
    }

    fn resolved<T: Send + Sync + 'static>(key: ServiceKey, value: Arc<T>) -> Self {
        Self {
            key,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            constructor: Box::new(prebuilt),
            instance: OnceCell::with_value(value as Instance),
        }
    }

    /// Returns the cached instance, constructing it first if needed.
    ///
    /// Concurrent callers block on the cell while one of them runs the
    /// constructor. A failed construction leaves the cell empty.
    fn instance(&self, registry: &SingletonRegistry) -> Result<Instance, RegistryError> {
        if let Some(instance) = self.instance.get() {
            trace!(service = %self.key, "cache hit");
            return Ok(Arc::clone(instance));
        }

        let _guard = ResolutionGuard::enter(registry.id, self)?;

        self.instance
            .get_or_try_init(|| {
                debug!(service = %self.key, "constructing service");
                let result = (self.constructor)(registry);

                registry.emit_event(&RegistryEvent::Construct {
                    service: self.key.name(),
                    success: result.is_ok(),
                });

                result.map_err(|source| {
                    warn!(service = %self.key, error = %source, "service construction failed");

                    // A cycle surfaces as-is at every level of the chain
                    if let Some(RegistryError::CircularDependency { chain }) =
                        source.downcast_ref::<RegistryError>()
                    {
                        return RegistryError::CircularDependency {
                            chain: chain.clone(),
                        };
                    }

                    RegistryError::Construction {
                        service: self.key.name(),
                        source,
                    }
                })
            })
            .cloned()
    }
}

// Cells of pre-built registrations are filled on creation, so this never runs.
fn prebuilt(_: &SingletonRegistry) -> Result<Instance, BoxError> {
    Err("pre-built instance has no constructor".into())
}

// -------------------------------------------------------------------------------------------------
// Cycle detection
// -------------------------------------------------------------------------------------------------

thread_local! {
    // Registrations currently under construction on this thread
    static RESOLVING: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

#[derive(Clone, Copy)]
struct Frame {
    registry: u64,
    registration: *const Registration,
    key: ServiceKey,
}

struct ResolutionGuard;

impl ResolutionGuard {
    /// Cycles are tracked per registration, so a constructor that re-registers
    /// its own service can still resolve the new binding.
    fn enter(registry: u64, registration: &Registration) -> Result<Self, RegistryError> {
        let frame = Frame {
            registry,
            registration: registration as *const Registration,
            key: registration.key,
        };

        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();

            if let Some(start) = stack
                .iter()
                .position(|entry| std::ptr::eq(entry.registration, frame.registration))
            {
                let chain = stack[start..]
                    .iter()
                    .filter(|entry| entry.registry == registry)
                    .map(|entry| entry.key.name())
                    .chain(std::iter::once(frame.key.name()))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(RegistryError::CircularDependency { chain });
            }

            stack.push(frame);
            Ok(ResolutionGuard)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

// -------------------------------------------------------------------------------------------------
// Registry
// -------------------------------------------------------------------------------------------------

/// Maps service identifiers to lazily constructed, shared instances.
///
/// At most one instance exists per identifier for the lifetime of the registry.
/// Pass the registry (usually behind an `Arc`) to whatever needs to resolve
/// services, or use [`define_registry!`](crate::define_registry) for a
/// process-wide static one.
pub struct SingletonRegistry {
    id: u64,
    services: RwLock<HashMap<ServiceKey, Arc<Registration>>>,
    trace: Mutex<Option<Arc<TraceCallback>>>,
}

impl SingletonRegistry {
    pub fn new() -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            services: RwLock::new(HashMap::new()),
            trace: Mutex::new(None),
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Tracing
    // ---------------------------------------------------------------------------------------------

    /// Set a tracing callback for registry operations.
    ///
    /// The callback is invoked for register, resolve, construct and contains. It
    /// runs without any registry lock held, so it may use the registry itself.
    pub fn set_trace_callback(&self, callback: impl Fn(&RegistryEvent) + Send + Sync + 'static) {
        let mut guard = self.trace.lock().unwrap_or_else(|p| p.into_inner());
        *guard = Some(Arc::new(callback));
    }

    /// Clear the tracing callback.
    pub fn clear_trace_callback(&self) {
        let mut guard = self.trace.lock().unwrap_or_else(|p| p.into_inner());
        *guard = None;
    }

    pub(crate) fn emit_event(&self, event: &RegistryEvent) {
        let callback = self
            .trace
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();

        if let Some(callback) = callback {
            callback(event);
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------------------------------

    fn insert(&self, registration: Registration) {
        let key = registration.key;
        self.emit_event(&RegistryEvent::Register {
            service: key.name(),
        });

        // Any replaced registration (and its cached instance) drops after the lock is released.
        let previous = self
            .services
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key, Arc::new(registration));

        debug!(service = %key, replaced = previous.is_some(), "registered service");
    }

    /// Register a singleton built by `constructor` on first resolution.
    ///
    /// The constructor is not invoked here. Registering the same type again
    /// replaces the binding and discards any instance already cached for it.
    ///
    /// # Examples
    ///
    /// ```
    /// use lazy_singleton_registry::SingletonRegistry;
    /// use std::sync::Arc;
    ///
    /// let registry = SingletonRegistry::new();
    /// registry.register(|| "Hello".to_string());
    ///
    /// let s: Arc<String> = registry.resolve().expect("String should resolve");
    /// assert_eq!(&*s, "Hello");
    /// ```
    pub fn register<T, F>(&self, constructor: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register_with(move |_: &SingletonRegistry| Ok::<T, Infallible>(constructor()));
    }

    /// Register a singleton whose constructor can resolve other services and fail.
    ///
    /// An error returned by `constructor` reaches the caller of `resolve` as
    /// [`RegistryError::Construction`] with the original error as its source.
    /// A [`RegistryError::CircularDependency`] from a nested `resolve` is
    /// passed through unwrapped. The service stays unresolved, so the next
    /// `resolve` tries again.
    ///
    /// # Examples
    ///
    /// ```
    /// use lazy_singleton_registry::{RegistryError, SingletonRegistry};
    /// use std::sync::Arc;
    ///
    /// struct Config { url: String }
    /// struct Database { url: String }
    ///
    /// let registry = SingletonRegistry::new();
    /// registry.register(|| Config { url: "postgres://localhost".into() });
    /// registry.register_with(|registry| {
    ///     let config: Arc<Config> = registry.resolve()?;
    ///     Ok::<_, RegistryError>(Database { url: config.url.clone() })
    /// });
    ///
    /// let db: Arc<Database> = registry.resolve().unwrap();
    /// assert_eq!(db.url, "postgres://localhost");
    /// ```
    pub fn register_with<T, E, F>(&self, constructor: F)
    where
        T: Send + Sync + 'static,
        E: Into<BoxError>,
        F: Fn(&SingletonRegistry) -> Result<T, E> + Send + Sync + 'static,
    {
        self.insert(Registration::lazy(ServiceKey::of::<T>(), constructor));
    }

    /// Register a service under an explicit name instead of its type.
    pub fn register_named<T, E, F>(&self, name: &'static str, constructor: F)
    where
        T: Send + Sync + 'static,
        E: Into<BoxError>,
        F: Fn(&SingletonRegistry) -> Result<T, E> + Send + Sync + 'static,
    {
        self.insert(Registration::lazy(ServiceKey::named(name), constructor));
    }

    /// Register an already constructed instance.
    pub fn register_instance<T: Send + Sync + 'static>(&self, value: T) {
        self.register_arc(Arc::new(value));
    }

    /// Register an Arc-wrapped instance.
    ///
    /// Resolving hands out clones of this exact `Arc`.
    pub fn register_arc<T: Send + Sync + 'static>(&self, value: Arc<T>) {
        self.insert(Registration::resolved(ServiceKey::of::<T>(), value));
    }

    // ---------------------------------------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------------------------------------

    fn lookup(&self, key: ServiceKey) -> Result<Arc<Registration>, RegistryError> {
        let registration = self
            .services
            .read()
            .map_err(|_| RegistryError::RegistryLock)?
            .get(&key)
            .cloned();

        registration.ok_or(RegistryError::Unregistered {
            service: key.name(),
        })
    }

    fn resolve_key<T: Send + Sync + 'static>(
        &self,
        key: ServiceKey,
    ) -> Result<Arc<T>, RegistryError> {
        let result = self.lookup(key).and_then(|registration| {
            let mismatch = || RegistryError::TypeMismatch {
                service: key.name(),
                requested: std::any::type_name::<T>(),
                registered: registration.type_name,
            };

            if registration.type_id != TypeId::of::<T>() {
                return Err(mismatch());
            }

            registration
                .instance(self)?
                .downcast::<T>()
                .map_err(|_| mismatch())
        });

        self.emit_event(&RegistryEvent::Resolve {
            service: key.name(),
            found: result.is_ok(),
        });

        result
    }

    /// Resolve the singleton registered for `T`, constructing it on first use.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Unregistered`] if `T` was never registered
    /// - [`RegistryError::Construction`] if the constructor failed
    /// - [`RegistryError::CircularDependency`] if building `T` needs `T` again on this thread
    /// - [`RegistryError::RegistryLock`] if the storage lock is poisoned; constructors and
    ///   trace callbacks never run under that lock, so this is not expected in practice
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, RegistryError> {
        self.resolve_key(ServiceKey::of::<T>())
    }

    /// Resolve a service registered with [`register_named`](Self::register_named).
    ///
    /// Fails with [`RegistryError::TypeMismatch`] if `T` is not the type the
    /// name was registered with; the constructor is not run in that case.
    pub fn resolve_named<T: Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> Result<Arc<T>, RegistryError> {
        self.resolve_key(ServiceKey::named(name))
    }

    /// Resolve and clone the singleton registered for `T`.
    pub fn resolve_cloned<T: Send + Sync + Clone + 'static>(&self) -> Result<T, RegistryError> {
        let arc = self.resolve::<T>()?;
        Ok((*arc).clone())
    }

    // ---------------------------------------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------------------------------------

    fn contains_key(&self, key: ServiceKey) -> Result<bool, RegistryError> {
        let found = self
            .services
            .read()
            .map(|m| m.contains_key(&key))
            .map_err(|_| RegistryError::RegistryLock)?;

        self.emit_event(&RegistryEvent::Contains {
            service: key.name(),
            found,
        });

        Ok(found)
    }

    /// Check if `T` is registered. Does not construct anything.
    pub fn contains<T: Send + Sync + 'static>(&self) -> Result<bool, RegistryError> {
        self.contains_key(ServiceKey::of::<T>())
    }

    pub fn contains_named(&self, name: &'static str) -> Result<bool, RegistryError> {
        self.contains_key(ServiceKey::named(name))
    }

    /// Whether `T` has a cached instance. `false` for unregistered types.
    pub fn is_resolved<T: Send + Sync + 'static>(&self) -> Result<bool, RegistryError> {
        match self.lookup(ServiceKey::of::<T>()) {
            Ok(registration) => Ok(registration.instance.get().is_some()),
            Err(RegistryError::Unregistered { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Post-registration hook. Does nothing and may be called any number of times.
    pub fn boot(&self) {
        trace!(registry = self.id, "registry boot hook");
    }
}

impl Default for SingletonRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SingletonRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonRegistry")
            .field("id", &self.id)
            .field("services", &self.len())
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
