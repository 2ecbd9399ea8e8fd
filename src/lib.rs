//! # Lazy Singleton Registry
//!
//! A thread-safe registry that maps service identifiers to singletons built on
//! first demand, plus the service-provider bootstrap around it.
//!
//! ## Quick Start
//!
//! ```rust
//! use lazy_singleton_registry::SingletonRegistry;
//! use std::sync::Arc;
//!
//! let registry = SingletonRegistry::new();
//!
//! // Nothing is constructed yet
//! registry.register(|| "Hello, World!".to_string());
//!
//! // First resolve builds the value, later ones share it
//! let message: Arc<String> = registry.resolve().unwrap();
//! assert_eq!(&*message, "Hello, World!");
//! ```
//!
//! ## Features
//!
//! - **Lazy**: constructors run on first `resolve`, at most once per registration
//! - **Thread-safe**: concurrent first resolutions construct exactly once
//! - **Providers**: two-phase `register_all` / `boot_all` through [`Application`]
//! - **Isolated statics**: [`define_registry!`] for process-wide registries
//! - **Tracing support**: per-registry callback for [`RegistryEvent`]s, plus `tracing` logs
//!
//! ## Main Types
//!
//! - [`SingletonRegistry`] - register, resolve, inspect
//! - [`ServiceProvider`] - a unit of registration with an optional boot hook
//! - [`Application`] - drives providers through register then boot
//! - [`RegistryError`] - everything `resolve` can fail with

mod application;
mod macros;
mod provider;
mod registry;
mod registry_error;
mod registry_event;

pub use application::Application;
pub use provider::ServiceProvider;
pub use registry::{ServiceKey, SingletonRegistry, TraceCallback};
pub use registry_error::{BoxError, RegistryError};
pub use registry_event::RegistryEvent;
