//! Service providers group the bindings of one part of an application.
//!
//! A provider has two phases. `register` only records bindings and must not
//! resolve anything, since other providers may not have registered yet.
//! `boot` runs once every provider has registered; it may resolve freely.

use crate::{RegistryError, SingletonRegistry};

/// A unit of service registration driven by [`Application`](crate::Application).
///
/// # Examples
///
/// ```
/// use lazy_singleton_registry::{ServiceProvider, SingletonRegistry};
///
/// struct Mailer;
/// struct MailServiceProvider;
///
/// impl ServiceProvider for MailServiceProvider {
///     fn register(&self, registry: &SingletonRegistry) {
///         registry.register(|| Mailer);
///     }
/// }
/// ```
pub trait ServiceProvider: Send + Sync {
    /// Record bindings. Constructors registered here run lazily on first resolve.
    fn register(&self, registry: &SingletonRegistry);

    /// Called after all providers have registered. Does nothing by default.
    fn boot(&self, _registry: &SingletonRegistry) -> Result<(), RegistryError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
