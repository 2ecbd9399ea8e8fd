//! Two-phase bootstrap: every provider registers, then every provider boots.

use std::any::TypeId;
use std::sync::Arc;

use tracing::{debug, info};

use crate::{RegistryError, RegistryEvent, ServiceProvider, SingletonRegistry};

struct ProviderEntry {
    type_id: TypeId,
    provider: Box<dyn ServiceProvider>,
    registered: bool,
    booted: bool,
}

/// Owns the root registry and drives providers through register and boot.
///
/// # Examples
///
/// ```
/// use lazy_singleton_registry::{Application, ServiceProvider, SingletonRegistry};
/// use std::sync::Arc;
///
/// struct DataTableService;
/// struct DataTableServiceProvider;
///
/// impl ServiceProvider for DataTableServiceProvider {
///     fn register(&self, registry: &SingletonRegistry) {
///         registry.register(|| DataTableService);
///     }
/// }
///
/// let mut app = Application::new();
/// app.add_provider(DataTableServiceProvider).unwrap();
/// app.boot_all().unwrap();
///
/// let service: Arc<DataTableService> = app.registry().resolve().unwrap();
/// ```
pub struct Application {
    registry: Arc<SingletonRegistry>,
    providers: Vec<ProviderEntry>,
    booted: bool,
}

impl Application {
    pub fn new() -> Self {
        Self::with_registry(Arc::new(SingletonRegistry::new()))
    }

    /// Build an application around an existing registry.
    pub fn with_registry(registry: Arc<SingletonRegistry>) -> Self {
        Self {
            registry,
            providers: Vec::new(),
            booted: false,
        }
    }

    pub fn registry(&self) -> &Arc<SingletonRegistry> {
        &self.registry
    }

    pub fn is_booted(&self) -> bool {
        self.booted
    }

    /// Names of the providers in the order they were added.
    pub fn providers(&self) -> Vec<&'static str> {
        self.providers.iter().map(|e| e.provider.name()).collect()
    }

    /// Add a provider.
    ///
    /// Returns `Ok(false)` if a provider of the same type was already added; the
    /// new one is dropped. Once the application has booted, a new provider is
    /// registered and booted right away.
    pub fn add_provider<P: ServiceProvider + 'static>(
        &mut self,
        provider: P,
    ) -> Result<bool, RegistryError> {
        let type_id = TypeId::of::<P>();
        if self.providers.iter().any(|e| e.type_id == type_id) {
            debug!(provider = provider.name(), "provider already added, ignoring");
            return Ok(false);
        }

        self.providers.push(ProviderEntry {
            type_id,
            provider: Box::new(provider),
            registered: false,
            booted: false,
        });

        if self.booted {
            self.register_all();
            self.boot_pending()?;
        }

        Ok(true)
    }

    /// Run `register` on every provider that has not registered yet.
    pub fn register_all(&mut self) {
        for entry in self.providers.iter_mut().filter(|e| !e.registered) {
            debug!(provider = entry.provider.name(), "registering provider");
            entry.provider.register(&self.registry);
            entry.registered = true;
        }
    }

    /// Register anything pending, then boot every provider once.
    ///
    /// Calling this again after a successful boot does nothing. If a provider's
    /// `boot` fails, providers that already booted are not booted again on retry.
    pub fn boot_all(&mut self) -> Result<(), RegistryError> {
        if self.booted {
            debug!("application already booted");
            return Ok(());
        }

        self.register_all();
        let booted = self.boot_pending()?;
        self.registry.boot();
        self.booted = true;

        info!(providers = self.providers.len(), "application booted");
        self.registry
            .emit_event(&RegistryEvent::Boot { providers: booted });

        Ok(())
    }

    fn boot_pending(&mut self) -> Result<usize, RegistryError> {
        let mut count = 0;
        for entry in self.providers.iter_mut().filter(|e| !e.booted) {
            debug!(provider = entry.provider.name(), "booting provider");
            entry.provider.boot(&self.registry)?;
            entry.booted = true;
            count += 1;
        }
        Ok(count)
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}
