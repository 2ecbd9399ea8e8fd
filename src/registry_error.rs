use thiserror::Error;

/// Error type produced by service constructors, kept boxed so the original
/// error survives and can be downcast by the caller.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to acquire registry lock")]
    RegistryLock,

    #[error("Service not registered: {service}")]
    Unregistered { service: &'static str },

    #[error("Type mismatch for service {service}: requested {requested}, registered {registered}")]
    TypeMismatch {
        service: &'static str,
        requested: &'static str,
        registered: &'static str,
    },

    #[error("Failed to construct service {service}: {source}")]
    Construction {
        service: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Circular dependency detected: {chain}")]
    CircularDependency { chain: String },
}

impl RegistryError {
    /// Name of the service the error refers to, if any.
    pub fn service(&self) -> Option<&'static str> {
        match self {
            RegistryError::Unregistered { service }
            | RegistryError::TypeMismatch { service, .. }
            | RegistryError::Construction { service, .. } => Some(*service),
            RegistryError::RegistryLock | RegistryError::CircularDependency { .. } => None,
        }
    }
}
