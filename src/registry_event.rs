/// Events emitted by the registry during operations.
///
/// These events are passed to the tracing callback set via `set_trace_callback`.
/// The `Clone` derive allows callbacks to store or forward events if needed.
///
/// # Examples
///
/// ```rust
/// use lazy_singleton_registry::RegistryEvent;
///
/// let event = RegistryEvent::Register { service: "i32" };
/// assert_eq!(event.to_string(), "register { service: i32 }");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A service binding was recorded (or replaced).
    Register {
        /// Type name or explicit name of the service
        service: &'static str,
    },

    /// A service was requested from the registry.
    Resolve {
        service: &'static str,
        /// Whether an instance was handed out
        found: bool,
    },

    /// A constructor ran because the service had no cached instance yet.
    Construct {
        service: &'static str,
        success: bool,
    },

    /// A registration existence check was performed.
    Contains { service: &'static str, found: bool },

    /// The application finished its boot phase.
    Boot {
        /// Number of providers booted in this pass
        providers: usize,
    },
}

impl std::fmt::Display for RegistryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryEvent::Register { service } => {
                write!(f, "register {{ service: {} }}", service)
            }
            RegistryEvent::Resolve { service, found } => {
                write!(f, "resolve {{ service: {}, found: {} }}", service, found)
            }
            RegistryEvent::Construct { service, success } => {
                write!(
                    f,
                    "construct {{ service: {}, success: {} }}",
                    service, success
                )
            }
            RegistryEvent::Contains { service, found } => {
                write!(f, "contains {{ service: {}, found: {} }}", service, found)
            }
            RegistryEvent::Boot { providers } => {
                write!(f, "boot {{ providers: {} }}", providers)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_event_display() {
        let event = RegistryEvent::Register { service: "i32" };
        assert_eq!(event.to_string(), "register { service: i32 }");

        let event = RegistryEvent::Resolve {
            service: "String",
            found: true,
        };
        assert_eq!(event.to_string(), "resolve { service: String, found: true }");

        let event = RegistryEvent::Construct {
            service: "Db",
            success: false,
        };
        assert_eq!(event.to_string(), "construct { service: Db, success: false }");

        let event = RegistryEvent::Contains {
            service: "u8",
            found: false,
        };
        assert_eq!(event.to_string(), "contains { service: u8, found: false }");

        let event = RegistryEvent::Boot { providers: 2 };
        assert_eq!(event.to_string(), "boot { providers: 2 }");
    }

    #[test]
    fn test_registry_event_clone() {
        let event = RegistryEvent::Register { service: "i32" };
        let cloned = event.clone();
        assert_eq!(event, cloned);
    }
}
