//! Keyed service container.
//!
//! # Responsibilities
//! - Hold lazily-built services under string keys
//! - Build each service at most once per container (memoized singleton)
//! - Let factories resolve their own dependencies by key
//!
//! # Design Decisions
//! - Factories are `FnOnce`: a second invocation is impossible, not just avoided
//! - The lock is released while a factory runs so dependent lookups work
//! - A failed factory is remembered and its error replayed
//! - One container per request cycle; nothing here is process-wide

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

/// A resolved service.
pub type Service = Arc<dyn Any + Send + Sync>;

type Factory = Box<dyn FnOnce(&Container) -> Result<Service, ContainerError> + Send>;

/// Container lookup and registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    #[error("service `{key}` is not registered")]
    NotFound { key: String },

    #[error("service `{key}` depends on itself")]
    Cycle { key: String },

    #[error("service `{key}` is not a `{expected}`")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("service `{key}` could not be built: {reason}")]
    FactoryFailed { key: String, reason: String },

    #[error("service `{key}` was already resolved and cannot be replaced")]
    Frozen { key: String },
}

enum Slot {
    Pending(Factory),
    Building,
    Ready(Service),
    Failed(ContainerError),
}

/// Service container scoped to one request cycle.
#[derive(Default)]
pub struct Container {
    slots: Mutex<HashMap<String, Slot>>,
}

impl Container {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lazy factory under `key`.
    ///
    /// Replacing a pending factory is allowed; replacing a service that was
    /// already resolved is not.
    pub fn register<T, F>(&self, key: impl Into<String>, factory: F) -> Result<(), ContainerError>
    where
        T: Any + Send + Sync,
        F: FnOnce(&Container) -> Result<T, ContainerError> + Send + 'static,
    {
        let factory: Factory = Box::new(move |c| factory(c).map(|v| Arc::new(v) as Service));
        self.insert(key.into(), Slot::Pending(factory))
    }

    /// Register an already-built value under `key`.
    pub fn instance<T>(&self, key: impl Into<String>, value: T) -> Result<(), ContainerError>
    where
        T: Any + Send + Sync,
    {
        self.insert(key.into(), Slot::Ready(Arc::new(value)))
    }

    fn insert(&self, key: String, slot: Slot) -> Result<(), ContainerError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(Slot::Ready(_) | Slot::Building) = slots.get(&key) {
            return Err(ContainerError::Frozen { key });
        }
        slots.insert(key, slot);
        Ok(())
    }

    /// Returns true if something is registered under `key`.
    pub fn has(&self, key: &str) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Resolve `key`, running its factory on first use.
    pub fn get(&self, key: &str) -> Result<Service, ContainerError> {
        let factory = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = slots.get_mut(key).ok_or_else(|| ContainerError::NotFound {
                key: key.to_string(),
            })?;
            match std::mem::replace(slot, Slot::Building) {
                Slot::Pending(factory) => factory,
                Slot::Ready(service) => {
                    *slot = Slot::Ready(service.clone());
                    return Ok(service);
                }
                Slot::Failed(err) => {
                    *slot = Slot::Failed(err.clone());
                    return Err(err);
                }
                Slot::Building => {
                    return Err(ContainerError::Cycle {
                        key: key.to_string(),
                    })
                }
            }
        };

        tracing::trace!(service = key, "Building service");
        let built = factory(self).map_err(|err| match err {
            ContainerError::FactoryFailed { .. } => err,
            other => ContainerError::FactoryFailed {
                key: key.to_string(),
                reason: other.to_string(),
            },
        });

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        match &built {
            Ok(service) => slots.insert(key.to_string(), Slot::Ready(service.clone())),
            Err(err) => slots.insert(key.to_string(), Slot::Failed(err.clone())),
        };
        built
    }

    /// Resolve `key` and downcast it to `T`.
    pub fn get_as<T>(&self, key: &str) -> Result<Arc<T>, ContainerError>
    where
        T: Any + Send + Sync,
    {
        self.get(key)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<&String> = slots.keys().collect();
        keys.sort();
        f.debug_struct("Container").field("services", &keys).finish()
    }
}
