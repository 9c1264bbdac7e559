//! Fixed-capacity scope table with stable slots.

use crate::error::{Error, Result};
use crate::limits::MAX_SCOPES;
use crate::scope::{MetricKind, ScopeRecord};

/// Stable reference to a registered scope.
///
/// A handle's slot index never changes for the process lifetime; slots
/// are never freed or reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeHandle(pub(crate) usize);

impl ScopeHandle {
    /// Slot index in registration order.
    ///
    /// The settings collaborator keys its per-scope records off this
    /// stable ordering.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Append-only table of [`ScopeRecord`]s, capacity fixed at
/// [`MAX_SCOPES`].
pub struct ScopeRegistry {
    records: Vec<ScopeRecord>,
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeRegistry {
    /// Create an empty registry. Slot storage is reserved up front and
    /// never reallocated.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::with_capacity(MAX_SCOPES),
        }
    }

    /// Register a new scope, returning its stable handle.
    ///
    /// Exceeding [`MAX_SCOPES`] is a configuration error: callers must
    /// size the registry for their instrumentation density, the engine
    /// never silently drops scopes.
    pub fn register(&mut self, name: &str, kind: MetricKind) -> Result<ScopeHandle> {
        if self.records.len() >= MAX_SCOPES {
            return Err(Error::RegistryFull(MAX_SCOPES));
        }
        self.records.push(ScopeRecord::new(name, kind));
        let handle = ScopeHandle(self.records.len() - 1);
        tracing::debug!(slot = handle.0, name, kind = kind.name(), "registered scope");
        Ok(handle)
    }

    /// Number of registered scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no scopes have been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Handles in registration order.
    pub fn handles(&self) -> impl Iterator<Item = ScopeHandle> {
        (0..self.records.len()).map(ScopeHandle)
    }

    /// Look up a scope by handle.
    #[must_use]
    pub fn get(&self, handle: ScopeHandle) -> Option<&ScopeRecord> {
        self.records.get(handle.0)
    }

    /// Look up a scope mutably by handle.
    pub fn get_mut(&mut self, handle: ScopeHandle) -> Option<&mut ScopeRecord> {
        self.records.get_mut(handle.0)
    }

    pub(crate) fn records_mut(&mut self) -> impl Iterator<Item = &mut ScopeRecord> {
        self.records.iter_mut()
    }
}
