//! Mapping from operation name to a single [`OperationHandler`] (spec §4.1).

use crate::operation::handler::OperationHandler;
use dashmap::DashMap;
use std::sync::Arc;

/// A plugin manifest entry: a way to construct an [`OperationHandler`]
/// without the registry knowing the concrete type. Mirrors spec §9's
/// "service-provider discovery becomes an explicit registration table"
/// design note — there is no reflection here, just a `Vec` populated at
/// program start from a generated list or a plugin manifest.
pub type HandlerFactory = Arc<dyn Fn() -> Arc<dyn OperationHandler> + Send + Sync>;

/// Registry of operation handlers, keyed by operation name.
///
/// Reads are lock-free (`DashMap` get); writes (`register`) are rare and
/// idempotent by replacement, matching the concurrency model of spec §5.
#[derive(Default)]
pub struct OperationRegistry {
    handlers: DashMap<String, Arc<dyn OperationHandler>>,
}

impl OperationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the handler for `handler.operation()`. Idempotent.
    pub fn register(&self, handler: Arc<dyn OperationHandler>) {
        self.handlers.insert(handler.operation().to_string(), handler);
    }

    /// Bulk form of [`Self::register`].
    pub fn register_all(&self, handlers: impl IntoIterator<Item = Arc<dyn OperationHandler>>) {
        for handler in handlers {
            self.register(handler);
        }
    }

    /// Looks up the handler for `operation`. A miss is not an error at the
    /// registry level — the engine surfaces `UnknownOperation` (spec §7).
    #[must_use]
    pub fn resolve(&self, operation: &str) -> Option<Arc<dyn OperationHandler>> {
        self.handlers.get(operation).map(|entry| Arc::clone(entry.value()))
    }

    /// Iterates the plugin manifest and registers each factory's handler.
    /// Replaces the host platform's service-provider mechanism (spec §9)
    /// with an explicit, statically-known table.
    pub fn discover_plugins(&self, factories: impl IntoIterator<Item = HandlerFactory>) {
        for factory in factories {
            self.register(factory());
        }
    }

    /// Number of registered operations — used by health/stats surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no operations are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
