use crate::{
    Bindable, CacheStats, CommandKey, CommandRequest, ExecutionContext, FlightMap, Result,
};
use anyhow::anyhow;
use std::{
    any::{Any, TypeId},
    sync::Arc,
};

/// Identity of an execution context: the bound type plus the key of the statement it binds.
///
/// Every text gets its own context, requests alternating filters or hints never rebind each other's.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey {
    pub type_id: TypeId,
    pub command: CommandKey,
}

impl ContextKey {
    pub fn new<T: 'static>(provider: &str, request: &CommandRequest) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            command: request.key(provider),
        }
    }
}

/// Compiled binding plans by [`ContextKey`], whatever the bound type.
#[derive(Default)]
pub struct ExecutionContextCache {
    map: FlightMap<ContextKey, Arc<dyn Any + Send + Sync>>,
}

impl ExecutionContextCache {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get<T: Bindable>(&self, key: &ContextKey) -> Result<Option<Arc<ExecutionContext<T>>>> {
        self.map.get(key).map(|v| downcast(key, v)).transpose()
    }

    /// Same single build guarantee as the command text cache.
    pub fn get_or_build<T: Bindable>(
        &self,
        key: &ContextKey,
        factory: impl FnOnce() -> Result<ExecutionContext<T>>,
    ) -> Result<Arc<ExecutionContext<T>>> {
        let value = self.map.get_or_try_build(key, || {
            log::debug!(
                "Compiling {} context of `{}` for `{}` (batch size {})",
                key.command.kind,
                std::any::type_name::<T>(),
                key.command.table,
                key.command.batch_size,
            );
            factory().map(|v| Arc::new(v) as Arc<dyn Any + Send + Sync>)
        })?;
        downcast(key, value)
    }

    /// Stores a whole new context under `key`.
    pub fn replace<T: Bindable>(
        &self,
        key: &ContextKey,
        context: ExecutionContext<T>,
    ) -> Arc<ExecutionContext<T>> {
        let context = Arc::new(context);
        self.map.replace(key.clone(), context.clone());
        context
    }

    pub fn flush(&self) {
        self.map.flush();
    }

    pub fn stats(&self) -> CacheStats {
        self.map.stats()
    }
}

fn downcast<T: Bindable>(
    key: &ContextKey,
    value: Arc<dyn Any + Send + Sync>,
) -> Result<Arc<ExecutionContext<T>>> {
    value.downcast::<ExecutionContext<T>>().map_err(|_| {
        anyhow!(
            "Execution context of `{}` for {} does not bind `{}`",
            key.command.table,
            key.command.kind,
            std::any::type_name::<T>()
        )
    })
}
