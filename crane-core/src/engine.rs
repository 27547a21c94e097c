use crate::{
    BlockingSession, CommandTextCache, Connection, DbFieldCache, Entity, ExecutionContextCache,
    MetadataResolver, Registry, Result, ResultCache, Session, Trace,
};
use std::sync::Arc;

/// Tunables of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Rows per statement of the `*_all` writes when the call does not say.
    pub batch_size: usize,
    /// Lifetime of the query results stored in the result cache.
    pub cache_expiration_minutes: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            batch_size: 10,
            cache_expiration_minutes: 180,
        }
    }
}

/// Owner of the registry and of every cache.
///
/// One engine is meant to live for the whole process and be shared by reference, sessions borrow it together
/// with a connection.
pub struct Engine {
    registry: Registry,
    resolver: MetadataResolver,
    command_texts: CommandTextCache,
    contexts: ExecutionContextCache,
    db_fields: DbFieldCache,
    trace: Option<Arc<dyn Trace>>,
    cache: Option<Arc<dyn ResultCache>>,
    options: EngineOptions,
}

impl Engine {
    /// Engine knowing only the generic provider.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> EngineBuilder {
        Default::default()
    }

    pub fn session<'s, C: Connection>(&'s self, connection: &'s mut C) -> Session<'s, C> {
        Session::new(self, connection)
    }

    pub fn blocking_session<'s, C: Connection>(
        &'s self,
        connection: &'s mut C,
    ) -> BlockingSession<'s, C> {
        BlockingSession::new(self.session(connection))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }
    pub fn command_texts(&self) -> &CommandTextCache {
        &self.command_texts
    }
    pub fn contexts(&self) -> &ExecutionContextCache {
        &self.contexts
    }
    pub fn db_fields(&self) -> &DbFieldCache {
        &self.db_fields
    }
    pub fn trace(&self) -> Option<&dyn Trace> {
        self.trace.as_deref()
    }
    pub fn cache(&self) -> Option<&dyn ResultCache> {
        self.cache.as_deref()
    }
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Empties the metadata, command text, execution context and column caches. The result cache is left alone.
    pub fn flush(&self) {
        self.resolver.flush();
        self.command_texts.flush();
        self.contexts.flush();
        self.db_fields.flush();
        log::debug!("Engine caches flushed");
    }

    /// Maps `E` to `name` (`schema.table` accepted) and drops whatever was resolved before.
    pub fn map_table<E: Entity>(&self, name: impl Into<String>, force: bool) -> Result<()> {
        self.registry.map_table::<E>(name, force)?;
        self.flush_mapping();
        Ok(())
    }
    pub fn map_column<E: Entity>(
        &self,
        property: &str,
        column: impl Into<String>,
        force: bool,
    ) -> Result<()> {
        self.registry.map_column::<E>(property, column, force)?;
        self.flush_mapping();
        Ok(())
    }
    pub fn map_primary<E: Entity>(&self, property: &str, force: bool) -> Result<()> {
        self.registry.map_primary::<E>(property, force)?;
        self.flush_mapping();
        Ok(())
    }
    pub fn map_identity<E: Entity>(&self, property: &str, force: bool) -> Result<()> {
        self.registry.map_identity::<E>(property, force)?;
        self.flush_mapping();
        Ok(())
    }
    pub fn unmap<E: Entity>(&self) {
        self.registry.unmap::<E>();
        self.flush_mapping();
    }

    fn flush_mapping(&self) {
        self.resolver.flush();
        self.command_texts.flush();
        self.contexts.flush();
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
pub struct EngineBuilder {
    registry: Option<Registry>,
    trace: Option<Arc<dyn Trace>>,
    cache: Option<Arc<dyn ResultCache>>,
    options: EngineOptions,
}

impl EngineBuilder {
    /// Registry to start from, [`Registry::with_generic`] otherwise.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }
    pub fn trace(mut self, trace: impl Trace + 'static) -> Self {
        self.trace = Some(Arc::new(trace));
        self
    }
    pub fn cache(mut self, cache: impl ResultCache + 'static) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.options.batch_size = batch_size.max(1);
        self
    }
    pub fn cache_expiration_minutes(mut self, minutes: u64) -> Self {
        self.options.cache_expiration_minutes = minutes;
        self
    }
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }
    pub fn build(self) -> Engine {
        Engine {
            registry: self.registry.unwrap_or_else(Registry::with_generic),
            resolver: Default::default(),
            command_texts: Default::default(),
            contexts: Default::default(),
            db_fields: Default::default(),
            trace: self.trace,
            cache: self.cache,
            options: self.options,
        }
    }
}
