use crate::{CountingBuilder, RecordingConnection};
use crane::{Engine, EngineBuilder, Entity, Registry};
use std::sync::Arc;

/// Engine over the statement builder of a provider, counted, plus a recording connection.
pub struct Harness {
    pub engine: Engine,
    pub builder: Arc<CountingBuilder>,
    pub connection: RecordingConnection,
}

impl Harness {
    pub fn new(provider: &str, register: fn(&Registry)) -> Self {
        Self::build(provider, register, 0, |v| v)
    }

    /// The first `failures` statements fail to build.
    pub fn build(
        provider: &str,
        register: fn(&Registry),
        failures: usize,
        configure: impl FnOnce(EngineBuilder) -> EngineBuilder,
    ) -> Self {
        let registry = Registry::new();
        register(&registry);
        let inner = registry
            .builder(provider)
            .expect("The provider did not register a statement builder");
        let builder = Arc::new(CountingBuilder::new(inner).failing(failures));
        registry
            .add_builder(provider, builder.clone(), true)
            .expect("Could not replace the statement builder");
        let engine = configure(Engine::builder().registry(registry).batch_size(10)).build();
        Self {
            engine,
            builder,
            connection: RecordingConnection::new(provider),
        }
    }

    /// Resolves the metadata of `E` (introspection included) and forgets the commands it took.
    pub async fn prime<E: Entity>(&mut self) {
        self.engine
            .session(&mut self.connection)
            .metadata::<E>()
            .await
            .expect("Could not resolve the entity metadata");
        self.connection.clear();
    }
}
