mod aggregate;
mod multiple;
mod options;
mod query;
mod write;

pub use multiple::*;
pub use options::*;

use crate::{
    Bindable, CancellableTraceLog, Command, CommandKind, CommandRequest, Connection, DbField,
    DbSetting, Engine, Entity, EntityMetadata, Error, ExecutionContext, ExecutionContextFactory,
    ContextKey, Field, MetadataResolver, Parameter, QueryFilter, QueryGroup, QueryResult, Result, ResultTraceLog,
    RowLabeled, TableRef, TraceOutcome, translate,
    stream::TryStreamExt,
};
use anyhow::Context;
use std::{sync::Arc, time::Instant};

/// Operations of an [`Engine`] over one borrowed connection.
///
/// Every operation resolves the metadata, takes the command text and the execution context from the engine caches,
/// then sends one command (or one per batch) through the connection. Rows written with an identity get the generated
/// value back.
pub struct Session<'s, C: Connection> {
    engine: &'s Engine,
    connection: &'s mut C,
}

impl<'s, C: Connection> Session<'s, C> {
    pub fn new(engine: &'s Engine, connection: &'s mut C) -> Self {
        Self { engine, connection }
    }

    pub fn engine(&self) -> &'s Engine {
        self.engine
    }

    pub fn connection(&mut self) -> &mut C {
        self.connection
    }

    pub fn provider(&self) -> String {
        self.connection.provider().to_string()
    }

    /// Columns of `table` as reported by the database, `None` when the provider cannot introspect.
    pub async fn db_fields(&mut self, table: &TableRef) -> Result<Option<Arc<[DbField]>>> {
        let provider = self.provider();
        let helper = self.engine.registry().helper(&provider)?;
        let Some(command) = helper.fields_command(table) else {
            return Ok(None);
        };
        let connection = &mut *self.connection;
        let fields = self
            .engine
            .db_fields()
            .get_or_fetch(&provider, &table.to_string(), || async move {
                let rows = connection
                    .fetch(command)
                    .try_collect::<Vec<_>>()
                    .await
                    .with_context(|| format!("Could not read the columns of `{table}`"))?;
                rows.iter()
                    .map(|row| helper.read_field(row))
                    .collect::<Result<Vec<_>>>()
            })
            .await?;
        Ok(Some(fields))
    }

    pub async fn metadata<E: Entity>(&mut self) -> Result<Arc<EntityMetadata>> {
        let provider = self.provider();
        let engine = self.engine;
        if let Some(metadata) = engine.resolver().get::<E>(&provider) {
            return Ok(metadata);
        }
        let table = MetadataResolver::table_of::<E>(engine.registry(), &provider)?;
        let db_fields = self.db_fields(&table).await?;
        engine
            .resolver()
            .resolve::<E>(engine.registry(), &provider, db_fields.as_deref())
    }

    pub async fn table_metadata(&mut self, table: &str) -> Result<Arc<EntityMetadata>> {
        let provider = self.provider();
        let engine = self.engine;
        if let Some(metadata) = engine.resolver().get_table(&provider, table) {
            return Ok(metadata);
        }
        let table_ref = MetadataResolver::table_named(engine.registry(), &provider, table)?;
        let db_fields = self.db_fields(&table_ref).await?;
        engine
            .resolver()
            .resolve_table(engine.registry(), &provider, table, db_fields.as_deref())
    }

    fn setting(&self, provider: &str) -> Result<Arc<dyn DbSetting>> {
        self.engine.registry().setting(provider)
    }

    fn command_text(&self, provider: &str, request: &CommandRequest) -> Result<Arc<str>> {
        let builder = self.engine.registry().builder(provider)?;
        self.engine
            .command_texts()
            .get_or_build_request(provider, request, builder.as_ref())
    }

    /// Compiled context of `request`. A context outliving its text (the text cache was flushed) is rebound to the
    /// current text, its closures are kept.
    fn execution_context<T: Bindable>(
        &self,
        provider: &str,
        request: &CommandRequest,
        metadata: &EntityMetadata,
    ) -> Result<Arc<ExecutionContext<T>>> {
        let text = self.command_text(provider, request)?;
        let key = ContextKey::new::<T>(provider, request);
        let contexts = self.engine.contexts();
        let context = contexts.get_or_build(&key, || {
            ExecutionContextFactory::create::<T>(request, metadata, text.clone())
        })?;
        if Arc::ptr_eq(&context.command_text, &text) {
            return Ok(context);
        }
        Ok(contexts.replace(&key, context.with_command_text(text)))
    }

    /// Translated filter, with columns in place of the properties and parameter names assigned.
    fn filter_group(
        metadata: &EntityMetadata,
        filter: QueryFilter,
        prefix: &str,
    ) -> Result<QueryGroup> {
        let mut group = translate(filter, metadata.primary.as_ref())?;
        metadata.map_filter(&mut group);
        group.assign_parameters(prefix);
        Ok(group)
    }

    /// Sends a statement binding no instance: reads, deletes, aggregates and truncates.
    async fn execute_request(
        &mut self,
        kind: CommandKind,
        metadata: &EntityMetadata,
        group: &QueryGroup,
        fields: &[Field],
        options: &QueryOptions,
        extra: Vec<Parameter>,
    ) -> Result<Option<Vec<QueryResult>>> {
        let provider = self.provider();
        let setting = self.setting(&provider)?;
        let order_by = metadata.map_order(&options.order_by);
        let mut request = CommandRequest::new(kind, &metadata.table, setting.as_ref());
        request.fields = fields;
        request.filter = Some(group);
        request.order_by = &order_by;
        request.top = options.top;
        request.hints = options.hints.as_deref();
        let text = self.command_text(&provider, &request)?;
        let mut parameters = group.parameters();
        parameters.extend(extra);
        self.send(kind, &metadata.table.to_string(), Command::new(text, parameters))
            .await
    }

    /// Sends `command` through the trace, `None` when the trace cancelled it quietly.
    async fn send(
        &mut self,
        kind: CommandKind,
        table: &str,
        command: Command,
    ) -> Result<Option<Vec<QueryResult>>> {
        let validator = self.engine.registry().validator(self.connection.provider());
        for parameter in &command.parameters {
            if let Err(error) = validator.validate(parameter) {
                log::error!(
                    "{kind} on `{table}` rejected parameter `{}`: {error:#}",
                    parameter.name
                );
                return Err(error.context(Error::InvalidValue {
                    kind,
                    table: table.to_string(),
                    parameter: parameter.name.clone(),
                }));
            }
        }
        let Some(trace) = self.engine.trace() else {
            return self
                .connection
                .run(command)
                .try_collect::<Vec<_>>()
                .await
                .with_context(|| Error::Execution {
                    kind,
                    table: table.to_string(),
                })
                .map(Some);
        };
        let mut before = CancellableTraceLog::new(kind, table, &command);
        trace.before_execution(&mut before);
        if before.is_cancelled() {
            log::debug!("{kind} on `{table}` cancelled by the trace");
            if before.throws() {
                return Err(Error::Cancelled {
                    kind,
                    table: table.to_string(),
                }
                .into());
            }
            return Ok(None);
        }
        let started = Instant::now();
        let result = self
            .connection
            .run(command.clone())
            .try_collect::<Vec<_>>()
            .await;
        let outcome = match &result {
            Ok(results) => TraceOutcome::of(results),
            Err(error) => TraceOutcome::Failed(format!("{error:#}")),
        };
        trace.after_execution(&ResultTraceLog {
            kind,
            table,
            command: &command,
            outcome,
            elapsed: started.elapsed(),
        });
        result
            .with_context(|| Error::Execution {
                kind,
                table: table.to_string(),
            })
            .map(Some)
    }
}

fn rows_of(results: Vec<QueryResult>) -> Vec<RowLabeled> {
    results
        .into_iter()
        .filter_map(|v| match v {
            QueryResult::Row(row) => Some(row),
            QueryResult::Affected(..) => None,
        })
        .collect()
}

fn affected_of(results: &[QueryResult]) -> u64 {
    let (rows, affected) = results.iter().fold((0, 0), |(rows, affected), v| match v {
        QueryResult::Row(..) => (rows + 1, affected),
        QueryResult::Affected(v) => (rows, affected + v.rows_affected),
    });
    if affected == 0 { rows } else { affected }
}
