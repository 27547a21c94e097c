use crate::{
    Connection, Entity, EntityMetadata, Field, OrderField, Parameter, QueryFilter,
    QueryMultiple, QueryOptions, Record, Result, RowLabeled, Session, Value, WriteOptions,
};
use futures::executor::block_on;
use std::sync::Arc;

/// [`Session`] running each operation to completion on the calling thread.
///
/// Shares the caches of the engine with the async sessions. Must not be used from inside an async runtime worker.
pub struct BlockingSession<'s, C: Connection> {
    session: Session<'s, C>,
}

impl<'s, C: Connection> BlockingSession<'s, C> {
    pub fn new(session: Session<'s, C>) -> Self {
        Self { session }
    }

    pub fn session(&mut self) -> &mut Session<'s, C> {
        &mut self.session
    }

    pub fn into_inner(self) -> Session<'s, C> {
        self.session
    }

    pub fn metadata<E: Entity>(&mut self) -> Result<Arc<EntityMetadata>> {
        block_on(self.session.metadata::<E>())
    }

    pub fn query<E: Entity>(
        &mut self,
        filter: impl Into<QueryFilter>,
        options: QueryOptions,
    ) -> Result<Vec<E>> {
        block_on(self.session.query(filter, options))
    }
    pub fn query_all<E: Entity>(&mut self, options: QueryOptions) -> Result<Vec<E>> {
        block_on(self.session.query_all(options))
    }
    pub fn batch_query<E: Entity>(
        &mut self,
        page: u64,
        rows_per_batch: u64,
        order_by: impl IntoIterator<Item = OrderField>,
        filter: impl Into<QueryFilter>,
    ) -> Result<Vec<E>> {
        block_on(
            self.session
                .batch_query(page, rows_per_batch, order_by, filter),
        )
    }
    pub fn query_table(
        &mut self,
        table: &str,
        filter: impl Into<QueryFilter>,
        options: QueryOptions,
    ) -> Result<Vec<Record>> {
        block_on(self.session.query_table(table, filter, options))
    }
    pub fn query_cached<E: Entity>(
        &mut self,
        cache_key: &str,
        filter: impl Into<QueryFilter>,
        options: QueryOptions,
    ) -> Result<Arc<Vec<E>>> {
        block_on(self.session.query_cached(cache_key, filter, options))
    }
    pub fn query_multiple<Q: QueryMultiple>(&mut self, queries: Q) -> Result<Q::Output> {
        block_on(self.session.query_multiple(queries))
    }

    pub fn insert<E: Entity>(&mut self, entity: &mut E, options: WriteOptions) -> Result<Value> {
        block_on(self.session.insert(entity, options))
    }
    pub fn insert_all<E: Entity>(&mut self, entities: &mut [E], options: WriteOptions) -> Result<u64> {
        block_on(self.session.insert_all(entities, options))
    }
    pub fn insert_table(
        &mut self,
        table: &str,
        record: &mut Record,
        options: WriteOptions,
    ) -> Result<Value> {
        block_on(self.session.insert_table(table, record, options))
    }
    pub fn update<E: Entity>(
        &mut self,
        entity: &E,
        filter: impl Into<QueryFilter>,
        options: WriteOptions,
    ) -> Result<u64> {
        block_on(self.session.update(entity, filter, options))
    }
    pub fn update_all<E: Entity>(&mut self, entities: &[E], options: WriteOptions) -> Result<u64> {
        block_on(self.session.update_all(entities, options))
    }
    pub fn update_table(
        &mut self,
        table: &str,
        record: &Record,
        filter: impl Into<QueryFilter>,
        options: WriteOptions,
    ) -> Result<u64> {
        block_on(self.session.update_table(table, record, filter, options))
    }
    pub fn merge<E: Entity>(&mut self, entity: &mut E, options: WriteOptions) -> Result<Value> {
        block_on(self.session.merge(entity, options))
    }
    pub fn merge_all<E: Entity>(&mut self, entities: &mut [E], options: WriteOptions) -> Result<u64> {
        block_on(self.session.merge_all(entities, options))
    }
    pub fn merge_table(
        &mut self,
        table: &str,
        record: &mut Record,
        options: WriteOptions,
    ) -> Result<Value> {
        block_on(self.session.merge_table(table, record, options))
    }

    pub fn delete<E: Entity>(&mut self, filter: impl Into<QueryFilter>) -> Result<u64> {
        block_on(self.session.delete::<E>(filter))
    }
    pub fn delete_entity<E: Entity>(&mut self, entity: &E) -> Result<u64> {
        block_on(self.session.delete_entity(entity))
    }
    pub fn delete_all<E: Entity>(&mut self) -> Result<u64> {
        block_on(self.session.delete_all::<E>())
    }
    pub fn delete_table(&mut self, table: &str, filter: impl Into<QueryFilter>) -> Result<u64> {
        block_on(self.session.delete_table(table, filter))
    }

    pub fn count<E: Entity>(&mut self, filter: impl Into<QueryFilter>) -> Result<u64> {
        block_on(self.session.count::<E>(filter))
    }
    pub fn count_all<E: Entity>(&mut self) -> Result<u64> {
        block_on(self.session.count_all::<E>())
    }
    pub fn count_table(&mut self, table: &str, filter: impl Into<QueryFilter>) -> Result<u64> {
        block_on(self.session.count_table(table, filter))
    }
    pub fn average<E: Entity>(
        &mut self,
        field: impl Into<Field>,
        filter: impl Into<QueryFilter>,
    ) -> Result<Value> {
        block_on(self.session.average::<E>(field, filter))
    }
    pub fn average_all<E: Entity>(&mut self, field: impl Into<Field>) -> Result<Value> {
        block_on(self.session.average_all::<E>(field))
    }
    pub fn min<E: Entity>(
        &mut self,
        field: impl Into<Field>,
        filter: impl Into<QueryFilter>,
    ) -> Result<Value> {
        block_on(self.session.min::<E>(field, filter))
    }
    pub fn min_all<E: Entity>(&mut self, field: impl Into<Field>) -> Result<Value> {
        block_on(self.session.min_all::<E>(field))
    }
    pub fn max<E: Entity>(
        &mut self,
        field: impl Into<Field>,
        filter: impl Into<QueryFilter>,
    ) -> Result<Value> {
        block_on(self.session.max::<E>(field, filter))
    }
    pub fn max_all<E: Entity>(&mut self, field: impl Into<Field>) -> Result<Value> {
        block_on(self.session.max_all::<E>(field))
    }
    pub fn sum<E: Entity>(
        &mut self,
        field: impl Into<Field>,
        filter: impl Into<QueryFilter>,
    ) -> Result<Value> {
        block_on(self.session.sum::<E>(field, filter))
    }
    pub fn sum_all<E: Entity>(&mut self, field: impl Into<Field>) -> Result<Value> {
        block_on(self.session.sum_all::<E>(field))
    }
    pub fn exists<E: Entity>(&mut self, filter: impl Into<QueryFilter>) -> Result<bool> {
        block_on(self.session.exists::<E>(filter))
    }
    pub fn truncate<E: Entity>(&mut self) -> Result<u64> {
        block_on(self.session.truncate::<E>())
    }
    pub fn truncate_table(&mut self, table: &str) -> Result<u64> {
        block_on(self.session.truncate_table(table))
    }

    pub fn execute_non_query(
        &mut self,
        text: impl Into<Arc<str>>,
        parameters: Vec<Parameter>,
    ) -> Result<u64> {
        block_on(self.session.execute_non_query(text, parameters))
    }
    pub fn execute_query(
        &mut self,
        text: impl Into<Arc<str>>,
        parameters: Vec<Parameter>,
    ) -> Result<Vec<RowLabeled>> {
        block_on(self.session.execute_query(text, parameters))
    }
}
