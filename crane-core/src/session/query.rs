use crate::{
    CommandKind, Connection, Entity, EntityMetadata, OrderField, Parameter, QueryFilter,
    QueryOptions, Record, Result, RowLabeled, Session,
};
use std::sync::Arc;

impl<'s, C: Connection> Session<'s, C> {
    /// Rows of `E` matching `filter`.
    pub async fn query<E: Entity>(
        &mut self,
        filter: impl Into<QueryFilter>,
        options: QueryOptions,
    ) -> Result<Vec<E>> {
        let metadata = self.metadata::<E>().await?;
        let rows = self
            .select(CommandKind::Query, &metadata, filter.into(), &options, Vec::new())
            .await?;
        rows.into_iter()
            .map(|row| E::from_row(row, &metadata))
            .collect()
    }

    pub async fn query_all<E: Entity>(&mut self, options: QueryOptions) -> Result<Vec<E>> {
        let metadata = self.metadata::<E>().await?;
        let rows = self
            .select(
                CommandKind::QueryAll,
                &metadata,
                QueryFilter::None,
                &options,
                Vec::new(),
            )
            .await?;
        rows.into_iter()
            .map(|row| E::from_row(row, &metadata))
            .collect()
    }

    /// Page `page` (zero based) of `rows_per_batch` rows. The ordering is required to make pages stable.
    pub async fn batch_query<E: Entity>(
        &mut self,
        page: u64,
        rows_per_batch: u64,
        order_by: impl IntoIterator<Item = OrderField>,
        filter: impl Into<QueryFilter>,
    ) -> Result<Vec<E>> {
        let metadata = self.metadata::<E>().await?;
        let options = QueryOptions::new().order_by(order_by);
        let paging = vec![
            Parameter::new("_limit", rows_per_batch),
            Parameter::new("_offset", page.saturating_mul(rows_per_batch)),
        ];
        let rows = self
            .select(
                CommandKind::BatchQuery,
                &metadata,
                filter.into(),
                &options,
                paging,
            )
            .await?;
        rows.into_iter()
            .map(|row| E::from_row(row, &metadata))
            .collect()
    }

    /// Rows of a table known by name only.
    pub async fn query_table(
        &mut self,
        table: &str,
        filter: impl Into<QueryFilter>,
        options: QueryOptions,
    ) -> Result<Vec<Record>> {
        let metadata = self.table_metadata(table).await?;
        let rows = self
            .select(CommandKind::Query, &metadata, filter.into(), &options, Vec::new())
            .await?;
        Ok(rows.into_iter().map(Record::from).collect())
    }

    /// [`Session::query`] through the result cache of the engine: a live item stored under `cache_key` is returned
    /// without touching the connection, otherwise the rows are read and stored.
    pub async fn query_cached<E: Entity>(
        &mut self,
        cache_key: &str,
        filter: impl Into<QueryFilter>,
        options: QueryOptions,
    ) -> Result<Arc<Vec<E>>> {
        let engine = self.engine;
        if let Some(item) = engine.cache().and_then(|v| v.get(cache_key)) {
            match item.downcast::<Vec<E>>() {
                Ok(rows) => return Ok(rows),
                Err(..) => log::warn!(
                    "Cached item `{cache_key}` is not a list of `{}`, reading it again",
                    E::type_name()
                ),
            }
        }
        let rows = Arc::new(self.query::<E>(filter, options).await?);
        if let Some(cache) = engine.cache() {
            cache.add(
                cache_key,
                rows.clone(),
                engine.options().cache_expiration_minutes,
                false,
            )?;
        }
        Ok(rows)
    }

    async fn select(
        &mut self,
        kind: CommandKind,
        metadata: &EntityMetadata,
        filter: QueryFilter,
        options: &QueryOptions,
        paging: Vec<Parameter>,
    ) -> Result<Vec<RowLabeled>> {
        let group = Self::filter_group(metadata, filter, "")?;
        let fields = if options.fields.is_empty() {
            metadata.fields()
        } else {
            metadata.map_fields(&options.fields)
        };
        let results = self
            .execute_request(kind, metadata, &group, &fields, options, paging)
            .await?;
        Ok(results.map(super::rows_of).unwrap_or_default())
    }
}
