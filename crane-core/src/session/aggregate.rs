use crate::{
    AsValue, Command, CommandKind, Connection, Entity, EntityMetadata, Field, QueryFilter,
    QueryGroup, QueryResult, Result, RowLabeled, Session, Value,
};
use std::sync::Arc;

impl<'s, C: Connection> Session<'s, C> {
    pub async fn count<E: Entity>(&mut self, filter: impl Into<QueryFilter>) -> Result<u64> {
        let metadata = self.metadata::<E>().await?;
        let value = self
            .scalar(CommandKind::Count, &metadata, &[], filter.into())
            .await?;
        count_of(value)
    }

    pub async fn count_all<E: Entity>(&mut self) -> Result<u64> {
        let metadata = self.metadata::<E>().await?;
        let value = self
            .scalar(CommandKind::CountAll, &metadata, &[], QueryFilter::None)
            .await?;
        count_of(value)
    }

    pub async fn count_table(
        &mut self,
        table: &str,
        filter: impl Into<QueryFilter>,
    ) -> Result<u64> {
        let metadata = self.table_metadata(table).await?;
        let value = self
            .scalar(CommandKind::Count, &metadata, &[], filter.into())
            .await?;
        count_of(value)
    }

    pub async fn average<E: Entity>(
        &mut self,
        field: impl Into<Field>,
        filter: impl Into<QueryFilter>,
    ) -> Result<Value> {
        self.aggregate::<E>(CommandKind::Average, field.into(), filter.into())
            .await
    }
    pub async fn average_all<E: Entity>(&mut self, field: impl Into<Field>) -> Result<Value> {
        self.aggregate::<E>(CommandKind::AverageAll, field.into(), QueryFilter::None)
            .await
    }
    pub async fn min<E: Entity>(
        &mut self,
        field: impl Into<Field>,
        filter: impl Into<QueryFilter>,
    ) -> Result<Value> {
        self.aggregate::<E>(CommandKind::Min, field.into(), filter.into())
            .await
    }
    pub async fn min_all<E: Entity>(&mut self, field: impl Into<Field>) -> Result<Value> {
        self.aggregate::<E>(CommandKind::MinAll, field.into(), QueryFilter::None)
            .await
    }
    pub async fn max<E: Entity>(
        &mut self,
        field: impl Into<Field>,
        filter: impl Into<QueryFilter>,
    ) -> Result<Value> {
        self.aggregate::<E>(CommandKind::Max, field.into(), filter.into())
            .await
    }
    pub async fn max_all<E: Entity>(&mut self, field: impl Into<Field>) -> Result<Value> {
        self.aggregate::<E>(CommandKind::MaxAll, field.into(), QueryFilter::None)
            .await
    }
    pub async fn sum<E: Entity>(
        &mut self,
        field: impl Into<Field>,
        filter: impl Into<QueryFilter>,
    ) -> Result<Value> {
        self.aggregate::<E>(CommandKind::Sum, field.into(), filter.into())
            .await
    }
    pub async fn sum_all<E: Entity>(&mut self, field: impl Into<Field>) -> Result<Value> {
        self.aggregate::<E>(CommandKind::SumAll, field.into(), QueryFilter::None)
            .await
    }

    /// Whether at least one row of `E` matches `filter`.
    pub async fn exists<E: Entity>(&mut self, filter: impl Into<QueryFilter>) -> Result<bool> {
        let metadata = self.metadata::<E>().await?;
        let group = Self::filter_group(&metadata, filter.into(), "")?;
        let results = self
            .execute_request(
                CommandKind::Exists,
                &metadata,
                &group,
                &[],
                &Default::default(),
                Vec::new(),
            )
            .await?;
        Ok(results.is_some_and(|v| v.iter().any(|v| matches!(v, QueryResult::Row(..)))))
    }

    /// Removes every row of the table of `E`.
    pub async fn truncate<E: Entity>(&mut self) -> Result<u64> {
        let metadata = self.metadata::<E>().await?;
        self.truncate_rows(&metadata).await
    }

    pub async fn truncate_table(&mut self, table: &str) -> Result<u64> {
        let metadata = self.table_metadata(table).await?;
        self.truncate_rows(&metadata).await
    }

    /// Sends a raw command, the text is not cached.
    pub async fn execute_non_query(
        &mut self,
        text: impl Into<Arc<str>>,
        parameters: Vec<crate::Parameter>,
    ) -> Result<u64> {
        let results = self
            .send(
                CommandKind::ExecuteNonQuery,
                "",
                Command::new(text, parameters),
            )
            .await?;
        Ok(results.map(|v| super::affected_of(&v)).unwrap_or_default())
    }

    /// Sends a raw command and returns its rows.
    pub async fn execute_query(
        &mut self,
        text: impl Into<Arc<str>>,
        parameters: Vec<crate::Parameter>,
    ) -> Result<Vec<RowLabeled>> {
        let results = self
            .send(CommandKind::ExecuteQuery, "", Command::new(text, parameters))
            .await?;
        Ok(results.map(super::rows_of).unwrap_or_default())
    }

    async fn aggregate<E: Entity>(
        &mut self,
        kind: CommandKind,
        field: Field,
        filter: QueryFilter,
    ) -> Result<Value> {
        let metadata = self.metadata::<E>().await?;
        let field = metadata.map_field(&field);
        self.scalar(kind, &metadata, &[field], filter).await
    }

    /// First column of the first row, `Null` when nothing came back.
    async fn scalar(
        &mut self,
        kind: CommandKind,
        metadata: &EntityMetadata,
        fields: &[Field],
        filter: QueryFilter,
    ) -> Result<Value> {
        let group = Self::filter_group(metadata, filter, "")?;
        let results = self
            .execute_request(kind, metadata, &group, fields, &Default::default(), Vec::new())
            .await?;
        Ok(results
            .map(super::rows_of)
            .and_then(|rows| rows.into_iter().next())
            .and_then(|row| row.values.into_vec().into_iter().next())
            .unwrap_or_default())
    }

    async fn truncate_rows(&mut self, metadata: &EntityMetadata) -> Result<u64> {
        let results = self
            .execute_request(
                CommandKind::Truncate,
                metadata,
                &QueryGroup::default(),
                &[],
                &Default::default(),
                Vec::new(),
            )
            .await?;
        Ok(results.map(|v| super::affected_of(&v)).unwrap_or_default())
    }
}

fn count_of(value: Value) -> Result<u64> {
    if value.is_null() {
        return Ok(0);
    }
    u64::try_from_value(value)
}
