use crate::{
    Bindable, Command, CommandKind, CommandRequest, Connection, DbField, DbSetting,
    Entity, EntityMetadata, Error, Field, QueryFilter, QueryGroup, Record, Result, Session,
    Value, WriteOptions,
};

/// Keys and count produced by a write.
#[derive(Default)]
struct Written {
    keys: Vec<Value>,
    affected: u64,
}

impl<'s, C: Connection> Session<'s, C> {
    /// Inserts `entity` and returns its key, the generated identity being also written back into `entity`.
    pub async fn insert<E: Entity>(&mut self, entity: &mut E, options: WriteOptions) -> Result<Value> {
        let metadata = self.metadata::<E>().await?;
        let fields = insert_fields(&metadata, &options, metadata.fields());
        let written = self
            .write_rows(
                CommandKind::Insert,
                &metadata,
                std::slice::from_mut(entity),
                fields,
                &options,
            )
            .await?;
        Ok(written.keys.into_iter().next().unwrap_or_default())
    }

    /// Inserts `entities` in batches, returns the number of rows inserted.
    pub async fn insert_all<E: Entity>(
        &mut self,
        entities: &mut [E],
        options: WriteOptions,
    ) -> Result<u64> {
        let metadata = self.metadata::<E>().await?;
        let fields = insert_fields(&metadata, &options, metadata.fields());
        self.write_rows(CommandKind::InsertAll, &metadata, entities, fields, &options)
            .await
            .map(|v| v.affected)
    }

    /// Inserts a record into a table known by name.
    pub async fn insert_table(
        &mut self,
        table: &str,
        record: &mut Record,
        options: WriteOptions,
    ) -> Result<Value> {
        let metadata = self.table_metadata(table).await?;
        let fields = insert_fields(&metadata, &options, record_fields(record));
        let written = self
            .write_rows(
                CommandKind::Insert,
                &metadata,
                std::slice::from_mut(record),
                fields,
                &options,
            )
            .await?;
        Ok(written.keys.into_iter().next().unwrap_or_default())
    }

    /// Inserts `entity` or updates the row sharing its qualifiers.
    pub async fn merge<E: Entity>(&mut self, entity: &mut E, options: WriteOptions) -> Result<Value> {
        let metadata = self.metadata::<E>().await?;
        let qualifiers = qualifiers(&metadata, &options)?;
        let fields = merge_fields(&metadata, &options, &qualifiers, metadata.fields());
        let written = self
            .write_rows(
                CommandKind::Merge,
                &metadata,
                std::slice::from_mut(entity),
                fields,
                &WriteOptions {
                    qualifiers,
                    ..options
                },
            )
            .await?;
        Ok(written.keys.into_iter().next().unwrap_or_default())
    }

    pub async fn merge_all<E: Entity>(
        &mut self,
        entities: &mut [E],
        options: WriteOptions,
    ) -> Result<u64> {
        let metadata = self.metadata::<E>().await?;
        let qualifiers = qualifiers(&metadata, &options)?;
        let fields = merge_fields(&metadata, &options, &qualifiers, metadata.fields());
        self.write_rows(
            CommandKind::MergeAll,
            &metadata,
            entities,
            fields,
            &WriteOptions {
                qualifiers,
                ..options
            },
        )
        .await
        .map(|v| v.affected)
    }

    pub async fn merge_table(
        &mut self,
        table: &str,
        record: &mut Record,
        options: WriteOptions,
    ) -> Result<Value> {
        let metadata = self.table_metadata(table).await?;
        let qualifiers = qualifiers(&metadata, &options)?;
        let fields = merge_fields(&metadata, &options, &qualifiers, record_fields(record));
        let written = self
            .write_rows(
                CommandKind::Merge,
                &metadata,
                std::slice::from_mut(record),
                fields,
                &WriteOptions {
                    qualifiers,
                    ..options
                },
            )
            .await?;
        Ok(written.keys.into_iter().next().unwrap_or_default())
    }

    /// Updates the rows matching `filter` with the values of `entity`. Without a filter the row is matched by the
    /// qualifiers (the primary key by default).
    pub async fn update<E: Entity>(
        &mut self,
        entity: &E,
        filter: impl Into<QueryFilter>,
        options: WriteOptions,
    ) -> Result<u64> {
        let metadata = self.metadata::<E>().await?;
        let fields = metadata.fields();
        self.update_rows(
            CommandKind::Update,
            &metadata,
            std::slice::from_ref(entity),
            fields,
            filter.into(),
            options,
        )
        .await
    }

    /// Updates every entity, each row matched by the qualifiers.
    pub async fn update_all<E: Entity>(
        &mut self,
        entities: &[E],
        options: WriteOptions,
    ) -> Result<u64> {
        let metadata = self.metadata::<E>().await?;
        let fields = metadata.fields();
        self.update_rows(
            CommandKind::UpdateAll,
            &metadata,
            entities,
            fields,
            QueryFilter::None,
            options,
        )
        .await
    }

    pub async fn update_table(
        &mut self,
        table: &str,
        record: &Record,
        filter: impl Into<QueryFilter>,
        options: WriteOptions,
    ) -> Result<u64> {
        let metadata = self.table_metadata(table).await?;
        let fields = record_fields(record);
        self.update_rows(
            CommandKind::Update,
            &metadata,
            std::slice::from_ref(record),
            fields,
            filter.into(),
            options,
        )
        .await
    }

    async fn write_rows<T: Bindable>(
        &mut self,
        kind: CommandKind,
        metadata: &EntityMetadata,
        items: &mut [T],
        fields: Vec<Field>,
        options: &WriteOptions,
    ) -> Result<Written> {
        let provider = self.provider();
        let setting = self.setting(&provider)?;
        let merge = matches!(kind, CommandKind::Merge | CommandKind::MergeAll);
        let returning = if merge {
            metadata.identity.as_ref().or(metadata.primary.as_ref())
        } else {
            metadata.identity.as_ref()
        };
        let batch = match kind.is_batched() {
            true => self.batch_size(setting.as_ref(), options.batch_size, fields.len(), false),
            false => 1,
        };
        let table = metadata.table.to_string();
        let mut written = Written::default();
        for chunk in items.chunks_mut(batch) {
            let mut request = CommandRequest::new(kind, &metadata.table, setting.as_ref());
            request.fields = &fields;
            request.qualifiers = &options.qualifiers;
            request.primary = metadata.primary.as_ref();
            request.identity = metadata.identity.as_ref();
            request.hints = options.hints.as_deref();
            request.batch_size = chunk.len();
            let context = self.execution_context::<T>(&provider, &request, metadata)?;
            let command = Command::new(context.command_text.clone(), context.parameters(chunk.iter()));
            let Some(results) = self.send(kind, &table, command).await? else {
                continue;
            };
            written.affected += super::affected_of(&results);
            let rows = super::rows_of(results);
            match returning {
                Some(key) if context.has_writeback() => {
                    if rows.len() != chunk.len() {
                        log::warn!(
                            "{kind} on `{table}` returned {} keys for {} rows",
                            rows.len(),
                            chunk.len()
                        );
                    }
                    for (item, row) in chunk.iter_mut().zip(rows) {
                        let value = row
                            .get_column(&key.name)
                            .or(row.values().first())
                            .cloned()
                            .unwrap_or_default();
                        context.writeback(item, value.clone())?;
                        written.keys.push(value);
                    }
                }
                _ => written
                    .keys
                    .extend(chunk.iter().map(|v| key_value(metadata, v))),
            }
        }
        Ok(written)
    }

    async fn update_rows<T: Bindable>(
        &mut self,
        kind: CommandKind,
        metadata: &EntityMetadata,
        items: &[T],
        fields: Vec<Field>,
        filter: QueryFilter,
        options: WriteOptions,
    ) -> Result<u64> {
        let provider = self.provider();
        let setting = self.setting(&provider)?;
        let (qualifiers, group) = match filter {
            QueryFilter::None => (qualifiers(metadata, &options)?, QueryGroup::default()),
            filter => (Vec::new(), Self::filter_group(metadata, filter, "_")?),
        };
        let fields = if options.fields.is_empty() {
            fields
                .into_iter()
                .map(|v| metadata.map_field(&v))
                .filter(|v| !is_key(metadata, v) && !qualifiers.contains(v))
                .collect()
        } else {
            metadata.map_fields(&options.fields)
        };
        let batch = match kind.is_batched() {
            true => self.batch_size(
                setting.as_ref(),
                options.batch_size,
                fields.len() + qualifiers.len(),
                true,
            ),
            false => 1,
        };
        let table = metadata.table.to_string();
        let mut affected = 0;
        for chunk in items.chunks(batch) {
            let mut request = CommandRequest::new(kind, &metadata.table, setting.as_ref());
            request.fields = &fields;
            request.qualifiers = &qualifiers;
            request.primary = metadata.primary.as_ref();
            request.identity = metadata.identity.as_ref();
            request.filter = Some(&group);
            request.hints = options.hints.as_deref();
            request.batch_size = chunk.len();
            let context = self.execution_context::<T>(&provider, &request, metadata)?;
            let mut parameters = context.parameters(chunk.iter());
            parameters.extend(group.parameters());
            let command = Command::new(context.command_text.clone(), parameters);
            if let Some(results) = self.send(kind, &table, command).await? {
                affected += super::affected_of(&results);
            }
        }
        Ok(affected)
    }

    /// Rows per statement: the requested size, capped by the parameters a command can bind. Batched statements are
    /// sent one at a time to providers not accepting several statements per command.
    fn batch_size(
        &self,
        setting: &dyn DbSetting,
        requested: Option<usize>,
        parameters_per_row: usize,
        statements: bool,
    ) -> usize {
        if statements && !setting.supports_multiple_statements() {
            return 1;
        }
        let batch = requested.unwrap_or(self.engine.options().batch_size).max(1);
        match parameters_per_row {
            0 => batch,
            n => batch.min((setting.max_parameters() / n).max(1)),
        }
    }
}

/// Row matching columns: the explicit qualifiers, or the primary key.
fn qualifiers(metadata: &EntityMetadata, options: &WriteOptions) -> Result<Vec<Field>> {
    if !options.qualifiers.is_empty() {
        return Ok(metadata.map_fields(&options.qualifiers));
    }
    match &metadata.primary {
        Some(primary) => Ok(vec![primary.as_field()]),
        None => Err(Error::mapping(format!(
            "`{}` has no primary key, qualifier fields are required",
            metadata.table
        ))),
    }
}

fn is_key(metadata: &EntityMetadata, field: &Field) -> bool {
    [&metadata.primary, &metadata.identity]
        .into_iter()
        .flatten()
        .any(|key| field.is(&key.name))
}

fn is_identity(metadata: &EntityMetadata, field: &Field) -> bool {
    metadata
        .identity
        .as_ref()
        .is_some_and(|identity| field.is(&identity.name))
}

/// Explicit fields, or the defaults without the identity.
fn insert_fields(metadata: &EntityMetadata, options: &WriteOptions, defaults: Vec<Field>) -> Vec<Field> {
    if !options.fields.is_empty() {
        return metadata.map_fields(&options.fields);
    }
    defaults
        .into_iter()
        .map(|v| metadata.map_field(&v))
        .filter(|v| !is_identity(metadata, v))
        .collect()
}

/// As [`insert_fields`], the identity staying when it qualifies the row.
fn merge_fields(
    metadata: &EntityMetadata,
    options: &WriteOptions,
    qualifiers: &[Field],
    defaults: Vec<Field>,
) -> Vec<Field> {
    if !options.fields.is_empty() {
        return metadata.map_fields(&options.fields);
    }
    defaults
        .into_iter()
        .map(|v| metadata.map_field(&v))
        .filter(|v| !is_identity(metadata, v) || qualifiers.contains(v))
        .collect()
}

fn record_fields(record: &Record) -> Vec<Field> {
    record.names().map(|v| Field::new(v.to_string())).collect()
}

/// Primary key value of an item, `Null` when there is none.
fn key_value<T: Bindable>(metadata: &EntityMetadata, item: &T) -> Value {
    metadata
        .primary
        .as_ref()
        .and_then(|key: &DbField| T::getter(metadata.property_of(key).unwrap_or(&key.name)))
        .map(|getter| getter(item))
        .unwrap_or_default()
}

impl<'s, C: Connection> Session<'s, C> {
    /// Deletes the row of `entity`, matched by its primary key.
    pub async fn delete_entity<E: Entity>(&mut self, entity: &E) -> Result<u64> {
        let metadata = self.metadata::<E>().await?;
        if metadata.primary.is_none() {
            return Err(Error::mapping(format!(
                "`{}` has no primary key, delete it through a filter",
                E::type_name()
            )));
        }
        let key = key_value(&metadata, entity);
        self.delete_rows(CommandKind::Delete, &metadata, QueryFilter::Key(key))
            .await
    }

    pub async fn delete<E: Entity>(&mut self, filter: impl Into<QueryFilter>) -> Result<u64> {
        let metadata = self.metadata::<E>().await?;
        self.delete_rows(CommandKind::Delete, &metadata, filter.into())
            .await
    }

    pub async fn delete_all<E: Entity>(&mut self) -> Result<u64> {
        let metadata = self.metadata::<E>().await?;
        self.delete_rows(CommandKind::DeleteAll, &metadata, QueryFilter::None)
            .await
    }

    pub async fn delete_table(
        &mut self,
        table: &str,
        filter: impl Into<QueryFilter>,
    ) -> Result<u64> {
        let metadata = self.table_metadata(table).await?;
        self.delete_rows(CommandKind::Delete, &metadata, filter.into())
            .await
    }

    async fn delete_rows(
        &mut self,
        kind: CommandKind,
        metadata: &EntityMetadata,
        filter: QueryFilter,
    ) -> Result<u64> {
        let group = Self::filter_group(metadata, filter, "")?;
        let results = self
            .execute_request(kind, metadata, &group, &[], &Default::default(), Vec::new())
            .await?;
        Ok(results.map(|v| super::affected_of(&v)).unwrap_or_default())
    }
}

