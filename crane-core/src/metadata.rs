use crate::{
    CacheStats, DbField, DbSetting, Entity, Error, Field, FlightMap, OrderField, QueryGroup, Registry,
    Result, TableRef,
};
use std::{any::TypeId, borrow::Cow, sync::Arc};

/// One property bound to its column.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedColumn {
    pub field: Field,
    pub property: Cow<'static, str>,
    pub nullable: bool,
}

/// Resolved mapping of an entity type or of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMetadata {
    pub table: TableRef,
    /// Mapped columns in declaration order, empty for a table whose columns are unknown.
    pub columns: Vec<MappedColumn>,
    pub primary: Option<DbField>,
    pub identity: Option<DbField>,
}

impl EntityMetadata {
    pub fn fields(&self) -> Vec<Field> {
        self.columns.iter().map(|v| v.field.clone()).collect()
    }
    /// Column of a property, matched exactly first, ignoring case then, and finally against the column names.
    pub fn column_of(&self, property: &str) -> Option<&MappedColumn> {
        self.columns
            .iter()
            .find(|v| v.property == property)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|v| v.property.eq_ignore_ascii_case(property))
            })
            .or_else(|| self.columns.iter().find(|v| v.field.is(property)))
    }
    /// Column named `name`, case insensitive.
    pub fn column_named(&self, name: &str) -> Option<&MappedColumn> {
        self.columns.iter().find(|v| v.field.is(name))
    }
    /// Turns property names into column names, unknown names are kept.
    pub fn map_field(&self, field: &Field) -> Field {
        self.column_of(field.name())
            .map(|v| v.field.clone())
            .unwrap_or_else(|| field.clone())
    }
    pub fn map_fields(&self, fields: &[Field]) -> Vec<Field> {
        fields.iter().map(|v| self.map_field(v)).collect()
    }
    pub fn map_order(&self, order_by: &[OrderField]) -> Vec<OrderField> {
        order_by
            .iter()
            .map(|v| OrderField {
                field: self.map_field(&v.field),
                order: v.order,
            })
            .collect()
    }
    pub fn map_filter(&self, group: &mut QueryGroup) {
        if self.columns.is_empty() {
            return;
        }
        group.map_fields(|field| self.column_of(field.name()).map(|v| v.field.clone()));
    }
    /// Property holding the value of `key`.
    pub fn property_of(&self, key: &DbField) -> Option<&str> {
        self.column_named(&key.name).map(|v| v.property.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Target {
    Type(TypeId),
    Table(String),
}

/// Memoized resolution of entity and table mappings, per provider.
///
/// Precedence, from strongest to weakest:
/// - table: registry mapping, entity attribute, naming convention of the provider;
/// - column: registry mapping, field attribute, property name;
/// - primary key: registry mapping, single annotated field, field named `Id` or `{TypeName}Id` (case and underscores
///   ignored), database report;
/// - identity: registry mapping, single annotated field, database report.
///
/// Two candidates of the same rank are a [`Error::Mapping`], never a guess.
#[derive(Default)]
pub struct MetadataResolver {
    map: FlightMap<(String, Target), Arc<EntityMetadata>>,
}

impl MetadataResolver {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get<E: Entity>(&self, provider: &str) -> Option<Arc<EntityMetadata>> {
        self.map
            .get(&(provider.to_string(), Target::Type(TypeId::of::<E>())))
    }

    pub fn get_table(&self, provider: &str, table: &str) -> Option<Arc<EntityMetadata>> {
        self.map
            .get(&(provider.to_string(), Target::Table(table.to_string())))
    }

    /// Table of `E`, not memoized.
    pub fn table_of<E: Entity>(registry: &Registry, provider: &str) -> Result<TableRef> {
        let setting = registry.setting(provider)?;
        let def = E::table_def();
        let table = match registry.table_of(TypeId::of::<E>()) {
            Some(name) => parse_table(&name, setting.as_ref()),
            None if !def.name.is_empty() => TableRef::new(def.name),
            None => TableRef::new(setting.table_name(E::type_name())),
        };
        Ok(match table.schema.is_empty() {
            true if !def.schema.is_empty() => table.with_schema(def.schema),
            true => table.with_schema(setting.default_schema().unwrap_or_default()),
            false => table,
        })
    }

    /// Table called `name`, `schema.table` accepted.
    pub fn table_named(registry: &Registry, provider: &str, name: &str) -> Result<TableRef> {
        Ok(parse_table(name, registry.setting(provider)?.as_ref()))
    }

    pub fn resolve<E: Entity>(
        &self,
        registry: &Registry,
        provider: &str,
        db_fields: Option<&[DbField]>,
    ) -> Result<Arc<EntityMetadata>> {
        self.map.get_or_try_build(
            &(provider.to_string(), Target::Type(TypeId::of::<E>())),
            || resolve_entity::<E>(registry, provider, db_fields).map(Arc::new),
        )
    }

    /// Mapping of a table known by name. Columns and keys come from `db_fields`.
    pub fn resolve_table(
        &self,
        registry: &Registry,
        provider: &str,
        table: &str,
        db_fields: Option<&[DbField]>,
    ) -> Result<Arc<EntityMetadata>> {
        self.map.get_or_try_build(
            &(provider.to_string(), Target::Table(table.to_string())),
            || {
                let setting = registry.setting(provider)?;
                let table = parse_table(table, setting.as_ref());
                let db_fields = db_fields.unwrap_or_default();
                let columns = db_fields
                    .iter()
                    .map(|v| MappedColumn {
                        field: v.as_field(),
                        property: Cow::Owned(v.name.clone()),
                        nullable: v.is_nullable,
                    })
                    .collect();
                let primary = single(db_fields, |v| v.is_primary, "primary", &table)?.cloned();
                let identity = single(db_fields, |v| v.is_identity, "identity", &table)?.cloned();
                Ok(Arc::new(EntityMetadata {
                    table,
                    columns,
                    primary,
                    identity,
                }))
            },
        )
    }

    pub fn flush(&self) {
        self.map.flush();
    }

    pub fn stats(&self) -> CacheStats {
        self.map.stats()
    }
}

/// Equal ignoring case and underscores, `customer_id` is `CustomerId`.
fn same_name(a: &str, b: &str) -> bool {
    let normalized = |v: &str| {
        v.chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect::<String>()
    };
    normalized(a) == normalized(b)
}

/// `schema.table` or `table` with the default schema of the provider.
fn parse_table(name: &str, setting: &dyn DbSetting) -> TableRef {
    match name.split_once('.') {
        Some((schema, name)) => TableRef::new(name).with_schema(schema),
        None => TableRef::new(name).with_schema(setting.default_schema().unwrap_or_default()),
    }
}

fn single<'a>(
    db_fields: &'a [DbField],
    predicate: impl Fn(&DbField) -> bool,
    role: &str,
    table: &TableRef,
) -> Result<Option<&'a DbField>> {
    let mut found = db_fields.iter().filter(|v| predicate(v));
    let first = found.next();
    if let Some(second) = found.next() {
        return Err(Error::mapping(format!(
            "Table `{table}` reports several {role} columns (`{}`, `{}`), composite keys are not supported",
            first.map(|v| v.name.as_str()).unwrap_or_default(),
            second.name
        )));
    }
    Ok(first)
}

fn resolve_entity<E: Entity>(
    registry: &Registry,
    provider: &str,
    db_fields: Option<&[DbField]>,
) -> Result<EntityMetadata> {
    let type_id = TypeId::of::<E>();
    let type_name = E::type_name();
    let table = MetadataResolver::table_of::<E>(registry, provider)?;
    let defs = E::columns();
    let columns = defs
        .iter()
        .map(|def| MappedColumn {
            field: Field::typed(
                registry
                    .column_of(type_id, def.column_ref.property)
                    .map(Cow::Owned)
                    .unwrap_or(Cow::Borrowed(def.column_ref.name)),
                def.value.clone(),
            ),
            property: Cow::Borrowed(def.column_ref.property),
            nullable: def.nullable,
        })
        .collect::<Vec<_>>();
    let db_fields = db_fields.unwrap_or_default();
    let find_property = |property: &str, role: &str| {
        columns
            .iter()
            .position(|v| v.property == property)
            .ok_or_else(|| {
                Error::mapping(format!(
                    "The {role} key of `{type_name}` is mapped to `{property}`, which is not one of its properties"
                ))
            })
    };
    let reported = |role: &str, predicate: fn(&DbField) -> bool| -> Result<Option<usize>> {
        let Some(key) = single(db_fields, predicate, role, &table)? else {
            return Ok(None);
        };
        let position = columns.iter().position(|v| v.field.is(&key.name));
        if position.is_none() {
            log::warn!(
                "Table `{table}` reports `{}` as {role} key but `{type_name}` does not map it",
                key.name
            );
        }
        Ok(position)
    };
    let annotated = |role: &str, predicate: fn(&crate::ColumnDef) -> bool| -> Result<Option<usize>> {
        let found = defs
            .iter()
            .enumerate()
            .filter(|(_, v)| predicate(v))
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        match found.as_slice() {
            [] => Ok(None),
            [i] => Ok(Some(*i)),
            _ => Err(Error::mapping(format!(
                "`{type_name}` annotates several {role} keys: {}",
                found
                    .iter()
                    .map(|i| defs[*i].column_ref.property)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    };

    let primary = match registry.primary_of(type_id) {
        Some(property) => Some(find_property(&property, "primary")?),
        None => match annotated("primary", |v| v.primary_key)? {
            Some(i) => Some(i),
            None => {
                let conventional = format!("{type_name}Id");
                let candidates = columns
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| {
                        ["Id", conventional.as_str()].iter().any(|name| {
                            same_name(&v.property, name) || same_name(v.field.name(), name)
                        })
                    })
                    .map(|(i, _)| i)
                    .collect::<Vec<_>>();
                match candidates.as_slice() {
                    [] => reported("primary", |v| v.is_primary)?,
                    [i] => Some(*i),
                    _ => {
                        return Err(Error::mapping(format!(
                            "`{type_name}` has several primary key candidates by name: {}",
                            candidates
                                .iter()
                                .map(|i| columns[*i].property.as_ref())
                                .collect::<Vec<_>>()
                                .join(", ")
                        )));
                    }
                }
            }
        },
    };
    let identity = match registry.identity_of(type_id) {
        Some(property) => Some(find_property(&property, "identity")?),
        None => match annotated("identity", |v| v.identity)? {
            Some(i) => Some(i),
            None => reported("identity", |v| v.is_identity)?,
        },
    };

    let key = |i: usize| {
        let column = &columns[i];
        let reported = db_fields.iter().find(|v| column.field.is(&v.name));
        DbField {
            name: column.field.name().to_string(),
            is_primary: Some(i) == primary,
            is_identity: Some(i) == identity,
            is_nullable: reported.map(|v| v.is_nullable).unwrap_or(column.nullable),
            value: column.field.value().cloned().unwrap_or_default(),
            size: reported.and_then(|v| v.size),
            database_type: reported.and_then(|v| v.database_type.clone()),
        }
    };
    let primary_key = primary.map(key);
    let identity_key = identity.map(key);
    log::debug!(
        "Resolved `{type_name}` to `{table}` (primary {:?}, identity {:?})",
        primary_key.as_ref().map(|v| &v.name),
        identity_key.as_ref().map(|v| &v.name),
    );
    Ok(EntityMetadata {
        table,
        columns,
        primary: primary_key,
        identity: identity_key,
    })
}
