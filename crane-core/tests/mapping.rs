#[cfg(test)]
mod tests {
    use crane_core::{
        AsValue, Bindable, Capabilities, ColumnDef, ColumnRef, DbField, DbSetting, Entity, EntityMetadata,
        Error, Field, GENERIC_PROVIDER, GenericDbHelper, GenericDbSetting,
        GenericStatementBuilder, Getter, MetadataResolver, Registry, Result, RowLabeled,
        RowReader, Setter, TableDef, Value,
    };
    use std::{
        sync::{Arc, LazyLock},
        thread,
    };

    macro_rules! entity {
        ($name:ident, $table:literal, [$(($field:ident: $ty:ty, $column:literal, $primary:literal, $identity:literal)),* $(,)?]) => {
            #[derive(Default, Debug, Clone, PartialEq)]
            struct $name {
                $($field: $ty,)*
            }
            impl Bindable for $name {
                fn getter(property: &str) -> Option<Getter<Self>> {
                    match property {
                        $(stringify!($field) => Some(Arc::new(|v: &Self| v.$field.clone().as_value())),)*
                        _ => None,
                    }
                }
                fn setter(property: &str) -> Option<Setter<Self>> {
                    match property {
                        $(stringify!($field) => Some(Arc::new(|v: &mut Self, value: Value| {
                            v.$field = AsValue::try_from_value(value)?;
                            Ok(())
                        })),)*
                        _ => None,
                    }
                }
            }
            impl Entity for $name {
                fn type_name() -> &'static str {
                    stringify!($name)
                }
                fn table_def() -> &'static TableDef {
                    static TABLE_DEF: TableDef = TableDef { name: $table, schema: "" };
                    &TABLE_DEF
                }
                fn columns() -> &'static [ColumnDef] {
                    static RESULT: LazyLock<Box<[ColumnDef]>> = LazyLock::new(|| {
                        vec![$(ColumnDef {
                            column_ref: ColumnRef { name: $column, property: stringify!($field) },
                            value: <$ty as AsValue>::as_empty_value(),
                            nullable: false,
                            primary_key: $primary,
                            identity: $identity,
                        }),*]
                        .into_boxed_slice()
                    });
                    &RESULT
                }
                fn from_row(row: RowLabeled, metadata: &EntityMetadata) -> Result<Self> {
                    let mut reader = RowReader::new(row, metadata);
                    Ok(Self {
                        $($field: reader.take(stringify!($field))?,)*
                    })
                }
            }
        };
    }

    entity!(Order, "", [
        (order_id: i64, "order_id", false, false),
        (label: String, "label", false, false),
        (notes: Option<String>, "notes", false, false),
    ]);
    entity!(Twin, "twins", [
        (left: i32, "left", true, false),
        (right: i32, "right", true, false),
    ]);
    entity!(Pair, "pairs", [
        (id: i64, "id", false, false),
        (pair_id: i64, "pair_id", false, false),
    ]);
    entity!(Note, "notes", [
        (key: i64, "note_key", false, false),
        (body: String, "body", false, false),
    ]);
    entity!(Ticket, "tickets", [
        (code: String, "code", true, false),
        (serial: i64, "serial", false, true),
    ]);

    struct SchemaSetting;

    impl DbSetting for SchemaSetting {
        fn default_schema(&self) -> Option<&str> {
            Some("dbo")
        }
        fn table_name(&self, type_name: &str) -> String {
            type_name.to_ascii_lowercase()
        }
    }

    fn is_mapping_error(result: Result<Arc<EntityMetadata>>) -> bool {
        matches!(
            result.unwrap_err().downcast_ref::<Error>(),
            Some(Error::Mapping(..))
        )
    }

    #[test]
    fn conventions() {
        let registry = Registry::with_generic();
        let resolver = MetadataResolver::new();
        let metadata = resolver.resolve::<Order>(&registry, GENERIC_PROVIDER, None).unwrap();
        assert_eq!(metadata.table.name, "Order");
        assert_eq!(metadata.table.schema, "");
        assert_eq!(
            metadata.fields(),
            Field::from_names(["order_id", "label", "notes"])
        );
        let primary = metadata.primary.as_ref().unwrap();
        assert_eq!(primary.name, "order_id");
        assert!(primary.is_primary);
        assert_eq!(primary.value, Value::Int64(None));
        assert!(metadata.identity.is_none());

        registry
            .register(
                "custom",
                Capabilities::new(
                    Arc::new(SchemaSetting),
                    Arc::new(GenericDbHelper),
                    Arc::new(GenericStatementBuilder),
                ),
                false,
            )
            .unwrap();
        let metadata = resolver.resolve::<Order>(&registry, "custom", None).unwrap();
        assert_eq!(metadata.table.to_string(), "dbo.order");
        let metadata = resolver.resolve::<Note>(&registry, "custom", None).unwrap();
        assert_eq!(metadata.table.to_string(), "dbo.notes");
    }

    #[test]
    fn annotations() {
        let registry = Registry::with_generic();
        let metadata = MetadataResolver::new()
            .resolve::<Ticket>(&registry, GENERIC_PROVIDER, None)
            .unwrap();
        assert_eq!(metadata.primary.as_ref().map(|v| v.name.as_str()), Some("code"));
        assert_eq!(metadata.identity.as_ref().map(|v| v.name.as_str()), Some("serial"));
        assert!(!metadata.primary.as_ref().unwrap().is_identity);
    }

    #[test]
    fn registry_overrides() {
        let registry = Registry::with_generic();
        registry.map_table::<Order>("sales.orders", false).unwrap();
        registry.map_column::<Order>("notes", "remarks", false).unwrap();
        registry.map_primary::<Order>("label", false).unwrap();
        registry.map_identity::<Order>("order_id", false).unwrap();
        let metadata = MetadataResolver::new()
            .resolve::<Order>(&registry, GENERIC_PROVIDER, None)
            .unwrap();
        assert_eq!(metadata.table.schema, "sales");
        assert_eq!(metadata.table.name, "orders");
        assert_eq!(
            metadata.fields(),
            Field::from_names(["order_id", "label", "remarks"])
        );
        assert_eq!(metadata.primary.as_ref().unwrap().name, "label");
        assert_eq!(metadata.identity.as_ref().unwrap().name, "order_id");

        assert_eq!(metadata.column_of("notes").unwrap().field.name(), "remarks");
        assert_eq!(metadata.column_of("NOTES").unwrap().field.name(), "remarks");
        assert_eq!(metadata.column_of("Remarks").unwrap().property, "notes");
        assert!(metadata.column_of("missing").is_none());
        assert_eq!(metadata.map_field(&Field::new("notes")).name(), "remarks");
        assert_eq!(metadata.map_field(&Field::new("unknown")).name(), "unknown");
        assert_eq!(
            metadata.property_of(&DbField::new("REMARKS")),
            Some("notes")
        );

        registry.map_primary::<Order>("missing", true).unwrap();
        assert!(is_mapping_error(
            MetadataResolver::new().resolve::<Order>(&registry, GENERIC_PROVIDER, None)
        ));

        registry.unmap::<Order>();
        let metadata = MetadataResolver::new()
            .resolve::<Order>(&registry, GENERIC_PROVIDER, None)
            .unwrap();
        assert_eq!(metadata.table.name, "Order");
        assert_eq!(metadata.primary.as_ref().unwrap().name, "order_id");
    }

    #[test]
    fn ambiguous_keys() {
        let registry = Registry::with_generic();
        let resolver = MetadataResolver::new();
        assert!(is_mapping_error(
            resolver.resolve::<Twin>(&registry, GENERIC_PROVIDER, None)
        ));
        assert!(is_mapping_error(
            resolver.resolve::<Pair>(&registry, GENERIC_PROVIDER, None)
        ));
        assert!(resolver.get::<Twin>(GENERIC_PROVIDER).is_none());

        registry.map_primary::<Pair>("pair_id", false).unwrap();
        let metadata = resolver.resolve::<Pair>(&registry, GENERIC_PROVIDER, None).unwrap();
        assert_eq!(metadata.primary.as_ref().unwrap().name, "pair_id");
    }

    #[test]
    fn reported_keys() {
        let registry = Registry::with_generic();
        let reported = [
            DbField::new("NOTE_KEY")
                .primary(true)
                .identity(true)
                .with_type(Value::Int64(None), Some("BIGINT".into())),
            DbField::new("body").nullable(true),
        ];
        let metadata = MetadataResolver::new()
            .resolve::<Note>(&registry, GENERIC_PROVIDER, Some(&reported[..]))
            .unwrap();
        let primary = metadata.primary.as_ref().unwrap();
        assert_eq!(primary.name, "note_key");
        assert!(primary.is_identity);
        assert_eq!(primary.database_type.as_deref(), Some("BIGINT"));
        assert_eq!(metadata.identity.as_ref().unwrap().name, "note_key");

        let metadata = MetadataResolver::new()
            .resolve::<Note>(&registry, GENERIC_PROVIDER, None)
            .unwrap();
        assert!(metadata.primary.is_none());

        let unmapped = [DbField::new("ghost").primary(true)];
        let metadata = MetadataResolver::new()
            .resolve::<Note>(&registry, GENERIC_PROVIDER, Some(&unmapped[..]))
            .unwrap();
        assert!(metadata.primary.is_none());

        let composite = [
            DbField::new("note_key").primary(true),
            DbField::new("body").primary(true),
        ];
        assert!(is_mapping_error(
            MetadataResolver::new().resolve::<Note>(&registry, GENERIC_PROVIDER, Some(&composite[..]))
        ));
    }

    #[test]
    fn memoized_until_flushed() {
        let registry = Registry::with_generic();
        let resolver = MetadataResolver::new();
        assert!(resolver.get::<Order>(GENERIC_PROVIDER).is_none());
        let first = resolver.resolve::<Order>(&registry, GENERIC_PROVIDER, None).unwrap();
        let second = resolver.resolve::<Order>(&registry, GENERIC_PROVIDER, None).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.stats().builds, 1);

        registry.map_table::<Order>("orders", false).unwrap();
        let cached = resolver.get::<Order>(GENERIC_PROVIDER).unwrap();
        assert_eq!(cached.table.name, "Order");

        resolver.flush();
        let fresh = resolver.resolve::<Order>(&registry, GENERIC_PROVIDER, None).unwrap();
        assert_eq!(fresh.table.name, "orders");
        assert_eq!(resolver.stats().builds, 2);
    }

    #[test]
    fn tables_by_name() {
        let registry = Registry::with_generic();
        let resolver = MetadataResolver::new();
        let reported = [
            DbField::new("id").primary(true).identity(true),
            DbField::new("name").nullable(true),
        ];
        let metadata = resolver
            .resolve_table(&registry, GENERIC_PROVIDER, "sales.orders", Some(&reported[..]))
            .unwrap();
        assert_eq!(metadata.table.schema, "sales");
        assert_eq!(metadata.fields(), Field::from_names(["id", "name"]));
        assert_eq!(metadata.primary.as_ref().unwrap().name, "id");
        assert!(metadata.columns[1].nullable);
        assert!(resolver.get_table(GENERIC_PROVIDER, "sales.orders").is_some());

        let unknown = resolver
            .resolve_table(&registry, GENERIC_PROVIDER, "audit", None)
            .unwrap();
        assert!(unknown.columns.is_empty());
        assert!(unknown.primary.is_none());
    }

    #[test]
    fn rows_follow_the_mapping() {
        let registry = Registry::with_generic();
        registry.map_column::<Order>("notes", "remarks", false).unwrap();
        let metadata = MetadataResolver::new()
            .resolve::<Order>(&registry, GENERIC_PROVIDER, None)
            .unwrap();
        let row = RowLabeled::new(
            Arc::from(vec!["ORDER_ID".to_string(), "label".into(), "remarks".into()]),
            vec![
                Value::Int32(Some(5)),
                Value::Varchar(Some("first".into())),
                Value::Varchar(None),
            ]
            .into_boxed_slice(),
        );
        assert_eq!(
            Order::from_row(row, &metadata).unwrap(),
            Order {
                order_id: 5,
                label: "first".into(),
                notes: None,
            }
        );

        let partial = RowLabeled::new(
            Arc::from(vec!["label".to_string()]),
            vec![Value::Varchar(Some("second".into()))].into_boxed_slice(),
        );
        assert!(Order::from_row(partial, &metadata).is_err());
    }

    #[test]
    fn registration_conflicts() {
        let registry = Registry::new();
        assert!(matches!(
            registry.setting("nope").err().unwrap().downcast_ref::<Error>(),
            Some(Error::UnsupportedProvider { .. })
        ));
        assert!(
            MetadataResolver::new()
                .resolve::<Order>(&registry, "nope", None)
                .is_err()
        );

        registry
            .add_setting("custom", Arc::new(GenericDbSetting), false)
            .unwrap();
        let error = registry
            .add_setting("custom", Arc::new(SchemaSetting), false)
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::AlreadyRegistered { .. })
        ));
        assert_eq!(registry.setting("custom").unwrap().default_schema(), None);
        registry
            .add_setting("custom", Arc::new(SchemaSetting), true)
            .unwrap();
        assert_eq!(
            registry.setting("custom").unwrap().default_schema(),
            Some("dbo")
        );

        registry.map_table::<Order>("orders", false).unwrap();
        assert!(registry.map_table::<Order>("orders_v2", false).is_err());
        assert_eq!(
            registry.table_of(std::any::TypeId::of::<Order>()).as_deref(),
            Some("orders")
        );
    }

    #[test]
    fn provider_registration_is_all_or_nothing() {
        let registry = Registry::with_generic();
        let schema = || {
            Capabilities::new(
                Arc::new(SchemaSetting),
                Arc::new(GenericDbHelper),
                Arc::new(GenericStatementBuilder),
            )
        };
        let error = registry
            .register(GENERIC_PROVIDER, schema(), false)
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::AlreadyRegistered { .. })
        ));
        assert_eq!(registry.setting(GENERIC_PROVIDER).unwrap().default_schema(), None);
        registry.register(GENERIC_PROVIDER, schema(), true).unwrap();
        assert_eq!(
            registry.setting(GENERIC_PROVIDER).unwrap().default_schema(),
            Some("dbo")
        );

        // One capability already present keeps the others out
        registry
            .add_builder("partial", Arc::new(GenericStatementBuilder), false)
            .unwrap();
        assert!(registry.register("partial", schema(), false).is_err());
        assert!(registry.setting("partial").is_err());
        assert!(registry.helper("partial").is_err());
        registry.register("partial", schema(), true).unwrap();
        assert!(registry.helper("partial").is_ok());

        let registry = Registry::new();
        let shared = &registry;
        let accepted = thread::scope(|s| {
            (0..8)
                .map(|_| s.spawn(move || shared.register("racy", schema(), false).is_ok()))
                .collect::<Vec<_>>()
                .into_iter()
                .map(|v| v.join())
                .filter(|v| matches!(v, Ok(true)))
                .count()
        });
        assert_eq!(accepted, 1);
    }

    #[test]
    fn concurrent_add_builder_has_single_winner() {
        let registry = Registry::new();
        let shared = &registry;
        let accepted = thread::scope(|s| {
            (0..8)
                .map(|_| {
                    s.spawn(move || {
                        shared
                            .add_builder("racy", Arc::new(GenericStatementBuilder), false)
                            .is_ok()
                    })
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(|v| v.join())
                .filter(|v| matches!(v, Ok(true)))
                .count()
        });
        assert_eq!(accepted, 1);
        assert!(registry.builder("racy").is_ok());
        assert!(registry.helper("racy").is_err());
    }
}
