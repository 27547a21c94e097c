#[cfg(test)]
mod tests {
    use crane_core::{
        Bindable, CommandKind, CommandRequest, CommandTextCache, ContextKey, DbField, DbFieldCache,
        EntityMetadata, ExecutionContextCache, ExecutionContextFactory, Field, GenericDbSetting,
        GenericStatementBuilder, Getter, MemoryCache, Record, ResultCache, Setter, StatementBuilder,
        TableRef,
        Value,
    };
    use std::{
        sync::{
            Arc, Barrier,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::Duration,
    };

    const SETTING: GenericDbSetting = GenericDbSetting;

    fn metadata(table: &TableRef) -> EntityMetadata {
        EntityMetadata {
            table: table.clone(),
            columns: Vec::new(),
            primary: None,
            identity: None,
        }
    }

    #[test]
    fn command_text_is_built_once() {
        let cache = CommandTextCache::new();
        let table = TableRef::new("customers");
        let fields = Field::from_names(["id", "name"]);
        let request = CommandRequest {
            fields: &fields,
            ..CommandRequest::new(CommandKind::QueryAll, &table, &SETTING)
        };
        let first = cache
            .get_or_build_request("generic", &request, &GenericStatementBuilder)
            .unwrap();
        let second = cache
            .get_or_build_request("generic", &request, &GenericStatementBuilder)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(&*first, "SELECT \"id\", \"name\"\nFROM \"customers\";");
        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.builds, 1);
        assert!(stats.hits >= 1);

        // Other provider, other entry
        cache
            .get_or_build_request("other", &request, &GenericStatementBuilder)
            .unwrap();
        assert_eq!(cache.stats().entries, 2);

        cache.flush();
        assert_eq!(cache.stats().entries, 0);
        assert!(cache.get(&request.key("generic")).is_none());
        let rebuilt = cache
            .get_or_build_request("generic", &request, &GenericStatementBuilder)
            .unwrap();
        assert_eq!(rebuilt, first);
        assert_eq!(cache.stats().builds, 3);
    }

    #[test]
    fn concurrent_misses_share_one_build() {
        let cache = CommandTextCache::new();
        let table = TableRef::new("customers");
        let key = CommandRequest::new(CommandKind::CountAll, &table, &SETTING).key("generic");
        let counter = AtomicUsize::new(0);
        let barrier = Barrier::new(8);
        let (cache, key, builds, barrier) = (&cache, &key, &counter, &barrier);
        let texts = thread::scope(|s| {
            let handles = (0..8)
                .map(|_| {
                    s.spawn(move || {
                        barrier.wait();
                        cache
                            .get_or_build(key, || {
                                builds.fetch_add(1, Ordering::SeqCst);
                                thread::sleep(Duration::from_millis(50));
                                Ok("SELECT COUNT(*) FROM customers;".to_string())
                            })
                            .unwrap()
                    })
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|v| v.join().unwrap())
                .collect::<Vec<_>>()
        });
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(texts.iter().all(|v| Arc::ptr_eq(v, &texts[0])));
    }

    #[test]
    fn flush_discards_builds_in_progress() {
        let cache = CommandTextCache::new();
        let table = TableRef::new("customers");
        let key = CommandRequest::new(CommandKind::CountAll, &table, &SETTING).key("generic");
        let (started, resume) = (Barrier::new(2), Barrier::new(2));
        let (cache, key, started, resume) = (&cache, &key, &started, &resume);
        let text = thread::scope(|s| {
            let handle = s.spawn(move || {
                cache.get_or_build(key, || {
                    started.wait();
                    resume.wait();
                    Ok("SELECT COUNT(*) FROM old_customers;".to_string())
                })
            });
            started.wait();
            cache.flush();
            resume.wait();
            handle.join().unwrap()
        })
        .unwrap();
        assert_eq!(&*text, "SELECT COUNT(*) FROM old_customers;");
        assert_eq!(cache.stats().entries, 0);
        assert!(cache.get(key).is_none());
        let text = cache
            .get_or_build(key, || Ok("SELECT COUNT(*) FROM customers;".into()))
            .unwrap();
        assert_eq!(&*text, "SELECT COUNT(*) FROM customers;");
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn failed_builds_are_not_stored() {
        let cache = CommandTextCache::new();
        let table = TableRef::new("customers");
        let key = CommandRequest::new(CommandKind::Truncate, &table, &SETTING).key("generic");
        assert!(
            cache
                .get_or_build(&key, || Err(anyhow::anyhow!("no text")))
                .is_err()
        );
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.stats().builds, 0);
        let text = cache
            .get_or_build(&key, || Ok("TRUNCATE TABLE customers;".into()))
            .unwrap();
        assert_eq!(&*text, "TRUNCATE TABLE customers;");
    }

    #[test]
    fn builder_errors_name_the_statement() {
        let cache = CommandTextCache::new();
        let table = TableRef::new("customers");
        let request = CommandRequest::new(CommandKind::BatchQuery, &table, &SETTING);
        let error = cache
            .get_or_build_request("generic", &request, &GenericStatementBuilder)
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<crane_core::Error>(),
            Some(crane_core::Error::Builder {
                kind: CommandKind::BatchQuery,
                ..
            })
        ));
        assert_eq!(cache.stats().entries, 0);
    }

    struct Opaque;

    impl Bindable for Opaque {
        fn getter(_property: &str) -> Option<Getter<Self>> {
            None
        }
        fn setter(_property: &str) -> Option<Setter<Self>> {
            None
        }
    }

    #[test]
    fn execution_contexts() {
        let cache = ExecutionContextCache::new();
        let table = TableRef::new("customers");
        let fields = Field::from_names(["name", "age"]);
        let identity = DbField::new("id").identity(true);
        let request = CommandRequest {
            fields: &fields,
            identity: Some(&identity),
            batch_size: 2,
            ..CommandRequest::new(CommandKind::InsertAll, &table, &SETTING)
        };
        let metadata = metadata(&table);
        let key = ContextKey::new::<Record>("generic", &request);
        let compiled = AtomicUsize::new(0);
        let build = || {
            compiled.fetch_add(1, Ordering::SeqCst);
            ExecutionContextFactory::create::<Record>(&request, &metadata, Arc::from("INSERT"))
        };
        let context = cache.get_or_build(&key, build).unwrap();
        let again = cache.get_or_build(&key, build).unwrap();
        assert!(Arc::ptr_eq(&context, &again));
        assert_eq!(compiled.load(Ordering::SeqCst), 1);
        assert!(context.has_writeback());

        let rows = [
            Record::new().with("name", "Ann").with("age", 31),
            Record::new().with("name", "Bob").with("age", 42),
        ];
        let parameters = context.parameters(&rows);
        assert_eq!(
            parameters.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            ["name", "age", "name_1", "age_1"]
        );
        assert_eq!(parameters[3].value, Value::Int32(Some(42)));

        let mut row = rows[0].clone();
        context.writeback(&mut row, Value::Int64(Some(7))).unwrap();
        assert_eq!(row.get("ID"), Some(&Value::Int64(Some(7))));

        // Same shape bound to another type is refused
        assert!(cache.get::<Opaque>(&key).is_err());
        assert!(
            ExecutionContextFactory::create::<Opaque>(&request, &metadata, Arc::from("INSERT"))
                .is_err()
        );

        // Replacing keeps the compiled bindings
        let replaced = cache.replace(&key, context.with_command_text(Arc::from("INSERT AGAIN")));
        assert_eq!(&*replaced.command_text, "INSERT AGAIN");
        assert_eq!(replaced.bindings().len(), 2);
        assert_eq!(cache.stats().builds, 1);

        cache.flush();
        assert!(cache.get::<Record>(&key).unwrap().is_none());
    }

    #[test]
    fn row_parameters_match_the_text() {
        let table = TableRef::new("customers");
        let fields = Field::from_names(["a", "a_1"]);
        let request = CommandRequest {
            fields: &fields,
            batch_size: 2,
            ..CommandRequest::new(CommandKind::InsertAll, &table, &SETTING)
        };
        let text = GenericStatementBuilder.build(&request).unwrap();
        let context =
            ExecutionContextFactory::create::<Record>(&request, &metadata(&table), Arc::from(text.as_str()))
                .unwrap();
        let rows = [
            Record::new().with("a", 1).with("a_1", 2),
            Record::new().with("a", 3).with("a_1", 4),
        ];
        let parameters = context.parameters(&rows);
        assert_eq!(
            parameters
                .iter()
                .map(|v| (v.name.as_str(), v.value.clone()))
                .collect::<Vec<_>>(),
            [
                ("a", Value::Int32(Some(1))),
                ("a_1", Value::Int32(Some(2))),
                ("a_1_1", Value::Int32(Some(3))),
                ("a_1_1_1", Value::Int32(Some(4))),
            ]
        );
        for parameter in &parameters {
            assert!(text.contains(&format!("@{}", parameter.name)));
        }
    }

    #[test]
    fn update_contexts_bind_qualifiers_last() {
        let table = TableRef::new("customers");
        let fields = Field::from_names(["name"]);
        let qualifiers = Field::from_names(["id"]);
        let request = CommandRequest {
            fields: &fields,
            qualifiers: &qualifiers,
            batch_size: 1,
            ..CommandRequest::new(CommandKind::Update, &table, &SETTING)
        };
        let context =
            ExecutionContextFactory::create::<Record>(&request, &metadata(&table), Arc::from("UPDATE"))
                .unwrap();
        assert!(!context.has_writeback());
        let parameters = context.parameters([&Record::new().with("id", 3_i64).with("name", "Ann")]);
        assert_eq!(
            parameters
                .iter()
                .map(|v| (v.name.as_str(), v.value.clone()))
                .collect::<Vec<_>>(),
            [
                ("name", Value::Varchar(Some("Ann".into()))),
                ("_id", Value::Int64(Some(3))),
            ]
        );

        let query = CommandRequest::new(CommandKind::Query, &table, &SETTING);
        assert!(
            ExecutionContextFactory::create::<Record>(&query, &metadata(&table), Arc::from("SELECT"))
                .is_err()
        );
    }

    #[tokio::test]
    async fn db_fields_are_fetched_once() {
        let cache = DbFieldCache::new();
        let counter = AtomicUsize::new(0);
        let fetches = &counter;
        let fetch = move || async move {
            fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(vec![DbField::new("id").primary(true), DbField::new("name")])
        };
        let (a, b) = tokio::join!(
            cache.get_or_fetch("generic", "customers", fetch),
            cache.get_or_fetch("generic", "customers", fetch),
        );
        assert_eq!(a.unwrap().len(), 2);
        assert_eq!(b.unwrap().len(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(cache.get("generic", "customers").is_some());
        assert!(cache.get("generic", "orders").is_none());

        let failed = cache
            .get_or_fetch("generic", "orders", || async { Err(anyhow::anyhow!("gone")) })
            .await;
        assert!(failed.is_err());
        assert!(cache.get("generic", "orders").is_none());

        cache.flush();
        assert!(cache.get("generic", "customers").is_none());
    }

    #[test]
    fn memory_cache() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty());
        cache.add("answer", Arc::new(42_i32), 10, false).unwrap();
        let item = cache.get("answer").unwrap();
        assert_eq!(item.downcast_ref::<i32>(), Some(&42));
        assert!(cache.add("answer", Arc::new(43_i32), 10, true).is_err());
        cache.add("answer", Arc::new(43_i32), 10, false).unwrap();
        assert_eq!(
            cache.get("answer").unwrap().downcast_ref::<i32>(),
            Some(&43)
        );
        assert_eq!(cache.len(), 1);

        cache.add("gone", Arc::new("soon"), 0, false).unwrap();
        assert!(cache.get("gone").is_none());
        cache.add("gone", Arc::new("again"), 0, true).unwrap();

        assert!(cache.remove("answer").is_some());
        assert!(cache.get("answer").is_none());
        cache.add("answer", Arc::new(1_i32), u64::MAX, false).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
