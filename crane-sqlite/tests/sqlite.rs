#[cfg(test)]
mod tests {
    use crane::{
        Engine, Error, OrderField, Parameter, QueryFilter, QueryOptions, Record, Registry, Value,
        WriteOptions, filter,
    };
    use crane_sqlite::{PROVIDER, register};
    use crane_tests::{AuditEntry, Customer, RecordingConnection, Sku, execute_tests, init_logs};
    use indoc::indoc;

    fn engine() -> Engine {
        let registry = Registry::new();
        register(&registry, false).expect("Could not register the SQLite capabilities");
        Engine::builder().registry(registry).build()
    }

    async fn connection(engine: &Engine) -> RecordingConnection {
        let mut connection = RecordingConnection::new(PROVIDER);
        let mut session = engine.session(&mut connection);
        session
            .metadata::<Customer>()
            .await
            .expect("Could not resolve Customer");
        session.metadata::<Sku>().await.expect("Could not resolve Sku");
        session
            .metadata::<AuditEntry>()
            .await
            .expect("Could not resolve AuditEntry");
        connection.clear();
        connection
    }

    #[tokio::test]
    async fn sqlite() {
        init_logs();
        execute_tests(PROVIDER, |registry| {
            register(registry, true).expect("Could not register the SQLite capabilities")
        })
        .await;
    }

    #[test]
    fn value_rules() {
        let registry = Registry::new();
        register(&registry, false).unwrap();
        let validator = registry.validator(PROVIDER);
        assert!(
            validator
                .validate(&Parameter::new("id", Value::UInt64(Some(u64::MAX))))
                .is_err()
        );
        assert!(
            validator
                .validate(&Parameter::new("id", Value::UInt64(Some(42))))
                .is_ok()
        );
    }

    #[tokio::test]
    async fn statements() {
        let engine = engine();
        let mut connection = connection(&engine).await;
        let script = connection.clone();
        let mut customers = vec![Customer::named("Ann", 20), Customer::named("Ben", 30)];
        let mut session = engine.session(&mut connection);
        session
            .query::<Customer>(
                filter!(Customer::age >= 18 && Customer::email.ends_with("@example.com")),
                QueryOptions::new().order_by([OrderField::descending(Customer::age)]),
            )
            .await
            .expect("Failed to query");
        script.push_rows(&["id"], vec![vec![Value::Int64(Some(1))], vec![Value::Int64(Some(2))]]);
        session
            .insert_all(&mut customers, WriteOptions::new())
            .await
            .expect("Failed to insert");
        session
            .update_all(&customers, WriteOptions::new())
            .await
            .expect("Failed to update");
        session
            .truncate::<Sku>()
            .await
            .expect("Failed to truncate");
        session
            .insert(
                &mut AuditEntry {
                    message: "truncated".into(),
                    level: 2,
                },
                WriteOptions::new(),
            )
            .await
            .expect("Failed to write the audit entry");
        assert_eq!(
            connection.texts(),
            [
                indoc! {r#"
                    SELECT "id", "name", "email_address", "age"
                    FROM "customers"
                    WHERE "age" >= @age AND "email_address" LIKE @email_address
                    ORDER BY "age" DESC;
                "#}
                .trim(),
                indoc! {r#"
                    INSERT INTO "customers" ("name", "email_address", "age") VALUES
                    (@name, @email_address, @age),
                    (@name_1, @email_address_1, @age_1)
                    RETURNING "id";
                "#}
                .trim(),
                // One statement per command
                indoc! {r#"
                    UPDATE "customers"
                    SET "name" = @name, "email_address" = @email_address, "age" = @age
                    WHERE "id" = @_id;
                "#}
                .trim(),
                indoc! {r#"
                    UPDATE "customers"
                    SET "name" = @name, "email_address" = @email_address, "age" = @age
                    WHERE "id" = @_id;
                "#}
                .trim(),
                r#"DELETE FROM "sku";"#,
                indoc! {r#"
                    INSERT INTO "audit_log" ("message", "level") VALUES
                    (@message, @level);
                "#}
                .trim(),
            ]
        );
        let commands = connection.commands();
        assert_eq!(commands[3].parameter("_id"), Some(&Value::Int64(Some(2))));
    }

    #[tokio::test]
    async fn hints() {
        let engine = engine();
        let mut connection = connection(&engine).await;
        let mut session = engine.session(&mut connection);
        session
            .count::<Customer>(QueryFilter::None)
            .await
            .expect("Counting without hints");
        session
            .query_all::<Customer>(QueryOptions::new().hints("INDEXED BY idx_customers_age").top(3))
            .await
            .expect("Index hints are accepted on reads");
        let error = session
            .insert(
                &mut Customer::named("Cid", 70),
                WriteOptions::new().hints("NOT INDEXED"),
            )
            .await
            .expect_err("Hints are refused on inserts");
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::Builder { .. })
        ));
        let error = session
            .query_all::<Customer>(QueryOptions::new().hints("WITH (NOLOCK)"))
            .await
            .expect_err("Only index hints exist");
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::Builder { .. })
        ));
        assert_eq!(
            connection.texts(),
            [
                indoc! {r#"
                    SELECT COUNT(*) AS "CountValue"
                    FROM "customers";
                "#}
                .trim(),
                indoc! {r#"
                    SELECT "id", "name", "email_address", "age"
                    FROM "customers" INDEXED BY idx_customers_age
                    LIMIT 3;
                "#}
                .trim(),
            ]
        );
    }

    #[tokio::test]
    async fn reported_keys() {
        let engine = engine();
        let mut connection = RecordingConnection::new(PROVIDER);
        connection.push_rows(
            &["cid", "name", "type", "notnull", "dflt_value", "pk"],
            vec![
                vec![
                    0i64.into(),
                    "id".into(),
                    "INTEGER".into(),
                    1i64.into(),
                    Value::Null,
                    1i64.into(),
                ],
                vec![
                    1i64.into(),
                    "label".into(),
                    "VARCHAR(40)".into(),
                    0i64.into(),
                    Value::Null,
                    0i64.into(),
                ],
            ],
        );
        connection.push_rows(&["id"], vec![vec![Value::Int64(Some(12))]]);
        let mut record = Record::new().with("label", "Lamp");
        let key = engine
            .session(&mut connection)
            .merge_table("inventory", &mut record, WriteOptions::new())
            .await
            .expect("Failed to merge into inventory");
        assert_eq!(key, Value::Int64(Some(12)));
        assert_eq!(record.get("id"), Some(&Value::Int64(Some(12))));
        let texts = connection.texts();
        assert_eq!(texts[0], r#"PRAGMA table_info("inventory");"#);

        let metadata = engine
            .resolver()
            .get_table(PROVIDER, "inventory")
            .expect("The table metadata is cached");
        let primary = metadata.primary.as_ref().expect("id is the primary key");
        assert!(primary.is_identity);
        assert_eq!(primary.size, None);
        let label = metadata
            .columns
            .iter()
            .find(|v| v.field.is("label"))
            .expect("label is mapped");
        assert!(label.nullable);
    }
}
