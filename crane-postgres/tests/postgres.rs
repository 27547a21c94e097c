#[cfg(test)]
mod tests {
    use crane::{
        Engine, Error, OrderField, Parameter, QueryFilter, QueryOptions, Record, Registry, Value,
        WriteOptions, filter,
    };
    use crane_postgres::{PROVIDER, register};
    use crane_tests::{Customer, RecordingConnection, Sku, execute_tests, init_logs};
    use indoc::indoc;

    fn engine() -> Engine {
        let registry = Registry::new();
        register(&registry, false).expect("Could not register the PostgreSQL capabilities");
        Engine::builder().registry(registry).build()
    }

    /// Metadata of the fixtures resolved without any database report.
    async fn connection(engine: &Engine) -> RecordingConnection {
        let mut connection = RecordingConnection::new(PROVIDER);
        let mut session = engine.session(&mut connection);
        session
            .metadata::<Customer>()
            .await
            .expect("Could not resolve Customer");
        session.metadata::<Sku>().await.expect("Could not resolve Sku");
        connection.clear();
        connection
    }

    #[tokio::test]
    async fn postgres() {
        init_logs();
        execute_tests(PROVIDER, |registry| {
            register(registry, true).expect("Could not register the PostgreSQL capabilities")
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
        assert!(
            validator
                .validate(&Parameter::new("note", Value::Varchar(Some("a\0b".into()))))
                .is_err()
        );
        assert!(
            validator
                .validate(&Parameter::new("note", Value::Varchar(Some("ab".into()))))
                .is_ok()
        );
    }

    #[tokio::test]
    async fn registration_conflict() {
        let registry = Registry::new();
        register(&registry, false).expect("The first registration should succeed");
        let error = register(&registry, false).expect_err("The second one should not");
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::AlreadyRegistered { .. })
        ));
        register(&registry, true).expect("Forcing should replace");
    }

    #[tokio::test]
    async fn query() {
        let engine = engine();
        let mut connection = connection(&engine).await;
        engine
            .session(&mut connection)
            .query::<Customer>(
                filter!(Customer::age >= 18 && Customer::email.ends_with("@example.com")),
                QueryOptions::new()
                    .order_by([OrderField::descending(Customer::age)])
                    .top(5),
            )
            .await
            .expect("Failed to query");
        let command = connection.last().expect("Nothing was sent");
        assert_eq!(
            &*command.text,
            indoc! {r#"
                SELECT "id", "name", "email_address", "age"
                FROM "public"."customers"
                WHERE "age" >= $1 AND "email_address" LIKE $2
                ORDER BY "age" DESC
                LIMIT 5;
            "#}
            .trim()
        );
        assert_eq!(
            command
                .parameters
                .iter()
                .map(|v| v.value.clone())
                .collect::<Vec<_>>(),
            [
                Value::Int32(Some(18)),
                Value::Varchar(Some("%@example.com".into()))
            ]
        );
    }

    #[tokio::test]
    async fn insert_and_update() {
        let engine = engine();
        let mut connection = connection(&engine).await;
        connection.push_rows(&["id"], vec![vec![Value::Int64(Some(1))], vec![Value::Int64(Some(2))]]);
        let mut customers = vec![Customer::named("Ann", 20), Customer::named("Ben", 30)];
        let mut session = engine.session(&mut connection);
        session
            .insert_all(&mut customers, WriteOptions::new())
            .await
            .expect("Failed to insert");
        session
            .update(&customers[1], QueryFilter::None, WriteOptions::new())
            .await
            .expect("Failed to update");
        let texts = connection.texts();
        assert_eq!(
            texts[0],
            indoc! {r#"
                INSERT INTO "public"."customers" ("name", "email_address", "age") VALUES
                ($1, $2, $3),
                ($4, $5, $6)
                RETURNING "id";
            "#}
            .trim()
        );
        assert_eq!(
            texts[1],
            indoc! {r#"
                UPDATE "public"."customers"
                SET "name" = $1, "email_address" = $2, "age" = $3
                WHERE "id" = $4;
            "#}
            .trim()
        );
        assert_eq!(customers[1].id, 2);
        let update = connection.last().expect("Nothing was sent");
        assert_eq!(update.parameters[3].name, "_id");
        assert_eq!(update.parameters[3].value, Value::Int64(Some(2)));
    }

    #[tokio::test]
    async fn merge_delete_count() {
        let engine = engine();
        let mut connection = connection(&engine).await;
        let mut session = engine.session(&mut connection);
        let mut bell = Sku {
            sku_id: "B-1".into(),
            label: "Bell".into(),
            price: 20.0,
        };
        session
            .merge(&mut bell, WriteOptions::new())
            .await
            .expect("Failed to merge");
        session
            .delete::<Customer>(QueryFilter::key(5i64))
            .await
            .expect("Failed to delete");
        session
            .count::<Customer>(filter!(Customer::age > 65))
            .await
            .expect("Failed to count");
        session
            .batch_query::<Customer>(1, 50, [OrderField::ascending(Customer::id)], QueryFilter::None)
            .await
            .expect("Failed to page");
        session
            .truncate::<Sku>()
            .await
            .expect("Failed to truncate");
        let texts = connection.texts();
        assert_eq!(
            texts,
            [
                indoc! {r#"
                    INSERT INTO "public"."sku" ("sku_id", "label", "price") VALUES
                    ($1, $2, $3)
                    ON CONFLICT ("sku_id") DO UPDATE SET
                    "label" = EXCLUDED."label",
                    "price" = EXCLUDED."price"
                    RETURNING "sku_id";
                "#}
                .trim(),
                indoc! {r#"
                    DELETE FROM "public"."customers"
                    WHERE "id" = $1;
                "#}
                .trim(),
                indoc! {r#"
                    SELECT COUNT(*) AS "CountValue"
                    FROM "public"."customers"
                    WHERE "age" > $1;
                "#}
                .trim(),
                indoc! {r#"
                    SELECT "id", "name", "email_address", "age"
                    FROM "public"."customers"
                    ORDER BY "id" ASC
                    LIMIT $1 OFFSET $2;
                "#}
                .trim(),
                r#"TRUNCATE TABLE "public"."sku";"#,
            ]
        );
    }

    #[tokio::test]
    async fn hints_are_refused() {
        let engine = engine();
        let mut connection = connection(&engine).await;
        let error = engine
            .session(&mut connection)
            .query_all::<Customer>(QueryOptions::new().hints("FOR UPDATE"))
            .await
            .expect_err("PostgreSQL has no table hints");
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::Builder { .. })
        ));
        assert!(connection.commands().is_empty());
    }

    #[tokio::test]
    async fn reported_keys() {
        let engine = engine();
        let mut connection = RecordingConnection::new(PROVIDER);
        connection.push_rows(
            &[
                "column_name",
                "is_nullable",
                "data_type",
                "character_maximum_length",
                "is_identity",
                "column_default",
                "is_primary",
            ],
            vec![
                vec![
                    "id".into(),
                    "NO".into(),
                    "integer".into(),
                    Value::Int32(None),
                    "NO".into(),
                    "nextval('inventory_id_seq'::regclass)".into(),
                    true.into(),
                ],
                vec![
                    "label".into(),
                    "YES".into(),
                    "character varying".into(),
                    40.into(),
                    "NO".into(),
                    Value::Varchar(None),
                    false.into(),
                ],
            ],
        );
        connection.push_rows(&["id"], vec![vec![Value::Int32(Some(9))]]);
        let mut record = Record::new().with("label", "Lamp");
        let key = engine
            .session(&mut connection)
            .insert_table("inventory", &mut record, WriteOptions::new())
            .await
            .expect("Failed to insert into inventory");
        assert_eq!(key, Value::Int32(Some(9)));
        assert_eq!(record.get("id"), Some(&Value::Int32(Some(9))));

        let commands = connection.commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[0].parameters,
            [
                crane::Parameter::new("schema", "public"),
                crane::Parameter::new("table", "inventory"),
            ]
        );
        assert_eq!(
            &*commands[1].text,
            indoc! {r#"
                INSERT INTO "public"."inventory" ("label") VALUES
                ($1)
                RETURNING "id";
            "#}
            .trim()
        );
        let metadata = engine
            .resolver()
            .get_table(PROVIDER, "inventory")
            .expect("The table metadata is cached");
        let label = metadata
            .columns
            .iter()
            .find(|v| v.field.is("label"))
            .expect("label is mapped");
        assert!(label.nullable);
        assert_eq!(metadata.identity.as_ref().map(|v| v.name.as_str()), Some("id"));
    }
}
