#[cfg(test)]
mod tests {
    use crane_core::{
        CommandKind, CommandRequest, Context, DbField, Field, Fragment, GenericDbSetting,
        GenericStatementBuilder, Operation, OrderField, QueryField, QueryGroup, StatementBuilder,
        TableRef, Value,
    };
    use indoc::indoc;

    const BUILDER: GenericStatementBuilder = GenericStatementBuilder;
    const SETTING: GenericDbSetting = GenericDbSetting;

    fn customers() -> TableRef {
        TableRef::new("customers")
    }

    fn assigned(mut group: QueryGroup) -> QueryGroup {
        group.assign_parameters("");
        group
    }

    #[test]
    fn query() {
        let table = customers();
        let fields = Field::from_names(["id", "name"]);
        let filter = assigned(QueryGroup::and([
            QueryField::new("age", Operation::GreaterThan, 30).unwrap()
        ]));
        let order_by = [OrderField::descending("name")];
        let request = CommandRequest {
            fields: &fields,
            filter: Some(&filter),
            order_by: &order_by,
            top: Some(10),
            ..CommandRequest::new(CommandKind::Query, &table, &SETTING)
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            indoc! {r#"
                SELECT "id", "name"
                FROM "customers"
                WHERE "age" > @age
                ORDER BY "name" DESC
                LIMIT 10;
            "#}
            .trim()
        );
        assert_eq!(BUILDER.build(&request).unwrap(), BUILDER.build(&request).unwrap());
    }

    #[test]
    fn query_all_with_hints() {
        let table = customers().with_schema("sales");
        let request = CommandRequest {
            hints: Some("WITH (NOLOCK)"),
            ..CommandRequest::new(CommandKind::QueryAll, &table, &SETTING)
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            "SELECT *\nFROM \"sales\".\"customers\" WITH (NOLOCK);"
        );
    }

    #[test]
    fn quoted_identifiers() {
        let table = TableRef::new("we\"ird");
        let fields = Field::from_names(["na\"me"]);
        let request = CommandRequest {
            fields: &fields,
            ..CommandRequest::new(CommandKind::QueryAll, &table, &SETTING)
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            "SELECT \"na\"\"me\"\nFROM \"we\"\"ird\";"
        );
    }

    #[test]
    fn nested_filters() {
        let table = customers();
        let filter = assigned(
            QueryGroup::and([QueryField::equal("name", "Ann")])
                .with_group(QueryGroup::or([
                    QueryField::new(
                        "id",
                        Operation::In,
                        Value::List(Some(vec![1_i32.into(), 2_i32.into()]), Box::new(Value::Int32(None))),
                    )
                    .unwrap(),
                    QueryField::new(
                        "age",
                        Operation::Between,
                        Value::List(Some(vec![18_i32.into(), 65_i32.into()]), Box::new(Value::Int32(None))),
                    )
                    .unwrap(),
                ]))
                .with_group(QueryGroup::default())
                .with_field(QueryField::is_null("email")),
        );
        let request = CommandRequest {
            filter: Some(&filter),
            ..CommandRequest::new(CommandKind::Delete, &table, &SETTING)
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            indoc! {r#"
                DELETE FROM "customers"
                WHERE "name" = @name AND ("id" IN (@id_In_0, @id_In_1) OR "age" BETWEEN @age_Left AND @age_Right) AND "email" IS NULL;
            "#}
            .trim()
        );

        let negated = assigned(
            QueryGroup::or([
                QueryField::equal("name", "Ann"),
                QueryField::new("age", Operation::LessThan, 18).unwrap(),
            ])
            .negated(),
        );
        let request = CommandRequest {
            filter: Some(&negated),
            ..CommandRequest::new(CommandKind::Delete, &table, &SETTING)
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            "DELETE FROM \"customers\"\nWHERE NOT (\"name\" = @name OR \"age\" < @age);"
        );
    }

    #[test]
    fn empty_filter_writes_no_where() {
        let table = customers();
        let empty = QueryGroup::default();
        let request = CommandRequest {
            filter: Some(&empty),
            ..CommandRequest::new(CommandKind::DeleteAll, &table, &SETTING)
        };
        assert_eq!(BUILDER.build(&request).unwrap(), "DELETE FROM \"customers\";");
    }

    #[test]
    fn insert() {
        let table = customers();
        let fields = Field::from_names(["name", "age"]);
        let identity = DbField::new("id").primary(true).identity(true);
        let request = CommandRequest {
            fields: &fields,
            identity: Some(&identity),
            batch_size: 2,
            ..CommandRequest::new(CommandKind::InsertAll, &table, &SETTING)
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            indoc! {r#"
                INSERT INTO "customers" ("name", "age") VALUES
                (@name, @age),
                (@name_1, @age_1)
                RETURNING "id";
            "#}
            .trim()
        );

        let request = CommandRequest {
            fields: &[],
            ..CommandRequest::new(CommandKind::Insert, &table, &SETTING)
        };
        assert!(BUILDER.build(&request).is_err());
    }

    #[test]
    fn row_parameters_skip_real_columns() {
        let table = customers();
        let fields = Field::from_names(["a", "a_1"]);
        let request = CommandRequest {
            fields: &fields,
            batch_size: 2,
            ..CommandRequest::new(CommandKind::InsertAll, &table, &SETTING)
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            indoc! {r#"
                INSERT INTO "customers" ("a", "a_1") VALUES
                (@a, @a_1),
                (@a_1_1, @a_1_1_1);
            "#}
            .trim()
        );
    }

    #[test]
    fn update() {
        let table = customers();
        let fields = Field::from_names(["name", "age"]);
        let qualifiers = Field::from_names(["id"]);
        let request = CommandRequest {
            fields: &fields,
            qualifiers: &qualifiers,
            ..CommandRequest::new(CommandKind::Update, &table, &SETTING)
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            indoc! {r#"
                UPDATE "customers"
                SET "name" = @name, "age" = @age
                WHERE "id" = @_id;
            "#}
            .trim()
        );

        let mut by_filter = QueryGroup::and([QueryField::equal("age", 40)]);
        by_filter.assign_parameters("_");
        let request = CommandRequest {
            fields: &fields,
            filter: Some(&by_filter),
            ..CommandRequest::new(CommandKind::Update, &table, &SETTING)
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            indoc! {r#"
                UPDATE "customers"
                SET "name" = @name, "age" = @age
                WHERE "age" = @_age;
            "#}
            .trim()
        );
    }

    #[test]
    fn update_all() {
        let table = customers();
        let fields = Field::from_names(["name"]);
        let qualifiers = Field::from_names(["id"]);
        let request = CommandRequest {
            fields: &fields,
            qualifiers: &qualifiers,
            batch_size: 2,
            ..CommandRequest::new(CommandKind::UpdateAll, &table, &SETTING)
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            indoc! {r#"
                UPDATE "customers"
                SET "name" = @name
                WHERE "id" = @_id;
                UPDATE "customers"
                SET "name" = @name_1
                WHERE "id" = @_id_1;
            "#}
            .trim()
        );

        let request = CommandRequest {
            qualifiers: &[],
            ..request
        };
        assert!(BUILDER.build(&request).is_err());
    }

    #[test]
    fn merge() {
        let table = customers();
        let fields = Field::from_names(["id", "name", "email"]);
        let qualifiers = Field::from_names(["id"]);
        let primary = DbField::new("id").primary(true);
        let request = CommandRequest {
            fields: &fields,
            qualifiers: &qualifiers,
            primary: Some(&primary),
            batch_size: 1,
            ..CommandRequest::new(CommandKind::Merge, &table, &SETTING)
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            indoc! {r#"
                INSERT INTO "customers" ("id", "name", "email") VALUES
                (@id, @name, @email)
                ON CONFLICT ("id") DO UPDATE SET
                "name" = EXCLUDED."name",
                "email" = EXCLUDED."email"
                RETURNING "id";
            "#}
            .trim()
        );

        let only_key = Field::from_names(["id"]);
        let request = CommandRequest {
            fields: &only_key,
            ..request
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            indoc! {r#"
                INSERT INTO "customers" ("id") VALUES
                (@id)
                ON CONFLICT ("id") DO NOTHING
                RETURNING "id";
            "#}
            .trim()
        );
    }

    #[test]
    fn aggregates() {
        let table = customers();
        let filter = assigned(QueryGroup::and([QueryField::equal("name", "Ann")]));
        let request = CommandRequest {
            filter: Some(&filter),
            ..CommandRequest::new(CommandKind::Count, &table, &SETTING)
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            "SELECT COUNT(*) AS \"CountValue\"\nFROM \"customers\"\nWHERE \"name\" = @name;"
        );

        let age = Field::from_names(["age"]);
        let request = CommandRequest {
            fields: &age,
            ..CommandRequest::new(CommandKind::SumAll, &table, &SETTING)
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            "SELECT SUM(\"age\") AS \"SumValue\"\nFROM \"customers\";"
        );

        let request = CommandRequest {
            filter: Some(&filter),
            ..CommandRequest::new(CommandKind::Exists, &table, &SETTING)
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            indoc! {r#"
                SELECT 1 AS "ExistsValue"
                FROM "customers"
                WHERE "name" = @name
                LIMIT 1;
            "#}
            .trim()
        );

        let two = Field::from_names(["age", "id"]);
        let request = CommandRequest {
            fields: &two,
            ..CommandRequest::new(CommandKind::Max, &table, &SETTING)
        };
        assert!(BUILDER.build(&request).is_err());
    }

    #[test]
    fn batch_query_and_truncate() {
        let table = customers();
        let order_by = [OrderField::ascending("id")];
        let request = CommandRequest {
            order_by: &order_by,
            ..CommandRequest::new(CommandKind::BatchQuery, &table, &SETTING)
        };
        assert_eq!(
            BUILDER.build(&request).unwrap(),
            indoc! {r#"
                SELECT *
                FROM "customers"
                ORDER BY "id" ASC
                LIMIT @_limit OFFSET @_offset;
            "#}
            .trim()
        );
        let request = CommandRequest {
            order_by: &[],
            ..request
        };
        assert!(BUILDER.build(&request).is_err());

        let request = CommandRequest::new(CommandKind::Truncate, &table, &SETTING);
        assert_eq!(BUILDER.build(&request).unwrap(), "TRUNCATE TABLE \"customers\";");

        let request = CommandRequest::new(CommandKind::ExecuteQuery, &table, &SETTING);
        assert!(BUILDER.build(&request).is_err());
    }

    struct PositionalBuilder;

    impl StatementBuilder for PositionalBuilder {
        fn as_dyn(&self) -> &dyn StatementBuilder {
            self
        }
        fn write_parameter(&self, context: &mut Context, out: &mut String, name: &str) {
            let index = context.parameter_index(name);
            out.push('?');
            out.push_str(&index.to_string());
        }
    }

    #[test]
    fn positional_parameters() {
        let table = customers();
        let fields = Field::from_names(["name", "age"]);
        let request = CommandRequest {
            fields: &fields,
            batch_size: 2,
            ..CommandRequest::new(CommandKind::InsertAll, &table, &SETTING)
        };
        assert_eq!(
            PositionalBuilder.build(&request).unwrap(),
            indoc! {r#"
                INSERT INTO "customers" ("name", "age") VALUES
                (?1, ?2),
                (?3, ?4);
            "#}
            .trim()
        );
    }

    #[test]
    fn context_parameters() {
        let mut context = Context::new(Fragment::None, &SETTING);
        assert_eq!(context.parameter_index("name"), 1);
        assert_eq!(context.parameter_index("age"), 2);
        {
            let mut updater = context.switch_fragment(Fragment::SelectWhere);
            assert_eq!(updater.current.fragment, Fragment::SelectWhere);
            assert_eq!(updater.current.parameter_index("name"), 1);
            assert_eq!(updater.current.parameter_index("email"), 3);
        }
        assert_eq!(context.fragment, Fragment::None);
        assert_eq!(context.parameters, ["name", "age", "email"]);
    }

    #[test]
    fn keys_ignore_values() {
        let table = customers();
        let first = assigned(QueryGroup::and([QueryField::equal("name", "Ann")]));
        let second = assigned(QueryGroup::and([QueryField::equal("NAME", "Bob")]));
        let key = |filter: &QueryGroup| {
            CommandRequest {
                filter: Some(filter),
                ..CommandRequest::new(CommandKind::Query, &table, &SETTING)
            }
            .key("generic")
        };
        assert_eq!(key(&first), key(&second));
        let other = assigned(QueryGroup::and([QueryField::new("name", Operation::Like, "A%").unwrap()]));
        assert_ne!(key(&first), key(&other));
    }
}
