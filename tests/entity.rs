#[cfg(test)]
mod tests {
    use crane::{
        AsValue, Bindable, ColumnRef, Engine, Entity, GENERIC_PROVIDER, OrderField, QueryOptions,
        TableDef, Value, filter, translate,
    };
    use crane_tests::{Customer, RecordingConnection};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use time::{Date, Month};

    #[derive(Entity, Debug, Default, Clone, PartialEq)]
    #[crane(table = "orders", schema = "sales")]
    struct Order {
        #[crane(primary_key)]
        order_id: i64,
        #[crane(name = "total_amount")]
        total: Decimal,
        placed: Option<Date>,
        #[crane(ignore)]
        notes: Vec<String>,
    }

    #[derive(Entity, Debug, Default, Clone, PartialEq)]
    struct Shipment {
        id: i32,
        carrier: String,
    }

    fn shape(predicate: crane::Predicate) -> String {
        translate(predicate.into(), None)
            .expect("Could not translate the filter")
            .shape()
    }

    #[test]
    fn column_refs() {
        assert_eq!(
            Order::total,
            ColumnRef {
                name: "total_amount",
                property: "total",
            }
        );
        assert_eq!(Order::placed.name, "placed");
        assert_eq!(Customer::email.name, "email_address");
        assert_eq!(Customer::email.property, "email");
    }

    #[test]
    fn table_and_columns() {
        assert_eq!(Order::type_name(), "Order");
        assert_eq!(
            *Order::table_def(),
            TableDef {
                name: "orders",
                schema: "sales",
            }
        );
        assert_eq!(*Shipment::table_def(), TableDef::default());

        let columns = Order::columns();
        assert_eq!(
            columns.iter().map(|v| v.column_ref.name).collect::<Vec<_>>(),
            ["order_id", "total_amount", "placed"]
        );
        assert!(columns[0].primary_key);
        assert!(!columns[0].identity);
        assert_eq!(columns[0].value, Value::Int64(None));
        assert!(!columns[1].nullable);
        assert_eq!(columns[1].value, Value::Decimal(None));
        assert!(columns[2].nullable);
        assert_eq!(columns[2].value, Value::Date(None));

        let columns = Customer::columns();
        assert!(columns[0].primary_key && columns[0].identity);
        assert!(columns[2].nullable);
    }

    #[test]
    fn getters_and_setters() {
        let mut order = Order {
            order_id: 4,
            total: Decimal::from_str("19.90").unwrap(),
            placed: None,
            notes: vec!["fragile".into()],
        };
        let total = Order::getter("total").expect("total is mapped");
        assert_eq!(total(&order), Value::Decimal(Some(Decimal::from_str("19.90").unwrap())));
        let placed = Order::getter("placed").expect("placed is mapped");
        assert_eq!(placed(&order), Value::Date(None));
        assert!(Order::getter("notes").is_none());
        assert!(Order::getter("total_amount").is_none());

        let date = Date::from_calendar_date(2025, Month::June, 2).unwrap();
        let set_placed = Order::setter("placed").expect("placed is mapped");
        set_placed(&mut order, date.as_value()).unwrap();
        assert_eq!(order.placed, Some(date));
        let set_id = Order::setter("order_id").expect("order_id is mapped");
        set_id(&mut order, Value::Int32(Some(12))).unwrap();
        assert_eq!(order.order_id, 12);
        assert!(set_id(&mut order, Value::Varchar(Some("twelve".into()))).is_err());
        assert_eq!(order.order_id, 12);
    }

    #[tokio::test]
    async fn rows_into_entities() {
        let engine = Engine::new();
        let mut connection = RecordingConnection::new(GENERIC_PROVIDER);
        connection.push_rows(
            &["ORDER_ID", "total_amount", "placed"],
            vec![
                vec![
                    Value::Int64(Some(1)),
                    Value::Decimal(Some(Decimal::from(5))),
                    Value::Date(None),
                ],
                vec![
                    Value::Int64(Some(2)),
                    Value::Decimal(Some(Decimal::from(8))),
                    Value::Date(Some(Date::from_calendar_date(2024, Month::May, 1).unwrap())),
                ],
            ],
        );
        let orders = engine
            .session(&mut connection)
            .query_all::<Order>(QueryOptions::new().order_by([OrderField::ascending(Order::order_id)]))
            .await
            .expect("Failed to read the orders");
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_id, 1);
        assert_eq!(orders[0].placed, None);
        assert!(orders[1].notes.is_empty());
        assert_eq!(orders[1].total, Decimal::from(8));
        assert_eq!(
            connection.texts(),
            [concat!(
                "SELECT \"order_id\", \"total_amount\", \"placed\"\n",
                "FROM \"sales\".\"orders\"\n",
                "ORDER BY \"order_id\" ASC;",
            )]
        );

        // A missing nullable column reads as None, a missing required one fails
        connection.push_rows(&["order_id", "total_amount"], vec![vec![3i64.into(), Decimal::from(1).into()]]);
        let orders = engine
            .session(&mut connection)
            .query_all::<Order>(QueryOptions::new())
            .await
            .expect("Failed to read an order without date");
        assert_eq!(orders[0].placed, None);
        connection.push_rows(&["order_id"], vec![vec![3i64.into()]]);
        assert!(
            engine
                .session(&mut connection)
                .query_all::<Order>(QueryOptions::new())
                .await
                .is_err()
        );
    }

    #[test]
    fn filter_macro() {
        let min_age = 30;
        assert_eq!(
            shape(filter!(Customer::age >= min_age && Customer::email.ends_with("@example.com"))),
            "AND(age:GreaterThanOrEqual,email:Like)"
        );
        assert_eq!(
            shape(filter!(Customer::age > 10 || Customer::name.starts_with("A"))),
            "OR(age:GreaterThan,name:Like)"
        );
        assert_eq!(
            shape(filter!(Customer::age < 18 || (Customer::name == "Ann" && Customer::age > 60))),
            "OR(age:LessThan,AND(name:Equal,age:GreaterThan))"
        );
        assert_eq!(shape(filter!(!(Customer::age < 18))), "AND(age:GreaterThanOrEqual)");
        assert_eq!(
            shape(filter!(!(Customer::age < 18 && Customer::email == None))),
            "!AND(age:LessThan,email:IsNull)"
        );
        assert_eq!(shape(filter!(Customer::email.is_some())), "AND(email:IsNotNull)");
        assert_eq!(shape(filter!(Customer::email != None)), "AND(email:IsNotNull)");
        assert_eq!(shape(filter!([1, 2, 3].contains(&Customer::id))), "AND(id:In[3])");
        assert_eq!(shape(filter!((18..=65).contains(&Customer::age))), "AND(age:Between)");
        assert_eq!(
            shape(filter!((18..65).contains(&Customer::age))),
            "AND(age:GreaterThanOrEqual,age:LessThan)"
        );
        assert_eq!(shape(filter!(40 < Customer::age)), "AND(age:GreaterThan)");
    }

    #[test]
    fn filter_macro_values() {
        let names = vec!["Ann".to_string(), "Bob".to_string()];
        let base = 20;
        let mut group = translate(
            filter!(Customer::name == names[1] && Customer::age == base * 2 + 1).into(),
            None,
        )
        .unwrap();
        group.assign_parameters("");
        let parameters = group.parameters();
        assert_eq!(parameters[0].name, "name");
        assert_eq!(parameters[0].value, Value::Varchar(Some("Bob".into())));
        assert_eq!(parameters[1].value, Value::Int32(Some(41)));
        // Operands are cloned, the locals are still usable
        assert_eq!(names.len(), 2);

        let group = translate(filter!(Customer::age > -5).into(), None).unwrap();
        assert_eq!(group.parameters()[0].value, Value::Int32(Some(-5)));

        let group = translate(filter!(Customer::name.contains("nn")).into(), None).unwrap();
        assert_eq!(group.parameters()[0].value, Value::Varchar(Some("%nn%".into())));

        // Comparing two columns is not a filter the engine can bind
        assert!(translate(filter!(Customer::age == Customer::id).into(), None).is_err());
    }
}
