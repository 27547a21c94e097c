use crate::{Customer, Harness, Sku};
use crane::{
    EntityQuery, OrderField, QueryFilter, QueryOptions, Record, Registry, Value, WriteOptions,
    filter,
};

fn customer_labels() -> [&'static str; 4] {
    ["id", "name", "email_address", "age"]
}

pub async fn crud(provider: &'static str, register: fn(&Registry)) {
    let mut harness = Harness::new(provider, register);
    harness.prime::<Customer>().await;
    harness.prime::<Sku>().await;

    // Query, columns read back into properties
    harness.connection.push_rows(
        &customer_labels(),
        vec![vec![
            7i64.into(),
            "Dora".into(),
            "dora@example.com".into(),
            52.into(),
        ]],
    );
    let mut session = harness.engine.session(&mut harness.connection);
    let mut dora = session
        .query::<Customer>(
            filter!(Customer::email.ends_with("@example.com") && Customer::age >= 50),
            QueryOptions::new().order_by([OrderField::descending(Customer::age)]),
        )
        .await
        .expect("Failed to query Dora")
        .pop()
        .expect("Dora was returned");
    assert_eq!(
        dora,
        Customer {
            id: 7,
            name: "Dora".into(),
            email: Some("dora@example.com".into()),
            age: 52,
        }
    );

    // Update by key
    dora.age = 53;
    harness.connection.push_affected(1);
    let updated = harness
        .engine
        .session(&mut harness.connection)
        .update(&dora, QueryFilter::None, WriteOptions::new())
        .await
        .expect("Failed to update Dora");
    assert_eq!(updated, 1);
    let command = harness.connection.last().expect("Nothing was sent");
    assert_eq!(command.parameter("_id"), Some(&Value::Int64(Some(7))));
    assert_eq!(command.parameter("age"), Some(&Value::Int32(Some(53))));
    assert_eq!(command.parameter("id"), None);

    // Update through a filter, its parameters are kept apart from the set values
    harness.connection.push_affected(3);
    let updated = harness
        .engine
        .session(&mut harness.connection)
        .update(
            &dora,
            filter!(Customer::age < 60),
            WriteOptions::new().fields([Customer::age]),
        )
        .await
        .expect("Failed to update the younger customers");
    assert_eq!(updated, 3);
    let command = harness.connection.last().expect("Nothing was sent");
    assert_eq!(command.parameter("age"), Some(&Value::Int32(Some(53))));
    assert_eq!(command.parameter("_age"), Some(&Value::Int32(Some(60))));

    // Delete
    harness.connection.push_affected(1);
    let deleted = harness
        .engine
        .session(&mut harness.connection)
        .delete_entity(&dora)
        .await
        .expect("Failed to delete Dora");
    assert_eq!(deleted, 1);
    let command = harness.connection.last().expect("Nothing was sent");
    assert_eq!(command.parameters.len(), 1);
    assert_eq!(command.parameters[0].value, Value::Int64(Some(7)));

    // Plain object filter
    harness.connection.push_affected(2);
    let deleted = harness
        .engine
        .session(&mut harness.connection)
        .delete::<Customer>(Record::new().with("name", "Dora").with("age", 53))
        .await
        .expect("Failed to delete through a record");
    assert_eq!(deleted, 2);
    let command = harness.connection.last().expect("Nothing was sent");
    assert_eq!(command.parameter("name"), Some(&Value::Varchar(Some("Dora".into()))));

    // Paging
    let mut session = harness.engine.session(&mut harness.connection);
    session
        .batch_query::<Customer>(2, 10, [OrderField::ascending(Customer::id)], QueryFilter::None)
        .await
        .expect("Failed to read the third page");
    let command = harness.connection.last().expect("Nothing was sent");
    assert_eq!(command.parameter("_limit"), Some(&Value::UInt64(Some(10))));
    assert_eq!(command.parameter("_offset"), Some(&Value::UInt64(Some(20))));

    // Several entity types in one call
    harness.connection.push_rows(
        &customer_labels(),
        vec![vec![1i64.into(), "Eve".into(), Value::Varchar(None), 28.into()]],
    );
    harness.connection.push_rows(
        &["sku_id", "label", "price"],
        vec![
            vec!["B-1".into(), "Bell".into(), 20.0.into()],
            vec!["C-1".into(), "Chain".into(), 35.0.into()],
        ],
    );
    let (customers, skus) = harness
        .engine
        .session(&mut harness.connection)
        .query_multiple((
            EntityQuery::<Customer>::all(),
            EntityQuery::<Sku>::new(filter!(Sku::price > 10.0)),
        ))
        .await
        .expect("Failed to read customers and skus");
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].email, None);
    assert_eq!(
        skus.iter().map(|v| v.label.as_str()).collect::<Vec<_>>(),
        ["Bell", "Chain"]
    );
}

pub async fn aggregates(provider: &'static str, register: fn(&Registry)) {
    let mut harness = Harness::new(provider, register);
    harness.prime::<Customer>().await;

    harness
        .connection
        .push_rows(&["CountValue"], vec![vec![Value::Int64(Some(3))]]);
    let mut session = harness.engine.session(&mut harness.connection);
    let count = session
        .count::<Customer>(filter!(Customer::age > 30))
        .await
        .expect("Failed to count");
    assert_eq!(count, 3);

    // Nothing returned
    let count = session
        .count_all::<Customer>()
        .await
        .expect("Failed to count all");
    assert_eq!(count, 0);
    let exists = session
        .exists::<Customer>(filter!(Customer::name == "Nobody"))
        .await
        .expect("Failed to check existence");
    assert!(!exists);
    let command = harness.connection.last().expect("Nothing was sent");
    assert_eq!(command.parameter("name"), Some(&Value::Varchar(Some("Nobody".into()))));

    harness
        .connection
        .push_rows(&["SumValue"], vec![vec![Value::Int64(Some(150))]]);
    harness
        .connection
        .push_rows(&["MaxValue"], vec![vec![Value::Int32(Some(70))]]);
    let mut session = harness.engine.session(&mut harness.connection);
    let sum = session
        .sum::<Customer>(Customer::age, filter!(Customer::age >= 18))
        .await
        .expect("Failed to sum the ages");
    assert_eq!(sum, Value::Int64(Some(150)));
    let max = session
        .max_all::<Customer>(Customer::age)
        .await
        .expect("Failed to find the oldest");
    assert_eq!(max, Value::Int32(Some(70)));
    let average = session
        .average_all::<Customer>(Customer::age)
        .await
        .expect("Failed to average the ages");
    assert_eq!(average, Value::Null);
    assert_eq!(harness.builder.builds(), 6);
}
