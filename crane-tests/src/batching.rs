use crate::{Customer, Harness};
use crane::{Registry, Value, WriteOptions};
use std::sync::Arc;

pub async fn batch_partitioning(provider: &'static str, register: fn(&Registry)) {
    let mut harness = Harness::new(provider, register);
    harness.prime::<Customer>().await;
    let mut customers = (0..25)
        .map(|i| Customer::named(&format!("Customer{i}"), 20 + i))
        .collect::<Vec<_>>();
    for ids in [1i64..=10, 11..=20, 21..=25] {
        harness.connection.push_rows(
            &["id"],
            ids.map(|v| vec![Value::Int64(Some(v))]).collect(),
        );
    }
    let inserted = harness
        .engine
        .session(&mut harness.connection)
        .insert_all(&mut customers, WriteOptions::new())
        .await
        .expect("Failed to insert the customers");
    assert_eq!(inserted, 25);

    // Batches of 10, 10 and 5: the two full ones share their text
    let commands = harness.connection.commands();
    assert_eq!(commands.len(), 3);
    assert_eq!(
        commands
            .iter()
            .map(|v| v.parameters.len())
            .collect::<Vec<_>>(),
        [30, 30, 15]
    );
    assert!(Arc::ptr_eq(&commands[0].text, &commands[1].text));
    assert_ne!(commands[1].text, commands[2].text);
    assert_eq!(harness.builder.builds(), 2);
    assert_eq!(harness.engine.contexts().stats().builds, 2);
    assert_eq!(
        commands[0].parameter("name_1"),
        Some(&Value::Varchar(Some("Customer1".into())))
    );
    assert_eq!(
        commands[2].parameter("age_4"),
        Some(&Value::Int32(Some(44)))
    );
    assert!(
        customers
            .iter()
            .enumerate()
            .all(|(i, v)| v.id == i as i64 + 1)
    );

    // Explicit batch size
    harness.connection.clear();
    let mut customers = (0..7)
        .map(|i| Customer::named(&format!("Other{i}"), 60))
        .collect::<Vec<_>>();
    for ids in [100i64..=102, 103..=105, 106..=106] {
        harness.connection.push_rows(
            &["id"],
            ids.map(|v| vec![Value::Int64(Some(v))]).collect(),
        );
    }
    harness
        .engine
        .session(&mut harness.connection)
        .insert_all(&mut customers, WriteOptions::new().batch_size(3))
        .await
        .expect("Failed to insert in batches of three");
    assert_eq!(harness.connection.commands().len(), 3);
    assert_eq!(customers[6].id, 106);

    // Updates are matched by key, one statement per row
    harness.connection.clear();
    let updated = harness
        .engine
        .session(&mut harness.connection)
        .update_all(&customers, WriteOptions::new())
        .await
        .expect("Failed to update the customers");
    let commands = harness.connection.commands();
    let setting = harness
        .engine
        .registry()
        .setting(provider)
        .expect("The provider registered no setting");
    let expected = match setting.supports_multiple_statements() {
        true => 1,
        false => 7,
    };
    assert_eq!(commands.len(), expected);
    assert_eq!(updated, 0);
    let first = &commands[0];
    assert_eq!(first.parameter("_id"), Some(&Value::Int64(Some(100))));
}
