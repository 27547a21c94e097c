use crate::{Customer, Harness};
use crane::{Error, QueryOptions, Registry, Value, WriteOptions, filter};
use std::{collections::HashSet, sync::Arc};

pub async fn cache_idempotence(provider: &'static str, register: fn(&Registry)) {
    let mut harness = Harness::new(provider, register);
    harness.prime::<Customer>().await;
    let mut session = harness.engine.session(&mut harness.connection);
    for min_age in [18, 30, 65] {
        session
            .query::<Customer>(filter!(Customer::age >= min_age), QueryOptions::new())
            .await
            .expect("Failed to query the customers by age");
    }

    // One statement built, the same text instance sent three times
    assert_eq!(harness.builder.builds(), 1);
    assert_eq!(harness.engine.command_texts().stats().entries, 1);
    let commands = harness.connection.commands();
    assert_eq!(commands.len(), 3);
    assert!(commands.iter().all(|v| Arc::ptr_eq(&v.text, &commands[0].text)));
    assert_eq!(commands[0].parameter("age"), Some(&Value::Int32(Some(18))));
    assert_eq!(commands[2].parameter("age"), Some(&Value::Int32(Some(65))));
}

pub async fn shape_partitioning(provider: &'static str, register: fn(&Registry)) {
    let mut harness = Harness::new(provider, register);
    harness.prime::<Customer>().await;
    let mut session = harness.engine.session(&mut harness.connection);
    session
        .query::<Customer>(filter!(Customer::age >= 18), QueryOptions::new())
        .await
        .expect("Failed to query by age");
    session
        .query::<Customer>(filter!(Customer::name == "Bob"), QueryOptions::new())
        .await
        .expect("Failed to query by name");
    session
        .query::<Customer>(filter!(Customer::age >= 18), QueryOptions::new().top(5))
        .await
        .expect("Failed to query the first customers by age");
    session
        .query::<Customer>(
            filter!(Customer::age >= 18),
            QueryOptions::new().fields([Customer::name, Customer::age]),
        )
        .await
        .expect("Failed to query some fields");
    assert_eq!(harness.builder.builds(), 4);

    // Coming back to the first shape builds nothing
    session
        .query::<Customer>(filter!(Customer::age >= 40), QueryOptions::new())
        .await
        .expect("Failed to query by age again");
    assert_eq!(harness.builder.builds(), 4);
    let texts = harness.connection.texts();
    assert_eq!(texts.len(), 5);
    assert_eq!(texts[0], texts[4]);
    assert_eq!(texts[..4].iter().collect::<HashSet<_>>().len(), 4);
}

pub async fn flush_keeps_delegates(provider: &'static str, register: fn(&Registry)) {
    let mut harness = Harness::new(provider, register);
    harness.prime::<Customer>().await;
    for id in 1..=3 {
        harness
            .connection
            .push_rows(&["id"], vec![vec![Value::Int64(Some(id))]]);
    }
    let mut session = harness.engine.session(&mut harness.connection);
    let mut alice = Customer::named("Alice", 30);
    session
        .insert(&mut alice, WriteOptions::new())
        .await
        .expect("Failed to insert Alice");
    harness.engine.command_texts().flush();
    let mut bob = Customer::named("Bob", 40);
    session
        .insert(&mut bob, WriteOptions::new())
        .await
        .expect("Failed to insert Bob");

    // The text was built again, the compiled context was rebound to it
    assert_eq!(harness.builder.builds(), 2);
    let contexts = harness.engine.contexts().stats();
    assert_eq!(contexts.builds, 1);
    assert_eq!(contexts.entries, 1);
    assert_eq!((alice.id, bob.id), (1, 2));
    let commands = harness.connection.commands();
    assert_eq!(commands[0].text, commands[1].text);
    assert!(!Arc::ptr_eq(&commands[0].text, &commands[1].text));

    // The other way around: the text stays, the context is compiled again
    harness.engine.contexts().flush();
    let mut cid = Customer::named("Cid", 45);
    harness
        .engine
        .session(&mut harness.connection)
        .insert(&mut cid, WriteOptions::new())
        .await
        .expect("Failed to insert Cid");
    assert_eq!(cid.id, 3);
    assert_eq!(harness.builder.builds(), 2);
    let contexts = harness.engine.contexts().stats();
    assert_eq!(contexts.builds, 2);
    assert_eq!(contexts.entries, 1);
    let commands = harness.connection.commands();
    assert!(Arc::ptr_eq(&commands[1].text, &commands[2].text));

    // A full flush recompiles
    harness.engine.flush();
    assert_eq!(harness.engine.contexts().stats().entries, 0);
    harness.prime::<Customer>().await;
    harness
        .connection
        .push_rows(&["id"], vec![vec![Value::Int64(Some(4))]]);
    let mut carol = Customer::named("Carol", 50);
    harness
        .engine
        .session(&mut harness.connection)
        .insert(&mut carol, WriteOptions::new())
        .await
        .expect("Failed to insert Carol");
    assert_eq!(carol.id, 4);
    assert_eq!(harness.builder.builds(), 3);
    assert_eq!(harness.engine.contexts().stats().builds, 3);
}

pub async fn builder_failure_retry(provider: &'static str, register: fn(&Registry)) {
    let mut harness = Harness::build(provider, register, 1, |v| v);
    harness.prime::<Customer>().await;
    let mut session = harness.engine.session(&mut harness.connection);
    let error = session
        .query::<Customer>(filter!(Customer::age > 20), QueryOptions::new())
        .await
        .expect_err("The first build is scripted to fail");
    assert!(matches!(
        error.downcast_ref::<Error>(),
        Some(Error::Builder { .. })
    ));
    assert_eq!(harness.engine.command_texts().stats().entries, 0);
    assert!(harness.connection.commands().is_empty());

    // Nothing was stored, the next call builds again
    harness
        .engine
        .session(&mut harness.connection)
        .query::<Customer>(filter!(Customer::age > 20), QueryOptions::new())
        .await
        .expect("The second build should succeed");
    assert_eq!(harness.builder.builds(), 2);
    assert_eq!(harness.engine.command_texts().stats().entries, 1);
    assert_eq!(harness.connection.commands().len(), 1);
}
