use crate::{AuditEntry, Customer, Harness, Sku};
use crane::{Error, Registry, Value, WriteOptions};

pub async fn generated_keys(provider: &'static str, register: fn(&Registry)) {
    let mut harness = Harness::new(provider, register);
    harness.prime::<Customer>().await;
    harness.prime::<Sku>().await;
    harness.prime::<AuditEntry>().await;

    // Identity written back
    harness
        .connection
        .push_rows(&["id"], vec![vec![Value::Int64(Some(42))]]);
    let mut alice = Customer::named("Alice", 31);
    let key = harness
        .engine
        .session(&mut harness.connection)
        .insert(&mut alice, WriteOptions::new())
        .await
        .expect("Failed to insert Alice");
    assert_eq!(key, Value::Int64(Some(42)));
    assert_eq!(alice.id, 42);
    let command = harness.connection.last().expect("Nothing was sent");
    assert_eq!(command.parameter("id"), None);
    assert_eq!(
        command.parameter("email_address"),
        Some(&Value::Varchar(Some("alice@example.com".into())))
    );
    assert_eq!(command.parameters.len(), 3);

    // Primary key by convention, returned by the merge
    harness
        .connection
        .push_rows(&["sku_id"], vec![vec![Value::Varchar(Some("A-1".into()))]]);
    let mut anchor = Sku {
        sku_id: "A-1".into(),
        label: "Anchor".into(),
        price: 12.5,
    };
    let key = harness
        .engine
        .session(&mut harness.connection)
        .merge(&mut anchor, WriteOptions::new())
        .await
        .expect("Failed to merge the anchor");
    assert_eq!(key, Value::Varchar(Some("A-1".into())));
    assert_eq!(anchor.sku_id, "A-1");
    let command = harness.connection.last().expect("Nothing was sent");
    assert_eq!(
        command.parameter("price"),
        Some(&Value::Float64(Some(12.5)))
    );

    // Nothing to write back
    let mut entry = AuditEntry {
        message: "started".into(),
        level: 1,
    };
    let key = harness
        .engine
        .session(&mut harness.connection)
        .insert(&mut entry, WriteOptions::new())
        .await
        .expect("Failed to insert the audit entry");
    assert_eq!(key, Value::Null);
    let error = harness
        .engine
        .session(&mut harness.connection)
        .merge(&mut entry, WriteOptions::new())
        .await
        .expect_err("Merging requires a key");
    assert!(matches!(
        error.downcast_ref::<Error>(),
        Some(Error::Mapping(..))
    ));
    let error = harness
        .engine
        .session(&mut harness.connection)
        .delete_entity(&entry)
        .await
        .expect_err("Deleting an entity requires a key");
    assert!(matches!(
        error.downcast_ref::<Error>(),
        Some(Error::Mapping(..))
    ));
}
