use crate::{Customer, Harness};
use crane::{
    CancellableTraceLog, CommandKind, Error, QueryOptions, Registry, ResultTraceLog, RowsAffected,
    Trace, TraceOutcome, filter,
};
use parking_lot::Mutex;
use std::sync::Arc;

struct Cancelling {
    throw: bool,
}

impl Trace for Cancelling {
    fn before_execution(&self, log: &mut CancellableTraceLog) {
        log.cancel(self.throw);
    }
}

#[derive(Default, Clone)]
struct Outcomes(Arc<Mutex<Vec<(CommandKind, TraceOutcome)>>>);

impl Trace for Outcomes {
    fn after_execution(&self, log: &ResultTraceLog) {
        self.0.lock().push((log.kind, log.outcome.clone()));
    }
}

pub async fn trace_cancellation(provider: &'static str, register: fn(&Registry)) {
    // Quiet
    let mut harness = Harness::build(provider, register, 0, |v| {
        v.trace(Cancelling { throw: false })
    });
    harness.prime::<Customer>().await;
    let mut session = harness.engine.session(&mut harness.connection);
    let customers = session
        .query::<Customer>(filter!(Customer::age > 18), QueryOptions::new())
        .await
        .expect("A quiet cancellation is not an error");
    assert!(customers.is_empty());
    let deleted = session
        .delete::<Customer>(filter!(Customer::age > 90))
        .await
        .expect("A quiet cancellation is not an error");
    assert_eq!(deleted, 0);
    assert!(harness.connection.commands().is_empty());

    // Throwing
    let mut harness = Harness::build(provider, register, 0, |v| {
        v.trace(Cancelling { throw: true })
    });
    harness.prime::<Customer>().await;
    let error = harness
        .engine
        .session(&mut harness.connection)
        .count::<Customer>(filter!(Customer::age > 18))
        .await
        .expect_err("The trace cancels every command");
    assert!(matches!(
        error.downcast_ref::<Error>(),
        Some(Error::Cancelled {
            kind: CommandKind::Count,
            ..
        })
    ));
    assert!(harness.connection.commands().is_empty());
}

pub async fn trace_outcomes(provider: &'static str, register: fn(&Registry)) {
    let outcomes = Outcomes::default();
    let trace = outcomes.clone();
    let mut harness = Harness::build(provider, register, 0, move |v| v.trace(trace));
    harness.prime::<Customer>().await;
    harness.connection.push_rows(
        &["id", "name", "email_address", "age"],
        vec![
            vec![1i64.into(), "Alice".into(), "alice@example.com".into(), 31.into()],
            vec![2i64.into(), "Bob".into(), Option::<String>::None.into(), 45.into()],
        ],
    );
    harness.connection.push_error("connection reset");
    let mut session = harness.engine.session(&mut harness.connection);
    let customers = session
        .query::<Customer>(filter!(Customer::age > 18), QueryOptions::new())
        .await
        .expect("Failed to query the customers");
    assert_eq!(customers.len(), 2);
    assert_eq!(customers[1].email, None);
    let error = session
        .count::<Customer>(filter!(Customer::age > 18))
        .await
        .expect_err("The connection is scripted to fail");
    assert!(matches!(
        error.downcast_ref::<Error>(),
        Some(Error::Execution {
            kind: CommandKind::Count,
            ..
        })
    ));

    let outcomes = outcomes.0.lock().clone();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(
        outcomes[0],
        (
            CommandKind::Query,
            TraceOutcome::Completed {
                rows: 2,
                affected: RowsAffected::default(),
            }
        )
    );
    let (kind, TraceOutcome::Failed(message)) = &outcomes[1] else {
        panic!("The count should have failed: {:?}", outcomes[1]);
    };
    assert_eq!(*kind, CommandKind::Count);
    assert!(message.contains("connection reset"), "{message}");
}
