use crate::{Customer, Harness};
use crane::{Registry, Value, WriteOptions};
use std::{
    sync::{Arc, Barrier},
    thread,
};

const THREADS: i64 = 8;

pub async fn concurrent_single_flight(provider: &'static str, register: fn(&Registry)) {
    let mut harness = Harness::new(provider, register);
    harness.prime::<Customer>().await;
    for id in 1..=THREADS {
        harness
            .connection
            .push_rows(&["id"], vec![vec![Value::Int64(Some(id))]]);
    }
    let engine = &harness.engine;
    let connection = &harness.connection;
    let mut ids = thread::scope(|scope| {
        let handles = (0..THREADS)
            .map(|i| {
                let mut connection = connection.clone();
                scope.spawn(move || {
                    let mut customer = Customer::named(&format!("Thread{i}"), 40);
                    engine
                        .blocking_session(&mut connection)
                        .insert(&mut customer, WriteOptions::new())
                        .expect("Failed to insert from a thread");
                    customer.id
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|v| v.join().expect("An inserting thread panicked"))
            .collect::<Vec<_>>()
    });
    ids.sort();
    assert_eq!(ids, (1..=THREADS).collect::<Vec<_>>());

    // One build for every racing caller
    assert_eq!(harness.builder.builds(), 1);
    assert_eq!(harness.engine.contexts().stats().builds, 1);
    let commands = harness.connection.commands();
    assert_eq!(commands.len(), THREADS as usize);
    assert!(commands.iter().all(|v| Arc::ptr_eq(&v.text, &commands[0].text)));
}

/// Async sessions, each on its own runtime, race blocking sessions for the same statement.
pub async fn joint_single_flight(provider: &'static str, register: fn(&Registry)) {
    let mut harness = Harness::new(provider, register);
    harness.prime::<Customer>().await;
    for id in 1..=THREADS {
        harness
            .connection
            .push_rows(&["id"], vec![vec![Value::Int64(Some(id))]]);
    }
    let engine = &harness.engine;
    let connection = &harness.connection;
    let barrier = &Barrier::new(THREADS as usize);
    let mut ids = thread::scope(|scope| {
        let handles = (0..THREADS)
            .map(|i| {
                let mut connection = connection.clone();
                scope.spawn(move || {
                    let mut customer = Customer::named(&format!("Joint{i}"), 40);
                    if i % 2 == 0 {
                        let runtime = tokio::runtime::Builder::new_current_thread()
                            .enable_all()
                            .build()
                            .expect("Could not start a runtime");
                        barrier.wait();
                        runtime
                            .block_on(
                                engine
                                    .session(&mut connection)
                                    .insert(&mut customer, WriteOptions::new()),
                            )
                            .expect("Failed to insert from an async session");
                    } else {
                        barrier.wait();
                        engine
                            .blocking_session(&mut connection)
                            .insert(&mut customer, WriteOptions::new())
                            .expect("Failed to insert from a blocking session");
                    }
                    customer.id
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|v| v.join().expect("An inserting thread panicked"))
            .collect::<Vec<_>>()
    });
    ids.sort();
    assert_eq!(ids, (1..=THREADS).collect::<Vec<_>>());
    assert_eq!(harness.builder.builds(), 1);
    assert_eq!(harness.engine.contexts().stats().builds, 1);
    let commands = harness.connection.commands();
    assert!(commands.iter().all(|v| Arc::ptr_eq(&v.text, &commands[0].text)));
}
