mod batching;
mod caching;
mod concurrency;
mod counting;
mod crud;
mod fixtures;
mod harness;
mod keys;
mod recording;
mod trace;

pub use counting::*;
pub use fixtures::*;
pub use harness::*;
pub use recording::*;

use crate::{
    batching::batch_partitioning,
    caching::{builder_failure_retry, cache_idempotence, flush_keeps_delegates, shape_partitioning},
    concurrency::{concurrent_single_flight, joint_single_flight},
    crud::{aggregates, crud},
    keys::generated_keys,
    trace::{trace_cancellation, trace_outcomes},
};
use crane::Registry;
use log::LevelFilter;
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs every shared scenario against the capabilities `register` installs for `provider`.
pub async fn execute_tests(provider: &'static str, register: fn(&Registry)) {
    cache_idempotence(provider, register).await;
    shape_partitioning(provider, register).await;
    flush_keeps_delegates(provider, register).await;
    builder_failure_retry(provider, register).await;
    batch_partitioning(provider, register).await;
    generated_keys(provider, register).await;
    trace_cancellation(provider, register).await;
    trace_outcomes(provider, register).await;
    crud(provider, register).await;
    aggregates(provider, register).await;
    concurrent_single_flight(provider, register).await;
    joint_single_flight(provider, register).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
