use crate::{Command, CommandKind, QueryResult, RowsAffected, truncate_long};
use std::time::Duration;

/// Hooks fired around every command the session sends to a connection.
///
/// `before_execution` can cancel the command, in which case the connection is never called and
/// `after_execution` does not fire.
pub trait Trace: Send + Sync {
    fn before_execution(&self, _log: &mut CancellableTraceLog) {}
    fn after_execution(&self, _log: &ResultTraceLog) {}
}

/// Command about to be sent.
#[derive(Debug)]
pub struct CancellableTraceLog<'a> {
    pub kind: CommandKind,
    pub table: &'a str,
    pub command: &'a Command,
    cancelled: Option<bool>,
}

impl<'a> CancellableTraceLog<'a> {
    pub fn new(kind: CommandKind, table: &'a str, command: &'a Command) -> Self {
        Self {
            kind,
            table,
            command,
            cancelled: None,
        }
    }
    /// Stops the command. With `throw` the operation fails with [`crate::Error::Cancelled`], otherwise it returns
    /// its empty result.
    pub fn cancel(&mut self, throw: bool) {
        self.cancelled = Some(throw);
    }
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.is_some()
    }
    pub fn throws(&self) -> bool {
        self.cancelled.unwrap_or_default()
    }
}

/// What came back from the connection.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceOutcome {
    /// Number of rows plus the affected counts reported along.
    Completed { rows: usize, affected: RowsAffected },
    Failed(String),
}

impl TraceOutcome {
    pub fn of(results: &[QueryResult]) -> Self {
        let mut rows = 0;
        let mut affected = RowsAffected::default();
        for result in results {
            match result {
                QueryResult::Row(..) => rows += 1,
                QueryResult::Affected(v) => affected.extend([*v]),
            }
        }
        Self::Completed { rows, affected }
    }
}

/// Command executed, with its outcome and duration.
#[derive(Debug)]
pub struct ResultTraceLog<'a> {
    pub kind: CommandKind,
    pub table: &'a str,
    pub command: &'a Command,
    pub outcome: TraceOutcome,
    pub elapsed: Duration,
}

/// Writes every command to the `log` facade.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogTrace;

impl Trace for LogTrace {
    fn before_execution(&self, log: &mut CancellableTraceLog) {
        log::debug!(
            "{} on `{}`: {}",
            log.kind,
            log.table,
            truncate_long!(log.command.text)
        );
    }
    fn after_execution(&self, log: &ResultTraceLog) {
        match &log.outcome {
            TraceOutcome::Completed { rows, affected } => log::debug!(
                "{} on `{}` completed in {:?}: {rows} rows, {} affected",
                log.kind,
                log.table,
                log.elapsed,
                affected.rows_affected,
            ),
            TraceOutcome::Failed(error) => log::warn!(
                "{} on `{}` failed after {:?}: {error}",
                log.kind,
                log.table,
                log.elapsed
            ),
        }
    }
}
