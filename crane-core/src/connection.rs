use crate::{
    Command, QueryResult, Result, RowLabeled, RowsAffected,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::future::Future;

/// Live database session consumed by the engine.
///
/// Only `run` must be implemented. The engine never opens or closes connections, it hands over a finished
/// [`Command`] and reads back rows or affected counts.
pub trait Connection: Send {
    /// Key of the capabilities registered for this kind of connection (e.g. `"postgres"`).
    fn provider(&self) -> &str;

    /// General method to send any command and return any result type (either row or count).
    fn run(&mut self, command: Command) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Execute the command and return the rows.
    fn fetch(&mut self, command: Command) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(command).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Execute the command and return the total number of rows affected.
    fn execute(&mut self, command: Command) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(command)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }
}
