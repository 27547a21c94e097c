use anyhow::anyhow;
use crane::{
    Command, Connection, QueryResult, Result, RowLabeled, RowNames, RowsAffected, Value,
    stream::{self, Stream},
};
use parking_lot::Mutex;
use std::{collections::VecDeque, sync::Arc};

#[derive(Default)]
struct State {
    commands: Vec<Command>,
    results: VecDeque<std::result::Result<Vec<QueryResult>, String>>,
}

/// Connection answering with scripted results and keeping every command it receives.
///
/// Commands without a scripted result report zero affected rows. Clones share the same log and script.
#[derive(Clone)]
pub struct RecordingConnection {
    provider: String,
    state: Arc<Mutex<State>>,
}

impl RecordingConnection {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            state: Default::default(),
        }
    }

    /// Rows returned by the next unanswered command.
    pub fn push_rows(&self, labels: &[&str], rows: Vec<Vec<Value>>) {
        let labels: RowNames = labels.iter().map(|v| v.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|v| QueryResult::Row(RowLabeled::new(labels.clone(), v.into_boxed_slice())))
            .collect();
        self.state.lock().results.push_back(Ok(rows));
    }

    pub fn push_affected(&self, rows_affected: u64) {
        self.state
            .lock()
            .results
            .push_back(Ok(vec![QueryResult::Affected(RowsAffected {
                rows_affected,
                last_affected_id: None,
            })]));
    }

    pub fn push_error(&self, message: impl Into<String>) {
        self.state.lock().results.push_back(Err(message.into()));
    }

    pub fn commands(&self) -> Vec<Command> {
        self.state.lock().commands.clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.state
            .lock()
            .commands
            .iter()
            .map(|v| v.text.to_string())
            .collect()
    }

    pub fn last(&self) -> Option<Command> {
        self.state.lock().commands.last().cloned()
    }

    /// Forgets the recorded commands, the script is kept.
    pub fn clear(&self) {
        self.state.lock().commands.clear();
    }
}

impl Connection for RecordingConnection {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn run(&mut self, command: Command) -> impl Stream<Item = Result<QueryResult>> + Send {
        let mut state = self.state.lock();
        log::trace!("Recorded {command}");
        state.commands.push(command);
        let items = match state.results.pop_front() {
            Some(Ok(results)) => results.into_iter().map(Ok).collect(),
            Some(Err(message)) => vec![Err(anyhow!(message))],
            None => vec![Ok(QueryResult::Affected(RowsAffected::default()))],
        };
        stream::iter(items)
    }
}
