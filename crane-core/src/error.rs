use crate::CommandKind;
use thiserror::Error;

/// Failure taxonomy of the engine.
///
/// Operations return [`anyhow::Result`], the variants below travel inside it and can be recovered with
/// `error.downcast_ref::<crane::Error>()` even after context was attached.
#[derive(Debug, Error)]
pub enum Error {
    /// Table, field or key cannot be determined unambiguously.
    #[error("Mapping error: {0}")]
    Mapping(String),
    /// A filter shape without a SQL counterpart.
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),
    #[error("Provider `{provider}` has no registered {capability}")]
    UnsupportedProvider {
        provider: String,
        capability: &'static str,
    },
    #[error("Statement builder could not produce {kind} for table `{table}`")]
    Builder { kind: CommandKind, table: String },
    #[error("Execution of {kind} on table `{table}` failed")]
    Execution { kind: CommandKind, table: String },
    #[error("A {capability} is already registered for `{key}`")]
    AlreadyRegistered {
        capability: &'static str,
        key: String,
    },
    #[error("Parameter `{parameter}` of {kind} on table `{table}` holds a value the provider rejects")]
    InvalidValue {
        kind: CommandKind,
        table: String,
        parameter: String,
    },
    #[error("Execution of {kind} on table `{table}` was cancelled by the trace")]
    Cancelled { kind: CommandKind, table: String },
}

impl Error {
    pub fn mapping(message: impl Into<String>) -> anyhow::Error {
        Error::Mapping(message.into()).into()
    }
    pub fn unsupported(construct: impl Into<String>) -> anyhow::Error {
        Error::UnsupportedExpression(construct.into()).into()
    }
}
