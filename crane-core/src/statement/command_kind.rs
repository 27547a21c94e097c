use std::fmt::{self, Display};

/// Operation shapes the engine generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Query,
    QueryAll,
    BatchQuery,
    Insert,
    InsertAll,
    Update,
    UpdateAll,
    Merge,
    MergeAll,
    Delete,
    DeleteAll,
    Count,
    CountAll,
    Average,
    AverageAll,
    Min,
    MinAll,
    Max,
    MaxAll,
    Sum,
    SumAll,
    Exists,
    Truncate,
    /// Caller supplied text returning rows.
    ExecuteQuery,
    /// Caller supplied text returning an affected count.
    ExecuteNonQuery,
}

impl CommandKind {
    /// SQL function and result alias of the aggregate kinds.
    pub fn aggregate(&self) -> Option<(&'static str, &'static str)> {
        use CommandKind::*;
        Some(match self {
            Average | AverageAll => ("AVG", "AverageValue"),
            Min | MinAll => ("MIN", "MinValue"),
            Max | MaxAll => ("MAX", "MaxValue"),
            Sum | SumAll => ("SUM", "SumValue"),
            _ => return None,
        })
    }
    /// Kinds whose text depends on the number of rows written at once.
    pub fn is_batched(&self) -> bool {
        matches!(
            self,
            CommandKind::InsertAll | CommandKind::UpdateAll | CommandKind::MergeAll
        )
    }
}

impl Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
