mod command_text_cache;
mod db_field_cache;
mod execution_context_cache;
mod flight;

pub use command_text_cache::*;
pub use db_field_cache::*;
pub use execution_context_cache::*;
pub(crate) use flight::*;

/// Counters of a cache since its creation, flushes do not reset them.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently stored.
    pub entries: usize,
    /// Lookups answered with a stored entry.
    pub hits: u64,
    /// Successful builds.
    pub builds: u64,
}
