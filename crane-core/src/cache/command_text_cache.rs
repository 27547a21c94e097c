use crate::{
    CacheStats, CommandKey, CommandRequest, Error, FlightMap, Result, StatementBuilder,
};
use anyhow::Context;
use std::sync::Arc;

/// Generated SQL text by [`CommandKey`].
///
/// The builder runs only on a miss and at most once per key at a time, see [`CommandTextCache::get_or_build`].
#[derive(Default)]
pub struct CommandTextCache {
    map: FlightMap<CommandKey, Arc<str>>,
}

impl CommandTextCache {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get(&self, key: &CommandKey) -> Option<Arc<str>> {
        self.map.get(key)
    }

    /// Stored text of `key`, or the text returned by `build`. Concurrent callers missing the same key wait for a
    /// single build. An error is returned to the caller that built and the key stays empty.
    pub fn get_or_build(
        &self,
        key: &CommandKey,
        build: impl FnOnce() -> Result<String>,
    ) -> Result<Arc<str>> {
        self.map
            .get_or_try_build(key, || build().map(Arc::from))
    }

    /// Text of `request`, written by `builder` on a miss.
    pub fn get_or_build_request(
        &self,
        provider: &str,
        request: &CommandRequest,
        builder: &dyn StatementBuilder,
    ) -> Result<Arc<str>> {
        let key = request.key(provider);
        self.get_or_build(&key, || {
            log::debug!(
                "Building {} for `{}` on `{provider}` (filter `{}`, batch size {})",
                request.kind,
                request.table,
                key.filter,
                request.batch_size,
            );
            builder.build(request).with_context(|| Error::Builder {
                kind: request.kind,
                table: request.table.to_string(),
            })
        })
    }

    pub fn flush(&self) {
        self.map.flush();
    }

    pub fn stats(&self) -> CacheStats {
        self.map.stats()
    }
}
