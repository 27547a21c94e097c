use crate::{DbField, Result};
use parking_lot::Mutex;
use std::{collections::HashMap, future::Future, sync::Arc};
use tokio::sync::OnceCell;

/// Column metadata by `(provider, table)`, read from the database once.
///
/// Concurrent readers of the same table share a single introspection command. A failed command leaves the entry
/// empty.
#[derive(Default)]
pub struct DbFieldCache {
    entries: Mutex<HashMap<(String, String), Arc<OnceCell<Arc<[DbField]>>>>>,
}

impl DbFieldCache {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get(&self, provider: &str, table: &str) -> Option<Arc<[DbField]>> {
        self.entries
            .lock()
            .get(&(provider.to_string(), table.to_string()))
            .and_then(|v| v.get().cloned())
    }

    pub async fn get_or_fetch<F, Fut>(
        &self,
        provider: &str,
        table: &str,
        fetch: F,
    ) -> Result<Arc<[DbField]>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<DbField>>>,
    {
        let cell = self
            .entries
            .lock()
            .entry((provider.to_string(), table.to_string()))
            .or_default()
            .clone();
        cell.get_or_try_init(|| async {
            let fields = fetch().await?;
            log::debug!(
                "Read {} columns of `{table}` on `{provider}`",
                fields.len()
            );
            Ok::<_, anyhow::Error>(Arc::from(fields))
        })
        .await
        .cloned()
    }

    pub fn flush(&self) {
        self.entries.lock().clear();
    }
}
