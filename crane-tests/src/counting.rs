use anyhow::anyhow;
use crane::{CommandRequest, Result, StatementBuilder};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Builder counting the statements it writes, optionally failing the first ones.
pub struct CountingBuilder {
    inner: Arc<dyn StatementBuilder>,
    builds: AtomicUsize,
    failures: AtomicUsize,
}

impl CountingBuilder {
    pub fn new(inner: Arc<dyn StatementBuilder>) -> Self {
        Self {
            inner,
            builds: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }
    /// The next `count` calls to `build` fail.
    pub fn failing(self, count: usize) -> Self {
        self.failures.store(count, Ordering::SeqCst);
        self
    }
    /// Calls to `build`, failed ones included.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl StatementBuilder for CountingBuilder {
    fn as_dyn(&self) -> &dyn StatementBuilder {
        self
    }

    fn build(&self, request: &CommandRequest) -> Result<String> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1))
            .is_ok();
        if failing {
            return Err(anyhow!("Scripted failure writing {}", request.kind));
        }
        self.inner.build(request)
    }
}
