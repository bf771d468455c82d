use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Trailing-edge delay applied to search input.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Trailing debouncer: of several calls to `settle` overlapping within
/// `wait`, only the last one returns `true`.
#[derive(Clone, Debug)]
pub struct Debouncer {
    generation: Arc<AtomicU64>,
    wait: Duration,
}

impl Debouncer {
    pub fn new(wait: Duration) -> Self {
        Self { generation: Arc::new(AtomicU64::new(0)), wait }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Sleep for the window; `false` if a newer call arrived meanwhile.
    pub async fn settle(&self) -> bool {
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.wait).await;
        self.generation.load(Ordering::SeqCst) == mine
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}
