use tracing::info;

/// Progress reporting for a scrape run.
/// Frontends implement this to surface status; every method defaults to a no-op.
pub trait Progress: Send {
    /// Called once before the first page with the number of pages planned.
    fn begin(&mut self, _total: u32) {}

    /// Free-form status line.
    fn log(&mut self, _msg: &str) {}

    /// Called after each page, whether it succeeded or not.
    fn page_done(&mut self, _page: u32, _total: u32) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Reports progress through `tracing`, prefixed with the category.
pub struct LogProgress {
    label: String,
}

impl LogProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl Progress for LogProgress {
    fn begin(&mut self, total: u32) {
        info!("[{}] scraping {} page(s)", self.label, total);
    }

    fn log(&mut self, msg: &str) {
        info!("[{}] {}", self.label, msg);
    }

    fn page_done(&mut self, page: u32, total: u32) {
        info!("[{}] page {}/{} done", self.label, page, total);
    }

    fn finish(&mut self) {
        info!("[{}] finished", self.label);
    }
}
