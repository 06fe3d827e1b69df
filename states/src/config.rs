use std::time::Duration;

/// Default quiet interval before a search input is committed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Page size used by views that do not set their own.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Registry-wide settings shared by every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub debounce: Duration,
    pub default_page_size: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ControllerConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the fallback page size. Zero is rejected and keeps the old value.
    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        if page_size == 0 {
            log::warn!("Ignoring zero default page size, keeping {}", self.default_page_size);
        } else {
            self.default_page_size = page_size;
        }
        self
    }
}
