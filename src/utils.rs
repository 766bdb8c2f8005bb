use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

// Generic URL shape: optional http(s) scheme, domain name or IPv4 address,
// optional port, path, query string and fragment. Case-insensitive.
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(https?://)?((([a-z\d]([a-z\d-]*[a-z\d])*)\.)+[a-z]{2,}|((\d{1,3}\.){3}\d{1,3}))(:\d+)?(/[-a-z\d%_.~+]*)*(\?[;&a-z\d%_.~+=-]*)?(#[-a-z\d_]*)?$",
    )
    .unwrap()
});

/// Syntactic URL validation
///
/// Returns true iff the string matches the generic URL shape above. No
/// network lookup is performed and malformed input never panics.
pub fn is_valid_url(url: &str) -> bool {
    URL_PATTERN.is_match(url)
}

/// Async sleep helper in milliseconds
pub async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Collapses rapid repeated calls into a single delayed invocation
///
/// Each [`call`](Debouncer::call) aborts the previously scheduled invocation
/// and re-arms the timer, so a burst of calls within the delay window runs
/// the callback exactly once, with the last argument. Requires a running
/// tokio runtime.
pub struct Debouncer<A: Send + 'static> {
    delay: Duration,
    callback: Arc<dyn Fn(A) + Send + Sync>,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<A: Send + 'static> Debouncer<A> {
    pub fn new<F>(delay: Duration, callback: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            delay,
            callback: Arc::new(callback),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Schedule the callback with `arg`, cancelling any pending invocation
    pub fn call(&self, arg: A) {
        let callback = self.callback.clone();
        let delay = self.delay;

        let mut pending = self.pending.lock().unwrap();
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback(arg);
        }));
    }

    /// Whether an invocation is currently scheduled
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let millis = duration.subsec_millis();

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else if seconds > 0 {
        format!("{}.{}s", seconds, millis / 100)
    } else {
        format!("{millis}ms")
    }
}

pub fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
