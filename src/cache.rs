use std::time::{Duration, Instant};

/// How long a cached client list stays fresh.
pub const USER_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// A single-value read cache with a fixed expiry and explicit invalidation.
/// Owned and injected by whoever needs it; there is no global instance.
#[derive(Debug)]
pub struct TimedCache<T> {
    ttl: Duration,
    entry: Option<(Instant, T)>,
}

impl<T> TimedCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// The cached value, unless it has expired or was never stored.
    pub fn get(&self) -> Option<&T> {
        match &self.entry {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Some(value),
            _ => None,
        }
    }

    pub fn store(&mut self, value: T) {
        self.entry = Some((Instant::now(), value));
    }

    /// Drops the cached value; the next read goes to the source. Call this
    /// after any mutation of the cached data.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
