use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;

// Trailing window every client's quota is counted over
pub const WINDOW: Duration = Duration::from_secs(60);

// Time source for the limiter. `now` is the time elapsed since the clock's own origin,
// so it never goes backwards.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

// Sliding window limiter, stale timestamps are purged lazily per client
pub struct RateLimiter<C = MonotonicClock> {
    requests_per_minute: u32,
    // client id -> accepted request times, oldest first
    history: DashMap<String, VecDeque<Duration>>,
    clock: C,
}

impl RateLimiter<MonotonicClock> {
    pub fn new(requests_per_minute: u32) -> Self {
        Self::with_clock(requests_per_minute, MonotonicClock::new())
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(requests_per_minute: u32, clock: C) -> Self {
        Self {
            requests_per_minute,
            history: DashMap::new(),
            clock,
        }
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    // Number of distinct client ids currently held
    pub fn tracked_clients(&self) -> usize {
        self.history.len()
    }

    // The entry guard holds the client's shard lock across purge, check and append
    pub fn is_rate_limited(&self, client_id: &str) -> bool {
        let now = self.clock.now();

        let mut history = self.history.entry(client_id.to_string()).or_default();

        if let Some(cutoff) = now.checked_sub(WINDOW) {
            purge(&mut history, cutoff);
        }

        if history.len() >= self.requests_per_minute as usize {
            tracing::debug!(client_id, count = history.len(), "rate limited");
            return true;
        }

        history.push_back(now);
        false
    }

    // Forgets clients with no live timestamps, returns how many were removed
    pub fn sweep(&self) -> usize {
        let Some(cutoff) = self.clock.now().checked_sub(WINDOW) else {
            return 0;
        };

        let before = self.history.len();
        self.history.retain(|_, history| {
            purge(history, cutoff);
            !history.is_empty()
        });

        before.saturating_sub(self.history.len())
    }
}

// Timestamps at or before the cutoff are outside the window (cutoff, now]
fn purge(history: &mut VecDeque<Duration>, cutoff: Duration) {
    while history.front().is_some_and(|ts| *ts <= cutoff) {
        history.pop_front();
    }
}

// Periodic sweep - only spawned when a sweep interval is configured
pub async fn sweeper<C: Clock>(limiter: Arc<RateLimiter<C>>, every: Duration) {
    let mut interval = interval(every);

    tracing::info!("Rate limit sweeper started (interval: {every:?})");

    loop {
        interval.tick().await;

        let removed = limiter.sweep();
        if removed > 0 {
            tracing::debug!(
                removed,
                remaining = limiter.tracked_clients(),
                "swept idle clients"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    // Clock that only moves when told to
    #[derive(Clone, Default)]
    struct ManualClock(Arc<AtomicU64>);

    impl ManualClock {
        fn set(&self, secs: f64) {
            let nanos = Duration::from_secs_f64(secs).as_nanos() as u64;
            self.0.store(nanos, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Duration {
            Duration::from_nanos(self.0.load(Ordering::SeqCst))
        }
    }

    fn limiter(requests_per_minute: u32) -> (RateLimiter<ManualClock>, ManualClock) {
        let clock = ManualClock::default();
        (RateLimiter::with_clock(requests_per_minute, clock.clone()), clock)
    }

    fn call_at(
        limiter: &RateLimiter<ManualClock>,
        clock: &ManualClock,
        client: &str,
        secs: f64,
    ) -> bool {
        clock.set(secs);
        limiter.is_rate_limited(client)
    }

    #[test]
    fn quota_exhausted_within_window() {
        let (limiter, clock) = limiter(2);

        assert!(!call_at(&limiter, &clock, "X", 0.0));
        assert!(!call_at(&limiter, &clock, "X", 1.0));
        assert!(call_at(&limiter, &clock, "X", 2.0));
    }

    #[test]
    fn old_request_leaves_window() {
        let (limiter, clock) = limiter(2);

        assert!(!call_at(&limiter, &clock, "X", 0.0));
        assert!(!call_at(&limiter, &clock, "X", 61.0));
    }

    #[test]
    fn full_quota_frees_up_just_after_sixty_seconds() {
        let (limiter, clock) = limiter(3);

        for _ in 0..3 {
            assert!(!call_at(&limiter, &clock, "X", 5.0));
        }
        assert!(call_at(&limiter, &clock, "X", 64.9));
        assert!(!call_at(&limiter, &clock, "X", 65.0001));
    }

    #[test]
    fn timestamp_exactly_at_cutoff_is_purged() {
        let (limiter, clock) = limiter(1);

        assert!(!call_at(&limiter, &clock, "X", 10.0));
        assert!(call_at(&limiter, &clock, "X", 69.999));
        assert!(!call_at(&limiter, &clock, "X", 70.0));
    }

    #[test]
    fn rejected_requests_are_not_recorded() {
        let (limiter, clock) = limiter(2);

        assert!(!call_at(&limiter, &clock, "X", 0.0));
        assert!(!call_at(&limiter, &clock, "X", 1.0));
        assert!(call_at(&limiter, &clock, "X", 2.0));
        assert!(call_at(&limiter, &clock, "X", 3.0));

        // only t=0 has expired; t=2 and t=3 were never counted
        assert!(!call_at(&limiter, &clock, "X", 60.5));
        assert!(call_at(&limiter, &clock, "X", 60.7));
        assert!(!call_at(&limiter, &clock, "X", 61.5));
    }

    #[test]
    fn clients_have_independent_buckets() {
        let (limiter, clock) = limiter(15);

        for t in 0..15 {
            assert!(!call_at(&limiter, &clock, "A", t as f64));
        }
        assert!(call_at(&limiter, &clock, "A", 14.0));
        assert!(!call_at(&limiter, &clock, "B", 14.0));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn first_request_always_passes() {
        for requests_per_minute in [1, 2, 15, 1000] {
            let (limiter, clock) = limiter(requests_per_minute);
            assert!(!call_at(&limiter, &clock, "fresh", 123.0));
        }
    }

    #[test]
    fn zero_quota_rejects_everyone() {
        let (limiter, clock) = limiter(0);

        assert!(call_at(&limiter, &clock, "A", 0.0));
        assert!(call_at(&limiter, &clock, "B", 0.0));
        assert!(call_at(&limiter, &clock, "A", 500.0));
        assert!(call_at(&limiter, &clock, "unknown", 1000.0));
    }

    #[test]
    fn placeholder_id_is_a_regular_bucket() {
        let (limiter, clock) = limiter(1);

        assert!(!call_at(&limiter, &clock, "unknown", 0.0));
        assert!(call_at(&limiter, &clock, "unknown", 0.5));
        assert!(!call_at(&limiter, &clock, "", 0.5));
    }

    #[test]
    fn concurrent_callers_never_exceed_quota() {
        let limiter = RateLimiter::with_clock(15, ManualClock::default());
        let admitted = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..25 {
                        if !limiter.is_rate_limited("shared") {
                            admitted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(admitted.load(Ordering::SeqCst), 15);
    }

    #[test]
    fn sweep_forgets_only_idle_clients() {
        let (limiter, clock) = limiter(5);

        call_at(&limiter, &clock, "idle", 0.0);
        call_at(&limiter, &clock, "active", 30.0);

        clock.set(45.0);
        assert_eq!(limiter.sweep(), 0);

        clock.set(70.0);
        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked_clients(), 1);

        // the surviving client's window is untouched
        for t in [71.0, 72.0, 73.0, 74.0] {
            assert!(!call_at(&limiter, &clock, "active", t));
        }
        assert!(call_at(&limiter, &clock, "active", 75.0));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_runs_on_its_interval() {
        let clock = ManualClock::default();
        let limiter = Arc::new(RateLimiter::with_clock(5, clock.clone()));

        call_at(&limiter, &clock, "idle", 0.0);
        call_at(&limiter, &clock, "active", 30.0);
        clock.set(45.0);

        tokio::spawn(sweeper(Arc::clone(&limiter), Duration::from_secs(10)));

        // first tick fires immediately, nothing is stale yet
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(limiter.tracked_clients(), 2);

        clock.set(70.0);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(limiter.tracked_clients(), 1);

        clock.set(95.0);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
