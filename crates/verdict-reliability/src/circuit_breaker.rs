//! Circuit breaker
//!
//! Three states: `Closed`, `Open`, `HalfOpen`. The state check-and-admit
//! and the outcome recording are each serialized by a mutex; the mutex is
//! *not* held while the wrapped call runs. Time comes from a [`Clock`]
//! trait so the open-to-half-open cooldown is testable without sleeping.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use verdict_types::error::{Result, VerdictError};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Every call is attempted
    Closed,
    /// Every call is rejected fast until the cooldown elapses
    Open,
    /// One probe admitted; its outcome decides the next state
    HalfOpen,
}

impl CircuitState {
    /// Lowercase name for health reports
    pub fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Clock abstraction for testability
pub trait Clock: Send + Sync {
    /// Monotonic time in milliseconds
    fn now_ms(&self) -> u64;
}

/// Real monotonic clock
#[derive(Debug, Default)]
pub struct SystemClock {
    origin: std::sync::OnceLock<std::time::Instant>,
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        let origin = *self.origin.get_or_init(std::time::Instant::now);
        u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// How long the circuit stays open before admitting a probe
    pub recovery_timeout: std::time::Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: std::time::Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    failures: u32,
    last_failure_ms: Option<u64>,
}

/// Mutex-guarded circuit breaker
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a breaker with the real clock
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self::with_clock(name, config, Arc::new(SystemClock::default()))
    }

    /// Create a breaker with an injected clock (tests)
    pub fn with_clock(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            clock,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failures: 0,
                last_failure_ms: None,
            }),
        }
    }

    /// Breaker name, used in errors and health reports
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state
    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    /// Run `f` through the circuit.
    ///
    /// In `Open`, the call is rejected with [`VerdictError::CircuitOpen`]
    /// without invoking `f` until the cooldown elapses; the first call
    /// after the cooldown is admitted as a half-open probe. The mutex is
    /// released while `f` runs.
    pub async fn call<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        {
            let mut inner = self.inner.lock().await;
            if inner.state == CircuitState::Open {
                let elapsed = inner
                    .last_failure_ms
                    .map(|t| self.clock.now_ms().saturating_sub(t));
                match elapsed {
                    Some(ms) if ms >= self.config.recovery_timeout.as_millis() as u64 => {
                        debug!(breaker = %self.name, "cooldown elapsed, admitting half-open probe");
                        inner.state = CircuitState::HalfOpen;
                    }
                    _ => {
                        return Err(VerdictError::CircuitOpen(self.name.clone()));
                    }
                }
            }
        }

        let outcome = f().await;

        let mut inner = self.inner.lock().await;
        match &outcome {
            Ok(_) => {
                inner.failures = 0;
                inner.state = CircuitState::Closed;
            }
            Err(_) => {
                inner.last_failure_ms = Some(self.clock.now_ms());
                inner.failures += 1;
                if inner.state == CircuitState::HalfOpen
                    || inner.failures >= self.config.failure_threshold
                {
                    if inner.state != CircuitState::Open {
                        warn!(
                            breaker = %self.name,
                            failures = inner.failures,
                            "circuit opened"
                        );
                    }
                    inner.state = CircuitState::Open;
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct TestClock(AtomicU64);

    impl TestClock {
        fn advance(&self, ms: u64) {
            self.0.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl Clock for &'static TestClock {
        fn now_ms(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn breaker(threshold: u32, recovery_ms: u64, clock: &'static TestClock) -> CircuitBreaker {
        CircuitBreaker::with_clock(
            "publisher",
            CircuitBreakerConfig {
                failure_threshold: threshold,
                recovery_timeout: Duration::from_millis(recovery_ms),
            },
            Arc::new(clock),
        )
    }

    async fn failing(cb: &CircuitBreaker) -> Result<()> {
        cb.call(|| async { Err::<(), _>(VerdictError::Messaging("down".into())) })
            .await
            .map(|_| ())
    }

    #[tokio::test]
    async fn opens_after_threshold_failures() {
        static CLOCK: TestClock = TestClock(AtomicU64::new(0));
        let cb = breaker(3, 50, &CLOCK);

        for _ in 0..3 {
            assert!(failing(&cb).await.is_err());
        }
        assert_eq!(cb.state().await, CircuitState::Open);

        // Rejected fast, wrapped function not invoked
        let invoked = AtomicUsize::new(0);
        let err = cb
            .call(|| async {
                invoked.fetch_add(1, Ordering::SeqCst);
                Ok::<_, VerdictError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, VerdictError::CircuitOpen(_)));
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_probe_closes_after_cooldown() {
        static CLOCK: TestClock = TestClock(AtomicU64::new(0));
        let cb = breaker(3, 50, &CLOCK);

        for _ in 0..3 {
            assert!(failing(&cb).await.is_err());
        }
        assert_eq!(cb.state().await, CircuitState::Open);

        CLOCK.advance(100);
        cb.call(|| async { Ok::<_, VerdictError>(()) }).await.unwrap();
        assert_eq!(cb.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn failed_probe_reopens() {
        static CLOCK: TestClock = TestClock(AtomicU64::new(0));
        let cb = breaker(2, 50, &CLOCK);

        for _ in 0..2 {
            assert!(failing(&cb).await.is_err());
        }
        CLOCK.advance(60);
        assert!(failing(&cb).await.is_err());
        assert_eq!(cb.state().await, CircuitState::Open);

        // Cooldown restarts from the probe failure
        CLOCK.advance(30);
        let err = failing(&cb).await.unwrap_err();
        assert!(matches!(err, VerdictError::CircuitOpen(_)));
    }

    #[tokio::test]
    async fn success_resets_failure_counter() {
        static CLOCK: TestClock = TestClock(AtomicU64::new(0));
        let cb = breaker(2, 50, &CLOCK);

        assert!(failing(&cb).await.is_err());
        cb.call(|| async { Ok::<_, VerdictError>(()) }).await.unwrap();
        // Counter was zeroed, so one more failure does not open
        assert!(failing(&cb).await.is_err());
        assert_eq!(cb.state().await, CircuitState::Closed);
    }
}
