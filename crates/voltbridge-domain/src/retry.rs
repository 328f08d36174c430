use std::future::Future;
use std::time::Duration;

/// Retry policy for startup preconditions.
///
/// The gateway never retries mid-run — a lost session ends the run and an
/// external supervisor restarts the whole process. The policy object exists
/// so deployments that want a bounded startup grace period can configure one;
/// the default is a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no backoff.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Fixed backoff between a bounded number of attempts.
    pub fn fixed(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Run `attempt` until it reports success or attempts are exhausted,
    /// sleeping the backoff between tries.
    pub async fn run<F, Fut>(&self, mut attempt: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        for n in 1..=self.max_attempts {
            if attempt().await {
                return true;
            }
            if n < self.max_attempts {
                tokio::time::sleep(self.backoff).await;
            }
        }
        false
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn no_retry_attempts_exactly_once() {
        let calls = AtomicU32::new(0);
        let ok = RetryPolicy::no_retry()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { false }
            })
            .await;

        assert!(!ok);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fixed_policy_stops_on_first_success() {
        let calls = AtomicU32::new(0);
        let ok = RetryPolicy::fixed(5, Duration::from_millis(1))
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { n == 2 }
            })
            .await;

        assert!(ok);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fixed_policy_exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let ok = RetryPolicy::fixed(3, Duration::from_millis(1))
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { false }
            })
            .await;

        assert!(!ok);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        assert_eq!(RetryPolicy::fixed(0, Duration::ZERO).max_attempts(), 1);
    }
}
