use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Indicates whether an error should be retried or treated as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

/// A successful outcome together with the number of attempts it took.
#[derive(Debug)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: usize,
}

/// Result of running an operation under the retry policy.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The error was considered fatal and should bubble up immediately.
    Fatal { error: E, attempts: usize },
    /// The error was retryable, but the configured attempts were exhausted.
    AttemptsExceeded { error: E, attempts: usize },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> usize {
        match self {
            RetryError::Fatal { attempts, .. } | RetryError::AttemptsExceeded { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal { error, .. } | RetryError::AttemptsExceeded { error, .. } => error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_retry_limit(3, Duration::from_millis(200), Duration::from_secs(5))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: if max_delay.is_zero() {
                base_delay
            } else {
                max_delay
            },
        }
    }

    /// `retry_limit` counts retries after the first attempt.
    pub fn from_retry_limit(retry_limit: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self::new(retry_limit.saturating_add(1), base_delay, max_delay)
    }

    /// Policy that never sleeps between attempts.
    pub fn immediate(retry_limit: usize) -> Self {
        Self::from_retry_limit(retry_limit, Duration::ZERO, Duration::ZERO)
    }

    pub fn retry_limit(&self) -> usize {
        self.max_attempts - 1
    }

    /// Executes the operation with the configured retry policy.
    ///
    /// The closure receives the zero-based attempt number.
    pub async fn run<F, Fut, T, E, Classifier>(
        &self,
        mut op: F,
        classify: Classifier,
    ) -> Result<Attempted<T>, RetryError<E>>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Classifier: Fn(&E) -> RetryDisposition,
    {
        let mut attempt = 0;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    return Ok(Attempted {
                        value,
                        attempts: attempt + 1,
                    });
                }
                Err(error) => match classify(&error) {
                    RetryDisposition::Stop => {
                        return Err(RetryError::Fatal {
                            error,
                            attempts: attempt + 1,
                        });
                    }
                    RetryDisposition::Retry => {
                        if attempt + 1 >= self.max_attempts {
                            return Err(RetryError::AttemptsExceeded {
                                error,
                                attempts: attempt + 1,
                            });
                        }

                        sleep(self.backoff_delay(attempt)).await;
                        attempt += 1;
                    }
                },
            }
        }
    }

    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::from_millis(0);
        }

        let factor = 1u128 << attempt.min(16);
        let delay_ms = self.base_delay.as_millis().saturating_mul(factor);
        let capped = delay_ms.min(self.max_delay.as_millis());
        Duration::from_millis(capped as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    fn classify(err: &&str) -> RetryDisposition {
        if *err == "transient" {
            RetryDisposition::Retry
        } else {
            RetryDisposition::Stop
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy =
            RetryPolicy::from_retry_limit(5, Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(policy.max_attempts, 6);
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(350));
        assert_eq!(policy.backoff_delay(40), Duration::from_millis(350));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::immediate(3);

        let result = policy
            .run(
                |_| {
                    let calls = calls.clone();
                    async move {
                        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                            Err("transient")
                        } else {
                            Ok(42)
                        }
                    }
                },
                classify,
            )
            .await
            .unwrap();

        assert_eq!(result.value, 42);
        assert_eq!(result.attempts, 3);
    }

    #[tokio::test]
    async fn fatal_error_stops_immediately() {
        let policy = RetryPolicy::immediate(3);
        let err = policy
            .run(|_| async { Err::<(), _>("rejected") }, classify)
            .await
            .unwrap_err();

        assert!(matches!(err, RetryError::Fatal { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn exhausts_after_limit() {
        let policy = RetryPolicy::immediate(2);
        let err = policy
            .run(|_| async { Err::<(), _>("transient") }, classify)
            .await
            .unwrap_err();

        assert_eq!(err.attempts(), 3);
        assert!(matches!(err, RetryError::AttemptsExceeded { .. }));
    }
}
