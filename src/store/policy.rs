use std::future::Future;
use std::time::Duration;

use crate::configuration::StoreSettings;
use crate::error::DatabaseError;

/// Timeout and retry bounds for a single store call
#[derive(Debug, Clone)]
pub struct CallPolicy {
    timeout: Duration,
    max_retries: u32,
    retry_backoff: Duration,
}

impl CallPolicy {
    pub fn new(timeout: Duration, max_retries: u32, retry_backoff: Duration) -> Self {
        Self {
            timeout,
            max_retries,
            retry_backoff,
        }
    }

    pub fn from_settings(settings: &StoreSettings) -> Self {
        Self::new(
            settings.timeout(),
            settings.max_retries,
            settings.retry_backoff(),
        )
    }

    /// Run `call` under the timeout; retry with exponential backoff while
    /// the store reports `Unavailable`. Timeouts are not retried.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, DatabaseError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DatabaseError>>,
    {
        let mut attempt: u32 = 0;

        loop {
            match tokio::time::timeout(self.timeout, call()).await {
                Err(_) => {
                    tracing::error!(
                        operation,
                        timeout_secs = self.timeout.as_secs(),
                        "Store call timed out"
                    );
                    return Err(DatabaseError::Timeout(format!(
                        "{} exceeded {}s",
                        operation,
                        self.timeout.as_secs()
                    )));
                }
                Ok(Err(DatabaseError::Unavailable(msg))) if attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_backoff * 2u32.saturating_pow(attempt - 1);
                    tracing::warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %msg,
                        "Store unavailable, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(result) => return result,
            }
        }
    }
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self::from_settings(&StoreSettings::default())
    }
}
