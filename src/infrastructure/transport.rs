use std::future::Future;
use std::sync::RwLock;
use std::time::Duration;

use rand::Rng;
use reqwest::{Client, Response};

pub const RETRY_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];
pub const MAX_ATTEMPTS: u32 = 6;
const INITIAL_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(20);
/// Attempt at which the HTTP client is rebuilt to shed a possibly-poisoned
/// connection pool.
const REBUILD_AFTER_ATTEMPT: u32 = 3;

#[derive(Debug, thiserror::Error)]
#[error("transport: {0}")]
pub struct TransportError(pub String);

/// An HTTP client that hands out a fresh connection pool on late retry
/// attempts.
pub struct RefreshingClient {
    inner: RwLock<Client>,
    timeout: Duration,
}

impl RefreshingClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: RwLock::new(Self::build(timeout)),
            timeout,
        }
    }

    fn build(timeout: Duration) -> Client {
        Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client build never fails with valid TLS config")
    }

    pub fn get(&self, attempt: u32) -> Client {
        if attempt >= REBUILD_AFTER_ATTEMPT {
            let fresh = Self::build(self.timeout);
            *self.inner.write().expect("client lock poisoned") = fresh.clone();
            tracing::debug!(attempt, "rebuilt http client");
            return fresh;
        }
        self.inner.read().expect("client lock poisoned").clone()
    }
}

fn jittered(delay: Duration) -> Duration {
    delay + delay.mul_f64(rand::thread_rng().gen_range(0.0..0.5))
}

/// Run `op` until it yields a non-retriable outcome, with exponential
/// backoff plus uniform jitter between attempts. `op` receives the attempt
/// number (1-based) so callers can rebuild their client on late attempts.
///
/// A response with a retriable status on the final attempt is returned
/// as-is; the caller maps statuses to its own error type.
pub async fn send_with_retries<F, Fut>(op: F) -> Result<Response, TransportError>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut delay = INITIAL_DELAY;

    for attempt in 1..=MAX_ATTEMPTS {
        match op(attempt).await {
            Ok(response) => {
                let status = response.status().as_u16();
                if RETRY_STATUSES.contains(&status) && attempt < MAX_ATTEMPTS {
                    let sleep = jittered(delay);
                    tracing::warn!(
                        attempt,
                        status,
                        sleep_ms = sleep.as_millis() as u64,
                        "retrying after retriable status"
                    );
                    tokio::time::sleep(sleep).await;
                    delay = (delay * 2).min(MAX_DELAY);
                    continue;
                }
                return Ok(response);
            }
            Err(error) => {
                if attempt == MAX_ATTEMPTS {
                    return Err(TransportError(error.to_string()));
                }
                let sleep = jittered(delay);
                tracing::warn!(
                    attempt,
                    error = %error,
                    sleep_ms = sleep.as_millis() as u64,
                    "retrying after transport error"
                );
                tokio::time::sleep(sleep).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }

    Err(TransportError("retry attempts exhausted".to_string()))
}
