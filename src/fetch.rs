//! HTTP GET with bounded exponential backoff
//!
//! Delays start at 250ms and double per retry up to a 10s ceiling, without
//! jitter. The transport and the clock are traits so the retry schedule can be
//! asserted exactly.

use std::io::Read;
use std::time::Duration;

use console::style;
use indicatif::ProgressBar;
use thiserror::Error;

/// Delay before the first retry
pub const BACKOFF_INITIAL_MS: u64 = 250;
/// Upper bound for any single delay
pub const BACKOFF_MAX_MS: u64 = 10_000;
/// Retry budget used for release downloads
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Errors from a fetch that exhausted its retries
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request never produced a response
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Requested URL
        url: String,
        /// Transport diagnostic
        message: String,
    },

    /// The server answered with a non-success status
    #[error("request to {url} returned HTTP {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },
}

/// A response whose body has not been read yet
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Streaming body
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// A single HTTP GET, without retries
pub trait HttpClient {
    /// Issue a GET request.
    ///
    /// Non-success statuses are returned as responses; `Err` is reserved for
    /// transport failures.
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// `ureq`-backed client
#[derive(Clone)]
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    /// Create a client with a fresh connection pool
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .user_agent(concat!("wasm-inline-slim/", env!("CARGO_PKG_VERSION")))
                .build(),
        }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for UreqClient {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        match self.agent.get(url).call() {
            Ok(response) => Ok(HttpResponse {
                status: response.status(),
                body: Box::new(response.into_reader()),
            }),
            Err(ureq::Error::Status(status, response)) => Ok(HttpResponse {
                status,
                body: Box::new(response.into_reader()),
            }),
            Err(ureq::Error::Transport(transport)) => Err(FetchError::Transport {
                url: url.to_string(),
                message: transport.to_string(),
            }),
        }
    }
}

/// Source of delays between attempts
pub trait Sleeper {
    /// Block for `duration`
    fn sleep(&self, duration: Duration);
}

/// Sleeps on the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Delay to wait after failed attempt number `attempt` (1-based)
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use wasm_inline_slim::fetch::compute_backoff;
///
/// assert_eq!(compute_backoff(1), Duration::from_millis(250));
/// assert_eq!(compute_backoff(3), Duration::from_millis(1000));
/// assert_eq!(compute_backoff(7), Duration::from_millis(10_000));
/// ```
pub fn compute_backoff(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    let delay_ms = BACKOFF_INITIAL_MS.saturating_mul(factor);
    Duration::from_millis(delay_ms.min(BACKOFF_MAX_MS))
}

/// GET with retries on transport failures and non-success statuses
pub struct RetryingFetcher<C: HttpClient, S: Sleeper = ThreadSleeper> {
    client: C,
    sleeper: S,
    max_retries: u32,
}

impl<C: HttpClient> RetryingFetcher<C, ThreadSleeper> {
    /// Create a fetcher that sleeps on the current thread
    pub fn new(client: C, max_retries: u32) -> Self {
        Self::with_sleeper(client, ThreadSleeper, max_retries)
    }
}

impl<C: HttpClient, S: Sleeper> RetryingFetcher<C, S> {
    /// Create a fetcher with a custom sleeper
    pub fn with_sleeper(client: C, sleeper: S, max_retries: u32) -> Self {
        Self {
            client,
            sleeper,
            max_retries,
        }
    }

    /// Fetch `url`, retrying up to `max_retries` times.
    ///
    /// A success status returns immediately. After `max_retries + 1` failed
    /// attempts the last failure is returned.
    pub fn fetch(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.fetch_with_progress(url, &ProgressBar::hidden())
    }

    /// Fetch `url` while `progress` is drawing on stderr
    ///
    /// Retry notices are printed with the bar suspended, and the bar's
    /// message names the upcoming attempt.
    pub fn fetch_with_progress(
        &self,
        url: &str,
        progress: &ProgressBar,
    ) -> Result<HttpResponse, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            log::debug!("GET {} (attempt {})", url, attempt);

            let failure = match self.client.get(url) {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => FetchError::Status {
                    url: url.to_string(),
                    status: response.status,
                },
                Err(err) => err,
            };

            if attempt > self.max_retries {
                return Err(failure);
            }

            let delay = compute_backoff(attempt);
            log::debug!("{}", failure);
            progress.suspend(|| {
                eprintln!(
                    "{}",
                    style(format!(
                        "Failed fetching. Retrying in {}ms...",
                        delay.as_millis()
                    ))
                    .yellow()
                )
            });
            progress.set_message(format!("{} (attempt {})", url, attempt + 1));
            self.sleeper.sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    enum Reply {
        Status(u16),
        Transport,
    }

    #[derive(Clone, Default)]
    struct ScriptedClient {
        replies: Arc<Mutex<VecDeque<Reply>>>,
        calls: Arc<Mutex<u32>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.into())),
                calls: Arc::new(Mutex::new(0)),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl HttpClient for ScriptedClient {
        fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
            *self.calls.lock().unwrap() += 1;
            match self.replies.lock().unwrap().pop_front() {
                Some(Reply::Status(status)) => Ok(HttpResponse {
                    status,
                    body: Box::new(Cursor::new(b"body".to_vec())),
                }),
                Some(Reply::Transport) | None => Err(FetchError::Transport {
                    url: url.to_string(),
                    message: "connection reset".to_string(),
                }),
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSleeper {
        delays: Arc<Mutex<Vec<u64>>>,
    }

    impl RecordingSleeper {
        fn delays(&self) -> Vec<u64> {
            self.delays.lock().unwrap().clone()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration.as_millis() as u64);
        }
    }

    #[test]
    fn test_compute_backoff_doubles_and_caps() {
        let delays: Vec<u64> = (1..=8).map(|a| compute_backoff(a).as_millis() as u64).collect();
        assert_eq!(delays, vec![250, 500, 1000, 2000, 4000, 8000, 10_000, 10_000]);
    }

    #[test]
    fn test_compute_backoff_large_attempt_does_not_overflow() {
        assert_eq!(compute_backoff(u32::MAX), Duration::from_millis(BACKOFF_MAX_MS));
    }

    #[test]
    fn test_first_success_short_circuits() {
        let client = ScriptedClient::new(vec![Reply::Status(200)]);
        let sleeper = RecordingSleeper::default();
        let fetcher = RetryingFetcher::with_sleeper(client.clone(), sleeper.clone(), 5);

        let mut response = fetcher.fetch("https://example.test/a.tar.gz").unwrap();
        let mut body = String::new();
        response.body.read_to_string(&mut body).unwrap();

        assert_eq!(body, "body");
        assert_eq!(client.calls(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[test]
    fn test_retries_until_success() {
        let client = ScriptedClient::new(vec![
            Reply::Transport,
            Reply::Status(503),
            Reply::Status(200),
        ]);
        let sleeper = RecordingSleeper::default();
        let fetcher = RetryingFetcher::with_sleeper(client.clone(), sleeper.clone(), 5);

        let response = fetcher.fetch("https://example.test/a.tar.gz").unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(client.calls(), 3);
        assert_eq!(sleeper.delays(), vec![250, 500]);
    }

    #[test]
    fn test_exhausted_budget_returns_last_status() {
        let client = ScriptedClient::new((0..10).map(|_| Reply::Status(404)).collect());
        let sleeper = RecordingSleeper::default();
        let fetcher = RetryingFetcher::with_sleeper(client.clone(), sleeper.clone(), 5);

        let err = fetcher.fetch("https://example.test/a.tar.gz").unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(client.calls(), 6);
        assert_eq!(sleeper.delays(), vec![250, 500, 1000, 2000, 4000]);
    }

    #[test]
    fn test_retries_report_attempt_on_progress_bar() {
        let client = ScriptedClient::new(vec![
            Reply::Transport,
            Reply::Status(503),
            Reply::Status(200),
        ]);
        let sleeper = RecordingSleeper::default();
        let fetcher = RetryingFetcher::with_sleeper(client.clone(), sleeper.clone(), 5);
        let progress = ProgressBar::hidden();
        progress.set_message("https://example.test/a.tar.gz");

        let response = fetcher
            .fetch_with_progress("https://example.test/a.tar.gz", &progress)
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(progress.message(), "https://example.test/a.tar.gz (attempt 3)");
        assert!(!progress.is_finished());
        assert_eq!(sleeper.delays(), vec![250, 500]);
    }

    #[test]
    fn test_exhausted_budget_returns_last_transport_error() {
        let client = ScriptedClient::new(vec![]);
        let sleeper = RecordingSleeper::default();
        let fetcher = RetryingFetcher::with_sleeper(client.clone(), sleeper.clone(), 2);

        let err = fetcher.fetch("https://example.test/a.tar.gz").unwrap_err();

        assert!(matches!(err, FetchError::Transport { .. }));
        assert_eq!(client.calls(), 3);
        assert_eq!(sleeper.delays(), vec![250, 500]);
    }

    #[test]
    fn test_zero_retries_makes_single_attempt() {
        let client = ScriptedClient::new(vec![Reply::Status(500)]);
        let sleeper = RecordingSleeper::default();
        let fetcher = RetryingFetcher::with_sleeper(client.clone(), sleeper.clone(), 0);

        assert!(fetcher.fetch("https://example.test/a").is_err());
        assert_eq!(client.calls(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[test]
    fn test_http_response_success_range() {
        let ok = HttpResponse {
            status: 204,
            body: Box::new(std::io::empty()),
        };
        let redirect = HttpResponse {
            status: 302,
            body: Box::new(std::io::empty()),
        };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }
}
