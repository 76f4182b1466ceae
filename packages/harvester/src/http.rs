//! Rate-limited, retrying HTTP transport shared by every harvester component.
//!
//! All requests of a run go through one [`RateLimitedTransport`]. It owns
//! the time of the last request, so two transports never throttle each
//! other, and it retries 429/5xx responses with exponential backoff. The
//! final response is always handed back, even when it is still failing.

use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::redirect::Policy;

use crate::config::{HarvestConfig, ACCEPT, USER_AGENT};
use crate::error::{HarvesterError, Result};

/// An HTTP response reduced to what the harvester looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
    pub content_type: Option<String>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Rate limiting and server errors are worth another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.status == 429 || self.status >= 500
    }
}

/// Anything that can turn a URL into a [`Response`].
pub trait Transport {
    fn request(&self, url: &str) -> Result<Response>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn request(&self, url: &str) -> Result<Response> {
        (**self).request(url)
    }
}

/// Failure of a single attempt, before retry policy is applied.
#[derive(Debug)]
pub enum SendError {
    /// Connection or timeout problem; another attempt may succeed.
    Transient(String),
    /// Anything else; retrying will not help.
    Fatal(HarvesterError),
}

/// Performs one raw request without throttling or retries.
pub trait Sender {
    fn send(&self, url: &str) -> std::result::Result<Response, SendError>;
}

/// [`Sender`] backed by a blocking reqwest client.
pub struct HttpSender {
    client: Client,
}

impl HttpSender {
    /// Create a client with the harvester's user agent, `Accept` header and timeout.
    ///
    /// Redirects are not followed; a moved act page reaches the caller as 3xx.
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static(ACCEPT));

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

impl Sender for HttpSender {
    fn send(&self, url: &str) -> std::result::Result<Response, SendError> {
        let response = self.client.get(url).send().map_err(classify_error)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.text().map_err(classify_error)?;

        Ok(Response {
            status,
            body,
            content_type,
        })
    }
}

fn classify_error(e: reqwest::Error) -> SendError {
    if e.is_connect() || e.is_timeout() {
        SendError::Transient(e.to_string())
    } else {
        SendError::Fatal(HarvesterError::Http(e))
    }
}

/// Enforces a minimum spacing between consecutive requests.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Cell<Option<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Cell::new(None),
        }
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until the next request may go out, then record it as sent.
    ///
    /// Returns how long the caller was held back.
    pub fn wait(&self) -> Duration {
        let delay = match self.last_request.get() {
            Some(last) => self.min_interval.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        };
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        self.last_request.set(Some(Instant::now()));
        delay
    }
}

/// How often and how patiently a retryable request is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_unit: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, backoff_unit: Duration) -> Self {
        Self {
            max_retries,
            backoff_unit,
        }
    }

    /// Total attempts including the first one; always at least 1.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait after the zero-based failed attempt `attempt`: `unit * 2^(attempt + 1)`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_add(1));
        self.backoff_unit.saturating_mul(factor)
    }
}

impl From<&HarvestConfig> for RetryPolicy {
    fn from(config: &HarvestConfig) -> Self {
        Self::new(config.max_retries, config.backoff_unit)
    }
}

/// The single shared transport of a harvest run.
pub struct RateLimitedTransport<S = HttpSender> {
    sender: S,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl RateLimitedTransport<HttpSender> {
    /// Create the reqwest-backed transport described by `config`.
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        Ok(Self::with_sender(
            HttpSender::new(config)?,
            RateLimiter::new(config.min_request_interval),
            RetryPolicy::from(config),
        ))
    }
}

impl<S: Sender> RateLimitedTransport<S> {
    pub fn with_sender(sender: S, limiter: RateLimiter, retry: RetryPolicy) -> Self {
        Self {
            sender,
            limiter,
            retry,
        }
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }
}

impl<S: Sender> Transport for RateLimitedTransport<S> {
    fn request(&self, url: &str) -> Result<Response> {
        let max_attempts = self.retry.max_attempts();
        let mut last_response: Option<Response> = None;
        let mut last_error: Option<String> = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = self.retry.delay(attempt - 1);
                tracing::debug!(
                    attempt = attempt + 1,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Retrying after delay"
                );
                thread::sleep(delay);
            }

            self.limiter.wait();

            match self.sender.send(url) {
                Ok(response) if response.is_retryable() => {
                    tracing::warn!(
                        url,
                        status = response.status,
                        attempt = attempt + 1,
                        max_attempts,
                        "Retryable response"
                    );
                    last_response = Some(response);
                }
                Ok(response) => return Ok(response),
                Err(SendError::Transient(message)) => {
                    tracing::warn!(
                        url,
                        error = %message,
                        attempt = attempt + 1,
                        max_attempts,
                        "Connection error"
                    );
                    last_error = Some(message);
                }
                Err(SendError::Fatal(e)) => return Err(e),
            }
        }

        if let Some(response) = last_response {
            return Ok(response);
        }
        match last_error {
            Some(message) => Err(HarvesterError::RetriesExhausted {
                attempts: max_attempts,
                message,
            }),
            None => Err(HarvesterError::NoResponse(url.to_string())),
        }
    }
}
