use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use reqwest::blocking::multipart::Form;
use tracing::warn;

use crate::error::MedalKitError;

/// Write-once destination for a fire-and-forget icon download.
pub type IconSlot = Arc<OnceLock<Vec<u8>>>;

/// How serialized envelopes leave the client.
///
/// The gateway protocol only needs two delivery modes: a blocking POST whose
/// body the caller inspects, and a fire-and-forget POST whose outcome nobody
/// observes. Keeping this behind a trait lets tests record calls without
/// scheduling real I/O.
pub trait Transport: Send + Sync {
    /// Blocking POST of the serialized envelope as the single multipart form
    /// field `input`. Returns the response body, or `None` when the body is
    /// empty.
    ///
    /// # Errors
    /// Returns an error when the request cannot be sent or the body cannot
    /// be read. HTTP error statuses are not treated specially; their bodies
    /// are returned as-is.
    fn post(&self, url: &str, input: &str) -> Result<Option<String>, MedalKitError>;

    /// Fire-and-forget variant of [`Self::post`]. The response and any
    /// failure are discarded.
    fn submit(&self, url: &str, input: &str);

    /// Fire-and-forget download of a medal icon into `slot`.
    fn fetch_icon(&self, url: &str, slot: IconSlot);
}

/// Production [`Transport`] over a blocking HTTP client.
///
/// Fire-and-forget requests are dispatched on detached threads; the frame
/// loop never waits on them.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Initializes a new `HttpTransport` instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }

    fn request(&self, url: &str, input: &str) -> reqwest::blocking::RequestBuilder {
        self.client
            .post(url)
            .timeout(Self::TIMEOUT)
            .header(
                "User-Agent",
                format!("medalkit-core/{}", env!("CARGO_PKG_VERSION")),
            )
            .multipart(Form::new().text("input", input.to_owned()))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn post(&self, url: &str, input: &str) -> Result<Option<String>, MedalKitError> {
        let body = self.request(url, input).send()?.text()?;
        if body.is_empty() {
            Ok(None)
        } else {
            Ok(Some(body))
        }
    }

    fn submit(&self, url: &str, input: &str) {
        let request = self.request(url, input);
        thread::spawn(move || {
            if let Err(err) = request.send() {
                warn!("fire-and-forget gateway call failed: {err}");
            }
        });
    }

    fn fetch_icon(&self, url: &str, slot: IconSlot) {
        let client = self.client.clone();
        let url = url.to_owned();
        thread::spawn(move || {
            let bytes = client
                .get(&url)
                .timeout(Self::TIMEOUT)
                .send()
                .and_then(reqwest::blocking::Response::bytes);
            match bytes {
                Ok(bytes) => {
                    let _ = slot.set(bytes.to_vec());
                }
                Err(err) => warn!("icon download from {url} failed: {err}"),
            }
        });
    }
}
