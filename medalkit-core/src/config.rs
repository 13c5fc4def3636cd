use crate::cipher::CipherStrategy;

/// The fixed gateway endpoint all calls are posted to.
pub const GATEWAY_URL: &str = "https://newgrounds.io/gateway_v3.php";

/// Query-string key the host page carries the player session under.
pub const SESSION_QUERY_KEY: &str = "ngio_session_id";

/// Sentinel session id used when the host page carries no session.
///
/// Calls still go out with this value; the gateway is expected to reject
/// anything that requires authentication.
pub const NO_SESSION: &str = "0";

/// Default time (in the caller's time units, typically seconds) an unlock
/// popup stays on screen.
pub const DEFAULT_DISPLAY_TIME: f32 = 5.0;

/// Static configuration for a [`crate::MedalKit`] instance.
///
/// Immutable after the client is built, except for the session id which can
/// be refreshed from a new host URL.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct AppConfig {
    /// Application id issued by the gateway.
    pub app_id: String,
    /// Pre-shared AES key, base64-encoded. `None` keeps calls in plaintext.
    pub cipher_key: Option<String>,
    /// How encrypted calls derive their initialization vector.
    pub cipher_strategy: CipherStrategy,
    /// Debug mode: forces every call onto the blocking path, logs responses,
    /// runs the encrypt self-test and re-locks all medals at catalog load.
    pub debug: bool,
    /// Whether the outer envelope carries an explicit `debug` field.
    /// Defaults to the value of `debug`.
    pub send_debug_flag: bool,
    /// Gateway endpoint. Defaults to [`GATEWAY_URL`].
    pub gateway_url: String,
    /// Player session recovered from the host page, or [`NO_SESSION`].
    pub session_id: String,
    /// How long an unlock popup is displayed.
    pub medal_display_time: f32,
    /// Whether unlocking a medal enqueues a popup.
    pub show_popups: bool,
    /// Whether popup labels append the medal description.
    pub show_descriptions: bool,
}

impl AppConfig {
    /// Creates a configuration for `app_id` with default settings: plaintext
    /// calls, no session, popups and descriptions enabled.
    #[must_use]
    pub fn new(app_id: &str) -> Self {
        Self {
            app_id: app_id.to_owned(),
            cipher_key: None,
            cipher_strategy: CipherStrategy::default(),
            debug: false,
            send_debug_flag: false,
            gateway_url: GATEWAY_URL.to_owned(),
            session_id: NO_SESSION.to_owned(),
            medal_display_time: DEFAULT_DISPLAY_TIME,
            show_popups: true,
            show_descriptions: true,
        }
    }

    /// Sets the pre-shared cipher key (base64) with the default
    /// random-IV strategy.
    #[must_use]
    pub fn with_cipher_key(self, key: &str) -> Self {
        self.with_cipher(key, CipherStrategy::default())
    }

    /// Sets the pre-shared cipher key (base64) and the IV strategy.
    #[must_use]
    pub fn with_cipher(mut self, key: &str, strategy: CipherStrategy) -> Self {
        self.cipher_key = Some(key.to_owned());
        self.cipher_strategy = strategy;
        self
    }

    /// Enables or disables debug mode. Also sets `send_debug_flag`, which
    /// can still be overridden afterwards.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self.send_debug_flag = debug;
        self
    }

    /// Reads the session id from `url`'s query string.
    ///
    /// A missing or unparseable session is not an error; the sentinel
    /// [`NO_SESSION`] is kept and calls proceed unauthenticated.
    #[must_use]
    pub fn with_session_from_url(mut self, url: &str) -> Self {
        self.refresh_session(url);
        self
    }

    /// Re-reads the session id from `url`, falling back to [`NO_SESSION`].
    pub fn refresh_session(&mut self, url: &str) {
        self.session_id =
            session_id_from_url(url).unwrap_or_else(|| NO_SESSION.to_owned());
    }
}

fn session_id_from_url(url: &str) -> Option<String> {
    let url = reqwest::Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == SESSION_QUERY_KEY)
        .map(|(_, value)| value.into_owned())
}
