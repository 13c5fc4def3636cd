//! Core client library for a medals & scoreboards gateway.
//!
//! `MedalKit` wraps every interaction with the gateway in a single envelope
//! protocol: calls carry the application id, the player session recovered
//! from the host page URL, and either a plaintext or an AES-encrypted call
//! payload. On top of the protocol the crate keeps a local catalog of medal
//! and scoreboard definitions and drives the timed "medal unlocked" popup
//! animation from the host's frame loop.
//!
//! The gateway is a best-effort telemetry channel. Calls that fail, calls
//! made without a session, and empty responses never crash the host: they
//! degrade to empty catalogs and silent no-ops.
//!
//! ```no_run
//! use medalkit_core::{AppConfig, MedalKit};
//!
//! let config = AppConfig::new("12345:abcdeFGH")
//!     .with_session_from_url("https://host.example/play?ngio_session_id=e88a4b");
//! let mut kit = MedalKit::new(config).expect("valid configuration");
//!
//! kit.unlock_medal(0);
//!
//! // once per frame:
//! kit.update(0.016);
//! ```

mod call;
pub use call::*;

mod catalog;
pub use catalog::*;

mod cipher;
pub use cipher::*;

mod client;
pub use client::*;

mod config;
pub use config::*;

mod error;
pub use error::*;

mod gateway;
pub use gateway::*;

mod popup;
pub use popup::*;

mod transport;
pub use transport::*;
