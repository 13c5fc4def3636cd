use std::sync::{Arc, OnceLock};

use serde::{de::DeserializeOwned, Deserialize};
use tracing::warn;

use crate::{
    call::Component,
    gateway::Gateway,
    transport::IconSlot,
};

/// Points awarded per medal difficulty tier (1 through 5).
pub const MEDAL_POINTS: [u32; 5] = [5, 10, 25, 50, 100];

/// Points for a medal of the given difficulty. Out-of-range difficulties
/// clamp to the nearest tier.
#[must_use]
pub fn points_for_difficulty(difficulty: u8) -> u32 {
    let tier = usize::from(difficulty.clamp(1, 5)) - 1;
    MEDAL_POINTS[tier]
}

/// Handle to a medal's icon image, downloaded fire-and-forget at catalog
/// load. The bytes appear once the download completes; the popup renderer
/// passes the handle through to the host's drawing surface either way.
#[derive(Debug, Clone, Default)]
pub struct IconHandle {
    url: String,
    bytes: IconSlot,
}

impl IconHandle {
    pub(crate) fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            bytes: Arc::new(OnceLock::new()),
        }
    }

    /// The URL the icon is (being) downloaded from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The downloaded image bytes, once available.
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.get().map(Vec::as_slice)
    }

    /// Whether the download has completed.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.bytes.get().is_some()
    }

    pub(crate) fn slot(&self) -> IconSlot {
        Arc::clone(&self.bytes)
    }
}

/// A medal definition as returned by the gateway, augmented with the icon
/// handle and the local unlock flag.
#[derive(Debug, Clone, Deserialize)]
pub struct Medal {
    /// Gateway-side medal id.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Display description, possibly empty.
    #[serde(default)]
    pub description: String,
    /// Difficulty tier, 1 through 5.
    pub difficulty: u8,
    /// Icon image URL.
    #[serde(rename = "icon", default)]
    pub icon_url: String,
    /// Whether this medal has been unlocked. Flips false to true exactly
    /// once via [`crate::MedalKit::unlock_medal`]; forced to `false` at load
    /// in debug mode so unlock animations can be re-triggered.
    #[serde(default)]
    pub unlocked: bool,
    /// The icon resource, populated at catalog load.
    #[serde(skip)]
    pub icon: IconHandle,
}

/// A scoreboard definition. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Scoreboard {
    /// Gateway-side board id.
    pub id: u32,
    /// Display name.
    pub name: String,
}

/// Append-only snapshot of the application's medal and scoreboard
/// definitions, taken once at initialization.
///
/// Indices into these lists are the public addressing scheme for unlock,
/// post and query operations; callers never handle the gateway-side ids.
#[derive(Debug, Default)]
pub struct Catalog {
    medals: Vec<Medal>,
    scoreboards: Vec<Scoreboard>,
}

impl Catalog {
    /// Loads both lists over two blocking calls. Any failure or unexpected
    /// response shape falls back to an empty list; this never errors.
    pub(crate) fn load(gateway: &Gateway) -> Self {
        let scoreboards = Self::fetch_list(gateway, Component::GetBoards, "scoreboards");
        let mut medals: Vec<Medal> =
            Self::fetch_list(gateway, Component::MedalList, "medals");
        for medal in &mut medals {
            medal.icon = IconHandle::new(&medal.icon_url);
            if !medal.icon_url.is_empty() {
                gateway.fetch_icon(&medal.icon_url, medal.icon.slot());
            }
            if gateway.config().debug {
                medal.unlocked = false;
            }
        }
        Self {
            medals,
            scoreboards,
        }
    }

    fn fetch_list<T: DeserializeOwned>(
        gateway: &Gateway,
        component: Component,
        key: &str,
    ) -> Vec<T> {
        gateway.call(component, None).map_or_else(
            |err| {
                warn!("{component} failed, falling back to an empty catalog: {err}");
                Vec::new()
            },
            |response| response.list(key),
        )
    }

    /// The medal snapshot.
    #[must_use]
    pub fn medals(&self) -> &[Medal] {
        &self.medals
    }

    /// The scoreboard snapshot.
    #[must_use]
    pub fn scoreboards(&self) -> &[Scoreboard] {
        &self.scoreboards
    }

    /// The medal at `index`, if in range.
    #[must_use]
    pub fn medal(&self, index: usize) -> Option<&Medal> {
        self.medals.get(index)
    }

    /// The scoreboard at `index`, if in range.
    #[must_use]
    pub fn scoreboard(&self, index: usize) -> Option<&Scoreboard> {
        self.scoreboards.get(index)
    }

    pub(crate) fn medal_mut(&mut self, index: usize) -> Option<&mut Medal> {
        self.medals.get_mut(index)
    }
}
