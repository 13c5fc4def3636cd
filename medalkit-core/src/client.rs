use std::sync::Arc;

use serde_json::json;

use crate::{
    call::{Component, GatewayResponse},
    catalog::{points_for_difficulty, Catalog, Medal, Scoreboard},
    config::AppConfig,
    error::MedalKitError,
    gateway::Gateway,
    popup::{alpha, slide_fraction, PopupQueue, PopupSurface},
    transport::{HttpTransport, Transport},
};

/// Paging window for a [`MedalKit::get_scores`] query.
#[derive(Debug, Clone)]
pub struct ScoreQuery {
    /// Restrict to a specific user, by id or name.
    pub user: Option<String>,
    /// Restrict to the player's social circle.
    pub social: bool,
    /// Number of leading entries to skip.
    pub skip: u32,
    /// Maximum number of entries to return.
    pub limit: u32,
}

impl Default for ScoreQuery {
    fn default() -> Self {
        Self {
            user: None,
            social: false,
            skip: 0,
            limit: 10,
        }
    }
}

/// The medals & scoreboards client.
///
/// One instance owns the configuration, the gateway connection, the catalog
/// snapshot and the popup queue; it is driven from the host's single frame
/// loop via [`Self::update`] and [`Self::render`]. No singleton, no locking:
/// hosts that want to share an instance wrap it themselves.
pub struct MedalKit {
    gateway: Gateway,
    catalog: Catalog,
    popups: PopupQueue,
}

impl MedalKit {
    /// Builds a client over the production HTTP transport and loads the
    /// catalog synchronously (two blocking gateway calls).
    ///
    /// # Errors
    /// Returns [`MedalKitError::InvalidCipherKey`] if a cipher key is
    /// configured but invalid. Catalog load failures are not errors; they
    /// degrade to empty lists.
    pub fn new(config: AppConfig) -> Result<Self, MedalKitError> {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    /// Builds a client over a caller-supplied transport. Used by tests to
    /// record calls without real I/O.
    ///
    /// # Errors
    /// Same as [`Self::new`].
    pub fn with_transport(
        config: AppConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, MedalKitError> {
        let display_time = config.medal_display_time;
        let gateway = Gateway::new(config, transport)?;
        let catalog = Catalog::load(&gateway);
        Ok(Self {
            gateway,
            catalog,
            popups: PopupQueue::new(display_time),
        })
    }

    /// Marks the medal at `index` unlocked, notifies the gateway
    /// fire-and-forget and, when popups are enabled, enqueues the unlock
    /// popup.
    ///
    /// A no-op when `index` is out of range or the medal is already
    /// unlocked, so unlocking twice enqueues at most one popup.
    pub fn unlock_medal(&mut self, index: usize) {
        let Some(medal) = self.catalog.medal_mut(index) else {
            return;
        };
        if medal.unlocked {
            return;
        }
        medal.unlocked = true;
        let medal_id = medal.id;
        self.gateway
            .submit(Component::MedalUnlock, Some(json!({ "id": medal_id })));
        if self.gateway.config().show_popups {
            self.popups.enqueue(index);
        }
    }

    /// Posts `value` to the scoreboard at `index`, fire-and-forget.
    /// A no-op when `index` is out of range.
    pub fn post_score(&self, index: usize, value: i64) {
        let Some(board) = self.catalog.scoreboard(index) else {
            return;
        };
        self.gateway.submit(
            Component::PostScore,
            Some(json!({ "id": board.id, "value": value })),
        );
    }

    /// Fetches a paged score window from the scoreboard at `index`,
    /// blocking. Returns `Ok(None)` when `index` is out of range.
    ///
    /// # Errors
    /// Transport failures propagate; there are no retries.
    pub fn get_scores(
        &self,
        index: usize,
        query: &ScoreQuery,
    ) -> Result<Option<GatewayResponse>, MedalKitError> {
        let Some(board) = self.catalog.scoreboard(index) else {
            return Ok(None);
        };
        let parameters = json!({
            "id": board.id,
            "user": query.user,
            "social": query.social,
            "skip": query.skip,
            "limit": query.limit,
        });
        self.gateway
            .call(Component::GetScores, Some(parameters))
            .map(Some)
    }

    /// Advances the popup queue by `delta` time units. Call once per frame.
    pub fn update(&mut self, delta: f32) {
        self.popups.advance(delta);
    }

    /// Draws the head popup onto `surface` with the medal icon drawn at
    /// `size` x `size`. A no-op when nothing is queued. Never mutates queue
    /// state; time only moves in [`Self::update`].
    pub fn render(&self, surface: &mut dyn PopupSurface, size: f32) {
        let Some(event) = self.popups.head() else {
            return;
        };
        let Some(medal) = self.catalog.medal(event.medal_index) else {
            return;
        };
        let slide = slide_fraction(event.elapsed);
        let alpha = alpha(event.elapsed, self.popups.display_time());

        // rest just above the bottom edge; slide in from below it
        let y = (slide * size).mul_add(1.5, surface.height() - size);
        surface.draw_icon(&medal.icon, 0.0, y, size, alpha);
        surface.draw_label(
            &self.medal_display_text(medal),
            size * 1.2,
            y + size / 2.0,
            size / 2.0,
            alpha,
        );
    }

    /// Popup label for `medal`: `name (points)`, with the description
    /// appended when descriptions are enabled.
    #[must_use]
    pub fn medal_display_text(&self, medal: &Medal) -> String {
        let points = points_for_difficulty(medal.difficulty);
        if self.gateway.config().show_descriptions && !medal.description.is_empty() {
            format!("{} ({points}) - {}", medal.name, medal.description)
        } else {
            format!("{} ({points})", medal.name)
        }
    }

    /// The loaded medal snapshot.
    #[must_use]
    pub fn medals(&self) -> &[Medal] {
        self.catalog.medals()
    }

    /// The loaded scoreboard snapshot.
    #[must_use]
    pub fn scoreboards(&self) -> &[Scoreboard] {
        self.catalog.scoreboards()
    }

    /// The catalog snapshot.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The popup queue.
    #[must_use]
    pub const fn popups(&self) -> &PopupQueue {
        &self.popups
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        self.gateway.config()
    }

    /// Re-reads the session id from a new host URL. All subsequent calls
    /// carry the refreshed session.
    pub fn refresh_session(&mut self, url: &str) {
        self.gateway.config_mut().refresh_session(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::IconHandle;
    use crate::transport::testing::{FakeTransport, Mode};
    use serde_json::Value;

    const BOARDS_BODY: &str =
        r#"{"result":{"data":{"scoreboards":[{"id":101,"name":"High Scores"}]}}}"#;

    const MEDALS_BODY: &str = r#"{"result":{"data":{"medals":[
        {"id":11,"name":"First Blood","description":"Win a round","difficulty":1,
         "icon":"https://img.example/11.png","unlocked":false},
        {"id":12,"name":"Untouchable","description":"","difficulty":5,
         "icon":"https://img.example/12.png","unlocked":false}
    ]}}}"#;

    const SCORES_BODY: &str =
        r#"{"result":{"data":{"scores":[{"user":"p1","value":9000}]}}}"#;

    fn client_with(config: AppConfig) -> (MedalKit, std::sync::Arc<FakeTransport>) {
        let transport = FakeTransport::new();
        transport.queue_response(BOARDS_BODY);
        transport.queue_response(MEDALS_BODY);
        let kit = MedalKit::with_transport(config, transport.clone()).unwrap();
        (kit, transport)
    }

    #[derive(Default)]
    struct RecordingSurface {
        height: f32,
        icons: Vec<(String, f32, f32, f32, f32)>,
        labels: Vec<(String, f32)>,
    }

    impl PopupSurface for RecordingSurface {
        fn height(&self) -> f32 {
            self.height
        }

        fn draw_icon(&mut self, icon: &IconHandle, x: f32, y: f32, size: f32, alpha: f32) {
            self.icons.push((icon.url().to_owned(), x, y, size, alpha));
        }

        fn draw_label(&mut self, text: &str, _x: f32, _y: f32, _h: f32, alpha: f32) {
            self.labels.push((text.to_owned(), alpha));
        }
    }

    #[test]
    fn test_unlock_fires_once_and_enqueues_one_popup() {
        let (mut kit, transport) = client_with(AppConfig::new("app"));

        kit.unlock_medal(0);
        kit.unlock_medal(0);

        let unlocks = transport.calls_for("Medal.unlock");
        assert_eq!(unlocks.len(), 1);
        assert_eq!(unlocks[0].mode, Mode::FireAndForget);
        assert_eq!(unlocks[0].input["call"]["parameters"]["id"], 11);

        assert_eq!(kit.popups().len(), 1);
        assert!(kit.medals()[0].unlocked);
    }

    #[test]
    fn test_unlock_out_of_range_is_a_noop() {
        let (mut kit, transport) = client_with(AppConfig::new("app"));
        kit.unlock_medal(99);

        assert!(transport.calls_for("Medal.unlock").is_empty());
        assert!(kit.popups().is_empty());
    }

    #[test]
    fn test_unlock_with_popups_disabled() {
        let mut config = AppConfig::new("app");
        config.show_popups = false;
        let (mut kit, transport) = client_with(config);

        kit.unlock_medal(1);
        assert_eq!(transport.calls_for("Medal.unlock").len(), 1);
        assert!(kit.popups().is_empty());
    }

    #[test]
    fn test_post_score_uses_the_board_id() {
        let (kit, transport) = client_with(AppConfig::new("app"));

        kit.post_score(0, 1234);
        let posts = transport.calls_for("ScoreBoard.postScore");
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].mode, Mode::FireAndForget);
        assert_eq!(posts[0].input["call"]["parameters"]["id"], 101);
        assert_eq!(posts[0].input["call"]["parameters"]["value"], 1234);

        // out of range: nothing fired
        kit.post_score(5, 1234);
        assert_eq!(transport.calls_for("ScoreBoard.postScore").len(), 1);
    }

    #[test]
    fn test_get_scores_sends_the_paging_window() {
        let (kit, transport) = client_with(AppConfig::new("app"));
        transport.queue_response(SCORES_BODY);

        let query = ScoreQuery {
            skip: 20,
            limit: 5,
            ..ScoreQuery::default()
        };
        let response = kit.get_scores(0, &query).unwrap().unwrap();
        assert_eq!(
            response.data().unwrap()["scores"][0]["value"],
            Value::from(9000)
        );

        let calls = transport.calls_for("ScoreBoard.getScores");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].mode, Mode::Blocking);
        let parameters = &calls[0].input["call"]["parameters"];
        assert_eq!(parameters["id"], 101);
        assert_eq!(parameters["skip"], 20);
        assert_eq!(parameters["limit"], 5);
        assert_eq!(parameters["social"], false);
        assert!(parameters["user"].is_null());

        // out of range: Ok(None) and no call issued
        assert!(kit.get_scores(9, &query).unwrap().is_none());
        assert_eq!(transport.calls_for("ScoreBoard.getScores").len(), 1);
    }

    #[test]
    fn test_operations_stay_safe_on_an_empty_catalog() {
        let transport = FakeTransport::new();
        let mut kit =
            MedalKit::with_transport(AppConfig::new("app"), transport.clone()).unwrap();

        kit.unlock_medal(0);
        kit.post_score(0, 1);
        assert!(kit.get_scores(0, &ScoreQuery::default()).unwrap().is_none());
        kit.update(1.0);

        let mut surface = RecordingSurface {
            height: 600.0,
            ..RecordingSurface::default()
        };
        kit.render(&mut surface, 50.0);
        assert!(surface.icons.is_empty());

        // only the two catalog loads went out
        assert_eq!(transport.recorded().len(), 2);
    }

    #[test]
    fn test_render_draws_the_head_popup() {
        let (mut kit, _) = client_with(AppConfig::new("app"));
        kit.unlock_medal(0);

        let mut surface = RecordingSurface {
            height: 600.0,
            ..RecordingSurface::default()
        };
        kit.render(&mut surface, 50.0);

        // t = 0: slide = 1, alpha = 1, icon fully below the bottom edge
        assert_eq!(surface.icons.len(), 1);
        let (url, x, y, size, alpha) = surface.icons[0].clone();
        assert_eq!(url, "https://img.example/11.png");
        assert!((x - 0.0).abs() < f32::EPSILON);
        assert!((y - (600.0 - 50.0 + 75.0)).abs() < 1e-4);
        assert!((size - 50.0).abs() < f32::EPSILON);
        assert!((alpha - 1.0).abs() < f32::EPSILON);

        assert_eq!(surface.labels[0].0, "First Blood (5) - Win a round");

        // render never mutates queue state
        kit.render(&mut surface, 50.0);
        assert_eq!(kit.popups().len(), 1);
        assert!((kit.popups().head().unwrap().elapsed - 0.0).abs() < f32::EPSILON);

        // after sliding in and holding, the popup fades and retires
        kit.update(4.5);
        kit.render(&mut surface, 50.0);
        let (_, _, y, _, alpha) = surface.icons[2].clone();
        assert!((y - (600.0 - 50.0)).abs() < 1e-4);
        assert!((alpha - 0.5).abs() < 1e-4);

        kit.update(0.5);
        assert!(kit.popups().is_empty());
    }

    #[test]
    fn test_description_toggle_changes_the_label() {
        let mut config = AppConfig::new("app");
        config.show_descriptions = false;
        let (kit, _) = client_with(config);
        assert_eq!(kit.medal_display_text(&kit.medals()[0]), "First Blood (5)");

        // an empty description never leaves a dangling separator
        let (kit, _) = client_with(AppConfig::new("app"));
        assert_eq!(kit.medal_display_text(&kit.medals()[1]), "Untouchable (100)");
    }

    #[test]
    fn test_refresh_session_applies_to_later_calls() {
        let (mut kit, transport) = client_with(AppConfig::new("app"));
        kit.refresh_session("https://host.example/play?ngio_session_id=fresh");
        kit.post_score(0, 7);

        let posts = transport.calls_for("ScoreBoard.postScore");
        assert_eq!(posts[0].input["session_id"], "fresh");
    }
}
