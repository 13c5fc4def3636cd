use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    call::{CallEnvelope, Component, GatewayResponse},
    cipher::CallCipher,
    config::AppConfig,
    error::MedalKitError,
    transport::{IconSlot, Transport},
};

/// Outer envelope wrapping every call: `{app_id, session_id, debug?, call}`,
/// posted as the single form field `input`.
#[derive(Serialize)]
struct GatewayInput<'a> {
    app_id: &'a str,
    session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug: Option<bool>,
    call: &'a CallEnvelope,
}

/// The protocol client: builds envelopes, encrypts calls when a key is
/// configured and hands them to the transport.
pub struct Gateway {
    config: AppConfig,
    cipher: Option<CallCipher>,
    transport: Arc<dyn Transport>,
}

impl Gateway {
    /// Builds a gateway client for `config` over `transport`.
    ///
    /// # Errors
    /// Returns [`MedalKitError::InvalidCipherKey`] when a cipher key is
    /// configured but cannot be decoded.
    pub fn new(
        config: AppConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, MedalKitError> {
        let cipher = config
            .cipher_key
            .as_deref()
            .map(|key| CallCipher::new(key, config.cipher_strategy))
            .transpose()?;
        Ok(Self {
            config,
            cipher,
            transport,
        })
    }

    /// Issues `component` synchronously and parses the response.
    ///
    /// An empty body is a normal outcome ([`GatewayResponse::Empty`]),
    /// notably before a session exists. Debug mode logs every parsed
    /// response.
    ///
    /// # Errors
    /// Transport failures propagate; there are no retries.
    pub fn call(
        &self,
        component: Component,
        parameters: Option<Value>,
    ) -> Result<GatewayResponse, MedalKitError> {
        let input = self.build_input(component, parameters)?;
        let body = self.transport.post(&self.config.gateway_url, &input)?;
        let response = GatewayResponse::from_body(body);
        if self.config.debug {
            debug!("{component}: {response:?}");
        }
        Ok(response)
    }

    /// Issues `component` fire-and-forget: the response, and any failure,
    /// are discarded.
    ///
    /// Debug mode forces the blocking path regardless, so the response can
    /// be logged.
    pub fn submit(&self, component: Component, parameters: Option<Value>) {
        if self.config.debug {
            debug!("{component} forced onto the blocking path");
            if let Err(err) = self.call(component, parameters) {
                warn!("{component} failed: {err}");
            }
            return;
        }
        match self.build_input(component, parameters) {
            Ok(input) => self.transport.submit(&self.config.gateway_url, &input),
            Err(err) => warn!("{component} dropped, envelope could not be built: {err}"),
        }
    }

    fn build_input(
        &self,
        component: Component,
        parameters: Option<Value>,
    ) -> Result<String, MedalKitError> {
        let mut call = CallEnvelope::new(component, parameters);
        if let Some(cipher) = &self.cipher {
            let sealed = cipher.encrypt(&call)?;
            if self.config.debug {
                Self::verify_seal(cipher, &sealed);
            }
            call = sealed;
        }
        let input = GatewayInput {
            app_id: &self.config.app_id,
            session_id: &self.config.session_id,
            debug: self.config.send_debug_flag.then_some(true),
            call: &call,
        };
        Ok(serde_json::to_string(&input)?)
    }

    /// Debug-only self-test: decrypt the freshly sealed call and log the
    /// recovered plaintext. Never part of the transport path.
    fn verify_seal(cipher: &CallCipher, sealed: &CallEnvelope) {
        let Some(secure) = sealed.secure.as_deref() else {
            return;
        };
        match cipher.decrypt(secure) {
            Ok(recovered) => debug!("encrypt self-test recovered call: {recovered:?}"),
            Err(err) => warn!("encrypt self-test could not recover the call: {err}"),
        }
    }

    /// The configuration this gateway was built with.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub(crate) fn fetch_icon(&self, url: &str, slot: IconSlot) {
        self.transport.fetch_icon(url, slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::CipherStrategy;
    use crate::transport::testing::{FakeTransport, Mode};
    use serde_json::json;

    const TEST_KEY: &str = "AAECAwQFBgcICQoLDA0ODw==";

    fn gateway_with(config: AppConfig) -> (Gateway, std::sync::Arc<FakeTransport>) {
        let transport = FakeTransport::new();
        let gateway = Gateway::new(config, transport.clone()).unwrap();
        (gateway, transport)
    }

    #[test]
    fn test_envelope_carries_sentinel_session() {
        let (gateway, transport) = gateway_with(AppConfig::new("app-1"));
        gateway.call(Component::GetBoards, None).unwrap();

        let recorded = transport.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].url, crate::config::GATEWAY_URL);
        assert_eq!(recorded[0].input["app_id"], "app-1");
        assert_eq!(recorded[0].input["session_id"], "0");
        assert!(recorded[0].input.get("debug").is_none());
        assert_eq!(recorded[0].input["call"]["component"], "ScoreBoard.getBoards");
    }

    #[test]
    fn test_submit_is_fire_and_forget() {
        let (gateway, transport) = gateway_with(AppConfig::new("app-1"));
        gateway.submit(Component::MedalUnlock, Some(json!({"id": 7})));

        let recorded = transport.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].mode, Mode::FireAndForget);
        assert_eq!(recorded[0].input["call"]["parameters"]["id"], 7);
    }

    #[test]
    fn test_debug_forces_synchronous_and_flags_envelope() {
        let (gateway, transport) = gateway_with(AppConfig::new("app-1").with_debug(true));
        gateway.submit(Component::MedalUnlock, Some(json!({"id": 7})));

        let recorded = transport.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].mode, Mode::Blocking);
        assert_eq!(recorded[0].input["debug"], true);
    }

    #[test]
    fn test_encrypted_call_replaces_parameters() {
        let config = AppConfig::new("app-1").with_cipher(TEST_KEY, CipherStrategy::RandomIv);
        let (gateway, transport) = gateway_with(config);
        gateway.call(Component::PostScore, Some(json!({"id": 3, "value": 100}))).unwrap();

        let call = &transport.recorded()[0].input["call"];
        assert_eq!(call["component"], "ScoreBoard.postScore");
        assert!(call["parameters"].is_null());
        assert!(call["secure"].is_string());
    }

    #[test]
    fn test_fixed_iv_call_hides_the_component() {
        let config = AppConfig::new("app-1").with_cipher(TEST_KEY, CipherStrategy::FixedIv);
        let (gateway, transport) = gateway_with(config);
        gateway.call(Component::PostScore, Some(json!({"id": 3, "value": 100}))).unwrap();

        let call = &transport.recorded()[0].input["call"];
        assert!(call.get("component").is_none());
        assert!(call.get("parameters").is_none());
        assert!(call["secure"].is_string());
    }

    #[test]
    fn test_debug_with_cipher_runs_the_seal_self_test() {
        let config = AppConfig::new("app-1")
            .with_cipher(TEST_KEY, CipherStrategy::RandomIv)
            .with_debug(true);
        let (gateway, transport) = gateway_with(config);

        // exercises the encrypt self-test on the way out
        gateway
            .call(Component::MedalUnlock, Some(json!({"id": 7})))
            .unwrap();

        let recorded = transport.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].input["debug"], true);
        assert!(recorded[0].input["call"]["secure"].is_string());
        assert!(recorded[0].input["call"]["parameters"].is_null());
    }

    #[test]
    fn test_seal_self_test_survives_a_corrupted_payload() {
        let cipher = CallCipher::new(TEST_KEY, CipherStrategy::RandomIv).unwrap();
        let sealed = CallEnvelope {
            component: None,
            parameters: None,
            secure: Some("AAAA".to_owned()),
        };
        // must log and carry on, never panic
        Gateway::verify_seal(&cipher, &sealed);

        let unsealed = CallEnvelope::new(Component::GetBoards, None);
        Gateway::verify_seal(&cipher, &unsealed);
    }

    #[test]
    fn test_invalid_key_is_rejected_at_construction() {
        let config = AppConfig::new("app-1").with_cipher_key("!!!");
        let result = Gateway::new(config, FakeTransport::new());
        assert!(matches!(result, Err(MedalKitError::InvalidCipherKey(_))));
    }
}
