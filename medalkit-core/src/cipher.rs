use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use serde_json::Value;

use crate::{call::CallEnvelope, error::MedalKitError};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

const KEY_LEN: usize = 16;
const IV_LEN: usize = 16;

/// IV used by [`CipherStrategy::FixedIv`]. Reused for every call, which is a
/// known weakness of that legacy format: identical calls produce identical
/// ciphertexts.
const FIXED_IV: [u8; IV_LEN] = [0; IV_LEN];

/// How an encrypted call derives its initialization vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CipherStrategy {
    /// A fresh random 16-byte IV per call. The component name stays visible
    /// in the envelope for routing. This is the correct contract and the
    /// default.
    #[default]
    RandomIv,
    /// The constant [`FIXED_IV`] for every call; the whole call, component
    /// name included, travels inside the ciphertext. Legacy/debug fallback
    /// only, never pick this for new deployments.
    FixedIv,
}

/// AES-128-CBC cipher over serialized calls, keyed by the caller's
/// pre-shared key.
#[derive(Clone)]
pub struct CallCipher {
    key: [u8; KEY_LEN],
    strategy: CipherStrategy,
}

impl CallCipher {
    /// Builds a cipher from a base64-encoded 16-byte key.
    ///
    /// # Errors
    /// Returns [`MedalKitError::InvalidCipherKey`] if the key is not valid
    /// base64 or does not decode to exactly 16 bytes.
    pub fn new(key: &str, strategy: CipherStrategy) -> Result<Self, MedalKitError> {
        let bytes = STANDARD.decode(key).map_err(|e| {
            MedalKitError::InvalidCipherKey(format!("key is not valid base64: {e}"))
        })?;
        let key = <[u8; KEY_LEN]>::try_from(bytes).map_err(|bytes| {
            MedalKitError::InvalidCipherKey(format!(
                "expected a {KEY_LEN}-byte key, got {} bytes",
                bytes.len()
            ))
        })?;
        Ok(Self { key, strategy })
    }

    /// Seals `call` into an encrypted envelope.
    ///
    /// # Errors
    /// Returns [`MedalKitError::Serialization`] if the call cannot be
    /// serialized to JSON.
    pub fn encrypt(&self, call: &CallEnvelope) -> Result<CallEnvelope, MedalKitError> {
        let plaintext = serde_json::to_vec(call)?;
        let sealed = match self.strategy {
            CipherStrategy::RandomIv => {
                let mut iv = [0_u8; IV_LEN];
                rand::thread_rng().fill_bytes(&mut iv);
                CallEnvelope {
                    component: call.component.clone(),
                    // explicit null so the gateway sees the field was replaced
                    parameters: Some(Value::Null),
                    secure: Some(self.seal(&iv, &plaintext)),
                }
            }
            CipherStrategy::FixedIv => CallEnvelope {
                component: None,
                parameters: None,
                secure: Some(self.seal(&FIXED_IV, &plaintext)),
            },
        };
        Ok(sealed)
    }

    /// Opens a `secure` payload back into the original call. Works for both
    /// strategies since the IV is always the first 16 bytes.
    ///
    /// Used by the debug-mode self-test and by tests; the transport path
    /// never decrypts its own outgoing calls.
    ///
    /// # Errors
    /// Returns [`MedalKitError::Decryption`] for bad base64, a truncated
    /// payload or bad padding, and [`MedalKitError::Serialization`] if the
    /// recovered plaintext is not a call.
    pub fn decrypt(&self, secure: &str) -> Result<CallEnvelope, MedalKitError> {
        let sealed = STANDARD.decode(secure).map_err(|e| {
            MedalKitError::Decryption(format!("payload is not valid base64: {e}"))
        })?;
        if sealed.len() <= IV_LEN {
            return Err(MedalKitError::Decryption(
                "payload is shorter than the IV".to_owned(),
            ));
        }
        let (iv, ciphertext) = sealed.split_at(IV_LEN);
        let plaintext = Aes128CbcDec::new_from_slices(&self.key, iv)
            .map_err(|e| MedalKitError::Decryption(format!("bad key or IV length: {e}")))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|e| MedalKitError::Decryption(format!("bad padding: {e}")))?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    fn seal(&self, iv: &[u8; IV_LEN], plaintext: &[u8]) -> String {
        let ciphertext = Aes128CbcEnc::new(&self.key.into(), iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        let mut sealed = iv.to_vec();
        sealed.extend_from_slice(&ciphertext);
        STANDARD.encode(sealed)
    }
}
