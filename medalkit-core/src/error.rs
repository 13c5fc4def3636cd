use thiserror::Error;

/// Error outputs from `MedalKit`
#[derive(Debug, Error)]
pub enum MedalKitError {
    /// The configured cipher key is not valid base64 or has the wrong length
    #[error("invalid_cipher_key: {0}")]
    InvalidCipherKey(String),
    /// A sealed payload could not be decrypted back into a call
    #[error("decryption_error: {0}")]
    Decryption(String),
    /// Unexpected error serializing or parsing a call envelope
    #[error("serialization_error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// HTTP request failure
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}
