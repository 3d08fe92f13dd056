use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("Public key is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("Public key must be 32 bytes, got {0}")]
    InvalidLength(usize),
    #[error("Public key is not a valid Ed25519 point")]
    InvalidKey,
}

/// Checks the `X-Signature-Ed25519` header Discord puts on interaction requests
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    pub fn from_hex(public_key: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(public_key.trim())?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| SignatureError::InvalidLength(bytes.len()))?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| SignatureError::InvalidKey)?;
        Ok(Self { key })
    }

    pub fn from_key(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// The signed message is the timestamp header followed by the raw body
    pub fn verify(&self, timestamp: &str, body: &[u8], signature_hex: &str) -> bool {
        let Ok(signature_bytes) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&signature_bytes) else {
            return false;
        };

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);
        self.key.verify(&message, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    #[test]
    fn accepts_valid_signature() {
        let key = signing_key();
        let verifier =
            SignatureVerifier::from_hex(&hex::encode(key.verifying_key().to_bytes())).unwrap();
        let signature = key.sign(b"1700000000{\"type\":1}");

        assert!(verifier.verify(
            "1700000000",
            b"{\"type\":1}",
            &hex::encode(signature.to_bytes())
        ));
    }

    #[test]
    fn rejects_tampered_body_and_garbage() {
        let key = signing_key();
        let verifier = SignatureVerifier::from_key(key.verifying_key());
        let signature = hex::encode(key.sign(b"1700000000{\"type\":1}").to_bytes());

        assert!(!verifier.verify("1700000000", b"{\"type\":2}", &signature));
        assert!(!verifier.verify("1700000000", b"{\"type\":1}", "not-hex"));
        assert!(!verifier.verify("1700000000", b"{\"type\":1}", "abcd"));
    }

    #[test]
    fn rejects_short_public_key() {
        assert!(matches!(
            SignatureVerifier::from_hex("abcd"),
            Err(SignatureError::InvalidLength(2))
        ));
    }
}
