//! PKCE (RFC 7636) helpers for the browser sign-in.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Verifier/challenge pair for one authorization request
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// Sent with the code exchange
    pub code_verifier: String,
    /// `BASE64URL(SHA256(verifier))`, sent with the authorize request
    pub code_challenge: String,
}

impl PkceChallenge {
    pub fn generate() -> Self {
        let code_verifier = random_token();
        let code_challenge = code_challenge_for(&code_verifier);
        Self {
            code_verifier,
            code_challenge,
        }
    }
}

/// 32 random bytes, base64url without padding (43 chars)
pub fn random_token() -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn code_challenge_for(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}
