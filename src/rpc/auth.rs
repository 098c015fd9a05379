//! Per-call request authentication.
//!
//! The signature is `md5(hex(sha256(preimage)))` where the preimage is the auth nonce
//! followed by every auth parameter, the chain id, the sdk id and the secret key, each
//! prefixed with `&`. Both digest stages and their order are fixed by the gateway.

use md5::Md5;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::config::AuthCredential;
use crate::rpc::types::AuthToken;

const NONCE_LEN: usize = 16;
const NONCE_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const DELIMITER: char = '&';

/// Signs outbound calls with the shared secret.
#[derive(Clone)]
pub struct AuthSigner {
    credential: AuthCredential,
}

impl AuthSigner {
    pub fn new(credential: AuthCredential) -> Self {
        Self { credential }
    }

    /// False when any credential field is missing; calls then go out unsigned.
    pub fn is_enabled(&self) -> bool {
        self.credential.is_complete()
    }

    /// Token for a call authenticated over `params`, with a fresh auth nonce.
    pub fn sign(&self, params: &[String]) -> Option<AuthToken> {
        if !self.is_enabled() {
            return None;
        }
        self.sign_with_nonce(params, &random_nonce())
    }

    /// Token for `params` using a caller-chosen auth nonce.
    pub fn sign_with_nonce(&self, params: &[String], nonce: &str) -> Option<AuthToken> {
        if !self.is_enabled() {
            return None;
        }

        let mut preimage = String::from(nonce);
        for part in params.iter().map(String::as_str).chain([
            self.credential.chain_id.as_str(),
            self.credential.sdk_id.as_str(),
            self.credential.secret_key.as_str(),
        ]) {
            preimage.push(DELIMITER);
            preimage.push_str(part);
        }

        let inner = hex::encode(Sha256::digest(preimage.as_bytes()));
        let signature = hex::encode(Md5::digest(inner.as_bytes()));

        tracing::debug!(rand = %nonce, sign = %signature, "Signed rpc call");

        Some(AuthToken {
            chain_id: self.credential.chain_id.clone(),
            sdk_id: self.credential.sdk_id.clone(),
            nonce: nonce.to_string(),
            signature,
        })
    }
}

impl std::fmt::Debug for AuthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSigner").field("credential", &self.credential).finish()
    }
}

/// Random lowercase alphanumeric string used once per call.
pub fn random_nonce() -> String {
    let mut rng = rand::thread_rng();
    (0..NONCE_LEN)
        .map(|_| NONCE_ALPHABET[rng.gen_range(0..NONCE_ALPHABET.len())] as char)
        .collect()
}
