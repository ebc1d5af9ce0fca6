//! Webhook signature strategies.
//!
//! The sandbox gateway signs every notification with a fixed sentinel
//! token. Deployments that want real verification switch to the HMAC
//! strategy, which signs the payload with the shared webhook secret.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{PaymentError, Result};
use crate::simulator::config::{SignatureStrategy, SimulatorConfig};

/// Token carried by every sandbox notification.
pub const SIMULATED_SIGNATURE: &str = "simulated_signature";

/// Header the webhook endpoint reads the signature from.
pub const SIGNATURE_HEADER: &str = "x-signature";

type HmacSha256 = Hmac<Sha256>;

/// Signs outgoing notifications and checks incoming ones.
pub trait SignatureVerifier: Send + Sync {
    /// Signature for `payload`.
    fn sign(&self, payload: &[u8]) -> String;

    /// Returns true if `signature` is valid for `payload`.
    fn verify(&self, payload: &[u8], signature: &str) -> bool;
}

/// Accepts exactly [`SIMULATED_SIGNATURE`], whatever the payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentinelVerifier;

impl SignatureVerifier for SentinelVerifier {
    fn sign(&self, _payload: &[u8]) -> String {
        SIMULATED_SIGNATURE.to_string()
    }

    fn verify(&self, _payload: &[u8], signature: &str) -> bool {
        signature == SIMULATED_SIGNATURE
    }
}

/// Hex-encoded HMAC-SHA256 keyed by the webhook secret.
#[derive(Clone)]
pub struct HmacSha256Verifier {
    mac: HmacSha256,
}

impl HmacSha256Verifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_ref())
            .map_err(|e| PaymentError::Config(format!("webhook secret: {e}")))?;
        Ok(HmacSha256Verifier { mac })
    }
}

impl std::fmt::Debug for HmacSha256Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSha256Verifier").finish_non_exhaustive()
    }
}

impl SignatureVerifier for HmacSha256Verifier {
    fn sign(&self, payload: &[u8]) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    fn verify(&self, payload: &[u8], signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature.trim()) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    }
}

/// Build the verifier selected by `config`.
pub fn verifier_for(config: &SimulatorConfig) -> Result<Arc<dyn SignatureVerifier>> {
    Ok(match config.signature_strategy {
        SignatureStrategy::Sentinel => Arc::new(SentinelVerifier),
        SignatureStrategy::Hmac => Arc::new(HmacSha256Verifier::new(&config.webhook_secret)?),
    })
}
