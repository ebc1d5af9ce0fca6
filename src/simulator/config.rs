//! Simulator configuration.
//!
//! The simulated gateway needs a handful of knobs: placeholder credentials,
//! the webhook signature strategy, how long a PIX QR code stays payable, and
//! how long the fake bank takes to confirm a PIX transfer. Defaults match the
//! sandbox behaviour; every value can be overridden from the environment.

use std::time::Duration;

use crate::error::{PaymentError, Result};

pub const DEFAULT_API_KEY: &str = "sk_test_simulated_key_123456789";
pub const DEFAULT_WEBHOOK_SECRET: &str = "whsec_simulated_webhook_secret";
pub const DEFAULT_PIX_EXPIRY_MINUTES: i64 = 30;
pub const DEFAULT_CONFIRMATION_DELAY_SECS: u64 = 10;
pub const DEFAULT_MERCHANT_NAME: &str = "LANCHE APP";
pub const DEFAULT_MERCHANT_CITY: &str = "SAO PAULO";

/// How webhook signatures are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureStrategy {
    /// Accept only the fixed `simulated_signature` token.
    #[default]
    Sentinel,
    /// Hex HMAC-SHA256 over the payload, keyed by the webhook secret.
    Hmac,
}

impl std::str::FromStr for SignatureStrategy {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sentinel" => Ok(SignatureStrategy::Sentinel),
            "hmac" => Ok(SignatureStrategy::Hmac),
            other => Err(PaymentError::Config(format!(
                "unknown signature strategy '{other}'"
            ))),
        }
    }
}

/// Settings for one `PaymentSimulator` instance.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Placeholder gateway API key.
    pub api_key: String,
    /// Shared secret for HMAC webhook signatures.
    pub webhook_secret: String,
    pub signature_strategy: SignatureStrategy,
    /// Minutes a PIX charge stays payable after creation.
    pub pix_expiry_minutes: i64,
    /// Default wait before a PIX confirmation fires.
    pub confirmation_delay: Duration,
    /// Merchant name embedded in the PIX payload.
    pub merchant_name: String,
    /// Merchant city embedded in the PIX payload.
    pub merchant_city: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            api_key: DEFAULT_API_KEY.to_string(),
            webhook_secret: DEFAULT_WEBHOOK_SECRET.to_string(),
            signature_strategy: SignatureStrategy::Sentinel,
            pix_expiry_minutes: DEFAULT_PIX_EXPIRY_MINUTES,
            confirmation_delay: Duration::from_secs(DEFAULT_CONFIRMATION_DELAY_SECS),
            merchant_name: DEFAULT_MERCHANT_NAME.to_string(),
            merchant_city: DEFAULT_MERCHANT_CITY.to_string(),
        }
    }
}

impl SimulatorConfig {
    /// Defaults overridden by `LANCHE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SimulatorConfig::from_env`] but reading from any lookup
    /// function, so tests don't have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SimulatorConfig::default();

        if let Some(key) = lookup("LANCHE_API_KEY") {
            config.api_key = key;
        }
        if let Some(secret) = lookup("LANCHE_WEBHOOK_SECRET") {
            config.webhook_secret = secret;
        }
        if let Some(strategy) = lookup("LANCHE_SIGNATURE_STRATEGY") {
            config.signature_strategy = strategy.parse()?;
        }
        if let Some(minutes) = lookup("LANCHE_PIX_EXPIRY_MINUTES") {
            config.pix_expiry_minutes = minutes
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|m| *m > 0)
                .ok_or_else(|| {
                    PaymentError::Config(format!("LANCHE_PIX_EXPIRY_MINUTES='{minutes}'"))
                })?;
        }
        if let Some(secs) = lookup("LANCHE_CONFIRMATION_DELAY_SECS") {
            let parsed = secs.trim().parse::<u64>().map_err(|_| {
                PaymentError::Config(format!("LANCHE_CONFIRMATION_DELAY_SECS='{secs}'"))
            })?;
            config.confirmation_delay = Duration::from_secs(parsed);
        }

        Ok(config)
    }
}
