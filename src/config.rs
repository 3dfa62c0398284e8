// src/config.rs

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;

use crate::blockchain::networks;

/// Network used when a tool call does not name one.
pub const DEFAULT_NETWORK: &str = "ethereum";

/// Decimals assumed for staking and reward tokens when formatting amounts.
pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;

/// 365 days; the APR estimate does not account for leap years.
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

/// Referral address passed to Lido `submit` when the caller gives none.
pub const DEFAULT_LIDO_REFERRAL: &str = "0x40252CFDF8B20Ed757D61ff157719F33Ec332402";

/// Decimal places of `userSharePercent` in staking positions.
pub const SHARE_PERCENT_PRECISION: u32 = 4;

/// Decimal places of `estimatedAPR`.
pub const APR_PRECISION: u32 = 2;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 2_000;

// All configuration, loaded once at startup from the environment / .env file.
#[derive(Debug)]
pub struct Config {
    // Server settings
    pub port: u16,

    /// RPC endpoint overrides keyed by canonical network name
    /// (`ethereum`, `arbitrum`, ...). Networks without an override use the
    /// public endpoint from the static network table.
    pub chain_rpc_urls: HashMap<String, String>,

    /// Signing key used by write tools when the caller does not pass one.
    pub default_private_key: Option<SecretString>,

    // Transaction settings
    pub receipt_timeout: Duration,
    pub receipt_poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            chain_rpc_urls: HashMap::new(),
            default_private_key: None,
            receipt_timeout: Duration::from_secs(DEFAULT_RECEIPT_TIMEOUT_SECS),
            receipt_poll_interval: Duration::from_millis(DEFAULT_RECEIPT_POLL_INTERVAL_MS),
        }
    }
}

impl Config {
    /// Returns the networks that have an explicit RPC override.
    pub fn overridden_networks(&self) -> Vec<String> {
        self.chain_rpc_urls.keys().cloned().collect()
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let chain_rpc_urls = match env::var("CHAIN_RPC_URLS") {
            Ok(raw) if !raw.trim().is_empty() => parse_rpc_overrides(&raw)?,
            _ => HashMap::new(),
        };

        let default_private_key = env::var("PRIVATE_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::new);

        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .context("PORT must be a valid number")?,
            chain_rpc_urls,
            default_private_key,
            receipt_timeout: Duration::from_secs(
                env::var("RECEIPT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| DEFAULT_RECEIPT_TIMEOUT_SECS.to_string())
                    .parse()
                    .context("RECEIPT_TIMEOUT_SECS must be a valid number")?,
            ),
            receipt_poll_interval: Duration::from_millis(
                env::var("RECEIPT_POLL_INTERVAL_MS")
                    .unwrap_or_else(|_| DEFAULT_RECEIPT_POLL_INTERVAL_MS.to_string())
                    .parse()
                    .context("RECEIPT_POLL_INTERVAL_MS must be a valid number")?,
            ),
        })
    }
}

/// Parses `CHAIN_RPC_URLS`, a JSON map of network name or chain id to RPC URL.
/// Keys are normalized to canonical network names.
pub fn parse_rpc_overrides(raw: &str) -> Result<HashMap<String, String>> {
    let entries: HashMap<String, String> =
        serde_json::from_str(raw).context("Invalid CHAIN_RPC_URLS JSON format")?;

    let mut overrides = HashMap::with_capacity(entries.len());
    for (key, rpc_url) in entries {
        let network = networks::resolve(&key)
            .map_err(|e| anyhow!("CHAIN_RPC_URLS entry '{}': {}", key, e))?;
        url::Url::parse(&rpc_url)
            .with_context(|| format!("CHAIN_RPC_URLS entry '{}' has an invalid URL", key))?;
        overrides.insert(network.name.to_string(), rpc_url);
    }
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_overrides_are_keyed_by_canonical_name() {
        let overrides = parse_rpc_overrides(
            r#"{"1": "https://rpc.example.com", "arb": "https://arb.example.com"}"#,
        )
        .unwrap();
        assert_eq!(overrides.get("ethereum").unwrap(), "https://rpc.example.com");
        assert_eq!(overrides.get("arbitrum").unwrap(), "https://arb.example.com");
    }

    #[test]
    fn rpc_overrides_reject_unknown_networks_and_bad_urls() {
        assert!(parse_rpc_overrides(r#"{"dogechain": "https://x.example.com"}"#).is_err());
        assert!(parse_rpc_overrides(r#"{"ethereum": "not a url"}"#).is_err());
        assert!(parse_rpc_overrides("[]").is_err());
    }

    #[test]
    fn seconds_per_year_matches_365_days() {
        assert_eq!(SECONDS_PER_YEAR, 31_536_000);
    }
}
