//! Dexscreener Listing Feed
//!
//! Alternative [`ListingSource`] backed by the public pair search endpoint.
//! Pairs are keyed by their base token; the feed category is used as the
//! search query.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::{join_url, lenient_f64, lenient_opt_f64, parse_json, JsonClient};
use crate::domain::TokenCandidate;
use crate::ports::{ListingSource, SourceError};

#[derive(Debug, Clone)]
pub struct DexscreenerConfig {
    pub base_url: String,
    /// Only pairs on this chain are kept (empty keeps everything)
    pub chain_id: String,
    pub timeout: Duration,
}

impl Default for DexscreenerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dexscreener.com/latest/dex".to_string(),
            chain_id: "solana".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct DexscreenerClient {
    config: DexscreenerConfig,
    http: JsonClient,
}

impl DexscreenerClient {
    pub fn new(config: DexscreenerConfig) -> Result<Self, SourceError> {
        let http = JsonClient::new(config.timeout)?;
        Ok(Self { config, http })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    pairs: Option<Vec<Pair>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pair {
    #[serde(default)]
    chain_id: String,
    base_token: BaseToken,
    #[serde(default, deserialize_with = "lenient_f64")]
    price_usd: f64,
    #[serde(default)]
    volume: Window,
    #[serde(default)]
    price_change: Window,
    #[serde(default)]
    liquidity: Liquidity,
}

#[derive(Debug, Deserialize)]
struct BaseToken {
    #[serde(default)]
    address: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    supply: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Window {
    #[serde(default, deserialize_with = "lenient_f64")]
    h24: f64,
}

#[derive(Debug, Default, Deserialize)]
struct Liquidity {
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    usd: Option<f64>,
}

pub(crate) fn parse_pairs(body: &str, category: &str, chain_id: &str) -> Result<Vec<TokenCandidate>, SourceError> {
    let response: SearchResponse = parse_json(body)?;

    Ok(response
        .pairs
        .unwrap_or_default()
        .into_iter()
        .filter(|pair| chain_id.is_empty() || pair.chain_id.eq_ignore_ascii_case(chain_id))
        .filter(|pair| !pair.base_token.address.is_empty())
        .map(|pair| {
            let mut candidate = TokenCandidate::new(pair.base_token.address, pair.base_token.symbol, category)
                .with_name(pair.base_token.name)
                .with_price(pair.price_usd)
                .with_volume(pair.volume.h24)
                .with_price_change(pair.price_change.h24);
            if let Some(liquidity) = pair.liquidity.usd {
                candidate = candidate.with_liquidity(liquidity);
            }
            if let Some(supply) = pair.base_token.supply {
                candidate = candidate.with_total_supply(supply);
            }
            candidate
        })
        .collect())
}

#[async_trait]
impl ListingSource for DexscreenerClient {
    async fn fetch_listings(&self, category: &str) -> Result<Vec<TokenCandidate>, SourceError> {
        let request = self
            .http
            .get(&join_url(&self.config.base_url, "search"))
            .query(&[("q", category)]);
        let body = self.http.send(request).await?;
        parse_pairs(&body, category, &self.config.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "schemaVersion": "1.0.0",
        "pairs": [
            {
                "chainId": "solana",
                "baseToken": {"address": "Mint1", "name": "One", "symbol": "ONE", "supply": "1000000"},
                "priceUsd": "0.0042",
                "volume": {"h24": 81234.5},
                "priceChange": {"h24": -12.5},
                "liquidity": {"usd": 25000}
            },
            {
                "chainId": "ethereum",
                "baseToken": {"address": "0xabc", "symbol": "ETHY"},
                "priceUsd": "1.0"
            },
            {
                "chainId": "solana",
                "baseToken": {"address": "Mint2", "symbol": "TWO"}
            }
        ]
    }"#;

    #[test]
    fn test_parse_pairs_filters_chain() {
        let listings = parse_pairs(BODY, "pumped", "solana").unwrap();
        assert_eq!(listings.len(), 2);

        let one = &listings[0];
        assert_eq!(one.id, "Mint1");
        assert_eq!(one.price, 0.0042);
        assert_eq!(one.volume_24h, 81_234.5);
        assert_eq!(one.price_change_24h, -12.5);
        assert_eq!(one.liquidity, Some(25_000.0));
        assert_eq!(one.total_supply, Some(1_000_000.0));

        // Absent market data stays absent
        let two = &listings[1];
        assert_eq!(two.liquidity, None);
        assert_eq!(two.volume_24h, 0.0);
    }

    #[test]
    fn test_null_pairs_is_empty() {
        assert!(parse_pairs(r#"{"pairs": null}"#, "x", "solana").unwrap().is_empty());
    }

    #[test]
    fn test_empty_chain_keeps_all() {
        assert_eq!(parse_pairs(BODY, "x", "").unwrap().len(), 3);
    }
}
