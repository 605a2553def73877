//! GMGN API Client
//!
//! Listing feed (`/coins/{category}`) and token metrics
//! (`/tokens/{address}/metrics`). Numeric fields arrive either as numbers or
//! strings depending on the endpoint, so every one of them is parsed leniently.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::{join_url, lenient_f64, lenient_f64_seq, lenient_opt_f64, lenient_u64, JsonClient};
use crate::domain::{EnrichedMetrics, TokenCandidate};
use crate::ports::{ListingSource, MetricsSource, SourceError};

#[derive(Debug, Clone)]
pub struct GmgnConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for GmgnConfig {
    fn default() -> Self {
        Self {
            base_url: "https://gmgn.ai/defi/quotation/v1".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct GmgnClient {
    config: GmgnConfig,
    http: JsonClient,
}

impl GmgnClient {
    pub fn new(config: GmgnConfig) -> Result<Self, SourceError> {
        let http = JsonClient::new(config.timeout)?;
        Ok(Self { config, http })
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let req = self.http.get(&join_url(&self.config.base_url, path));
        match &self.config.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default)]
    data: Vec<GmgnCoin>,
}

#[derive(Debug, Deserialize)]
struct GmgnCoin {
    #[serde(default, alias = "contract_address")]
    address: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    price: f64,
    #[serde(default, alias = "trading_volume_24h", deserialize_with = "lenient_f64")]
    volume_24h: f64,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    liquidity: Option<f64>,
    #[serde(default, alias = "supply", deserialize_with = "lenient_opt_f64")]
    total_supply: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    price_change_24h: f64,
    #[serde(default, alias = "creator")]
    dev_wallet: Option<String>,
}

impl GmgnCoin {
    fn into_candidate(self, category: &str) -> TokenCandidate {
        let mut candidate = TokenCandidate::new(self.address, self.symbol, category)
            .with_name(self.name)
            .with_price(self.price)
            .with_volume(self.volume_24h)
            .with_price_change(self.price_change_24h);
        if let Some(liquidity) = self.liquidity {
            candidate = candidate.with_liquidity(liquidity);
        }
        if let Some(supply) = self.total_supply {
            candidate = candidate.with_total_supply(supply);
        }
        if let Some(dev) = self.dev_wallet.filter(|d| !d.is_empty()) {
            candidate = candidate.with_dev_wallet(dev);
        }
        candidate
    }
}

#[derive(Debug, Deserialize)]
struct MetricsResponse {
    #[serde(default, deserialize_with = "lenient_u64")]
    top_holders_count: u64,
    #[serde(default, deserialize_with = "lenient_f64")]
    trading_volume_24h: f64,
    #[serde(default, deserialize_with = "lenient_f64_seq")]
    price_history: Vec<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    liquidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    total_supply: Option<f64>,
}

pub(crate) fn parse_listings(body: &str, category: &str) -> Result<Vec<TokenCandidate>, SourceError> {
    let response: ListingResponse = super::http::parse_json(body)?;
    Ok(response
        .data
        .into_iter()
        .filter(|coin| !coin.address.is_empty())
        .map(|coin| coin.into_candidate(category))
        .collect())
}

pub(crate) fn parse_metrics(body: &str, token_id: &str) -> Result<EnrichedMetrics, SourceError> {
    let response: MetricsResponse = super::http::parse_json(body)?;
    Ok(EnrichedMetrics {
        token_id: token_id.to_string(),
        top_holders: response.top_holders_count,
        trading_volume: response.trading_volume_24h,
        price_history: response.price_history,
        liquidity: response.liquidity,
        total_supply: response.total_supply,
    })
}

#[async_trait]
impl ListingSource for GmgnClient {
    async fn fetch_listings(&self, category: &str) -> Result<Vec<TokenCandidate>, SourceError> {
        let body = self.http.send(self.request(&format!("coins/{}", category))).await?;
        parse_listings(&body, category)
    }
}

#[async_trait]
impl MetricsSource for GmgnClient {
    async fn fetch_metrics(&self, token_id: &str) -> Result<EnrichedMetrics, SourceError> {
        let body = self
            .http
            .send(self.request(&format!("tokens/{}/metrics", token_id)))
            .await?;
        parse_metrics(&body, token_id)
    }
}
