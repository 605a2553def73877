//! RugCheck Safety Report Client
//!
//! `GET {base}/tokens/{address}/report/summary`, returning a status string
//! and a risk score. An absent status is reported as UNKNOWN, which the
//! filter chain treats as not safe.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::{join_url, lenient_f64, parse_json, JsonClient};
use crate::domain::{SafetyReport, SafetyStatus};
use crate::ports::{SafetyReportSource, SourceError};

#[derive(Debug, Clone)]
pub struct RugcheckConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for RugcheckConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.rugcheck.xyz/v1".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct RugcheckClient {
    config: RugcheckConfig,
    http: JsonClient,
}

impl RugcheckClient {
    pub fn new(config: RugcheckConfig) -> Result<Self, SourceError> {
        let http = JsonClient::new(config.timeout)?;
        Ok(Self { config, http })
    }
}

#[derive(Debug, Deserialize)]
struct ReportSummary {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "score_normalised", deserialize_with = "lenient_f64")]
    risk_score: f64,
}

pub(crate) fn parse_report(body: &str, token_id: &str) -> Result<SafetyReport, SourceError> {
    let summary: ReportSummary = parse_json(body)?;
    let status = summary
        .status
        .as_deref()
        .map(SafetyStatus::parse)
        .unwrap_or(SafetyStatus::Unknown);

    let report = SafetyReport::new(token_id, status, summary.risk_score);
    Ok(match summary.name.filter(|n| !n.is_empty()) {
        Some(name) => report.with_name(name),
        None => report,
    })
}

#[async_trait]
impl SafetyReportSource for RugcheckClient {
    async fn fetch_safety_report(&self, token_id: &str) -> Result<SafetyReport, SourceError> {
        let url = join_url(&self.config.base_url, &format!("tokens/{}/report/summary", token_id));
        let mut request = self.http.get(&url);
        if let Some(key) = &self.config.api_key {
            request = request.header("x-api-key", key);
        }

        let body = self.http.send(request).await?;
        let report = parse_report(&body, token_id)?;
        tracing::debug!("Safety report for {}: {} (risk {})", token_id, report.status, report.risk_score);
        Ok(report)
    }
}
