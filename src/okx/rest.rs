use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::OkxConfig;
use crate::error::AppError;
use crate::model::candle::CandleSeries;
use crate::pipeline::CandleSource;

use super::types::OkxResponse;

/// Public market-data client for the OKX v5 REST API.
pub struct OkxRestClient {
    http: Client,
    base_url: String,
}

impl OkxRestClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &OkxConfig) -> Result<Self, AppError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    fn compact_error_body(body: &str) -> String {
        let normalized = body.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.chars().count() > 180 {
            format!("{}...", normalized.chars().take(180).collect::<String>())
        } else {
            normalized
        }
    }

    /// Fetch the most recent `limit` closed and open bars, oldest first.
    pub fn get_history_candles(
        &self,
        inst_id: &str,
        bar: &str,
        limit: usize,
    ) -> Result<CandleSeries, AppError> {
        let url = format!("{}/api/v5/market/history-candles", self.base_url);
        let limit_s = limit.to_string();

        tracing::debug!(inst_id, bar, limit, "Requesting OKX history candles");

        let resp = self
            .http
            .get(&url)
            .query(&[("instId", inst_id), ("bar", bar), ("limit", limit_s.as_str())])
            .send()?;

        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            if let Ok(parsed) = serde_json::from_str::<OkxResponse>(&body) {
                if let Some(code) = parsed.error_code() {
                    return Err(AppError::OkxApi {
                        code,
                        msg: parsed.msg.unwrap_or_default(),
                    });
                }
            }
            return Err(AppError::OkxApi {
                code: status.as_u16().to_string(),
                msg: Self::compact_error_body(&body),
            });
        }

        parse_history_candles(&body)
    }
}

/// Decode a history-candles body. OKX lists newest first; the series is ascending.
pub fn parse_history_candles(body: &str) -> Result<CandleSeries, AppError> {
    let response: OkxResponse = serde_json::from_str(body)?;
    let mut candles = response.into_candles()?;
    candles.sort_by_key(|c| c.timestamp);
    CandleSeries::new(candles)
}

impl CandleSource for OkxRestClient {
    fn fetch_candles(
        &self,
        inst_id: &str,
        bar: &str,
        limit: usize,
    ) -> Result<CandleSeries, AppError> {
        let series = self.get_history_candles(inst_id, bar, limit)?;
        let inconsistent = series
            .candles()
            .iter()
            .filter(|c| !c.is_consistent())
            .count();
        if inconsistent > 0 {
            tracing::warn!(inst_id, bar, inconsistent, "Bars with high/low outside open/close");
        }
        tracing::info!(inst_id, bar, bars = series.len(), "Fetched OKX candles");
        Ok(series)
    }
}
