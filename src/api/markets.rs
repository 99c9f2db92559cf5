//! Market data endpoints
//!
//! Read-only calls used by the dashboard views. Failures are returned as raw
//! [`ClientError`](crate::error::ClientError)s; the pipeline still handles 401s.

use crate::api::client::ApiClient;
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_MARKET_TYPE: &str = "stocks";
pub const DEFAULT_ASSET_LIMIT: u32 = 50;
pub const DEFAULT_TIMESPAN: &str = "day";
pub const DEFAULT_CANDLE_LIMIT: u32 = 100;

/// Parameters for a candle (OHLC) series request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleQuery {
    pub symbol: String,
    pub timespan: String,
    pub multiplier: u32,
    pub limit: u32,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl CandleQuery {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            timespan: DEFAULT_TIMESPAN.to_string(),
            multiplier: 1,
            limit: DEFAULT_CANDLE_LIMIT,
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_timespan(mut self, timespan: impl Into<String>) -> Self {
        self.timespan = timespan.into();
        self
    }

    pub fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_range(mut self, start_date: Option<String>, end_date: Option<String>) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    fn params(&self) -> CandleParams<'_> {
        CandleParams {
            timespan: &self.timespan,
            multiplier: self.multiplier,
            limit: self.limit,
            start_date: self.start_date.as_deref(),
            end_date: self.end_date.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CandleParams<'a> {
    timespan: &'a str,
    multiplier: u32,
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PageParams {
    limit: u32,
    offset: u32,
}

#[derive(Debug, Clone)]
pub struct MarketService {
    client: ApiClient,
}

impl MarketService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn markets(&self) -> Result<Value> {
        Ok(self.client.get(&["markets"]).await?.into_body())
    }

    pub async fn overview(&self, market_type: &str) -> Result<Value> {
        Ok(self
            .client
            .get(&["markets", market_type, "overview"])
            .await?
            .into_body())
    }

    pub async fn assets(&self, market_type: &str, limit: u32, offset: u32) -> Result<Value> {
        let params = PageParams { limit, offset };
        Ok(self
            .client
            .get_with_query(&["markets", market_type, "assets"], &params)
            .await?
            .into_body())
    }

    pub async fn asset_details(&self, symbol: &str) -> Result<Value> {
        Ok(self
            .client
            .get(&["markets", "assets", symbol])
            .await?
            .into_body())
    }

    pub async fn candles(&self, query: &CandleQuery) -> Result<Value> {
        Ok(self
            .client
            .get_with_query(&["markets", query.symbol.as_str(), "candles"], &query.params())
            .await?
            .into_body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_query_defaults() {
        let query = CandleQuery::new("AAPL");
        assert_eq!(query.timespan, "day");
        assert_eq!(query.multiplier, 1);
        assert_eq!(query.limit, 100);
        assert!(query.start_date.is_none() && query.end_date.is_none());
    }

    #[test]
    fn test_candle_params_skip_unset_dates() {
        let query = CandleQuery::new("AAPL").with_range(Some("2024-01-01".to_string()), None);
        let value = serde_json::to_value(query.params()).unwrap();
        assert_eq!(value["start_date"], "2024-01-01");
        assert!(value.get("end_date").is_none());
    }
}
