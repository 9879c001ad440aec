//! Market price feeds
//!
//! Read-only spot rates from public market endpoints, used to refresh the
//! injected rate table. A feed failure degrades to the rates already in
//! the table; feeds never gate the calculator.

use crate::error::{Error, Result};
use crate::DEFAULT_REQUEST_TIMEOUT_SECONDS;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use transfer_core::{Currency, RateTable};

/// Spot-rate source
#[async_trait]
pub trait RateFeed: Send + Sync {
    /// Feed name for logs
    fn name(&self) -> &'static str;

    /// Current mid-rate converting one `base` unit into `quote` units
    async fn spot_rate(&self, base: Currency, quote: Currency) -> Result<Decimal>;
}

/// Binance spot ticker feed
///
/// Binance only lists specific symbols, so the pair → symbol mapping is
/// injected; unmapped pairs are not served by this feed.
pub struct BinanceFeed {
    client: Client,
    api_base: String,
    symbols: HashMap<(Currency, Currency), String>,
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: String,
}

impl BinanceFeed {
    /// Create a feed over an explicit symbol table
    pub fn new(
        api_base: impl Into<String>,
        symbols: HashMap<(Currency, Currency), String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.into(),
            symbols,
        })
    }
}

#[async_trait]
impl RateFeed for BinanceFeed {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn spot_rate(&self, base: Currency, quote: Currency) -> Result<Decimal> {
        let symbol = self
            .symbols
            .get(&(base, quote))
            .ok_or_else(|| Error::Config(format!("no Binance symbol for {base}/{quote}")))?;

        let response = self
            .client
            .get(format!("{}/api/v3/ticker/price", self.api_base))
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|e| {
                Error::from_request(e, "binance ticker", DEFAULT_REQUEST_TIMEOUT_SECONDS)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Provider {
                provider: "binance".to_string(),
                status_code: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let ticker: TickerPrice = response
            .json()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Decimal::from_str(&ticker.price)
            .map_err(|e| Error::MalformedEvent(format!("binance price {}: {e}", ticker.price)))
    }
}

/// CoinGecko simple-price feed
///
/// Prices every supported fiat against tether (≈ USD) and derives crosses
/// from the two USD legs.
pub struct CoinGeckoFeed {
    client: Client,
    api_base: String,
}

impl CoinGeckoFeed {
    /// Create a feed against the public API
    pub fn new(api_base: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.into(),
        })
    }

    async fn usd_prices(&self, currencies: &[Currency]) -> Result<HashMap<Currency, Decimal>> {
        let vs = currencies
            .iter()
            .map(|c| c.code().to_lowercase())
            .collect::<Vec<_>>()
            .join(",");

        let response = self
            .client
            .get(format!("{}/api/v3/simple/price", self.api_base))
            .query(&[("ids", "tether"), ("vs_currencies", vs.as_str())])
            .send()
            .await
            .map_err(|e| {
                Error::from_request(e, "coingecko simple price", DEFAULT_REQUEST_TIMEOUT_SECONDS)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Provider {
                provider: "coingecko".to_string(),
                status_code: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let mut prices = HashMap::new();
        for currency in currencies {
            let value = &body["tether"][currency.code().to_lowercase()];
            let price = Decimal::from_str(&value.to_string()).map_err(|e| {
                Error::MalformedEvent(format!("coingecko price for {currency}: {e}"))
            })?;
            prices.insert(*currency, price);
        }
        Ok(prices)
    }
}

#[async_trait]
impl RateFeed for CoinGeckoFeed {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    async fn spot_rate(&self, base: Currency, quote: Currency) -> Result<Decimal> {
        let prices = self.usd_prices(&[base, quote]).await?;
        let base_usd = prices[&base];
        let quote_usd = prices[&quote];
        if base_usd <= Decimal::ZERO {
            return Err(Error::MalformedEvent(format!(
                "coingecko returned non-positive price for {base}"
            )));
        }
        // 1 base = (quote-per-USD / base-per-USD) quote
        Ok(quote_usd / base_usd)
    }
}

/// Refreshes a rate table from the first feed that serves each pair
pub struct RateRefresher {
    feeds: Vec<Arc<dyn RateFeed>>,
}

impl RateRefresher {
    /// Feeds are tried in order per pair
    pub fn new(feeds: Vec<Arc<dyn RateFeed>>) -> Self {
        Self { feeds }
    }

    /// Produce a table with fresh rates where available, keeping the
    /// current rate for every pair no feed can serve
    pub async fn refreshed(&self, current: &RateTable) -> RateTable {
        let pairs: Vec<_> = current.pairs().collect();
        let mut updated = Vec::with_capacity(pairs.len());

        for (base, quote) in pairs {
            let Ok(mut rate) = current.rate_of(base, quote) else {
                continue;
            };

            for feed in &self.feeds {
                match feed.spot_rate(base, quote).await {
                    Ok(fresh) if fresh > Decimal::ZERO => {
                        rate = fresh;
                        break;
                    }
                    Ok(fresh) => {
                        warn!(feed = feed.name(), %base, %quote, %fresh, "Ignoring non-positive rate");
                    }
                    Err(e) => {
                        warn!(feed = feed.name(), %base, %quote, error = %e, "Rate feed failed");
                    }
                }
            }
            updated.push((base, quote, rate));
        }

        RateTable::from_pairs(updated)
    }
}
