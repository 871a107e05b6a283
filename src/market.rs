//! Market-cap fetching and formatting.
//!
//! Pulls token pair data from a public price aggregator, picks the
//! highest-liquidity pair, and formats the cap for the display.

use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

/// USDC on Ethereum mainnet.
pub const USDC_ETH: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

/// Token-pair endpoint of the aggregator.
const API_BASE: &str = "https://api.dexscreener.com/token-pairs/v1/ethereum";

const USER_AGENT: &str = "PixieBleClient/1.0";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One trading pair as reported by the aggregator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// The token the pair is quoted for.
    #[serde(default)]
    pub base_token: BaseToken,
    /// Liquidity depth of the pair.
    #[serde(default)]
    pub liquidity: Option<Liquidity>,
    /// Circulating market cap in USD.
    #[serde(default)]
    pub market_cap: Option<f64>,
    /// Fully diluted valuation in USD.
    #[serde(default)]
    pub fdv: Option<f64>,
}

/// Base token descriptor within a pair.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BaseToken {
    /// Ticker symbol, e.g. `USDC`.
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Liquidity figures for a pair.
#[derive(Debug, Clone, Deserialize)]
pub struct Liquidity {
    /// USD-denominated liquidity.
    #[serde(default)]
    pub usd: Option<f64>,
}

/// Fetch the market cap for `token_address`.
///
/// Returns the base token symbol and the cap in USD, taken from the pair
/// with the deepest liquidity.
///
/// # Errors
///
/// Returns an error if the request fails, no pairs come back, or the best
/// pair carries neither a market cap nor an FDV.
pub async fn fetch_market_cap(token_address: &str) -> Result<(String, f64)> {
    let url = format!("{API_BASE}/{token_address}");
    debug!("Fetching {}", url);

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()?;

    let pairs: Vec<TokenPair> = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let best = select_best_pair(pairs)?;
    let cap = market_cap(&best)?;
    let symbol = best.base_token.symbol.unwrap_or_else(|| "USDC".to_string());

    Ok((symbol, cap))
}

/// Pick the pair with the deepest USD liquidity.
pub fn select_best_pair(pairs: Vec<TokenPair>) -> Result<TokenPair> {
    pairs
        .into_iter()
        .max_by(|a, b| liquidity_usd(a).total_cmp(&liquidity_usd(b)))
        .ok_or(Error::NoPairs)
}

fn liquidity_usd(pair: &TokenPair) -> f64 {
    pair.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0)
}

/// Market cap of a pair, falling back to FDV when the cap is absent or NaN.
pub fn market_cap(pair: &TokenPair) -> Result<f64> {
    match pair.market_cap {
        Some(cap) if !cap.is_nan() => Ok(cap),
        _ => pair.fdv.ok_or(Error::MissingMarketCap),
    }
}

/// Format a USD value with a fixed K/M/B/T magnitude suffix at two
/// decimals. Values below 1,000 render as whole units.
pub fn format_cap(value: f64) -> String {
    if value >= 1_000_000_000_000.0 {
        format!("{:.2}T", value / 1_000_000_000_000.0)
    } else if value >= 1_000_000_000.0 {
        format!("{:.2}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.2}K", value / 1_000.0)
    } else {
        format!("{value:.0}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_format_cap_magnitudes() {
        assert_eq!(format_cap(1_500_000_000.0), "1.50B");
        assert_eq!(format_cap(2_340_000.0), "2.34M");
        assert_eq!(format_cap(999.0), "999");
        assert_eq!(format_cap(1_000.0), "1.00K");
        assert_eq!(format_cap(4_200_000_000_000.0), "4.20T");
        assert_eq!(format_cap(0.0), "0");
    }

    #[test]
    fn test_best_pair_wins_on_liquidity() {
        let pairs: Vec<TokenPair> = serde_json::from_str(
            r#"[
                {"baseToken":{"symbol":"USDC"},"liquidity":{"usd":1000.0},"marketCap":1.0},
                {"baseToken":{"symbol":"USDC"},"liquidity":{"usd":90000.0},"marketCap":2.0},
                {"baseToken":{"symbol":"USDC"},"marketCap":3.0}
            ]"#,
        )
        .unwrap();

        let best = select_best_pair(pairs).unwrap();
        assert_eq!(best.market_cap, Some(2.0));
    }

    #[test]
    fn test_no_pairs_is_an_error() {
        assert!(matches!(select_best_pair(Vec::new()), Err(Error::NoPairs)));
    }

    #[test]
    fn test_market_cap_falls_back_to_fdv() {
        let absent = TokenPair {
            base_token: BaseToken::default(),
            liquidity: None,
            market_cap: None,
            fdv: Some(2_000_000.0),
        };
        assert_eq!(market_cap(&absent).unwrap(), 2_000_000.0);

        let nan = TokenPair {
            market_cap: Some(f64::NAN),
            ..absent.clone()
        };
        assert_eq!(market_cap(&nan).unwrap(), 2_000_000.0);

        let neither = TokenPair {
            fdv: None,
            market_cap: None,
            ..absent
        };
        assert!(matches!(market_cap(&neither), Err(Error::MissingMarketCap)));
    }

    #[test]
    fn test_pair_parses_from_aggregator_payload() {
        let pair: TokenPair = serde_json::from_str(
            r#"{
                "chainId": "ethereum",
                "baseToken": {"address": "0xa0b8", "symbol": "USDC", "name": "USD Coin"},
                "liquidity": {"usd": 123456.78, "base": 1.0, "quote": 2.0},
                "marketCap": 32000000000.0,
                "fdv": 32100000000.0
            }"#,
        )
        .unwrap();

        assert_eq!(pair.base_token.symbol.as_deref(), Some("USDC"));
        assert_eq!(pair.market_cap, Some(32_000_000_000.0));
    }

    proptest! {
        #[test]
        fn format_cap_always_tags_magnitude(value in 1_000.0f64..9.9e14) {
            let formatted = format_cap(value);
            let suffix = formatted.chars().last().unwrap();
            prop_assert!(matches!(suffix, 'K' | 'M' | 'B' | 'T'));
        }

        #[test]
        fn format_cap_small_values_are_whole(value in 0.0f64..999.0) {
            let formatted = format_cap(value);
            prop_assert!(formatted.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
