//! RugCheck report client
//!
//! Authority fields arrive as arbitrary JSON (null, a string, sometimes an
//! object); they are resolved to presence flags here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{MarketAccounts, RiskFinding, RiskReport, TopHolder};
use crate::ports::market_data::{MarketDataError, RiskReportSource};

pub const DEFAULT_RUGCHECK_URL: &str = "https://api.rugcheck.xyz/v1";

/// Authority value counts as present unless null or an empty string
fn authority_present(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RugCheckReport {
    #[serde(default)]
    pub mint: String,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub token: TokenSection,
    #[serde(default)]
    pub token_meta: Option<TokenMeta>,
    #[serde(default)]
    pub file_meta: Option<TokenMeta>,
    #[serde(default)]
    pub top_holders: Option<Vec<Holder>>,
    #[serde(default)]
    pub mint_authority: Option<Value>,
    #[serde(default)]
    pub freeze_authority: Option<Value>,
    #[serde(default)]
    pub risks: Option<Vec<Risk>>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub markets: Option<Vec<Market>>,
    #[serde(default)]
    pub total_market_liquidity: f64,
    #[serde(default, rename = "totalLPProviders")]
    pub total_lp_providers: u64,
    #[serde(default)]
    pub rugged: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSection {
    #[serde(default)]
    pub mint_authority: Option<Value>,
    #[serde(default)]
    pub freeze_authority: Option<Value>,
    #[serde(default)]
    pub is_initialized: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub mutable: bool,
}

#[derive(Debug, Deserialize)]
pub struct Holder {
    pub address: String,
    #[serde(default)]
    pub pct: f64,
    #[serde(default)]
    pub insider: bool,
}

#[derive(Debug, Deserialize)]
pub struct Risk {
    pub name: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub score: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    #[serde(default)]
    pub liquidity_a: Option<String>,
    #[serde(default)]
    pub liquidity_b: Option<String>,
}

impl RugCheckReport {
    /// Normalise into the domain report for `mint`
    pub fn into_report(self, mint: &str) -> RiskReport {
        let has_mint_authority =
            authority_present(&self.token.mint_authority) || authority_present(&self.mint_authority);
        let has_freeze_authority = authority_present(&self.token.freeze_authority)
            || authority_present(&self.freeze_authority);

        let meta = self.token_meta.unwrap_or_default();
        let mutable = meta.mutable;
        let (token_name, token_symbol) = if meta.name.is_empty() {
            let file = self.file_meta.unwrap_or_default();
            (file.name, if meta.symbol.is_empty() { file.symbol } else { meta.symbol })
        } else {
            (meta.name, meta.symbol)
        };

        RiskReport {
            mint: if self.mint.is_empty() { mint.to_string() } else { self.mint },
            creator: self.creator.filter(|c| !c.is_empty()),
            has_mint_authority,
            has_freeze_authority,
            is_initialized: self.token.is_initialized,
            is_mutable: mutable,
            top_holders: self
                .top_holders
                .unwrap_or_default()
                .into_iter()
                .map(|h| TopHolder {
                    address: h.address,
                    percent: h.pct,
                    is_insider: h.insider,
                })
                .collect(),
            markets: self
                .markets
                .unwrap_or_default()
                .into_iter()
                .map(|m| MarketAccounts {
                    liquidity_a: m.liquidity_a,
                    liquidity_b: m.liquidity_b,
                })
                .collect(),
            total_lp_providers: self.total_lp_providers,
            total_market_liquidity: self.total_market_liquidity,
            rugged: self.rugged,
            score: self.score,
            risks: self
                .risks
                .unwrap_or_default()
                .into_iter()
                .map(|r| RiskFinding {
                    name: r.name,
                    level: r.level,
                    score: r.score,
                })
                .collect(),
            token_name,
            token_symbol,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RugCheckClient {
    http: Client,
    base_url: String,
}

impl RugCheckClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MarketDataError::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RiskReportSource for RugCheckClient {
    async fn fetch_report(&self, mint: &str) -> Result<RiskReport, MarketDataError> {
        let url = format!("{}/tokens/{}/report", self.base_url, mint);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketDataError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let report: RugCheckReport = response
            .json()
            .await
            .map_err(|e| MarketDataError::Malformed(e.to_string()))?;
        Ok(report.into_report(mint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::serve;
    use crate::domain::{RiskRuleSet, RuleBook};
    use serde_json::json;

    fn fixture() -> String {
        let path = format!("{}/fixtures/rugcheck/report.json", env!("CARGO_MANIFEST_DIR"));
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("fixture {}: {}", path, e))
    }

    #[test]
    fn test_authority_resolution() {
        assert!(!authority_present(&None));
        assert!(!authority_present(&Some(Value::Null)));
        assert!(!authority_present(&Some(json!(""))));
        assert!(authority_present(&Some(json!("Auth111"))));
        assert!(authority_present(&Some(json!({"address": "Auth111"}))));
    }

    #[test]
    fn test_fixture_normalises() {
        let raw: RugCheckReport = serde_json::from_str(&fixture()).unwrap();
        let report = raw.into_report("ignored");

        assert_eq!(report.mint, "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr");
        assert_eq!(report.creator.as_deref(), Some("CrEaToR1111111111111111111111111111111111111"));
        assert!(!report.has_mint_authority);
        assert!(report.has_freeze_authority);
        assert!(report.is_initialized);
        assert!(report.is_mutable);
        assert_eq!(report.top_holders.len(), 2);
        assert_eq!(report.top_holders[0].percent, 82.5);
        assert_eq!(report.market_count(), 1);
        assert_eq!(report.total_lp_providers, 0);
        assert_eq!(report.score, 6501);
        assert_eq!(report.token_name, "Popcat Moon");
        assert_eq!(report.token_symbol, "PMOON");
        assert_eq!(report.risks[0].name, "Freeze Authority still enabled");
    }

    #[test]
    fn test_fixture_fails_strict_rules_on_freeze_authority() {
        let report = serde_json::from_str::<RugCheckReport>(&fixture())
            .unwrap()
            .into_report("x");
        let decision = RuleBook::default().evaluate(&report, &RiskRuleSet::default());
        assert_eq!(decision.reason.as_deref(), Some("Freeze authority should be null"));
    }

    #[test]
    fn test_lp_vault_excluded_from_fixture_holders() {
        let report = serde_json::from_str::<RugCheckReport>(&fixture())
            .unwrap()
            .into_report("x")
            .without_lp_holders();
        assert_eq!(report.top_holders.len(), 1);
        assert_eq!(report.top_holders[0].address, "Whale1111111111111111111111111111111111111");
    }

    #[test]
    fn test_sparse_report_defaults() {
        let raw: RugCheckReport = serde_json::from_value(json!({
            "token": {"mintAuthority": null, "isInitialized": true},
            "fileMeta": {"name": "FromFile", "symbol": "FF"},
            "topHolders": null,
            "markets": null,
            "risks": null
        }))
        .unwrap();
        let report = raw.into_report("MintX");

        assert_eq!(report.mint, "MintX");
        assert!(report.creator.is_none());
        assert_eq!(report.creator_or_mint(), "MintX");
        assert_eq!(report.token_name, "FromFile");
        assert_eq!(report.token_symbol, "FF");
        assert!(report.top_holders.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_report_path() {
        let server = serve(vec![(200, fixture())]).await;
        let client = RugCheckClient::new(format!("{}/v1/", server.url), Duration::from_secs(5)).unwrap();

        let report = client.fetch_report("MintZ").await.unwrap();
        assert_eq!(report.token_symbol, "PMOON");
        let requests = server.requests.lock().unwrap().clone();
        assert!(requests[0].request_line.starts_with("GET /v1/tokens/MintZ/report"));
    }
}
