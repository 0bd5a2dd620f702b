//! Risk Report
//!
//! Normalised snapshot of a third-party token-safety report. Authority fields
//! are resolved to plain presence flags at the adapter boundary so rule
//! evaluation never sees loosely typed JSON.

use serde::{Deserialize, Serialize};

/// A top holder entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopHolder {
    pub address: String,
    /// Share of supply, in percent (0-100)
    pub percent: f64,
    pub is_insider: bool,
}

/// Liquidity vault accounts of one market the token trades on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketAccounts {
    pub liquidity_a: Option<String>,
    pub liquidity_b: Option<String>,
}

/// A named finding listed by the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFinding {
    pub name: String,
    pub level: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub mint: String,
    pub creator: Option<String>,
    pub has_mint_authority: bool,
    pub has_freeze_authority: bool,
    pub is_initialized: bool,
    pub is_mutable: bool,
    pub top_holders: Vec<TopHolder>,
    pub markets: Vec<MarketAccounts>,
    pub total_lp_providers: u64,
    /// Aggregate market liquidity, USD
    pub total_market_liquidity: f64,
    pub rugged: bool,
    pub score: i64,
    pub risks: Vec<RiskFinding>,
    pub token_name: String,
    pub token_symbol: String,
}

impl RiskReport {
    pub fn market_count(&self) -> usize {
        self.markets.len()
    }

    /// Creator address, falling back to the mint when the report has none
    pub fn creator_or_mint(&self) -> &str {
        match self.creator.as_deref() {
            Some(creator) if !creator.is_empty() => creator,
            _ => &self.mint,
        }
    }

    /// Drop top holders that are liquidity vaults of a listed market
    pub fn without_lp_holders(mut self) -> Self {
        let vaults: Vec<&str> = self
            .markets
            .iter()
            .flat_map(|m| [m.liquidity_a.as_deref(), m.liquidity_b.as_deref()])
            .flatten()
            .filter(|addr| !addr.is_empty())
            .collect();

        let holders = std::mem::take(&mut self.top_holders);
        self.top_holders = holders
            .into_iter()
            .filter(|h| !vaults.contains(&h.address.as_str()))
            .collect();
        self
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Report that passes every rule of the strictest rule set
    pub fn clean_report(mint: &str) -> RiskReport {
        RiskReport {
            mint: mint.to_string(),
            creator: Some("Creator1111111111111111111111111111111111111".to_string()),
            has_mint_authority: false,
            has_freeze_authority: false,
            is_initialized: true,
            is_mutable: false,
            top_holders: vec![TopHolder {
                address: "Holder111".to_string(),
                percent: 0.5,
                is_insider: false,
            }],
            markets: (0..1000)
                .map(|i| MarketAccounts {
                    liquidity_a: Some(format!("VaultA{}", i)),
                    liquidity_b: Some(format!("VaultB{}", i)),
                })
                .collect(),
            total_lp_providers: 1000,
            total_market_liquidity: 2_000_000.0,
            rugged: false,
            score: 0,
            risks: vec![],
            token_name: "Clean Token".to_string(),
            token_symbol: "CLEAN".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::clean_report;
    use super::*;

    #[test]
    fn test_creator_fallback() {
        let mut report = clean_report("Mint111");
        assert_ne!(report.creator_or_mint(), "Mint111");

        report.creator = None;
        assert_eq!(report.creator_or_mint(), "Mint111");

        report.creator = Some(String::new());
        assert_eq!(report.creator_or_mint(), "Mint111");
    }

    #[test]
    fn test_without_lp_holders() {
        let mut report = clean_report("Mint111");
        report.top_holders = vec![
            TopHolder { address: "VaultA3".to_string(), percent: 60.0, is_insider: false },
            TopHolder { address: "Wallet1".to_string(), percent: 0.8, is_insider: false },
            TopHolder { address: "VaultB999".to_string(), percent: 20.0, is_insider: false },
        ];

        let filtered = report.without_lp_holders();
        assert_eq!(filtered.top_holders.len(), 1);
        assert_eq!(filtered.top_holders[0].address, "Wallet1");
    }

    #[test]
    fn test_market_count() {
        let report = clean_report("Mint111");
        assert_eq!(report.market_count(), 1000);
    }
}
