//! Risk Rules
//!
//! Configured thresholds plus an ordered list of named predicates applied to a
//! [`RiskReport`]. Each predicate returns the rejection reason when it fires;
//! the first one that fires decides.

use serde::{Deserialize, Serialize};

use super::holding::TokenRecord;
use super::risk_report::RiskReport;

/// Legacy risk names rejected by default, highest risk first
pub const DEFAULT_LEGACY_NOT_ALLOWED: [&str; 7] = [
    "Freeze Authority still enabled",
    "Single holder ownership",
    "High holder concentration",
    "Large Amount of LP Unlocked",
    "Low Liquidity",
    "Copycat token",
    "Low amount of LP Providers",
];

/// Thresholds and allow/deny flags, read-only for the process lifetime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskRuleSet {
    // Dangerous
    pub allow_mint_authority: bool,
    pub allow_not_initialized: bool,
    pub allow_freeze_authority: bool,
    pub allow_rugged: bool,
    // Critical
    pub allow_mutable: bool,
    pub block_returning_token_names: bool,
    pub block_returning_token_creators: bool,
    pub block_symbols: Vec<String>,
    pub block_names: Vec<String>,
    pub allow_insider_topholders: bool,
    /// Largest share of supply a single top holder may own, percent
    pub max_allowed_pct_topholders: f64,
    pub exclude_lp_from_topholders: bool,
    // Warning
    pub min_total_markets: u64,
    pub min_total_lp_providers: u64,
    pub min_total_market_liquidity: f64,
    // Misc
    /// Highest acceptable report score; 0 disables the check
    pub max_score: i64,
    pub legacy_not_allowed: Vec<String>,
}

impl Default for RiskRuleSet {
    fn default() -> Self {
        Self {
            allow_mint_authority: false,
            allow_not_initialized: false,
            allow_freeze_authority: false,
            allow_rugged: false,
            allow_mutable: false,
            block_returning_token_names: true,
            block_returning_token_creators: true,
            block_symbols: vec!["XXX".to_string()],
            block_names: vec!["XXX".to_string()],
            allow_insider_topholders: false,
            max_allowed_pct_topholders: 1.0,
            exclude_lp_from_topholders: false,
            min_total_markets: 999,
            min_total_lp_providers: 999,
            min_total_market_liquidity: 1_000_000.0,
            max_score: 1,
            legacy_not_allowed: DEFAULT_LEGACY_NOT_ALLOWED
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl RiskRuleSet {
    /// Accept anything; useful as a base when only one rule is under test
    pub fn permissive() -> Self {
        Self {
            allow_mint_authority: true,
            allow_not_initialized: true,
            allow_freeze_authority: true,
            allow_rugged: true,
            allow_mutable: true,
            block_returning_token_names: false,
            block_returning_token_creators: false,
            block_symbols: vec![],
            block_names: vec![],
            allow_insider_topholders: true,
            max_allowed_pct_topholders: 100.0,
            exclude_lp_from_topholders: false,
            min_total_markets: 0,
            min_total_lp_providers: 0,
            min_total_market_liquidity: 0.0,
            max_score: 0,
            legacy_not_allowed: vec![],
        }
    }

    pub fn blocks_returning_tokens(&self) -> bool {
        self.block_returning_token_names || self.block_returning_token_creators
    }
}

/// Outcome of one evaluation; never cached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDecision {
    pub approved: bool,
    pub reason: Option<String>,
}

impl RiskDecision {
    pub fn approve() -> Self {
        Self { approved: true, reason: None }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: Some(reason.into()),
        }
    }
}

type RuleCheck = fn(&RiskReport, &RiskRuleSet) -> Option<String>;

/// A named predicate; `check` yields the rejection reason when it fires
#[derive(Clone, Copy)]
pub struct RiskRule {
    pub name: &'static str,
    check: RuleCheck,
}

impl RiskRule {
    pub const fn new(name: &'static str, check: RuleCheck) -> Self {
        Self { name, check }
    }

    pub fn check(&self, report: &RiskReport, rules: &RiskRuleSet) -> Option<String> {
        (self.check)(report, rules)
    }
}

impl std::fmt::Debug for RiskRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskRule").field("name", &self.name).finish()
    }
}

fn mint_authority(report: &RiskReport, rules: &RiskRuleSet) -> Option<String> {
    (!rules.allow_mint_authority && report.has_mint_authority)
        .then(|| "Mint authority should be null".to_string())
}

fn initialized(report: &RiskReport, rules: &RiskRuleSet) -> Option<String> {
    (!rules.allow_not_initialized && !report.is_initialized)
        .then(|| "Token is not initialized".to_string())
}

fn freeze_authority(report: &RiskReport, rules: &RiskRuleSet) -> Option<String> {
    (!rules.allow_freeze_authority && report.has_freeze_authority)
        .then(|| "Freeze authority should be null".to_string())
}

fn mutable_metadata(report: &RiskReport, rules: &RiskRuleSet) -> Option<String> {
    (!rules.allow_mutable && report.is_mutable).then(|| "Mutable should be false".to_string())
}

fn insider_holders(report: &RiskReport, rules: &RiskRuleSet) -> Option<String> {
    if rules.allow_insider_topholders {
        return None;
    }
    report
        .top_holders
        .iter()
        .find(|h| h.is_insider)
        .map(|h| format!("Insider accounts should not be part of the top holders ({})", h.address))
}

fn top_holder_concentration(report: &RiskReport, rules: &RiskRuleSet) -> Option<String> {
    report
        .top_holders
        .iter()
        .find(|h| h.percent > rules.max_allowed_pct_topholders)
        .map(|h| {
            format!(
                "A top holder exceeds the allowed percentage ({} holds {:.2}%, max {}%)",
                h.address, h.percent, rules.max_allowed_pct_topholders
            )
        })
}

fn lp_providers(report: &RiskReport, rules: &RiskRuleSet) -> Option<String> {
    (report.total_lp_providers < rules.min_total_lp_providers).then(|| {
        format!(
            "Not enough LP Providers ({} < {})",
            report.total_lp_providers, rules.min_total_lp_providers
        )
    })
}

fn market_count(report: &RiskReport, rules: &RiskRuleSet) -> Option<String> {
    let markets = report.market_count() as u64;
    (markets < rules.min_total_markets)
        .then(|| format!("Not enough Markets ({} < {})", markets, rules.min_total_markets))
}

fn market_liquidity(report: &RiskReport, rules: &RiskRuleSet) -> Option<String> {
    (report.total_market_liquidity < rules.min_total_market_liquidity).then(|| {
        format!(
            "Not enough Market Liquidity (${:.0} < ${:.0})",
            report.total_market_liquidity, rules.min_total_market_liquidity
        )
    })
}

fn rugged(report: &RiskReport, rules: &RiskRuleSet) -> Option<String> {
    (!rules.allow_rugged && report.rugged).then(|| "Token is rugged".to_string())
}

fn blocked_identity(report: &RiskReport, rules: &RiskRuleSet) -> Option<String> {
    if rules.block_symbols.iter().any(|s| *s == report.token_symbol) {
        return Some(format!("Symbol is blocked ({})", report.token_symbol));
    }
    if rules.block_names.iter().any(|n| *n == report.token_name) {
        return Some(format!("Name is blocked ({})", report.token_name));
    }
    None
}

fn risk_score(report: &RiskReport, rules: &RiskRuleSet) -> Option<String> {
    (rules.max_score != 0 && report.score > rules.max_score)
        .then(|| format!("Rug score too high ({} > {})", report.score, rules.max_score))
}

fn legacy_risks(report: &RiskReport, rules: &RiskRuleSet) -> Option<String> {
    report
        .risks
        .iter()
        .find(|r| rules.legacy_not_allowed.contains(&r.name))
        .map(|r| format!("Token has legacy risks that are not allowed ({})", r.name))
}

/// Rules in evaluation order
pub const RISK_RULES: [RiskRule; 13] = [
    RiskRule::new("mint_authority", mint_authority),
    RiskRule::new("initialized", initialized),
    RiskRule::new("freeze_authority", freeze_authority),
    RiskRule::new("mutable_metadata", mutable_metadata),
    RiskRule::new("insider_topholders", insider_holders),
    RiskRule::new("topholder_concentration", top_holder_concentration),
    RiskRule::new("lp_providers", lp_providers),
    RiskRule::new("market_count", market_count),
    RiskRule::new("market_liquidity", market_liquidity),
    RiskRule::new("rugged", rugged),
    RiskRule::new("blocked_identity", blocked_identity),
    RiskRule::new("risk_score", risk_score),
    RiskRule::new("legacy_risks", legacy_risks),
];

/// Ordered rule list; the first rule that fires rejects
#[derive(Debug, Clone)]
pub struct RuleBook {
    rules: Vec<RiskRule>,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self {
            rules: RISK_RULES.to_vec(),
        }
    }
}

impl RuleBook {
    pub fn new(rules: Vec<RiskRule>) -> Self {
        Self { rules }
    }

    /// Append a rule after the built-in ones
    pub fn with_rule(mut self, rule: RiskRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[RiskRule] {
        &self.rules
    }

    pub fn evaluate(&self, report: &RiskReport, rules: &RiskRuleSet) -> RiskDecision {
        for rule in &self.rules {
            if let Some(reason) = rule.check(report, rules) {
                tracing::info!(mint = %report.mint, rule = rule.name, "Rejected: {}", reason);
                return RiskDecision::reject(reason);
            }
        }
        RiskDecision::approve()
    }
}

/// Rejection reason when a previously seen token shares this name or creator
pub fn duplicate_reason(
    previous: &[TokenRecord],
    name: &str,
    creator: &str,
    rules: &RiskRuleSet,
) -> Option<String> {
    for record in previous {
        if rules.block_returning_token_names && record.name == name {
            return Some(format!("Token with this name was already created ({})", name));
        }
        if rules.block_returning_token_creators && record.creator == creator {
            return Some(format!("Token from this creator was already created ({})", creator));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::risk_report::fixtures::clean_report;
    use crate::domain::risk_report::{RiskFinding, TopHolder};

    fn rule(name: &str) -> RiskRule {
        *RISK_RULES.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn test_clean_report_approved_by_strict_rules() {
        let decision = RuleBook::default().evaluate(&clean_report("Mint1"), &RiskRuleSet::default());
        assert_eq!(decision, RiskDecision::approve());
    }

    #[test]
    fn test_clean_report_approved_by_permissive_rules() {
        let decision =
            RuleBook::default().evaluate(&clean_report("Mint1"), &RiskRuleSet::permissive());
        assert!(decision.approved);
    }

    fn assert_flip_rejects(flip: fn(&mut RiskReport), expected: &str) {
        let mut report = clean_report("Mint1");
        flip(&mut report);
        let decision = RuleBook::default().evaluate(&report, &RiskRuleSet::default());
        assert!(!decision.approved, "expected rejection for '{}'", expected);
        let reason = decision.reason.unwrap();
        assert!(reason.contains(expected), "reason '{}' should mention '{}'", reason, expected);
    }

    #[test]
    fn test_each_single_flip_rejects_with_its_reason() {
        assert_flip_rejects(|r| r.has_mint_authority = true, "Mint authority");
        assert_flip_rejects(|r| r.is_initialized = false, "not initialized");
        assert_flip_rejects(|r| r.has_freeze_authority = true, "Freeze authority");
        assert_flip_rejects(|r| r.is_mutable = true, "Mutable");
        assert_flip_rejects(|r| r.top_holders[0].is_insider = true, "Insider");
        assert_flip_rejects(|r| r.top_holders[0].percent = 5.0, "top holder exceeds");
        assert_flip_rejects(|r| r.total_lp_providers = 10, "LP Providers");
        assert_flip_rejects(|r| r.markets.truncate(3), "Markets");
        assert_flip_rejects(|r| r.total_market_liquidity = 10.0, "Market Liquidity");
        assert_flip_rejects(|r| r.rugged = true, "rugged");
        assert_flip_rejects(|r| r.token_symbol = "XXX".to_string(), "Symbol is blocked");
        assert_flip_rejects(|r| r.token_name = "XXX".to_string(), "Name is blocked");
        assert_flip_rejects(|r| r.score = 500, "Rug score");
        assert_flip_rejects(
            |r| {
                r.risks.push(RiskFinding {
                    name: "Low Liquidity".to_string(),
                    level: "warn".to_string(),
                    score: 10,
                })
            },
            "legacy risks",
        );
    }

    #[test]
    fn test_allow_flags_disable_their_rule() {
        let mut report = clean_report("Mint1");
        report.has_mint_authority = true;
        report.has_freeze_authority = true;
        report.is_mutable = true;
        report.rugged = true;
        report.is_initialized = false;
        report.top_holders[0].is_insider = true;

        let rules = RiskRuleSet {
            allow_mint_authority: true,
            allow_freeze_authority: true,
            allow_mutable: true,
            allow_rugged: true,
            allow_not_initialized: true,
            allow_insider_topholders: true,
            ..RiskRuleSet::default()
        };
        assert!(RuleBook::default().evaluate(&report, &rules).approved);
    }

    #[test]
    fn test_top_holder_scenario() {
        let mut report = clean_report("Mint1");
        report.top_holders[0].percent = 5.0;
        let rules = RiskRuleSet {
            max_allowed_pct_topholders: 1.0,
            ..RiskRuleSet::default()
        };

        let decision = RuleBook::default().evaluate(&report, &rules);
        assert!(!decision.approved);
        assert!(decision.reason.unwrap().contains("top holder exceeds the allowed percentage"));
    }

    #[test]
    fn test_first_failing_rule_wins() {
        let mut report = clean_report("Mint1");
        report.has_mint_authority = true;
        report.rugged = true;

        let decision = RuleBook::default().evaluate(&report, &RiskRuleSet::default());
        assert_eq!(decision.reason.as_deref(), Some("Mint authority should be null"));
    }

    #[test]
    fn test_zero_max_score_disables_score_rule() {
        let mut report = clean_report("Mint1");
        report.score = 1_000_000;
        let rules = RiskRuleSet { max_score: 0, ..RiskRuleSet::default() };

        assert!(rule("risk_score").check(&report, &rules).is_none());
        assert!(RuleBook::default().evaluate(&report, &rules).approved);
    }

    #[test]
    fn test_score_at_threshold_passes() {
        let mut report = clean_report("Mint1");
        report.score = 1;
        assert!(rule("risk_score").check(&report, &RiskRuleSet::default()).is_none());
        report.score = 2;
        assert!(rule("risk_score").check(&report, &RiskRuleSet::default()).is_some());
    }

    #[test]
    fn test_holder_at_exact_max_passes() {
        let mut report = clean_report("Mint1");
        report.top_holders.push(TopHolder {
            address: "Edge".to_string(),
            percent: 1.0,
            is_insider: false,
        });
        assert!(rule("topholder_concentration").check(&report, &RiskRuleSet::default()).is_none());
    }

    #[test]
    fn test_unlisted_finding_ignored() {
        let mut report = clean_report("Mint1");
        report.risks.push(RiskFinding {
            name: "Something new".to_string(),
            level: "info".to_string(),
            score: 1,
        });
        assert!(rule("legacy_risks").check(&report, &RiskRuleSet::default()).is_none());
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let names: Vec<&str> = RuleBook::default().rules().iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "mint_authority",
                "initialized",
                "freeze_authority",
                "mutable_metadata",
                "insider_topholders",
                "topholder_concentration",
                "lp_providers",
                "market_count",
                "market_liquidity",
                "rugged",
                "blocked_identity",
                "risk_score",
                "legacy_risks",
            ]
        );
    }

    #[test]
    fn test_custom_rule_appended() {
        fn no_vowels(report: &RiskReport, _: &RiskRuleSet) -> Option<String> {
            (!report.token_name.chars().any(|c| "aeiouAEIOU".contains(c)))
                .then(|| "Name has no vowels".to_string())
        }
        let book = RuleBook::default().with_rule(RiskRule::new("no_vowels", no_vowels));
        let mut report = clean_report("Mint1");
        report.token_name = "ZZZ".to_string();

        let decision = book.evaluate(&report, &RiskRuleSet::default());
        assert_eq!(decision.reason.as_deref(), Some("Name has no vowels"));
    }

    #[test]
    fn test_duplicate_reason() {
        let previous = vec![TokenRecord::new("OldMint", "Pepe", "CreatorA", 1)];
        let rules = RiskRuleSet::default();

        let by_name = duplicate_reason(&previous, "Pepe", "CreatorB", &rules).unwrap();
        assert!(by_name.contains("name"));

        let by_creator = duplicate_reason(&previous, "Other", "CreatorA", &rules).unwrap();
        assert!(by_creator.contains("creator"));

        assert!(duplicate_reason(&previous, "Other", "CreatorB", &rules).is_none());

        let names_only = RiskRuleSet {
            block_returning_token_creators: false,
            ..RiskRuleSet::default()
        };
        assert!(duplicate_reason(&previous, "Other", "CreatorA", &names_only).is_none());
    }
}
