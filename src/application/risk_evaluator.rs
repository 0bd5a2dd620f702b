//! Risk evaluation against the token-safety report
//!
//! Order of side effects: fetch the report, look up earlier tokens with the
//! same name or creator, append this token to the token log, then decide.
//! Nothing is written after the decision.

use std::sync::Arc;

use chrono::Utc;

use super::error::TradeError;
use crate::domain::{duplicate_reason, RiskDecision, RiskRuleSet, RuleBook, TokenRecord};
use crate::ports::{HoldingsLedger, RiskReportSource};

pub struct RiskEvaluator {
    reports: Arc<dyn RiskReportSource>,
    ledger: Arc<dyn HoldingsLedger>,
    rules: Arc<RiskRuleSet>,
    rule_book: RuleBook,
    verbose_log: bool,
}

impl RiskEvaluator {
    pub fn new(
        reports: Arc<dyn RiskReportSource>,
        ledger: Arc<dyn HoldingsLedger>,
        rules: Arc<RiskRuleSet>,
    ) -> Self {
        Self {
            reports,
            ledger,
            rules,
            rule_book: RuleBook::default(),
            verbose_log: false,
        }
    }

    /// Log every normalised report at info
    pub fn with_verbose_log(mut self, verbose_log: bool) -> Self {
        self.verbose_log = verbose_log;
        self
    }

    /// Evaluate `mint`; the report is fetched once and never cached
    pub async fn evaluate(&self, mint: &str) -> Result<RiskDecision, TradeError> {
        let mut report = self.reports.fetch_report(mint).await?;

        if self.verbose_log {
            tracing::info!("Risk report for {}: {:?}", mint, report);
        }

        if self.rules.exclude_lp_from_topholders {
            report = report.without_lp_holders();
        }

        let creator = report.creator_or_mint().to_string();

        let duplicate = if self.rules.blocks_returning_tokens() {
            match self.ledger.find_token_records(&report.token_name, &creator).await {
                Ok(previous) => duplicate_reason(&previous, &report.token_name, &creator, &self.rules),
                Err(e) => {
                    tracing::warn!("Duplicate lookup failed for {}: {}", mint, e);
                    None
                }
            }
        } else {
            None
        };

        let record = TokenRecord::new(
            mint,
            report.token_name.clone(),
            creator,
            Utc::now().timestamp_millis(),
        );
        if let Err(e) = self.ledger.insert_token_record(record).await {
            tracing::error!("Unable to store new token {}: {}", mint, e);
        }

        if let Some(reason) = duplicate {
            tracing::info!(mint = %mint, "Rejected: {}", reason);
            return Ok(RiskDecision::reject(reason));
        }

        let decision = self.rule_book.evaluate(&report, &self.rules);
        if decision.approved {
            tracing::info!("Risk check passed for {} ({})", mint, report.token_symbol);
        }
        Ok(decision)
    }
}
