use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::processor::TransactionProcessor;
use crate::strategy::{select_strategy, AllocationRules, AllocationStrategy, FutureFlow};

/// Loan-product allocation settings, as stored by the product configuration.
///
/// ```json
/// {
///   "strategy": "rbi-india-strategy",
///   "rules": null
/// }
/// ```
///
/// `strategy` takes a strategy code or its legacy numeric id. `rules`
/// replaces the strategy's default ordering table when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    pub strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<AllocationRules>,
}

impl ProcessorConfig {
    pub fn for_strategy(strategy: AllocationStrategy) -> Self {
        Self {
            strategy: strategy.code().to_string(),
            rules: None,
        }
    }

    /// early-repayment product whose prepayments fill the next installment
    /// instead of the last one
    pub fn early_repayment_in_due_order() -> Self {
        let mut rules = AllocationStrategy::EarlyPayment.rules();
        rules.future_flow = FutureFlow::InDueOrder;
        Self {
            strategy: AllocationStrategy::EarlyPayment.code().to_string(),
            rules: Some(rules),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn strategy(&self) -> Result<AllocationStrategy> {
        select_strategy(&self.strategy)
    }

    /// resolve the strategy and build a processor
    pub fn build(&self) -> Result<TransactionProcessor> {
        let strategy = self.strategy()?;
        Ok(match self.rules {
            Some(rules) => TransactionProcessor::with_rules(strategy, rules),
            None => TransactionProcessor::new(strategy),
        })
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self::for_strategy(AllocationStrategy::Standard)
    }
}
