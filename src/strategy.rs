use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{AllocationError, Result};
use crate::types::Component;

/// Priority in which one installment's components are settled, highest first.
/// Always a permutation of the four components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Component>", into = "Vec<Component>")]
pub struct ComponentOrder([Component; 4]);

impl ComponentOrder {
    pub const fn of(order: [Component; 4]) -> Self {
        Self(order)
    }

    pub fn new(order: &[Component]) -> Result<Self> {
        let complete = order.len() == 4 && Component::ALL.iter().all(|c| order.contains(c));
        if !complete {
            return Err(AllocationError::InvalidConfiguration {
                message: format!("component order must list each component once, got {order:?}"),
            });
        }
        Ok(Self([order[0], order[1], order[2], order[3]]))
    }

    pub fn components(&self) -> [Component; 4] {
        self.0
    }

    /// lowest priority first, used when unwinding payments
    pub fn reversed(&self) -> [Component; 4] {
        let [a, b, c, d] = self.0;
        [d, c, b, a]
    }

    /// position of `component`, 0 being the highest priority
    pub fn rank(&self, component: Component) -> usize {
        self.0.iter().position(|c| *c == component).unwrap_or(self.0.len())
    }
}

impl TryFrom<Vec<Component>> for ComponentOrder {
    type Error = AllocationError;

    fn try_from(order: Vec<Component>) -> Result<Self> {
        ComponentOrder::new(&order)
    }
}

impl From<ComponentOrder> for Vec<Component> {
    fn from(order: ComponentOrder) -> Self {
        order.0.to_vec()
    }
}

/// how installments whose period has started are walked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueTraversal {
    /// settle one installment completely before moving to the next
    Vertical,
    /// settle one component across every due installment before the next component
    Horizontal,
}

/// where money left after the due installments goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FutureFlow {
    /// future installments in due-date order
    InDueOrder,
    /// future installments starting from the last one, shortening the term
    LatestFirst,
}

/// Ordering table driving the shared allocation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRules {
    /// order for installments whose period started on or before the transaction date
    pub due_order: ComponentOrder,
    /// order for installments whose period starts after the transaction date
    pub advance_order: ComponentOrder,
    pub due_traversal: DueTraversal,
    pub future_flow: FutureFlow,
}

impl AllocationRules {
    pub fn vertical(order: ComponentOrder) -> Self {
        Self {
            due_order: order,
            advance_order: order,
            due_traversal: DueTraversal::Vertical,
            future_flow: FutureFlow::InDueOrder,
        }
    }
}

use Component::{Fee, Interest, Penalty, Principal};

const PENALTY_FEE_INTEREST_PRINCIPAL: ComponentOrder =
    ComponentOrder::of([Penalty, Fee, Interest, Principal]);

/// closed set of repayment allocation strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocationStrategy {
    Standard,
    Creocore,
    HeavensFamily,
    EarlyPayment,
    Rbi,
    PrincipalFirst,
    InterestFirst,
}

impl AllocationStrategy {
    pub const ALL: [AllocationStrategy; 7] = [
        AllocationStrategy::Standard,
        AllocationStrategy::HeavensFamily,
        AllocationStrategy::Creocore,
        AllocationStrategy::Rbi,
        AllocationStrategy::PrincipalFirst,
        AllocationStrategy::InterestFirst,
        AllocationStrategy::EarlyPayment,
    ];

    /// configuration code
    pub fn code(&self) -> &'static str {
        match self {
            AllocationStrategy::Standard => "mifos-standard-strategy",
            AllocationStrategy::HeavensFamily => "heavensfamily-strategy",
            AllocationStrategy::Creocore => "creocore-strategy",
            AllocationStrategy::Rbi => "rbi-india-strategy",
            AllocationStrategy::PrincipalFirst => "principal-interest-penalties-fees-order-strategy",
            AllocationStrategy::InterestFirst => "interest-principal-penalties-fees-order-strategy",
            AllocationStrategy::EarlyPayment => "early-repayment-strategy",
        }
    }

    /// numeric id used by older product configurations
    pub fn legacy_id(&self) -> u32 {
        match self {
            AllocationStrategy::Standard => 1,
            AllocationStrategy::HeavensFamily => 2,
            AllocationStrategy::Creocore => 3,
            AllocationStrategy::Rbi => 4,
            AllocationStrategy::PrincipalFirst => 5,
            AllocationStrategy::InterestFirst => 6,
            AllocationStrategy::EarlyPayment => 7,
        }
    }

    pub fn from_legacy_id(id: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.legacy_id() == id)
            .ok_or_else(|| AllocationError::UnknownStrategy { id: id.to_string() })
    }

    /// default ordering table of the strategy
    pub fn rules(&self) -> AllocationRules {
        match self {
            AllocationStrategy::Standard => {
                AllocationRules::vertical(ComponentOrder::of([Fee, Interest, Principal, Penalty]))
            }
            AllocationStrategy::PrincipalFirst => {
                AllocationRules::vertical(ComponentOrder::of([Principal, Interest, Penalty, Fee]))
            }
            AllocationStrategy::InterestFirst => {
                AllocationRules::vertical(ComponentOrder::of([Interest, Principal, Penalty, Fee]))
            }
            // prepaid installments take principal before anything else
            AllocationStrategy::Creocore => AllocationRules {
                due_order: PENALTY_FEE_INTEREST_PRINCIPAL,
                advance_order: ComponentOrder::of([Principal, Interest, Fee, Penalty]),
                due_traversal: DueTraversal::Vertical,
                future_flow: FutureFlow::InDueOrder,
            },
            AllocationStrategy::HeavensFamily => AllocationRules {
                due_order: ComponentOrder::of([Interest, Principal, Penalty, Fee]),
                advance_order: ComponentOrder::of([Principal, Interest, Penalty, Fee]),
                due_traversal: DueTraversal::Vertical,
                future_flow: FutureFlow::InDueOrder,
            },
            AllocationStrategy::Rbi => AllocationRules {
                due_order: PENALTY_FEE_INTEREST_PRINCIPAL,
                advance_order: PENALTY_FEE_INTEREST_PRINCIPAL,
                due_traversal: DueTraversal::Horizontal,
                future_flow: FutureFlow::InDueOrder,
            },
            AllocationStrategy::EarlyPayment => AllocationRules {
                due_order: PENALTY_FEE_INTEREST_PRINCIPAL,
                advance_order: PENALTY_FEE_INTEREST_PRINCIPAL,
                due_traversal: DueTraversal::Vertical,
                future_flow: FutureFlow::LatestFirst,
            },
        }
    }

    /// whether recalculation should place interest ahead of principal
    pub fn is_interest_first(&self) -> bool {
        matches!(self, AllocationStrategy::InterestFirst)
    }
}

impl fmt::Display for AllocationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for AllocationStrategy {
    type Err = AllocationError;

    fn from_str(id: &str) -> Result<Self> {
        select_strategy(id)
    }
}

/// Resolve a strategy from its code or legacy numeric id.
pub fn select_strategy(strategy_id: &str) -> Result<AllocationStrategy> {
    let id = strategy_id.trim();
    if let Ok(legacy) = id.parse::<u32>() {
        return AllocationStrategy::from_legacy_id(legacy);
    }
    AllocationStrategy::ALL
        .into_iter()
        .find(|s| s.code().eq_ignore_ascii_case(id))
        .ok_or_else(|| AllocationError::UnknownStrategy {
            id: strategy_id.to_string(),
        })
}

pub fn is_interest_first_strategy(strategy_id: &str) -> Result<bool> {
    Ok(select_strategy(strategy_id)?.is_interest_first())
}
