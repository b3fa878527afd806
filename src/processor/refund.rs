use crate::decimal::Money;
use crate::errors::Result;
use crate::schedule::Installment;
use crate::strategy::ComponentOrder;
use crate::types::ComponentBreakdown;

/// Pull `amount` back out of `paid`, starting at the latest installment that
/// carries a payment and walking components lowest priority first. Portions
/// record the magnitude returned per component; the second value is the part
/// of `amount` no payment could cover.
pub(super) fn allocate_refund(
    order: ComponentOrder,
    amount: Money,
    installments: &mut [Installment],
) -> Result<(ComponentBreakdown, Money)> {
    let mut remaining = amount;
    let mut portions = ComponentBreakdown::zero(amount.currency());

    let Some(latest) = installments.iter().rposition(Installment::has_payments) else {
        return Ok((portions, remaining));
    };

    'installments: for installment in installments[..=latest].iter_mut().rev() {
        for component in order.reversed() {
            if remaining.is_zero() {
                break 'installments;
            }
            let amounts = installment.component_mut(component);
            let take = remaining.min(amounts.paid)?;
            if take.is_zero() {
                continue;
            }
            amounts.paid = amounts.paid.minus(take)?;
            portions.add(component, take)?;
            remaining = remaining.minus(take)?;
        }
    }

    Ok((portions, remaining))
}
