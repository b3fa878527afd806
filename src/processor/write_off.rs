use crate::decimal::Currency;
use crate::errors::Result;
use crate::schedule::Installment;
use crate::types::{Component, ComponentBreakdown};

/// Move everything still outstanding into `written_off`, leaving paid and
/// waived buckets alone. Covers every unsettled installment, earlier arrears
/// included, not only those from the write-off date onward. Returns the
/// per-component totals written off.
pub(super) fn write_off_outstanding(
    currency: Currency,
    installments: &mut [Installment],
) -> Result<ComponentBreakdown> {
    let mut portions = ComponentBreakdown::zero(currency);

    for installment in installments.iter_mut() {
        if installment.obligations_met()? {
            continue;
        }
        for component in Component::ALL {
            let amounts = installment.component_mut(component);
            let outstanding = amounts.outstanding()?;
            if outstanding.is_zero() {
                continue;
            }
            amounts.written_off = amounts.written_off.plus(outstanding)?;
            portions.add(component, outstanding)?;
        }
    }

    Ok(portions)
}
