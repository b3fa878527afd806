//! serializable views of a schedule for audit output

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Currency, Money};
use crate::errors::Result;
use crate::schedule::{Installment, Schedule};
use crate::types::{Component, LoanId};

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleView {
    pub loan_id: LoanId,
    pub currency: Currency,
    pub total_outstanding: Money,
    pub installments: Vec<InstallmentView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InstallmentView {
    pub sequence_no: u32,
    pub from_date: NaiveDate,
    pub due_date: NaiveDate,
    pub obligations_met: bool,
    pub principal: ComponentView,
    pub interest: ComponentView,
    pub fee: ComponentView,
    pub penalty: ComponentView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentView {
    pub due: Money,
    pub paid: Money,
    pub waived: Money,
    pub written_off: Money,
    pub outstanding: Money,
}

impl ComponentView {
    fn of(installment: &Installment, component: Component) -> Result<Self> {
        let amounts = installment.component(component);
        Ok(Self {
            due: amounts.due,
            paid: amounts.paid,
            waived: amounts.waived,
            written_off: amounts.written_off,
            outstanding: amounts.outstanding()?,
        })
    }
}

impl InstallmentView {
    pub fn from_installment(installment: &Installment) -> Result<Self> {
        Ok(Self {
            sequence_no: installment.sequence_no,
            from_date: installment.from_date,
            due_date: installment.due_date,
            obligations_met: installment.obligations_met()?,
            principal: ComponentView::of(installment, Component::Principal)?,
            interest: ComponentView::of(installment, Component::Interest)?,
            fee: ComponentView::of(installment, Component::Fee)?,
            penalty: ComponentView::of(installment, Component::Penalty)?,
        })
    }
}

impl ScheduleView {
    pub fn from_schedule(schedule: &Schedule) -> Result<Self> {
        Ok(Self {
            loan_id: schedule.loan_id,
            currency: schedule.currency,
            total_outstanding: schedule.total_outstanding()?,
            installments: schedule
                .installments()
                .iter()
                .map(InstallmentView::from_installment)
                .collect::<Result<Vec<_>>>()?,
        })
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
