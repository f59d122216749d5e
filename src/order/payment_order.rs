use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::bank_line::BankPaymentLine;
use super::line::PaymentLine;
use super::state::PaymentOrderState;
use crate::core::*;

/// A batch of collections processed and submitted together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    /// Order name, also the pain.008 message id (e.g. "PAY0001").
    pub name: String,
    pub company_id: CompanyId,
    pub payment_mode_id: PaymentModeId,
    pub payment_type: PaymentType,
    /// Bank journal; required before opening.
    pub journal_id: Option<JournalId>,
    /// True iff every account involved is SEPA-reachable and every line is in EUR.
    pub sepa: bool,
    pub date_prefered: DatePrefered,
    /// Collection date when `date_prefered` is `fixed`.
    pub date_scheduled: Option<NaiveDate>,
    pub date_generated: Option<NaiveDate>,
    pub date_uploaded: Option<NaiveDate>,
    pub(crate) state: PaymentOrderState,
    pub(crate) payment_lines: Vec<PaymentLine>,
    pub(crate) bank_lines: Vec<BankPaymentLine>,
    pub(crate) attachment_id: Option<AttachmentId>,
}

impl PaymentOrder {
    pub(crate) fn new(name: String, mode_id: PaymentModeId, mode: &PaymentMode) -> Self {
        Self {
            name,
            company_id: mode.company_id,
            payment_mode_id: mode_id,
            payment_type: mode.payment_type,
            journal_id: match mode.bank_account_link {
                BankAccountLink::Fixed => mode.fixed_journal_id,
                BankAccountLink::Variable => None,
            },
            sepa: false,
            date_prefered: mode.default_date_prefered,
            date_scheduled: None,
            date_generated: None,
            date_uploaded: None,
            state: PaymentOrderState::Draft,
            payment_lines: Vec::new(),
            bank_lines: Vec::new(),
            attachment_id: None,
        }
    }

    pub fn state(&self) -> PaymentOrderState {
        self.state
    }

    pub fn payment_lines(&self) -> &[PaymentLine] {
        &self.payment_lines
    }

    pub fn bank_lines(&self) -> &[BankPaymentLine] {
        &self.bank_lines
    }

    /// The generated payment file, once the order is `generated`.
    pub fn attachment_id(&self) -> Option<AttachmentId> {
        self.attachment_id
    }

    /// Sum of all payment line amounts.
    pub fn total_amount(&self) -> Decimal {
        self.payment_lines.iter().map(|l| l.amount_currency).sum()
    }

    /// Requested collection date of a line under this order's date policy.
    pub(crate) fn collection_date(&self, line: &PaymentLine, today: NaiveDate) -> NaiveDate {
        let requested = match self.date_prefered {
            DatePrefered::Now => today,
            DatePrefered::Due => line.date,
            DatePrefered::Fixed => self.date_scheduled.unwrap_or(today),
        };
        requested.max(today)
    }
}
