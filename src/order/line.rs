use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::*;

/// Kind of communication sent to the debtor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationType {
    /// Free text (`RmtInf/Ustrd`).
    Normal,
    /// Structured creditor reference (`RmtInf/Strd`).
    Structured,
}

impl From<ReferenceType> for CommunicationType {
    fn from(r: ReferenceType) -> Self {
        match r {
            ReferenceType::None => Self::Normal,
            ReferenceType::Structured => Self::Structured,
        }
    }
}

/// One pending collection request derived from an invoice.
///
/// Owned by its payment order and frozen once the order leaves `draft`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLine {
    pub id: PaymentLineId,
    pub company_id: CompanyId,
    pub invoice_id: InvoiceId,
    pub mandate_id: MandateId,
    /// Debtor bank account (the mandate's account).
    pub partner_bank_id: BankAccountId,
    pub partner_name: String,
    pub currency_code: String,
    pub amount_currency: Decimal,
    pub communication: String,
    pub communication_type: CommunicationType,
    /// Requested collection date; recomputed when the order is opened.
    pub date: NaiveDate,
}

impl PaymentLine {
    /// Build the line for `invoice`, checking the mandate it will collect under.
    pub(crate) fn from_invoice(
        id: PaymentLineId,
        invoice_id: InvoiceId,
        invoice: &Invoice,
        mandate_id: MandateId,
        mandate: &Mandate,
    ) -> Result<Self, LastschriftError> {
        if !mandate.is_valid() {
            return Err(LastschriftError::Validation(format!(
                "mandate {} of invoice {} is not valid (state {:?})",
                mandate.unique_reference, invoice.number, mandate.state
            )));
        }
        if mandate.company_id != invoice.company_id {
            return Err(LastschriftError::Validation(format!(
                "mandate {} belongs to another company than invoice {}",
                mandate.unique_reference, invoice.number
            )));
        }
        if invoice.amount_residual <= Decimal::ZERO {
            return Err(LastschriftError::Validation(format!(
                "invoice {} has nothing left to collect",
                invoice.number
            )));
        }
        Ok(Self {
            id,
            company_id: invoice.company_id,
            invoice_id,
            mandate_id,
            partner_bank_id: mandate.partner_bank_id,
            partner_name: invoice.partner_name.clone(),
            currency_code: invoice.currency_code.clone(),
            amount_currency: invoice.amount_residual,
            communication: invoice.communication().to_string(),
            communication_type: invoice.reference_type.into(),
            date: invoice.due_date,
        })
    }
}
