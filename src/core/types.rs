use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

entity_id!(
    /// Company (tenant) identifier. Every record carries one.
    CompanyId
);
entity_id!(
    /// Partner or company bank account identifier.
    BankAccountId
);
entity_id!(
    /// Bank journal identifier.
    JournalId
);
entity_id!(
    /// SEPA mandate identifier.
    MandateId
);
entity_id!(
    /// Invoice identifier.
    InvoiceId
);
entity_id!(
    /// Payment mode identifier.
    PaymentModeId
);
entity_id!(
    /// Payment order identifier.
    PaymentOrderId
);
entity_id!(
    /// Payment line identifier.
    PaymentLineId
);
entity_id!(
    /// Generated document identifier.
    AttachmentId
);

/// Company issuing the collections (the SEPA creditor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    /// Legal name, used as creditor and initiating party name.
    pub name: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: String,
    /// Company currency (ISO 4217).
    pub currency_code: String,
    /// SEPA creditor identifier (e.g. "FR78ZZZ424242").
    pub sepa_creditor_identifier: Option<String>,
    /// Identifier of the initiating party in the group header.
    pub initiating_party_identifier: Option<String>,
    /// Issuer of the initiating party identifier.
    pub initiating_party_issuer: Option<String>,
}

/// Bank journal the collections are booked on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journal {
    pub company_id: CompanyId,
    pub name: String,
    pub code: String,
    /// The company's own bank account behind this journal.
    pub bank_account_id: BankAccountId,
}

/// Direction of a payment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Money comes in (direct debit collection).
    Inbound,
    /// Money goes out (credit transfer).
    Outbound,
}

/// Invoice move type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    /// Customer invoice.
    OutInvoice,
    /// Customer credit note.
    OutRefund,
    /// Vendor bill.
    InInvoice,
    /// Vendor credit note.
    InRefund,
}

impl InvoiceKind {
    /// Payment direction required to settle an invoice of this kind.
    pub fn payment_type(&self) -> PaymentType {
        match self {
            Self::OutInvoice | Self::InRefund => PaymentType::Inbound,
            Self::InInvoice | Self::OutRefund => PaymentType::Outbound,
        }
    }
}

/// Posting state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceState {
    Draft,
    Posted,
}

/// Settlement state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    NotPaid,
    Partial,
    Paid,
}

/// How the invoice payment reference is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceType {
    /// Free text.
    None,
    /// ISO 11649 structured creditor reference.
    Structured,
}

/// Invoice as provided by the accounting side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub company_id: CompanyId,
    /// Invoice number (e.g. "INV/2024/0001").
    pub number: String,
    /// Partner (debtor) display name.
    pub partner_name: String,
    pub kind: InvoiceKind,
    pub state: InvoiceState,
    /// Invoice currency (ISO 4217).
    pub currency_code: String,
    pub amount_total: Decimal,
    /// Amount still open. Reduced when a collection is uploaded.
    pub amount_residual: Decimal,
    /// Payment reference communicated to the debtor.
    pub payment_reference: Option<String>,
    pub reference_type: ReferenceType,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub payment_mode_id: Option<PaymentModeId>,
    pub mandate_id: Option<MandateId>,
    pub payment_state: PaymentState,
}

impl Invoice {
    /// Post a draft invoice.
    pub fn post(&mut self) {
        self.state = InvoiceState::Posted;
    }

    /// Communication used on payment lines: the payment reference, or the number.
    pub fn communication(&self) -> &str {
        self.payment_reference
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(&self.number)
    }

    /// Apply a settled amount and recompute the payment state.
    pub(crate) fn register_payment(&mut self, amount: Decimal) {
        self.amount_residual = (self.amount_residual - amount).max(Decimal::ZERO);
        self.payment_state = if self.amount_residual.is_zero() {
            PaymentState::Paid
        } else if self.amount_residual < self.amount_total {
            PaymentState::Partial
        } else {
            PaymentState::NotPaid
        };
    }
}
