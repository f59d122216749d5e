use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{MandateScheme, PainVersion, SequenceType};

/// The party that sends the message (`GrpHdr/InitgPty`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiatingParty {
    pub name: String,
    /// Organisation identifier, written to `Id/OrgId/Othr/Id`.
    pub identifier: Option<String>,
    pub issuer: Option<String>,
}

/// The company collecting the money.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creditor {
    pub name: String,
    /// Sanitized IBAN of the company bank account.
    pub iban: String,
    pub bic: Option<String>,
    /// SEPA creditor identifier (`CdtrSchmeId`).
    pub scheme_identifier: Option<String>,
}

/// Remittance information of one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Remittance {
    /// Free text, `RmtInf/Ustrd`.
    Unstructured(String),
    /// Creditor reference (ISO 11649), `RmtInf/Strd/CdtrRefInf/Ref`.
    Structured(String),
}

impl Remittance {
    pub fn text(&self) -> &str {
        match self {
            Self::Unstructured(s) | Self::Structured(s) => s,
        }
    }
}

/// One direct debit transaction (`DrctDbtTxInf`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub instruction_id: String,
    pub end_to_end_id: String,
    pub amount: Decimal,
    pub currency_code: String,
    /// Requested collection date (`ReqdColltnDt` of the enclosing block).
    pub collection_date: NaiveDate,
    pub sequence_type: SequenceType,
    pub scheme: MandateScheme,
    pub mandate_reference: String,
    pub signature_date: Option<NaiveDate>,
    /// Same mandate, new debtor account (`SMNDA`).
    pub amendment: bool,
    pub debtor_name: String,
    /// Sanitized IBAN of the debtor.
    pub debtor_iban: String,
    pub debtor_bic: Option<String>,
    pub remittance: Remittance,
}

/// Everything needed to write one pain.008 customer direct debit initiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionOrder {
    /// `GrpHdr/MsgId`, the payment order name.
    pub message_id: String,
    pub version: PainVersion,
    pub initiating_party: InitiatingParty,
    pub creditor: Creditor,
    /// SEPA service level, shared by every block.
    pub sepa: bool,
    pub batch_booking: bool,
    /// Restrict text to the SEPA character set even where the version allows more.
    pub convert_to_ascii: bool,
    pub collections: Vec<Collection>,
}

impl CollectionOrder {
    /// Sum of all transaction amounts.
    pub fn control_sum(&self) -> Decimal {
        self.collections.iter().map(|c| c.amount).sum()
    }
}

/// Key of one `PmtInf` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PaymentInfoKey {
    pub collection_date: NaiveDate,
    pub sequence_type: SequenceType,
    pub scheme: MandateScheme,
}

impl PaymentInfoKey {
    pub fn of(c: &Collection) -> Self {
        Self {
            collection_date: c.collection_date,
            sequence_type: c.sequence_type,
            scheme: c.scheme,
        }
    }
}

/// Split collections into `PmtInf` blocks, keeping first-seen order.
pub(crate) fn payment_info_blocks(
    collections: &[Collection],
) -> Vec<(PaymentInfoKey, Vec<&Collection>)> {
    let mut blocks: Vec<(PaymentInfoKey, Vec<&Collection>)> = Vec::new();
    for c in collections {
        let key = PaymentInfoKey::of(c);
        match blocks.iter().position(|(k, _)| *k == key) {
            Some(i) => blocks[i].1.push(c),
            None => blocks.push((key, vec![c])),
        }
    }
    blocks
}
