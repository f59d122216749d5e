use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::LastschriftError;
use super::types::{BankAccountId, CompanyId};

/// Maximum length of a unique mandate reference (`MndtId`).
pub const MANDATE_REFERENCE_MAX_LEN: usize = 35;

/// Lifecycle state of a mandate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MandateState {
    Draft,
    Valid,
    Expired,
    Cancelled,
}

/// Where a mandate stands in its sequence of collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceType {
    /// Recurrent mandate, first collection.
    First,
    /// Recurrent mandate, subsequent collection.
    Recurring,
    /// Recurrent mandate, last collection.
    Final,
    /// One-off mandate, single collection.
    OneOff,
}

impl SequenceType {
    /// pain.008 `SeqTp` code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::First => "FRST",
            Self::Recurring => "RCUR",
            Self::Final => "FNAL",
            Self::OneOff => "OOFF",
        }
    }

    /// Parse from a pain.008 `SeqTp` code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "FRST" => Some(Self::First),
            "RCUR" => Some(Self::Recurring),
            "FNAL" => Some(Self::Final),
            "OOFF" => Some(Self::OneOff),
            _ => None,
        }
    }
}

/// SEPA direct debit scheme the mandate was signed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MandateScheme {
    /// SDD Core (consumers).
    #[serde(rename = "CORE")]
    Core,
    /// SDD Business to Business.
    #[serde(rename = "B2B")]
    B2b,
}

impl MandateScheme {
    /// pain.008 `LclInstrm/Cd` code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Core => "CORE",
            Self::B2b => "B2B",
        }
    }
}

/// A debtor's signed authorization to collect from one bank account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mandate {
    pub company_id: CompanyId,
    /// Unique mandate reference, unique per creditor.
    pub unique_reference: String,
    pub state: MandateState,
    pub recurrent_sequence_type: SequenceType,
    pub scheme: MandateScheme,
    pub signature_date: Option<NaiveDate>,
    /// Date of the last completed collection under this mandate.
    pub last_debit_date: Option<NaiveDate>,
    /// The debtor's bank account the mandate authorizes.
    pub partner_bank_id: BankAccountId,
}

impl Mandate {
    pub fn is_valid(&self) -> bool {
        self.state == MandateState::Valid
    }

    /// Move a draft mandate to `valid`. Requires a signature date.
    pub fn validate(&mut self) -> Result<(), LastschriftError> {
        if self.state != MandateState::Draft {
            return Err(LastschriftError::Validation(format!(
                "mandate {} must be in draft state to be validated",
                self.unique_reference
            )));
        }
        if self.signature_date.is_none() {
            return Err(LastschriftError::Validation(format!(
                "mandate {} has no signature date",
                self.unique_reference
            )));
        }
        self.state = MandateState::Valid;
        Ok(())
    }

    /// Cancel a mandate that is not yet expired.
    pub fn cancel(&mut self) -> Result<(), LastschriftError> {
        match self.state {
            MandateState::Draft | MandateState::Valid => {
                self.state = MandateState::Cancelled;
                Ok(())
            }
            _ => Err(LastschriftError::Validation(format!(
                "mandate {} cannot be cancelled from state {:?}",
                self.unique_reference, self.state
            ))),
        }
    }

    /// Record a completed collection.
    ///
    /// `first` becomes `recurring`; `final` and one-off mandates expire.
    pub(crate) fn record_collection(&mut self, date: NaiveDate) {
        self.last_debit_date = Some(date);
        match self.recurrent_sequence_type {
            SequenceType::First => self.recurrent_sequence_type = SequenceType::Recurring,
            SequenceType::Final | SequenceType::OneOff => self.state = MandateState::Expired,
            SequenceType::Recurring => {}
        }
    }

    /// A first collection on a mandate that was already debited before
    /// signals a changed debtor account (amendment `SMNDA`).
    pub fn needs_amendment(&self) -> bool {
        self.recurrent_sequence_type == SequenceType::First && self.last_debit_date.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mandate(seq: SequenceType) -> Mandate {
        Mandate {
            company_id: CompanyId(1),
            unique_reference: "BMTEST2".into(),
            state: MandateState::Draft,
            recurrent_sequence_type: seq,
            scheme: MandateScheme::Core,
            signature_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            last_debit_date: None,
            partner_bank_id: BankAccountId(1),
        }
    }

    #[test]
    fn validate_requires_signature() {
        let mut m = mandate(SequenceType::First);
        m.signature_date = None;
        assert!(m.validate().is_err());
        m.signature_date = NaiveDate::from_ymd_opt(2024, 1, 10);
        m.validate().unwrap();
        assert!(m.is_valid());
        assert!(m.validate().is_err());
    }

    #[test]
    fn collection_moves_sequence() {
        let d = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let mut first = mandate(SequenceType::First);
        first.state = MandateState::Valid;
        first.record_collection(d);
        assert_eq!(first.recurrent_sequence_type, SequenceType::Recurring);
        assert_eq!(first.state, MandateState::Valid);
        assert_eq!(first.last_debit_date, Some(d));

        let mut oneoff = mandate(SequenceType::OneOff);
        oneoff.state = MandateState::Valid;
        oneoff.record_collection(d);
        assert_eq!(oneoff.recurrent_sequence_type, SequenceType::OneOff);
        assert_eq!(oneoff.state, MandateState::Expired);

        let mut fin = mandate(SequenceType::Final);
        fin.state = MandateState::Valid;
        fin.record_collection(d);
        assert_eq!(fin.state, MandateState::Expired);
    }

    #[test]
    fn cancel_rules() {
        let mut m = mandate(SequenceType::Recurring);
        m.cancel().unwrap();
        assert_eq!(m.state, MandateState::Cancelled);
        assert!(m.cancel().is_err());
    }

    #[test]
    fn sequence_codes() {
        for seq in [
            SequenceType::First,
            SequenceType::Recurring,
            SequenceType::Final,
            SequenceType::OneOff,
        ] {
            assert_eq!(SequenceType::from_code(seq.code()), Some(seq));
        }
        assert_eq!(SequenceType::from_code("XXXX"), None);
    }
}
