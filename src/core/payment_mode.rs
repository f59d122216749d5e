use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::LastschriftError;
use super::types::{CompanyId, JournalId, PaymentType};

/// Supported pain.008 schema versions.
///
/// Selected per payment mode; there is no implicit default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PainVersion {
    /// ISO 20022 2009, EPC SEPA Core / B2B.
    #[serde(rename = "pain.008.001.02")]
    Pain00800102,
    /// German DK variant (Deutsche Kreditwirtschaft).
    #[serde(rename = "pain.008.003.02")]
    Pain00800302,
    /// ISO 20022 2012 maintenance release.
    #[serde(rename = "pain.008.001.03")]
    Pain00800103,
    /// ISO 20022 2013 maintenance release.
    #[serde(rename = "pain.008.001.04")]
    Pain00800104,
}

impl PainVersion {
    pub const ALL: [PainVersion; 4] = [
        Self::Pain00800102,
        Self::Pain00800302,
        Self::Pain00800103,
        Self::Pain00800104,
    ];

    /// Message identifier, e.g. "pain.008.001.02".
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Pain00800102 => "pain.008.001.02",
            Self::Pain00800302 => "pain.008.003.02",
            Self::Pain00800103 => "pain.008.001.03",
            Self::Pain00800104 => "pain.008.001.04",
        }
    }

    /// XML namespace of the schema.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Pain00800102 => "urn:iso:std:iso:20022:tech:xsd:pain.008.001.02",
            Self::Pain00800302 => "urn:iso:std:iso:20022:tech:xsd:pain.008.003.02",
            Self::Pain00800103 => "urn:iso:std:iso:20022:tech:xsd:pain.008.001.03",
            Self::Pain00800104 => "urn:iso:std:iso:20022:tech:xsd:pain.008.001.04",
        }
    }

    /// Look up the version declared by a document namespace.
    pub fn from_namespace(ns: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.namespace() == ns)
    }
}

impl fmt::Display for PainVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for PainVersion {
    type Err = LastschriftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.identifier() == s)
            .ok_or_else(|| LastschriftError::Config(format!("PAIN version '{s}' is not supported")))
    }
}

/// How the company bank account of an order is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankAccountLink {
    /// Always the mode's fixed journal.
    Fixed,
    /// Chosen on each order.
    Variable,
}

/// Which date is requested for the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePrefered {
    /// As soon as possible.
    Now,
    /// The due date of each invoice.
    Due,
    /// The order's scheduled date.
    Fixed,
}

/// Payment method family of a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    SepaDirectDebit,
    Manual,
}

/// Payment mode configuration: how invoices of this mode get paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMode {
    pub company_id: CompanyId,
    pub name: String,
    pub payment_type: PaymentType,
    pub payment_method: PaymentMethod,
    pub pain_version: PainVersion,
    pub bank_account_link: BankAccountLink,
    /// Journal used when `bank_account_link` is `fixed`.
    #[serde(default)]
    pub fixed_journal_id: Option<JournalId>,
    /// Merge payment lines into bank payment lines by grouping key.
    #[serde(default = "default_true")]
    pub group_lines: bool,
    #[serde(default = "default_date_prefered")]
    pub default_date_prefered: DatePrefered,
    #[serde(default = "default_true")]
    pub batch_booking: bool,
    /// Overrides the company's creditor identifier.
    #[serde(default)]
    pub sepa_creditor_identifier: Option<String>,
    /// Transliterate text to the SEPA Latin character set.
    #[serde(default)]
    pub convert_to_ascii: bool,
}

fn default_true() -> bool {
    true
}

fn default_date_prefered() -> DatePrefered {
    DatePrefered::Due
}

impl PaymentMode {
    /// True when orders of this mode produce pain.008 files.
    pub fn is_direct_debit(&self) -> bool {
        self.payment_method == PaymentMethod::SepaDirectDebit
    }

    /// Load a payment mode from its JSON configuration.
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> Result<Self, LastschriftError> {
        let mode: PaymentMode =
            serde_json::from_str(json).map_err(|e| LastschriftError::Config(e.to_string()))?;
        if mode.bank_account_link == BankAccountLink::Fixed && mode.fixed_journal_id.is_none() {
            return Err(LastschriftError::Config(format!(
                "payment mode '{}' links a fixed journal but none is configured",
                mode.name
            )));
        }
        Ok(mode)
    }
}
