//! Bank accounts, IBAN / BIC checks and the SEPA creditor identifier.

use serde::{Deserialize, Serialize};

use super::types::CompanyId;

/// IBAN country prefixes of the SEPA scheme area.
pub const SEPA_COUNTRIES: &[&str] = &[
    "AD", "AT", "BE", "BG", "CH", "CY", "CZ", "DE", "DK", "EE", "ES", "FI", "FR", "GB", "GI",
    "GR", "HR", "HU", "IE", "IS", "IT", "LI", "LT", "LU", "LV", "MC", "MT", "NL", "NO", "PL",
    "PT", "RO", "SE", "SI", "SK", "SM", "VA",
];

/// Kind of account number, derived from its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Passes the ISO 13616 IBAN check.
    Iban,
    /// Any other national account number.
    Bank,
}

/// A bank account of a partner (debtor) or of the company (creditor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub company_id: CompanyId,
    /// Account holder name.
    pub holder_name: String,
    /// Account number as entered (may contain spaces / lower case).
    pub account_number: String,
    /// BIC of the account-servicing bank.
    pub bic: Option<String>,
}

impl BankAccount {
    pub fn new(
        company_id: CompanyId,
        holder_name: impl Into<String>,
        account_number: impl Into<String>,
    ) -> Self {
        Self {
            company_id,
            holder_name: holder_name.into(),
            account_number: account_number.into(),
            bic: None,
        }
    }

    pub fn with_bic(mut self, bic: impl Into<String>) -> Self {
        let bic: String = bic.into();
        self.bic = Some(bic.trim().to_string());
        self
    }

    /// Account number without separators, upper-cased.
    pub fn sanitized_account_number(&self) -> String {
        sanitize_account_number(&self.account_number)
    }

    pub fn account_kind(&self) -> AccountKind {
        if is_valid_iban(&self.account_number) {
            AccountKind::Iban
        } else {
            AccountKind::Bank
        }
    }

    /// Country prefix of the IBAN, if the number is an IBAN.
    pub fn iban_country(&self) -> Option<String> {
        match self.account_kind() {
            AccountKind::Iban => Some(self.sanitized_account_number()[..2].to_string()),
            AccountKind::Bank => None,
        }
    }

    /// True if the account is an IBAN within the SEPA area.
    pub fn is_sepa_reachable(&self) -> bool {
        self.iban_country()
            .is_some_and(|c| SEPA_COUNTRIES.contains(&c.as_str()))
    }
}

/// Strip everything but ASCII letters and digits, upper-case the rest.
pub fn sanitize_account_number(number: &str) -> String {
    number
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// ISO 7064 MOD 97-10 over an alphanumeric string, letters as A=10..Z=35.
fn mod97(s: &str) -> Option<u32> {
    let mut rem: u32 = 0;
    for c in s.chars() {
        let v = c.to_digit(36)?;
        rem = if v < 10 {
            (rem * 10 + v) % 97
        } else {
            (rem * 100 + v) % 97
        };
    }
    Some(rem)
}

/// Validate an IBAN by structure and ISO 13616 check digits.
///
/// Spaces and lower case are accepted.
pub fn is_valid_iban(iban: &str) -> bool {
    let iban = sanitize_account_number(iban);
    if !(15..=34).contains(&iban.len()) {
        return false;
    }
    let bytes = iban.as_bytes();
    if !bytes[0].is_ascii_uppercase()
        || !bytes[1].is_ascii_uppercase()
        || !bytes[2].is_ascii_digit()
        || !bytes[3].is_ascii_digit()
    {
        return false;
    }
    let rearranged = format!("{}{}", &iban[4..], &iban[..4]);
    mod97(&rearranged) == Some(1)
}

/// Validate a BIC (ISO 9362): 8 or 11 characters, bank + country + location [+ branch].
pub fn is_valid_bic(bic: &str) -> bool {
    let bic = bic.trim();
    if bic.len() != 8 && bic.len() != 11 {
        return false;
    }
    let b = bic.as_bytes();
    b[..6].iter().all(|c| c.is_ascii_uppercase())
        && b[6..].iter().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Validate a SEPA creditor identifier.
///
/// Layout: country (2) + check digits (2) + business code (3, ignored by
/// the check) + national identifier. The check digits are computed like an
/// IBAN over the national identifier followed by the country code.
pub fn is_valid_creditor_identifier(ci: &str) -> bool {
    let ci = sanitize_account_number(ci);
    if !(8..=35).contains(&ci.len()) {
        return false;
    }
    let bytes = ci.as_bytes();
    if !bytes[0].is_ascii_uppercase()
        || !bytes[1].is_ascii_uppercase()
        || !bytes[2].is_ascii_digit()
        || !bytes[3].is_ascii_digit()
    {
        return false;
    }
    let rearranged = format!("{}{}", &ci[7..], &ci[..4]);
    mod97(&rearranged) == Some(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iban_valid() {
        assert!(is_valid_iban("DE89370400440532013000"));
        assert!(is_valid_iban("DE89 3704 0044 0532 0130 00"));
        assert!(is_valid_iban("fr76 3000 4000 0312 3456 7890 143"));
        assert!(is_valid_iban("GB82WEST12345698765432"));
    }

    #[test]
    fn iban_invalid() {
        assert!(!is_valid_iban("DE89370400440532013001"));
        assert!(!is_valid_iban("DE8937040044"));
        assert!(!is_valid_iban("1289370400440532013000"));
        assert!(!is_valid_iban(""));
    }

    #[test]
    fn bic_format() {
        assert!(is_valid_bic("COBADEFFXXX"));
        assert!(is_valid_bic("PSSTFRPP"));
        assert!(!is_valid_bic("COBADEFF12"));
        assert!(!is_valid_bic("cobadeff"));
    }

    #[test]
    fn creditor_identifier() {
        assert!(is_valid_creditor_identifier("FR78ZZZ424242"));
        assert!(is_valid_creditor_identifier("DE98ZZZ09999999999"));
        assert!(!is_valid_creditor_identifier("FR79ZZZ424242"));
        assert!(!is_valid_creditor_identifier("FR78"));
    }

    #[test]
    fn sanitized_number_and_kind() {
        let acc = BankAccount::new(CompanyId(1), "Agrolait", "fr76 3000 4000 0312 3456 7890 143");
        assert_eq!(acc.sanitized_account_number(), "FR7630004000031234567890143");
        assert_eq!(acc.account_kind(), AccountKind::Iban);
        assert_eq!(acc.iban_country().as_deref(), Some("FR"));
        assert!(acc.is_sepa_reachable());

        let padded =
            BankAccount::new(CompanyId(1), "Agrolait", "DE89370400440532013000").with_bic(" COBADEFFXXX ");
        assert_eq!(padded.bic.as_deref(), Some("COBADEFFXXX"));

        let national = BankAccount::new(CompanyId(1), "Someone", "123-456-789");
        assert_eq!(national.account_kind(), AccountKind::Bank);
        assert!(!national.is_sepa_reachable());
    }
}
