use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::bank::{is_valid_creditor_identifier, sanitize_account_number};
use super::error::LastschriftError;
use super::mandate::*;
use super::payment_mode::*;
use super::types::*;

/// Builder for the creditor company.
///
/// ```
/// use lastschrift::core::*;
///
/// let company = CompanyBuilder::new("Test EUR company", "FR")
///     .sepa_creditor_identifier("FR78ZZZ424242")
///     .build()
///     .unwrap();
/// assert_eq!(company.currency_code, "EUR");
/// ```
pub struct CompanyBuilder {
    name: String,
    country_code: String,
    currency_code: String,
    sepa_creditor_identifier: Option<String>,
    initiating_party_identifier: Option<String>,
    initiating_party_issuer: Option<String>,
}

impl CompanyBuilder {
    pub fn new(name: impl Into<String>, country_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country_code: country_code.into(),
            currency_code: "EUR".to_string(),
            sepa_creditor_identifier: None,
            initiating_party_identifier: None,
            initiating_party_issuer: None,
        }
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.currency_code = code.into();
        self
    }

    pub fn sepa_creditor_identifier(mut self, ci: impl Into<String>) -> Self {
        self.sepa_creditor_identifier = Some(ci.into());
        self
    }

    pub fn initiating_party(mut self, identifier: impl Into<String>, issuer: Option<String>) -> Self {
        self.initiating_party_identifier = Some(identifier.into());
        self.initiating_party_issuer = issuer;
        self
    }

    /// Build the company. A creditor identifier, when given, must pass its check digits.
    pub fn build(self) -> Result<Company, LastschriftError> {
        if self.name.trim().is_empty() {
            return Err(LastschriftError::Builder("company name is required".into()));
        }
        if self.country_code.len() != 2 {
            return Err(LastschriftError::Builder(
                "country code must be 2 characters (ISO 3166-1)".into(),
            ));
        }
        let sepa_creditor_identifier = match self.sepa_creditor_identifier {
            Some(ci) => {
                let ci = sanitize_account_number(&ci);
                if !is_valid_creditor_identifier(&ci) {
                    return Err(LastschriftError::Builder(format!(
                        "invalid SEPA creditor identifier '{ci}'"
                    )));
                }
                Some(ci)
            }
            None => None,
        };
        Ok(Company {
            name: self.name,
            country_code: self.country_code,
            currency_code: self.currency_code,
            sepa_creditor_identifier,
            initiating_party_identifier: self.initiating_party_identifier,
            initiating_party_issuer: self.initiating_party_issuer,
        })
    }
}

/// Builder for SEPA mandates.
///
/// New mandates are `draft` unless `.valid()` is called; a valid mandate
/// needs a signature date.
pub struct MandateBuilder {
    company_id: CompanyId,
    unique_reference: String,
    partner_bank_id: BankAccountId,
    sequence_type: SequenceType,
    scheme: MandateScheme,
    signature_date: Option<NaiveDate>,
    last_debit_date: Option<NaiveDate>,
    valid: bool,
}

impl MandateBuilder {
    pub fn new(
        company_id: CompanyId,
        unique_reference: impl Into<String>,
        partner_bank_id: BankAccountId,
    ) -> Self {
        Self {
            company_id,
            unique_reference: unique_reference.into(),
            partner_bank_id,
            sequence_type: SequenceType::First,
            scheme: MandateScheme::Core,
            signature_date: None,
            last_debit_date: None,
            valid: false,
        }
    }

    pub fn sequence_type(mut self, seq: SequenceType) -> Self {
        self.sequence_type = seq;
        self
    }

    pub fn one_off(self) -> Self {
        self.sequence_type(SequenceType::OneOff)
    }

    pub fn scheme(mut self, scheme: MandateScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn signed_on(mut self, date: NaiveDate) -> Self {
        self.signature_date = Some(date);
        self
    }

    pub fn last_debit_date(mut self, date: NaiveDate) -> Self {
        self.last_debit_date = Some(date);
        self
    }

    pub fn valid(mut self) -> Self {
        self.valid = true;
        self
    }

    pub fn build(self) -> Result<Mandate, LastschriftError> {
        let reference = self.unique_reference.trim().to_string();
        if reference.is_empty() {
            return Err(LastschriftError::Builder(
                "unique mandate reference is required".into(),
            ));
        }
        if reference.chars().count() > MANDATE_REFERENCE_MAX_LEN {
            return Err(LastschriftError::Builder(format!(
                "unique mandate reference cannot exceed {MANDATE_REFERENCE_MAX_LEN} characters"
            )));
        }
        let mut mandate = Mandate {
            company_id: self.company_id,
            unique_reference: reference,
            state: MandateState::Draft,
            recurrent_sequence_type: self.sequence_type,
            scheme: self.scheme,
            signature_date: self.signature_date,
            last_debit_date: self.last_debit_date,
            partner_bank_id: self.partner_bank_id,
        };
        if self.valid {
            mandate.validate()?;
        }
        Ok(mandate)
    }
}

/// Builder for invoices handed over by the accounting side.
pub struct InvoiceBuilder {
    company_id: CompanyId,
    number: String,
    partner_name: String,
    kind: InvoiceKind,
    currency_code: String,
    amount_total: Decimal,
    payment_reference: Option<String>,
    reference_type: ReferenceType,
    invoice_date: NaiveDate,
    due_date: Option<NaiveDate>,
    payment_mode_id: Option<PaymentModeId>,
    mandate_id: Option<MandateId>,
    posted: bool,
}

impl InvoiceBuilder {
    pub fn new(
        company_id: CompanyId,
        number: impl Into<String>,
        partner_name: impl Into<String>,
        invoice_date: NaiveDate,
        amount_total: Decimal,
    ) -> Self {
        Self {
            company_id,
            number: number.into(),
            partner_name: partner_name.into(),
            kind: InvoiceKind::OutInvoice,
            currency_code: "EUR".to_string(),
            amount_total,
            payment_reference: None,
            reference_type: ReferenceType::None,
            invoice_date,
            due_date: None,
            payment_mode_id: None,
            mandate_id: None,
            posted: false,
        }
    }

    pub fn kind(mut self, kind: InvoiceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.currency_code = code.into();
        self
    }

    pub fn payment_reference(mut self, reference: impl Into<String>) -> Self {
        self.payment_reference = Some(reference.into());
        self
    }

    pub fn structured_reference(mut self, reference: impl Into<String>) -> Self {
        self.payment_reference = Some(reference.into());
        self.reference_type = ReferenceType::Structured;
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn payment_mode(mut self, id: PaymentModeId) -> Self {
        self.payment_mode_id = Some(id);
        self
    }

    pub fn mandate(mut self, id: MandateId) -> Self {
        self.mandate_id = Some(id);
        self
    }

    pub fn posted(mut self) -> Self {
        self.posted = true;
        self
    }

    pub fn build(self) -> Result<Invoice, LastschriftError> {
        if self.number.trim().is_empty() {
            return Err(LastschriftError::Builder("invoice number is required".into()));
        }
        if self.amount_total <= Decimal::ZERO {
            return Err(LastschriftError::Builder(format!(
                "invoice {} must have a positive total",
                self.number
            )));
        }
        if self.currency_code.len() != 3 || !self.currency_code.chars().all(|c| c.is_ascii_uppercase())
        {
            return Err(LastschriftError::Builder(format!(
                "currency code '{}' must be 3 upper-case letters (ISO 4217)",
                self.currency_code
            )));
        }
        if self.reference_type == ReferenceType::Structured
            && self.payment_reference.as_ref().is_none_or(|r| r.trim().is_empty())
        {
            return Err(LastschriftError::Builder(
                "structured reference type requires a payment reference".into(),
            ));
        }
        Ok(Invoice {
            company_id: self.company_id,
            number: self.number,
            partner_name: self.partner_name,
            kind: self.kind,
            state: if self.posted {
                InvoiceState::Posted
            } else {
                InvoiceState::Draft
            },
            currency_code: self.currency_code,
            amount_total: self.amount_total,
            amount_residual: self.amount_total,
            payment_reference: self.payment_reference,
            reference_type: self.reference_type,
            invoice_date: self.invoice_date,
            due_date: self.due_date.unwrap_or(self.invoice_date),
            payment_mode_id: self.payment_mode_id,
            mandate_id: self.mandate_id,
            payment_state: PaymentState::NotPaid,
        })
    }
}

/// Builder for payment modes.
pub struct PaymentModeBuilder {
    company_id: CompanyId,
    name: String,
    payment_type: PaymentType,
    payment_method: PaymentMethod,
    pain_version: PainVersion,
    bank_account_link: BankAccountLink,
    fixed_journal_id: Option<JournalId>,
    group_lines: bool,
    default_date_prefered: DatePrefered,
    batch_booking: bool,
    sepa_creditor_identifier: Option<String>,
    convert_to_ascii: bool,
}

impl PaymentModeBuilder {
    /// An inbound SEPA direct debit mode producing files of `pain_version`.
    pub fn sepa_direct_debit(
        company_id: CompanyId,
        name: impl Into<String>,
        pain_version: PainVersion,
    ) -> Self {
        Self {
            company_id,
            name: name.into(),
            payment_type: PaymentType::Inbound,
            payment_method: PaymentMethod::SepaDirectDebit,
            pain_version,
            bank_account_link: BankAccountLink::Variable,
            fixed_journal_id: None,
            group_lines: true,
            default_date_prefered: DatePrefered::Due,
            batch_booking: true,
            sepa_creditor_identifier: None,
            convert_to_ascii: false,
        }
    }

    pub fn payment_type(mut self, payment_type: PaymentType) -> Self {
        self.payment_type = payment_type;
        self
    }

    pub fn fixed_journal(mut self, journal: JournalId) -> Self {
        self.bank_account_link = BankAccountLink::Fixed;
        self.fixed_journal_id = Some(journal);
        self
    }

    pub fn group_lines(mut self, group: bool) -> Self {
        self.group_lines = group;
        self
    }

    pub fn date_prefered(mut self, pref: DatePrefered) -> Self {
        self.default_date_prefered = pref;
        self
    }

    pub fn batch_booking(mut self, batch: bool) -> Self {
        self.batch_booking = batch;
        self
    }

    pub fn sepa_creditor_identifier(mut self, ci: impl Into<String>) -> Self {
        self.sepa_creditor_identifier = Some(ci.into());
        self
    }

    pub fn convert_to_ascii(mut self, convert: bool) -> Self {
        self.convert_to_ascii = convert;
        self
    }

    pub fn build(self) -> Result<PaymentMode, LastschriftError> {
        if self.name.trim().is_empty() {
            return Err(LastschriftError::Builder("payment mode name is required".into()));
        }
        if let Some(ci) = &self.sepa_creditor_identifier {
            if !is_valid_creditor_identifier(ci) {
                return Err(LastschriftError::Builder(format!(
                    "invalid SEPA creditor identifier '{ci}'"
                )));
            }
        }
        Ok(PaymentMode {
            company_id: self.company_id,
            name: self.name,
            payment_type: self.payment_type,
            payment_method: self.payment_method,
            pain_version: self.pain_version,
            bank_account_link: self.bank_account_link,
            fixed_journal_id: self.fixed_journal_id,
            group_lines: self.group_lines,
            default_date_prefered: self.default_date_prefered,
            batch_booking: self.batch_booking,
            sepa_creditor_identifier: self.sepa_creditor_identifier,
            convert_to_ascii: self.convert_to_ascii,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn company_sanitizes_creditor_identifier() {
        let c = CompanyBuilder::new("ACME", "FR")
            .sepa_creditor_identifier("fr78 zzz 424242")
            .build()
            .unwrap();
        assert_eq!(c.sepa_creditor_identifier.as_deref(), Some("FR78ZZZ424242"));
        assert!(
            CompanyBuilder::new("ACME", "FR")
                .sepa_creditor_identifier("FR00ZZZ424242")
                .build()
                .is_err()
        );
    }

    #[test]
    fn mandate_valid_needs_signature() {
        let err = MandateBuilder::new(CompanyId(1), "BMTEST12", BankAccountId(1))
            .valid()
            .build()
            .unwrap_err();
        assert!(matches!(err, LastschriftError::Validation(_)));

        let m = MandateBuilder::new(CompanyId(1), "BMTEST12", BankAccountId(1))
            .signed_on(date(2024, 1, 1))
            .valid()
            .build()
            .unwrap();
        assert_eq!(m.state, MandateState::Valid);
        assert_eq!(m.recurrent_sequence_type, SequenceType::First);
    }

    #[test]
    fn mandate_reference_length() {
        let long = "X".repeat(36);
        assert!(
            MandateBuilder::new(CompanyId(1), long, BankAccountId(1))
                .build()
                .is_err()
        );
    }

    #[test]
    fn invoice_defaults() {
        let inv = InvoiceBuilder::new(CompanyId(1), "INV/001", "Agrolait", date(2024, 6, 1), dec!(42))
            .build()
            .unwrap();
        assert_eq!(inv.state, InvoiceState::Draft);
        assert_eq!(inv.due_date, date(2024, 6, 1));
        assert_eq!(inv.amount_residual, dec!(42));
        assert_eq!(inv.payment_state, PaymentState::NotPaid);
    }

    #[test]
    fn invoice_rejects_bad_input() {
        let d = date(2024, 6, 1);
        assert!(InvoiceBuilder::new(CompanyId(1), "I", "P", d, dec!(0)).build().is_err());
        assert!(
            InvoiceBuilder::new(CompanyId(1), "I", "P", d, dec!(1))
                .currency("eur")
                .build()
                .is_err()
        );
        assert!(InvoiceBuilder::new(CompanyId(1), " ", "P", d, dec!(1)).build().is_err());
    }

    #[test]
    fn payment_mode_fixed_journal() {
        let mode = PaymentModeBuilder::sepa_direct_debit(CompanyId(1), "SDD", PainVersion::Pain00800102)
            .fixed_journal(JournalId(7))
            .build()
            .unwrap();
        assert_eq!(mode.bank_account_link, BankAccountLink::Fixed);
        assert_eq!(mode.fixed_journal_id, Some(JournalId(7)));
        assert_eq!(mode.payment_type, PaymentType::Inbound);
        assert!(mode.is_direct_debit());
    }
}
