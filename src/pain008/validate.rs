use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::charset::is_sepa_charset;
use super::dialect::dialect;
use super::model::{Collection, CollectionOrder, Remittance};
use crate::core::*;

/// Maximum length of pain.008 identifiers (`Max35Text`).
pub const MAX_ID_LEN: usize = 35;

/// Largest amount `InstdAmt` accepts.
const MAX_AMOUNT: Decimal = dec!(999999999.99);

/// Version rules that apply to every collection of one order.
struct Rules {
    eur_only: bool,
    restricted: bool,
}

/// Check a collection order before any XML is written.
///
/// Returns all problems found; an empty list means the order can be
/// generated for its configured version.
pub fn validate_for_generation(order: &CollectionOrder) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let d = dialect(order.version);
    let rules = Rules {
        eur_only: order.sepa || d.requires_sepa(),
        restricted: d.restricts_charset() || order.convert_to_ascii,
    };

    if d.requires_sepa() && !order.sepa {
        errors.push(ValidationError::with_rule(
            "sepa",
            format!("{} only carries SEPA collections", order.version),
            "SDD-SEPA",
        ));
    }

    if order.message_id.trim().is_empty() {
        errors.push(ValidationError::with_rule(
            "message_id",
            "message id is required",
            "SDD-MSGID",
        ));
    } else if order.message_id.chars().count() > MAX_ID_LEN {
        errors.push(ValidationError::with_rule(
            "message_id",
            format!("message id '{}' exceeds {MAX_ID_LEN} characters", order.message_id),
            "SDD-MSGID",
        ));
    }
    if rules.restricted {
        check_charset("message_id", &order.message_id, "SDD-MSGID", &mut errors);
        if let Some(id) = &order.initiating_party.identifier {
            check_charset("initiating_party.identifier", id, "SDD-ID", &mut errors);
        }
    }

    if order.initiating_party.name.trim().is_empty() {
        errors.push(ValidationError::new(
            "initiating_party.name",
            "initiating party name is required",
        ));
    }

    // Creditor
    if order.creditor.name.trim().is_empty() {
        errors.push(ValidationError::new("creditor.name", "creditor name is required"));
    }
    if order.creditor.iban.is_empty() {
        errors.push(ValidationError::with_rule(
            "creditor.iban",
            "company bank account has no account number",
            "SDD-IBAN",
        ));
    } else if !is_valid_iban(&order.creditor.iban) {
        errors.push(ValidationError::with_rule(
            "creditor.iban",
            format!("'{}' is not a valid IBAN", order.creditor.iban),
            "SDD-IBAN",
        ));
    }
    if let Some(bic) = &order.creditor.bic {
        if !is_valid_bic(bic) {
            errors.push(ValidationError::with_rule(
                "creditor.bic",
                format!("'{bic}' is not a valid BIC"),
                "SDD-BIC",
            ));
        }
    }
    match order.creditor.scheme_identifier.as_deref() {
        None | Some("") => errors.push(ValidationError::with_rule(
            "creditor.scheme_identifier",
            "missing SEPA creditor identifier on the company or the payment mode",
            "SDD-CI",
        )),
        Some(ci) if !is_valid_creditor_identifier(ci) => {
            errors.push(ValidationError::with_rule(
                "creditor.scheme_identifier",
                format!("'{ci}' is not a valid SEPA creditor identifier"),
                "SDD-CI",
            ))
        }
        Some(_) => {}
    }

    if order.collections.is_empty() {
        errors.push(ValidationError::new(
            "collections",
            "at least one collection is required",
        ));
    }

    for (i, c) in order.collections.iter().enumerate() {
        validate_collection(&rules, i, c, &mut errors);
    }

    errors
}

/// Reject identifiers outside the SEPA character set.
fn check_charset(
    field: impl Into<String>,
    value: &str,
    rule: &str,
    errors: &mut Vec<ValidationError>,
) {
    if !is_sepa_charset(value.trim()) {
        errors.push(ValidationError::with_rule(
            field,
            format!("'{value}' contains characters outside the SEPA character set"),
            rule,
        ));
    }
}

fn validate_collection(
    rules: &Rules,
    i: usize,
    c: &Collection,
    errors: &mut Vec<ValidationError>,
) {
    let field = |name: &str| format!("collections[{i}].{name}");

    if c.end_to_end_id.trim().is_empty() {
        errors.push(ValidationError::new(field("end_to_end_id"), "end-to-end id is required"));
    }
    if c.instruction_id.trim().is_empty() {
        errors.push(ValidationError::new(field("instruction_id"), "instruction id is required"));
    }
    if rules.restricted {
        check_charset(field("end_to_end_id"), &c.end_to_end_id, "SDD-ID", errors);
        check_charset(field("instruction_id"), &c.instruction_id, "SDD-ID", errors);
    }

    if c.amount <= Decimal::ZERO {
        errors.push(ValidationError::with_rule(
            field("amount"),
            format!("amount must be positive, got {}", c.amount),
            "SDD-AMT",
        ));
    } else if c.amount > MAX_AMOUNT {
        errors.push(ValidationError::with_rule(
            field("amount"),
            format!("amount {} exceeds {MAX_AMOUNT}", c.amount),
            "SDD-AMT",
        ));
    } else if c.amount.normalize().scale() > 2 {
        errors.push(ValidationError::with_rule(
            field("amount"),
            format!("amount {} has more than two decimals", c.amount),
            "SDD-AMT",
        ));
    }

    if c.currency_code.len() != 3 || !c.currency_code.chars().all(|ch| ch.is_ascii_uppercase()) {
        errors.push(ValidationError::new(
            field("currency_code"),
            format!("'{}' is not an ISO 4217 currency code", c.currency_code),
        ));
    } else if rules.eur_only && c.currency_code != "EUR" {
        errors.push(ValidationError::with_rule(
            field("currency_code"),
            format!("SEPA collections must be in EUR, got {}", c.currency_code),
            "SDD-EUR",
        ));
    }

    let reference = c.mandate_reference.trim();
    if reference.is_empty() {
        errors.push(ValidationError::with_rule(
            field("mandate_reference"),
            "mandate reference is required",
            "SDD-MNDT",
        ));
    } else if reference.chars().count() > MANDATE_REFERENCE_MAX_LEN {
        errors.push(ValidationError::with_rule(
            field("mandate_reference"),
            format!("mandate reference '{reference}' exceeds {MANDATE_REFERENCE_MAX_LEN} characters"),
            "SDD-MNDT",
        ));
    } else if rules.restricted {
        check_charset(field("mandate_reference"), reference, "SDD-MNDT", errors);
    }
    if c.signature_date.is_none() {
        errors.push(ValidationError::with_rule(
            field("signature_date"),
            format!("mandate '{reference}' has no signature date"),
            "SDD-MNDT",
        ));
    }

    if c.debtor_name.trim().is_empty() {
        errors.push(ValidationError::new(field("debtor_name"), "debtor name is required"));
    }
    if !is_valid_iban(&c.debtor_iban) {
        errors.push(ValidationError::with_rule(
            field("debtor_iban"),
            format!(
                "debtor account '{}' of mandate '{reference}' is not a valid IBAN",
                c.debtor_iban
            ),
            "SDD-IBAN",
        ));
    }
    if let Some(bic) = &c.debtor_bic {
        if !is_valid_bic(bic) {
            errors.push(ValidationError::with_rule(
                field("debtor_bic"),
                format!("'{bic}' is not a valid BIC"),
                "SDD-BIC",
            ));
        }
    }

    if let Remittance::Structured(r) = &c.remittance {
        let r = r.trim();
        if r.is_empty() {
            errors.push(ValidationError::new(
                field("remittance"),
                "structured communication requires a reference",
            ));
        } else if r.chars().count() > MAX_ID_LEN {
            errors.push(ValidationError::new(
                field("remittance"),
                format!("structured reference '{r}' exceeds {MAX_ID_LEN} characters"),
            ));
        } else if rules.restricted {
            check_charset(field("remittance"), r, "SDD-ID", errors);
        }
    }
}
