use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::debug;

use super::charset::{TextPolicy, clip};
use super::dialect::{Dialect, XSI_NAMESPACE, dialect};
use super::model::{Collection, CollectionOrder, PaymentInfoKey, Remittance, payment_info_blocks};
use super::validate::{MAX_ID_LEN, validate_for_generation};
use super::xml_utils::{XmlResult, XmlWriter};
use crate::core::*;

/// Maximum length of unstructured remittance text.
pub const MAX_REMITTANCE_LEN: usize = 140;

/// Generate a pain.008 customer direct debit initiation for `order`.
///
/// The document follows the order's configured version. `created_at` is
/// written to `GrpHdr/CreDtTm` and is the only time-dependent field.
/// Fails with [`LastschriftError::Generation`] listing every problem
/// found by [`validate_for_generation`].
pub fn to_pain008_xml(order: &CollectionOrder, created_at: NaiveDateTime) -> XmlResult {
    let errors = validate_for_generation(order);
    if !errors.is_empty() {
        return Err(LastschriftError::Generation(join_errors(&errors)));
    }

    let d = dialect(order.version);
    let text = TextPolicy {
        restricted: d.restricts_charset() || order.convert_to_ascii,
    };
    let blocks = payment_info_blocks(&order.collections);

    let mut w = XmlWriter::new()?;
    let schema_location = d.schema_location();
    w.start_element_with_attrs(
        "Document",
        &[
            ("xmlns", d.namespace()),
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xsi:schemaLocation", schema_location.as_str()),
        ],
    )?;
    w.start_element("CstmrDrctDbtInitn")?;

    // Group header
    w.start_element("GrpHdr")?;
    w.text_element("MsgId", &clip("MsgId", &order.message_id, MAX_ID_LEN))?;
    w.text_element("CreDtTm", &created_at.format("%Y-%m-%dT%H:%M:%S").to_string())?;
    w.text_element("NbOfTxs", &order.collections.len().to_string())?;
    w.text_element("CtrlSum", &super::xml_utils::format_amount(order.control_sum()))?;
    write_initiating_party(&mut w, order, d, text)?;
    w.end_element("GrpHdr")?;

    for (key, collections) in &blocks {
        write_payment_info(&mut w, order, d, text, key, collections)?;
    }

    w.end_element("CstmrDrctDbtInitn")?;
    w.end_element("Document")?;

    debug!(
        message_id = %order.message_id,
        version = %order.version,
        payment_infos = blocks.len(),
        transactions = order.collections.len(),
        "wrote pain.008 document"
    );
    w.into_string()
}

fn write_initiating_party(
    w: &mut XmlWriter,
    order: &CollectionOrder,
    d: &dyn Dialect,
    text: TextPolicy,
) -> Result<(), LastschriftError> {
    let party = &order.initiating_party;
    w.start_element("InitgPty")?;
    w.text_element("Nm", &text.prepare("InitgPty/Nm", &party.name, d.max_name_len()))?;
    if let Some(id) = party.identifier.as_deref().filter(|s| !s.is_empty()) {
        w.start_element("Id")?;
        w.start_element("OrgId")?;
        w.start_element("Othr")?;
        w.text_element("Id", &clip("InitgPty/Id", id, MAX_ID_LEN))?;
        if let Some(issuer) = party.issuer.as_deref().filter(|s| !s.is_empty()) {
            w.text_element("Issr", &clip("InitgPty/Issr", issuer, MAX_ID_LEN))?;
        }
        w.end_element("Othr")?;
        w.end_element("OrgId")?;
        w.end_element("Id")?;
    }
    w.end_element("InitgPty")?;
    Ok(())
}

/// `PmtInfId`: `<message id>-<SeqTp>-<YYYYMMDD>-<scheme>`, clipped to 35.
pub(crate) fn payment_info_id(message_id: &str, key: &PaymentInfoKey) -> String {
    let id = format!(
        "{}-{}-{}-{}",
        message_id,
        key.sequence_type.code(),
        key.collection_date.format("%Y%m%d"),
        key.scheme.code()
    );
    id.chars().take(MAX_ID_LEN).collect()
}

fn write_payment_info(
    w: &mut XmlWriter,
    order: &CollectionOrder,
    d: &dyn Dialect,
    text: TextPolicy,
    key: &PaymentInfoKey,
    collections: &[&Collection],
) -> Result<(), LastschriftError> {
    let ctrl_sum: Decimal = collections.iter().map(|c| c.amount).sum();

    w.start_element("PmtInf")?;
    w.text_element("PmtInfId", &payment_info_id(&order.message_id, key))?;
    w.text_element("PmtMtd", "DD")?;
    w.text_element("BtchBookg", if order.batch_booking { "true" } else { "false" })?;
    w.text_element("NbOfTxs", &collections.len().to_string())?;
    w.text_element("CtrlSum", &super::xml_utils::format_amount(ctrl_sum))?;

    w.start_element("PmtTpInf")?;
    if order.sepa {
        w.nested_text(&["SvcLvl", "Cd"], "SEPA")?;
    }
    w.nested_text(&["LclInstrm", "Cd"], key.scheme.code())?;
    w.text_element("SeqTp", key.sequence_type.code())?;
    w.end_element("PmtTpInf")?;

    w.text_element("ReqdColltnDt", &key.collection_date.to_string())?;

    let creditor = &order.creditor;
    w.start_element("Cdtr")?;
    w.text_element("Nm", &text.prepare("Cdtr/Nm", &creditor.name, d.max_name_len()))?;
    w.end_element("Cdtr")?;
    w.nested_text(&["CdtrAcct", "Id", "IBAN"], &sanitize_account_number(&creditor.iban))?;
    w.start_element("CdtrAgt")?;
    d.write_financial_institution(w, creditor.bic.as_deref())?;
    w.end_element("CdtrAgt")?;
    if order.sepa {
        w.text_element("ChrgBr", "SLEV")?;
    }

    // Creditor scheme id, presence checked by validation
    let ci = creditor.scheme_identifier.as_deref().unwrap_or_default();
    w.start_element("CdtrSchmeId")?;
    w.start_element("Id")?;
    w.start_element("PrvtId")?;
    w.start_element("Othr")?;
    w.text_element("Id", &sanitize_account_number(ci))?;
    w.nested_text(&["SchmeNm", "Prtry"], "SEPA")?;
    w.end_element("Othr")?;
    w.end_element("PrvtId")?;
    w.end_element("Id")?;
    w.end_element("CdtrSchmeId")?;

    for c in collections {
        write_transaction(w, d, text, c)?;
    }

    w.end_element("PmtInf")?;
    Ok(())
}

fn write_transaction(
    w: &mut XmlWriter,
    d: &dyn Dialect,
    text: TextPolicy,
    c: &Collection,
) -> Result<(), LastschriftError> {
    w.start_element("DrctDbtTxInf")?;

    w.start_element("PmtId")?;
    w.text_element("InstrId", &clip("InstrId", &c.instruction_id, MAX_ID_LEN))?;
    w.text_element("EndToEndId", &clip("EndToEndId", &c.end_to_end_id, MAX_ID_LEN))?;
    w.end_element("PmtId")?;

    w.amount_element("InstdAmt", c.amount, &c.currency_code)?;

    w.start_element("DrctDbtTx")?;
    w.start_element("MndtRltdInf")?;
    w.text_element("MndtId", &clip("MndtId", c.mandate_reference.trim(), MAX_ID_LEN))?;
    if let Some(signed) = c.signature_date {
        w.text_element("DtOfSgntr", &signed.to_string())?;
    }
    if c.amendment {
        w.text_element("AmdmntInd", "true")?;
        w.start_element("AmdmntInfDtls")?;
        w.nested_text(&["OrgnlDbtrAcct", "Id", "Othr", "Id"], "SMNDA")?;
        w.end_element("AmdmntInfDtls")?;
    }
    w.end_element("MndtRltdInf")?;
    w.end_element("DrctDbtTx")?;

    w.start_element("DbtrAgt")?;
    d.write_financial_institution(w, c.debtor_bic.as_deref())?;
    w.end_element("DbtrAgt")?;

    w.start_element("Dbtr")?;
    w.text_element("Nm", &text.prepare("Dbtr/Nm", &c.debtor_name, d.max_name_len()))?;
    w.end_element("Dbtr")?;
    w.nested_text(&["DbtrAcct", "Id", "IBAN"], &sanitize_account_number(&c.debtor_iban))?;

    w.start_element("RmtInf")?;
    match &c.remittance {
        Remittance::Unstructured(s) => {
            w.text_element("Ustrd", &text.prepare("Ustrd", s, MAX_REMITTANCE_LEN))?;
        }
        Remittance::Structured(r) => {
            w.start_element("Strd")?;
            w.start_element("CdtrRefInf")?;
            w.start_element("Tp")?;
            w.start_element("CdOrPrtry")?;
            w.text_element("Cd", "SCOR")?;
            w.end_element("CdOrPrtry")?;
            w.end_element("Tp")?;
            w.text_element("Ref", r.trim())?;
            w.end_element("CdtrRefInf")?;
            w.end_element("Strd")?;
        }
    }
    w.end_element("RmtInf")?;

    w.end_element("DrctDbtTxInf")?;
    Ok(())
}
