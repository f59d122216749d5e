//! Reading pain.008 documents back into a summary.

use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

use crate::core::*;

/// Header-level content of a pain.008 document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pain008Summary {
    pub version: PainVersion,
    pub message_id: String,
    pub created_at: String,
    pub number_of_transactions: usize,
    pub control_sum: Decimal,
    pub initiating_party_name: String,
    pub payment_infos: Vec<PaymentInfoSummary>,
}

impl Pain008Summary {
    /// All transactions across payment information blocks, in document order.
    pub fn transactions(&self) -> impl Iterator<Item = &TransactionSummary> {
        self.payment_infos.iter().flat_map(|p| p.transactions.iter())
    }
}

/// One `PmtInf` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaymentInfoSummary {
    pub id: String,
    pub method: String,
    pub batch_booking: bool,
    pub number_of_transactions: usize,
    pub control_sum: Decimal,
    /// `SvcLvl/Cd`, "SEPA" for SEPA collections.
    pub service_level: Option<String>,
    pub local_instrument: Option<String>,
    pub sequence_type: Option<SequenceType>,
    pub collection_date: Option<NaiveDate>,
    pub creditor_name: String,
    pub creditor_iban: String,
    pub creditor_bic: Option<String>,
    pub creditor_scheme_id: Option<String>,
    pub charge_bearer: Option<String>,
    pub transactions: Vec<TransactionSummary>,
}

/// One `DrctDbtTxInf`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionSummary {
    pub instruction_id: String,
    pub end_to_end_id: String,
    pub amount: Decimal,
    pub currency_code: String,
    pub mandate_reference: String,
    pub signature_date: Option<NaiveDate>,
    pub amendment: bool,
    pub debtor_name: String,
    pub debtor_iban: String,
    pub debtor_bic: Option<String>,
    pub remittance: Option<String>,
}

/// Parse a pain.008 document of any supported version.
///
/// Element names are matched without namespace prefixes; the version is
/// taken from the default namespace of `Document`.
pub fn read_pain008(xml: &str) -> Result<Pain008Summary, LastschriftError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc = ParsedDocument::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e);
                match name.as_str() {
                    "Document" => doc.version = Some(document_version(e)?),
                    "PmtInf" => doc.current_info = Some(PaymentInfoSummary::default()),
                    "DrctDbtTxInf" => doc.current_tx = Some(TransactionSummary::default()),
                    "InstdAmt" => {
                        if let Some(tx) = doc.current_tx.as_mut() {
                            tx.currency_code = attribute(e, "Ccy").unwrap_or_default();
                        }
                    }
                    _ => {}
                }
                path.push(name);
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| LastschriftError::Xml(format!("XML parse error: {err}")))?
                    .to_string();
                if !text.is_empty() {
                    doc.handle_text(&path, &text)?;
                }
            }
            Ok(Event::End(_)) => {
                let ended = path.pop().unwrap_or_default();
                if ended == "DrctDbtTxInf" {
                    if let (Some(tx), Some(info)) = (doc.current_tx.take(), doc.current_info.as_mut()) {
                        info.transactions.push(tx);
                    }
                }
                if ended == "PmtInf" {
                    if let Some(info) = doc.current_info.take() {
                        doc.payment_infos.push(info);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(LastschriftError::Xml(format!("XML parse error: {e}")));
            }
            _ => {}
        }
    }

    doc.into_summary()
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key.as_bytes())
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn document_version(e: &BytesStart<'_>) -> Result<PainVersion, LastschriftError> {
    let ns = attribute(e, "xmlns")
        .ok_or_else(|| LastschriftError::Xml("Document has no default namespace".into()))?;
    PainVersion::from_namespace(&ns)
        .ok_or_else(|| LastschriftError::Xml(format!("unsupported pain.008 namespace '{ns}'")))
}

fn parse_decimal(field: &str, text: &str) -> Result<Decimal, LastschriftError> {
    Decimal::from_str(text)
        .map_err(|e| LastschriftError::Xml(format!("invalid amount in {field}: '{text}' ({e})")))
}

fn parse_count(field: &str, text: &str) -> Result<usize, LastschriftError> {
    text.parse()
        .map_err(|_| LastschriftError::Xml(format!("invalid count in {field}: '{text}'")))
}

fn parse_date(field: &str, text: &str) -> Result<NaiveDate, LastschriftError> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| LastschriftError::Xml(format!("invalid date in {field}: '{text}' ({e})")))
}

/// True if `path` ends with the elements of `suffix`.
fn ends_with(path: &[String], suffix: &[&str]) -> bool {
    path.len() >= suffix.len()
        && path[path.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(a, b)| a == b)
}

fn is_bic(path: &[String], agent: &str) -> bool {
    ends_with(path, &[agent, "FinInstnId", "BIC"]) || ends_with(path, &[agent, "FinInstnId", "BICFI"])
}

#[derive(Default)]
struct ParsedDocument {
    version: Option<PainVersion>,
    message_id: Option<String>,
    created_at: Option<String>,
    number_of_transactions: Option<usize>,
    control_sum: Option<Decimal>,
    initiating_party_name: Option<String>,
    payment_infos: Vec<PaymentInfoSummary>,
    current_info: Option<PaymentInfoSummary>,
    current_tx: Option<TransactionSummary>,
}

impl ParsedDocument {
    fn handle_text(&mut self, path: &[String], text: &str) -> Result<(), LastschriftError> {
        if let Some(tx) = self.current_tx.as_mut() {
            return handle_transaction_text(tx, path, text);
        }
        if let Some(info) = self.current_info.as_mut() {
            return handle_payment_info_text(info, path, text);
        }

        if ends_with(path, &["GrpHdr", "MsgId"]) {
            self.message_id = Some(text.to_string());
        } else if ends_with(path, &["GrpHdr", "CreDtTm"]) {
            self.created_at = Some(text.to_string());
        } else if ends_with(path, &["GrpHdr", "NbOfTxs"]) {
            self.number_of_transactions = Some(parse_count("GrpHdr/NbOfTxs", text)?);
        } else if ends_with(path, &["GrpHdr", "CtrlSum"]) {
            self.control_sum = Some(parse_decimal("GrpHdr/CtrlSum", text)?);
        } else if ends_with(path, &["GrpHdr", "InitgPty", "Nm"]) {
            self.initiating_party_name = Some(text.to_string());
        }
        Ok(())
    }

    fn into_summary(self) -> Result<Pain008Summary, LastschriftError> {
        let version = self
            .version
            .ok_or_else(|| LastschriftError::Xml("not a pain.008 Document".into()))?;
        let message_id = self
            .message_id
            .ok_or_else(|| LastschriftError::Xml("missing GrpHdr/MsgId".into()))?;
        Ok(Pain008Summary {
            version,
            message_id,
            created_at: self.created_at.unwrap_or_default(),
            number_of_transactions: self.number_of_transactions.unwrap_or_default(),
            control_sum: self.control_sum.unwrap_or_default(),
            initiating_party_name: self.initiating_party_name.unwrap_or_default(),
            payment_infos: self.payment_infos,
        })
    }
}

fn handle_payment_info_text(
    info: &mut PaymentInfoSummary,
    path: &[String],
    text: &str,
) -> Result<(), LastschriftError> {
    let leaf = path.last().map(|s| s.as_str()).unwrap_or("");
    let parent = if path.len() >= 2 {
        path[path.len() - 2].as_str()
    } else {
        ""
    };

    match (parent, leaf) {
        ("PmtInf", "PmtInfId") => info.id = text.to_string(),
        ("PmtInf", "PmtMtd") => info.method = text.to_string(),
        ("PmtInf", "BtchBookg") => info.batch_booking = text == "true",
        ("PmtInf", "NbOfTxs") => info.number_of_transactions = parse_count("PmtInf/NbOfTxs", text)?,
        ("PmtInf", "CtrlSum") => info.control_sum = parse_decimal("PmtInf/CtrlSum", text)?,
        ("PmtInf", "ReqdColltnDt") => {
            info.collection_date = Some(parse_date("PmtInf/ReqdColltnDt", text)?)
        }
        ("PmtInf", "ChrgBr") => info.charge_bearer = Some(text.to_string()),
        ("SvcLvl", "Cd") => info.service_level = Some(text.to_string()),
        ("LclInstrm", "Cd") => info.local_instrument = Some(text.to_string()),
        ("PmtTpInf", "SeqTp") => info.sequence_type = SequenceType::from_code(text),
        ("Cdtr", "Nm") => info.creditor_name = text.to_string(),
        ("Id", "IBAN") if ends_with(path, &["CdtrAcct", "Id", "IBAN"]) => {
            info.creditor_iban = text.to_string()
        }
        (_, "BIC" | "BICFI") if is_bic(path, "CdtrAgt") => info.creditor_bic = Some(text.to_string()),
        ("Othr", "Id") if ends_with(path, &["CdtrSchmeId", "Id", "PrvtId", "Othr", "Id"]) => {
            info.creditor_scheme_id = Some(text.to_string())
        }
        _ => {}
    }
    Ok(())
}

fn handle_transaction_text(
    tx: &mut TransactionSummary,
    path: &[String],
    text: &str,
) -> Result<(), LastschriftError> {
    let leaf = path.last().map(|s| s.as_str()).unwrap_or("");
    let parent = if path.len() >= 2 {
        path[path.len() - 2].as_str()
    } else {
        ""
    };

    match (parent, leaf) {
        ("PmtId", "InstrId") => tx.instruction_id = text.to_string(),
        ("PmtId", "EndToEndId") => tx.end_to_end_id = text.to_string(),
        (_, "InstdAmt") => tx.amount = parse_decimal("InstdAmt", text)?,
        ("MndtRltdInf", "MndtId") => tx.mandate_reference = text.to_string(),
        ("MndtRltdInf", "DtOfSgntr") => {
            tx.signature_date = Some(parse_date("MndtRltdInf/DtOfSgntr", text)?)
        }
        ("MndtRltdInf", "AmdmntInd") => tx.amendment = text == "true",
        ("Dbtr", "Nm") => tx.debtor_name = text.to_string(),
        ("Id", "IBAN") if ends_with(path, &["DbtrAcct", "Id", "IBAN"]) => {
            tx.debtor_iban = text.to_string()
        }
        (_, "BIC" | "BICFI") if is_bic(path, "DbtrAgt") => tx.debtor_bic = Some(text.to_string()),
        ("RmtInf", "Ustrd") | ("CdtrRefInf", "Ref") => tx.remittance = Some(text.to_string()),
        _ => {}
    }
    Ok(())
}
