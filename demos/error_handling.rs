//! What goes wrong, and how it is reported.
//!
//! Run with: `cargo run --example error_handling --features pain008`

use chrono::NaiveDate;
use lastschrift::core::*;
use lastschrift::pain008::{self, Collection, CollectionOrder, Creditor, InitiatingParty, Remittance};
use rust_decimal_macros::dec;

fn main() {
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();

    // ── 1. Builder errors ────────────────────────────────────────────
    println!("=== Builder Errors ===");
    match CompanyBuilder::new("ACME SAS", "FR")
        .sepa_creditor_identifier("FR79ZZZ424242")
        .build()
    {
        Ok(_) => println!("  Company built (unexpected)"),
        Err(e) => println!("  Company rejected: {e}"),
    }
    match MandateBuilder::new(CompanyId(1), "BM-0001", BankAccountId(1))
        .valid()
        .build()
    {
        Ok(_) => println!("  Mandate built (unexpected)"),
        Err(e) => println!("  Mandate rejected: {e}"),
    }

    // ── 2. Pre-generation checks collect every problem ───────────────
    println!("\n=== Generation Checks ===");
    let order = CollectionOrder {
        message_id: "PAY0001".into(),
        version: PainVersion::Pain00800102,
        initiating_party: InitiatingParty {
            name: "ACME SAS".into(),
            identifier: None,
            issuer: None,
        },
        creditor: Creditor {
            name: "ACME SAS".into(),
            iban: "FR7630004000031234567890143".into(),
            bic: Some("PSSTFRPP".into()),
            scheme_identifier: None,
        },
        sepa: true,
        batch_booking: true,
        convert_to_ascii: false,
        collections: vec![Collection {
            instruction_id: "PAY0001-1".into(),
            end_to_end_id: "PAY0001-1".into(),
            amount: dec!(42),
            currency_code: "USD".into(),
            collection_date: date(2024, 6, 20),
            sequence_type: SequenceType::First,
            scheme: MandateScheme::Core,
            mandate_reference: "BM-0001".into(),
            signature_date: None,
            amendment: false,
            debtor_name: "Jane Doe".into(),
            debtor_iban: "DE89370400440532013001".into(),
            debtor_bic: None,
            remittance: Remittance::Unstructured("INV/2024/0001".into()),
        }],
    };
    let errors = pain008::validate_for_generation(&order);
    println!("  Found {} problems:", errors.len());
    for e in &errors {
        println!("  - {e}");
    }
    let at = date(2024, 6, 15).and_hms_opt(9, 0, 0).unwrap();
    match pain008::to_pain008_xml(&order, at) {
        Ok(_) => println!("  Generated (unexpected)"),
        Err(e) => println!("  Generation refused: {e}"),
    }

    // ── 3. Reading foreign documents ─────────────────────────────────
    println!("\n=== Read Errors ===");
    let foreign = r#"<Document xmlns="urn:iso:std:iso:20022:tech:xsd:pain.001.001.03"><CstmrCdtTrfInitn/></Document>"#;
    match pain008::read_pain008(foreign) {
        Ok(_) => println!("  Parsed (unexpected)"),
        Err(e) => println!("  Parse error: {e}"),
    }
    match "pain.008.001.08".parse::<PainVersion>() {
        Ok(v) => println!("  Version {v} (unexpected)"),
        Err(e) => println!("  Config error: {e}"),
    }
}
