//! Collect two invoices by SEPA direct debit and print the pain.008 file.
//!
//! Run with: `RUST_LOG=debug cargo run --example direct_debit --features pain008`

use chrono::NaiveDate;
use lastschrift::core::*;
use lastschrift::order::Registry;
use lastschrift::pain008;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), LastschriftError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    let mut reg = Registry::new();

    // ── 1. Creditor side ─────────────────────────────────────────────
    let company = reg.add_company(
        CompanyBuilder::new("Bäckerei Müller GmbH", "DE")
            .sepa_creditor_identifier("DE98ZZZ09999999999")
            .build()?,
    );
    let own = reg.add_bank_account(
        BankAccount::new(company, "Bäckerei Müller GmbH", "DE89 3704 0044 0532 0130 00")
            .with_bic("COBADEFFXXX"),
    )?;
    let journal = reg.add_journal(Journal {
        company_id: company,
        name: "Commerzbank".into(),
        code: "CBK".into(),
        bank_account_id: own,
    })?;
    let mode = reg.add_payment_mode(
        PaymentModeBuilder::sepa_direct_debit(company, "Lastschrift (DK)", PainVersion::Pain00800302)
            .fixed_journal(journal)
            .build()?,
    )?;

    // ── 2. Debtors and their mandates ────────────────────────────────
    let anna = reg.add_bank_account(BankAccount::new(company, "Anna Schäfer", "AT61 1904 3002 3457 3201"))?;
    let anna_mandate = reg.add_mandate(
        MandateBuilder::new(company, "MUELLER-0001", anna)
            .signed_on(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .valid()
            .build()?,
    )?;
    let bistro = reg.add_bank_account(
        BankAccount::new(company, "Bistro Léon", "NL91 ABNA 0417 1643 00").with_bic("ABNANL2A"),
    )?;
    let bistro_mandate = reg.add_mandate(
        MandateBuilder::new(company, "MUELLER-0002", bistro)
            .scheme(MandateScheme::B2b)
            .one_off()
            .signed_on(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap())
            .valid()
            .build()?,
    )?;

    // ── 3. Invoices → payment order ──────────────────────────────────
    let mut order = None;
    for (number, partner, mandate, amount) in [
        ("RE-2024-0101", "Anna Schäfer", anna_mandate, dec!(42.00)),
        ("RE-2024-0102", "Bistro Léon", bistro_mandate, dec!(318.40)),
    ] {
        let invoice = reg.add_invoice(
            InvoiceBuilder::new(company, number, partner, today, amount)
                .due_date(NaiveDate::from_ymd_opt(2024, 6, 25).unwrap())
                .payment_mode(mode)
                .mandate(mandate)
                .posted()
                .build()?,
        )?;
        order = Some(reg.create_account_payment_line(company, invoice)?);
    }
    let order = order.ok_or_else(|| LastschriftError::Validation("no order created".into()))?;

    // ── 4. Lifecycle ─────────────────────────────────────────────────
    reg.draft2open(company, order, today)?;
    let attachment = reg.open2generated(company, order, today.and_hms_opt(8, 0, 0).unwrap())?;
    let file = reg
        .attachment(attachment)
        .ok_or_else(|| LastschriftError::Validation("attachment missing".into()))?;
    println!("{} ({} bytes, sha256 {})", file.filename, file.len(), file.checksum());
    println!("{}", file.as_str().unwrap_or_default());

    let summary = pain008::read_pain008(file.as_str().unwrap_or_default())?;
    println!(
        "{}: {} transactions, {} EUR in {} blocks",
        summary.version,
        summary.number_of_transactions,
        summary.control_sum,
        summary.payment_infos.len()
    );

    reg.generated2uploaded(company, order, today)?;
    let m = reg.mandate(anna_mandate).map(|m| m.recurrent_sequence_type);
    println!("Anna's mandate is now {m:?}");
    Ok(())
}
