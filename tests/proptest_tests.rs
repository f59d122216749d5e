//! Property-based tests for grouping, control sums and account numbers.
//!
//! Run with: `cargo test --features all --test proptest_tests`

#![cfg(feature = "pain008")]

use chrono::NaiveDate;
use lastschrift::core::*;
use lastschrift::order::*;
use lastschrift::pain008::*;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const IBANS: [&str; 5] = [
    "DE89370400440532013000",
    "BE68539007547034",
    "NL91ABNA0417164300",
    "ES9121000418450200051332",
    "AT611904300234573201",
];

// ── Proptest Strategies ─────────────────────────────────────────────────────

/// Generate a collection amount (0.01 to 99999.99), sometimes with a third decimal.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        4 => (1u64..10_000_000u64).prop_map(|cents| Decimal::new(cents as i64, 2)),
        1 => (1u64..100_000_000u64).prop_map(|mills| Decimal::new(mills as i64, 3)),
    ]
}

/// Generate payment lines over a few debtors and communications.
///
/// Mandate and partner are derived from the debtor account so that
/// grouping never sees conflicting lines.
fn arb_lines() -> impl Strategy<Value = Vec<PaymentLine>> {
    prop::collection::vec((0u64..4, 0usize..3, arb_amount(), 1u32..28), 1..=20).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (bank, comm, amount, day))| PaymentLine {
                id: PaymentLineId(i as u64 + 1),
                company_id: CompanyId(1),
                invoice_id: InvoiceId(i as u64 + 100),
                mandate_id: MandateId(bank + 10),
                partner_bank_id: BankAccountId(bank),
                partner_name: format!("Debtor {bank}"),
                currency_code: "EUR".into(),
                amount_currency: amount,
                communication: format!("INV/2024/{comm:04}"),
                communication_type: CommunicationType::Normal,
                date: date(2024, 7, day),
            })
            .collect()
    })
}

fn arb_sequence_type() -> impl Strategy<Value = SequenceType> {
    prop_oneof![
        Just(SequenceType::First),
        Just(SequenceType::Recurring),
        Just(SequenceType::Final),
        Just(SequenceType::OneOff),
    ]
}

fn arb_version() -> impl Strategy<Value = PainVersion> {
    prop::sample::select(PainVersion::ALL.to_vec())
}

fn arb_collections() -> impl Strategy<Value = Vec<Collection>> {
    prop::collection::vec((arb_amount(), arb_sequence_type(), 0usize..5, 0u32..3), 1..=15).prop_map(
        |specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (amount, seq, debtor, day))| Collection {
                    instruction_id: format!("PAY0001-{}", i + 1),
                    end_to_end_id: format!("PAY0001-{}", i + 1),
                    amount,
                    currency_code: "EUR".into(),
                    collection_date: date(2024, 7, 1 + day),
                    sequence_type: seq,
                    scheme: MandateScheme::Core,
                    mandate_reference: format!("MANDATE-{debtor}"),
                    signature_date: Some(date(2024, 1, 10)),
                    amendment: false,
                    debtor_name: format!("Debtor {debtor}"),
                    debtor_iban: IBANS[debtor].into(),
                    debtor_bic: None,
                    remittance: Remittance::Unstructured(format!("INV/2024/{i:04}")),
                })
                .collect()
        },
    )
}

// ── Property Tests ──────────────────────────────────────────────────────────

proptest! {
    /// Grouping the same lines twice yields identical bank payment lines.
    #[test]
    fn grouping_is_idempotent(lines in arb_lines()) {
        let first = group_payment_lines("PAY0001", &lines, true).unwrap();
        let second = group_payment_lines("PAY0001", &lines, true).unwrap();
        prop_assert_eq!(&first, &second);
    }

    /// Grouping neither loses nor invents money or lines.
    #[test]
    fn grouping_preserves_totals(lines in arb_lines()) {
        let groups = group_payment_lines("PAY0001", &lines, true).unwrap();
        let line_total: Decimal = lines.iter().map(|l| l.amount_currency).sum();
        let group_total: Decimal = groups.iter().map(|g| g.amount_currency).sum();
        prop_assert_eq!(line_total, group_total);

        let grouped: usize = groups.iter().map(|g| g.payment_line_ids.len()).sum();
        prop_assert_eq!(grouped, lines.len());

        for g in &groups {
            let key_count = groups
                .iter()
                .filter(|o| o.partner_bank_id == g.partner_bank_id && o.communication == g.communication)
                .count();
            prop_assert_eq!(key_count, 1);
        }
    }

    /// Header and block control sums agree with the written transactions.
    #[test]
    fn control_sums_are_consistent(collections in arb_collections(), version in arb_version()) {
        let order = CollectionOrder {
            message_id: "PAY0001".into(),
            version,
            initiating_party: InitiatingParty {
                name: "Test EUR company".into(),
                identifier: None,
                issuer: None,
            },
            creditor: Creditor {
                name: "Test EUR company".into(),
                iban: "FR7630004000031234567890143".into(),
                bic: Some("PSSTFRPPXXX".into()),
                scheme_identifier: Some("FR78ZZZ424242".into()),
            },
            sepa: true,
            batch_booking: true,
            convert_to_ascii: false,
            collections,
        };
        let at = date(2024, 6, 15).and_hms_opt(12, 0, 0).unwrap();
        let sub_cent = order.collections.iter().any(|c| c.amount.normalize().scale() > 2);
        let result = to_pain008_xml(&order, at);
        if sub_cent {
            let err = result.unwrap_err();
            prop_assert!(err.to_string().contains("SDD-AMT"), "{}", err);
            return Ok(());
        }
        let xml = result.unwrap();
        let summary = read_pain008(&xml).unwrap();

        prop_assert_eq!(summary.number_of_transactions, order.collections.len());
        prop_assert_eq!(summary.control_sum, order.control_sum());
        prop_assert_eq!(summary.transactions().count(), order.collections.len());

        let mut total = Decimal::ZERO;
        for info in &summary.payment_infos {
            let block: Decimal = info.transactions.iter().map(|t| t.amount).sum();
            prop_assert_eq!(info.control_sum, block);
            prop_assert_eq!(info.number_of_transactions, info.transactions.len());
            prop_assert_eq!(info.method.as_str(), "DD");
            total += block;
        }
        prop_assert_eq!(total, summary.control_sum);
    }

    /// Spacing and case do not change what an IBAN is.
    #[test]
    fn iban_sanitation(idx in 0usize..5, spaces in prop::collection::vec(any::<bool>(), 34), lower in any::<bool>()) {
        let canonical = IBANS[idx];
        let mut entered = String::new();
        for (c, space) in canonical.chars().zip(spaces.iter()) {
            entered.push(if lower { c.to_ascii_lowercase() } else { c });
            if *space {
                entered.push(' ');
            }
        }
        prop_assert_eq!(sanitize_account_number(&entered), canonical);
        prop_assert!(is_valid_iban(&entered));

        let account = BankAccount::new(CompanyId(1), "Debtor", entered);
        prop_assert_eq!(account.account_kind(), AccountKind::Iban);
        prop_assert!(account.is_sepa_reachable());
    }

    /// Changing one digit breaks the IBAN check.
    #[test]
    fn iban_typo_is_detected(idx in 0usize..5, pos in 4usize..15, bump in 1u32..10) {
        let canonical = IBANS[idx];
        let mut chars: Vec<char> = canonical.chars().collect();
        prop_assume!(chars[pos].is_ascii_digit());
        let digit = chars[pos].to_digit(10).unwrap();
        chars[pos] = char::from_digit((digit + bump) % 10, 10).unwrap();
        let typo: String = chars.into_iter().collect();
        prop_assert!(!is_valid_iban(&typo));
    }
}
