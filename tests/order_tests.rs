//! Payment line creation, grouping and the order lifecycle without file generation.
//!
//! Run with: `cargo test --test order_tests`

#![cfg(feature = "core")]

use chrono::NaiveDate;
use lastschrift::core::*;
use lastschrift::order::*;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 6, 15)
}

struct Fixture {
    reg: Registry,
    company: CompanyId,
    mode: PaymentModeId,
    agrolait_bank: BankAccountId,
    first_mandate: MandateId,
    oneoff_mandate: MandateId,
}

fn fixture() -> Fixture {
    fixture_with(|m| m)
}

fn fixture_with(mode: impl FnOnce(PaymentModeBuilder) -> PaymentModeBuilder) -> Fixture {
    let mut reg = Registry::new();
    let company = reg.add_company(
        CompanyBuilder::new("Test EUR company", "FR")
            .sepa_creditor_identifier("FR78ZZZ424242")
            .build()
            .unwrap(),
    );
    let own = reg
        .add_bank_account(
            BankAccount::new(company, "Test EUR company", "FR76 3000 4000 0312 3456 7890 143")
                .with_bic("PSSTFRPPXXX"),
        )
        .unwrap();
    let journal = reg
        .add_journal(Journal {
            company_id: company,
            name: "Company Bank journal".into(),
            code: "BNK1".into(),
            bank_account_id: own,
        })
        .unwrap();
    let mode = reg
        .add_payment_mode(
            mode(
                PaymentModeBuilder::sepa_direct_debit(
                    company,
                    "SEPA Direct Debit",
                    PainVersion::Pain00800102,
                )
                .fixed_journal(journal),
            )
            .build()
            .unwrap(),
        )
        .unwrap();

    let agrolait_bank = reg
        .add_bank_account(
            BankAccount::new(company, "Agrolait", "DE89 3704 0044 0532 0130 00").with_bic("COBADEFFXXX"),
        )
        .unwrap();
    let first_mandate = reg
        .add_mandate(
            MandateBuilder::new(company, "BMTEST1", agrolait_bank)
                .signed_on(date(2024, 1, 10))
                .valid()
                .build()
                .unwrap(),
        )
        .unwrap();

    let camptocamp_bank = reg
        .add_bank_account(BankAccount::new(company, "Camptocamp", "BE68 5390 0754 7034"))
        .unwrap();
    let oneoff_mandate = reg
        .add_mandate(
            MandateBuilder::new(company, "BMTEST2", camptocamp_bank)
                .one_off()
                .signed_on(date(2024, 2, 1))
                .valid()
                .build()
                .unwrap(),
        )
        .unwrap();

    Fixture {
        reg,
        company,
        mode,
        agrolait_bank,
        first_mandate,
        oneoff_mandate,
    }
}

impl Fixture {
    fn invoice(&mut self, number: &str, partner: &str, mandate: MandateId, amount: rust_decimal::Decimal) -> InvoiceId {
        self.reg
            .add_invoice(
                InvoiceBuilder::new(self.company, number, partner, today(), amount)
                    .payment_mode(self.mode)
                    .mandate(mandate)
                    .posted()
                    .build()
                    .unwrap(),
            )
            .unwrap()
    }

    fn two_invoices(&mut self) -> (InvoiceId, InvoiceId) {
        let a = self.invoice("INV/2024/0001", "Agrolait", self.first_mandate, dec!(42.0));
        let b = self.invoice("INV/2024/0002", "Camptocamp", self.oneoff_mandate, dec!(11.0));
        (a, b)
    }
}

// --- create_account_payment_line ---

#[test]
fn payment_line_for_valid_invoice() {
    let mut f = fixture();
    let (inv, _) = f.two_invoices();
    let order_id = f.reg.create_account_payment_line(f.company, inv).unwrap();

    let order = f.reg.order(order_id).unwrap();
    assert_eq!(order.name, "PAY0001");
    assert_eq!(order.payment_type, PaymentType::Inbound);
    assert_eq!(order.state(), PaymentOrderState::Draft);
    assert!(order.journal_id.is_some());
    assert_eq!(order.payment_lines().len(), 1);

    let line = &order.payment_lines()[0];
    assert_eq!(line.amount_currency, dec!(42.0));
    assert_eq!(line.mandate_id, f.first_mandate);
    assert_eq!(line.partner_bank_id, f.agrolait_bank);
    assert_eq!(line.communication, "INV/2024/0001");
    assert_eq!(line.communication_type, CommunicationType::Normal);
    assert_eq!(line.date, today());
}

#[test]
fn invoices_of_one_mode_share_the_draft_order() {
    let mut f = fixture();
    let (a, b) = f.two_invoices();
    let first = f.reg.create_account_payment_line(f.company, a).unwrap();
    let second = f.reg.create_account_payment_line(f.company, b).unwrap();
    assert_eq!(first, second);
    assert_eq!(f.reg.order(first).unwrap().payment_lines().len(), 2);
    assert_eq!(f.reg.order(first).unwrap().total_amount(), dec!(53));
    assert_eq!(f.reg.orders(f.company).count(), 1);
}

#[test]
fn draft_invoice_is_rejected() {
    let mut f = fixture();
    let inv = f
        .reg
        .add_invoice(
            InvoiceBuilder::new(f.company, "INV/2024/0003", "Agrolait", today(), dec!(10))
                .payment_mode(f.mode)
                .mandate(f.first_mandate)
                .build()
                .unwrap(),
        )
        .unwrap();
    let err = f.reg.create_account_payment_line(f.company, inv).unwrap_err();
    assert!(matches!(err, LastschriftError::Validation(_)));

    f.reg.post_invoice(f.company, inv).unwrap();
    f.reg.create_account_payment_line(f.company, inv).unwrap();
}

#[test]
fn draft_mandate_is_rejected() {
    let mut f = fixture();
    let draft = f
        .reg
        .add_mandate(
            MandateBuilder::new(f.company, "BMTEST3", f.agrolait_bank)
                .signed_on(date(2024, 3, 1))
                .build()
                .unwrap(),
        )
        .unwrap();
    let inv = f.invoice("INV/2024/0004", "Agrolait", draft, dec!(5));
    let err = f.reg.create_account_payment_line(f.company, inv).unwrap_err();
    assert!(err.to_string().contains("not valid"), "{err}");
    assert_eq!(f.reg.orders(f.company).count(), 0);

    f.reg.validate_mandate(f.company, draft).unwrap();
    f.reg.create_account_payment_line(f.company, inv).unwrap();
}

#[test]
fn invoice_without_mandate_is_rejected() {
    let mut f = fixture();
    let inv = f
        .reg
        .add_invoice(
            InvoiceBuilder::new(f.company, "INV/2024/0005", "Agrolait", today(), dec!(5))
                .payment_mode(f.mode)
                .posted()
                .build()
                .unwrap(),
        )
        .unwrap();
    assert!(f.reg.create_account_payment_line(f.company, inv).is_err());
}

#[test]
fn invoice_cannot_be_added_twice() {
    let mut f = fixture();
    let (a, _) = f.two_invoices();
    f.reg.create_account_payment_line(f.company, a).unwrap();
    let err = f.reg.create_account_payment_line(f.company, a).unwrap_err();
    assert!(err.to_string().contains("already on payment order PAY0001"), "{err}");
}

#[test]
fn payment_type_must_match_invoice_kind() {
    let mut f = fixture_with(|m| m.payment_type(PaymentType::Outbound));
    let (a, _) = f.two_invoices();
    let err = f.reg.create_account_payment_line(f.company, a).unwrap_err();
    assert!(matches!(err, LastschriftError::Validation(_)));
}

#[test]
fn other_company_is_rejected() {
    let mut f = fixture();
    let (a, _) = f.two_invoices();
    let other = f
        .reg
        .add_company(CompanyBuilder::new("Other company", "DE").build().unwrap());
    let err = f.reg.create_account_payment_line(other, a).unwrap_err();
    assert!(err.to_string().contains("belongs to company"), "{err}");
}

#[test]
fn mandate_reference_is_unique_per_company() {
    let mut f = fixture();
    let dup = MandateBuilder::new(f.company, "BMTEST1", f.agrolait_bank)
        .build()
        .unwrap();
    assert!(f.reg.add_mandate(dup).is_err());
}

// --- draft2open ---

#[test]
fn open_groups_one_bank_line_per_debtor() {
    let mut f = fixture();
    let (a, b) = f.two_invoices();
    let order_id = f.reg.create_account_payment_line(f.company, a).unwrap();
    f.reg.create_account_payment_line(f.company, b).unwrap();

    f.reg.draft2open(f.company, order_id, today()).unwrap();

    let order = f.reg.order(order_id).unwrap();
    assert_eq!(order.state(), PaymentOrderState::Open);
    assert!(order.sepa);
    assert_eq!(order.bank_lines().len(), 2);
    for (bank_line, line) in order.bank_lines().iter().zip(order.payment_lines()) {
        assert_eq!(bank_line.currency_code, line.currency_code);
        assert_eq!(bank_line.communication, line.communication);
        assert_eq!(bank_line.amount_currency, line.amount_currency);
    }
    assert_eq!(order.bank_lines()[0].name, "PAY0001-1");
    assert_eq!(order.bank_lines()[1].name, "PAY0001-2");
}

#[test]
fn same_reference_is_merged() {
    let mut f = fixture();
    let mut ids = Vec::new();
    for (number, amount) in [("INV/2024/0010", dec!(30)), ("INV/2024/0011", dec!(12.5))] {
        ids.push(
            f.reg
                .add_invoice(
                    InvoiceBuilder::new(f.company, number, "Agrolait", today(), amount)
                        .payment_reference("SUBSCRIPTION 2024-06")
                        .payment_mode(f.mode)
                        .mandate(f.first_mandate)
                        .posted()
                        .build()
                        .unwrap(),
                )
                .unwrap(),
        );
    }
    let order_id = f.reg.create_account_payment_line(f.company, ids[0]).unwrap();
    f.reg.create_account_payment_line(f.company, ids[1]).unwrap();
    f.reg.draft2open(f.company, order_id, today()).unwrap();

    let bank_lines = f.reg.order(order_id).unwrap().bank_lines();
    assert_eq!(bank_lines.len(), 1);
    assert_eq!(bank_lines[0].amount_currency, dec!(42.5));
    assert_eq!(bank_lines[0].invoice_ids, ids);
}

#[test]
fn grouping_can_be_disabled() {
    let mut f = fixture_with(|m| m.group_lines(false));
    let mut ids = Vec::new();
    for number in ["INV/2024/0020", "INV/2024/0021"] {
        ids.push(
            f.reg
                .add_invoice(
                    InvoiceBuilder::new(f.company, number, "Agrolait", today(), dec!(10))
                        .payment_reference("SAME")
                        .payment_mode(f.mode)
                        .mandate(f.first_mandate)
                        .posted()
                        .build()
                        .unwrap(),
                )
                .unwrap(),
        );
    }
    let order_id = f.reg.create_account_payment_line(f.company, ids[0]).unwrap();
    f.reg.create_account_payment_line(f.company, ids[1]).unwrap();
    f.reg.draft2open(f.company, order_id, today()).unwrap();
    assert_eq!(f.reg.order(order_id).unwrap().bank_lines().len(), 2);
}

#[test]
fn conflicting_mandates_leave_order_in_draft() {
    let mut f = fixture();
    let second = f
        .reg
        .add_mandate(
            MandateBuilder::new(f.company, "BMTEST9", f.agrolait_bank)
                .signed_on(date(2024, 3, 1))
                .valid()
                .build()
                .unwrap(),
        )
        .unwrap();
    let mut ids = Vec::new();
    for (number, mandate) in [("INV/2024/0030", f.first_mandate), ("INV/2024/0031", second)] {
        ids.push(
            f.reg
                .add_invoice(
                    InvoiceBuilder::new(f.company, number, "Agrolait", today(), dec!(10))
                        .payment_reference("SAME")
                        .payment_mode(f.mode)
                        .mandate(mandate)
                        .posted()
                        .build()
                        .unwrap(),
                )
                .unwrap(),
        );
    }
    let order_id = f.reg.create_account_payment_line(f.company, ids[0]).unwrap();
    f.reg.create_account_payment_line(f.company, ids[1]).unwrap();

    let err = f.reg.draft2open(f.company, order_id, today()).unwrap_err();
    assert!(matches!(err, LastschriftError::InconsistentGroup(_)));
    let order = f.reg.order(order_id).unwrap();
    assert_eq!(order.state(), PaymentOrderState::Draft);
    assert!(order.bank_lines().is_empty());
}

#[test]
fn cancelled_mandate_blocks_opening() {
    let mut f = fixture();
    let (a, _) = f.two_invoices();
    let order_id = f.reg.create_account_payment_line(f.company, a).unwrap();
    f.reg.cancel_mandate(f.company, f.first_mandate).unwrap();

    let err = f.reg.draft2open(f.company, order_id, today()).unwrap_err();
    assert!(matches!(err, LastschriftError::Validation(_)));
    assert_eq!(f.reg.order(order_id).unwrap().state(), PaymentOrderState::Draft);
}

#[test]
fn non_euro_order_is_not_sepa() {
    let mut f = fixture();
    let inv = f
        .reg
        .add_invoice(
            InvoiceBuilder::new(f.company, "INV/2024/0040", "Agrolait", today(), dec!(10))
                .currency("USD")
                .payment_mode(f.mode)
                .mandate(f.first_mandate)
                .posted()
                .build()
                .unwrap(),
        )
        .unwrap();
    let order_id = f.reg.create_account_payment_line(f.company, inv).unwrap();
    f.reg.draft2open(f.company, order_id, today()).unwrap();
    assert!(!f.reg.order(order_id).unwrap().sepa);
}

#[test]
fn collection_dates_follow_the_date_policy() {
    let cases = [
        (DatePrefered::Due, None, date(2024, 7, 1), date(2024, 7, 1)),
        (DatePrefered::Due, None, date(2024, 6, 1), today()),
        (DatePrefered::Now, None, date(2024, 7, 1), today()),
        (DatePrefered::Fixed, Some(date(2024, 6, 20)), date(2024, 7, 1), date(2024, 6, 20)),
        (DatePrefered::Fixed, Some(date(2024, 6, 1)), date(2024, 7, 1), today()),
    ];
    for (pref, scheduled, due, expected) in cases {
        let mut f = fixture();
        let inv = f
            .reg
            .add_invoice(
                InvoiceBuilder::new(f.company, "INV/2024/0050", "Agrolait", date(2024, 6, 1), dec!(10))
                    .due_date(due)
                    .payment_mode(f.mode)
                    .mandate(f.first_mandate)
                    .posted()
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let order_id = f.reg.create_account_payment_line(f.company, inv).unwrap();
        f.reg
            .set_date_prefered(f.company, order_id, pref, scheduled)
            .unwrap();
        f.reg.draft2open(f.company, order_id, today()).unwrap();
        let order = f.reg.order(order_id).unwrap();
        assert_eq!(order.bank_lines()[0].date, expected, "{pref:?} due {due}");
    }
}

#[test]
fn fixed_date_needs_a_schedule() {
    let mut f = fixture();
    let (a, _) = f.two_invoices();
    let order_id = f.reg.create_account_payment_line(f.company, a).unwrap();
    assert!(
        f.reg
            .set_date_prefered(f.company, order_id, DatePrefered::Fixed, None)
            .is_err()
    );
}

// --- monotonicity ---

#[test]
fn transitions_cannot_be_skipped_or_repeated() {
    let mut f = fixture();
    let (a, _) = f.two_invoices();
    let order_id = f.reg.create_account_payment_line(f.company, a).unwrap();

    assert!(f.reg.generated2uploaded(f.company, order_id, today()).is_err());
    f.reg.draft2open(f.company, order_id, today()).unwrap();
    assert!(f.reg.draft2open(f.company, order_id, today()).is_err());
    assert!(f.reg.generated2uploaded(f.company, order_id, today()).is_err());
    assert_eq!(f.reg.order(order_id).unwrap().state(), PaymentOrderState::Open);
}

#[test]
fn open_order_is_frozen() {
    let mut f = fixture();
    let (a, b) = f.two_invoices();
    let order_id = f.reg.create_account_payment_line(f.company, a).unwrap();
    f.reg.draft2open(f.company, order_id, today()).unwrap();

    assert!(
        f.reg
            .set_date_prefered(f.company, order_id, DatePrefered::Now, None)
            .is_err()
    );
    // A new line goes to a fresh draft order.
    let next = f.reg.create_account_payment_line(f.company, b).unwrap();
    assert_ne!(next, order_id);
    assert_eq!(f.reg.order(next).unwrap().name, "PAY0002");
    assert_eq!(f.reg.order(order_id).unwrap().payment_lines().len(), 1);
}
