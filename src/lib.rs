//! # lastschrift
//!
//! SEPA Direct Debit payment orders: mandates, payment lines, bank payment
//! lines, the payment order lifecycle and ISO 20022 pain.008 files.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! Collection files follow the EPC SEPA Direct Debit rulebooks (Core and
//! B2B) in four pain.008 schema versions.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use lastschrift::core::*;
//! use lastschrift::order::Registry;
//! use rust_decimal_macros::dec;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
//! let mut reg = Registry::new();
//! let company = reg.add_company(
//!     CompanyBuilder::new("ACME SAS", "FR")
//!         .sepa_creditor_identifier("FR78ZZZ424242")
//!         .build()
//!         .unwrap(),
//! );
//! let own = reg
//!     .add_bank_account(BankAccount::new(company, "ACME SAS", "FR76 3000 4000 0312 3456 7890 143"))
//!     .unwrap();
//! let journal = reg
//!     .add_journal(Journal { company_id: company, name: "Bank".into(), code: "BNK1".into(), bank_account_id: own })
//!     .unwrap();
//! let mode = reg
//!     .add_payment_mode(
//!         PaymentModeBuilder::sepa_direct_debit(company, "SDD", PainVersion::Pain00800102)
//!             .fixed_journal(journal)
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//! let debtor = reg
//!     .add_bank_account(BankAccount::new(company, "Jane Doe", "DE89 3704 0044 0532 0130 00"))
//!     .unwrap();
//! let mandate = reg
//!     .add_mandate(MandateBuilder::new(company, "BM-0001", debtor).signed_on(today).valid().build().unwrap())
//!     .unwrap();
//! let invoice = reg
//!     .add_invoice(
//!         InvoiceBuilder::new(company, "INV/2024/0001", "Jane Doe", today, dec!(42))
//!             .payment_mode(mode)
//!             .mandate(mandate)
//!             .posted()
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let order = reg.create_account_payment_line(company, invoice).unwrap();
//! reg.draft2open(company, order, today).unwrap();
//! assert!(reg.order(order).unwrap().sepa);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Records, payment orders, grouping, lifecycle |
//! | `pain008` | pain.008 generation and reading, `open2generated` |
//! | `json` | Payment mode configuration from JSON |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod order;

#[cfg(feature = "pain008")]
pub mod pain008;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
