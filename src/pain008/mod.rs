//! SEPA Direct Debit initiation files (ISO 20022 pain.008).
//!
//! # Supported versions
//!
//! - **pain.008.001.02**: EPC SEPA Core / B2B (`BIC`, names up to 70)
//! - **pain.008.003.02**: German DK variant, SEPA character set only
//! - **pain.008.001.03** / **pain.008.001.04**: `BICFI`, names up to 140
//!
//! The version is part of the payment mode configuration and travels in
//! [`CollectionOrder::version`]; nothing here picks a default.
//!
//! # Example
//!
//! ```no_run
//! use lastschrift::pain008;
//!
//! let order: pain008::CollectionOrder = todo!(); // usually Registry::collection_order
//! let now = chrono::Local::now().naive_local();
//! let xml = pain008::to_pain008_xml(&order, now).unwrap();
//! let summary = pain008::read_pain008(&xml).unwrap();
//! assert_eq!(summary.message_id, order.message_id);
//! ```

pub mod charset;
mod dialect;
mod generate;
mod model;
mod read;
mod validate;
pub(crate) mod xml_utils;

pub use dialect::{NOT_PROVIDED, XSI_NAMESPACE};
pub use generate::{MAX_REMITTANCE_LEN, to_pain008_xml};
pub use model::{Collection, CollectionOrder, Creditor, InitiatingParty, Remittance};
pub use read::{PaymentInfoSummary, Pain008Summary, TransactionSummary, read_pain008};
pub use validate::{MAX_ID_LEN, validate_for_generation};
pub use xml_utils::format_amount;
