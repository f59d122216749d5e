//! Payment orders: payment lines, bank payment lines and the order lifecycle.
//!
//! A [`Registry`] owns all records. Invoices become payment lines with
//! [`Registry::create_account_payment_line`]; the order then moves through
//! [`Registry::draft2open`], `open2generated` (with the `pain008` feature)
//! and [`Registry::generated2uploaded`].

mod attachment;
mod bank_line;
mod line;
mod payment_order;
mod registry;
mod state;

pub use attachment::Attachment;
pub use bank_line::{BankPaymentLine, GroupingKey, group_payment_lines};
pub use line::{CommunicationType, PaymentLine};
pub use payment_order::PaymentOrder;
pub use registry::Registry;
pub use state::PaymentOrderState;
