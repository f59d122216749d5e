//! Core types: companies, bank accounts, mandates, invoices, payment modes.
//!
//! These are the collaborators a payment order is built from. Every record
//! carries the [`CompanyId`] it belongs to.

mod bank;
mod builder;
mod error;
mod mandate;
mod numbering;
mod payment_mode;
mod types;

pub use bank::*;
pub use builder::*;
pub use error::*;
pub use mandate::*;
pub use numbering::*;
pub use payment_mode::*;
pub use types::*;
