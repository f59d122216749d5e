//! Grouping payment lines into bank payment lines.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::line::{CommunicationType, PaymentLine};
use crate::core::*;

/// One transfer instruction in the output file, backed by one or more payment lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankPaymentLine {
    /// `<order name>-<n>`, used as instruction and end-to-end id.
    pub name: String,
    pub company_id: CompanyId,
    pub payment_line_ids: Vec<PaymentLineId>,
    pub invoice_ids: Vec<InvoiceId>,
    pub mandate_id: MandateId,
    pub partner_bank_id: BankAccountId,
    pub partner_name: String,
    pub currency_code: String,
    /// Sum of the grouped payment lines.
    pub amount_currency: Decimal,
    pub communication: String,
    pub communication_type: CommunicationType,
    /// Earliest requested date among the grouped lines.
    pub date: NaiveDate,
}

/// Key under which payment lines are merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupingKey {
    pub partner_bank_id: BankAccountId,
    pub currency_code: String,
    pub communication: String,
    pub communication_type: CommunicationType,
}

impl GroupingKey {
    pub fn of(line: &PaymentLine) -> Self {
        Self {
            partner_bank_id: line.partner_bank_id,
            currency_code: line.currency_code.clone(),
            communication: line.communication.clone(),
            communication_type: line.communication_type,
        }
    }
}

/// Group payment lines into bank payment lines.
///
/// Groups keep the first-seen order of their lines. With `group_lines`
/// off every payment line gets its own bank payment line. Lines sharing a
/// key must agree on mandate and partner.
pub fn group_payment_lines(
    order_name: &str,
    lines: &[PaymentLine],
    group_lines: bool,
) -> Result<Vec<BankPaymentLine>, LastschriftError> {
    let mut groups: Vec<(GroupingKey, BankPaymentLine)> = Vec::new();

    for line in lines {
        let key = GroupingKey::of(line);
        let position = if group_lines {
            groups.iter().position(|(k, _)| *k == key)
        } else {
            None
        };

        match position {
            Some(i) => {
                let bank_line = &mut groups[i].1;
                if bank_line.mandate_id != line.mandate_id {
                    return Err(LastschriftError::InconsistentGroup(format!(
                        "payment lines for account {} and communication '{}' reference different mandates ({} and {})",
                        line.partner_bank_id, line.communication, bank_line.mandate_id, line.mandate_id
                    )));
                }
                if bank_line.partner_name != line.partner_name {
                    return Err(LastschriftError::InconsistentGroup(format!(
                        "payment lines for account {} belong to different partners ('{}' and '{}')",
                        line.partner_bank_id, bank_line.partner_name, line.partner_name
                    )));
                }
                bank_line.payment_line_ids.push(line.id);
                if !bank_line.invoice_ids.contains(&line.invoice_id) {
                    bank_line.invoice_ids.push(line.invoice_id);
                }
                bank_line.amount_currency += line.amount_currency;
                bank_line.date = bank_line.date.min(line.date);
            }
            None => {
                let bank_line = BankPaymentLine {
                    name: format!("{}-{}", order_name, groups.len() + 1),
                    company_id: line.company_id,
                    payment_line_ids: vec![line.id],
                    invoice_ids: vec![line.invoice_id],
                    mandate_id: line.mandate_id,
                    partner_bank_id: line.partner_bank_id,
                    partner_name: line.partner_name.clone(),
                    currency_code: line.currency_code.clone(),
                    amount_currency: line.amount_currency,
                    communication: line.communication.clone(),
                    communication_type: line.communication_type,
                    date: line.date,
                };
                groups.push((key, bank_line));
            }
        }
    }

    debug!(
        order = order_name,
        payment_lines = lines.len(),
        bank_lines = groups.len(),
        "grouped payment lines"
    );
    Ok(groups.into_iter().map(|(_, b)| b).collect())
}
