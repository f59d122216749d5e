//! In-memory store of all records and the payment order transitions.

use std::collections::BTreeMap;

use chrono::NaiveDate;
#[cfg(feature = "pain008")]
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::info;

use super::attachment::Attachment;
use super::bank_line::group_payment_lines;
use super::line::PaymentLine;
use super::payment_order::PaymentOrder;
use super::state::PaymentOrderState;
use crate::core::*;

/// Owner of every record a payment order touches.
///
/// All operations take the active company and reject records of other
/// companies. Transitions check everything first and then apply their
/// changes in one step, so a failed call leaves the registry untouched.
#[derive(Debug, Default)]
pub struct Registry {
    companies: BTreeMap<CompanyId, Company>,
    bank_accounts: BTreeMap<BankAccountId, BankAccount>,
    journals: BTreeMap<JournalId, Journal>,
    payment_modes: BTreeMap<PaymentModeId, PaymentMode>,
    mandates: BTreeMap<MandateId, Mandate>,
    invoices: BTreeMap<InvoiceId, Invoice>,
    orders: BTreeMap<PaymentOrderId, PaymentOrder>,
    attachments: BTreeMap<AttachmentId, Attachment>,
    last_id: u64,
    order_sequence: OrderSequence,
}

fn not_found(what: &str, id: impl std::fmt::Display) -> LastschriftError {
    LastschriftError::Validation(format!("{what} {id} does not exist"))
}

fn check_company(
    active: CompanyId,
    owner: CompanyId,
    what: &str,
    id: impl std::fmt::Display,
) -> Result<(), LastschriftError> {
    if active != owner {
        return Err(LastschriftError::Validation(format!(
            "{what} {id} belongs to company {owner}, not to company {active}"
        )));
    }
    Ok(())
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `sequence` for new payment order names.
    pub fn with_order_sequence(mut self, sequence: OrderSequence) -> Self {
        self.order_sequence = sequence;
        self
    }

    fn allocate(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    fn require_company(&self, id: CompanyId) -> Result<&Company, LastschriftError> {
        self.companies.get(&id).ok_or_else(|| not_found("company", id))
    }

    // -- records ------------------------------------------------------------

    pub fn add_company(&mut self, company: Company) -> CompanyId {
        let id = CompanyId(self.allocate());
        self.companies.insert(id, company);
        id
    }

    pub fn add_bank_account(&mut self, account: BankAccount) -> Result<BankAccountId, LastschriftError> {
        self.require_company(account.company_id)?;
        let id = BankAccountId(self.allocate());
        self.bank_accounts.insert(id, account);
        Ok(id)
    }

    pub fn add_journal(&mut self, journal: Journal) -> Result<JournalId, LastschriftError> {
        self.require_company(journal.company_id)?;
        let account = self
            .bank_accounts
            .get(&journal.bank_account_id)
            .ok_or_else(|| not_found("bank account", journal.bank_account_id))?;
        check_company(journal.company_id, account.company_id, "bank account", journal.bank_account_id)?;
        let id = JournalId(self.allocate());
        self.journals.insert(id, journal);
        Ok(id)
    }

    pub fn add_payment_mode(&mut self, mode: PaymentMode) -> Result<PaymentModeId, LastschriftError> {
        self.require_company(mode.company_id)?;
        if let Some(journal_id) = mode.fixed_journal_id {
            let journal = self
                .journals
                .get(&journal_id)
                .ok_or_else(|| not_found("journal", journal_id))?;
            check_company(mode.company_id, journal.company_id, "journal", journal_id)?;
        } else if mode.bank_account_link == BankAccountLink::Fixed {
            return Err(LastschriftError::Validation(format!(
                "payment mode '{}' links a fixed journal but none is set",
                mode.name
            )));
        }
        let id = PaymentModeId(self.allocate());
        self.payment_modes.insert(id, mode);
        Ok(id)
    }

    /// Register a mandate. References are unique per company.
    pub fn add_mandate(&mut self, mandate: Mandate) -> Result<MandateId, LastschriftError> {
        self.require_company(mandate.company_id)?;
        let account = self
            .bank_accounts
            .get(&mandate.partner_bank_id)
            .ok_or_else(|| not_found("bank account", mandate.partner_bank_id))?;
        check_company(mandate.company_id, account.company_id, "bank account", mandate.partner_bank_id)?;
        if self.mandates.values().any(|m| {
            m.company_id == mandate.company_id && m.unique_reference == mandate.unique_reference
        }) {
            return Err(LastschriftError::Validation(format!(
                "mandate reference '{}' is already used",
                mandate.unique_reference
            )));
        }
        let id = MandateId(self.allocate());
        self.mandates.insert(id, mandate);
        Ok(id)
    }

    pub fn add_invoice(&mut self, invoice: Invoice) -> Result<InvoiceId, LastschriftError> {
        self.require_company(invoice.company_id)?;
        if let Some(mode_id) = invoice.payment_mode_id {
            let mode = self
                .payment_modes
                .get(&mode_id)
                .ok_or_else(|| not_found("payment mode", mode_id))?;
            check_company(invoice.company_id, mode.company_id, "payment mode", mode_id)?;
        }
        if let Some(mandate_id) = invoice.mandate_id {
            let mandate = self
                .mandates
                .get(&mandate_id)
                .ok_or_else(|| not_found("mandate", mandate_id))?;
            check_company(invoice.company_id, mandate.company_id, "mandate", mandate_id)?;
        }
        let id = InvoiceId(self.allocate());
        self.invoices.insert(id, invoice);
        Ok(id)
    }

    pub fn company(&self, id: CompanyId) -> Option<&Company> {
        self.companies.get(&id)
    }

    pub fn bank_account(&self, id: BankAccountId) -> Option<&BankAccount> {
        self.bank_accounts.get(&id)
    }

    pub fn journal(&self, id: JournalId) -> Option<&Journal> {
        self.journals.get(&id)
    }

    pub fn payment_mode(&self, id: PaymentModeId) -> Option<&PaymentMode> {
        self.payment_modes.get(&id)
    }

    pub fn mandate(&self, id: MandateId) -> Option<&Mandate> {
        self.mandates.get(&id)
    }

    pub fn invoice(&self, id: InvoiceId) -> Option<&Invoice> {
        self.invoices.get(&id)
    }

    pub fn order(&self, id: PaymentOrderId) -> Option<&PaymentOrder> {
        self.orders.get(&id)
    }

    pub fn attachment(&self, id: AttachmentId) -> Option<&Attachment> {
        self.attachments.get(&id)
    }

    /// Payment orders of `company`, oldest first.
    pub fn orders(&self, company: CompanyId) -> impl Iterator<Item = (PaymentOrderId, &PaymentOrder)> {
        self.orders
            .iter()
            .filter(move |(_, o)| o.company_id == company)
            .map(|(id, o)| (*id, o))
    }

    /// Move a draft mandate to `valid`.
    pub fn validate_mandate(&mut self, company: CompanyId, id: MandateId) -> Result<(), LastschriftError> {
        let mandate = self.mandates.get_mut(&id).ok_or_else(|| not_found("mandate", id))?;
        check_company(company, mandate.company_id, "mandate", id)?;
        mandate.validate()
    }

    /// Cancel a mandate. Lines already created for it fail at `draft2open`.
    pub fn cancel_mandate(&mut self, company: CompanyId, id: MandateId) -> Result<(), LastschriftError> {
        let mandate = self.mandates.get_mut(&id).ok_or_else(|| not_found("mandate", id))?;
        check_company(company, mandate.company_id, "mandate", id)?;
        mandate.cancel()
    }

    pub fn post_invoice(&mut self, company: CompanyId, id: InvoiceId) -> Result<(), LastschriftError> {
        let invoice = self.invoices.get_mut(&id).ok_or_else(|| not_found("invoice", id))?;
        check_company(company, invoice.company_id, "invoice", id)?;
        invoice.post();
        Ok(())
    }

    fn order_of(&self, company: CompanyId, id: PaymentOrderId) -> Result<&PaymentOrder, LastschriftError> {
        let order = self.orders.get(&id).ok_or_else(|| not_found("payment order", id))?;
        check_company(company, order.company_id, "payment order", id)?;
        Ok(order)
    }

    fn draft_order_mut(
        &mut self,
        company: CompanyId,
        id: PaymentOrderId,
    ) -> Result<&mut PaymentOrder, LastschriftError> {
        let order = self.order_of(company, id)?;
        if order.state != PaymentOrderState::Draft {
            return Err(LastschriftError::Validation(format!(
                "payment order {} can only be changed in draft, it is {:?}",
                order.name, order.state
            )));
        }
        self.orders.get_mut(&id).ok_or_else(|| not_found("payment order", id))
    }

    /// Choose the bank journal of a draft order.
    pub fn set_journal(
        &mut self,
        company: CompanyId,
        order: PaymentOrderId,
        journal: JournalId,
    ) -> Result<(), LastschriftError> {
        let j = self.journals.get(&journal).ok_or_else(|| not_found("journal", journal))?;
        check_company(company, j.company_id, "journal", journal)?;
        self.draft_order_mut(company, order)?.journal_id = Some(journal);
        Ok(())
    }

    /// Change the requested collection date policy of a draft order.
    ///
    /// `scheduled` is required for [`DatePrefered::Fixed`].
    pub fn set_date_prefered(
        &mut self,
        company: CompanyId,
        order: PaymentOrderId,
        date_prefered: DatePrefered,
        scheduled: Option<NaiveDate>,
    ) -> Result<(), LastschriftError> {
        if date_prefered == DatePrefered::Fixed && scheduled.is_none() {
            return Err(LastschriftError::Validation(
                "a fixed collection date requires a scheduled date".into(),
            ));
        }
        let o = self.draft_order_mut(company, order)?;
        o.date_prefered = date_prefered;
        o.date_scheduled = scheduled;
        Ok(())
    }

    // -- payment lines --------------------------------------------------------

    /// Put a posted invoice on the draft order of its payment mode.
    ///
    /// The draft order is created when the mode has none. Returns the
    /// order the new payment line was added to.
    pub fn create_account_payment_line(
        &mut self,
        company: CompanyId,
        invoice_id: InvoiceId,
    ) -> Result<PaymentOrderId, LastschriftError> {
        let invoice = self
            .invoices
            .get(&invoice_id)
            .ok_or_else(|| not_found("invoice", invoice_id))?;
        check_company(company, invoice.company_id, "invoice", invoice_id)?;
        if invoice.state != InvoiceState::Posted {
            return Err(LastschriftError::Validation(format!(
                "invoice {} must be posted before it can be collected",
                invoice.number
            )));
        }
        let mode_id = invoice.payment_mode_id.ok_or_else(|| {
            LastschriftError::Validation(format!("invoice {} has no payment mode", invoice.number))
        })?;
        let mode = self
            .payment_modes
            .get(&mode_id)
            .ok_or_else(|| not_found("payment mode", mode_id))?;
        check_company(company, mode.company_id, "payment mode", mode_id)?;
        if mode.payment_type != invoice.kind.payment_type() {
            return Err(LastschriftError::Validation(format!(
                "payment mode '{}' is {:?} but invoice {} needs an {:?} payment",
                mode.name,
                mode.payment_type,
                invoice.number,
                invoice.kind.payment_type()
            )));
        }
        if !mode.is_direct_debit() {
            return Err(LastschriftError::Validation(format!(
                "payment mode '{}' does not collect by direct debit",
                mode.name
            )));
        }
        let mandate_id = invoice.mandate_id.ok_or_else(|| {
            LastschriftError::Validation(format!("invoice {} has no mandate", invoice.number))
        })?;
        let mandate = self
            .mandates
            .get(&mandate_id)
            .ok_or_else(|| not_found("mandate", mandate_id))?;
        check_company(company, mandate.company_id, "mandate", mandate_id)?;

        let pending = self.orders.values().find(|o| {
            o.state != PaymentOrderState::Uploaded
                && o.payment_lines.iter().any(|l| l.invoice_id == invoice_id)
        });
        if let Some(o) = pending {
            return Err(LastschriftError::Validation(format!(
                "invoice {} is already on payment order {}",
                invoice.number, o.name
            )));
        }

        let line = PaymentLine::from_invoice(
            PaymentLineId(self.last_id + 1),
            invoice_id,
            invoice,
            mandate_id,
            mandate,
        )?;
        let draft = self
            .orders
            .iter()
            .find(|(_, o)| {
                o.company_id == company
                    && o.payment_mode_id == mode_id
                    && o.state == PaymentOrderState::Draft
            })
            .map(|(id, _)| *id);

        // All checks passed, commit.
        self.last_id = line.id.0;
        let order_id = match draft {
            Some(id) => id,
            None => {
                let order = PaymentOrder::new(self.order_sequence.next_name(), mode_id, mode);
                self.last_id += 1;
                let id = PaymentOrderId(self.last_id);
                info!(order = %order.name, company = %company, "created payment order");
                self.orders.insert(id, order);
                id
            }
        };
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| not_found("payment order", order_id))?;
        info!(
            order = %order.name,
            invoice = %line.communication,
            amount = %line.amount_currency,
            "added payment line"
        );
        order.payment_lines.push(line);
        Ok(order_id)
    }

    // -- transitions ------------------------------------------------------------

    /// Confirm a draft order: freeze its lines and group them into bank payment lines.
    pub fn draft2open(
        &mut self,
        company: CompanyId,
        order_id: PaymentOrderId,
        today: NaiveDate,
    ) -> Result<(), LastschriftError> {
        let order = self.order_of(company, order_id)?;
        order.state.check_transition(PaymentOrderState::Open)?;
        if order.payment_lines.is_empty() {
            return Err(LastschriftError::Validation(format!(
                "payment order {} has no payment lines",
                order.name
            )));
        }
        let mode = self
            .payment_modes
            .get(&order.payment_mode_id)
            .ok_or_else(|| not_found("payment mode", order.payment_mode_id))?;
        if mode.payment_type != order.payment_type {
            return Err(LastschriftError::Validation(format!(
                "payment order {} does not match the payment type of mode '{}'",
                order.name, mode.name
            )));
        }
        if order.date_prefered == DatePrefered::Fixed && order.date_scheduled.is_none() {
            return Err(LastschriftError::Validation(format!(
                "payment order {} has a fixed collection date but no scheduled date",
                order.name
            )));
        }
        let creditor_account = self.creditor_account(order)?;

        let mut all_sepa = creditor_account.is_sepa_reachable();
        let mut lines = Vec::with_capacity(order.payment_lines.len());
        for line in &order.payment_lines {
            check_company(company, line.company_id, "payment line", line.id)?;
            let mandate = self
                .mandates
                .get(&line.mandate_id)
                .ok_or_else(|| not_found("mandate", line.mandate_id))?;
            if !mandate.is_valid() {
                return Err(LastschriftError::Validation(format!(
                    "mandate {} on payment order {} is not valid (state {:?})",
                    mandate.unique_reference, order.name, mandate.state
                )));
            }
            let invoice = self
                .invoices
                .get(&line.invoice_id)
                .ok_or_else(|| not_found("invoice", line.invoice_id))?;
            if invoice.payment_mode_id != Some(order.payment_mode_id) {
                return Err(LastschriftError::Validation(format!(
                    "invoice {} no longer uses the payment mode of order {}",
                    invoice.number, order.name
                )));
            }
            if line.currency_code.trim().is_empty() || line.amount_currency <= Decimal::ZERO {
                return Err(LastschriftError::Validation(format!(
                    "payment line of invoice {} has no currency or a non-positive amount",
                    invoice.number
                )));
            }
            let debtor = self
                .bank_accounts
                .get(&line.partner_bank_id)
                .ok_or_else(|| not_found("bank account", line.partner_bank_id))?;
            all_sepa &= line.currency_code == "EUR" && debtor.is_sepa_reachable();

            let mut line = line.clone();
            line.date = order.collection_date(&line, today);
            lines.push(line);
        }
        let bank_lines = group_payment_lines(&order.name, &lines, mode.group_lines)?;

        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| not_found("payment order", order_id))?;
        info!(
            order = %order.name,
            company = %company,
            payment_lines = lines.len(),
            bank_lines = bank_lines.len(),
            sepa = all_sepa,
            "payment order confirmed"
        );
        order.payment_lines = lines;
        order.bank_lines = bank_lines;
        order.sepa = all_sepa;
        order.state = PaymentOrderState::Open;
        Ok(())
    }

    fn creditor_account(&self, order: &PaymentOrder) -> Result<&BankAccount, LastschriftError> {
        let journal_id = order.journal_id.ok_or_else(|| {
            LastschriftError::Validation(format!("payment order {} has no bank journal", order.name))
        })?;
        let journal = self
            .journals
            .get(&journal_id)
            .ok_or_else(|| not_found("journal", journal_id))?;
        check_company(order.company_id, journal.company_id, "journal", journal_id)?;
        self.bank_accounts
            .get(&journal.bank_account_id)
            .ok_or_else(|| not_found("bank account", journal.bank_account_id))
    }

    /// Everything the pain.008 generator needs for an open order.
    #[cfg(feature = "pain008")]
    pub fn collection_order(
        &self,
        company: CompanyId,
        order_id: PaymentOrderId,
    ) -> Result<crate::pain008::CollectionOrder, LastschriftError> {
        use crate::pain008::{Collection, CollectionOrder, Creditor, InitiatingParty, Remittance};

        use super::line::CommunicationType;

        let order = self.order_of(company, order_id)?;
        let comp = self.require_company(company)?;
        let mode = self
            .payment_modes
            .get(&order.payment_mode_id)
            .ok_or_else(|| not_found("payment mode", order.payment_mode_id))?;
        let account = self.creditor_account(order)?;
        let scheme_identifier = mode
            .sepa_creditor_identifier
            .clone()
            .or_else(|| comp.sepa_creditor_identifier.clone());

        let mut collections = Vec::with_capacity(order.bank_lines.len());
        for bl in &order.bank_lines {
            let mandate = self
                .mandates
                .get(&bl.mandate_id)
                .ok_or_else(|| not_found("mandate", bl.mandate_id))?;
            let debtor = self
                .bank_accounts
                .get(&bl.partner_bank_id)
                .ok_or_else(|| not_found("bank account", bl.partner_bank_id))?;
            collections.push(Collection {
                instruction_id: bl.name.clone(),
                end_to_end_id: bl.name.clone(),
                amount: bl.amount_currency,
                currency_code: bl.currency_code.clone(),
                collection_date: bl.date,
                sequence_type: mandate.recurrent_sequence_type,
                scheme: mandate.scheme,
                mandate_reference: mandate.unique_reference.clone(),
                signature_date: mandate.signature_date,
                amendment: mandate.needs_amendment(),
                debtor_name: bl.partner_name.clone(),
                debtor_iban: debtor.sanitized_account_number(),
                debtor_bic: debtor.bic.clone(),
                remittance: match bl.communication_type {
                    CommunicationType::Normal => Remittance::Unstructured(bl.communication.clone()),
                    CommunicationType::Structured => Remittance::Structured(bl.communication.clone()),
                },
            });
        }

        Ok(CollectionOrder {
            message_id: order.name.clone(),
            version: mode.pain_version,
            initiating_party: InitiatingParty {
                name: comp.name.clone(),
                identifier: comp
                    .initiating_party_identifier
                    .clone()
                    .or_else(|| scheme_identifier.clone()),
                issuer: comp.initiating_party_issuer.clone(),
            },
            creditor: Creditor {
                name: comp.name.clone(),
                iban: account.sanitized_account_number(),
                bic: account.bic.clone(),
                scheme_identifier,
            },
            sepa: order.sepa,
            batch_booking: mode.batch_booking,
            convert_to_ascii: mode.convert_to_ascii,
            collections,
        })
    }

    /// Generate the pain.008 file of an open order and attach it.
    ///
    /// Nothing is stored when generation fails.
    #[cfg(feature = "pain008")]
    pub fn open2generated(
        &mut self,
        company: CompanyId,
        order_id: PaymentOrderId,
        now: NaiveDateTime,
    ) -> Result<AttachmentId, LastschriftError> {
        let order = self.order_of(company, order_id)?;
        order.state.check_transition(PaymentOrderState::Generated)?;
        let collection_order = self.collection_order(company, order_id)?;
        let xml = crate::pain008::to_pain008_xml(&collection_order, now)?;
        let attachment = Attachment::xml(
            company,
            order_id,
            format!("{}.xml", order.name),
            xml.into_bytes(),
            now,
        );

        let attachment_id = AttachmentId(self.allocate());
        info!(
            order = %collection_order.message_id,
            company = %company,
            version = %collection_order.version,
            file = %attachment.filename,
            bytes = attachment.len(),
            "payment file generated"
        );
        self.attachments.insert(attachment_id, attachment);
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| not_found("payment order", order_id))?;
        order.attachment_id = Some(attachment_id);
        order.date_generated = Some(now.date());
        order.state = PaymentOrderState::Generated;
        Ok(attachment_id)
    }

    /// Mark the file as sent: settle the invoices and move the mandates on.
    pub fn generated2uploaded(
        &mut self,
        company: CompanyId,
        order_id: PaymentOrderId,
        today: NaiveDate,
    ) -> Result<(), LastschriftError> {
        let order = self.order_of(company, order_id)?;
        order.state.check_transition(PaymentOrderState::Uploaded)?;

        let mut settlements: Vec<(InvoiceId, Decimal)> = Vec::new();
        let mut mandate_ids: Vec<MandateId> = Vec::new();
        for bl in &order.bank_lines {
            for line in order.payment_lines.iter().filter(|l| bl.payment_line_ids.contains(&l.id)) {
                if !self.invoices.contains_key(&line.invoice_id) {
                    return Err(not_found("invoice", line.invoice_id));
                }
                settlements.push((line.invoice_id, line.amount_currency));
            }
            if !self.mandates.contains_key(&bl.mandate_id) {
                return Err(not_found("mandate", bl.mandate_id));
            }
            if !mandate_ids.contains(&bl.mandate_id) {
                mandate_ids.push(bl.mandate_id);
            }
        }
        let debit_date = order.date_generated.unwrap_or(today);
        let name = order.name.clone();

        for (invoice_id, amount) in &settlements {
            if let Some(invoice) = self.invoices.get_mut(invoice_id) {
                invoice.register_payment(*amount);
            }
        }
        for mandate_id in &mandate_ids {
            if let Some(mandate) = self.mandates.get_mut(mandate_id) {
                mandate.record_collection(debit_date);
            }
        }
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| not_found("payment order", order_id))?;
        order.date_uploaded = Some(today);
        order.state = PaymentOrderState::Uploaded;
        info!(
            order = %name,
            company = %company,
            invoices = settlements.len(),
            mandates = mandate_ids.len(),
            "payment order uploaded"
        );
        Ok(())
    }
}
