//! The invoice being composed.
//!
//! `InvoiceDraft` is a plain owned value. Every operation takes the draft by
//! value and hands back the updated one, so callers own exactly one draft at
//! a time and pass it around explicitly.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::model::{Client, CompanyInfo, Invoice, InvoiceItem, InvoiceStatus, Task};

#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    #[error("no client selected")]
    MissingClient,
    #[error("the invoice has no line items")]
    NoItems,
    #[error("no company details saved yet")]
    MissingCompany,
    #[error("line item {index} does not exist ({len} items)")]
    ItemOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceDraft {
    pub client: Option<Client>,
    /// The company snapshot of a reopened invoice. New drafts leave it unset
    /// and take the current company record on finalize.
    pub company: Option<CompanyInfo>,
    pub selected_tasks: Vec<Task>,
    pub items: Vec<InvoiceItem>,
    pub notes: String,
    pub tax: f64,
    pub invoice_number: String,
    pub status: InvoiceStatus,
    pub due_date: Option<NaiveDate>,
    /// Set when the draft was loaded from a saved invoice.
    pub invoice_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl InvoiceDraft {
    pub fn new(invoice_number: impl Into<String>) -> Self {
        InvoiceDraft {
            invoice_number: invoice_number.into(),
            ..Default::default()
        }
    }

    /// Opens a saved invoice for editing. Tasks still in the catalogue and
    /// referenced by an item are selected again.
    pub fn from_invoice(invoice: &Invoice, catalogue: &[Task]) -> Self {
        let selected_tasks = catalogue
            .iter()
            .filter(|task| {
                task.id.is_some() && invoice.items.iter().any(|item| item.task_id == task.id)
            })
            .cloned()
            .collect();
        InvoiceDraft {
            client: Some(invoice.client_snapshot.clone()),
            company: Some(invoice.company_snapshot.clone()),
            selected_tasks,
            items: invoice.items.clone(),
            notes: invoice.notes.clone().unwrap_or_default(),
            tax: invoice.tax.unwrap_or(0.0),
            invoice_number: invoice.invoice_number.clone(),
            status: invoice.status,
            due_date: invoice.due_date,
            invoice_id: invoice.id,
            created_at: Some(invoice.created_at),
        }
    }

    pub fn with_client(mut self, client: Option<Client>) -> Self {
        self.client = client;
        self
    }

    pub fn is_selected(&self, task_id: i64) -> bool {
        self.selected_tasks.iter().any(|t| t.id == Some(task_id))
    }

    /// Adding a task that is already selected leaves the draft unchanged.
    /// Unsaved tasks have nothing to link an item to and are skipped.
    pub fn add_task(mut self, task: &Task) -> Self {
        let Some(id) = task.id else {
            return self;
        };
        if !self.is_selected(id) {
            self.items.push(InvoiceItem::from_task(task));
            self.selected_tasks.push(task.clone());
        }
        self
    }

    /// Drops the task and the line item linked to it.
    pub fn remove_task(mut self, task_id: i64) -> Self {
        self.selected_tasks.retain(|t| t.id != Some(task_id));
        self.items.retain(|item| item.task_id != Some(task_id));
        self
    }

    pub fn toggle_task(self, task: &Task) -> Self {
        match task.id {
            Some(id) if self.is_selected(id) => self.remove_task(id),
            _ => self.add_task(task),
        }
    }

    pub fn add_item(mut self, item: InvoiceItem) -> Self {
        self.items.push(item);
        self
    }

    fn check_index(&self, index: usize) -> Result<(), DraftError> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(DraftError::ItemOutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }

    /// Replaces the item verbatim, total included.
    pub fn update_item(mut self, index: usize, item: InvoiceItem) -> Result<Self, DraftError> {
        self.check_index(index)?;
        self.items[index] = item;
        Ok(self)
    }

    /// Sets quantity and price, recomputing the line total.
    pub fn edit_item(mut self, index: usize, qty: f64, price: f64) -> Result<Self, DraftError> {
        self.check_index(index)?;
        let item = &mut self.items[index];
        item.qty = qty;
        item.price = price;
        item.total = qty * price;
        Ok(self)
    }

    /// Removes the item and deselects the task it was created from.
    pub fn remove_item(mut self, index: usize) -> Result<Self, DraftError> {
        self.check_index(index)?;
        let item = self.items.remove(index);
        if item.task_id.is_some() {
            self.selected_tasks.retain(|t| t.id != item.task_id);
        }
        Ok(self)
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_tax(mut self, tax: f64) -> Self {
        self.tax = tax;
        self
    }

    pub fn with_invoice_number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = number.into();
        self
    }

    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn reset(self) -> Self {
        InvoiceDraft::default()
    }

    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(|item| item.total).sum()
    }

    pub fn total(&self) -> f64 {
        self.subtotal() + self.tax
    }

    /// Empty-state guard. Both saving and previewing go through here.
    pub fn check_complete(&self) -> Result<&Client, DraftError> {
        let client = self.client.as_ref().ok_or(DraftError::MissingClient)?;
        if self.items.is_empty() {
            return Err(DraftError::NoItems);
        }
        Ok(client)
    }

    /// Builds the invoice record. Client and company are copied into it and
    /// stay as they are now, whatever later happens to the source records.
    /// A reopened invoice keeps its stored company snapshot and ignores
    /// `company`.
    pub fn finalize(
        &self,
        company: &CompanyInfo,
        now: DateTime<Utc>,
    ) -> Result<Invoice, DraftError> {
        let client = self.check_complete()?;
        let company = self.company.as_ref().unwrap_or(company);
        Ok(Invoice {
            id: self.invoice_id,
            invoice_number: self.invoice_number.clone(),
            client_id: client.id.unwrap_or(0),
            client_snapshot: client.clone(),
            company_snapshot: company.clone(),
            items: self.items.clone(),
            subtotal: self.subtotal(),
            tax: Some(self.tax),
            total: self.total(),
            notes: if self.notes.is_empty() {
                None
            } else {
                Some(self.notes.clone())
            },
            status: self.status,
            created_at: self.created_at.unwrap_or(now),
            due_date: self.due_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    fn task(id: i64, title: &str, price: f64) -> Task {
        let mut task = Task::new(title, price);
        task.id = Some(id);
        task
    }

    fn client(id: i64, name: &str) -> Client {
        let mut client = Client::new(name);
        client.id = Some(id);
        client
    }

    #[test]
    fn adding_the_same_task_twice_is_idempotent() {
        let beratung = task(1, "Beratung", 100.0);
        let draft = InvoiceDraft::new("INV-0001")
            .add_task(&beratung)
            .add_task(&beratung);
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.selected_tasks.len(), 1);
    }

    #[test]
    fn removing_a_task_only_removes_its_linked_item() {
        let beratung = task(1, "Beratung", 100.0);
        let entwicklung = task(2, "Entwicklung", 80.0);
        let draft = InvoiceDraft::new("INV-0001")
            .add_task(&beratung)
            .add_item(InvoiceItem::new("Reisekosten", 1.0, 42.5))
            .add_task(&entwicklung)
            .remove_task(1);

        let titles: Vec<_> = draft.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["Reisekosten", "Entwicklung"]);
        assert_eq!(draft.selected_tasks, vec![entwicklung]);
    }

    #[test]
    fn toggling_adds_then_removes() {
        let beratung = task(1, "Beratung", 100.0);
        let draft = InvoiceDraft::default().toggle_task(&beratung);
        assert!(draft.is_selected(1));
        let draft = draft.toggle_task(&beratung);
        assert!(!draft.is_selected(1));
        assert!(draft.items.is_empty());
    }

    #[test]
    fn removing_an_item_deselects_its_task() {
        let beratung = task(1, "Beratung", 100.0);
        let draft = InvoiceDraft::default()
            .add_item(InvoiceItem::new("Reisekosten", 1.0, 42.5))
            .add_task(&beratung)
            .remove_item(1)
            .unwrap();
        assert!(draft.selected_tasks.is_empty());
        assert_eq!(draft.items.len(), 1);

        // Selecting it again yields a fresh item.
        let draft = draft.add_task(&beratung);
        assert_eq!(draft.items.len(), 2);
    }

    #[test]
    fn removing_an_unlinked_item_keeps_selection() {
        let beratung = task(1, "Beratung", 100.0);
        let draft = InvoiceDraft::default()
            .add_task(&beratung)
            .add_item(InvoiceItem::new("Reisekosten", 1.0, 42.5))
            .remove_item(1)
            .unwrap();
        assert_eq!(draft.selected_tasks.len(), 1);
        assert_eq!(draft.items.len(), 1);
    }

    #[test]
    fn editing_recomputes_line_total_and_invoice_total() {
        let draft = InvoiceDraft::default()
            .add_task(&task(1, "Beratung", 100.0))
            .add_item(InvoiceItem::new("Reisekosten", 1.0, 40.0))
            .edit_item(0, 3.0, 90.0)
            .unwrap()
            .with_tax(10.0);
        assert_eq!(draft.items[0].total, 270.0);
        assert_eq!(draft.subtotal(), 310.0);
        assert_eq!(draft.total(), 320.0);
    }

    #[test]
    fn update_item_replaces_verbatim() {
        let mut replacement = InvoiceItem::new("Pauschale", 1.0, 10.0);
        replacement.total = 99.0;
        let draft = InvoiceDraft::default()
            .add_item(InvoiceItem::new("Reisekosten", 1.0, 40.0))
            .update_item(0, replacement.clone())
            .unwrap();
        assert_eq!(draft.items, vec![replacement]);
    }

    #[test]
    fn out_of_range_indexes_are_rejected() {
        let draft = InvoiceDraft::default().add_item(InvoiceItem::new("x", 1.0, 1.0));
        assert_eq!(
            draft.clone().edit_item(3, 1.0, 1.0),
            Err(DraftError::ItemOutOfRange { index: 3, len: 1 })
        );
        assert!(draft.clone().remove_item(1).is_err());
        assert!(draft
            .update_item(5, InvoiceItem::new("y", 1.0, 1.0))
            .is_err());
    }

    #[test]
    fn reset_clears_everything() {
        let draft = InvoiceDraft::new("INV-0009")
            .with_client(Some(client(1, "Acme")))
            .add_task(&task(1, "Beratung", 100.0))
            .with_notes("Danke")
            .with_tax(5.0)
            .reset();
        assert_eq!(draft, InvoiceDraft::default());
    }

    #[test]
    fn finalize_requires_client_and_items() {
        let company = CompanyInfo::new("Meine Firma");
        let empty = InvoiceDraft::new("INV-0001").with_client(Some(client(1, "Acme")));
        assert_eq!(empty.finalize(&company, Utc::now()), Err(DraftError::NoItems));

        let no_client = InvoiceDraft::new("INV-0001").add_task(&task(1, "Beratung", 100.0));
        assert_eq!(
            no_client.finalize(&company, Utc::now()),
            Err(DraftError::MissingClient)
        );
    }

    #[test]
    fn finalize_snapshots_client_and_company() {
        let mut acme = client(4, "Acme");
        let company = CompanyInfo::new("Meine Firma");
        let invoice = InvoiceDraft::new("INV-0001")
            .with_client(Some(acme.clone()))
            .add_task(&task(1, "Beratung", 100.0))
            .with_notes("Danke")
            .finalize(&company, Utc::now())
            .unwrap();

        acme.name = "Changed".to_string();
        assert_eq!(invoice.client_id, 4);
        assert_eq!(invoice.client_snapshot.name, "Acme");
        assert_eq!(invoice.company_snapshot, company);
        assert_eq!(invoice.notes.as_deref(), Some("Danke"));
        assert_eq!(invoice.tax, Some(0.0));
    }

    #[test]
    fn reopening_an_invoice_reselects_linked_tasks() {
        let beratung = task(1, "Beratung", 100.0);
        let entwicklung = task(2, "Entwicklung", 80.0);
        let created = Utc::now();
        let invoice = InvoiceDraft::new("INV-0001")
            .with_client(Some(client(1, "Acme")))
            .add_task(&beratung)
            .add_item(InvoiceItem::new("Reisekosten", 1.0, 42.5))
            .with_tax(19.0)
            .finalize(&CompanyInfo::new("Meine Firma"), created)
            .unwrap();

        let draft = InvoiceDraft::from_invoice(&invoice, &[beratung.clone(), entwicklung]);
        assert_eq!(draft.selected_tasks, vec![beratung.clone()]);
        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.tax, 19.0);
        assert_eq!(draft.created_at, Some(created));

        // Still idempotent after reopening.
        let draft = draft.add_task(&beratung);
        assert_eq!(draft.items.len(), 2);
    }

    #[test]
    fn reopening_keeps_the_stored_company_snapshot() {
        let invoice = InvoiceDraft::new("INV-0001")
            .with_client(Some(client(1, "Acme")))
            .add_task(&task(1, "Beratung", 100.0))
            .finalize(&CompanyInfo::new("Alte Firma"), Utc::now())
            .unwrap();

        let resaved = InvoiceDraft::from_invoice(&invoice, &[])
            .with_status(InvoiceStatus::Paid)
            .finalize(&CompanyInfo::new("Neue Firma"), Utc::now())
            .unwrap();
        assert_eq!(resaved.company_snapshot.name, "Alte Firma");
        assert_eq!(resaved.client_snapshot.name, "Acme");
        assert_eq!(resaved.status, InvoiceStatus::Paid);

        // A fresh draft takes whatever company it is given.
        let fresh = InvoiceDraft::new("INV-0002")
            .with_client(Some(client(1, "Acme")))
            .add_task(&task(1, "Beratung", 100.0))
            .finalize(&CompanyInfo::new("Neue Firma"), Utc::now())
            .unwrap();
        assert_eq!(fresh.company_snapshot.name, "Neue Firma");
    }

    #[test]
    fn unlinked_items_survive_task_changes() {
        let beratung = task(1, "Beratung", 100.0);
        let unsaved = Task::new("Entwurf", 10.0);
        let draft = InvoiceDraft::new("INV-0001")
            .add_item(InvoiceItem::new("Reisekosten", 1.0, 42.5))
            .add_task(&beratung)
            .add_task(&unsaved)
            .toggle_task(&unsaved)
            .remove_task(7)
            .toggle_task(&beratung)
            .add_task(&beratung)
            .remove_task(1);

        let titles: Vec<_> = draft.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["Reisekosten"]);
        assert!(draft.selected_tasks.is_empty());
    }

    #[test]
    fn beratung_for_acme_end_to_end() {
        let db = Database::in_memory().unwrap();
        let task_id = db.add_task(&Task::new("Beratung", 100.00)).unwrap();
        let client_id = db.add_client(&Client::new("Acme")).unwrap();
        db.save_company(&CompanyInfo::new("Meine Firma")).unwrap();

        let beratung = db.get_task(task_id).unwrap().unwrap();
        let acme = db.get_client(client_id).unwrap().unwrap();

        let draft = InvoiceDraft::new(db.next_invoice_number().unwrap())
            .with_client(Some(acme))
            .add_task(&beratung);
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].qty, 1.0);
        assert_eq!(draft.items[0].total, 100.00);
        assert_eq!(draft.subtotal(), 100.00);

        let draft = draft.with_tax(19.00);
        assert_eq!(draft.total(), 119.00);

        let company = db.company().unwrap().unwrap();
        let invoice = draft.finalize(&company, Utc::now()).unwrap();
        let id = db.add_invoice(&invoice).unwrap();
        let stored = db.get_invoice(id).unwrap().unwrap();
        assert_eq!(stored.invoice_number, "INV-0001");
        assert_eq!(stored.total, 119.00);

        db.delete_client(client_id).unwrap();
        assert_eq!(db.get_invoice(id).unwrap().unwrap().client_snapshot.name, "Acme");
    }
}
