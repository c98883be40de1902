//! Fixed-coordinate invoice layout.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner of
//! an A4 page. The cursor only ever moves down; there is no page break, so
//! long item lists simply run off the bottom of the page.

use chrono::Local;

use crate::{
    i18n::Translations,
    model::{format_date, format_money, Invoice},
    pdf::RenderError,
};

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 40.0;
pub const TOP: f32 = 780.0;
pub const RIGHT_EDGE: f32 = 555.0;
pub const ROW_HEIGHT: f32 = 20.0;

const VALUE_OFFSET: f32 = 150.0;
const QTY_X: f32 = 300.0;
const QTY_VALUE_X: f32 = 320.0;
const PRICE_X: f32 = 380.0;
const TOTAL_X: f32 = 470.0;
const SUMMARY_LABEL_X: f32 = 350.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);
pub const GREY: Rgb = Rgb(0.5, 0.5, 0.5);
pub const ACCENT: Rgb = Rgb(0.4, 0.4, 0.8);
pub const RULE: Rgb = Rgb(0.8, 0.8, 0.8);

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        color: Rgb,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: Rgb,
        thickness: f32,
    },
}

struct Page {
    primitives: Vec<Primitive>,
    y: f32,
}

impl Page {
    fn down(&mut self, by: f32) {
        self.y -= by;
    }

    fn text(&mut self, text: impl Into<String>, x: f32, size: f32, color: Rgb) {
        self.primitives.push(Primitive::Text {
            text: text.into(),
            x,
            y: self.y,
            size,
            color,
        });
    }

    fn line_at(&mut self, y: f32, color: Rgb, thickness: f32) {
        self.primitives.push(Primitive::Line {
            from: (MARGIN, y),
            to: (RIGHT_EDGE, y),
            color,
            thickness,
        });
    }
}

/// Lays out one invoice. Invoices without items are refused.
pub fn layout_invoice(
    invoice: &Invoice,
    i18n: &Translations,
    currency: &str,
) -> Result<Vec<Primitive>, RenderError> {
    if invoice.items.is_empty() {
        return Err(RenderError::NoItems);
    }

    let company = &invoice.company_snapshot;
    let client = &invoice.client_snapshot;
    let money = |amount: f64| format_money(amount, currency);
    let mut page = Page {
        primitives: vec![],
        y: TOP,
    };

    // Sender
    let company_name = match company.name.trim() {
        "" => i18n.t("pdf.company_fallback"),
        name => name,
    };
    page.text(company_name, MARGIN, 24.0, ACCENT);
    if let Some(address) = &company.address {
        page.down(20.0);
        page.text(address.as_str(), MARGIN, 9.0, BLACK);
    }
    if let Some(phone) = &company.phone {
        page.down(15.0);
        page.text(format!("{} {}", i18n.t("pdf.phone"), phone), MARGIN, 9.0, BLACK);
    }
    if let Some(email) = &company.email {
        page.down(15.0);
        page.text(format!("{} {}", i18n.t("pdf.email"), email), MARGIN, 9.0, BLACK);
    }
    if let Some(vat) = &company.vat {
        page.down(15.0);
        page.text(format!("{} {}", i18n.t("pdf.vat"), vat), MARGIN, 9.0, BLACK);
    }
    if let Some(website) = &company.website {
        page.down(15.0);
        page.text(website.as_str(), MARGIN, 9.0, BLACK);
    }

    page.down(40.0);
    page.text(i18n.t("pdf.title"), MARGIN, 20.0, BLACK);

    page.down(35.0);
    page.text(i18n.t("pdf.number"), MARGIN, 10.0, GREY);
    page.text(invoice.invoice_number.as_str(), MARGIN + VALUE_OFFSET, 10.0, BLACK);

    page.down(20.0);
    let date = invoice.created_at.with_timezone(&Local).date_naive();
    page.text(i18n.t("pdf.date"), MARGIN, 10.0, GREY);
    page.text(format_date(date), MARGIN + VALUE_OFFSET, 10.0, BLACK);

    if let Some(due) = invoice.due_date {
        page.down(20.0);
        page.text(i18n.t("pdf.due_date"), MARGIN, 10.0, GREY);
        page.text(format_date(due), MARGIN + VALUE_OFFSET, 10.0, BLACK);
    }

    // Recipient
    page.down(30.0);
    page.text(i18n.t("pdf.recipient"), MARGIN, 11.0, BLACK);
    page.down(15.0);
    let client_name = match client.name.trim() {
        "" => i18n.t("pdf.client_fallback"),
        name => name,
    };
    page.text(client_name, MARGIN, 10.0, BLACK);
    if let Some(address) = &client.address {
        page.down(12.0);
        page.text(address.as_str(), MARGIN, 10.0, BLACK);
    }
    if let Some(email) = &client.email {
        page.down(12.0);
        page.text(email.as_str(), MARGIN, 10.0, BLACK);
    }

    // Items table; white header labels sit on an accent band.
    page.down(35.0);
    page.line_at(page.y + 4.0, ACCENT, 16.0);
    page.text(i18n.t("pdf.description"), MARGIN, 10.0, WHITE);
    page.text(i18n.t("pdf.quantity"), QTY_X, 10.0, WHITE);
    page.text(i18n.t("pdf.price"), PRICE_X, 10.0, WHITE);
    page.text(i18n.t("pdf.total"), TOTAL_X, 10.0, WHITE);

    page.down(2.0);
    page.line_at(page.y, RULE, 1.0);
    page.down(20.0);

    for item in &invoice.items {
        page.text(item.title.as_str(), MARGIN, 10.0, BLACK);
        page.text(item.qty.to_string(), QTY_VALUE_X, 10.0, BLACK);
        page.text(money(item.price), PRICE_X, 10.0, BLACK);
        page.text(money(item.total), TOTAL_X, 10.0, BLACK);
        page.down(ROW_HEIGHT);
    }

    page.down(10.0);
    page.line_at(page.y, RULE, 1.0);

    // Totals
    page.down(25.0);
    page.text(i18n.t("pdf.subtotal"), SUMMARY_LABEL_X, 11.0, BLACK);
    page.text(money(invoice.subtotal), TOTAL_X, 11.0, BLACK);

    if let Some(tax) = invoice.tax.filter(|tax| *tax > 0.0) {
        page.down(18.0);
        page.text(i18n.t("pdf.tax"), SUMMARY_LABEL_X, 11.0, BLACK);
        page.text(money(tax), TOTAL_X, 11.0, BLACK);
    }

    page.down(18.0);
    page.text(i18n.t("pdf.grand_total"), SUMMARY_LABEL_X, 14.0, ACCENT);
    page.text(money(invoice.total), TOTAL_X, 14.0, ACCENT);

    if let Some(notes) = invoice.notes.as_deref().filter(|n| !n.is_empty()) {
        page.down(50.0);
        page.text(i18n.t("pdf.notes"), MARGIN, 11.0, GREY);
        page.down(15.0);
        for line in notes.lines() {
            page.text(line, MARGIN, 9.0, BLACK);
            page.down(12.0);
        }
    }

    Ok(page.primitives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Client, CompanyInfo, InvoiceItem, InvoiceStatus};
    use chrono::Utc;

    fn invoice(items: Vec<InvoiceItem>, tax: f64, notes: Option<&str>) -> Invoice {
        let subtotal: f64 = items.iter().map(|i| i.total).sum();
        let mut company = CompanyInfo::new("Meine Firma");
        company.phone = Some("030 123".to_string());
        let mut client = Client::new("Acme");
        client.address = Some("Hauptstraße 1, Berlin".to_string());
        Invoice {
            id: Some(1),
            invoice_number: "INV-0001".to_string(),
            client_id: 1,
            client_snapshot: client,
            company_snapshot: company,
            items,
            subtotal,
            tax: Some(tax),
            total: subtotal + tax,
            notes: notes.map(str::to_string),
            status: InvoiceStatus::Draft,
            created_at: Utc::now(),
            due_date: None,
        }
    }

    fn texts(primitives: &[Primitive]) -> Vec<(&str, f32, f32)> {
        primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Text { text, x, y, .. } => Some((text.as_str(), *x, *y)),
                Primitive::Line { .. } => None,
            })
            .collect()
    }

    fn find<'a>(primitives: &'a [Primitive], wanted: &str) -> Option<(&'a str, f32, f32)> {
        texts(primitives).into_iter().find(|(text, _, _)| *text == wanted)
    }

    fn de() -> Translations {
        Translations::load("de").unwrap()
    }

    #[test]
    fn empty_invoice_is_refused() {
        let result = layout_invoice(&invoice(vec![], 0.0, None), &de(), "€");
        assert!(matches!(result, Err(RenderError::NoItems)));
    }

    #[test]
    fn header_and_recipient_blocks() {
        let items = vec![InvoiceItem::new("Beratung", 1.0, 100.0)];
        let primitives = layout_invoice(&invoice(items, 0.0, None), &de(), "€").unwrap();

        assert_eq!(find(&primitives, "Meine Firma"), Some(("Meine Firma", MARGIN, TOP)));
        assert_eq!(find(&primitives, "Tel: 030 123").map(|t| t.2), Some(TOP - 15.0));
        assert!(find(&primitives, "RECHNUNG").is_some());
        let number = find(&primitives, "INV-0001").unwrap();
        assert_eq!(number.1, MARGIN + 150.0);
        assert!(find(&primitives, "Acme").is_some());
        assert!(find(&primitives, "Hauptstraße 1, Berlin").is_some());
    }

    #[test]
    fn rows_step_down_at_fixed_increments() {
        let items = vec![
            InvoiceItem::new("Beratung", 1.0, 100.0),
            InvoiceItem::new("Entwicklung", 2.5, 80.0),
            InvoiceItem::new("Reisekosten", 1.0, 42.5),
        ];
        let primitives = layout_invoice(&invoice(items, 0.0, None), &de(), "€").unwrap();

        let first = find(&primitives, "Beratung").unwrap();
        let second = find(&primitives, "Entwicklung").unwrap();
        let third = find(&primitives, "Reisekosten").unwrap();
        assert_eq!(first.2 - second.2, ROW_HEIGHT);
        assert_eq!(second.2 - third.2, ROW_HEIGHT);
        assert!(find(&primitives, "2.5").is_some());
        assert_eq!(find(&primitives, "€200.00").map(|t| t.1), Some(470.0));
    }

    #[test]
    fn tax_row_only_when_positive() {
        let items = vec![InvoiceItem::new("Beratung", 1.0, 100.0)];
        let without = layout_invoice(&invoice(items.clone(), 0.0, None), &de(), "€").unwrap();
        assert!(find(&without, "Steuer:").is_none());
        assert!(find(&without, "€100.00").is_some());

        let with = layout_invoice(&invoice(items, 19.0, None), &de(), "€").unwrap();
        assert!(find(&with, "Steuer:").is_some());
        assert!(find(&with, "€19.00").is_some());
        assert!(find(&with, "€119.00").is_some());
    }

    #[test]
    fn notes_are_split_on_line_breaks() {
        let items = vec![InvoiceItem::new("Beratung", 1.0, 100.0)];
        let notes = "Zahlbar innerhalb von 14 Tagen.\nVielen Dank!";
        let primitives = layout_invoice(&invoice(items, 0.0, Some(notes)), &de(), "€").unwrap();

        let first = find(&primitives, "Zahlbar innerhalb von 14 Tagen.").unwrap();
        let second = find(&primitives, "Vielen Dank!").unwrap();
        assert_eq!(first.2 - second.2, 12.0);
        assert!(find(&primitives, "Notizen:").is_some());
    }

    #[test]
    fn long_item_lists_run_off_the_page() {
        let items = (0..60)
            .map(|i| InvoiceItem::new(format!("Position {}", i), 1.0, 1.0))
            .collect();
        let primitives = layout_invoice(&invoice(items, 0.0, None), &de(), "€").unwrap();
        let last = find(&primitives, "Position 59").unwrap();
        assert!(last.2 < 0.0);
    }

    #[test]
    fn blank_names_use_fallback_labels() {
        let mut inv = invoice(vec![InvoiceItem::new("Beratung", 1.0, 100.0)], 0.0, None);
        inv.company_snapshot.name = String::new();
        inv.client_snapshot.name = " ".to_string();
        let primitives = layout_invoice(&inv, &de(), "€").unwrap();
        assert!(find(&primitives, "Meine Firma").is_some());
        assert!(find(&primitives, "Kunde").is_some());
    }
}
