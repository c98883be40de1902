use std::{
    fs,
    path::{Path, PathBuf},
};

use printpdf::{BuiltinFont, Color, Line, Mm, PdfDocument, Point, Pt};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    i18n::Translations,
    layout::{self, Primitive, PAGE_HEIGHT, PAGE_WIDTH},
    model::Invoice,
};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("an invoice without line items cannot be rendered")]
    NoItems,
    #[error("pdf backend failed: {0}")]
    Pdf(String),
    #[error("could not write document: {0}")]
    Io(#[from] std::io::Error),
}

/// A finished PDF held in memory.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub invoice_number: String,
}

impl RenderedDocument {
    /// Writes the document under its download name into `dir`.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, RenderError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), "invoice downloaded");
        Ok(path)
    }

    /// Writes a throwaway copy into the temp directory for viewing.
    pub fn write_preview(&self) -> Result<PathBuf, RenderError> {
        let stem: String = self
            .invoice_number
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let path = std::env::temp_dir().join(format!("{}-preview.pdf", stem));
        fs::write(&path, &self.bytes)?;
        debug!(path = %path.display(), "preview written");
        Ok(path)
    }
}

pub struct Renderer<'a> {
    pub translations: &'a Translations,
    pub currency: &'a str,
    pub file_name: &'a str,
}

impl<'a> Renderer<'a> {
    pub fn render(&self, invoice: &Invoice) -> Result<RenderedDocument, RenderError> {
        let primitives = layout::layout_invoice(invoice, self.translations, self.currency)?;
        let bytes = write_pdf(&invoice.invoice_number, &primitives)?;
        debug!(
            number = %invoice.invoice_number,
            primitives = primitives.len(),
            size = bytes.len(),
            "invoice rendered"
        );
        Ok(RenderedDocument {
            bytes,
            file_name: self.file_name.to_string(),
            invoice_number: invoice.invoice_number.clone(),
        })
    }
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

fn color(rgb: layout::Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(rgb.0, rgb.1, rgb.2, None))
}

/// Draws the primitives onto a single A4 page with Helvetica.
pub fn write_pdf(title: &str, primitives: &[Primitive]) -> Result<Vec<u8>, RenderError> {
    let (doc, page, layer) = PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Invoice");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RenderError::Pdf(format!("{:?}", e)))?;
    let layer = doc.get_page(page).get_layer(layer);

    for primitive in primitives {
        match primitive {
            Primitive::Text {
                text,
                x,
                y,
                size,
                color: rgb,
            } => {
                layer.set_fill_color(color(*rgb));
                layer.use_text(text.as_str(), *size, mm(*x), mm(*y), &font);
            }
            Primitive::Line {
                from,
                to,
                color: rgb,
                thickness,
            } => {
                layer.set_outline_color(color(*rgb));
                layer.set_outline_thickness(*thickness);
                layer.add_line(Line {
                    points: vec![
                        (Point::new(mm(from.0), mm(from.1)), false),
                        (Point::new(mm(to.0), mm(to.1)), false),
                    ],
                    is_closed: false,
                });
            }
        }
    }

    doc.save_to_bytes()
        .map_err(|e| RenderError::Pdf(format!("{:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Client, CompanyInfo, InvoiceItem, InvoiceStatus};
    use chrono::Utc;

    fn invoice(items: Vec<InvoiceItem>) -> Invoice {
        let subtotal = items.iter().map(|i| i.total).sum();
        Invoice {
            id: None,
            invoice_number: "INV/0007".to_string(),
            client_id: 1,
            client_snapshot: Client::new("Acme"),
            company_snapshot: CompanyInfo::new("Meine Firma"),
            items,
            subtotal,
            tax: None,
            total: subtotal,
            notes: None,
            status: InvoiceStatus::Sent,
            created_at: Utc::now(),
            due_date: None,
        }
    }

    fn renderer(translations: &Translations) -> Renderer<'_> {
        Renderer {
            translations,
            currency: "€",
            file_name: "invoice.pdf",
        }
    }

    #[test]
    fn renders_a_pdf_document() {
        let de = Translations::load("de").unwrap();
        let doc = renderer(&de)
            .render(&invoice(vec![InvoiceItem::new("Beratung", 1.0, 100.0)]))
            .unwrap();
        assert!(doc.bytes.starts_with(b"%PDF"));
        assert_eq!(doc.file_name, "invoice.pdf");
    }

    #[test]
    fn empty_invoice_produces_no_document() {
        let de = Translations::load("de").unwrap();
        let result = renderer(&de).render(&invoice(vec![]));
        assert!(matches!(result, Err(RenderError::NoItems)));
    }

    #[test]
    fn save_and_preview_write_files() {
        let de = Translations::load("de").unwrap();
        let doc = renderer(&de)
            .render(&invoice(vec![InvoiceItem::new("Beratung", 1.0, 100.0)]))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let saved = doc.save_to(dir.path()).unwrap();
        assert_eq!(saved, dir.path().join("invoice.pdf"));
        assert_eq!(fs::read(&saved).unwrap(), doc.bytes);

        let preview = doc.write_preview().unwrap();
        assert!(preview.ends_with("INV_0007-preview.pdf"));
        assert!(preview.exists());
        fs::remove_file(preview).unwrap();
    }
}
