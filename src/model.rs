use std::{fmt, str::FromStr, vec::Vec};

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input-time checks. The store itself accepts anything; forms and commands
/// call these right before saving.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("unit price must be greater than zero")]
    NonPositivePrice,
}

/// A reusable billable task template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i64>,
    pub title: String,
    pub unit_price: f64,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(title: impl Into<String>, unit_price: f64) -> Self {
        Task {
            id: None,
            title: title.into(),
            unit_price,
            description: None,
            created_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::Empty("title"));
        }
        if self.unit_price.is_nan() || self.unit_price <= 0.0 {
            return Err(ValidationError::NonPositivePrice);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Option<i64>,
    pub name: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Client {
    pub fn new(name: impl Into<String>) -> Self {
        Client {
            id: None,
            name: name.into(),
            address: None,
            email: None,
            phone: None,
            created_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty("name"));
        }
        Ok(())
    }
}

/// The issuing company. Only the first stored record is ever read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub id: Option<i64>,
    pub name: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub vat: Option<String>,
    pub website: Option<String>,
    /// Embedded image as a `data:<mime>;base64,...` URL.
    pub logo_base64: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl CompanyInfo {
    pub fn new(name: impl Into<String>) -> Self {
        CompanyInfo {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty("company name"));
        }
        Ok(())
    }

    pub fn set_logo(&mut self, mime: &str, bytes: &[u8]) {
        self.logo_base64 = Some(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)));
    }

    /// Raw image bytes of the logo, if one is set and decodes cleanly.
    pub fn logo_bytes(&self) -> Option<Vec<u8>> {
        let url = self.logo_base64.as_deref()?;
        let (_, payload) = url.split_once(";base64,")?;
        STANDARD.decode(payload).ok()
    }
}

/// One billable row on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    /// Back-reference to the task this row was created from.
    pub task_id: Option<i64>,
    pub title: String,
    pub qty: f64,
    pub price: f64,
    pub total: f64,
}

impl InvoiceItem {
    pub fn new(title: impl Into<String>, qty: f64, price: f64) -> Self {
        InvoiceItem {
            task_id: None,
            title: title.into(),
            qty,
            price,
            total: qty * price,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        InvoiceItem {
            task_id: task.id,
            title: task.title.clone(),
            qty: 1.0,
            price: task.unit_price,
            total: task.unit_price,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
        }
    }

    /// Translation key for the status label.
    pub fn label_key(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "invoice.draft",
            InvoiceStatus::Sent => "invoice.sent",
            InvoiceStatus::Paid => "invoice.paid",
        }
    }

    pub fn next(self) -> Self {
        match self {
            InvoiceStatus::Draft => InvoiceStatus::Sent,
            InvoiceStatus::Sent => InvoiceStatus::Paid,
            InvoiceStatus::Paid => InvoiceStatus::Draft,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown invoice status '{0}' (expected draft, sent or paid)")]
pub struct ParseStatusError(pub String);

impl FromStr for InvoiceStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

/// A saved invoice. The client and company are copies taken at save time
/// and are never synchronised with their source records again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Option<i64>,
    pub invoice_number: String,
    pub client_id: i64,
    pub client_snapshot: Client,
    pub company_snapshot: CompanyInfo,
    pub items: Vec<InvoiceItem>,
    pub subtotal: f64,
    pub tax: Option<f64>,
    pub total: f64,
    pub notes: Option<String>,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Clone)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub unit_price: Option<f64>,
    pub description: Option<Option<String>>,
}

impl TaskPatch {
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(unit_price) = self.unit_price {
            task.unit_price = unit_price;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub address: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
}

impl ClientPatch {
    pub fn apply(self, client: &mut Client) {
        if let Some(name) = self.name {
            client.name = name;
        }
        if let Some(address) = self.address {
            client.address = address;
        }
        if let Some(email) = self.email {
            client.email = email;
        }
        if let Some(phone) = self.phone {
            client.phone = phone;
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub address: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub vat: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub logo_base64: Option<Option<String>>,
}

impl CompanyPatch {
    pub fn apply(self, company: &mut CompanyInfo) {
        if let Some(name) = self.name {
            company.name = name;
        }
        if let Some(address) = self.address {
            company.address = address;
        }
        if let Some(email) = self.email {
            company.email = email;
        }
        if let Some(phone) = self.phone {
            company.phone = phone;
        }
        if let Some(vat) = self.vat {
            company.vat = vat;
        }
        if let Some(website) = self.website {
            company.website = website;
        }
        if let Some(logo) = self.logo_base64 {
            company.logo_base64 = logo;
        }
    }
}

/// Treats blank form input as "not set".
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn format_money(amount: f64, currency: &str) -> String {
    format!("{}{:.2}", currency, amount)
}

/// German short date, e.g. `5.3.2024`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%-d.%-m.%Y").to_string()
}
