use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::{
    Client, ClientPatch, CompanyInfo, CompanyPatch, Invoice, InvoiceStatus, Task, TaskPatch,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("sqlite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("could not encode or decode stored document: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("could not create data directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("no {0} with id {1}")]
    NotFound(&'static str, i64),
    #[error("corrupt {0} column: {1}")]
    Corrupt(&'static str, String),
}

pub type SqlResult<T> = std::result::Result<T, DatabaseError>;

/// `~/.invoice-tui/invoices.sqlite`, or a relative file when there is no home.
pub fn default_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".invoice-tui").join("invoices.sqlite"),
        None => PathBuf::from("invoices.sqlite"),
    }
}

/// The four record collections, backed by one SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> SqlResult<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.is_dir() {
                fs::create_dir_all(dir)?;
            }
        }
        info!(path = %path.display(), "opening invoice database");
        let db = Database {
            conn: Connection::open(path)?,
        };
        db.init()?;
        Ok(db)
    }

    pub fn in_memory() -> SqlResult<Self> {
        let db = Database {
            conn: Connection::open_in_memory()?,
        };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> SqlResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                unit_price REAL NOT NULL,
                description TEXT,
                created_at TEXT
            );
            CREATE INDEX IF NOT EXISTS tasks_title ON tasks (title);

            CREATE TABLE IF NOT EXISTS clients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                address TEXT,
                email TEXT,
                phone TEXT,
                created_at TEXT
            );
            CREATE INDEX IF NOT EXISTS clients_name ON clients (name);

            CREATE TABLE IF NOT EXISTS company (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                address TEXT,
                email TEXT,
                phone TEXT,
                vat TEXT,
                website TEXT,
                logo_base64 TEXT,
                created_at TEXT
            );

            CREATE TABLE IF NOT EXISTS invoices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                invoice_number TEXT NOT NULL,
                client_id INTEGER NOT NULL,
                client_snapshot TEXT NOT NULL,
                company_snapshot TEXT NOT NULL,
                items TEXT NOT NULL,
                subtotal REAL NOT NULL,
                tax REAL,
                total REAL NOT NULL,
                notes TEXT,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                due_date TEXT
            );
            CREATE INDEX IF NOT EXISTS invoices_number ON invoices (invoice_number);",
        )?;
        Ok(())
    }

    fn ensure_changed(changed: usize, collection: &'static str, id: i64) -> SqlResult<()> {
        match changed {
            0 => Err(DatabaseError::NotFound(collection, id)),
            _ => Ok(()),
        }
    }

    // Tasks

    pub fn add_task(&self, task: &Task) -> SqlResult<i64> {
        self.conn.execute(
            "INSERT INTO tasks (title, unit_price, description, created_at)
            VALUES (?1, ?2, ?3, ?4)",
            params![
                task.title,
                task.unit_price,
                task.description,
                task.created_at.unwrap_or_else(Utc::now).to_rfc3339()
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, title = %task.title, "task added");
        Ok(id)
    }

    pub fn update_task(&self, id: i64, task: &Task) -> SqlResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET
            title = ?2,
            unit_price = ?3,
            description = ?4
            WHERE id = ?1",
            params![id, task.title, task.unit_price, task.description],
        )?;
        Self::ensure_changed(changed, "task", id)
    }

    pub fn patch_task(&self, id: i64, patch: TaskPatch) -> SqlResult<Task> {
        let mut task = self.get_task(id)?.ok_or(DatabaseError::NotFound("task", id))?;
        patch.apply(&mut task);
        self.update_task(id, &task)?;
        Ok(task)
    }

    pub fn delete_task(&self, id: i64) -> SqlResult<()> {
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?", params![id])?;
        Self::ensure_changed(changed, "task", id)
    }

    pub fn get_task(&self, id: i64) -> SqlResult<Option<Task>> {
        let task = self
            .conn
            .query_row(
                "SELECT id, title, unit_price, description, created_at FROM tasks WHERE id = ?",
                params![id],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    pub fn fetch_tasks(&self) -> SqlResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, unit_price, description, created_at FROM tasks ORDER BY id",
        )?;
        let rows = stmt.query_map(params![], task_from_row)?;
        let tasks = rows.collect::<rusqlite::Result<Vec<Task>>>()?;
        Ok(tasks)
    }

    // Clients

    pub fn add_client(&self, client: &Client) -> SqlResult<i64> {
        self.conn.execute(
            "INSERT INTO clients (name, address, email, phone, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                client.name,
                client.address,
                client.email,
                client.phone,
                client.created_at.unwrap_or_else(Utc::now).to_rfc3339()
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, name = %client.name, "client added");
        Ok(id)
    }

    pub fn update_client(&self, id: i64, client: &Client) -> SqlResult<()> {
        let changed = self.conn.execute(
            "UPDATE clients SET
            name = ?2,
            address = ?3,
            email = ?4,
            phone = ?5
            WHERE id = ?1",
            params![id, client.name, client.address, client.email, client.phone],
        )?;
        Self::ensure_changed(changed, "client", id)
    }

    pub fn patch_client(&self, id: i64, patch: ClientPatch) -> SqlResult<Client> {
        let mut client = self
            .get_client(id)?
            .ok_or(DatabaseError::NotFound("client", id))?;
        patch.apply(&mut client);
        self.update_client(id, &client)?;
        Ok(client)
    }

    /// Invoices keep their own snapshot, so nothing else is touched.
    pub fn delete_client(&self, id: i64) -> SqlResult<()> {
        let changed = self.conn.execute("DELETE FROM clients WHERE id = ?", params![id])?;
        Self::ensure_changed(changed, "client", id)
    }

    pub fn get_client(&self, id: i64) -> SqlResult<Option<Client>> {
        let client = self
            .conn
            .query_row(
                "SELECT id, name, address, email, phone, created_at FROM clients WHERE id = ?",
                params![id],
                client_from_row,
            )
            .optional()?;
        Ok(client)
    }

    pub fn fetch_clients(&self) -> SqlResult<Vec<Client>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, address, email, phone, created_at FROM clients ORDER BY id",
        )?;
        let rows = stmt.query_map(params![], client_from_row)?;
        let clients = rows.collect::<rusqlite::Result<Vec<Client>>>()?;
        Ok(clients)
    }

    // Company

    pub fn add_company(&self, company: &CompanyInfo) -> SqlResult<i64> {
        self.conn.execute(
            "INSERT INTO company
                (name, address, email, phone, vat, website, logo_base64, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                company.name,
                company.address,
                company.email,
                company.phone,
                company.vat,
                company.website,
                company.logo_base64,
                company.created_at.unwrap_or_else(Utc::now).to_rfc3339()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_company(&self, id: i64, company: &CompanyInfo) -> SqlResult<()> {
        let changed = self.conn.execute(
            "UPDATE company SET
            name = ?2,
            address = ?3,
            email = ?4,
            phone = ?5,
            vat = ?6,
            website = ?7,
            logo_base64 = ?8
            WHERE id = ?1",
            params![
                id,
                company.name,
                company.address,
                company.email,
                company.phone,
                company.vat,
                company.website,
                company.logo_base64
            ],
        )?;
        Self::ensure_changed(changed, "company", id)
    }

    pub fn patch_company(&self, id: i64, patch: CompanyPatch) -> SqlResult<CompanyInfo> {
        let mut company = self
            .fetch_companies()?
            .into_iter()
            .find(|c| c.id == Some(id))
            .ok_or(DatabaseError::NotFound("company", id))?;
        patch.apply(&mut company);
        self.update_company(id, &company)?;
        Ok(company)
    }

    pub fn delete_company(&self, id: i64) -> SqlResult<()> {
        let changed = self.conn.execute("DELETE FROM company WHERE id = ?", params![id])?;
        Self::ensure_changed(changed, "company", id)
    }

    pub fn fetch_companies(&self) -> SqlResult<Vec<CompanyInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, address, email, phone, vat, website, logo_base64, created_at
            FROM company ORDER BY id",
        )?;
        let rows = stmt.query_map(params![], |row| {
            Ok(CompanyInfo {
                id: row.get(0)?,
                name: row.get(1)?,
                address: row.get(2)?,
                email: row.get(3)?,
                phone: row.get(4)?,
                vat: row.get(5)?,
                website: row.get(6)?,
                logo_base64: row.get(7)?,
                created_at: parse_timestamp(row.get::<_, Option<String>>(8)?),
            })
        })?;
        let companies = rows.collect::<rusqlite::Result<Vec<CompanyInfo>>>()?;
        Ok(companies)
    }

    /// The company record in use: the first one stored.
    pub fn company(&self) -> SqlResult<Option<CompanyInfo>> {
        Ok(self.fetch_companies()?.into_iter().next())
    }

    /// Inserts the record when it has no id yet, replaces it otherwise.
    pub fn save_company(&self, company: &CompanyInfo) -> SqlResult<i64> {
        match company.id {
            Some(id) => {
                self.update_company(id, company)?;
                Ok(id)
            }
            None => self.add_company(company),
        }
    }

    // Invoices

    pub fn add_invoice(&self, invoice: &Invoice) -> SqlResult<i64> {
        let row = InvoiceColumns::encode(invoice)?;
        self.conn.execute(
            "INSERT INTO invoices (invoice_number, client_id, client_snapshot, company_snapshot,
                items, subtotal, tax, total, notes, status, created_at, due_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                invoice.invoice_number,
                invoice.client_id,
                row.client_snapshot,
                row.company_snapshot,
                row.items,
                invoice.subtotal,
                invoice.tax,
                invoice.total,
                invoice.notes,
                invoice.status.as_str(),
                invoice.created_at.to_rfc3339(),
                row.due_date
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(id, number = %invoice.invoice_number, "invoice saved");
        Ok(id)
    }

    pub fn update_invoice(&self, id: i64, invoice: &Invoice) -> SqlResult<()> {
        let row = InvoiceColumns::encode(invoice)?;
        let changed = self.conn.execute(
            "UPDATE invoices SET
            invoice_number = ?2,
            client_id = ?3,
            client_snapshot = ?4,
            company_snapshot = ?5,
            items = ?6,
            subtotal = ?7,
            tax = ?8,
            total = ?9,
            notes = ?10,
            status = ?11,
            created_at = ?12,
            due_date = ?13
            WHERE id = ?1",
            params![
                id,
                invoice.invoice_number,
                invoice.client_id,
                row.client_snapshot,
                row.company_snapshot,
                row.items,
                invoice.subtotal,
                invoice.tax,
                invoice.total,
                invoice.notes,
                invoice.status.as_str(),
                invoice.created_at.to_rfc3339(),
                row.due_date
            ],
        )?;
        Self::ensure_changed(changed, "invoice", id)?;
        info!(id, number = %invoice.invoice_number, "invoice updated");
        Ok(())
    }

    pub fn set_invoice_status(&self, id: i64, status: InvoiceStatus) -> SqlResult<()> {
        let changed = self.conn.execute(
            "UPDATE invoices SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Self::ensure_changed(changed, "invoice", id)
    }

    pub fn delete_invoice(&self, id: i64) -> SqlResult<()> {
        let changed = self.conn.execute("DELETE FROM invoices WHERE id = ?", params![id])?;
        Self::ensure_changed(changed, "invoice", id)
    }

    pub fn get_invoice(&self, id: i64) -> SqlResult<Option<Invoice>> {
        let row = self
            .conn
            .query_row(
                &format!("{} WHERE id = ?", INVOICE_SELECT),
                params![id],
                InvoiceColumns::from_row,
            )
            .optional()?;
        row.map(InvoiceColumns::decode).transpose()
    }

    pub fn fetch_invoices(&self) -> SqlResult<Vec<Invoice>> {
        let mut stmt = self.conn.prepare(&format!("{} ORDER BY id", INVOICE_SELECT))?;
        let rows = stmt.query_map(params![], InvoiceColumns::from_row)?;
        let mut invoices = vec![];
        for row in rows {
            invoices.push(row?.decode()?);
        }
        Ok(invoices)
    }

    /// `INV-0001` style: invoice count plus one, skipping numbers already used.
    pub fn next_invoice_number(&self) -> SqlResult<String> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM invoices", params![], |row| row.get(0))?;
        let mut next = count + 1;
        loop {
            let candidate = format!("INV-{:04}", next);
            let taken: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM invoices WHERE invoice_number = ?",
                params![candidate],
                |row| row.get(0),
            )?;
            if taken == 0 {
                return Ok(candidate);
            }
            next += 1;
        }
    }
}

const INVOICE_SELECT: &str = "SELECT id, invoice_number, client_id, client_snapshot,
    company_snapshot, items, subtotal, tax, total, notes, status, created_at, due_date
    FROM invoices";

/// Invoice row as stored: snapshots and items are JSON text.
struct InvoiceColumns {
    id: Option<i64>,
    invoice_number: String,
    client_id: i64,
    client_snapshot: String,
    company_snapshot: String,
    items: String,
    subtotal: f64,
    tax: Option<f64>,
    total: f64,
    notes: Option<String>,
    status: String,
    created_at: String,
    due_date: Option<String>,
}

impl InvoiceColumns {
    fn encode(invoice: &Invoice) -> SqlResult<Self> {
        Ok(InvoiceColumns {
            id: invoice.id,
            invoice_number: invoice.invoice_number.clone(),
            client_id: invoice.client_id,
            client_snapshot: serde_json::to_string(&invoice.client_snapshot)?,
            company_snapshot: serde_json::to_string(&invoice.company_snapshot)?,
            items: serde_json::to_string(&invoice.items)?,
            subtotal: invoice.subtotal,
            tax: invoice.tax,
            total: invoice.total,
            notes: invoice.notes.clone(),
            status: invoice.status.as_str().to_string(),
            created_at: invoice.created_at.to_rfc3339(),
            due_date: invoice.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
        })
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(InvoiceColumns {
            id: row.get(0)?,
            invoice_number: row.get(1)?,
            client_id: row.get(2)?,
            client_snapshot: row.get(3)?,
            company_snapshot: row.get(4)?,
            items: row.get(5)?,
            subtotal: row.get(6)?,
            tax: row.get(7)?,
            total: row.get(8)?,
            notes: row.get(9)?,
            status: row.get(10)?,
            created_at: row.get(11)?,
            due_date: row.get(12)?,
        })
    }

    fn decode(self) -> SqlResult<Invoice> {
        let status = self
            .status
            .parse::<InvoiceStatus>()
            .map_err(|e| DatabaseError::Corrupt("status", e.to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| DatabaseError::Corrupt("created_at", e.to_string()))?
            .with_timezone(&Utc);
        Ok(Invoice {
            id: self.id,
            invoice_number: self.invoice_number,
            client_id: self.client_id,
            client_snapshot: serde_json::from_str(&self.client_snapshot)?,
            company_snapshot: serde_json::from_str(&self.company_snapshot)?,
            items: serde_json::from_str(&self.items)?,
            subtotal: self.subtotal,
            tax: self.tax,
            total: self.total,
            notes: self.notes,
            status,
            created_at,
            due_date: self
                .due_date
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        })
    }
}

fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        unit_price: row.get(2)?,
        description: row.get(3)?,
        created_at: parse_timestamp(row.get::<_, Option<String>>(4)?),
    })
}

fn client_from_row(row: &Row) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        created_at: parse_timestamp(row.get::<_, Option<String>>(5)?),
    })
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|d| d.with_timezone(&Utc))
}
