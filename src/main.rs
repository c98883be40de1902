use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::Mutex,
};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::{
    cli::{Cli, Command},
    config::Config,
    database::Database,
    draft::{DraftError, InvoiceDraft},
    i18n::Translations,
    model::Invoice,
    pdf::{RenderedDocument, Renderer},
};

mod cli;
mod config;
mod database;
mod draft;
mod i18n;
mod layout;
mod model;
mod pdf;
mod tui;

/// Everything a command or screen needs: the store, settings and texts.
pub struct App {
    pub db: Database,
    pub config: Config,
    pub i18n: Translations,
}

impl App {
    pub fn renderer(&self) -> Renderer<'_> {
        Renderer {
            translations: &self.i18n,
            currency: &self.config.currency_symbol,
            file_name: &self.config.download_file_name,
        }
    }

    pub fn money(&self, amount: f64) -> String {
        model::format_money(amount, &self.config.currency_symbol)
    }

    /// Snapshots the client and company into an invoice record. Only new
    /// drafts read the current company; reopened ones keep their snapshot.
    pub fn finalize(&self, draft: &InvoiceDraft) -> Result<Invoice> {
        draft.check_complete()?;
        let company = match &draft.company {
            Some(company) => company.clone(),
            None => self.db.company()?.ok_or(DraftError::MissingCompany)?,
        };
        Ok(draft.finalize(&company, Utc::now())?)
    }

    /// Inserts a new invoice or replaces the one the draft was opened from.
    pub fn save_draft(&self, draft: &InvoiceDraft) -> Result<i64> {
        let invoice = self.finalize(draft)?;
        let id = match invoice.id {
            Some(id) => {
                self.db.update_invoice(id, &invoice)?;
                id
            }
            None => self.db.add_invoice(&invoice)?,
        };
        Ok(id)
    }

    pub fn preview_draft(&self, draft: &InvoiceDraft) -> Result<PathBuf> {
        let invoice = self.finalize(draft)?;
        let document = self.renderer().render(&invoice)?;
        Ok(document.write_preview()?)
    }

    pub fn render_invoice(&self, id: i64) -> Result<RenderedDocument> {
        let invoice = self
            .db
            .get_invoice(id)?
            .ok_or_else(|| anyhow!("no invoice with id {}", id))?;
        Ok(self.renderer().render(&invoice)?)
    }
}

fn log_dir() -> PathBuf {
    database::default_path()
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// The TUI owns the terminal, so it logs to a file; commands log to stderr.
fn init_logging(to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if to_file {
        let dir = log_dir();
        fs::create_dir_all(&dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("invoice-tui.log"))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let interactive = matches!(args.command, None | Some(Command::Tui));
    init_logging(interactive)?;

    let config_path = args.config.clone().or_else(Config::default_path);
    let mut config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(db) = args.db.clone() {
        config.database_path = Some(db);
    }
    debug!(?config, "configuration loaded");

    let db_path = config.database_path();
    let db = Database::open(&db_path)
        .with_context(|| format!("could not open database at {}", db_path.display()))?;
    let i18n = Translations::load(&config.locale)?;
    info!(locale = i18n.locale(), "starting");

    let app = App { db, config, i18n };
    match args.command {
        None | Some(Command::Tui) => tui::run(&app),
        Some(command) => cli::run(&app, command),
    }
}
