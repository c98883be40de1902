use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::{
    draft::InvoiceDraft,
    model::{
        format_date, non_empty, Client, ClientPatch, CompanyInfo, CompanyPatch, Invoice,
        InvoiceItem, InvoiceStatus, Task, TaskPatch,
    },
    App,
};

/// Local invoicing: company details, clients, tasks and invoices with PDF export.
#[derive(Parser)]
#[command(name = "invoice-tui", version)]
#[command(about = "Local-first invoicing with PDF export", long_about = None)]
pub struct Cli {
    /// Config file (defaults to <config dir>/invoice-tui/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage billable tasks
    #[command(subcommand)]
    Task(TaskCommand),
    /// Manage clients
    #[command(subcommand)]
    Client(ClientCommand),
    /// Show or set the company details printed on invoices
    #[command(subcommand)]
    Company(CompanyCommand),
    /// Create, edit and export invoices
    #[command(subcommand)]
    Invoice(InvoiceCommand),
    /// Start the terminal UI (the default)
    Tui,
}

#[derive(Subcommand)]
pub enum TaskCommand {
    Add {
        #[arg(long)]
        title: String,
        /// Unit price
        #[arg(long)]
        price: f64,
        #[arg(long)]
        description: Option<String>,
    },
    List,
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ClientCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    List,
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Saved invoices keep their copy of the client
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum CompanyCommand {
    Show,
    /// Creates the company record on first use, updates it afterwards
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        vat: Option<String>,
        #[arg(long)]
        website: Option<String>,
        /// Image file embedded as the company logo
        #[arg(long)]
        logo: Option<PathBuf>,
    },
}

#[derive(Args, Default)]
pub struct InvoiceArgs {
    /// Client id
    #[arg(long)]
    pub client: Option<i64>,
    /// Task id to bill; repeatable
    #[arg(long = "task")]
    pub tasks: Vec<i64>,
    /// Task id to drop together with its line item; repeatable
    #[arg(long = "remove-task")]
    pub remove_tasks: Vec<i64>,
    /// Free line item as "title:qty:price"; repeatable
    #[arg(long = "item", value_parser = parse_item)]
    pub items: Vec<InvoiceItem>,
    #[arg(long)]
    pub tax: Option<f64>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub number: Option<String>,
    #[arg(long)]
    pub status: Option<InvoiceStatus>,
    /// Due date, YYYY-MM-DD
    #[arg(long)]
    pub due: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum InvoiceCommand {
    List,
    Show {
        id: i64,
    },
    New(InvoiceArgs),
    Edit {
        id: i64,
        #[command(flatten)]
        args: InvoiceArgs,
    },
    Status {
        id: i64,
        status: InvoiceStatus,
    },
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Write the invoice PDF under the download name
    Pdf {
        id: i64,
        /// Target directory (defaults to export_dir from the config)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write the PDF to a temporary file and print its path
    Preview {
        id: i64,
    },
}

/// Parses `title:qty:price`. The title may itself contain colons.
pub fn parse_item(raw: &str) -> Result<InvoiceItem, String> {
    let mut parts = raw.rsplitn(3, ':');
    let (price, qty, title) = match (parts.next(), parts.next(), parts.next()) {
        (Some(price), Some(qty), Some(title)) => (price, qty, title),
        _ => return Err(format!("expected title:qty:price, got '{}'", raw)),
    };
    if title.trim().is_empty() {
        return Err("item title must not be empty".to_string());
    }
    let qty = qty
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid quantity '{}': {}", qty, e))?;
    let price = price
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid price '{}': {}", price, e))?;
    Ok(InvoiceItem::new(title.trim(), qty, price))
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Asks on the terminal. Anything but an explicit yes keeps the record.
fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let confirmed = is_yes(&answer);
    if !confirmed {
        info!("delete cancelled");
    }
    Ok(confirmed)
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "j" | "ja"
    )
}

pub fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Task(command) => run_task(app, command),
        Command::Client(command) => run_client(app, command),
        Command::Company(command) => run_company(app, command),
        Command::Invoice(command) => run_invoice(app, command),
        Command::Tui => crate::tui::run(app),
    }
}

fn run_task(app: &App, command: TaskCommand) -> Result<()> {
    match command {
        TaskCommand::Add {
            title,
            price,
            description,
        } => {
            let mut task = Task::new(title.trim(), price);
            task.description = description.as_deref().and_then(non_empty);
            task.validate()?;
            let id = app.db.add_task(&task)?;
            println!("{}", id);
        }
        TaskCommand::List => {
            let tasks = app.db.fetch_tasks()?;
            if tasks.is_empty() {
                println!("{}", app.i18n.t("task.no_tasks"));
            }
            for task in tasks {
                println!(
                    "{:>4}  {:<30}  {:>10}  {}",
                    task.id.unwrap_or_default(),
                    task.title,
                    app.money(task.unit_price),
                    task.description.unwrap_or_default()
                );
            }
        }
        TaskCommand::Edit {
            id,
            title,
            price,
            description,
        } => {
            let mut task = app
                .db
                .get_task(id)?
                .ok_or_else(|| anyhow!("no task with id {}", id))?;
            TaskPatch {
                title,
                unit_price: price,
                description: description.map(|d| non_empty(&d)),
            }
            .apply(&mut task);
            task.validate()?;
            app.db.update_task(id, &task)?;
            info!(id, "task updated");
        }
        TaskCommand::Delete { id, yes } => {
            if yes || confirm(app.i18n.t("task.confirm_delete"))? {
                app.db.delete_task(id)?;
            }
        }
    }
    Ok(())
}

fn run_client(app: &App, command: ClientCommand) -> Result<()> {
    match command {
        ClientCommand::Add {
            name,
            address,
            email,
            phone,
        } => {
            let client = Client {
                address: address.as_deref().and_then(non_empty),
                email: email.as_deref().and_then(non_empty),
                phone: phone.as_deref().and_then(non_empty),
                ..Client::new(name.trim())
            };
            client.validate()?;
            let id = app.db.add_client(&client)?;
            println!("{}", id);
        }
        ClientCommand::List => {
            let clients = app.db.fetch_clients()?;
            if clients.is_empty() {
                println!("{}", app.i18n.t("client.no_clients"));
            }
            for client in clients {
                println!(
                    "{:>4}  {:<30}  {:<30}  {}",
                    client.id.unwrap_or_default(),
                    client.name,
                    client.email.unwrap_or_default(),
                    client.phone.unwrap_or_default()
                );
            }
        }
        ClientCommand::Edit {
            id,
            name,
            address,
            email,
            phone,
        } => {
            let mut client = app
                .db
                .get_client(id)?
                .ok_or_else(|| anyhow!("no client with id {}", id))?;
            ClientPatch {
                name,
                address: address.map(|a| non_empty(&a)),
                email: email.map(|e| non_empty(&e)),
                phone: phone.map(|p| non_empty(&p)),
            }
            .apply(&mut client);
            client.validate()?;
            app.db.update_client(id, &client)?;
            info!(id, "client updated");
        }
        ClientCommand::Delete { id, yes } => {
            if yes || confirm(app.i18n.t("client.confirm_delete"))? {
                app.db.delete_client(id)?;
            }
        }
    }
    Ok(())
}

fn print_company(app: &App, company: &CompanyInfo) {
    let i18n = &app.i18n;
    println!("{}: {}", i18n.t("company.name"), company.name);
    let optional = [
        ("company.address", &company.address),
        ("company.email", &company.email),
        ("company.phone", &company.phone),
        ("company.vat", &company.vat),
        ("company.website", &company.website),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            println!("{}: {}", i18n.t(key), value);
        }
    }
    if company.logo_base64.is_some() {
        let size = company.logo_bytes().map(|b| b.len()).unwrap_or_default();
        println!("{}: {} bytes", i18n.t("company.logo"), size);
    }
}

fn run_company(app: &App, command: CompanyCommand) -> Result<()> {
    match command {
        CompanyCommand::Show => match app.db.company()? {
            Some(company) => print_company(app, &company),
            None => println!("{}", app.i18n.t("company.missing")),
        },
        CompanyCommand::Set {
            name,
            address,
            email,
            phone,
            vat,
            website,
            logo,
        } => {
            let mut company = app.db.company()?.unwrap_or_default();
            CompanyPatch {
                name: name.map(|n| n.trim().to_string()),
                address: address.map(|v| non_empty(&v)),
                email: email.map(|v| non_empty(&v)),
                phone: phone.map(|v| non_empty(&v)),
                vat: vat.map(|v| non_empty(&v)),
                website: website.map(|v| non_empty(&v)),
                logo_base64: None,
            }
            .apply(&mut company);
            if let Some(path) = logo {
                let bytes = fs::read(&path)?;
                company.set_logo(mime_for(&path), &bytes);
            }
            company.validate()?;
            app.db.save_company(&company)?;
            println!("{}", app.i18n.t("company.saved"));
        }
    }
    Ok(())
}

/// Applies command-line options to a draft, in the same order the form does:
/// client, task removals, task additions, free items, then the fields.
fn apply_args(app: &App, mut draft: InvoiceDraft, args: InvoiceArgs) -> Result<InvoiceDraft> {
    if let Some(id) = args.client {
        let client = app
            .db
            .get_client(id)?
            .ok_or_else(|| anyhow!("no client with id {}", id))?;
        draft = draft.with_client(Some(client));
    }
    for id in args.remove_tasks {
        draft = draft.remove_task(id);
    }
    for id in args.tasks {
        let task = app
            .db
            .get_task(id)?
            .ok_or_else(|| anyhow!("no task with id {}", id))?;
        draft = draft.add_task(&task);
    }
    for item in args.items {
        draft = draft.add_item(item);
    }
    if let Some(tax) = args.tax {
        draft = draft.with_tax(tax);
    }
    if let Some(notes) = args.notes {
        draft = draft.with_notes(notes);
    }
    if let Some(number) = args.number {
        draft = draft.with_invoice_number(number);
    }
    if let Some(status) = args.status {
        draft = draft.with_status(status);
    }
    if args.due.is_some() {
        draft = draft.with_due_date(args.due);
    }
    Ok(draft)
}

fn invoice_line(app: &App, invoice: &Invoice) -> String {
    format!(
        "{:>4}  {:<10}  {:<24}  {:<10}  {:>12}  {}",
        invoice.id.unwrap_or_default(),
        invoice.invoice_number,
        invoice.client_snapshot.name,
        format_date(invoice.created_at.with_timezone(&Local).date_naive()),
        app.money(invoice.total),
        app.i18n.t(invoice.status.label_key())
    )
}

fn print_invoice(app: &App, invoice: &Invoice) {
    let i18n = &app.i18n;
    println!("{}: {}", i18n.t("invoice.number"), invoice.invoice_number);
    println!(
        "{}: {}",
        i18n.t("invoice.date"),
        format_date(invoice.created_at.with_timezone(&Local).date_naive())
    );
    println!("{}: {}", i18n.t("invoice.client"), invoice.client_snapshot.name);
    println!("{}: {}", i18n.t("invoice.status"), i18n.t(invoice.status.label_key()));
    println!();
    for item in &invoice.items {
        println!(
            "  {:<30}  {:>6}  {:>10}  {:>10}",
            item.title,
            item.qty,
            app.money(item.price),
            app.money(item.total)
        );
    }
    println!();
    println!("{}: {}", i18n.t("invoice.subtotal"), app.money(invoice.subtotal));
    if let Some(tax) = invoice.tax.filter(|tax| *tax > 0.0) {
        println!("{}: {}", i18n.t("invoice.tax"), app.money(tax));
    }
    println!("{}: {}", i18n.t("invoice.total"), app.money(invoice.total));
    if let Some(notes) = &invoice.notes {
        println!();
        println!("{}:", i18n.t("invoice.notes"));
        println!("{}", notes);
    }
}

fn run_invoice(app: &App, command: InvoiceCommand) -> Result<()> {
    match command {
        InvoiceCommand::List => {
            let invoices = app.db.fetch_invoices()?;
            if invoices.is_empty() {
                println!("{}", app.i18n.t("invoice.no_invoices"));
            }
            for invoice in &invoices {
                println!("{}", invoice_line(app, invoice));
            }
        }
        InvoiceCommand::Show { id } => {
            let invoice = app
                .db
                .get_invoice(id)?
                .ok_or_else(|| anyhow!("no invoice with id {}", id))?;
            print_invoice(app, &invoice);
        }
        InvoiceCommand::New(args) => {
            let draft = InvoiceDraft::new(app.db.next_invoice_number()?);
            let draft = apply_args(app, draft, args)?;
            let id = app.save_draft(&draft)?;
            println!("{}", id);
        }
        InvoiceCommand::Edit { id, args } => {
            let invoice = app
                .db
                .get_invoice(id)?
                .ok_or_else(|| anyhow!("no invoice with id {}", id))?;
            let draft = InvoiceDraft::from_invoice(&invoice, &app.db.fetch_tasks()?);
            let draft = apply_args(app, draft, args)?;
            app.save_draft(&draft)?;
        }
        InvoiceCommand::Status { id, status } => app.db.set_invoice_status(id, status)?,
        InvoiceCommand::Delete { id, yes } => {
            if yes || confirm(app.i18n.t("invoice.confirm_delete"))? {
                app.db.delete_invoice(id)?;
            }
        }
        InvoiceCommand::Pdf { id, out } => {
            let document = app.render_invoice(id)?;
            let dir = out.unwrap_or_else(|| app.config.export_dir());
            let path = document.save_to(&dir)?;
            println!("{}", path.display());
        }
        InvoiceCommand::Preview { id } => {
            let document = app.render_invoice(id)?;
            let path = document.write_preview()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, database::Database, i18n::Translations};
    use clap::CommandFactory;

    fn app() -> App {
        App {
            db: Database::in_memory().unwrap(),
            config: Config::default(),
            i18n: Translations::load("de").unwrap(),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn items_parse_from_the_right() {
        let item = parse_item("Hosting: Mai:2:12.5").unwrap();
        assert_eq!(item.title, "Hosting: Mai");
        assert_eq!(item.qty, 2.0);
        assert_eq!(item.total, 25.0);
        assert!(parse_item("Hosting:2").is_err());
        assert!(parse_item(":1:1").is_err());
        assert!(parse_item("Hosting:zwei:1").is_err());
    }

    #[test]
    fn invoice_new_subcommand_parses() {
        let cli = Cli::try_parse_from([
            "invoice-tui",
            "invoice",
            "new",
            "--client",
            "1",
            "--task",
            "2",
            "--task",
            "3",
            "--item",
            "Reisekosten:1:42.5",
            "--tax",
            "19",
            "--status",
            "sent",
            "--due",
            "2026-11-02",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Invoice(InvoiceCommand::New(args))) => {
                assert_eq!(args.client, Some(1));
                assert_eq!(args.tasks, vec![2, 3]);
                assert_eq!(args.items.len(), 1);
                assert_eq!(args.status, Some(InvoiceStatus::Sent));
                assert_eq!(args.due, NaiveDate::from_ymd_opt(2026, 11, 2));
            }
            _ => panic!("expected invoice new"),
        }
    }

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["invoice-tui"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn deletes_ask_unless_yes_is_given() {
        let cli = Cli::try_parse_from(["invoice-tui", "client", "delete", "4"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Client(ClientCommand::Delete { id: 4, yes: false }))
        ));
        let cli = Cli::try_parse_from(["invoice-tui", "invoice", "delete", "4", "-y"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Invoice(InvoiceCommand::Delete { id: 4, yes: true }))
        ));

        let app = app();
        let id = app.db.add_task(&Task::new("Beratung", 100.0)).unwrap();
        run_task(&app, TaskCommand::Delete { id, yes: true }).unwrap();
        assert!(app.db.get_task(id).unwrap().is_none());
    }

    #[test]
    fn only_an_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" Ja "));
        assert!(is_yes("YES"));
        assert!(!is_yes("\n"));
        assert!(!is_yes("n"));
        assert!(!is_yes("nein"));
    }

    #[test]
    fn invalid_task_is_rejected_without_writing() {
        let app = app();
        let result = run_task(
            &app,
            TaskCommand::Add {
                title: "Beratung".to_string(),
                price: 0.0,
                description: None,
            },
        );
        assert!(result.is_err());
        assert!(app.db.fetch_tasks().unwrap().is_empty());
    }

    #[test]
    fn invoice_without_items_is_not_saved() {
        let app = app();
        app.db.save_company(&CompanyInfo::new("Meine Firma")).unwrap();
        let client = app.db.add_client(&Client::new("Acme")).unwrap();
        let result = run_invoice(
            &app,
            InvoiceCommand::New(InvoiceArgs {
                client: Some(client),
                ..Default::default()
            }),
        );
        assert!(result.is_err());
        assert!(app.db.fetch_invoices().unwrap().is_empty());
    }

    #[test]
    fn invoice_requires_company_details() {
        let app = app();
        let client = app.db.add_client(&Client::new("Acme")).unwrap();
        let task = app.db.add_task(&Task::new("Beratung", 100.0)).unwrap();
        let result = run_invoice(
            &app,
            InvoiceCommand::New(InvoiceArgs {
                client: Some(client),
                tasks: vec![task],
                ..Default::default()
            }),
        );
        assert!(result.is_err());
        assert!(app.db.fetch_invoices().unwrap().is_empty());
    }

    #[test]
    fn new_then_edit_invoice() {
        let app = app();
        app.db.save_company(&CompanyInfo::new("Meine Firma")).unwrap();
        let client = app.db.add_client(&Client::new("Acme")).unwrap();
        let beratung = app.db.add_task(&Task::new("Beratung", 100.0)).unwrap();

        run_invoice(
            &app,
            InvoiceCommand::New(InvoiceArgs {
                client: Some(client),
                tasks: vec![beratung, beratung],
                tax: Some(19.0),
                ..Default::default()
            }),
        )
        .unwrap();
        let invoice = app.db.fetch_invoices().unwrap().remove(0);
        assert_eq!(invoice.invoice_number, "INV-0001");
        assert_eq!(invoice.items.len(), 1);
        assert_eq!(invoice.total, 119.0);

        let id = invoice.id.unwrap();
        run_invoice(
            &app,
            InvoiceCommand::Edit {
                id,
                args: InvoiceArgs {
                    remove_tasks: vec![beratung],
                    items: vec![InvoiceItem::new("Reisekosten", 1.0, 42.5)],
                    ..Default::default()
                },
            },
        )
        .unwrap();
        let edited = app.db.get_invoice(id).unwrap().unwrap();
        assert_eq!(app.db.fetch_invoices().unwrap().len(), 1);
        assert_eq!(edited.items.len(), 1);
        assert_eq!(edited.items[0].title, "Reisekosten");
        assert_eq!(edited.subtotal, 42.5);
        assert_eq!(edited.created_at, invoice.created_at);
    }

    #[test]
    fn pdf_command_writes_download_file() {
        let app = app();
        app.db.save_company(&CompanyInfo::new("Meine Firma")).unwrap();
        let client = app.db.add_client(&Client::new("Acme")).unwrap();
        let task = app.db.add_task(&Task::new("Beratung", 100.0)).unwrap();
        run_invoice(
            &app,
            InvoiceCommand::New(InvoiceArgs {
                client: Some(client),
                tasks: vec![task],
                ..Default::default()
            }),
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        run_invoice(
            &app,
            InvoiceCommand::Pdf {
                id: 1,
                out: Some(dir.path().to_path_buf()),
            },
        )
        .unwrap();
        let bytes = fs::read(dir.path().join("invoice.pdf")).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn company_set_creates_then_updates_singleton() {
        let app = app();
        run_company(
            &app,
            CompanyCommand::Set {
                name: Some("Meine Firma".to_string()),
                address: None,
                email: Some("info@firma.test".to_string()),
                phone: None,
                vat: None,
                website: None,
                logo: None,
            },
        )
        .unwrap();
        run_company(
            &app,
            CompanyCommand::Set {
                name: None,
                address: None,
                email: None,
                phone: None,
                vat: Some("DE123456789".to_string()),
                website: None,
                logo: None,
            },
        )
        .unwrap();
        let companies = app.db.fetch_companies().unwrap();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].email.as_deref(), Some("info@firma.test"));
        assert_eq!(companies[0].vat.as_deref(), Some("DE123456789"));
    }

    #[test]
    fn company_without_name_is_rejected() {
        let app = app();
        let result = run_company(
            &app,
            CompanyCommand::Set {
                name: None,
                address: Some("Hauptstraße 1".to_string()),
                email: None,
                phone: None,
                vat: None,
                website: None,
                logo: None,
            },
        );
        assert!(result.is_err());
        assert!(app.db.company().unwrap().is_none());
    }

    #[test]
    fn logo_mime_follows_extension() {
        assert_eq!(mime_for(Path::new("logo.PNG")), "image/png");
        assert_eq!(mime_for(Path::new("logo.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("logo")), "application/octet-stream");
    }
}
