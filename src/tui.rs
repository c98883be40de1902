use std::{
    cmp::min,
    io::{self, Stdout},
    mem,
    time::Duration,
};

use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::{Alignment, Constraint, CrosstermBackend, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Tabs},
    Terminal,
};
use tracing::{debug, error, info};

use crate::{
    draft::{DraftError, InvoiceDraft},
    model::{format_date, non_empty, Client, CompanyInfo, Invoice, Task},
    App,
};

#[derive(Debug, Copy, Clone, PartialEq)]
enum Section {
    Invoices,
    Clients,
    Tasks,
    Company,
}

const SECTIONS: [Section; 4] = [
    Section::Invoices,
    Section::Clients,
    Section::Tasks,
    Section::Company,
];

impl Section {
    fn title_key(self) -> &'static str {
        match self {
            Section::Invoices => "navigation.invoices",
            Section::Clients => "navigation.clients",
            Section::Tasks => "navigation.tasks",
            Section::Company => "navigation.company",
        }
    }

    fn confirm_key(self) -> &'static str {
        match self {
            Section::Invoices => "invoice.confirm_delete",
            Section::Clients => "client.confirm_delete",
            Section::Tasks => "task.confirm_delete",
            Section::Company => "common.delete",
        }
    }

    fn index(self) -> usize {
        SECTIONS.iter().position(|s| *s == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        SECTIONS[(self.index() + 1) % SECTIONS.len()]
    }
}

const COMPOSER_HELP: &str = concat!(
    "(space) task  (c) client  (e) edit row  (x) remove row  (t) tax  ",
    "(o) notes  (#) number  (S) status  (p) preview  (s) save  (q) cancel"
);

#[derive(Debug, Copy, Clone, PartialEq)]
enum InputField {
    TaskTitle,
    TaskPrice,
    TaskDescription,
    ClientName,
    ClientAddress,
    ClientEmail,
    ClientPhone,
    CompanyName,
    CompanyAddress,
    CompanyEmail,
    CompanyPhone,
    CompanyVat,
    CompanyWebsite,
    InvoiceNumber,
    InvoiceTax,
    InvoiceNotes,
    ItemQuantity,
    ItemPrice,
}

impl InputField {
    fn label_key(self) -> &'static str {
        match self {
            InputField::TaskTitle => "task.title",
            InputField::TaskPrice => "task.unit_price",
            InputField::TaskDescription => "task.description",
            InputField::ClientName => "client.name",
            InputField::ClientAddress => "client.address",
            InputField::ClientEmail => "client.email",
            InputField::ClientPhone => "client.phone",
            InputField::CompanyName => "company.name",
            InputField::CompanyAddress => "company.address",
            InputField::CompanyEmail => "company.email",
            InputField::CompanyPhone => "company.phone",
            InputField::CompanyVat => "company.vat",
            InputField::CompanyWebsite => "company.website",
            InputField::InvoiceNumber => "invoice.number",
            InputField::InvoiceTax => "invoice.tax",
            InputField::InvoiceNotes => "invoice.notes",
            InputField::ItemQuantity => "invoice.quantity",
            InputField::ItemPrice => "invoice.price",
        }
    }

    /// The screen an input returns to.
    fn owner(self) -> AppState {
        match self {
            InputField::TaskTitle | InputField::TaskPrice | InputField::TaskDescription => {
                AppState::TaskForm
            }
            InputField::ClientName
            | InputField::ClientAddress
            | InputField::ClientEmail
            | InputField::ClientPhone => AppState::ClientForm,
            InputField::CompanyName
            | InputField::CompanyAddress
            | InputField::CompanyEmail
            | InputField::CompanyPhone
            | InputField::CompanyVat
            | InputField::CompanyWebsite => AppState::CompanyForm,
            InputField::InvoiceNumber
            | InputField::InvoiceTax
            | InputField::InvoiceNotes
            | InputField::ItemQuantity
            | InputField::ItemPrice => AppState::Composer,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum AppState {
    List,
    TaskForm,
    ClientForm,
    CompanyForm,
    Composer,
    ConfirmDelete,
    Input(InputField),
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum ComposerFocus {
    Tasks,
    Items,
}

struct State {
    pub state: AppState,
    pub section: Section,
    pub input: String,
    pub list_state: ListState,
    pub tasks: Vec<Task>,
    pub clients: Vec<Client>,
    pub invoices: Vec<Invoice>,
    pub company: Option<CompanyInfo>,
    pub task_form: Task,
    pub client_form: Client,
    pub company_form: CompanyInfo,
    pub draft: InvoiceDraft,
    pub composer_focus: ComposerFocus,
    pub composer_tasks: ListState,
    pub composer_items: ListState,
    pub pending_qty: Option<f64>,
    pub message: Option<String>,
}

impl State {
    fn new() -> Self {
        State {
            state: AppState::List,
            section: Section::Invoices,
            input: "".to_string(),
            list_state: ListState::default(),
            tasks: vec![],
            clients: vec![],
            invoices: vec![],
            company: None,
            task_form: Task::new("", 0.0),
            client_form: Client::new(""),
            company_form: CompanyInfo::default(),
            draft: InvoiceDraft::default(),
            composer_focus: ComposerFocus::Tasks,
            composer_tasks: ListState::default(),
            composer_items: ListState::default(),
            pending_qty: None,
            message: None,
        }
    }

    /// Refetches every collection. A failed fetch keeps the previous rows.
    fn reload(&mut self, app: &App) {
        match app.db.fetch_tasks() {
            Ok(tasks) => self.tasks = tasks,
            Err(e) => error!(error = %e, "could not load tasks"),
        }
        match app.db.fetch_clients() {
            Ok(clients) => self.clients = clients,
            Err(e) => error!(error = %e, "could not load clients"),
        }
        match app.db.fetch_invoices() {
            Ok(invoices) => self.invoices = invoices,
            Err(e) => error!(error = %e, "could not load invoices"),
        }
        match app.db.company() {
            Ok(company) => self.company = company,
            Err(e) => error!(error = %e, "could not load company"),
        }
    }

    fn section_len(&self) -> usize {
        match self.section {
            Section::Invoices => self.invoices.len(),
            Section::Clients => self.clients.len(),
            Section::Tasks => self.tasks.len(),
            Section::Company => 0,
        }
    }

    /// Applies a fallible draft operation; on error the draft stays as it was.
    fn try_update_draft(
        &mut self,
        update: impl FnOnce(InvoiceDraft) -> Result<InvoiceDraft, DraftError>,
    ) {
        match update(self.draft.clone()) {
            Ok(draft) => self.draft = draft,
            Err(e) => debug!(error = %e, "draft left unchanged"),
        }
    }
}

pub fn run(app: &App) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, app);
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    Ok(terminal.show_cursor()?)
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &App) -> Result<()> {
    let mut state = State::new();
    state.reload(app);
    loop {
        match state.state {
            AppState::List => draw_lists(terminal, app, &mut state),
            AppState::TaskForm => draw_task_form(terminal, app, &state),
            AppState::ClientForm => draw_client_form(terminal, app, &state),
            AppState::CompanyForm => draw_company_form(terminal, app, &state),
            AppState::Composer => draw_composer(terminal, app, &mut state),
            AppState::ConfirmDelete => draw_confirm(terminal, app, &state),
            AppState::Input(field) => draw_input(terminal, app, &state, field),
        }

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let keep_running = match state.state {
                    AppState::List => handle_list_key(app, &mut state, key.code),
                    AppState::TaskForm => handle_task_form_key(app, &mut state, key.code),
                    AppState::ClientForm => handle_client_form_key(app, &mut state, key.code),
                    AppState::CompanyForm => handle_company_form_key(app, &mut state, key.code),
                    AppState::Composer => handle_composer_key(app, &mut state, key.code),
                    AppState::ConfirmDelete => handle_confirm_key(app, &mut state, key.code),
                    AppState::Input(field) => handle_input_key(&mut state, field, key.code),
                };
                if !keep_running {
                    break;
                }
            }
        }
    }
    info!("terminal ui closed");
    Ok(())
}

fn handle_list_key(app: &App, state: &mut State, code: KeyCode) -> bool {
    match code {
        KeyCode::Char('q') => return false,
        KeyCode::Tab | KeyCode::Char('l') => {
            state.section = state.section.next();
            state.list_state.select(None);
            state.message = None;
        }
        KeyCode::Char('j') => {
            let len = state.section_len();
            move_down(&mut state.list_state, len);
        }
        KeyCode::Char('k') => move_up(&mut state.list_state),
        KeyCode::Char('N') => open_new(app, state),
        KeyCode::Char('E') => open_edit(app, state),
        KeyCode::Char('D') => {
            if selected_id(state).is_some() {
                state.state = AppState::ConfirmDelete;
            }
        }
        KeyCode::Char('P') if state.section == Section::Invoices => download_selected(app, state),
        KeyCode::Char('p') if state.section == Section::Invoices => preview_selected(app, state),
        _ => {}
    }
    true
}

fn open_new(app: &App, state: &mut State) {
    state.message = None;
    match state.section {
        Section::Invoices => match app.db.next_invoice_number() {
            Ok(number) => {
                state.draft = InvoiceDraft::new(number);
                open_composer(state);
            }
            Err(e) => error!(error = %e, "could not number new invoice"),
        },
        Section::Clients => {
            state.client_form = Client::new("");
            state.state = AppState::ClientForm;
        }
        Section::Tasks => {
            state.task_form = Task::new("", 0.0);
            state.state = AppState::TaskForm;
        }
        Section::Company => open_company_form(state),
    }
}

fn open_edit(app: &App, state: &mut State) {
    state.message = None;
    if state.section == Section::Company {
        open_company_form(state);
        return;
    }
    let Some(index) = state.list_state.selected() else {
        return;
    };
    match state.section {
        Section::Invoices => {
            if let Some(invoice) = state.invoices.get(index) {
                state.draft = InvoiceDraft::from_invoice(invoice, &state.tasks);
                open_composer(state);
            }
        }
        Section::Clients => {
            if let Some(client) = state.clients.get(index) {
                state.client_form = client.clone();
                state.state = AppState::ClientForm;
            }
        }
        Section::Tasks => {
            if let Some(task) = state.tasks.get(index) {
                state.task_form = task.clone();
                state.state = AppState::TaskForm;
            }
        }
        Section::Company => {}
    }
    debug!(section = ?state.section, index, "editing {}", app.i18n.t(state.section.title_key()));
}

fn open_company_form(state: &mut State) {
    state.company_form = state.company.clone().unwrap_or_default();
    state.state = AppState::CompanyForm;
}

fn open_composer(state: &mut State) {
    state.composer_focus = ComposerFocus::Tasks;
    state.composer_tasks.select(None);
    state.composer_items.select(None);
    state.pending_qty = None;
    state.state = AppState::Composer;
}

/// The record id behind the highlighted row of the current section.
fn selected_id(state: &State) -> Option<i64> {
    let index = state.list_state.selected()?;
    match state.section {
        Section::Invoices => state.invoices.get(index).and_then(|i| i.id),
        Section::Clients => state.clients.get(index).and_then(|c| c.id),
        Section::Tasks => state.tasks.get(index).and_then(|t| t.id),
        Section::Company => None,
    }
}

fn handle_confirm_key(app: &App, state: &mut State, code: KeyCode) -> bool {
    if let KeyCode::Char('y') | KeyCode::Char('j') = code {
        delete_selected(app, state);
    } else {
        debug!(section = ?state.section, "delete cancelled");
    }
    state.state = AppState::List;
    true
}

fn delete_selected(app: &App, state: &mut State) {
    let Some(id) = selected_id(state) else {
        return;
    };
    let result = match state.section {
        Section::Invoices => app.db.delete_invoice(id),
        Section::Clients => app.db.delete_client(id),
        Section::Tasks => app.db.delete_task(id),
        Section::Company => return,
    };
    match result {
        Ok(()) => {
            state.reload(app);
            state.list_state.select(None);
        }
        Err(e) => error!(error = %e, "delete failed"),
    }
}

fn download_selected(app: &App, state: &mut State) {
    let Some(id) = selected_id(state) else {
        return;
    };
    let result = app
        .render_invoice(id)
        .and_then(|document| Ok(document.save_to(&app.config.export_dir())?));
    match result {
        Ok(path) => {
            state.message = Some(format!(
                "{}: {}",
                app.i18n.t("invoice.download"),
                path.display()
            ))
        }
        Err(e) => error!(error = %e, "could not export invoice"),
    }
}

fn preview_selected(app: &App, state: &mut State) {
    let Some(id) = selected_id(state) else {
        return;
    };
    let result = app
        .render_invoice(id)
        .and_then(|document| Ok(document.write_preview()?));
    match result {
        Ok(path) => {
            state.message = Some(format!(
                "{}: {}",
                app.i18n.t("invoice.preview"),
                path.display()
            ))
        }
        Err(e) => error!(error = %e, "could not render preview"),
    }
}

fn handle_task_form_key(app: &App, state: &mut State, code: KeyCode) -> bool {
    match code {
        KeyCode::Char('q') => state.state = AppState::List,
        KeyCode::Char('t') => start_input(state, InputField::TaskTitle),
        KeyCode::Char('u') => start_input(state, InputField::TaskPrice),
        KeyCode::Char('d') => start_input(state, InputField::TaskDescription),
        KeyCode::Char('s') => save_task(app, state),
        _ => {}
    }
    true
}

fn save_task(app: &App, state: &mut State) {
    if let Err(e) = state.task_form.validate() {
        debug!(error = %e, "task not saved");
        return;
    }
    let result = match state.task_form.id {
        Some(id) => app.db.update_task(id, &state.task_form),
        None => app.db.add_task(&state.task_form).map(|_| ()),
    };
    match result {
        Ok(()) => {
            state.reload(app);
            state.state = AppState::List;
        }
        Err(e) => error!(error = %e, "could not save task"),
    }
}

fn handle_client_form_key(app: &App, state: &mut State, code: KeyCode) -> bool {
    match code {
        KeyCode::Char('q') => state.state = AppState::List,
        KeyCode::Char('n') => start_input(state, InputField::ClientName),
        KeyCode::Char('a') => start_input(state, InputField::ClientAddress),
        KeyCode::Char('e') => start_input(state, InputField::ClientEmail),
        KeyCode::Char('p') => start_input(state, InputField::ClientPhone),
        KeyCode::Char('s') => save_client(app, state),
        _ => {}
    }
    true
}

fn save_client(app: &App, state: &mut State) {
    if let Err(e) = state.client_form.validate() {
        debug!(error = %e, "client not saved");
        return;
    }
    let result = match state.client_form.id {
        Some(id) => app.db.update_client(id, &state.client_form),
        None => app.db.add_client(&state.client_form).map(|_| ()),
    };
    match result {
        Ok(()) => {
            state.reload(app);
            state.state = AppState::List;
        }
        Err(e) => error!(error = %e, "could not save client"),
    }
}

fn handle_company_form_key(app: &App, state: &mut State, code: KeyCode) -> bool {
    match code {
        KeyCode::Char('q') => state.state = AppState::List,
        KeyCode::Char('n') => start_input(state, InputField::CompanyName),
        KeyCode::Char('a') => start_input(state, InputField::CompanyAddress),
        KeyCode::Char('e') => start_input(state, InputField::CompanyEmail),
        KeyCode::Char('p') => start_input(state, InputField::CompanyPhone),
        KeyCode::Char('v') => start_input(state, InputField::CompanyVat),
        KeyCode::Char('w') => start_input(state, InputField::CompanyWebsite),
        KeyCode::Char('s') => {
            if let Err(e) = state.company_form.validate() {
                debug!(error = %e, "company not saved");
                return true;
            }
            match app.db.save_company(&state.company_form) {
                Ok(_) => {
                    state.reload(app);
                    state.message = Some(app.i18n.t("company.saved").to_string());
                    state.state = AppState::List;
                }
                Err(e) => error!(error = %e, "could not save company"),
            }
        }
        _ => {}
    }
    true
}

fn handle_composer_key(app: &App, state: &mut State, code: KeyCode) -> bool {
    match code {
        KeyCode::Char('q') => {
            state.draft = mem::take(&mut state.draft).reset();
            state.message = None;
            state.state = AppState::List;
        }
        KeyCode::Tab => {
            state.composer_focus = match state.composer_focus {
                ComposerFocus::Tasks => ComposerFocus::Items,
                ComposerFocus::Items => ComposerFocus::Tasks,
            };
        }
        KeyCode::Char('j') => match state.composer_focus {
            ComposerFocus::Tasks => move_down(&mut state.composer_tasks, state.tasks.len()),
            ComposerFocus::Items => move_down(&mut state.composer_items, state.draft.items.len()),
        },
        KeyCode::Char('k') => match state.composer_focus {
            ComposerFocus::Tasks => move_up(&mut state.composer_tasks),
            ComposerFocus::Items => move_up(&mut state.composer_items),
        },
        KeyCode::Char(' ') if state.composer_focus == ComposerFocus::Tasks => {
            if let Some(task) = state.composer_tasks.selected().and_then(|i| state.tasks.get(i)) {
                let task = task.clone();
                state.draft = mem::take(&mut state.draft).toggle_task(&task);
            }
        }
        KeyCode::Char('c') => {
            let client = next_client(&state.clients, state.draft.client.as_ref());
            state.draft = mem::take(&mut state.draft).with_client(client);
        }
        KeyCode::Char('e') if state.composer_focus == ComposerFocus::Items => {
            if state.composer_items.selected().is_some() {
                start_input(state, InputField::ItemQuantity);
            }
        }
        KeyCode::Char('x') if state.composer_focus == ComposerFocus::Items => {
            if let Some(index) = state.composer_items.selected() {
                state.try_update_draft(|draft| draft.remove_item(index));
                state.composer_items.select(None);
            }
        }
        KeyCode::Char('t') => start_input(state, InputField::InvoiceTax),
        KeyCode::Char('o') => start_input(state, InputField::InvoiceNotes),
        KeyCode::Char('#') => start_input(state, InputField::InvoiceNumber),
        KeyCode::Char('S') => {
            let status = state.draft.status.next();
            state.draft = mem::take(&mut state.draft).with_status(status);
        }
        KeyCode::Char('p') => match app.preview_draft(&state.draft) {
            Ok(path) => {
                state.message = Some(format!(
                    "{}: {}",
                    app.i18n.t("invoice.preview"),
                    path.display()
                ))
            }
            Err(e) => report_draft_error(app, state, e, "could not render preview"),
        },
        KeyCode::Char('s') => match app.save_draft(&state.draft) {
            Ok(_) => {
                state.draft = mem::take(&mut state.draft).reset();
                state.message = None;
                state.reload(app);
                state.state = AppState::List;
            }
            Err(e) => report_draft_error(app, state, e, "could not save invoice"),
        },
        _ => {}
    }
    true
}

/// Incomplete drafts get the form hint; anything else is logged.
fn report_draft_error(app: &App, state: &mut State, e: anyhow::Error, context: &str) {
    match e.downcast_ref::<DraftError>() {
        Some(DraftError::MissingCompany) => {
            state.message = Some(app.i18n.t("company.missing").to_string())
        }
        Some(_) => state.message = Some(app.i18n.t("invoice.incomplete").to_string()),
        None => error!(error = %e, "{}", context),
    }
}

/// The client after the current one, wrapping around.
fn next_client(clients: &[Client], current: Option<&Client>) -> Option<Client> {
    if clients.is_empty() {
        return None;
    }
    let next = match current.and_then(|c| clients.iter().position(|other| other.id == c.id)) {
        Some(index) => (index + 1) % clients.len(),
        None => 0,
    };
    clients.get(next).cloned()
}

fn start_input(state: &mut State, field: InputField) {
    state.input = current_value(state, field);
    state.state = AppState::Input(field);
}

fn current_value(state: &State, field: InputField) -> String {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let item = state
        .composer_items
        .selected()
        .and_then(|index| state.draft.items.get(index));
    match field {
        InputField::TaskTitle => state.task_form.title.clone(),
        InputField::TaskPrice => format!("{:.2}", state.task_form.unit_price),
        InputField::TaskDescription => text(&state.task_form.description),
        InputField::ClientName => state.client_form.name.clone(),
        InputField::ClientAddress => text(&state.client_form.address),
        InputField::ClientEmail => text(&state.client_form.email),
        InputField::ClientPhone => text(&state.client_form.phone),
        InputField::CompanyName => state.company_form.name.clone(),
        InputField::CompanyAddress => text(&state.company_form.address),
        InputField::CompanyEmail => text(&state.company_form.email),
        InputField::CompanyPhone => text(&state.company_form.phone),
        InputField::CompanyVat => text(&state.company_form.vat),
        InputField::CompanyWebsite => text(&state.company_form.website),
        InputField::InvoiceNumber => state.draft.invoice_number.clone(),
        InputField::InvoiceTax => format!("{:.2}", state.draft.tax),
        InputField::InvoiceNotes => state.draft.notes.clone(),
        InputField::ItemQuantity => item.map(|i| i.qty.to_string()).unwrap_or_default(),
        InputField::ItemPrice => item.map(|i| format!("{:.2}", i.price)).unwrap_or_default(),
    }
}

/// Accepts `12.5` as well as `12,5`.
fn parse_amount(input: &str) -> Option<f64> {
    input
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn handle_input_key(state: &mut State, field: InputField, code: KeyCode) -> bool {
    match code {
        KeyCode::Char(c) => state.input.push(c),
        KeyCode::Backspace => {
            state.input.pop();
        }
        KeyCode::Esc => {
            state.input = "".to_string();
            state.pending_qty = None;
            state.state = field.owner();
        }
        KeyCode::Enter => {
            let input = mem::take(&mut state.input);
            state.state = field.owner();
            apply_input(state, field, &input);
        }
        _ => {}
    }
    true
}

fn apply_input(state: &mut State, field: InputField, input: &str) {
    match field {
        InputField::TaskTitle => state.task_form.title = input.trim().to_string(),
        // Unparseable prices become 0 and fail validation on save.
        InputField::TaskPrice => state.task_form.unit_price = parse_amount(input).unwrap_or(0.0),
        InputField::TaskDescription => state.task_form.description = non_empty(input),
        InputField::ClientName => state.client_form.name = input.trim().to_string(),
        InputField::ClientAddress => state.client_form.address = non_empty(input),
        InputField::ClientEmail => state.client_form.email = non_empty(input),
        InputField::ClientPhone => state.client_form.phone = non_empty(input),
        InputField::CompanyName => state.company_form.name = input.trim().to_string(),
        InputField::CompanyAddress => state.company_form.address = non_empty(input),
        InputField::CompanyEmail => state.company_form.email = non_empty(input),
        InputField::CompanyPhone => state.company_form.phone = non_empty(input),
        InputField::CompanyVat => state.company_form.vat = non_empty(input),
        InputField::CompanyWebsite => state.company_form.website = non_empty(input),
        InputField::InvoiceNumber => {
            state.draft = mem::take(&mut state.draft).with_invoice_number(input.trim())
        }
        InputField::InvoiceTax => {
            let tax = parse_amount(input).unwrap_or(0.0);
            state.draft = mem::take(&mut state.draft).with_tax(tax);
        }
        InputField::InvoiceNotes => state.draft = mem::take(&mut state.draft).with_notes(input),
        InputField::ItemQuantity => {
            state.pending_qty = Some(parse_amount(input).unwrap_or(1.0));
            start_input(state, InputField::ItemPrice);
        }
        InputField::ItemPrice => {
            let qty = state.pending_qty.take().unwrap_or(1.0);
            let price = parse_amount(input).unwrap_or(0.0);
            if let Some(index) = state.composer_items.selected() {
                state.try_update_draft(|draft| draft.edit_item(index, qty, price));
            }
        }
    }
}

fn move_up(list_state: &mut ListState) {
    match list_state.selected() {
        Some(v) => {
            let max = match v {
                0 => None,
                v => Some(v - 1),
            };
            list_state.select(max);
        }
        None => {
            list_state.select(Some(0));
        }
    }
}

fn move_down(list_state: &mut ListState, len: usize) {
    if len == 0 {
        list_state.select(None);
        return;
    }
    match list_state.selected() {
        Some(v) => {
            list_state.select(Some(min(v + 1, len - 1)));
        }
        None => {
            list_state.select(Some(0));
        }
    }
}

fn invoice_row(app: &App, invoice: &Invoice) -> String {
    format!(
        "{:<10} {:<24} {:<10} {:>12} {}",
        invoice.invoice_number,
        invoice.client_snapshot.name,
        format_date(invoice.created_at.with_timezone(&Local).date_naive()),
        app.money(invoice.total),
        app.i18n.t(invoice.status.label_key())
    )
}

fn company_lines(app: &App, company: Option<&CompanyInfo>) -> Vec<Line<'static>> {
    let Some(company) = company else {
        return vec![Line::from(app.i18n.t("company.missing").to_string())];
    };
    let mut lines = vec![Line::from(Span::styled(
        company.name.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    let optional = [
        ("company.address", &company.address),
        ("company.email", &company.email),
        ("company.phone", &company.phone),
        ("company.vat", &company.vat),
        ("company.website", &company.website),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            lines.push(Line::from(format!("{}: {}", app.i18n.t(key), value)));
        }
    }
    if company.logo_base64.is_some() {
        lines.push(Line::from(format!("{}: ✓", app.i18n.t("company.logo"))));
    }
    lines
}

fn draw_lists(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &App, state: &mut State) {
    let titles: Vec<_> = SECTIONS
        .iter()
        .map(|s| Line::from(app.i18n.t(s.title_key()).to_string()))
        .collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().title(app.i18n.t("app.title").to_string()).borders(Borders::ALL))
        .select(state.section.index())
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow));

    let rows: Vec<String> = match state.section {
        Section::Invoices => state.invoices.iter().map(|i| invoice_row(app, i)).collect(),
        Section::Clients => state
            .clients
            .iter()
            .map(|c| format!("{:<30} {}", c.name, c.email.clone().unwrap_or_default()))
            .collect(),
        Section::Tasks => state
            .tasks
            .iter()
            .map(|t| format!("{:<30} {:>12}", t.title, app.money(t.unit_price)))
            .collect(),
        Section::Company => vec![],
    };
    let empty_key = match state.section {
        Section::Invoices => "invoice.no_invoices",
        Section::Clients => "client.no_clients",
        Section::Tasks => "task.no_tasks",
        Section::Company => "company.missing",
    };
    let items: Vec<_> = rows.into_iter().map(ListItem::new).collect();
    let list_title = app.i18n.t(state.section.title_key()).to_string();
    let is_empty = items.is_empty();
    let list_ui = List::new(items)
        .block(Block::default().title(list_title.clone()).borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().add_modifier(Modifier::ITALIC))
        .highlight_symbol(">>");

    let help = match state.section {
        Section::Invoices => {
            "(N) new  (E) edit  (D) delete  (p) preview  (P) download  (Tab) next  (q) quit"
        }
        Section::Company => "(E) edit  (Tab) next  (q) quit",
        _ => "(N) new  (E) edit  (D) delete  (Tab) next  (q) quit",
    };
    let footer = match &state.message {
        Some(message) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Green),
        )),
        None => Line::from(help),
    };
    let company = company_lines(app, state.company.as_ref());
    let empty_text = app.i18n.t(empty_key).to_string();

    terminal
        .draw(|frame| {
            let size = frame.size();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Min(3),
                        Constraint::Length(1),
                    ]
                    .as_ref(),
                )
                .split(size);

            frame.render_widget(tabs, chunks[0]);
            if state.section == Section::Company {
                frame.render_widget(
                    Paragraph::new(company.clone()).block(
                        Block::default()
                            .title(list_title.clone())
                            .borders(Borders::ALL)
                            .border_type(BorderType::Rounded),
                    ),
                    chunks[1],
                );
            } else if is_empty {
                frame.render_widget(
                    Paragraph::new(empty_text.clone())
                        .block(Block::default().title(list_title.clone()).borders(Borders::ALL))
                        .alignment(Alignment::Center),
                    chunks[1],
                );
            } else {
                frame.render_stateful_widget(list_ui, chunks[1], &mut state.list_state);
            }
            frame.render_widget(Paragraph::new(footer.clone()), chunks[2]);
        })
        .ok();
}

/// One row per field: hotkey, label and current value.
fn draw_form(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &App,
    title: &str,
    fields: &[(char, &str, String)],
) {
    let mut text: Vec<Line> = fields
        .iter()
        .map(|(key, label, value)| {
            Line::from(format!("({}) {:<18} {}", key, app.i18n.t(label), value))
        })
        .collect();
    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        format!("(s) {}", app.i18n.t("common.save")),
        Style::default().fg(Color::Green).add_modifier(Modifier::ITALIC),
    )));
    text.push(Line::from(Span::styled(
        format!("(q) {}", app.i18n.t("common.cancel")),
        Style::default().fg(Color::Red),
    )));

    terminal
        .draw(|frame| {
            let size = frame.size();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(2)
                .constraints([Constraint::Length(2), Constraint::Min(5)].as_ref())
                .split(size);

            frame.render_widget(
                Paragraph::new(title.to_string())
                    .style(Style::default())
                    .alignment(Alignment::Center),
                chunks[0],
            );
            frame.render_widget(
                Paragraph::new(text.clone()).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded),
                ),
                chunks[1],
            );
        })
        .ok();
}

fn draw_task_form(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &App, state: &State) {
    let form = &state.task_form;
    let title = match form.id {
        Some(_) => app.i18n.t("task.edit"),
        None => app.i18n.t("task.new"),
    };
    draw_form(
        terminal,
        app,
        title,
        &[
            ('t', "task.title", form.title.clone()),
            ('u', "task.unit_price", app.money(form.unit_price)),
            ('d', "task.description", form.description.clone().unwrap_or_default()),
        ],
    );
}

fn draw_client_form(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &App, state: &State) {
    let form = &state.client_form;
    let title = match form.id {
        Some(_) => app.i18n.t("client.edit"),
        None => app.i18n.t("client.new"),
    };
    draw_form(
        terminal,
        app,
        title,
        &[
            ('n', "client.name", form.name.clone()),
            ('a', "client.address", form.address.clone().unwrap_or_default()),
            ('e', "client.email", form.email.clone().unwrap_or_default()),
            ('p', "client.phone", form.phone.clone().unwrap_or_default()),
        ],
    );
}

fn draw_company_form(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &App, state: &State) {
    let form = &state.company_form;
    draw_form(
        terminal,
        app,
        app.i18n.t("company.title"),
        &[
            ('n', "company.name", form.name.clone()),
            ('a', "company.address", form.address.clone().unwrap_or_default()),
            ('e', "company.email", form.email.clone().unwrap_or_default()),
            ('p', "company.phone", form.phone.clone().unwrap_or_default()),
            ('v', "company.vat", form.vat.clone().unwrap_or_default()),
            ('w', "company.website", form.website.clone().unwrap_or_default()),
        ],
    );
}

fn draw_composer(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &App, state: &mut State) {
    let draft = &state.draft;
    let t = &app.i18n;
    let heading = match draft.invoice_id {
        Some(_) => t.t("invoice.edit"),
        None => t.t("invoice.create"),
    };
    let header = vec![
        Line::from(Span::styled(
            heading.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "{}: {}   {}: {}   {}: {}",
            t.t("invoice.number"),
            draft.invoice_number,
            t.t("invoice.status"),
            t.t(draft.status.label_key()),
            t.t("invoice.client"),
            draft
                .client
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("- ({})", t.t("invoice.select_client")))
        )),
    ];

    let task_items: Vec<_> = state
        .tasks
        .iter()
        .map(|task| {
            ListItem::new(format!(
                "{} {} {}",
                if task.id.is_some_and(|id| draft.is_selected(id)) {
                    "[x]"
                } else {
                    "[ ]"
                },
                task.title,
                app.money(task.unit_price)
            ))
        })
        .collect();
    let line_items: Vec<_> = draft
        .items
        .iter()
        .map(|item| {
            ListItem::new(format!(
                "{:<24} {:>6} {:>10} {:>10}",
                item.title,
                item.qty,
                app.money(item.price),
                app.money(item.total)
            ))
        })
        .collect();

    let focused = |focus: ComposerFocus| {
        if state.composer_focus == focus {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    };
    let tasks_ui = List::new(task_items)
        .block(
            Block::default()
                .title(t.t("invoice.select_tasks").to_string())
                .borders(Borders::ALL)
                .border_style(focused(ComposerFocus::Tasks)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::ITALIC))
        .highlight_symbol(">>");
    let items_title = if draft.items.is_empty() {
        format!("{} - {}", t.t("invoice.items"), t.t("invoice.no_items"))
    } else {
        t.t("invoice.items").to_string()
    };
    let items_ui = List::new(line_items)
        .block(
            Block::default()
                .title(items_title)
                .borders(Borders::ALL)
                .border_style(focused(ComposerFocus::Items)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::ITALIC))
        .highlight_symbol(">>");

    let mut totals = vec![Line::from(format!(
        "{}: {}",
        t.t("invoice.subtotal"),
        app.money(draft.subtotal())
    ))];
    if draft.tax > 0.0 {
        totals.push(Line::from(format!("{}: {}", t.t("invoice.tax"), app.money(draft.tax))));
    }
    totals.push(Line::from(Span::styled(
        format!("{}: {}", t.t("invoice.total"), app.money(draft.total())),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if !draft.notes.is_empty() {
        totals.push(Line::from(format!("{}: {}", t.t("invoice.notes"), draft.notes)));
    }

    let footer = match &state.message {
        Some(message) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(COMPOSER_HELP),
    };

    terminal
        .draw(|frame| {
            let size = frame.size();
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(4),
                        Constraint::Min(5),
                        Constraint::Length(6),
                        Constraint::Length(1),
                    ]
                    .as_ref(),
                )
                .split(size);
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(40), Constraint::Min(2)].as_ref())
                .split(rows[1]);

            frame.render_widget(
                Paragraph::new(header.clone()).block(Block::default().borders(Borders::ALL)),
                rows[0],
            );
            frame.render_stateful_widget(tasks_ui, columns[0], &mut state.composer_tasks);
            frame.render_stateful_widget(items_ui, columns[1], &mut state.composer_items);
            frame.render_widget(
                Paragraph::new(totals.clone())
                    .alignment(Alignment::Right)
                    .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded)),
                rows[2],
            );
            frame.render_widget(Paragraph::new(footer.clone()), rows[3]);
        })
        .ok();
}

fn draw_confirm(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &App, state: &State) {
    let text = vec![
        Line::from(app.i18n.t(state.section.confirm_key()).to_string()),
        Line::from(""),
        Line::from(Span::styled(
            format!("(y) {}", app.i18n.t("common.delete")),
            Style::default().fg(Color::Red),
        )),
        Line::from(format!("(n) {}", app.i18n.t("common.cancel"))),
    ];
    terminal
        .draw(|frame| {
            let size = frame.size();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(2)
                .constraints([Constraint::Length(6), Constraint::Min(0)].as_ref())
                .split(size);

            frame.render_widget(
                Paragraph::new(text.clone())
                    .block(
                        Block::default()
                            .title(app.i18n.t("common.delete").to_string())
                            .borders(Borders::ALL)
                            .border_type(BorderType::Rounded),
                    )
                    .alignment(Alignment::Center),
                chunks[0],
            );
        })
        .ok();
}

fn draw_input(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &App,
    state: &State,
    field: InputField,
) {
    let label = app.i18n.t(field.label_key()).to_string();
    terminal
        .draw(|frame| {
            let size = frame.size();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(2)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Length(4),
                        Constraint::Min(0),
                    ]
                    .as_ref(),
                )
                .split(size);

            frame.render_widget(
                Paragraph::new(label.clone())
                    .style(Style::default())
                    .alignment(Alignment::Center),
                chunks[0],
            );
            frame.render_widget(
                Paragraph::new(state.input.clone())
                    .block(
                        Block::default()
                            .title(label.clone())
                            .borders(Borders::ALL)
                            .border_type(BorderType::Rounded),
                    )
                    .style(Style::default())
                    .alignment(Alignment::Center),
                chunks[1],
            )
        })
        .ok();
}
