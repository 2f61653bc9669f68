//! Line-oriented terminal view over one table

use ledgerdesk_core::{
    CoreError, CoreResult, DefaultErrorLogger, EditorMode, EditorSession, ErrorContext, ErrorLogger, FieldValue,
    Ledger, MonthSummary, Mutation, Outcome, PagedTableController, RecordId, Seed, SkipReason, TableRow,
    TableSnapshot,
};
use ledgerdesk_utils::{format_amount, header_label, pad, pad_left};
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

/// Widest a rendered column may get
const MAX_COLUMN_WIDTH: usize = 24;

const HELP: &str = "\
Commands:
  next | prev | page N        move between pages
  size N                      rows per page
  sort FIELD                  cycle ascending / descending / unsorted
  search [TEXT]               filter rows, empty text clears
  refresh                     reload the current page
  new | edit ID               open the form
  set FIELD VALUE             fill a form field
  save | cancel               submit or discard the form
  delete ID | toggle ID       remove a row, flip its status
  summary                     table counts and this month's totals
  help | quit";

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    Page(usize),
    Size(usize),
    Sort(String),
    Search(String),
    Refresh,
    New,
    Edit(RecordId),
    Set(String, String),
    Save,
    Cancel,
    Delete(RecordId),
    Toggle(RecordId),
    Summary,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let number = |what: &str| {
            rest.parse::<usize>()
                .map_err(|_| format!("'{}' expects a number, got '{}'", what, rest))
        };
        let id = |what: &str| {
            rest.parse::<RecordId>()
                .map_err(|_| format!("'{}' expects a row id, got '{}'", what, rest))
        };

        match word.to_lowercase().as_str() {
            "next" | "n" => Ok(Command::Next),
            "prev" | "p" => Ok(Command::Prev),
            "page" => Ok(Command::Page(number("page")?)),
            "size" => Ok(Command::Size(number("size")?)),
            "sort" if rest.is_empty() => Err("'sort' expects a field name".to_string()),
            "sort" => Ok(Command::Sort(rest.to_string())),
            "search" => Ok(Command::Search(rest.to_string())),
            "refresh" | "r" => Ok(Command::Refresh),
            "new" => Ok(Command::New),
            "edit" => Ok(Command::Edit(id("edit")?)),
            "set" => {
                let (field, value) = match rest.split_once(char::is_whitespace) {
                    Some((field, value)) => (field, value.trim()),
                    None => (rest, ""),
                };
                if field.is_empty() {
                    return Err("'set' expects a field name and a value".to_string());
                }
                Ok(Command::Set(field.to_string(), value.to_string()))
            }
            "save" => Ok(Command::Save),
            "cancel" => Ok(Command::Cancel),
            "delete" => Ok(Command::Delete(id("delete")?)),
            "toggle" => Ok(Command::Toggle(id("toggle")?)),
            "summary" | "report" => Ok(Command::Summary),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(format!("Unknown command '{}', type 'help'", other)),
        }
    }
}

/// Reads commands from stdin and drives one controller
pub struct Console<R: TableRow> {
    controller: Arc<PagedTableController<R>>,
    ledger: Arc<Ledger>,
    seed: Option<Seed<R>>,
    editor: EditorSession<R>,
    errors: DefaultErrorLogger,
}

impl<R: TableRow> Console<R> {
    pub fn new(controller: Arc<PagedTableController<R>>, ledger: Arc<Ledger>) -> Self {
        Self {
            controller,
            ledger,
            seed: None,
            editor: EditorSession::new(),
            errors: DefaultErrorLogger,
        }
    }

    /// Show `seed` as the first page instead of fetching it
    pub fn with_seed(mut self, seed: Option<Seed<R>>) -> Self {
        self.seed = seed;
        self
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let renderer = tokio::spawn(render_updates(self.controller.subscribe()));

        let initialized = self.controller.initialize(self.seed.take()).await;
        self.report(self.context("initialize"), initialized);
        println!("{}", HELP);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command).await,
                Err(message) => println!("{}", message),
            }
        }

        self.controller.destroy();
        renderer.abort();
        log::info!("{}: console closed", R::TABLE);
        Ok(())
    }

    async fn execute(&mut self, command: Command) {
        let snapshot = self.controller.snapshot();
        match command {
            Command::Next => {
                let page = snapshot.current_page + 1;
                let result = self.controller.go_to_page(page).await;
                self.report(self.context("next page").with_data("page", page), result);
            }
            Command::Prev => {
                let page = snapshot.current_page.saturating_sub(1);
                let result = self.controller.go_to_page(page).await;
                self.report(self.context("previous page").with_data("page", page), result);
            }
            Command::Page(page) => {
                let result = self.controller.go_to_page(page).await;
                self.report(self.context("go to page").with_data("page", page), result);
            }
            Command::Size(size) => {
                let result = self.controller.change_page_size(size).await;
                self.report(self.context("change page size").with_data("page_size", size), result);
            }
            Command::Sort(field) => {
                let result = self.controller.toggle_sort(&field).await;
                self.report(self.context("sort").with_data("field", field), result);
            }
            Command::Search(text) => {
                let result = self.controller.set_search_text(&text).await;
                self.report(self.context("search").with_data("text", text), result);
            }
            Command::Refresh => {
                let result = self.controller.notify_mutation().await;
                self.report(self.context("refresh"), result);
            }
            Command::New => {
                self.editor.open_create();
                self.print_form();
            }
            Command::Edit(id) => match snapshot.rows.iter().find(|row| row.id() == id) {
                Some(row) => {
                    self.editor.open_edit(row);
                    self.print_form();
                }
                None => println!("#{} is not on this page", id),
            },
            Command::Set(field, value) => match self.editor.set_field(&field, &value) {
                Ok(()) => self.print_form(),
                Err(error) => self.report_error(self.context("set field").with_data("field", field), &error),
            },
            Command::Save => match self.editor.submit() {
                Ok(mutation) => {
                    let result = self.controller.mutate(mutation).await;
                    if result.is_ok() {
                        self.editor.close();
                    }
                    self.report(self.context("save"), result);
                }
                Err(error) => self.report_error(self.context("save"), &error),
            },
            Command::Cancel => {
                self.editor.close();
                println!("Form closed");
            }
            Command::Delete(id) => {
                let result = self.controller.mutate(Mutation::Delete(id)).await;
                self.report(self.context("delete").with_data("id", id), result);
            }
            Command::Toggle(id) => {
                let result = self.controller.mutate(Mutation::ToggleStatus(id)).await;
                self.report(self.context("toggle status").with_data("id", id), result);
            }
            Command::Summary => println!("{}", render_summary(&self.ledger.this_month())),
            Command::Help => println!("{}", HELP),
            Command::Quit => {}
        }
    }

    fn context(&self, operation: &str) -> ErrorContext {
        ErrorContext::new(operation).with_table(R::TABLE)
    }

    fn report(&self, context: ErrorContext, result: CoreResult<Outcome>) {
        match result {
            Ok(Outcome::Skipped(SkipReason::Unchanged)) => println!("Nothing to change"),
            Ok(Outcome::Skipped(SkipReason::Busy)) => {
                self.errors.log_warning("request dropped while a page is loading", &context);
                println!("Still loading, request ignored");
            }
            Ok(_) => {}
            Err(error) => self.report_error(context, &error),
        }
    }

    fn report_error(&self, context: ErrorContext, error: &CoreError) {
        self.errors.log_error(error, &context);
        println!("{}", error.to_details());
    }

    fn print_form(&self) {
        match self.editor.mode() {
            EditorMode::Closed => {}
            EditorMode::Creating => println!("New {}: {:?}", R::TABLE, self.editor.form()),
            EditorMode::Editing(id) => println!("Editing {} #{}: {:?}", R::TABLE, id, self.editor.form()),
        }
    }
}

async fn render_updates<R: TableRow>(mut updates: watch::Receiver<TableSnapshot<R>>) {
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        if snapshot.is_loading() {
            println!("Loading...");
        } else {
            println!("{}", render(&snapshot));
        }
    }
}

fn format_cell(value: FieldValue) -> String {
    match value {
        FieldValue::Amount(amount) => format_amount(amount),
        other => other.to_string(),
    }
}

/// Month summary as labelled lines
pub fn render_summary(summary: &MonthSummary) -> String {
    let lines = [
        ("Payment modes", summary.payment_modes.to_string()),
        ("Categories", summary.categories.to_string()),
        ("Transactions", summary.transaction_count.to_string()),
        ("Income", format_amount(summary.total_income)),
        ("Expenses", format_amount(summary.total_expenses)),
        ("Net change", format_amount(summary.net_change)),
    ];
    let width = lines.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let mut out = format!("Summary for {}", summary.month);
    for (label, value) in lines {
        out.push_str(&format!("\n  {}  {}", pad(label, width), value));
    }
    out
}

/// Snapshot as a text table with a paging footer
pub fn render<R: TableRow>(snapshot: &TableSnapshot<R>) -> String {
    let columns = R::columns();
    let headers: Vec<String> = std::iter::once("#".to_string())
        .chain(columns.iter().map(|c| header_label(c)))
        .collect();
    let rows: Vec<Vec<(String, bool)>> = snapshot
        .rows
        .iter()
        .map(|row| {
            std::iter::once((row.id().to_string(), true))
                .chain(columns.iter().map(|column| {
                    let value = row.field(column).unwrap_or(FieldValue::Missing);
                    let numeric = matches!(value, FieldValue::Amount(_));
                    (format_cell(value), numeric)
                }))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .map(|cells| cells[i].0.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect();

    let mut out = String::new();
    let header_line: Vec<String> = headers.iter().zip(&widths).map(|(h, w)| pad(h, *w)).collect();
    out.push_str(header_line.join("  ").trim_end());
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');

    if rows.is_empty() {
        out.push_str("(no rows)\n");
    }
    for cells in &rows {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|((text, numeric), w)| if *numeric { pad_left(text, *w) } else { pad(text, *w) })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }

    out.push_str(&format!(
        "Page {} of {} | {} row(s) | {} per page",
        snapshot.current_page,
        snapshot.total_pages.max(1),
        snapshot.total_count,
        snapshot.page_size
    ));
    if let Some(sort) = &snapshot.sort {
        out.push_str(&format!(" | sort: {}", sort));
    }
    if !snapshot.search_text.is_empty() {
        out.push_str(&format!(" | search: '{}'", snapshot.search_text));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono::NaiveDate;
    use ledgerdesk_core::{
        Category, CategoryDraft, MonthRange, Record, RecordStatus, SortSpec, TableStatus, TransactionType,
    };
    use rust_decimal::Decimal;

    fn snapshot(rows: Vec<Category>) -> TableSnapshot<Category> {
        TableSnapshot {
            total_count: 23,
            rows,
            current_page: 3,
            page_size: 10,
            total_pages: 3,
            sort: Some(SortSpec::ascending("name")),
            search_text: "ren".to_string(),
            status: TableStatus::Ready,
        }
    }

    #[test]
    fn test_parse_navigation_commands() {
        assert_eq!("next".parse::<Command>(), Ok(Command::Next));
        assert_eq!(" page 3 ".parse::<Command>(), Ok(Command::Page(3)));
        assert_eq!("size 20".parse::<Command>(), Ok(Command::Size(20)));
        assert_eq!("sort amount".parse::<Command>(), Ok(Command::Sort("amount".to_string())));
        assert!("page three".parse::<Command>().is_err());
        assert!("sort".parse::<Command>().is_err());
    }

    #[test]
    fn test_parse_search_keeps_spaces() {
        assert_eq!(
            "search dinner with friends".parse::<Command>(),
            Ok(Command::Search("dinner with friends".to_string()))
        );
        assert_eq!("search".parse::<Command>(), Ok(Command::Search(String::new())));
    }

    #[test]
    fn test_parse_form_commands() {
        assert_eq!(
            "set description Weekly vegetables".parse::<Command>(),
            Ok(Command::Set("description".to_string(), "Weekly vegetables".to_string()))
        );
        assert_eq!("edit 12".parse::<Command>(), Ok(Command::Edit(12)));
        assert_eq!("toggle 4".parse::<Command>(), Ok(Command::Toggle(4)));
        assert_eq!("summary".parse::<Command>(), Ok(Command::Summary));
        assert!("set".parse::<Command>().is_err());
        assert!("launch".parse::<Command>().is_err());
    }

    #[test]
    fn test_render_table_and_footer() {
        let rent = Category::create(
            21,
            CategoryDraft {
                name: "Rent".to_string(),
                kind: TransactionType::Expense,
                status: RecordStatus::Active,
            },
            Utc::now(),
        );
        let text = render(&snapshot(vec![rent]));
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("#   Name  Kind"));
        assert!(lines[2].contains("Rent"));
        assert!(lines[2].contains("expense"));
        assert_eq!(
            lines[3],
            "Page 3 of 3 | 23 row(s) | 10 per page | sort: name asc | search: 'ren'"
        );
    }

    #[test]
    fn test_render_empty_table() {
        let mut empty = snapshot(Vec::new());
        empty.total_count = 0;
        empty.total_pages = 0;
        empty.current_page = 1;
        empty.sort = None;
        empty.search_text.clear();

        let text = render(&empty);
        assert!(text.contains("(no rows)"));
        assert!(text.ends_with("Page 1 of 1 | 0 row(s) | 10 per page"));
    }

    #[test]
    fn test_render_summary() {
        let summary = MonthSummary {
            month: MonthRange::containing(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()),
            payment_modes: 5,
            categories: 9,
            transaction_count: 3,
            total_income: Decimal::new(100_000, 2),
            total_expenses: Decimal::new(1_234_550, 2),
            net_change: Decimal::new(-1_134_550, 2),
        };
        let text = render_summary(&summary);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Summary for 2024-05-01 to 2024-05-31");
        assert_eq!(lines[1], "  Payment modes  5");
        assert_eq!(lines[2], "  Categories     9");
        assert_eq!(lines[5], "  Expenses       12,345.50");
        assert_eq!(lines[6], "  Net change     -11,345.50");
    }
}
