use crate::db::{Transaction, TransactionKind};
use crate::ledger::Summary;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

const PAGE_STEP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    All,
    Income,
    Expense,
}

impl KindFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Income => tx.kind == TransactionKind::Income,
            KindFilter::Expense => tx.kind == TransactionKind::Expense,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            KindFilter::All => "All",
            KindFilter::Income => "Income",
            KindFilter::Expense => "Expense",
        }
    }
}

pub struct App {
    pub transactions: Vec<Transaction>,
    pub filtered_transactions: Vec<Transaction>,
    pub state: TableState,
    pub summary: Summary,
    pub show_detail: bool,
    pub filter: KindFilter,
}

impl App {
    pub fn new(transactions: Vec<Transaction>, summary: Summary) -> Self {
        let mut state = TableState::default();
        if !transactions.is_empty() {
            state.select(Some(0));
        }

        let filtered_transactions = transactions.clone();

        Self {
            transactions,
            filtered_transactions,
            state,
            summary,
            show_detail: false,
            filter: KindFilter::All,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_transaction(&self) -> Option<&Transaction> {
        self.state.selected().and_then(|i| self.filtered_transactions.get(i))
    }

    pub fn apply_filter(&mut self, filter: KindFilter) {
        self.filter = filter;
        self.filtered_transactions = self
            .transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect();

        if self.filtered_transactions.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn next(&mut self) {
        let len = self.filtered_transactions.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.filtered_transactions.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.filtered_transactions.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + PAGE_STEP).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.filtered_transactions.is_empty() {
            return;
        }
        let i = self
            .state
            .selected()
            .map(|i| i.saturating_sub(PAGE_STEP))
            .unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn first(&mut self) {
        if !self.filtered_transactions.is_empty() {
            self.state.select(Some(0));
        }
    }

    pub fn last(&mut self) {
        if !self.filtered_transactions.is_empty() {
            self.state.select(Some(self.filtered_transactions.len() - 1));
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore the terminal before reporting anything
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Char('a') => app.apply_filter(KindFilter::All),
                KeyCode::Char('i') => app.apply_filter(KindFilter::Income),
                KeyCode::Char('e') => app.apply_filter(KindFilter::Expense),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.first(),
                KeyCode::End => app.last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Summary header
            Constraint::Min(0),    // Ledger
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn kind_color(kind: TransactionKind) -> Color {
    match kind {
        TransactionKind::Income => Color::Green,
        TransactionKind::Expense => Color::Red,
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let s = &app.summary;
    let balance_color = if s.net_balance < 0.0 {
        Color::Red
    } else {
        Color::Green
    };

    let spans = vec![
        Span::styled(
            "Ledger",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Total: {}", s.total_count),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("↑ {} (${:.2})", s.income_count, s.total_income),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(
            format!("↓ {} (${:.2})", s.expense_count, s.total_expense),
            Style::default().fg(Color::Red),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Balance: ${:.2}", s.net_balance),
            Style::default()
                .fg(balance_color)
                .add_modifier(Modifier::BOLD),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["ID", "Timestamp", "Kind", "Amount", "Description"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.filtered_transactions.iter().map(|tx| {
        let color = kind_color(tx.kind);
        let cells = vec![
            Cell::from(tx.id.to_string()),
            Cell::from(tx.timestamp.clone()),
            Cell::from(tx.kind.as_str()).style(Style::default().fg(color)),
            Cell::from(format!("{}{:.2}", tx.kind.symbol(), tx.amount))
                .style(Style::default().fg(color)),
            Cell::from(truncate(&tx.description, 40)),
        ];
        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(20),
            Constraint::Length(9),
            Constraint::Length(14),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Transactions ({}) ", app.filter.label())),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let label = Style::default().fg(Color::Yellow);

    let lines = match app.selected_transaction() {
        Some(tx) => vec![
            Line::from(vec![Span::styled("ID: ", label), Span::raw(tx.id.to_string())]),
            Line::from(vec![
                Span::styled("Timestamp: ", label),
                Span::raw(tx.timestamp.clone()),
            ]),
            Line::from(vec![
                Span::styled("Kind: ", label),
                Span::styled(tx.kind.as_str(), Style::default().fg(kind_color(tx.kind))),
            ]),
            Line::from(vec![
                Span::styled("Amount: ", label),
                Span::raw(format!("${:.2}", tx.amount)),
            ]),
            Line::from(vec![
                Span::styled("Description: ", label),
                Span::raw(if tx.description.is_empty() {
                    "(none)".to_string()
                } else {
                    tx.description.clone()
                }),
            ]),
        ],
        None => vec![Line::from("No transaction selected")],
    };

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Detail "),
    );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.filtered_transactions.len();
    let key = Style::default().fg(Color::Yellow);

    let spans = vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, total),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled("a/i/e", key),
        Span::raw(" Filter | "),
        Span::styled("Enter", key),
        Span::raw(" Details | "),
        Span::styled("↑/↓", key),
        Span::raw(" Nav | "),
        Span::styled("PgUp/PgDn", key),
        Span::raw(" Fast | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
