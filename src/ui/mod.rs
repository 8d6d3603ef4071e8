use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use ratatui::Frame;

pub mod layout;
mod screens;

use crate::app::{App, StatusLevel};
use crate::core::Screen;

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    screens::draw_body(f, areas.body, app);
    draw_status_line(f, areas.status_line, app);
    draw_hint_line(f, areas.hint_line, app);
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(10), Constraint::Min(0)])
        .split(area);

    let brand = Paragraph::new(Line::from(Span::styled(
        "chop",
        Style::default()
            .fg(Color::LightCyan)
            .add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center);
    f.render_widget(brand, chunks[0]);

    match app.screen.tab() {
        Some(active) => {
            let titles: Vec<Line> = Screen::TABS
                .iter()
                .map(|tab| Line::from(tab.title()))
                .collect();
            let selected = Screen::TABS
                .iter()
                .position(|tab| *tab == active)
                .unwrap_or(0);
            let tabs = Tabs::new(titles)
                .block(Block::default().borders(Borders::ALL))
                .select(selected)
                .style(Style::default().fg(Color::White))
                .highlight_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
                .divider(" │ ");
            f.render_widget(tabs, chunks[1]);
        }
        None => {
            let crumbs = Paragraph::new(breadcrumb(app))
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Left);
            f.render_widget(crumbs, chunks[1]);
        }
    }
}

fn breadcrumb(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    for screen in app.nav.screens() {
        spans.push(Span::styled(
            screen.title(),
            Style::default().fg(Color::DarkGray),
        ));
        spans.push(Span::styled(" › ", Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::styled(
        app.screen.title(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    Line::from(spans)
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled("Block ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", app.stats.block_height)),
        Span::styled("Txs ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", app.stats.total_transactions)),
    ];
    if !app.nav.is_empty() {
        spans.push(Span::styled("Depth ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(format!("{}  ", app.nav.len())));
    }
    if let Some((text, level)) = app.status_text() {
        let color = match level {
            StatusLevel::Info => Color::Green,
            StatusLevel::Warn => Color::Yellow,
            StatusLevel::Error => Color::Red,
        };
        spans.push(Span::styled(text.to_string(), Style::default().fg(color)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

fn draw_hint_line(f: &mut Frame, area: Rect, app: &App) {
    let line = Line::from(Span::styled(
        key_hints(app),
        Style::default().fg(Color::DarkGray),
    ));
    f.render_widget(Paragraph::new(line), area);
}

fn key_hints(app: &App) -> String {
    let hints = match app.screen {
        Screen::MainMenu => "↑/↓ move  enter select  q quit",
        Screen::CallParameterList => "enter edit  e execute  r reset field  R reset all  esc back",
        Screen::CallParameterEdit => "enter save  esc cancel  ctrl+v paste  ctrl+r reset",
        Screen::CallTypeEdit => "↑/↓ choose  enter save  r reset  esc cancel",
        Screen::CallExecuting => "executing...",
        Screen::CallResult => "enter log  esc parameters  ctrl+y copy",
        Screen::CallHistory | Screen::Contracts => "enter open  esc menu",
        Screen::CallHistoryDetail => "enter log  e edit call  esc back",
        Screen::LogDetail => "esc back  ctrl+y copy data",
        Screen::ContractDetail => "←/→ block  ↑/↓ instruction  g jump  esc back  ctrl+y copy",
        Screen::ConfirmReset => "y/enter confirm  esc cancel",
        Screen::Dashboard => "tab next  r refresh  esc menu",
        Screen::AccountsList | Screen::BlocksList | Screen::TransactionsList => {
            "tab next  enter open  esc dashboard"
        }
        Screen::AccountDetail if app.private_key_confirm.is_armed() => "y reveal  any key cancel",
        Screen::AccountDetail => "p private key  esc back  ctrl+y copy",
        Screen::BlockDetail => "enter transaction  esc back  ctrl+y copy",
        Screen::TransactionDetail => "enter log  b block  a sender  esc back  ctrl+y copy",
        Screen::StateInspector => "enter inspect  ctrl+v paste  esc dashboard",
        Screen::Settings if app.regenerate_confirm.is_armed() => "y regenerate  any key cancel",
        Screen::Settings => "r reset  g regenerate  t auto-refresh  [/] gas  x export  esc back",
    };
    hints.to_string()
}

pub(crate) fn short_addr(value: &str) -> String {
    if value.len() <= 10 {
        return value.to_string();
    }
    let start: String = value.chars().take(6).collect();
    let end: String = value
        .chars()
        .rev()
        .take(4)
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    format!("{}..{}", start, end)
}

pub(crate) fn truncate_str(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    value.chars().take(max).collect::<String>() + "..."
}
