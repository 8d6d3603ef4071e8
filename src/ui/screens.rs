//! Body rendering for each screen

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use super::layout::{centered_rect, split_horizontal, split_vertical};
use super::{short_addr, truncate_str};
use crate::app::{App, MAIN_MENU};
use crate::core::{ListCursor, Screen};
use crate::domain::{CallField, CallResult, CallType, LogEntry};
use crate::inspector::format_balance;

const SEED_PREVIEW: usize = 20;

pub fn draw_body(f: &mut Frame, area: Rect, app: &App) {
    match app.screen {
        Screen::MainMenu => draw_main_menu(f, area, app),
        Screen::CallParameterList => draw_params(f, area, app),
        Screen::CallParameterEdit => {
            draw_params(f, area, app);
            draw_edit_popup(f, area, app);
        }
        Screen::CallTypeEdit => {
            draw_params(f, area, app);
            draw_call_type_popup(f, area, app);
        }
        Screen::CallExecuting => {
            let text = Paragraph::new(format!("Executing {}...", app.params.call_type))
                .block(titled("Executing"));
            f.render_widget(text, area);
        }
        Screen::CallResult => draw_call_result(f, area, app),
        Screen::CallHistory => draw_history(f, area, app),
        Screen::CallHistoryDetail => draw_history_detail(f, area, app),
        Screen::LogDetail => draw_log_detail(f, area, app),
        Screen::Contracts => draw_contracts(f, area, app),
        Screen::ContractDetail => draw_contract_detail(f, area, app),
        Screen::ConfirmReset => draw_confirm_reset(f, area, app),
        Screen::Dashboard => draw_dashboard(f, area, app),
        Screen::AccountsList => draw_accounts(f, area, app),
        Screen::AccountDetail => draw_account_detail(f, area, app),
        Screen::BlocksList => draw_blocks(f, area, app),
        Screen::BlockDetail => draw_block_detail(f, area, app),
        Screen::TransactionsList => draw_transactions(f, area, app),
        Screen::TransactionDetail => draw_transaction_detail(f, area, app),
        Screen::StateInspector => draw_inspector(f, area, app),
        Screen::Settings => draw_settings(f, area, app),
    }
}

fn titled(title: &str) -> Block<'_> {
    Block::default().borders(Borders::ALL).title(title)
}

fn label(text: &str) -> Span<'static> {
    Span::styled(format!("{text}: "), Style::default().fg(Color::DarkGray))
}

fn field(name: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![label(name), Span::raw(value.into())])
}

fn render_list(f: &mut Frame, area: Rect, title: &str, items: Vec<ListItem>, cursor: ListCursor) {
    let len = items.len();
    let list = List::new(items)
        .block(titled(title))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");
    let mut state = ListState::default();
    state.select(cursor.get(len));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_lines(f: &mut Frame, area: Rect, title: &str, mut lines: Vec<Line<'static>>) {
    if lines.is_empty() {
        lines.push(Line::from("No data"));
    }
    let paragraph = Paragraph::new(Text::from(lines))
        .block(titled(title))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn empty_hint(f: &mut Frame, area: Rect, title: &str, hint: &str) {
    let paragraph = Paragraph::new(Line::from(Span::styled(
        hint.to_string(),
        Style::default().fg(Color::DarkGray),
    )))
    .block(titled(title));
    f.render_widget(paragraph, area);
}

fn status_span(success: bool) -> Span<'static> {
    if success {
        Span::styled("success", Style::default().fg(Color::Green))
    } else {
        Span::styled("failed", Style::default().fg(Color::Red))
    }
}

fn log_items(logs: &[LogEntry]) -> Vec<ListItem<'static>> {
    logs.iter()
        .enumerate()
        .map(|(i, log)| {
            ListItem::new(format!(
                "#{i} {} topics:{} data:{}B",
                short_addr(&log.address.to_string()),
                log.topics.len(),
                log.data.len()
            ))
        })
        .collect()
}

fn result_lines(result: &CallResult) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![label("Status"), status_span(result.success)]),
        field("Gas used", result.gas_used.to_string()),
        field("Gas left", result.gas_left.to_string()),
    ];
    if let Some(address) = result.deployed_address {
        lines.push(field("Deployed", address.to_string()));
    }
    if !result.return_data.is_empty() {
        lines.push(field("Return", truncate_str(&result.return_data.to_string(), 200)));
    }
    if let Some(error) = &result.error {
        lines.push(Line::from(vec![
            label("Error"),
            Span::styled(error.clone(), Style::default().fg(Color::Red)),
        ]));
    }
    lines.push(field("Logs", result.logs.len().to_string()));
    lines
}

fn draw_main_menu(f: &mut Frame, area: Rect, app: &App) {
    let items = MAIN_MENU
        .iter()
        .map(|item| ListItem::new(item.label()))
        .collect();
    let area = centered_rect(40, 50, area);
    render_list(f, area, "Main Menu", items, app.cursors.main_menu);
}

fn draw_params(f: &mut Frame, area: Rect, app: &App) {
    let (list_area, error_area) = split_vertical(area, area.height.saturating_sub(3));
    let items = CallField::ALL
        .iter()
        .map(|field| {
            let value = match field {
                CallField::CallType => app.params.call_type.to_string(),
                other => app.params.get(*other).to_string(),
            };
            let dimmed = (*field == CallField::Salt && app.params.call_type != CallType::Create2)
                || (*field == CallField::Target && app.params.call_type.is_create());
            let style = if dimmed {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<12}", field.label()), Style::default().fg(Color::Cyan)),
                Span::styled(truncate_str(&value, 80), style),
            ]))
        })
        .collect();
    render_list(f, list_area, "Call Parameters", items, app.cursors.params);

    if !app.validation_error.is_empty() {
        let error = Paragraph::new(Span::styled(
            app.validation_error.clone(),
            Style::default().fg(Color::Red),
        ))
        .block(titled("Error"));
        f.render_widget(error, error_area);
    }
}

fn draw_edit_popup(f: &mut Frame, area: Rect, app: &App) {
    let Some(edit) = app.edit.as_ref() else {
        return;
    };
    let popup = centered_rect(70, 30, area);
    f.render_widget(Clear, popup);
    let mut lines = vec![Line::from(vec![
        Span::raw(edit.input.value().to_string()),
        Span::styled("█", Style::default().fg(Color::Cyan)),
    ])];
    if !app.validation_error.is_empty() {
        lines.push(Line::from(Span::styled(
            app.validation_error.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            titled(edit.field.label()).border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, popup);
}

fn draw_call_type_popup(f: &mut Frame, area: Rect, app: &App) {
    let popup = centered_rect(40, 40, area);
    f.render_widget(Clear, popup);
    let items = CallType::ALL
        .iter()
        .map(|call_type| ListItem::new(call_type.as_str()))
        .collect();
    render_list(f, popup, "Call Type", items, app.cursors.call_type);
}

fn draw_call_result(f: &mut Frame, area: Rect, app: &App) {
    let Some(result) = app.last_result.as_ref() else {
        empty_hint(f, area, "Call Result", "No result");
        return;
    };
    let (summary, logs) = split_vertical(area, 9);
    render_lines(f, summary, "Call Result", result_lines(result));
    render_list(f, logs, "Logs", log_items(&result.logs), app.cursors.logs);
}

fn draw_history(f: &mut Frame, area: Rect, app: &App) {
    let entries = app.history_entries();
    if entries.is_empty() {
        empty_hint(f, area, "Call History", "No calls yet");
        return;
    }
    let items = entries
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::raw(format!("#{:<4} ", entry.id)),
                Span::styled(
                    format!("{:<13}", entry.params.call_type.as_str()),
                    Style::default().fg(Color::Cyan),
                ),
                status_span(entry.result.success),
                Span::raw(format!(
                    "  {}  {}",
                    short_addr(&entry.params.target),
                    entry.timestamp.format("%H:%M:%S")
                )),
            ]))
        })
        .collect();
    render_list(f, area, "Call History", items, app.cursors.history);
}

fn draw_history_detail(f: &mut Frame, area: Rect, app: &App) {
    let Some(entry) = app.selected_history() else {
        empty_hint(f, area, "History Entry", "Entry not found");
        return;
    };
    let (summary, logs) = split_vertical(area, 16);
    let mut lines = vec![
        field("Id", entry.id.to_string()),
        field("Time", entry.timestamp.to_rfc3339()),
        field("Type", entry.params.call_type.as_str()),
        field("Caller", entry.params.caller.clone()),
        field("Target", entry.params.target.clone()),
        field("Value", entry.params.value.clone()),
        field("Input", truncate_str(&entry.params.input_data, 120)),
    ];
    lines.extend(result_lines(&entry.result));
    render_lines(f, summary, "History Entry", lines);
    render_list(f, logs, "Logs", log_items(&entry.result.logs), app.cursors.logs);
}

fn draw_log_detail(f: &mut Frame, area: Rect, app: &App) {
    let Some(log) = app.selected_log() else {
        empty_hint(f, area, "Log", "Log not found");
        return;
    };
    let mut lines = vec![field("Address", log.address.to_string())];
    for (i, topic) in log.topics.iter().enumerate() {
        lines.push(field(&format!("Topic {i}"), topic.to_string()));
    }
    lines.push(field("Data", log.data.to_string()));
    render_lines(f, area, "Log", lines);
}

fn draw_contracts(f: &mut Frame, area: Rect, app: &App) {
    let contracts = app.contracts();
    if contracts.is_empty() {
        empty_hint(f, area, "Contracts", "No contracts deployed");
        return;
    }
    let items = contracts
        .iter()
        .map(|contract| {
            ListItem::new(format!(
                "{}  {} bytes  {}",
                contract.address,
                contract.code.len(),
                contract.timestamp.format("%H:%M:%S")
            ))
        })
        .collect();
    render_list(f, area, "Contracts", items, app.cursors.contracts);
}

fn draw_contract_detail(f: &mut Frame, area: Rect, app: &App) {
    let (summary, body) = split_vertical(area, 5);
    let header = match app.selected_contract() {
        Some(contract) => vec![
            field("Address", contract.address.to_string()),
            field("Code size", format!("{} bytes", contract.code.len())),
        ],
        None => vec![Line::from("Contract not found")],
    };
    render_lines(f, summary, "Contract", header);

    if let Some(error) = &app.disassembly_error {
        empty_hint(f, body, "Disassembly", error);
        return;
    }
    let Some(dis) = app.disassembly.as_ref() else {
        empty_hint(f, body, "Disassembly", "Loading...");
        return;
    };
    let (blocks_area, instructions_area) = split_horizontal(body, 30);
    let block_items = dis
        .blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            ListItem::new(format!("#{i:<3} 0x{:04x}-0x{:04x}", block.start, block.end))
        })
        .collect();
    render_list(
        f,
        blocks_area,
        &format!("Blocks {}/{}", app.block_index + 1, dis.block_count()),
        block_items,
        ListCursor::at(app.block_index),
    );
    let instruction_items = app
        .current_block_instructions()
        .iter()
        .map(|inst| {
            let mut spans = vec![
                Span::styled(format!("0x{:04x} ", inst.pc), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{:<14}", inst.name),
                    if inst.is_jump() {
                        Style::default().fg(Color::Yellow)
                    } else {
                        Style::default()
                    },
                ),
            ];
            if let Some(operand) = inst.operand_hex() {
                spans.push(Span::raw(operand));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    render_list(
        f,
        instructions_area,
        "Instructions",
        instruction_items,
        app.cursors.instructions,
    );
}

fn draw_confirm_reset(f: &mut Frame, area: Rect, app: &App) {
    let popup = centered_rect(50, 30, area);
    f.render_widget(Clear, popup);
    let mut lines = vec![
        Line::from(Span::styled(
            "Reset all state?",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("History, chain and persisted calls will be cleared."),
        Line::from(""),
    ];
    if app.reset_pending {
        lines.push(Line::from(Span::styled(
            "Resetting...",
            Style::default().fg(Color::Yellow),
        )));
    } else {
        lines.push(Line::from("Press y or Enter to confirm, Esc to cancel"));
    }
    let paragraph = Paragraph::new(Text::from(lines))
        .block(titled("Reset State").border_style(Style::default().fg(Color::Red)))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup);
}

fn draw_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let (stats_area, recent_area) = split_horizontal(area, 40);
    let stats = &app.stats;
    let last_block = stats
        .last_block_time
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "--".to_string());
    let lines = vec![
        field("Block height", stats.block_height.to_string()),
        field("Blocks", stats.total_blocks.to_string()),
        field("Transactions", stats.total_transactions.to_string()),
        field("Successful", stats.successful_txs.to_string()),
        field("Failed", stats.failed_txs.to_string()),
        field("Gas used", stats.total_gas_used.to_string()),
        field("Last block", last_block),
        field("Accounts", app.services.accounts.get_account_count().to_string()),
        field("Gas limit", app.services.chain.get_gas_limit().to_string()),
    ];
    render_lines(f, stats_area, "Chain", lines);

    let recent: Vec<Line<'static>> = app
        .transactions()
        .iter()
        .take(10)
        .map(|tx| {
            Line::from(vec![
                Span::raw(format!("{:<8}", tx.id)),
                Span::styled(
                    format!("{:<13}", tx.call_type.as_str()),
                    Style::default().fg(Color::Cyan),
                ),
                status_span(tx.status),
                Span::raw(format!("  block {}", tx.block_number)),
            ])
        })
        .collect();
    render_lines(f, recent_area, "Recent Transactions", recent);
}

fn draw_accounts(f: &mut Frame, area: Rect, app: &App) {
    let items = app
        .accounts()
        .iter()
        .map(|account| {
            ListItem::new(format!(
                "#{:<3} {}  {}",
                account.index,
                account.address,
                format_balance(account.balance)
            ))
        })
        .collect();
    render_list(f, area, "Accounts", items, app.cursors.accounts);
}

fn draw_account_detail(f: &mut Frame, area: Rect, app: &App) {
    let Some(account) = app.selected_account() else {
        empty_hint(f, area, "Account", "Account not found");
        return;
    };
    let mut lines = vec![
        field("Address", account.address.to_string()),
        field("Index", account.index.to_string()),
        field("Balance", format_balance(account.balance)),
        field("Nonce", account.nonce.to_string()),
        field("Code", format!("{} bytes", account.code.len())),
    ];
    let key_line = if app.show_private_key {
        Line::from(vec![
            label("Private key"),
            Span::styled(account.private_key.to_string(), Style::default().fg(Color::Yellow)),
        ])
    } else if app.private_key_confirm.is_armed() {
        Line::from(vec![
            label("Private key"),
            Span::styled(
                "press y to reveal",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        field("Private key", "hidden (p to reveal)")
    };
    lines.push(key_line);
    render_lines(f, area, "Account", lines);
}

fn draw_blocks(f: &mut Frame, area: Rect, app: &App) {
    let items = app
        .blocks()
        .iter()
        .map(|block| {
            ListItem::new(format!(
                "#{:<6} {}  {} txs  gas {}",
                block.number,
                short_addr(&block.hash.to_string()),
                block.transactions.len(),
                block.gas_used
            ))
        })
        .collect();
    render_list(f, area, "Blocks", items, app.cursors.blocks);
}

fn draw_block_detail(f: &mut Frame, area: Rect, app: &App) {
    let Some(block) = app.selected_block() else {
        empty_hint(f, area, "Block", "Block not found");
        return;
    };
    let (summary, txs_area) = split_vertical(area, 11);
    let lines = vec![
        field("Number", block.number.to_string()),
        field("Hash", block.hash.to_string()),
        field("Parent", block.parent_hash.to_string()),
        field("Time", block.timestamp.to_rfc3339()),
        field("Gas", format!("{} / {}", block.gas_used, block.gas_limit)),
        field("Miner", block.miner.to_string()),
        field("State root", block.state_root.to_string()),
        field("Size", format!("{} bytes", block.size)),
    ];
    render_lines(f, summary, "Block", lines);
    let items = app
        .block_transactions()
        .iter()
        .map(|tx| {
            let hash = short_addr(&tx.hash.to_string());
            ListItem::new(format!("{:<8} {}  {}", tx.id, tx.call_type, hash))
        })
        .collect();
    render_list(f, txs_area, "Transactions", items, app.cursors.block_txs);
}

fn draw_transactions(f: &mut Frame, area: Rect, app: &App) {
    let items = app
        .transactions()
        .iter()
        .map(|tx| {
            let to = tx
                .to
                .or(tx.contract_address)
                .map(|address| short_addr(&address.to_string()))
                .unwrap_or_else(|| "--".to_string());
            ListItem::new(Line::from(vec![
                Span::raw(format!("{:<8}", tx.id)),
                Span::styled(
                    format!("{:<13}", tx.call_type.as_str()),
                    Style::default().fg(Color::Cyan),
                ),
                status_span(tx.status),
                Span::raw(format!(
                    "  {} -> {}  block {}",
                    short_addr(&tx.from.to_string()),
                    to,
                    tx.block_number
                )),
            ]))
        })
        .collect();
    render_list(f, area, "Transactions", items, app.cursors.transactions);
}

fn draw_transaction_detail(f: &mut Frame, area: Rect, app: &App) {
    let Some(tx) = app.selected_transaction() else {
        empty_hint(f, area, "Transaction", "Transaction not found");
        return;
    };
    let (summary, logs_area) = split_vertical(area, 15);
    let mut lines = vec![
        field("Id", tx.id.clone()),
        field("Hash", tx.hash.to_string()),
        field("Block", tx.block_number.to_string()),
        field("Type", tx.call_type.as_str()),
        field("From", tx.from.to_string()),
        field(
            "To",
            tx.to
                .map(|address| address.to_string())
                .unwrap_or_else(|| "--".to_string()),
        ),
        field("Value", tx.value.to_string()),
        field("Gas", format!("{} / {}", tx.gas_used, tx.gas_limit)),
        Line::from(vec![label("Status"), status_span(tx.status)]),
        field("Input", truncate_str(&tx.input.to_string(), 120)),
    ];
    if let Some(address) = tx.contract_address {
        lines.push(field("Contract", address.to_string()));
    }
    if let Some(error) = &tx.error {
        lines.push(field("Error", error.clone()));
    }
    render_lines(f, summary, "Transaction", lines);
    render_list(f, logs_area, "Logs", log_items(&tx.logs), app.cursors.logs);
}

fn draw_inspector(f: &mut Frame, area: Rect, app: &App) {
    let (input_area, result_area) = split_vertical(area, 3);
    let input = Paragraph::new(Line::from(vec![
        Span::raw(app.inspector_input.value().to_string()),
        Span::styled("█", Style::default().fg(Color::Cyan)),
    ]))
    .block(titled("Address").border_style(Style::default().fg(Color::Cyan)));
    f.render_widget(input, input_area);

    let lines = match &app.inspector_result {
        None => vec![Line::from(Span::styled(
            "Enter an address and press Enter",
            Style::default().fg(Color::DarkGray),
        ))],
        Some(Err(err)) => vec![Line::from(Span::styled(
            err.clone(),
            Style::default().fg(Color::Red),
        ))],
        Some(Ok(state)) => vec![
            field("Address", state.address.to_string()),
            field("Balance", format_balance(state.balance)),
            field("Nonce", state.nonce.to_string()),
            field("Contract", if state.is_contract { "yes" } else { "no" }),
            field("Code size", format!("{} bytes", state.code_size)),
            field("Storage slots", state.storage_slots.to_string()),
            field("Code", truncate_str(&state.code.to_string(), 200)),
        ],
    };
    render_lines(f, result_area, "State", lines);
}

fn draw_settings(f: &mut Frame, area: Rect, app: &App) {
    let seed = app.services.accounts.get_seed_hex();
    let export = match &app.services.export_dir {
        Some(dir) => format!("x → {}", dir.display()),
        None => "unavailable".to_string(),
    };
    let mut lines = vec![
        field("Gas limit", app.services.chain.get_gas_limit().to_string()),
        field(
            "Auto-refresh",
            if app.auto_refresh { "Enabled" } else { "Disabled" },
        ),
        field("Seed", truncate_str(&seed, SEED_PREVIEW)),
        field("Accounts", app.services.accounts.get_account_count().to_string()),
        field("Export", export),
    ];
    if app.regenerate_confirm.is_armed() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Regenerate all accounts? Press y to confirm",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }
    render_lines(f, area, "Settings", lines);
}
