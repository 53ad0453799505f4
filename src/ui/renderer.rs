use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::core::app::{App, EngineStatus, UiMode};
use crate::core::exchange::ExchangePhase;
use crate::core::message::{Message, Notice, NoticeKind};
use crate::ui::wrap::{truncate_to_width, wrap_text};

const SIDEBAR_WIDTH: u16 = 30;
const USER_LABEL: &str = "You";
const ASSISTANT_LABEL: &str = "AI";

pub fn ui(f: &mut Frame, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(f.area());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(columns[1]);

    render_chat_list(f, app, columns[0]);
    render_transcript(f, app, rows[0]);
    render_input(f, app, rows[1]);
    render_status(f, app, rows[2]);

    match &app.ui.mode {
        UiMode::Rename { input, .. } => render_rename_prompt(f, input, f.area()),
        UiMode::ConfirmDelete { id } => {
            let name = app.chats.display_name(id);
            render_confirm_delete(f, &name, f.area());
        }
        UiMode::Typing | UiMode::ChatList { .. } => {}
    }
}

fn render_chat_list(f: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.ui.mode, UiMode::ChatList { .. });
    let name_width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = app
        .chats
        .entries()
        .iter()
        .map(|entry| {
            let marker = if entry.active { "● " } else { "  " };
            let style = if entry.active {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Green)),
                Span::styled(truncate_to_width(&entry.name, name_width), style),
            ]))
        })
        .collect();

    let title = if focused {
        " Chats (Enter open · r rename · d delete) "
    } else {
        " Chats (Tab) "
    };
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    state.select(app.ui.chat_list_cursor());
    f.render_stateful_widget(list, area, &mut state);
}

fn message_lines(label: &str, content: &str, style: Style, width: usize, out: &mut Vec<Line<'static>>) {
    out.push(Line::from(Span::styled(
        format!("{label}:"),
        style.add_modifier(Modifier::BOLD),
    )));
    for line in wrap_text(content, width) {
        out.push(Line::from(Span::styled(line, style)));
    }
    out.push(Line::from(""));
}

fn notice_style(kind: NoticeKind) -> Style {
    match kind {
        NoticeKind::Info => Style::default().fg(Color::DarkGray),
        NoticeKind::Warning => Style::default().fg(Color::Yellow),
        NoticeKind::Error => Style::default().fg(Color::Red),
    }
}

fn push_message(message: &Message, width: usize, out: &mut Vec<Line<'static>>) {
    if message.is_user() {
        message_lines(
            USER_LABEL,
            &message.content,
            Style::default().fg(Color::Cyan),
            width,
            out,
        );
    } else {
        message_lines(ASSISTANT_LABEL, &message.content, Style::default(), width, out);
    }
}

fn push_notice(notice: &Notice, width: usize, out: &mut Vec<Line<'static>>) {
    message_lines(ASSISTANT_LABEL, &notice.text, notice_style(notice.kind), width, out);
}

/// Transcript of the active chat, wrapped to `width`: stored messages with
/// greeting notices at their positions, then the reply being streamed.
pub fn build_transcript_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let messages = app.chats.messages();
    let mut notices = app.ui.notices.iter().peekable();

    for (index, message) in messages.iter().enumerate() {
        while let Some(placed) = notices.next_if(|placed| placed.after <= index) {
            push_notice(&placed.notice, width, &mut lines);
        }
        push_message(message, width, &mut lines);
    }
    for placed in notices {
        push_notice(&placed.notice, width, &mut lines);
    }

    if let Some(reply) = app.visible_pending_reply() {
        let text = if app.exchange.phase() == ExchangePhase::Sending {
            "…"
        } else {
            reply
        };
        message_lines(ASSISTANT_LABEL, text, Style::default(), width, &mut lines);
    }

    lines
}

fn render_transcript(f: &mut Frame, app: &App, area: Rect) {
    let title = format!(
        " {} · {} ",
        app.chats.display_name(app.chats.active_id()),
        app.settings.model
    );
    let block = Block::default().borders(Borders::TOP).title(title);
    let inner = block.inner(area);

    let lines = build_transcript_lines(app, inner.width.saturating_sub(1) as usize);
    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let max_offset = total.saturating_sub(inner.height);
    let offset = max_offset.saturating_sub(app.ui.scroll_from_bottom);

    let paragraph = Paragraph::new(lines).block(block).scroll((offset, 0));
    f.render_widget(paragraph, area);
}

fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let enabled = app.input_enabled();
    let title = match (&app.engine, app.exchange.phase()) {
        (EngineStatus::Failed(_), _) => " Input disabled ",
        (EngineStatus::Loading { .. }, _) => " Waiting for the engine… ",
        (EngineStatus::Ready, ExchangePhase::Sending) => " Sending… ",
        (EngineStatus::Ready, ExchangePhase::Streaming) => " Replying… ",
        (EngineStatus::Ready, ExchangePhase::Idle) => {
            " Message (Enter send · Ctrl+N new chat · Ctrl+C quit) "
        }
    };
    let border_style = if enabled && app.ui.is_typing() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut textarea = app.ui.textarea.clone();
    textarea.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    );
    if !enabled || !app.ui.is_typing() {
        textarea.set_cursor_style(Style::default());
        textarea.set_style(Style::default().fg(Color::DarkGray));
    }
    f.render_widget(&textarea, area);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    if let EngineStatus::Loading { progress, text } = &app.engine {
        if app.ui.status.is_none() {
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(Color::Cyan))
                .ratio(f64::from(progress.clamp(0.0, 1.0)))
                .label(text.clone());
            f.render_widget(gauge, area);
            return;
        }
    }

    let line = match (&app.ui.status, &app.engine) {
        (Some(notice), _) => Line::from(Span::styled(
            notice.text.clone(),
            notice_style(notice.kind).add_modifier(Modifier::BOLD),
        )),
        (None, EngineStatus::Failed(message)) => Line::from(Span::styled(
            format!("Engine failed to start: {message}"),
            Style::default().fg(Color::Red),
        )),
        _ => Line::from(""),
    };
    f.render_widget(Paragraph::new(line), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_rename_prompt(f: &mut Frame, input: &tui_textarea::TextArea<'static>, area: Rect) {
    let popup = centered(area, 50, 3);
    let mut textarea = input.clone();
    textarea.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" New name (Enter save · Esc cancel) "),
    );
    f.render_widget(Clear, popup);
    f.render_widget(&textarea, popup);
}

fn render_confirm_delete(f: &mut Frame, name: &str, area: Rect) {
    let popup = centered(area, 50, 4);
    let text = vec![
        Line::from(format!("Delete \"{}\"?", truncate_to_width(name, 36))),
        Line::from(Span::styled(
            "y delete · any other key cancels",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let paragraph = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Delete chat "),
    );
    f.render_widget(Clear, popup);
    f.render_widget(paragraph, popup);
}
