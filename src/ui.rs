use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem, ListState, Paragraph, Wrap};

use crate::app::{App, StatusMessage, View};
use crate::navigator::PreviewNavigator;

const STATUS_DURATION_MS: u128 = 2500;
const SELECTED_MARKER: &str = "▶ ";
const UNSELECTED_MARKER: &str = "  ";
const UNSET_LABEL: &str = "(unset)";

pub(crate) fn render_app(frame: &mut Frame, app: &mut App) {
    match app.view {
        View::Mapping => render_mapping(frame, app),
        View::Preview => render_preview(frame, app),
        View::Error => render_error(frame, app),
    }
}

fn render_error(frame: &mut Frame, app: &mut App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(1)])
        .split(frame.area());
    let message = app
        .error_message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());
    let paragraph = Paragraph::new(message)
        .block(Block::bordered().title("Error"))
        .style(Style::new().fg(Color::Red))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, layout[0]);
    render_status(frame, "r reload  q quit", None, layout[1]);
}

fn render_mapping(frame: &mut Frame, app: &mut App) {
    let Some(navigator) = app.navigator.as_ref() else {
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(1)])
        .split(frame.area());
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(layout[0]);

    let list_area = horizontal[0];
    let inner = inner_rect(list_area);
    let view_height = inner.height as usize;
    let placeholders = navigator.placeholders();
    app.list_scroll = ensure_visible(app.list_scroll, app.selected, placeholders.len(), view_height);

    let start = app.list_scroll;
    let end = (start + view_height).min(placeholders.len());
    let items: Vec<ListItem> = placeholders[start..end]
        .iter()
        .enumerate()
        .map(|(idx, placeholder)| {
            let marker = if start + idx == app.selected {
                SELECTED_MARKER
            } else {
                UNSELECTED_MARKER
            };
            let column = match navigator.mapping().get(placeholder) {
                Some(column) => Span::styled(column.to_string(), Style::new().fg(Color::Green)),
                None => Span::styled(UNSET_LABEL, Style::new().fg(Color::Yellow)),
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{marker}{placeholder}  → ")),
                column,
            ]))
        })
        .collect();

    let mapping = navigator.mapping();
    let title = format!(
        "Placeholders ({}/{} mapped)",
        mapping.len() - mapping.unmapped().len(),
        mapping.len()
    );
    let mut state = ListState::default();
    if app.selected >= start && app.selected < end {
        state.select(Some(app.selected - start));
    }
    let list = List::new(items)
        .block(Block::bordered().title(title))
        .highlight_style(Style::new().add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(list, list_area, &mut state);

    render_overview(frame, navigator, horizontal[1]);

    let status = app.status.as_ref();
    render_status(
        frame,
        "↑↓ select  ←→ column  ⌫ clear  a auto  Enter preview  r reload  q quit",
        status,
        layout[1],
    );
}

fn render_overview(frame: &mut Frame, navigator: &PreviewNavigator, area: Rect) {
    let mapping = navigator.mapping();
    let unused = mapping.unused_columns(navigator.columns());
    let mut lines = vec![
        Line::from(format!("Template: {}", navigator.template().name)),
        Line::from(format!("Rows: {}", navigator.row_count())),
        Line::from(format!("Columns: {}", navigator.columns().join(", "))),
    ];
    if !unused.is_empty() {
        lines.push(Line::styled(
            format!("Unused columns: {}", unused.join(", ")),
            Style::new().fg(Color::DarkGray),
        ));
    }
    lines.push(Line::from(""));
    lines.extend(
        navigator
            .template()
            .body
            .lines()
            .map(|line| Line::from(line.to_string())),
    );
    let paragraph = Paragraph::new(lines)
        .block(Block::bordered().title("Data & template"))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_preview(frame: &mut Frame, app: &mut App) {
    let Some(navigator) = app.navigator.as_ref() else {
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(1)])
        .split(frame.area());

    let (title, body) = match navigator.current() {
        Some(result) => (
            format!(
                "Preview {} of {}: {}",
                result.position,
                result.total,
                navigator.template().name
            ),
            result.body.as_str(),
        ),
        None => ("Preview".to_string(), ""),
    };
    let paragraph = Paragraph::new(body)
        .block(Block::bordered().title(title))
        .wrap(Wrap { trim: false })
        .scroll((app.preview_scroll, 0));
    frame.render_widget(paragraph, layout[0]);

    render_status(
        frame,
        "←→ prev/next  g/G first/last  ↑↓ scroll  Ctrl+C copy  x export all  Esc mapping",
        app.status.as_ref(),
        layout[1],
    );
}

fn render_status(frame: &mut Frame, help: &str, status: Option<&StatusMessage>, area: Rect) {
    let mut text = help.to_string();
    if let Some(message) = status.filter(|msg| msg.since.elapsed().as_millis() <= STATUS_DURATION_MS)
    {
        text.push_str("  |  ");
        text.push_str(&message.text);
    }
    let paragraph = Paragraph::new(text).style(Style::new().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn inner_rect(area: Rect) -> Rect {
    let mut inner = area;
    if inner.width >= 2 {
        inner.x += 1;
        inner.width -= 2;
    }
    if inner.height >= 2 {
        inner.y += 1;
        inner.height -= 2;
    }
    inner
}

fn ensure_visible(current_scroll: usize, selected: usize, total: usize, view_height: usize) -> usize {
    if total == 0 || view_height == 0 {
        return 0;
    }
    let mut scroll = current_scroll.min(total.saturating_sub(1));
    if selected < scroll {
        scroll = selected;
    } else if selected >= scroll + view_height {
        scroll = selected + 1 - view_height;
    }
    scroll
}
