//! Drawing. Reads session state and renders one frame; the only state it
//! writes back is the scroll offset and the page height.

use std::sync::Arc;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{
    document::{Document, parse_priority},
    keys::{Action, KeyBindings},
    session::{BorderMode, Focus, Session, ToolbarControl},
    theme::Theme,
    wrap::{VisualRow, WrapMode, clip_window, cursor_position, layout_line},
};

const HELP_WIDTH_RATIO: (u32, u32) = (2, 5);

struct ItemLayout {
    index: usize,
    rows: Vec<VisualRow>,
    cursor: Option<(usize, usize)>,
    height: usize,
}

pub fn draw(frame: &mut Frame, session: &mut Session, theme: &Theme) {
    let area = frame.area();
    if area.height == 0 || area.width == 0 {
        return;
    }
    frame.render_widget(Block::default().style(theme.body_style()), area);

    let context = Arc::clone(session.context());
    let document = context.document();

    let toolbar_height = if session.toolbar_open() { 1 } else { 0 };
    let search_height = if session.search().is_some() { 1 } else { 0 };
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(toolbar_height),
            Constraint::Min(1),
            Constraint::Length(search_height),
        ])
        .split(area);

    draw_header(frame, vertical[0], session, &document, theme);
    if session.toolbar_open() {
        draw_toolbar(frame, vertical[1], session, theme);
    }

    let mut body_area = vertical[2];
    if session.help_open() {
        let (help, total) = HELP_WIDTH_RATIO;
        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(total - help, total),
                Constraint::Ratio(help, total),
            ])
            .split(body_area);
        body_area = horizontal[0];
        draw_help(frame, horizontal[1], session.bindings(), theme);
    }
    draw_body(frame, body_area, session, &document, theme);

    if session.search().is_some() {
        draw_search(frame, vertical[3], session, theme);
    }
}

fn draw_header(
    frame: &mut Frame,
    area: Rect,
    session: &Session,
    document: &Document,
    theme: &Theme,
) {
    let counts = format!(
        " {} words  {} chars  {} lines",
        document.word_count(),
        document.char_count(),
        document.line_count()
    );
    let status = session
        .status_message()
        .map(|message| format!("{message}  "))
        .unwrap_or_default();
    let path = format!("{} ", document.file_path().display());

    let width = area.width as usize;
    let counts_width = counts.width();
    let room = width.saturating_sub(counts_width + 1);
    let status = fit_tail(&status, room);
    let path = fit_tail(&path, room.saturating_sub(status.width()));
    let padding = width.saturating_sub(counts_width + status.width() + path.width());

    let line = Line::from(vec![
        Span::styled(counts, theme.count_style()),
        Span::styled(" ".repeat(padding), theme.header_style()),
        Span::styled(status, theme.file_style()),
        Span::styled(path, theme.file_style()),
    ]);
    frame.render_widget(Paragraph::new(line).style(theme.header_style()), area);
}

/// Keeps the end of `text` within `width` columns, marking a cut with `…`.
fn fit_tail(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut used = 1;
    let mut kept = Vec::new();
    for ch in text.chars().rev() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > width {
            break;
        }
        used += ch_width;
        kept.push(ch);
    }
    std::iter::once('…').chain(kept.into_iter().rev()).collect()
}

fn toolbar_label(control: ToolbarControl, session: &Session) -> String {
    let check = |on: bool| if on { 'x' } else { ' ' };
    match control {
        ToolbarControl::WordWrap => format!(
            "[{}] word wrap",
            check(session.wrap_mode() == WrapMode::Space)
        ),
        ToolbarControl::Borders => format!(
            "[{}] borders",
            check(session.border_mode() == BorderMode::Bordered)
        ),
        ToolbarControl::Reload => "< Reload >".to_string(),
        ToolbarControl::Save => "< Save >".to_string(),
    }
}

fn draw_toolbar(frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
    let focused = session.focus() == Focus::Toolbar;
    let mut spans = vec![Span::styled(" ", theme.header_style())];
    for control in ToolbarControl::ALL {
        let selected = focused && session.toolbar_selected() == control;
        spans.push(Span::styled(
            toolbar_label(control, session),
            theme.control_style(selected),
        ));
        spans.push(Span::styled("  ", theme.header_style()));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(theme.header_style()),
        area,
    );
}

fn layout_item(
    index: usize,
    text: &str,
    width: usize,
    mode: WrapMode,
    cursor: Option<usize>,
    bordered: bool,
) -> ItemLayout {
    let rows = match (mode, cursor) {
        (WrapMode::Clip, Some(cursor)) => vec![clip_window(text, cursor, width)],
        _ => layout_line(text, width, mode),
    };
    let cursor = cursor.map(|cursor| cursor_position(&rows, text, cursor));
    let height = rows.len() + if bordered { 2 } else { 0 };
    ItemLayout {
        index,
        rows,
        cursor,
        height,
    }
}

/// First item to draw so the focused item fits below it.
fn adjust_scroll(
    scroll_top: usize,
    focused: Option<usize>,
    heights: &[usize],
    viewport: usize,
) -> usize {
    let Some(focused) = focused else {
        return 0;
    };
    let mut top = scroll_top.min(focused);
    let mut used: usize = heights[top..=focused].iter().sum();
    while top < focused && used > viewport {
        used -= heights[top];
        top += 1;
    }
    top
}

fn draw_body(
    frame: &mut Frame,
    area: Rect,
    session: &mut Session,
    document: &Document,
    theme: &Theme,
) {
    let bordered = session.border_mode() == BorderMode::Bordered;
    let visible = session.visible_in(document);
    let focused = session.focused_position(&visible);
    session.set_page_height(area.height as usize / if bordered { 3 } else { 1 });

    if visible.is_empty() {
        let hint = if session.search().is_some() {
            "No lines match.".to_string()
        } else {
            let chord = session
                .bindings()
                .primary_chord(Action::Append)
                .unwrap_or(Action::Append.name());
            format!("Nothing here yet. Press {chord} to start writing.")
        };
        frame.render_widget(Paragraph::new(hint).style(theme.body_style()), area);
        return;
    }

    let inner_width = (area.width as usize).saturating_sub(if bordered { 2 } else { 0 });
    let editing = session.editing();
    let items: Vec<ItemLayout> = visible
        .iter()
        .map(|&index| {
            let cursor = editing
                .filter(|edit| edit.index == index)
                .map(|edit| edit.cursor);
            let text = document.line(index).unwrap_or_default();
            layout_item(index, text, inner_width, session.wrap_mode(), cursor, bordered)
        })
        .collect();

    let heights: Vec<usize> = items.iter().map(|item| item.height).collect();
    let top = adjust_scroll(session.scroll_top(), focused, &heights, area.height as usize);
    session.set_scroll_top(top);

    let mut y = area.y;
    for (position, item) in items.iter().enumerate().skip(top) {
        if y >= area.bottom() {
            break;
        }
        let height = (item.height as u16).min(area.bottom() - y);
        let rect = Rect::new(area.x, y, area.width, height);

        let style = if item.cursor.is_some() {
            theme.editing_style()
        } else if Some(position) == focused {
            theme.selection_style()
        } else {
            let (priority, _) = parse_priority(document.line(item.index).unwrap_or_default());
            theme.priority_style(priority)
        };

        let inner = if bordered {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style());
            let inner = block.inner(rect);
            frame.render_widget(block, rect);
            inner
        } else {
            rect
        };

        let lines: Vec<Line> = item
            .rows
            .iter()
            .map(|row| Line::from(row.text.clone()))
            .collect();
        frame.render_widget(Paragraph::new(Text::from(lines)).style(style), inner);

        if let Some((row, column)) = item.cursor {
            let cursor_y = inner.y + row as u16;
            if cursor_y < inner.bottom() && inner.width > 0 {
                let cursor_x = inner.x + (column as u16).min(inner.width - 1);
                frame.set_cursor_position(Position::new(cursor_x, cursor_y));
            }
        }
        y += height;
    }
}

fn draw_help(frame: &mut Frame, area: Rect, bindings: &KeyBindings, theme: &Theme) {
    let name_width = Action::ALL
        .iter()
        .map(|action| action.name().len())
        .max()
        .unwrap_or(0)
        + 2;
    let chords: Vec<String> = Action::ALL
        .iter()
        .map(|action| bindings.chords(*action).join(", "))
        .collect();
    let chord_width = chords.iter().map(|chord| chord.width()).max().unwrap_or(0) + 2;
    let lines: Vec<Line> = Action::ALL
        .iter()
        .zip(&chords)
        .map(|(action, chord)| {
            Line::from(vec![
                Span::styled(
                    format!("{:<name_width$}", action.name()),
                    theme.help_action_style(),
                ),
                Span::styled(format!("{chord:<chord_width$}"), theme.help_chord_style()),
                Span::raw(action.description()),
            ])
        })
        .collect();
    let block = Block::default()
        .borders(Borders::LEFT)
        .border_style(theme.border_style())
        .title(" keys ");
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(block)
            .style(theme.body_style()),
        area,
    );
}

fn draw_search(frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
    let Some(search) = session.search() else {
        return;
    };
    let prompt = format!("/{}", search.term);
    let mut spans = vec![Span::styled(prompt.clone(), Style::default())];
    if !search.typing {
        if let Some(chord) = session.bindings().primary_chord(Action::SearchClear) {
            spans.push(Span::styled(
                format!("  ({chord} clears)"),
                theme.help_chord_style(),
            ));
        }
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(theme.body_style()),
        area,
    );

    if search.typing && area.width > 0 {
        let column = (prompt.width() as u16).min(area.width - 1);
        frame.set_cursor_position(Position::new(area.x + column, area.y));
    }
}
