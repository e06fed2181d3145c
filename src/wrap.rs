use unicode_width::UnicodeWidthChar;

/// How a line item wider than the body is shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapMode {
    /// Cut at the right edge.
    Clip,
    /// Break between words.
    Space,
}

impl WrapMode {
    pub fn toggled(self) -> Self {
        match self {
            WrapMode::Clip => WrapMode::Space,
            WrapMode::Space => WrapMode::Clip,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WrapMode::Clip => "clip",
            WrapMode::Space => "space",
        }
    }
}

/// One visual row of a line item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisualRow {
    pub text: String,
    /// Char offset of the row's first character in the line.
    pub start: usize,
}

fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

/// Lays a line out in `width` columns. Always yields at least one row.
pub fn layout_line(text: &str, width: usize, mode: WrapMode) -> Vec<VisualRow> {
    match mode {
        WrapMode::Clip => vec![clip_window(text, 0, width)],
        WrapMode::Space => word_wrap(text, width),
    }
}

/// The part of `text` that fits `width` columns, scrolled right only as far
/// as needed to keep the char at `cursor` visible.
pub fn clip_window(text: &str, cursor: usize, width: usize) -> VisualRow {
    let chars: Vec<char> = text.chars().collect();
    let width = width.max(1);
    let cursor = cursor.min(chars.len());

    // Columns needed from `start` up to and including the cursor cell.
    let mut start = 0;
    let mut used: usize = chars[..cursor].iter().copied().map(char_width).sum::<usize>() + 1;
    while used > width && start < cursor {
        used -= char_width(chars[start]);
        start += 1;
    }

    let mut columns = 0;
    let visible: String = chars[start..]
        .iter()
        .take_while(|ch| {
            columns += char_width(**ch);
            columns <= width
        })
        .collect();
    VisualRow {
        text: visible,
        start,
    }
}

fn word_wrap(text: &str, width: usize) -> Vec<VisualRow> {
    let chars: Vec<char> = text.chars().collect();
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut row_start = 0;
    let mut column = 0;
    let mut last_break: Option<usize> = None;

    for (idx, ch) in chars.iter().copied().enumerate() {
        let ch_width = char_width(ch);
        if column + ch_width > width && idx > row_start {
            let break_at = match last_break {
                Some(at) if at > row_start => at,
                _ => idx,
            };
            rows.push(VisualRow {
                text: chars[row_start..break_at].iter().collect(),
                start: row_start,
            });
            row_start = break_at;
            column = chars[row_start..idx].iter().copied().map(char_width).sum();
            last_break = None;
        }
        column += ch_width;
        if ch == ' ' {
            last_break = Some(idx + 1);
        }
    }
    rows.push(VisualRow {
        text: chars[row_start..].iter().collect(),
        start: row_start,
    });
    rows
}

/// Row and column of the char offset `cursor` within laid-out rows.
pub fn cursor_position(rows: &[VisualRow], text: &str, cursor: usize) -> (usize, usize) {
    let row = rows
        .iter()
        .rposition(|row| row.start <= cursor)
        .unwrap_or(0);
    let start = rows.get(row).map(|row| row.start).unwrap_or(0);
    let column = text
        .chars()
        .skip(start)
        .take(cursor.saturating_sub(start))
        .map(char_width)
        .sum();
    (row, column)
}
