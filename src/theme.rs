use ratatui::style::{Color, Modifier, Style};

/// Theme configuration for the editor
#[derive(Clone, Debug)]
pub struct Theme {
    /// Background color for the body
    pub background: Color,

    /// Foreground (text) color for the header rows
    pub header_fg: Color,

    /// Background color for the header rows
    pub header_bg: Color,

    /// Color for the word/char/line counters
    pub count_color: Color,

    /// Color for the file path and status message
    pub file_color: Color,

    /// Foreground color for the focused line
    pub selection_fg: Color,

    /// Background color for the focused line
    pub selection_bg: Color,

    /// Background color for the line being edited
    pub editing_bg: Color,

    /// Border color around line items in bordered mode
    pub border_color: Color,

    /// Foreground color for a focused toolbar control
    pub control_selected_fg: Color,

    /// Background color for a focused toolbar control
    pub control_selected_bg: Color,

    /// Foreground colors for priorities A through F
    pub priority_colors: [Color; 6],

    /// Color for action names in the help panel
    pub help_action_color: Color,

    /// Color for key chords in the help panel
    pub help_chord_color: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Reset,
            header_fg: Color::White,
            header_bg: Color::Blue,
            count_color: Color::LightCyan,
            file_color: Color::LightYellow,
            selection_fg: Color::White,
            selection_bg: Color::DarkGray,
            editing_bg: Color::Black,
            border_color: Color::Gray,
            control_selected_fg: Color::Black,
            control_selected_bg: Color::White,
            priority_colors: [
                Color::LightRed,
                Color::LightYellow,
                Color::LightGreen,
                Color::LightCyan,
                Color::LightBlue,
                Color::LightMagenta,
            ],
            help_action_color: Color::LightYellow,
            help_chord_color: Color::LightCyan,
        }
    }
}

impl Theme {
    /// Create a new theme with default colors
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body_style(&self) -> Style {
        Style::default().bg(self.background)
    }

    pub fn header_style(&self) -> Style {
        Style::default().fg(self.header_fg).bg(self.header_bg)
    }

    pub fn count_style(&self) -> Style {
        self.header_style()
            .fg(self.count_color)
            .add_modifier(Modifier::BOLD)
    }

    pub fn file_style(&self) -> Style {
        self.header_style().fg(self.file_color)
    }

    /// Get the style for the focused line
    pub fn selection_style(&self) -> Style {
        Style::default().fg(self.selection_fg).bg(self.selection_bg)
    }

    pub fn editing_style(&self) -> Style {
        Style::default().bg(self.editing_bg)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border_color)
    }

    pub fn control_style(&self, selected: bool) -> Style {
        if selected {
            Style::default()
                .fg(self.control_selected_fg)
                .bg(self.control_selected_bg)
        } else {
            self.header_style()
        }
    }

    /// Style for a line carrying `priority`; untagged lines use the default.
    pub fn priority_style(&self, priority: Option<char>) -> Style {
        let color = priority
            .and_then(|tag| (tag as usize).checked_sub('A' as usize))
            .and_then(|idx| self.priority_colors.get(idx).copied());
        match color {
            Some(color) => Style::default().fg(color),
            None => Style::default(),
        }
    }

    pub fn help_action_style(&self) -> Style {
        Style::default()
            .fg(self.help_action_color)
            .add_modifier(Modifier::BOLD)
    }

    pub fn help_chord_style(&self) -> Style {
        Style::default().fg(self.help_chord_color)
    }
}
