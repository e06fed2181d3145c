//! Key chords and the action table they dispatch through.
//!
//! Chords are strings in the terminal library's naming: printable
//! characters stand for themselves, named keys are lowercase words
//! (`enter`, `page down`, `f1`) and modifiers are prefixes (`ctrl s`,
//! `meta x`, `shift up`).

use std::collections::{BTreeMap, HashMap, HashSet};

use crossterm::event::{KeyCode, KeyModifiers};
use tracing::warn;

/// Everything a chord can be bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    Quit,
    Save,
    Reload,
    Up,
    Down,
    Top,
    Bottom,
    PageUp,
    PageDown,
    ToggleHelp,
    ToggleToolbar,
    ToggleWrapping,
    ToggleBorders,
    ChangeFocus,
    Edit,
    Append,
    InsertBefore,
    InsertAfter,
    PriorityUp,
    PriorityDown,
    SwapUp,
    SwapDown,
    Archive,
    Delete,
    Search,
    SearchClear,
}

impl Action {
    pub const ALL: [Action; 26] = [
        Action::Quit,
        Action::Save,
        Action::Reload,
        Action::Up,
        Action::Down,
        Action::Top,
        Action::Bottom,
        Action::PageUp,
        Action::PageDown,
        Action::ToggleHelp,
        Action::ToggleToolbar,
        Action::ToggleWrapping,
        Action::ToggleBorders,
        Action::ChangeFocus,
        Action::Edit,
        Action::Append,
        Action::InsertBefore,
        Action::InsertAfter,
        Action::PriorityUp,
        Action::PriorityDown,
        Action::SwapUp,
        Action::SwapDown,
        Action::Archive,
        Action::Delete,
        Action::Search,
        Action::SearchClear,
    ];

    /// Name used in the `[keys]` config section.
    pub fn name(self) -> &'static str {
        match self {
            Action::Quit => "quit",
            Action::Save => "save",
            Action::Reload => "reload",
            Action::Up => "up",
            Action::Down => "down",
            Action::Top => "top",
            Action::Bottom => "bottom",
            Action::PageUp => "page-up",
            Action::PageDown => "page-down",
            Action::ToggleHelp => "toggle-help",
            Action::ToggleToolbar => "toggle-toolbar",
            Action::ToggleWrapping => "toggle-wrapping",
            Action::ToggleBorders => "toggle-borders",
            Action::ChangeFocus => "change-focus",
            Action::Edit => "edit",
            Action::Append => "append",
            Action::InsertBefore => "insert-before",
            Action::InsertAfter => "insert-after",
            Action::PriorityUp => "priority-up",
            Action::PriorityDown => "priority-down",
            Action::SwapUp => "swap-up",
            Action::SwapDown => "swap-down",
            Action::Archive => "archive",
            Action::Delete => "delete",
            Action::Search => "search",
            Action::SearchClear => "search-clear",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|action| action.name() == name)
    }

    /// One-line description for the help panel.
    pub fn description(self) -> &'static str {
        match self {
            Action::Quit => "Quit (saves first)",
            Action::Save => "Save file",
            Action::Reload => "Reload file from disk",
            Action::Up => "Previous line",
            Action::Down => "Next line",
            Action::Top => "First line",
            Action::Bottom => "Last line",
            Action::PageUp => "Page up",
            Action::PageDown => "Page down",
            Action::ToggleHelp => "Show/hide this help",
            Action::ToggleToolbar => "Show/hide toolbar",
            Action::ToggleWrapping => "Toggle word wrap",
            Action::ToggleBorders => "Toggle line borders",
            Action::ChangeFocus => "Switch focus body/toolbar",
            Action::Edit => "Edit line",
            Action::Append => "Add line at the end",
            Action::InsertBefore => "Insert line above",
            Action::InsertAfter => "Insert line below",
            Action::PriorityUp => "Raise priority",
            Action::PriorityDown => "Lower priority",
            Action::SwapUp => "Move line up",
            Action::SwapDown => "Move line down",
            Action::Archive => "Move line to archive file",
            Action::Delete => "Delete line",
            Action::Search => "Filter lines",
            Action::SearchClear => "Clear filter",
        }
    }

    fn default_chords(self) -> &'static [&'static str] {
        match self {
            Action::Quit => &["q", "ctrl q"],
            Action::Save => &["S", "ctrl s"],
            Action::Reload => &["R", "ctrl r"],
            Action::Up => &["k", "up"],
            Action::Down => &["j", "down"],
            Action::Top => &["g", "home"],
            Action::Bottom => &["G", "end"],
            Action::PageUp => &["page up"],
            Action::PageDown => &["page down"],
            Action::ToggleHelp => &["h", "?", "f1"],
            Action::ToggleToolbar => &["t"],
            Action::ToggleWrapping => &["w"],
            Action::ToggleBorders => &["b"],
            Action::ChangeFocus => &["tab"],
            Action::Edit => &["enter", "e", "A"],
            Action::Append => &["n"],
            Action::InsertBefore => &["O"],
            Action::InsertAfter => &["o"],
            Action::PriorityUp => &["p"],
            Action::PriorityDown => &["P"],
            Action::SwapUp => &["K"],
            Action::SwapDown => &["J"],
            Action::Archive => &["X"],
            Action::Delete => &["D"],
            Action::Search => &["/"],
            Action::SearchClear => &["C"],
        }
    }
}

/// Names a key event the way chords are written in the config file.
/// Returns `None` for keys that cannot be bound.
pub fn chord_from_key(code: KeyCode, modifiers: KeyModifiers) -> Option<String> {
    let mut prefix = String::new();
    let is_char = matches!(code, KeyCode::Char(_));
    if modifiers.contains(KeyModifiers::SHIFT) && !is_char {
        prefix.push_str("shift ");
    }
    if modifiers.contains(KeyModifiers::ALT) {
        prefix.push_str("meta ");
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        prefix.push_str("ctrl ");
    }

    let key = match code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(ch) if modifiers.contains(KeyModifiers::CONTROL) => {
            ch.to_lowercase().to_string()
        }
        KeyCode::Char(ch) => ch.to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::BackTab => return Some(format!("{}tab", with_shift(&prefix))),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Insert => "insert".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "page up".to_string(),
        KeyCode::PageDown => "page down".to_string(),
        KeyCode::F(n) => format!("f{n}"),
        _ => return None,
    };
    Some(format!("{prefix}{key}"))
}

fn with_shift(prefix: &str) -> String {
    if prefix.starts_with("shift ") {
        prefix.to_string()
    } else {
        format!("shift {prefix}")
    }
}

/// Splits a `[keys]` value into chords.
pub fn parse_chord_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|chord| !chord.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Debug)]
pub struct KeyBindings {
    bindings: BTreeMap<Action, Vec<String>>,
    lookup: HashMap<String, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let bindings = Action::ALL
            .into_iter()
            .map(|action| {
                let chords = action
                    .default_chords()
                    .iter()
                    .map(|chord| chord.to_string())
                    .collect();
                (action, chords)
            })
            .collect();
        Self::build(bindings, &HashSet::new())
    }
}

impl KeyBindings {
    /// Overlays a `[keys]` section on `defaults`. An action named in the
    /// section gets exactly the listed chords. When a chord ends up on two
    /// actions the configured one keeps it.
    pub fn from_config<'a, I>(section: I, defaults: KeyBindings) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut bindings = defaults.bindings;
        let mut configured = HashSet::new();
        for (name, value) in section {
            match Action::from_name(name) {
                Some(action) => {
                    bindings.insert(action, parse_chord_list(value));
                    configured.insert(action);
                }
                None => warn!(target: "keys", name, "unknown_action_in_config"),
            }
        }
        Self::build(bindings, &configured)
    }

    fn build(mut bindings: BTreeMap<Action, Vec<String>>, configured: &HashSet<Action>) -> Self {
        let mut lookup = HashMap::new();
        let order = Action::ALL
            .into_iter()
            .filter(|action| configured.contains(action))
            .chain(
                Action::ALL
                    .into_iter()
                    .filter(|action| !configured.contains(action)),
            );
        for action in order {
            let Some(chords) = bindings.get_mut(&action) else {
                continue;
            };
            chords.retain(|chord| match lookup.get(chord) {
                Some(owner) => {
                    warn!(
                        target: "keys",
                        chord = chord.as_str(),
                        kept = Action::name(*owner),
                        dropped = action.name(),
                        "conflicting_binding"
                    );
                    false
                }
                None => {
                    lookup.insert(chord.clone(), action);
                    true
                }
            });
        }
        Self { bindings, lookup }
    }

    /// Whether `chord` triggers `action`. Membership query for callers that
    /// inspect the table rather than dispatch through it.
    pub fn is_bound_to(&self, chord: &str, action: Action) -> bool {
        self.bindings
            .get(&action)
            .is_some_and(|chords| chords.iter().any(|bound| bound == chord))
    }

    pub fn action_for(&self, chord: &str) -> Option<Action> {
        self.lookup.get(chord).copied()
    }

    pub fn chords(&self, action: Action) -> &[String] {
        self.bindings
            .get(&action)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// First chord of an action, for compact labels.
    pub fn primary_chord(&self, action: Action) -> Option<&str> {
        self.chords(action).first().map(String::as_str)
    }

    /// `(action, "chord, chord")` pairs sorted by action name.
    pub fn serialize(&self) -> Vec<(&'static str, String)> {
        let mut pairs: Vec<_> = self
            .bindings
            .iter()
            .map(|(action, chords)| (action.name(), chords.join(", ")))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
    }
}
