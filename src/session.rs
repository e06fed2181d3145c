//! Interactive session state and key dispatch.
//!
//! Everything here is terminal-independent: the UI feeds key events in and
//! reads state back out to draw. Toggles are independent of each other, so
//! the session is a handful of flags rather than one mode enum.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crossterm::event::{KeyCode, KeyModifiers};
use tracing::{debug, info, warn};

use crate::{
    autosave::AutosaveEvent,
    context::SessionContext,
    document::{Document, cycle_priority},
    keys::{Action, KeyBindings, chord_from_key},
    wrap::WrapMode,
};

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const DEFAULT_PAGE_HEIGHT: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderMode {
    NoBorder,
    Bordered,
}

impl BorderMode {
    pub fn toggled(self) -> Self {
        match self {
            BorderMode::NoBorder => BorderMode::Bordered,
            BorderMode::Bordered => BorderMode::NoBorder,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Body,
    Toolbar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertPosition {
    Append,
    Before,
    After,
}

/// Controls on the toolbar row, left to right.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolbarControl {
    WordWrap,
    Borders,
    Reload,
    Save,
}

impl ToolbarControl {
    pub const ALL: [ToolbarControl; 4] = [
        ToolbarControl::WordWrap,
        ToolbarControl::Borders,
        ToolbarControl::Reload,
        ToolbarControl::Save,
    ];

    pub fn action(self) -> Action {
        match self {
            ToolbarControl::WordWrap => Action::ToggleWrapping,
            ToolbarControl::Borders => Action::ToggleBorders,
            ToolbarControl::Reload => Action::Reload,
            ToolbarControl::Save => Action::Save,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub word_wrap: bool,
    pub borders: bool,
    pub show_toolbar: bool,
}

/// The line under edit. Edits go straight into the document so counts and
/// autosaves always see the latest text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditState {
    pub index: usize,
    /// Char offset within the line.
    pub cursor: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchState {
    pub term: String,
    /// True while keystrokes go into the term.
    pub typing: bool,
}

#[derive(Clone, Copy, Debug)]
enum EditOp {
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
}

pub struct Session {
    context: Arc<SessionContext>,
    bindings: KeyBindings,
    focus_line: usize,
    focus: Focus,
    toolbar_open: bool,
    help_open: bool,
    wrap: WrapMode,
    border: BorderMode,
    toolbar_selected: usize,
    editing: Option<EditState>,
    search: Option<SearchState>,
    status: Option<(String, Instant)>,
    scroll_top: usize,
    page_height: usize,
    should_quit: bool,
}

impl Session {
    pub fn new(context: Arc<SessionContext>, bindings: KeyBindings, options: SessionOptions) -> Self {
        let mut session = Self {
            context,
            bindings,
            focus_line: 0,
            focus: Focus::Body,
            toolbar_open: false,
            help_open: false,
            wrap: WrapMode::Clip,
            border: BorderMode::NoBorder,
            toolbar_selected: 0,
            editing: None,
            search: None,
            status: None,
            scroll_top: 0,
            page_height: DEFAULT_PAGE_HEIGHT,
            should_quit: false,
        };
        if options.word_wrap {
            session.dispatch(Action::ToggleWrapping);
        }
        if options.borders {
            session.dispatch(Action::ToggleBorders);
        }
        if options.show_toolbar {
            session.dispatch(Action::ToggleToolbar);
        }
        session
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn toolbar_open(&self) -> bool {
        self.toolbar_open
    }

    pub fn help_open(&self) -> bool {
        self.help_open
    }

    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap
    }

    pub fn border_mode(&self) -> BorderMode {
        self.border
    }

    pub fn toolbar_selected(&self) -> ToolbarControl {
        ToolbarControl::ALL[self.toolbar_selected % ToolbarControl::ALL.len()]
    }

    pub fn editing(&self) -> Option<EditState> {
        self.editing
    }

    pub fn search(&self) -> Option<&SearchState> {
        self.search.as_ref()
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn set_scroll_top(&mut self, scroll_top: usize) {
        self.scroll_top = scroll_top;
    }

    pub fn set_page_height(&mut self, height: usize) {
        self.page_height = height.max(1);
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), Instant::now()));
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status
            .as_ref()
            .filter(|(_, since)| since.elapsed() <= STATUS_TIMEOUT)
            .map(|(message, _)| message.as_str())
    }

    pub fn has_status_message(&self) -> bool {
        self.status.is_some()
    }

    pub fn on_tick(&mut self) {
        if let Some((_, since)) = &self.status {
            if since.elapsed() > STATUS_TIMEOUT {
                self.status = None;
            }
        }
    }

    pub fn on_autosave_event(&mut self, event: AutosaveEvent) {
        match event {
            AutosaveEvent::Saved => self.set_status("Autosaved"),
            AutosaveEvent::Failed(message) => self.set_status(format!("Autosave failed: {message}")),
        }
    }

    /// Document indices of the lines currently shown, in order.
    pub fn visible_indices(&self) -> Vec<usize> {
        let document = self.context.document();
        self.visible_in(&document)
    }

    pub fn visible_in(&self, document: &Document) -> Vec<usize> {
        let editing = self.editing.map(|edit| edit.index);
        match self.search.as_ref().filter(|search| !search.term.is_empty()) {
            Some(search) => {
                let needle = search.term.to_lowercase();
                document
                    .lines()
                    .iter()
                    .enumerate()
                    .filter(|(idx, line)| {
                        Some(*idx) == editing || line.to_lowercase().contains(&needle)
                    })
                    .map(|(idx, _)| idx)
                    .collect()
            }
            None => (0..document.line_count()).collect(),
        }
    }

    /// Document index of the focused line, if any line is shown.
    pub fn focused_line(&self) -> Option<usize> {
        let visible = self.visible_indices();
        self.focused_position(&visible).map(|pos| visible[pos])
    }

    /// Position of the focused line within `visible`.
    pub fn focused_position(&self, visible: &[usize]) -> Option<usize> {
        if visible.is_empty() {
            return None;
        }
        Some(
            visible
                .iter()
                .position(|idx| *idx == self.focus_line)
                .unwrap_or(0),
        )
    }

    fn is_filtering(&self) -> bool {
        self.search
            .as_ref()
            .is_some_and(|search| !search.term.is_empty())
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if self.search.as_ref().is_some_and(|search| search.typing) {
            self.handle_search_key(code, modifiers);
            self.ensure_focus_visible();
            return;
        }

        if self.editing.is_some() {
            if self.handle_edit_key(code, modifiers) {
                return;
            }
            self.finish_editing();
        }

        let Some(chord) = chord_from_key(code, modifiers) else {
            return;
        };
        if self.focus == Focus::Toolbar && self.handle_toolbar_chord(&chord) {
            return;
        }
        match self.bindings.action_for(&chord) {
            Some(action) => self.dispatch(action),
            None => debug!(target: "keys", chord = chord.as_str(), "unbound_chord"),
        }
    }

    /// Runs the handler for one action.
    pub fn dispatch(&mut self, action: Action) {
        debug!(target: "keys", action = action.name(), "dispatch");
        if self.editing.is_some() {
            self.finish_editing();
        }
        match action {
            Action::Quit => self.should_quit = true,
            Action::Save => self.save(),
            Action::Reload => self.reload(),
            Action::Up => self.move_focus(-1),
            Action::Down => self.move_focus(1),
            Action::Top => self.move_focus(isize::MIN),
            Action::Bottom => self.move_focus(isize::MAX),
            Action::PageUp => self.move_focus(-(self.page_height as isize)),
            Action::PageDown => self.move_focus(self.page_height as isize),
            Action::ToggleHelp => self.help_open = !self.help_open,
            Action::ToggleToolbar => {
                self.toolbar_open = !self.toolbar_open;
                if !self.toolbar_open {
                    self.focus = Focus::Body;
                }
            }
            Action::ToggleWrapping => self.wrap = self.wrap.toggled(),
            Action::ToggleBorders => self.border = self.border.toggled(),
            Action::ChangeFocus => {
                self.focus = match (self.focus, self.toolbar_open) {
                    (Focus::Body, true) => Focus::Toolbar,
                    _ => Focus::Body,
                };
            }
            Action::Edit => self.start_editing(),
            Action::Append => self.add_line(InsertPosition::Append),
            Action::InsertBefore => self.add_line(InsertPosition::Before),
            Action::InsertAfter => self.add_line(InsertPosition::After),
            Action::PriorityUp => self.adjust_priority(true),
            Action::PriorityDown => self.adjust_priority(false),
            Action::SwapUp => self.swap(-1),
            Action::SwapDown => self.swap(1),
            Action::Archive => self.archive(),
            Action::Delete => self.delete(),
            Action::Search => {
                self.search = Some(SearchState {
                    term: String::new(),
                    typing: true,
                });
            }
            Action::SearchClear => self.search = None,
        }
        self.ensure_focus_visible();
    }

    fn handle_search_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        let plain = !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        let Some(search) = self.search.as_mut() else {
            return;
        };
        match code {
            KeyCode::Char(ch) if plain => search.term.push(ch),
            KeyCode::Backspace => {
                search.term.pop();
            }
            KeyCode::Enter => {
                search.typing = false;
                if search.term.is_empty() {
                    self.search = None;
                }
            }
            KeyCode::Esc => self.search = None,
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let plain = !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        match code {
            KeyCode::Char(ch) if plain => self.apply_edit(EditOp::Insert(ch)),
            KeyCode::Backspace => self.apply_edit(EditOp::Backspace),
            KeyCode::Delete => self.apply_edit(EditOp::Delete),
            KeyCode::Left => self.apply_edit(EditOp::Left),
            KeyCode::Right => self.apply_edit(EditOp::Right),
            KeyCode::Home => self.apply_edit(EditOp::Home),
            KeyCode::End => self.apply_edit(EditOp::End),
            KeyCode::Enter if plain => self.split_line(),
            KeyCode::Esc => self.finish_editing(),
            _ => return false,
        }
        true
    }

    fn handle_toolbar_chord(&mut self, chord: &str) -> bool {
        let count = ToolbarControl::ALL.len();
        match chord {
            "left" => self.toolbar_selected = (self.toolbar_selected + count - 1) % count,
            "right" => self.toolbar_selected = (self.toolbar_selected + 1) % count,
            "enter" | "space" => {
                let action = self.toolbar_selected().action();
                self.dispatch(action);
            }
            _ => return false,
        }
        true
    }

    fn start_editing(&mut self) {
        if let Some(index) = self.focused_line() {
            let cursor = self
                .context
                .document()
                .line(index)
                .map_or(0, |line| line.chars().count());
            self.focus = Focus::Body;
            self.editing = Some(EditState { index, cursor });
        }
    }

    fn finish_editing(&mut self) {
        if let Some(edit) = self.editing.take() {
            debug!(target: "keys", line = edit.index, "edit_finished");
        }
    }

    fn apply_edit(&mut self, op: EditOp) {
        let Some(mut edit) = self.editing else {
            return;
        };
        let current = self
            .context
            .document()
            .line(edit.index)
            .map(str::to_string);
        let Some(mut line) = current else {
            self.editing = None;
            return;
        };

        let len = line.chars().count();
        edit.cursor = edit.cursor.min(len);
        let mut changed = true;
        match op {
            EditOp::Insert(ch) => {
                line.insert(byte_offset(&line, edit.cursor), ch);
                edit.cursor += 1;
            }
            EditOp::Backspace if edit.cursor == 0 => {
                self.join_with_previous(edit.index, line);
                return;
            }
            EditOp::Backspace => {
                edit.cursor -= 1;
                line.remove(byte_offset(&line, edit.cursor));
            }
            EditOp::Delete if edit.cursor < len => {
                line.remove(byte_offset(&line, edit.cursor));
            }
            EditOp::Delete => changed = false,
            EditOp::Left => {
                edit.cursor = edit.cursor.saturating_sub(1);
                changed = false;
            }
            EditOp::Right => {
                edit.cursor = (edit.cursor + 1).min(len);
                changed = false;
            }
            EditOp::Home => {
                edit.cursor = 0;
                changed = false;
            }
            EditOp::End => {
                edit.cursor = len;
                changed = false;
            }
        }

        if changed {
            if let Err(err) = self.context.document().set_line(edit.index, line) {
                warn!(target: "io", %err, "edit_lost_line");
                self.editing = None;
                return;
            }
        }
        self.editing = Some(edit);
    }

    /// Enter while editing: the text after the cursor moves to a new line
    /// below, which becomes the line under edit.
    fn split_line(&mut self) {
        let Some(edit) = self.editing else {
            return;
        };
        let new_index = {
            let mut document = self.context.document();
            let Some(line) = document.line(edit.index).map(str::to_string) else {
                return;
            };
            let at = byte_offset(&line, edit.cursor);
            let (head, tail) = line.split_at(at);
            let tail = tail.to_string();
            if document.set_line(edit.index, head).is_err() {
                return;
            }
            document.insert_line(edit.index + 1, tail)
        };
        self.focus_line = new_index;
        self.editing = Some(EditState {
            index: new_index,
            cursor: 0,
        });
    }

    /// Backspace at the start of a line merges it into the line above.
    fn join_with_previous(&mut self, index: usize, line: String) {
        if index == 0 {
            self.editing = Some(EditState { index, cursor: 0 });
            return;
        }
        let joined = {
            let mut document = self.context.document();
            let Some(previous) = document.line(index - 1).map(str::to_string) else {
                return;
            };
            let cursor = previous.chars().count();
            let merged = previous + &line;
            match document.set_line(index - 1, merged) {
                Ok(()) => document.remove_line(index).ok().map(|_| cursor),
                Err(_) => None,
            }
        };
        if let Some(cursor) = joined {
            self.focus_line = index - 1;
            self.editing = Some(EditState {
                index: index - 1,
                cursor,
            });
        }
    }

    fn add_line(&mut self, position: InsertPosition) {
        let focused = self.focused_line();
        let filtering = self.is_filtering();
        let index = {
            let mut document = self.context.document();
            match (position, focused) {
                (InsertPosition::Before, Some(at)) if !filtering => document.insert_line(at, ""),
                (InsertPosition::After, Some(at)) if !filtering => {
                    document.insert_line(at + 1, "")
                }
                _ => document.push_line(""),
            }
        };
        self.focus_line = index;
        self.focus = Focus::Body;
        self.editing = Some(EditState { index, cursor: 0 });
    }

    fn adjust_priority(&mut self, up: bool) {
        let Some(index) = self.focused_line() else {
            return;
        };
        let mut document = self.context.document();
        let next = cycle_priority(document.priority(index), up);
        if let Err(err) = document.set_priority(index, next) {
            warn!(target: "keys", %err, "priority_change_failed");
        }
    }

    fn move_focus(&mut self, delta: isize) {
        let visible = self.visible_indices();
        let Some(position) = self.focused_position(&visible) else {
            return;
        };
        let last = visible.len() - 1;
        let target = if delta < 0 {
            position.saturating_sub(delta.unsigned_abs())
        } else {
            position.saturating_add(delta as usize).min(last)
        };
        self.focus_line = visible[target];
    }

    fn swap(&mut self, delta: isize) {
        let visible = self.visible_indices();
        let Some(position) = self.focused_position(&visible) else {
            return;
        };
        let Some(neighbour) = position
            .checked_add_signed(delta)
            .filter(|pos| *pos < visible.len())
        else {
            return;
        };
        let (from, to) = (visible[position], visible[neighbour]);
        if self.context.document().swap_lines(from, to) {
            self.focus_line = to;
        }
    }

    fn delete(&mut self) {
        let Some(index) = self.focused_line() else {
            return;
        };
        if let Err(err) = self.context.document().remove_line(index) {
            warn!(target: "keys", %err, "delete_failed");
        }
    }

    fn archive(&mut self) {
        let Some(index) = self.focused_line() else {
            return;
        };
        let result = {
            let mut document = self.context.document();
            document
                .archive_line(index)
                .map(|_| document.archive_path())
        };
        match result {
            Ok(path) => {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.set_status(format!("Archived to {name}"));
            }
            Err(err) => self.set_status(format!("Archive failed: {err}")),
        }
    }

    fn save(&mut self) {
        match self.context.save() {
            Ok(()) => {
                info!(target: "io", "saved");
                self.set_status("Saved");
            }
            Err(err) => {
                warn!(target: "io", %err, "save_failed");
                self.set_status(format!("Save failed: {err}"));
            }
        }
    }

    fn reload(&mut self) {
        self.editing = None;
        match self.context.reload() {
            Ok(()) => {
                info!(target: "io", "reloaded");
                self.set_status("Reloaded");
            }
            Err(err) => {
                warn!(target: "io", %err, "reload_failed");
                self.set_status(format!("Reload failed: {err}"));
            }
        }
    }

    /// Keeps the focus on a shown line, preferring the nearest one above.
    fn ensure_focus_visible(&mut self) {
        let visible = self.visible_indices();
        if visible.contains(&self.focus_line) {
            return;
        }
        self.focus_line = visible
            .iter()
            .rev()
            .find(|idx| **idx <= self.focus_line)
            .or_else(|| visible.first())
            .copied()
            .unwrap_or(0);
    }
}

fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(offset, _)| offset)
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
