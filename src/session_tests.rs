use std::{fs, path::PathBuf};

use tempfile::{TempDir, tempdir};

use super::*;

fn session_with(text: &str) -> (TempDir, PathBuf, Session) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("skrevo.txt");
    fs::write(&path, text).unwrap();
    let document = Document::load(path.clone()).unwrap();
    let context = Arc::new(SessionContext::new(document, false));
    let session = Session::new(context, KeyBindings::default(), SessionOptions::default());
    (dir, path, session)
}

fn lines(session: &Session) -> Vec<String> {
    session.context().document().lines().to_vec()
}

fn press(session: &mut Session, code: KeyCode) {
    session.handle_key(code, KeyModifiers::NONE);
}

fn type_text(session: &mut Session, text: &str) {
    for ch in text.chars() {
        press(session, KeyCode::Char(ch));
    }
}

#[test]
fn insert_before_places_new_line_above_focus() {
    let (_dir, _path, mut session) = session_with("a\nb\nc\n");
    session.dispatch(Action::Down);
    session.dispatch(Action::InsertBefore);

    assert_eq!(lines(&session), ["a", "", "b", "c"]);
    assert_eq!(session.editing(), Some(EditState { index: 1, cursor: 0 }));
    assert_eq!(session.focused_line(), Some(1));
}

#[test]
fn insert_after_places_new_line_below_focus() {
    let (_dir, _path, mut session) = session_with("a\nb\nc\n");
    session.dispatch(Action::Down);
    session.dispatch(Action::InsertAfter);

    assert_eq!(lines(&session), ["a", "b", "", "c"]);
    assert_eq!(session.editing().map(|edit| edit.index), Some(2));
}

#[test]
fn any_insert_into_an_empty_list_appends() {
    let (_dir, _path, mut session) = session_with("");
    session.dispatch(Action::InsertBefore);

    assert_eq!(lines(&session), [""]);
    assert_eq!(session.editing().map(|edit| edit.index), Some(0));
}

#[test]
fn appended_line_is_saved_with_ctrl_s() {
    let (_dir, path, mut session) = session_with("buy milk\n");
    press(&mut session, KeyCode::Char('n'));
    type_text(&mut session, "call mom");
    session.handle_key(KeyCode::Char('s'), KeyModifiers::CONTROL);

    assert!(session.editing().is_none());
    assert_eq!(fs::read_to_string(&path).unwrap(), "buy milk\ncall mom\n");
    assert_eq!(session.status_message(), Some("Saved"));
}

#[test]
fn typed_characters_do_not_trigger_bindings_while_editing() {
    let (_dir, _path, mut session) = session_with("draft\n");
    press(&mut session, KeyCode::Enter);
    type_text(&mut session, " q");

    assert!(!session.should_quit());
    assert_eq!(lines(&session), ["draft q"]);

    press(&mut session, KeyCode::Esc);
    press(&mut session, KeyCode::Char('q'));
    assert!(session.should_quit());
}

#[test]
fn cursor_keys_move_within_the_line() {
    let (_dir, _path, mut session) = session_with("helo\n");
    session.dispatch(Action::Edit);
    press(&mut session, KeyCode::Left);
    type_text(&mut session, "l");
    press(&mut session, KeyCode::Home);
    press(&mut session, KeyCode::Delete);
    type_text(&mut session, "H");

    assert_eq!(lines(&session), ["Hello"]);
    assert_eq!(session.editing(), Some(EditState { index: 0, cursor: 1 }));
}

#[test]
fn enter_splits_and_backspace_joins() {
    let (_dir, _path, mut session) = session_with("hello world\n");
    session.dispatch(Action::Edit);
    for _ in 0..5 {
        press(&mut session, KeyCode::Left);
    }
    press(&mut session, KeyCode::Enter);

    assert_eq!(lines(&session), ["hello ", "world"]);
    assert_eq!(session.editing(), Some(EditState { index: 1, cursor: 0 }));

    press(&mut session, KeyCode::Backspace);
    assert_eq!(lines(&session), ["hello world"]);
    assert_eq!(session.editing(), Some(EditState { index: 0, cursor: 6 }));
}

#[test]
fn priority_cycles_through_all_tags() {
    let (_dir, _path, mut session) = session_with("task\n");
    session.dispatch(Action::PriorityUp);
    assert_eq!(lines(&session), ["(A) task"]);

    for _ in 0..5 {
        session.dispatch(Action::PriorityUp);
    }
    assert_eq!(lines(&session), ["(F) task"]);

    session.dispatch(Action::PriorityUp);
    assert_eq!(lines(&session), ["task"]);

    session.dispatch(Action::PriorityDown);
    assert_eq!(lines(&session), ["(F) task"]);
}

#[test]
fn navigation_stays_in_bounds() {
    let (_dir, _path, mut session) = session_with("1\n2\n3\n4\n5\n");
    session.set_page_height(2);

    session.dispatch(Action::Up);
    assert_eq!(session.focused_line(), Some(0));
    session.dispatch(Action::PageDown);
    assert_eq!(session.focused_line(), Some(2));
    session.dispatch(Action::Bottom);
    assert_eq!(session.focused_line(), Some(4));
    session.dispatch(Action::Down);
    assert_eq!(session.focused_line(), Some(4));
    session.dispatch(Action::Top);
    assert_eq!(session.focused_line(), Some(0));
}

#[test]
fn swap_moves_the_focused_line() {
    let (_dir, _path, mut session) = session_with("a\nb\nc\n");
    session.dispatch(Action::SwapUp);
    assert_eq!(lines(&session), ["a", "b", "c"]);

    session.dispatch(Action::SwapDown);
    assert_eq!(lines(&session), ["b", "a", "c"]);
    assert_eq!(session.focused_line(), Some(1));
}

#[test]
fn deleting_the_last_line_moves_focus_up() {
    let (_dir, _path, mut session) = session_with("a\nb\nc\n");
    session.dispatch(Action::Bottom);
    session.dispatch(Action::Delete);

    assert_eq!(lines(&session), ["a", "b"]);
    assert_eq!(session.focused_line(), Some(1));
}

#[test]
fn archive_moves_the_line_to_the_sibling_file() {
    let (dir, _path, mut session) = session_with("one\ntwo\n");
    session.dispatch(Action::Archive);

    assert_eq!(lines(&session), ["two"]);
    let archived = fs::read_to_string(dir.path().join("skrevo.txt.archive")).unwrap();
    assert_eq!(archived, "one\n");
    assert_eq!(session.status_message(), Some("Archived to skrevo.txt.archive"));
}

#[test]
fn search_filters_case_insensitively() {
    let (_dir, _path, mut session) = session_with("apple\nbanana\napricot\n");
    press(&mut session, KeyCode::Char('/'));
    type_text(&mut session, "AP");
    press(&mut session, KeyCode::Enter);

    assert_eq!(session.visible_indices(), [0, 2]);
    assert_eq!(
        session.search(),
        Some(&SearchState {
            term: "AP".to_string(),
            typing: false,
        })
    );

    session.dispatch(Action::Down);
    assert_eq!(session.focused_line(), Some(2));

    session.dispatch(Action::SearchClear);
    assert_eq!(session.visible_indices(), [0, 1, 2]);
}

#[test]
fn inserting_while_searching_appends() {
    let (_dir, _path, mut session) = session_with("apple\nbanana\n");
    press(&mut session, KeyCode::Char('/'));
    type_text(&mut session, "ban");
    press(&mut session, KeyCode::Enter);
    session.dispatch(Action::InsertBefore);

    assert_eq!(lines(&session), ["apple", "banana", ""]);
    assert_eq!(session.visible_indices(), [1, 2]);
}

#[test]
fn escape_abandons_the_search() {
    let (_dir, _path, mut session) = session_with("apple\n");
    press(&mut session, KeyCode::Char('/'));
    type_text(&mut session, "zzz");
    assert!(session.visible_indices().is_empty());

    press(&mut session, KeyCode::Esc);
    assert!(session.search().is_none());
    assert_eq!(session.visible_indices(), [0]);
}

#[test]
fn toggles_flip_display_state() {
    let (_dir, _path, mut session) = session_with("a\n");
    assert_eq!(session.wrap_mode(), WrapMode::Clip);
    press(&mut session, KeyCode::Char('w'));
    assert_eq!(session.wrap_mode(), WrapMode::Space);

    press(&mut session, KeyCode::Char('b'));
    assert_eq!(session.border_mode(), BorderMode::Bordered);

    press(&mut session, KeyCode::Char('h'));
    assert!(session.help_open());
    press(&mut session, KeyCode::Char('h'));
    assert!(!session.help_open());
}

#[test]
fn focus_only_moves_to_an_open_toolbar() {
    let (_dir, _path, mut session) = session_with("a\n");
    press(&mut session, KeyCode::Tab);
    assert_eq!(session.focus(), Focus::Body);

    press(&mut session, KeyCode::Char('t'));
    press(&mut session, KeyCode::Tab);
    assert_eq!(session.focus(), Focus::Toolbar);

    press(&mut session, KeyCode::Right);
    assert_eq!(session.toolbar_selected(), ToolbarControl::Borders);
    press(&mut session, KeyCode::Enter);
    assert_eq!(session.border_mode(), BorderMode::Bordered);
    assert!(session.editing().is_none());

    press(&mut session, KeyCode::Char('t'));
    assert_eq!(session.focus(), Focus::Body);
}

#[test]
fn options_set_the_initial_display() {
    let dir = tempdir().unwrap();
    let document = Document::new(dir.path().join("skrevo.txt"));
    let context = Arc::new(SessionContext::new(document, false));
    let session = Session::new(
        context,
        KeyBindings::default(),
        SessionOptions {
            word_wrap: true,
            borders: true,
            show_toolbar: true,
        },
    );

    assert_eq!(session.wrap_mode(), WrapMode::Space);
    assert_eq!(session.border_mode(), BorderMode::Bordered);
    assert!(session.toolbar_open());
}

#[test]
fn reload_discards_unsaved_edits() {
    let (_dir, _path, mut session) = session_with("kept\n");
    session.dispatch(Action::Append);
    type_text(&mut session, "dropped");
    session.dispatch(Action::Reload);

    assert_eq!(lines(&session), ["kept"]);
    assert!(session.editing().is_none());
    assert_eq!(session.status_message(), Some("Reloaded"));
}

#[test]
fn failed_save_is_reported_in_the_status() {
    let dir = tempdir().unwrap();
    let document = Document::from_text("x\n", dir.path().join("gone").join("skrevo.txt"));
    let context = Arc::new(SessionContext::new(document, false));
    let mut session = Session::new(context, KeyBindings::default(), SessionOptions::default());
    session.dispatch(Action::Save);

    let status = session.status_message().unwrap();
    assert!(status.starts_with("Save failed"), "{status}");
    assert!(!session.should_quit());
}

#[test]
fn autosave_events_show_in_the_status() {
    let (_dir, _path, mut session) = session_with("");
    session.on_autosave_event(AutosaveEvent::Saved);
    assert_eq!(session.status_message(), Some("Autosaved"));

    session.on_autosave_event(AutosaveEvent::Failed("disk full".to_string()));
    assert_eq!(session.status_message(), Some("Autosave failed: disk full"));
}

#[test]
fn stale_status_is_pruned_on_tick() {
    let (_dir, _path, mut session) = session_with("");
    let Some(long_ago) = Instant::now().checked_sub(STATUS_TIMEOUT * 2) else {
        return;
    };
    session.status = Some(("old news".to_string(), long_ago));
    assert_eq!(session.status_message(), None);

    session.on_tick();
    assert!(!session.has_status_message());
}
