use std::fs;

use tempfile::tempdir;

use super::*;

fn document_with(lines: &[&str]) -> Document {
    let mut document = Document::new("unused.txt");
    for line in lines {
        document.push_line(*line);
    }
    document
}

#[test]
fn load_then_save_round_trips_with_single_trailing_newline() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("draft.txt");
    fs::write(&path, "first line\nsecond line").unwrap();

    let document = Document::load(&path).unwrap();
    assert_eq!(document.lines(), ["first line", "second line"]);

    document.save().unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "first line\nsecond line\n"
    );

    let reloaded = Document::load(&path).unwrap();
    assert_eq!(reloaded.lines(), document.lines());
}

#[test]
fn save_does_not_stack_trailing_newlines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("draft.txt");
    fs::write(&path, "already terminated\n").unwrap();

    let document = Document::load(&path).unwrap();
    document.save().unwrap();
    let first = fs::read(&path).unwrap();
    document.save().unwrap();
    let second = fs::read(&path).unwrap();

    assert_eq!(first, b"already terminated\n");
    assert_eq!(first, second);
}

#[test]
fn reload_discards_unsaved_edits() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("draft.txt");
    fs::write(&path, "kept\n").unwrap();

    let mut document = Document::load(&path).unwrap();
    document.push_line("unsaved");
    document.set_line(0, "changed").unwrap();
    document.reload_from_file().unwrap();

    assert_eq!(document.lines(), ["kept"]);
}

#[test]
fn load_reports_missing_file() {
    let dir = tempdir().unwrap();
    let err = Document::load(dir.path().join("missing.txt")).unwrap_err();
    assert!(matches!(err, DocumentError::Read { .. }));
}

#[test]
fn non_utf8_file_loads_with_replacement_characters() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("latin1.txt");
    fs::write(&path, b"caf\xe9 au lait\nsecond line\n").unwrap();

    let mut document = Document::load(&path).unwrap();
    assert_eq!(document.lines(), ["caf\u{FFFD} au lait", "second line"]);

    document.set_line(1, "edited").unwrap();
    document.reload_from_file().unwrap();
    assert_eq!(document.lines(), ["caf\u{FFFD} au lait", "second line"]);

    document.save().unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "caf\u{FFFD} au lait\nsecond line\n"
    );
}

#[test]
fn save_into_missing_directory_is_an_error_not_a_panic() {
    let dir = tempdir().unwrap();
    let document = Document::from_text("text", dir.path().join("gone/draft.txt"));
    let err = document.save().unwrap_err();
    assert!(matches!(err, DocumentError::Write { .. }));
}

#[test]
fn counts_words_chars_and_lines() {
    let document = document_with(&["buy milk", "  call   mom ", ""]);
    assert_eq!(document.word_count(), 4);
    assert_eq!(document.char_count(), 8 + 13);
    assert_eq!(document.line_count(), 3);
}

#[test]
fn char_count_counts_scalars_not_bytes() {
    let document = document_with(&["skrevø", "åå"]);
    assert_eq!(document.char_count(), 8);
}

#[test]
fn empty_document_saves_a_single_newline() {
    let document = Document::new("x.txt");
    assert_eq!(document.to_text(), "\n");
    assert_eq!(Document::from_text("\n", "x.txt").to_text(), "\n");
}

#[test]
fn insert_line_clamps_to_end() {
    let mut document = document_with(&["a"]);
    assert_eq!(document.insert_line(10, "b"), 1);
    assert_eq!(document.insert_line(0, "c"), 0);
    assert_eq!(document.lines(), ["c", "a", "b"]);
}

#[test]
fn remove_and_set_reject_out_of_range() {
    let mut document = document_with(&["a"]);
    assert!(matches!(
        document.remove_line(3),
        Err(DocumentError::NoSuchLine(3))
    ));
    assert!(document.set_line(1, "x").is_err());
    assert!(!document.swap_lines(0, 1));
}

#[test]
fn priority_prefix_is_parsed_and_replaced() {
    assert_eq!(parse_priority("(B) call mom"), (Some('B'), "call mom"));
    assert_eq!(parse_priority("(b) call mom"), (None, "(b) call mom"));
    assert_eq!(parse_priority("(B)call"), (None, "(B)call"));

    let mut document = document_with(&["call mom"]);
    document.set_priority(0, Some('A')).unwrap();
    assert_eq!(document.line(0), Some("(A) call mom"));
    document.set_priority(0, Some('C')).unwrap();
    assert_eq!(document.line(0), Some("(C) call mom"));
    assert_eq!(document.priority(0), Some('C'));
    document.set_priority(0, None).unwrap();
    assert_eq!(document.line(0), Some("call mom"));
}

#[test]
fn priority_cycle_wraps_at_both_ends() {
    assert_eq!(cycle_priority(None, true), Some('A'));
    assert_eq!(cycle_priority(Some('F'), true), None);
    assert_eq!(cycle_priority(None, false), Some('F'));
    assert_eq!(cycle_priority(Some('A'), false), None);
    assert_eq!(cycle_priority(Some('Q'), true), Some('A'));
}

#[test]
fn full_priority_cycle_returns_to_untagged() {
    let mut up = None;
    let mut down = None;
    for _ in 0..PRIORITY_CYCLE.len() {
        up = cycle_priority(up, true);
        down = cycle_priority(down, false);
    }
    assert_eq!(up, None);
    assert_eq!(down, None);
}

#[test]
fn archive_moves_line_into_sibling_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("draft.txt");
    let mut document = Document::from_text("one\ntwo\nthree\n", &path);

    assert_eq!(document.archive_line(1).unwrap(), "two");
    assert_eq!(document.archive_line(0).unwrap(), "one");
    assert_eq!(document.lines(), ["three"]);

    let archive = dir.path().join("draft.txt.archive");
    assert_eq!(document.archive_path(), archive);
    assert_eq!(fs::read_to_string(archive).unwrap(), "two\none\n");
}

#[test]
fn failed_archive_keeps_the_line() {
    let dir = tempdir().unwrap();
    let mut document = Document::from_text("one\n", dir.path().join("gone/draft.txt"));
    assert!(document.archive_line(0).is_err());
    assert_eq!(document.lines(), ["one"]);
}

#[test]
fn snapshot_is_detached_from_later_edits() {
    let mut document = document_with(&["before"]);
    let snapshot = document.snapshot();
    document.set_line(0, "after").unwrap();
    assert_eq!(snapshot.text(), "before\n");
    assert_eq!(snapshot.file_path(), Path::new("unused.txt"));
}
