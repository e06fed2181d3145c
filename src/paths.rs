use std::{
    env,
    fs::{self, OpenOptions},
    path::{self, Path, PathBuf},
};

use tracing::info;

use crate::error::StartupError;

/// Expands `$VAR`, `${VAR}` and a leading `~`. Unknown variables are left
/// as written.
pub fn expand_path(raw: &str) -> PathBuf {
    expand_home(&expand_vars(raw))
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

fn expand_home(value: &str) -> PathBuf {
    let rest = match value.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return PathBuf::from(value),
    };
    match home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(value),
    }
}

fn expand_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        let expanded = if name.is_empty() || name.contains(['=', '\0']) {
            None
        } else {
            env::var(name).ok()
        };
        match expanded {
            Some(expanded) => out.push_str(&expanded),
            None => out.push_str(&rest[start..start + 1 + consumed]),
        }
        rest = &after[consumed..];
    }
    out.push_str(rest);
    out
}

/// Turns a user-supplied target into an absolute, canonical path, creating
/// an empty file when only the file is missing.
pub fn resolve_target(raw: &str, description: &'static str) -> Result<PathBuf, StartupError> {
    let expanded = expand_path(raw);
    let path = path::absolute(&expanded).unwrap_or(expanded);

    if path.is_dir() {
        return Err(StartupError::TargetIsDirectory { description });
    }

    if !path.exists() {
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        if !directory.is_dir() {
            return Err(StartupError::MissingDirectory {
                directory,
                description,
            });
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StartupError::CreateTarget {
                path: path.clone(),
                source,
            })?;
        info!(target: "io", file = %path.display(), "created_empty_target");
    }

    Ok(match fs::canonicalize(&path) {
        Ok(canonical) => canonical,
        Err(_) => path,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn existing_file_resolves_to_canonical_path() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("draft.txt");
        fs::write(&file, "text\n").unwrap();

        let raw = format!("{}/./draft.txt", dir.path().display());
        let resolved = resolve_target(&raw, "skrevo.txt").unwrap();
        assert_eq!(resolved, fs::canonicalize(&file).unwrap());
        assert_eq!(fs::read_to_string(&resolved).unwrap(), "text\n");
    }

    #[test]
    fn missing_file_is_created_empty() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("new.txt");
        let resolved = resolve_target(file.to_str().unwrap(), "skrevo.txt").unwrap();
        assert!(resolved.is_file());
        assert_eq!(fs::read_to_string(resolved).unwrap(), "");
    }

    #[test]
    fn directory_target_is_rejected() {
        let dir = tempdir().unwrap();
        let err = resolve_target(dir.path().to_str().unwrap(), "skrevo.txt").unwrap_err();
        assert!(matches!(err, StartupError::TargetIsDirectory { .. }));
    }

    #[test]
    fn missing_parent_directory_is_rejected() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("nope").join("draft.txt");
        let err = resolve_target(file.to_str().unwrap(), "skrevo.txt").unwrap_err();
        match err {
            StartupError::MissingDirectory { directory, .. } => {
                assert_eq!(directory, dir.path().join("nope"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn tilde_expands_to_home() {
        let Some(home) = home_dir() else {
            return;
        };
        assert_eq!(expand_path("~/skrevo.txt"), home.join("skrevo.txt"));
        assert_eq!(expand_path("~"), home);
        assert_eq!(expand_path("~user/x"), PathBuf::from("~user/x"));
    }

    #[test]
    fn variables_expand_and_unknown_ones_stay() {
        let Ok(home) = env::var("HOME") else {
            return;
        };
        assert_eq!(expand_vars("$HOME/a"), format!("{home}/a"));
        assert_eq!(expand_vars("${HOME}/a"), format!("{home}/a"));
        assert_eq!(
            expand_vars("$SKREVO_TEST_SURELY_UNSET/a"),
            "$SKREVO_TEST_SURELY_UNSET/a"
        );
        assert_eq!(expand_vars("cost$"), "cost$");
        assert_eq!(expand_vars("${unterminated"), "${unterminated");
    }
}
