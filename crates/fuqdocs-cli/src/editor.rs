//! Editing document content in the user's editor, and delete prompts

use std::env;
use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

const FALLBACK_EDITORS: [&str; 3] = ["nano", "vim", "vi"];

/// An editor invocation such as `code --wait`
#[derive(Debug, Clone, PartialEq, Eq)]
struct EditorCommand {
    program: String,
    args: Vec<String>,
}

impl EditorCommand {
    fn parse(value: &str) -> Option<Self> {
        let mut words = value.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }

    /// `$VISUAL`, then `$EDITOR`, then the first fallback editor on `PATH`
    fn from_env() -> Result<Self> {
        let configured = ["VISUAL", "EDITOR"]
            .into_iter()
            .filter_map(|var| env::var(var).ok())
            .find_map(|value| Self::parse(&value));
        if let Some(editor) = configured {
            return Ok(editor);
        }

        let path = env::var_os("PATH").unwrap_or_default();
        FALLBACK_EDITORS
            .into_iter()
            .find(|name| find_in_path(name, &path).is_some())
            .and_then(Self::parse)
            .context("No editor found. Set $EDITOR, for example: export EDITOR=nano")
    }

    fn run(&self, file: &Path) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(file)
            .status()
            .with_context(|| format!("Failed to run editor '{}'", self.program))?;
        if !status.success() {
            bail!("Editor '{}' exited with {}", self.program, status);
        }
        Ok(())
    }
}

fn find_in_path(name: &str, path: &OsString) -> Option<PathBuf> {
    env::split_paths(path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Let the user edit markdown in their editor and return the result
///
/// The text goes through a `.md` temp file so editors pick markdown mode.
/// The trailing newline most editors append on save is dropped.
pub fn edit_markdown(initial: &str) -> Result<String> {
    let editor = EditorCommand::from_env()?;

    let mut file = tempfile::Builder::new()
        .prefix("fuqdocs-")
        .suffix(".md")
        .tempfile()
        .context("Failed to create a temp file to edit")?;
    file.write_all(initial.as_bytes())
        .and_then(|_| file.flush())
        .context("Failed to write the temp file")?;

    editor.run(file.path())?;

    let edited = std::fs::read_to_string(file.path())
        .with_context(|| format!("Failed to read {:?}", file.path()))?;
    Ok(trim_trailing_newline(edited))
}

fn trim_trailing_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

/// Ask before deleting `description`
///
/// Without a terminal on stdin nothing is deleted.
pub fn confirm_delete(description: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("Delete {}? [y/N] ", description);
    io::stdout().flush()?;
    read_yes(io::stdin().lock())
}

fn read_yes(mut input: impl BufRead) -> Result<bool> {
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_parse_editor_command() {
        assert_eq!(
            EditorCommand::parse("code --wait"),
            Some(EditorCommand {
                program: "code".to_string(),
                args: vec!["--wait".to_string()],
            })
        );
        assert_eq!(EditorCommand::parse("  "), None);
    }

    #[test]
    fn test_trim_trailing_newline() {
        assert_eq!(trim_trailing_newline("# Notes\n".to_string()), "# Notes");
        assert_eq!(trim_trailing_newline("# Notes\r\n".to_string()), "# Notes");
        assert_eq!(trim_trailing_newline("a\n\n".to_string()), "a\n");
        assert_eq!(trim_trailing_newline(String::new()), "");
    }

    #[test]
    fn test_read_yes() {
        assert!(read_yes(Cursor::new("y\n")).unwrap());
        assert!(read_yes(Cursor::new("YES\n")).unwrap());
        assert!(!read_yes(Cursor::new("\n")).unwrap());
        assert!(!read_yes(Cursor::new("nope\n")).unwrap());
    }

    #[test]
    fn test_find_in_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("nano"), "").unwrap();
        let path = env::join_paths([dir.path()]).unwrap();

        assert_eq!(find_in_path("nano", &path), Some(dir.path().join("nano")));
        assert_eq!(find_in_path("vim", &path), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_editor_is_reported() {
        let editor = EditorCommand::parse("false").unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(editor.run(file.path()).is_err());
    }
}
