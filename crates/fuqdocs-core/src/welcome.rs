//! The document created on first start

/// Title of the welcome document
pub const WELCOME_TITLE: &str = "Hello, World!";

/// Markdown body of the welcome document
pub const WELCOME_CONTENT: &str = r#"# Hello, World!

Welcome to **fuqdocs**, a place to keep markdown notes and nothing else.

Your notes live in a single storage file on this machine. They are never
uploaded, shared or synced to any server. If you move to another computer,
your notes stay behind.

Several copies of fuqdocs can run at once against the same storage. When one
of them saves, renames or deletes a note, the others pick the change up.

## Getting around

| Command                            | What it does                    |
| ---------------------------------- | ------------------------------- |
| `fuqdocs list`                     | List notes, most recent first   |
| `fuqdocs list --filter <text>`     | Only notes whose title matches  |
| `fuqdocs show [id]`                | Print a note                    |
| `fuqdocs new --title <title>`      | Start a new note                |
| `fuqdocs edit [id]`                | Edit a note in `$EDITOR`        |
| `fuqdocs delete <id>`              | Delete a note                   |
| `fuqdocs theme toggle`             | Switch between dark and light   |
| `fuqdocs watch`                    | Follow changes from other runs  |

Ids can be shortened to any prefix that is unique.

A note needs a title before it can be saved. Untitled notes are never
written, not even by autosave.

## Markdown

Notes are GitHub flavored markdown, so tables, ~~strikethrough~~ and fenced
code blocks all work:

```rust
fn main() {
    println!("hello, {}", "world");
}
```

Delete this note whenever you like. If every note is gone, you simply start
with a blank one.
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_content_starts_with_title() {
        let first_line = WELCOME_CONTENT.lines().next().unwrap();
        assert_eq!(first_line, format!("# {}", WELCOME_TITLE));
        assert!(!WELCOME_CONTENT.trim().is_empty());
    }
}
