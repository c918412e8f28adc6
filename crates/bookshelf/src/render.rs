//! Output formats for loaded books.

use crate::models::{Author, Book};
use pgshelf::Loaded;
use serde::Serialize;
use std::fmt::{self, Write};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `{:#?}` of every book.
    #[default]
    Pretty,
    /// A pretty-printed JSON array.
    Json,
    /// What `print` gives in Python: `<id> <title>` then `[(UUID(...), name), ...]`.
    Plain,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(OutputFormat::Pretty),
            "json" => Ok(OutputFormat::Json),
            "plain" => Ok(OutputFormat::Plain),
            other => anyhow::bail!("unknown format '{other}' (expected pretty, json or plain)"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Pretty => "pretty",
            OutputFormat::Json => "json",
            OutputFormat::Plain => "plain",
        })
    }
}

/// A book flattened together with its authors, in position order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookWithAuthors {
    pub book_id: Uuid,
    pub title: Option<String>,
    pub authors: Vec<Author>,
}

impl From<Loaded<Book, Vec<Author>>> for BookWithAuthors {
    fn from(loaded: Loaded<Book, Vec<Author>>) -> Self {
        Self {
            book_id: loaded.base.book_id,
            title: loaded.base.title,
            authors: loaded.rel,
        }
    }
}

pub fn render(books: &[BookWithAuthors], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Pretty => Ok(format!("{books:#?}")),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(books)?),
        OutputFormat::Plain => Ok(render_plain(books)),
    }
}

/// Each book as `<id> <title>` over a list of `(UUID('<id>'), <name>)` tuples, written the
/// way Python prints them. Blocks are separated by a blank line, and the output opens
/// with one.
fn render_plain(books: &[BookWithAuthors]) -> String {
    let mut lines = vec![String::new()];
    for book in books {
        let authors: Vec<String> = book
            .authors
            .iter()
            .map(|a| format!("(UUID('{}'), {})", a.author_id, py_repr(a.name.as_deref())))
            .collect();
        lines.push(String::new());
        lines.push(format!(
            "{} {}",
            book.book_id,
            book.title.as_deref().unwrap_or("None")
        ));
        lines.push(format!("[{}]", authors.join(", ")));
    }
    lines.join("\n")
}

/// Python's `repr` of an optional string.
fn py_repr(value: Option<&str>) -> String {
    let Some(text) = value else {
        return "None".to_string();
    };
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<BookWithAuthors> {
        vec![
            BookWithAuthors {
                book_id: Uuid::from_u128(1),
                title: Some("Shared Shelf".into()),
                authors: vec![
                    Author {
                        author_id: Uuid::from_u128(11),
                        name: Some("Bob".into()),
                    },
                    Author {
                        author_id: Uuid::from_u128(10),
                        name: None,
                    },
                ],
            },
            BookWithAuthors {
                book_id: Uuid::from_u128(2),
                title: None,
                authors: vec![],
            },
        ]
    }

    #[test]
    fn format_parses_and_displays() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(" plain".parse::<OutputFormat>().unwrap(), OutputFormat::Plain);
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default().to_string(), "pretty");
    }

    #[test]
    fn plain_matches_tuple_listing() {
        let out = render(&sample(), OutputFormat::Plain).unwrap();
        assert_eq!(
            out,
            "\n\n00000000-0000-0000-0000-000000000001 Shared Shelf\n\
             [(UUID('00000000-0000-0000-0000-00000000000b'), 'Bob'), \
             (UUID('00000000-0000-0000-0000-00000000000a'), None)]\n\
             \n00000000-0000-0000-0000-000000000002 None\n\
             []"
        );
    }

    #[test]
    fn plain_names_use_python_quoting() {
        assert_eq!(py_repr(Some("Bob")), "'Bob'");
        assert_eq!(py_repr(Some("O'Brien")), "\"O'Brien\"");
        assert_eq!(py_repr(Some("say \"hi\"")), "'say \"hi\"'");
        assert_eq!(py_repr(Some("it's \"x\"")), "'it\\'s \"x\"'");
        assert_eq!(py_repr(Some("a\\b\tc\n")), "'a\\\\b\\tc\\n'");
        assert_eq!(py_repr(Some("bell\u{7}")), "'bell\\x07'");
        assert_eq!(py_repr(Some("Zoë")), "'Zoë'");
        assert_eq!(py_repr(None), "None");

        let book = BookWithAuthors {
            book_id: Uuid::from_u128(3),
            title: Some("Irish Tales".into()),
            authors: vec![Author {
                author_id: Uuid::from_u128(12),
                name: Some("O'Brien".into()),
            }],
        };
        let out = render(&[book], OutputFormat::Plain).unwrap();
        assert!(out.ends_with(
            "[(UUID('00000000-0000-0000-0000-00000000000c'), \"O'Brien\")]"
        ));
    }

    #[test]
    fn json_is_an_array_with_nulls() {
        let out = render(&sample(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["title"], "Shared Shelf");
        assert_eq!(value[0]["authors"][0]["name"], "Bob");
        assert!(value[0]["authors"][1]["name"].is_null());
        assert_eq!(value[1]["authors"], serde_json::json!([]));
        assert_eq!(value[1]["book_id"], "00000000-0000-0000-0000-000000000002");
    }

    #[test]
    fn pretty_uses_debug_layout() {
        let out = render(&sample()[1..], OutputFormat::Pretty).unwrap();
        assert!(out.starts_with("[\n    BookWithAuthors {\n"));
        assert!(out.contains("title: None,"));
    }

    #[test]
    fn empty_result_renders_empty() {
        assert_eq!(render(&[], OutputFormat::Plain).unwrap(), "");
        assert_eq!(render(&[], OutputFormat::Json).unwrap(), "[]");
        assert_eq!(render(&[], OutputFormat::Pretty).unwrap(), "[]");
    }
}
