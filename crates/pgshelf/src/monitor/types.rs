use std::fmt;
use std::time::Duration;

/// The verb of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl QueryType {
    /// Classify `sql` by its first top-level verb.
    ///
    /// Comments, string literals and parenthesised bodies are skipped, so for
    /// `WITH x AS (DELETE ...) SELECT ...` the outer `SELECT` wins. A statement whose
    /// only verb sits inside parentheses, like `(SELECT 1)`, falls back to that verb.
    pub fn from_sql(sql: &str) -> Self {
        let bytes = sql.as_bytes();
        let mut depth = 0u32;
        let mut nested = None;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                quote @ (b'\'' | b'"') => {
                    i += 1;
                    while i < bytes.len() && bytes[i] != quote {
                        i += 1;
                    }
                }
                b'-' if bytes.get(i + 1) == Some(&b'-') => {
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => match sql[i + 2..].find("*/") {
                    Some(end) => i += end + 3,
                    None => break,
                },
                b if b.is_ascii_alphabetic() => {
                    let end = sql[i..]
                        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                        .map_or(sql.len(), |n| i + n);
                    match Self::from_verb(&sql[i..end]) {
                        Some(ty) if depth == 0 => return ty,
                        Some(ty) => {
                            nested.get_or_insert(ty);
                        }
                        None => {}
                    }
                    i = end;
                    continue;
                }
                _ => {}
            }
            i += 1;
        }

        nested.unwrap_or(QueryType::Other)
    }

    fn from_verb(word: &str) -> Option<Self> {
        [
            ("select", QueryType::Select),
            ("insert", QueryType::Insert),
            ("update", QueryType::Update),
            ("delete", QueryType::Delete),
        ]
        .into_iter()
        .find(|(verb, _)| word.eq_ignore_ascii_case(verb))
        .map(|(_, ty)| ty)
    }
}

/// A statement about to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    pub sql: String,
    pub param_count: usize,
    pub query_type: QueryType,
    /// Set by the loaders, e.g. `books.select_by_ids`.
    pub tag: Option<String>,
}

impl QueryContext {
    pub fn new(sql: &str, param_count: usize, tag: Option<&str>) -> Self {
        Self {
            sql: sql.to_owned(),
            param_count,
            query_type: QueryType::from_sql(sql),
            tag: tag.map(str::to_owned),
        }
    }

    /// The tag, or `-` for untagged statements.
    pub fn label(&self) -> &str {
        self.tag.as_deref().unwrap_or("-")
    }
}

/// How a statement finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    Rows(usize),
    Error(String),
}

impl QueryResult {
    pub fn is_error(&self) -> bool {
        matches!(self, QueryResult::Error(_))
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(1) => f.write_str("1 row"),
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Error(e) => write!(f, "failed: {e}"),
        }
    }
}

/// Receives statement events from an [`InstrumentedClient`](super::InstrumentedClient).
pub trait QueryMonitor: Send + Sync {
    fn on_start(&self, _ctx: &QueryContext) {}

    /// Called exactly once per started statement, including failures and timeouts.
    fn on_finish(&self, ctx: &QueryContext, elapsed: Duration, result: &QueryResult);
}
