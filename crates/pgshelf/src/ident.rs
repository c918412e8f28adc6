//! SQL identifiers that are safe to splice into statement text.
//!
//! Postgres cannot bind table or column names as parameters, so every name the loaders
//! interpolate goes through [`Ident::new`] first.

use crate::error::{OrmError, OrmResult};

/// A validated, unquoted identifier, optionally schema-qualified (`public.books`).
///
/// Every dot-separated segment matches `[A-Za-z_][A-Za-z0-9_$]*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    pub fn new(raw: &str) -> OrmResult<Self> {
        if raw.split('.').all(is_plain_segment) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(OrmError::validation(format!("invalid SQL identifier `{raw}`")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_plain_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic());
    head_ok && chars.all(|c| c == '_' || c == '$' || c.is_ascii_alphanumeric())
}
