//! Field options shared by both derives: `#[orm(id)]` and `#[orm(column = "...")]`.

use proc_macro2::Span;
use syn::ext::IdentExt;
use syn::{Data, DataStruct, DeriveInput, Error, Field, Fields, Ident, LitStr, Result, Type};

/// One struct field and the column it maps to.
pub(crate) struct Column<'a> {
    pub field: &'a Ident,
    pub ty: &'a Type,
    pub name: String,
    pub is_id: bool,
}

pub(crate) fn columns<'a>(input: &'a DeriveInput, derive: &str) -> Result<Vec<Column<'a>>> {
    let Data::Struct(DataStruct {
        fields: Fields::Named(named),
        ..
    }) = &input.data
    else {
        return Err(Error::new_spanned(
            &input.ident,
            format!("{derive} needs a struct with named fields"),
        ));
    };
    named.named.iter().map(column).collect()
}

fn column(field: &Field) -> Result<Column<'_>> {
    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| Error::new_spanned(field, "expected a named field"))?;

    let mut is_id = false;
    let mut name = None;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("orm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                is_id = true;
                Ok(())
            } else if meta.path.is_ident("column") {
                let lit: LitStr = meta.value()?.parse()?;
                name = Some(sql_name(&lit.value(), lit.span(), "column")?);
                Ok(())
            } else {
                Err(meta.error("expected `id` or `column = \"...\"`"))
            }
        })?;
    }

    // `r#type` maps to the column `type`.
    let name = match name {
        Some(name) => name,
        None => sql_name(&ident.unraw().to_string(), ident.span(), "column")?,
    };
    Ok(Column {
        field: ident,
        ty: &field.ty,
        name,
        is_id,
    })
}

/// Accept `raw` only if it can be spliced into SQL unquoted.
pub(crate) fn sql_name(raw: &str, span: Span, what: &str) -> Result<String> {
    let name = raw.trim();
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic());
    if head_ok && chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) {
        Ok(name.to_owned())
    } else {
        Err(Error::new(
            span,
            format!("{what} `{raw}` is not a plain SQL identifier"),
        ))
    }
}
