//! Derive macros behind `pgshelf`'s `FromRow` and `Model`.
//!
//! Both read `#[orm(...)]` attributes. Every name that ends up in generated SQL is
//! checked here, so a bad table or column name fails the build instead of a query.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod fields;
mod from_row;
mod model;

/// Implement `FromRow` and `FromPrefixedRow` by column name.
///
/// ```ignore
/// #[derive(pgshelf::FromRow)]
/// struct Author {
///     author_id: uuid::Uuid,
///     #[orm(column = "full_name")]
///     name: Option<String>,
/// }
/// ```
///
/// A field maps to the column of the same name unless `#[orm(column = "...")]` says
/// otherwise.
#[proc_macro_derive(FromRow, attributes(orm))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Generate table metadata, finders and many-to-many loaders.
///
/// ```ignore
/// #[derive(Clone, pgshelf::FromRow, pgshelf::Model)]
/// #[orm(table = "books")]
/// #[orm(many_to_many(Author, through = "book_authors", self_key = "book_id",
///                    other_key = "author_id", order_by = "position", as = "authors"))]
/// struct Book {
///     #[orm(id)]
///     book_id: uuid::Uuid,
///     title: Option<String>,
/// }
/// ```
///
/// Always: `TABLE`, `SELECT_LIST`, `select_list_as`, `select_all` and `TableMeta`.
/// With an `#[orm(id)]` field: `ID`, `select_one`, `select_by_ids` and `ModelPk`, plus
/// for each relation `REL_AUTHORS`, `load_authors_map`, `load_authors` and
/// `select_by_ids_with_authors`. `order_by` names a join table column.
#[proc_macro_derive(Model, attributes(orm))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    model::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
