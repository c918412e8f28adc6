//! `#[derive(FromRow)]`: decode a row by column name, plain or behind an alias prefix.

use crate::fields::columns;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let cols = columns(&input, "FromRow")?;
    let fields: Vec<_> = cols.iter().map(|c| c.field).collect();
    let names: Vec<_> = cols.iter().map(|c| c.name.as_str()).collect();

    Ok(quote! {
        impl #impl_generics ::pgshelf::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &::pgshelf::tokio_postgres::Row) -> ::pgshelf::OrmResult<Self> {
                use ::pgshelf::RowExt;
                Ok(Self {
                    #(#fields: row.try_get_column(#names)?,)*
                })
            }
        }

        impl #impl_generics ::pgshelf::FromPrefixedRow for #name #ty_generics #where_clause {
            fn from_prefixed_row(
                row: &::pgshelf::tokio_postgres::Row,
                prefix: &str,
            ) -> ::pgshelf::OrmResult<Self> {
                use ::pgshelf::RowExt;
                Ok(Self {
                    #(#fields: row.try_get_prefixed(prefix, #names)?,)*
                })
            }
        }
    })
}
