//! `#[derive(Model)]`: table metadata, finders and relation loaders.

mod relation;

use crate::fields::{Column, columns, sql_name};
use proc_macro2::TokenStream;
use quote::quote;
use relation::Relation;
use std::collections::HashSet;
use syn::{DeriveInput, Error, LitStr, Result};

/// Struct-level `#[orm(table = "...")]` and `#[orm(many_to_many(...))]`.
fn table_attrs(input: &DeriveInput) -> Result<(String, Vec<Relation>)> {
    let mut table = None;
    let mut relations = Vec::new();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("orm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                table = Some(sql_name(&lit.value(), lit.span(), "table")?);
                Ok(())
            } else if meta.path.is_ident("many_to_many") {
                relations.push(Relation::parse(&meta)?);
                Ok(())
            } else {
                Err(meta.error("expected `table = \"...\"` or `many_to_many(...)`"))
            }
        })?;
    }

    let mut names = HashSet::new();
    for rel in &relations {
        if !names.insert(rel.name.as_str()) {
            return Err(Error::new_spanned(
                &rel.model,
                format!("relation `{}` is declared twice", rel.name),
            ));
        }
    }

    let table = table.ok_or_else(|| {
        Error::new_spanned(&input.ident, "Model needs #[orm(table = \"...\")]")
    })?;
    Ok((table, relations))
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (table, relations) = table_attrs(&input)?;
    let cols = columns(&input, "Model")?;

    let mut ids = cols.iter().filter(|c| c.is_id);
    let pk = ids.next();
    if let Some(extra) = ids.next() {
        return Err(Error::new_spanned(
            extra.field,
            "only one field may carry #[orm(id)]",
        ));
    }

    let names: Vec<&str> = cols.iter().map(|c| c.name.as_str()).collect();
    let select_list = names.join(", ");
    let all_sql = match pk {
        Some(pk) => format!("SELECT {select_list} FROM {table} ORDER BY {}", pk.name),
        None => format!("SELECT {select_list} FROM {table}"),
    };
    let all_tag = format!("{table}.select_all");

    let (keyed, pk_name, model_pk) = match pk {
        Some(pk) => {
            let pk_name = &pk.name;
            (
                keyed_items(&table, &select_list, pk, &relations),
                quote! { Some(#pk_name) },
                model_pk_impl(name, pk),
            )
        }
        None if relations.is_empty() => (quote! {}, quote! { None }, quote! {}),
        None => {
            return Err(Error::new_spanned(
                name,
                "many_to_many needs an #[orm(id)] field on this model",
            ));
        }
    };

    Ok(quote! {
        impl #name {
            pub const TABLE: &'static str = #table;
            pub const SELECT_LIST: &'static str = #select_list;

            /// The column list qualified with `alias`.
            pub fn select_list_as(alias: &str) -> ::std::string::String {
                ::pgshelf::model::qualified_columns(alias, &[#(#names),*])
            }

            /// Every row, in primary key order when there is one.
            pub async fn select_all(
                conn: &impl ::pgshelf::GenericClient,
            ) -> ::pgshelf::OrmResult<::std::vec::Vec<Self>>
            where
                Self: ::pgshelf::FromRow,
            {
                let mut q = ::pgshelf::sql(#all_sql);
                q.tag(#all_tag);
                q.fetch_all_as(conn).await
            }

            #keyed
        }

        impl ::pgshelf::TableMeta for #name {
            fn table_name() -> &'static str {
                #table
            }

            fn columns() -> &'static [&'static str] {
                &[#(#names),*]
            }

            fn primary_key() -> ::std::option::Option<&'static str> {
                #pk_name
            }
        }

        #model_pk
    })
}

/// Items that only make sense with a primary key.
fn keyed_items(
    table: &str,
    select_list: &str,
    pk: &Column<'_>,
    relations: &[Relation],
) -> TokenStream {
    let pk_name = &pk.name;
    let pk_ty = pk.ty;
    let one_sql = format!("SELECT {select_list} FROM {table} WHERE {pk_name} = ");
    let one_tag = format!("{table}.select_one");
    let loaders = relations.iter().map(|rel| rel.expand(pk_ty));

    quote! {
        pub const ID: &'static str = #pk_name;

        /// The row whose primary key is `id`; `OrmError::NotFound` when there is none.
        pub async fn select_one(
            conn: &impl ::pgshelf::GenericClient,
            id: #pk_ty,
        ) -> ::pgshelf::OrmResult<Self>
        where
            Self: ::pgshelf::FromRow,
        {
            let mut q = ::pgshelf::sql(#one_sql);
            q.push_bind(id).tag(#one_tag);
            q.fetch_one_as(conn).await
        }

        /// Rows whose primary key is in `ids`, in primary key order. Unknown ids are skipped.
        pub async fn select_by_ids(
            conn: &impl ::pgshelf::GenericClient,
            ids: impl ::std::iter::IntoIterator<Item = #pk_ty>,
        ) -> ::pgshelf::OrmResult<::std::vec::Vec<Self>>
        where
            Self: ::pgshelf::FromRow,
        {
            ::pgshelf::select_by_ids::<Self, #pk_ty>(conn, ids.into_iter().collect()).await
        }

        #(#loaders)*
    }
}

fn model_pk_impl(name: &syn::Ident, pk: &Column<'_>) -> TokenStream {
    let (field, ty) = (pk.field, pk.ty);
    quote! {
        impl ::pgshelf::ModelPk for #name {
            type Id = #ty;

            fn pk(&self) -> &#ty {
                &self.#field
            }
        }
    }
}
