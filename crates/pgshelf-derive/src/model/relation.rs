//! `#[orm(many_to_many(Author, through = "book_authors", self_key = "book_id",
//! other_key = "author_id", order_by = "position", as = "authors"))]`

use crate::fields::sql_name;
use heck::{ToShoutySnakeCase, ToSnakeCase};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::meta::ParseNestedMeta;
use syn::{LitStr, Path, Result, Token, Type};

pub(super) struct Relation {
    pub model: Path,
    through: String,
    self_key: String,
    other_key: String,
    order_by: Option<String>,
    /// Suffix of the generated loaders; defaults to the snake-cased model name plus `s`.
    pub name: String,
}

impl Relation {
    pub(super) fn parse(meta: &ParseNestedMeta<'_>) -> Result<Self> {
        let mut model: Option<Path> = None;
        let mut through = None;
        let mut self_key = None;
        let mut other_key = None;
        let mut order_by = None;
        let mut name = None;

        meta.parse_nested_meta(|opt| {
            // The related model is the only bare path.
            if !opt.input.peek(Token![=]) {
                if model.is_some() {
                    return Err(opt.error("many_to_many takes a single related model"));
                }
                model = Some(opt.path.clone());
                return Ok(());
            }

            let key = opt
                .path
                .get_ident()
                .map(ToString::to_string)
                .unwrap_or_default();
            let slot = match key.as_str() {
                "through" => &mut through,
                "self_key" => &mut self_key,
                "other_key" => &mut other_key,
                "order_by" => &mut order_by,
                "as" => &mut name,
                _ => return Err(opt.error("unknown many_to_many option")),
            };
            let lit: LitStr = opt.value()?.parse()?;
            *slot = Some(sql_name(&lit.value(), lit.span(), &key)?);
            Ok(())
        })?;

        let required = |value: Option<String>, key: &str| {
            value.ok_or_else(|| meta.error(format!("many_to_many needs `{key} = \"...\"`")))
        };
        let model = model.ok_or_else(|| meta.error("many_to_many needs the related model first"))?;
        let name = match name {
            Some(name) => name,
            None => match model.segments.last() {
                Some(last) => format!("{}s", last.ident.to_string().to_snake_case()),
                None => return Err(meta.error("many_to_many needs the related model first")),
            },
        };

        Ok(Relation {
            through: required(through, "through")?,
            self_key: required(self_key, "self_key")?,
            other_key: required(other_key, "other_key")?,
            order_by,
            model,
            name,
        })
    }

    /// `REL_<NAME>`, `load_<name>_map`, `load_<name>` and `select_by_ids_with_<name>`.
    pub(super) fn expand(&self, pk_ty: &Type) -> TokenStream {
        let Relation {
            model,
            through,
            self_key,
            other_key,
            name,
            ..
        } = self;
        let ordered = self.order_by.as_ref().map(|col| quote! { .order_by(#col) });

        let rel = format_ident!("REL_{}", name.to_shouty_snake_case());
        let load_map = format_ident!("load_{}_map", name);
        let load = format_ident!("load_{}", name);
        let select_with = format_ident!("select_by_ids_with_{}", name);
        let map_doc = format!("`{name}` of every parent, keyed by parent id, in one query through `{through}`.");
        let with_doc = format!("Rows by primary key with `{name}` loaded; `strategy` picks the query shape.");

        quote! {
            pub const #rel: ::pgshelf::ManyToMany =
                ::pgshelf::ManyToMany::new(#through, #self_key, #other_key) #ordered;

            #[doc = #map_doc]
            pub async fn #load_map(
                conn: &impl ::pgshelf::GenericClient,
                parents: &[Self],
            ) -> ::pgshelf::OrmResult<::pgshelf::HasManyMap<#pk_ty, #model>> {
                let ids = parents
                    .iter()
                    .map(|p| ::std::clone::Clone::clone(::pgshelf::ModelPk::pk(p)))
                    .collect();
                ::pgshelf::load_many_to_many_map::<#model, #pk_ty>(conn, ids, &Self::#rel).await
            }

            /// Pair already fetched parents with their related rows, keeping parent order.
            pub async fn #load(
                conn: &impl ::pgshelf::GenericClient,
                parents: ::std::vec::Vec<Self>,
            ) -> ::pgshelf::OrmResult<::std::vec::Vec<::pgshelf::Loaded<Self, ::std::vec::Vec<#model>>>> {
                let map = Self::#load_map(conn, &parents).await?;
                Ok(::pgshelf::attach_many_to_many(parents, &map))
            }

            #[doc = #with_doc]
            pub async fn #select_with(
                conn: &impl ::pgshelf::GenericClient,
                ids: impl ::std::iter::IntoIterator<Item = #pk_ty>,
                strategy: ::pgshelf::LoadStrategy,
            ) -> ::pgshelf::OrmResult<::std::vec::Vec<::pgshelf::Loaded<Self, ::std::vec::Vec<#model>>>>
            where
                Self: ::pgshelf::FromRow,
            {
                ::pgshelf::find_many_to_many::<Self, #model, #pk_ty>(
                    conn,
                    ids.into_iter().collect(),
                    &Self::#rel,
                    strategy,
                )
                .await
            }
        }
    }
}
