//! # pgmock-derive
//!
//! `#[derive(FromRow)]` for mapping `pgmock` rows onto structs.
//!
//! The generated implementation reads every field by column name, so it
//! works with both plain and alias-prefixed result sets, and lists the
//! columns it reads in `FromRow::COLUMNS` for building select lists.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pgmock::FromRow;
//!
//! #[derive(FromRow)]
//! struct Order {
//!     id: i64,
//!     status: i32,
//!     #[pgmock(default)]
//!     value: f64,
//!     #[pgmock(rename = "reserved_fee")]
//!     fee: f64,
//! }
//!
//! // SELECT o.id AS o_id, o.status AS o_status, ...
//! let select = pgmock::columns_aliased::<Order>("o");
//! ```

#![warn(missing_docs)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Type, parse_macro_input};

/// Field configuration extracted from `#[pgmock(..)]` attributes.
#[derive(Default)]
struct FieldConfig {
    rename: Option<String>,
    skip: bool,
    default: bool,
    flatten: bool,
}

/// Naming convention applied by `#[pgmock(rename_all = "..")]`.
#[derive(Clone, Copy)]
enum RenameRule {
    Snake,
    Camel,
    Pascal,
    ScreamingSnake,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> syn::Result<Self> {
        match lit.value().as_str() {
            "snake_case" => Ok(Self::Snake),
            "camelCase" => Ok(Self::Camel),
            "PascalCase" => Ok(Self::Pascal),
            "SCREAMING_SNAKE_CASE" => Ok(Self::ScreamingSnake),
            other => Err(syn::Error::new_spanned(
                lit,
                format!(
                    "unknown rename_all rule \"{other}\", expected one of snake_case, camelCase, PascalCase, SCREAMING_SNAKE_CASE"
                ),
            )),
        }
    }

    fn apply(self, name: &str) -> String {
        match self {
            Self::Snake => to_snake_case(name),
            Self::Camel => to_camel_case(name),
            Self::Pascal => to_pascal_case(name),
            Self::ScreamingSnake => to_snake_case(name).to_uppercase(),
        }
    }
}

fn parse_field_config(attrs: &[Attribute]) -> syn::Result<FieldConfig> {
    let mut config = FieldConfig::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("pgmock")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let lit: LitStr = meta.value()?.parse()?;
                config.rename = Some(lit.value());
            } else if meta.path.is_ident("skip") {
                config.skip = true;
            } else if meta.path.is_ident("default") {
                config.default = true;
            } else if meta.path.is_ident("flatten") {
                config.flatten = true;
            } else {
                return Err(meta.error("unsupported pgmock field attribute"));
            }
            Ok(())
        })?;
    }

    Ok(config)
}

fn parse_rename_all(attrs: &[Attribute]) -> syn::Result<Option<RenameRule>> {
    let mut rule = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("pgmock")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                let lit: LitStr = meta.value()?.parse()?;
                rule = Some(RenameRule::parse(&lit)?);
                Ok(())
            } else {
                Err(meta.error("unsupported pgmock container attribute"))
            }
        })?;
    }

    Ok(rule)
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut upper_next = true;
    for c in s.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            result.extend(c.to_uppercase());
            upper_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

fn to_camel_case(s: &str) -> String {
    let pascal = to_pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => pascal,
    }
}

fn is_option_type(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}

/// Derive macro for `pgmock::FromRow`.
///
/// ## Attributes
///
/// ### Field Attributes
///
/// - `#[pgmock(rename = "column")]` - Read the field from a differently named column
/// - `#[pgmock(skip)]` - Don't read the field; it takes its `Default` value
/// - `#[pgmock(default)]` - Use `Default` when the column is missing or unreadable
/// - `#[pgmock(flatten)]` - Read a nested `FromRow` struct from the same row
///
/// ### Struct Attributes
///
/// - `#[pgmock(rename_all = "camelCase")]` - Apply a naming convention to every field
///
/// `Option` fields read `None` for NULL or missing columns.
#[proc_macro_derive(FromRow, attributes(pgmock))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match impl_from_row(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn impl_from_row(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let rename_all = parse_rename_all(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "FromRow can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "FromRow can only be derived for structs",
            ));
        }
    };

    let mut extractions = Vec::with_capacity(fields.len());
    let mut columns = Vec::with_capacity(fields.len());

    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let field_type = &field.ty;
        let config = parse_field_config(&field.attrs)?;

        if config.skip {
            extractions.push(quote! {
                #field_name: ::std::default::Default::default()
            });
            continue;
        }

        if config.flatten {
            extractions.push(quote! {
                #field_name: <#field_type as ::pgmock::FromRow>::from_row_aliased(row, alias)?
            });
            continue;
        }

        let column = match (config.rename, rename_all) {
            (Some(rename), _) => rename,
            (None, Some(rule)) => rule.apply(&field_name.to_string()),
            (None, None) => field_name.to_string(),
        };
        let lookup = quote! { &::pgmock::aliased_column(alias, #column) };

        let extraction = if is_option_type(field_type) {
            quote! { row.try_get_by_name(#lookup) }
        } else if config.default {
            quote! {
                row.try_get_by_name(#lookup)
                    .unwrap_or_else(::std::default::Default::default)
            }
        } else {
            quote! {
                row.get_by_name(#lookup).map_err(::pgmock::Error::from)?
            }
        };
        extractions.push(quote! { #field_name: #extraction });
        columns.push(column);
    }

    Ok(quote! {
        impl #impl_generics ::pgmock::FromRow for #name #ty_generics #where_clause {
            const COLUMNS: &'static [&'static str] = &[#(#columns),*];

            fn from_row_aliased(
                row: &::pgmock::Row,
                alias: &str,
            ) -> ::std::result::Result<Self, ::pgmock::Error> {
                ::std::result::Result::Ok(Self {
                    #(#extractions),*
                })
            }
        }
    })
}
