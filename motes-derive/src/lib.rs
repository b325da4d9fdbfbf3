//! Derive macros for the motes particle engine.
//!
//! This crate provides one derive macro:
//!
//! - [`Attributes`] - Implements `motes::Attributes` for a per-particle
//!   attribute bundle, optionally marking one field as the particle's color
//!
//! # Usage
//!
//! The macro is re-exported from the main `motes` crate. You don't need
//! to add this crate directly:
//!
//! ```ignore
//! use motes::prelude::*;
//!
//! #[derive(Attributes, Clone, Debug)]
//! struct Ember {
//!     radius: f32,
//!     #[color]
//!     color: Color,
//! }
//! ```
//!
//! # Color Capability
//!
//! A bundle with a `#[color]` field reports `HAS_COLOR = true` and the
//! particle system draws each quad with that color verbatim. Without one,
//! the system fades its default color by remaining lifetime instead.
//!
//! The marked field may be any `Copy` type that converts into
//! `motes::Color` (`Color` itself, `[u8; 4]`, `Vec4`).

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

/// Derive macro for particle attribute bundles.
///
/// # Generated Items
///
/// For a struct `Ember`:
///
/// - `impl motes::Attributes for Ember`
/// - `HAS_COLOR` set to whether a field carries `#[color]`
/// - `color()` returning that field converted into `motes::Color`
/// - `describe()` listing every field as `(name, Debug output)`
///
/// # Requirements
///
/// - Must be a struct with named fields, or a unit struct
/// - Every field must implement `Debug`
/// - At most one field may be marked `#[color]`
///
/// # Example
///
/// ```ignore
/// #[derive(Attributes, Clone, Debug)]
/// struct Smoke {
///     spread: Vec2,
/// }
///
/// #[derive(Attributes, Clone, Debug)]
/// struct Spark {
///     heat: f32,
///     #[color]
///     tint: [u8; 4],
/// }
///
/// assert!(!Smoke::HAS_COLOR);
/// assert!(Spark::HAS_COLOR);
/// ```
///
/// # Panics
///
/// The macro panics at compile time if:
/// - Applied to an enum, union or tuple struct
/// - More than one field is marked `#[color]`
#[proc_macro_derive(Attributes, attributes(color))]
pub fn derive_attributes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields: Vec<&syn::Field> = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().collect(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => panic!("Attributes derive only supports structs with named fields"),
        },
        _ => panic!("Attributes derive only supports structs"),
    };

    let mut color_field: Option<&syn::Ident> = None;
    let mut describe_entries = Vec::new();

    for field in &fields {
        // Named fields always carry an ident
        let field_name = field.ident.as_ref().expect("named field");
        let field_name_str = field_name.to_string();

        if field.attrs.iter().any(|a| a.path().is_ident("color")) {
            if let Some(previous) = color_field {
                panic!(
                    "Attributes derive allows a single #[color] field, found '{}' and '{}'",
                    previous, field_name
                );
            }
            color_field = Some(field_name);
        }

        describe_entries.push(quote! {
            (#field_name_str, format!("{:?}", self.#field_name))
        });
    }

    let color_impl = match color_field {
        Some(field_name) => quote! {
            const HAS_COLOR: bool = true;

            fn color(&self) -> Option<motes::Color> {
                Some(::core::convert::Into::<motes::Color>::into(self.#field_name))
            }
        },
        None => quote! {
            const HAS_COLOR: bool = false;
        },
    };

    let expanded = quote! {
        impl #impl_generics motes::Attributes for #name #ty_generics #where_clause {
            #color_impl

            fn describe(&self) -> Vec<(&'static str, String)> {
                vec![
                    #(#describe_entries),*
                ]
            }
        }
    };

    TokenStream::from(expanded)
}
