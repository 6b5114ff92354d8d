//! Derive macro for field-injector
//!
//! `#[derive(Component)]` writes the `Component` impl for a unit struct or a
//! struct with named fields:
//!
//! - every field marked `#[inject]` must be an `Inject<T>` and becomes an
//!   injection point named after the field;
//! - `construct()` starts every field from `Default::default()`, or calls the
//!   function named by `#[component(construct = "path")]`.
//!
//! # Example
//!
//! ```rust,ignore
//! use field_injector::{Component, Container, Inject};
//!
//! trait RoomStore: Send + Sync {}
//!
//! #[derive(Component)]
//! struct Reception {
//!     #[inject]
//!     rooms: Inject<dyn RoomStore>,
//!     // Non-injected fields use Default
//!     checked_in: std::sync::atomic::AtomicU32,
//! }
//!
//! #[derive(Component)]
//! #[component(construct = "Ledger::open")]
//! struct Ledger {
//!     currency: &'static str,
//! }
//!
//! impl Ledger {
//!     fn open() -> Result<Self, field_injector::BoxError> {
//!         Ok(Ledger { currency: "EUR" })
//!     }
//! }
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Path, Type, parse_macro_input};

/// Derive macro for the `Component` trait.
///
/// # Attributes
///
/// - `#[inject]` on a field - Mark it as an injection point. The field type must be `Inject<T>`.
/// - `#[component(construct = "path")]` on the struct - Use `path()` as the
///   zero-argument constructor. It must return `Result<Self, BoxError>`.
///
/// Without a custom constructor every field, injected or not, starts from
/// `Default::default()`.
#[proc_macro_derive(Component, attributes(inject, component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Named-field structs, or unit structs with nothing to inject
    let (fields, is_unit) = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => (fields.named.iter().collect::<Vec<_>>(), false),
            Fields::Unit => (Vec::new(), true),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Component can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Component can only be derived for structs",
            ));
        }
    };

    let constructor = find_constructor(&input.attrs)?;

    let mut field_inits = Vec::new();
    let mut points = Vec::new();

    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };

        field_inits.push(quote! {
            #field_name: ::std::default::Default::default()
        });

        if !has_inject_attr(&field.attrs) {
            continue;
        }

        if extract_inject_inner_type(&field.ty).is_none() {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "Fields marked with #[inject] must have type Inject<T>",
            ));
        }

        let label = field_name.to_string();
        points.push(quote! {
            points.field(#label, |this| &this.#field_name);
        });
    }

    let construct_body = match constructor {
        Some(path) => quote! { #path() },
        None if is_unit => quote! { ::std::result::Result::Ok(Self) },
        None => quote! {
            ::std::result::Result::Ok(Self {
                #(#field_inits),*
            })
        },
    };

    let points_arg = if points.is_empty() {
        quote! { _points }
    } else {
        quote! { points }
    };

    Ok(quote! {
        impl #impl_generics ::field_injector::Component for #name #ty_generics #where_clause {
            fn construct() -> ::std::result::Result<Self, ::field_injector::BoxError> {
                #construct_body
            }

            fn injection_points(#points_arg: &mut ::field_injector::InjectionPoints<Self>) {
                #(#points)*
            }
        }
    })
}

fn has_inject_attr(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident("inject"))
}

/// Parse `#[component(construct = "path")]`
fn find_constructor(attrs: &[Attribute]) -> syn::Result<Option<Path>> {
    let mut constructor = None;

    for attr in attrs {
        if !attr.path().is_ident("component") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("construct") {
                let lit: LitStr = meta.value()?.parse()?;
                constructor = Some(lit.parse::<Path>()?);
                Ok(())
            } else {
                Err(meta.error("unsupported component attribute, expected `construct`"))
            }
        })?;
    }

    Ok(constructor)
}

/// Extract T from Inject<T>
fn extract_inject_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        let segment = type_path.path.segments.last()?;
        if segment.ident == "Inject" {
            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                    return Some(inner);
                }
            }
        }
    }
    None
}
