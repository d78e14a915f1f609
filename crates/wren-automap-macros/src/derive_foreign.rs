//! Implementation of `#[derive(ForeignType)]`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

use crate::attrs::{FieldAttrs, TypeAttrs};

pub fn derive_foreign_type_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_foreign_type_inner(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_foreign_type_inner(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let attrs = TypeAttrs::from_attrs(&input.attrs)?;
    let wren_name = attrs.name.clone().unwrap_or_else(|| name.to_string());

    let superclass = attrs.superclass.as_ref().map(|superclass| {
        quote! { let builder = builder.superclass(#superclass); }
    });
    let accessors = collect_accessors(input)?;
    let finish = match &attrs.extend {
        Some(path) => quote! { #path(builder) },
        None => quote! { ::core::result::Result::Ok(builder) },
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::wren_automap::ForeignType for #name #ty_generics #where_clause {
            const NAME: &'static str = #wren_name;

            fn describe(
                builder: ::wren_automap::ClassBuilder<Self>,
            ) -> ::core::result::Result<
                ::wren_automap::ClassBuilder<Self>,
                ::wren_automap::RegistrationError,
            > {
                #superclass
                #(#accessors)*
                #finish
            }
        }
    })
}

/// One `let builder = ...?;` statement per generated getter or setter.
fn collect_accessors(input: &DeriveInput) -> syn::Result<Vec<TokenStream2>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "ForeignType can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "ForeignType can only be derived for structs",
            ));
        }
    };

    let mut accessors = Vec::new();
    for field in fields {
        let field_attrs = FieldAttrs::from_attrs(&field.attrs)?;
        if !field_attrs.get && !field_attrs.set {
            continue;
        }

        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let prop_name = field_attrs
            .name
            .clone()
            .unwrap_or_else(|| field_name.to_string());
        let field_ty = &field.ty;

        if field_attrs.get {
            accessors.push(quote! {
                let builder = builder.getter(#prop_name, |this: &Self| {
                    ::core::clone::Clone::clone(&this.#field_name)
                })?;
            });
        }
        if field_attrs.set {
            accessors.push(quote! {
                let builder = builder.setter(#prop_name, |this: &mut Self, value: #field_ty| {
                    this.#field_name = value;
                })?;
            });
        }
    }

    Ok(accessors)
}
