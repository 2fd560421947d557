/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Attribute, Data, DeriveInput, Expr, ExprLit, Fields, Ident, Lit, LitStr, Meta, Type};

const ATTRIBUTE: &str = "dynamo";

/// A named field and its raw annotation.
struct RecordField {
    ident: Ident,
    name: String,
    ty: Type,
    tag: String,
}

pub(crate) fn record_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "`Record` cannot be derived for generic types",
        ));
    }
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "`Record` can only be derived for structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &data.fields,
            "`Record` requires named fields",
        ));
    };

    let fields = named
        .named
        .iter()
        .map(|field| {
            let ident = field
                .ident
                .clone()
                .ok_or_else(|| syn::Error::new_spanned(field, "field must have a name"))?;
            Ok(RecordField {
                name: ident.unraw().to_string(),
                ident,
                ty: field.ty.clone(),
                tag: field_tag(&field.attrs)?.unwrap_or_default(),
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let record = &input.ident;
    let descriptors = fields.iter().map(|field| {
        let ty = &field.ty;
        let name = &field.name;
        let tag = &field.tag;
        match array_parts(ty) {
            Some((element, len)) => quote! {
                ::ddb_marshal::FieldDescriptor::array::<#element, { #len }>(#name, #tag)
            },
            None => quote! { ::ddb_marshal::FieldDescriptor::new::<#ty>(#name, #tag) },
        }
    });
    let indices = 0..fields.len();
    let idents = fields.iter().map(|field| &field.ident);
    let read_arms = quote! { #(#indices => ::std::option::Option::Some(&self.#idents),)* };
    let indices = 0..fields.len();
    let idents = fields.iter().map(|field| &field.ident);
    let write_arms = quote! { #(#indices => ::std::option::Option::Some(&mut self.#idents),)* };

    Ok(quote! {
        impl ::ddb_marshal::Record for #record {
            fn fields() -> ::std::vec::Vec<::ddb_marshal::FieldDescriptor> {
                ::std::vec![#(#descriptors),*]
            }

            fn field(&self, index: usize) -> ::std::option::Option<&dyn ::std::any::Any> {
                match index {
                    #read_arms
                    _ => ::std::option::Option::None,
                }
            }

            fn field_mut(&mut self, index: usize) -> ::std::option::Option<&mut dyn ::std::any::Any> {
                match index {
                    #write_arms
                    _ => ::std::option::Option::None,
                }
            }
        }
    })
}

/// Splits a fixed-size array type into its element type and length.
///
/// Only the written syntax is inspected; an alias naming an array is treated as any other type.
fn array_parts(ty: &Type) -> Option<(&Type, &Expr)> {
    match ty {
        Type::Array(array) => Some((&*array.elem, &array.len)),
        Type::Group(group) => array_parts(&group.elem),
        Type::Paren(paren) => array_parts(&paren.elem),
        _ => None,
    }
}

/// Returns the string of the single `#[dynamo = "..."]` attribute, if any.
fn field_tag(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut tag: Option<LitStr> = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident(ATTRIBUTE)) {
        let Meta::NameValue(meta) = &attr.meta else {
            return Err(syn::Error::new_spanned(
                attr,
                "expected `#[dynamo = \"name,options\"]`",
            ));
        };
        let Expr::Lit(ExprLit {
            lit: Lit::Str(value),
            ..
        }) = &meta.value
        else {
            return Err(syn::Error::new_spanned(
                &meta.value,
                "the annotation must be a string literal",
            ));
        };
        if tag.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "a field may carry only one `dynamo` annotation",
            ));
        }
        tag = Some(value.clone());
    }
    Ok(tag.map(|tag| tag.value()))
}
