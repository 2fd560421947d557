/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_cfg))]
/* End of automatically managed default lints */

//! Derive macro for `ddb_marshal::Record`.
//!
//! The derive only describes fields; annotations are passed through verbatim
//! and interpreted by `ddb_marshal` at runtime.

#![warn(missing_docs)]

extern crate proc_macro;

use proc_macro::TokenStream;
use syn::DeriveInput;

use crate::derive_impl::record_impl;

mod derive_impl;

/// Implements `ddb_marshal::Record` for a struct with named fields.
///
/// Each field may carry one `#[dynamo = "name,opt1,opt2"]` annotation.
#[proc_macro_derive(Record, attributes(dynamo))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    record_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
