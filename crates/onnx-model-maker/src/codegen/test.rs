use proc_macro2::TokenStream;
use quote::quote;

use onnx_graph::source::format_tokens;

/// Compare two token trees once formatted. Both are wrapped in a function so statements can be
/// compared as well as items.
pub fn assert_tokens(tokens1: TokenStream, tokens2: TokenStream) {
    let tokens1 = format_tokens(quote! { fn __fmt() { #tokens1 } }).unwrap();
    let tokens2 = format_tokens(quote! { fn __fmt() { #tokens2 } }).unwrap();

    pretty_assertions::assert_eq!(tokens1, tokens2);
}
