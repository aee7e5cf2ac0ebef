use std::collections::BTreeSet;

use proc_macro2::TokenStream;
use quote::quote;

/// `use` declarations of the generated module, on top of the burn prelude.
#[derive(Debug, Default)]
pub struct BurnImports {
    paths: BTreeSet<String>,
}

impl BurnImports {
    pub fn register<S: Into<String>>(&mut self, path: S) {
        self.paths.insert(path.into());
    }

    pub fn codegen(&self) -> TokenStream {
        let mut imports = quote! {
            use burn::prelude::*;
        };

        for path in self.paths.iter() {
            let segments = path
                .split("::")
                .map(|segment| proc_macro2::Ident::new(segment, proc_macro2::Span::call_site()));
            imports.extend(quote! {
                use #(#segments)::*;
            });
        }

        imports
    }
}
