use proc_macro2::{Ident, Literal, Span, TokenStream};
use quote::quote;

use super::ident::op_fn_name;
use super::op_fn::{params, ParamKind};
use crate::schema::OpSchema;

/// Module holding the functions introduced at `since_version`.
pub(crate) fn version_module(since_version: i64) -> Ident {
    Ident::new(&format!("op_ver_{since_version}"), Span::call_site())
}

/// The function resolving the version of an operator at the graph's opset and forwarding to it.
///
/// `versions` are every schema of one operator, in increasing since_version.
pub(crate) fn gen_dispatch_fn(versions: &[&OpSchema]) -> TokenStream {
    let Some(latest) = versions.last() else {
        return quote! {};
    };
    let fn_name = op_fn_name(&latest.name, &latest.domain);
    let op_type = latest.name.as_str();
    let domain = latest.domain.as_str();
    let doc = format!(
        " `{}` operator, at the opset version of the graph.",
        latest.name
    );

    let arms = versions.iter().map(|schema| {
        let version = Literal::i64_unsuffixed(schema.since_version);
        let module = version_module(schema.since_version);
        let params = params(schema);

        let unpack = params.iter().map(|param| {
            let name = &param.name;
            match param.kind {
                ParamKind::Required => quote! { let #name = args.required()?; },
                ParamKind::Optional => quote! { let #name = args.optional(); },
                ParamKind::Variadic => quote! { let #name = args.rest(); },
            }
        });
        let names = params.iter().map(|param| &param.name);

        quote! {
            #version => {
                #(#unpack)*
                args.finish()?;
                #module::#fn_name(graph, #(#names,)* attrs)
            }
        }
    });

    let cursor = if versions.iter().any(|schema| !schema.inputs.is_empty()) {
        quote! { let mut args = Args::new(#op_type, args); }
    } else {
        quote! { let args = Args::new(#op_type, args); }
    };

    quote! {
        #[doc = #doc]
        pub fn #fn_name(
            graph: &mut GraphBuilder,
            args: Vec<Option<NodeInput>>,
            attrs: Attributes,
        ) -> Result<NodeHandle> {
            #cursor
            match graph.resolve_version(#op_type, #domain)? {
                #(#arms)*
                version => Err(Error::unknown_schema(#op_type, #domain, version)),
            }
        }
    }
}
