use proc_macro2::{Ident, Literal, TokenStream};
use quote::quote;

use super::ident::{op_fn_name, param_names};
use crate::schema::{FormalParameterOption, OpSchema};

/// How a declared input shows up in a generated signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParamKind {
    /// `impl Into<NodeInput>`
    Required,
    /// `Option<NodeInput>`
    Optional,
    /// `Vec<NodeInput>`
    Variadic,
}

/// A declared input of a schema, as a function parameter.
#[derive(Debug, Clone)]
pub(crate) struct Param {
    pub name: Ident,
    pub kind: ParamKind,
    pub onnx_name: String,
}

pub(crate) fn params(schema: &OpSchema) -> Vec<Param> {
    let names = param_names(schema.inputs.iter().map(|input| input.name.as_str()));

    schema
        .inputs
        .iter()
        .zip(names)
        .enumerate()
        .map(|(idx, (input, name))| {
            let kind = match input.option {
                FormalParameterOption::Variadic => ParamKind::Variadic,
                _ if idx < schema.min_input => ParamKind::Required,
                _ => ParamKind::Optional,
            };
            Param {
                name,
                kind,
                onnx_name: input.name.clone(),
            }
        })
        .collect()
}

/// The function building a node of `schema`.
pub(crate) fn gen_op_fn(schema: &OpSchema) -> TokenStream {
    let fn_name = op_fn_name(&schema.name, &schema.domain);
    let op_type = schema.name.as_str();
    let domain = schema.domain.as_str();
    let since_version = Literal::i64_unsuffixed(schema.since_version);
    let doc = format!(" `{}` operator, since opset {}.", schema.name, schema.since_version);

    let params = params(schema);
    let signature = params.iter().map(|param| {
        let name = &param.name;
        match param.kind {
            ParamKind::Required => quote! { #name: impl Into<NodeInput> },
            ParamKind::Optional => quote! { #name: Option<NodeInput> },
            ParamKind::Variadic => quote! { #name: Vec<NodeInput> },
        }
    });

    let arity = gen_arity(schema, &params);
    let collect = gen_collect_inputs(&params);

    quote! {
        #[doc = #doc]
        pub fn #fn_name(
            graph: &mut GraphBuilder,
            #(#signature,)*
            attrs: Attributes,
        ) -> Result<NodeHandle> {
            #arity
            #collect
            graph.make_node(#op_type, #domain, #since_version, inputs, arity, attrs)
        }
    }
}

fn gen_collect_inputs(params: &[Param]) -> TokenStream {
    let fixed = params
        .iter()
        .filter(|param| param.kind != ParamKind::Variadic)
        .map(|param| {
            let name = &param.name;
            match param.kind {
                ParamKind::Required => quote! { Some(#name.into()) },
                _ => quote! { #name },
            }
        })
        .collect::<Vec<_>>();
    let variadic = params
        .iter()
        .find(|param| param.kind == ParamKind::Variadic)
        .map(|param| &param.name);

    match variadic {
        None => quote! {
            let inputs = add_inputs(graph, vec![#(#fixed),*])?;
        },
        Some(variadic) if fixed.is_empty() => quote! {
            let inputs = add_inputs(graph, #variadic.into_iter().map(Some).collect())?;
        },
        Some(variadic) => quote! {
            let mut args = vec![#(#fixed),*];
            args.extend(#variadic.into_iter().map(Some));
            let inputs = add_inputs(graph, args)?;
        },
    }
}

/// The output count: declared by the schema, except for `Split` whose outputs follow its split
/// sizes. Where the sizes come from depends on the version.
fn gen_arity(schema: &OpSchema, params: &[Param]) -> TokenStream {
    if schema.name != "Split" || !schema.domain.is_empty() {
        return quote! { let arity = OutputArity::Declared; };
    }

    let split_input = params
        .iter()
        .find(|param| param.onnx_name == "split")
        .map(|param| &param.name);
    let has_num_outputs = schema.attribute("num_outputs").is_some();

    let expr = match (schema.since_version >= 13, split_input) {
        (true, Some(split)) if has_num_outputs => quote! {
            OutputArity::from_split_input(#split.as_ref())
                .or_else(|_| OutputArity::from_num_outputs(&attrs))?
        },
        (true, Some(split)) => quote! {
            OutputArity::from_split_input(#split.as_ref())?
        },
        (false, Some(split)) => quote! {
            OutputArity::from_split_attr(&attrs)
                .or_else(|_| OutputArity::from_split_input(#split.as_ref()))?
        },
        (_, None) => quote! {
            OutputArity::from_split_attr(&attrs)?
        },
    };

    quote! { let arity = #expr; }
}
