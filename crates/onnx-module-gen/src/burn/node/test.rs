use onnx_graph::{
    source::format_tokens, Attributes, Dim, ElementType, Node, OnnxGraph, TensorData, ValueInfo,
};
use proc_macro2::TokenStream;
use quote::quote;

use super::{register_uses, CodegenContext, NodeCode, OpCodegen};
use crate::{config::EmbeddingConfigs, Result};

/// Compare two token trees once formatted. Both are wrapped in a function so statements can be
/// compared as well as items.
pub fn assert_tokens(tokens1: TokenStream, tokens2: TokenStream) {
    let tokens1 = format_tokens(quote! { fn __fmt() { #tokens1 } }).unwrap();
    let tokens2 = format_tokens(quote! { fn __fmt() { #tokens2 } }).unwrap();

    pretty_assertions::assert_eq!(tokens1, tokens2);
}

pub fn node(
    name: &str,
    op_type: &str,
    inputs: &[&str],
    outputs: &[&str],
    attrs: Attributes,
) -> Node {
    Node {
        name: name.to_string(),
        op_type: op_type.to_string(),
        domain: String::new(),
        inputs: inputs.iter().map(|s| s.to_string()).collect(),
        outputs: outputs.iter().map(|s| s.to_string()).collect(),
        attrs,
    }
}

/// Value info with a static shape of ones.
pub fn value_info(name: &str, elem_type: ElementType, rank: usize) -> ValueInfo {
    ValueInfo::new(
        name.to_string(),
        Some(elem_type),
        Some(vec![Dim::Static(1); rank]),
    )
}

/// A graph made of `node` alone, its outputs being the graph outputs.
pub fn single_node_graph(
    node: Node,
    infos: Vec<ValueInfo>,
    initializers: Vec<(&str, TensorData)>,
) -> OnnxGraph {
    let value_infos: std::collections::HashMap<_, _> = infos
        .into_iter()
        .map(|info| (info.name.clone(), info))
        .collect();
    let outputs = node
        .outputs
        .iter()
        .map(|name| {
            value_infos
                .get(name)
                .cloned()
                .unwrap_or_else(|| ValueInfo::new(name.clone(), None, None))
        })
        .collect();

    OnnxGraph {
        name: "test".to_string(),
        nodes: vec![node],
        outputs,
        value_infos,
        initializers: initializers
            .into_iter()
            .map(|(name, data)| (name.to_string(), data))
            .collect(),
        ..Default::default()
    }
}

/// Run `codegen` on the only node of `graph`.
pub fn codegen_node(
    codegen: &dyn OpCodegen,
    graph: &OnnxGraph,
    embeddings: &EmbeddingConfigs,
) -> Result<NodeCode> {
    let mut ctx = CodegenContext::new(graph, embeddings);
    register_uses(&mut ctx, &graph.nodes, graph.nodes.len());
    ctx.at(0);

    codegen.gen(&graph.nodes[0], &mut ctx)
}
