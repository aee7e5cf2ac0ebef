use onnx_graph::{ElementType, Node};
use proc_macro2::{Ident, TokenStream};
use quote::quote;

use super::{CodegenContext, NodeCode, OpCodegen};
use crate::{burn::ToTokens, config::EmbeddingConfig, Error, Result};

/// `Gather`: indexing along an axis, or an embedding when the configuration names the node.
#[derive(Debug, Default, Clone, Copy)]
pub struct GatherCodegen;

impl OpCodegen for GatherCodegen {
    fn op_type(&self) -> &'static str {
        "Gather"
    }

    fn gen(&self, node: &Node, ctx: &mut CodegenContext) -> Result<NodeCode> {
        let data = node
            .input(0)
            .ok_or_else(|| Error::invalid_node(&node.name, "missing input data"))?;
        let indices = node
            .input(1)
            .ok_or_else(|| Error::invalid_node(&node.name, "missing input indices"))?;

        match ctx.embedding(&node.name) {
            Some(config) => embedding(node, ctx, config, data, indices),
            None => indexing(node, ctx, data, indices),
        }
    }
}

fn indexing(
    node: &Node,
    ctx: &mut CodegenContext,
    data: &str,
    indices: &str,
) -> Result<NodeCode> {
    // Both ranks are const generics of the generated calls.
    let data_rank = ctx
        .rank(data)
        .ok_or_else(|| Error::MissingValueInfo(data.to_string()))?;
    let index_rank = ctx
        .rank(indices)
        .ok_or_else(|| Error::MissingValueInfo(indices.to_string()))?;
    let axis = gather_axis(node, data_rank)?;

    let input = ctx.input_forward(node, data)?;
    let index = int_indices(ctx, node, indices)?;
    let output = ctx.output(node, 0)?;
    let axis_tokens = axis.to_tokens();

    let output_rank = (data_rank - 1 + index_rank).max(1);
    ctx.infer(node, 0, Some(output_rank), ctx.elem_type(data));

    // Scalars are carried as one-element tensors, so a scalar index selects like a rank 1
    // index. The gathered axis is dropped unless the result would be a scalar.
    let expr = match index_rank {
        0 | 1 => {
            let selected = quote! { #input.select(#axis_tokens, #index) };
            if index_rank == 0 && data_rank > 1 {
                let dims = [axis].to_tokens();
                let output_rank = output_rank.to_tokens();
                quote! { #selected.squeeze_dims::<#output_rank>(&#dims) }
            } else {
                selected
            }
        }
        _ => {
            let index_rank = index_rank.to_tokens();
            let output_rank = output_rank.to_tokens();
            quote! { #input.take::<#index_rank, #output_rank>(#axis_tokens, #index) }
        }
    };

    Ok(NodeCode::forward(quote! {
        let #output = #expr;
    }))
}

fn embedding(
    node: &Node,
    ctx: &mut CodegenContext,
    config: &EmbeddingConfig,
    data: &str,
    indices: &str,
) -> Result<NodeCode> {
    if let Some(rank) = ctx.rank(indices).filter(|rank| *rank != 2) {
        return Err(Error::invalid_node(
            &node.name,
            format!("embedding indices must have rank 2, got {rank}"),
        ));
    }

    let field = ctx.field(node);
    let weight = ctx.initializer(data);
    let pretrained =
        weight.is_some_and(|weight| weight.shape.first() == Some(&config.num_embeddings));

    let (init, imports) = if pretrained {
        let is_float_matrix =
            weight.is_some_and(|weight| weight.rank() == 2 && weight.elem_type.is_float());
        if !is_float_matrix {
            return Err(Error::invalid_node(
                &node.name,
                "embedding weights must be a float matrix",
            ));
        }
        log::debug!("Node ({}): pretrained embedding from {data}", node.name);

        let weight = ctx.input_init(node, data)?;
        (
            quote! {
                let #field = Embedding {
                    weight: burn::module::Param::from_tensor(#weight),
                };
            },
            vec!["burn::nn::Embedding"],
        )
    } else {
        match weight {
            Some(weight) => log::warn!(
                "Node ({}): weight shape {:?} does not match {} embeddings, initializing a fresh table",
                node.name,
                weight.shape,
                config.num_embeddings
            ),
            None => log::warn!(
                "Node ({}): {data} is not a constant, initializing a fresh table",
                node.name
            ),
        }
        fresh_embedding(&field, config)
    };

    let index = int_indices(ctx, node, indices)?;
    let output = ctx.output(node, 0)?;
    ctx.infer(node, 0, Some(3), Some(ElementType::Float32));

    Ok(NodeCode {
        fields: vec![(field.clone(), quote! { Embedding<B> })],
        init,
        forward: quote! {
            let #output = self.#field.forward(#index);
        },
        imports,
    })
}

fn fresh_embedding(field: &Ident, config: &EmbeddingConfig) -> (TokenStream, Vec<&'static str>) {
    let num_embeddings = config.num_embeddings.to_tokens();
    let embedding_dim = config.embedding_dim.to_tokens();

    (
        quote! {
            let #field = EmbeddingConfig::new(#num_embeddings, #embedding_dim).init(device);
        },
        vec!["burn::nn::Embedding", "burn::nn::EmbeddingConfig"],
    )
}

/// Axis attribute, 0 by default, negative values counting from the last dimension.
fn gather_axis(node: &Node, rank: usize) -> Result<usize> {
    let axis = node
        .attrs
        .get("axis")
        .map(|value| {
            value
                .as_i64()
                .ok_or_else(|| Error::invalid_node(&node.name, "axis must be an integer"))
        })
        .transpose()?
        .unwrap_or(0);

    let normalized = if axis < 0 { rank as i64 + axis } else { axis };
    if normalized < 0 || normalized as usize >= rank {
        return Err(Error::invalid_node(
            &node.name,
            format!("axis {axis} out of range for rank {rank}"),
        ));
    }

    Ok(normalized as usize)
}

/// Index tensor in integer form.
fn int_indices(ctx: &mut CodegenContext, node: &Node, indices: &str) -> Result<TokenStream> {
    let is_float = ctx
        .elem_type(indices)
        .is_some_and(|elem_type| elem_type.is_float());
    let index = ctx.input_forward(node, indices)?;

    Ok(if is_float {
        quote! { #index.int() }
    } else {
        index
    })
}
