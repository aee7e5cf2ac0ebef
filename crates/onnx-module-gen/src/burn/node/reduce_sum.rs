use onnx_graph::Node;
use proc_macro2::TokenStream;
use quote::quote;

use super::{CodegenContext, NodeCode, OpCodegen};
use crate::{burn::ToTokens, Error, Result};

/// `ReduceSum`: sum over a constant list of axes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReduceSumCodegen;

#[derive(Debug, Clone, PartialEq)]
struct ReduceSumConfig {
    axes: Option<Vec<i64>>,
    keepdims: bool,
    noop_with_empty_axes: bool,
}

impl ReduceSumConfig {
    fn from_node(node: &Node, ctx: &CodegenContext) -> Result<Self> {
        // A second input must be a constant, even when the attribute takes precedence over it.
        let from_input = match node.input(1) {
            Some(name) => {
                let data = ctx
                    .initializer(name)
                    .ok_or_else(|| Error::UnresolvedDynamicValue {
                        node: node.name.clone(),
                        tensor: name.to_string(),
                    })?;
                Some(data.to_i64_vec()?)
            }
            None => None,
        };

        let from_attr = match node.attrs.get("axes") {
            Some(value) => Some(
                value
                    .as_i64s()
                    .map(<[i64]>::to_vec)
                    .ok_or_else(|| Error::invalid_node(&node.name, "axes must be integers"))?,
            ),
            None => None,
        };

        if let (Some(attr), Some(input)) = (&from_attr, &from_input) {
            if attr != input {
                log::warn!(
                    "Node ({}): axes attribute {:?} overrides axes input {:?}",
                    node.name,
                    attr,
                    input
                );
            }
        }

        let flag = |name: &str, default: i64| {
            node.attrs
                .get(name)
                .and_then(|value| value.as_i64())
                .unwrap_or(default)
                != 0
        };

        Ok(Self {
            axes: from_attr.or(from_input),
            keepdims: flag("keepdims", 1),
            noop_with_empty_axes: flag("noop_with_empty_axes", 0),
        })
    }
}

impl OpCodegen for ReduceSumCodegen {
    fn op_type(&self) -> &'static str {
        "ReduceSum"
    }

    fn gen(&self, node: &Node, ctx: &mut CodegenContext) -> Result<NodeCode> {
        let data = node
            .input(0)
            .ok_or_else(|| Error::invalid_node(&node.name, "missing input data"))?;
        let config = ReduceSumConfig::from_node(node, ctx)?;
        let rank = ctx.rank(data);

        let input = ctx.input_forward(node, data)?;
        let output = ctx.output(node, 0)?;

        let elem_type = ctx.elem_type(data);

        let axes = config.axes.unwrap_or_default();
        if axes.is_empty() && config.noop_with_empty_axes {
            ctx.infer(node, 0, rank, elem_type);
            return Ok(NodeCode::forward(quote! {
                let #output = #input;
            }));
        }

        let axes = if axes.is_empty() {
            if !config.keepdims {
                ctx.infer(node, 0, Some(1), elem_type);
                return Ok(NodeCode::forward(quote! {
                    let #output = #input.sum();
                }));
            }
            let rank = rank.ok_or_else(|| Error::MissingValueInfo(data.to_string()))?;
            (0..rank).collect()
        } else {
            normalize_axes(node, data, &axes, rank)?
        };

        let expr = if config.keepdims {
            ctx.infer(node, 0, rank, elem_type);
            sum_dims(input, &axes)
        } else {
            // The squeezed rank is a const generic of the generated call.
            let rank = rank.ok_or_else(|| Error::MissingValueInfo(data.to_string()))?;
            ctx.infer(node, 0, Some((rank - axes.len()).max(1)), elem_type);
            sum_and_squeeze(input, &axes, rank)
        };
        Ok(NodeCode::forward(quote! {
            let #output = #expr;
        }))
    }
}

/// Non-negative, sorted and unique axes.
fn normalize_axes(
    node: &Node,
    data: &str,
    axes: &[i64],
    rank: Option<usize>,
) -> Result<Vec<usize>> {
    let mut normalized = axes
        .iter()
        .map(|axis| {
            let axis = match (*axis, rank) {
                (axis, _) if axis >= 0 => axis as usize,
                (axis, Some(rank)) => (rank as i64 + axis).try_into().map_err(|_| {
                    Error::invalid_node(&node.name, format!("axis {axis} out of range"))
                })?,
                (_, None) => return Err(Error::MissingValueInfo(data.to_string())),
            };
            match rank {
                Some(rank) if axis >= rank => Err(Error::invalid_node(
                    &node.name,
                    format!("axis {axis} out of range for rank {rank}"),
                )),
                _ => Ok(axis),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    normalized.sort_unstable();
    normalized.dedup();
    Ok(normalized)
}

fn sum_dims(input: TokenStream, axes: &[usize]) -> TokenStream {
    axes.iter().fold(input, |tokens, axis| {
        let axis = axis.to_tokens();
        quote! { #tokens.sum_dim(#axis) }
    })
}

fn sum_and_squeeze(input: TokenStream, axes: &[usize], rank: usize) -> TokenStream {
    if rank == axes.len() {
        return quote! { #input.sum() };
    }

    let reduced = sum_dims(input, axes);
    let dims = axes.to_tokens();
    let output_rank = (rank - axes.len()).to_tokens();
    quote! { #reduced.squeeze_dims::<#output_rank>(&#dims) }
}
