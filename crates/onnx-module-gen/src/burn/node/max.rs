use onnx_graph::Node;
use quote::quote;

use super::{CodegenContext, NodeCode, OpCodegen};
use crate::{Error, Result};

/// `Max` over a single input: the largest element of the tensor.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaxCodegen;

impl OpCodegen for MaxCodegen {
    fn op_type(&self) -> &'static str {
        "Max"
    }

    fn gen(&self, node: &Node, ctx: &mut CodegenContext) -> Result<NodeCode> {
        if node.num_present_inputs() != 1 {
            return Err(Error::invalid_node(
                &node.name,
                format!(
                    "only a single input is supported, got {}",
                    node.num_present_inputs()
                ),
            ));
        }

        let data = node
            .inputs
            .iter()
            .find(|name| !name.is_empty())
            .ok_or_else(|| Error::invalid_node(&node.name, "missing input"))?;
        let elem_type = ctx.elem_type(data);
        let input = ctx.input_forward(node, data)?;
        let output = ctx.output(node, 0)?;
        ctx.infer(node, 0, Some(1), elem_type);

        Ok(NodeCode::forward(quote! {
            let #output = #input.max();
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burn::node::test::{assert_tokens, codegen_node, node, single_node_graph};
    use crate::config::EmbeddingConfigs;
    use onnx_graph::{Attributes, TensorData};

    #[test]
    fn maximum_of_every_element() {
        let graph = single_node_graph(
            node("Max_0", "Max", &["x"], &["y"], Attributes::new()),
            vec![],
            vec![],
        );

        let code = codegen_node(&MaxCodegen, &graph, &EmbeddingConfigs::default()).unwrap();

        assert_tokens(code.forward, quote! { let y = x.max(); });
        assert!(code.fields.is_empty());
    }

    #[test]
    fn constant_input_is_read_from_its_field() {
        let graph = single_node_graph(
            node("Max_0", "Max", &["w"], &["y"], Attributes::new()),
            vec![],
            vec![("w", TensorData::from_vec(vec![1.0f32, 3.0], vec![2]))],
        );

        let code = codegen_node(&MaxCodegen, &graph, &EmbeddingConfigs::default()).unwrap();

        assert_tokens(code.forward, quote! { let y = self.w.val().max(); });
    }

    #[test]
    fn several_inputs_are_rejected() {
        let graph = single_node_graph(
            node("Max_0", "Max", &["a", "b"], &["y"], Attributes::new()),
            vec![],
            vec![],
        );

        let result = codegen_node(&MaxCodegen, &graph, &EmbeddingConfigs::default());

        assert!(matches!(result, Err(Error::InvalidNode { node, .. }) if node == "Max_0"));
    }
}
