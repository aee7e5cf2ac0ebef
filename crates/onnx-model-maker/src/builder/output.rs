use onnx_graph::{
    helper::{make_empty_tensor_value_info, make_tensor_value_info},
    protos::GraphProto,
    TensorData,
};

use super::{NodeHandle, NodeInput, TENSOR_PREFIX};
use crate::Error;

/// A graph output declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphOutput {
    /// A sample array: declares a typed output `_t_Output_{i}`.
    Array(TensorData),
    /// An untyped output with this name.
    Name(String),
    /// Every output of the node.
    Node(NodeHandle),
}

impl From<TensorData> for GraphOutput {
    fn from(data: TensorData) -> Self {
        GraphOutput::Array(data)
    }
}

impl From<&str> for GraphOutput {
    fn from(name: &str) -> Self {
        GraphOutput::Name(name.to_string())
    }
}

impl From<String> for GraphOutput {
    fn from(name: String) -> Self {
        GraphOutput::Name(name)
    }
}

impl From<NodeHandle> for GraphOutput {
    fn from(node: NodeHandle) -> Self {
        GraphOutput::Node(node)
    }
}

impl From<&NodeHandle> for GraphOutput {
    fn from(node: &NodeHandle) -> Self {
        GraphOutput::Node(node.clone())
    }
}

impl TryFrom<NodeInput> for GraphOutput {
    type Error = Error;

    fn try_from(input: NodeInput) -> Result<Self, Self::Error> {
        match input {
            NodeInput::Array(data) => Ok(GraphOutput::Array(data)),
            NodeInput::Name(name) => Ok(GraphOutput::Name(name)),
            NodeInput::Node(node) => Ok(GraphOutput::Node(node)),
            NodeInput::Names(names) => Err(Error::UnsupportedOutput(format!(
                "a list of names ({names:?}) cannot be declared as one output"
            ))),
        }
    }
}

pub(crate) fn declare_output(graph: &mut GraphProto, output: GraphOutput) {
    match output {
        GraphOutput::Array(sample) => {
            let name = format!("{TENSOR_PREFIX}Output_{}", graph.output.len());
            graph.output.push(make_tensor_value_info(
                &name,
                Some(sample.elem_type),
                Some(&sample.shape),
            ));
        }
        GraphOutput::Name(name) => {
            graph.output.push(make_empty_tensor_value_info(&name));
        }
        GraphOutput::Node(node) => {
            for name in node.outputs() {
                graph.output.push(make_empty_tensor_value_info(name));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_outputs_are_numbered_by_position() {
        let mut graph = GraphProto::new();
        declare_output(&mut graph, "y".into());
        declare_output(
            &mut graph,
            TensorData::from_vec(vec![0.0f32; 4], vec![2, 2]).into(),
        );

        assert_eq!(graph.output[0].name, "y");
        assert!(graph.output[0].type_.is_none());
        assert_eq!(graph.output[1].name, "_t_Output_1");
        assert!(graph.output[1].type_.is_some());
    }

    #[test]
    fn name_lists_are_not_outputs() {
        let names = NodeInput::Names(vec!["a".to_string(), "b".to_string()]);

        assert!(matches!(
            GraphOutput::try_from(names),
            Err(Error::UnsupportedOutput(_))
        ));
        assert_eq!(
            GraphOutput::try_from(NodeInput::from("a")).unwrap(),
            GraphOutput::Name("a".to_string())
        );
    }
}
