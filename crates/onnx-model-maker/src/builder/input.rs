use ndarray::{ArrayBase, Data as ArrayData, Dimension};
use onnx_graph::{helper::make_tensor, protos::TensorProto, Element, TensorData};

use super::NodeHandle;
use crate::{Error, Result};

/// Prefix of every name the builder generates.
pub const TENSOR_PREFIX: &str = "_t_";

/// One argument of an operator binding.
///
/// The four shapes an input can take. Anything else is rejected when the argument is built.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeInput {
    /// A dense array, stored as a new initializer and referenced by its generated name.
    Array(TensorData),
    /// A tensor name, used verbatim.
    Name(String),
    /// Several tensor names, spliced in order.
    Names(Vec<String>),
    /// A previous node, contributing its first output.
    Node(NodeHandle),
}

impl From<&str> for NodeInput {
    fn from(name: &str) -> Self {
        NodeInput::Name(name.to_string())
    }
}

impl From<String> for NodeInput {
    fn from(name: String) -> Self {
        NodeInput::Name(name)
    }
}

impl From<&String> for NodeInput {
    fn from(name: &String) -> Self {
        NodeInput::Name(name.clone())
    }
}

impl From<Vec<String>> for NodeInput {
    fn from(names: Vec<String>) -> Self {
        NodeInput::Names(names)
    }
}

impl From<&[&str]> for NodeInput {
    fn from(names: &[&str]) -> Self {
        NodeInput::Names(names.iter().map(|name| name.to_string()).collect())
    }
}

impl From<TensorData> for NodeInput {
    fn from(data: TensorData) -> Self {
        NodeInput::Array(data)
    }
}

impl<S, D> From<ArrayBase<S, D>> for NodeInput
where
    S: ArrayData,
    S::Elem: Element + Clone,
    D: Dimension,
{
    fn from(array: ArrayBase<S, D>) -> Self {
        NodeInput::Array(array_to_tensor(&array))
    }
}

impl From<NodeHandle> for NodeInput {
    fn from(node: NodeHandle) -> Self {
        NodeInput::Node(node)
    }
}

impl From<&NodeHandle> for NodeInput {
    fn from(node: &NodeHandle) -> Self {
        NodeInput::Node(node.clone())
    }
}

/// Copy an ndarray array, in logical order, into tensor data.
pub fn array_to_tensor<S, D>(array: &ArrayBase<S, D>) -> TensorData
where
    S: ArrayData,
    S::Elem: Element + Clone,
    D: Dimension,
{
    TensorData::from_vec(array.iter().cloned().collect(), array.shape().to_vec())
}

/// Input names of a node being built, with the initializers its array arguments need.
///
/// Nothing reaches the graph until [GraphBuilder::make_node](super::GraphBuilder::make_node)
/// accepts the node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInputs {
    names: Vec<String>,
    initializers: Vec<TensorProto>,
    /// Number of initializers in the graph when the staging started.
    base: usize,
}

impl NodeInputs {
    pub(crate) fn new(base: usize) -> Self {
        Self {
            names: Vec::new(),
            initializers: Vec::new(),
            base,
        }
    }

    /// Convert one argument into input names. An absent argument contributes nothing.
    pub fn add_input(&mut self, target: Option<NodeInput>) -> Result<()> {
        let Some(target) = target else {
            return Ok(());
        };

        match target {
            NodeInput::Array(data) => {
                if !data.is_consistent() {
                    return Err(Error::InvalidInput(format!(
                        "array of shape {:?} holds {} elements",
                        data.shape,
                        data.data.len()
                    )));
                }
                let name = initializer_name(self.base + self.initializers.len());
                self.initializers.push(make_tensor(&name, &data));
                self.names.push(name);
            }
            NodeInput::Name(name) => {
                check_name(&name)?;
                self.names.push(name);
            }
            NodeInput::Names(names) => {
                for name in names.iter() {
                    check_name(name)?;
                }
                self.names.extend(names);
            }
            NodeInput::Node(node) => {
                let output = node.first_output().ok_or_else(|| {
                    Error::InvalidInput(format!("node '{}' has no output", node.name()))
                })?;
                self.names.push(output.to_string());
            }
        }

        Ok(())
    }

    /// Collected input names, in argument order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Initializers created for array arguments, not yet in the graph.
    pub fn initializers(&self) -> &[TensorProto] {
        &self.initializers
    }

    pub(crate) fn base(&self) -> usize {
        self.base
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<TensorProto>) {
        (self.names, self.initializers)
    }
}

pub(crate) fn initializer_name(index: usize) -> String {
    format!("{TENSOR_PREFIX}Initializer_{index}")
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput("empty tensor name".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};
    use onnx_graph::{Data, ElementType};

    #[test]
    fn absent_input_contributes_nothing() {
        let mut inputs = NodeInputs::new(0);
        inputs.add_input(None).unwrap();
        inputs.add_input(Some("x".into())).unwrap();

        assert_eq!(inputs.names(), &["x".to_string()]);
    }

    #[test]
    fn names_are_spliced() {
        let mut inputs = NodeInputs::new(0);
        inputs
            .add_input(Some(["a", "b"].as_slice().into()))
            .unwrap();
        inputs.add_input(Some("c".into())).unwrap();

        assert_eq!(inputs.names(), &["a", "b", "c"]);
    }

    #[test]
    fn arrays_become_numbered_initializers() {
        let mut inputs = NodeInputs::new(3);
        inputs.add_input(Some(arr1(&[1i64, 2]).into())).unwrap();
        inputs.add_input(Some(arr1(&[1i64, 2]).into())).unwrap();

        assert_eq!(inputs.names(), &["_t_Initializer_3", "_t_Initializer_4"]);
        assert_eq!(inputs.initializers().len(), 2);
        assert_eq!(inputs.initializers()[1].name, "_t_Initializer_4");
    }

    #[test]
    fn ndarray_keeps_logical_order() {
        let array = arr2(&[[1.0f32, 2.0], [3.0, 4.0]]);
        let data = array_to_tensor(&array.t());

        assert_eq!(data.elem_type, ElementType::Float32);
        assert_eq!(data.shape, vec![2, 2]);
        assert_eq!(data.data, Data::Float32(vec![1.0, 3.0, 2.0, 4.0]));
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        let mut inputs = NodeInputs::new(0);

        let empty = inputs.add_input(Some("".into()));
        assert!(matches!(empty, Err(Error::InvalidInput(_))));

        let ragged = TensorData::from_vec(vec![1.0f32, 2.0, 3.0], vec![2, 2]);
        let ragged = inputs.add_input(Some(ragged.into()));
        assert!(matches!(ragged, Err(Error::InvalidInput(_))));

        assert!(inputs.names().is_empty());
        assert!(inputs.initializers().is_empty());
    }
}
