//! Runtime of the generated bindings: an ONNX graph under construction.

mod arity;
mod attributes;
mod input;
mod output;

pub use arity::*;
pub use attributes::*;
pub use input::*;
pub use output::*;

use std::{collections::HashMap, fs, path::Path, sync::Arc};

pub use onnx_graph::{AttributeValue, TensorData};

use onnx_graph::{
    helper::{make_node, make_opsetid, make_tensor, make_tensor_value_info},
    protos::{GraphProto, ModelProto, NodeProto},
};
use protobuf::Message;

use crate::{
    schema::{OpSchema, SchemaRegistry},
    Error, Result,
};

/// A committed node of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeHandle {
    proto: NodeProto,
}

impl NodeHandle {
    pub fn name(&self) -> &str {
        &self.proto.name
    }

    pub fn op_type(&self) -> &str {
        &self.proto.op_type
    }

    pub fn inputs(&self) -> &[String] {
        &self.proto.input
    }

    pub fn outputs(&self) -> &[String] {
        &self.proto.output
    }

    /// The output a node contributes when passed as an input.
    pub fn first_output(&self) -> Option<&str> {
        self.proto.output.first().map(String::as_str)
    }

    pub fn proto(&self) -> &NodeProto {
        &self.proto
    }
}

/// An ONNX model being built one node at a time.
///
/// Nodes are checked against their schema before they are added, and the graph only grows.
/// Node and output names come from a per operator type counter shared by every version of the
/// operator, so they never repeat within a graph.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    model: ModelProto,
    opset_version: i64,
    registry: Arc<SchemaRegistry>,
    op_counter: HashMap<String, usize>,
}

impl GraphBuilder {
    /// Create an empty graph targeting the latest operator set of the registry.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        let opset_version = registry.latest_version();
        let mut model = ModelProto::new();
        model.ir_version = 8;
        model.producer_name = env!("CARGO_PKG_NAME").to_string();
        model.producer_version = env!("CARGO_PKG_VERSION").to_string();
        model.opset_import.push(make_opsetid("", opset_version));
        model.graph.mut_or_insert_default();

        Self {
            model,
            opset_version,
            registry,
            op_counter: HashMap::new(),
        }
    }

    /// Set the maximum operator set version the dispatch functions resolve against.
    pub fn with_opset_version(mut self, opset_version: i64) -> Self {
        self.opset_version = opset_version;
        for opset in self.model.opset_import.iter_mut() {
            if opset.domain.is_empty() {
                opset.version = opset_version;
            }
        }
        self
    }

    pub fn opset_version(&self) -> i64 {
        self.opset_version
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn model(&self) -> &ModelProto {
        &self.model
    }

    pub fn graph(&self) -> &GraphProto {
        self.model.graph.get_or_default()
    }

    pub fn into_model(self) -> ModelProto {
        self.model
    }

    /// Number of nodes of `op_type` created so far.
    pub fn op_count(&self, op_type: &str) -> usize {
        self.op_counter.get(op_type).copied().unwrap_or(0)
    }

    /// Write the model as protobuf bytes, replacing the file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        log::info!("Saving model to {}", path.display());

        let bytes = self.model.write_to_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// The schema of `op_type` in effect at the configured operator set version.
    pub fn resolve(&self, op_type: &str, domain: &str) -> Result<&OpSchema> {
        self.registry
            .resolve(op_type, self.opset_version, domain)
            .ok_or_else(|| Error::unknown_schema(op_type, domain, self.opset_version))
    }

    /// The since_version of `op_type` in effect at the configured operator set version.
    pub fn resolve_version(&self, op_type: &str, domain: &str) -> Result<i64> {
        self.resolve(op_type, domain)
            .map(|schema| schema.since_version)
    }

    /// Declare one typed graph input per sample array and return their names.
    pub fn input(&mut self, samples: &[TensorData]) -> Vec<String> {
        let graph = self.model.graph.mut_or_insert_default();

        samples
            .iter()
            .map(|sample| {
                let name = format!("{TENSOR_PREFIX}Input_{}", graph.input.len());
                graph.input.push(make_tensor_value_info(
                    &name,
                    Some(sample.elem_type),
                    Some(&sample.shape),
                ));
                name
            })
            .collect()
    }

    /// Declare graph outputs.
    pub fn output<I>(&mut self, outputs: I)
    where
        I: IntoIterator<Item = GraphOutput>,
    {
        let graph = self.model.graph.mut_or_insert_default();

        for output in outputs {
            output::declare_output(graph, output);
        }
    }

    /// Append a named initializer and return its name.
    pub fn add_initializer(&mut self, data: &TensorData) -> Result<String> {
        if !data.is_consistent() {
            return Err(Error::InvalidInput(format!(
                "array of shape {:?} holds {} elements",
                data.shape,
                data.data.len()
            )));
        }

        let graph = self.model.graph.mut_or_insert_default();
        let name = input::initializer_name(graph.initializer.len());
        graph.initializer.push(make_tensor(&name, data));
        Ok(name)
    }

    /// Start collecting the inputs of a new node.
    pub fn node_inputs(&self) -> NodeInputs {
        NodeInputs::new(self.graph().initializer.len())
    }

    /// Build, check and append a node of the schema `(op_type, domain, since_version)`.
    ///
    /// The node, the initializers of its inputs and the counter increment are committed
    /// together, once the node passes the schema check.
    pub fn make_node(
        &mut self,
        op_type: &str,
        domain: &str,
        since_version: i64,
        inputs: NodeInputs,
        arity: OutputArity,
        attrs: Attributes,
    ) -> Result<NodeHandle> {
        let schema = self
            .registry
            .get(op_type, since_version, domain)
            .ok_or_else(|| Error::unknown_schema(op_type, domain, since_version))?;

        if inputs.base() != self.graph().initializer.len() {
            return Err(Error::InvalidInput(format!(
                "inputs of {op_type} were collected before the graph changed"
            )));
        }

        let idx = self.op_count(op_type);
        // Computed arities always number their outputs, even a single one.
        let outputs = match arity {
            OutputArity::Declared if schema.outputs.len() == 1 => {
                vec![format!("{TENSOR_PREFIX}{op_type}_{idx}")]
            }
            OutputArity::Declared => numbered_outputs(op_type, idx, schema.outputs.len()),
            OutputArity::Count(count) => numbered_outputs(op_type, idx, count),
        };

        let (names, initializers) = inputs.into_parts();
        let node = make_node(
            op_type,
            names,
            outputs,
            &format!("{op_type}_{idx}"),
            domain,
            &attrs.into(),
        );
        schema.check_node(&node)?;

        log::debug!(
            "Adding node {} (opset {}) with inputs {:?} and outputs {:?}",
            node.name,
            since_version,
            node.input,
            node.output
        );

        let graph = self.model.graph.mut_or_insert_default();
        graph.initializer.extend(initializers);
        graph.node.push(node.clone());
        *self.op_counter.entry(op_type.to_string()).or_default() += 1;

        Ok(NodeHandle { proto: node })
    }

    /// Convert `inputs` and add the node in one step.
    pub fn add_node(
        &mut self,
        op_type: &str,
        domain: &str,
        since_version: i64,
        inputs: Vec<Option<NodeInput>>,
        arity: OutputArity,
        attrs: Attributes,
    ) -> Result<NodeHandle> {
        let mut staged = self.node_inputs();
        for input in inputs {
            staged.add_input(input)?;
        }
        self.make_node(op_type, domain, since_version, staged, arity, attrs)
    }
}

fn numbered_outputs(op_type: &str, idx: usize, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("{TENSOR_PREFIX}{op_type}_{idx}_{i}"))
        .collect()
}
