use onnx_graph::protos::{attribute_proto::AttributeType as ProtoAttributeType, NodeProto};

use super::{AttributeType, FormalParameterOption, OpSchema};
use crate::{Error, Result};

impl AttributeType {
    fn matches(&self, ty: ProtoAttributeType) -> bool {
        let expected = match self {
            AttributeType::Float => ProtoAttributeType::FLOAT,
            AttributeType::Int => ProtoAttributeType::INT,
            AttributeType::String => ProtoAttributeType::STRING,
            AttributeType::Tensor => ProtoAttributeType::TENSOR,
            AttributeType::Graph => ProtoAttributeType::GRAPH,
            AttributeType::SparseTensor => ProtoAttributeType::SPARSE_TENSOR,
            AttributeType::Floats => ProtoAttributeType::FLOATS,
            AttributeType::Ints => ProtoAttributeType::INTS,
            AttributeType::Strings => ProtoAttributeType::STRINGS,
            AttributeType::Tensors => ProtoAttributeType::TENSORS,
            AttributeType::Graphs => ProtoAttributeType::GRAPHS,
            AttributeType::SparseTensors => ProtoAttributeType::SPARSE_TENSORS,
            AttributeType::TypeProto => ProtoAttributeType::TYPE_PROTO,
            AttributeType::TypeProtos => ProtoAttributeType::TYPE_PROTOS,
        };
        expected == ty
    }
}

impl OpSchema {
    /// Structural check of a node against this schema: operator, arity and attributes.
    ///
    /// The error carries the diagnostic unchanged so callers can surface it as is.
    pub fn check_node(&self, node: &NodeProto) -> Result<()> {
        self.verify(node).map_err(Error::SchemaValidation)
    }

    fn verify(&self, node: &NodeProto) -> core::result::Result<(), String> {
        if node.op_type != self.name || node.domain != self.domain {
            return Err(format!(
                "Node ({}) of type {} (domain '{}') checked against schema {} (domain '{}')",
                node.name, node.op_type, node.domain, self.name, self.domain
            ));
        }

        let num_inputs = node.input.len();
        if num_inputs < self.min_input || num_inputs > self.max_input {
            return Err(format!(
                "Node ({}) has input size {} not in range [min={}, max={}].",
                node.name, num_inputs, self.min_input, self.max_input
            ));
        }

        let num_outputs = node.output.len();
        if num_outputs < self.min_output || num_outputs > self.max_output {
            return Err(format!(
                "Node ({}) has output size {} not in range [min={}, max={}].",
                node.name, num_outputs, self.min_output, self.max_output
            ));
        }

        for (i, input) in node.input.iter().enumerate() {
            let option = self
                .inputs
                .get(i)
                .or(self.inputs.last())
                .map(|param| param.option);
            if input.is_empty() && option != Some(FormalParameterOption::Optional) {
                return Err(format!(
                    "Node ({})'s input {} is marked single but has an empty string in the graph",
                    node.name, i
                ));
            }
        }

        for attr in node.attribute.iter() {
            let Some(spec) = self.attribute(&attr.name) else {
                return Err(format!(
                    "Unrecognized attribute: {} for operator {}",
                    attr.name, self.name
                ));
            };

            let matches = attr
                .type_
                .enum_value()
                .map(|ty| spec.ty.matches(ty))
                .unwrap_or(false);
            if !matches {
                return Err(format!(
                    "Mismatched attribute type in 'Node ({}) : {}'",
                    node.name, attr.name
                ));
            }
        }

        for spec in self.attributes.iter().filter(|spec| spec.required) {
            if !node.attribute.iter().any(|attr| attr.name == spec.name) {
                return Err(format!(
                    "Required attribute '{}' is missing in Node ({}).",
                    spec.name, node.name
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;
    use onnx_graph::{helper::make_node, AttributeValue, Attributes};

    fn node(op_type: &str, inputs: &[&str], outputs: &[&str], attrs: Attributes) -> NodeProto {
        make_node(
            op_type,
            inputs.iter().map(|s| s.to_string()).collect(),
            outputs.iter().map(|s| s.to_string()).collect(),
            &format!("{op_type}_0"),
            "",
            &attrs,
        )
    }

    fn diagnostic(result: Result<()>) -> String {
        match result {
            Err(Error::SchemaValidation(message)) => message,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_node_passes() {
        let registry = SchemaRegistry::builtin();
        let schema = registry.get("Gather", 13, "").unwrap();

        let mut attrs = Attributes::new();
        attrs.insert("axis".to_string(), AttributeValue::Int64(1));

        schema
            .check_node(&node("Gather", &["data", "indices"], &["out"], attrs))
            .unwrap();
    }

    #[test]
    fn input_arity_is_checked() {
        let registry = SchemaRegistry::builtin();
        let schema = registry.get("Relu", 14, "").unwrap();

        let message = diagnostic(schema.check_node(&node(
            "Relu",
            &["a", "b"],
            &["y"],
            Attributes::new(),
        )));
        assert_eq!(
            message,
            "Node (Relu_0) has input size 2 not in range [min=1, max=1]."
        );
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let registry = SchemaRegistry::builtin();
        let schema = registry.get("Relu", 14, "").unwrap();

        let mut attrs = Attributes::new();
        attrs.insert("alpha".to_string(), AttributeValue::Float32(0.1));

        let message = diagnostic(schema.check_node(&node("Relu", &["x"], &["y"], attrs)));
        assert_eq!(message, "Unrecognized attribute: alpha for operator Relu");
    }

    #[test]
    fn attribute_type_is_checked() {
        let registry = SchemaRegistry::builtin();
        let schema = registry.get("Gather", 13, "").unwrap();

        let mut attrs = Attributes::new();
        attrs.insert("axis".to_string(), AttributeValue::Float32(1.0));

        let message = diagnostic(schema.check_node(&node(
            "Gather",
            &["data", "indices"],
            &["out"],
            attrs,
        )));
        assert!(message.starts_with("Mismatched attribute type"));
    }

    #[test]
    fn required_attribute_is_checked() {
        let registry = SchemaRegistry::builtin();
        let schema = registry.get("Concat", 13, "").unwrap();

        let message = diagnostic(schema.check_node(&node(
            "Concat",
            &["a", "b", "c"],
            &["y"],
            Attributes::new(),
        )));
        assert_eq!(message, "Required attribute 'axis' is missing in Node (Concat_0).");
    }

    #[test]
    fn empty_name_only_allowed_for_optional_inputs() {
        let registry = SchemaRegistry::builtin();
        let clip = registry.get("Clip", 13, "").unwrap();
        clip.check_node(&node("Clip", &["x", "", "max"], &["y"], Attributes::new()))
            .unwrap();

        let gather = registry.get("Gather", 13, "").unwrap();
        let message = diagnostic(gather.check_node(&node(
            "Gather",
            &["", "indices"],
            &["y"],
            Attributes::new(),
        )));
        assert!(message.contains("marked single"));
    }
}
