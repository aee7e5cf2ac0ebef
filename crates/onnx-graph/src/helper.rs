//! Constructors for protobuf messages, mirroring the upstream `onnx.helper` functions.

use protobuf::{EnumOrUnknown, MessageField};

use crate::element_type_to_proto;
use crate::ir::{AttributeValue, Attributes, ElementType, TensorData};
use crate::protos::{
    attribute_proto::AttributeType, tensor_shape_proto::Dimension, type_proto, AttributeProto,
    NodeProto, OperatorSetIdProto, TensorProto, TensorShapeProto, TypeProto, ValueInfoProto,
};

/// Create a named tensor proto from tensor data.
pub fn make_tensor(name: &str, data: &TensorData) -> TensorProto {
    let mut tensor = TensorProto::from(data);
    tensor.name = name.to_string();
    tensor
}

/// Create an attribute proto carrying `value`.
pub fn make_attribute(name: &str, value: &AttributeValue) -> AttributeProto {
    let mut attr = AttributeProto::new();
    attr.name = name.to_string();

    let ty = match value {
        AttributeValue::Float32(v) => {
            attr.f = *v;
            AttributeType::FLOAT
        }
        AttributeValue::Int64(v) => {
            attr.i = *v;
            AttributeType::INT
        }
        AttributeValue::String(v) => {
            attr.s = v.as_bytes().to_vec();
            AttributeType::STRING
        }
        AttributeValue::Tensor(v) => {
            attr.t = MessageField::some(TensorProto::from(v));
            AttributeType::TENSOR
        }
        AttributeValue::Graph(v) => {
            attr.g = MessageField::some(v.clone());
            AttributeType::GRAPH
        }
        AttributeValue::Float32s(v) => {
            attr.floats = v.clone();
            AttributeType::FLOATS
        }
        AttributeValue::Int64s(v) => {
            attr.ints = v.clone();
            AttributeType::INTS
        }
        AttributeValue::Strings(v) => {
            attr.strings = v.iter().map(|s| s.as_bytes().to_vec()).collect();
            AttributeType::STRINGS
        }
        AttributeValue::Tensors(v) => {
            attr.tensors = v.iter().map(TensorProto::from).collect();
            AttributeType::TENSORS
        }
    };
    attr.type_ = EnumOrUnknown::new(ty);

    attr
}

/// Create a node proto. Attributes are emitted in name order.
pub fn make_node(
    op_type: &str,
    inputs: Vec<String>,
    outputs: Vec<String>,
    name: &str,
    domain: &str,
    attrs: &Attributes,
) -> NodeProto {
    let mut node = NodeProto::new();
    node.op_type = op_type.to_string();
    node.input = inputs;
    node.output = outputs;
    node.name = name.to_string();
    node.domain = domain.to_string();
    node.attribute = attrs
        .iter()
        .map(|(name, value)| make_attribute(name, value))
        .collect();
    node
}

/// Create a value info proto for a tensor; `None` leaves the element type or shape undeclared.
pub fn make_tensor_value_info(
    name: &str,
    elem_type: Option<ElementType>,
    shape: Option<&[usize]>,
) -> ValueInfoProto {
    let mut tensor = type_proto::Tensor::new();
    tensor.elem_type = elem_type.map(element_type_to_proto).unwrap_or_default();

    if let Some(shape) = shape {
        let mut shape_proto = TensorShapeProto::new();
        shape_proto.dim = shape
            .iter()
            .map(|size| {
                let mut dim = Dimension::new();
                dim.set_dim_value(*size as i64);
                dim
            })
            .collect();
        tensor.shape = MessageField::some(shape_proto);
    }

    let mut ty = TypeProto::new();
    ty.set_tensor_type(tensor);

    let mut value_info = ValueInfoProto::new();
    value_info.name = name.to_string();
    value_info.type_ = MessageField::some(ty);
    value_info
}

/// Create a value info proto that only carries a name.
pub fn make_empty_tensor_value_info(name: &str) -> ValueInfoProto {
    let mut value_info = ValueInfoProto::new();
    value_info.name = name.to_string();
    value_info
}

/// Create an operator set import entry.
pub fn make_opsetid(domain: &str, version: i64) -> OperatorSetIdProto {
    let mut opset = OperatorSetIdProto::new();
    opset.domain = domain.to_string();
    opset.version = version;
    opset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_attributes_are_sorted_by_name() {
        let mut attrs = Attributes::new();
        attrs.insert("keepdims".to_string(), AttributeValue::Int64(1));
        attrs.insert("axes".to_string(), AttributeValue::Int64s(vec![1]));

        let node = make_node(
            "ReduceSum",
            vec!["x".to_string()],
            vec!["y".to_string()],
            "ReduceSum_0",
            "",
            &attrs,
        );

        let names: Vec<_> = node.attribute.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["axes", "keepdims"]);
        assert_eq!(node.attribute[0].type_.enum_value(), Ok(AttributeType::INTS));
    }

    #[test]
    fn empty_value_info_has_no_type() {
        let info = make_empty_tensor_value_info("out");
        assert_eq!(info.name, "out");
        assert!(info.type_.is_none());
    }
}
