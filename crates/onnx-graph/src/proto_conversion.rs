use std::str::from_utf8;

use half::f16;
use protobuf::Enum;

use crate::ir::{AttributeValue, Attributes, Data, Dim, ElementType, Node, TensorData, ValueInfo};
use crate::protos::{
    attribute_proto::AttributeType, tensor_proto::DataType as DT,
    tensor_shape_proto::dimension::Value, AttributeProto, NodeProto, TensorProto, ValueInfoProto,
};
use crate::ParseError;

/// Convert an ONNX protobuf data type code to an element type.
pub fn element_type_from_proto(dt_i32: i32) -> Result<ElementType, ParseError> {
    match DT::from_i32(dt_i32).ok_or(ParseError::UnsupportedDataType(dt_i32))? {
        DT::FLOAT => Ok(ElementType::Float32),
        DT::DOUBLE => Ok(ElementType::Float64),
        DT::FLOAT16 => Ok(ElementType::Float16),
        DT::INT64 => Ok(ElementType::Int64),
        DT::INT32 => Ok(ElementType::Int32),
        DT::INT16 => Ok(ElementType::Int16),
        DT::INT8 => Ok(ElementType::Int8),
        DT::UINT16 => Ok(ElementType::Uint16),
        DT::UINT8 => Ok(ElementType::Uint8),
        DT::BOOL => Ok(ElementType::Bool),
        DT::STRING => Ok(ElementType::String),
        _ => Err(ParseError::UnsupportedDataType(dt_i32)),
    }
}

/// Convert an element type to the ONNX protobuf data type code.
pub fn element_type_to_proto(elem_type: ElementType) -> i32 {
    let dt = match elem_type {
        ElementType::Float16 => DT::FLOAT16,
        ElementType::Float32 => DT::FLOAT,
        ElementType::Float64 => DT::DOUBLE,
        ElementType::Int8 => DT::INT8,
        ElementType::Int16 => DT::INT16,
        ElementType::Int32 => DT::INT32,
        ElementType::Int64 => DT::INT64,
        ElementType::Uint8 => DT::UINT8,
        ElementType::Uint16 => DT::UINT16,
        ElementType::Bool => DT::BOOL,
        ElementType::String => DT::STRING,
    };
    dt.value()
}

fn invalid_tensor(name: &str, reason: impl Into<String>) -> ParseError {
    ParseError::InvalidTensor {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Split little endian raw bytes into fixed size chunks.
fn raw_chunks<const N: usize>(name: &str, raw: &[u8]) -> Result<Vec<[u8; N]>, ParseError> {
    if raw.len() % N != 0 {
        return Err(invalid_tensor(
            name,
            format!("raw data of {} bytes is not a multiple of {}", raw.len(), N),
        ));
    }

    Ok(raw
        .chunks_exact(N)
        .map(|chunk| {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(chunk);
            bytes
        })
        .collect())
}

fn decode_raw(name: &str, elem_type: ElementType, raw: &[u8]) -> Result<Data, ParseError> {
    let data = match elem_type {
        ElementType::Float16 => Data::Float16(
            raw_chunks::<2>(name, raw)?
                .into_iter()
                .map(f16::from_le_bytes)
                .collect(),
        ),
        ElementType::Float32 => Data::Float32(
            raw_chunks::<4>(name, raw)?
                .into_iter()
                .map(f32::from_le_bytes)
                .collect(),
        ),
        ElementType::Float64 => Data::Float64(
            raw_chunks::<8>(name, raw)?
                .into_iter()
                .map(f64::from_le_bytes)
                .collect(),
        ),
        ElementType::Int64 => Data::Int64(
            raw_chunks::<8>(name, raw)?
                .into_iter()
                .map(i64::from_le_bytes)
                .collect(),
        ),
        ElementType::Int32 => Data::Int32(
            raw_chunks::<4>(name, raw)?
                .into_iter()
                .map(i32::from_le_bytes)
                .collect(),
        ),
        ElementType::Int16 => Data::Int32(
            raw_chunks::<2>(name, raw)?
                .into_iter()
                .map(|b| i16::from_le_bytes(b) as i32)
                .collect(),
        ),
        ElementType::Uint16 => Data::Int32(
            raw_chunks::<2>(name, raw)?
                .into_iter()
                .map(|b| u16::from_le_bytes(b) as i32)
                .collect(),
        ),
        ElementType::Int8 => Data::Int32(raw.iter().map(|b| *b as i8 as i32).collect()),
        ElementType::Uint8 => Data::Int32(raw.iter().map(|b| *b as i32).collect()),
        ElementType::Bool => Data::Bool(raw.iter().map(|b| *b != 0).collect()),
        ElementType::String => {
            return Err(invalid_tensor(name, "string tensors cannot use raw data"))
        }
    };

    Ok(data)
}

fn decode_strings(name: &str, values: &[Vec<u8>]) -> Result<Vec<String>, ParseError> {
    values
        .iter()
        .map(|bytes| {
            from_utf8(bytes)
                .map(str::to_string)
                .map_err(|err| invalid_tensor(name, err.to_string()))
        })
        .collect()
}

impl TryFrom<&TensorProto> for TensorData {
    type Error = ParseError;

    fn try_from(tensor: &TensorProto) -> Result<TensorData, Self::Error> {
        let name = tensor.name.as_str();
        let elem_type = element_type_from_proto(tensor.data_type)?;

        if tensor.dims.iter().any(|&d| d < 0) {
            return Err(invalid_tensor(
                name,
                format!("negative dims {:?}", tensor.dims),
            ));
        }
        let shape = tensor.dims.iter().map(|&d| d as usize).collect();

        let data = if !tensor.raw_data.is_empty() {
            decode_raw(name, elem_type, &tensor.raw_data)?
        } else {
            match elem_type {
                ElementType::Float32 => Data::Float32(tensor.float_data.clone()),
                ElementType::Float64 => Data::Float64(tensor.double_data.clone()),
                ElementType::Int64 => Data::Int64(tensor.int64_data.clone()),
                ElementType::Float16 => Data::Float16(
                    tensor
                        .int32_data
                        .iter()
                        .map(|bits| f16::from_bits(*bits as u16))
                        .collect(),
                ),
                ElementType::Bool => Data::Bool(tensor.int32_data.iter().map(|v| *v != 0).collect()),
                ElementType::String => Data::String(decode_strings(name, &tensor.string_data)?),
                ElementType::Int32
                | ElementType::Int16
                | ElementType::Int8
                | ElementType::Uint16
                | ElementType::Uint8 => Data::Int32(tensor.int32_data.clone()),
            }
        };

        let tensor = TensorData::new(elem_type, shape, data);
        if !tensor.is_consistent() {
            return Err(invalid_tensor(
                name,
                format!(
                    "shape {:?} needs {} elements, found {}",
                    tensor.shape,
                    tensor.num_elements(),
                    tensor.data.len()
                ),
            ));
        }

        Ok(tensor)
    }
}

impl From<&TensorData> for TensorProto {
    fn from(tensor: &TensorData) -> Self {
        let mut proto = TensorProto::new();
        proto.dims = tensor.shape.iter().map(|d| *d as i64).collect();
        proto.data_type = element_type_to_proto(tensor.elem_type);

        match &tensor.data {
            Data::Float16(v) => proto.int32_data = v.iter().map(|x| x.to_bits() as i32).collect(),
            Data::Float32(v) => proto.float_data = v.clone(),
            Data::Float64(v) => proto.double_data = v.clone(),
            Data::Int32(v) => proto.int32_data = v.clone(),
            Data::Int64(v) => proto.int64_data = v.clone(),
            Data::Bool(v) => proto.int32_data = v.iter().map(|x| *x as i32).collect(),
            Data::String(v) => {
                proto.string_data = v.iter().map(|s| s.as_bytes().to_vec()).collect()
            }
        }

        proto
    }
}

fn decode_attribute_strings(name: &str, values: &[Vec<u8>]) -> Result<Vec<String>, ParseError> {
    values
        .iter()
        .map(|bytes| {
            from_utf8(bytes)
                .map(str::to_string)
                .map_err(|err| ParseError::InvalidAttribute {
                    name: name.to_string(),
                    reason: err.to_string(),
                })
        })
        .collect()
}

impl TryFrom<&AttributeProto> for AttributeValue {
    type Error = ParseError;

    fn try_from(attr: &AttributeProto) -> Result<AttributeValue, Self::Error> {
        let name = attr.name.as_str();
        let ty = attr
            .type_
            .enum_value()
            .map_err(|code| ParseError::InvalidAttribute {
                name: name.to_string(),
                reason: format!("unknown attribute type {code}"),
            })?;

        let value = match ty {
            AttributeType::FLOAT => AttributeValue::Float32(attr.f),
            AttributeType::INT => AttributeValue::Int64(attr.i),
            AttributeType::STRING => {
                let mut strings = decode_attribute_strings(name, std::slice::from_ref(&attr.s))?;
                AttributeValue::String(strings.remove(0))
            }
            AttributeType::TENSOR => AttributeValue::Tensor(TensorData::try_from(&*attr.t)?),
            AttributeType::GRAPH => AttributeValue::Graph((*attr.g).clone()),
            AttributeType::FLOATS => AttributeValue::Float32s(attr.floats.clone()),
            AttributeType::INTS => AttributeValue::Int64s(attr.ints.clone()),
            AttributeType::STRINGS => {
                AttributeValue::Strings(decode_attribute_strings(name, &attr.strings)?)
            }
            AttributeType::TENSORS => AttributeValue::Tensors(
                attr.tensors
                    .iter()
                    .map(TensorData::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            other => {
                return Err(ParseError::InvalidAttribute {
                    name: name.to_string(),
                    reason: format!("attribute type {other:?} is not supported"),
                })
            }
        };

        Ok(value)
    }
}

impl TryFrom<&ValueInfoProto> for ValueInfo {
    type Error = ParseError;

    fn try_from(value: &ValueInfoProto) -> Result<ValueInfo, Self::Error> {
        let Some(ty) = value.type_.as_ref().filter(|ty| ty.has_tensor_type()) else {
            return Ok(ValueInfo::new(value.name.clone(), None, None));
        };
        let tensor = ty.tensor_type();

        let elem_type = match tensor.elem_type {
            0 => None,
            code => Some(element_type_from_proto(code)?),
        };

        let dims = tensor.shape.as_ref().map(|shape| {
            shape
                .dim
                .iter()
                .map(|dim| match &dim.value {
                    Some(Value::DimValue(size)) => Dim::Static(*size as usize),
                    Some(Value::DimParam(param)) => Dim::Symbolic(param.clone()),
                    None => Dim::Symbolic(String::new()),
                })
                .collect()
        });

        Ok(ValueInfo::new(value.name.clone(), elem_type, dims))
    }
}

impl TryFrom<&NodeProto> for Node {
    type Error = ParseError;

    fn try_from(node: &NodeProto) -> Result<Node, Self::Error> {
        let mut attrs = Attributes::new();
        for attr in node.attribute.iter() {
            attrs.insert(attr.name.clone(), AttributeValue::try_from(attr)?);
        }

        Ok(Node {
            name: node.name.clone(),
            op_type: node.op_type.clone(),
            domain: node.domain.clone(),
            inputs: node.input.clone(),
            outputs: node.output.clone(),
            attrs,
        })
    }
}
