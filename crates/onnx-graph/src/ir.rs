use core::fmt;
use half::f16;
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Formatter,
};
use strum_macros::{Display, EnumString};

use crate::{protos::GraphProto, ParseError};

pub type Shape = Vec<usize>;

/// Element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum ElementType {
    Float16,
    Float32,
    Float64,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Bool,
    String,
}

impl ElementType {
    /// Whether the element type is a floating point type.
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            ElementType::Float16 | ElementType::Float32 | ElementType::Float64
        )
    }

    /// Whether the element type is a signed or unsigned integer type.
    pub fn is_int(&self) -> bool {
        matches!(
            self,
            ElementType::Int8
                | ElementType::Int16
                | ElementType::Int32
                | ElementType::Int64
                | ElementType::Uint8
                | ElementType::Uint16
        )
    }
}

/// Typed tensor payload.
///
/// Small integer types (8 and 16 bits) are widened to `Int32`, the way ONNX stores them.
#[derive(Clone, PartialEq)]
pub enum Data {
    Float16(Vec<f16>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Bool(Vec<bool>),
    String(Vec<String>),
}

impl Data {
    /// Number of stored elements.
    pub fn len(&self) -> usize {
        match self {
            Data::Float16(v) => v.len(),
            Data::Float32(v) => v.len(),
            Data::Float64(v) => v.len(),
            Data::Int32(v) => v.len(),
            Data::Int64(v) => v.len(),
            Data::Bool(v) => v.len(),
            Data::String(v) => v.len(),
        }
    }

    /// Whether no element is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A dense tensor: element type, shape and payload.
#[derive(Debug, Clone, PartialEq, new)]
pub struct TensorData {
    pub elem_type: ElementType,
    pub shape: Shape,
    pub data: Data,
}

/// Rust element types that can back a [TensorData].
pub trait Element: Sized {
    /// ONNX element type of `Self`.
    const ELEM_TYPE: ElementType;

    /// Wrap a vector of elements into the matching payload variant.
    fn into_data(values: Vec<Self>) -> Data;
}

macro_rules! element {
    ($ty:ty, $elem:ident, $variant:ident) => {
        impl Element for $ty {
            const ELEM_TYPE: ElementType = ElementType::$elem;

            fn into_data(values: Vec<Self>) -> Data {
                Data::$variant(values)
            }
        }
    };
    ($ty:ty, $elem:ident, $variant:ident, $cast:ty) => {
        impl Element for $ty {
            const ELEM_TYPE: ElementType = ElementType::$elem;

            fn into_data(values: Vec<Self>) -> Data {
                Data::$variant(values.into_iter().map(|v| v as $cast).collect())
            }
        }
    };
}

element!(f16, Float16, Float16);
element!(f32, Float32, Float32);
element!(f64, Float64, Float64);
element!(i32, Int32, Int32);
element!(i64, Int64, Int64);
element!(bool, Bool, Bool);
element!(i8, Int8, Int32, i32);
element!(i16, Int16, Int32, i32);
element!(u8, Uint8, Int32, i32);
element!(u16, Uint16, Int32, i32);

impl TensorData {
    /// Create tensor data from a flat vector of elements and a shape.
    pub fn from_vec<E: Element>(values: Vec<E>, shape: Shape) -> Self {
        Self::new(E::ELEM_TYPE, shape, E::into_data(values))
    }

    /// Rank of the tensor.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements implied by the shape (a scalar has one).
    pub fn num_elements(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether the payload length agrees with the shape.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.num_elements()
    }

    /// Copy the values out as `i64`, for integer tensors only.
    pub fn to_i64_vec(&self) -> Result<Vec<i64>, ParseError> {
        match &self.data {
            Data::Int64(v) => Ok(v.clone()),
            Data::Int32(v) => Ok(v.iter().map(|v| *v as i64).collect()),
            _ => Err(ParseError::NotInteger(self.elem_type)),
        }
    }
}

/// Truncate the vector display for debug display
fn trunc<T: fmt::Display>(v: &[T]) -> String {
    const BEGIN_INDEX: usize = 0;
    const MAX_LEN: usize = 5;
    let mut s = String::new();
    s.push('[');
    for (i, item) in v.iter().enumerate() {
        if i > BEGIN_INDEX {
            s.push_str(", ");
        }
        s.push_str(&format!("{}", item));
        if i > MAX_LEN {
            s.push_str(", ...");
            break;
        }
    }
    s.push(']');
    s
}

/// Shorten the tensor data for debug display
impl fmt::Debug for Data {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Data::Float16(v) => write!(f, "Float16({})", trunc(v)),
            Data::Float32(v) => write!(f, "Float32({})", trunc(v)),
            Data::Float64(v) => write!(f, "Float64({})", trunc(v)),
            Data::Int32(v) => write!(f, "Int32({})", trunc(v)),
            Data::Int64(v) => write!(f, "Int64({})", trunc(v)),
            Data::Bool(v) => write!(f, "Bool({})", trunc(v)),
            Data::String(v) => write!(f, "String({})", trunc(v)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Float32(f32),
    Int64(i64),
    String(String),
    Tensor(TensorData),
    Graph(GraphProto),
    Float32s(Vec<f32>),
    Int64s(Vec<i64>),
    Strings(Vec<String>),
    Tensors(Vec<TensorData>),
}

impl AttributeValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            AttributeValue::Float32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64s(&self) -> Option<&[i64]> {
        match self {
            AttributeValue::Int64s(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32s(&self) -> Option<&[f32]> {
        match self {
            AttributeValue::Float32s(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_tensor(&self) -> Option<&TensorData> {
        match self {
            AttributeValue::Tensor(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! attribute_from {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for AttributeValue {
            fn from(value: $ty) -> Self {
                AttributeValue::$variant(value)
            }
        }
    };
    ($ty:ty, $variant:ident, |$v:ident| $convert:expr) => {
        impl From<$ty> for AttributeValue {
            fn from($v: $ty) -> Self {
                AttributeValue::$variant($convert)
            }
        }
    };
}

attribute_from!(f32, Float32);
attribute_from!(i64, Int64);
attribute_from!(String, String);
attribute_from!(TensorData, Tensor);
attribute_from!(GraphProto, Graph);
attribute_from!(Vec<f32>, Float32s);
attribute_from!(Vec<i64>, Int64s);
attribute_from!(Vec<String>, Strings);
attribute_from!(Vec<TensorData>, Tensors);
attribute_from!(f64, Float32, |v| v as f32);
attribute_from!(i32, Int64, |v| v as i64);
attribute_from!(usize, Int64, |v| v as i64);
attribute_from!(bool, Int64, |v| v as i64);
attribute_from!(&str, String, |v| v.to_string());
attribute_from!(Vec<i32>, Int64s, |v| v.into_iter().map(i64::from).collect());
attribute_from!(Vec<&str>, Strings, |v| v.into_iter().map(str::to_string).collect());

/// Node attributes, ordered by name like the upstream node helper does.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// One dimension of a declared tensor shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dim {
    Static(usize),
    Symbolic(String),
}

/// Declared type and shape of a named tensor.
#[derive(Debug, Clone, PartialEq, new)]
pub struct ValueInfo {
    pub name: String,
    pub elem_type: Option<ElementType>,
    pub dims: Option<Vec<Dim>>,
}

impl ValueInfo {
    /// Rank of the tensor when the shape is declared.
    pub fn rank(&self) -> Option<usize> {
        self.dims.as_ref().map(|dims| dims.len())
    }

    /// Static shape when every dimension is known.
    pub fn static_shape(&self) -> Option<Shape> {
        self.dims
            .as_ref()?
            .iter()
            .map(|dim| match dim {
                Dim::Static(size) => Some(*size),
                Dim::Symbolic(_) => None,
            })
            .collect()
    }
}

/// One operation of the computation graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub op_type: String,
    pub domain: String,
    /// Input tensor names; an empty name marks an absent optional input.
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub attrs: Attributes,
}

impl Node {
    /// Name of the input at `index`, `None` when it is absent.
    pub fn input(&self, index: usize) -> Option<&str> {
        self.inputs
            .get(index)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Name of the output at `index`.
    pub fn output(&self, index: usize) -> Option<&str> {
        self.outputs.get(index).map(String::as_str)
    }

    /// Number of inputs that are present.
    pub fn num_present_inputs(&self) -> usize {
        self.inputs.iter().filter(|name| !name.is_empty()).count()
    }
}

/// A decoded ONNX graph with its lookup tables.
#[derive(Debug, Clone, Default)]
pub struct OnnxGraph {
    pub name: String,
    pub nodes: Vec<Node>,
    /// Graph inputs fed at run time (initializers excluded).
    pub inputs: Vec<ValueInfo>,
    pub outputs: Vec<ValueInfo>,
    /// Declared shape/type per tensor name, for inputs, outputs and intermediate values.
    pub value_infos: HashMap<String, ValueInfo>,
    /// Constant tensors per name.
    pub initializers: HashMap<String, TensorData>,
    /// Version of the default-domain operator set, when imported.
    pub opset_version: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tensor_data_from_vec_widens_small_ints() {
        let data = TensorData::from_vec(vec![1u8, 2, 3], vec![3]);

        assert_eq!(data.elem_type, ElementType::Uint8);
        assert_eq!(data.data, Data::Int32(vec![1, 2, 3]));
        assert_eq!(data.to_i64_vec().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn tensor_data_consistency() {
        let data = TensorData::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], vec![2, 2]);
        assert!(data.is_consistent());

        let data = TensorData::from_vec(vec![1.0f32, 2.0, 3.0], vec![2, 2]);
        assert!(!data.is_consistent());
    }

    #[test]
    fn float_data_is_not_integer() {
        let data = TensorData::from_vec(vec![1.0f32], vec![1]);
        assert!(matches!(
            data.to_i64_vec(),
            Err(ParseError::NotInteger(ElementType::Float32))
        ));
    }

    #[test]
    fn debug_truncates_long_payloads() {
        let data = Data::Int64((0..20).collect());
        assert_eq!(format!("{data:?}"), "Int64([0, 1, 2, 3, 4, 5, 6, ...])");
    }

    #[test]
    fn missing_optional_inputs_are_absent() {
        let node = Node {
            name: "clip".to_string(),
            op_type: "Clip".to_string(),
            domain: String::new(),
            inputs: vec!["x".to_string(), String::new(), "max".to_string()],
            outputs: vec!["y".to_string()],
            attrs: Attributes::new(),
        };

        assert_eq!(node.input(0), Some("x"));
        assert_eq!(node.input(1), None);
        assert_eq!(node.input(2), Some("max"));
        assert_eq!(node.input(3), None);
        assert_eq!(node.num_present_inputs(), 2);
    }

    #[test]
    fn static_shape_requires_known_dims() {
        let info = ValueInfo::new(
            "x".to_string(),
            Some(ElementType::Float32),
            Some(vec![Dim::Symbolic("batch".to_string()), Dim::Static(3)]),
        );
        assert_eq!(info.rank(), Some(2));
        assert_eq!(info.static_shape(), None);

        let info = ValueInfo::new(
            "x".to_string(),
            None,
            Some(vec![Dim::Static(2), Dim::Static(3)]),
        );
        assert_eq!(info.static_shape(), Some(vec![2, 3]));
    }
}
