//! Operator schemas: the versioned catalogue of operator signatures the bindings are generated
//! from and the nodes are checked against.

mod checker;
mod registry;

pub use registry::*;

use serde::{Deserialize, Serialize};

/// How often a formal parameter may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormalParameterOption {
    Single,
    Optional,
    Variadic,
}

/// A declared input or output of an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormalParameter {
    pub name: String,
    pub option: FormalParameterOption,
}

/// Type of a declared attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Float,
    Int,
    String,
    Tensor,
    Graph,
    SparseTensor,
    Floats,
    Ints,
    Strings,
    Tensors,
    Graphs,
    SparseTensors,
    TypeProto,
    TypeProtos,
}

/// A declared attribute of an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AttributeType,
    #[serde(default)]
    pub required: bool,
}

/// Signature of one operator at one operator set version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpSchema {
    pub name: String,
    #[serde(default)]
    pub domain: String,
    pub since_version: i64,
    pub min_input: usize,
    pub max_input: usize,
    pub min_output: usize,
    pub max_output: usize,
    pub inputs: Vec<FormalParameter>,
    pub outputs: Vec<FormalParameter>,
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
}

impl OpSchema {
    /// The declared attribute named `name`.
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Whether the schema declares an input named `name`.
    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|input| input.name == name)
    }
}
