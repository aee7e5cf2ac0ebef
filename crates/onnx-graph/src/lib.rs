#![warn(missing_docs)]
#![allow(clippy::upper_case_acronyms)]

//! `onnx-graph` owns the ONNX protobuf definitions and a small typed view over them (tensor data,
//! attributes, value info and nodes) shared by the ONNX code generators of this workspace. It
//! also carries their logging setup and source rendering.

#[macro_use]
extern crate derive_new;

/// Generated ONNX protobuf messages.
#[allow(missing_docs)]
pub mod protos {
    include!(concat!(env!("OUT_DIR"), "/onnx-protos/mod.rs"));

    pub use onnx::*;
}

mod error;
mod from_onnx;
pub mod helper;
pub mod ir;
pub mod logger;
mod proto_conversion;
pub mod source;

pub use error::*;
pub use from_onnx::parse_onnx;
pub use ir::*;
pub use proto_conversion::{element_type_from_proto, element_type_to_proto};
