#![warn(missing_docs)]
#![allow(clippy::upper_case_acronyms)]

//! `onnx-model-maker` builds ONNX models from Rust. A [GraphBuilder](builder::GraphBuilder)
//! checks every node against its operator schema before adding it, and [BindingGen] generates
//! one typed function per operator schema version on top of it, plus a dispatch function per
//! operator resolving the version at the opset of the graph.

/// The graph under construction the generated bindings drive.
pub mod builder;

/// Operator schemas and their registry.
pub mod schema;

mod codegen;
mod error;

pub use codegen::{generate, BindingGen, GeneratedFile, HEADER};
pub use error::*;
