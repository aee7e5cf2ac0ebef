#![warn(missing_docs)]

//! `onnx-module-gen` generates the source of a [Burn](https://burn.dev) module from an ONNX graph.
//!
//! Every node is translated by the generator registered for its operator type. `Gather` nodes
//! named in the embedding configuration become `Embedding` layers, and initializers read by the
//! forward pass become constant fields of the module.

#[macro_use]
extern crate derive_new;

/// Code generation targeting the Burn API.
#[allow(missing_docs)]
pub mod burn;
pub mod config;

mod error;
mod to_burn;

pub use config::{EmbeddingConfig, EmbeddingConfigs};
pub use error::*;
pub use to_burn::{generate_module, ModuleGen};
