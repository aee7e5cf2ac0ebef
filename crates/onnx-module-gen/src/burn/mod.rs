pub mod graph;
pub mod node;

mod codegen;
mod imports;
mod scope;
mod ty;

pub(crate) use codegen::*;
pub(crate) use imports::*;
pub use scope::*;
pub use ty::*;
