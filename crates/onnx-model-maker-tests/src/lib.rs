//! The operator bindings generated from the built-in schema catalogue.

#[allow(clippy::too_many_arguments)]
pub mod ops {
    include!(concat!(env!("OUT_DIR"), "/ops/mod.rs"));
}
