use std::collections::HashMap;

use super::{GatherCodegen, MaxCodegen, OpCodegen, ReduceSumCodegen};
use crate::{Error, Result};

/// Generators by ONNX operator type.
#[derive(Debug)]
pub struct CodegenRegistry {
    generators: HashMap<&'static str, Box<dyn OpCodegen>>,
}

impl Default for CodegenRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(GatherCodegen);
        registry.register(MaxCodegen);
        registry.register(ReduceSumCodegen);
        registry
    }
}

impl CodegenRegistry {
    /// A registry without any generator.
    pub fn empty() -> Self {
        Self {
            generators: HashMap::new(),
        }
    }

    /// Add a generator, replacing the one registered for the same operator type.
    pub fn register<G: OpCodegen + 'static>(&mut self, generator: G) {
        self.generators.insert(generator.op_type(), Box::new(generator));
    }

    /// The generator of `op_type`.
    pub fn get(&self, op_type: &str) -> Result<&dyn OpCodegen> {
        self.generators
            .get(op_type)
            .map(|generator| generator.as_ref())
            .ok_or_else(|| Error::UnsupportedOperator(op_type.to_string()))
    }

    /// Supported operator types, sorted.
    pub fn op_types(&self) -> Vec<&'static str> {
        let mut op_types: Vec<_> = self.generators.keys().copied().collect();
        op_types.sort_unstable();
        op_types
    }
}
