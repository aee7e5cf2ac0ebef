use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Size of the lookup table a `Gather` node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct EmbeddingConfig {
    /// Vocabulary size.
    pub num_embeddings: usize,
    /// Width of an embedding vector.
    pub embedding_dim: usize,
}

/// `Gather` nodes to generate as embeddings, by node name.
///
/// ```json
/// { "Gather_0": { "num_embeddings": 1000, "embedding_dim": 64 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingConfigs(HashMap<String, EmbeddingConfig>);

impl EmbeddingConfigs {
    /// Parse the configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read the configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading embedding configuration from {}", path.display());

        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Mark the node `name` as an embedding.
    pub fn insert<S: Into<String>>(&mut self, name: S, config: EmbeddingConfig) {
        self.0.insert(name.into(), config);
    }

    /// The configuration of node `name`, if it is an embedding.
    pub fn get(&self, name: &str) -> Option<&EmbeddingConfig> {
        self.0.get(name)
    }

    /// Number of configured nodes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no node is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for EmbeddingConfigs {
    type Item = (String, EmbeddingConfig);
    type IntoIter = std::collections::hash_map::IntoIter<String, EmbeddingConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
