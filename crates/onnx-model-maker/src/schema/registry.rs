use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use super::OpSchema;
use crate::Result;

/// Catalogue compiled into the crate. Any dump in the same format can replace it.
const BUILTIN_SCHEMAS: &str = include_str!("defs.json");

/// Versioned operator schemas, enumerable and searchable by name and version.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    /// Sorted by name, domain and since_version.
    schemas: Vec<OpSchema>,
    /// (domain, name) -> indices into `schemas`, by increasing since_version.
    index: BTreeMap<(String, String), Vec<usize>>,
}

impl SchemaRegistry {
    /// Create a registry from a list of schemas.
    pub fn new(mut schemas: Vec<OpSchema>) -> Self {
        schemas.sort_by(|a, b| {
            (&a.name, &a.domain, a.since_version).cmp(&(&b.name, &b.domain, b.since_version))
        });
        schemas.dedup_by(|a, b| {
            a.name == b.name && a.domain == b.domain && a.since_version == b.since_version
        });

        let mut index: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();
        for (i, schema) in schemas.iter().enumerate() {
            index
                .entry((schema.domain.clone(), schema.name.clone()))
                .or_default()
                .push(i);
        }

        Self { schemas, index }
    }

    /// The catalogue shipped with the crate.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_SCHEMAS).expect("Built-in schema catalogue should be valid")
    }

    /// Parse a JSON array of schemas.
    pub fn from_json(json: &str) -> Result<Self> {
        let schemas: Vec<OpSchema> = serde_json::from_str(json)?;
        Ok(Self::new(schemas))
    }

    /// Read a JSON array of schemas from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading operator schemas from {}", path.display());

        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Every schema of every operator, all versions included.
    pub fn all_schemas_with_history(&self) -> &[OpSchema] {
        &self.schemas
    }

    /// The schema introduced exactly at `since_version`.
    pub fn get(&self, name: &str, since_version: i64, domain: &str) -> Option<&OpSchema> {
        self.versions_of(name, domain)
            .find(|schema| schema.since_version == since_version)
    }

    /// The schema in effect at `max_inclusive_version`: the greatest since_version not above it.
    pub fn resolve(
        &self,
        name: &str,
        max_inclusive_version: i64,
        domain: &str,
    ) -> Option<&OpSchema> {
        self.versions_of(name, domain)
            .take_while(|schema| schema.since_version <= max_inclusive_version)
            .last()
    }

    /// All since_version values of an operator, increasing.
    pub fn since_versions(&self, name: &str, domain: &str) -> Vec<i64> {
        self.versions_of(name, domain)
            .map(|schema| schema.since_version)
            .collect()
    }

    /// The distinct operator names, sorted.
    pub fn operator_names(&self) -> BTreeSet<&str> {
        self.schemas.iter().map(|schema| schema.name.as_str()).collect()
    }

    /// Highest since_version known to the registry, the default operator set version.
    pub fn latest_version(&self) -> i64 {
        self.schemas
            .iter()
            .map(|schema| schema.since_version)
            .max()
            .unwrap_or(1)
    }

    /// Number of schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry holds no schema.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    fn versions_of<'a>(&'a self, name: &str, domain: &str) -> impl Iterator<Item = &'a OpSchema> {
        self.index
            .get(&(domain.to_string(), name.to_string()))
            .into_iter()
            .flatten()
            .map(|i| &self.schemas[*i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeType;

    #[test]
    fn builtin_catalogue_loads() {
        let registry = SchemaRegistry::builtin();

        assert!(!registry.is_empty());
        assert!(registry.operator_names().contains("ReduceSum"));
        assert_eq!(registry.latest_version(), 21);
    }

    #[test]
    fn resolve_picks_greatest_version_not_above_target() {
        let registry = SchemaRegistry::builtin();

        assert_eq!(registry.since_versions("Split", ""), vec![1, 2, 11, 13, 18]);
        assert_eq!(registry.resolve("Split", 12, "").unwrap().since_version, 11);
        assert_eq!(registry.resolve("Split", 13, "").unwrap().since_version, 13);
        assert_eq!(registry.resolve("Split", 17, "").unwrap().since_version, 13);
        assert_eq!(registry.resolve("Split", 21, "").unwrap().since_version, 18);
        assert!(registry.resolve("Where", 8, "").is_none());
    }

    #[test]
    fn exact_lookup() {
        let registry = SchemaRegistry::builtin();

        let schema = registry.get("ReduceSum", 13, "").unwrap();
        assert_eq!(schema.min_input, 1);
        assert_eq!(schema.max_input, 2);
        assert!(registry.get("ReduceSum", 12, "").is_none());
        assert!(registry.get("ReduceSum", 13, "ai.onnx.ml").is_none());
    }

    #[test]
    fn duplicates_are_dropped() {
        let json = r#"[
            {"name": "Foo", "since_version": 1, "min_input": 1, "max_input": 1,
             "min_output": 1, "max_output": 1,
             "inputs": [{"name": "X", "option": "single"}],
             "outputs": [{"name": "Y", "option": "single"}]},
            {"name": "Foo", "since_version": 1, "min_input": 1, "max_input": 1,
             "min_output": 1, "max_output": 1,
             "inputs": [{"name": "X", "option": "single"}],
             "outputs": [{"name": "Y", "option": "single"}]}
        ]"#;
        let registry = SchemaRegistry::from_json(json).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.latest_version(), 1);
        assert!(registry.get("Foo", 1, "").unwrap().attributes.is_empty());
    }

    #[test]
    fn entries_of_a_full_catalogue_dump() {
        let json = r#"[
            {"name": "Optional", "domain": "", "since_version": 15, "min_input": 0,
             "max_input": 1, "min_output": 1, "max_output": 1,
             "inputs": [{"name": "input", "option": "optional"}],
             "outputs": [{"name": "output", "option": "single"}],
             "attributes": [{"name": "type", "type": "type_proto", "required": false}]},
            {"name": "Normalizer", "domain": "ai.onnx.ml", "since_version": 1, "min_input": 1,
             "max_input": 1, "min_output": 1, "max_output": 1,
             "inputs": [{"name": "X", "option": "single"}],
             "outputs": [{"name": "Y", "option": "single"}],
             "attributes": [{"name": "norm", "type": "string", "required": false}]}
        ]"#;
        let registry = SchemaRegistry::from_json(json).unwrap();

        let optional = registry.get("Optional", 15, "").unwrap();
        assert_eq!(optional.attributes[0].ty, AttributeType::TypeProto);
        assert!(registry.get("Normalizer", 1, "").is_none());
        assert_eq!(
            registry.resolve("Normalizer", 3, "ai.onnx.ml").unwrap().since_version,
            1
        );
    }
}
