use std::collections::BTreeMap;

use onnx_graph::AttributeValue;

/// Keyword attributes of a node, ordered by name.
///
/// ```
/// use onnx_model_maker::builder::Attributes;
///
/// let attrs = Attributes::new().with("axes", vec![1i64]).with("keepdims", 1);
/// assert_eq!(attrs.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(BTreeMap<String, AttributeValue>);

impl Attributes {
    /// Create an empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing any previous value.
    pub fn with<S: Into<String>, V: Into<AttributeValue>>(mut self, name: S, value: V) -> Self {
        self.insert(name, value);
        self
    }

    /// Set an attribute in place.
    pub fn insert<S: Into<String>, V: Into<AttributeValue>>(&mut self, name: S, value: V) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Attributes> for onnx_graph::Attributes {
    fn from(attrs: Attributes) -> Self {
        attrs.0
    }
}

impl<S: Into<String>, V: Into<AttributeValue>> FromIterator<(S, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (S, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}
