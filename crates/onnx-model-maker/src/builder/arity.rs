use onnx_graph::AttributeValue;

use super::{Attributes, NodeInput};
use crate::{Error, Result};

/// Number of outputs given to a new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputArity {
    /// One output per output declared by the schema.
    Declared,
    /// An explicit number of outputs.
    Count(usize),
}

impl OutputArity {
    /// One output per entry of a `split` array input.
    pub fn from_split_input(split: Option<&NodeInput>) -> Result<Self> {
        match split {
            Some(NodeInput::Array(data)) => Ok(OutputArity::Count(data.data.len())),
            Some(other) => Err(Error::InvalidInput(format!(
                "the output count of Split needs the split sizes as an array, got {other:?}"
            ))),
            None => Err(Error::InvalidInput(
                "the output count of Split needs the split input".to_string(),
            )),
        }
    }

    /// One output per entry of the `split` attribute.
    pub fn from_split_attr(attrs: &Attributes) -> Result<Self> {
        match attrs.get("split") {
            Some(AttributeValue::Int64s(split)) => Ok(OutputArity::Count(split.len())),
            Some(AttributeValue::Int64(_)) => Ok(OutputArity::Count(1)),
            _ => Err(Error::InvalidInput(
                "the output count of Split needs the split attribute".to_string(),
            )),
        }
    }

    /// The `num_outputs` attribute.
    pub fn from_num_outputs(attrs: &Attributes) -> Result<Self> {
        match attrs.get("num_outputs").and_then(AttributeValue::as_i64) {
            Some(count) if count > 0 => Ok(OutputArity::Count(count as usize)),
            _ => Err(Error::InvalidInput(
                "the output count of Split needs a positive num_outputs attribute".to_string(),
            )),
        }
    }
}

/// Positional argument cursor of the dispatch functions.
#[derive(Debug)]
pub struct Args {
    op_type: &'static str,
    args: std::vec::IntoIter<Option<NodeInput>>,
    position: usize,
}

impl Args {
    pub fn new(op_type: &'static str, args: Vec<Option<NodeInput>>) -> Self {
        Self {
            op_type,
            args: args.into_iter(),
            position: 0,
        }
    }

    /// The next argument, which must be present.
    pub fn required(&mut self) -> Result<NodeInput> {
        let position = self.position;
        self.optional().ok_or_else(|| {
            Error::InvalidInput(format!(
                "{} expects an input at position {position}",
                self.op_type
            ))
        })
    }

    /// The next argument, absent when missing.
    pub fn optional(&mut self) -> Option<NodeInput> {
        self.position += 1;
        self.args.next().flatten()
    }

    /// Every remaining present argument.
    pub fn rest(&mut self) -> Vec<NodeInput> {
        let rest: Vec<_> = self.args.by_ref().flatten().collect();
        self.position += rest.len();
        rest
    }

    /// Fail when present arguments were left over.
    pub fn finish(mut self) -> Result<()> {
        let remaining = self.args.by_ref().flatten().count();
        if remaining > 0 {
            return Err(Error::InvalidInput(format!(
                "{} takes at most {} inputs, got {} more",
                self.op_type, self.position, remaining
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onnx_graph::TensorData;

    #[test]
    fn split_input_counts_entries() {
        let split = NodeInput::Array(TensorData::from_vec(vec![2i64, 3, 1], vec![3]));

        assert_eq!(
            OutputArity::from_split_input(Some(&split)).unwrap(),
            OutputArity::Count(3)
        );
        assert!(OutputArity::from_split_input(Some(&"split".into())).is_err());
        assert!(OutputArity::from_split_input(None).is_err());
    }

    #[test]
    fn split_attributes() {
        let attrs = Attributes::new().with("split", vec![1i64, 1]);
        assert_eq!(
            OutputArity::from_split_attr(&attrs).unwrap(),
            OutputArity::Count(2)
        );

        let attrs = Attributes::new().with("num_outputs", 4);
        assert!(OutputArity::from_split_attr(&attrs).is_err());
        assert_eq!(
            OutputArity::from_num_outputs(&attrs).unwrap(),
            OutputArity::Count(4)
        );
    }

    #[test]
    fn args_cursor() {
        let mut args = Args::new("Clip", vec![Some("x".into()), None, Some("max".into())]);

        assert_eq!(args.required().unwrap(), NodeInput::from("x"));
        assert_eq!(args.optional(), None);
        assert_eq!(args.optional(), Some(NodeInput::from("max")));
        args.finish().unwrap();
    }

    #[test]
    fn args_reject_missing_and_extra() {
        let mut args = Args::new("Relu", vec![None]);
        assert!(matches!(args.required(), Err(Error::InvalidInput(_))));

        let mut args = Args::new("Relu", vec![Some("x".into()), Some("y".into())]);
        args.required().unwrap();
        assert!(matches!(args.finish(), Err(Error::InvalidInput(_))));
    }
}
