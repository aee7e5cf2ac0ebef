use std::{collections::HashMap, fs::File, path::Path};

use protobuf::Message;

use crate::ir::{Node, OnnxGraph, TensorData, ValueInfo};
use crate::protos::ModelProto;
use crate::ParseError;

/// Open an onnx file and convert it to an [OnnxGraph].
pub fn parse_onnx(onnx_path: &Path) -> Result<OnnxGraph, ParseError> {
    log::info!("Parsing ONNX file: {}", onnx_path.display());

    let mut file = File::open(onnx_path)?;
    let onnx_model: ModelProto = Message::parse_from_reader(&mut file)?;

    let graph = OnnxGraph::try_from(&onnx_model)?;
    log::debug!(
        "Parsed graph '{}' with {} nodes and {} initializers",
        graph.name,
        graph.nodes.len(),
        graph.initializers.len()
    );

    Ok(graph)
}

impl TryFrom<&ModelProto> for OnnxGraph {
    type Error = ParseError;

    fn try_from(model: &ModelProto) -> Result<Self, Self::Error> {
        let graph = &model.graph;

        let initializers = graph
            .initializer
            .iter()
            .map(|tensor| Ok((tensor.name.clone(), TensorData::try_from(tensor)?)))
            .collect::<Result<HashMap<_, _>, ParseError>>()?;

        let mut value_infos = HashMap::new();
        for value_info in graph
            .input
            .iter()
            .chain(graph.output.iter())
            .chain(graph.value_info.iter())
        {
            let info = ValueInfo::try_from(value_info)?;
            value_infos.insert(info.name.clone(), info);
        }

        // Older IR versions list initializers among the graph inputs too.
        let inputs = graph
            .input
            .iter()
            .filter(|input| !initializers.contains_key(&input.name))
            .map(|input| value_infos[&input.name].clone())
            .collect();
        let outputs = graph
            .output
            .iter()
            .map(|output| value_infos[&output.name].clone())
            .collect();

        let nodes = graph
            .node
            .iter()
            .map(Node::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let opset_version = model
            .opset_import
            .iter()
            .find(|opset| opset.domain.is_empty() || opset.domain == "ai.onnx")
            .map(|opset| opset.version);

        Ok(OnnxGraph {
            name: graph.name.clone(),
            nodes,
            inputs,
            outputs,
            value_infos,
            initializers,
            opset_version,
        })
    }
}
