use std::{path::Path, sync::Arc};

use ndarray::{arr1, Array2};
use onnx_graph::parse_onnx;
use onnx_model_maker::{
    builder::{Attributes, GraphBuilder, GraphOutput, NodeInput, OutputArity, TensorData},
    schema::SchemaRegistry,
};
use onnx_module_gen::{generate_module, EmbeddingConfigs, Error, ModuleGen};

/// `ReduceSum(Gather(table, ids), axes)` with a 4x2 table and [2, 3] ids.
fn save_model(path: &Path, axes: NodeInput) {
    let mut graph = GraphBuilder::new(Arc::new(SchemaRegistry::builtin())).with_opset_version(13);
    let inputs = graph.input(&[TensorData::from_vec(vec![0i64; 6], vec![2, 3])]);

    let table = Array2::from_shape_vec((4, 2), (0..8).map(|v| v as f32).collect()).unwrap();
    let gather = graph
        .add_node(
            "Gather",
            "",
            13,
            vec![Some(table.into()), Some(inputs[0].as_str().into())],
            OutputArity::Declared,
            Attributes::new(),
        )
        .unwrap();
    let reduce = graph
        .add_node(
            "ReduceSum",
            "",
            13,
            vec![Some((&gather).into()), Some(axes)],
            OutputArity::Declared,
            Attributes::new().with("keepdims", 0),
        )
        .unwrap();
    graph.output([GraphOutput::from(&reduce)]);

    graph.save(path).unwrap();
}

#[test]
fn module_from_a_built_model() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("model.onnx");
    save_model(&model, arr1(&[2i64]).into());

    let out_dir = dir.path().join("out");
    ModuleGen::new()
        .input(model.to_str().unwrap())
        .out_dir(out_dir.to_str().unwrap())
        .run_from_cli();

    let code = std::fs::read_to_string(out_dir.join("model.rs")).unwrap();
    assert!(code.contains("Generated from ONNX"));
    assert!(code.contains("pub struct Model<B: Backend>"));
    assert!(code.contains("t_initializer_0: burn::module::Param<Tensor<B, 2>>"));
    assert!(code.contains(".take::<2, 3>(0, t_input_0)"));
    assert!(code.contains(".sum_dim(2).squeeze_dims::<2>(&[2])"));
    assert!(code.contains("pub fn forward(&self, t_input_0: Tensor<B, 2, Int>) -> Tensor<B, 2>"));
    assert!(!code.contains("Embedding"));
    assert!(!out_dir.join("model.graph.txt").exists());
}

#[test]
fn embedding_from_a_configuration_file() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("model.onnx");
    save_model(&model, arr1(&[2i64]).into());

    let config = dir.path().join("embeddings.json");
    std::fs::write(
        &config,
        r#"{ "Gather_0": { "num_embeddings": 4, "embedding_dim": 2 } }"#,
    )
    .unwrap();

    let out_dir = dir.path().join("out");
    ModuleGen::new()
        .input(model.to_str().unwrap())
        .out_dir(out_dir.to_str().unwrap())
        .embedding_config(config.to_str().unwrap())
        .development(true)
        .run_from_cli();

    let code = std::fs::read_to_string(out_dir.join("model.rs")).unwrap();
    assert!(code.contains("use burn::nn::Embedding;"));
    assert!(code.contains("gather_0: Embedding<B>"));
    assert!(code.contains("self.gather_0.forward(t_input_0)"));
    assert!(!code.contains("t_initializer_0: burn::module::Param"));
    assert!(out_dir.join("model.graph.txt").exists());
}

#[test]
fn dynamic_axes_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("model.onnx");
    save_model(&model, "axes".into());

    let graph = parse_onnx(&model).unwrap();
    let result = generate_module(&graph, &EmbeddingConfigs::default());

    match result {
        Err(Error::UnresolvedDynamicValue { node, tensor }) => {
            assert_eq!(node, "ReduceSum_0");
            assert_eq!(tensor, "axes");
        }
        other => panic!("expected an unresolved value, got {other:?}"),
    }
}

#[test]
#[should_panic(expected = "Module generation failed")]
fn missing_model_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();

    ModuleGen::new()
        .input(dir.path().join("missing.onnx").to_str().unwrap())
        .out_dir(dir.path().to_str().unwrap())
        .run_from_cli();
}
