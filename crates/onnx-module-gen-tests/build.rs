use std::{
    env,
    fs::create_dir_all,
    path::{Path, PathBuf},
    sync::Arc,
};

use ndarray::{arr1, Array2};
use onnx_model_maker::{
    builder::{Attributes, GraphBuilder, GraphOutput, NodeInput, OutputArity, TensorData},
    schema::SchemaRegistry,
};
use onnx_module_gen::{EmbeddingConfig, EmbeddingConfigs, ModuleGen};

const OPSET: i64 = 13;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let onnx_dir = PathBuf::from(env::var("OUT_DIR").unwrap()).join("onnx");
    create_dir_all(&onnx_dir).unwrap();

    let floats_3x2 = TensorData::from_vec(vec![1f32, 2., 3., 4., 5., 6.], vec![3, 2]);
    let floats_2x3 = TensorData::from_vec(vec![1f32, 2., 3., 4., 5., 6.], vec![2, 3]);
    let floats_2x2x2 = TensorData::from_vec((1..=8).map(|v| v as f32).collect(), vec![2, 2, 2]);
    let scalar_index = TensorData::from_vec(vec![0i64], vec![]);

    let models = [
        save_model(
            &onnx_dir,
            "gather_select",
            "Gather",
            &[floats_3x2.clone(), TensorData::from_vec(vec![0i64; 2], vec![2])],
            |inputs| inputs.iter().map(NodeInput::from).collect(),
            Attributes::new(),
        ),
        save_model(
            &onnx_dir,
            "gather_last_axis",
            "Gather",
            &[floats_2x3.clone(), TensorData::from_vec(vec![0i64; 2], vec![2])],
            |inputs| inputs.iter().map(NodeInput::from).collect(),
            Attributes::new().with("axis", -1i64),
        ),
        save_model(
            &onnx_dir,
            "gather_take",
            "Gather",
            &[floats_3x2, TensorData::from_vec(vec![0i64; 4], vec![2, 2])],
            |inputs| inputs.iter().map(NodeInput::from).collect(),
            Attributes::new(),
        ),
        save_model(
            &onnx_dir,
            "gather_scalar",
            "Gather",
            &[floats_2x3.clone(), scalar_index.clone()],
            |inputs| inputs.iter().map(NodeInput::from).collect(),
            Attributes::new(),
        ),
        save_model(
            &onnx_dir,
            "gather_scalar_vector",
            "Gather",
            &[TensorData::from_vec(vec![0i64; 3], vec![3]), scalar_index],
            |inputs| inputs.iter().map(NodeInput::from).collect(),
            Attributes::new(),
        ),
        save_model(
            &onnx_dir,
            "max",
            "Max",
            &[floats_2x3],
            |inputs| inputs.iter().map(NodeInput::from).collect(),
            Attributes::new(),
        ),
        save_model(
            &onnx_dir,
            "reduce_sum_keepdims",
            "ReduceSum",
            &[floats_2x2x2.clone()],
            |inputs| vec![NodeInput::from(&inputs[0]), arr1(&[1i64]).into()],
            Attributes::new().with("keepdims", 1i64),
        ),
        save_model(
            &onnx_dir,
            "reduce_sum_squeeze",
            "ReduceSum",
            &[floats_2x2x2.clone()],
            |inputs| vec![NodeInput::from(&inputs[0]), arr1(&[0i64, 2]).into()],
            Attributes::new().with("keepdims", 0i64),
        ),
        save_model(
            &onnx_dir,
            "reduce_sum_all",
            "ReduceSum",
            &[floats_2x2x2],
            |inputs| inputs.iter().map(NodeInput::from).collect(),
            Attributes::new().with("keepdims", 0i64),
        ),
    ];

    let mut module_gen = ModuleGen::new();
    for model in models.iter() {
        module_gen.input(model_path(model));
    }
    module_gen.out_dir("model/").run_from_script();

    // One table sized like the configuration, so its values are loaded, and one too small, so a
    // fresh table is initialized.
    let ids = TensorData::from_vec(vec![0i64; 6], vec![2, 3]);
    let table = Array2::from_shape_fn((4, 2), |(row, col)| (row * 2 + col) as f32);
    let embedding = save_model(
        &onnx_dir,
        "embedding",
        "Gather",
        &[ids.clone()],
        |inputs| vec![table.clone().into(), NodeInput::from(&inputs[0])],
        Attributes::new(),
    );
    let embedding_fresh = save_model(
        &onnx_dir,
        "embedding_fresh",
        "Gather",
        &[ids],
        |inputs| {
            let table = Array2::<f32>::zeros((5, 2));
            vec![table.into(), NodeInput::from(&inputs[0])]
        },
        Attributes::new(),
    );

    let mut pretrained = EmbeddingConfigs::default();
    pretrained.insert("Gather_0", EmbeddingConfig::new(4, 2));
    ModuleGen::new()
        .input(model_path(&embedding))
        .out_dir("model/")
        .embedding_configs(pretrained)
        .run_from_script();

    let mut fresh = EmbeddingConfigs::default();
    fresh.insert("Gather_0", EmbeddingConfig::new(10, 2));
    ModuleGen::new()
        .input(model_path(&embedding_fresh))
        .out_dir("model/")
        .embedding_configs(fresh)
        .run_from_script();
}

/// Save a graph made of one `op_type` node whose outputs are the graph outputs.
///
/// `node_inputs` maps the declared graph inputs to the inputs of the node.
fn save_model<F>(
    dir: &Path,
    name: &str,
    op_type: &str,
    samples: &[TensorData],
    node_inputs: F,
    attrs: Attributes,
) -> PathBuf
where
    F: FnOnce(&[String]) -> Vec<NodeInput>,
{
    let mut graph =
        GraphBuilder::new(Arc::new(SchemaRegistry::builtin())).with_opset_version(OPSET);
    let inputs = graph.input(samples);
    let since_version = graph.resolve_version(op_type, "").unwrap();

    let node = graph
        .add_node(
            op_type,
            "",
            since_version,
            node_inputs(&inputs).into_iter().map(Some).collect(),
            OutputArity::Declared,
            attrs,
        )
        .unwrap_or_else(|err| panic!("{name}: {err}"));
    graph.output([GraphOutput::from(&node)]);

    let path = dir.join(format!("{name}.onnx"));
    graph.save(&path).unwrap();
    path
}

fn model_path(path: &Path) -> &str {
    path.to_str().expect("OUT_DIR is valid UTF-8")
}
