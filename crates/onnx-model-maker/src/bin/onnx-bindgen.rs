use std::sync::Arc;

use onnx_model_maker::{schema::SchemaRegistry, BindingGen};

/// Generates the operator bindings into a directory
fn main() {
    let mut args = std::env::args().skip(1);
    let out_dir = args.next().expect("No output directory provided");

    let mut overwrite = false;
    let mut schemas = None;
    for arg in args {
        match arg.as_str() {
            "--overwrite" => overwrite = true,
            path => schemas = Some(path.to_string()),
        }
    }

    let mut bindgen = BindingGen::new();
    bindgen.out_dir(out_dir.as_str()).overwrite(overwrite);

    if let Some(path) = schemas {
        let registry = SchemaRegistry::from_file(&path)
            .unwrap_or_else(|err| panic!("Failed to load schemas from {path}: {err}"));
        bindgen.registry(Arc::new(registry));
    }

    bindgen.run_from_cli();
}
