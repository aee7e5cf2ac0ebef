use onnx_model_maker::BindingGen;

fn main() {
    // Bindings for the built-in schema catalogue.
    BindingGen::new().out_dir("ops/").run_from_script();
}
