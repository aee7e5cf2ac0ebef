use onnx_module_gen::ModuleGen;

/// Generates a Burn module from an ONNX model
fn main() {
    let mut args = std::env::args().skip(1);
    let onnx_file = args.next().expect("No input file provided");
    let out_dir = args.next().expect("No output directory provided");

    let mut generator = ModuleGen::new();
    generator
        .input(onnx_file.as_str())
        .development(true)
        .out_dir(out_dir.as_str());

    if let Some(embedding_config) = args.next() {
        generator.embedding_config(embedding_config.as_str());
    }

    generator.run_from_cli();
}
