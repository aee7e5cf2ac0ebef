use std::{
    env,
    fs::{self, create_dir_all},
    path::{Path, PathBuf},
};

use onnx_graph::{logger::init_log, parse_onnx, source::format_tokens, OnnxGraph};

use crate::{
    burn::{graph::ModuleGraph, node::CodegenRegistry},
    config::EmbeddingConfigs,
    Error, Result,
};

/// Generate Burn module source code from `.onnx` files and save it to the `out_dir`.
#[derive(Debug, Default)]
pub struct ModuleGen {
    out_dir: Option<PathBuf>,
    /// List of onnx files to generate source code from.
    inputs: Vec<PathBuf>,
    development: bool,
    embedding_config: Option<PathBuf>,
    embeddings: EmbeddingConfigs,
}

impl ModuleGen {
    /// Create a new `ModuleGen`.
    pub fn new() -> Self {
        init_log().ok(); // Error when init multiple times are ignored.
        Self::default()
    }

    /// Set output directory.
    pub fn out_dir(&mut self, out_dir: &str) -> &mut Self {
        self.out_dir = Some(Path::new(out_dir).into());
        self
    }

    /// Add input file.
    pub fn input(&mut self, input: &str) -> &mut Self {
        self.inputs.push(input.into());
        self
    }

    /// Set development mode.
    ///
    /// If this is set to true, the parsed graph is also saved as a `.graph.txt` file.
    pub fn development(&mut self, development: bool) -> &mut Self {
        self.development = development;
        self
    }

    /// Read the embedding configuration from a JSON file when the generation runs.
    ///
    /// Its entries are added to the ones given with [embedding_configs](Self::embedding_configs).
    pub fn embedding_config(&mut self, path: &str) -> &mut Self {
        self.embedding_config = Some(path.into());
        self
    }

    /// Set the `Gather` nodes to generate as embeddings.
    pub fn embedding_configs(&mut self, embeddings: EmbeddingConfigs) -> &mut Self {
        self.embeddings = embeddings;
        self
    }

    /// Run code generation.
    ///
    /// This function is intended to be called from `build.rs` script.
    pub fn run_from_script(&self) {
        self.run(true);
    }

    /// Run code generation.
    ///
    /// This function is intended to be called from CLI.
    pub fn run_from_cli(&self) {
        self.run(false);
    }

    fn run(&self, is_build_script: bool) {
        log::info!("Starting to convert ONNX to Burn modules");

        if let Err(err) = self.try_run(is_build_script) {
            log::error!("Module generation failed: {err}");
            panic!("Module generation failed: {err}");
        }

        log::info!("Finished converting ONNX to Burn modules");
    }

    fn try_run(&self, is_build_script: bool) -> Result<()> {
        let out_dir = self.resolve_out_dir(is_build_script)?;
        log::debug!("Output directory: {:?}", out_dir);
        create_dir_all(&out_dir)?;

        let embeddings = self.resolve_embeddings()?;
        let registry = CodegenRegistry::default();

        for input in self.inputs.iter() {
            let file_name = input
                .file_stem()
                .ok_or_else(|| Error::InvalidInput(format!("no file name in {input:?}")))?;
            let out_file = out_dir.join(file_name);

            log::info!("Input file name: {:?}", file_name);
            log::debug!("Output file: {:?}", out_file);

            self.generate_module(input, out_file, &registry, &embeddings)?;
        }

        Ok(())
    }

    fn resolve_out_dir(&self, is_build_script: bool) -> Result<PathBuf> {
        let out_dir = self
            .out_dir
            .clone()
            .ok_or_else(|| Error::InvalidInput("out_dir is not set".to_string()))?;

        if !is_build_script {
            return Ok(out_dir);
        }

        // prepend the cargo out dir if this is a build script
        let cargo_out_dir = env::var("OUT_DIR")
            .map_err(|_| Error::InvalidInput("OUT_DIR env is not set".to_string()))?;
        Ok(PathBuf::from(cargo_out_dir).join(out_dir))
    }

    fn resolve_embeddings(&self) -> Result<EmbeddingConfigs> {
        let mut embeddings = self.embeddings.clone();
        if let Some(path) = &self.embedding_config {
            for (name, config) in EmbeddingConfigs::from_file(path)? {
                embeddings.insert(name, config);
            }
        }
        log::debug!("{} embedding nodes configured", embeddings.len());

        Ok(embeddings)
    }

    /// Generate the module source of one model.
    fn generate_module(
        &self,
        input: &Path,
        out_file: PathBuf,
        registry: &CodegenRegistry,
        embeddings: &EmbeddingConfigs,
    ) -> Result<()> {
        log::info!("Generating module from {input:?}");
        log::debug!("Development mode: {:?}", self.development);

        let graph = parse_onnx(input)?;

        if self.development {
            // save the parsed graph as a debug file
            let debug_graph = format!("{graph:#?}");
            let graph_file = out_file.with_extension("graph.txt");
            log::debug!("Writing debug graph file: {graph_file:?}");
            fs::write(graph_file, debug_graph)?;
        }

        let top_comment = format!("Generated from ONNX {input:?} by onnx-module-gen");
        let code = render(&graph, registry, embeddings, Some(top_comment))?;

        let source_code_file = out_file.with_extension("rs");
        log::info!("Writing source code to {}", source_code_file.display());
        fs::write(source_code_file, code)?;

        log::info!("Module generated");
        Ok(())
    }
}

/// Generate the source of a Burn module computing `graph`.
///
/// `Gather` nodes named in `embeddings` become [Embedding] fields, the other nodes are translated
/// by the default generators.
///
/// [Embedding]: https://docs.rs/burn/latest/burn/nn/struct.Embedding.html
pub fn generate_module(graph: &OnnxGraph, embeddings: &EmbeddingConfigs) -> Result<String> {
    render(graph, &CodegenRegistry::default(), embeddings, None)
}

fn render(
    graph: &OnnxGraph,
    registry: &CodegenRegistry,
    embeddings: &EmbeddingConfigs,
    top_comment: Option<String>,
) -> Result<String> {
    let tokens = ModuleGraph::new(graph, registry, embeddings)
        .with_blank_space(true)
        .with_top_comment(top_comment)
        .codegen()?;

    Ok(format_tokens(tokens)?)
}
