//! Generation of the operator bindings.

mod dispatch;
mod ident;
mod op_fn;
#[cfg(test)]
pub(crate) mod test;

use std::{
    collections::BTreeMap,
    env,
    fs::{self, create_dir_all},
    path::{Path, PathBuf},
    sync::Arc,
};

use onnx_graph::{logger::init_log, source::render_source};
use proc_macro2::TokenStream;
use quote::quote;

use crate::{
    schema::{OpSchema, SchemaRegistry},
    Error, Result,
};
use dispatch::{gen_dispatch_fn, version_module};
use op_fn::gen_op_fn;

/// First lines of every generated file.
pub const HEADER: &str = "// Autogenerated by onnx-model-maker. Don't modify it manually.\n\n";

/// A generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub contents: String,
}

/// Generate graph-building bindings for every schema of a registry and save them to `out_dir`.
///
/// The output directory holds one `op_ver_{v}.rs` per since_version, a shared `op_helper.rs` and
/// a `mod.rs` with the dispatch functions. Declare it as a module (`mod ops;`) or include the
/// `mod.rs` from a build script output.
#[derive(Debug, Default)]
pub struct BindingGen {
    out_dir: Option<PathBuf>,
    registry: Option<Arc<SchemaRegistry>>,
    overwrite: bool,
}

impl BindingGen {
    /// Create a new `BindingGen`.
    pub fn new() -> Self {
        init_log().ok(); // Error when init multiple times are ignored.
        Self::default()
    }

    /// Set output directory.
    pub fn out_dir(&mut self, out_dir: &str) -> &mut Self {
        self.out_dir = Some(Path::new(out_dir).into());
        self
    }

    /// Set the schema registry. Defaults to the built-in catalogue.
    pub fn registry(&mut self, registry: Arc<SchemaRegistry>) -> &mut Self {
        self.registry = Some(registry);
        self
    }

    /// Wipe the output directory before generating.
    pub fn overwrite(&mut self, overwrite: bool) -> &mut Self {
        self.overwrite = overwrite;
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
        log::info!("Starting to generate operator bindings");

        if let Err(err) = self.try_run(is_build_script) {
            log::error!("Binding generation failed: {err}");
            panic!("Binding generation failed: {err}");
        }

        log::info!("Finished generating operator bindings");
    }

    fn try_run(&self, is_build_script: bool) -> Result<()> {
        let out_dir = self.resolve_out_dir(is_build_script)?;
        log::debug!("Output directory: {:?}", out_dir);

        if self.overwrite && out_dir.exists() {
            log::debug!("Removing {:?}", out_dir);
            fs::remove_dir_all(&out_dir)?;
        }
        create_dir_all(&out_dir)?;

        let registry = match &self.registry {
            Some(registry) => registry.clone(),
            None => Arc::new(SchemaRegistry::builtin()),
        };

        for file in generate(&registry)? {
            let path = out_dir.join(&file.name);
            log::debug!("Writing {:?}", path);
            fs::write(path, file.contents)?;
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
}

/// Render every binding file of `registry`.
pub fn generate(registry: &SchemaRegistry) -> Result<Vec<GeneratedFile>> {
    let mut by_version: BTreeMap<i64, Vec<&OpSchema>> = BTreeMap::new();
    let mut by_operator: BTreeMap<(&str, &str), Vec<&OpSchema>> = BTreeMap::new();

    for schema in registry.all_schemas_with_history() {
        by_version
            .entry(schema.since_version)
            .or_default()
            .push(schema);
        by_operator
            .entry((schema.name.as_str(), schema.domain.as_str()))
            .or_default()
            .push(schema);
    }
    log::debug!(
        "{} schemas, {} operators, {} versions",
        registry.len(),
        by_operator.len(),
        by_version.len()
    );

    let mut files = Vec::with_capacity(by_version.len() + 2);

    for (version, schemas) in by_version.iter() {
        let functions = schemas.iter().map(|schema| gen_op_fn(schema));
        let tokens = quote! {
            #[allow(unused_imports)]
            use onnx_model_maker::builder::{Attributes, GraphBuilder, NodeHandle, NodeInput, OutputArity};
            use onnx_model_maker::Result;

            use super::op_helper::add_inputs;

            #(#functions)*
        };
        files.push(render(format!("op_ver_{version}.rs"), tokens)?);
    }

    let versions: Vec<i64> = by_version.keys().copied().collect();
    let operators: Vec<Vec<&OpSchema>> = by_operator.into_values().collect();
    files.push(render("mod.rs".to_string(), gen_mod(&versions, &operators))?);
    files.push(render("op_helper.rs".to_string(), gen_op_helper())?);

    Ok(files)
}

fn render(name: String, tokens: TokenStream) -> Result<GeneratedFile> {
    let contents = render_source(Some(HEADER), tokens)?;
    Ok(GeneratedFile { name, contents })
}

fn gen_mod(versions: &[i64], operators: &[Vec<&OpSchema>]) -> TokenStream {
    let modules = versions.iter().map(|version| {
        let module = version_module(*version);
        let file = format!("op_ver_{version}.rs");
        quote! {
            pub mod #module {
                include!(#file);
            }
        }
    });
    let dispatchers = operators.iter().map(|versions| gen_dispatch_fn(versions));

    let mut names: Vec<&str> = operators
        .iter()
        .filter_map(|versions| versions.first())
        .map(|schema| schema.name.as_str())
        .collect();
    names.sort_unstable();
    names.dedup();

    quote! {
        #[allow(unused_imports)]
        use onnx_model_maker::builder::{
            Args, Attributes, GraphBuilder, GraphOutput, NodeHandle, NodeInput, TensorData,
        };
        use onnx_model_maker::{Error, Result};

        pub mod op_helper {
            include!("op_helper.rs");
        }

        #(#modules)*

        /// Operators with a dispatch function, by ONNX name.
        pub const OPERATORS: &[&str] = &[#(#names),*];

        /// Declare one typed graph input per sample array and return their names.
        pub fn input(graph: &mut GraphBuilder, samples: &[TensorData]) -> Vec<String> {
            graph.input(samples)
        }

        /// Declare graph outputs: arrays as typed outputs, names as untyped outputs and every
        /// output of a node. Nothing is declared when one of them is a list of names.
        pub fn output(graph: &mut GraphBuilder, outputs: Vec<NodeInput>) -> Result<()> {
            let outputs = outputs
                .into_iter()
                .map(GraphOutput::try_from)
                .collect::<Result<Vec<_>>>()?;
            graph.output(outputs);
            Ok(())
        }

        #(#dispatchers)*
    }
}

fn gen_op_helper() -> TokenStream {
    quote! {
        use onnx_model_maker::builder::{GraphBuilder, NodeInput, NodeInputs};
        use onnx_model_maker::Result;

        /// Convert the arguments of one node into its inputs.
        ///
        /// Absent arguments contribute nothing. Arrays become initializers, which only reach the
        /// graph with the node.
        pub fn add_inputs(graph: &GraphBuilder, args: Vec<Option<NodeInput>>) -> Result<NodeInputs> {
            let mut inputs = graph.node_inputs();
            for arg in args {
                inputs.add_input(arg)?;
            }
            Ok(inputs)
        }
    }
}
