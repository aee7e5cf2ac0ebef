use onnx_graph::OnnxGraph;
use proc_macro2::TokenStream;
use quote::quote;

use crate::{
    burn::{
        node::{register_uses, CodegenContext, CodegenRegistry},
        BurnImports, TensorKind, TensorType,
    },
    config::EmbeddingConfigs,
    Error, Result,
};

/// Burn module source generated from an ONNX graph.
#[derive(Debug)]
pub struct ModuleGraph<'a> {
    graph: &'a OnnxGraph,
    registry: &'a CodegenRegistry,
    embeddings: &'a EmbeddingConfigs,
    top_comment: Option<String>,
    blank_space: bool,
}

impl<'a> ModuleGraph<'a> {
    pub fn new(
        graph: &'a OnnxGraph,
        registry: &'a CodegenRegistry,
        embeddings: &'a EmbeddingConfigs,
    ) -> Self {
        Self {
            graph,
            registry,
            embeddings,
            top_comment: None,
            blank_space: false,
        }
    }

    /// Add a comment at the top of the generated file.
    pub fn with_top_comment(mut self, top_comment: Option<String>) -> Self {
        self.top_comment = top_comment;
        self
    }

    /// Separate the items of the generated file with blank lines.
    pub fn with_blank_space(mut self, blank_space: bool) -> Self {
        self.blank_space = blank_space;
        self
    }

    /// Generate the module. The nodes must be in execution order.
    pub fn codegen(&self) -> Result<TokenStream> {
        let graph = self.graph;
        let mut ctx = CodegenContext::new(graph, self.embeddings);

        let inputs = graph
            .inputs
            .iter()
            .map(|input| tensor_type(&mut ctx, &input.name))
            .collect::<Result<Vec<_>>>()?;
        graph.outputs.iter().for_each(|output| {
            ctx.tensor(&output.name);
        });
        register_uses(&mut ctx, &graph.nodes, graph.nodes.len());

        let mut imports = BurnImports::default();
        let mut fields = Vec::new();
        let mut init = quote! {};
        let mut forward = quote! {};

        for (position, node) in graph.nodes.iter().enumerate() {
            if !matches!(node.domain.as_str(), "" | "ai.onnx") {
                return Err(Error::UnsupportedOperator(format!(
                    "{}.{}",
                    node.domain, node.op_type
                )));
            }
            let generator = self.registry.get(&node.op_type)?;
            log::debug!("Generating node {} ({})", node.name, node.op_type);

            ctx.at(position);
            let code = generator.gen(node, &mut ctx)?;

            fields.extend(code.fields);
            init.extend(code.init);
            forward.extend(code.forward);
            code.imports
                .into_iter()
                .for_each(|path| imports.register(path));
        }

        // Outputs without a declared type take the one of the node producing them.
        let outputs = graph
            .outputs
            .iter()
            .map(|output| tensor_type(&mut ctx, &output.name))
            .collect::<Result<Vec<_>>>()?;

        ctx.at(graph.nodes.len());
        let returned = graph
            .outputs
            .iter()
            .map(|output| ctx.graph_output(&output.name))
            .collect::<Result<Vec<_>>>()?;

        let mut constants_init = quote! {};
        for constant in ctx.constants() {
            fields.push((constant.name.clone(), constant.ty()));
            constants_init.extend(constant.init());
        }

        let field_names: Vec<_> = fields.iter().map(|(name, _)| name).collect();
        let field_types: Vec<_> = fields.iter().map(|(_, ty)| ty).collect();

        let input_defs = inputs.iter().map(|input| {
            let name = &input.name;
            let ty = input.ty();
            quote! { #name: #ty }
        });
        let (output_ty, output_expr) = match (outputs.as_slice(), returned.as_slice()) {
            ([output], [returned]) => (output.ty(), returned.clone()),
            _ => {
                let types = outputs.iter().map(TensorType::ty);
                (quote! { (#(#types),*) }, quote! { (#(#returned),*) })
            }
        };

        let top_comment = match &self.top_comment {
            Some(comment) => quote! { _comment_!(#comment); },
            None => quote! {},
        };
        let blank = if self.blank_space {
            quote! { _blank_!(); }
        } else {
            quote! {}
        };
        let imports = imports.codegen();

        Ok(quote! {
            #top_comment
            #imports
            #blank

            #[derive(Module, Debug)]
            pub struct Model<B: Backend> {
                #(#field_names: #field_types,)*
                phantom: core::marker::PhantomData<B>,
                device: burn::module::Ignored<B::Device>,
            }
            #blank

            impl<B: Backend> Model<B> {
                #[allow(unused_variables)]
                pub fn new(device: &B::Device) -> Self {
                    #constants_init
                    #init

                    Self {
                        #(#field_names,)*
                        phantom: core::marker::PhantomData,
                        device: burn::module::Ignored(device.clone()),
                    }
                }
                #blank

                #[allow(clippy::let_and_return, clippy::approx_constant)]
                pub fn forward(&self, #(#input_defs),*) -> #output_ty {
                    #forward

                    #output_expr
                }
            }
        })
    }
}

/// Type of a graph input or output. Scalars become rank 1 tensors.
fn tensor_type(ctx: &mut CodegenContext, name: &str) -> Result<TensorType> {
    let rank = ctx
        .rank(name)
        .ok_or_else(|| Error::MissingValueInfo(name.to_string()))?;
    let kind = match ctx.elem_type(name) {
        Some(elem_type) => TensorKind::from_elem_type(elem_type),
        None => {
            log::warn!("No element type for {name}, assuming float");
            TensorKind::Float
        }
    };

    Ok(TensorType::new(ctx.tensor(name), rank.max(1), kind))
}
