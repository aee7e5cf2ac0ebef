mod gather;
mod max;
mod reduce_sum;
mod registry;

#[cfg(test)]
pub(crate) mod test;

pub use gather::GatherCodegen;
pub use max::MaxCodegen;
pub use reduce_sum::ReduceSumCodegen;
pub use registry::CodegenRegistry;

use std::collections::HashMap;

use onnx_graph::{ElementType, Node, OnnxGraph, TensorData, ValueInfo};
use proc_macro2::{Ident, TokenStream};
use quote::quote;

use crate::{
    burn::{tensor_ty, RenameHelper, Scope, TensorKind, ToTokens},
    config::{EmbeddingConfig, EmbeddingConfigs},
    Error, Result,
};

/// Code generation of one ONNX operator type.
pub trait OpCodegen: std::fmt::Debug {
    /// ONNX operator type handled by the generator.
    fn op_type(&self) -> &'static str;

    /// Generate the statements of `node`.
    fn gen(&self, node: &Node, ctx: &mut CodegenContext) -> Result<NodeCode>;
}

/// Code produced for one node.
///
/// `init` statements run once in `new(device)` and bind every field by name; `forward`
/// statements run on each call of `forward`.
#[derive(Debug, Default)]
pub struct NodeCode {
    /// Struct fields: name and type.
    pub fields: Vec<(Ident, TokenStream)>,
    pub init: TokenStream,
    pub forward: TokenStream,
    /// Paths to `use` in the generated module.
    pub imports: Vec<&'static str>,
}

impl NodeCode {
    /// Code with only forward statements.
    pub fn forward(forward: TokenStream) -> Self {
        Self {
            forward,
            ..Default::default()
        }
    }
}

/// Initializer referenced from `forward`, stored as a constant field of the module.
#[derive(Debug, Clone)]
pub struct ConstantField {
    pub name: Ident,
    pub kind: TensorKind,
    pub data: TensorData,
}

impl ConstantField {
    pub fn ty(&self) -> TokenStream {
        let ty = tensor_ty(self.data.rank().max(1), self.kind);
        quote! { burn::module::Param<#ty> }
    }

    /// `let name = Param::from_tensor(..);` inside `new(device)`.
    pub fn init(&self) -> TokenStream {
        let name = &self.name;
        let tensor = tensor_from_data(&self.data, self.kind);

        quote! {
            let #name = burn::module::Param::from_tensor(#tensor);
        }
    }
}

/// Everything a generator can look up about the graph while generating one node.
#[derive(Debug)]
pub struct CodegenContext<'a> {
    graph: &'a OnnxGraph,
    embeddings: &'a EmbeddingConfigs,
    rename: RenameHelper,
    scope: Scope,
    constants: Vec<ConstantField>,
    /// Rank and element type of the values generated so far.
    inferred: HashMap<String, (Option<usize>, Option<ElementType>)>,
    node_position: usize,
}

impl<'a> CodegenContext<'a> {
    pub fn new(graph: &'a OnnxGraph, embeddings: &'a EmbeddingConfigs) -> Self {
        Self {
            graph,
            embeddings,
            rename: RenameHelper::default(),
            scope: Scope::default(),
            constants: Vec::new(),
            inferred: HashMap::new(),
            node_position: 0,
        }
    }

    /// Move the context to the node at `node_position`.
    pub fn at(&mut self, node_position: usize) {
        self.node_position = node_position;
    }

    pub fn value_info(&self, name: &str) -> Option<&'a ValueInfo> {
        self.graph.value_infos.get(name)
    }

    pub fn initializer(&self, name: &str) -> Option<&'a TensorData> {
        self.graph.initializers.get(name)
    }

    /// Rank of a tensor from its declared shape, its constant value or the node producing it.
    pub fn rank(&self, name: &str) -> Option<usize> {
        self.value_info(name)
            .and_then(ValueInfo::rank)
            .or_else(|| self.initializer(name).map(TensorData::rank))
            .or_else(|| self.inferred.get(name).and_then(|(rank, _)| *rank))
    }

    pub fn elem_type(&self, name: &str) -> Option<ElementType> {
        self.value_info(name)
            .and_then(|info| info.elem_type)
            .or_else(|| self.initializer(name).map(|data| data.elem_type))
            .or_else(|| self.inferred.get(name).and_then(|(_, elem_type)| *elem_type))
    }

    /// Record the rank and element type of the output `index` of `node` as generated.
    pub fn infer(
        &mut self,
        node: &Node,
        index: usize,
        rank: Option<usize>,
        elem_type: Option<ElementType>,
    ) {
        if let Some(name) = node.output(index) {
            self.inferred.insert(name.to_string(), (rank, elem_type));
        }
    }

    /// Embedding configuration of the node `name`, when it is one.
    pub fn embedding(&self, name: &str) -> Option<&'a EmbeddingConfig> {
        self.embeddings.get(name)
    }

    /// Identifier bound to the tensor `name`.
    pub fn tensor(&mut self, name: &str) -> Ident {
        self.rename.tensor(name)
    }

    /// Identifier of the output `index` of `node`.
    pub fn output(&mut self, node: &Node, index: usize) -> Result<Ident> {
        let name = node
            .output(index)
            .ok_or_else(|| Error::invalid_node(&node.name, format!("missing output {index}")))?;
        Ok(self.rename.tensor(name))
    }

    /// Field name of `node`.
    pub fn field(&mut self, node: &Node) -> Ident {
        self.rename.node(node)
    }

    /// Tokens reading the tensor `name` in `forward`.
    ///
    /// Graph values are moved on their last use and cloned before. Initializers become constant
    /// fields of the module.
    pub fn input_forward(&mut self, node: &Node, name: &str) -> Result<TokenStream> {
        self.read(&node.name, name)
    }

    /// Tokens returning the graph output `name` at the end of `forward`.
    pub(crate) fn graph_output(&mut self, name: &str) -> Result<TokenStream> {
        self.read("graph outputs", name)
    }

    fn read(&mut self, owner: &str, name: &str) -> Result<TokenStream> {
        if let Some(data) = self.initializer(name) {
            let kind = constant_kind(owner, name, data)?;
            let field = self.constant(name, data, kind);
            return Ok(quote! { self.#field.val() });
        }

        let ident = self.rename.tensor(name);
        Ok(self.scope.use_owned(&ident, self.node_position))
    }

    /// Tokens building the initializer `name` inside `new(device)`.
    pub fn input_init(&self, node: &Node, name: &str) -> Result<TokenStream> {
        let data = self
            .initializer(name)
            .ok_or_else(|| Error::UnresolvedDynamicValue {
                node: node.name.clone(),
                tensor: name.to_string(),
            })?;

        Ok(tensor_from_data(data, constant_kind(&node.name, name, data)?))
    }

    /// Initializers referenced from `forward`, in order of first use.
    pub fn constants(&self) -> &[ConstantField] {
        &self.constants
    }

    fn constant(&mut self, name: &str, data: &TensorData, kind: TensorKind) -> Ident {
        let ident = self.rename.tensor(name);
        if !self.constants.iter().any(|constant| constant.name == ident) {
            log::debug!("Initializer {name} becomes the constant field {ident}");
            self.constants.push(ConstantField {
                name: ident.clone(),
                kind,
                data: data.clone(),
            });
        }
        ident
    }
}

fn constant_kind(owner: &str, name: &str, data: &TensorData) -> Result<TensorKind> {
    if data.elem_type == ElementType::String {
        return Err(Error::invalid_node(
            owner,
            format!("string tensor '{name}' has no tensor counterpart"),
        ));
    }

    Ok(TensorKind::from_elem_type(data.elem_type))
}

/// Count the remaining uses of every tensor, graph outputs being used at `outputs_position`.
pub(crate) fn register_uses(ctx: &mut CodegenContext, nodes: &[Node], outputs_position: usize) {
    let graph = ctx.graph;
    let mut uses: HashMap<&str, Vec<usize>> = HashMap::new();

    for (position, node) in nodes.iter().enumerate() {
        for input in node.inputs.iter() {
            uses.entry(input).or_default().push(position);
        }
    }
    for output in graph.outputs.iter() {
        uses.entry(&output.name).or_default().push(outputs_position);
    }

    // Graph order, so identifiers do not depend on hashing.
    let names = nodes
        .iter()
        .flat_map(|node| node.inputs.iter())
        .chain(graph.outputs.iter().map(|output| &output.name));
    for name in names {
        if name.is_empty() || graph.initializers.contains_key(name) {
            continue;
        }
        if let Some(positions) = uses.remove(name.as_str()) {
            let ident = ctx.rename.tensor(name);
            positions
                .into_iter()
                .for_each(|position| ctx.scope.register_use(&ident, position));
        }
    }
}

/// `Tensor::<B, D, K>::from_data(TensorData::new(..), device)`. Scalars become one-element
/// tensors.
pub(crate) fn tensor_from_data(data: &TensorData, kind: TensorKind) -> TokenStream {
    let (rank, data) = match data.rank() {
        0 => (
            1,
            TensorData {
                shape: vec![1],
                ..data.clone()
            },
        ),
        rank => (rank, data.clone()),
    };
    let rank = rank.to_tokens();
    let kind = kind.generic();
    let data = data.to_tokens();

    quote! {
        Tensor::<B, #rank #kind>::from_data(#data, device)
    }
}
