use std::collections::{HashMap, HashSet};

use onnx_graph::Node;
use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

/// Rust keywords, plus the names the generated module uses for itself.
const RESERVED: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final", "gen",
    "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield", "device",
    "phantom",
];

/// Stable, collision-free identifiers for the tensors and nodes of one graph.
///
/// The same ONNX name always maps to the same identifier. Tensors and nodes share one namespace
/// since both end up as locals of `new` or `forward`.
#[derive(Debug, Default)]
pub struct RenameHelper {
    tensors: HashMap<String, Ident>,
    nodes: HashMap<String, Ident>,
    used: HashSet<String>,
    unnamed: HashMap<String, usize>,
}

impl RenameHelper {
    /// Identifier of the tensor `name`.
    pub fn tensor(&mut self, name: &str) -> Ident {
        if let Some(ident) = self.tensors.get(name) {
            return ident.clone();
        }

        let ident = self.claim(&sanitize(name));
        self.tensors.insert(name.to_string(), ident.clone());
        ident
    }

    /// Identifier of the field generated for `node`, `{op_type}{n}` for unnamed nodes.
    pub fn node(&mut self, node: &Node) -> Ident {
        let key = if node.name.is_empty() {
            let counter = self.unnamed.entry(node.op_type.clone()).or_insert(0);
            *counter += 1;
            format!("{}{}", node.op_type, counter)
        } else {
            node.name.clone()
        };

        if let Some(ident) = self.nodes.get(&key) {
            return ident.clone();
        }

        let ident = self.claim(&sanitize(&key));
        self.nodes.insert(key, ident.clone());
        ident
    }

    fn claim(&mut self, base: &str) -> Ident {
        let mut candidate = base.to_string();
        let mut suffix = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.used.insert(candidate.clone());

        Ident::new(&candidate, Span::call_site())
    }
}

/// Snake case with every non alphanumeric character replaced by `_`.
fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase()
                && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
            {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
        prev = Some(c);
    }

    let mut out = out.trim_end_matches('_').to_string();
    if out.is_empty() {
        out.push_str("tensor");
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, "t_");
    }
    if RESERVED.contains(&out.as_str()) {
        out.push('_');
    }

    out
}

/// Remaining uses of every tensor of the forward pass.
///
/// A tensor is moved on its last use and cloned before.
#[derive(Debug, Default)]
pub struct Scope {
    uses: HashMap<Ident, Vec<usize>>,
}

impl Scope {
    /// Record that the node at `node_position` consumes `name`.
    pub fn register_use(&mut self, name: &Ident, node_position: usize) {
        self.uses.entry(name.clone()).or_default().push(node_position);
    }

    /// Tokens consuming `name` at `node_position`: the variable itself on its last use, a clone
    /// otherwise.
    pub fn use_owned(&mut self, name: &Ident, node_position: usize) -> TokenStream {
        let Some(uses) = self.uses.get_mut(name) else {
            return quote! { #name };
        };

        if let Some(index) = uses.iter().position(|position| *position == node_position) {
            uses.remove(index);
        }

        if uses.iter().any(|position| *position >= node_position) {
            quote! { #name.clone() }
        } else {
            quote! { #name }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onnx_graph::Attributes;

    fn node(name: &str, op_type: &str) -> Node {
        Node {
            name: name.to_string(),
            op_type: op_type.to_string(),
            domain: String::new(),
            inputs: vec![],
            outputs: vec![],
            attrs: Attributes::new(),
        }
    }

    #[test]
    fn tensor_names_are_snake_case_identifiers() {
        let mut rename = RenameHelper::default();

        assert_eq!(rename.tensor("_t_ReduceSum_0"), "t_reduce_sum_0");
        assert_eq!(rename.tensor("input:0"), "input_0");
        assert_eq!(rename.tensor("0"), "t_0");
        assert_eq!(rename.tensor("type"), "type_");
        assert_eq!(rename.tensor("device"), "device_");
        assert_eq!(rename.tensor("/"), "tensor");
    }

    #[test]
    fn renaming_is_stable_and_collision_free() {
        let mut rename = RenameHelper::default();

        let first = rename.tensor("input.1");
        let second = rename.tensor("input_1");
        assert_eq!(first, "input_1");
        assert_eq!(second, "input_1_1");
        assert_eq!(rename.tensor("input.1"), first);
    }

    #[test]
    fn unnamed_nodes_are_numbered_by_type() {
        let mut rename = RenameHelper::default();

        assert_eq!(rename.node(&node("", "Gather")), "gather1");
        assert_eq!(rename.node(&node("", "Gather")), "gather2");
        assert_eq!(rename.node(&node("Gather_0", "Gather")), "gather_0");
        assert_eq!(rename.node(&node("Gather_0", "Gather")), "gather_0");
    }

    #[test]
    fn last_use_moves() {
        let mut scope = Scope::default();
        let x = Ident::new("x", Span::call_site());
        scope.register_use(&x, 0);
        scope.register_use(&x, 2);

        assert_eq!(scope.use_owned(&x, 0).to_string(), "x . clone ()");
        assert_eq!(scope.use_owned(&x, 2).to_string(), "x");
    }

    #[test]
    fn same_node_using_a_tensor_twice() {
        let mut scope = Scope::default();
        let x = Ident::new("x", Span::call_site());
        scope.register_use(&x, 1);
        scope.register_use(&x, 1);

        assert_eq!(scope.use_owned(&x, 1).to_string(), "x . clone ()");
        assert_eq!(scope.use_owned(&x, 1).to_string(), "x");
    }
}
