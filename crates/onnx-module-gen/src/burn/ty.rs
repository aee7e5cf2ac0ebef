use onnx_graph::ElementType;
use proc_macro2::{Ident, TokenStream};
use quote::quote;

use crate::burn::ToTokens;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorKind {
    Int,
    Float,
    Bool,
}

impl TensorKind {
    /// Burn tensor kind storing ONNX elements of type `elem_type`.
    pub fn from_elem_type(elem_type: ElementType) -> Self {
        match elem_type {
            ElementType::Bool => TensorKind::Bool,
            elem_type if elem_type.is_int() => TensorKind::Int,
            _ => TensorKind::Float,
        }
    }

    /// Trailing generic argument of `Tensor<B, D, K>`, nothing for float tensors.
    pub fn generic(&self) -> TokenStream {
        match self {
            TensorKind::Int => quote! { , Int },
            TensorKind::Float => quote! {},
            TensorKind::Bool => quote! { , Bool },
        }
    }
}

#[derive(Debug, Clone)]
pub struct TensorType {
    pub name: Ident,
    pub rank: usize,
    pub kind: TensorKind,
}

impl TensorType {
    pub fn new(name: Ident, rank: usize, kind: TensorKind) -> Self {
        Self { name, rank, kind }
    }

    pub fn ty(&self) -> TokenStream {
        tensor_ty(self.rank, self.kind)
    }
}

/// `Tensor<B, rank[, Int | Bool]>`.
pub fn tensor_ty(rank: usize, kind: TensorKind) -> TokenStream {
    let rank = rank.to_tokens();
    let kind = kind.generic();

    quote! { Tensor<B, #rank #kind> }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proc_macro2::Span;

    #[test]
    fn kinds_follow_element_types() {
        assert_eq!(
            TensorKind::from_elem_type(ElementType::Float16),
            TensorKind::Float
        );
        assert_eq!(
            TensorKind::from_elem_type(ElementType::Uint8),
            TensorKind::Int
        );
        assert_eq!(
            TensorKind::from_elem_type(ElementType::Bool),
            TensorKind::Bool
        );
    }

    #[test]
    fn tensor_types() {
        let name = Ident::new("x", Span::call_site());

        assert_eq!(
            TensorType::new(name.clone(), 2, TensorKind::Float).ty().to_string(),
            quote! { Tensor<B, 2> }.to_string()
        );
        assert_eq!(
            TensorType::new(name, 1, TensorKind::Int).ty().to_string(),
            quote! { Tensor<B, 1, Int> }.to_string()
        );
    }
}
