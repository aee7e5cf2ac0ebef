use onnx_graph::{Data, TensorData};
use proc_macro2::{Literal, TokenStream};
use quote::quote;

/// Conversion to tokens without the type suffixes `quote` puts on numbers.
pub trait ToTokens {
    fn to_tokens(&self) -> TokenStream;
}

impl<const N: usize, T: Copy + ToTokens> ToTokens for [T; N] {
    fn to_tokens(&self) -> TokenStream {
        self.as_slice().to_tokens()
    }
}

impl<T: ToTokens> ToTokens for Vec<T> {
    fn to_tokens(&self) -> TokenStream {
        self.as_slice().to_tokens()
    }
}

impl<T: ToTokens> ToTokens for [T] {
    fn to_tokens(&self) -> TokenStream {
        let items = self.iter().map(ToTokens::to_tokens);
        quote! { [#(#items),*] }
    }
}

impl ToTokens for usize {
    fn to_tokens(&self) -> TokenStream {
        let lit = Literal::usize_unsuffixed(*self);
        quote! { #lit }
    }
}

impl ToTokens for i64 {
    fn to_tokens(&self) -> TokenStream {
        let lit = Literal::i64_unsuffixed(*self);
        quote! { #lit }
    }
}

/// `TensorData::new(vec![..], [..])`, with typed elements so the data keeps its element type.
impl ToTokens for TensorData {
    fn to_tokens(&self) -> TokenStream {
        let shape = self.shape.to_tokens();
        let values: Vec<TokenStream> = match &self.data {
            Data::Float16(values) => values.iter().map(|v| f32_tokens(v.to_f32())).collect(),
            Data::Float32(values) => values.iter().map(|v| f32_tokens(*v)).collect(),
            Data::Float64(values) => values.iter().map(|v| f64_tokens(*v)).collect(),
            Data::Int32(values) => values
                .iter()
                .map(|v| match v.checked_abs() {
                    Some(abs) => signed(Literal::i32_suffixed(abs), *v < 0),
                    None => quote! { i32::MIN },
                })
                .collect(),
            Data::Int64(values) => values
                .iter()
                .map(|v| match v.checked_abs() {
                    Some(abs) => signed(Literal::i64_suffixed(abs), *v < 0),
                    None => quote! { i64::MIN },
                })
                .collect(),
            Data::Bool(values) => values.iter().map(|v| quote! { #v }).collect(),
            Data::String(values) => values.iter().map(|v| quote! { #v }).collect(),
        };

        quote! {
            TensorData::new(vec![#(#values),*], #shape)
        }
    }
}

fn signed(lit: Literal, negative: bool) -> TokenStream {
    if negative {
        quote! { -#lit }
    } else {
        quote! { #lit }
    }
}

fn f32_tokens(value: f32) -> TokenStream {
    if value.is_nan() {
        quote! { f32::NAN }
    } else if value.is_infinite() {
        if value > 0.0 {
            quote! { f32::INFINITY }
        } else {
            quote! { f32::NEG_INFINITY }
        }
    } else {
        let lit = Literal::f32_suffixed(value.abs());
        signed(lit, value.is_sign_negative())
    }
}

fn f64_tokens(value: f64) -> TokenStream {
    if value.is_nan() {
        quote! { f64::NAN }
    } else if value.is_infinite() {
        if value > 0.0 {
            quote! { f64::INFINITY }
        } else {
            quote! { f64::NEG_INFINITY }
        }
    } else {
        let lit = Literal::f64_suffixed(value.abs());
        signed(lit, value.is_sign_negative())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burn::node::test::assert_tokens;

    #[test]
    fn numbers_are_unsuffixed() {
        let dims = vec![0usize, 2];
        let dims = dims.to_tokens();

        assert_tokens(
            quote! { let axes = #dims; },
            quote! { let axes = [0, 2]; },
        );
    }

    #[test]
    fn tensor_data_literal() {
        let data = TensorData::from_vec(vec![1.5f32, -2.0, f32::NAN], vec![3, 1]).to_tokens();

        assert_tokens(
            quote! { let data = #data; },
            quote! { let data = TensorData::new(vec![1.5f32, -2f32, f32::NAN], [3, 1]); },
        );
    }
}
