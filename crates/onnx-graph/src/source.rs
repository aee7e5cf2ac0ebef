//! Rendering of generated token streams as Rust source files.

use proc_macro2::TokenStream;
use rust_format::{Config, Formatter, PostProcess, PrettyPlease};

/// Format `tokens` as a source file, with `header` copied verbatim before the code.
///
/// `_comment_!("..")` and `_blank_!()` markers in `tokens` become comments and blank lines.
pub fn render_source(
    header: Option<&str>,
    tokens: TokenStream,
) -> Result<String, rust_format::Error> {
    let config = Config::new_str().post_proc(PostProcess::ReplaceMarkersAndDocBlocks);
    let code = PrettyPlease::from_config(config).format_tokens(tokens)?;

    Ok(match header {
        Some(header) => format!("{header}{code}"),
        None => code,
    })
}

/// Format `tokens` without a header.
pub fn format_tokens(tokens: TokenStream) -> Result<String, rust_format::Error> {
    render_source(None, tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    #[test]
    fn header_and_markers() {
        let code = render_source(
            Some("// @generated\n"),
            quote! {
                _comment_!("Built from model.onnx");
                use std::fmt;
                _blank_!();
                fn f() {}
            },
        )
        .unwrap();

        assert!(code.starts_with("// @generated\n"));
        assert!(code.contains("Built from model.onnx"));
        assert!(!code.contains("_comment_"));
        assert!(!code.contains("_blank_"));
        assert!(code.contains("fn f() {}"));
    }

    #[test]
    fn invalid_tokens_are_an_error() {
        assert!(format_tokens(quote! { fn }).is_err());
    }
}
