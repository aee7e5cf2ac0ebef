use proc_macro2::{Ident, Span};

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "do", "dyn", "else",
    "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in", "let", "loop",
    "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return", "self",
    "static", "struct", "super", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Names the generated functions already use for their own parameters.
const RESERVED_PARAMS: &[&str] = &["graph", "attrs", "args", "inputs", "arity"];

/// `ReduceSum` -> `reduce_sum`, `LSTM` -> `lstm`, `QLinearConv` -> `q_linear_conv`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_lower);
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    let out = out.trim_matches('_').to_string();
    match out.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("_{out}"),
        None => "_".to_string(),
        _ => out,
    }
}

fn escape(name: String) -> String {
    if KEYWORDS.contains(&name.as_str()) {
        format!("{name}_")
    } else {
        name
    }
}

/// Function name of an operator; the domain prefixes it outside the default domain.
pub fn op_fn_name(name: &str, domain: &str) -> Ident {
    let base = if domain.is_empty() || domain == "ai.onnx" {
        snake_case(name)
    } else {
        format!("{}_{}", snake_case(domain), snake_case(name))
    };
    Ident::new(&escape(base), Span::call_site())
}

/// Parameter names of the declared inputs, unique and clear of the generated locals.
pub fn param_names<'a, I>(inputs: I) -> Vec<Ident>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut taken: Vec<String> = RESERVED_PARAMS.iter().map(|s| s.to_string()).collect();
    let mut params = Vec::new();

    for input in inputs {
        let mut name = escape(snake_case(input));
        if taken.contains(&name) {
            name = format!("{name}_");
        }
        let mut candidate = name.clone();
        let mut suffix = 1;
        while taken.contains(&candidate) {
            candidate = format!("{name}{suffix}");
            suffix += 1;
        }
        params.push(Ident::new(&candidate, Span::call_site()));
        taken.push(candidate);
    }

    params
}
