//! TypeScript declaration emission.
//!
//! Collections map to `export interface` blocks; every other declaration
//! kind is ignored. Stored fields keep their optionality (`T?` becomes
//! `name?: T | null`), computed fields become `readonly`, untyped fields
//! become `unknown`.

use fsl_ast::{CollectionMember, Declaration, FnParams, FqlType, SchemaTree};

/// Render a `.d.ts` text for the collections of a tree.
pub fn typescript_definitions(tree: &SchemaTree) -> String {
    let mut out = String::new();
    let mut first = true;
    for decl in &tree.declarations {
        let Declaration::Collection(collection) = decl else {
            continue;
        };
        if !first {
            out.push('\n');
        }
        first = false;

        out.push_str("export interface ");
        out.push_str(&collection.name.text);
        out.push_str(" {\n");
        for member in &collection.members {
            match member {
                CollectionMember::Field(field) => {
                    out.push_str("  ");
                    out.push_str(&field.name.text);
                    match &field.ty {
                        Some(FqlType::Optional(inner)) => {
                            out.push_str("?: ");
                            out.push_str(&ts_type(inner));
                            out.push_str(" | null");
                        }
                        Some(ty) => {
                            out.push_str(": ");
                            out.push_str(&ts_type(ty));
                        }
                        None => out.push_str(": unknown"),
                    }
                    out.push_str(";\n");
                }
                CollectionMember::Computed(computed) => {
                    out.push_str("  readonly ");
                    out.push_str(&computed.name.text);
                    out.push_str(": ");
                    match &computed.ty {
                        Some(ty) => out.push_str(&ts_type(ty)),
                        None => out.push_str("unknown"),
                    }
                    out.push_str(";\n");
                }
                _ => {}
            }
        }
        out.push_str("}\n");
    }
    out
}

/// Map an FQL type to its TypeScript rendering.
fn ts_type(ty: &FqlType) -> String {
    match ty {
        FqlType::Named(name) => match name.text.as_str() {
            "String" => "string".to_string(),
            "Number" | "Int" | "Long" | "Double" | "Float" => "number".to_string(),
            "Boolean" => "boolean".to_string(),
            "Null" | "null" => "null".to_string(),
            "Any" => "unknown".to_string(),
            "Time" | "Date" => "string".to_string(),
            other => other.to_string(),
        },
        FqlType::StringLiteral(s) => format!("{:?}", s.text),
        FqlType::NumberLiteral(n) => n.text.clone(),
        FqlType::Object { fields, wildcard } => {
            let mut parts: Vec<String> = fields
                .iter()
                .map(|f| {
                    format!(
                        "{}{}: {}",
                        f.key.text,
                        if f.optional { "?" } else { "" },
                        ts_type(&f.ty)
                    )
                })
                .collect();
            if let Some(wildcard) = wildcard {
                parts.push(format!("[key: string]: {}", ts_type(wildcard)));
            }
            if parts.is_empty() {
                "{}".to_string()
            } else {
                format!("{{ {} }}", parts.join("; "))
            }
        }
        FqlType::Union(left, right) => format!("{} | {}", ts_type(left), ts_type(right)),
        FqlType::Optional(inner) => format!("{} | null", ts_type(inner)),
        FqlType::Template { name, params } => match name.text.as_str() {
            "Array" | "Set" if params.len() == 1 => format!("{}[]", ts_param(&params[0])),
            "Ref" if params.len() == 1 => ts_type(&params[0]),
            _ => {
                let args: Vec<String> = params.iter().map(ts_type).collect();
                format!("{}<{}>", name.text, args.join(", "))
            }
        },
        FqlType::Tuple(items) => {
            let parts: Vec<String> = items.iter().map(ts_type).collect();
            format!("[{}]", parts.join(", "))
        }
        FqlType::Function { params, ret } => {
            let rendered: Vec<String> = match params {
                FnParams::Short(p) => vec![format!("arg0: {}", ts_type(p))],
                FnParams::Long { types, variadic } => {
                    let mut rendered: Vec<String> = types
                        .iter()
                        .enumerate()
                        .map(|(i, t)| format!("arg{}: {}", i, ts_type(t)))
                        .collect();
                    if let Some(variadic) = variadic {
                        rendered.push(format!("...rest: {}[]", ts_param(variadic)));
                    }
                    rendered
                }
            };
            format!("({}) => {}", rendered.join(", "), ts_type(ret))
        }
        FqlType::Isolated(inner) => format!("({})", ts_type(inner)),
    }
}

/// A type rendered as an element type: unions get parenthesized so that
/// `Array<A | B>` becomes `(A | B)[]`, not `A | B[]`.
fn ts_param(ty: &FqlType) -> String {
    match ty {
        FqlType::Union(..) | FqlType::Optional(..) | FqlType::Function { .. } => {
            format!("({})", ts_type(ty))
        }
        _ => ts_type(ty),
    }
}
