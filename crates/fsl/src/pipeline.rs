//! High-level entry points shared by the CLI and the C-ABI surface.

use fsl_ast::SchemaTree;
use fsl_parser::ParseError;
use fsl_printer::SourceMapRequest;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

/// Parse one source file into a tree.
pub fn parse_source(source: &str, name: impl Into<PathBuf>) -> Result<SchemaTree, ParseError> {
    fsl_parser::parse(source, name)
}

/// Parse several source files and merge them into one tree, in order.
///
/// The first parse error aborts.
pub fn parse_sources<N, S>(
    sources: impl IntoIterator<Item = (N, S)>,
) -> Result<SchemaTree, ParseError>
where
    N: Into<PathBuf>,
    S: AsRef<str>,
{
    let mut merged: Option<SchemaTree> = None;
    for (name, source) in sources {
        let tree = fsl_parser::parse(source.as_ref(), name)?;
        merged = Some(match merged {
            Some(acc) => acc.merge(tree),
            None => tree,
        });
    }
    Ok(merged.unwrap_or_default())
}

/// The canonical operation's optional auxiliary inputs, as they arrive
/// over the host-facing surfaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalRequest<'a> {
    /// Destination filename; enables source-map emission when present.
    pub source_map_file: Option<&'a str>,
    /// JSON `{original: mangled}` map from a linker run.
    pub mangled_map_json: Option<&'a str>,
    /// JSON `{filename: content}` overrides for `sourcesContent`.
    pub sources_json: Option<&'a str>,
}

/// Canonical printing with optional source map.
///
/// Malformed auxiliary JSON is recoverable: a warning is logged and the
/// printer continues without the symbol or content information.
pub fn canonical_request(tree: &SchemaTree, request: &CanonicalRequest<'_>) -> String {
    let Some(file) = request.source_map_file else {
        return fsl_printer::canonical(tree);
    };

    let mangled: Option<IndexMap<String, String>> = match request.mangled_map_json {
        Some(json) => match serde_json::from_str(json) {
            Ok(map) => Some(map),
            Err(err) => {
                warn!("invalid mangled-names JSON, emitting map without symbols: {err}");
                None
            }
        },
        None => None,
    };
    let sources_content: Option<HashMap<String, String>> = match request.sources_json {
        Some(json) => match serde_json::from_str(json) {
            Ok(map) => Some(map),
            Err(err) => {
                warn!("invalid sources JSON, using retained sources: {err}");
                None
            }
        },
        None => None,
    };

    fsl_printer::canonical_with_source_map(
        tree,
        &SourceMapRequest {
            file,
            mangled: mangled.as_ref(),
            sources_content: sources_content.as_ref(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sources_merges_in_order() {
        let tree = parse_sources([
            ("a.fsl", "collection A { }"),
            ("b.fsl", "collection B { }"),
        ])
        .unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.declarations[0].name(), "A");
        assert_eq!(tree.declarations[1].name(), "B");
        assert_eq!(tree.sources.file_count(), 2);
    }

    #[test]
    fn parse_sources_empty_input() {
        let tree = parse_sources(std::iter::empty::<(&str, &str)>()).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn canonical_request_without_map() {
        let tree = parse_source("collection A { }", "a.fsl").unwrap();
        let out = canonical_request(&tree, &CanonicalRequest::default());
        assert_eq!(out, "collection A {\n}\n");
    }

    #[test]
    fn invalid_mangled_json_is_recoverable() {
        let tree = parse_source("function f() { 1 }", "a.fsl").unwrap();
        let out = canonical_request(
            &tree,
            &CanonicalRequest {
                source_map_file: Some("out.fsl"),
                mangled_map_json: Some("{ not json"),
                sources_json: Some("also not json"),
            },
        );
        // Output still carries the inline source map.
        assert!(out.contains("sourceMappingURL=data:application/json;base64,"));
    }
}
