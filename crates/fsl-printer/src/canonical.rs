//! The canonical printer.
//!
//! Produces the stable textual form of a schema tree: the public output
//! format and the linker's hash input. Rules:
//!
//! 1. Declarations print in tree order (sorting is a tree op).
//! 2. Members print in a fixed canonical order per declaration kind.
//! 3. Two-space indentation, fixed spacing, trailing newline after every
//!    declaration, one blank line between top-level declarations unless
//!    an adjacent extras block supplies it.
//! 4. Expression blobs print verbatim, re-indented to the current depth.
//! 5. Extras re-emit at their anchor positions.

use crate::sourcemap::Recorder;
use fsl_ast::{
    AccessProviderDecl, CollectionDecl, CollectionMember, Declaration, ExprBlob, Extra, ExtraKind,
    FnParams, FqlType, FunctionDecl, RoleDecl, RoleMember, SchemaTree, TextNode,
};
use indexmap::IndexMap;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Render the canonical form of a tree.
pub fn canonical(tree: &SchemaTree) -> String {
    let mut printer = Printer::for_tree(tree, None);
    printer.print_tree(tree);
    printer.out
}

/// Options for source-map emission.
pub struct SourceMapRequest<'a> {
    /// Destination filename recorded in the map's `file` field.
    pub file: &'a str,
    /// The linker's `{original: mangled}` map; inverted internally so
    /// mangled identifier writes record the original name as symbol.
    pub mangled: Option<&'a IndexMap<String, String>>,
    /// Per-path overrides for `sourcesContent`; the tree's own retained
    /// sources are used otherwise.
    pub sources_content: Option<&'a HashMap<String, String>>,
}

/// Render the canonical form with an inline base64 source map appended.
pub fn canonical_with_source_map(tree: &SchemaTree, request: &SourceMapRequest<'_>) -> String {
    let sources: Vec<String> = tree
        .sources
        .files()
        .map(|f| f.path.display().to_string())
        .collect();
    let sources_content: Vec<Option<String>> = tree
        .sources
        .files()
        .map(|f| {
            let path = f.path.display().to_string();
            match request.sources_content.and_then(|m| m.get(&path)) {
                Some(content) => Some(content.clone()),
                None => Some(f.source.clone()),
            }
        })
        .collect();
    let symbols: HashMap<String, String> = request
        .mangled
        .map(|m| {
            m.iter()
                .map(|(original, mangled)| (mangled.clone(), original.clone()))
                .collect()
        })
        .unwrap_or_default();

    let recorder = Recorder::new(request.file, sources, sources_content, symbols);
    let mut printer = Printer::for_tree(tree, Some(recorder));
    printer.print_tree(tree);

    let mut out = printer.out;
    if let Some(recorder) = printer.recorder {
        out.push_str(&recorder.into_inline_comment());
    }
    out
}

/// Render one declaration in canonical form (the linker's hash input).
pub fn canonical_declaration(decl: &Declaration) -> String {
    let mut printer = Printer::bare();
    printer.print_declaration(decl);
    printer.out
}

/// Per-file queues of extras, drained as printing passes their anchors.
#[derive(Default)]
struct ExtrasQueues {
    queues: HashMap<u16, VecDeque<Rc<Extra>>>,
}

impl ExtrasQueues {
    fn from_tree(tree: &SchemaTree) -> Self {
        let mut queues: HashMap<u16, VecDeque<Rc<Extra>>> = HashMap::new();
        for extra in &tree.extras {
            queues
                .entry(extra.span.file_id)
                .or_default()
                .push_back(Rc::clone(extra));
        }
        Self { queues }
    }

    /// Extras of `file_id` anchored at or before `offset`.
    fn drain_before(&mut self, file_id: u16, offset: u32) -> Vec<Rc<Extra>> {
        let mut drained = Vec::new();
        if let Some(queue) = self.queues.get_mut(&file_id) {
            while let Some(front) = queue.front() {
                if front.anchor <= offset {
                    drained.push(queue.pop_front().expect("front just checked"));
                } else {
                    break;
                }
            }
        }
        drained
    }

    /// Everything left, in file-id order.
    fn drain_all(&mut self) -> Vec<Rc<Extra>> {
        let mut ids: Vec<u16> = self.queues.keys().copied().collect();
        ids.sort_unstable();
        let mut drained = Vec::new();
        for id in ids {
            if let Some(queue) = self.queues.get_mut(&id) {
                drained.extend(queue.drain(..));
            }
        }
        drained
    }
}

struct Printer<'t> {
    out: String,
    /// 0-based generated position, tracked for the recorder.
    line: u32,
    col: u32,
    tree: Option<&'t SchemaTree>,
    recorder: Option<Recorder>,
    extras: ExtrasQueues,
}

impl<'t> Printer<'t> {
    fn for_tree(tree: &'t SchemaTree, recorder: Option<Recorder>) -> Self {
        Self {
            out: String::new(),
            line: 0,
            col: 0,
            tree: Some(tree),
            recorder,
            extras: ExtrasQueues::from_tree(tree),
        }
    }

    /// A printer with no extras and no source tracking, for hashing.
    fn bare() -> Self {
        Self {
            out: String::new(),
            line: 0,
            col: 0,
            tree: None,
            recorder: None,
            extras: ExtrasQueues::default(),
        }
    }

    fn push(&mut self, s: &str) {
        for c in s.chars() {
            if c == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
        self.out.push_str(s);
    }

    fn nl(&mut self) {
        self.push("\n");
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.push("  ");
        }
    }

    /// Write an identifier, recording a source mapping when possible.
    fn emit_ident(&mut self, node: &TextNode) {
        if let (Some(tree), Some(span)) = (self.tree, node.span) {
            let (gen_line, gen_col) = (self.line, self.col);
            if let Some(recorder) = self.recorder.as_mut() {
                let (line, col) = tree.sources.line_col(span.file_id, span.start);
                recorder.record(
                    gen_line,
                    gen_col,
                    span.file_id as u32,
                    line - 1,
                    col - 1,
                    &node.text,
                );
            }
        }
        self.push(&node.text);
    }

    fn emit_extras(&mut self, extras: &[Rc<Extra>], depth: usize) {
        for extra in extras {
            match extra.kind {
                ExtraKind::Comment => {
                    self.indent(depth);
                    self.push(&extra.text);
                    self.nl();
                }
                ExtraKind::BlankLine => self.nl(),
            }
        }
    }

    fn print_tree(&mut self, tree: &SchemaTree) {
        for (i, decl) in tree.declarations.iter().enumerate() {
            let span = decl.span();
            let pending = self.extras.drain_before(span.file_id, span.start);
            if i > 0 {
                let supplied = matches!(
                    pending.first().map(|e| e.kind),
                    Some(ExtraKind::BlankLine)
                );
                if !supplied {
                    self.nl();
                }
            }
            self.emit_extras(&pending, 0);
            self.print_declaration(decl);
        }
        let leftover = self.extras.drain_all();
        self.emit_extras(&leftover, 0);
    }

    fn print_declaration(&mut self, decl: &Declaration) {
        match decl {
            Declaration::AccessProvider(d) => self.print_access_provider(d),
            Declaration::Collection(d) => self.print_collection(d),
            Declaration::Function(d) => self.print_function(d),
            Declaration::Role(d) => self.print_role(d),
        }
    }

    fn print_access_provider(&mut self, d: &AccessProviderDecl) {
        self.push("access provider ");
        self.emit_ident(&d.name);
        self.push(" {");
        self.nl();
        if let Some(issuer) = &d.issuer {
            self.indent(1);
            self.push("issuer ");
            let quoted = quote(&issuer.text);
            self.push(&quoted);
            self.nl();
        }
        if let Some(jwks_uri) = &d.jwks_uri {
            self.indent(1);
            self.push("jwks_uri ");
            let quoted = quote(&jwks_uri.text);
            self.push(&quoted);
            self.nl();
        }
        for role in &d.roles {
            self.indent(1);
            self.push("role ");
            self.emit_ident(role);
            self.nl();
        }
        if let Some(ttl) = &d.ttl {
            self.indent(1);
            self.push("ttl ");
            self.push(&ttl.text);
            self.nl();
        }
        self.push("}");
        self.nl();
    }

    fn print_collection(&mut self, d: &CollectionDecl) {
        self.push("collection ");
        self.emit_ident(&d.name);
        if let Some(alias) = &d.alias {
            self.push(" as ");
            self.print_type(alias);
        }
        self.push(" {");
        self.nl();
        for member in d.members_canonical() {
            let pending = self
                .extras
                .drain_before(d.span.file_id, member.start());
            self.emit_extras(&pending, 1);
            self.print_collection_member(member);
        }
        let trailing = self.extras.drain_before(d.span.file_id, d.span.end);
        self.emit_extras(&trailing, 1);
        self.push("}");
        self.nl();
    }

    fn print_collection_member(&mut self, member: &CollectionMember) {
        match member {
            CollectionMember::Field(f) => {
                self.indent(1);
                self.emit_ident(&f.name);
                if let Some(ty) = &f.ty {
                    self.push(": ");
                    self.print_type(ty);
                }
                self.nl();
            }
            CollectionMember::Computed(c) => {
                self.indent(1);
                self.push("compute ");
                self.emit_ident(&c.name);
                if let Some(ty) = &c.ty {
                    self.push(": ");
                    self.print_type(ty);
                }
                self.push(" ");
                self.print_blob_block(&c.body, 1);
                self.nl();
            }
            CollectionMember::Check(c) => {
                self.indent(1);
                self.push("check ");
                self.emit_ident(&c.name);
                self.push(" ");
                self.print_blob_block(&c.predicate, 1);
                self.nl();
            }
            CollectionMember::Unique(u) => {
                self.indent(1);
                self.push("unique [");
                for (i, term) in u.terms.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.emit_ident(term);
                }
                self.push("]");
                self.nl();
            }
            CollectionMember::Index(idx) => {
                self.indent(1);
                self.push("index ");
                self.emit_ident(&idx.name);
                self.push(" ");
                self.print_blob_block(&idx.body, 1);
                self.nl();
            }
            CollectionMember::HistoryDays(n) => {
                self.indent(1);
                self.push("history_days ");
                self.push(&n.text);
                self.nl();
            }
            CollectionMember::TtlDays(n) => {
                self.indent(1);
                self.push("ttl_days ");
                self.push(&n.text);
                self.nl();
            }
            CollectionMember::DocumentTtls(enabled, _) => {
                self.indent(1);
                self.push(if *enabled {
                    "document_ttls true"
                } else {
                    "document_ttls false"
                });
                self.nl();
            }
            CollectionMember::Migrations(body) => {
                self.indent(1);
                self.push("migrations ");
                self.print_blob_block(body, 1);
                self.nl();
            }
        }
    }

    fn print_function(&mut self, d: &FunctionDecl) {
        if let Some(role) = &d.role {
            self.push("@role(");
            self.emit_ident(role);
            self.push(")");
            self.nl();
        }
        self.push("function ");
        self.emit_ident(&d.name);
        self.push("(");
        for (i, param) in d.params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.emit_ident(&param.name);
            if let Some(ty) = &param.ty {
                self.push(": ");
                self.print_type(ty);
            }
        }
        self.push(")");
        if let Some(ret) = &d.return_type {
            self.push(": ");
            self.print_type(ret);
        }
        self.push(" ");
        self.print_blob_block(&d.body, 0);
        self.nl();
    }

    fn print_role(&mut self, d: &RoleDecl) {
        self.push("role ");
        self.emit_ident(&d.name);
        self.push(" {");
        self.nl();
        for member in d.members_canonical() {
            let pending = self
                .extras
                .drain_before(d.span.file_id, member.start());
            self.emit_extras(&pending, 1);
            match member {
                RoleMember::Membership(m) => {
                    self.indent(1);
                    self.push("membership ");
                    self.emit_ident(&m.collection);
                    if let Some(predicate) = &m.predicate {
                        self.push(" ");
                        self.print_blob_block(predicate, 1);
                    }
                    self.nl();
                }
                RoleMember::Privileges(p) => {
                    self.indent(1);
                    self.push("privileges ");
                    self.emit_ident(&p.resource);
                    self.push(" {");
                    self.nl();
                    for action in p.actions_canonical() {
                        self.indent(2);
                        self.push(action.kind.as_str());
                        if let Some(predicate) = &action.predicate {
                            self.push(" ");
                            self.print_blob_block(predicate, 2);
                        }
                        self.nl();
                    }
                    self.indent(1);
                    self.push("}");
                    self.nl();
                }
            }
        }
        let trailing = self.extras.drain_before(d.span.file_id, d.span.end);
        self.emit_extras(&trailing, 1);
        self.push("}");
        self.nl();
    }

    /// Print `{ … }` for an expression blob, re-indented to `depth`.
    ///
    /// The caller writes the trailing newline.
    fn print_blob_block(&mut self, blob: &ExprBlob, depth: usize) {
        self.push("{");
        self.nl();
        let (lines, offset) = blob.normalized_lines_with_offset();
        let open_line0 = self
            .tree
            .map(|t| t.sources.line_col(blob.span.file_id, blob.span.start).0 - 1);
        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                self.nl();
                continue;
            }
            self.indent(depth + 1);
            if let (Some(open_line0), Some(recorder)) = (open_line0, self.recorder.as_mut()) {
                recorder.record_line(
                    self.line,
                    self.col,
                    blob.span.file_id as u32,
                    open_line0 + (offset + i) as u32,
                );
            }
            self.push(line);
            self.nl();
        }
        self.indent(depth);
        self.push("}");
    }

    fn print_type(&mut self, ty: &FqlType) {
        match ty {
            FqlType::Named(name) => self.emit_ident(name),
            FqlType::StringLiteral(s) => {
                let quoted = quote(&s.text);
                self.push(&quoted);
            }
            FqlType::NumberLiteral(n) => self.push(&n.text),
            FqlType::Object { fields, wildcard } => {
                if fields.is_empty() && wildcard.is_none() {
                    self.push("{ }");
                    return;
                }
                self.push("{ ");
                let mut first = true;
                for field in fields {
                    if !first {
                        self.push(", ");
                    }
                    first = false;
                    self.emit_ident(&field.key);
                    if field.optional {
                        self.push("?");
                    }
                    self.push(": ");
                    self.print_type(&field.ty);
                }
                if let Some(wildcard) = wildcard {
                    if !first {
                        self.push(", ");
                    }
                    self.push("*: ");
                    self.print_type(wildcard);
                }
                self.push(" }");
            }
            FqlType::Union(left, right) => {
                self.print_type(left);
                self.push(" | ");
                self.print_type(right);
            }
            FqlType::Optional(inner) => {
                self.print_type(inner);
                self.push("?");
            }
            FqlType::Template { name, params } => {
                self.emit_ident(name);
                self.push("<");
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.print_type(param);
                }
                self.push(">");
            }
            FqlType::Tuple(items) => {
                self.push("[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.print_type(item);
                }
                self.push("]");
            }
            FqlType::Function { params, ret } => {
                match params {
                    FnParams::Short(param) => self.print_type(param),
                    FnParams::Long { types, variadic } => {
                        self.push("(");
                        let mut first = true;
                        for ty in types {
                            if !first {
                                self.push(", ");
                            }
                            first = false;
                            self.print_type(ty);
                        }
                        if let Some(variadic) = variadic {
                            if !first {
                                self.push(", ");
                            }
                            self.push("...");
                            self.print_type(variadic);
                        }
                        self.push(")");
                    }
                }
                self.push(" => ");
                self.print_type(ret);
            }
            FqlType::Isolated(inner) => {
                self.push("(");
                self.print_type(inner);
                self.push(")");
            }
        }
    }
}

/// Quote and escape a string literal.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::quote;

    #[test]
    fn quote_escapes() {
        assert_eq!(quote("plain"), r#""plain""#);
        assert_eq!(quote("a\"b"), r#""a\"b""#);
        assert_eq!(quote("a\\b"), r#""a\\b""#);
        assert_eq!(quote("line\nbreak"), r#""line\nbreak""#);
    }
}
