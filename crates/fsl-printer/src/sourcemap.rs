//! Source-map recording and emission.
//!
//! The canonical printer feeds identifier writes (and blob lines) into a
//! [`Recorder`]; on completion the recorder serializes a source map v3
//! object and wraps it in an inline `data:` URI comment.

use base64::Engine;
use serde::Serialize;
use std::collections::HashMap;

/// One recorded mapping segment.
#[derive(Debug, Clone, Copy)]
struct Segment {
    /// 0-based generated line/column.
    gen_line: u32,
    gen_col: u32,
    /// Index into `sources`.
    src: u32,
    /// 0-based original line/column.
    orig_line: u32,
    orig_col: u32,
    /// Index into `names`, when the write had a known original symbol.
    name: Option<u32>,
}

/// Collects generated↔original mappings during canonical printing.
#[derive(Debug, Default)]
pub struct Recorder {
    /// Destination filename (the map's `file` field).
    file: String,
    sources: Vec<String>,
    sources_content: Vec<Option<String>>,
    names: Vec<String>,
    name_index: HashMap<String, u32>,
    /// Mangled → original lookups for symbol recording.
    symbols: HashMap<String, String>,
    segments: Vec<Segment>,
}

impl Recorder {
    /// A recorder for the given destination file and source list.
    ///
    /// `sources` must be indexed by the tree's file ids. `symbols` maps
    /// *mangled* names back to original names; pass an empty map when no
    /// mangling information is available.
    pub fn new(
        file: impl Into<String>,
        sources: Vec<String>,
        sources_content: Vec<Option<String>>,
        symbols: HashMap<String, String>,
    ) -> Self {
        Self {
            file: file.into(),
            sources,
            sources_content,
            names: Vec::new(),
            name_index: HashMap::new(),
            symbols,
            segments: Vec::new(),
        }
    }

    /// Record a mapping for text written at the given generated position.
    ///
    /// `text` is consulted against the mangled-name table; on a hit the
    /// original name is recorded as the segment's symbol.
    pub fn record(
        &mut self,
        gen_line: u32,
        gen_col: u32,
        src: u32,
        orig_line: u32,
        orig_col: u32,
        text: &str,
    ) {
        let name = self.symbols.get(text).cloned().map(|original| {
            if let Some(&idx) = self.name_index.get(&original) {
                idx
            } else {
                let idx = self.names.len() as u32;
                self.name_index.insert(original.clone(), idx);
                self.names.push(original);
                idx
            }
        });
        self.segments.push(Segment {
            gen_line,
            gen_col,
            src,
            orig_line,
            orig_col,
            name,
        });
    }

    /// Record a plain (symbol-less) mapping, used for blob lines.
    pub fn record_line(&mut self, gen_line: u32, gen_col: u32, src: u32, orig_line: u32) {
        self.segments.push(Segment {
            gen_line,
            gen_col,
            src,
            orig_line,
            orig_col: 0,
            name: None,
        });
    }

    /// Serialize to the inline comment appended to canonical output.
    pub fn into_inline_comment(mut self) -> String {
        self.segments
            .sort_by_key(|s| (s.gen_line, s.gen_col));
        let mappings = encode_mappings(&self.segments);
        let map = SourceMapJson {
            version: 3,
            file: self.file,
            sources: self.sources,
            sources_content: self.sources_content,
            names: self.names,
            mappings,
        };
        // Serialization of this shape cannot fail; fall back to an empty
        // object rather than propagating.
        let json = serde_json::to_string(&map).unwrap_or_else(|_| "{}".to_string());
        let encoded = base64::engine::general_purpose::STANDARD.encode(json.as_bytes());
        format!("//# sourceMappingURL=data:application/json;base64,{encoded}\n")
    }
}

#[derive(Debug, Serialize)]
struct SourceMapJson {
    version: u8,
    file: String,
    sources: Vec<String>,
    #[serde(rename = "sourcesContent")]
    sources_content: Vec<Option<String>>,
    names: Vec<String>,
    mappings: String,
}

/// Encode segments as source map v3 `mappings` (base64 VLQ, `;` between
/// generated lines, `,` between segments).
fn encode_mappings(segments: &[Segment]) -> String {
    let mut out = String::new();
    let mut current_line = 0u32;
    let mut prev_gen_col = 0i64;
    let mut prev_src = 0i64;
    let mut prev_orig_line = 0i64;
    let mut prev_orig_col = 0i64;
    let mut prev_name = 0i64;
    let mut first_in_line = true;

    for seg in segments {
        while current_line < seg.gen_line {
            out.push(';');
            current_line += 1;
            prev_gen_col = 0;
            first_in_line = true;
        }
        if !first_in_line {
            out.push(',');
        }
        first_in_line = false;

        vlq(seg.gen_col as i64 - prev_gen_col, &mut out);
        prev_gen_col = seg.gen_col as i64;

        vlq(seg.src as i64 - prev_src, &mut out);
        prev_src = seg.src as i64;

        vlq(seg.orig_line as i64 - prev_orig_line, &mut out);
        prev_orig_line = seg.orig_line as i64;

        vlq(seg.orig_col as i64 - prev_orig_col, &mut out);
        prev_orig_col = seg.orig_col as i64;

        if let Some(name) = seg.name {
            vlq(name as i64 - prev_name, &mut out);
            prev_name = name as i64;
        }
    }
    out
}

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Base64 VLQ encode one value.
fn vlq(value: i64, out: &mut String) {
    let mut v = if value < 0 {
        ((-value as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (v & 0b11111) as usize;
        v >>= 5;
        if v != 0 {
            digit |= 0b100000;
        }
        out.push(BASE64_ALPHABET[digit] as char);
        if v == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vlq_known_values() {
        let enc = |v: i64| {
            let mut s = String::new();
            vlq(v, &mut s);
            s
        };
        assert_eq!(enc(0), "A");
        assert_eq!(enc(1), "C");
        assert_eq!(enc(-1), "D");
        assert_eq!(enc(16), "gB");
        assert_eq!(enc(123), "2H");
    }

    #[test]
    fn mappings_group_by_line() {
        let segments = vec![
            Segment {
                gen_line: 0,
                gen_col: 0,
                src: 0,
                orig_line: 0,
                orig_col: 0,
                name: None,
            },
            Segment {
                gen_line: 0,
                gen_col: 4,
                src: 0,
                orig_line: 0,
                orig_col: 4,
                name: None,
            },
            Segment {
                gen_line: 2,
                gen_col: 0,
                src: 0,
                orig_line: 1,
                orig_col: 0,
                name: None,
            },
        ];
        let mappings = encode_mappings(&segments);
        assert_eq!(mappings, "AAAA,IAAI;;AACJ");
    }

    #[test]
    fn inline_comment_shape() {
        let mut rec = Recorder::new(
            "out.fsl",
            vec!["a.fsl".to_string()],
            vec![Some("collection A { }".to_string())],
            HashMap::new(),
        );
        rec.record(0, 0, 0, 0, 0, "A");
        let comment = rec.into_inline_comment();
        assert!(comment.starts_with("//# sourceMappingURL=data:application/json;base64,"));
        assert!(comment.ends_with('\n'));

        let b64 = comment
            .trim_end()
            .rsplit(',')
            .next()
            .expect("base64 payload");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .expect("valid base64");
        let json: serde_json::Value = serde_json::from_slice(&decoded).expect("valid json");
        assert_eq!(json["version"], 3);
        assert_eq!(json["file"], "out.fsl");
        assert_eq!(json["sources"][0], "a.fsl");
    }

    #[test]
    fn symbols_resolve_to_original_names() {
        let mut symbols = HashMap::new();
        symbols.insert("foo_abc".to_string(), "foo".to_string());
        let mut rec = Recorder::new("out.fsl", vec!["a.fsl".into()], vec![None], symbols);
        rec.record(0, 0, 0, 0, 0, "foo_abc");
        rec.record(0, 8, 0, 0, 8, "plain");
        assert_eq!(rec.names, vec!["foo".to_string()]);
        assert_eq!(rec.segments[0].name, Some(0));
        assert_eq!(rec.segments[1].name, None);
    }
}
