// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! C ABI surface for the FSL toolchain.
//!
//! Trees travel as opaque `*mut SchemaTree` handles; text travels as
//! UTF-8 byte runs. Byte runs returned to the host are owned by this
//! library and must be released with [`fsl_free_bytes`]. Every failing
//! operation returns null (or an empty byte run) after printing a
//! single-line diagnostic to stderr.
//!
//! Optional string arguments are passed as null pointers when absent.
//! Kind strings are `access_provider`, `collection`, `function`, `role`.

use fsl::pipeline::{canonical_request, CanonicalRequest};
use fsl::{DeclarationKind, SchemaTree};

/// A byte run owned by the library.
///
/// `ptr` is null (and `len` 0) when an operation failed.
#[repr(C)]
pub struct FslBytes {
    pub ptr: *mut u8,
    pub len: usize,
}

impl FslBytes {
    fn from_vec(bytes: Vec<u8>) -> Self {
        let boxed = bytes.into_boxed_slice();
        let len = boxed.len();
        let ptr = Box::into_raw(boxed) as *mut u8;
        Self { ptr, len }
    }

    fn null() -> Self {
        Self {
            ptr: std::ptr::null_mut(),
            len: 0,
        }
    }
}

/// Read an optional UTF-8 argument. `Ok(None)` for a null pointer,
/// `Err(())` for invalid UTF-8.
///
/// # Safety
/// `ptr`, when non-null, must point to `len` readable bytes.
unsafe fn opt_str<'a>(ptr: *const u8, len: usize) -> Result<Option<&'a str>, ()> {
    if ptr.is_null() {
        return Ok(None);
    }
    let bytes = std::slice::from_raw_parts(ptr, len);
    std::str::from_utf8(bytes).map(Some).map_err(|_| ())
}

/// Read a required UTF-8 argument.
///
/// # Safety
/// See [`opt_str`].
unsafe fn req_str<'a>(ptr: *const u8, len: usize, what: &str) -> Option<&'a str> {
    match opt_str(ptr, len) {
        Ok(Some(s)) => Some(s),
        Ok(None) => {
            eprintln!("fsl: {what} must not be null");
            None
        }
        Err(()) => {
            eprintln!("fsl: {what} is not valid UTF-8");
            None
        }
    }
}

/// Parse FSL source into a new tree.
///
/// `filename` is optional (null) and only used as the display name in
/// diagnostics and source maps.
///
/// # Safety
/// `bytes` must point to `len` readable bytes; `filename`, when
/// non-null, to `filename_len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn fsl_parse(
    bytes: *const u8,
    len: usize,
    filename: *const u8,
    filename_len: usize,
) -> *mut SchemaTree {
    let Some(source) = req_str(bytes, len, "source") else {
        return std::ptr::null_mut();
    };
    let name = match opt_str(filename, filename_len) {
        Ok(name) => name.unwrap_or("schema.fsl"),
        Err(()) => {
            eprintln!("fsl: filename is not valid UTF-8");
            return std::ptr::null_mut();
        }
    };
    match fsl::parse(source, name) {
        Ok(tree) => Box::into_raw(Box::new(tree)),
        Err(err) => {
            eprintln!("fsl: {err}");
            std::ptr::null_mut()
        }
    }
}

/// Deep-duplicate a tree.
///
/// # Safety
/// `tree` must be a live handle from this library or null.
#[no_mangle]
pub unsafe extern "C" fn fsl_clone(tree: *const SchemaTree) -> *mut SchemaTree {
    if tree.is_null() {
        eprintln!("fsl: clone called with null tree");
        return std::ptr::null_mut();
    }
    Box::into_raw(Box::new((*tree).clone()))
}

/// Destroy a tree and release everything it owns.
///
/// # Safety
/// `tree` must be a live handle from this library or null; the handle
/// must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn fsl_dispose(tree: *mut SchemaTree) {
    if !tree.is_null() {
        drop(Box::from_raw(tree));
    }
}

/// Number of declarations, or -1 for a null handle.
///
/// # Safety
/// `tree` must be a live handle from this library or null.
#[no_mangle]
pub unsafe extern "C" fn fsl_length(tree: *const SchemaTree) -> i64 {
    if tree.is_null() {
        eprintln!("fsl: length called with null tree");
        return -1;
    }
    (*tree).len() as i64
}

/// Stable sort by (kind, name), in place.
///
/// # Safety
/// `tree` must be a live handle from this library or null.
#[no_mangle]
pub unsafe extern "C" fn fsl_sort(tree: *mut SchemaTree) {
    if tree.is_null() {
        eprintln!("fsl: sort called with null tree");
        return;
    }
    (*tree).sort();
}

/// Merge two trees into a new one. Consumes both input handles, even on
/// failure.
///
/// # Safety
/// `a` and `b` must be live handles from this library or null; neither
/// may be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn fsl_merge_trees(
    a: *mut SchemaTree,
    b: *mut SchemaTree,
) -> *mut SchemaTree {
    let a = if a.is_null() {
        None
    } else {
        Some(*Box::from_raw(a))
    };
    let b = if b.is_null() {
        None
    } else {
        Some(*Box::from_raw(b))
    };
    match (a, b) {
        (Some(a), Some(b)) => Box::into_raw(Box::new(a.merge(b))),
        _ => {
            eprintln!("fsl: merge_trees called with null tree");
            std::ptr::null_mut()
        }
    }
}

/// Link functions in place; returns the `{original: mangled}` JSON.
///
/// # Safety
/// `tree` must be a live handle from this library or null.
#[no_mangle]
pub unsafe extern "C" fn fsl_link_functions(tree: *mut SchemaTree) -> FslBytes {
    if tree.is_null() {
        eprintln!("fsl: link_functions called with null tree");
        return FslBytes::null();
    }
    let map = match fsl::link_functions(&mut *tree) {
        Ok(map) => map,
        Err(err) => {
            eprintln!("fsl: {err}");
            return FslBytes::null();
        }
    };
    match serde_json::to_vec(&map) {
        Ok(json) => FslBytes::from_vec(json),
        Err(err) => {
            eprintln!("fsl: {err}");
            FslBytes::null()
        }
    }
}

/// Merge same-named roles into a new tree. Consumes the input handle,
/// even on failure.
///
/// # Safety
/// `tree` must be a live handle from this library or null; it must not
/// be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn fsl_merge_roles(tree: *mut SchemaTree) -> *mut SchemaTree {
    if tree.is_null() {
        eprintln!("fsl: merge_roles called with null tree");
        return std::ptr::null_mut();
    }
    let tree = *Box::from_raw(tree);
    match fsl::merge_roles(tree) {
        Ok(merged) => Box::into_raw(Box::new(merged)),
        Err(err) => {
            eprintln!("fsl: {err}");
            std::ptr::null_mut()
        }
    }
}

/// A new tree holding only declarations of the given kind.
///
/// # Safety
/// `tree` must be a live handle from this library or null; `kind` must
/// point to `kind_len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn fsl_filter_by_kind(
    tree: *const SchemaTree,
    kind: *const u8,
    kind_len: usize,
) -> *mut SchemaTree {
    if tree.is_null() {
        eprintln!("fsl: filter_by_kind called with null tree");
        return std::ptr::null_mut();
    }
    let Some(kind) = req_str(kind, kind_len, "kind") else {
        return std::ptr::null_mut();
    };
    match kind.parse::<DeclarationKind>() {
        Ok(kind) => Box::into_raw(Box::new((*tree).filter(kind))),
        Err(err) => {
            eprintln!("fsl: {err}");
            std::ptr::null_mut()
        }
    }
}

/// Remove the first declaration matching kind and name, in place.
///
/// Returns the same handle; null on an invalid kind string (the input
/// handle stays valid and unchanged).
///
/// # Safety
/// `tree` must be a live handle from this library or null; `kind` and
/// `name` must point to readable bytes of their stated lengths.
#[no_mangle]
pub unsafe extern "C" fn fsl_remove_declaration(
    tree: *mut SchemaTree,
    kind: *const u8,
    kind_len: usize,
    name: *const u8,
    name_len: usize,
) -> *mut SchemaTree {
    if tree.is_null() {
        eprintln!("fsl: remove_declaration called with null tree");
        return std::ptr::null_mut();
    }
    let Some(kind) = req_str(kind, kind_len, "kind") else {
        return std::ptr::null_mut();
    };
    let Some(name) = req_str(name, name_len, "name") else {
        return std::ptr::null_mut();
    };
    match kind.parse::<DeclarationKind>() {
        Ok(kind) => {
            (*tree).remove(kind, name);
            tree
        }
        Err(err) => {
            eprintln!("fsl: {err}");
            std::ptr::null_mut()
        }
    }
}

/// Delete privilege members naming `name` from every role, in place.
///
/// # Safety
/// `tree` must be a live handle from this library or null; `name` must
/// point to `name_len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn fsl_strip_roles_resource(
    tree: *mut SchemaTree,
    name: *const u8,
    name_len: usize,
) {
    if tree.is_null() {
        eprintln!("fsl: strip_roles_resource called with null tree");
        return;
    }
    let Some(name) = req_str(name, name_len, "name") else {
        return;
    };
    (*tree).strip_roles_resource(name);
}

/// The declarations listing as JSON bytes.
///
/// # Safety
/// `tree` must be a live handle from this library or null.
#[no_mangle]
pub unsafe extern "C" fn fsl_list_declarations(tree: *const SchemaTree) -> FslBytes {
    if tree.is_null() {
        eprintln!("fsl: list_declarations called with null tree");
        return FslBytes::null();
    }
    match (*tree).list_declarations_json() {
        Ok(json) => FslBytes::from_vec(json.into_bytes()),
        Err(err) => {
            eprintln!("fsl: {err}");
            FslBytes::null()
        }
    }
}

/// Canonical text of a tree.
///
/// `source_map_filename` enables inline source-map emission;
/// `mangled_map_json` (`{original: mangled}`) and `sources_json`
/// (`{filename: content}`) refine it. Malformed auxiliary JSON degrades
/// to a map without symbol or content information.
///
/// # Safety
/// `tree` must be a live handle from this library or null; each string
/// argument, when non-null, must point to readable bytes of its stated
/// length.
#[no_mangle]
pub unsafe extern "C" fn fsl_canonical(
    tree: *const SchemaTree,
    source_map_filename: *const u8,
    source_map_filename_len: usize,
    mangled_map_json: *const u8,
    mangled_map_json_len: usize,
    sources_json: *const u8,
    sources_json_len: usize,
) -> FslBytes {
    if tree.is_null() {
        eprintln!("fsl: canonical called with null tree");
        return FslBytes::null();
    }
    let (Ok(source_map_file), Ok(mangled), Ok(sources)) = (
        opt_str(source_map_filename, source_map_filename_len),
        opt_str(mangled_map_json, mangled_map_json_len),
        opt_str(sources_json, sources_json_len),
    ) else {
        eprintln!("fsl: canonical arguments are not valid UTF-8");
        return FslBytes::null();
    };
    let out = canonical_request(
        &*tree,
        &CanonicalRequest {
            source_map_file,
            mangled_map_json: mangled,
            sources_json: sources,
        },
    );
    FslBytes::from_vec(out.into_bytes())
}

/// TypeScript declarations derived from the tree's collections.
///
/// # Safety
/// `tree` must be a live handle from this library or null.
#[no_mangle]
pub unsafe extern "C" fn fsl_typescript_definitions(tree: *const SchemaTree) -> FslBytes {
    if tree.is_null() {
        eprintln!("fsl: typescript_definitions called with null tree");
        return FslBytes::null();
    }
    FslBytes::from_vec(fsl::typescript_definitions(&*tree).into_bytes())
}

/// Release a byte run previously returned by this library.
///
/// # Safety
/// `bytes` must have been returned by this library and not yet freed.
#[no_mangle]
pub unsafe extern "C" fn fsl_free_bytes(bytes: FslBytes) {
    if bytes.ptr.is_null() {
        return;
    }
    drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
        bytes.ptr, bytes.len,
    )));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_handle(source: &str) -> *mut SchemaTree {
        unsafe {
            fsl_parse(
                source.as_ptr(),
                source.len(),
                "test.fsl".as_ptr(),
                "test.fsl".len(),
            )
        }
    }

    fn bytes_to_string(bytes: FslBytes) -> String {
        assert!(!bytes.ptr.is_null());
        let s = unsafe {
            std::str::from_utf8(std::slice::from_raw_parts(bytes.ptr, bytes.len))
                .unwrap()
                .to_string()
        };
        unsafe { fsl_free_bytes(bytes) };
        s
    }

    #[test]
    fn parse_length_dispose() {
        let tree = parse_handle("collection A { }\nrole r { }");
        assert!(!tree.is_null());
        unsafe {
            assert_eq!(fsl_length(tree), 2);
            fsl_dispose(tree);
        }
    }

    #[test]
    fn parse_error_returns_null() {
        let source = "collection {";
        let tree = unsafe { fsl_parse(source.as_ptr(), source.len(), std::ptr::null(), 0) };
        assert!(tree.is_null());
    }

    #[test]
    fn canonical_bytes_round_trip() {
        let tree = parse_handle("collection A {\n}\n");
        let out = unsafe {
            fsl_canonical(tree, std::ptr::null(), 0, std::ptr::null(), 0, std::ptr::null(), 0)
        };
        assert_eq!(bytes_to_string(out), "collection A {\n}\n");
        unsafe { fsl_dispose(tree) };
    }

    #[test]
    fn link_functions_returns_map_json() {
        let tree = parse_handle("function f() { 1 }");
        let out = unsafe { fsl_link_functions(tree) };
        let json = bytes_to_string(out);
        let map: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(map["f"].as_str().unwrap().starts_with("f_"));
        unsafe { fsl_dispose(tree) };
    }

    #[test]
    fn merge_trees_consumes_and_concatenates() {
        let a = parse_handle("collection A { }");
        let b = parse_handle("collection B { }");
        let merged = unsafe { fsl_merge_trees(a, b) };
        assert!(!merged.is_null());
        unsafe {
            assert_eq!(fsl_length(merged), 2);
            fsl_dispose(merged);
        }
    }

    #[test]
    fn filter_rejects_unknown_kind() {
        let tree = parse_handle("collection A { }");
        let kind = "table";
        let filtered = unsafe { fsl_filter_by_kind(tree, kind.as_ptr(), kind.len()) };
        assert!(filtered.is_null());
        unsafe { fsl_dispose(tree) };
    }

    #[test]
    fn remove_declaration_in_place() {
        let tree = parse_handle("collection A { }\ncollection B { }");
        let kind = "collection";
        let name = "A";
        let returned = unsafe {
            fsl_remove_declaration(tree, kind.as_ptr(), kind.len(), name.as_ptr(), name.len())
        };
        assert_eq!(returned, tree);
        unsafe {
            assert_eq!(fsl_length(tree), 1);
            fsl_dispose(tree);
        }
    }

    #[test]
    fn merge_roles_conflict_returns_null() {
        let tree = parse_handle(
            "role R {\n  membership U { .a }\n}\nrole R {\n  membership U { .b }\n}",
        );
        let merged = unsafe { fsl_merge_roles(tree) };
        assert!(merged.is_null());
        // tree handle was consumed; nothing left to dispose
    }
}
