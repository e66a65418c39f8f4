//! Parse error reporting.
//!
//! The first error aborts; every error carries a resolved position plus
//! expected/found descriptions.

use fsl_parser::parse;

#[test]
fn missing_collection_name() {
    let err = parse("collection { }", "err.fsl").expect_err("should fail");
    assert_eq!(err.file.to_str(), Some("err.fsl"));
    assert_eq!(err.line, 1);
    assert_eq!(err.column, 12);
    assert_eq!(err.expected, "collection name");
    assert_eq!(err.found, "`{`");
}

#[test]
fn unterminated_body() {
    let err = parse("function f() { x", "err.fsl").expect_err("should fail");
    assert_eq!(err.expected, "`}`");
    assert_eq!(err.found, "end of input");
}

#[test]
fn stray_token_at_top_level() {
    let err = parse("collection A { }\n42", "err.fsl").expect_err("should fail");
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 1);
    assert_eq!(err.expected, "declaration");
    assert_eq!(err.found, "`42`");
}

#[test]
fn unknown_privilege_action() {
    let err = parse("role r { privileges Users { grant } }", "err.fsl").expect_err("should fail");
    assert_eq!(err.expected, "privilege action");
    assert_eq!(err.found, "`grant`");
}

#[test]
fn error_position_on_later_line() {
    let source = "collection A {\n  name: String\n  bad!\n}";
    let err = parse(source, "err.fsl").expect_err("should fail");
    assert_eq!(err.line, 3);
}

#[test]
fn display_mentions_location_and_expectation() {
    let err = parse("role { }", "err.fsl").expect_err("should fail");
    let message = err.to_string();
    assert!(message.contains("err.fsl:1:6"), "message: {message}");
    assert!(message.contains("role name"), "message: {message}");
}

#[test]
fn first_error_aborts() {
    // Both declarations are malformed; only the first is reported.
    let err = parse("collection {\nrole { }", "err.fsl").expect_err("should fail");
    assert_eq!(err.expected, "collection name");
}
