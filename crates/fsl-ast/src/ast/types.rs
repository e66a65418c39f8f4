//! FQL type expressions.
//!
//! Unlike expression bodies, FQL *types* are fully parsed: collection
//! aliases, field annotations, function signatures and computed-field
//! annotations all carry structured types that the TypeScript emitter and
//! code equality walk.

use crate::ast::node::TextNode;

/// A parsed FQL type expression.
///
/// Closed variant set: the canonical printer, code equality and the
/// TypeScript emitter are exhaustive matches, so adding a variant flags
/// every site that needs updating.
#[derive(Debug, Clone)]
pub enum FqlType {
    /// A named type: `String`, `Number`, `User`, …
    Named(TextNode),
    /// An object type: `{ name: String, age?: Number, *: Any }`
    Object {
        fields: Vec<ObjectField>,
        /// Type of the `*` wildcard entry, if present.
        wildcard: Option<Box<FqlType>>,
    },
    /// A union: `A | B` (left associative)
    Union(Box<FqlType>, Box<FqlType>),
    /// A postfix-optional type: `T?`
    Optional(Box<FqlType>),
    /// A template application: `Ref<User>`, `Array<String>`
    Template {
        name: TextNode,
        params: Vec<FqlType>,
    },
    /// A tuple: `[String, Number]`
    Tuple(Vec<FqlType>),
    /// A string literal type: `"active"`
    StringLiteral(TextNode),
    /// A number literal type: `0`, `1.5`
    NumberLiteral(TextNode),
    /// A function type: `(A, B) => C` or short form `A => C`
    Function {
        params: FnParams,
        ret: Box<FqlType>,
    },
    /// A parenthesized type kept distinct for faithful printing: `(T)`
    Isolated(Box<FqlType>),
}

/// One field of an object type.
#[derive(Debug, Clone)]
pub struct ObjectField {
    pub key: TextNode,
    pub ty: FqlType,
    pub optional: bool,
}

/// Parameter list of a function type.
#[derive(Debug, Clone)]
pub enum FnParams {
    /// Short form without parentheses: `T => R`
    Short(Box<FqlType>),
    /// Long form: `(A, B) => R`, optionally variadic `(A, ...B) => R`
    Long {
        types: Vec<FqlType>,
        variadic: Option<Box<FqlType>>,
    },
}

impl FqlType {
    /// Convenience constructor for a named type without a location.
    pub fn named(name: impl Into<String>) -> Self {
        FqlType::Named(TextNode::synthetic(name))
    }
}
