//! Parsed-rule input data model.
//!
//! The YARA surface-syntax parser is an external collaborator (spec.md §1):
//! this crate never lexes or parses `.yar` source. What it does own is the
//! shape of the tree a parser must hand it — [`RuleSet`], [`Rule`],
//! [`StringDef`], and the condition [`Expr`] — so that [`compiler::compile`]
//! has something concrete to compile.

use std::fmt;

/// A full set of parsed rules, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

/// A single parsed rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub meta: Vec<(String, MetaValue)>,
    pub strings: Vec<StringDef>,
    pub condition: Option<Expr>,
}

/// A metadata value: either free text or a signed 64-bit integer.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Text(String),
    Int(i64),
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MetaValue::Text(s) => write!(f, "{}", s),
            MetaValue::Int(n) => write!(f, "{}", n),
        }
    }
}

/// A named string definition within a rule.
#[derive(Debug, Clone)]
pub struct StringDef {
    /// Without the leading `$`.
    pub name: String,
    pub value: StringValue,
    pub modifiers: StringModifiers,
}

/// The value kind of a string definition.
#[derive(Debug, Clone)]
pub enum StringValue {
    Text(Vec<u8>),
    Hex(HexString),
    Regex(RegexString),
}

/// Modifiers that may be attached to any [`StringDef`].
///
/// `wide`, `nocase`, `xor`, `base64wide`, `ascii`, and `private` are accepted
/// here (spec.md §6) but are not implemented by the core (spec.md §9) — they
/// are parsed and retained so callers can inspect them, but the compiler
/// silently ignores them unless noted otherwise per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringModifiers {
    pub base64: bool,
    pub base64wide: bool,
    pub fullword: bool,
    pub wide: bool,
    pub ascii: bool,
    pub nocase: bool,
    pub xor: bool,
    pub private: bool,
}

/// A hex string pattern: a sequence of byte/wildcard/jump/alternation tokens.
#[derive(Debug, Clone)]
pub struct HexString {
    pub tokens: Vec<HexToken>,
}

#[derive(Debug, Clone)]
pub enum HexToken {
    Byte(u8),
    Wildcard,
    /// `[n]`, `[n-m]`, `[-]`, `[n-]`, `[-m]`.
    Jump { min: Option<u32>, max: Option<u32> },
    /// `(AB|CD|??)`.
    Alt(Vec<HexAltItem>),
}

#[derive(Debug, Clone)]
pub enum HexAltItem {
    Byte(u8),
    Wildcard,
}

/// A regular-expression string pattern, with its own inline modifiers.
#[derive(Debug, Clone)]
pub struct RegexString {
    pub pattern: String,
    pub modifiers: RegexModifiers,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegexModifiers {
    pub case_insensitive: bool,
    pub dot_matches_all: bool,
    pub multiline: bool,
}

/// The condition expression tree (spec.md §4.6).
#[derive(Debug, Clone)]
pub enum Expr {
    StringRef(String),
    AtExpr(String, Box<Expr>),
    IntLit(i64),
    FuncCall(String, Vec<Expr>),
    BinaryExpr(BinOp, Box<Expr>, Box<Expr>),
    ParenExpr(Box<Expr>),
    AnyOf(String),
    AllOf(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    And,
    Or,
    Eq,
}

impl Expr {
    pub fn and(l: Expr, r: Expr) -> Self {
        Expr::BinaryExpr(BinOp::And, Box::new(l), Box::new(r))
    }

    pub fn or(l: Expr, r: Expr) -> Self {
        Expr::BinaryExpr(BinOp::Or, Box::new(l), Box::new(r))
    }

    pub fn eq(l: Expr, r: Expr) -> Self {
        Expr::BinaryExpr(BinOp::Eq, Box::new(l), Box::new(r))
    }
}
