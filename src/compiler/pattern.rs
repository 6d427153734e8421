//! Pattern and regex back-reference tables (spec.md §3 "Pattern", "Regex entry").

use super::regex_engine::RegexEngine;

/// What role a pattern fed into the automaton plays once it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRole {
    /// A real rule string; a hit is itself a recordable match.
    Direct,
    /// A literal extracted from a regex; a hit only triggers verification
    /// of the regex at `regex_idx`.
    Atom { regex_idx: usize },
}

/// Everything the scan driver needs to know about an automaton pattern id
/// beyond its bytes, which the automaton already owns.
#[derive(Debug, Clone)]
pub struct PatternInfo {
    pub rule_idx: usize,
    pub string_name: String,
    pub role: PatternRole,
    pub fullword: bool,
}

/// A compiled regex plus its back-reference to the rule string that defined
/// it and whether atom extraction succeeded for it.
#[derive(Debug)]
pub struct RegexEntry {
    pub rule_idx: usize,
    pub string_name: String,
    pub engine: Box<dyn RegexEngine>,
    pub has_atom: bool,
}
