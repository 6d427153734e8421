//! Compile-time options (spec.md §6 "Compile options").

/// Options controlling how [`compiler::compile`](super::compile) reacts to
/// recoverable problems in the input rule set.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// On regex compile failure, emit a warning and drop the string instead
    /// of failing compilation outright.
    pub skip_invalid_regex: bool,

    /// Reject (warn-and-drop) regexes for which atom extraction returns
    /// nothing, rather than falling back to a full-buffer scan.
    pub skip_full_buffer_scan_regex: bool,

    /// Drop rules whose `type` metadata (when present and non-empty)
    /// matches any of these values.
    pub skip_types: Vec<String>,

    /// Quantifier bounds above this are clamped before the pattern reaches
    /// the regex engine (spec.md §4.4, §6).
    pub max_quantifier_bound: u32,

    /// Minimum atom length considered by the atom extractor (spec.md §4.3).
    pub min_atom_len: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            skip_invalid_regex: false,
            skip_full_buffer_scan_regex: false,
            skip_types: Vec::new(),
            max_quantifier_bound: 1000,
            min_atom_len: 3,
        }
    }
}
