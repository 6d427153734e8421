//! The compiled rule set (spec.md §3 "Compiled rule", §6 "Public operations").

use std::path::Path;
use std::time::Duration;

use crate::automaton::Automaton;
use crate::callback::ScanCallback;
use crate::compiler::pattern::{PatternInfo, RegexEntry};
use crate::compiler::CompiledRule;
use crate::error::ScanError;
use crate::prefilter::Prefilter;
use crate::scan::{self, RegexTiming, ScanFlags};

/// An immutable, compiled set of rules, produced once by
/// [`compiler::compile`](crate::compiler::compile) and safe to scan
/// concurrently from any number of threads.
#[derive(Debug)]
pub struct Rules {
    pub(crate) automaton: Automaton,
    pub(crate) patterns: Vec<PatternInfo>,
    pub(crate) regexes: Vec<RegexEntry>,
    pub(crate) prefilter: Option<Prefilter>,
    pub(crate) compiled_rules: Vec<CompiledRule>,
    pub(crate) max_pattern_len: usize,
    warnings: Vec<String>,
}

impl Rules {
    pub(crate) fn new(
        automaton: Automaton,
        patterns: Vec<PatternInfo>,
        regexes: Vec<RegexEntry>,
        prefilter: Option<Prefilter>,
        compiled_rules: Vec<CompiledRule>,
        warnings: Vec<String>,
        max_pattern_len: usize,
    ) -> Self {
        Rules {
            automaton,
            patterns,
            regexes,
            prefilter,
            compiled_rules,
            max_pattern_len,
            warnings,
        }
    }

    /// Scan an in-memory buffer, invoking `cb` once per matching rule.
    pub fn scan_mem(
        &self,
        buf: &[u8],
        flags: ScanFlags,
        timeout: Duration,
        cb: &mut dyn ScanCallback,
    ) -> Result<(), ScanError> {
        scan::scan_mem(self, buf, flags, timeout, cb)
    }

    /// Read `path` into memory and delegate to [`Rules::scan_mem`].
    pub fn scan_file(
        &self,
        path: &Path,
        flags: ScanFlags,
        timeout: Duration,
        cb: &mut dyn ScanCallback,
    ) -> Result<(), ScanError> {
        let buf = std::fs::read(path)?;
        self.scan_mem(&buf, flags, timeout, cb)
    }

    pub fn num_rules(&self) -> usize {
        self.compiled_rules.len()
    }

    /// `(ac_pattern_count, regex_pattern_count)`.
    pub fn stats(&self) -> (usize, usize) {
        (self.patterns.len(), self.regexes.len())
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Diagnostic entry point: run the same match/verify pipeline as
    /// `scan_mem` but return per-regex timing instead of invoking a
    /// callback.
    pub fn regex_profile(&self, buf: &[u8]) -> Vec<RegexTiming> {
        scan::regex_profile(self, buf)
    }
}
