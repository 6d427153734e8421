//! # Compiled Multi-Pattern Rule Scanner
//!
//! This crate compiles a YARA-style rule set — plain-text, hex, and regular
//! expression string definitions tied together by a boolean condition — into
//! an efficient multi-pattern matcher and evaluates it against a byte buffer.
//!
//! The surface syntax of a rule set (the `.yar` grammar) is not parsed here;
//! callers hand this crate an already-parsed [`ir::RuleSet`]. This crate's
//! job begins at the compiled-artifact boundary: building an Aho-Corasick
//! automaton over every literal and regex atom, compiling the rule strings
//! into verification patterns, and running the scan/condition pipeline.
//!
//! ```text
//! ir::RuleSet -> compiler::compile -> rules::Rules -> Rules::scan_mem -> callback::ScanCallback
//! ```

pub mod atom;
pub mod automaton;
pub mod callback;
pub mod compiler;
pub mod condition;
pub mod error;
pub mod ir;
pub mod prefilter;
pub mod rules;
pub mod scan;

pub use callback::{CollectingCallback, MatchRule, MatchString, Meta, ScanCallback};
pub use compiler::options::CompileOptions;
pub use compiler::compile;
pub use error::{CompileError, ScanError};
pub use ir::RuleSet;
pub use rules::Rules;
pub use scan::ScanFlags;
