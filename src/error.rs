//! Error taxonomy for compilation and scanning.
//!

use thiserror::Error;

/// Errors raised while compiling a [`RuleSet`](crate::ir::RuleSet) into
/// [`Rules`](crate::rules::Rules).
///
/// These are only ever returned from [`compiler::compile`](crate::compiler::compile)
/// when the corresponding [`CompileOptions`](crate::compiler::options::CompileOptions)
/// flag that would otherwise downgrade them to a warning is unset.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("rule `{rule}`, string `{string}`: invalid regex: {source}")]
    InvalidRegex {
        rule: String,
        string: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule `{rule}`, string `{string}`: unsupported pattern: {reason}")]
    UnsupportedPattern {
        rule: String,
        string: String,
        reason: String,
    },

    #[error("rule `{rule}`, string `{string}`: regex yields no atoms and full-buffer scans are disabled")]
    AtomRequired { rule: String, string: String },
}

/// Errors raised while scanning a buffer against compiled [`Rules`](crate::rules::Rules).
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("scan exceeded its deadline")]
    Timeout,

    #[error("callback returned an error: {0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
