//! The scan callback contract (spec.md §6 "Callback contract").

use std::fmt;

/// One metadata entry carried through to a [`MatchRule`].
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    pub key: String,
    pub value: String,
}

/// One recorded string hit within a matching rule.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchString {
    pub name: String,
    pub data: Vec<u8>,
}

/// A rule that matched during a scan, ready to hand to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRule {
    pub rule: String,
    pub metas: Vec<Meta>,
    pub strings: Vec<MatchString>,
}

/// The capability the scan driver invokes once per matching rule.
///
/// Exactly one method is ever called: `rule_matching`. Returning
/// `Ok(true)` stops further callbacks for this scan (without error);
/// returning `Err` aborts the scan with that error.
pub trait ScanCallback {
    fn rule_matching(
        &mut self,
        m: MatchRule,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// The default callback: appends every matching rule to a `Vec`, never
/// aborts.
#[derive(Debug, Default)]
pub struct CollectingCallback {
    pub matches: Vec<MatchRule>,
}

impl CollectingCallback {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScanCallback for CollectingCallback {
    fn rule_matching(
        &mut self,
        m: MatchRule,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        self.matches.push(m);
        Ok(false)
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.rule)
    }
}
