//! The rule compiler (spec.md §4.4, "C4").
//!
//! Turns a parsed [`RuleSet`](crate::ir::RuleSet) into a [`Rules`](crate::rules::Rules):
//! a pattern list for the automaton, a regex table linked to atoms, and the
//! per-rule metadata and condition trees the scan driver and evaluator need.

pub mod base64;
pub mod hex;
pub mod options;
pub mod pattern;
pub mod regex_engine;

use log::warn;

use crate::atom;
use crate::automaton::Automaton;
use crate::error::CompileError;
use crate::ir::{Expr, MetaValue, RuleSet, StringValue};
use crate::prefilter::{Prefilter, PrefilterBuilder};
use crate::rules::Rules;

use options::CompileOptions;
use pattern::{PatternInfo, PatternRole, RegexEntry};

/// A single rule's compiled (non-matching) artifacts: everything the
/// condition evaluator and callback need once strings have been matched.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    pub meta: Vec<(String, MetaValue)>,
    pub string_names: Vec<String>,
    pub condition: Option<Expr>,
}

/// Compile `rule_set` into a [`Rules`] object, per `options`.
pub fn compile(rule_set: &RuleSet, options: &CompileOptions) -> Result<Rules, CompileError> {
    let mut pattern_bytes: Vec<Vec<u8>> = Vec::new();
    let mut patterns: Vec<PatternInfo> = Vec::new();
    let mut regexes: Vec<RegexEntry> = Vec::new();
    let mut compiled_rules: Vec<CompiledRule> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    'rules: for rule in &rule_set.rules {
        if let Some(type_value) = rule.meta.iter().find(|(k, _)| k == "type") {
            if let MetaValue::Text(t) = &type_value.1 {
                if !t.is_empty() && options.skip_types.iter().any(|s| s == t) {
                    warn!("rule `{}`: skipped (type `{}` matches skip filter)", rule.name, t);
                    warnings.push(format!(
                        "rule `{}`: skipped (type `{}` matches skip filter)",
                        rule.name, t
                    ));
                    continue 'rules;
                }
            }
        }

        let rule_idx = compiled_rules.len();
        let string_names: Vec<String> = rule.strings.iter().map(|s| s.name.clone()).collect();

        for string_def in &rule.strings {
            match &string_def.value {
                StringValue::Text(bytes) => {
                    if string_def.modifiers.base64 {
                        for rotation in base64::rotations(bytes) {
                            if rotation.is_empty() {
                                continue;
                            }
                            patterns.push(PatternInfo {
                                rule_idx,
                                string_name: string_def.name.clone(),
                                role: PatternRole::Direct,
                                fullword: string_def.modifiers.fullword,
                            });
                            pattern_bytes.push(rotation);
                        }
                    } else {
                        patterns.push(PatternInfo {
                            rule_idx,
                            string_name: string_def.name.clone(),
                            role: PatternRole::Direct,
                            fullword: string_def.modifiers.fullword,
                        });
                        pattern_bytes.push(bytes.clone());
                    }
                }

                StringValue::Hex(hex) => {
                    let mut bad_jump = false;
                    for token in &hex.tokens {
                        if let crate::ir::HexToken::Jump { min: Some(n), max: Some(m) } = token {
                            if n > m {
                                bad_jump = true;
                                break;
                            }
                        }
                    }

                    if bad_jump {
                        let err = CompileError::UnsupportedPattern {
                            rule: rule.name.clone(),
                            string: string_def.name.clone(),
                            reason: "hex jump minimum exceeds its maximum".to_string(),
                        };
                        if options.skip_invalid_regex {
                            warn!("{}", err);
                            warnings.push(err.to_string());
                            continue;
                        }
                        return Err(err);
                    }

                    let source = hex::to_regex_source(hex);
                    compile_regex_source(
                        rule_idx,
                        &rule.name,
                        &string_def.name,
                        &source,
                        false,
                        false,
                        false,
                        options,
                        &mut pattern_bytes,
                        &mut patterns,
                        &mut regexes,
                        &mut warnings,
                    )?;
                }

                StringValue::Regex(re) => {
                    compile_regex_source(
                        rule_idx,
                        &rule.name,
                        &string_def.name,
                        &re.pattern,
                        re.modifiers.case_insensitive,
                        re.modifiers.dot_matches_all,
                        re.modifiers.multiline,
                        options,
                        &mut pattern_bytes,
                        &mut patterns,
                        &mut regexes,
                        &mut warnings,
                    )?;
                }
            }
        }

        compiled_rules.push(CompiledRule {
            name: rule.name.clone(),
            meta: rule.meta.clone(),
            string_names,
            condition: rule.condition.clone(),
        });
    }

    let mut prefilter_builder = PrefilterBuilder::new();
    for p in &pattern_bytes {
        prefilter_builder.add(p);
    }

    let max_pattern_len = pattern_bytes.iter().map(|p| p.len()).max().unwrap_or(1);
    let automaton = Automaton::build(pattern_bytes);
    let prefilter: Option<Prefilter> = prefilter_builder.build();

    Ok(Rules::new(
        automaton,
        patterns,
        regexes,
        prefilter,
        compiled_rules,
        warnings,
        max_pattern_len,
    ))
}

#[allow(clippy::too_many_arguments)]
fn compile_regex_source(
    rule_idx: usize,
    rule_name: &str,
    string_name: &str,
    source: &str,
    case_insensitive: bool,
    dot_matches_all: bool,
    multiline: bool,
    options: &CompileOptions,
    pattern_bytes: &mut Vec<Vec<u8>>,
    patterns: &mut Vec<PatternInfo>,
    regexes: &mut Vec<RegexEntry>,
    warnings: &mut Vec<String>,
) -> Result<(), CompileError> {
    let compiled = match regex_engine::compile(
        source,
        case_insensitive,
        dot_matches_all,
        multiline,
        options.max_quantifier_bound,
    ) {
        Ok(c) => c,
        Err(e) => {
            let err = CompileError::InvalidRegex {
                rule: rule_name.to_string(),
                string: string_name.to_string(),
                source: e,
            };
            if options.skip_invalid_regex {
                warn!("{}", err);
                warnings.push(err.to_string());
                return Ok(());
            }
            return Err(err);
        }
    };

    let atoms = atom::extract_atoms(source, options.min_atom_len);
    let regex_idx = regexes.len();

    match atoms {
        Some(atoms) => {
            for atom_bytes in atoms {
                patterns.push(PatternInfo {
                    rule_idx,
                    string_name: string_name.to_string(),
                    role: PatternRole::Atom { regex_idx },
                    fullword: false,
                });
                pattern_bytes.push(atom_bytes);
            }
            regexes.push(RegexEntry {
                rule_idx,
                string_name: string_name.to_string(),
                engine: Box::new(compiled),
                has_atom: true,
            });
        }
        None => {
            if options.skip_full_buffer_scan_regex {
                let err = CompileError::AtomRequired {
                    rule: rule_name.to_string(),
                    string: string_name.to_string(),
                };
                warn!("{}", err);
                warnings.push(err.to_string());
            } else {
                regexes.push(RegexEntry {
                    rule_idx,
                    string_name: string_name.to_string(),
                    engine: Box::new(compiled),
                    has_atom: false,
                });
            }
        }
    }

    Ok(())
}
