//! The scan driver (spec.md §4.5, "C5").
//!
//! Wires C1 (automaton) and C2 (prefilter) together into a raw match
//! stream, verifies atom candidates against their regexes, and gates each
//! candidate rule through C6 before invoking the caller's callback.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::automaton::state::StateId;
use crate::callback::{MatchRule, MatchString, Meta, ScanCallback};
use crate::compiler::pattern::PatternRole;
use crate::error::ScanError;
use crate::ir::MetaValue;
use crate::condition::{eval_bool, EvalContext};
use crate::prefilter::EffectivenessState;
use crate::rules::Rules;

/// Scan-time flags. Currently reserved (spec.md §4.5 takes `flags` but does
/// not define any).
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanFlags;

/// Diagnostic output of [`Rules::regex_profile`](crate::rules::Rules::regex_profile).
#[derive(Debug, Clone)]
pub struct RegexTiming {
    pub rule: String,
    pub string: String,
    pub pattern_source: String,
    pub matched_atoms: usize,
    pub extracted_atoms: usize,
    pub total_verify_duration: Duration,
    pub verify_call_count: u32,
}

const VERIFY_WINDOW: usize = 512;

#[derive(Default)]
struct RuleMatches {
    /// Insertion order: automaton hits first (in haystack position order),
    /// then regex verifications (spec.md §5 ordering guarantees).
    order: Vec<(String, Vec<u8>)>,
    positions: HashMap<String, Vec<usize>>,
}

impl RuleMatches {
    fn record(&mut self, name: &str, data: Vec<u8>, pos: usize) {
        self.positions.entry(name.to_string()).or_default().push(pos);
        self.order.push((name.to_string(), data));
    }

    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

pub fn scan_mem(
    rules: &Rules,
    buf: &[u8],
    _flags: ScanFlags,
    timeout: Duration,
    cb: &mut dyn ScanCallback,
) -> Result<(), ScanError> {
    if rules.patterns.is_empty() && rules.regexes.is_empty() {
        return Ok(());
    }

    let deadline = Instant::now().checked_add(timeout);
    if let Some(d) = deadline {
        if Instant::now() > d {
            return Err(ScanError::Timeout);
        }
    }

    let mut rule_matches: Vec<RuleMatches> =
        (0..rules.compiled_rules.len()).map(|_| RuleMatches::default()).collect();
    let mut atom_candidates: HashMap<usize, Vec<usize>> = HashMap::new();

    run_automaton(rules, buf, |pattern_id, start, end| {
        dispatch_hit(rules, buf, pattern_id, start, end, &mut rule_matches, &mut atom_candidates);
    });

    for (regex_idx, positions) in atom_candidates.iter_mut() {
        positions.sort_unstable();
        positions.dedup();
        verify_atom_candidates(rules, buf, *regex_idx, positions, &mut rule_matches);
    }

    for entry in rules.regexes.iter() {
        if entry.has_atom {
            continue;
        }
        if let Some((s, e)) = entry.engine.find_first(buf) {
            rule_matches[entry.rule_idx].record(&entry.string_name, buf[s..e].to_vec(), s);
        }
    }

    let candidate_rule_ids: Vec<usize> = (0..rule_matches.len())
        .filter(|&i| !rule_matches[i].is_empty())
        .collect();

    for rule_idx in candidate_rule_ids {
        if let Some(d) = deadline {
            if Instant::now() > d {
                return Err(ScanError::Timeout);
            }
        }

        let compiled = &rules.compiled_rules[rule_idx];
        let rm = &mut rule_matches[rule_idx];
        for positions in rm.positions.values_mut() {
            positions.sort_unstable();
        }

        let condition = match &compiled.condition {
            Some(c) => c,
            None => continue,
        };

        let ctx = EvalContext {
            matches_by_name: &rm.positions,
            buffer: buf,
            rule_string_names: &compiled.string_names,
        };

        if !eval_bool(condition, &ctx) {
            continue;
        }

        let metas = compiled
            .meta
            .iter()
            .map(|(k, v)| Meta { key: k.clone(), value: meta_value_to_string(v) })
            .collect();

        let strings = rm
            .order
            .iter()
            .map(|(name, data)| MatchString { name: name.clone(), data: data.clone() })
            .collect();

        let m = MatchRule { rule: compiled.name.clone(), metas, strings };

        let abort = cb
            .rule_matching(m)
            .map_err(ScanError::Callback)?;

        if abort {
            return Ok(());
        }
    }

    Ok(())
}

/// Diagnostic variant of the first six steps of [`scan_mem`]: verifies every
/// candidate window instead of stopping at the first hit, and reports
/// timing instead of invoking a callback.
pub fn regex_profile(rules: &Rules, buf: &[u8]) -> Vec<RegexTiming> {
    let mut atom_candidates: HashMap<usize, Vec<usize>> = HashMap::new();

    run_automaton(rules, buf, |pattern_id, start, _end| {
        if let PatternRole::Atom { regex_idx } = rules.patterns[pattern_id].role {
            atom_candidates.entry(regex_idx).or_default().push(start);
        }
    });

    let extracted_atoms: Vec<usize> = rules
        .regexes
        .iter()
        .enumerate()
        .map(|(idx, _)| {
            rules
                .patterns
                .iter()
                .filter(|p| matches!(p.role, PatternRole::Atom { regex_idx } if regex_idx == idx))
                .count()
        })
        .collect();

    rules
        .regexes
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let mut total = Duration::ZERO;
            let mut calls = 0u32;
            let matched_atoms;

            if entry.has_atom {
                let mut positions = atom_candidates.remove(&idx).unwrap_or_default();
                positions.sort_unstable();
                positions.dedup();
                matched_atoms = positions.len();

                for p in positions {
                    let start = p.saturating_sub(VERIFY_WINDOW);
                    let end = (p + VERIFY_WINDOW).min(buf.len());
                    let t0 = Instant::now();
                    let _ = entry.engine.find_first(&buf[start..end]);
                    total += t0.elapsed();
                    calls += 1;
                }
            } else {
                matched_atoms = 0;
                let t0 = Instant::now();
                let _ = entry.engine.find_first(buf);
                total += t0.elapsed();
                calls += 1;
            }

            RegexTiming {
                rule: rules.compiled_rules[entry.rule_idx].name.clone(),
                string: entry.string_name.clone(),
                pattern_source: entry.engine.source().to_string(),
                matched_atoms,
                extracted_atoms: extracted_atoms[idx],
                total_verify_duration: total,
                verify_call_count: calls,
            }
        })
        .collect()
}

/// Step through the automaton over the full buffer, consulting the
/// prefilter (when present and effective) while sitting at the start state,
/// invoking `on_hit(pattern_id, start, end)` for every overlapping match.
fn run_automaton(rules: &Rules, buf: &[u8], mut on_hit: impl FnMut(usize, usize, usize)) {
    let automaton = &rules.automaton;
    let start_state = automaton.start();
    let mut state = start_state;
    let mut pos = 0usize;
    let mut effectiveness = EffectivenessState::new(rules.max_pattern_len);

    for item in automaton.matches_at(state) {
        on_hit(item.pattern_id, 0, 0);
    }

    while pos < buf.len() {
        if state == start_state {
            if let Some(pf) = &rules.prefilter {
                if effectiveness.is_effective(pos) {
                    match pf.next_candidate(buf, pos) {
                        Some(candidate) if candidate > pos => {
                            trace!("prefilter: skipped {} bytes ({pos}..{candidate})", candidate - pos);
                            if effectiveness.record_skip(pos, candidate) {
                                debug!(
                                    "prefilter: going inert after {} skips averaging {:.1} bytes (<= 2x max pattern length {}); scanning byte-by-byte for the rest of this scan",
                                    effectiveness.skip_count(),
                                    effectiveness.bytes_skipped() as f64 / effectiveness.skip_count() as f64,
                                    rules.max_pattern_len,
                                );
                            }
                            pos = candidate;
                            continue;
                        }
                        Some(_) => {}
                        None => break,
                    }
                }
            }
        }

        let byte = buf[pos];
        pos += 1;
        state = automaton.next_state_no_fail(state, byte);

        for item in automaton.matches_at(state) {
            on_hit(item.pattern_id, pos - item.length, pos);
        }

        if state == StateId::DEAD {
            break;
        }
    }
}

fn dispatch_hit(
    rules: &Rules,
    buf: &[u8],
    pattern_id: usize,
    start: usize,
    end: usize,
    rule_matches: &mut [RuleMatches],
    atom_candidates: &mut HashMap<usize, Vec<usize>>,
) {
    let info = &rules.patterns[pattern_id];

    match info.role {
        PatternRole::Atom { regex_idx } => {
            atom_candidates.entry(regex_idx).or_default().push(start);
        }
        PatternRole::Direct => {
            if info.fullword && !passes_fullword(buf, start, end) {
                return;
            }
            rule_matches[info.rule_idx].record(&info.string_name, buf[start..end].to_vec(), start);
        }
    }
}

fn verify_atom_candidates(
    rules: &Rules,
    buf: &[u8],
    regex_idx: usize,
    positions: &[usize],
    rule_matches: &mut [RuleMatches],
) {
    let entry = &rules.regexes[regex_idx];

    for &p in positions {
        let window_start = p.saturating_sub(VERIFY_WINDOW);
        let window_end = (p + VERIFY_WINDOW).min(buf.len());

        if let Some((s, e)) = entry.engine.find_first(&buf[window_start..window_end]) {
            let abs_start = window_start + s;
            let abs_end = window_start + e;
            rule_matches[entry.rule_idx].record(
                &entry.string_name,
                buf[abs_start..abs_end].to_vec(),
                abs_start,
            );
            // Only the first successful verification per regex is needed:
            // the rule only needs existence, not enumeration.
            break;
        }
    }
}

fn passes_fullword(buf: &[u8], start: usize, end: usize) -> bool {
    let before_ok = start == 0 || !is_word_byte(buf[start - 1]);
    let after_ok = end == buf.len() || !is_word_byte(buf[end]);
    before_ok && after_ok
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn meta_value_to_string(v: &MetaValue) -> String {
    v.to_string()
}
