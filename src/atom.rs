//! Literal atom extraction from regex source text (spec.md §4.3, "C3").
//!
//! An atom is a literal byte run that any full match of a regex is
//! guaranteed to contain. The automaton can then act as a cheap prefilter
//! for the (comparatively expensive) regex engine: a regex with atoms only
//! runs when one of its atoms has already been seen in the haystack.

use std::collections::HashSet;

/// Programming tokens common enough in real input that an atom built purely
/// from them is nearly useless as a discriminator.
const DENYLIST: &[&str] = &["return", "function", "var", "();", "="];

/// Extract required literal atoms from `pattern`, or `None` ("no atoms") if
/// no substring can be shown to be present in every full match.
///
/// `min_len` is the minimum atom length to consider (spec.md default: 3).
pub fn extract_atoms(pattern: &str, min_len: usize) -> Option<Vec<Vec<u8>>> {
    let chars: Vec<char> = pattern.chars().collect();
    extract(&chars, min_len)
}

fn extract(chars: &[char], min_len: usize) -> Option<Vec<Vec<u8>>> {
    if let Some(branches) = split_top_level_alternation(chars) {
        let mut atoms = Vec::new();
        for branch in branches {
            match extract(&branch, min_len) {
                Some(mut a) => atoms.append(&mut a),
                // Any branch without a qualifying atom makes the whole
                // alternation unsafe to summarise: a match could have taken
                // that branch and contain none of the other atoms.
                None => return None,
            }
        }
        return if atoms.is_empty() { None } else { Some(atoms) };
    }

    let (runs, groups) = walk(chars);
    let mut best: Option<(u32, Vec<Vec<u8>>)> = None;

    for run in runs {
        if run.len() < min_len || is_denied(&run) {
            continue;
        }
        let q = score_atom(&run);
        if best.as_ref().map_or(true, |(bq, _)| q > *bq) {
            best = Some((q, vec![run]));
        }
    }

    for (inner, mandatory) in groups {
        if !mandatory {
            continue;
        }
        if let Some(group_atoms) = extract(&inner, min_len) {
            // The alternation's guaranteed strength is only as good as its
            // weakest branch.
            let q = group_atoms.iter().map(|a| score_atom(a)).min().unwrap_or(0);
            if best.as_ref().map_or(true, |(bq, _)| q > *bq) {
                best = Some((q, group_atoms));
            }
        }
    }

    best.map(|(_, atoms)| atoms)
}

/// Split `chars` at every top-level (paren-depth 0, outside character
/// classes) `|`. Returns `None` if there is no such pipe.
fn split_top_level_alternation(chars: &[char]) -> Option<Vec<Vec<char>>> {
    let n = chars.len();
    let mut depth = 0i32;
    let mut branches = Vec::new();
    let mut start = 0;
    let mut i = 0;
    let mut found = false;

    while i < n {
        match chars[i] {
            '\\' => {
                i += 2;
            }
            '[' => {
                i = skip_class(chars, i);
            }
            '(' => {
                depth += 1;
                i += 1;
            }
            ')' => {
                depth -= 1;
                i += 1;
            }
            '|' if depth == 0 => {
                found = true;
                branches.push(chars[start..i].to_vec());
                start = i + 1;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    if !found {
        return None;
    }

    branches.push(chars[start..n].to_vec());
    Some(branches)
}

/// Given `i` pointing at a `[`, return the index just past its matching `]`,
/// treating a leading `^` and a leading `]` as ordinary members.
fn skip_class(chars: &[char], i: usize) -> usize {
    let n = chars.len();
    let mut j = i + 1;
    if j < n && chars[j] == '^' {
        j += 1;
    }
    if j < n && chars[j] == ']' {
        j += 1;
    }
    while j < n && chars[j] != ']' {
        if chars[j] == '\\' {
            j += 2;
        } else {
            j += 1;
        }
    }
    if j < n {
        j += 1;
    }
    j
}

/// Find the index of the `)` matching the `(` at `open`.
fn find_matching_paren(chars: &[char], open: usize) -> usize {
    let n = chars.len();
    let mut depth = 1;
    let mut i = open + 1;

    while i < n {
        match chars[i] {
            '\\' => {
                i += 2;
            }
            '[' => {
                i = skip_class(chars, i);
            }
            '(' => {
                depth += 1;
                i += 1;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    n.saturating_sub(1)
}

/// Parse an optional quantifier starting at `idx`. Returns whether the
/// quantified thing is mandatory (must occur at least once) and how many
/// characters the quantifier itself consumed.
fn parse_quantifier(chars: &[char], idx: usize) -> (bool, usize) {
    if idx >= chars.len() {
        return (true, 0);
    }

    match chars[idx] {
        '?' | '*' => (false, 1),
        '+' => (true, 1),
        '{' => {
            let mut j = idx;
            while j < chars.len() && chars[j] != '}' {
                j += 1;
            }
            if j >= chars.len() {
                return (true, 0);
            }

            let inner: String = chars[idx + 1..j].iter().collect();
            let consumed = j - idx + 1;

            let mandatory = if inner.starts_with(',') {
                // `{,N}` means `{0,N}`.
                false
            } else {
                match inner.split(',').next().unwrap_or("").parse::<u32>() {
                    Ok(0) => false,
                    _ => true,
                }
            };

            (mandatory, consumed)
        }
        _ => (true, 0),
    }
}

/// Strip a leading non-capturing-group marker `?:` from group contents.
fn strip_non_capturing(inner: Vec<char>) -> Vec<char> {
    if inner.len() >= 2 && inner[0] == '?' && inner[1] == ':' {
        inner[2..].to_vec()
    } else {
        inner
    }
}

/// Walk `chars` left to right, collecting literal runs and top-level
/// `(...)` groups (with whether each is mandatory).
fn walk(chars: &[char]) -> (Vec<Vec<u8>>, Vec<(Vec<char>, bool)>) {
    let n = chars.len();
    let mut runs = Vec::new();
    let mut groups = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut i = 0;

    while i < n {
        match chars[i] {
            '\\' => {
                if i + 1 >= n {
                    i += 1;
                    continue;
                }

                match chars[i + 1] {
                    'x' if i + 3 < n => {
                        let hex: String = chars[i + 2..i + 4].iter().collect();
                        if let Ok(b) = u8::from_str_radix(&hex, 16) {
                            current.push(b);
                            i += 4;
                        } else {
                            i += 2;
                        }
                    }
                    'n' => {
                        current.push(b'\n');
                        i += 2;
                    }
                    'r' => {
                        current.push(b'\r');
                        i += 2;
                    }
                    't' => {
                        current.push(b'\t');
                        i += 2;
                    }
                    '0' => {
                        current.push(0u8);
                        i += 2;
                    }
                    'd' | 'D' | 'w' | 'W' | 's' | 'S' => {
                        flush(&mut current, &mut runs);
                        i += 2;
                    }
                    // zero-width: neighbouring literals stay contiguous.
                    'b' | 'B' => {
                        i += 2;
                    }
                    other => {
                        push_char(&mut current, other);
                        i += 2;
                    }
                }
            }
            '^' | '$' => {
                i += 1;
            }
            '.' => {
                flush(&mut current, &mut runs);
                i += 1;
            }
            '[' => {
                flush(&mut current, &mut runs);
                i = skip_class(chars, i);
            }
            '(' => {
                flush(&mut current, &mut runs);
                let close = find_matching_paren(chars, i);
                let inner: Vec<char> = chars[i + 1..close].to_vec();
                let (mandatory, consumed) = parse_quantifier(chars, close + 1);
                groups.push((strip_non_capturing(inner), mandatory));
                i = close + 1 + consumed;
            }
            '|' => {
                // No top-level alternation reaches here (split out already);
                // a stray pipe inside a recursed branch still just breaks
                // the run.
                flush(&mut current, &mut runs);
                i += 1;
            }
            '*' | '?' => {
                current.pop();
                flush(&mut current, &mut runs);
                i += 1;
            }
            '+' => {
                flush(&mut current, &mut runs);
                i += 1;
            }
            '{' => {
                let (mandatory, consumed) = parse_quantifier(chars, i);
                if consumed == 0 {
                    // No closing brace: not a real quantifier, treat '{' as
                    // a literal character.
                    push_char(&mut current, '{');
                    i += 1;
                } else {
                    if !mandatory {
                        current.pop();
                    }
                    flush(&mut current, &mut runs);
                    i += consumed;
                }
            }
            other => {
                push_char(&mut current, other);
                i += 1;
            }
        }
    }

    flush(&mut current, &mut runs);
    (runs, groups)
}

fn push_char(current: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    current.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

fn flush(current: &mut Vec<u8>, runs: &mut Vec<Vec<u8>>) {
    if !current.is_empty() {
        runs.push(std::mem::take(current));
    }
}

fn is_common_byte(b: u8) -> bool {
    b == b' ' || b == b'\n'
}

fn score_byte(b: u8) -> u32 {
    if is_common_byte(b) {
        12
    } else if b.is_ascii_alphabetic() {
        18
    } else {
        20
    }
}

/// Atom quality score (spec.md §4.3).
fn score_atom(bytes: &[u8]) -> u32 {
    let sum: u32 = bytes.iter().map(|&b| score_byte(b)).sum();
    let distinct = bytes.iter().collect::<HashSet<_>>().len() as u32;
    let mut total = sum + 2 * distinct;

    if distinct == 1 && is_common_byte(bytes[0]) {
        total = total.saturating_sub(10 * bytes.len() as u32);
    }

    total
}

fn is_denied(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(s) => DENYLIST.contains(&s.trim()),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atoms_of(pattern: &str) -> Option<Vec<String>> {
        extract_atoms(pattern, 3).map(|atoms| {
            atoms
                .into_iter()
                .map(|a| String::from_utf8(a).unwrap())
                .collect()
        })
    }

    #[test]
    fn plain_literal() {
        assert_eq!(atoms_of("abcdef"), Some(vec!["abcdef".to_string()]));
    }

    #[test]
    fn nested_alternation_yields_all_branches() {
        assert_eq!(
            atoms_of("go(unlink|fwrite|password|eval)"),
            Some(vec![
                "unlink".to_string(),
                "fwrite".to_string(),
                "password".to_string(),
                "eval".to_string(),
            ])
        );
    }

    #[test]
    fn top_level_alternation_splits_into_branches() {
        let atoms = atoms_of("cat|dog|bird").unwrap();
        assert_eq!(atoms, vec!["cat", "dog", "bird"]);
    }

    #[test]
    fn optional_trailing_group_excluded_and_preceding_literal_kept() {
        assert_eq!(atoms_of("malware(xyz)?"), Some(vec!["malware".to_string()]));
    }

    #[test]
    fn no_atoms_when_everything_is_a_wildcard() {
        assert_eq!(extract_atoms(r"\d+", 3), None);
    }

    #[test]
    fn denylisted_atom_is_rejected() {
        assert_eq!(extract_atoms("return", 3), None);
    }

    #[test]
    fn run_of_spaces_is_heavily_penalised_below_a_real_literal() {
        // "    " (4 spaces) should lose to a following real word when both
        // are candidates via alternation.
        let atoms = extract_atoms("    |word", 3).unwrap();
        assert!(atoms.iter().any(|a| a == b"word"));
    }

    #[test]
    fn hex_escape_and_named_escapes_decode_to_literal_bytes() {
        assert_eq!(extract_atoms(r"\x41\x42\x43", 3), Some(vec![b"ABC".to_vec()]));
        assert_eq!(extract_atoms(r"a\nb\tc", 3), Some(vec![b"a\nb\tc".to_vec()]));
    }

    #[test]
    fn word_boundary_does_not_split_surrounding_literal() {
        assert_eq!(extract_atoms(r"\bsecret\b", 3), Some(vec![b"secret".to_vec()]));
    }

    #[test]
    fn plus_quantifier_keeps_preceding_run() {
        // "ab+" : "ab" is flushed once the quantifier is seen (it applies to
        // "b" alone, but since "b" is mandatory the run up to it is sound).
        let atoms = extract_atoms("ab+cdef", 3).unwrap();
        assert!(atoms.iter().any(|a| a == b"ab" || a == b"cdef"));
    }

    #[test]
    fn optional_bounded_quantifier_drops_the_quantified_byte() {
        // "b{0,2}" may occur zero times, so every atom must exclude it: a
        // real match can be as short as "abcdef".
        let atoms = extract_atoms("abcb{0,2}def", 3).unwrap();
        for a in &atoms {
            assert!(b"abcdef".windows(a.len()).any(|w| w == a.as_slice()));
        }
    }

    #[test]
    fn mandatory_bounded_quantifier_keeps_the_quantified_byte() {
        // "b{1,2}" must occur at least once, so the run up to and including
        // it stays intact.
        let atoms = extract_atoms("abcb{1,2}def", 3).unwrap();
        assert!(atoms.iter().any(|a| a == b"abcb"));
    }
}
