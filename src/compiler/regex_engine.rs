//! The regex-engine collaborator (spec.md §6).
//!
//! The compiler never assumes a particular regex backend; it only relies on
//! the three operations below. [`RegexAdapter`] supplies them on top of the
//! `regex` crate's byte-oriented engine.

use std::fmt;

/// A compiled regex handle plus everything the scan driver and profiler need
/// to know about where it came from.
pub trait RegexEngine: fmt::Debug + Send + Sync {
    /// Find the first match in `haystack`, if any.
    fn find_first(&self, haystack: &[u8]) -> Option<(usize, usize)>;

    /// The original source pattern, for diagnostics.
    fn source(&self) -> &str;
}

/// Compile `pattern` with the requested inline flags.
pub fn compile(
    pattern: &str,
    case_insensitive: bool,
    dot_matches_all: bool,
    multiline: bool,
    max_quantifier_bound: u32,
) -> Result<RegexAdapter, regex::Error> {
    let rewritten = clamp_quantifiers(pattern, max_quantifier_bound);

    let compiled = regex::bytes::RegexBuilder::new(&rewritten)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(dot_matches_all)
        .multi_line(multiline)
        .build()?;

    Ok(RegexAdapter {
        compiled,
        source: pattern.to_string(),
    })
}

#[derive(Debug)]
pub struct RegexAdapter {
    compiled: regex::bytes::Regex,
    source: String,
}

impl RegexEngine for RegexAdapter {
    fn find_first(&self, haystack: &[u8]) -> Option<(usize, usize)> {
        self.compiled.find(haystack).map(|m| (m.start(), m.end()))
    }

    fn source(&self) -> &str {
        &self.source
    }
}

/// Rewrite `{,N}` to `{0,N}` and clamp any explicit quantifier upper bound
/// above `max_bound` down to it (spec.md §4.4, §6, §9).
///
/// This is a lightweight textual rewrite, not a full regex parse: it scans
/// for `{...}` groups and only touches ones that look like quantifiers
/// (digits, commas, no other content), leaving character classes and
/// literal braces untouched.
fn clamp_quantifiers(pattern: &str, max_bound: u32) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;
    let n = chars.len();
    let mut in_class = false;

    while i < n {
        let c = chars[i];

        if c == '\\' && i + 1 < n {
            out.push(c);
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }

        if c == '[' && !in_class {
            in_class = true;
            out.push(c);
            i += 1;
            continue;
        }

        if c == ']' && in_class {
            in_class = false;
            out.push(c);
            i += 1;
            continue;
        }

        if c == '{' && !in_class {
            if let Some((rewritten, consumed)) = try_rewrite_quantifier(&chars[i..], max_bound) {
                out.push_str(&rewritten);
                i += consumed;
                continue;
            }
        }

        out.push(c);
        i += 1;
    }

    out
}

/// If `chars` (starting at `{`) is a well-formed `{n}` / `{n,}` / `{n,m}` /
/// `{,m}` quantifier, return its clamped rewrite and how many source
/// characters it consumed. Otherwise return `None` and let the caller treat
/// the `{` literally.
fn try_rewrite_quantifier(chars: &[char], max_bound: u32) -> Option<(String, usize)> {
    let close = chars.iter().position(|&c| c == '}')?;
    let body: String = chars[1..close].iter().collect();

    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || c == ',') {
        return None;
    }

    let clamp = |s: &str| -> Option<u32> {
        if s.is_empty() {
            None
        } else {
            s.parse::<u32>().ok().map(|v| v.min(max_bound))
        }
    };

    let rewritten = if let Some(comma) = body.find(',') {
        let (min_s, max_s) = (&body[..comma], &body[comma + 1..]);
        let min_v = clamp(min_s).unwrap_or(0);
        match clamp(max_s) {
            Some(max_v) => format!("{{{},{}}}", min_v, max_v),
            None => format!("{{{},}}", min_v),
        }
    } else {
        let v = clamp(&body)?;
        format!("{{{}}}", v)
    };

    Some((rewritten, close + 1))
}
