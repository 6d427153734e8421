//! Hex-string pattern translation to regex source (spec.md §4.4).

use crate::ir::{HexAltItem, HexString, HexToken};

/// Translate a hex string (bytes, `??` wildcards, jumps, byte-alternations)
/// into an equivalent regex source string.
pub fn to_regex_source(hex: &HexString) -> String {
    let mut out = String::new();
    let mut wildcard_run = 0usize;

    for token in &hex.tokens {
        match token {
            HexToken::Byte(b) => {
                flush_wildcards(&mut out, &mut wildcard_run);
                out.push_str(&format!("\\x{:02x}", b));
            }
            HexToken::Wildcard => {
                wildcard_run += 1;
            }
            HexToken::Jump { min, max } => {
                flush_wildcards(&mut out, &mut wildcard_run);
                out.push_str(&jump_to_regex(*min, *max));
            }
            HexToken::Alt(items) => {
                flush_wildcards(&mut out, &mut wildcard_run);
                out.push_str("(?:");
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        HexAltItem::Byte(b) => format!("\\x{:02x}", b),
                        HexAltItem::Wildcard => ".".to_string(),
                    })
                    .collect();
                out.push_str(&parts.join("|"));
                out.push(')');
            }
        }
    }

    flush_wildcards(&mut out, &mut wildcard_run);
    out
}

fn flush_wildcards(out: &mut String, run: &mut usize) {
    match *run {
        0 => {}
        1 => out.push('.'),
        k => out.push_str(&format!(".{{{}}}", k)),
    }
    *run = 0;
}

fn jump_to_regex(min: Option<u32>, max: Option<u32>) -> String {
    match (min, max) {
        (None, None) => ".*".to_string(),
        (Some(n), None) => format!(".{{{},}}", n),
        (None, Some(m)) => format!(".{{0,{}}}", m),
        (Some(n), Some(m)) if n == m => format!(".{{{}}}", n),
        (Some(n), Some(m)) => format!(".{{{},{}}}", n, m),
    }
}
