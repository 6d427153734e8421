//! The condition expression evaluator (spec.md §4.6, "C6").

use std::collections::HashMap;

use crate::ir::{BinOp, Expr};

/// Everything a condition needs to resolve against: per-string match
/// positions (already collected by the scan driver), the scanned buffer for
/// the fixed-width integer intrinsics, and the rule's string names in
/// declaration order for `any/all of` resolution.
pub struct EvalContext<'a> {
    pub matches_by_name: &'a HashMap<String, Vec<usize>>,
    pub buffer: &'a [u8],
    pub rule_string_names: &'a [String],
}

/// Evaluate `expr` as a boolean.
pub fn eval_bool(expr: &Expr, ctx: &EvalContext) -> bool {
    match expr {
        Expr::StringRef(name) => has_matches(ctx, name),
        Expr::AtExpr(name, pos_expr) => {
            let pos = eval_int(pos_expr, ctx);
            ctx.matches_by_name
                .get(name)
                .map_or(false, |positions| positions.iter().any(|&p| p as i64 == pos))
        }
        Expr::IntLit(n) => *n != 0,
        Expr::FuncCall(..) => eval_int(expr, ctx) != 0,
        Expr::BinaryExpr(BinOp::And, l, r) => eval_bool(l, ctx) && eval_bool(r, ctx),
        Expr::BinaryExpr(BinOp::Or, l, r) => eval_bool(l, ctx) || eval_bool(r, ctx),
        Expr::BinaryExpr(BinOp::Eq, l, r) => eval_int(l, ctx) == eval_int(r, ctx),
        Expr::ParenExpr(inner) => eval_bool(inner, ctx),
        Expr::AnyOf(pattern) => {
            let names = resolve_names(pattern, ctx.rule_string_names);
            names.iter().any(|n| has_matches(ctx, n))
        }
        Expr::AllOf(pattern) => {
            let names = resolve_names(pattern, ctx.rule_string_names);
            if names.is_empty() {
                false
            } else {
                names.iter().all(|n| has_matches(ctx, n))
            }
        }
    }
}

/// Evaluate `expr` as a signed 64-bit integer.
pub fn eval_int(expr: &Expr, ctx: &EvalContext) -> i64 {
    match expr {
        Expr::IntLit(n) => *n,
        Expr::FuncCall(name, args) => eval_intrinsic(name, args, ctx),
        Expr::ParenExpr(inner) => eval_int(inner, ctx),
        Expr::BinaryExpr(BinOp::Eq, l, r) => (eval_int(l, ctx) == eval_int(r, ctx)) as i64,
        Expr::BinaryExpr(BinOp::And, l, r) => (eval_bool(l, ctx) && eval_bool(r, ctx)) as i64,
        Expr::BinaryExpr(BinOp::Or, l, r) => (eval_bool(l, ctx) || eval_bool(r, ctx)) as i64,
        Expr::StringRef(name) => has_matches(ctx, name) as i64,
        Expr::AtExpr(..) | Expr::AnyOf(..) | Expr::AllOf(..) => eval_bool(expr, ctx) as i64,
    }
}

fn has_matches(ctx: &EvalContext, name: &str) -> bool {
    ctx.matches_by_name.get(name).map_or(false, |v| !v.is_empty())
}

/// Resolve an `any/all of` pattern to a list of rule-local string names:
/// `"them"` means every string in the rule, a trailing `*` is a prefix
/// match, otherwise it is an exact name.
fn resolve_names<'a>(pattern: &str, names: &'a [String]) -> Vec<&'a str> {
    if pattern == "them" {
        return names.iter().map(|s| s.as_str()).collect();
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        return names
            .iter()
            .filter(|n| n.starts_with(prefix))
            .map(|s| s.as_str())
            .collect();
    }

    names
        .iter()
        .filter(|n| n.as_str() == pattern)
        .map(|s| s.as_str())
        .collect()
}

fn eval_intrinsic(name: &str, args: &[Expr], ctx: &EvalContext) -> i64 {
    let pos = args.first().map(|e| eval_int(e, ctx)).unwrap_or(0);

    match name {
        "uint8" => read_uint(ctx.buffer, pos, 1, false),
        "uint16" => read_uint(ctx.buffer, pos, 2, false),
        "uint32" => read_uint(ctx.buffer, pos, 4, false),
        "uint16be" => read_uint(ctx.buffer, pos, 2, true),
        "uint32be" => read_uint(ctx.buffer, pos, 4, true),
        // Unknown function names evaluate to 0 (spec.md §4.6).
        _ => 0,
    }
}

fn read_uint(buf: &[u8], pos: i64, width: usize, big_endian: bool) -> i64 {
    if pos < 0 {
        return 0;
    }

    let start = pos as usize;
    let end = match start.checked_add(width) {
        Some(e) => e,
        None => return 0,
    };

    if end > buf.len() {
        return 0;
    }

    let bytes = &buf[start..end];
    let value: u64 = if big_endian {
        bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
    } else {
        bytes.iter().rev().fold(0u64, |acc, &b| (acc << 8) | b as u64)
    };

    value as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(
        matches: &'a HashMap<String, Vec<usize>>,
        buffer: &'a [u8],
        names: &'a [String],
    ) -> EvalContext<'a> {
        EvalContext {
            matches_by_name: matches,
            buffer,
            rule_string_names: names,
        }
    }

    #[test]
    fn string_ref_true_iff_non_empty() {
        let mut m = HashMap::new();
        m.insert("a".to_string(), vec![5]);
        let names = vec!["a".to_string(), "b".to_string()];
        let c = ctx(&m, b"", &names);

        assert!(eval_bool(&Expr::StringRef("a".to_string()), &c));
        assert!(!eval_bool(&Expr::StringRef("b".to_string()), &c));
    }

    #[test]
    fn all_of_them_is_false_on_empty_ruleset() {
        let m = HashMap::new();
        let names: Vec<String> = vec![];
        let c = ctx(&m, b"", &names);
        assert!(!eval_bool(&Expr::AllOf("them".to_string()), &c));
    }

    #[test]
    fn gif_magic_condition() {
        let mut m = HashMap::new();
        m.insert("php".to_string(), vec![6]);
        let names = vec!["php".to_string()];
        let buf = b"GIF89a<?php x";
        let c = ctx(&m, buf, &names);

        let cond = Expr::and(
            Expr::StringRef("php".to_string()),
            Expr::or(
                Expr::and(
                    Expr::eq(
                        Expr::FuncCall("uint32be".to_string(), vec![Expr::IntLit(0)]),
                        Expr::IntLit(0x4749_4638),
                    ),
                    Expr::eq(
                        Expr::FuncCall("uint16be".to_string(), vec![Expr::IntLit(4)]),
                        Expr::IntLit(0x3961),
                    ),
                ),
                Expr::and(
                    Expr::eq(
                        Expr::FuncCall("uint32be".to_string(), vec![Expr::IntLit(0)]),
                        Expr::IntLit(0x4749_4638),
                    ),
                    Expr::eq(
                        Expr::FuncCall("uint16be".to_string(), vec![Expr::IntLit(4)]),
                        Expr::IntLit(0x3761),
                    ),
                ),
            ),
        );

        assert!(eval_bool(&cond, &c));
    }

    #[test]
    fn out_of_range_read_is_zero() {
        let m = HashMap::new();
        let names: Vec<String> = vec![];
        let c = ctx(&m, b"ab", &names);
        let v = eval_int(&Expr::FuncCall("uint32".to_string(), vec![Expr::IntLit(0)]), &c);
        assert_eq!(v, 0);
    }

    #[test]
    fn any_of_wildcard_prefix() {
        let mut m = HashMap::new();
        m.insert("s1".to_string(), vec![0]);
        let names = vec!["s1".to_string(), "s2".to_string(), "other".to_string()];
        let c = ctx(&m, b"", &names);
        assert!(eval_bool(&Expr::AnyOf("s*".to_string()), &c));
    }
}
