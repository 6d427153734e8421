//! End-to-end scenarios (spec.md §8, "Concrete end-to-end scenarios").
//!
//! Each test builds a [`RuleSet`] directly (this crate never parses `.yar`
//! source itself) and drives it through [`compiler::compile`] and
//! [`Rules::scan_mem`], exactly the path a real caller takes.

use rulescan::ir::{
    BinOp, Expr, HexString, MetaValue, Rule, RuleSet, StringDef, StringModifiers, StringValue,
};
use rulescan::{CollectingCallback, CompileOptions, ScanFlags};
use std::time::Duration;

fn text_string(name: &str, text: &[u8]) -> StringDef {
    StringDef {
        name: name.to_string(),
        value: StringValue::Text(text.to_vec()),
        modifiers: StringModifiers::default(),
    }
}

fn rule(name: &str, strings: Vec<StringDef>, condition: Expr) -> Rule {
    Rule {
        name: name.to_string(),
        meta: Vec::new(),
        strings,
        condition: Some(condition),
    }
}

fn scan(rules: &rulescan::Rules, buf: &[u8]) -> Vec<String> {
    let mut cb = CollectingCallback::new();
    rules
        .scan_mem(buf, ScanFlags::default(), Duration::from_secs(5), &mut cb)
        .expect("scan_mem should not error");
    cb.matches.into_iter().map(|m| m.rule).collect()
}

#[test]
fn scenario_1_php_tag() {
    let rs = RuleSet {
        rules: vec![rule(
            "php_tag",
            vec![text_string("php", b"<?php")],
            Expr::AnyOf("them".to_string()),
        )],
    };
    let rules = rulescan::compile(&rs, &CompileOptions::default()).unwrap();

    let mut cb = CollectingCallback::new();
    rules
        .scan_mem(
            b"hello <?php echo 'world'; ?>",
            ScanFlags::default(),
            Duration::from_secs(5),
            &mut cb,
        )
        .unwrap();

    assert_eq!(cb.matches.len(), 1);
    let m = &cb.matches[0];
    assert_eq!(m.rule, "php_tag");
    assert_eq!(m.strings.len(), 1);
    assert_eq!(m.strings[0].name, "php");
    assert_eq!(m.strings[0].data, b"<?php");
}

#[test]
fn scenario_2_base64_secret() {
    let mut s = text_string("s", b"secret");
    s.modifiers.base64 = true;

    let rs = RuleSet {
        rules: vec![rule("base64_secret", vec![s], Expr::AnyOf("them".to_string()))],
    };
    let rules = rulescan::compile(&rs, &CompileOptions::default()).unwrap();

    assert_eq!(scan(&rules, b"data: c2VjcmV0"), vec!["base64_secret"]);
    assert_eq!(scan(&rules, b"data: AHNlY3JldA"), vec!["base64_secret"]);
    assert!(scan(&rules, b"data: not_encoded").is_empty());
}

#[test]
fn scenario_3_fullword_boundary() {
    let mut s = text_string("s", b"test");
    s.modifiers.fullword = true;

    let rs = RuleSet {
        rules: vec![rule("boundary", vec![s], Expr::AnyOf("them".to_string()))],
    };
    let rules = rulescan::compile(&rs, &CompileOptions::default()).unwrap();

    assert_eq!(scan(&rules, b"this is a test here"), vec!["boundary"]);
    assert!(scan(&rules, b"testing").is_empty());
    assert_eq!(scan(&rules, b"abc test."), vec!["boundary"]);
    assert!(scan(&rules, b"123test").is_empty());
}

#[test]
fn scenario_4_gif_magic_condition() {
    let cond = Expr::and(
        Expr::StringRef("php".to_string()),
        Expr::BinaryExpr(
            BinOp::Or,
            Box::new(Expr::and(
                Expr::eq(
                    Expr::FuncCall("uint32be".to_string(), vec![Expr::IntLit(0)]),
                    Expr::IntLit(0x4749_4638),
                ),
                Expr::eq(
                    Expr::FuncCall("uint16be".to_string(), vec![Expr::IntLit(4)]),
                    Expr::IntLit(0x3961),
                ),
            )),
            Box::new(Expr::and(
                Expr::eq(
                    Expr::FuncCall("uint32be".to_string(), vec![Expr::IntLit(0)]),
                    Expr::IntLit(0x4749_4638),
                ),
                Expr::eq(
                    Expr::FuncCall("uint16be".to_string(), vec![Expr::IntLit(4)]),
                    Expr::IntLit(0x3761),
                ),
            )),
        ),
    );

    let rs = RuleSet {
        rules: vec![rule("gif_magic", vec![text_string("php", b"<?php")], cond)],
    };
    let rules = rulescan::compile(&rs, &CompileOptions::default()).unwrap();

    assert_eq!(scan(&rules, b"GIF89a<?php rest"), vec!["gif_magic"]);
    assert_eq!(scan(&rules, b"GIF87a<?php rest"), vec!["gif_magic"]);
    assert!(scan(&rules, b"\x89PNG\r\n<?php rest").is_empty());
}

#[test]
fn scenario_5_nested_alternation_regex_atoms() {
    let s = StringDef {
        name: "s".to_string(),
        value: StringValue::Regex(rulescan::ir::RegexString {
            pattern: "go(unlink|fwrite|password|eval)".to_string(),
            modifiers: Default::default(),
        }),
        modifiers: StringModifiers::default(),
    };

    let rs = RuleSet {
        rules: vec![rule("nested", vec![s], Expr::AnyOf("them".to_string()))],
    };
    let rules = rulescan::compile(&rs, &CompileOptions::default()).unwrap();

    // the regex has atoms, so this string must be linked via C3, not
    // compiled as a full-buffer fallback.
    assert_eq!(rules.stats().1, 1);

    assert_eq!(scan(&rules, b"x gopassword x"), vec!["nested"]);
    assert!(scan(&rules, b"go something").is_empty());
}

#[test]
fn scenario_6_rule_ordering_is_compilation_order() {
    let make = |name: &str| {
        rule(
            name,
            vec![text_string("test", b"test")],
            Expr::AnyOf("them".to_string()),
        )
    };

    let rs = RuleSet {
        rules: vec![make("rule_ccc"), make("rule_aaa"), make("rule_bbb")],
    };
    let rules = rulescan::compile(&rs, &CompileOptions::default()).unwrap();

    for _ in 0..3 {
        assert_eq!(
            scan(&rules, b"test"),
            vec!["rule_ccc", "rule_aaa", "rule_bbb"]
        );
    }
}

#[test]
fn boundary_behaviours() {
    // empty rule set -> no matches
    let rs = RuleSet { rules: vec![] };
    let rules = rulescan::compile(&rs, &CompileOptions::default()).unwrap();
    assert!(scan(&rules, b"anything").is_empty());

    // empty haystack -> no matches
    let rs = RuleSet {
        rules: vec![rule(
            "r",
            vec![text_string("s", b"x")],
            Expr::AnyOf("them".to_string()),
        )],
    };
    let rules = rulescan::compile(&rs, &CompileOptions::default()).unwrap();
    assert!(scan(&rules, b"").is_empty());

    // rule with no strings and `any of them` -> no match
    let rs = RuleSet {
        rules: vec![rule("empty_strings", vec![], Expr::AnyOf("them".to_string()))],
    };
    let rules = rulescan::compile(&rs, &CompileOptions::default()).unwrap();
    assert!(scan(&rules, b"whatever").is_empty());

    // pattern equal to entire buffer -> one match covering it
    let rs = RuleSet {
        rules: vec![rule(
            "exact",
            vec![text_string("s", b"exact")],
            Expr::AnyOf("them".to_string()),
        )],
    };
    let rules = rulescan::compile(&rs, &CompileOptions::default()).unwrap();
    let mut cb = CollectingCallback::new();
    rules
        .scan_mem(b"exact", ScanFlags::default(), Duration::from_secs(5), &mut cb)
        .unwrap();
    assert_eq!(cb.matches.len(), 1);
    assert_eq!(cb.matches[0].strings[0].data, b"exact");

    // adjacent repeated patterns -> all overlapping occurrences recorded
    let rs = RuleSet {
        rules: vec![rule(
            "repeats",
            vec![text_string("s", b"ab")],
            Expr::AnyOf("them".to_string()),
        )],
    };
    let rules = rulescan::compile(&rs, &CompileOptions::default()).unwrap();
    let mut cb = CollectingCallback::new();
    rules
        .scan_mem(b"abab", ScanFlags::default(), Duration::from_secs(5), &mut cb)
        .unwrap();
    assert_eq!(cb.matches[0].strings.len(), 2);
}

#[test]
fn skip_invalid_regex_downgrades_to_warning() {
    let s = StringDef {
        name: "s".to_string(),
        value: StringValue::Regex(rulescan::ir::RegexString {
            pattern: "(unclosed".to_string(),
            modifiers: Default::default(),
        }),
        modifiers: StringModifiers::default(),
    };
    let rs = RuleSet {
        rules: vec![rule("bad_regex", vec![s], Expr::AnyOf("them".to_string()))],
    };

    let mut options = CompileOptions::default();
    options.skip_invalid_regex = true;
    let rules = rulescan::compile(&rs, &options).unwrap();
    assert_eq!(rules.num_rules(), 1);
    assert!(!rules.warnings().is_empty());
}

#[test]
fn skip_types_filters_rules_by_meta() {
    let mut r = rule(
        "tagged",
        vec![text_string("s", b"needle")],
        Expr::AnyOf("them".to_string()),
    );
    r.meta.push(("type".to_string(), MetaValue::Text("test".to_string())));

    let rs = RuleSet { rules: vec![r] };
    let mut options = CompileOptions::default();
    options.skip_types = vec!["test".to_string()];

    let rules = rulescan::compile(&rs, &options).unwrap();
    assert_eq!(rules.num_rules(), 0);
    assert!(!rules.warnings().is_empty());
}

#[test]
fn hex_string_compiles_and_matches() {
    let hex = HexString {
        tokens: vec![
            rulescan::ir::HexToken::Byte(0xDE),
            rulescan::ir::HexToken::Wildcard,
            rulescan::ir::HexToken::Byte(0xBE),
        ],
    };
    let s = StringDef {
        name: "s".to_string(),
        value: StringValue::Hex(hex),
        modifiers: StringModifiers::default(),
    };
    let rs = RuleSet {
        rules: vec![rule("hex_rule", vec![s], Expr::AnyOf("them".to_string()))],
    };
    let rules = rulescan::compile(&rs, &CompileOptions::default()).unwrap();

    assert_eq!(scan(&rules, &[0xDE, 0xAD, 0xBE]), vec!["hex_rule"]);
    assert!(scan(&rules, &[0xDE, 0xAD]).is_empty());
}
