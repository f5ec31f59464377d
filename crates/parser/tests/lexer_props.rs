use go_syntax::lexer::{Lexer, Tok};
use go_syntax::parse_source;
use proptest::prelude::*;

fn go_ish() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("package p\n"),
            Just("func f(a, b int) error {"),
            Just("}"),
            Just("x.M(ctx, 1)"),
            Just("if x {"),
            Just("T{}"),
            Just("/* c */"),
            Just("// c\n"),
            Just("\"s\""),
            Just("0x1p-2"),
            Just("\n"),
            Just(";"),
            Just("("),
            Just(")"),
        ],
        0..32,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn lexer_spans_are_in_bounds_and_monotonic(s in ".*") {
        let mut max_end = 0usize;
        let mut last_real_end = 0usize;
        let max_steps = s.len().saturating_mul(4) + 64;

        for (steps, (start, tok, end)) in Lexer::new(&s).enumerate() {
            prop_assert!(start <= end && end <= s.len(), "bad span ({start},{end}) for {s:?}");

            // Inserted semicolons are zero-width and never precede consumed input.
            if matches!(tok, Tok::Semi) && start == end {
                prop_assert!(start >= max_end, "semi at {start} before {max_end} in {s:?}");
            } else {
                prop_assert!(start >= last_real_end, "token at {start} overlaps {last_real_end} in {s:?}");
                last_real_end = end;
            }
            max_end = max_end.max(end);

            prop_assert!(steps <= max_steps, "no progress lexing {s:?}");
        }
    }

    #[test]
    fn parser_never_panics(s in go_ish()) {
        match parse_source(&s) {
            Ok(tree) => prop_assert_eq!(tree.package_name(), "p"),
            Err(failure) => prop_assert!(!failure.diags.is_empty()),
        }
    }
}
