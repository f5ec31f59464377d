use go_syntax::lexer::{Lexer, Tok};

/// Offsets of the semicolons the lexer inserted (zero-width `Semi` tokens).
fn injected_semis(input: &str) -> Vec<usize> {
    Lexer::new(input)
        .filter_map(|(s, t, e)| (matches!(t, Tok::Semi) && s == e).then_some(s))
        .collect()
}

/// Whether a line holding only `tok` ends in an inserted semicolon.
fn ends_statement(tok: &str) -> bool {
    !injected_semis(&format!("{tok}\n")).is_empty()
}

#[test]
fn newline_ends_statements_after_operands_and_closers() {
    let enders = [
        "foo", "_x", "résumé", "123", "0x1F", "0b1_0", "0o7", "1.2", "1e9", ".5", "1i", "'x'",
        "'\\n'", "\"x\"", "`x`", "break", "continue", "fallthrough", "return", "++", "--", ")",
        "]", "}",
    ];
    for tok in enders {
        assert!(ends_statement(tok), "{tok:?} should end a statement");
    }
}

#[test]
fn newline_continues_after_operators_and_openers() {
    let continuers = [
        "+", "-", "*", "/", "%", "&", "|", "^", "<<", ">>", "&^", "+=", "-=", "*=", "/=", "%=",
        "&=", "|=", "^=", "<<=", ">>=", "&^=", "&&", "||", "<-", "==", "!=", "<", "<=", ">",
        ">=", "=", ":=", "!", "~", "...", "(", "[", "{", ",", ".", ":", "case", "chan", "const",
        "default", "defer", "else", "for", "func", "go", "goto", "if", "import", "interface",
        "map", "package", "range", "select", "struct", "switch", "type", "var",
    ];
    for tok in continuers {
        assert!(!ends_statement(tok), "{tok:?} should not end a statement");
    }
}

#[test]
fn explicit_semicolons_are_not_doubled() {
    assert!(injected_semis(";\n").is_empty());
    assert!(injected_semis("x;\n").is_empty());
    assert!(injected_semis("\u{FEFF};").is_empty());
}

#[test]
fn comments_are_trivia_for_insertion() {
    for src in [
        "foo//comment\n",
        "foo//comment",
        "foo/*comment*/\n",
        "foo/*\n*/",
        "foo/*comment*/    \n",
        "foo    // comment",
        "foo    /*\n*/    ",
    ] {
        assert_eq!(injected_semis(src).len(), 1, "{src:?}");
    }
    assert_eq!(injected_semis("x/*\n*/y").len(), injected_semis("x\ny").len());
}

#[test]
fn inserted_semicolons_sit_at_the_line_break() {
    assert_eq!(injected_semis("x\ny"), vec![1, 3]);
    assert_eq!(injected_semis("x\r\ny"), vec![1, 4]);
    assert_eq!(injected_semis("x/*\r*/y"), vec![3, 7]);
    assert_eq!(injected_semis("if/*\n*/x"), vec![8]);
    assert_eq!(injected_semis("break\nx"), vec![5, 7]);
    assert_eq!(injected_semis("x++\ny"), vec![3, 5]);

    let src = "x//c\r\ny";
    assert_eq!(injected_semis(src), vec![src.find('\r').unwrap(), src.len()]);
}

#[test]
fn closing_brace_before_newline_in_a_function() {
    let src = "package main\n\nfunc main() {\n\tif {\n\t\treturn /* */ }\n}\n";
    let toks: Vec<Tok<'_>> = Lexer::new(src).map(|(_, t, _)| t).collect();
    let semis = toks.iter().filter(|t| matches!(t, Tok::Semi)).count();
    // after `main`, after the inner `}`, after the outer `}`
    assert_eq!(semis, 3);
    assert!(matches!(toks.last(), Some(Tok::Semi) | Some(Tok::Eof)));
}

#[test]
fn eof_ends_the_last_statement() {
    assert_eq!(injected_semis("package main"), vec![12]);
    assert!(injected_semis("").is_empty());
}
