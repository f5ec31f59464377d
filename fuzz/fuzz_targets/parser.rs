#![no_main]

use go_syntax::parse_source;
use go_syntax::walk::preorder_exprs;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(tree) = parse_source(src) {
        for e in preorder_exprs(&tree.arena, &tree.file) {
            let span = tree.arena.exprs.span(e);
            assert!(span.start <= span.end && span.end as usize <= src.len());
        }
    }
});
