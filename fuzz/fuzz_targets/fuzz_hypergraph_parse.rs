#![no_main]

use hr_instance::{parse_hypergraph, render_hypergraph};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(edges) = parse_hypergraph(text) else {
        return;
    };
    let reparsed = parse_hypergraph(&render_hypergraph(&edges)).expect("rendered hypergraph parses");
    assert_eq!(reparsed, edges);
});
