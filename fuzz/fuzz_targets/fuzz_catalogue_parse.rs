#![no_main]

use hr_catalogue::{CatalogueParser, SymbolTable};
use hr_types::{DEFAULT_TYPE_COUNT, MarkerKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let symbols = SymbolTable::canonical();
    let Ok(catalogue) = CatalogueParser::new(&symbols, DEFAULT_TYPE_COUNT).parse_str(text) else {
        return;
    };
    for descriptor in catalogue.iter() {
        assert!(descriptor.type_id() > 0 && descriptor.type_id() < DEFAULT_TYPE_COUNT);
        assert_eq!(descriptor.hyperedge_count(), descriptor.hyperedges().len());
        if MarkerKind::ALL.iter().any(|kind| descriptor.has_marker(*kind)) {
            assert_eq!(descriptor.node_count(), 5);
        }
    }
});
