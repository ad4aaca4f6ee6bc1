use hr_catalogue::{CANONICAL_SYMBOLS, CatalogueParser, SymbolTable};
use hr_types::{DEFAULT_TYPE_COUNT, MarkerKind};
use proptest::prelude::*;

// Non-empty subsets of R,A,B,C written in canonical symbol order, so the
// marker triggers appear exactly as the catalogue spells them.
fn symbolic_hyperedge() -> impl Strategy<Value = String> {
    (1_u8..16).prop_map(|mask| {
        CANONICAL_SYMBOLS
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1_u8 << *bit) != 0)
            .map(|(_, symbol)| *symbol)
            .collect::<Vec<_>>()
            .join(",")
    })
}

proptest! {
    #[test]
    fn membership_sets_agree_with_descriptions(
        type_id in 11_u32..DEFAULT_TYPE_COUNT,
        edges in prop::collection::vec(symbolic_hyperedge(), 1..8),
    ) {
        let line = format!("{type_id}:{}", edges.join("|"));
        let symbols = SymbolTable::canonical();
        let catalogue = CatalogueParser::new(&symbols, DEFAULT_TYPE_COUNT)
            .parse_str(&line)
            .expect("generated line parses");
        let descriptor = catalogue.get(type_id).expect("descriptor present");
        let membership = catalogue.membership();

        let full_triggers = edges.iter().filter(|edge| *edge == "R,A,B,C").count();
        let partial_triggers = edges.iter().filter(|edge| *edge == "A,B,C").count();

        prop_assert_eq!(membership.extended_full.contains(&type_id), full_triggers > 0);
        prop_assert_eq!(membership.extended_partial.contains(&type_id), partial_triggers > 0);
        prop_assert_eq!(
            membership.extended_both.contains(&type_id),
            full_triggers > 0 && partial_triggers > 0
        );
        prop_assert_eq!(descriptor.has_marker(MarkerKind::Full), full_triggers > 0);
        prop_assert_eq!(
            descriptor.hyperedge_count(),
            edges.len() + full_triggers + partial_triggers
        );
        let expected_nodes = if full_triggers + partial_triggers > 0 { 5 } else { 4 };
        prop_assert_eq!(descriptor.node_count(), expected_nodes);
    }
}
