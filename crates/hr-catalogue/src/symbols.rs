use std::collections::BTreeMap;

use hr_types::NodeId;

use crate::CatalogueError;

/// Symbolic node names used by the catalogue, in canonical id order.
pub const CANONICAL_SYMBOLS: [&str; 4] = ["R", "A", "B", "C"];

/// Bijective map from symbolic node names to canonical numeric ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    forward: BTreeMap<String, NodeId>,
    reverse: BTreeMap<NodeId, String>,
}

impl SymbolTable {
    /// `R→0, A→1, B→2, C→3`.
    #[must_use]
    pub fn canonical() -> Self {
        let mut forward = BTreeMap::new();
        let mut reverse = BTreeMap::new();
        for (raw, symbol) in (0_u8..).zip(CANONICAL_SYMBOLS) {
            forward.insert(symbol.to_owned(), NodeId::new(raw));
            reverse.insert(NodeId::new(raw), symbol.to_owned());
        }
        Self { forward, reverse }
    }

    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, NodeId)>,
    ) -> Result<Self, CatalogueError> {
        let mut forward = BTreeMap::new();
        let mut reverse = BTreeMap::new();
        for (symbol, id) in pairs {
            if forward.insert(symbol.to_owned(), id).is_some() {
                return Err(CatalogueError::NonBijectiveSymbols(format!(
                    "symbol {symbol} mapped twice"
                )));
            }
            if reverse.insert(id, symbol.to_owned()).is_some() {
                return Err(CatalogueError::NonBijectiveSymbols(format!(
                    "id {id} assigned to more than one symbol"
                )));
            }
        }
        Ok(Self { forward, reverse })
    }

    #[must_use]
    pub fn resolve(&self, symbol: &str) -> Option<NodeId> {
        self.forward.get(symbol).copied()
    }

    #[must_use]
    pub fn symbol_for(&self, id: NodeId) -> Option<&str> {
        self.reverse.get(&id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::canonical()
    }
}
