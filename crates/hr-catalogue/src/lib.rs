#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use hr_types::{DescriptorError, HypergraphletDescriptor, TypeMembershipSets};
use thiserror::Error;

pub mod parse;
pub mod symbols;

pub use parse::{CatalogueParser, load_catalogue};
pub use symbols::{CANONICAL_SYMBOLS, SymbolTable};

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("unable to open catalogue {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected `typeId:hyperedges`")]
    MissingSeparator { line: usize },
    #[error("line {line}: invalid type id {raw:?}")]
    InvalidTypeId { line: usize, raw: String },
    #[error("line {line}: type id {type_id} outside 1..{type_count}")]
    TypeIdOutOfRange {
        line: usize,
        type_id: u32,
        type_count: u32,
    },
    #[error("line {line}: empty hyperedge")]
    EmptyHyperedge { line: usize },
    #[error("line {line}: unmapped node symbol {symbol:?}")]
    UnknownSymbol { line: usize, symbol: String },
    #[error("line {line}: type {type_id} already described")]
    DuplicateTypeId { line: usize, type_id: u32 },
    #[error("line {line}: {source}")]
    Descriptor {
        line: usize,
        #[source]
        source: DescriptorError,
    },
    #[error("symbol table is not a bijection: {0}")]
    NonBijectiveSymbols(String),
}

/// Every parsed descriptor keyed by type id. Immutable once parsing returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalogue {
    descriptors: BTreeMap<u32, HypergraphletDescriptor>,
    membership: TypeMembershipSets,
}

impl Catalogue {
    fn insert(
        &mut self,
        line: usize,
        descriptor: HypergraphletDescriptor,
    ) -> Result<(), CatalogueError> {
        let type_id = descriptor.type_id();
        if self.descriptors.contains_key(&type_id) {
            return Err(CatalogueError::DuplicateTypeId { line, type_id });
        }
        self.membership.record(&descriptor);
        self.descriptors.insert(type_id, descriptor);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, type_id: u32) -> Option<&HypergraphletDescriptor> {
        self.descriptors.get(&type_id)
    }

    /// Descriptors in ascending type id order.
    pub fn iter(&self) -> impl Iterator<Item = &HypergraphletDescriptor> {
        self.descriptors.values()
    }

    pub fn type_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.descriptors.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    #[must_use]
    pub fn membership(&self) -> &TypeMembershipSets {
        &self.membership
    }
}
