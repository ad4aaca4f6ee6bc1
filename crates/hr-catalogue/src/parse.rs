use std::fs;
use std::path::Path;

use hr_types::{Hyperedge, HypergraphletDescriptor, MarkerKind};

use crate::symbols::SymbolTable;
use crate::{Catalogue, CatalogueError};

/// Parses `typeId:hyperedge|hyperedge|...` lines, nodes comma separated.
#[derive(Debug, Clone, Copy)]
pub struct CatalogueParser<'a> {
    symbols: &'a SymbolTable,
    type_count: u32,
}

impl<'a> CatalogueParser<'a> {
    /// Type ids must fall in `1..type_count`.
    #[must_use]
    pub fn new(symbols: &'a SymbolTable, type_count: u32) -> Self {
        Self {
            symbols,
            type_count,
        }
    }

    pub fn parse_str(&self, text: &str) -> Result<Catalogue, CatalogueError> {
        let mut catalogue = Catalogue::default();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let line_no = idx + 1;
            let descriptor = self.parse_line(line_no, line)?;
            catalogue.insert(line_no, descriptor)?;
        }
        Ok(catalogue)
    }

    pub fn parse_line(
        &self,
        line_no: usize,
        line: &str,
    ) -> Result<HypergraphletDescriptor, CatalogueError> {
        let (raw_type, description) = line
            .split_once(':')
            .ok_or(CatalogueError::MissingSeparator { line: line_no })?;

        let type_id = raw_type
            .parse::<u32>()
            .map_err(|_| CatalogueError::InvalidTypeId {
                line: line_no,
                raw: raw_type.to_owned(),
            })?;
        if type_id == 0 || type_id >= self.type_count {
            return Err(CatalogueError::TypeIdOutOfRange {
                line: line_no,
                type_id,
                type_count: self.type_count,
            });
        }

        let mut hyperedges = Vec::new();
        for symbolic in description.split('|') {
            if symbolic.is_empty() {
                return Err(CatalogueError::EmptyHyperedge { line: line_no });
            }
            let nodes = symbolic
                .split(',')
                .map(|symbol| {
                    self.symbols
                        .resolve(symbol)
                        .ok_or_else(|| CatalogueError::UnknownSymbol {
                            line: line_no,
                            symbol: symbol.to_owned(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            hyperedges.push(Hyperedge::Nodes(nodes));

            // The marker follows its trigger edge directly.
            if let Some(kind) = MarkerKind::from_trigger(symbolic) {
                hyperedges.push(Hyperedge::Marker(kind));
            }
        }

        HypergraphletDescriptor::new(type_id, hyperedges).map_err(|source| {
            CatalogueError::Descriptor {
                line: line_no,
                source,
            }
        })
    }
}

pub fn load_catalogue(
    path: &Path,
    symbols: &SymbolTable,
    type_count: u32,
) -> Result<Catalogue, CatalogueError> {
    let text = fs::read_to_string(path).map_err(|source| CatalogueError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    CatalogueParser::new(symbols, type_count).parse_str(&text)
}
