use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use hr_types::{Hyperedge, HyperedgeMultiset, HypergraphletDescriptor};
use rand::Rng;

use crate::permute::permute_hyperedges;
use crate::{
    InstanceError, InstanceFiles, InstanceLayout, LabelKind, MAX_HYPEREDGE_LABELS, MAX_NODE_LABELS,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceGenerator {
    layout: InstanceLayout,
}

impl InstanceGenerator {
    #[must_use]
    pub fn new(layout: InstanceLayout) -> Self {
        Self { layout }
    }

    #[must_use]
    pub fn layout(&self) -> &InstanceLayout {
        &self.layout
    }

    /// Writes a freshly permuted file triple for `descriptor`, replacing any
    /// previous files for the same type.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        descriptor: &HypergraphletDescriptor,
        rng: &mut R,
    ) -> Result<InstanceFiles, InstanceError> {
        let node_labels = label_prefix(LabelKind::Node, descriptor.node_count())?;
        let hyperedge_labels = label_prefix(LabelKind::Hyperedge, descriptor.hyperedge_count())?;

        let data_dir = self.layout.data_dir();
        fs::create_dir_all(data_dir).map_err(|source| InstanceError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;

        let files = self.layout.files(descriptor.type_id());
        let permuted = permute_hyperedges(descriptor.hyperedges(), rng);
        write_file(&files.hypergraph, &render_hypergraph(&permuted))?;
        write_file(&files.node_labels, &format!("{node_labels}\n"))?;
        write_file(&files.hyperedge_labels, &format!("{hyperedge_labels}\n"))?;
        Ok(files)
    }
}

/// One line per hyperedge: `index<TAB>field<TAB>field...`.
#[must_use]
pub fn render_hypergraph(hyperedges: &[Hyperedge]) -> String {
    let mut out = String::new();
    for (idx, edge) in hyperedges.iter().enumerate() {
        let _ = write!(out, "{idx}");
        for field in edge.fields() {
            let _ = write!(out, "\t{field}");
        }
        out.push('\n');
    }
    out
}

pub fn label_prefix(kind: LabelKind, count: usize) -> Result<&'static str, InstanceError> {
    let alphabet = match kind {
        LabelKind::Node => MAX_NODE_LABELS,
        LabelKind::Hyperedge => MAX_HYPEREDGE_LABELS,
    };
    alphabet
        .get(..count)
        .ok_or(InstanceError::LabelAlphabetExhausted {
            kind,
            needed: count,
            available: alphabet.len(),
        })
}

pub fn parse_hypergraph(text: &str) -> Result<Vec<Hyperedge>, InstanceError> {
    let mut edges = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let mut fields = line.split('\t');
        let index = fields.next().unwrap_or_default();
        index
            .parse::<usize>()
            .map_err(|_| InstanceError::HypergraphFormat {
                line: line_no,
                detail: format!("invalid hyperedge index {index:?}"),
            })?;

        let raw = fields
            .map(|field| {
                field
                    .parse::<u8>()
                    .map_err(|_| InstanceError::HypergraphFormat {
                        line: line_no,
                        detail: format!("invalid node id {field:?}"),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let edge = Hyperedge::from_fields(&raw).map_err(|err| InstanceError::HypergraphFormat {
            line: line_no,
            detail: err.to_string(),
        })?;
        edges.push(edge);
    }
    Ok(edges)
}

pub fn read_hypergraph_file(path: &Path) -> Result<HyperedgeMultiset, InstanceError> {
    let text = fs::read_to_string(path).map_err(|source| InstanceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(HyperedgeMultiset::from_edges(&parse_hypergraph(&text)?))
}

fn write_file(path: &Path, body: &str) -> Result<(), InstanceError> {
    fs::write(path, body).map_err(|source| InstanceError::Io {
        path: path.to_path_buf(),
        source,
    })
}
