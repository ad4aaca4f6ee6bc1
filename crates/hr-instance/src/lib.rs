#![forbid(unsafe_code)]

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod generate;
pub mod permute;

pub use generate::{
    InstanceGenerator, label_prefix, parse_hypergraph, read_hypergraph_file, render_hypergraph,
};
pub use permute::permute_hyperedges;

pub const MAX_NODE_LABELS: &str = "NNNNN";
pub const MAX_HYPEREDGE_LABELS: &str = "EEEEEEEEEEEEE";
pub const DEFAULT_CASE_NAME: &str = "example";

pub const HYPERGRAPH_EXTENSION: &str = "hypergraph";
pub const NODE_LABELS_EXTENSION: &str = "nlabels";
pub const HYPEREDGE_LABELS_EXTENSION: &str = "elabels";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    Node,
    Hyperedge,
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => f.write_str("node"),
            Self::Hyperedge => f.write_str("hyperedge"),
        }
    }
}

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{kind} label alphabet has {available} labels, {needed} needed")]
    LabelAlphabetExhausted {
        kind: LabelKind,
        needed: usize,
        available: usize,
    },
    #[error("hypergraph line {line}: {detail}")]
    HypergraphFormat { line: usize, detail: String },
}

/// Deterministic per-type file naming under one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceLayout {
    data_dir: PathBuf,
    case_name: String,
}

impl InstanceLayout {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>, case_name: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            case_name: case_name.into(),
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn case_name(&self) -> &str {
        &self.case_name
    }

    /// Extension-less path the counter receives for `-g`, `-l` and `-e`.
    #[must_use]
    pub fn stem(&self, type_id: u32) -> PathBuf {
        self.data_dir.join(format!("{}{type_id}", self.case_name))
    }

    #[must_use]
    pub fn files(&self, type_id: u32) -> InstanceFiles {
        let file = |extension: &str| {
            self.data_dir
                .join(format!("{}{type_id}.{extension}", self.case_name))
        };
        InstanceFiles {
            stem: self.stem(type_id),
            hypergraph: file(HYPERGRAPH_EXTENSION),
            node_labels: file(NODE_LABELS_EXTENSION),
            hyperedge_labels: file(HYPEREDGE_LABELS_EXTENSION),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceFiles {
    pub stem: PathBuf,
    pub hypergraph: PathBuf,
    pub node_labels: PathBuf,
    pub hyperedge_labels: PathBuf,
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::InstanceLayout;

    #[test]
    fn layout_names_files_by_type_id() {
        let layout = InstanceLayout::new("./data", "example");
        let files = layout.files(57);
        assert_eq!(files.stem, PathBuf::from("./data/example57"));
        assert_eq!(files.hypergraph, PathBuf::from("./data/example57.hypergraph"));
        assert_eq!(files.node_labels, PathBuf::from("./data/example57.nlabels"));
        assert_eq!(
            files.hyperedge_labels,
            PathBuf::from("./data/example57.elabels")
        );
    }
}
