//! City identifiers and the fixed per-city layer naming scheme.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A city under analysis: a name plus a derived data directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct City(String);

impl City {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Directory holding this city's four geometry layers.
    pub fn dir(&self, data_root: &Path) -> PathBuf {
        data_root.join(&self.0)
    }

    /// Output figure path: `<fig_root>/<city>.png`.
    pub fn figure_path(&self, fig_root: &Path) -> PathBuf {
        fig_root.join(format!("{}.png", self.0))
    }
}

impl std::fmt::Display for City {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four fixed-name geometry layers every city directory carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    Nodes,
    Edges,
    Parks,
    Buildings,
}

impl LayerKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            LayerKind::Nodes => "nodes",
            LayerKind::Edges => "edges",
            LayerKind::Parks => "parks",
            LayerKind::Buildings => "buildings",
        }
    }

    /// File name inside the city directory: `<prefix>_<city>.geojson`.
    pub fn file_name(&self, city: &City) -> String {
        format!("{}_{}.geojson", self.prefix(), city.name())
    }
}
