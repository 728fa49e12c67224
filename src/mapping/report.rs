// splice report + flattened output encoding
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::Result;
use crate::core::reconcile::FlatNode;
use crate::core::types::NodeId;

/// One dissolved orphan group: which node it was, where its children went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpliceRecord {
    pub orphan: NodeId,
    pub target: NodeId,
    pub moved: Vec<NodeId>,
}

/// Traceable explanation of a reconcile run, in the order splices were applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpliceReport {
    pub splices: Vec<SpliceRecord>,
}

impl SpliceReport {
    pub fn moved_count(&self) -> usize {
        self.splices.iter().map(|s| s.moved.len()).sum()
    }

    pub fn dissolved(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.splices.iter().map(|s| s.orphan)
    }

    pub fn to_toon(&self) -> Result<String> {
        let doc = serde_json::to_value(self)?;
        Ok(toon_format::encode_default(&doc)?)
    }
}

#[derive(Serialize)]
struct FlatRow<'r, R> {
    id: NodeId,
    parent: NodeId,
    depth: usize,
    key: Option<String>,
    record: Option<&'r R>,
}

/// Encode flattened output as TOON rows: id, parent, depth and either the
/// group key or the record.
pub fn encode_flat<R: Serialize>(nodes: &[FlatNode<'_, R>]) -> Result<String> {
    let rows: Vec<FlatRow<'_, R>> = nodes
        .iter()
        .map(|n| FlatRow {
            id: n.id,
            parent: n.parent,
            depth: n.depth,
            key: n.data.key().map(ToString::to_string),
            record: n.data.record(),
        })
        .collect();

    debug!(rows = rows.len(), "encoding flattened hierarchy");
    let doc = serde_json::to_value(&rows)?;
    Ok(toon_format::encode_default(&doc)?)
}
