// reconcile configuration
use serde::{Deserialize, Serialize};

use crate::core::error::Result;

/// Depth reported for nodes in the flattened output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthPolicy {
    /// distance from the root in the reconciled tree
    #[default]
    Rederive,
    /// depth from before splicing; hoisted nodes keep their old, deeper value
    Preserve,
}

/// Where grouped records live in the hierarchy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordPlacement {
    /// every record is a leaf node under its innermost group
    #[default]
    Leaves,
    /// records stay on the innermost group's payload; those groups are leaves
    Embedded,
}

/// What to do when a required key level yields no value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingKeyPolicy {
    #[default]
    Reject,
    /// group such records under a `Missing` bucket
    ///
    /// Null and absent fields share that one bucket; they are not told apart
    /// the way a string-keyed grouping would ("null" vs "undefined").
    Permit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    pub depth: DepthPolicy,
    pub records: RecordPlacement,
    pub missing_keys: MissingKeyPolicy,
}

impl ReconcileOptions {
    pub fn from_toon(text: &str) -> Result<Self> {
        let doc: serde_json::Value = toon_format::decode_default(text)?;
        Ok(serde_json::from_value(doc)?)
    }

    pub fn with_depth(mut self, depth: DepthPolicy) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_records(mut self, records: RecordPlacement) -> Self {
        self.records = records;
        self
    }

    pub fn with_missing_keys(mut self, missing_keys: MissingKeyPolicy) -> Self {
        self.missing_keys = missing_keys;
        self
    }
}
