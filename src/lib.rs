//! Regroups flat records into a keyed hierarchy and re-parents records whose
//! declared parent group is missing onto the nearest existing ancestor.
//!
//! ```ignore
//! let root = Grouper::new()
//!     .key(|r: &Row| GroupKey::from(r.region.as_str()))
//!     .key(|r: &Row| GroupKey::from(r.site.as_str()))
//!     .parent_key(|r: &Row| r.parent.as_deref())
//!     .group(rows)?;
//! let out = reconcile(&root, &ReconcileOptions::default())?;
//! ```

pub mod core;
pub mod mapping;

pub use crate::core::error::{ReconcileError, Result};
pub use crate::core::group::{Group, GroupBody, Grouper};
pub use crate::core::hierarchy::{Hierarchy, HierarchyNode, NodeData};
pub use crate::core::options::{DepthPolicy, MissingKeyPolicy, ReconcileOptions, RecordPlacement};
pub use crate::core::reconcile::{reconcile, FlatNode, Reconciled, SplicePlan};
pub use crate::core::types::{GroupKey, NodeId};
pub use crate::mapping::fields::FieldMapping;
pub use crate::mapping::report::{SpliceReport, SpliceRecord};
