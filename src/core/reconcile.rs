// re-parenting + flattening
//
// Two passes over the arena:
// 1) plan: walk the untouched tree in pre-order and collect every group keyed
//    `NoParent` that has children
// 2) apply: dissolve each planned group in that order, moving its children
//    onto the nearest ancestor (resolved through the current parent links,
//    so nested orphans follow their already re-parented parent)
// Flattening then re-walks the spliced tree from the root.
use std::collections::HashMap;

use tracing::{debug, instrument, trace};

use crate::core::error::Result;
use crate::core::group::Group;
use crate::core::hierarchy::{Hierarchy, NodeData};
use crate::core::options::{DepthPolicy, ReconcileOptions};
use crate::core::types::NodeId;
use crate::mapping::report::{SpliceRecord, SpliceReport};

/// Orphan groups to dissolve, in pre-order of the unspliced tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplicePlan {
    orphans: Vec<NodeId>,
}

impl SplicePlan {
    pub fn orphans(&self) -> &[NodeId] {
        &self.orphans
    }

    pub fn len(&self) -> usize {
        self.orphans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orphans.is_empty()
    }
}

/// One entry of the flattened output. `parent` may be the root, which itself
/// never appears in the output.
#[derive(Debug)]
pub struct FlatNode<'a, R> {
    pub id: NodeId,
    pub parent: NodeId,
    pub depth: usize,
    pub data: NodeData<'a, R>,
}

impl<'a, R> Hierarchy<'a, R> {
    pub fn plan_splices(&self) -> Result<SplicePlan> {
        let mut orphans = Vec::new();
        for id in self.pre_order()? {
            let node = self.node(id)?;
            if node.has_children() && node.is_no_parent() {
                orphans.push(id);
            }
        }
        Ok(SplicePlan { orphans })
    }

    /// Dissolve one orphan group. Returns `None` when it has no ancestor.
    pub fn splice(&mut self, orphan: NodeId) -> Result<Option<SpliceRecord>> {
        //first ancestor that is not the orphan itself
        let Some(target) = self.ancestors(orphan)?.into_iter().find(|&a| a != orphan) else {
            return Ok(None);
        };

        let (moved, new_parent) = {
            let node = self.node(orphan)?;
            (node.children.clone(), node.parent)
        };

        for &child in &moved {
            self.node_mut(child)?.parent = new_parent;
        }

        let t = self.node_mut(target)?;
        t.children.retain(|&c| c != orphan);
        t.children.extend_from_slice(&moved);

        let o = self.node_mut(orphan)?;
        o.removed = true;
        o.depth = None;

        trace!(orphan, target, moved = moved.len(), "spliced orphan group");
        Ok(Some(SpliceRecord { orphan, target, moved }))
    }

    pub fn apply_splices(&mut self, plan: &SplicePlan) -> Result<SpliceReport> {
        let mut report = SpliceReport::default();
        for &orphan in plan.orphans() {
            if let Some(record) = self.splice(orphan)? {
                report.splices.push(record);
            }
        }
        Ok(report)
    }

    /// Pre-order list of every reachable node except the root.
    pub fn flatten(&self, policy: DepthPolicy) -> Result<Vec<FlatNode<'a, R>>> {
        let mut out = Vec::with_capacity(self.len().saturating_sub(1));
        if self.is_empty() {
            return Ok(out);
        }

        let root = self.root();
        let mut stack: Vec<(NodeId, NodeId, usize)> = self
            .node(root)?
            .children
            .iter()
            .rev()
            .map(|&c| (c, root, 1))
            .collect();

        while let Some((id, parent, depth)) = stack.pop() {
            let node = self.node(id)?;
            if node.removed {
                continue;
            }

            let depth = match policy {
                DepthPolicy::Rederive => depth,
                DepthPolicy::Preserve => node.depth.unwrap_or(depth),
            };

            out.push(FlatNode {
                id,
                parent,
                depth,
                data: node.data,
            });
            stack.extend(node.children.iter().rev().map(|&c| (c, id, depth + 1)));
        }
        Ok(out)
    }
}

/// Result of [`reconcile`]: the spliced arena, its flattened order and the
/// list of splices that produced it.
#[derive(Debug)]
pub struct Reconciled<'a, R> {
    hierarchy: Hierarchy<'a, R>,
    nodes: Vec<FlatNode<'a, R>>,
    positions: HashMap<NodeId, usize>,
    report: SpliceReport,
}

impl<'a, R> Reconciled<'a, R> {
    pub fn nodes(&self) -> &[FlatNode<'a, R>] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<FlatNode<'a, R>> {
        self.nodes
    }

    pub fn hierarchy(&self) -> &Hierarchy<'a, R> {
        &self.hierarchy
    }

    pub fn report(&self) -> &SpliceReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&FlatNode<'a, R>> {
        self.positions.get(&id).map(|&i| &self.nodes[i])
    }

    /// Parent entry in the output, `None` for top-level nodes.
    pub fn parent_of(&self, node: &FlatNode<'a, R>) -> Option<&FlatNode<'a, R>> {
        self.get(node.parent)
    }

    pub fn records(&self) -> impl Iterator<Item = &'a R> + '_ {
        self.nodes.iter().filter_map(|n| n.data.record())
    }
}

#[instrument(level = "debug", skip_all, fields(records = root.record_count()))]
pub fn reconcile<'a, R>(root: &'a Group<R>, options: &ReconcileOptions) -> Result<Reconciled<'a, R>> {
    let mut hierarchy = Hierarchy::build(root, options.records)?;

    let plan = hierarchy.plan_splices()?;
    debug!(nodes = hierarchy.len(), planned = plan.len(), "planned splices");

    let report = hierarchy.apply_splices(&plan)?;
    let nodes = hierarchy.flatten(options.depth)?;
    debug!(splices = report.splices.len(), output = nodes.len(), "flattened hierarchy");

    let positions = nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
    Ok(Reconciled {
        hierarchy,
        nodes,
        positions,
        report,
    })
}
