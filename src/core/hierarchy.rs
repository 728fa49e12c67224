// hierarchy arena
//
// Nodes live in one Vec and refer to each other by NodeId. `parent` is a
// plain index, so the back-reference never owns anything.
use std::fmt;

use crate::core::error::{ReconcileError, Result};
use crate::core::group::Group;
use crate::core::options::RecordPlacement;
use crate::core::types::{GroupKey, NodeId};

/// Payload of a hierarchy node: a borrowed group or one of its records.
pub enum NodeData<'a, R> {
    Group(&'a Group<R>),
    Record(&'a R),
}

impl<R> Clone for NodeData<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for NodeData<'_, R> {}

impl<R: fmt::Debug> fmt::Debug for NodeData<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeData::Group(g) => f
                .debug_struct("Group")
                .field("key", &g.key())
                .field("depth", &g.depth())
                .finish(),
            NodeData::Record(r) => f.debug_tuple("Record").field(r).finish(),
        }
    }
}

impl<'a, R> NodeData<'a, R> {
    pub fn group(&self) -> Option<&'a Group<R>> {
        match *self {
            NodeData::Group(g) => Some(g),
            NodeData::Record(_) => None,
        }
    }

    pub fn record(&self) -> Option<&'a R> {
        match *self {
            NodeData::Group(_) => None,
            NodeData::Record(r) => Some(r),
        }
    }

    /// Grouping key, `None` for records and the root.
    pub fn key(&self) -> Option<&'a GroupKey> {
        self.group().and_then(Group::key)
    }
}

#[derive(Debug)]
pub struct HierarchyNode<'a, R> {
    pub(crate) id: NodeId,
    pub(crate) data: NodeData<'a, R>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    // None once the node has been dissolved by a splice
    pub(crate) depth: Option<usize>,
    pub(crate) removed: bool,
}

impl<'a, R> HierarchyNode<'a, R> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn data(&self) -> NodeData<'a, R> {
        self.data
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn depth(&self) -> Option<usize> {
        self.depth
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_no_parent(&self) -> bool {
        self.data.key().is_some_and(GroupKey::is_no_parent)
    }
}

/// Tree of [`HierarchyNode`]s mirroring a [`Group`] tree. Node 0 is the root.
#[derive(Debug)]
pub struct Hierarchy<'a, R> {
    nodes: Vec<HierarchyNode<'a, R>>,
}

impl<'a, R> Hierarchy<'a, R> {
    /// Fails with `TooManyNodes` once the tree outgrows the `u32` id space.
    pub fn build(root: &'a Group<R>, placement: RecordPlacement) -> Result<Self> {
        let mut h = Hierarchy { nodes: Vec::new() };
        h.attach_group(root, None, 0, placement)?;
        Ok(h)
    }

    fn push(&mut self, data: NodeData<'a, R>, parent: Option<NodeId>, depth: usize) -> Result<NodeId> {
        let id = next_id(self.nodes.len())?;
        self.nodes.push(HierarchyNode {
            id,
            data,
            parent,
            children: Vec::new(),
            depth: Some(depth),
            removed: false,
        });
        if let Some(p) = parent {
            self.node_mut(p)?.children.push(id);
        }
        Ok(id)
    }

    fn attach_group(
        &mut self,
        group: &'a Group<R>,
        parent: Option<NodeId>,
        depth: usize,
        placement: RecordPlacement,
    ) -> Result<NodeId> {
        let id = self.push(NodeData::Group(group), parent, depth)?;

        for child in group.groups() {
            self.attach_group(child, Some(id), depth + 1, placement)?;
        }

        if placement == RecordPlacement::Leaves {
            for record in group.records() {
                self.push(NodeData::Record(record), Some(id), depth + 1)?;
            }
        }
        Ok(id)
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Result<&HierarchyNode<'a, R>> {
        self.nodes.get(id as usize).ok_or(ReconcileError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut HierarchyNode<'a, R>> {
        self.nodes
            .get_mut(id as usize)
            .ok_or(ReconcileError::NodeNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &HierarchyNode<'a, R>> + '_ {
        self.nodes.iter()
    }

    /// The node itself followed by its ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = vec![id];
        let mut cur = self.node(id)?.parent;
        while let Some(p) = cur {
            out.push(p);
            cur = self.node(p)?.parent;
        }
        Ok(out)
    }

    /// Pre-order walk from the root over the current child lists.
    pub fn pre_order(&self) -> Result<Vec<NodeId>> {
        let mut out = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return Ok(out);
        }

        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = self.node(id)?;
            out.push(id);
            stack.extend(node.children.iter().rev());
        }
        Ok(out)
    }

    /// Pre-order walk that also yields each node's distance from the root.
    pub fn pre_order_with_depth(&self) -> Result<Vec<(NodeId, usize)>> {
        let mut out = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return Ok(out);
        }

        let mut stack = vec![(self.root(), 0)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id)?;
            out.push((id, depth));
            stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
        }
        Ok(out)
    }
}

fn next_id(len: usize) -> Result<NodeId> {
    NodeId::try_from(len).map_err(|_| ReconcileError::TooManyNodes(len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::group::Grouper;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        a: &'static str,
        b: &'static str,
        p: Option<&'static str>,
    }

    fn grouped(rows: Vec<Row>) -> Group<Row> {
        Grouper::new()
            .key(|r: &Row| r.a)
            .key(|r: &Row| r.b)
            .parent_key(|r: &Row| r.p)
            .group(rows)
            .unwrap()
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { a: "x", b: "1", p: None },
            Row { a: "x", b: "1", p: None },
            Row { a: "x", b: "2", p: Some("1") },
        ]
    }

    #[test]
    fn build_mirrors_group_tree_with_record_leaves() {
        let root = grouped(rows());
        let h = Hierarchy::build(&root, RecordPlacement::Leaves).unwrap();

        //root, x, 1, <no parent>, 2 records, 2, "1", 1 record
        assert_eq!(h.len(), 9);

        let r = h.node(h.root()).unwrap();
        assert_eq!(r.parent(), None);
        assert_eq!(r.depth(), Some(0));
        assert_eq!(r.children().len(), 1);

        let x = h.node(r.children()[0]).unwrap();
        assert_eq!(x.data().key(), Some(&GroupKey::from("x")));
        assert_eq!(x.parent(), Some(h.root()));
        assert_eq!(x.children().len(), 2);

        for node in h.iter().skip(1) {
            let parent = h.node(node.parent().unwrap()).unwrap();
            assert_eq!(node.depth().unwrap(), parent.depth().unwrap() + 1);
            assert!(parent.children().contains(&node.id()));
        }

        let records = h.iter().filter(|n| n.data().record().is_some()).count();
        assert_eq!(records, 3);
        assert!(h.iter().filter(|n| n.data().record().is_some()).all(|n| n.depth() == Some(4)));
    }

    #[test]
    fn embedded_records_are_not_nodes() {
        let root = grouped(rows());
        let h = Hierarchy::build(&root, RecordPlacement::Embedded).unwrap();
        assert_eq!(h.len(), 6);
        assert!(h.iter().all(|n| n.data().group().is_some()));

        let orphan = h.iter().find(|n| n.is_no_parent()).unwrap();
        assert!(!orphan.has_children());
        assert_eq!(orphan.data().group().unwrap().records().len(), 2);
    }

    #[test]
    fn ancestors_start_at_self_and_end_at_root() {
        let root = grouped(rows());
        let h = Hierarchy::build(&root, RecordPlacement::Leaves).unwrap();
        let leaf = h.iter().last().unwrap().id();

        let chain = h.ancestors(leaf).unwrap();
        assert_eq!(chain.first(), Some(&leaf));
        assert_eq!(chain.last(), Some(&h.root()));
        assert_eq!(chain.len(), 5);
    }

    #[test]
    fn pre_order_visits_parent_before_children() {
        let root = grouped(rows());
        let h = Hierarchy::build(&root, RecordPlacement::Leaves).unwrap();

        let order = h.pre_order().unwrap();
        assert_eq!(order.len(), h.len());
        assert_eq!(order[0], h.root());

        let pos = |id: NodeId| order.iter().position(|&x| x == id).unwrap();
        for node in h.iter().skip(1) {
            assert!(pos(node.parent().unwrap()) < pos(node.id()));
        }

        let depths = h.pre_order_with_depth().unwrap();
        for (id, depth) in depths {
            assert_eq!(h.node(id).unwrap().depth(), Some(depth));
        }
    }

    #[test]
    fn unknown_node_is_an_error() {
        let root = grouped(rows());
        let h = Hierarchy::build(&root, RecordPlacement::Leaves).unwrap();
        let err = h.node(99).unwrap_err();
        assert!(matches!(err, ReconcileError::NodeNotFound(99)));
    }

    #[test]
    fn node_ids_stop_at_the_u32_range() {
        assert_eq!(next_id(7).unwrap(), 7);
        assert_eq!(next_id(u32::MAX as usize).unwrap(), u32::MAX);

        #[cfg(target_pointer_width = "64")]
        {
            let past = u32::MAX as usize + 1;
            let err = next_id(past).unwrap_err();
            assert!(matches!(err, ReconcileError::TooManyNodes(n) if n == past));
        }
    }
}
