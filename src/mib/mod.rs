//! MIB tree.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Each node keeps its
//! children in a `BTreeMap` keyed by the next arc, so iteration is always in
//! ascending numeric order and the depth-first walk in
//! [`Mib::lookup_next`] visits objects in lexicographic OID order.
//!
//! Handlers may only sit on leaves: a Scalar or a Column, or an Entry whose
//! only children are the Columns synthesized for it at registration.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use crate::error::{Error, OidErrorKind, Result, ShadowingKind};
use crate::oid::{MAX_ARC, Oid};

/// Role of a node in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Placeholder with nothing registered at or below it yet.
    Shell,
    /// Intermediate node on the path to at least one registration.
    Subtree,
    /// Single-instance object; its instance is `.0`.
    Scalar,
    /// Conceptual table row. Not addressable itself; its Columns are.
    Entry,
    /// Table column; instances are row indices below it.
    Column,
}

impl NodeKind {
    /// Whether instances can live directly below a node of this kind.
    pub fn is_instance_possible(self) -> bool {
        matches!(self, NodeKind::Scalar | NodeKind::Column)
    }

    fn owns_handler(self) -> bool {
        matches!(self, NodeKind::Scalar | NodeKind::Entry | NodeKind::Column)
    }
}

/// Index of a node within its [`Mib`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node.
    pub const ROOT: NodeId = NodeId(0);
}

/// A node in the tree.
#[derive(Debug, Clone)]
pub struct Node<H> {
    oid: Oid,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: BTreeMap<u32, NodeId>,
    handler: Option<H>,
}

impl<H> Node<H> {
    fn new(oid: Oid, parent: Option<NodeId>) -> Self {
        Self {
            oid,
            kind: NodeKind::Shell,
            parent,
            children: BTreeMap::new(),
            handler: None,
        }
    }

    /// Full OID of this node.
    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// What this node is; see [`NodeKind`].
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Id of the enclosing node; `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The handler attached here, for Scalar, Entry and Column nodes.
    pub fn handler(&self) -> Option<&H> {
        self.handler.as_ref()
    }

    /// Child under `arc`.
    pub fn child(&self, arc: u32) -> Option<NodeId> {
        self.children.get(&arc).copied()
    }

    /// Child arcs in ascending order.
    pub fn child_arcs(&self) -> impl Iterator<Item = u32> + '_ {
        self.children.keys().copied()
    }

    /// Whether anything is registered below this node.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Whether OIDs below this node can name instances, i.e. it is a
    /// Scalar or Column.
    pub fn is_instance_possible(&self) -> bool {
        self.kind.is_instance_possible()
    }
}

/// Result of [`Mib::lookup`].
#[derive(Debug)]
pub struct Location<'m, H> {
    /// The OID that was looked up.
    pub requested: Oid,
    /// Id of the deepest node on the requested path.
    pub id: NodeId,
    /// The deepest node on the requested path (the root if nothing matched).
    pub node: &'m Node<H>,
}

impl<'m, H> Location<'m, H> {
    /// Whether the requested OID names the node itself.
    pub fn is_exact(&self) -> bool {
        self.requested == self.node.oid
    }

    /// Arcs of the requested OID below the node, if the node is a strict ancestor.
    pub fn instance(&self) -> Option<&[u32]> {
        self.requested
            .suffix_after(&self.node.oid)
            .filter(|suffix| !suffix.is_empty())
    }

    /// Whether the requested OID names an instance this node can hold.
    ///
    /// Scalars hold only `.0`; columns hold any non-empty row index.
    pub fn is_instance(&self) -> bool {
        match (self.node.kind, self.instance()) {
            (NodeKind::Scalar, Some(instance)) => instance == [0],
            (NodeKind::Column, Some(_)) => true,
            _ => false,
        }
    }
}

/// OID tree mapping registered objects to handlers.
#[derive(Debug, Clone)]
pub struct Mib<H> {
    nodes: Vec<Node<H>>,
}

impl<H: Clone> Mib<H> {
    /// Create a tree holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(Oid::empty(), None)],
        }
    }

    /// Number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> &Node<H> {
        &self.nodes[id.0]
    }

    /// Register a handler at `oid`.
    ///
    /// Without `columns` the node becomes a Scalar. With `columns` it becomes
    /// an Entry, and one Column child per listed arc is created sharing
    /// `handler`.
    ///
    /// Fails with [`Error::ShadowingViolation`] if an ancestor already owns a
    /// handler, the node itself does, or the node already has children. The
    /// tree is left untouched on failure.
    pub fn add(&mut self, oid: &Oid, handler: H, columns: Option<&[u32]>) -> Result<NodeId> {
        oid.validate_canonical()?;
        let columns: Option<BTreeSet<u32>> = columns.map(|c| c.iter().copied().collect());
        if let Some(&col) = columns.iter().flatten().find(|&&c| c > MAX_ARC) {
            return Err(Error::malformed_oid(OidErrorKind::ArcTooLarge(col)));
        }

        self.check_shadowing(oid)?;

        let mut id = NodeId::ROOT;
        for &arc in oid.arcs() {
            if id != NodeId::ROOT {
                self.nodes[id.0].kind = NodeKind::Subtree;
            }
            id = self.child_or_insert(id, arc);
        }

        let node = &mut self.nodes[id.0];
        node.handler = Some(handler.clone());
        node.kind = if columns.is_some() {
            NodeKind::Entry
        } else {
            NodeKind::Scalar
        };

        for col in columns.into_iter().flatten() {
            let col_id = self.child_or_insert(id, col);
            let column = &mut self.nodes[col_id.0];
            column.kind = NodeKind::Column;
            column.handler = Some(handler.clone());
        }

        tracing::debug!(
            target: "async_snmp_agent::mib",
            { snmp.oid = %oid, kind = ?self.nodes[id.0].kind },
            "registered MIB object"
        );
        Ok(id)
    }

    fn check_shadowing(&self, oid: &Oid) -> Result<()> {
        let violation = |kind: ShadowingKind| {
            tracing::debug!(target: "async_snmp_agent::mib", { snmp.oid = %oid, kind = %kind }, "registration rejected");
            Err(Error::ShadowingViolation {
                oid: oid.clone(),
                kind,
            })
        };

        let mut id = NodeId::ROOT;
        for &arc in oid.arcs() {
            if self.nodes[id.0].kind.owns_handler() {
                return violation(ShadowingKind::ParentTree);
            }
            match self.nodes[id.0].child(arc) {
                Some(next) => id = next,
                None => return Ok(()),
            }
        }

        let node = &self.nodes[id.0];
        if node.kind.owns_handler() {
            return violation(ShadowingKind::AlreadyRegistered);
        }
        if node.has_children() {
            return violation(ShadowingKind::HasChildren);
        }
        Ok(())
    }

    fn child_or_insert(&mut self, parent: NodeId, arc: u32) -> NodeId {
        if let Some(id) = self.nodes[parent.0].child(arc) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        let oid = self.nodes[parent.0].oid.child(arc);
        self.nodes.push(Node::new(oid, Some(parent)));
        self.nodes[parent.0].children.insert(arc, id);
        id
    }

    /// Descend as far as `oid` allows.
    ///
    /// Always succeeds: with nothing in common the location is the root.
    pub fn lookup(&self, oid: &Oid) -> Location<'_, H> {
        let mut id = NodeId::ROOT;
        for &arc in oid.arcs() {
            match self.nodes[id.0].child(arc) {
                Some(next) => id = next,
                None => break,
            }
        }
        Location {
            requested: oid.clone(),
            id,
            node: &self.nodes[id.0],
        }
    }

    /// Find the next addressable object (Scalar or Column) at or after `oid`.
    ///
    /// When `exact_ok` is set and `oid` falls on or inside a Column, that
    /// Column is returned and its handler decides which row follows. A Scalar
    /// named exactly is returned when `exact_ok` is set, since its `.0`
    /// instance follows it. Otherwise the walk continues after the object.
    /// `None` means the end of the MIB view.
    pub fn lookup_next(&self, oid: &Oid, exact_ok: bool) -> Option<NodeId> {
        let loc = self.lookup(oid);
        let id = loc.id;
        let node = loc.node;
        let depth = node.oid.len();

        match (node.kind, loc.is_exact()) {
            (NodeKind::Column | NodeKind::Scalar, true) if exact_ok => Some(id),
            (NodeKind::Column, false) if exact_ok => Some(id),
            (NodeKind::Column | NodeKind::Scalar, _) => self.next_after(id),
            (_, true) => self.walk(id, None),
            // an ancestor that is not an object: resume after the arc that diverged
            (_, false) => self.walk(id, Some(oid.arcs()[depth])),
        }
    }

    /// First object in the subtree after `id`'s own subtree.
    fn next_after(&self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        let parent = node.parent?;
        let last = *node.oid.arcs().last()?;
        self.walk(parent, Some(last))
    }

    /// Depth-first search for an object.
    ///
    /// With `after` unset, `id` and its whole subtree are candidates; with it
    /// set, only children with a greater arc are. An exhausted node hands the
    /// search to its parent, starting after itself.
    fn walk(&self, id: NodeId, after: Option<u32>) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        let range = match after {
            None => {
                if node.is_instance_possible() {
                    return Some(id);
                }
                node.children.range(..)
            }
            Some(arc) => node.children.range((Bound::Excluded(arc), Bound::Unbounded)),
        };

        for (_, &child) in range {
            if let Some(found) = self.first_object(child) {
                return Some(found);
            }
        }
        self.next_after(id)
    }

    fn first_object(&self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        if node.is_instance_possible() {
            return Some(id);
        }
        node.children
            .values()
            .find_map(|&child| self.first_object(child))
    }

    /// All addressable objects in lexicographic order.
    pub fn objects(&self) -> impl Iterator<Item = &Node<H>> + '_ {
        let mut next = self.walk(NodeId::ROOT, None);
        std::iter::from_fn(move || {
            let id = next?;
            next = self.next_after(id);
            Some(self.node(id))
        })
    }
}

impl<H: Clone> Default for Mib<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    /// Scalars .1.3.6.1.1 and .1.3.6.1.2, table entry .1.3.6.2.1 with columns 1 and 2.
    fn sample() -> Mib<&'static str> {
        let mut mib = Mib::new();
        mib.add(&oid!(1, 3, 6, 1, 1), "a", None).unwrap();
        mib.add(&oid!(1, 3, 6, 1, 2), "b", None).unwrap();
        mib.add(&oid!(1, 3, 6, 2, 1), "t", Some(&[2, 1])).unwrap();
        mib
    }

    fn next(mib: &Mib<&'static str>, oid: Oid, exact_ok: bool) -> Option<Oid> {
        mib.lookup_next(&oid, exact_ok)
            .map(|id| mib.node(id).oid().clone())
    }

    #[test]
    fn test_node_kinds() {
        let mib = sample();
        let kind = |o: Oid| mib.lookup(&o).node.kind();
        assert_eq!(kind(Oid::empty()), NodeKind::Shell);
        assert_eq!(kind(oid!(1, 3, 6)), NodeKind::Subtree);
        assert_eq!(kind(oid!(1, 3, 6, 1, 1)), NodeKind::Scalar);
        assert_eq!(kind(oid!(1, 3, 6, 2, 1)), NodeKind::Entry);
        assert_eq!(kind(oid!(1, 3, 6, 2, 1, 2)), NodeKind::Column);
        assert_eq!(
            mib.lookup(&oid!(1, 3, 6, 2, 1, 1)).node.handler(),
            Some(&"t")
        );
    }

    #[test]
    fn test_shadowing() {
        let mut mib = sample();
        let kind = |r: Result<NodeId>| match r {
            Err(Error::ShadowingViolation { kind, .. }) => Some(kind),
            _ => None,
        };

        assert_eq!(
            kind(mib.add(&oid!(1, 3, 6, 1, 1, 0), "x", None)),
            Some(ShadowingKind::ParentTree)
        );
        assert_eq!(
            kind(mib.add(&oid!(1, 3, 6, 2, 1, 3), "x", None)),
            Some(ShadowingKind::ParentTree)
        );
        assert_eq!(
            kind(mib.add(&oid!(1, 3, 6, 1, 2), "x", None)),
            Some(ShadowingKind::AlreadyRegistered)
        );
        assert_eq!(
            kind(mib.add(&oid!(1, 3, 6, 1), "x", None)),
            Some(ShadowingKind::HasChildren)
        );

        // a failed registration leaves nothing behind
        let before = mib.len();
        assert!(mib.add(&oid!(1, 3, 6, 1, 1, 7, 7), "x", None).is_err());
        assert_eq!(mib.len(), before);
    }

    #[test]
    fn test_add_rejects_bad_oid() {
        let mut mib: Mib<()> = Mib::new();
        assert!(matches!(
            mib.add(&oid!(1, 3), (), None),
            Err(Error::MalformedOid { .. })
        ));
        assert!(matches!(
            mib.add(&oid!(1, 3, 6), (), Some(&[u32::MAX])),
            Err(Error::MalformedOid { .. })
        ));
        assert!(mib.is_empty());
    }

    #[test]
    fn test_lookup_instances() {
        let mib = sample();

        let loc = mib.lookup(&oid!(1, 3, 6, 1, 1, 0));
        assert_eq!(loc.node.oid(), &oid!(1, 3, 6, 1, 1));
        assert_eq!(loc.instance(), Some(&[0u32][..]));
        assert!(loc.is_instance());

        let loc = mib.lookup(&oid!(1, 3, 6, 1, 1, 1));
        assert!(!loc.is_instance());

        let loc = mib.lookup(&oid!(1, 3, 6, 1, 1));
        assert!(loc.is_exact());
        assert_eq!(loc.instance(), None);
        assert!(!loc.is_instance());

        let loc = mib.lookup(&oid!(1, 3, 6, 2, 1, 2, 10, 0, 0, 1));
        assert_eq!(loc.node.kind(), NodeKind::Column);
        assert_eq!(loc.instance(), Some(&[10u32, 0, 0, 1][..]));
        assert!(loc.is_instance());

        // column 3 does not exist: the deepest node is the entry
        let loc = mib.lookup(&oid!(1, 3, 6, 2, 1, 3, 1));
        assert_eq!(loc.node.kind(), NodeKind::Entry);
        assert!(!loc.is_instance());

        let loc = mib.lookup(&oid!(2, 5, 5));
        assert_eq!(loc.id, NodeId::ROOT);
    }

    #[test]
    fn test_lookup_next_cases() {
        let mib = sample();

        // subtree exact: first object inside
        assert_eq!(next(&mib, oid!(1, 3, 6), false), Some(oid!(1, 3, 6, 1, 1)));
        // before everything
        assert_eq!(next(&mib, oid!(0, 0, 0), true), Some(oid!(1, 3, 6, 1, 1)));
        // scalar exact
        assert_eq!(next(&mib, oid!(1, 3, 6, 1, 1), true), Some(oid!(1, 3, 6, 1, 1)));
        assert_eq!(next(&mib, oid!(1, 3, 6, 1, 1), false), Some(oid!(1, 3, 6, 1, 2)));
        // scalar instance: the next object
        assert_eq!(next(&mib, oid!(1, 3, 6, 1, 1, 0), true), Some(oid!(1, 3, 6, 1, 2)));
        // last scalar crosses into the table
        assert_eq!(next(&mib, oid!(1, 3, 6, 1, 2, 0), true), Some(oid!(1, 3, 6, 2, 1, 1)));
        // column: the provider picks the row
        assert_eq!(
            next(&mib, oid!(1, 3, 6, 2, 1, 1, 5), true),
            Some(oid!(1, 3, 6, 2, 1, 1))
        );
        assert_eq!(
            next(&mib, oid!(1, 3, 6, 2, 1, 1), false),
            Some(oid!(1, 3, 6, 2, 1, 2))
        );
        // gaps between registered arcs
        assert_eq!(next(&mib, oid!(1, 3, 6, 1, 1, 5, 5), false), Some(oid!(1, 3, 6, 1, 2)));
        assert_eq!(next(&mib, oid!(1, 3, 6, 0, 9), true), Some(oid!(1, 3, 6, 1, 1)));
        assert_eq!(next(&mib, oid!(1, 3, 6, 1, 0, 4), true), Some(oid!(1, 3, 6, 1, 1)));
        // end of view
        assert_eq!(next(&mib, oid!(1, 3, 6, 2, 1, 2), false), None);
        assert_eq!(next(&mib, oid!(1, 3, 6, 2, 1, 2, 9), false), None);
        assert_eq!(next(&mib, oid!(1, 3, 7), true), None);
        assert_eq!(next(&mib, oid!(2, 0, 0), true), None);
    }

    #[test]
    fn test_numeric_not_string_order() {
        let mut mib = Mib::new();
        for arc in [10u32, 9, 100, 2] {
            mib.add(&oid!(1, 3, 6, arc), arc, None).unwrap();
        }
        let order: Vec<u32> = mib.objects().map(|n| *n.handler().unwrap()).collect();
        assert_eq!(order, vec![2, 9, 10, 100]);
    }

    #[test]
    fn test_walk_is_ascending() {
        let mib = sample();
        let mut walked = Vec::new();
        let mut cursor = oid!(0, 0, 0);
        let mut exact_ok = true;
        while let Some(id) = mib.lookup_next(&cursor, exact_ok) {
            cursor = mib.node(id).oid().clone();
            walked.push(cursor.clone());
            exact_ok = false;
        }
        assert_eq!(
            walked,
            vec![
                oid!(1, 3, 6, 1, 1),
                oid!(1, 3, 6, 1, 2),
                oid!(1, 3, 6, 2, 1, 1),
                oid!(1, 3, 6, 2, 1, 2),
            ]
        );
        assert!(walked.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_columns_entry() {
        let mut mib = Mib::new();
        mib.add(&oid!(1, 3, 6, 1), (), Some(&[])).unwrap();
        assert_eq!(mib.lookup(&oid!(1, 3, 6, 1)).node.kind(), NodeKind::Entry);
        assert_eq!(mib.lookup_next(&oid!(1, 3, 6), true), None);
        assert_eq!(mib.objects().count(), 0);
    }
}
